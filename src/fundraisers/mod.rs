//! Fundraisers, the templates they can start from, and their reports

mod types;

use log::{debug, warn};
use serde_json::Value;

use crate::error::Result;
use crate::fetch::{HttpClient, ListEnvelope};

pub use types::*;

use types::ApplyTemplateBody;

/// Client for fundraisers
#[derive(Clone)]
pub struct FundraisersClient {
    http: HttpClient,
}

impl FundraisersClient {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn get(&self, fundraiser_id: i64) -> Result<Fundraiser> {
        self.http
            .get(&format!("fundraisers/{}/", fundraiser_id))
            .execute(&format!("Error fetching fundraiser with id {}", fundraiser_id))
            .await
    }

    /// `POST fundraisers/`
    pub async fn create(&self, fields: &FundraiserFields) -> Result<Fundraiser> {
        fields.validate()?;
        let created: Fundraiser = self
            .http
            .post("fundraisers/")
            .json(fields)?
            .execute("Error creating fundraiser")
            .await?;
        debug!("Created fundraiser {}", created.id);
        Ok(created)
    }

    /// Full update with `PUT fundraisers/{id}/`
    pub async fn update(
        &self,
        fundraiser_id: i64,
        fields: &FundraiserFields,
    ) -> Result<Fundraiser> {
        fields.validate()?;
        self.http
            .put(&format!("fundraisers/{}/", fundraiser_id))
            .json(fields)?
            .execute(&format!("Error updating fundraiser {}", fundraiser_id))
            .await
    }

    pub async fn templates(&self) -> Result<Vec<FundraiserTemplate>> {
        let templates: ListEnvelope<FundraiserTemplate> = self
            .http
            .get("fundraiser-templates/")
            .execute("Error fetching fundraiser templates")
            .await?;
        Ok(templates.into_vec())
    }

    /// Copy a template's needs and reward tiers onto an existing fundraiser
    pub async fn apply_template(
        &self,
        fundraiser_id: i64,
        template_id: i64,
    ) -> Result<Fundraiser> {
        let body = ApplyTemplateBody {
            fundraiser_id,
            template_id,
        };
        self.http
            .post("fundraisers/apply-template/")
            .json(&body)?
            .execute("Error applying template")
            .await
    }

    /// Create a draft from `template` and apply the template to it.
    ///
    /// If applying fails the draft stays persisted and the error is returned
    /// as is.
    pub async fn create_from_template(
        &self,
        template: &FundraiserTemplate,
    ) -> Result<Fundraiser> {
        let draft = self.create(&template.placeholder()).await?;
        self.apply_template(draft.id, template.id)
            .await
            .map_err(|err| {
                warn!(
                    "Draft fundraiser {} was created but template {} was not applied: {}",
                    draft.id, template.id, err
                );
                err
            })
    }

    /// `GET reports/fundraisers/{id}/summary/`
    pub async fn summary(&self, fundraiser_id: i64) -> Result<Value> {
        self.http
            .get(&format!("reports/fundraisers/{}/summary/", fundraiser_id))
            .execute("Error fetching fundraiser summary")
            .await
    }

    /// `GET reports/fundraisers/{id}/pledges/`
    pub async fn pledges_report(&self, fundraiser_id: i64) -> Result<Value> {
        self.http
            .get(&format!("reports/fundraisers/{}/pledges/", fundraiser_id))
            .execute("Error fetching fundraiser pledges report")
            .await
    }
}
