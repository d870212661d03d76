//! Pledges made by supporters against a need

mod types;

use log::{debug, warn};
use serde_json::Value;

use crate::error::{PartialFailure, Result, Step};
use crate::fetch::HttpClient;

pub use types::*;

use types::NewPledgeDetailBody;

/// Client for pledges
#[derive(Clone)]
pub struct PledgesClient {
    http: HttpClient,
}

impl PledgesClient {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// `POST pledges/`
    pub async fn create(&self, pledge: &NewPledge) -> Result<Pledge> {
        self.http
            .post("pledges/")
            .json(pledge)?
            .execute("Error creating pledge")
            .await
    }

    /// `POST {type}-pledges/` with the `pledge` foreign key
    pub async fn create_detail(
        &self,
        pledge_id: i64,
        detail: &PledgeDetail,
    ) -> Result<PledgeDetailRecord> {
        let body = NewPledgeDetailBody {
            pledge: pledge_id,
            detail,
        };
        let value: Value = self
            .http
            .post(detail.detail_path())
            .json(&body)?
            .execute(&format!("Error creating {} pledge", detail.need_type()))
            .await?;
        PledgeDetailRecord::from_response(value, pledge_id, detail)
    }

    /// Create the pledge and then its detail row.
    ///
    /// A failed detail request leaves the pledge persisted and returns
    /// `CreateDetailFailed` with the pledge id in its [`PartialFailure`].
    pub async fn create_with_detail(
        &self,
        pledge: NewPledge,
        detail: PledgeDetail,
    ) -> Result<CreatedPledge> {
        detail.validate()?;

        let created = self
            .create(&pledge)
            .await
            .map_err(|err| err.into_create_base())?;
        debug!("Created pledge {} for need {}", created.id, created.need);

        match self.create_detail(created.id, &detail).await {
            Ok(record) => Ok(CreatedPledge {
                pledge: created,
                detail: record,
            }),
            Err(err) => {
                warn!("Pledge {} was created but its detail was not: {}", created.id, err);
                Err(err.into_create_detail(PartialFailure::new(
                    vec![Step::CreatePledge],
                    Step::CreatePledgeDetail,
                    Some(created.id),
                )))
            }
        }
    }
}
