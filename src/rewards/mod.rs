//! Reward tiers offered by a fundraiser

mod types;

use crate::error::{Error, Result};
use crate::fetch::HttpClient;

pub use types::*;

use types::NewRewardTierBody;

/// Client for reward tiers
#[derive(Clone)]
pub struct RewardsClient {
    http: HttpClient,
}

impl RewardsClient {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn create(&self, fundraiser: i64, fields: &RewardTierFields) -> Result<RewardTier> {
        validate_tier(fields)?;
        let body = NewRewardTierBody { fundraiser, fields };
        self.http
            .post("reward-tiers/")
            .json(&body)?
            .execute("Error creating reward tier")
            .await
    }

    /// `PUT reward-tiers/{id}/`
    pub async fn update(&self, tier: &RewardTier) -> Result<RewardTier> {
        validate_tier(&tier.fields)?;
        self.http
            .put(&format!("reward-tiers/{}/", tier.id))
            .json(tier)?
            .execute("Error updating reward tier")
            .await
    }

    pub async fn delete(&self, tier_id: i64) -> Result<()> {
        self.http
            .delete(&format!("reward-tiers/{}/", tier_id))
            .execute_empty("Error deleting reward tier")
            .await
    }
}

fn validate_tier(fields: &RewardTierFields) -> Result<()> {
    if fields.name.trim().is_empty() {
        return Err(Error::validation("name: This field is required."));
    }
    if let Some(value) = fields.minimum_contribution_value {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::validation(
                "minimum_contribution_value: A valid non-negative number is required.",
            ));
        }
    }
    Ok(())
}
