//! Types for reward tiers

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::fetch::decimal_from_any;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardType {
    #[default]
    Money,
    Time,
    Item,
}

/// Editable fields of a reward tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTierFields {
    pub reward_type: RewardType,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Only meaningful for money tiers
    #[serde(default, deserialize_with = "decimal_from_any")]
    pub minimum_contribution_value: Option<f64>,
    #[serde(default)]
    pub sort_order: Option<i64>,
}

#[derive(Serialize)]
pub(crate) struct NewRewardTierBody<'a> {
    pub fundraiser: i64,
    #[serde(flatten)]
    pub fields: &'a RewardTierFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTier {
    pub id: i64,
    pub fundraiser: i64,
    #[serde(flatten)]
    pub fields: RewardTierFields,
}

const UNORDERED: i64 = 9999;

fn compare_tiers(a: &RewardTier, b: &RewardTier) -> Ordering {
    let sa = a.fields.sort_order.unwrap_or(UNORDERED);
    let sb = b.fields.sort_order.unwrap_or(UNORDERED);
    sa.cmp(&sb).then(a.id.cmp(&b.id))
}

/// Ascending sort order; tiers without one go last
pub fn sort_tiers(tiers: &mut [RewardTier]) {
    tiers.sort_by(compare_tiers);
}
