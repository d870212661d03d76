//! Types for fundraisers, templates and reports

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::fetch::{decimal_from_any, null_as_default};
use crate::needs::{Need, NeedBoard, NeedType, Priority};
use crate::rewards::{sort_tiers, RewardTier, RewardTierFields};
use crate::validate::validate_title;

const DRAFT: &str = "draft";

fn draft() -> String {
    DRAFT.to_string()
}

/// Editable fields of a fundraiser, sent whole on create and update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundraiserFields {
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "decimal_from_any")]
    pub goal: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default, deserialize_with = "date_prefix")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "date_prefix")]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "draft")]
    pub status: String,
    #[serde(default)]
    pub enable_rewards: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

impl FundraiserFields {
    /// An undated draft with the given title
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            description: String::new(),
            goal: None,
            image_url: String::new(),
            location: String::new(),
            start_date: None,
            end_date: None,
            status: draft(),
            enable_rewards: false,
            sort_order: None,
        }
    }

    pub fn with_description(mut self, value: &str) -> Self {
        self.description = value.to_string();
        self
    }

    pub fn with_goal(mut self, value: f64) -> Self {
        self.goal = Some(value);
        self
    }

    pub fn with_location(mut self, value: &str) -> Self {
        self.location = value.to_string();
        self
    }

    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_status(mut self, value: &str) -> Self {
        self.status = value.to_string();
        self
    }

    pub fn with_rewards(mut self, enabled: bool) -> Self {
        self.enable_rewards = enabled;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        if let Some(goal) = self.goal {
            if !goal.is_finite() || goal < 0.0 {
                return Err(Error::validation("goal: A valid non-negative number is required."));
            }
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(Error::validation(
                    "end_date: End date must not be before the start date.",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fundraiser {
    pub id: i64,
    #[serde(flatten)]
    pub fields: FundraiserFields,
    #[serde(default)]
    pub needs: Vec<Need>,
    #[serde(default)]
    pub reward_tiers: Vec<RewardTier>,
}

impl Fundraiser {
    /// Local need state for this fundraiser
    pub fn board(&self) -> NeedBoard {
        NeedBoard::new(self.needs.clone())
    }

    /// Reward tiers in display order
    pub fn sorted_reward_tiers(&self) -> Vec<RewardTier> {
        let mut tiers = self.reward_tiers.clone();
        sort_tiers(&mut tiers);
        tiers
    }
}

/// A need as listed in a template preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateNeed {
    #[serde(default)]
    pub id: Option<i64>,
    pub need_type: NeedType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub priority: Option<Priority>,
}

/// A ready-made festival that can be copied onto a fundraiser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundraiserTemplate {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "decimal_from_any")]
    pub goal: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default)]
    pub enable_rewards: bool,
    #[serde(default)]
    pub needs: Vec<TemplateNeed>,
    #[serde(default)]
    pub reward_tiers: Vec<RewardTierFields>,
}

impl FundraiserTemplate {
    /// The undated draft created before the template is applied
    pub fn placeholder(&self) -> FundraiserFields {
        let title = if self.title.trim().is_empty() {
            "Untitled festival"
        } else {
            self.title.as_str()
        };
        let description = if self.description.is_empty() {
            "Created from template"
        } else {
            self.description.as_str()
        };
        FundraiserFields {
            goal: Some(self.goal.unwrap_or(0.0)),
            image_url: self.image_url.clone(),
            location: self.location.clone(),
            enable_rewards: self.enable_rewards,
            sort_order: Some(0),
            ..FundraiserFields::new(title).with_description(description)
        }
    }

    /// Template needs of one type, in listed order
    pub fn needs_of(&self, need_type: NeedType) -> Vec<&TemplateNeed> {
        self.needs.iter().filter(|n| n.need_type == need_type).collect()
    }
}

#[derive(Serialize)]
pub(crate) struct ApplyTemplateBody {
    pub fundraiser_id: i64,
    pub template_id: i64,
}

/// Dates may arrive as `YYYY-MM-DD` or as a full timestamp; only the date is kept.
fn date_prefix<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => {
            let day = s.trim().get(..10).unwrap_or(s.trim());
            NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map(Some)
                .map_err(de::Error::custom)
        }
    }
}
