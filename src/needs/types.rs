//! Types for needs and their detail records

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::fetch::{coerce_id, null_as_default};
use crate::validate::{validate_amount, validate_window};

/// The kind of a need, fixed when it is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeedType {
    Money,
    Time,
    Item,
}

impl NeedType {
    pub const ALL: [NeedType; 3] = [NeedType::Money, NeedType::Time, NeedType::Item];

    pub fn as_str(&self) -> &'static str {
        match self {
            NeedType::Money => "money",
            NeedType::Time => "time",
            NeedType::Item => "item",
        }
    }

    /// Collection path of the detail rows for this type
    pub fn detail_path(&self) -> &'static str {
        match self {
            NeedType::Money => "money-needs/",
            NeedType::Time => "time-needs/",
            NeedType::Item => "item-needs/",
        }
    }
}

impl fmt::Display for NeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeedStatus {
    #[default]
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemMode {
    #[default]
    Donation,
    Loan,
    Either,
}

/// A base need as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Need {
    pub id: i64,
    pub fundraiser: i64,
    pub need_type: NeedType,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: NeedStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Priority,
    #[serde(default)]
    pub sort_order: Option<i64>,
}

impl Need {
    /// Full-replace body for `PUT needs/{id}/` with `changes` applied
    pub fn to_record(&self, changes: &NeedChanges) -> NeedRecord {
        NeedRecord {
            fundraiser: self.fundraiser,
            need_type: self.need_type,
            title: changes.title.clone().unwrap_or_else(|| self.title.clone()),
            description: changes
                .description
                .clone()
                .unwrap_or_else(|| self.description.clone()),
            status: changes.status.unwrap_or(self.status),
            priority: changes.priority.unwrap_or(self.priority),
            sort_order: changes.sort_order.or(self.sort_order).unwrap_or(0),
        }
    }
}

/// Body for `POST needs/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewNeed {
    pub fundraiser: i64,
    pub title: String,
    pub description: String,
    pub status: NeedStatus,
    pub priority: Priority,
}

impl NewNeed {
    pub fn new(fundraiser: i64, title: &str) -> Self {
        Self {
            fundraiser,
            title: title.to_string(),
            description: String::new(),
            status: NeedStatus::default(),
            priority: Priority::default(),
        }
    }

    pub fn with_description(mut self, value: &str) -> Self {
        self.description = value.to_string();
        self
    }

    pub fn with_status(mut self, value: NeedStatus) -> Self {
        self.status = value;
        self
    }

    pub fn with_priority(mut self, value: Priority) -> Self {
        self.priority = value;
        self
    }
}

#[derive(Serialize)]
pub(crate) struct NewNeedBody<'a> {
    #[serde(flatten)]
    pub base: &'a NewNeed,
    pub need_type: NeedType,
}

/// Overrides applied to an existing need on update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeedChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<NeedStatus>,
    pub priority: Option<Priority>,
    pub sort_order: Option<i64>,
}

impl NeedChanges {
    pub fn title(mut self, value: &str) -> Self {
        self.title = Some(value.to_string());
        self
    }

    pub fn description(mut self, value: &str) -> Self {
        self.description = Some(value.to_string());
        self
    }

    pub fn status(mut self, value: NeedStatus) -> Self {
        self.status = Some(value);
        self
    }

    pub fn priority(mut self, value: Priority) -> Self {
        self.priority = Some(value);
        self
    }

    pub fn sort_order(mut self, value: i64) -> Self {
        self.sort_order = Some(value);
        self
    }
}

/// Every field the backend requires on `PUT needs/{id}/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeedRecord {
    pub fundraiser: i64,
    pub need_type: NeedType,
    pub title: String,
    pub description: String,
    pub status: NeedStatus,
    pub priority: Priority,
    pub sort_order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyNeedFields {
    /// Decimal string, e.g. `"250.00"`
    pub target_amount: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeNeedFields {
    pub role_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    pub volunteers_needed: u32,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    #[serde(default)]
    pub reward_tier: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemNeedFields {
    pub item_name: String,
    pub quantity_needed: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mode: ItemMode,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default)]
    pub donation_reward_tier: Option<i64>,
    #[serde(default)]
    pub loan_reward_tier: Option<i64>,
}

/// Type-specific fields of a need. None of the variants carry the `need`
/// foreign key; it is added only when a detail row is created.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NeedDetail {
    Money(MoneyNeedFields),
    Time(TimeNeedFields),
    Item(ItemNeedFields),
}

impl NeedDetail {
    pub fn need_type(&self) -> NeedType {
        match self {
            NeedDetail::Money(_) => NeedType::Money,
            NeedDetail::Time(_) => NeedType::Time,
            NeedDetail::Item(_) => NeedType::Item,
        }
    }

    /// Decode the type-specific fields of a detail row
    pub fn from_value(need_type: NeedType, value: Value) -> Result<Self> {
        Ok(match need_type {
            NeedType::Money => NeedDetail::Money(serde_json::from_value(value)?),
            NeedType::Time => NeedDetail::Time(serde_json::from_value(value)?),
            NeedType::Item => NeedDetail::Item(serde_json::from_value(value)?),
        })
    }

    /// Local checks run before any request is sent
    pub fn validate(&self) -> Result<()> {
        match self {
            NeedDetail::Money(fields) => validate_amount("target_amount", &fields.target_amount),
            NeedDetail::Time(fields) => {
                if fields.role_title.trim().is_empty() {
                    return Err(Error::validation("role_title: This field is required."));
                }
                if fields.volunteers_needed < 1 {
                    return Err(Error::validation(
                        "volunteers_needed: Ensure this value is at least 1.",
                    ));
                }
                validate_window(&fields.start_datetime, &fields.end_datetime)
            }
            NeedDetail::Item(fields) => {
                if fields.item_name.trim().is_empty() {
                    return Err(Error::validation("item_name: This field is required."));
                }
                if fields.quantity_needed < 1 {
                    return Err(Error::validation(
                        "quantity_needed: Ensure this value is at least 1.",
                    ));
                }
                Ok(())
            }
        }
    }
}

#[derive(Serialize)]
pub(crate) struct NewDetailBody<'a> {
    pub need: i64,
    #[serde(flatten)]
    pub detail: &'a NeedDetail,
}

/// A persisted detail row
#[derive(Debug, Clone, PartialEq)]
pub struct NeedDetailRecord {
    pub id: i64,
    pub need: i64,
    pub detail: NeedDetail,
}

impl NeedDetailRecord {
    pub(crate) fn from_value(need_type: NeedType, value: Value) -> Result<Self> {
        let id = value
            .get("id")
            .and_then(coerce_id)
            .ok_or_else(|| Error::general("detail row has no id"))?;
        let need = value.get("need").and_then(coerce_id).unwrap_or_default();
        let detail = NeedDetail::from_value(need_type, value)?;
        Ok(Self { id, need, detail })
    }
}

/// Result of [`crate::needs::NeedsClient::create`]
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedNeed {
    pub need: Need,
    pub detail: NeedDetailRecord,
}

/// What happened to the detail row during an update
#[derive(Debug, Clone, PartialEq)]
pub enum DetailUpdate {
    Saved(NeedDetailRecord),
    /// No detail row exists for the need, so only the base was saved
    NotFound,
    /// No detail changes were requested
    Unchanged,
}

/// Result of [`crate::needs::NeedsClient::update`]
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatedNeed {
    pub need: Need,
    pub detail: DetailUpdate,
}

impl UpdatedNeed {
    /// True when detail changes were requested but could not be saved
    pub fn detail_skipped(&self) -> bool {
        matches!(self.detail, DetailUpdate::NotFound)
    }
}
