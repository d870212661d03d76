//! Types for pledges

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::fetch::coerce_id;
use crate::needs::{ItemMode, Need, NeedType};
use crate::validate::{validate_amount, validate_window};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PledgeStatus {
    #[default]
    Pending,
    Approved,
    Declined,
    Cancelled,
}

/// Body for `POST pledges/`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPledge {
    pub fundraiser: i64,
    pub need: i64,
    pub comment: String,
    pub anonymous: bool,
    pub status: PledgeStatus,
}

impl NewPledge {
    /// A pending, named pledge against `need`
    pub fn for_need(need: &Need) -> Self {
        Self {
            fundraiser: need.fundraiser,
            need: need.id,
            comment: String::new(),
            anonymous: false,
            status: PledgeStatus::default(),
        }
    }

    pub fn with_comment(mut self, value: &str) -> Self {
        self.comment = value.to_string();
        self
    }

    pub fn anonymous(mut self, value: bool) -> Self {
        self.anonymous = value;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pledge {
    pub id: i64,
    pub fundraiser: i64,
    pub need: i64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub status: PledgeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyPledgeFields {
    /// Decimal string, e.g. `"25.00"`
    pub amount: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPledgeFields {
    pub quantity: u32,
    #[serde(default)]
    pub mode: ItemMode,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePledgeFields {
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    /// Decimal string, e.g. `"4.0"`
    pub hours_committed: String,
    #[serde(default)]
    pub comment: String,
}

/// Type-specific fields of a pledge
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PledgeDetail {
    Money(MoneyPledgeFields),
    Time(TimePledgeFields),
    Item(ItemPledgeFields),
}

impl PledgeDetail {
    pub fn need_type(&self) -> NeedType {
        match self {
            PledgeDetail::Money(_) => NeedType::Money,
            PledgeDetail::Time(_) => NeedType::Time,
            PledgeDetail::Item(_) => NeedType::Item,
        }
    }

    /// Decode the type-specific fields of a pledge detail row
    pub fn from_value(need_type: NeedType, value: Value) -> Result<Self> {
        Ok(match need_type {
            NeedType::Money => PledgeDetail::Money(serde_json::from_value(value)?),
            NeedType::Time => PledgeDetail::Time(serde_json::from_value(value)?),
            NeedType::Item => PledgeDetail::Item(serde_json::from_value(value)?),
        })
    }

    pub fn detail_path(&self) -> &'static str {
        match self {
            PledgeDetail::Money(_) => "money-pledges/",
            PledgeDetail::Time(_) => "time-pledges/",
            PledgeDetail::Item(_) => "item-pledges/",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            PledgeDetail::Money(fields) => validate_amount("amount", &fields.amount),
            PledgeDetail::Time(fields) => {
                validate_window(&fields.start_datetime, &fields.end_datetime)?;
                validate_amount("hours_committed", &fields.hours_committed)
            }
            PledgeDetail::Item(fields) => {
                if fields.quantity < 1 {
                    return Err(Error::validation("quantity: Ensure this value is at least 1."));
                }
                Ok(())
            }
        }
    }
}

#[derive(Serialize)]
pub(crate) struct NewPledgeDetailBody<'a> {
    pub pledge: i64,
    #[serde(flatten)]
    pub detail: &'a PledgeDetail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PledgeDetailRecord {
    pub id: i64,
    pub pledge: i64,
    pub detail: PledgeDetail,
}

impl PledgeDetailRecord {
    /// Decode a saved detail row. The id must be present; fields the
    /// response does not carry are taken from what was sent.
    pub(crate) fn from_response(
        value: Value,
        pledge_id: i64,
        sent: &PledgeDetail,
    ) -> Result<Self> {
        let need_type = sent.need_type();
        let id = value.get("id").and_then(coerce_id).ok_or_else(|| {
            Error::general(format!("The saved {} pledge detail has no id.", need_type))
        })?;
        let pledge = value.get("pledge").and_then(coerce_id).unwrap_or(pledge_id);
        let detail = PledgeDetail::from_value(need_type, value).unwrap_or_else(|_| sent.clone());
        Ok(Self { id, pledge, detail })
    }
}

/// Result of [`crate::pledges::PledgesClient::create_with_detail`]
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPledge {
    pub pledge: Pledge,
    pub detail: PledgeDetailRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn money(amount: &str) -> PledgeDetail {
        PledgeDetail::Money(MoneyPledgeFields {
            amount: amount.to_string(),
            comment: String::new(),
        })
    }

    #[test]
    fn saved_detail_prefers_server_fields() {
        let record = PledgeDetailRecord::from_response(
            json!({"id": "12", "pledge": 40, "amount": "25.00", "comment": "Thanks"}),
            40,
            &money("25"),
        )
        .unwrap();
        assert_eq!(record.id, 12);
        assert_eq!(record.pledge, 40);
        assert_eq!(
            record.detail,
            PledgeDetail::Money(MoneyPledgeFields {
                amount: "25.00".to_string(),
                comment: "Thanks".to_string(),
            })
        );
    }

    #[test]
    fn saved_detail_without_id_is_an_error() {
        let result =
            PledgeDetailRecord::from_response(json!({"amount": "25.00"}), 40, &money("25"));
        assert!(matches!(result, Err(Error::General(_))));
    }
}
