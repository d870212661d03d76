//! Error handling for the Backyard Festival client

use std::fmt;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// A single request within a multi-step operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CreateBase,
    CreateDetail,
    UpdateBase,
    UpdateDetail,
    DeleteDetail,
    DeleteBase,
    CreatePledge,
    CreatePledgeDetail,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::CreateBase => "create base need",
            Step::CreateDetail => "create need detail",
            Step::UpdateBase => "update base need",
            Step::UpdateDetail => "update need detail",
            Step::DeleteDetail => "delete need detail",
            Step::DeleteBase => "delete base need",
            Step::CreatePledge => "create pledge",
            Step::CreatePledgeDetail => "create pledge detail",
        };
        f.write_str(name)
    }
}

/// Which steps of a multi-step operation reached the backend before one failed.
///
/// Nothing is rolled back. The caller decides whether to retry, compensate
/// or leave the record for manual cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialFailure {
    /// Steps that completed, in the order they were issued
    pub completed: Vec<Step>,
    /// The step that failed
    pub failed: Step,
    /// Id of the row left persisted by the completed steps, if any
    pub persisted_id: Option<i64>,
}

impl PartialFailure {
    pub fn new(completed: Vec<Step>, failed: Step, persisted_id: Option<i64>) -> Self {
        Self {
            completed,
            failed,
            persisted_id,
        }
    }
}

/// Unified error type for the Backyard Festival client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local checks that stop a request from being sent
    #[error("{0}")]
    Validation(String),

    /// A response was received with a non-2xx status
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("{message}")]
    CreateBaseFailed {
        status: Option<StatusCode>,
        message: String,
    },

    /// The base row exists but its detail row could not be created
    #[error("{message}")]
    CreateDetailFailed {
        status: Option<StatusCode>,
        message: String,
        partial: PartialFailure,
    },

    #[error("{message}")]
    UpdateBaseFailed {
        status: Option<StatusCode>,
        message: String,
    },

    /// The base row was updated but its detail row was not
    #[error("{message}")]
    UpdateDetailFailed {
        status: Option<StatusCode>,
        message: String,
        partial: PartialFailure,
    },

    #[error("{message}")]
    DeleteFailed {
        status: Option<StatusCode>,
        message: String,
        partial: Option<PartialFailure>,
    },

    /// At least one sort order update was rejected. `applied` holds the
    /// records the backend did confirm.
    #[error("{message}")]
    ReorderFailed {
        message: String,
        applied: Vec<crate::needs::Need>,
    },

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// HTTP status of the failed response, when there was one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Http(err) => err.status(),
            Error::Api { status, .. } => Some(*status),
            Error::CreateBaseFailed { status, .. }
            | Error::CreateDetailFailed { status, .. }
            | Error::UpdateBaseFailed { status, .. }
            | Error::UpdateDetailFailed { status, .. }
            | Error::DeleteFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// Partial progress of a multi-step operation, if this error carries any
    pub fn partial(&self) -> Option<&PartialFailure> {
        match self {
            Error::CreateDetailFailed { partial, .. }
            | Error::UpdateDetailFailed { partial, .. } => Some(partial),
            Error::DeleteFailed { partial, .. } => partial.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn into_create_base(self) -> Self {
        let status = self.status();
        Error::CreateBaseFailed {
            status,
            message: self.to_string(),
        }
    }

    pub(crate) fn into_create_detail(self, partial: PartialFailure) -> Self {
        let status = self.status();
        Error::CreateDetailFailed {
            status,
            message: self.to_string(),
            partial,
        }
    }

    pub(crate) fn into_update_base(self) -> Self {
        let status = self.status();
        Error::UpdateBaseFailed {
            status,
            message: self.to_string(),
        }
    }

    pub(crate) fn into_update_detail(self, partial: PartialFailure) -> Self {
        let status = self.status();
        Error::UpdateDetailFailed {
            status,
            message: self.to_string(),
            partial,
        }
    }

    pub(crate) fn into_delete(self, partial: Option<PartialFailure>) -> Self {
        let status = self.status();
        Error::DeleteFailed {
            status,
            message: self.to_string(),
            partial,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Turn a backend error body into one readable message.
///
/// Precedence: a `detail` string, then field errors joined as
/// `field: msg1 msg2 | other: msg`, then the raw JSON, then `fallback`.
pub fn format_error_body(body: &Value, fallback: &str) -> String {
    match body {
        Value::String(text) if !text.is_empty() => text.clone(),
        Value::Object(map) => {
            match map.get("detail") {
                Some(Value::String(detail)) if !detail.is_empty() => return detail.clone(),
                _ => {}
            }
            let parts: Vec<String> = map
                .iter()
                .filter(|(field, value)| !(field.as_str() == "detail" && is_blank(value)))
                .map(|(field, value)| format!("{}: {}", field, flatten_messages(value)))
                .collect();
            if parts.is_empty() {
                fallback.to_string()
            } else {
                parts.join(" | ")
            }
        }
        Value::Array(items) if !items.is_empty() => {
            let text = flatten_messages(body);
            if text.is_empty() {
                body.to_string()
            } else {
                text
            }
        }
        Value::Null | Value::Array(_) | Value::String(_) => fallback.to_string(),
        other => other.to_string(),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

fn flatten_messages(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(flatten_messages)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
