//! Local checks that run before a request is sent

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

pub(crate) fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::validation("title: This field is required."));
    }
    Ok(())
}

pub(crate) fn validate_amount(field: &str, raw: &str) -> Result<()> {
    let trimmed = raw.trim();
    let well_formed = !trimmed.is_empty()
        && trimmed.chars().filter(|c| *c == '.').count() <= 1
        && trimmed.chars().all(|c| c.is_ascii_digit() || c == '.')
        && trimmed.chars().any(|c| c.is_ascii_digit());
    if !well_formed {
        return Err(Error::validation(format!(
            "{}: A valid non-negative number is required.",
            field
        )));
    }
    Ok(())
}

pub(crate) fn validate_window(start: &DateTime<Utc>, end: &DateTime<Utc>) -> Result<()> {
    if end <= start {
        return Err(Error::validation(
            "end_datetime: End time must be after start time.",
        ));
    }
    Ok(())
}
