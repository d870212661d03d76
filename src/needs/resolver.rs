//! Locating the detail row that belongs to a base need

use serde_json::Value;

use crate::fetch::coerce_id;

/// Pick the id of the first row whose `need` field, read as a string,
/// equals `need_id` exactly. The backend filter is not trusted to be strict.
pub fn select_detail_id(rows: &[Value], need_id: i64) -> Option<i64> {
    let wanted = need_id.to_string();
    rows.iter()
        .find(|row| row.get("need").and_then(fk_as_string).as_deref() == Some(wanted.as_str()))
        .and_then(|row| row.get("id"))
        .and_then(coerce_id)
}

fn fk_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
