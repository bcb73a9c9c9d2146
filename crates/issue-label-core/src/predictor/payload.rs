//! Parsing of loosely typed prediction requests.

use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult};
use crate::types::ATTR_ISSUE_NUM;

/// Fields selecting the raw-text path.
pub const TEXT_KEYS: [&str; 3] = ["title", "text", "model_name"];

/// Fields selecting the stored-issue path.
pub const ISSUE_KEYS: [&str; 3] = ["repo_owner", "repo_name", ATTR_ISSUE_NUM];

/// A request after field-set dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictRequest {
    Text {
        model_name: String,
        org: String,
        repo: String,
        title: String,
        text: Vec<String>,
    },
    Issue {
        org: String,
        repo: String,
        issue_num: u64,
        model_name: Option<String>,
    },
}

impl PredictRequest {
    /// The text field set wins when both are complete.
    pub fn from_payload(payload: &Map<String, Value>) -> CoreResult<Self> {
        let has_all = |keys: &[&str]| keys.iter().all(|k| payload.contains_key(*k));

        if has_all(&TEXT_KEYS[..]) {
            return Ok(PredictRequest::Text {
                model_name: string_field(payload, "model_name")?,
                org: optional_string(payload, "repo_owner")?.unwrap_or_default(),
                repo: optional_string(payload, "repo_name")?.unwrap_or_default(),
                title: string_field(payload, "title")?,
                text: text_field(payload, "text")?,
            });
        }

        if has_all(&ISSUE_KEYS[..]) {
            return Ok(PredictRequest::Issue {
                org: string_field(payload, "repo_owner")?,
                repo: string_field(payload, "repo_name")?,
                issue_num: issue_num_field(payload)?,
                model_name: optional_string(payload, "model_name")?,
            });
        }

        let mut got: Vec<&str> = payload.keys().map(String::as_str).collect();
        got.sort_unstable();
        Err(CoreError::MissingFields {
            got: format!("[{}]", got.join(",")),
            want: format!("[{}] or [{}]", TEXT_KEYS.join(","), ISSUE_KEYS.join(",")),
        })
    }
}

fn invalid(field: &str, message: impl Into<String>) -> CoreError {
    CoreError::InvalidPayload {
        field: field.to_string(),
        message: message.into(),
    }
}

fn string_field(payload: &Map<String, Value>, field: &str) -> CoreResult<String> {
    match payload.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(invalid(field, format!("expected a string, got {}", other))),
        None => Err(invalid(field, "missing")),
    }
}

fn optional_string(payload: &Map<String, Value>, field: &str) -> CoreResult<Option<String>> {
    match payload.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => string_field(payload, field).map(Some),
    }
}

/// `text` may be one string or a list of strings.
fn text_field(payload: &Map<String, Value>, field: &str) -> CoreResult<Vec<String>> {
    match payload.get(field) {
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid(field, format!("expected strings, got {}", item)))
            })
            .collect(),
        Some(other) => Err(invalid(field, format!("expected a string or list, got {}", other))),
        None => Err(invalid(field, "missing")),
    }
}

/// `issue_num` arrives as a number or as a numeric string.
fn issue_num_field(payload: &Map<String, Value>) -> CoreResult<u64> {
    match payload.get(ATTR_ISSUE_NUM) {
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| invalid(ATTR_ISSUE_NUM, format!("{} is not an issue number", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| invalid(ATTR_ISSUE_NUM, format!("'{}' is not an issue number", s))),
        Some(other) => Err(invalid(ATTR_ISSUE_NUM, format!("unexpected value {}", other))),
        None => Err(invalid(ATTR_ISSUE_NUM, "missing")),
    }
}
