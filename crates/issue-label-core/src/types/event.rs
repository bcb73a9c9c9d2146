//! Queue event describing one issue to label.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

pub const ATTR_INSTALLATION_ID: &str = "installation_id";
pub const ATTR_REPO_OWNER: &str = "repo_owner";
pub const ATTR_REPO_NAME: &str = "repo_name";
pub const ATTR_ISSUE_NUM: &str = "issue_num";

/// The unit of work consumed from the queue.
///
/// All attributes travel as strings; `issue_num` is parsed on extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueEvent {
    pub installation_id: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub issue_num: u64,
}

impl IssueEvent {
    pub fn new(
        installation_id: impl Into<String>,
        repo_owner: impl Into<String>,
        repo_name: impl Into<String>,
        issue_num: u64,
    ) -> Self {
        Self {
            installation_id: installation_id.into(),
            repo_owner: repo_owner.into(),
            repo_name: repo_name.into(),
            issue_num,
        }
    }

    /// Extract an event from message attributes.
    ///
    /// # Errors
    /// - `InvalidEvent` when an attribute is missing or `issue_num` is not an integer
    pub fn from_attributes(attributes: &HashMap<String, String>) -> CoreResult<Self> {
        let get = |field: &str| -> CoreResult<String> {
            attributes
                .get(field)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| CoreError::InvalidEvent {
                    field: field.to_string(),
                    message: "missing attribute".to_string(),
                })
        };

        let raw_num = get(ATTR_ISSUE_NUM)?;
        let issue_num = raw_num.parse::<u64>().map_err(|e| CoreError::InvalidEvent {
            field: ATTR_ISSUE_NUM.to_string(),
            message: format!("'{}' is not an issue number: {}", raw_num, e),
        })?;

        Ok(Self {
            installation_id: get(ATTR_INSTALLATION_ID)?,
            repo_owner: get(ATTR_REPO_OWNER)?,
            repo_name: get(ATTR_REPO_NAME)?,
            issue_num,
        })
    }
}

impl fmt::Display for IssueEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.repo_owner, self.repo_name, self.issue_num)
    }
}
