//! Normalized issue records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::FieldMapping;
use crate::ports::issues::TrackerIssue;

/// An issue reduced to what reports need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Issue key, e.g. `ABC-123`.
    pub issue_key: String,
    /// One-line summary.
    pub title: String,
    /// Issue type name.
    pub issue_type: String,
    /// Web URL of the issue.
    pub url: String,
    /// Configured extra fields, keyed by output key.
    pub extra: BTreeMap<String, Value>,
}

impl IssueRecord {
    /// Normalizes a tracker issue, copying only the mapped extra fields.
    #[must_use]
    pub fn from_tracker(issue: &TrackerIssue, url: String, mappings: &[FieldMapping]) -> Self {
        let extra = mappings
            .iter()
            .filter_map(|mapping| {
                issue.fields.get(&mapping.field_name).map(|value| (mapping.key.clone(), value.clone()))
            })
            .collect();

        Self {
            issue_key: issue.key.clone(),
            title: issue.summary.clone(),
            issue_type: issue.issue_type.clone(),
            url,
            extra,
        }
    }

    /// Display value of a built-in or extra field; `None` when absent or empty.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<String> {
        let builtin = match name {
            "issue_key" | "issueKey" | "issueNumber" | "key" => Some(&self.issue_key),
            "title" | "summary" => Some(&self.title),
            "issue_type" | "issueType" | "type" => Some(&self.issue_type),
            "url" => Some(&self.url),
            _ => None,
        };
        let value = match builtin {
            Some(value) => Some(value.clone()),
            None => self.extra.get(name).and_then(value_label),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Renders a raw field value as a grouping label.
fn value_label(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        Value::Object(map) => map.get("name").or_else(|| map.get("value")).and_then(value_label),
        Value::Array(items) => {
            let labels: Vec<String> = items.iter().filter_map(value_label).collect();
            (!labels.is_empty()).then(|| labels.join(", "))
        }
    }
}
