//! Issue tracker port for loading issues, searches, and versions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::vcs::PortFuture;

/// An issue as the tracker returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerIssue {
    /// Issue key, e.g. `ABC-123`.
    pub key: String,
    /// One-line summary.
    pub summary: String,
    /// Name of the issue type ("Bug", "Story", ...).
    pub issue_type: String,
    /// Every raw field the tracker returned, keyed by source field name.
    pub fields: Map<String, Value>,
}

/// A project version (fix version).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Version name.
    pub name: String,
    /// Whether the version has shipped.
    #[serde(default)]
    pub released: bool,
    /// Whether the version was archived.
    #[serde(default)]
    pub archived: bool,
}

/// Reads issues from an external tracker.
pub trait IssueTracker: Send + Sync {
    /// Loads one issue by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key does not exist or the request fails.
    fn find_issue<'a>(&'a self, key: &'a str) -> PortFuture<'a, TrackerIssue>;

    /// Runs a query and returns the matching issue keys in tracker order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query is rejected or the request fails.
    fn search<'a>(&'a self, query: &'a str) -> PortFuture<'a, Vec<String>>;

    /// Lists every version of a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the project does not exist or the request fails.
    fn versions<'a>(&'a self, project_key: &'a str) -> PortFuture<'a, Vec<Version>>;

    /// Web URL for viewing an issue.
    fn browse_url(&self, key: &str) -> String;
}
