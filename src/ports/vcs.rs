//! Version-control host port: repository lookup, branch comparison, releases.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::PortError;

/// Boxed future type alias used by the remote ports to keep them dyn-compatible.
pub type PortFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PortError>> + Send + 'a>>;

/// A resolved remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoHandle {
    /// Owning user or organisation.
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// Web URL of the repository.
    pub html_url: String,
}

/// One commit in a comparison, reduced to what reference matching needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// Full commit message.
    pub message: String,
}

/// Result of comparing two refs, commits in host order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    /// Commits reachable from head but not base.
    pub commits: Vec<CommitSummary>,
}

/// Payload for creating a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRequest {
    /// Tag to create or reuse.
    pub tag_name: String,
    /// Branch or commit the tag points at.
    pub target_commitish: String,
    /// Release title.
    pub name: String,
    /// Release notes.
    pub body: String,
    /// Whether to create an unpublished draft.
    pub draft: bool,
    /// Whether to mark the release as a prerelease.
    pub prerelease: bool,
}

/// What the host answered to a release request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseResponse {
    /// HTTP status code; 201 means created.
    pub status_code: u16,
    /// Web URL of the release.
    pub html_url: String,
}

/// A hosted version-control service.
pub trait VcsHost: Send + Sync {
    /// Looks up a repository by owner and name.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository does not exist or is not accessible.
    fn repository<'a>(&'a self, owner: &'a str, name: &'a str) -> PortFuture<'a, RepoHandle>;

    /// Lists the commits between `base` and `head`.
    ///
    /// # Errors
    ///
    /// Returns an error if either ref is unknown or the request fails.
    fn compare<'a>(
        &'a self,
        repo: &'a RepoHandle,
        base: &'a str,
        head: &'a str,
    ) -> PortFuture<'a, Comparison>;

    /// Creates a release.
    ///
    /// # Errors
    ///
    /// Returns an error if the host rejects the release or the request fails.
    fn create_release<'a>(
        &'a self,
        repo: &'a RepoHandle,
        release: &'a ReleaseRequest,
    ) -> PortFuture<'a, ReleaseResponse>;
}
