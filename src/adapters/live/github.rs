//! Live adapter for the `VcsHost` port using the GitHub REST API.

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::parse_url;
use crate::error::{Error, PortError};
use crate::ports::vcs::{
    CommitSummary, Comparison, PortFuture, ReleaseRequest, ReleaseResponse, RepoHandle, VcsHost,
};

const USER_AGENT: &str = concat!("relnote/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/vnd.github+json";

/// GitHub client authenticated with a personal access token.
pub struct GitHubClient {
    client: Client,
    base: Url,
    token: String,
}

impl GitHubClient {
    /// Creates a client for the API rooted at `api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `api_url` is not an absolute URL.
    pub fn new(api_url: &str, token: &str) -> Result<Self, Error> {
        Ok(Self { client: Client::new(), base: parse_url("github_api", api_url)?, token: token.into() })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, PortError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| PortError::from(format!("GitHub API URL cannot be a base: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, PortError> {
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.token)
            .header("user-agent", USER_AGENT)
            .header("accept", ACCEPT)
            .send()
            .await
            .map_err(|e| -> PortError { format!("GitHub request failed: {e}").into() })?;
        read_json(response, url.path()).await
    }
}

/// Repository as returned by `GET /repos/{owner}/{repo}`.
#[derive(Deserialize)]
struct RepoBody {
    html_url: String,
}

/// Comparison as returned by `GET /repos/{owner}/{repo}/compare/{base}...{head}`.
#[derive(Deserialize)]
struct CompareBody {
    commits: Vec<CompareCommit>,
}

#[derive(Deserialize)]
struct CompareCommit {
    commit: CommitBody,
}

#[derive(Deserialize)]
struct CommitBody {
    message: String,
}

#[derive(Deserialize)]
struct ReleaseBody {
    html_url: String,
}

/// Error body GitHub sends with non-success statuses.
#[derive(Deserialize)]
struct GitHubError {
    message: String,
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    path: &str,
) -> Result<T, PortError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| -> PortError { format!("Failed to read GitHub response: {e}").into() })?;

    if !status.is_success() {
        let msg = serde_json::from_str::<GitHubError>(&text).map(|e| e.message).unwrap_or(text);
        return Err(format!("GitHub API error ({}) for {path}: {msg}", status.as_u16()).into());
    }

    serde_json::from_str(&text)
        .map_err(|e| -> PortError { format!("Failed to parse GitHub response: {e}").into() })
}

impl VcsHost for GitHubClient {
    fn repository<'a>(&'a self, owner: &'a str, name: &'a str) -> PortFuture<'a, RepoHandle> {
        Box::pin(async move {
            let url = self.endpoint(&["repos", owner, name])?;
            let body: RepoBody = self.get(url).await?;
            Ok(RepoHandle { owner: owner.to_string(), name: name.to_string(), html_url: body.html_url })
        })
    }

    fn compare<'a>(
        &'a self,
        repo: &'a RepoHandle,
        base: &'a str,
        head: &'a str,
    ) -> PortFuture<'a, Comparison> {
        Box::pin(async move {
            let range = format!("{base}...{head}");
            let url = self.endpoint(&["repos", &repo.owner, &repo.name, "compare", &range])?;
            let body: CompareBody = self.get(url).await?;
            let commits = body
                .commits
                .into_iter()
                .map(|c| CommitSummary { message: c.commit.message })
                .collect();
            Ok(Comparison { commits })
        })
    }

    fn create_release<'a>(
        &'a self,
        repo: &'a RepoHandle,
        release: &'a ReleaseRequest,
    ) -> PortFuture<'a, ReleaseResponse> {
        Box::pin(async move {
            let url = self.endpoint(&["repos", &repo.owner, &repo.name, "releases"])?;
            let response = self
                .client
                .post(url.clone())
                .bearer_auth(&self.token)
                .header("user-agent", USER_AGENT)
                .header("accept", ACCEPT)
                .json(release)
                .send()
                .await
                .map_err(|e| -> PortError { format!("GitHub request failed: {e}").into() })?;
            let status_code = response.status().as_u16();
            let body: ReleaseBody = read_json(response, url.path()).await?;
            Ok(ReleaseResponse { status_code, html_url: body.html_url })
        })
    }
}
