//! Service context bundling all port trait objects.

use std::io;

use crate::adapters::live::clock::LiveClock;
use crate::adapters::live::github::GitHubClient;
use crate::adapters::live::jira::JiraClient;
use crate::adapters::live::terminal::TerminalPrompter;
use crate::config::Config;
use crate::error::Error;
use crate::ports::clock::Clock;
use crate::ports::issues::IssueTracker;
use crate::ports::prompt::Prompter;
use crate::ports::vcs::VcsHost;

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. The engine takes
/// ownership of the context at construction.
pub struct ServiceContext {
    /// Clock for cache expiry.
    pub clock: Box<dyn Clock>,
    /// Version-control host for comparisons and releases.
    pub vcs: Box<dyn VcsHost>,
    /// Issue tracker for issue, search, and version lookups.
    pub tracker: Box<dyn IssueTracker>,
    /// Prompt surface for interactive questions.
    pub prompter: Box<dyn Prompter>,
}

impl ServiceContext {
    /// Creates a live context talking to GitHub and Jira, prompting on the terminal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if credentials are missing or an API
    /// URL is malformed.
    pub fn live(config: &Config) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            clock: Box::new(LiveClock),
            vcs: Box::new(GitHubClient::new(&config.github_api, &config.github_token)?),
            tracker: Box::new(JiraClient::new(
                &config.jira_api,
                &config.jira_username,
                &config.jira_token,
            )?),
            prompter: Box::new(TerminalPrompter::new(io::BufReader::new(io::stdin()), io::stdout())),
        })
    }
}
