//! The orchestration engine: option collection, task selection, and the
//! chained run loop, plus the memoized remote lookups tasks build on.
//!
//! ```text
//! CollectingRequiredOptions -> SelectingTask -> RunningTask -+-> SelectingTask (task chains)
//!                                                            +-> Terminated
//! ```
//!
//! All remote lookups go through the cache. Keys carry a per-lookup prefix
//! so unrelated lookups never collide.

use std::collections::HashMap;
use std::io::{self, Write};
use std::time::Duration;

use futures::future::join_all;

use crate::cache::{CacheStore, CachedValue};
use crate::config::Config;
use crate::context::ServiceContext;
use crate::error::{self, Error};
use crate::issue::IssueRecord;
use crate::options::OptionSet;
use crate::ports::issues::{IssueTracker, TrackerIssue, Version};
use crate::ports::prompt::{non_empty, Answers, Choice, Prompter, Question};
use crate::ports::vcs::{ReleaseRequest, ReleaseResponse, RepoHandle, VcsHost};
use crate::references::{credited_keys, ReferenceMatcher};
use crate::report::{error_line, Report, ReportKind};
use crate::tasks::registry::{Layer, TaskRegistry};
use crate::tasks::{app, system, TaskDescriptor, TaskOutcome};

/// Name of the task-selector question.
pub const TASK_QUESTION: &str = "task";

/// Options the engine cannot run without, with their prompts.
const REQUIRED_OPTIONS: [(&str, &str); 4] = [
    ("repo", "Repo:"),
    ("base", "Base Branch/Tag:"),
    ("head", "Head Branch/Tag:"),
    ("project_key", "Jira Project Key:"),
];

/// What happens when a task fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// End the run and hand the error to the process boundary.
    #[default]
    Terminate,
    /// Describe the error on the output and return to task selection.
    ReturnToMenu,
}

enum State {
    CollectingRequiredOptions,
    SelectingTask,
    RunningTask { task: TaskDescriptor, answers: Answers },
    Terminated,
}

/// Owns the options, cache, task registry, and collaborators of one run.
pub struct Engine {
    config: Config,
    options: OptionSet,
    cache: CacheStore,
    cache_ttl: Option<Duration>,
    registry: TaskRegistry,
    vcs: Box<dyn VcsHost>,
    tracker: Box<dyn IssueTracker>,
    prompter: Box<dyn Prompter>,
    out: Box<dyn Write + Send>,
    default_report: ReportKind,
    task_report: ReportKind,
    error_policy: ErrorPolicy,
}

impl Engine {
    /// Creates an engine from config, command-line options, caller tasks,
    /// and collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if credentials or endpoints are missing.
    pub fn new(
        config: Config,
        cli: HashMap<String, String>,
        user_tasks: Vec<TaskDescriptor>,
        ctx: ServiceContext,
    ) -> Result<Self, Error> {
        config.validate()?;

        let mut registry = TaskRegistry::new();
        registry.register(Layer::System, system::tasks());
        registry.register(Layer::App, app::tasks());
        registry.register(Layer::User, user_tasks);
        for name in registry.shadowed(Layer::User) {
            tracing::warn!(task = name, "custom task is hidden by a built-in task of the same name");
        }

        Ok(Self {
            options: OptionSet::new(cli, config.option_defaults()),
            cache: CacheStore::new(ctx.clock),
            cache_ttl: config.cache_ttl_secs.map(Duration::from_secs),
            config,
            registry,
            vcs: ctx.vcs,
            tracker: ctx.tracker,
            prompter: ctx.prompter,
            out: Box::new(io::stdout()),
            default_report: ReportKind::default(),
            task_report: ReportKind::default(),
            error_policy: ErrorPolicy::default(),
        })
    }

    /// Sends report and task output to `out` instead of stdout.
    #[must_use]
    pub fn with_output(mut self, out: Box<dyn Write + Send>) -> Self {
        self.out = out;
        self
    }

    /// Chooses what happens when a task fails.
    pub fn set_error_policy(&mut self, policy: ErrorPolicy) {
        self.error_policy = policy;
    }

    // --- options ---

    /// Resolved value of an option, or an empty string.
    #[must_use]
    pub fn option(&self, name: &str) -> String {
        self.options.resolve(name)
    }

    /// Stores an option value for the rest of the run.
    pub fn set_option(&mut self, name: &str, value: &str) {
        self.options.set(name, value);
    }

    /// `owner/name` of the repository.
    #[must_use]
    pub fn repo_name(&self) -> String {
        self.option("repo")
    }

    /// Base branch or tag.
    #[must_use]
    pub fn base(&self) -> String {
        self.option("base")
    }

    /// Head branch or tag.
    #[must_use]
    pub fn head(&self) -> String {
        self.option("head")
    }

    /// Tracker project key.
    #[must_use]
    pub fn project_key(&self) -> String {
        self.option("project_key")
    }

    /// Name of the release being reported.
    #[must_use]
    pub fn release_name(&self) -> String {
        self.option("release_name")
    }

    /// Tag to create for the release.
    #[must_use]
    pub fn release_tag(&self) -> String {
        self.option("release_tag")
    }

    /// Issue field reports are grouped by.
    #[must_use]
    pub fn grouping_field(&self) -> String {
        self.option("group_by_field")
    }

    /// Whether verbose diagnostics were requested.
    #[must_use]
    pub fn debug(&self) -> bool {
        !self.option("debug").is_empty()
    }

    // --- tasks and reports ---

    /// The task registry.
    #[must_use]
    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Sets the report kind used by tasks without their own override.
    pub fn set_default_report_kind(&mut self, kind: ReportKind) {
        self.default_report = kind;
    }

    /// Sets the report kind for one task. Returns whether the task exists.
    pub fn override_task_report_kind(&mut self, task: &str, kind: ReportKind) -> bool {
        self.registry.override_report_kind(task, kind)
    }

    /// A new report of the active task's kind.
    #[must_use]
    pub fn new_report(&self, title: impl Into<String>, issues: Vec<IssueRecord>) -> Report {
        Report::new(self.task_report, title, issues)
    }

    /// Writes a report to the output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the output cannot be written.
    pub fn emit(&mut self, report: &Report) -> Result<(), Error> {
        report.render_to(&mut self.out)?;
        Ok(())
    }

    /// Writes one line to the output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the output cannot be written.
    pub fn say(&mut self, line: impl AsRef<str>) -> Result<(), Error> {
        writeln!(self.out, "{}", line.as_ref())?;
        Ok(())
    }

    /// Asks the user to pick one of `choices` and returns its value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Prompt`] if the prompt fails or yields no answer.
    pub fn ask_choice(&mut self, message: &str, choices: Vec<Choice>) -> Result<String, Error> {
        let question = Question::choice("user_choice", message, choices);
        let mut answers = self.prompter.ask(&[question]).map_err(Error::Prompt)?;
        answers.remove("user_choice").ok_or_else(|| Error::Prompt("no choice was made".into()))
    }

    /// Empties the cache.
    pub fn reset_cache(&mut self) {
        self.cache.flush_all();
    }

    fn cache_get(&self, key: &str) -> Option<&CachedValue> {
        let value = self.cache.get(key);
        if value.is_some() {
            tracing::debug!("Retrieved from cache: {key}");
        }
        value
    }

    fn cache_set(&mut self, key: String, value: CachedValue) {
        tracing::debug!("Cache set: {key}");
        self.cache.set(key, value, self.cache_ttl);
    }

    // --- run loop ---

    /// Runs the interactive loop until a task ends it.
    ///
    /// # Errors
    ///
    /// Returns prompt failures, and task failures under
    /// [`ErrorPolicy::Terminate`].
    pub async fn run(&mut self) -> Result<(), Error> {
        let mut state = State::CollectingRequiredOptions;
        loop {
            state = match state {
                State::CollectingRequiredOptions => {
                    self.collect_required_options()?;
                    State::SelectingTask
                }
                State::SelectingTask => self.select_task()?,
                State::RunningTask { task, answers } => self.run_task(&task, &answers).await?,
                State::Terminated => return Ok(()),
            };
        }
    }

    /// One text question per required option that does not resolve.
    #[must_use]
    pub fn missing_option_questions(&self) -> Vec<Question> {
        REQUIRED_OPTIONS
            .iter()
            .filter(|(name, _)| self.option(name).is_empty())
            .map(|(name, message)| Question::text(*name, *message).validated(non_empty))
            .collect()
    }

    /// The task menu followed by every task's questions, each gated on its
    /// task being chosen and defaulting to the option's current value.
    #[must_use]
    pub fn selection_questions(&self) -> Vec<Question> {
        let tasks = self.registry.resolve_all();
        let choices = tasks.iter().map(|task| Choice::new(task.label(), task.name())).collect();
        let mut questions =
            vec![Question::choice(TASK_QUESTION, "What would you like to do?", choices)];

        for task in &tasks {
            for question in task.questions() {
                let mut question = question.clone().gated(TASK_QUESTION, task.name());
                let current = self.option(&question.name);
                if !current.is_empty() {
                    question.default = Some(current);
                }
                questions.push(question);
            }
        }
        questions
    }

    fn collect_required_options(&mut self) -> Result<(), Error> {
        let questions = self.missing_option_questions();
        if questions.is_empty() {
            return Ok(());
        }
        let answers = self.prompter.ask(&questions).map_err(Error::Prompt)?;
        self.options.merge_non_empty(&answers);
        Ok(())
    }

    fn select_task(&mut self) -> Result<State, Error> {
        let questions = self.selection_questions();
        let answers = self.prompter.ask(&questions).map_err(Error::Prompt)?;
        let name = answers.get(TASK_QUESTION).cloned().unwrap_or_default();
        let task = self.registry.lookup(&name).cloned().ok_or(Error::UnknownTask(name))?;
        Ok(State::RunningTask { task, answers })
    }

    async fn run_task(&mut self, task: &TaskDescriptor, answers: &Answers) -> Result<State, Error> {
        self.options.merge_except(answers, TASK_QUESTION);
        self.task_report = task.report_kind().unwrap_or(self.default_report);
        tracing::debug!(task = task.name(), "running task");

        let handler = task.handler();
        match handler.run(self, answers).await {
            Ok(TaskOutcome::Exit) => Ok(State::Terminated),
            Ok(TaskOutcome::Completed) if task.chains() => Ok(State::SelectingTask),
            Ok(TaskOutcome::Completed) => Ok(State::Terminated),
            Err(err) => match self.error_policy {
                ErrorPolicy::Terminate => Err(err),
                ErrorPolicy::ReturnToMenu => {
                    let description = error::describe(&err, self.debug());
                    self.say(error_line(&description))?;
                    Ok(State::SelectingTask)
                }
            },
        }
    }

    // --- memoized lookups ---

    /// The remote repository named by the `repo` option.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRepository`] for a name not of the form
    /// `owner/name`, or [`Error::Remote`] if the lookup fails.
    pub async fn repository(&mut self) -> Result<RepoHandle, Error> {
        let repo_name = self.repo_name();
        let key = format!("repo:{repo_name}");
        if let Some(CachedValue::Repository(repo)) = self.cache_get(&key) {
            return Ok(repo.clone());
        }

        let (owner, name) = split_repo(&repo_name)?;
        let repo = self
            .vcs
            .repository(owner, name)
            .await
            .map_err(|e| Error::remote(format!("Unable to load repository {repo_name}."), e))?;
        self.cache_set(key, CachedValue::Repository(repo.clone()));
        Ok(repo)
    }

    /// Issue keys credited by commits between base and head, sorted numerically.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository or comparison cannot be loaded, or
    /// the project key is unusable as a pattern.
    pub async fn commit_credits(&mut self) -> Result<Vec<String>, Error> {
        let (base, head, project) = (self.base(), self.head(), self.project_key());
        let key = format!("credits:{}:{project}:{base}...{head}", self.repo_name());
        if let Some(CachedValue::IssueKeys(keys)) = self.cache_get(&key) {
            return Ok(keys.clone());
        }

        let matcher = ReferenceMatcher::new(&project)
            .map_err(|e| Error::Configuration(format!("Invalid project key '{project}': {e}")))?;
        let repo = self.repository().await?;
        let comparison = self
            .vcs
            .compare(&repo, &base, &head)
            .await
            .map_err(|e| Error::remote(format!("Unable to compare {base}...{head}."), e))?;

        let credited =
            credited_keys(&matcher, comparison.commits.iter().map(|commit| commit.message.as_str()));
        self.cache_set(key, CachedValue::IssueKeys(credited.clone()));
        Ok(credited)
    }

    /// One issue by key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LookupNotFound`] if the tracker cannot load it.
    pub async fn issue(&mut self, key: &str) -> Result<IssueRecord, Error> {
        let cache_key = issue_cache_key(key);
        if let Some(CachedValue::Issue(issue)) = self.cache_get(&cache_key) {
            return Ok(issue.clone());
        }

        let raw = self
            .tracker
            .find_issue(key)
            .await
            .map_err(|source| Error::LookupNotFound { key: key.to_string(), source })?;
        let record = self.normalize(key, &raw);
        self.cache_set(cache_key, CachedValue::Issue(record.clone()));
        Ok(record)
    }

    /// Issues for `keys`, in input order, fetched concurrently.
    ///
    /// A key that fails to load is logged as a warning and left out; it
    /// never fails the batch.
    pub async fn issues(&mut self, keys: &[String]) -> Vec<IssueRecord> {
        let mut loaded: HashMap<&str, IssueRecord> = HashMap::new();
        let mut pending: Vec<&str> = Vec::new();
        for key in keys {
            if loaded.contains_key(key.as_str()) || pending.contains(&key.as_str()) {
                continue;
            }
            match self.cache_get(&issue_cache_key(key)) {
                Some(CachedValue::Issue(issue)) => {
                    loaded.insert(key, issue.clone());
                }
                _ => pending.push(key),
            }
        }

        let tracker = &self.tracker;
        let fetched =
            join_all(pending.into_iter().map(|key| async move { (key, tracker.find_issue(key).await) }))
                .await;

        for (key, result) in fetched {
            match result {
                Ok(raw) => {
                    let record = self.normalize(key, &raw);
                    self.cache_set(issue_cache_key(key), CachedValue::Issue(record.clone()));
                    loaded.insert(key, record);
                }
                Err(source) => {
                    let err = Error::LookupNotFound { key: key.to_string(), source };
                    tracing::warn!(key, "{err}");
                }
            }
        }

        keys.iter().filter_map(|key| loaded.get(key.as_str()).cloned()).collect()
    }

    /// Unreleased, unarchived versions of the project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the versions cannot be loaded.
    pub async fn active_versions(&mut self) -> Result<Vec<Version>, Error> {
        let project = self.project_key();
        let key = format!("versions:{project}");
        if let Some(CachedValue::Versions(versions)) = self.cache_get(&key) {
            return Ok(versions.clone());
        }

        let versions = self
            .tracker
            .versions(&project)
            .await
            .map_err(|e| Error::remote(format!("Unable to load versions for {project}."), e))?;
        let active: Vec<Version> =
            versions.into_iter().filter(|v| !v.released && !v.archived).collect();
        self.cache_set(key, CachedValue::Versions(active.clone()));
        Ok(active)
    }

    /// Issues tagged with fix version `version`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the search fails. Individual issues that
    /// fail to load are dropped as in [`Engine::issues`].
    pub async fn version_issues(&mut self, version: &str) -> Result<Vec<IssueRecord>, Error> {
        let project = self.project_key();
        let key = format!("version-issues:{project}:{version}");
        if let Some(CachedValue::Issues(issues)) = self.cache_get(&key) {
            return Ok(issues.clone());
        }

        let query =
            format!("project = {project} AND fixVersion = \"{}\"", version.replace('"', "\\\""));
        let keys = self
            .tracker
            .search(&query)
            .await
            .map_err(|e| Error::remote(format!("Unable to search issues in '{version}'."), e))?;
        let issues = self.issues(&keys).await;
        self.cache_set(key, CachedValue::Issues(issues.clone()));
        Ok(issues)
    }

    /// Creates a release on the repository.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Publish`] if the host rejects the release.
    pub async fn create_release(&mut self, request: &ReleaseRequest) -> Result<ReleaseResponse, Error> {
        let repo = self.repository().await?;
        self.vcs.create_release(&repo, request).await.map_err(|source| Error::Publish { source })
    }

    fn normalize(&self, key: &str, raw: &TrackerIssue) -> IssueRecord {
        let mut record =
            IssueRecord::from_tracker(raw, self.tracker.browse_url(key), &self.config.jira_fields);
        record.issue_key = key.to_string();
        record
    }
}

fn issue_cache_key(key: &str) -> String {
    format!("issue:{key}")
}

fn split_repo(repo_name: &str) -> Result<(&str, &str), Error> {
    match repo_name.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner, name))
        }
        _ => Err(Error::InvalidRepository(repo_name.to_string())),
    }
}
