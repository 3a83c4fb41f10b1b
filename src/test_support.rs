//! In-memory fakes for the ports, shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Map;

use crate::config::{Config, FieldMapping};
use crate::context::ServiceContext;
use crate::engine::Engine;
use crate::error::PortError;
use crate::issue::IssueRecord;
use crate::ports::clock::Clock;
use crate::ports::issues::{IssueTracker, TrackerIssue, Version};
use crate::ports::prompt::{Answers, Prompter, Question};
use crate::ports::vcs::{
    CommitSummary, Comparison, PortFuture, ReleaseRequest, ReleaseResponse, RepoHandle, VcsHost,
};
use crate::tasks::TaskDescriptor;

/// Clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new() -> Self {
        let start = Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap();
        Self { now: Arc::new(Mutex::new(start)) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(by).unwrap();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Issue record with a browse URL on `jira.example.com`.
pub fn issue(key: &str, title: &str, issue_type: &str) -> IssueRecord {
    IssueRecord {
        issue_key: key.into(),
        title: title.into(),
        issue_type: issue_type.into(),
        url: format!("https://jira.example.com/browse/{key}"),
        extra: std::collections::BTreeMap::new(),
    }
}

/// Valid config with project key `ABC` and one extra field mapping.
pub fn sample_config() -> Config {
    Config {
        github_api: "https://api.github.com".into(),
        github_token: "notarealtoken".into(),
        jira_api: "https://jira.example.com".into(),
        jira_username: "fakey@example.com".into(),
        jira_token: "notarealapikey".into(),
        repo: Some("acme/widgets".into()),
        group_by_field: None,
        project_key: Some("ABC".into()),
        jira_fields: vec![FieldMapping { field_name: "customfield_10200".into(), key: "ac".into() }],
        cache_ttl_secs: None,
    }
}

/// Counts calls per remote method.
#[derive(Clone, Default)]
pub struct CallLog {
    counts: Arc<Mutex<HashMap<String, usize>>>,
}

impl CallLog {
    fn record(&self, method: &str) {
        *self.counts.lock().unwrap().entry(method.to_string()).or_default() += 1;
    }

    pub fn count(&self, method: &str) -> usize {
        self.counts.lock().unwrap().get(method).copied().unwrap_or(0)
    }
}

/// Version-control host serving fixed commits.
#[derive(Clone, Default)]
pub struct FakeVcs {
    pub messages: Vec<String>,
    pub release_status: u16,
    pub release_error: Option<String>,
    pub releases: Arc<Mutex<Vec<ReleaseRequest>>>,
    pub calls: CallLog,
}

impl FakeVcs {
    pub fn with_messages(messages: &[&str]) -> Self {
        Self {
            messages: messages.iter().map(ToString::to_string).collect(),
            release_status: 201,
            ..Self::default()
        }
    }
}

impl VcsHost for FakeVcs {
    fn repository<'a>(&'a self, owner: &'a str, name: &'a str) -> PortFuture<'a, RepoHandle> {
        self.calls.record("repository");
        Box::pin(async move {
            Ok(RepoHandle {
                owner: owner.to_string(),
                name: name.to_string(),
                html_url: format!("https://github.com/{owner}/{name}"),
            })
        })
    }

    fn compare<'a>(
        &'a self,
        _repo: &'a RepoHandle,
        _base: &'a str,
        _head: &'a str,
    ) -> PortFuture<'a, Comparison> {
        self.calls.record("compare");
        let commits =
            self.messages.iter().map(|m| CommitSummary { message: m.clone() }).collect();
        Box::pin(async move { Ok(Comparison { commits }) })
    }

    fn create_release<'a>(
        &'a self,
        repo: &'a RepoHandle,
        release: &'a ReleaseRequest,
    ) -> PortFuture<'a, ReleaseResponse> {
        self.calls.record("create_release");
        Box::pin(async move {
            if let Some(message) = &self.release_error {
                return Err(PortError::from(message.clone()));
            }
            self.releases.lock().unwrap().push(release.clone());
            Ok(ReleaseResponse {
                status_code: self.release_status,
                html_url: format!("{}/releases/tag/{}", repo.html_url, release.tag_name),
            })
        })
    }
}

/// Issue tracker backed by a map; unknown keys fail like a 404.
#[derive(Clone, Default)]
pub struct FakeTracker {
    pub issues: HashMap<String, TrackerIssue>,
    pub versions: Vec<Version>,
    pub version_issues: HashMap<String, Vec<String>>,
    pub calls: CallLog,
    pub queries: Arc<Mutex<Vec<String>>>,
}

impl FakeTracker {
    pub fn with_issues(specs: &[(&str, &str, &str)]) -> Self {
        let issues = specs
            .iter()
            .map(|(key, summary, issue_type)| {
                let mut fields = Map::new();
                fields.insert("customfield_10200".into(), format!("AC for {key}").into());
                fields.insert("labels".into(), serde_json::json!(["internal"]));
                let issue = TrackerIssue {
                    key: (*key).to_string(),
                    summary: (*summary).to_string(),
                    issue_type: (*issue_type).to_string(),
                    fields,
                };
                ((*key).to_string(), issue)
            })
            .collect();
        Self { issues, ..Self::default() }
    }
}

impl IssueTracker for FakeTracker {
    fn find_issue<'a>(&'a self, key: &'a str) -> PortFuture<'a, TrackerIssue> {
        self.calls.record("find_issue");
        Box::pin(async move {
            self.issues
                .get(key)
                .cloned()
                .ok_or_else(|| PortError::from(format!("Issue does not exist: {key}")))
        })
    }

    fn search<'a>(&'a self, query: &'a str) -> PortFuture<'a, Vec<String>> {
        self.calls.record("search");
        self.queries.lock().unwrap().push(query.to_string());
        Box::pin(async move {
            let keys = self
                .version_issues
                .iter()
                .find(|(version, _)| query.contains(&format!("fixVersion = \"{version}\"")))
                .map(|(_, keys)| keys.clone())
                .unwrap_or_default();
            Ok(keys)
        })
    }

    fn versions<'a>(&'a self, _project_key: &'a str) -> PortFuture<'a, Vec<Version>> {
        self.calls.record("versions");
        let versions = self.versions.clone();
        Box::pin(async move { Ok(versions) })
    }

    fn browse_url(&self, key: &str) -> String {
        format!("https://jira.example.com/browse/{key}")
    }
}

/// Prompter answering from a script and recording every batch it was asked.
///
/// Each scripted response is consulted per question: questions whose gate is
/// closed are skipped, unanswered questions fall back to their default.
#[derive(Clone, Default)]
pub struct ScriptedPrompter {
    script: Arc<Mutex<VecDeque<Answers>>>,
    pub asked: Arc<Mutex<Vec<Vec<Question>>>>,
}

impl ScriptedPrompter {
    pub fn new(script: Vec<Vec<(&str, &str)>>) -> Self {
        let script = script
            .into_iter()
            .map(|pairs| {
                pairs.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
            })
            .collect();
        Self { script: Arc::new(Mutex::new(script)), asked: Arc::default() }
    }

    pub fn batches(&self) -> usize {
        self.asked.lock().unwrap().len()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, questions: &[Question]) -> Result<Answers, PortError> {
        self.asked.lock().unwrap().push(questions.to_vec());
        if questions.is_empty() {
            return Ok(Answers::new());
        }
        let scripted =
            self.script.lock().unwrap().pop_front().ok_or("prompt script exhausted")?;

        let mut answers = Answers::new();
        for question in questions {
            if !question.is_active(&answers) {
                continue;
            }
            let value = scripted
                .get(&question.name)
                .cloned()
                .or_else(|| question.default.clone())
                .unwrap_or_default();
            answers.insert(question.name.clone(), value);
        }
        Ok(answers)
    }
}

/// Counts how many times something ran.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Writer whose contents stay readable after it is boxed away.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Bundles fakes into a service context.
pub fn fake_context(vcs: FakeVcs, tracker: FakeTracker, prompter: ScriptedPrompter) -> ServiceContext {
    fake_context_with_clock(ManualClock::new(), vcs, tracker, prompter)
}

/// Like [`fake_context`], with a clock the test keeps a handle to.
pub fn fake_context_with_clock(
    clock: ManualClock,
    vcs: FakeVcs,
    tracker: FakeTracker,
    prompter: ScriptedPrompter,
) -> ServiceContext {
    ServiceContext {
        clock: Box::new(clock),
        vcs: Box::new(vcs),
        tracker: Box::new(tracker),
        prompter: Box::new(prompter),
    }
}

/// Tracker holding four `ABC` issues.
pub fn sample_tracker() -> FakeTracker {
    FakeTracker::with_issues(&[
        ("ABC-4", "Fix crash", "Bug"),
        ("ABC-12", "Add export", "Story"),
        ("ABC-423", "Tidy logs", "Task"),
        ("ABC-1034", "Speed up sync", "Story"),
    ])
}

/// Engine over fakes comparing `v1.0...v2.0` of `acme/widgets`, writing to a buffer.
pub fn test_engine(
    vcs: FakeVcs,
    tracker: FakeTracker,
    prompter: ScriptedPrompter,
    user_tasks: Vec<TaskDescriptor>,
) -> (Engine, SharedBuffer) {
    let cli = [("base", "v1.0"), ("head", "v2.0"), ("repo", "acme/widgets")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let out = SharedBuffer::default();
    let engine = Engine::new(sample_config(), cli, user_tasks, fake_context(vcs, tracker, prompter))
        .unwrap()
        .with_output(Box::new(out.clone()));
    (engine, out)
}
