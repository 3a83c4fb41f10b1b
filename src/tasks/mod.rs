//! Task descriptors: named, user-selectable units of work.
//!
//! Built-in tasks live in [`system`] (cache flush, exit) and [`app`]
//! (reports and releases). Callers add their own through the user layer
//! of the [`registry::TaskRegistry`].

pub mod app;
pub mod registry;
pub mod system;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::engine::Engine;
use crate::error::Error;
use crate::ports::prompt::{Answers, Question};
use crate::report::ReportKind;

/// Future returned by a task run.
pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = Result<TaskOutcome, Error>> + 'a>>;

/// How a task run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The task finished; the engine consults the task's chaining flag.
    Completed,
    /// The task ends the run regardless of chaining.
    Exit,
}

/// The work a task performs.
pub trait TaskHandler: Send + Sync {
    /// Runs the task with the engine and the answers from the selection prompt.
    ///
    /// The answers have already been merged into the engine's options.
    ///
    /// # Errors
    ///
    /// Returns any engine or remote failure the task does not handle itself.
    fn run<'a>(&'a self, engine: &'a mut Engine, answers: &'a Answers) -> TaskFuture<'a>;
}

/// A registered task.
#[derive(Clone)]
pub struct TaskDescriptor {
    name: String,
    label: String,
    chains: bool,
    questions: Vec<Question>,
    report_kind: Option<ReportKind>,
    handler: Arc<dyn TaskHandler>,
}

impl TaskDescriptor {
    /// Creates a non-chaining task with no follow-up questions.
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        handler: impl TaskHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            chains: false,
            questions: Vec::new(),
            report_kind: None,
            handler: Arc::new(handler),
        }
    }

    /// Sets whether control returns to task selection after a run.
    #[must_use]
    pub fn chaining(mut self, chains: bool) -> Self {
        self.chains = chains;
        self
    }

    /// Adds a follow-up question asked when this task is selected.
    #[must_use]
    pub fn with_question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }

    /// Sets the report kind this task renders.
    #[must_use]
    pub fn with_report_kind(mut self, kind: ReportKind) -> Self {
        self.report_kind = Some(kind);
        self
    }

    /// Unique task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Menu label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether control returns to task selection after a completed run.
    #[must_use]
    pub fn chains(&self) -> bool {
        self.chains
    }

    /// Follow-up questions.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Report kind override, if any.
    #[must_use]
    pub fn report_kind(&self) -> Option<ReportKind> {
        self.report_kind
    }

    pub(crate) fn set_report_kind(&mut self, kind: ReportKind) {
        self.report_kind = Some(kind);
    }

    pub(crate) fn handler(&self) -> Arc<dyn TaskHandler> {
        Arc::clone(&self.handler)
    }
}

impl fmt::Debug for TaskDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDescriptor")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("chains", &self.chains)
            .field("questions", &self.questions.len())
            .field("report_kind", &self.report_kind)
            .finish_non_exhaustive()
    }
}
