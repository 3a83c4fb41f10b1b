//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the engine and an external
//! system (time, version-control host, issue tracker, terminal prompts).
//! Implementations live in `src/adapters/`.

pub mod clock;
pub mod issues;
pub mod prompt;
pub mod vcs;

pub use clock::Clock;
pub use issues::{IssueTracker, TrackerIssue, Version};
pub use prompt::{Answers, Choice, Gate, Prompter, Question, QuestionKind};
pub use vcs::{CommitSummary, Comparison, PortFuture, ReleaseRequest, ReleaseResponse, RepoHandle, VcsHost};
