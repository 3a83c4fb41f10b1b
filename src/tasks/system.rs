//! Housekeeping tasks that callers cannot shadow.

use super::{TaskDescriptor, TaskFuture, TaskHandler, TaskOutcome};
use crate::engine::Engine;
use crate::ports::prompt::Answers;

/// The system layer: `clear_cache` and `exit`.
#[must_use]
pub fn tasks() -> Vec<TaskDescriptor> {
    vec![
        TaskDescriptor::new("clear_cache", "Flush Any Stored Data", ClearCache).chaining(true),
        TaskDescriptor::new("exit", "Exit", Exit),
    ]
}

/// Drops every cached lookup so the next task refetches.
struct ClearCache;

impl TaskHandler for ClearCache {
    fn run<'a>(&'a self, engine: &'a mut Engine, _answers: &'a Answers) -> TaskFuture<'a> {
        Box::pin(async move {
            engine.reset_cache();
            engine.say("All stored data has been purged.  Have a nice day!")?;
            Ok(TaskOutcome::Completed)
        })
    }
}

struct Exit;

impl TaskHandler for Exit {
    fn run<'a>(&'a self, engine: &'a mut Engine, _answers: &'a Answers) -> TaskFuture<'a> {
        Box::pin(async move {
            engine.say("Goodbye.")?;
            Ok(TaskOutcome::Exit)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{sample_tracker, test_engine, FakeVcs, ScriptedPrompter};

    #[tokio::test]
    async fn clear_cache_forces_remote_lookups_again() {
        let vcs = FakeVcs::with_messages(&["ABC-4: a"]);
        let tracker = sample_tracker();
        let prompter = ScriptedPrompter::new(vec![
            vec![("task", "preview"), ("release_name", "1")],
            vec![("task", "clear_cache")],
            vec![("task", "preview"), ("release_name", "1")],
            vec![("task", "exit")],
        ]);
        let (mut engine, out) = test_engine(vcs.clone(), tracker.clone(), prompter, Vec::new());

        engine.run().await.unwrap();
        assert_eq!(vcs.calls.count("compare"), 2);
        assert_eq!(tracker.calls.count("find_issue"), 2);
        assert!(out.contents().contains("All stored data has been purged."));
    }

    #[tokio::test]
    async fn chained_preview_reuses_cached_lookups() {
        let vcs = FakeVcs::with_messages(&["ABC-4: a"]);
        let tracker = sample_tracker();
        let prompter = ScriptedPrompter::new(vec![
            vec![("task", "preview"), ("release_name", "1")],
            vec![("task", "preview"), ("release_name", "1")],
            vec![("task", "exit")],
        ]);
        let (mut engine, _) = test_engine(vcs.clone(), tracker.clone(), prompter, Vec::new());

        engine.run().await.unwrap();
        assert_eq!(vcs.calls.count("compare"), 1);
        assert_eq!(tracker.calls.count("find_issue"), 1);
    }

    #[tokio::test]
    async fn exit_ends_the_run() {
        let prompter = ScriptedPrompter::new(vec![vec![("task", "exit")]]);
        let (mut engine, out) =
            test_engine(FakeVcs::default(), sample_tracker(), prompter.clone(), Vec::new());

        engine.run().await.unwrap();
        assert_eq!(out.contents(), "Goodbye.\n");
        assert_eq!(prompter.batches(), 1);
    }
}
