//! Built-in report and release tasks.

use std::collections::HashSet;

use super::{TaskDescriptor, TaskFuture, TaskHandler, TaskOutcome};
use crate::engine::Engine;
use crate::issue::IssueRecord;
use crate::ports::prompt::{non_empty, Answers, Choice, Question};
use crate::ports::vcs::ReleaseRequest;
use crate::report::{confirm_line, warn_line};

/// The app layer: `preview`, `compare_to_version`, `release`, `missing_field`.
#[must_use]
pub fn tasks() -> Vec<TaskDescriptor> {
    vec![
        TaskDescriptor::new("preview", "Preview the Report", Preview)
            .chaining(true)
            .with_question(release_name())
            .with_question(group_by_field()),
        TaskDescriptor::new("compare_to_version", "Compare to Fix Version", CompareToVersion)
            .chaining(true),
        TaskDescriptor::new("release", "Create a GitHub Release", Release)
            .chaining(true)
            .with_question(release_name())
            .with_question(Question::text("release_tag", "Tag Name:").validated(non_empty))
            .with_question(group_by_field()),
        TaskDescriptor::new("missing_field", "Report Issues Missing a Field", MissingField)
            .chaining(true)
            .with_question(
                Question::text("missing_field", "Field (machine_name):").validated(non_empty),
            ),
    ]
}

fn release_name() -> Question {
    Question::text("release_name", "Release Name:")
}

fn group_by_field() -> Question {
    Question::text("group_by_field", "Group By Field (machine_name):")
}

/// Credited issues between base and head, dropping any that fail to load.
async fn credited_issues(engine: &mut Engine) -> Result<Vec<IssueRecord>, crate::Error> {
    let keys = engine.commit_credits().await?;
    Ok(engine.issues(&keys).await)
}

/// Renders the grouped release report.
struct Preview;

impl TaskHandler for Preview {
    fn run<'a>(&'a self, engine: &'a mut Engine, _answers: &'a Answers) -> TaskFuture<'a> {
        Box::pin(async move {
            let issues = credited_issues(engine).await?;
            let mut report = engine.new_report(engine.release_name(), issues);
            report.group_by_field(&engine.grouping_field()).build_full_report();
            engine.emit(&report)?;
            Ok(TaskOutcome::Completed)
        })
    }
}

/// Cross-checks a fix version against commit credits, both directions.
struct CompareToVersion;

impl TaskHandler for CompareToVersion {
    fn run<'a>(&'a self, engine: &'a mut Engine, _answers: &'a Answers) -> TaskFuture<'a> {
        Box::pin(async move {
            let versions = engine.active_versions().await?;
            if versions.is_empty() {
                let project = engine.project_key();
                engine.say(warn_line(&format!("No active fix versions found for {project}.")))?;
                return Ok(TaskOutcome::Completed);
            }

            let choices = versions.iter().map(|v| Choice::new(&v.name, &v.name)).collect();
            let version = engine.ask_choice("Which Fix Version?", choices)?;
            let version_issues = engine.version_issues(&version).await?;
            let git_issues = credited_issues(engine).await?;

            let version_keys: HashSet<&str> =
                version_issues.iter().map(|i| i.issue_key.as_str()).collect();
            let git_keys: HashSet<&str> = git_issues.iter().map(|i| i.issue_key.as_str()).collect();

            let missing_from_commits: Vec<&IssueRecord> = version_issues
                .iter()
                .filter(|i| !git_keys.contains(i.issue_key.as_str()))
                .collect();
            let missing_from_version: Vec<&IssueRecord> = git_issues
                .iter()
                .filter(|i| !version_keys.contains(i.issue_key.as_str()))
                .collect();

            let mut report = engine.new_report("Fix Version Comparison", Vec::new());
            report.add_line("");
            report.add_subheading(&format!(
                "There are {} issues listed in '{version}' without commit credits:",
                missing_from_commits.len()
            ));
            for issue in missing_from_commits {
                report.add_issue(issue);
            }
            report.add_line("");
            report.add_subheading(&format!(
                "There are {} issues with commit credits in '{}' that are not listed in '{version}':",
                missing_from_version.len(),
                engine.head()
            ));
            for issue in missing_from_version {
                report.add_issue(issue);
            }

            engine.emit(&report)?;
            Ok(TaskOutcome::Completed)
        })
    }
}

/// Publishes the grouped report as a prerelease on the head ref.
struct Release;

impl TaskHandler for Release {
    fn run<'a>(&'a self, engine: &'a mut Engine, _answers: &'a Answers) -> TaskFuture<'a> {
        Box::pin(async move {
            let issues = credited_issues(engine).await?;
            let name = engine.release_name();
            let mut report = engine.new_report(name.clone(), issues);
            let body = report.group_by_field(&engine.grouping_field()).build_full_report().output();

            let request = ReleaseRequest {
                tag_name: engine.release_tag(),
                target_commitish: engine.head(),
                name: name.clone(),
                body,
                draft: false,
                prerelease: true,
            };
            let response = engine.create_release(&request).await?;

            if response.status_code == 201 {
                engine.say(confirm_line(&format!("Release {name} created successfully.")))?;
                engine.say(format!("Link: {}", response.html_url))?;
            } else {
                engine.say(warn_line(&format!(
                    "Release request for {name} returned status {}.",
                    response.status_code
                )))?;
            }
            Ok(TaskOutcome::Completed)
        })
    }
}

/// Lists credited issues that have no value in a chosen field.
struct MissingField;

impl TaskHandler for MissingField {
    fn run<'a>(&'a self, engine: &'a mut Engine, _answers: &'a Answers) -> TaskFuture<'a> {
        Box::pin(async move {
            let field = engine.option("missing_field");
            let issues = credited_issues(engine).await?;
            let mut report = engine.new_report(engine.release_name(), issues);
            report.build_missing_field_report(&field);
            engine.emit(&report)?;
            Ok(TaskOutcome::Completed)
        })
    }
}
