//! Report builder: accumulates output lines from a list of issues.

use std::io::{self, Write};

use crate::issue::IssueRecord;
use crate::markdown;

/// Bucket label for issues without a value in the grouping field.
pub const UNGROUPED: &str = "Ungrouped";

/// How report lines are marked up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportKind {
    /// Markdown headings and links.
    #[default]
    Markdown,
    /// Unadorned text for terminals and plain release bodies.
    PlainText,
}

/// A report over an ordered list of issues.
#[derive(Debug, Clone)]
pub struct Report {
    kind: ReportKind,
    title: String,
    issues: Vec<IssueRecord>,
    grouped: Vec<(String, Vec<IssueRecord>)>,
    output: Vec<String>,
}

impl Report {
    /// Creates an empty report of the given kind.
    pub fn new(kind: ReportKind, title: impl Into<String>, issues: Vec<IssueRecord>) -> Self {
        Self { kind, title: title.into(), issues, grouped: Vec::new(), output: Vec::new() }
    }

    /// Report title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Issues in input order.
    #[must_use]
    pub fn issues(&self) -> &[IssueRecord] {
        &self.issues
    }

    /// Buckets from the last [`Report::group_by_field`], in first-seen order.
    #[must_use]
    pub fn groups(&self) -> &[(String, Vec<IssueRecord>)] {
        &self.grouped
    }

    /// Buckets issues by the value of `field`.
    ///
    /// Issues without a value land in the [`UNGROUPED`] bucket. Bucket order
    /// follows the first issue seen for each bucket. An empty `field`
    /// clears the grouping, so [`Report::build_full_report`] renders a flat
    /// list instead of one section holding every issue under [`UNGROUPED`].
    pub fn group_by_field(&mut self, field: &str) -> &mut Self {
        self.grouped.clear();
        if field.is_empty() {
            return self;
        }

        for issue in &self.issues {
            let label = issue.field(field).unwrap_or_else(|| UNGROUPED.to_string());
            match self.grouped.iter_mut().find(|(bucket, _)| *bucket == label) {
                Some((_, members)) => members.push(issue.clone()),
                None => self.grouped.push((label, vec![issue.clone()])),
            }
        }
        self
    }

    /// Appends a raw line.
    pub fn add_line(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    /// Appends a title line.
    pub fn add_title(&mut self, text: &str) {
        let line = match self.kind {
            ReportKind::Markdown => markdown::h1(text),
            ReportKind::PlainText => text.to_string(),
        };
        self.add_line(line);
    }

    /// Appends a section heading.
    pub fn add_heading(&mut self, text: &str) {
        let line = match self.kind {
            ReportKind::Markdown => markdown::h2(text),
            ReportKind::PlainText => format!("{text}:"),
        };
        self.add_line(line);
    }

    /// Appends a subsection heading.
    pub fn add_subheading(&mut self, text: &str) {
        let line = match self.kind {
            ReportKind::Markdown => markdown::h3(text),
            ReportKind::PlainText => text.to_string(),
        };
        self.add_line(line);
    }

    /// Appends a heading followed by its issues.
    pub fn add_issue_group(&mut self, heading: &str, group: &[IssueRecord]) {
        self.add_heading(heading);
        for issue in group {
            self.add_issue(issue);
        }
    }

    /// Appends one enumerated issue line. Markdown titles are HTML-escaped.
    pub fn add_issue(&mut self, issue: &IssueRecord) {
        let line = match self.kind {
            ReportKind::Markdown => format!(
                "1. [{}] {}",
                markdown::link(&issue.issue_key, &issue.url),
                markdown::encode_html(&issue.title)
            ),
            ReportKind::PlainText => format!("- {} {} ({})", issue.issue_key, issue.title, issue.url),
        };
        self.add_line(line);
    }

    /// Issues with no value in `field`.
    #[must_use]
    pub fn issues_missing_field(&self, field: &str) -> Vec<&IssueRecord> {
        self.issues.iter().filter(|issue| issue.field(field).is_none()).collect()
    }

    /// Rebuilds the output as a title plus grouped or flat issue lines.
    pub fn build_full_report(&mut self) -> &mut Self {
        self.output.clear();
        let title = format!("Release Report for {}", self.title);
        self.add_title(&title);

        if self.grouped.is_empty() {
            let issues = self.issues.clone();
            for issue in &issues {
                self.add_issue(issue);
            }
        } else {
            let grouped = std::mem::take(&mut self.grouped);
            for (heading, group) in &grouped {
                self.add_issue_group(heading, group);
            }
            self.grouped = grouped;
        }
        self
    }

    /// Rebuilds the output as a title plus every issue lacking `field`.
    pub fn build_missing_field_report(&mut self, field: &str) -> &mut Self {
        self.output.clear();
        self.add_title(&format!("Missing Field Report for '{field}'"));

        let missing: Vec<IssueRecord> =
            self.issues_missing_field(field).into_iter().cloned().collect();
        for issue in &missing {
            self.add_issue(issue);
        }
        self
    }

    /// Accumulated lines joined with newlines.
    #[must_use]
    pub fn output(&self) -> String {
        self.output.join("\n")
    }

    /// Writes the output followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns the writer's error.
    pub fn render_to(&self, writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", self.output())
    }

    /// Prints the output to stdout.
    ///
    /// The engine writes reports through [`crate::engine::Engine::emit`]
    /// instead, which targets its configured writer.
    pub fn render(&self) {
        println!("{}", self.output());
    }
}

/// Confirmation line.
#[must_use]
pub fn confirm_line(text: &str) -> String {
    format!("✅  {text}")
}

/// Warning line.
#[must_use]
pub fn warn_line(text: &str) -> String {
    format!("⚠️  {text}")
}

/// Error line.
#[must_use]
pub fn error_line(text: &str) -> String {
    format!("❌  {text}")
}
