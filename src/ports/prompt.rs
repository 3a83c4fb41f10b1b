//! Interactive prompt port and the question model it consumes.

use std::collections::BTreeMap;

use crate::error::PortError;

/// Answers collected from one prompt batch, keyed by question name.
pub type Answers = BTreeMap<String, String>;

/// Predicate applied to text input before it is accepted.
pub type Validator = fn(&str) -> bool;

/// Rejects empty input.
#[must_use]
pub fn non_empty(input: &str) -> bool {
    !input.trim().is_empty()
}

/// One selectable entry in a choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Text shown to the user.
    pub label: String,
    /// Value recorded as the answer.
    pub value: String,
}

impl Choice {
    /// Creates a choice with separate label and value.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { label: label.into(), value: value.into() }
    }
}

/// How a question is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    /// Free text.
    Text,
    /// Exactly one of the listed choices.
    Choice(Vec<Choice>),
}

/// Shows a question only when an earlier answer in the same batch matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    /// Name of the earlier question.
    pub question: String,
    /// Answer that opens the gate.
    pub equals: String,
}

impl Gate {
    /// Whether the gate is open given the answers so far.
    #[must_use]
    pub fn is_open(&self, answers: &Answers) -> bool {
        answers.get(&self.question).is_some_and(|answer| *answer == self.equals)
    }
}

/// A single question in a prompt batch.
#[derive(Debug, Clone)]
pub struct Question {
    /// Answer key.
    pub name: String,
    /// Text shown to the user.
    pub message: String,
    /// Text or choice.
    pub kind: QuestionKind,
    /// Optional input check for text questions.
    pub validate: Option<Validator>,
    /// Value used when the user enters nothing.
    pub default: Option<String>,
    /// Optional condition on an earlier answer.
    pub when: Option<Gate>,
}

impl Question {
    /// A free-text question.
    pub fn text(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            kind: QuestionKind::Text,
            validate: None,
            default: None,
            when: None,
        }
    }

    /// A single-choice question.
    pub fn choice(name: impl Into<String>, message: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self { kind: QuestionKind::Choice(choices), ..Self::text(name, message) }
    }

    /// Requires input to pass `validate`.
    #[must_use]
    pub fn validated(mut self, validate: Validator) -> Self {
        self.validate = Some(validate);
        self
    }

    /// Only asks when `question` was answered with `equals`.
    #[must_use]
    pub fn gated(mut self, question: impl Into<String>, equals: impl Into<String>) -> Self {
        self.when = Some(Gate { question: question.into(), equals: equals.into() });
        self
    }

    /// Whether this question should be asked given the answers so far.
    #[must_use]
    pub fn is_active(&self, answers: &Answers) -> bool {
        self.when.as_ref().map_or(true, |gate| gate.is_open(answers))
    }

    /// Whether `input` is acceptable.
    #[must_use]
    pub fn accepts(&self, input: &str) -> bool {
        self.validate.map_or(true, |validate| validate(input))
    }
}

/// Asks the user batches of questions.
pub trait Prompter: Send {
    /// Asks each active question in order and returns the answers.
    ///
    /// Questions whose gate is closed are skipped and produce no answer.
    ///
    /// # Errors
    ///
    /// Returns an error if input cannot be read or output cannot be written.
    fn ask(&mut self, questions: &[Question]) -> Result<Answers, PortError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_opens_only_on_matching_answer() {
        let question = Question::text("release_name", "Release Name:").gated("task", "preview");
        let mut answers = Answers::new();
        assert!(!question.is_active(&answers));

        answers.insert("task".into(), "release".into());
        assert!(!question.is_active(&answers));

        answers.insert("task".into(), "preview".into());
        assert!(question.is_active(&answers));
    }

    #[test]
    fn ungated_question_is_always_active() {
        assert!(Question::text("repo", "Repo:").is_active(&Answers::new()));
    }

    #[test]
    fn validator_rejects_blank_input() {
        let question = Question::text("repo", "Repo:").validated(non_empty);
        assert!(!question.accepts(""));
        assert!(!question.accepts("   "));
        assert!(question.accepts("owner/repo"));
    }
}
