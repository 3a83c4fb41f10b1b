//! Line-oriented terminal prompter.

use std::io::{BufRead, Write};

use crate::error::PortError;
use crate::ports::prompt::{Answers, Choice, Prompter, Question, QuestionKind};

/// Prompts on a writer and reads answers line by line from a reader.
///
/// Choice questions list numbered options and accept either the number or
/// the option's value. Invalid input re-asks the same question.
pub struct TerminalPrompter<R: BufRead, W: Write> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    /// Creates a prompter over the given streams.
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    fn read_line(&mut self) -> Result<String, PortError> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line)?;
        if read == 0 {
            return Err("input closed".into());
        }
        Ok(line.trim().to_string())
    }

    fn ask_text(&mut self, question: &Question) -> Result<String, PortError> {
        loop {
            match &question.default {
                Some(default) => write!(self.writer, "? {} ({default}) ", question.message)?,
                None => write!(self.writer, "? {} ", question.message)?,
            }
            self.writer.flush()?;

            let input = self.read_line()?;
            let answer = match (&question.default, input.is_empty()) {
                (Some(default), true) => default.clone(),
                _ => input,
            };
            if question.accepts(&answer) {
                return Ok(answer);
            }
            writeln!(self.writer, ">> Please enter a value.")?;
        }
    }

    fn ask_choice(&mut self, question: &Question, choices: &[Choice]) -> Result<String, PortError> {
        if choices.is_empty() {
            return Err(format!("no choices available for '{}'", question.name).into());
        }
        loop {
            writeln!(self.writer, "? {}", question.message)?;
            for (i, choice) in choices.iter().enumerate() {
                writeln!(self.writer, "  {}) {}", i + 1, choice.label)?;
            }
            write!(self.writer, "> ")?;
            self.writer.flush()?;

            let input = self.read_line()?;
            if let Some(choice) = pick(choices, &input) {
                return Ok(choice.value.clone());
            }
            writeln!(self.writer, ">> Pick one of 1-{}.", choices.len())?;
        }
    }
}

fn pick<'c>(choices: &'c [Choice], input: &str) -> Option<&'c Choice> {
    match input.parse::<usize>() {
        Ok(n) if n >= 1 => choices.get(n - 1),
        _ => choices.iter().find(|c| c.value == input),
    }
}

impl<R: BufRead + Send, W: Write + Send> Prompter for TerminalPrompter<R, W> {
    fn ask(&mut self, questions: &[Question]) -> Result<Answers, PortError> {
        let mut answers = Answers::new();
        for question in questions {
            if !question.is_active(&answers) {
                continue;
            }
            let answer = match &question.kind {
                QuestionKind::Text => self.ask_text(question)?,
                QuestionKind::Choice(choices) => self.ask_choice(question, choices)?,
            };
            answers.insert(question.name.clone(), answer);
        }
        Ok(answers)
    }
}
