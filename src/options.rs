//! Option resolution across command-line values, config defaults, and answers.

use std::collections::HashMap;

use crate::ports::prompt::Answers;

/// Layered string options.
///
/// The session layer starts with command-line values and receives every
/// interactive answer, so a later task in a chain sees earlier answers. The
/// config layer holds defaults from the static configuration.
#[derive(Debug, Clone, Default)]
pub struct OptionSet {
    session: HashMap<String, String>,
    defaults: HashMap<String, String>,
}

impl OptionSet {
    /// Builds the set from command-line values and config defaults.
    #[must_use]
    pub fn new(cli: HashMap<String, String>, defaults: HashMap<String, String>) -> Self {
        Self { session: cli, defaults }
    }

    /// Returns the first non-empty value of the session then config layer,
    /// or an empty string.
    #[must_use]
    pub fn resolve(&self, name: &str) -> String {
        [&self.session, &self.defaults]
            .into_iter()
            .filter_map(|layer| layer.get(name))
            .find(|value| !value.is_empty())
            .cloned()
            .unwrap_or_default()
    }

    /// Stores a value in the session layer.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.session.insert(name.into(), value.into());
    }

    /// Stores every non-empty answer.
    pub fn merge_non_empty(&mut self, answers: &Answers) {
        for (name, value) in answers {
            if !value.is_empty() {
                self.set(name.clone(), value.clone());
            }
        }
    }

    /// Stores every answer except the one named `skip`.
    pub fn merge_except(&mut self, answers: &Answers, skip: &str) {
        for (name, value) in answers.iter().filter(|(name, _)| name.as_str() != skip) {
            self.set(name.clone(), value.clone());
        }
    }
}
