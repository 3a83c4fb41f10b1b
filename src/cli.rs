//! CLI argument definitions.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_CONFIG_PATH;

/// Top-level CLI parser for `relnote`.
#[derive(Debug, Parser)]
#[command(name = "relnote", version, about = "Build release notes from commits and tracker issues")]
pub struct Cli {
    /// Base branch or tag to compare from.
    #[arg(short, long)]
    pub base: Option<String>,

    /// Head branch or tag to compare to.
    #[arg(short = 'H', long)]
    pub head: Option<String>,

    /// Repository as owner/name.
    #[arg(short, long)]
    pub repo: Option<String>,

    /// Show verbose diagnostics and full error detail.
    #[arg(short, long)]
    pub debug: bool,

    /// Path to the YAML config file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Return to the task menu after a task fails instead of exiting.
    #[arg(long)]
    pub keep_going: bool,
}

impl Cli {
    /// Flag values as option overrides, keyed by option name.
    #[must_use]
    pub fn option_overrides(&self) -> HashMap<String, String> {
        let mut options: HashMap<String, String> = [
            ("base", &self.base),
            ("head", &self.head),
            ("repo", &self.repo),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.clone().map(|v| (name.to_string(), v)))
        .collect();
        if self.debug {
            options.insert("debug".into(), "true".into());
        }
        options
    }
}
