//! Core library for the `relnote` CLI.
//!
//! `relnote` collects the tracker issues credited by commit messages between
//! two refs and turns them into release reports, fix-version comparisons,
//! and published releases. The [`engine::Engine`] drives an interactive
//! task loop over the ports in [`ports`]; [`context::ServiceContext`] wires
//! the live GitHub, Jira, and terminal adapters.

pub mod adapters;
pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod issue;
pub mod logging;
pub mod markdown;
pub mod options;
pub mod ports;
pub mod references;
pub mod report;
pub mod tasks;

#[cfg(test)]
mod test_support;

pub use error::Error;

use clap::Parser;

use crate::config::Config;
use crate::context::ServiceContext;
use crate::engine::{Engine, ErrorPolicy};

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns the text to print on stderr when argument parsing fails or the
/// run ends with an error.
pub async fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    logging::init(cli.debug);

    execute(&cli).await.map_err(|err| error::describe(&err, cli.debug))
}

async fn execute(cli: &cli::Cli) -> Result<(), Error> {
    let config = Config::load(&cli.config)?;
    let ctx = ServiceContext::live(&config)?;
    let mut engine = Engine::new(config, cli.option_overrides(), Vec::new(), ctx)?;
    if cli.keep_going {
        engine.set_error_policy(ErrorPolicy::ReturnToMenu);
    }
    engine.run().await
}

#[cfg(test)]
mod tests {
    use super::run;

    #[tokio::test]
    async fn help_is_not_an_error() {
        assert!(run(["relnote", "--help"]).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_flag_is_an_error() {
        let err = run(["relnote", "--bogus"]).await.unwrap_err();
        assert!(err.contains("--bogus"));
    }
}
