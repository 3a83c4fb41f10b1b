//! Crate error taxonomy and the process-boundary failure description.

use std::error::Error as StdError;
use std::fmt::Write as _;

/// Boxed error returned by the port traits.
pub type PortError = Box<dyn StdError + Send + Sync>;

/// Errors surfaced by the engine and its tasks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Required credentials or endpoints are missing or malformed.
    #[error("{0}")]
    Configuration(String),

    /// A single issue could not be loaded from the tracker.
    #[error("Unable to load issue {key}.\n{source}")]
    LookupNotFound {
        /// The issue key that failed.
        key: String,
        /// The tracker's failure.
        #[source]
        source: PortError,
    },

    /// Creating a release on the version-control host failed.
    #[error("Unable to create GitHub release.\n{source}")]
    Publish {
        /// The host's failure.
        #[source]
        source: PortError,
    },

    /// Any other remote call failed.
    #[error("{context}\n{source}")]
    Remote {
        /// What the engine was doing.
        context: String,
        /// The collaborator's failure.
        #[source]
        source: PortError,
    },

    /// The prompt surface failed (closed input, broken terminal).
    #[error("Prompt failed: {0}")]
    Prompt(#[source] PortError),

    /// A task name was selected that no registry layer holds.
    #[error("Unknown task '{0}'")]
    UnknownTask(String),

    /// The repository option is not of the form `owner/name`.
    #[error("Invalid repository '{0}', expected owner/name")]
    InvalidRepository(String),

    /// Writing to the output stream failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps a collaborator failure with a short description of the call.
    pub fn remote(context: impl Into<String>, source: PortError) -> Self {
        Self::Remote { context: context.into(), source }
    }
}

/// Renders an error the way the top-level boundary prints it.
///
/// Always a single symbol-prefixed line; in debug mode the full `Debug`
/// rendering and the source chain follow.
#[must_use]
pub fn describe(err: &Error, debug: bool) -> String {
    let mut text = format!("😵️ {err}");
    if debug {
        let _ = write!(text, "\n{err:?}");
        let mut source = err.source();
        while let Some(cause) = source {
            let _ = write!(text, "\ncaused by: {cause}");
            source = cause.source();
        }
    }
    text
}
