//! Diagnostic tracing to stderr.
//!
//! Logs never carry report output; that goes to the engine's writer.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
#[must_use]
pub fn default_filter(debug: bool) -> &'static str {
    if debug {
        "warn,relnote=debug"
    } else {
        "warn"
    }
}

/// Installs the global subscriber.
///
/// Reads `RUST_LOG`, falling back to [`default_filter`]. A second call is a
/// no-op.
///
/// ```bash
/// RUST_LOG=relnote=trace relnote --base v1.0 --head main
/// ```
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
