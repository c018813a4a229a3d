//! Tracing subscriber setup for the `cnotes` binary.
//!
//! Filter directives come from `CNOTES_LOG` (e.g. `CNOTES_LOG=debug` or
//! `CNOTES_LOG=context_notes_core::resolver=trace`), defaulting to `warn`.
//! Output goes to stderr; stdout carries command output only.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "CNOTES_LOG";

pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // Ignore the error when a subscriber is already installed (tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
