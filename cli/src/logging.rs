//! Diagnostic logging.
//!
//! Operator-facing messages go through [`crate::output`]; tracing carries the
//! debug trail (commands run, paths touched) to stderr, filtered by `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Quiet (`warn`) unless `RUST_LOG` says otherwise.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
