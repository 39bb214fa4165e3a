//! Command handlers for the two entry points.

pub mod install;
pub mod stage;

use crate::domain::error::is_cancellation;

/// Print a failure or cancellation for the operator.
///
/// Both end the process with status 1; cancellations get their own wording
/// so scripts and humans can tell them apart from failures.
pub fn report_error(err: &anyhow::Error) {
    if is_cancellation(err) {
        eprintln!("Cancelled: {}", err.root_cause());
    } else {
        eprintln!("Error: {err:#}");
    }
}
