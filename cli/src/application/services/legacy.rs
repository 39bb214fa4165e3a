//! Application service: legacy Bro sensor detection and migration.

use anyhow::Result;

use crate::application::ports::{BinaryLocator, CommandRunner, LocalFs, ProgressReporter};
use crate::domain::error::InstallError;
use crate::domain::layout::InstallLayout;
use crate::domain::legacy::{LEGACY_CONTROL_CANDIDATES, resolve_control, resolve_log_dir};
use crate::domain::settings::LegacyAgent;

/// `broctl` invocations that leave the legacy sensor fully inactive.
const LEGACY_STOP_COMMANDS: &[&[&str]] = &[&["stop"], &["cron", "disable"]];

/// Find a legacy sensor by probing its well-known paths, then the search path.
pub fn find_legacy_agent(
    layout: &InstallLayout,
    fs: &impl LocalFs,
    locator: &impl BinaryLocator,
) -> Option<LegacyAgent> {
    let control = resolve_control(
        LEGACY_CONTROL_CANDIDATES,
        layout,
        |p| fs.exists(p),
        |name| locator.locate(name),
    )?;
    let log_dir = resolve_log_dir(layout, &control, |p| fs.is_dir(p));
    tracing::info!(control = %control.display(), log_dir = ?log_dir, "legacy sensor detected");
    Some(LegacyAgent { control, log_dir })
}

/// Stop the legacy sensor and disable its cron jobs.
///
/// Runs whenever a legacy sensor is detected, whatever mode the new install
/// uses: two active sensors must never capture at once.
///
/// # Errors
///
/// Returns [`InstallError::LegacyStopFailed`] if either command fails.
pub async fn stop_legacy_agent(
    agent: &LegacyAgent,
    runner: &impl CommandRunner,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    let control = agent.control.to_string_lossy();
    for args in LEGACY_STOP_COMMANDS {
        let output = runner.run(&control, args).await?;
        if !output.status.success() {
            return Err(InstallError::LegacyStopFailed {
                control: control.to_string(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
    }
    reporter.success("legacy Bro sensor stopped");
    Ok(())
}

/// Link the new log path to the legacy log directory.
///
/// Does nothing when no legacy log directory was found or when the new log
/// path already exists; existing data is never moved or overwritten.
///
/// # Errors
///
/// Returns an error if the install root or the link cannot be created.
pub fn migrate_legacy_logs(
    agent: &LegacyAgent,
    layout: &InstallLayout,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
) -> Result<bool> {
    let Some(legacy_logs) = &agent.log_dir else {
        return Ok(false);
    };
    let new_logs = layout.log_dir();
    if fs.exists(&new_logs) {
        tracing::info!(path = %new_logs.display(), "log path exists, not migrating");
        return Ok(false);
    }
    fs.create_dir_all(&layout.install_root())?;
    fs.symlink(legacy_logs, &new_logs)?;
    reporter.success(&format!(
        "linked {} to legacy logs in {}",
        new_logs.display(),
        legacy_logs.display()
    ));
    Ok(true)
}
