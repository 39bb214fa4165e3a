//! Application service: make sure Docker is installed and usable.

use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{CommandRunner, ProgressReporter};
use crate::domain::error::InstallError;
use crate::domain::settings::InstallSettings;

/// Upper bound for the Docker installer, which may download packages.
pub const RUNTIME_INSTALL_TIMEOUT: Duration = Duration::from_secs(900);

/// Ensure the container runtime answers a liveness query.
///
/// When Docker already answers, the installer script is skipped so offline
/// re-runs do not need the network. Otherwise the packaged installer runs
/// and Docker must answer afterwards.
///
/// # Errors
///
/// Returns [`InstallError::RuntimeInstallFailed`] if the installer fails, or
/// [`InstallError::RuntimeUnavailable`] if Docker still does not answer.
pub async fn ensure_runtime(
    settings: &InstallSettings,
    runner: &impl CommandRunner,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    if runtime_alive(runner).await {
        tracing::info!("docker already answers, skipping installer");
        reporter.success("Docker is ready");
        return Ok(());
    }

    let installer = settings.package.docker_installer();
    let installer = installer.to_string_lossy();
    reporter.step("installing Docker...");
    let output = runner
        .run_with_timeout("sh", &[&installer], RUNTIME_INSTALL_TIMEOUT)
        .await?;
    if !output.status.success() {
        return Err(InstallError::RuntimeInstallFailed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        )
        .into());
    }

    if !runtime_alive(runner).await {
        return Err(InstallError::RuntimeUnavailable.into());
    }
    reporter.success("Docker installed");
    Ok(())
}

async fn runtime_alive(runner: &impl CommandRunner) -> bool {
    runner
        .run("docker", &["info"])
        .await
        .is_ok_and(|o| o.status.success())
}
