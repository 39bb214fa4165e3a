//! Application service: host precondition checks.
//!
//! Read-only: nothing here changes the host. The first failed check is
//! returned as an error and later checks are not run.

use anyhow::{Context, Result};

use crate::application::ports::{BinaryLocator, CommandRunner, LocalFs};
use crate::domain::error::InstallError;
use crate::domain::layout::{CRITICAL_MOUNTS, MIN_FREE_MIB};
use crate::domain::preconditions::{
    OsRelease, SelinuxMode, nearest_existing, parse_df_available_mib, supported_os_summary,
};
use crate::domain::settings::InstallSettings;

/// Verify privilege, OS support, SELinux mode and free disk space.
///
/// # Errors
///
/// Returns the first unmet condition as an [`InstallError`], or an I/O error
/// if a host check cannot run.
pub async fn check_system(
    settings: &InstallSettings,
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    locator: &impl BinaryLocator,
) -> Result<()> {
    if !settings.elevated {
        return Err(InstallError::NotElevated.into());
    }
    check_os(settings, fs)?;
    check_selinux(runner, locator).await?;
    check_disk_space(settings, runner, fs).await
}

fn check_os(settings: &InstallSettings, fs: &impl LocalFs) -> Result<()> {
    let path = settings.layout.os_release();
    let content = if fs.exists(&path) {
        fs.read_to_string(&path)?
    } else {
        String::new()
    };
    let release = OsRelease::parse(&content);
    if !release.is_supported() {
        return Err(InstallError::UnsupportedOs {
            id: if release.id.is_empty() {
                "unknown".to_string()
            } else {
                release.id
            },
            version: release.version_id,
            supported: supported_os_summary(),
        }
        .into());
    }
    tracing::debug!(id = %release.id, version = %release.version_id, "operating system supported");
    Ok(())
}

async fn check_selinux(runner: &impl CommandRunner, locator: &impl BinaryLocator) -> Result<()> {
    let Some(getenforce) = locator.locate("getenforce") else {
        tracing::debug!("getenforce not found, SELinux not present");
        return Ok(());
    };
    let program = getenforce.to_string_lossy();
    let output = runner.run(&program, &[]).await?;
    let mode = SelinuxMode::parse(&String::from_utf8_lossy(&output.stdout));
    tracing::debug!(?mode, "SELinux mode");
    if mode == SelinuxMode::Enforcing {
        return Err(InstallError::EnforcingSecurityModule.into());
    }
    Ok(())
}

async fn check_disk_space(
    settings: &InstallSettings,
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
) -> Result<()> {
    for mount in CRITICAL_MOUNTS {
        let target = settings.layout.resolve(mount);
        let target_dir = nearest_existing(&target, |p| fs.exists(p))
            .unwrap_or_else(|| settings.layout.root().to_path_buf());
        let target_dir = target_dir.to_string_lossy();
        let output = runner.run("df", &["-Pm", &target_dir]).await?;
        let available_mib = parse_df_available_mib(&String::from_utf8_lossy(&output.stdout))
            .with_context(|| format!("cannot parse free space of {mount}"))?;
        tracing::debug!(mount, available_mib, "free space");
        if available_mib < MIN_FREE_MIB {
            return Err(InstallError::InsufficientSpace {
                mount: (*mount).to_string(),
                available_mib,
                required_mib: MIN_FREE_MIB,
            }
            .into());
        }
    }
    Ok(())
}
