//! Application service: install the sensor from an extracted package.
//!
//! Every step is safe to repeat: scripts and the profile are rewritten,
//! image archives are copied only when missing or changed, and site
//! scripts already on the host are never replaced.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{CommandRunner, LocalFs, ProgressReporter};
use crate::domain::arch::map_architecture;
use crate::domain::archive::image_archive_name;
use crate::domain::error::InstallError;
use crate::domain::layout::{CONTAINER_NAME, DEFAULT_SITE_CONFIG, IMAGE_NAME, INSTALL_ROOT};
use crate::domain::settings::{InstallSettings, ProfileEnv, is_not_running, is_valid_version};

/// Upper bound for `docker load` of a compressed image.
pub const IMAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// What an install run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentInstallReport {
    /// Version read from the package.
    pub version: String,
    /// Image architecture loaded.
    pub arch: &'static str,
    /// File name of the loaded image archive.
    pub archive: String,
    /// `false` when an existing default site configuration was kept.
    pub default_config_installed: bool,
    /// Site scripts newly copied (the default configuration excluded).
    pub site_scripts_installed: usize,
    /// Whether the sensor was started and observed running.
    pub sensor_running: bool,
}

/// Install the wrapper, profile, image and site scripts, then optionally start the sensor.
///
/// # Errors
///
/// Returns the first failing step's error; nothing after it runs.
pub async fn install_agent(
    settings: &InstallSettings,
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
) -> Result<AgentInstallReport> {
    let version = read_version(settings, fs)?;
    install_wrapper(settings, fs).await?;
    let env = write_profile(settings, fs, &version)?;
    stop_service(settings, runner, &env).await?;

    let arch = resolve_architecture(runner).await?;
    let archive = load_image(settings, runner, fs, reporter, &version, arch).await?;

    let default_config_installed = install_default_config(settings, fs).await?;
    let site_scripts_installed = install_site_scripts(settings, fs).await?;
    if !default_config_installed {
        reporter.warn(&format!("kept existing {DEFAULT_SITE_CONFIG}"));
    }

    let sensor_running = if settings.sensor {
        start_service(settings, runner, reporter, &env).await?;
        true
    } else {
        false
    };

    Ok(AgentInstallReport {
        version,
        arch,
        archive,
        default_config_installed,
        site_scripts_installed,
        sensor_running,
    })
}

/// Read the packaged version record.
///
/// # Errors
///
/// Returns [`InstallError::MissingVersion`] if the file is absent or blank,
/// or [`InstallError::InvalidVersion`] if it holds characters that are not
/// safe in the shell profile.
pub fn read_version(settings: &InstallSettings, fs: &impl LocalFs) -> Result<String> {
    let path = settings.package.version_file();
    let missing = || InstallError::MissingVersion(path.display().to_string());
    if !fs.exists(&path) {
        return Err(missing().into());
    }
    let version = fs.read_to_string(&path)?.trim().to_string();
    if version.is_empty() {
        return Err(missing().into());
    }
    if !is_valid_version(&version) {
        return Err(InstallError::InvalidVersion(version).into());
    }
    Ok(version)
}

/// Repository name the package's image archives were staged from.
///
/// Packages without an image record carry [`IMAGE_NAME`] archives.
fn read_image_name(settings: &InstallSettings, fs: &impl LocalFs) -> Result<String> {
    let path = settings.package.image_file();
    if !fs.exists(&path) {
        return Ok(IMAGE_NAME.to_string());
    }
    let name = fs.read_to_string(&path)?.trim().to_string();
    if name.is_empty() {
        return Ok(IMAGE_NAME.to_string());
    }
    Ok(name)
}

async fn install_wrapper(settings: &InstallSettings, fs: &impl LocalFs) -> Result<()> {
    let wrapper = settings.layout.wrapper();
    create_parent(fs, &wrapper)?;
    fs.copy_file(&settings.package.wrapper_script(), &wrapper).await?;
    fs.set_permissions(&wrapper, 0o755)?;

    let link = settings.layout.bin_link();
    if fs.read_link(&link).as_deref() == Some(wrapper.as_path()) {
        return Ok(());
    }
    if fs.exists(&link) {
        fs.remove_file(&link)?;
    }
    create_parent(fs, &link)?;
    fs.symlink(&wrapper, &link)
}

fn write_profile(settings: &InstallSettings, fs: &impl LocalFs, version: &str) -> Result<ProfileEnv> {
    let env = ProfileEnv {
        top_dir: INSTALL_ROOT.to_string(),
        release: version.to_string(),
    };
    let profile = settings.layout.profile();
    create_parent(fs, &profile)?;
    fs.write(&profile, env.render(&chrono::Utc::now().to_rfc3339()).as_bytes())?;
    Ok(env)
}

async fn stop_service(
    settings: &InstallSettings,
    runner: &impl CommandRunner,
    env: &ProfileEnv,
) -> Result<()> {
    let wrapper = settings.layout.wrapper();
    let output = runner
        .run_with_env(&wrapper.to_string_lossy(), &["stop"], &env.vars())
        .await?;
    if output.status.success() {
        return Ok(());
    }
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    if is_not_running(&text) {
        tracing::info!("zeek was not running");
        return Ok(());
    }
    Err(InstallError::ServiceStopFailed(text.trim().to_string()).into())
}

async fn resolve_architecture(runner: &impl CommandRunner) -> Result<&'static str> {
    let output = runner.run("uname", &["-m"]).await?;
    let machine = String::from_utf8_lossy(&output.stdout);
    map_architecture(&machine)
        .ok_or_else(|| InstallError::UnsupportedArchitecture(machine.trim().to_string()).into())
}

async fn load_image(
    settings: &InstallSettings,
    runner: &impl CommandRunner,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    version: &str,
    arch: &str,
) -> Result<String> {
    let name = image_archive_name(&read_image_name(settings, fs)?, version, arch);
    let packaged = settings.package.images_dir().join(&name);
    let stored = settings.layout.image_store().join(&name);

    if fs.exists(&packaged) {
        let current = fs.exists(&stored)
            && fs.sha256_file(&stored).await? == fs.sha256_file(&packaged).await?;
        if !current {
            create_parent(fs, &stored)?;
            fs.copy_file(&packaged, &stored).await?;
        }
    } else if !fs.exists(&stored) {
        return Err(InstallError::MissingImageArchive(packaged.display().to_string()).into());
    }

    reporter.step(&format!("loading {name}..."));
    let stored_str = stored.to_string_lossy();
    let output = runner
        .run_with_timeout("docker", &["load", "--input", &stored_str], IMAGE_LOAD_TIMEOUT)
        .await?;
    if !output.status.success() {
        return Err(InstallError::ImageLoadFailed {
            path: stored_str.to_string(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }
    reporter.success(&format!("loaded Zeek {version} ({arch})"));
    Ok(name)
}

/// Copy the packaged default configuration unless one is already installed.
///
/// Must run before [`install_site_scripts`] so that an operator's file is
/// seen before anything else could create one at the same path.
async fn install_default_config(settings: &InstallSettings, fs: &impl LocalFs) -> Result<bool> {
    let target = settings.layout.site_dir().join(DEFAULT_SITE_CONFIG);
    if fs.exists(&target) {
        tracing::info!(path = %target.display(), "default site configuration exists, keeping it");
        return Ok(false);
    }
    let packaged = settings.package.site_dir().join(DEFAULT_SITE_CONFIG);
    if !fs.exists(&packaged) {
        tracing::warn!(path = %packaged.display(), "package has no default site configuration");
        return Ok(false);
    }
    create_parent(fs, &target)?;
    fs.copy_file(&packaged, &target).await?;
    Ok(true)
}

async fn install_site_scripts(settings: &InstallSettings, fs: &impl LocalFs) -> Result<usize> {
    let packaged_dir = settings.package.site_dir();
    if !fs.is_dir(&packaged_dir) {
        return Ok(0);
    }
    let site_dir = settings.layout.site_dir();
    let mut installed = 0;
    for relative in fs.list_files(&packaged_dir)? {
        if relative == Path::new(DEFAULT_SITE_CONFIG) {
            continue;
        }
        let target = site_dir.join(&relative);
        if fs.exists(&target) {
            continue;
        }
        create_parent(fs, &target)?;
        fs.copy_file(&packaged_dir.join(&relative), &target).await?;
        installed += 1;
    }
    Ok(installed)
}

async fn start_service(
    settings: &InstallSettings,
    runner: &impl CommandRunner,
    reporter: &impl ProgressReporter,
    env: &ProfileEnv,
) -> Result<()> {
    let wrapper = settings.layout.wrapper();
    let output = runner
        .run_with_env(&wrapper.to_string_lossy(), &["start"], &env.vars())
        .await?;
    if !output.status.success() {
        return Err(InstallError::ServiceStartFailed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        )
        .into());
    }

    reporter.step(&format!(
        "waiting {}s for Zeek to settle...",
        settings.settle.as_secs()
    ));
    tokio::time::sleep(settings.settle).await;

    let filter = format!("name=^{CONTAINER_NAME}$");
    let output = runner
        .run("docker", &["ps", "--filter", &filter, "--format", "{{.State}}"])
        .await?;
    let running = output.status.success()
        && String::from_utf8_lossy(&output.stdout)
            .lines()
            .any(|l| l.trim() == "running");
    if !running {
        return Err(InstallError::ServiceNotRunning.into());
    }
    reporter.success("Zeek sensor running");
    Ok(())
}

fn create_parent(fs: &impl LocalFs, path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) => fs.create_dir_all(parent),
        None => Ok(()),
    }
}
