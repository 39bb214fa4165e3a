//! `install-zeek`: run the installation state machine on this host.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::app::AppContext;
use crate::application::ports::CommandRunner;
use crate::application::services::orchestrator::{InstallDeps, InstallSummary, run_install};
use crate::domain::error::InstallError;
use crate::domain::layout::{InstallLayout, LOG_PATH, VERSION_FILE};
use crate::domain::settings::InstallSettings;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::fs::HostFs;
use crate::infra::locator::PathLocator;
use crate::output::TerminalReporter;

/// Arguments for the install command.
pub struct InstallArgs {
    pub sensor: bool,
    pub package: Option<PathBuf>,
    pub root: Option<PathBuf>,
}

/// Entry point for `install-zeek`.
///
/// Builds the settings once, then races the orchestrator against Ctrl-C;
/// an interrupt ends the run as [`InstallError::Cancelled`].
///
/// # Errors
///
/// Returns the failing stage's error, or a cancellation.
pub async fn run(ctx: &AppContext, args: InstallArgs) -> Result<()> {
    let runner = TokioCommandRunner::default();
    let elevated = detect_elevated(&runner).await;
    let package = resolve_package_dir(args.package)?;

    let mut settings = InstallSettings::new(args.sensor, ctx.non_interactive, elevated, package);
    if let Some(root) = args.root {
        settings = settings.with_layout(InstallLayout::new(root));
    }
    tracing::debug!(?settings, "install settings");

    let fs = HostFs;
    let locator = PathLocator::from_env();
    let reporter = TerminalReporter::new(&ctx.output);
    let deps = InstallDeps {
        runner: &runner,
        fs: &fs,
        locator: &locator,
        prompt: ctx,
        reporter: &reporter,
    };

    ctx.output.header("Installing Zeek");
    let summary = tokio::select! {
        result = run_install(&settings, &deps) => result,
        _ = tokio::signal::ctrl_c() => Err(InstallError::Cancelled.into()),
    };
    reporter.finish();
    let summary = summary?;

    print_summary(ctx, &summary);
    Ok(())
}

/// Whether the process runs with effective uid 0.
async fn detect_elevated(runner: &impl CommandRunner) -> bool {
    runner
        .run("id", &["-u"])
        .await
        .is_ok_and(|o| o.status.success() && String::from_utf8_lossy(&o.stdout).trim() == "0")
}

/// The package directory: explicit, else next to this binary, else the working directory.
fn resolve_package_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    let exe = std::env::current_exe().context("cannot locate install-zeek")?;
    if let Some(dir) = exe.parent()
        && dir.join(VERSION_FILE).is_file()
    {
        return Ok(dir.to_path_buf());
    }
    std::env::current_dir().context("cannot read working directory")
}

fn print_summary(ctx: &AppContext, summary: &InstallSummary) {
    ctx.output.blank();
    if let Some(agent) = &summary.agent {
        ctx.output.kv("Version", &agent.version);
        ctx.output.kv("Architecture", agent.arch);
        let sensor = if agent.sensor_running {
            "running"
        } else {
            "stopped (start with: zeek start)"
        };
        ctx.output.kv("Sensor", sensor);
    }
    if let Some(legacy) = &summary.legacy {
        ctx.output
            .kv("Legacy Bro", &format!("stopped ({})", legacy.control.display()));
        if summary.logs_migrated {
            ctx.output.kv("Logs", &format!("{LOG_PATH} -> legacy log directory"));
        }
    }
    if summary.legacy_files_removed > 0 {
        ctx.output.kv(
            "Cleaned up",
            &format!("{} obsolete legacy file(s)", summary.legacy_files_removed),
        );
    }
}
