//! `stage-zeek`: build the offline installation package.

use std::path::PathBuf;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::stager::{StageDeps, stage};
use crate::domain::error::StageError;
use crate::infra::archive::TarArchiver;
use crate::infra::assets::site_scripts;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::load_stage_config;
use crate::infra::fetch::HttpFetcher;
use crate::infra::fs::HostFs;
use crate::infra::registry::SkopeoRegistry;
use crate::output::TerminalReporter;

/// Arguments for the stage command.
pub struct StageArgs {
    pub no_pull: bool,
    pub image: Option<String>,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Entry point for `stage-zeek`.
///
/// # Errors
///
/// Returns an error if configuration, registry access, downloads or
/// archiving fail, or on Ctrl-C.
pub async fn run(ctx: &AppContext, args: StageArgs) -> Result<()> {
    let mut config = load_stage_config(args.config.as_deref())?;
    if let Some(image) = args.image {
        config.image = image;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    tracing::debug!(?config, no_pull = args.no_pull, "stage configuration");

    let registry = SkopeoRegistry::new(TokioCommandRunner::default());
    let reporter = TerminalReporter::new(&ctx.output);
    let deps = StageDeps {
        registry: &registry,
        fetcher: &HttpFetcher,
        archiver: &TarArchiver,
        fs: &HostFs,
        reporter: &reporter,
    };
    let scripts = site_scripts();

    ctx.output.header(&format!("Staging {}", config.image));
    let report = tokio::select! {
        result = stage(&config, args.no_pull, &scripts, &deps) => result,
        _ = tokio::signal::ctrl_c() => Err(StageError::Cancelled.into()),
    };
    reporter.finish();
    let report = report?;

    ctx.output.blank();
    ctx.output.kv("Version", &report.version);
    ctx.output.kv("Architectures", &report.architectures.join(", "));
    if !report.reused.is_empty() {
        ctx.output.kv("Reused", &report.reused.join(", "));
    }
    ctx.output.kv("Package", &report.archive.display().to_string());
    Ok(())
}
