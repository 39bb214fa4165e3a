//! Application service: the installation state machine.
//!
//! Drives [`InstallStage`] from `Init` to `Done`, running each transition's
//! steps. The first failing step halts the machine; the error carries the
//! stage it came from. Nothing is rolled back and nothing is saved: a re-run
//! starts over and relies on every step being idempotent.

use anyhow::{Context, Result};

use crate::application::ports::{BinaryLocator, CommandRunner, LocalFs, ProgressReporter, Prompt};
use crate::application::services::agent_install::{AgentInstallReport, install_agent};
use crate::application::services::{cleanup, guard, legacy, preconditions, runtime};
use crate::domain::error::InstallError;
use crate::domain::layout::LOG_PATH;
use crate::domain::settings::{InstallSettings, InstallState, LegacyAgent};
use crate::domain::stage::InstallStage;

/// The ports a run needs, borrowed for its duration.
pub struct InstallDeps<'a, R, F, L, P, G> {
    pub runner: &'a R,
    pub fs: &'a F,
    pub locator: &'a L,
    pub prompt: &'a P,
    pub reporter: &'a G,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallSummary {
    /// Last stage reached ([`InstallStage::Done`] on success).
    pub stage: Option<InstallStage>,
    /// Legacy sensor found at start, if any.
    pub legacy: Option<LegacyAgent>,
    /// Whether this run created the log link to the legacy directory.
    pub logs_migrated: bool,
    /// Result of the install stage.
    pub agent: Option<AgentInstallReport>,
    /// Obsolete legacy files removed during cleanup.
    pub legacy_files_removed: usize,
}

/// Run the installation from `Init` to `Done`.
///
/// # Errors
///
/// Returns the first failing step's error, with the stage as context.
pub async fn run_install<R, F, L, P, G>(
    settings: &InstallSettings,
    deps: &InstallDeps<'_, R, F, L, P, G>,
) -> Result<InstallSummary>
where
    R: CommandRunner,
    F: LocalFs,
    L: BinaryLocator,
    P: Prompt,
    G: ProgressReporter,
{
    let state = InstallState {
        settings: settings.clone(),
        legacy: legacy::find_legacy_agent(&settings.layout, deps.fs, deps.locator),
    };
    let mut summary = InstallSummary {
        stage: Some(InstallStage::Init),
        legacy: state.legacy.clone(),
        ..InstallSummary::default()
    };

    let mut stage = InstallStage::Init;
    while let Some(next) = stage.next() {
        tracing::info!(from = %stage, to = %next, "advancing");
        deps.reporter.step(&format!("{}...", next.description()));
        advance(next, &state, deps, &mut summary)
            .await
            .with_context(|| format!("{} failed ({next})", next.description()))?;
        stage = next;
        summary.stage = Some(stage);
    }
    Ok(summary)
}

async fn advance<R, F, L, P, G>(
    next: InstallStage,
    state: &InstallState,
    deps: &InstallDeps<'_, R, F, L, P, G>,
    summary: &mut InstallSummary,
) -> Result<()>
where
    R: CommandRunner,
    F: LocalFs,
    L: BinaryLocator,
    P: Prompt,
    G: ProgressReporter,
{
    let settings = &state.settings;
    match next {
        InstallStage::Init => {}
        InstallStage::ChecksPassed => {
            preconditions::check_system(settings, deps.runner, deps.fs, deps.locator).await?;
            guard::ensure_no_unmanaged_install(&settings.layout, deps.fs, deps.locator)?;
            if let Some(agent) = &state.legacy {
                let question = format!(
                    "A legacy Bro sensor was found at {}. Stop it and keep its logs under {LOG_PATH}?",
                    agent.control.display()
                );
                deps.reporter.clear();
                if !deps.prompt.confirm(&question, true)? {
                    return Err(InstallError::Declined.into());
                }
                legacy::stop_legacy_agent(agent, deps.runner, deps.reporter).await?;
                summary.logs_migrated =
                    legacy::migrate_legacy_logs(agent, &settings.layout, deps.fs, deps.reporter)?;
            }
            deps.reporter.success("host checks passed");
        }
        InstallStage::RuntimeReady => {
            runtime::ensure_runtime(settings, deps.runner, deps.reporter).await?;
        }
        InstallStage::AgentInstalled => {
            summary.agent = Some(install_agent(settings, deps.runner, deps.fs, deps.reporter).await?);
        }
        InstallStage::Cleaned => {
            summary.legacy_files_removed =
                cleanup::remove_obsolete_files(&settings.layout, deps.fs, deps.prompt, deps.reporter)?;
        }
        InstallStage::Done => {
            if let Some(agent) = &summary.agent {
                deps.reporter
                    .success(&format!("Zeek {} installed ({})", agent.version, agent.arch));
            }
        }
    }
    Ok(())
}
