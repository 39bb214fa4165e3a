//! Installation state machine.
//!
//! Stages advance strictly in order. There is no resume: a re-run always
//! starts again from [`InstallStage::Init`], so every transition must be
//! idempotent on its own.

use std::fmt;

/// Installation stages in order of completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InstallStage {
    /// Settings built, legacy sensor located. Nothing changed yet.
    Init,
    /// Host passed preconditions; legacy sensor stopped and its logs linked.
    ChecksPassed,
    /// Docker is installed and answers.
    RuntimeReady,
    /// Image loaded, scripts and configuration in place.
    AgentInstalled,
    /// Obsolete legacy files handled.
    Cleaned,
    /// Terminal success state.
    Done,
}

impl InstallStage {
    /// The stage after this one, or `None` for [`InstallStage::Done`].
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::ChecksPassed),
            Self::ChecksPassed => Some(Self::RuntimeReady),
            Self::RuntimeReady => Some(Self::AgentInstalled),
            Self::AgentInstalled => Some(Self::Cleaned),
            Self::Cleaned => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Progress message shown while transitioning into this stage.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Init => "starting",
            Self::ChecksPassed => "checking host",
            Self::RuntimeReady => "preparing Docker",
            Self::AgentInstalled => "installing Zeek",
            Self::Cleaned => "cleaning up legacy files",
            Self::Done => "finishing",
        }
    }
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::ChecksPassed => "checks_passed",
            Self::RuntimeReady => "runtime_ready",
            Self::AgentInstalled => "agent_installed",
            Self::Cleaned => "cleaned",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}
