//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::app::AppContext;
use crate::commands;

/// Install the Zeek sensor from an offline package
#[derive(Parser)]
#[command(name = "install-zeek", version)]
pub struct InstallCli {
    /// Start live monitoring once installed
    #[arg(long)]
    pub sensor: bool,

    /// Answer every prompt with its default
    #[arg(short, long)]
    pub yes: bool,

    /// Extracted package directory (defaults to the one holding this binary)
    #[arg(long, env = "ZEEK_PACKAGE_DIR")]
    pub package: Option<PathBuf>,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    #[arg(long, hide = true, env = "ZEEK_INSTALL_ROOT")]
    pub root: Option<PathBuf>,
}

impl InstallCli {
    /// Execute the install.
    ///
    /// # Errors
    ///
    /// Returns an error if any installation stage fails or is cancelled.
    pub async fn run(self) -> Result<()> {
        let ctx = AppContext::new(self.no_color, self.quiet, self.yes);
        let args = commands::install::InstallArgs {
            sensor: self.sensor,
            package: self.package,
            root: self.root,
        };
        commands::install::run(&ctx, args).await
    }
}

/// Build an offline Zeek package
#[derive(Parser)]
#[command(name = "stage-zeek", version)]
pub struct StageCli {
    /// Reuse image archives already staged instead of downloading them again
    #[arg(long)]
    pub no_pull: bool,

    /// Image to package, as <name>:<tag>
    #[arg(long, env = "ZEEK_IMAGE")]
    pub image: Option<String>,

    /// Directory receiving the staging tree and package
    #[arg(long, env = "ZEEK_STAGE_OUTPUT")]
    pub output: Option<PathBuf>,

    /// YAML staging configuration
    #[arg(long, env = "ZEEK_STAGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}

impl StageCli {
    /// Execute staging.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be staged or the package written.
    pub async fn run(self) -> Result<()> {
        let ctx = AppContext::new(self.no_color, self.quiet, true);
        let args = commands::stage::StageArgs {
            no_pull: self.no_pull,
            image: self.image,
            output: self.output,
            config: self.config,
        };
        commands::stage::run(&ctx, args).await
    }
}
