//! install-zeek - install or upgrade the Zeek sensor from an offline package

use clap::Parser;

use zeek_installer::cli::InstallCli;
use zeek_installer::{commands, logging};

#[tokio::main]
async fn main() {
    logging::init();
    let cli = InstallCli::parse();
    if let Err(e) = cli.run().await {
        commands::report_error(&e);
        std::process::exit(1);
    }
}
