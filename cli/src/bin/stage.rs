//! stage-zeek - package the Zeek image and helper scripts for offline install

use clap::Parser;

use zeek_installer::cli::StageCli;
use zeek_installer::{commands, logging};

#[tokio::main]
async fn main() {
    logging::init();
    let cli = StageCli::parse();
    if let Err(e) = cli.run().await {
        commands::report_error(&e);
        std::process::exit(1);
    }
}
