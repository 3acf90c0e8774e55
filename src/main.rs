//! slabtop: display kernel slab cache information in real time.
//!
//! Run: `slabtop [-d secs] [-o] [-s char]`

use anyhow::Result;
use clap::Parser;

use slabtop::cli::Cli;
use slabtop::{app, debug, Config, ProcSlabinfo, Settings};

fn main() -> Result<()> {
    let cli = Cli::parse();
    debug::init(cli.debug);

    let settings = match Config::for_cli(&cli).and_then(|config| Settings::resolve(&cli, &config)) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("slabtop: {e}");
            std::process::exit(1);
        }
    };
    slabtop::debug!("main", "settings: {:?}", settings);

    match app::run(&settings, ProcSlabinfo::new()) {
        Ok(outcome) => {
            slabtop::info!("main", "exit: {:?}", outcome);
            Ok(())
        }
        Err(e) => {
            eprintln!("slabtop: {e}");
            std::process::exit(1);
        }
    }
}
