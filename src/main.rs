// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::process::ExitCode;

use clap::Parser;
use midway::cli::{self, Cli};
use midway::{daemon, logger};
use tracing::error;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::setup_logger();

    // A missing or unreadable config file is the one documented failure
    // exit: code 1.
    let (public, private) = match (cli::load_public(&cli.public), cli::load_private(&cli.private))
    {
        (Ok(public), Ok(private)) => (public, private),
        (Err(e), _) | (_, Err(e)) => {
            error!("{e:#}");
            return ExitCode::from(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "cannot start async runtime");
            return ExitCode::FAILURE;
        }
    };
    match runtime.block_on(daemon::start(public, private)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
