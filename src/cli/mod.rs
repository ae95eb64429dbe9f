// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

mod config;

pub use self::config::*;

use std::path::PathBuf;

use clap::Parser;

/// Command-line interface of the agent daemon.
#[derive(Debug, Parser)]
#[command(name = "midway-agent", version, about)]
pub struct Cli {
    /// Path to a JSON file with public keys and peer hosts
    #[arg(
        short = 'u',
        long = "pub",
        value_name = "FILE",
        default_value = "configs/pub.json"
    )]
    pub public: PathBuf,

    /// Path to a JSON file with a port, secret keys, and passcodes
    #[arg(
        short = 'v',
        long = "priv",
        value_name = "FILE",
        default_value = "configs/priv.json"
    )]
    pub private: PathBuf,
}
