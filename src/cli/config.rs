// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::bigint::BigNum;
use crate::registry::UserRecord;

/// Public configuration: the account table every agent in a deployment
/// shares.
pub type PublicConfig = HashMap<String, UserRecord>;

/// Private configuration of one agent: where to listen, who may log in,
/// and the signing keys of the accounts served here.
#[derive(Debug, Clone, Deserialize)]
pub struct PrivateConfig {
    pub port: u16,
    /// username → password for the HTTP UI.
    #[serde(default)]
    pub passcodes: HashMap<String, String>,
    /// username → RSA private exponent.
    #[serde(default)]
    pub secret: HashMap<String, BigNum>,
}

pub fn load_public(path: &Path) -> anyhow::Result<PublicConfig> {
    read_json(path)
}

pub fn load_private(path: &Path) -> anyhow::Result<PrivateConfig> {
    read_json(path)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("cannot parse config file {}", path.display()))
}
