// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! The set of accounts every agent in a deployment agrees on.
//!
//! Loaded once at startup from the public configuration file and never
//! mutated afterwards; there is no membership-change protocol. A record
//! without a `host` is a purely local identity; a record without a `key`
//! can never author a valid block.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::bigint::BigNum;

/// Public record for one account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// RSA public modulus. The public exponent is always 65537.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<BigNum>,
    /// `hostname:port` of the agent serving this account, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

/// Immutable username → record table.
#[derive(Debug, Clone, Default)]
pub struct UserRegistry {
    users: HashMap<String, UserRecord>,
}

impl UserRegistry {
    pub fn new(users: HashMap<String, UserRecord>) -> Self {
        Self { users }
    }

    pub fn is_known(&self, user: &str) -> bool {
        self.users.contains_key(user)
    }

    /// Public modulus of `user`, if the user exists and has a key.
    pub fn pubkey(&self, user: &str) -> Option<&BigNum> {
        self.users.get(user).and_then(|record| record.key.as_ref())
    }

    pub fn peer_host(&self, user: &str) -> Option<&str> {
        self.users
            .get(user)
            .and_then(|record| record.host.as_deref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.users.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
