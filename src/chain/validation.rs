// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Role classification and the per-change authorization rules.
//!
//! A booth is any account whose name ends in the literal suffix `_b`;
//! everything else is a player. Transfers are only legal across the two
//! classes, and never between a player and their own namesake booth
//! (`alice` ↔ `alice_b` counts as a self-transfer).

use std::ops::RangeInclusive;

use thiserror::Error;

/// Booth name suffix.
const BOOTH_SUFFIX: &str = "_b";

/// Legal amounts for a player paying a booth.
pub(crate) const PAYMENT_RANGE: RangeInclusive<i64> = 1..=5;
/// Legal amounts for a booth paying a player out.
pub(crate) const PAYOUT_RANGE: RangeInclusive<i64> = 0..=10;

/// Why a change (or a local submission) was refused. The `Display` strings
/// are the exact messages surfaced to clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangeError {
    #[error("Unknown user: {0}")]
    UnknownUser(String),
    #[error("Not authorized")]
    NotAuthorized,
    #[error("Invalid amount")]
    InvalidAmount,
    #[error("Not paid")]
    NotPaid,
    #[error("Wrong key")]
    WrongKey,
}

/// A transfer classified by the roles of its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing<'a> {
    /// Player pays a booth; puts the player into that booth's paid state.
    Payment { player: &'a str, booth: &'a str },
    /// Booth pays a player out; clears the paid state.
    Payout { player: &'a str, booth: &'a str },
}

pub fn is_booth(name: &str) -> bool {
    name.ends_with(BOOTH_SUFFIX)
}

/// Classifies a `src → dst` pair. `None` means the pair is not a
/// player/booth crossing (booth↔booth, player↔player), which is never
/// authorized.
pub fn classify<'a>(src: &'a str, dst: &'a str) -> Option<Pairing<'a>> {
    match (is_booth(src), is_booth(dst)) {
        (false, true) => Some(Pairing::Payment {
            player: src,
            booth: dst,
        }),
        (true, false) => Some(Pairing::Payout {
            player: dst,
            booth: src,
        }),
        _ => None,
    }
}

/// True when `booth` is the player's own namesake (`alice` / `alice_b`).
pub(crate) fn is_namesake(player: &str, booth: &str) -> bool {
    booth.strip_prefix(player) == Some(BOOTH_SUFFIX)
}
