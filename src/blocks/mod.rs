// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Block and change types plus the canonical encoding that gives a block
//! its identity.
//!
//! A change is canonicalized as JSON with lexicographically sorted keys, no
//! whitespace, and non-ASCII characters emitted literally. The SHA-256 of
//! those UTF-8 bytes, read as a big-endian integer, is the change-hash: the
//! block's identity, its parent link target, and the value a signature
//! commits to. Two agents that disagree on a single byte of this encoding
//! will never agree on a hash, so the rules here are wire-critical.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::bigint::BigNum;

/// Synthetic parent of the first real block. Chain length 0.
pub static ROOT_HASH: LazyLock<BigNum> = LazyLock::new(|| {
    "30791614295234051711832508548800469788824342480481074093233550318061354680202"
        .parse()
        .expect("root hash constant parses")
});

/// The payload of a block: a single ticket transfer applied on top of the
/// parent block named by `old`.
///
/// Field declaration order is the canonical (lexicographic) key order, so
/// serializing with `serde_json` yields the canonical encoding directly.
/// Do not reorder fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Change {
    /// Receiving account.
    pub dst: String,
    /// Opaque note attached by the sender.
    pub memo: String,
    /// Ticket amount moved from `src` to `dst`.
    pub n: i64,
    /// Change-hash of the parent block, or [`ROOT_HASH`].
    pub old: BigNum,
    /// Sending account; the signature must verify against its public key.
    pub src: String,
}

impl Change {
    /// Canonical JSON encoding: sorted keys, no whitespace, non-ASCII
    /// preserved literally.
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(self).expect("change serialization is infallible")
    }

    /// SHA-256 of the canonical encoding as a big-endian integer.
    pub fn hash(&self) -> BigNum {
        let digest = Sha256::digest(self.canonical_json().as_bytes());
        BigNum::from_bytes_be(&digest)
    }
}

/// A change tied to its RSA signature. The signature is valid when
/// `signature ^ 65537 mod pubkey(src)` equals the change-hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Block {
    pub change: Change,
    pub signature: BigNum,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use quickcheck_macros::quickcheck;

    use super::*;
    use crate::test_utils::{construct_change, num};

    #[test]
    fn canonical_encoding_is_byte_stable() {
        let change = construct_change(&ROOT_HASH, "alice", "alice_b", 3, "round one");
        assert_eq!(
            change.canonical_json(),
            r#"{"dst":"alice_b","memo":"round one","n":3,"old":30791614295234051711832508548800469788824342480481074093233550318061354680202,"src":"alice"}"#
        );
        assert_eq!(
            change.hash(),
            num("58155097550474440321704226752436838427056937500070511779615551992336810305826")
        );
    }

    #[test]
    fn non_ascii_is_not_escaped() {
        let parent =
            num("58155097550474440321704226752436838427056937500070511779615551992336810305826");
        let change = construct_change(&parent, "alice_b", "alice", 4, "payout ☃ café");
        assert!(change.canonical_json().contains("payout ☃ café"));
        assert_eq!(
            change.hash(),
            num("51850633274529266758480047439578624486151543133550255912975740449218461559410")
        );
    }

    #[test]
    fn control_characters_use_short_escapes() {
        let change = construct_change(
            &ROOT_HASH,
            "bob",
            "bob_b",
            1,
            "tab\there \"quote\" back\\slash\nnewline\u{1}ctl",
        );
        assert_eq!(
            change.canonical_json(),
            r#"{"dst":"bob_b","memo":"tab\there \"quote\" back\\slash\nnewline\u0001ctl","n":1,"old":30791614295234051711832508548800469788824342480481074093233550318061354680202,"src":"bob"}"#
        );
        assert_eq!(
            change.hash(),
            num("39688652212438580275530857711841606123076566701106749864187097490656107967784")
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = serde_json::from_str::<Change>(
            r#"{"dst":"a","memo":"","n":1,"old":0,"src":"b","extra":true}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn stringified_parent_hash_is_accepted() {
        // `/chain` responses stringify anything wider than 31 bits; blocks
        // pulled from there must still parse and hash identically.
        let canonical = construct_change(&ROOT_HASH, "alice", "alice_b", 2, "m");
        let stringified = format!(
            r#"{{"dst":"alice_b","memo":"m","n":2,"old":"{}","src":"alice"}}"#,
            &*ROOT_HASH
        );
        let parsed: Change = serde_json::from_str(&stringified).unwrap();
        assert_eq!(parsed.hash(), canonical.hash());
    }

    #[quickcheck]
    fn hash_ignores_input_key_order(src: String, dst: String, n: i64, memo: String) -> bool {
        let change = construct_change(&ROOT_HASH, &src, &dst, n, &memo);
        let reordered = format!(
            r#"{{"src":{},"old":{},"n":{},"memo":{},"dst":{}}}"#,
            serde_json::to_string(&src).unwrap(),
            &*ROOT_HASH,
            n,
            serde_json::to_string(&memo).unwrap(),
            serde_json::to_string(&dst).unwrap(),
        );
        let parsed: Change = serde_json::from_str(&reordered).unwrap();
        parsed == change && parsed.hash() == change.hash()
    }
}
