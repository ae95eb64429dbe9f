// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Textbook RSA over change-hashes.
//!
//! Every account signs with its private exponent over the raw change-hash;
//! everyone verifies with the fixed public exponent 65537 against the
//! signer's public modulus from the user registry. There is no padding
//! scheme: the hash is already a full-width digest and the protocol treats
//! signatures as plain integers.

use std::sync::LazyLock;

use crate::bigint::BigNum;

/// Fixed public exponent (`0x10001`) shared by every account key.
pub static PUBLIC_EXPONENT: LazyLock<BigNum> = LazyLock::new(|| BigNum::from(65537));

/// Signs a change-hash: `hash ^ privkey mod modulus`.
///
/// The result only verifies if `privkey` is the inverse of 65537 modulo
/// the totient of `modulus`; callers are expected to round-trip through
/// [`verify`] and treat a mismatch as a wrong key.
pub fn sign(change_hash: &BigNum, privkey: &BigNum, modulus: &BigNum) -> BigNum {
    change_hash.modpow(privkey, modulus)
}

/// Checks `signature ^ 65537 mod pubkey == change_hash`.
pub fn verify(change_hash: &BigNum, signature: &BigNum, pubkey: &BigNum) -> bool {
    signature.modpow(&PUBLIC_EXPONENT, pubkey) == *change_hash
}
