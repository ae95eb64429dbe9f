// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Arbitrary-precision unsigned integers as they appear on the wire.
//!
//! Change hashes, signatures and public RSA moduli are all 256-bit-or-wider
//! integers carried in JSON as plain decimal numbers. [`BigNum`] wraps
//! [`num_bigint::BigUint`] with the serialization rules the protocol needs:
//! numbers are emitted as bare JSON numbers (never strings, never quoted)
//! and accepted as either a number or a decimal string. The string form
//! shows up in `/chain` responses, where anything above `i32::MAX` is
//! stringified for browsers that cannot parse big JSON integers.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Unsigned big integer with protocol-compatible JSON serialization.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BigNum(BigUint);

impl BigNum {
    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        Self(BigUint::from_bytes_be(bytes))
    }

    /// `self ^ exponent mod modulus`.
    pub fn modpow(&self, exponent: &BigNum, modulus: &BigNum) -> BigNum {
        Self(self.0.modpow(&exponent.0, &modulus.0))
    }
}

impl fmt::Display for BigNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for BigNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BigNum({})", self.0)
    }
}

impl FromStr for BigNum {
    type Err = num_bigint::ParseBigIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<u64> for BigNum {
    fn from(n: u64) -> Self {
        Self(BigUint::from(n))
    }
}

impl Serialize for BigNum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Round-trips through `serde_json::Number` so the value lands in the
        // output as a bare number. Requires the `arbitrary_precision`
        // feature; without it anything wider than 64 bits would be mangled.
        let number = serde_json::Number::from_str(&self.0.to_string())
            .map_err(|e| S::Error::custom(format!("big integer not a JSON number: {e}")))?;
        number.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BigNum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let text = match &value {
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::String(s) => s.clone(),
            other => {
                return Err(D::Error::custom(format!(
                    "expected an integer or decimal string, got {other}"
                )));
            }
        };
        text.parse()
            .map_err(|e| D::Error::custom(format!("invalid big integer {text:?}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(s: &str) -> BigNum {
        s.parse().unwrap()
    }

    #[test]
    fn round_trips_as_bare_json_number() {
        let n = num("30791614295234051711832508548800469788824342480481074093233550318061354680202");
        let encoded = serde_json::to_string(&n).unwrap();
        assert_eq!(
            encoded,
            "30791614295234051711832508548800469788824342480481074093233550318061354680202"
        );
        let decoded: BigNum = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, n);
    }

    #[test]
    fn accepts_decimal_strings() {
        let decoded: BigNum = serde_json::from_str("\"12345678901234567890123456789\"").unwrap();
        assert_eq!(decoded, num("12345678901234567890123456789"));
    }

    #[test]
    fn rejects_floats_and_negatives() {
        assert!(serde_json::from_str::<BigNum>("1.5").is_err());
        assert!(serde_json::from_str::<BigNum>("-7").is_err());
        assert!(serde_json::from_str::<BigNum>("[]").is_err());
        assert!(serde_json::from_str::<BigNum>("\"not a number\"").is_err());
    }

    #[test]
    fn orders_numerically() {
        assert!(num("9") < num("10"));
        assert!(num("99999999999999999999") < num("100000000000000000000"));
    }
}
