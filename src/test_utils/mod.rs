// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Shared fixtures for unit tests: four accounts with real 512-bit RSA
//! keypairs (exponent 65537) and builders for signed blocks.

use std::collections::HashMap;

use crate::bigint::BigNum;
use crate::blocks::{Block, Change};
use crate::chain::ChainStore;
use crate::crypto;
use crate::registry::{UserRecord, UserRegistry};

/// `(name, modulus, private exponent)` per fixture account.
const KEYS: &[(&str, &str, &str)] = &[
    (
        "alice",
        "5931190384138239304086661468993740550015213333884491371122817415764553387012585315369737999648149648367104401240803089441612134152942158894128333337136621",
        "5220482874080751270533209945182643848315876008236461849822979382806086601102048209788036219067871691839281505857774531335164205519650787325014722238988977",
    ),
    (
        "alice_b",
        "10757179132041503584452558885408078744443958459941573566949372837118858819397639400898545662212789209999585425030357260676251306503358730059484836009158353",
        "369641079166844165466639647984176775447270922559598756012176139115181806632635241144352387119233900642727922636256128753038258607132888337953244250202113",
    ),
    (
        "bob",
        "5901152360632709945502814163560451637569919534489802625134840779519728341352653718865314068956004941414666825247080319204873099851040296726389536921745717",
        "1749896928094604346871258837826476908075343946675539378013496127518598663134479353109083436338131804387073350444474262359140392463923364437695895923087545",
    ),
    (
        "bob_b",
        "6475117600602714329309697469326445680063255281454078884270263086651264930872707039904216956924425000694021342634454937347679034774150077985715227643742433",
        "1943217006708488112499246682434541306979021085427145330055198351896746550199140910042114768684537750029923422590516163381511295764547143989909223622256385",
    ),
];

pub fn num(s: &str) -> BigNum {
    s.parse().expect("fixture integer parses")
}

/// `(modulus, private exponent)` for a fixture account.
pub fn keypair(user: &str) -> (BigNum, BigNum) {
    let (_, modulus, privkey) = KEYS
        .iter()
        .find(|(name, _, _)| *name == user)
        .unwrap_or_else(|| panic!("no fixture key for {user}"));
    (num(modulus), num(privkey))
}

pub fn privkey(user: &str) -> BigNum {
    keypair(user).1
}

pub fn construct_registry() -> UserRegistry {
    let users: HashMap<String, UserRecord> = KEYS
        .iter()
        .map(|(name, modulus, _)| {
            (
                (*name).to_owned(),
                UserRecord {
                    key: Some(num(modulus)),
                    host: None,
                },
            )
        })
        .collect();
    UserRegistry::new(users)
}

pub fn construct_store() -> ChainStore {
    ChainStore::new(construct_registry())
}

pub fn construct_change(old: &BigNum, src: &str, dst: &str, n: i64, memo: &str) -> Change {
    Change {
        dst: dst.to_owned(),
        memo: memo.to_owned(),
        n,
        old: old.clone(),
        src: src.to_owned(),
    }
}

/// A change signed with the fixture key of `src`.
pub fn construct_block(old: &BigNum, src: &str, dst: &str, n: i64, memo: &str) -> Block {
    let change = construct_change(old, src, dst, n, memo);
    let (modulus, privkey) = keypair(src);
    let signature = crypto::sign(&change.hash(), &privkey, &modulus);
    Block { change, signature }
}
