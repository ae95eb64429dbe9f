// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Fixtures shared by the integration tests: a four-account registry with
//! real RSA keys and a helper that serves a fully wired agent on an
//! ephemeral port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use midway::bigint::BigNum;
use midway::blocks::{Block, Change};
use midway::chain::ChainStore;
use midway::chain_sync::PeerManager;
use midway::crypto;
use midway::registry::{UserRecord, UserRegistry};
use midway::rpc::{self, AppState};

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

pub fn privkey(user: &str) -> BigNum {
    let (_, _, d) = KEYS
        .iter()
        .find(|(name, _, _)| *name == user)
        .expect("fixture user exists");
    num(d)
}

pub fn registry() -> UserRegistry {
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

/// A block signed with the fixture key of `src`.
pub fn signed_block(old: &BigNum, src: &str, dst: &str, n: i64, memo: &str) -> Block {
    let change = Change {
        dst: dst.to_owned(),
        memo: memo.to_owned(),
        n,
        old: old.clone(),
        src: src.to_owned(),
    };
    let (_, modulus, privkey) = KEYS
        .iter()
        .find(|(name, _, _)| *name == src)
        .expect("fixture user exists");
    let signature = crypto::sign(&change.hash(), &num(privkey), &num(modulus));
    Block { change, signature }
}

/// State for an agent serving `alice` and `bob`; the booths nominally
/// live elsewhere.
pub fn player_agent_state() -> AppState {
    let passcodes = HashMap::from([
        ("alice".to_owned(), "alice-pass".to_owned()),
        ("bob".to_owned(), "bob-pass".to_owned()),
    ]);
    let secrets = HashMap::from([
        ("alice".to_owned(), privkey("alice")),
        ("bob".to_owned(), privkey("bob")),
    ]);
    AppState {
        store: Arc::new(RwLock::new(ChainStore::new(registry()))),
        peers: Arc::new(PeerManager::default()),
        passcodes: Arc::new(passcodes),
        secrets: Arc::new(secrets),
        booths: Arc::new(vec!["alice_b".to_owned(), "bob_b".to_owned()]),
        players: Arc::new(vec!["alice".to_owned(), "bob".to_owned()]),
    }
}

/// State for an agent serving the two booths.
pub fn booth_agent_state() -> AppState {
    let passcodes = HashMap::from([
        ("alice_b".to_owned(), "alice-b-pass".to_owned()),
        ("bob_b".to_owned(), "bob-b-pass".to_owned()),
    ]);
    let secrets = HashMap::from([
        ("alice_b".to_owned(), privkey("alice_b")),
        ("bob_b".to_owned(), privkey("bob_b")),
    ]);
    AppState {
        store: Arc::new(RwLock::new(ChainStore::new(registry()))),
        peers: Arc::new(PeerManager::default()),
        passcodes: Arc::new(passcodes),
        secrets: Arc::new(secrets),
        booths: Arc::new(vec!["alice_b".to_owned(), "bob_b".to_owned()]),
        players: Arc::new(vec!["alice".to_owned(), "bob".to_owned()]),
    }
}

/// Serves `state` on an ephemeral port; returns `host:port`.
pub async fn spawn_agent(state: AppState) -> String {
    let app = rpc::router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("listener has an address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server runs");
    });
    format!("{addr}")
}
