// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Gossip over real WebSocket connections: fetch requests, orphan
//! resolution, bootstrap, and broadcast convergence between two agents.

mod common;

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use midway::bigint::BigNum;
use midway::blocks::{Block, ROOT_HASH};
use midway::chain::AdmitOutcome;
use midway::chain_sync;

use common::{booth_agent_state, player_agent_state, signed_block, spawn_agent};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn recv_text(socket: &mut Socket) -> String {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("peer replies within five seconds")
            .expect("socket stays open")
            .expect("frame is readable");
        if let Message::Text(text) = frame {
            return text.as_str().to_owned();
        }
    }
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("condition not reached within five seconds");
}

#[tokio::test(flavor = "multi_thread")]
async fn ws_channel_answers_fetches_and_requests_missing_parents() {
    let state = player_agent_state();
    let host = spawn_agent(state.clone()).await;
    let (mut socket, _) = connect_async(format!("ws://{host}/ws")).await.unwrap();

    // Gossip a block; the agent admits it without replying.
    let parent = signed_block(&ROOT_HASH, "alice", "bob_b", 1, "first");
    let parent_hash = parent.change.hash();
    socket
        .send(Message::text(serde_json::to_string(&parent).unwrap()))
        .await
        .unwrap();
    wait_for(|| state.store.read().contains(&parent_hash)).await;

    // A block with an unknown parent draws exactly one fetch request back
    // on the same channel.
    let hidden = signed_block(&parent_hash, "alice", "bob_b", 2, "hidden");
    let hidden_hash = hidden.change.hash();
    let tip = signed_block(&hidden_hash, "alice", "bob_b", 3, "tip");
    let tip_hash = tip.change.hash();
    socket
        .send(Message::text(serde_json::to_string(&tip).unwrap()))
        .await
        .unwrap();
    let request: serde_json::Value = serde_json::from_str(&recv_text(&mut socket).await).unwrap();
    let requested: BigNum = serde_json::from_value(request["missing"].clone()).unwrap();
    assert_eq!(requested, hidden_hash);

    // Supplying the parent drains the buffered tip.
    socket
        .send(Message::text(serde_json::to_string(&hidden).unwrap()))
        .await
        .unwrap();
    wait_for(|| state.store.read().contains(&tip_hash)).await;
    assert_eq!(state.store.read().head(), &tip_hash);

    // Fetch requests are answered with the stored block.
    socket
        .send(Message::text(format!("{{\"missing\":{parent_hash}}}")))
        .await
        .unwrap();
    let block: Block = serde_json::from_str(&recv_text(&mut socket).await).unwrap();
    assert_eq!(block, parent);
}

#[tokio::test(flavor = "multi_thread")]
async fn new_agent_bootstraps_and_follows_broadcasts() {
    // Agent A already has one block when B comes up.
    let state_a = player_agent_state();
    let seeded = signed_block(&ROOT_HASH, "bob", "alice_b", 2, "seed");
    let seeded_hash = seeded.change.hash();
    assert!(matches!(
        state_a.store.write().admit(seeded),
        AdmitOutcome::Accepted { .. }
    ));
    let host_a = spawn_agent(state_a.clone()).await;

    // B dials A; the first open channel pulls A's whole chain.
    let state_b = booth_agent_state();
    chain_sync::spawn_peer_connections(
        state_b.store.clone(),
        state_b.peers.clone(),
        reqwest::Client::new(),
        vec![host_a.clone()],
    );
    wait_for(|| state_b.store.read().contains(&seeded_hash)).await;

    // A locally submitted block on A reaches B over the standing channel.
    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{host_a}/transfer"))
        .basic_auth("alice", Some("alice-pass"))
        .body(r#"{"dst":"bob_b","n":1,"memo":"gossip"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let submitted: BigNum = body["block"].as_str().unwrap().parse().unwrap();

    wait_for(|| state_b.store.read().contains(&submitted)).await;
    assert_eq!(state_a.store.read().head(), state_b.store.read().head());
}
