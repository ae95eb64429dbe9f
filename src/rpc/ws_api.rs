// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;

use super::AppState;
use crate::chain_sync;

/// `GET /ws`: upgrades into the peer gossip protocol. The channel joins
/// the broadcast set until the peer hangs up.
pub(crate) async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| {
        chain_sync::attach_inbound_channel(state.store.clone(), state.peers.clone(), socket)
    })
}
