// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Peer gossip over persistent WebSocket channels.
//!
//! Every agent both serves `/ws` and dials the `/ws` of each configured
//! peer, so any two agents end up with at least one channel between them.
//! Channels are symmetric once open: either side pushes blocks and
//! `missing` requests as single JSON text frames. Convergence does not
//! depend on delivery: a peer that sees a block referencing an unknown
//! parent asks for it on the channel the block arrived on.

mod network_context;
mod network_handler;
mod peer_manager;

pub use self::network_context::spawn_peer_connections;
pub use self::network_handler::handle_message;
pub use self::peer_manager::{PeerChannel, PeerManager};

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;

use crate::chain::ChainStore;

/// Runs the gossip loop over a WebSocket accepted by our own HTTP server.
/// Returns when the peer disconnects.
pub async fn attach_inbound_channel(
    store: Arc<RwLock<ChainStore>>,
    peers: Arc<PeerManager>,
    socket: WebSocket,
) {
    let (channel, mut outbound) = peers.register();
    let (mut sink, mut stream) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(payload) = outbound.recv().await {
            if sink.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if let Some(reply) = handle_message(&store, text.as_str()) {
                    channel.send(reply);
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }
    peers.unregister(channel.id());
    writer.abort();
}
