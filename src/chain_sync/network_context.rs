// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::HashMap;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{info, warn};

use super::network_handler;
use super::peer_manager::PeerManager;
use crate::blocks::Block;
use crate::chain::ChainStore;

/// Dials every configured peer in random order, each in its own task, so
/// one unresponsive host cannot delay the others. Connection failures are
/// operational noise: logged and forgotten, since the peer will dial us
/// when it comes up.
pub fn spawn_peer_connections(
    store: Arc<RwLock<ChainStore>>,
    peers: Arc<PeerManager>,
    client: reqwest::Client,
    mut hosts: Vec<String>,
) {
    hosts.shuffle(&mut rand::thread_rng());
    for host in hosts {
        tokio::spawn(connect_peer(
            store.clone(),
            peers.clone(),
            client.clone(),
            host,
        ));
    }
}

async fn connect_peer(
    store: Arc<RwLock<ChainStore>>,
    peers: Arc<PeerManager>,
    client: reqwest::Client,
    host: String,
) {
    let url = format!("ws://{host}/ws");
    let (socket, _) = match connect_async(&url).await {
        Ok(connected) => connected,
        Err(e) => {
            warn!(%host, error = %e, "peer did not respond");
            return;
        }
    };
    info!(%host, "peer channel established");

    // The first channel to open wins the bootstrap election and pulls the
    // peer's whole chain before settling into gossip.
    if peers.try_elect_bootstrap() {
        if let Err(e) = pull_chain(&store, &client, &host).await {
            warn!(%host, error = %e, "initial chain pull failed");
        }
    }

    run_outbound_channel(store, peers, socket).await;
}

/// One-shot full-chain download over the peer's HTTP surface. Blocks are
/// admitted one by one in whatever order the map yields them; out-of-order
/// arrivals park in the pending buffer and drain when their parent shows
/// up, so no fetch requests are needed here.
async fn pull_chain(
    store: &RwLock<ChainStore>,
    client: &reqwest::Client,
    host: &str,
) -> anyhow::Result<()> {
    let url = format!("http://{host}/chain");
    let blocks: HashMap<String, Block> = client.get(url).send().await?.json().await?;
    let total = blocks.len();
    let mut store = store.write();
    for block in blocks.into_values() {
        let _ = store.admit(block);
    }
    info!(%host, total, accepted = store.len(), "bootstrapped from peer chain");
    Ok(())
}

/// Gossip loop over a channel we dialed. Mirrors the inbound loop in
/// `attach_inbound_channel`; the protocol is symmetric once the socket is
/// open.
async fn run_outbound_channel(
    store: Arc<RwLock<ChainStore>>,
    peers: Arc<PeerManager>,
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
) {
    let (channel, mut outbound) = peers.register();
    let (mut sink, mut stream) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(payload) = outbound.recv().await {
            if sink.send(Message::text(payload)).await.is_err() {
                break;
            }
        }
    });
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if let Some(reply) = network_handler::handle_message(&store, text.as_str()) {
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
