// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Process wiring: builds the engine from the configuration, spawns the
//! peer dialer, and serves the HTTP surface until interrupted.

use std::sync::Arc;

use anyhow::Context;
use parking_lot::RwLock;
use tracing::{error, info};

use crate::chain::{ChainStore, is_booth};
use crate::chain_sync::{self, PeerManager};
use crate::cli::{PrivateConfig, PublicConfig};
use crate::registry::UserRegistry;
use crate::rpc::{self, AppState};

/// Runs the agent until shutdown. Returns once the listener has closed
/// and the peer channels are dropped.
pub async fn start(public: PublicConfig, private: PrivateConfig) -> anyhow::Result<()> {
    let registry = UserRegistry::new(public.clone());
    info!(users = registry.len(), "loaded user registry");

    // Peers are every remote account's host; our own accounts are the ones
    // we hold secret keys for.
    let hosts: Vec<String> = public
        .iter()
        .filter(|(name, _)| !private.secret.contains_key(name.as_str()))
        .filter_map(|(_, record)| record.host.clone())
        .collect();

    let mut booths: Vec<String> = public.keys().filter(|n| is_booth(n)).cloned().collect();
    booths.sort();
    let mut players: Vec<String> = public.keys().filter(|n| !is_booth(n)).cloned().collect();
    players.sort();

    if !private.passcodes.is_empty() {
        let mut accounts: Vec<&str> = private.passcodes.keys().map(String::as_str).collect();
        accounts.sort_unstable();
        info!(?accounts, "serving accounts");
    }

    let store = Arc::new(RwLock::new(ChainStore::new(registry)));
    let peers = Arc::new(PeerManager::default());
    let client = reqwest::Client::new();

    chain_sync::spawn_peer_connections(store.clone(), peers.clone(), client, hosts);

    let state = AppState {
        store,
        peers: peers.clone(),
        passcodes: Arc::new(private.passcodes),
        secrets: Arc::new(private.secret),
        booths: Arc::new(booths),
        players: Arc::new(players),
    };
    let app = rpc::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", private.port))
        .await
        .with_context(|| format!("cannot bind port {}", private.port))?;
    info!(port = private.port, "agent listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    // Dropping the channel senders ends the socket writer tasks; in-flight
    // admissions are not awaited.
    peers.clear();
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for the interrupt signal");
        std::future::pending::<()>().await;
    }
    info!("interrupt received, shutting down");
}
