// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! HTTP surface of an agent.
//!
//! Consumed by browsers and companion services, not by peers, with two
//! exceptions: `/ws`, where peers upgrade into the gossip protocol, and
//! `/chain`, which a freshly started peer pulls once to bootstrap.

mod auth;
mod chain_api;
mod transfer_api;
mod ws_api;

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use parking_lot::RwLock;

use crate::bigint::BigNum;
use crate::chain::{ChainStore, is_booth};
use crate::chain_sync::PeerManager;

const INDEX_TEMPLATE: &str = include_str!("../../assets/index.html");

/// Shared handles the HTTP handlers work with. The engine stays one owned
/// value behind the lock; everything else is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<ChainStore>>,
    pub peers: Arc<PeerManager>,
    /// username → passcode table for HTTP Basic auth.
    pub passcodes: Arc<HashMap<String, String>>,
    /// username → RSA private exponent for accounts served by this agent.
    pub secrets: Arc<HashMap<String, BigNum>>,
    /// Sorted booth names, offered to players in the UI.
    pub booths: Arc<Vec<String>>,
    /// Sorted player names, offered to booths in the UI.
    pub players: Arc<Vec<String>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/chain", get(chain_api::chain))
        .route("/balances", get(chain_api::balances))
        .route("/getlive", post(chain_api::get_live))
        .route("/transfer", post(transfer_api::transfer))
        .route("/ws", get(ws_api::ws_upgrade))
        .with_state(state)
}

/// Authenticated HTML UI: the bundled page with the username and the
/// account's counterparties substituted in.
async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match auth::authenticate(&headers, &state.passcodes) {
        Ok(user) => user,
        Err(challenge) => return challenge,
    };
    let counterparties = if is_booth(&user) {
        &state.players
    } else {
        &state.booths
    };
    let options: String = counterparties
        .iter()
        .map(|name| format!("<option value=\"{name}\"></option>"))
        .collect();
    let page = INDEX_TEMPLATE
        .replace("__USER__", &user)
        .replace("__COUNTERPARTIES__", &options);
    Html(page).into_response()
}
