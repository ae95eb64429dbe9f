// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::HashMap;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tracing::warn;

use super::AppState;
use crate::bigint::BigNum;

/// `GET /chain`: every block this agent knows about, keyed by decimal
/// change-hash. Live-ness is irrelevant; dead branches are included.
pub(crate) async fn chain(State(state): State<AppState>) -> Json<Value> {
    let store = state.store.read();
    let mut map = serde_json::Map::new();
    for (hash, block) in store.blocks() {
        match serde_json::to_value(block) {
            Ok(mut value) => {
                browser_safe(&mut value);
                map.insert(hash.to_string(), value);
            }
            Err(e) => warn!(%hash, error = %e, "failed to encode block"),
        }
    }
    Json(Value::Object(map))
}

/// `GET /balances`: ticket count per account at the head. Accounts still
/// at the starting amount are omitted.
pub(crate) async fn balances(State(state): State<AppState>) -> Json<HashMap<String, i64>> {
    Json(state.store.write().accounts())
}

/// `POST /getlive`: body is a decimal change-hash; returns the block only
/// if it is present *and* on the live path.
pub(crate) async fn get_live(State(state): State<AppState>, body: String) -> Response {
    let Ok(wanted) = body.trim().parse::<BigNum>() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Malformed block id" })),
        )
            .into_response();
    };
    let store = state.store.read();
    let Some(block) = store.block(&wanted) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("No block {wanted} in the blockchain") })),
        )
            .into_response();
    };
    if !store.is_live(&wanted) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("Block {wanted} is on a dead branch") })),
        )
            .into_response();
    }
    Json(block).into_response()
}

/// Rewrites integers above `i32::MAX` into decimal strings. Browsers parse
/// JSON numbers into 64-bit floats and would silently corrupt hashes,
/// signatures and keys.
fn browser_safe(value: &mut Value) {
    match value {
        Value::Number(number) => {
            let keep = number.as_i64().is_some_and(|small| small <= i64::from(i32::MAX));
            if !keep {
                *value = Value::String(number.to_string());
            }
        }
        Value::Object(map) => map.values_mut().for_each(browser_safe),
        Value::Array(items) => items.iter_mut().for_each(browser_safe),
        _ => {}
    }
}
