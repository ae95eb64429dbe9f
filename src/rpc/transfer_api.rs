// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use super::{AppState, auth};
use crate::bigint::BigNum;
use crate::chain::AdmitOutcome;

/// Rounds of the persistence probe; each waits a fraction of a second, so
/// a transfer call spends roughly three seconds confirming placement.
const PROBE_ROUNDS: usize = 6;
const PROBE_MIN_SECS: f64 = 0.3;
const PROBE_MAX_SECS: f64 = 0.7;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TransferRequest {
    dst: String,
    n: i64,
    memo: String,
}

/// `POST /transfer`: authenticated submission of one ticket transfer.
///
/// Builds and signs a block on the current head, admits it locally,
/// broadcasts it, then probes for about three seconds that the block is
/// still on the live path, re-submitting onto the new head whenever a
/// re-org buried it. The response reports how many branches were
/// attempted; a block that is dead at the final probe is still reported as
/// a success, since the client can always check `/getlive`.
pub(crate) async fn transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let user = match auth::authenticate(&headers, &state.passcodes) {
        Ok(user) => user,
        Err(challenge) => return challenge,
    };
    let Ok(request) = serde_json::from_str::<TransferRequest>(&body) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Malformed request body" })),
        )
            .into_response();
    };
    // One consistent key source for the initial submission and every
    // probe re-submission.
    let Some(privkey) = state.secrets.get(&user).cloned() else {
        warn!(%user, "authenticated user has no signing key configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "No signing key configured for user" })),
        )
            .into_response();
    };

    let mut hash = match submit(&state, &user, &request, &privkey) {
        Ok(hash) => hash,
        Err(response) => return response,
    };
    let mut attempts: u32 = 1;

    for _ in 0..PROBE_ROUNDS {
        let delay = rand::thread_rng().gen_range(PROBE_MIN_SECS..PROBE_MAX_SECS);
        tokio::time::sleep(Duration::from_secs_f64(delay)).await;
        let live = state.store.read().is_live(&hash);
        if !live {
            match submit(&state, &user, &request, &privkey) {
                Ok(new_hash) => {
                    hash = new_hash;
                    attempts += 1;
                }
                Err(response) => return response,
            }
        }
    }

    let plural = if attempts > 1 { "es" } else { "" };
    Json(json!({
        "text": format!("Added to {attempts} branch{plural} of blockchain"),
        "block": hash.to_string(),
    }))
    .into_response()
}

/// Builds, signs, admits and broadcasts one block on the current head.
/// Construction and admission share one write lock, so the head cannot
/// move between them; a missing-parent outcome here is an engine bug, not
/// a client error.
fn submit(
    state: &AppState,
    user: &str,
    request: &TransferRequest,
    privkey: &BigNum,
) -> Result<BigNum, Response> {
    let block = {
        let mut store = state.store.write();
        let block = store
            .create_block(user, &request.dst, request.n, &request.memo, privkey)
            .map_err(|reason| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": reason.to_string() })),
                )
                    .into_response()
            })?;
        if let AdmitOutcome::Parked { missing } = store.admit(block.clone()) {
            error!(%missing, "freshly built block reported a missing parent");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Ledger implementation error: freshly built block is missing its parent"
                })),
            )
                .into_response());
        }
        block
    };
    let hash = block.change.hash();
    match serde_json::to_string(&block) {
        Ok(payload) => state.peers.broadcast(&payload),
        Err(e) => warn!(error = %e, "failed to encode block for broadcast"),
    }
    Ok(hash)
}
