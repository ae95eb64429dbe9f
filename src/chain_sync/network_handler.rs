// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

use crate::bigint::BigNum;
use crate::blocks::Block;
use crate::chain::{AdmitOutcome, ChainStore};

/// Dispatches one inbound peer frame and returns the reply to send back on
/// the same channel, if any.
///
/// Exactly two shapes are understood, matched on their full key set:
///
/// - `{"change": .., "signature": ..}`: a gossiped block, fed to the
///   admission pipeline. A parked block produces a `{"missing": parent}`
///   request; every other outcome is silent.
/// - `{"missing": h}`: a fetch request. Answered with the block whether or
///   not it is on the live path; ignored when we do not have it.
///
/// Anything else is logged and discarded. Admission happens synchronously
/// under the store lock, so a burst of frames from several peers is
/// serialized into one arrival order.
pub fn handle_message(store: &RwLock<ChainStore>, text: &str) -> Option<String> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "malformed peer message");
            return None;
        }
    };
    let Value::Object(fields) = &value else {
        warn!("malformed peer message: not an object");
        return None;
    };

    if fields.len() == 1 && fields.contains_key("missing") {
        let wanted: BigNum = match serde_json::from_value(fields["missing"].clone()) {
            Ok(hash) => hash,
            Err(e) => {
                warn!(error = %e, "malformed missing-block request");
                return None;
            }
        };
        let store = store.read();
        let block = store.block(&wanted)?;
        match serde_json::to_string(block) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(error = %e, "failed to encode block for peer");
                None
            }
        }
    } else if fields.len() == 2 && fields.contains_key("change") && fields.contains_key("signature")
    {
        let block: Block = match serde_json::from_value(value) {
            Ok(block) => block,
            Err(e) => {
                debug!(error = %e, "undecodable block from peer");
                return None;
            }
        };
        match store.write().admit(block) {
            AdmitOutcome::Parked { missing } => {
                Some(serde_json::json!({ "missing": missing }).to_string())
            }
            _ => None,
        }
    } else {
        warn!("malformed peer message: unexpected shape");
        None
    }
}
