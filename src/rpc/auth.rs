// Copyright 2019-2023 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::HashMap;

use axum::http::{StatusCode, header};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use base64::{Engine, prelude::BASE64_STANDARD};

const CHALLENGE: &str = "Basic realm=\"midway\"";

/// HTTP Basic authentication against the configured passcode table.
/// Any failure yields the same 401 challenge; the response never hints at
/// whether the username exists.
pub(crate) fn authenticate(
    headers: &HeaderMap,
    passcodes: &HashMap<String, String>,
) -> Result<String, Response> {
    let challenge = || {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, HeaderValue::from_static(CHALLENGE))],
        )
            .into_response()
    };
    let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return Err(challenge());
    };
    let Some(encoded) = value.strip_prefix("Basic ") else {
        return Err(challenge());
    };
    let Ok(decoded) = BASE64_STANDARD.decode(encoded) else {
        return Err(challenge());
    };
    let Ok(text) = String::from_utf8(decoded) else {
        return Err(challenge());
    };
    let Some((user, passcode)) = text.split_once(':') else {
        return Err(challenge());
    };
    if passcodes.get(user).map(String::as_str) == Some(passcode) {
        Ok(user.to_owned())
    } else {
        Err(challenge())
    }
}
