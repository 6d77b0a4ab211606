// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Compact token encoding and decoding.
//!
//! Wire format: `base64url(header).base64url(payload).base64url(signature)`,
//! unpadded, where the signature is the MAC over the first two segments
//! joined by `.`. Both functions are pure.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use subtle::ConstantTimeEq;

use super::claims::Claims;
use super::error::TokenError;
use super::key::SigningKey;

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Sign `claims` with `key` and return the compact token.
pub fn encode(claims: &Claims, key: &SigningKey) -> Result<String, TokenError> {
    let header = Header {
        alg: key.algorithm().name().to_string(),
        typ: Some("JWT".to_string()),
    };
    let header_json = serde_json::to_vec(&header)
        .map_err(|e| TokenError::Configuration(format!("cannot serialize header: {e}")))?;
    let payload_json = serde_json::to_vec(&claims.to_wire_map()?)
        .map_err(|e| TokenError::Configuration(format!("cannot serialize claims: {e}")))?;

    let mut token = Base64UrlUnpadded::encode_string(&header_json);
    token.push('.');
    token.push_str(&Base64UrlUnpadded::encode_string(&payload_json));

    let signature = key.sign(token.as_bytes())?;
    token.push('.');
    token.push_str(&Base64UrlUnpadded::encode_string(&signature));

    Ok(token)
}

/// Verify `token` under `key` and return its claims.
///
/// Only integrity is checked here; expiry and subject belong to the
/// validator.
pub fn decode(token: &str, key: &SigningKey) -> Result<Claims, TokenError> {
    let mut segments = token.split('.');
    let (Some(header_b64), Some(payload_b64), Some(signature_b64), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::malformed("expected three dot-separated segments"));
    };

    let header_bytes = decode_segment(header_b64, "header")?;
    let payload_bytes = decode_segment(payload_b64, "payload")?;
    let signature = decode_segment(signature_b64, "signature")?;

    let header: Header = serde_json::from_slice(&header_bytes)
        .map_err(|e| TokenError::malformed(format!("header is not valid JSON: {e}")))?;

    if header.alg != key.algorithm().name() {
        return Err(TokenError::Signature);
    }

    let signing_input_len = header_b64.len() + 1 + payload_b64.len();
    let expected = key.sign(&token.as_bytes()[..signing_input_len])?;
    if !constant_time_eq(&expected, &signature) {
        return Err(TokenError::Signature);
    }

    let payload: Map<String, Value> = serde_json::from_slice(&payload_bytes)
        .map_err(|e| TokenError::malformed(format!("payload is not a JSON object: {e}")))?;

    Ok(Claims::from(payload))
}

fn decode_segment(segment: &str, what: &str) -> Result<Vec<u8>, TokenError> {
    if segment.is_empty() {
        return Err(TokenError::malformed(format!("{what} segment is empty")));
    }
    Base64UrlUnpadded::decode_vec(segment)
        .map_err(|_| TokenError::malformed(format!("{what} segment is not base64url")))
}

/// Compare a MAC against a candidate without revealing, through timing,
/// whether the candidate had the wrong length or the wrong bytes.
fn constant_time_eq(expected: &[u8], candidate: &[u8]) -> bool {
    let mut padded = vec![0u8; expected.len()];
    let n = candidate.len().min(expected.len());
    padded[..n].copy_from_slice(&candidate[..n]);

    let same_len = (candidate.len() as u64).ct_eq(&(expected.len() as u64));
    (padded.ct_eq(expected) & same_len).into()
}
