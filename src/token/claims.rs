// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Claim sets carried inside signed tokens.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::TokenError;

pub const ISSUER: &str = "iss";
pub const SUBJECT: &str = "sub";
pub const AUDIENCE: &str = "aud";
pub const EXPIRATION: &str = "exp";
pub const NOT_BEFORE: &str = "nbf";
pub const ISSUED_AT: &str = "iat";
pub const TOKEN_ID: &str = "jti";

/// Reserved claim names, in the order they are serialized.
pub const RESERVED: [&str; 7] = [
    ISSUER, SUBJECT, AUDIENCE, EXPIRATION, NOT_BEFORE, ISSUED_AT, TOKEN_ID,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClaimType {
    String,
    Timestamp,
}

fn reserved_type(name: &str) -> Option<ClaimType> {
    match name {
        ISSUER | SUBJECT | AUDIENCE | TOKEN_ID => Some(ClaimType::String),
        EXPIRATION | NOT_BEFORE | ISSUED_AT => Some(ClaimType::Timestamp),
        _ => None,
    }
}

fn type_matches(expected: ClaimType, value: &Value) -> bool {
    match expected {
        ClaimType::String => value.is_string(),
        // Any JSON integer is an epoch-seconds timestamp; floats are not.
        ClaimType::Timestamp => value.is_i64() || value.is_u64(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Ordered mapping from claim name to value.
///
/// Insertion order is preserved. Reserved claims are type-checked when the
/// token is built, never when it is parsed: a token from elsewhere with an
/// odd `aud` still decodes, and the validator decides what it needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert any claim, reserved or custom.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_issuer(self, issuer: impl Into<String>) -> Self {
        self.with(ISSUER, issuer.into())
    }

    pub fn with_subject(self, subject: impl Into<String>) -> Self {
        self.with(SUBJECT, subject.into())
    }

    pub fn with_audience(self, audience: impl Into<String>) -> Self {
        self.with(AUDIENCE, audience.into())
    }

    pub fn with_expiration(self, epoch_secs: i64) -> Self {
        self.with(EXPIRATION, epoch_secs)
    }

    pub fn with_not_before(self, epoch_secs: i64) -> Self {
        self.with(NOT_BEFORE, epoch_secs)
    }

    pub fn with_issued_at(self, epoch_secs: i64) -> Self {
        self.with(ISSUED_AT, epoch_secs)
    }

    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with(TOKEN_ID, id.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn issuer(&self) -> Option<&str> {
        self.get(ISSUER).and_then(Value::as_str)
    }

    pub fn subject(&self) -> Option<&str> {
        self.get(SUBJECT).and_then(Value::as_str)
    }

    pub fn audience(&self) -> Option<&str> {
        self.get(AUDIENCE).and_then(Value::as_str)
    }

    pub fn expiration(&self) -> Option<i64> {
        self.get(EXPIRATION).and_then(Value::as_i64)
    }

    pub fn not_before(&self) -> Option<i64> {
        self.get(NOT_BEFORE).and_then(Value::as_i64)
    }

    pub fn issued_at(&self) -> Option<i64> {
        self.get(ISSUED_AT).and_then(Value::as_i64)
    }

    pub fn id(&self) -> Option<&str> {
        self.get(TOKEN_ID).and_then(Value::as_str)
    }

    /// Claims in wire order: reserved claims first in [`RESERVED`] order,
    /// then custom claims in insertion order.
    ///
    /// Fails with [`TokenError::Configuration`] when a reserved claim holds
    /// a value of the wrong type.
    pub(crate) fn to_wire_map(&self) -> Result<Map<String, Value>, TokenError> {
        let mut ordered = Map::with_capacity(self.0.len());

        for name in RESERVED {
            if let Some(value) = self.0.get(name) {
                if let Some(expected) = reserved_type(name) {
                    if !type_matches(expected, value) {
                        return Err(TokenError::Configuration(format!(
                            "expected {} for claim '{name}', but got {} value {value}",
                            match expected {
                                ClaimType::String => "string",
                                ClaimType::Timestamp => "integer timestamp",
                            },
                            type_name(value),
                        )));
                    }
                }
                ordered.insert(name.to_string(), value.clone());
            }
        }

        for (name, value) in &self.0 {
            if reserved_type(name).is_none() {
                ordered.insert(name.clone(), value.clone());
            }
        }

        Ok(ordered)
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
