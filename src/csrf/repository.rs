// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed CSRF challenges stored in the session.
//!
//! A challenge is a compact token signed with the CSRF key (never the auth
//! key) carrying a random `jti`, `iat`/`nbf` and an `exp` 30 seconds later.
//! Generating a challenge does not persist it; callers decide whether to
//! [`save`](CsrfTokenRepository::save) it.

use std::sync::Arc;

use axum::http::Method;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{is_safe_method, CHALLENGE_TTL_SECS, DEFAULT_HEADER_NAME, DEFAULT_PARAMETER_NAME};
use crate::token::{codec, Claims, SigningKey, TokenError};

/// Session attribute holding the current challenge.
pub const SESSION_ATTRIBUTE: &str = "tokengate.csrf.challenge";

/// A CSRF challenge as handed to clients and stored in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CsrfChallenge {
    /// Request header that may carry the token
    pub header_name: String,
    /// Form field that may carry the token
    pub parameter_name: String,
    /// Signed challenge token
    pub token: String,
}

/// Generates, stores and loads CSRF challenges.
#[derive(Debug, Clone)]
pub struct CsrfTokenRepository {
    key: Arc<SigningKey>,
    header_name: String,
    parameter_name: String,
    ttl: Duration,
}

impl CsrfTokenRepository {
    pub fn new(key: Arc<SigningKey>) -> Self {
        Self {
            key,
            header_name: DEFAULT_HEADER_NAME.to_string(),
            parameter_name: DEFAULT_PARAMETER_NAME.to_string(),
            ttl: Duration::seconds(CHALLENGE_TTL_SECS),
        }
    }

    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    pub fn with_parameter_name(mut self, name: impl Into<String>) -> Self {
        self.parameter_name = name.into();
        self
    }

    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }

    pub fn key(&self) -> &Arc<SigningKey> {
        &self.key
    }

    pub fn generate(&self) -> Result<CsrfChallenge, TokenError> {
        self.generate_at(Utc::now())
    }

    /// Build a challenge issued at `now`.
    pub fn generate_at(&self, now: DateTime<Utc>) -> Result<CsrfChallenge, TokenError> {
        let claims = Claims::new()
            .with_id(Uuid::new_v4().simple().to_string())
            .with_issued_at(now.timestamp())
            .with_not_before(now.timestamp())
            .with_expiration((now + self.ttl).timestamp());

        Ok(CsrfChallenge {
            header_name: self.header_name.clone(),
            parameter_name: self.parameter_name.clone(),
            token: codec::encode(&claims, &self.key)?,
        })
    }

    /// Store `challenge` in the session, or clear the stored one on `None`.
    ///
    /// Storing creates the session if needed; clearing never does.
    pub async fn save(
        &self,
        challenge: Option<&CsrfChallenge>,
        session: &Session,
    ) -> Result<(), tower_sessions::session::Error> {
        match challenge {
            Some(challenge) => session.insert(SESSION_ATTRIBUTE, challenge).await,
            None => {
                if session.id().is_none() {
                    return Ok(());
                }
                session
                    .remove::<CsrfChallenge>(SESSION_ATTRIBUTE)
                    .await
                    .map(|_| ())
            }
        }
    }

    /// Load the stored challenge.
    ///
    /// Returns `None` when no session exists yet or when `method` is safe.
    pub async fn load(
        &self,
        method: &Method,
        session: &Session,
    ) -> Result<Option<CsrfChallenge>, tower_sessions::session::Error> {
        if session.id().is_none() || is_safe_method(method) {
            return Ok(None);
        }
        session.get::<CsrfChallenge>(SESSION_ATTRIBUTE).await
    }
}
