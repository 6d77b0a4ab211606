// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::{
    auth::{AuthFilter, InMemoryPrincipalResolver},
    config::{ConfigError, SecurityConfig},
    csrf::{CsrfExemptions, CsrfProtection, CsrfTokenRepository, CsrfValidator},
    token::{Algorithm, SigningKey, TokenIssuer, TokenValidator},
};

/// Shared handles for handlers and middleware. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<TokenIssuer>,
    pub validator: TokenValidator,
    pub principals: InMemoryPrincipalResolver,
    pub auth: AuthFilter,
    pub csrf: CsrfProtection,
    pub csrf_validator: CsrfValidator,
    /// Whether the session cookie carries the `Secure` attribute
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(
        auth_key: Arc<SigningKey>,
        csrf_key: Arc<SigningKey>,
        principals: InMemoryPrincipalResolver,
        exemptions: CsrfExemptions,
    ) -> Self {
        let validator = TokenValidator::new(auth_key.clone());
        let exemptions = Arc::new(exemptions);
        Self {
            issuer: Arc::new(TokenIssuer::new(auth_key)),
            auth: AuthFilter::new(validator.clone(), Arc::new(principals.clone())),
            validator,
            principals,
            csrf: CsrfProtection::new(
                Arc::new(CsrfTokenRepository::new(csrf_key.clone())),
                exemptions.clone(),
            ),
            csrf_validator: CsrfValidator::new(csrf_key, exemptions),
            secure_cookies: true,
        }
    }

    /// Build from configuration. The directory starts empty; seeding is the
    /// caller's job.
    pub fn from_config(config: &SecurityConfig) -> Result<Self, ConfigError> {
        let auth_key = config.auth_key()?;
        let mut issuer = TokenIssuer::new(auth_key.clone()).with_validity(config.jwt_validity);

        let mut state = Self::new(
            auth_key,
            config.csrf_key()?,
            InMemoryPrincipalResolver::new(),
            CsrfExemptions::new(config.csrf_exempt_paths.iter().map(String::as_str)),
        );

        // Tokens must name the issuer this process stamps.
        if let Some(iss) = &config.jwt_issuer {
            issuer = issuer.with_issuer(iss.clone());
            state.validator = state.validator.require_issuer(iss.clone());
            state.auth = AuthFilter::new(
                state.validator.clone(),
                Arc::new(state.principals.clone()),
            );
        }

        state.issuer = Arc::new(issuer);
        state.secure_cookies = config.secure_cookies;
        Ok(state)
    }
}

impl Default for AppState {
    /// Random keys and an empty directory.
    fn default() -> Self {
        Self::new(
            Arc::new(SigningKey::random(Algorithm::HS256)),
            Arc::new(SigningKey::random(Algorithm::HS256)),
            InMemoryPrincipalResolver::new(),
            CsrfExemptions::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Principal;
    use crate::token::{codec, Claims, TokenError};
    use axum::http::{header::AUTHORIZATION, Extensions, HeaderMap};
    use chrono::{Duration, Utc};
    use std::collections::HashMap;

    #[test]
    fn from_config_applies_token_settings() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("JWT_SECRET", "state-secret"),
            ("JWT_VALIDITY_SECS", "120"),
            ("CSRF_EXEMPT_PATHS", "/b,/a"),
            ("SESSION_SECURE_COOKIE", "false"),
        ]);
        let config = SecurityConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        let state = AppState::from_config(&config).unwrap();

        assert_eq!(state.issuer.validity(), Duration::seconds(120));
        assert_eq!(state.csrf.exemptions().paths(), ["/a", "/b"]);
        assert!(!state.secure_cookies);
    }

    #[tokio::test]
    async fn configured_issuer_is_required_on_incoming_tokens() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("JWT_SECRET", "state-secret"),
            ("JWT_ISSUER", "tokengate"),
        ]);
        let config = SecurityConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        let state = AppState::from_config(&config).unwrap();
        state.principals.insert(Principal::new("alice", ["ROLE_USER"])).await;

        let own = state.issuer.issue(&Principal::new("alice", ["ROLE_USER"])).unwrap();
        assert!(state.validator.validate(&own, Some("alice")).is_ok());

        let foreign = codec::encode(
            &Claims::new()
                .with_issuer("evil")
                .with_subject("alice")
                .with_expiration(Utc::now().timestamp() + 600),
            state.validator.key(),
        )
        .unwrap();
        assert_eq!(
            state.validator.validate(&foreign, Some("alice")),
            Err(TokenError::IssuerMismatch)
        );

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {foreign}").parse().unwrap());
        assert!(state.auth.authenticate(&headers, &Extensions::new()).await.is_none());

        headers.insert(AUTHORIZATION, format!("Bearer {own}").parse().unwrap());
        assert!(state.auth.authenticate(&headers, &Extensions::new()).await.is_some());
    }

    #[tokio::test]
    async fn issued_tokens_validate_with_the_same_state() {
        let state = AppState::default();
        let token = state
            .issuer
            .issue(&Principal::new("alice", ["ROLE_USER"]))
            .unwrap();
        let validated = state.validator.validate(&token, Some("alice")).unwrap();
        assert_eq!(validated.subject.as_deref(), Some("alice"));
    }
}
