// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Principals and the resolver contract.
//!
//! The principal store is owned by the host application. The auth filter
//! only needs [`PrincipalResolver::load_by_username`]; the in-memory
//! directory here backs the binary and the tests.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::token::TokenError;

/// Identity record supplied by the principal store. Read-only to this crate.
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    /// Opaque hash, only meaningful to an external authenticator
    pub password_hash: String,
    pub authorities: Vec<String>,
    pub account_non_expired: bool,
    pub account_non_locked: bool,
    pub credentials_non_expired: bool,
    pub enabled: bool,
}

impl Principal {
    /// An enabled principal with no password hash.
    pub fn new<I, A>(username: impl Into<String>, authorities: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            username: username.into(),
            password_hash: String::new(),
            authorities: authorities.into_iter().map(Into::into).collect(),
            account_non_expired: true,
            account_non_locked: true,
            credentials_non_expired: true,
            enabled: true,
        }
    }

    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password_hash = hash.into();
        self
    }

    /// `false` when any of the account flags forbids authentication.
    pub fn can_authenticate(&self) -> bool {
        self.enabled
            && self.account_non_expired
            && self.account_non_locked
            && self.credentials_non_expired
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .field("authorities", &self.authorities)
            .field("account_non_expired", &self.account_non_expired)
            .field("account_non_locked", &self.account_non_locked)
            .field("credentials_non_expired", &self.credentials_non_expired)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Looks up principals by username.
///
/// Implementations may block on an external store; the auth filter holds
/// no locks across the call.
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    /// Fails with [`TokenError::PrincipalNotFound`] on a miss.
    async fn load_by_username(&self, username: &str) -> Result<Principal, TokenError>;
}

/// Principal directory held in memory.
#[derive(Clone, Default)]
pub struct InMemoryPrincipalResolver {
    principals: Arc<RwLock<HashMap<String, Principal>>>,
}

impl InMemoryPrincipalResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory pre-populated with `principals`.
    pub fn with_principals(principals: impl IntoIterator<Item = Principal>) -> Self {
        let map = principals
            .into_iter()
            .map(|p| (p.username.clone(), p))
            .collect();
        Self {
            principals: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn insert(&self, principal: Principal) {
        self.principals
            .write()
            .await
            .insert(principal.username.clone(), principal);
    }

    pub async fn remove(&self, username: &str) -> Option<Principal> {
        self.principals.write().await.remove(username)
    }

    pub async fn len(&self) -> usize {
        self.principals.read().await.len()
    }

    /// All principals, ordered by username.
    pub async fn list(&self) -> Vec<Principal> {
        let mut principals: Vec<Principal> =
            self.principals.read().await.values().cloned().collect();
        principals.sort_by(|a, b| a.username.cmp(&b.username));
        principals
    }
}

#[async_trait]
impl PrincipalResolver for InMemoryPrincipalResolver {
    async fn load_by_username(&self, username: &str) -> Result<Principal, TokenError> {
        self.principals
            .read()
            .await
            .get(username)
            .cloned()
            .ok_or_else(|| TokenError::PrincipalNotFound(username.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolver_returns_inserted_principal() {
        let resolver = InMemoryPrincipalResolver::new();
        resolver.insert(Principal::new("alice", ["ROLE_USER"])).await;

        let found = resolver.load_by_username("alice").await.unwrap();
        assert_eq!(found.username, "alice");
        assert!(found.has_authority("ROLE_USER"));
        assert_eq!(resolver.len().await, 1);
    }

    #[tokio::test]
    async fn list_is_sorted_by_username() {
        let resolver = InMemoryPrincipalResolver::with_principals([
            Principal::new("carol", ["ROLE_USER"]),
            Principal::new("alice", ["ROLE_ADMIN"]),
        ]);
        let names: Vec<String> = resolver.list().await.into_iter().map(|p| p.username).collect();
        assert_eq!(names, ["alice", "carol"]);
    }

    #[tokio::test]
    async fn resolver_miss_is_not_found() {
        let resolver = InMemoryPrincipalResolver::with_principals([Principal::new("alice", ["ROLE_USER"])]);
        let err = resolver.load_by_username("bob").await.unwrap_err();
        assert_eq!(err, TokenError::PrincipalNotFound("bob".to_string()));
    }

    #[tokio::test]
    async fn removed_principal_is_gone() {
        let resolver = InMemoryPrincipalResolver::with_principals([Principal::new("alice", ["ROLE_USER"])]);
        assert!(resolver.remove("alice").await.is_some());
        assert!(resolver.load_by_username("alice").await.is_err());
    }

    #[test]
    fn any_denying_flag_blocks_authentication() {
        let ok = Principal::new("alice", ["ROLE_USER"]);
        assert!(ok.can_authenticate());

        let mut locked = ok.clone();
        locked.account_non_locked = false;
        assert!(!locked.can_authenticate());

        let mut disabled = ok.clone();
        disabled.enabled = false;
        assert!(!disabled.can_authenticate());

        let mut stale = ok;
        stale.credentials_non_expired = false;
        assert!(!stale.can_authenticate());
    }

    #[test]
    fn debug_output_redacts_password_hash() {
        let p = Principal::new("alice", ["ROLE_USER"]).with_password_hash("$2a$10$secret");
        assert!(!format!("{p:?}").contains("secret"));
    }
}
