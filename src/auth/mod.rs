// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless bearer-token authentication for the request pipeline.
//!
//! ## Auth Flow
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. The auth filter (`middleware.rs`):
//!    - Verifies the token signature and expiry
//!    - Resolves the `sub` claim through a [`PrincipalResolver`]
//!    - Checks the token subject against the live principal record
//!    - Attaches an [`AuthenticatedPrincipal`] to the request
//! 3. Route extractors (`extractor.rs`) enforce authentication and
//!    authorities
//!
//! ## Security
//!
//! - No server-side state: every request is verified from the token alone
//! - The filter never fails a request; unauthenticated requests are
//!   rejected (401) only by routes that require a principal
//! - Tokens cannot be revoked before they expire

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod principal;
pub mod roles;

pub use claims::{AuthenticatedPrincipal, PrincipalView};
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth, OptionalAuth};
pub use middleware::{auth_filter, AuthFilter};
pub use principal::{InMemoryPrincipalResolver, Principal, PrincipalResolver};
