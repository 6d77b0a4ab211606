// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! tokengate - Stateless Bearer Token Authentication with Signed CSRF Challenges
//!
//! Requests carry an HMAC-signed compact token in `Authorization: Bearer`.
//! A single-pass axum middleware verifies it, resolves the principal, and
//! marks the request authenticated. Mutating requests additionally carry a
//! short-lived signed CSRF challenge bound to the session.
//!
//! ## Modules
//!
//! - `token` - Key derivation, token codec, validation and issuance
//! - `auth` - Auth request filter, principals and extractors
//! - `csrf` - CSRF challenge repository, double-submit filter and validator
//! - `api` - HTTP API handlers and the request pipeline (Axum)
//! - `config` - Environment configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod csrf;
pub mod error;
pub mod logging;
pub mod state;
pub mod token;
