// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authority names.
//!
//! Authorities are plain strings owned by the principal store. Roles use the
//! `ROLE_` prefix so they can live alongside finer-grained authorities.

/// Prefix marking an authority as a role.
pub const ROLE_PREFIX: &str = "ROLE_";

/// Normal authenticated user
pub const ROLE_USER: &str = "ROLE_USER";

/// Full administrative access
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// Turn a role name into its authority form.
///
/// `"admin"`, `"ADMIN"` and `"ROLE_ADMIN"` all become `"ROLE_ADMIN"`.
pub fn role_authority(role: &str) -> String {
    let role = role.trim();
    let upper = role.to_ascii_uppercase();
    if upper.starts_with(ROLE_PREFIX) {
        upper
    } else {
        format!("{ROLE_PREFIX}{upper}")
    }
}
