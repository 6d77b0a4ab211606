// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;

use crate::auth::{Auth, PrincipalView};

/// Get the current authenticated principal.
///
/// Returns the username and authorities of the principal the bearer token
/// resolved to.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Principal information", body = PrincipalView),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_user(Auth(principal): Auth) -> Json<PrincipalView> {
    Json(PrincipalView::from(&principal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedPrincipal, Principal};
    use crate::token::{Claims, Validated};

    #[tokio::test]
    async fn returns_authenticated_principal() {
        let principal = AuthenticatedPrincipal::new(
            Principal::new("alice", ["ROLE_USER"]),
            Validated {
                claims: Claims::new().with_subject("alice").with_expiration(1_800_000_000),
                subject: Some("alice".to_string()),
            },
        );

        let Json(view) = get_current_user(Auth(principal)).await;
        assert_eq!(view.username, "alice");
        assert_eq!(view.authorities, ["ROLE_USER"]);
        assert_eq!(view.expires_at, Some(1_800_000_000));
    }
}
