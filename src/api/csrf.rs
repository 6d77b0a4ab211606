// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CSRF challenge endpoint.

use axum::{Extension, Json};

use crate::csrf::CsrfChallenge;

/// Return the challenge the CSRF filter just stored in the session.
///
/// Clients echo `token` in the `header_name` header (or the `parameter_name`
/// form field) on their next mutating request, within 30 seconds.
#[utoipa::path(
    get,
    path = "/csrf",
    tag = "CSRF",
    responses(
        (status = 200, description = "Fresh CSRF challenge", body = CsrfChallenge)
    )
)]
pub async fn get_challenge(Extension(challenge): Extension<CsrfChallenge>) -> Json<CsrfChallenge> {
    Json(challenge)
}
