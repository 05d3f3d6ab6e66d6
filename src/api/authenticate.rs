// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

//! # Webhook API: authenticate
use axum::{
    Json, debug_handler,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use validator::Validate;

use crate::api::WebhookApiError;
use crate::api::types::{TokenReview, TokenReviewRequest};
use crate::forge::ForgeApi;
use crate::resolver;
use crate::service::ServiceState;

/// Authenticate the bearer token of a Kubernetes TokenReview.
///
/// This operation takes the token carried in the review spec, resolves it to
/// an identity provider user and answers with the review status carrying the
/// username and the group claims produced by the configured resolution
/// policy. Any failure is answered with status 400 and an unauthenticated
/// review without further detail.
#[utoipa::path(
    post,
    path = "/authenticate",
    operation_id = "/authenticate:post",
    request_body = TokenReviewRequest,
    responses(
        (
            status = OK,
            description = "Token review admitting the user with the resolved group claims",
            body = TokenReview,
        ),
        (
            status = BAD_REQUEST,
            description = "Token review refusing authentication",
            body = TokenReview,
        ),
    ),
    tag = "authentication"
)]
#[tracing::instrument(name = "api::authenticate", level = "debug", skip(state, payload))]
#[debug_handler]
pub async fn post(
    State(state): State<ServiceState>,
    payload: Result<Json<TokenReviewRequest>, JsonRejection>,
) -> Result<impl IntoResponse, WebhookApiError> {
    // A malformed body is rejected before the provider is ever contacted.
    let Json(req) = payload?;
    req.validate()?;

    let token = req.spec.token;
    let user = state
        .forge
        .get_current_user(&token)
        .await
        .map_err(WebhookApiError::invalid_token)?;

    let groups = resolver::resolve(&state.forge, &token, &user, &state.policy).await?;

    info!(
        "authenticated '{}' with groups {:?}",
        user.username, groups
    );
    Ok((
        StatusCode::OK,
        Json(TokenReview::authenticated(user.username, groups)),
    ))
}
