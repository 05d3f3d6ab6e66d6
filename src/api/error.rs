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
//! # Webhook API error.
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::api::types::TokenReview;
use crate::forge::error::ForgeProviderError;
use crate::resolver::error::ResolutionError;

/// Webhook API operation errors.
#[derive(Debug, Error)]
pub enum WebhookApiError {
    /// Malformed request body. Not a statement about the user.
    #[error(transparent)]
    JsonExtractorRejection(#[from] JsonRejection),

    /// Request validation error.
    #[error("request validation failed: {source}")]
    Validator {
        /// The source of the error.
        #[from]
        source: validator::ValidationErrors,
    },

    /// The provider rejected the token or could not resolve its owner.
    #[error("invalid token: {source}")]
    InvalidToken { source: ForgeProviderError },

    /// Group resolution refused the user or a provider query failed.
    #[error(transparent)]
    Resolution {
        #[from]
        source: ResolutionError,
    },
}

impl WebhookApiError {
    pub fn invalid_token(source: ForgeProviderError) -> Self {
        Self::InvalidToken { source }
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        // Whatever went wrong, the caller only learns that authentication was
        // refused. The detail would disclose group structure to an
        // unauthenticated caller and stays in the log.
        error!("authentication refused: {}", self);

        (
            StatusCode::BAD_REQUEST,
            Json(TokenReview::unauthenticated()),
        )
            .into_response()
    }
}
