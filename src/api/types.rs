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
//! # TokenReview wire types.
//!
//! The subset of the Kubernetes `TokenReview` object exchanged with the API
//! server over the webhook.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Version of the authentication API group spoken on the wire.
pub static TOKEN_REVIEW_API_VERSION: &str = "authentication.k8s.io/v1beta1";

/// Kind of the webhook protocol object.
pub static TOKEN_REVIEW_KIND: &str = "TokenReview";

/// Inbound token review request.
#[derive(Clone, Debug, Deserialize, ToSchema, Validate)]
pub struct TokenReviewRequest {
    #[validate(nested)]
    pub spec: TokenReviewSpec,
}

/// The request spec carrying the credential under review.
#[derive(Clone, Debug, Deserialize, ToSchema, Validate)]
pub struct TokenReviewSpec {
    /// Bearer token presented to the Kubernetes API server.
    #[schema(value_type = String)]
    #[validate(custom(function = validate_token))]
    pub token: SecretString,
}

fn validate_token(token: &SecretString) -> Result<(), ValidationError> {
    if token.expose_secret().is_empty() {
        return Err(ValidationError::new("empty_token"));
    }
    Ok(())
}

/// Outbound token review response.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenReview {
    pub api_version: String,
    pub kind: String,
    pub status: TokenReviewStatus,
}

/// The authentication decision.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema)]
pub struct TokenReviewStatus {
    pub authenticated: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

/// The identity reported for an authenticated token.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema)]
pub struct UserInfo {
    pub username: String,
    /// Set equal to the username; the provider side has no separate stable
    /// identifier worth exposing to Kubernetes.
    pub uid: String,
    pub groups: Vec<String>,
}

impl TokenReview {
    /// A review admitting the user with the resolved group claims.
    pub fn authenticated(username: String, groups: Vec<String>) -> Self {
        Self {
            api_version: TOKEN_REVIEW_API_VERSION.to_string(),
            kind: TOKEN_REVIEW_KIND.to_string(),
            status: TokenReviewStatus {
                authenticated: true,
                user: Some(UserInfo {
                    uid: username.clone(),
                    username,
                    groups,
                }),
            },
        }
    }

    /// A review refusing authentication. Carries no detail; the reason stays
    /// in the operational log.
    pub fn unauthenticated() -> Self {
        Self {
            api_version: TOKEN_REVIEW_API_VERSION.to_string(),
            kind: TOKEN_REVIEW_KIND.to_string(),
            status: TokenReviewStatus {
                authenticated: false,
                user: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_decodes_spec_token() {
        let req: TokenReviewRequest = serde_json::from_value(json!({
            "apiVersion": "authentication.k8s.io/v1beta1",
            "kind": "TokenReview",
            "spec": {"token": "secret"},
        }))
        .unwrap();
        assert_eq!("secret", req.spec.token.expose_secret());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_request_rejects_empty_token() {
        let req: TokenReviewRequest =
            serde_json::from_value(json!({"spec": {"token": ""}})).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_unauthenticated_review_carries_no_user() {
        let value = serde_json::to_value(TokenReview::unauthenticated()).unwrap();
        assert_eq!(
            json!({
                "apiVersion": "authentication.k8s.io/v1beta1",
                "kind": "TokenReview",
                "status": {"authenticated": false},
            }),
            value
        );
    }

    #[test]
    fn test_authenticated_review_sets_uid_to_username() {
        let review = TokenReview::authenticated("alice".into(), vec!["team-x".into()]);
        let user = review.status.user.unwrap();
        assert_eq!("alice", user.username);
        assert_eq!("alice", user.uid);
        assert_eq!(vec!["team-x".to_string()], user.groups);
    }
}
