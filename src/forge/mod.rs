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
//! # Identity provider client.
//!
//! REST client for the project-hosting identity provider. Every operation is
//! performed with the bearer token presented by the current webhook request;
//! the provider decides what that token is allowed to see.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub mod error;
#[cfg(test)]
pub mod mock;
pub mod types;

use crate::config::Config;
pub use error::ForgeProviderError;
#[cfg(test)]
pub use mock::MockForgeProvider;
use types::{ForgeGroup, ForgeProject, ForgeUser, GroupListParameters};

/// Page size requested from the provider's list endpoints.
static PER_PAGE: &str = "100";

/// Pagination header naming the next page, empty on the last one.
static NEXT_PAGE_HEADER: &str = "x-next-page";

#[async_trait]
pub trait ForgeApi: Send + Sync {
    /// Resolve the owner of the token.
    async fn get_current_user(
        &self,
        token: &SecretString,
    ) -> Result<ForgeUser, ForgeProviderError>;

    /// List the groups visible to the token.
    async fn list_groups(
        &self,
        token: &SecretString,
        params: &GroupListParameters,
    ) -> Result<Vec<ForgeGroup>, ForgeProviderError>;

    /// List the direct subgroups of the given group.
    async fn list_subgroups(
        &self,
        token: &SecretString,
        group_id: u64,
    ) -> Result<Vec<ForgeGroup>, ForgeProviderError>;

    /// List the projects of the given group.
    async fn list_group_projects(
        &self,
        token: &SecretString,
        group_id: u64,
    ) -> Result<Vec<ForgeProject>, ForgeProviderError>;
}

/// Identity provider client.
#[derive(Clone, Debug)]
pub struct ForgeProvider {
    base_url: Url,
    http: Client,
}

impl ForgeProvider {
    pub fn new(config: &Config) -> Result<Self, ForgeProviderError> {
        let http = Client::builder()
            .gzip(true)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;
        Ok(Self {
            base_url: config.api_endpoint.clone(),
            http,
        })
    }

    /// Extend the configured base URL with additional path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ForgeProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ForgeProviderError::EndpointNotABase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn check_status(response: Response, url: &Url) -> Result<Response, ForgeProviderError> {
        match response.status() {
            StatusCode::OK => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ForgeProviderError::Unauthorized)
            }
            status => {
                debug!("identity provider returned {:?}", response);
                Err(ForgeProviderError::Api {
                    status: status.as_u16(),
                    endpoint: url.path().to_string(),
                })
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &SecretString,
        url: Url,
    ) -> Result<T, ForgeProviderError> {
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(token.expose_secret())
            .send()
            .await?;
        Ok(Self::check_status(response, &url)?.json().await?)
    }

    /// Fetch every page of a list endpoint, following the provider's
    /// next-page header until it runs out.
    async fn get_paged<T: DeserializeOwned>(
        &self,
        token: &SecretString,
        url: Url,
    ) -> Result<Vec<T>, ForgeProviderError> {
        let mut results: Vec<T> = Vec::new();
        let mut page = String::from("1");
        loop {
            let mut page_url = url.clone();
            page_url
                .query_pairs_mut()
                .append_pair("per_page", PER_PAGE)
                .append_pair("page", &page);

            let response = self
                .http
                .get(page_url.clone())
                .bearer_auth(token.expose_secret())
                .send()
                .await?;
            let response = Self::check_status(response, &page_url)?;

            let next_page = response
                .headers()
                .get(NEXT_PAGE_HEADER)
                .and_then(|value| value.to_str().ok())
                .filter(|value| !value.is_empty())
                .map(ToString::to_string);

            let mut batch: Vec<T> = response.json().await?;
            results.append(&mut batch);

            match next_page {
                Some(next) => page = next,
                None => break,
            }
        }
        Ok(results)
    }
}

#[async_trait]
impl ForgeApi for ForgeProvider {
    #[tracing::instrument(level = "debug", skip(self, token))]
    async fn get_current_user(
        &self,
        token: &SecretString,
    ) -> Result<ForgeUser, ForgeProviderError> {
        self.get_json(token, self.endpoint(&["user"])?).await
    }

    #[tracing::instrument(level = "debug", skip(self, token))]
    async fn list_groups(
        &self,
        token: &SecretString,
        params: &GroupListParameters,
    ) -> Result<Vec<ForgeGroup>, ForgeProviderError> {
        let mut url = self.endpoint(&["groups"])?;
        if let Some(search) = &params.search {
            url.query_pairs_mut().append_pair("search", search);
        }
        self.get_paged(token, url).await
    }

    #[tracing::instrument(level = "debug", skip(self, token))]
    async fn list_subgroups(
        &self,
        token: &SecretString,
        group_id: u64,
    ) -> Result<Vec<ForgeGroup>, ForgeProviderError> {
        let url = self.endpoint(&["groups", &group_id.to_string(), "subgroups"])?;
        self.get_paged(token, url).await
    }

    #[tracing::instrument(level = "debug", skip(self, token))]
    async fn list_group_projects(
        &self,
        token: &SecretString,
        group_id: u64,
    ) -> Result<Vec<ForgeProject>, ForgeProviderError> {
        let url = self.endpoint(&["groups", &group_id.to_string(), "projects"])?;
        self.get_paged(token, url).await
    }
}
