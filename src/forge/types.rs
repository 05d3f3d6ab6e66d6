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

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::BuilderError;

/// The user owning the bearer token, as reported by the identity provider.
#[derive(Builder, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(into))]
pub struct ForgeUser {
    /// The provider-side identifier of the user.
    pub id: u64,
    /// The login name. Becomes the Kubernetes username and uid.
    pub username: String,
}

/// One node of the provider's group tree.
#[derive(Builder, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(into))]
pub struct ForgeGroup {
    /// The provider-side identifier of the group.
    pub id: u64,
    /// The short name of the group, without any parent prefix.
    pub path: String,
    /// The slash-delimited hierarchical path of the group.
    pub full_path: String,
}

/// A project nested under a group.
#[derive(Builder, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(into))]
pub struct ForgeProject {
    /// The provider-side identifier of the project.
    pub id: u64,
    /// The slash-delimited path of the project including its group namespace.
    pub path_with_namespace: String,
}

/// Parameters for listing the groups visible to the token.
#[derive(Builder, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct GroupListParameters {
    /// Substring search term forwarded to the provider. The provider's search
    /// is a relevance filter, not an exact match; callers must post-filter.
    #[builder(default)]
    pub search: Option<String>,
}
