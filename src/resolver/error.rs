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

use thiserror::Error;

use crate::forge::error::ForgeProviderError;

/// Group resolution failure.
///
/// Every variant surfaces at the webhook boundary as an unauthenticated
/// review; the distinction only matters for the operational log.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// Group filtering was enforced and the user matched nothing.
    #[error("user '{0}' does not belong to any matching group")]
    NoMatchingGroup(String),

    /// The user is not a direct member of the configured root group.
    #[error("user '{username}' is not a member of the root group '{root_group}'")]
    NotRootGroupMember { username: String, root_group: String },

    /// A provider query failed. Never a statement about the user's groups.
    #[error(transparent)]
    Provider {
        #[from]
        source: ForgeProviderError,
    },
}

/// Policy construction failure, fatal at startup.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("invalid group filter pattern: {source}")]
    GroupPattern { source: regex::Error },

    #[error("invalid project filter pattern: {source}")]
    ProjectPattern { source: regex::Error },
}
