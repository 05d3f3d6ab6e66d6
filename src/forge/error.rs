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

#[derive(Debug, Error)]
pub enum ForgeProviderError {
    /// The provider rejected the token (401/403). This is the only variant
    /// that makes a statement about the credential itself.
    #[error("identity provider rejected the token")]
    Unauthorized,

    /// The provider answered with a non-success status.
    #[error("identity provider returned {status} for {endpoint}")]
    Api { status: u16, endpoint: String },

    /// Transport level failure.
    #[error(transparent)]
    Http {
        #[from]
        source: reqwest::Error,
    },

    /// The configured API endpoint cannot carry additional path segments.
    #[error("api endpoint URL cannot be extended with path segments")]
    EndpointNotABase,
}
