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

use mockall_double::double;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::error::ServiceError;
#[double]
use crate::forge::ForgeProvider;
use crate::resolver::Policy;

/// Shared per-process state handed to the request handlers.
///
/// Everything in here is immutable after startup; request handling itself is
/// stateless.
pub struct Service {
    /// Process configuration.
    pub config: Config,
    /// Group resolution policy derived from the configuration.
    pub policy: Policy,
    /// Identity provider client.
    pub forge: ForgeProvider,
}

pub type ServiceState = Arc<Service>;

impl Service {
    pub fn new(config: Config, forge: ForgeProvider) -> Result<Self, ServiceError> {
        let policy = Policy::from_config(&config)?;
        Ok(Self {
            config,
            policy,
            forge,
        })
    }

    pub async fn terminate(&self) -> Result<(), ServiceError> {
        info!("Terminating the authentication webhook");
        Ok(())
    }
}
