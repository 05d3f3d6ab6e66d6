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

use async_trait::async_trait;
use mockall::mock;
use secrecy::SecretString;

use crate::config::Config;
use crate::forge::ForgeApi;
use crate::forge::error::ForgeProviderError;
use crate::forge::types::{ForgeGroup, ForgeProject, ForgeUser, GroupListParameters};

mock! {
    pub ForgeProvider {
        pub fn new(config: &Config) -> Result<Self, ForgeProviderError>;
    }

    #[async_trait]
    impl ForgeApi for ForgeProvider {
        async fn get_current_user(
            &self,
            token: &SecretString,
        ) -> Result<ForgeUser, ForgeProviderError>;

        async fn list_groups(
            &self,
            token: &SecretString,
            params: &GroupListParameters,
        ) -> Result<Vec<ForgeGroup>, ForgeProviderError>;

        async fn list_subgroups(
            &self,
            token: &SecretString,
            group_id: u64,
        ) -> Result<Vec<ForgeGroup>, ForgeProviderError>;

        async fn list_group_projects(
            &self,
            token: &SecretString,
            group_id: u64,
        ) -> Result<Vec<ForgeProject>, ForgeProviderError>;
    }
}
