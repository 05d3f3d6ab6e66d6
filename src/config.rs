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

use config::{Environment, File, FileFormat};
use eyre::{Report, WrapErr};
use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

/// Process configuration.
///
/// Parsed once at startup from an optional INI configuration file with the
/// environment variables (`API_ENDPOINT`, `GROUP_FILTER_PATTERN`,
/// `PROJECT_FILTER_PATTERN`, `ROOT_GROUP`, `LISTEN_PORT`) layered on top, and
/// passed to the service by value. Nothing re-reads the environment after
/// startup.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Base URL of the identity provider REST API. Required; startup fails
    /// when it is missing or not a valid URL.
    pub api_endpoint: Url,

    /// Regular expression selecting groups by their full path. Setting it
    /// selects the regex-filtered resolution policy.
    #[serde(default)]
    pub group_filter_pattern: Option<String>,

    /// Regular expression selecting projects of the matched groups by their
    /// namespace-qualified path. Only meaningful together with
    /// `group_filter_pattern`.
    #[serde(default)]
    pub project_filter_pattern: Option<String>,

    /// Name of the root group whose direct members are admitted with the
    /// subgroup hierarchy as their group claims. Selects the root-group
    /// hierarchy policy when no group filter pattern is set.
    #[serde(default)]
    pub root_group: Option<String>,

    /// Port the webhook listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
}

fn default_listen_port() -> u16 {
    3000
}

impl Config {
    pub fn new(path: Option<PathBuf>) -> Result<Self, Report> {
        let mut builder = config::Config::builder();

        if let Some(path) = path
            && path.is_file()
        {
            builder = builder.add_source(File::from(path).format(FileFormat::Ini));
        }

        // Environment variables take precedence over the file.
        builder = builder.add_source(Environment::default());

        builder.try_into()
    }
}

impl TryFrom<config::ConfigBuilder<config::builder::DefaultState>> for Config {
    type Error = Report;

    fn try_from(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, Self::Error> {
        builder
            .set_default("listen_port", 3000)?
            .build()
            .wrap_err("Failed to read configuration")?
            .try_deserialize()
            .wrap_err("Failed to parse configuration")
    }
}

#[cfg(test)]
impl Default for Config {
    fn default() -> Self {
        Self {
            api_endpoint: Url::parse("http://localhost").expect("static url"),
            group_filter_pattern: None,
            project_filter_pattern: None,
            root_group: None,
            listen_port: default_listen_port(),
        }
    }
}
