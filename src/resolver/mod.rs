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
//! # Group resolution.
//!
//! Maps an authenticated forge user to the ordered list of group paths that
//! becomes the Kubernetes group claims. The mapping is governed by a
//! [`Policy`] selected once at startup; the resolver itself keeps no state
//! and only issues read queries against the provider, sequentially and
//! scoped to the current request.

use regex::Regex;
use secrecy::SecretString;
use std::fmt;
use tracing::warn;

pub mod error;

use crate::config::Config;
use crate::forge::ForgeApi;
use crate::forge::types::{ForgeUser, GroupListParameters};
pub use error::{PolicyError, ResolutionError};

/// Group resolution policy.
///
/// A closed set of variants, fixed for the process lifetime. The historical
/// deployments grew these as successive evolutions of one decision point;
/// they are modeled as one tagged type so precedence between the
/// configuration knobs is decided exactly once, in [`Policy::from_config`].
#[derive(Clone, Debug)]
pub enum Policy {
    /// No filtering. Every group visible to the user is claimed by full
    /// path, in the provider's listing order. An empty list is allowed.
    Unrestricted,

    /// Claim only groups whose full path matches `group_pattern`. When
    /// `project_pattern` is set, the matching groups' projects matching it
    /// are claimed as well. A user matching nothing is refused.
    RegexFiltered {
        group_pattern: Regex,
        project_pattern: Option<Regex>,
    },

    /// Require direct membership in the group whose short path equals
    /// `root_group`; claim that name followed by the full paths of all its
    /// subgroups.
    RootGroupHierarchy { root_group: String },
}

impl Policy {
    /// Select the policy from the process configuration.
    ///
    /// The group filter pattern takes precedence over the root group when
    /// both are set; the root group is then ignored with a warning. A
    /// project filter pattern without a group filter pattern has nothing to
    /// scope to and is likewise ignored.
    pub fn from_config(config: &Config) -> Result<Self, PolicyError> {
        match (&config.group_filter_pattern, &config.root_group) {
            (Some(group), root) => {
                if root.is_some() {
                    warn!("ROOT_GROUP is ignored because GROUP_FILTER_PATTERN is set");
                }
                let group_pattern = Regex::new(group)
                    .map_err(|source| PolicyError::GroupPattern { source })?;
                let project_pattern = config
                    .project_filter_pattern
                    .as_deref()
                    .map(Regex::new)
                    .transpose()
                    .map_err(|source| PolicyError::ProjectPattern { source })?;
                Ok(Self::RegexFiltered {
                    group_pattern,
                    project_pattern,
                })
            }
            (None, Some(root)) => {
                if config.project_filter_pattern.is_some() {
                    warn!("PROJECT_FILTER_PATTERN is ignored without GROUP_FILTER_PATTERN");
                }
                Ok(Self::RootGroupHierarchy {
                    root_group: root.clone(),
                })
            }
            (None, None) => {
                if config.project_filter_pattern.is_some() {
                    warn!("PROJECT_FILTER_PATTERN is ignored without GROUP_FILTER_PATTERN");
                }
                Ok(Self::Unrestricted)
            }
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrestricted => write!(f, "unrestricted"),
            Self::RegexFiltered {
                group_pattern,
                project_pattern,
            } => {
                write!(f, "regex filtered (groups: '{group_pattern}'")?;
                if let Some(project_pattern) = project_pattern {
                    write!(f, ", projects: '{project_pattern}'")?;
                }
                write!(f, ")")
            }
            Self::RootGroupHierarchy { root_group } => {
                write!(f, "root group hierarchy (root: '{root_group}')")
            }
        }
    }
}

/// Resolve the group claims for an authenticated user.
///
/// # Arguments
/// * `forge` - the provider query capability.
/// * `token` - the bearer token of the current request.
/// * `user` - the authenticated owner of the token.
/// * `policy` - the resolution policy fixed at startup.
///
/// # Returns
/// * Success with the ordered group path list.
/// * [`ResolutionError::NoMatchingGroup`] when the regex policy matched
///   nothing for this user.
/// * [`ResolutionError::NotRootGroupMember`] when the hierarchy policy found
///   no direct membership in the root group.
/// * [`ResolutionError::Provider`] when any provider query failed; a failed
///   query never degrades into an empty or partial claim list.
#[tracing::instrument(level = "debug", skip(forge, token, policy))]
pub async fn resolve<F: ForgeApi>(
    forge: &F,
    token: &SecretString,
    user: &ForgeUser,
    policy: &Policy,
) -> Result<Vec<String>, ResolutionError> {
    match policy {
        Policy::Unrestricted => Ok(forge
            .list_groups(token, &GroupListParameters::default())
            .await?
            .into_iter()
            .map(|group| group.full_path)
            .collect()),
        Policy::RegexFiltered {
            group_pattern,
            project_pattern,
        } => {
            // The full visible set is needed so every candidate can be
            // tested against the pattern; no provider-side search.
            let mut paths = Vec::new();
            for group in forge
                .list_groups(token, &GroupListParameters::default())
                .await?
            {
                if !group_pattern.is_match(&group.full_path) {
                    continue;
                }
                let group_id = group.id;
                paths.push(group.full_path);
                if let Some(project_pattern) = project_pattern {
                    for project in forge.list_group_projects(token, group_id).await? {
                        if project_pattern.is_match(&project.path_with_namespace) {
                            paths.push(project.path_with_namespace);
                        }
                    }
                }
            }
            if paths.is_empty() {
                return Err(ResolutionError::NoMatchingGroup(user.username.clone()));
            }
            // Shorter, more general paths first. The sort is stable, so
            // equal lengths keep their discovery order.
            paths.sort_by_key(String::len);
            Ok(paths)
        }
        Policy::RootGroupHierarchy { root_group } => {
            // The provider search is a relevance filter; membership is
            // decided by an exact short path comparison over the candidates.
            let candidates = forge
                .list_groups(
                    token,
                    &GroupListParameters {
                        search: Some(root_group.clone()),
                    },
                )
                .await?;
            let root = candidates
                .iter()
                .find(|group| group.path == *root_group)
                .ok_or_else(|| ResolutionError::NotRootGroupMember {
                    username: user.username.clone(),
                    root_group: root_group.clone(),
                })?;

            let mut paths = vec![root_group.clone()];
            paths.extend(
                forge
                    .list_subgroups(token, root.id)
                    .await?
                    .into_iter()
                    .map(|group| group.full_path),
            );
            Ok(paths)
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;
    use crate::forge::MockForgeProvider;
    use crate::forge::error::ForgeProviderError;
    use crate::forge::types::{ForgeGroup, ForgeProject};

    fn group(id: u64, path: &str, full_path: &str) -> ForgeGroup {
        ForgeGroup {
            id,
            path: path.into(),
            full_path: full_path.into(),
        }
    }

    fn project(id: u64, path_with_namespace: &str) -> ForgeProject {
        ForgeProject {
            id,
            path_with_namespace: path_with_namespace.into(),
        }
    }

    fn user(username: &str) -> ForgeUser {
        ForgeUser {
            id: 1,
            username: username.into(),
        }
    }

    fn regex_policy(group_pattern: &str, project_pattern: Option<&str>) -> Policy {
        Policy::RegexFiltered {
            group_pattern: Regex::new(group_pattern).unwrap(),
            project_pattern: project_pattern.map(|pattern| Regex::new(pattern).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_unrestricted_passes_groups_through() {
        let mut forge = MockForgeProvider::default();
        forge
            .expect_list_groups()
            .withf(|token: &SecretString, params: &GroupListParameters| {
                token.expose_secret() == "secret" && params.search.is_none()
            })
            .returning(|_, _| {
                Ok(vec![
                    group(1, "zeta", "zeta"),
                    group(2, "alpha", "alpha"),
                    group(3, "sub", "alpha/sub"),
                ])
            });

        let groups = resolve(
            &forge,
            &SecretString::from("secret"),
            &user("alice"),
            &Policy::Unrestricted,
        )
        .await
        .unwrap();
        // Provider order is preserved, no sorting.
        assert_eq!(
            vec![
                "zeta".to_string(),
                "alpha".to_string(),
                "alpha/sub".to_string()
            ],
            groups
        );
    }

    #[tokio::test]
    async fn test_unrestricted_allows_empty() {
        let mut forge = MockForgeProvider::default();
        forge.expect_list_groups().returning(|_, _| Ok(vec![]));

        let groups = resolve(
            &forge,
            &SecretString::from("secret"),
            &user("alice"),
            &Policy::Unrestricted,
        )
        .await
        .unwrap();
        assert!(groups.is_empty());
    }

    #[tokio::test]
    async fn test_regex_filtered_keeps_matching_only() {
        let mut forge = MockForgeProvider::default();
        forge
            .expect_list_groups()
            .withf(|_, params: &GroupListParameters| params.search.is_none())
            .returning(|_, _| {
                Ok(vec![
                    group(1, "eng", "eng"),
                    group(2, "sales", "sales"),
                    group(3, "platform", "eng/platform"),
                ])
            });

        let policy = regex_policy("^eng(/.+)?$", None);
        let groups = resolve(&forge, &SecretString::from("secret"), &user("alice"), &policy)
            .await
            .unwrap();
        assert_eq!(vec!["eng".to_string(), "eng/platform".to_string()], groups);
    }

    #[tokio::test]
    async fn test_regex_filtered_no_match_fails() {
        let mut forge = MockForgeProvider::default();
        forge
            .expect_list_groups()
            .returning(|_, _| Ok(vec![group(1, "sales", "sales")]));

        let policy = regex_policy("^eng$", None);
        match resolve(&forge, &SecretString::from("secret"), &user("alice"), &policy).await {
            Err(ResolutionError::NoMatchingGroup(username)) => assert_eq!("alice", username),
            other => panic!("expected NoMatchingGroup, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_regex_filtered_sorts_by_path_length() {
        let mut forge = MockForgeProvider::default();
        forge.expect_list_groups().returning(|_, _| {
            Ok(vec![
                group(1, "c", "a/b/c"),
                group(2, "a", "a"),
                group(3, "b", "a/b"),
            ])
        });

        let policy = regex_policy("^a", None);
        let groups = resolve(&forge, &SecretString::from("secret"), &user("alice"), &policy)
            .await
            .unwrap();
        assert_eq!(
            vec!["a".to_string(), "a/b".to_string(), "a/b/c".to_string()],
            groups
        );
    }

    #[tokio::test]
    async fn test_regex_filtered_sort_is_stable_on_ties() {
        let mut forge = MockForgeProvider::default();
        forge.expect_list_groups().returning(|_, _| {
            Ok(vec![
                group(1, "zz", "zz"),
                group(2, "aa", "aa"),
                group(3, "m", "m"),
            ])
        });

        let policy = regex_policy(".*", None);
        let groups = resolve(&forge, &SecretString::from("secret"), &user("alice"), &policy)
            .await
            .unwrap();
        // Equal lengths keep the discovery order.
        assert_eq!(
            vec!["m".to_string(), "zz".to_string(), "aa".to_string()],
            groups
        );
    }

    #[tokio::test]
    async fn test_regex_filtered_appends_matching_projects() {
        let mut forge = MockForgeProvider::default();
        forge
            .expect_list_groups()
            .returning(|_, _| Ok(vec![group(1, "eng", "eng"), group(2, "sales", "sales")]));
        // Only the matching group's projects are listed. An unexpected call
        // for group 2 would fail the test.
        forge
            .expect_list_group_projects()
            .withf(|_, group_id: &u64| *group_id == 1)
            .returning(|_, _| Ok(vec![project(10, "eng/svc"), project(11, "eng/tools")]));

        let policy = regex_policy("^eng$", Some("svc$"));
        let groups = resolve(&forge, &SecretString::from("secret"), &user("alice"), &policy)
            .await
            .unwrap();
        assert_eq!(vec!["eng".to_string(), "eng/svc".to_string()], groups);
    }

    #[tokio::test]
    async fn test_root_group_hierarchy() {
        let mut forge = MockForgeProvider::default();
        forge
            .expect_list_groups()
            .withf(|_, params: &GroupListParameters| {
                params.search.as_deref() == Some("team-x")
            })
            .returning(|_, _| {
                Ok(vec![
                    group(5, "team-x-archive", "team-x-archive"),
                    group(7, "team-x", "team-x"),
                ])
            });
        forge
            .expect_list_subgroups()
            .withf(|_, group_id: &u64| *group_id == 7)
            .returning(|_, _| {
                Ok(vec![
                    group(8, "sub1", "team-x/sub1"),
                    group(9, "sub2", "team-x/sub2"),
                ])
            });

        let policy = Policy::RootGroupHierarchy {
            root_group: "team-x".into(),
        };
        let groups = resolve(&forge, &SecretString::from("secret"), &user("alice"), &policy)
            .await
            .unwrap();
        assert_eq!(
            vec![
                "team-x".to_string(),
                "team-x/sub1".to_string(),
                "team-x/sub2".to_string()
            ],
            groups
        );
    }

    #[tokio::test]
    async fn test_root_group_requires_exact_path() {
        let mut forge = MockForgeProvider::default();
        // The provider search is a substring filter and happily returns the
        // near miss; it must not count as membership.
        forge
            .expect_list_groups()
            .returning(|_, _| Ok(vec![group(5, "team-x-archive", "team-x-archive")]));

        let policy = Policy::RootGroupHierarchy {
            root_group: "team-x".into(),
        };
        match resolve(&forge, &SecretString::from("secret"), &user("alice"), &policy).await {
            Err(ResolutionError::NotRootGroupMember {
                username,
                root_group,
            }) => {
                assert_eq!("alice", username);
                assert_eq!("team-x", root_group);
            }
            other => panic!("expected NotRootGroupMember, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let mut forge = MockForgeProvider::default();
        forge.expect_list_groups().returning(|_, _| {
            Err(ForgeProviderError::Api {
                status: 503,
                endpoint: "/groups".into(),
            })
        });

        match resolve(
            &forge,
            &SecretString::from("secret"),
            &user("alice"),
            &Policy::Unrestricted,
        )
        .await
        {
            Err(ResolutionError::Provider { .. }) => {}
            other => panic!("expected a provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_subgroup_failure_is_not_partial_success() {
        let mut forge = MockForgeProvider::default();
        forge
            .expect_list_groups()
            .returning(|_, _| Ok(vec![group(7, "team-x", "team-x")]));
        forge.expect_list_subgroups().returning(|_, _| {
            Err(ForgeProviderError::Api {
                status: 500,
                endpoint: "/groups/7/subgroups".into(),
            })
        });

        let policy = Policy::RootGroupHierarchy {
            root_group: "team-x".into(),
        };
        match resolve(&forge, &SecretString::from("secret"), &user("alice"), &policy).await {
            Err(ResolutionError::Provider { .. }) => {}
            other => panic!("expected a provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let mut forge = MockForgeProvider::default();
        forge.expect_list_groups().times(2).returning(|_, _| {
            Ok(vec![group(1, "a", "a"), group(2, "b", "a/b")])
        });

        let policy = regex_policy("^a", None);
        let token = SecretString::from("secret");
        let first = resolve(&forge, &token, &user("alice"), &policy).await.unwrap();
        let second = resolve(&forge, &token, &user("alice"), &policy).await.unwrap();
        assert_eq!(first, second);
    }

    mod policy {
        use super::*;

        #[test]
        fn test_from_config_defaults_to_unrestricted() {
            let policy = Policy::from_config(&Config::default()).unwrap();
            assert!(matches!(policy, Policy::Unrestricted));
        }

        #[test]
        fn test_from_config_selects_regex() {
            let config = Config {
                group_filter_pattern: Some("^eng$".into()),
                project_filter_pattern: Some("svc$".into()),
                ..Default::default()
            };
            match Policy::from_config(&config).unwrap() {
                Policy::RegexFiltered {
                    group_pattern,
                    project_pattern,
                } => {
                    assert_eq!("^eng$", group_pattern.as_str());
                    assert_eq!("svc$", project_pattern.unwrap().as_str());
                }
                other => panic!("expected RegexFiltered, got {:?}", other),
            }
        }

        #[test]
        fn test_from_config_selects_root_group() {
            let config = Config {
                root_group: Some("team-x".into()),
                ..Default::default()
            };
            match Policy::from_config(&config).unwrap() {
                Policy::RootGroupHierarchy { root_group } => assert_eq!("team-x", root_group),
                other => panic!("expected RootGroupHierarchy, got {:?}", other),
            }
        }

        #[test]
        fn test_from_config_group_pattern_wins_over_root_group() {
            let config = Config {
                group_filter_pattern: Some("^eng$".into()),
                root_group: Some("team-x".into()),
                ..Default::default()
            };
            assert!(matches!(
                Policy::from_config(&config).unwrap(),
                Policy::RegexFiltered { .. }
            ));
        }

        #[test]
        fn test_from_config_rejects_invalid_patterns() {
            let config = Config {
                group_filter_pattern: Some("(".into()),
                ..Default::default()
            };
            assert!(matches!(
                Policy::from_config(&config),
                Err(PolicyError::GroupPattern { .. })
            ));

            let config = Config {
                group_filter_pattern: Some("^eng$".into()),
                project_filter_pattern: Some("(".into()),
                ..Default::default()
            };
            assert!(matches!(
                Policy::from_config(&config),
                Err(PolicyError::ProjectPattern { .. })
            ));
        }
    }
}
