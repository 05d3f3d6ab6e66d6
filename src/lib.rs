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

//! # Forge authentication webhook
//!
//! A Kubernetes authentication webhook that delegates token validation to a
//! project-hosting identity provider (a software forge exposing users, nested
//! groups and projects over a REST API).
//!
//! The Kubernetes API server posts a `TokenReview` object carrying a bearer
//! token to the `/authenticate` endpoint. The webhook resolves the token to a
//! forge user, resolves the user's group memberships and answers with a
//! `TokenReview` status carrying the username and the group claims derived
//! from the forge group hierarchy.
//!
//! Which groups end up in the claims is decided by a resolution policy fixed
//! once at process startup:
//!
//! - **Unrestricted**: every group visible to the user, by full path, in the
//!   provider's listing order.
//!
//! - **Regex filtered**: only groups whose full path matches the configured
//!   pattern; optionally the matching groups' projects matching a second
//!   pattern. A user matching nothing is refused.
//!
//! - **Root group hierarchy**: the user must be a direct member of the
//!   configured root group; the claims are the root group name followed by
//!   the full paths of all its subgroups.
//!
//! Every request is an independent, stateless unit of work. Nothing is cached
//! or persisted and any failure (malformed request, rejected token, provider
//! outage, policy refusal) is reported to the API server as an
//! unauthenticated review with the detail kept in the operational log.

pub mod api;
pub mod config;
pub mod error;
pub mod forge;
pub mod resolver;
pub mod service;
