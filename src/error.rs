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
//! # Error
//!
//! Errors that can occur while assembling the service (not the API).
use derive_builder::UninitializedFieldError;
use thiserror::Error;

use crate::forge::error::ForgeProviderError;
use crate::resolver::error::PolicyError;

/// Service error.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Forge {
        #[from]
        source: ForgeProviderError,
    },

    #[error(transparent)]
    IO {
        #[from]
        source: std::io::Error,
    },

    #[error(transparent)]
    Policy {
        #[from]
        source: PolicyError,
    },
}

/// Error for the `derive_builder` generated builders.
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("uninitialized field: {0}")]
    UninitializedField(&'static str),

    #[error("validation error: {0}")]
    ValidationError(String),
}

impl From<UninitializedFieldError> for BuilderError {
    fn from(error: UninitializedFieldError) -> Self {
        Self::UninitializedField(error.field_name())
    }
}

impl From<String> for BuilderError {
    fn from(error: String) -> Self {
        Self::ValidationError(error)
    }
}
