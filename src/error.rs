// Copyright 2024 RustFS Team
//
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

use std::time::Duration;
use thiserror::Error;

use crate::types::{Dialect, LockState};

/// Lock operation related error types
#[derive(Error, Debug)]
pub enum LockError {
    /// Invalid acquire/release ordering on a handle (programming error)
    #[error("cannot {operation} while the lock handle is {state}")]
    InvalidState { operation: &'static str, state: LockState },

    /// Lock acquisition deadline elapsed
    #[error("lock acquisition timed out for key '{key}' after {timeout:?}")]
    Timeout { key: String, timeout: Duration },

    /// Integer key outside the dialect's identifier range
    #[error("key {value} outside the valid range [{min}, {max}]")]
    KeyRange { value: i64, min: i64, max: i64 },

    /// String key longer than the dialect's identifier limit
    #[error("key of {length} characters exceeds the {dialect} limit of {max}")]
    KeyTooLong {
        length: usize,
        max: usize,
        dialect: Dialect,
    },

    /// Connection reports a dialect with no registered adapter
    #[error("unsupported dialect: {name}")]
    UnsupportedDialect { name: String },

    /// Configuration option not valid for the resolved dialect
    #[error("option '{option}' is not supported by the {dialect} dialect")]
    UnsupportedOption { option: &'static str, dialect: Dialect },

    /// Underlying driver or server failure
    #[error("backend error: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl LockError {
    /// Create invalid state error
    pub fn invalid_state(operation: &'static str, state: LockState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Create timeout error
    pub fn timeout(key: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            key: key.into(),
            timeout,
        }
    }

    /// Create key range error
    pub fn key_range(value: i64, min: i64, max: i64) -> Self {
        Self::KeyRange { value, min, max }
    }

    /// Create key length error
    pub fn key_too_long(length: usize, max: usize, dialect: Dialect) -> Self {
        Self::KeyTooLong { length, max, dialect }
    }

    /// Create unsupported dialect error
    pub fn unsupported_dialect(name: impl Into<String>) -> Self {
        Self::UnsupportedDialect { name: name.into() }
    }

    /// Create unsupported option error
    pub fn unsupported_option(option: &'static str, dialect: Dialect) -> Self {
        Self::UnsupportedOption { option, dialect }
    }

    /// Create backend error without a driver cause
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Create backend error preserving the driver cause
    pub fn backend_caused(message: impl Into<String>, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Check if it is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Backend { .. })
    }

    /// Check if it is a configuration error raised at handle construction
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::KeyRange { .. } | Self::KeyTooLong { .. } | Self::UnsupportedDialect { .. } | Self::UnsupportedOption { .. }
        )
    }
}

/// Lock operation Result type
pub type Result<T> = std::result::Result<T, LockError>;
