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

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{LockError, Result};
use crate::statements::postgresql::{POLL_INTERVAL_DEFAULT, POLL_INTERVAL_MIN};
use crate::types::{Dialect, LockMode};

/// Per-handle lock configuration.
///
/// Fixed at handle construction. Options a dialect does not recognize are
/// rejected there with [`LockError::UnsupportedOption`] instead of being
/// silently ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockOptions {
    /// Lock mode, default exclusive
    #[serde(default)]
    pub mode: LockMode,

    /// Shorthand for `mode = Shared` (PostgreSQL, SQL Server, Oracle)
    #[serde(default)]
    pub shared: bool,

    /// Transaction scope: PostgreSQL `_xact_` advisory locks, Oracle
    /// `release_on_commit`
    #[serde(default)]
    pub transaction: bool,

    /// Timeout applied by scoped acquisition ([`crate::DbLock::with`]);
    /// `None` waits forever. Has no effect on explicit `acquire` calls.
    #[serde(default)]
    pub contextual_timeout: Option<Duration>,

    /// Sleep between acquisition attempts when PostgreSQL emulates a
    /// bounded wait; default one second
    #[serde(default)]
    pub poll_interval: Option<Duration>,
}

impl LockOptions {
    /// Create options with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lock mode
    pub fn with_mode(mut self, mode: LockMode) -> Self {
        self.mode = mode;
        self
    }

    /// Request a shared lock
    pub fn with_shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }

    /// Request transaction scope
    pub fn with_transaction(mut self, transaction: bool) -> Self {
        self.transaction = transaction;
        self
    }

    /// Set the scoped-acquisition timeout
    pub fn with_contextual_timeout(mut self, timeout: Duration) -> Self {
        self.contextual_timeout = Some(timeout);
        self
    }

    /// Set the PostgreSQL poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Merge the `shared` shorthand into the mode.
    ///
    /// `shared` combined with an explicit non-shared mode is contradictory
    /// and rejected.
    pub(crate) fn effective_mode(&self, dialect: Dialect) -> Result<LockMode> {
        if self.shared {
            match self.mode {
                LockMode::Exclusive | LockMode::Shared => Ok(LockMode::Shared),
                _ => Err(LockError::unsupported_option("shared", dialect)),
            }
        } else {
            Ok(self.mode)
        }
    }

    pub(crate) fn reject_transaction(&self, dialect: Dialect) -> Result<()> {
        if self.transaction {
            Err(LockError::unsupported_option("transaction", dialect))
        } else {
            Ok(())
        }
    }

    pub(crate) fn reject_poll_interval(&self, dialect: Dialect) -> Result<()> {
        if self.poll_interval.is_some() {
            Err(LockError::unsupported_option("poll_interval", dialect))
        } else {
            Ok(())
        }
    }

    /// Poll interval for the PostgreSQL adapter, bounds-checked
    pub(crate) fn poll_interval_or_default(&self) -> Result<Duration> {
        match self.poll_interval {
            None => Ok(POLL_INTERVAL_DEFAULT),
            Some(interval) if interval >= POLL_INTERVAL_MIN => Ok(interval),
            Some(_) => Err(LockError::unsupported_option("poll_interval", Dialect::Postgres)),
        }
    }
}
