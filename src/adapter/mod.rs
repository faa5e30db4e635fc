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

//! Dialect adapters.
//!
//! An adapter implements the acquire/release protocol of one database
//! family and nothing else. Adapters never retry and never touch handle
//! state; the state machine in [`crate::lock`] owns both. Native error
//! codes are translated into [`crate::LockError`] here, raw driver errors
//! only ever cross this layer wrapped as `Backend` with the cause attached.

pub mod mssql;
pub mod mysql;
pub mod oracle;
pub mod postgresql;

use std::time::Duration;

use async_trait::async_trait;

use crate::connection::{AsyncConnection, Connection};
use crate::error::Result;

pub use mssql::MssqlLock;
pub use mysql::MysqlLock;
pub use oracle::OracleLock;
pub use postgresql::PostgresLock;

/// Result of a dialect release call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The lock was held and is now released
    Released,
    /// The server reports the lock was not held (released out-of-band,
    /// e.g. by transaction end or connection teardown)
    NotHeld,
}

/// Blocking acquire/release primitives of one dialect.
///
/// `timeout = None` means wait forever; the `blocking` flag turns the call
/// into a single attempt regardless of `timeout`. `Ok(false)` is a soft
/// timeout, everything fatal is an `Err`.
pub trait Adapter: Send {
    fn do_acquire(&self, conn: &mut dyn Connection, blocking: bool, timeout: Option<Duration>) -> Result<bool>;

    fn do_release(&self, conn: &mut dyn Connection) -> Result<ReleaseOutcome>;
}

/// Suspendable variant of [`Adapter`]
#[async_trait]
pub trait AsyncAdapter: Send {
    async fn do_acquire(&self, conn: &mut dyn AsyncConnection, blocking: bool, timeout: Option<Duration>) -> Result<bool>;

    async fn do_release(&self, conn: &mut dyn AsyncConnection) -> Result<ReleaseOutcome>;
}
