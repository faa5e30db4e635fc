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

//! Lock handle factory.
//!
//! Inspects the dialect a connection reports, normalizes the key for that
//! dialect and wires the matching adapter into a lock handle. Every
//! normalization and configuration error surfaces here, at construction,
//! never on first use.

use crate::config::LockOptions;
use crate::connection::{AsyncConnection, Connection};
use crate::error::Result;
use crate::key::{self, LockKey};
use crate::lock::DbLock;
use crate::lock_async::AsyncDbLock;
use crate::registry;

/// Create a lock handle bound to a blocking connection.
///
/// ```no_run
/// # use rustfs_sqllock::{create_lock, Connection, LockOptions, Result};
/// # fn demo(conn: &mut dyn Connection) -> Result<()> {
/// let mut lock = create_lock(conn, "reports/nightly", LockOptions::new())?;
/// if lock.acquire(false, None)? {
///     // critical section
///     lock.release()?;
/// }
/// # Ok(())
/// # }
/// ```
pub fn create_lock<'c>(conn: &'c mut dyn Connection, key: impl Into<LockKey>, options: LockOptions) -> Result<DbLock<'c>> {
    let key = key.into();
    let dialect = registry::resolve_dialect(conn.dialect_name())?;
    let actual_key = key::normalize(&key, dialect)?;
    let adapter = registry::adapter(dialect, actual_key.clone(), &options)?;
    Ok(DbLock::new(conn, adapter, key, actual_key, options.contextual_timeout))
}

/// Create a lock handle bound to a suspendable connection
pub fn create_async_lock<'c>(
    conn: &'c mut dyn AsyncConnection,
    key: impl Into<LockKey>,
    options: LockOptions,
) -> Result<AsyncDbLock<'c>> {
    let key = key.into();
    let dialect = registry::resolve_dialect(conn.dialect_name())?;
    let actual_key = key::normalize(&key, dialect)?;
    let adapter = registry::async_adapter(dialect, actual_key.clone(), &options)?;
    Ok(AsyncDbLock::new(conn, adapter, key, actual_key, options.contextual_timeout))
}
