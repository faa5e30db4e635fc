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

//! PostgreSQL advisory locks.
//!
//! The native blocking function has no timeout parameter, so a bounded
//! wait polls the non-blocking `try` variant with a sleep in between.
//! The reported timeout therefore has up to one poll interval of variance.
//! Transaction-scoped locks release at transaction end; a manual release
//! attempt on them is rejected with a warning instead of an error.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::warn;

use crate::config::LockOptions;
use crate::connection::{AsyncConnection, Connection, Scalar};
use crate::error::{LockError, Result};
use crate::key::NormalizedKey;
use crate::statements::postgresql as stmt;
use crate::types::{Dialect, LockMode};

#[derive(Debug)]
pub struct PostgresLock {
    key: i64,
    shared: bool,
    xact: bool,
    interval: Duration,
}

impl PostgresLock {
    pub(crate) fn from_options(key: NormalizedKey, options: &LockOptions) -> Result<Self> {
        let mode = options.effective_mode(Dialect::Postgres)?;
        let shared = match mode {
            LockMode::Exclusive => false,
            LockMode::Shared => true,
            _ => return Err(LockError::unsupported_option("mode", Dialect::Postgres)),
        };
        let interval = options.poll_interval_or_default()?;
        match key {
            NormalizedKey::Int64(key) => Ok(Self {
                key,
                shared,
                xact: options.transaction,
                interval,
            }),
            other => Err(LockError::backend(format!("postgresql adapter given non-integer key {other}"))),
        }
    }

    fn decode_try(&self, value: Scalar) -> Result<bool> {
        value
            .as_bool()
            .ok_or_else(|| LockError::backend(format!("pg_try_advisory_lock({}) returned NULL", self.key)))
    }

    fn decode_unlock(&self, value: Scalar) -> Result<super::ReleaseOutcome> {
        match value.as_bool() {
            Some(true) => Ok(super::ReleaseOutcome::Released),
            Some(false) => Ok(super::ReleaseOutcome::NotHeld),
            None => Err(LockError::backend(format!("pg_advisory_unlock({}) returned NULL", self.key))),
        }
    }

    /// Next sleep of the poll loop; never sleeps past the deadline
    fn next_sleep(&self, deadline: Instant) -> Option<Duration> {
        let remaining = deadline.checked_duration_since(Instant::now())?;
        if remaining.is_zero() {
            return None;
        }
        Some(self.interval.min(remaining))
    }
}

impl super::Adapter for PostgresLock {
    fn do_acquire(&self, conn: &mut dyn Connection, blocking: bool, timeout: Option<Duration>) -> Result<bool> {
        match (blocking, timeout) {
            (true, None) => {
                // native blocking call, returns void
                let statement = stmt::lock(self.key, self.shared, self.xact);
                conn.execute(&statement)
                    .map_err(|e| LockError::backend_caused("pg_advisory_lock failed", e))?;
                Ok(true)
            }
            (true, Some(t)) => {
                let statement = stmt::try_lock(self.key, self.shared, self.xact);
                let deadline = Instant::now() + t;
                loop {
                    let value = conn
                        .execute(&statement)
                        .map_err(|e| LockError::backend_caused("pg_try_advisory_lock failed", e))?;
                    if self.decode_try(value)? {
                        return Ok(true);
                    }
                    match self.next_sleep(deadline) {
                        Some(sleep) => std::thread::sleep(sleep),
                        None => return Ok(false),
                    }
                }
            }
            (false, _) => {
                let statement = stmt::try_lock(self.key, self.shared, self.xact);
                let value = conn
                    .execute(&statement)
                    .map_err(|e| LockError::backend_caused("pg_try_advisory_lock failed", e))?;
                self.decode_try(value)
            }
        }
    }

    fn do_release(&self, conn: &mut dyn Connection) -> Result<super::ReleaseOutcome> {
        if self.xact {
            warn!(
                key = self.key,
                "transaction-scoped advisory locks release at transaction end and cannot be released manually"
            );
            return Ok(super::ReleaseOutcome::NotHeld);
        }
        let statement = stmt::unlock(self.key, self.shared);
        let value = conn
            .execute(&statement)
            .map_err(|e| LockError::backend_caused("pg_advisory_unlock failed", e))?;
        self.decode_unlock(value)
    }
}

#[async_trait]
impl super::AsyncAdapter for PostgresLock {
    async fn do_acquire(&self, conn: &mut dyn AsyncConnection, blocking: bool, timeout: Option<Duration>) -> Result<bool> {
        match (blocking, timeout) {
            (true, None) => {
                let statement = stmt::lock(self.key, self.shared, self.xact);
                conn.execute(&statement)
                    .await
                    .map_err(|e| LockError::backend_caused("pg_advisory_lock failed", e))?;
                Ok(true)
            }
            (true, Some(t)) => {
                let statement = stmt::try_lock(self.key, self.shared, self.xact);
                let deadline = Instant::now() + t;
                loop {
                    let value = conn
                        .execute(&statement)
                        .await
                        .map_err(|e| LockError::backend_caused("pg_try_advisory_lock failed", e))?;
                    if self.decode_try(value)? {
                        return Ok(true);
                    }
                    match self.next_sleep(deadline) {
                        Some(sleep) => tokio::time::sleep(sleep).await,
                        None => return Ok(false),
                    }
                }
            }
            (false, _) => {
                let statement = stmt::try_lock(self.key, self.shared, self.xact);
                let value = conn
                    .execute(&statement)
                    .await
                    .map_err(|e| LockError::backend_caused("pg_try_advisory_lock failed", e))?;
                self.decode_try(value)
            }
        }
    }

    async fn do_release(&self, conn: &mut dyn AsyncConnection) -> Result<super::ReleaseOutcome> {
        if self.xact {
            warn!(
                key = self.key,
                "transaction-scoped advisory locks release at transaction end and cannot be released manually"
            );
            return Ok(super::ReleaseOutcome::NotHeld);
        }
        let statement = stmt::unlock(self.key, self.shared);
        let value = conn
            .execute(&statement)
            .await
            .map_err(|e| LockError::backend_caused("pg_advisory_unlock failed", e))?;
        self.decode_unlock(value)
    }
}
