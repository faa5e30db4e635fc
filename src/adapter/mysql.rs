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

//! MySQL / MariaDB named locks via `GET_LOCK` / `RELEASE_LOCK`.
//!
//! The server blocks inside `GET_LOCK` until the lock is granted or the
//! timeout elapses, so no client-side polling is needed. One quirk to be
//! aware of: the same connection may re-acquire the same name without
//! blocking, so two handles on one connection do not exclude each other.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::LockOptions;
use crate::connection::{AsyncConnection, Connection, Scalar};
use crate::error::{LockError, Result};
use crate::key::NormalizedKey;
use crate::statements::mysql as stmt;
use crate::types::{Dialect, LockMode};

#[derive(Debug)]
pub struct MysqlLock {
    name: String,
}

impl MysqlLock {
    pub(crate) fn from_options(key: NormalizedKey, options: &LockOptions) -> Result<Self> {
        if options.effective_mode(Dialect::Mysql)? != LockMode::Exclusive {
            return Err(LockError::unsupported_option("mode", Dialect::Mysql));
        }
        options.reject_transaction(Dialect::Mysql)?;
        options.reject_poll_interval(Dialect::Mysql)?;
        match key {
            NormalizedKey::Text(name) => Ok(Self { name }),
            other => Err(LockError::backend(format!("mysql adapter given non-text key {other}"))),
        }
    }

    /// `GET_LOCK` timeout argument: seconds, -1 waits forever
    fn timeout_secs(blocking: bool, timeout: Option<Duration>) -> i64 {
        if !blocking {
            return 0;
        }
        match timeout {
            None => -1,
            Some(t) => t.as_secs() as i64,
        }
    }

    fn decode_acquire(&self, value: Scalar) -> Result<bool> {
        match value.as_i64() {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            None => Err(LockError::backend(format!(
                "an error occurred while attempting to obtain the lock '{}'",
                self.name
            ))),
            Some(other) => Err(LockError::backend(format!("GET_LOCK('{}') returned {other}", self.name))),
        }
    }

    fn decode_release(&self, value: Scalar) -> Result<super::ReleaseOutcome> {
        match value.as_i64() {
            Some(1) => Ok(super::ReleaseOutcome::Released),
            // 0: established by another session; NULL: never existed or
            // already released
            Some(0) | None => Ok(super::ReleaseOutcome::NotHeld),
            Some(other) => Err(LockError::backend(format!("RELEASE_LOCK('{}') returned {other}", self.name))),
        }
    }
}

impl super::Adapter for MysqlLock {
    fn do_acquire(&self, conn: &mut dyn Connection, blocking: bool, timeout: Option<Duration>) -> Result<bool> {
        let statement = stmt::get_lock(&self.name, Self::timeout_secs(blocking, timeout));
        let value = conn
            .execute(&statement)
            .map_err(|e| LockError::backend_caused("GET_LOCK failed", e))?;
        self.decode_acquire(value)
    }

    fn do_release(&self, conn: &mut dyn Connection) -> Result<super::ReleaseOutcome> {
        let statement = stmt::release_lock(&self.name);
        let value = conn
            .execute(&statement)
            .map_err(|e| LockError::backend_caused("RELEASE_LOCK failed", e))?;
        self.decode_release(value)
    }
}

#[async_trait]
impl super::AsyncAdapter for MysqlLock {
    async fn do_acquire(&self, conn: &mut dyn AsyncConnection, blocking: bool, timeout: Option<Duration>) -> Result<bool> {
        let statement = stmt::get_lock(&self.name, Self::timeout_secs(blocking, timeout));
        let value = conn
            .execute(&statement)
            .await
            .map_err(|e| LockError::backend_caused("GET_LOCK failed", e))?;
        self.decode_acquire(value)
    }

    async fn do_release(&self, conn: &mut dyn AsyncConnection) -> Result<super::ReleaseOutcome> {
        let statement = stmt::release_lock(&self.name);
        let value = conn
            .execute(&statement)
            .await
            .map_err(|e| LockError::backend_caused("RELEASE_LOCK failed", e))?;
        self.decode_release(value)
    }
}
