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

//! Oracle user locks via `DBMS_LOCK.REQUEST` / `DBMS_LOCK.RELEASE`.
//!
//! `REQUEST` takes the timeout in whole seconds (capped at `MAXWAIT`) and
//! reports the outcome as a status code; only 0 and 4 (already owned) are
//! success, 1 is a soft timeout, the rest are fatal.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::LockOptions;
use crate::connection::{AsyncConnection, Connection, Scalar};
use crate::error::{LockError, Result};
use crate::key::NormalizedKey;
use crate::statements::oracle as stmt;
use crate::types::Dialect;

#[derive(Debug)]
pub struct OracleLock {
    id: u32,
    lockmode: i32,
    release_on_commit: bool,
}

impl OracleLock {
    pub(crate) fn from_options(key: NormalizedKey, options: &LockOptions) -> Result<Self> {
        let mode = options.effective_mode(Dialect::Oracle)?;
        let lockmode = mode
            .dbms_lock_mode()
            .ok_or(LockError::unsupported_option("mode", Dialect::Oracle))?;
        options.reject_poll_interval(Dialect::Oracle)?;
        match key {
            NormalizedKey::OracleId(id) => Ok(Self {
                id,
                lockmode,
                release_on_commit: options.transaction,
            }),
            other => Err(LockError::backend(format!("oracle adapter given non-id key {other}"))),
        }
    }

    /// `timeout` argument of `REQUEST`: whole seconds, capped at `MAXWAIT`
    fn timeout_secs(blocking: bool, timeout: Option<Duration>) -> i64 {
        if !blocking {
            return 0;
        }
        match timeout {
            None => stmt::MAXWAIT,
            Some(t) => (t.as_secs() as i64).min(stmt::MAXWAIT),
        }
    }

    fn decode_request(&self, value: Scalar) -> Result<bool> {
        match value.as_i64() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            Some(2) => Err(LockError::backend(format!("deadlock detected while acquiring lock {}", self.id))),
            Some(3) => Err(LockError::backend(format!(
                "parameter error for lock {} (mode={})",
                self.id, self.lockmode
            ))),
            Some(4) => {
                debug!(id = self.id, "lock already owned by this session");
                Ok(true)
            }
            Some(5) => Err(LockError::backend(format!("illegal lock handle {}", self.id))),
            Some(other) => Err(LockError::backend(format!("DBMS_LOCK.REQUEST({}) returned {other}", self.id))),
            None => Err(LockError::backend(format!("DBMS_LOCK.REQUEST({}) returned NULL", self.id))),
        }
    }

    fn decode_release(&self, value: Scalar) -> Result<super::ReleaseOutcome> {
        match value.as_i64() {
            Some(0) => Ok(super::ReleaseOutcome::Released),
            Some(4) => Ok(super::ReleaseOutcome::NotHeld),
            Some(3) => Err(LockError::backend(format!("parameter error while releasing lock {}", self.id))),
            Some(5) => Err(LockError::backend(format!("illegal lock handle {}", self.id))),
            Some(other) => Err(LockError::backend(format!("DBMS_LOCK.RELEASE({}) returned {other}", self.id))),
            None => Err(LockError::backend(format!("DBMS_LOCK.RELEASE({}) returned NULL", self.id))),
        }
    }
}

impl super::Adapter for OracleLock {
    fn do_acquire(&self, conn: &mut dyn Connection, blocking: bool, timeout: Option<Duration>) -> Result<bool> {
        let statement = stmt::request(self.id, self.lockmode, Self::timeout_secs(blocking, timeout), self.release_on_commit);
        let value = conn
            .execute(&statement)
            .map_err(|e| LockError::backend_caused("DBMS_LOCK.REQUEST failed", e))?;
        self.decode_request(value)
    }

    fn do_release(&self, conn: &mut dyn Connection) -> Result<super::ReleaseOutcome> {
        let statement = stmt::release(self.id);
        let value = conn
            .execute(&statement)
            .map_err(|e| LockError::backend_caused("DBMS_LOCK.RELEASE failed", e))?;
        self.decode_release(value)
    }
}

#[async_trait]
impl super::AsyncAdapter for OracleLock {
    async fn do_acquire(&self, conn: &mut dyn AsyncConnection, blocking: bool, timeout: Option<Duration>) -> Result<bool> {
        let statement = stmt::request(self.id, self.lockmode, Self::timeout_secs(blocking, timeout), self.release_on_commit);
        let value = conn
            .execute(&statement)
            .await
            .map_err(|e| LockError::backend_caused("DBMS_LOCK.REQUEST failed", e))?;
        self.decode_request(value)
    }

    async fn do_release(&self, conn: &mut dyn AsyncConnection) -> Result<super::ReleaseOutcome> {
        let statement = stmt::release(self.id);
        let value = conn
            .execute(&statement)
            .await
            .map_err(|e| LockError::backend_caused("DBMS_LOCK.RELEASE failed", e))?;
        self.decode_release(value)
    }
}
