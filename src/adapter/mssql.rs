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

//! SQL Server application locks via `sp_getapplock` / `sp_releaseapplock`.
//!
//! The procedure takes the timeout directly in milliseconds, so blocking
//! and bounded waits both happen server-side. Return codes: >= 0 success,
//! -1 timeout, everything else fatal.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::LockOptions;
use crate::connection::{AsyncConnection, Connection, Scalar};
use crate::error::{LockError, Result};
use crate::key::NormalizedKey;
use crate::statements::mssql as stmt;
use crate::types::{Dialect, LockMode};

#[derive(Debug)]
pub struct MssqlLock {
    resource: String,
    mode: LockMode,
}

impl MssqlLock {
    pub(crate) fn from_options(key: NormalizedKey, options: &LockOptions) -> Result<Self> {
        let mode = options.effective_mode(Dialect::Mssql)?;
        if mode.applock_mode().is_none() {
            return Err(LockError::unsupported_option("mode", Dialect::Mssql));
        }
        options.reject_transaction(Dialect::Mssql)?;
        options.reject_poll_interval(Dialect::Mssql)?;
        match key {
            NormalizedKey::Text(resource) => Ok(Self { resource, mode }),
            other => Err(LockError::backend(format!("mssql adapter given non-text key {other}"))),
        }
    }

    /// `@LockTimeout` argument: milliseconds, 0 tries once, -1 waits forever
    fn timeout_ms(blocking: bool, timeout: Option<Duration>) -> i32 {
        if !blocking {
            return 0;
        }
        match timeout {
            None => -1,
            Some(t) => t.as_millis().min(i32::MAX as u128) as i32,
        }
    }

    fn decode_acquire(&self, value: Scalar, timeout_ms: i32) -> Result<bool> {
        match value.as_i64() {
            Some(v) if v >= 0 => Ok(true),
            Some(-1) => Ok(false),
            Some(-3) => Err(LockError::backend(format!(
                "parameter validation failed for lock resource '{}'",
                self.resource
            ))),
            Some(other) => Err(LockError::backend(format!(
                "sp_getapplock('{}', {timeout_ms}ms) returned {other}",
                self.resource
            ))),
            None => Err(LockError::backend(format!(
                "sp_getapplock('{}', {timeout_ms}ms) returned NULL",
                self.resource
            ))),
        }
    }

    fn decode_release(&self, value: Scalar) -> Result<super::ReleaseOutcome> {
        match value.as_i64() {
            Some(v) if v >= 0 => Ok(super::ReleaseOutcome::Released),
            Some(other) => Err(LockError::backend(format!(
                "sp_releaseapplock('{}') returned {other}",
                self.resource
            ))),
            None => Err(LockError::backend(format!(
                "sp_releaseapplock('{}') returned NULL",
                self.resource
            ))),
        }
    }
}

impl super::Adapter for MssqlLock {
    fn do_acquire(&self, conn: &mut dyn Connection, blocking: bool, timeout: Option<Duration>) -> Result<bool> {
        let timeout_ms = Self::timeout_ms(blocking, timeout);
        let statement = stmt::getapplock(&self.resource, self.mode, timeout_ms);
        let value = conn
            .execute(&statement)
            .map_err(|e| LockError::backend_caused("sp_getapplock failed", e))?;
        self.decode_acquire(value, timeout_ms)
    }

    fn do_release(&self, conn: &mut dyn Connection) -> Result<super::ReleaseOutcome> {
        let statement = stmt::releaseapplock(&self.resource);
        let value = conn
            .execute(&statement)
            .map_err(|e| LockError::backend_caused("sp_releaseapplock failed", e))?;
        self.decode_release(value)
    }
}

#[async_trait]
impl super::AsyncAdapter for MssqlLock {
    async fn do_acquire(&self, conn: &mut dyn AsyncConnection, blocking: bool, timeout: Option<Duration>) -> Result<bool> {
        let timeout_ms = Self::timeout_ms(blocking, timeout);
        let statement = stmt::getapplock(&self.resource, self.mode, timeout_ms);
        let value = conn
            .execute(&statement)
            .await
            .map_err(|e| LockError::backend_caused("sp_getapplock failed", e))?;
        self.decode_acquire(value, timeout_ms)
    }

    async fn do_release(&self, conn: &mut dyn AsyncConnection) -> Result<super::ReleaseOutcome> {
        let statement = stmt::releaseapplock(&self.resource);
        let value = conn
            .execute(&statement)
            .await
            .map_err(|e| LockError::backend_caused("sp_releaseapplock failed", e))?;
        self.decode_release(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ReleaseOutcome;

    fn adapter(options: &LockOptions) -> MssqlLock {
        MssqlLock::from_options(NormalizedKey::Text("r".into()), options).unwrap()
    }

    #[test]
    fn test_mode_selection() {
        assert_eq!(adapter(&LockOptions::new()).mode, LockMode::Exclusive);
        assert_eq!(adapter(&LockOptions::new().with_shared(true)).mode, LockMode::Shared);
        assert_eq!(adapter(&LockOptions::new().with_mode(LockMode::Update)).mode, LockMode::Update);

        let err = MssqlLock::from_options(
            NormalizedKey::Text("r".into()),
            &LockOptions::new().with_mode(LockMode::SubShared),
        )
        .unwrap_err();
        assert!(matches!(err, LockError::UnsupportedOption { option: "mode", .. }));
    }

    #[test]
    fn test_timeout_mapping() {
        assert_eq!(MssqlLock::timeout_ms(true, None), -1);
        assert_eq!(MssqlLock::timeout_ms(true, Some(Duration::from_millis(1500))), 1500);
        assert_eq!(MssqlLock::timeout_ms(false, None), 0);
        assert_eq!(MssqlLock::timeout_ms(false, Some(Duration::from_secs(9))), 0);
        // very large timeouts saturate instead of wrapping
        assert_eq!(MssqlLock::timeout_ms(true, Some(Duration::from_secs(u32::MAX as u64))), i32::MAX);
    }

    #[test]
    fn test_decode_acquire() {
        let a = adapter(&LockOptions::new());
        assert!(a.decode_acquire(Scalar::Int(0), 0).unwrap());
        assert!(a.decode_acquire(Scalar::Int(1), 0).unwrap());
        assert!(!a.decode_acquire(Scalar::Int(-1), 0).unwrap());
        assert!(matches!(a.decode_acquire(Scalar::Int(-3), 0), Err(LockError::Backend { .. })));
        assert!(matches!(a.decode_acquire(Scalar::Int(-999), 0), Err(LockError::Backend { .. })));
        assert!(matches!(a.decode_acquire(Scalar::Null, 0), Err(LockError::Backend { .. })));
    }

    #[test]
    fn test_decode_release() {
        let a = adapter(&LockOptions::new());
        assert_eq!(a.decode_release(Scalar::Int(0)).unwrap(), ReleaseOutcome::Released);
        assert!(matches!(a.decode_release(Scalar::Int(-999)), Err(LockError::Backend { .. })));
    }
}
