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

//! Suspendable lock handle.
//!
//! Identical contract to [`crate::DbLock`]; the only difference is that
//! acquire/release are suspension points. A handle never runs two
//! database operations concurrently on its borrowed connection.

use std::time::Duration;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::adapter::{AsyncAdapter, ReleaseOutcome};
use crate::connection::AsyncConnection;
use crate::error::{LockError, Result};
use crate::key::{LockKey, NormalizedKey};
use crate::types::LockState;

/// A named lock bound to a borrowed suspendable connection.
///
/// Constructed by [`crate::create_async_lock`]. Dropping a handle that
/// still holds its lock does not release it; the server keeps the lock
/// until the session ends.
pub struct AsyncDbLock<'c> {
    conn: &'c mut dyn AsyncConnection,
    adapter: Box<dyn AsyncAdapter>,
    key: LockKey,
    actual_key: NormalizedKey,
    state: LockState,
    contextual_timeout: Option<Duration>,
}

impl<'c> AsyncDbLock<'c> {
    pub(crate) fn new(
        conn: &'c mut dyn AsyncConnection,
        adapter: Box<dyn AsyncAdapter>,
        key: LockKey,
        actual_key: NormalizedKey,
        contextual_timeout: Option<Duration>,
    ) -> Self {
        Self {
            conn,
            adapter,
            key,
            actual_key,
            state: LockState::Unlocked,
            contextual_timeout,
        }
    }

    /// The key the handle was created with
    pub fn key(&self) -> &LockKey {
        &self.key
    }

    /// The dialect identifier the key normalized to
    pub fn actual_key(&self) -> &NormalizedKey {
        &self.actual_key
    }

    /// Current handle state, readable without I/O
    pub fn state(&self) -> LockState {
        self.state
    }

    /// Whether this handle currently holds its lock, readable without I/O
    pub fn is_acquired(&self) -> bool {
        self.state == LockState::Locked
    }

    /// Acquire the lock; see [`crate::DbLock::acquire`] for the contract
    pub async fn acquire(&mut self, block: bool, timeout: Option<Duration>) -> Result<bool> {
        if self.state != LockState::Unlocked {
            return Err(LockError::invalid_state("acquire", self.state));
        }
        let acquired = self.adapter.do_acquire(self.conn, block, timeout).await?;
        if acquired {
            self.state = LockState::Locked;
            debug!(key = %self.key, "lock acquired");
        }
        Ok(acquired)
    }

    /// Release the lock; see [`crate::DbLock::release`] for the contract
    pub async fn release(&mut self) -> Result<()> {
        if self.state != LockState::Locked {
            return Err(LockError::invalid_state("release", self.state));
        }
        let outcome = self.adapter.do_release(self.conn).await;
        self.state = LockState::Unlocked;
        match outcome {
            Ok(ReleaseOutcome::Released) => {
                debug!(key = %self.key, "lock released");
                Ok(())
            }
            Ok(ReleaseOutcome::NotHeld) => {
                warn!(key = %self.key, "lock was no longer held at release time");
                Ok(())
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "release failed, handle forced to unlocked");
                Err(e)
            }
        }
    }

    /// Close the handle; see [`crate::DbLock::close`] for the contract
    pub async fn close(&mut self) {
        if self.state == LockState::Locked {
            if let Err(e) = self.release().await {
                warn!(key = %self.key, error = %e, "release during close failed");
            }
        }
        self.state = LockState::Closed;
    }

    /// Scoped acquisition.
    ///
    /// Acquires with the handle's configured `contextual_timeout` (waits
    /// forever when unset), runs `body` with the borrowed connection, and
    /// closes the handle afterwards, on the normal exit as well as when
    /// acquisition fails. Fails with [`LockError::Timeout`] when the lock
    /// cannot be acquired within the configured duration.
    ///
    /// Unlike the blocking [`crate::DbLock::with`], cancellation of the
    /// returned future after acquisition skips the release; the lock then
    /// stays held until the session ends, as with any abandoned handle.
    pub async fn with<R>(&mut self, body: impl for<'a> FnOnce(&'a mut dyn AsyncConnection) -> BoxFuture<'a, R>) -> Result<R> {
        let timeout = self.contextual_timeout;
        if !self.acquire(true, timeout).await? {
            return Err(LockError::timeout(self.key.to_string(), timeout.unwrap_or_default()));
        }
        let out = body(&mut *self.conn).await;
        self.close().await;
        Ok(out)
    }
}

impl std::fmt::Debug for AsyncDbLock<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncDbLock")
            .field("key", &self.key)
            .field("actual_key", &self.actual_key)
            .field("state", &self.state)
            .field("contextual_timeout", &self.contextual_timeout)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for AsyncDbLock<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} AsyncDbLock key={}>", self.state, self.key)
    }
}
