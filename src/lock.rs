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

//! Blocking lock handle.
//!
//! [`DbLock`] is the single place state transitions are enforced:
//! `unlocked --acquire--> locked --release--> unlocked`, and any state
//! `--close--> closed` (terminal). Adapters supply only the dialect I/O
//! primitives and never mutate state.
//!
//! A handle borrows its connection mutably, so it is affined to one
//! execution context for its lifetime; that is the whole concurrency
//! story. The server-side lock itself is scoped to the borrowed
//! connection: if the connection is torn down externally the lock is
//! silently revoked, and `release`/`close` tolerate that with a warning
//! rather than an error.

use std::time::Duration;

use tracing::{debug, warn};

use crate::adapter::{Adapter, ReleaseOutcome};
use crate::connection::Connection;
use crate::error::{LockError, Result};
use crate::key::{LockKey, NormalizedKey};
use crate::types::LockState;

/// A named lock bound to a borrowed blocking connection.
///
/// Constructed by [`crate::create_lock`]. Dropping a handle that still
/// holds its lock does not release it; the server keeps the lock until
/// the session ends.
pub struct DbLock<'c> {
    conn: &'c mut dyn Connection,
    adapter: Box<dyn Adapter>,
    key: LockKey,
    actual_key: NormalizedKey,
    state: LockState,
    contextual_timeout: Option<Duration>,
}

impl<'c> DbLock<'c> {
    pub(crate) fn new(
        conn: &'c mut dyn Connection,
        adapter: Box<dyn Adapter>,
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

    /// Acquire the lock, blocking or not.
    ///
    /// With `block` set, waits until the lock is granted or `timeout`
    /// elapses (`None` waits forever); returns `false` on an elapsed
    /// timeout. With `block` unset a single attempt is made and `timeout`
    /// is ignored. On success the handle transitions to `Locked`.
    ///
    /// Calling this on a handle that is not `Unlocked` is a programming
    /// error and fails with [`LockError::InvalidState`]. A backend failure
    /// leaves the handle `Unlocked`; no partial lock state exists on the
    /// server.
    pub fn acquire(&mut self, block: bool, timeout: Option<Duration>) -> Result<bool> {
        if self.state != LockState::Unlocked {
            return Err(LockError::invalid_state("acquire", self.state));
        }
        let acquired = self.adapter.do_acquire(self.conn, block, timeout)?;
        if acquired {
            self.state = LockState::Locked;
            debug!(key = %self.key, "lock acquired");
        }
        Ok(acquired)
    }

    /// Release the lock.
    ///
    /// Calling this on a handle that is not `Locked` fails with
    /// [`LockError::InvalidState`]. If the underlying lock was already
    /// released out-of-band (transaction end, connection teardown) this is
    /// a warning, not an error. A backend failure during release is
    /// logged and propagated, but the handle still transitions to
    /// `Unlocked`: once release fails the caller's only recourse is to
    /// abandon the handle, and it must not stay stuck in `Locked`.
    pub fn release(&mut self) -> Result<()> {
        if self.state != LockState::Locked {
            return Err(LockError::invalid_state("release", self.state));
        }
        let outcome = self.adapter.do_release(self.conn);
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

    /// Close the handle.
    ///
    /// Attempts a best-effort release when currently `Locked`, swallowing
    /// (but logging) release errors, then transitions to the terminal
    /// `Closed` state. Idempotent.
    pub fn close(&mut self) {
        if self.state == LockState::Locked {
            if let Err(e) = self.release() {
                warn!(key = %self.key, error = %e, "release during close failed");
            }
        }
        self.state = LockState::Closed;
    }

    /// Scoped acquisition.
    ///
    /// Acquires with the handle's configured `contextual_timeout` (waits
    /// forever when unset), runs `body` with the borrowed connection, and
    /// closes the handle on every exit path, including a panic inside
    /// `body`. Fails with [`LockError::Timeout`] when the lock cannot be
    /// acquired within the configured duration.
    pub fn with<R>(&mut self, body: impl FnOnce(&mut dyn Connection) -> R) -> Result<R> {
        let timeout = self.contextual_timeout;
        if !self.acquire(true, timeout)? {
            return Err(LockError::timeout(self.key.to_string(), timeout.unwrap_or_default()));
        }

        struct CloseOnExit<'g, 'c>(&'g mut DbLock<'c>);
        impl Drop for CloseOnExit<'_, '_> {
            fn drop(&mut self) {
                self.0.close();
            }
        }

        let mut guard = CloseOnExit(self);
        let out = body(&mut *guard.0.conn);
        Ok(out)
    }
}

impl std::fmt::Debug for DbLock<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbLock")
            .field("key", &self.key)
            .field("actual_key", &self.actual_key)
            .field("state", &self.state)
            .field("contextual_timeout", &self.contextual_timeout)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for DbLock<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} DbLock key={}>", self.state, self.key)
    }
}
