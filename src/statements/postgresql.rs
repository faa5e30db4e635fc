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

//! PostgreSQL advisory lock statements.
//!
//! The blocking `pg_advisory_lock` family has no timeout parameter, so
//! bounded waits are emulated by polling the `pg_try_advisory_lock` family
//! in a sleep loop. Transaction-scoped (`_xact_`) locks release at
//! transaction end and have no unlock function.

use std::time::Duration;

use crate::connection::{Param, Statement};

pub const LOCK: &str = "SELECT pg_advisory_lock($1)";
pub const LOCK_SHARED: &str = "SELECT pg_advisory_lock_shared($1)";
pub const LOCK_XACT: &str = "SELECT pg_advisory_xact_lock($1)";
pub const LOCK_XACT_SHARED: &str = "SELECT pg_advisory_xact_lock_shared($1)";

pub const TRY_LOCK: &str = "SELECT pg_try_advisory_lock($1)";
pub const TRY_LOCK_SHARED: &str = "SELECT pg_try_advisory_lock_shared($1)";
pub const TRY_LOCK_XACT: &str = "SELECT pg_try_advisory_xact_lock($1)";
pub const TRY_LOCK_XACT_SHARED: &str = "SELECT pg_try_advisory_xact_lock_shared($1)";

pub const UNLOCK: &str = "SELECT pg_advisory_unlock($1)";
pub const UNLOCK_SHARED: &str = "SELECT pg_advisory_unlock_shared($1)";

/// Default sleep between two `pg_try_advisory_*` attempts
pub const POLL_INTERVAL_DEFAULT: Duration = Duration::from_secs(1);

/// Smallest accepted poll interval; anything lower hammers the server
pub const POLL_INTERVAL_MIN: Duration = Duration::from_millis(100);

/// Blocking acquire; returns void
pub fn lock(key: i64, shared: bool, xact: bool) -> Statement {
    let sql = match (xact, shared) {
        (false, false) => LOCK,
        (false, true) => LOCK_SHARED,
        (true, false) => LOCK_XACT,
        (true, true) => LOCK_XACT_SHARED,
    };
    Statement::new(sql, vec![Param::I64(key)])
}

/// Non-blocking acquire; returns a boolean
pub fn try_lock(key: i64, shared: bool, xact: bool) -> Statement {
    let sql = match (xact, shared) {
        (false, false) => TRY_LOCK,
        (false, true) => TRY_LOCK_SHARED,
        (true, false) => TRY_LOCK_XACT,
        (true, true) => TRY_LOCK_XACT_SHARED,
    };
    Statement::new(sql, vec![Param::I64(key)])
}

/// Session-scope release; returns false when the lock was not held
pub fn unlock(key: i64, shared: bool) -> Statement {
    let sql = if shared { UNLOCK_SHARED } else { UNLOCK };
    Statement::new(sql, vec![Param::I64(key)])
}
