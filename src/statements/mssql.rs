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

//! SQL Server application lock statements.
//!
//! `@LockTimeout` is in milliseconds: 0 tries once, -1 waits forever.
//! `@LockOwner = 'Session'` keeps the lock independent of transactions.
//! Mode compatibility (Shared and Update coexist, Exclusive excludes all)
//! is enforced by the server, not here.

use crate::connection::{Param, Statement};
use crate::types::LockMode;

pub const LOCK_EXCLUSIVE: &str = "\
DECLARE @result int
EXEC @result = sp_getapplock
    @Resource = @P1,
    @LockMode = 'Exclusive',
    @LockTimeout = @P2,
    @LockOwner = 'Session'
SELECT @result";

pub const LOCK_SHARED: &str = "\
DECLARE @result int
EXEC @result = sp_getapplock
    @Resource = @P1,
    @LockMode = 'Shared',
    @LockTimeout = @P2,
    @LockOwner = 'Session'
SELECT @result";

pub const LOCK_UPDATE: &str = "\
DECLARE @result int
EXEC @result = sp_getapplock
    @Resource = @P1,
    @LockMode = 'Update',
    @LockTimeout = @P2,
    @LockOwner = 'Session'
SELECT @result";

pub const UNLOCK: &str = "\
DECLARE @result int
EXEC @result = sp_releaseapplock
    @Resource = @P1,
    @LockOwner = 'Session'
SELECT @result";

/// `sp_getapplock` in the given mode.
///
/// The mode must be one of Exclusive, Shared or Update; the adapter
/// validates that before ever reaching this function.
pub fn getapplock(resource: &str, mode: LockMode, timeout_ms: i32) -> Statement {
    let sql = match mode {
        LockMode::Shared => LOCK_SHARED,
        LockMode::Update => LOCK_UPDATE,
        _ => LOCK_EXCLUSIVE,
    };
    Statement::new(sql, vec![Param::Text(resource.to_owned()), Param::I32(timeout_ms)])
}

/// `sp_releaseapplock` for the session-owned lock
pub fn releaseapplock(resource: &str) -> Statement {
    Statement::new(UNLOCK, vec![Param::Text(resource.to_owned())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_selects_statement() {
        assert_eq!(getapplock("r", LockMode::Exclusive, 0).sql, LOCK_EXCLUSIVE);
        assert_eq!(getapplock("r", LockMode::Shared, 0).sql, LOCK_SHARED);
        assert_eq!(getapplock("r", LockMode::Update, 0).sql, LOCK_UPDATE);
    }

    #[test]
    fn test_params() {
        let stmt = getapplock("resource-a", LockMode::Exclusive, 1500);
        assert_eq!(stmt.params, vec![Param::Text("resource-a".into()), Param::I32(1500)]);
        let stmt = releaseapplock("resource-a");
        assert_eq!(stmt.sql, UNLOCK);
        assert_eq!(stmt.params, vec![Param::Text("resource-a".into())]);
    }
}
