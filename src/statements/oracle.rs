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

//! Oracle `DBMS_LOCK` statements.
//!
//! `REQUEST` returns a status code: 0 success, 1 timeout, 2 deadlock,
//! 3 parameter error, 4 already owned, 5 illegal lock handle. `RELEASE`
//! returns 0 success, 3 parameter error, 4 not owned, 5 illegal handle.

use crate::connection::{Param, Statement};

/// Largest `timeout` value `DBMS_LOCK.REQUEST` accepts (seconds)
pub const MAXWAIT: i64 = 32767;

pub const REQUEST: &str = "\
SELECT DBMS_LOCK.REQUEST(
    id => :1,
    lockmode => :2,
    timeout => :3,
    release_on_commit => :4
) AS result FROM DUAL";

pub const RELEASE: &str = "SELECT DBMS_LOCK.RELEASE(id => :1) AS result FROM DUAL";

/// `DBMS_LOCK.REQUEST` with an integer mode constant from
/// [`crate::types::LockMode::dbms_lock_mode`]
pub fn request(id: u32, lockmode: i32, timeout_secs: i64, release_on_commit: bool) -> Statement {
    Statement::new(
        REQUEST,
        vec![
            Param::I64(i64::from(id)),
            Param::I32(lockmode),
            Param::I64(timeout_secs),
            Param::I32(i32::from(release_on_commit)),
        ],
    )
}

/// `DBMS_LOCK.RELEASE` for the given lock id
pub fn release(id: u32) -> Statement {
    Statement::new(RELEASE, vec![Param::I64(i64::from(id))])
}
