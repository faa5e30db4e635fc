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

//! MySQL / MariaDB named-lock statements.
//!
//! `GET_LOCK` blocks server-side until the lock is granted or `timeout`
//! seconds elapse; `-1` waits forever.

use crate::connection::{Param, Statement};

pub const GET_LOCK: &str = "SELECT GET_LOCK(?, ?)";
pub const RELEASE_LOCK: &str = "SELECT RELEASE_LOCK(?)";

/// `GET_LOCK(name, timeout)`; returns 1 on success, 0 on timeout, NULL on error
pub fn get_lock(name: &str, timeout_secs: i64) -> Statement {
    Statement::new(GET_LOCK, vec![Param::Text(name.to_owned()), Param::I64(timeout_secs)])
}

/// `RELEASE_LOCK(name)`; returns 1 if released, 0 if owned elsewhere, NULL if absent
pub fn release_lock(name: &str) -> Statement {
    Statement::new(RELEASE_LOCK, vec![Param::Text(name.to_owned())])
}
