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

use serde::{Deserialize, Serialize};

/// Database family a lock adapter targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// MySQL and MariaDB named locks
    Mysql,
    /// PostgreSQL advisory locks
    Postgres,
    /// SQL Server application locks
    Mssql,
    /// Oracle DBMS_LOCK user locks
    Oracle,
}

impl Dialect {
    /// Canonical lowercase name of the dialect
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Mysql => "mysql",
            Dialect::Postgres => "postgresql",
            Dialect::Mssql => "mssql",
            Dialect::Oracle => "oracle",
        }
    }

    /// Resolve a dialect from the name a connection reports.
    ///
    /// Names are matched case-insensitively and a `+driver` suffix
    /// (e.g. `postgresql+asyncpg`) is ignored. `mariadb` resolves to
    /// [`Dialect::Mysql`] since both share the named-lock functions.
    pub fn from_name(name: &str) -> Option<Self> {
        let base = name.trim().to_ascii_lowercase();
        let base = base.split('+').next().unwrap_or_default();
        match base {
            "mysql" | "mariadb" => Some(Dialect::Mysql),
            "postgresql" | "postgres" => Some(Dialect::Postgres),
            "mssql" => Some(Dialect::Mssql),
            "oracle" => Some(Dialect::Oracle),
            _ => None,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock handle state
///
/// `Unlocked` is the initial state. `Closed` is terminal: no transition
/// leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockState {
    /// The handle does not hold its lock
    #[default]
    Unlocked,
    /// The handle holds its lock
    Locked,
    /// The handle has been closed and can no longer be used
    Closed,
}

impl std::fmt::Display for LockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LockState::Unlocked => "unlocked",
            LockState::Locked => "locked",
            LockState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Lock mode requested for a handle
///
/// Which modes are accepted depends on the dialect: MySQL only supports
/// `Exclusive`; PostgreSQL adds `Shared`; SQL Server adds `Update`; Oracle
/// supports the full `DBMS_LOCK` matrix. Unsupported modes are rejected at
/// handle construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockMode {
    /// Exclusive lock (Oracle `X`)
    #[default]
    Exclusive,
    /// Shared lock (Oracle `S`)
    Shared,
    /// Update lock (SQL Server only)
    Update,
    /// Null mode, no actual locking (Oracle `NL`)
    Null,
    /// Sub-shared / row shared (Oracle `SS`)
    SubShared,
    /// Sub-exclusive / row exclusive (Oracle `SX`)
    SubExclusive,
    /// Shared sub-exclusive / share row exclusive (Oracle `SSX`)
    SharedSubExclusive,
}

impl LockMode {
    /// `@LockMode` argument for `sp_getapplock`, if the mode exists there
    pub fn applock_mode(&self) -> Option<&'static str> {
        match self {
            LockMode::Exclusive => Some("Exclusive"),
            LockMode::Shared => Some("Shared"),
            LockMode::Update => Some("Update"),
            _ => None,
        }
    }

    /// `lockmode` constant for `DBMS_LOCK.REQUEST`, if the mode exists there
    pub fn dbms_lock_mode(&self) -> Option<i32> {
        match self {
            LockMode::Null => Some(1),
            LockMode::SubShared => Some(2),
            LockMode::SubExclusive => Some(3),
            LockMode::Shared => Some(4),
            LockMode::SharedSubExclusive => Some(5),
            LockMode::Exclusive => Some(6),
            LockMode::Update => None,
        }
    }
}
