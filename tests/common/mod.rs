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

//! In-memory stand-in for a database server.
//!
//! Models the native lock tables of each supported dialect well enough to
//! exercise the lock handles end to end: per-connection ownership, the
//! MySQL same-connection re-entry quirk, PostgreSQL transaction-scoped
//! auto-release, SQL Server mode compatibility and the Oracle status
//! codes. Blocking statements never wait here; contended blocking calls
//! report failure the way a timed-out call would.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rustfs_sqllock::statements::{mssql, mysql, oracle, postgresql};
use rustfs_sqllock::{AsyncConnection, BoxError, Connection, Param, Scalar, Statement};

pub type ConnId = u64;

#[derive(Default)]
struct PgEntry {
    exclusive: Option<ConnId>,
    shared: HashSet<ConnId>,
    xact: bool,
}

#[derive(Default)]
struct MssqlEntry {
    exclusive: Option<ConnId>,
    update: Option<ConnId>,
    shared: HashSet<ConnId>,
}

struct OracleEntry {
    owner: ConnId,
    release_on_commit: bool,
}

#[derive(Default)]
struct State {
    mysql: HashMap<String, ConnId>,
    pg: HashMap<i64, PgEntry>,
    mssql: HashMap<String, MssqlEntry>,
    oracle: HashMap<u32, OracleEntry>,
}

#[derive(Default)]
pub struct FakeServer {
    state: Mutex<State>,
    next_conn: AtomicU64,
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connect(self: &Arc<Self>, dialect: &str) -> FakeConnection {
        FakeConnection {
            id: self.next_conn.fetch_add(1, Ordering::Relaxed),
            dialect: dialect.to_owned(),
            server: Arc::clone(self),
        }
    }

    /// Simulate the end of the connection's current transaction
    pub fn end_transaction(&self, conn: ConnId) {
        let mut state = self.state.lock().unwrap();
        state.pg.retain(|_, e| {
            if e.xact {
                if e.exclusive == Some(conn) {
                    e.exclusive = None;
                }
                e.shared.remove(&conn);
            }
            e.exclusive.is_some() || !e.shared.is_empty()
        });
        state
            .oracle
            .retain(|_, e| !(e.release_on_commit && e.owner == conn));
    }

    /// Simulate connection teardown, which revokes all its locks
    pub fn disconnect(&self, conn: ConnId) {
        let mut state = self.state.lock().unwrap();
        state.mysql.retain(|_, owner| *owner != conn);
        state.pg.retain(|_, e| {
            if e.exclusive == Some(conn) {
                e.exclusive = None;
            }
            e.shared.remove(&conn);
            e.exclusive.is_some() || !e.shared.is_empty()
        });
        state.mssql.retain(|_, e| {
            if e.exclusive == Some(conn) {
                e.exclusive = None;
            }
            if e.update == Some(conn) {
                e.update = None;
            }
            e.shared.remove(&conn);
            e.exclusive.is_some() || e.update.is_some() || !e.shared.is_empty()
        });
        state.oracle.retain(|_, e| e.owner != conn);
    }

    fn execute(&self, conn: ConnId, stmt: &Statement) -> Result<Scalar, BoxError> {
        let mut state = self.state.lock().unwrap();
        let sql = stmt.sql;

        // MySQL named locks
        if sql == mysql::GET_LOCK {
            let name = text(&stmt.params[0]);
            return Ok(match state.mysql.get(&name) {
                Some(&owner) if owner != conn => Scalar::Int(0),
                _ => {
                    state.mysql.insert(name, conn);
                    Scalar::Int(1)
                }
            });
        }
        if sql == mysql::RELEASE_LOCK {
            let name = text(&stmt.params[0]);
            return Ok(match state.mysql.get(&name) {
                Some(&owner) if owner == conn => {
                    state.mysql.remove(&name);
                    Scalar::Int(1)
                }
                Some(_) => Scalar::Int(0),
                None => Scalar::Null,
            });
        }

        // PostgreSQL advisory locks
        let pg_variant = |sql: &str| -> Option<(bool, bool, bool)> {
            // (try, shared, xact)
            match sql {
                s if s == postgresql::LOCK => Some((false, false, false)),
                s if s == postgresql::LOCK_SHARED => Some((false, true, false)),
                s if s == postgresql::LOCK_XACT => Some((false, false, true)),
                s if s == postgresql::LOCK_XACT_SHARED => Some((false, true, true)),
                s if s == postgresql::TRY_LOCK => Some((true, false, false)),
                s if s == postgresql::TRY_LOCK_SHARED => Some((true, true, false)),
                s if s == postgresql::TRY_LOCK_XACT => Some((true, false, true)),
                s if s == postgresql::TRY_LOCK_XACT_SHARED => Some((true, true, true)),
                _ => None,
            }
        };
        if let Some((is_try, shared, xact)) = pg_variant(sql) {
            let key = int(&stmt.params[0]);
            let granted = pg_grant(&mut state, conn, key, shared, xact);
            return if is_try {
                Ok(Scalar::Bool(granted))
            } else if granted {
                Ok(Scalar::Null)
            } else {
                // the real function would block; tests must not get here
                Err("pg_advisory_lock would block in fake server".into())
            };
        }
        if sql == postgresql::UNLOCK {
            let key = int(&stmt.params[0]);
            let released = match state.pg.get_mut(&key) {
                Some(e) if !e.xact && e.exclusive == Some(conn) => {
                    e.exclusive = None;
                    true
                }
                _ => false,
            };
            state.pg.retain(|_, e| e.exclusive.is_some() || !e.shared.is_empty());
            return Ok(Scalar::Bool(released));
        }
        if sql == postgresql::UNLOCK_SHARED {
            let key = int(&stmt.params[0]);
            let released = match state.pg.get_mut(&key) {
                Some(e) if !e.xact => e.shared.remove(&conn),
                _ => false,
            };
            state.pg.retain(|_, e| e.exclusive.is_some() || !e.shared.is_empty());
            return Ok(Scalar::Bool(released));
        }

        // SQL Server application locks
        if sql == mssql::LOCK_EXCLUSIVE || sql == mssql::LOCK_SHARED || sql == mssql::LOCK_UPDATE {
            let resource = text(&stmt.params[0]);
            let e = state.mssql.entry(resource).or_default();
            let foreign = |owner: Option<ConnId>| owner.is_some_and(|o| o != conn);
            let granted = if sql == mssql::LOCK_EXCLUSIVE {
                if foreign(e.exclusive) || foreign(e.update) || e.shared.iter().any(|&o| o != conn) {
                    false
                } else {
                    e.exclusive = Some(conn);
                    true
                }
            } else if sql == mssql::LOCK_SHARED {
                if foreign(e.exclusive) {
                    false
                } else {
                    e.shared.insert(conn);
                    true
                }
            } else {
                if foreign(e.exclusive) || foreign(e.update) {
                    false
                } else {
                    e.update = Some(conn);
                    true
                }
            };
            return Ok(Scalar::Int(if granted { 0 } else { -1 }));
        }
        if sql == mssql::UNLOCK {
            let resource = text(&stmt.params[0]);
            let held = match state.mssql.get_mut(&resource) {
                Some(e) => {
                    let mut held = false;
                    if e.exclusive == Some(conn) {
                        e.exclusive = None;
                        held = true;
                    }
                    if e.update == Some(conn) {
                        e.update = None;
                        held = true;
                    }
                    held |= e.shared.remove(&conn);
                    held
                }
                None => false,
            };
            state
                .mssql
                .retain(|_, e| e.exclusive.is_some() || e.update.is_some() || !e.shared.is_empty());
            return if held {
                Ok(Scalar::Int(0))
            } else {
                // sp_releaseapplock raises when the session holds nothing
                Err("cannot release the application lock because it is not currently held".into())
            };
        }

        // Oracle DBMS_LOCK
        if sql == oracle::REQUEST {
            let id = int(&stmt.params[0]) as u32;
            let release_on_commit = int(&stmt.params[3]) != 0;
            return Ok(match state.oracle.get(&id) {
                Some(e) if e.owner == conn => Scalar::Int(4),
                Some(_) => Scalar::Int(1),
                None => {
                    state.oracle.insert(id, OracleEntry { owner: conn, release_on_commit });
                    Scalar::Int(0)
                }
            });
        }
        if sql == oracle::RELEASE {
            let id = int(&stmt.params[0]) as u32;
            return Ok(match state.oracle.get(&id) {
                Some(e) if e.owner == conn => {
                    state.oracle.remove(&id);
                    Scalar::Int(0)
                }
                _ => Scalar::Int(4),
            });
        }

        Err(format!("fake server does not understand statement: {sql}").into())
    }
}

fn pg_grant(state: &mut State, conn: ConnId, key: i64, shared: bool, xact: bool) -> bool {
    let e = state.pg.entry(key).or_default();
    if shared {
        if e.exclusive.is_some_and(|o| o != conn) {
            return false;
        }
        e.shared.insert(conn);
    } else {
        if e.exclusive.is_some_and(|o| o != conn) || e.shared.iter().any(|&o| o != conn) {
            return false;
        }
        e.exclusive = Some(conn);
    }
    e.xact = xact;
    true
}

fn text(param: &Param) -> String {
    match param {
        Param::Text(s) => s.clone(),
        other => panic!("expected text parameter, got {other:?}"),
    }
}

fn int(param: &Param) -> i64 {
    match param {
        Param::I64(i) => *i,
        Param::I32(i) => i64::from(*i),
        other => panic!("expected integer parameter, got {other:?}"),
    }
}

/// A connection to the [`FakeServer`], usable blocking and suspendable
pub struct FakeConnection {
    id: ConnId,
    dialect: String,
    server: Arc<FakeServer>,
}

impl FakeConnection {
    pub fn id(&self) -> ConnId {
        self.id
    }
}

impl Connection for FakeConnection {
    fn dialect_name(&self) -> &str {
        &self.dialect
    }

    fn execute(&mut self, stmt: &Statement) -> Result<Scalar, BoxError> {
        self.server.execute(self.id, stmt)
    }
}

#[async_trait]
impl AsyncConnection for FakeConnection {
    fn dialect_name(&self) -> &str {
        &self.dialect
    }

    async fn execute(&mut self, stmt: &Statement) -> Result<Scalar, BoxError> {
        self.server.execute(self.id, stmt)
    }
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        self.server.disconnect(self.id);
    }
}
