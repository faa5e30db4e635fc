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

//! Dialect registry.
//!
//! Explicit, immutable lookup tables from dialect to adapter constructor,
//! populated at first use. Static tables keep dispatch auditable and make
//! unsupported dialects fail fast; there is deliberately no runtime
//! registration.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::adapter::{Adapter, AsyncAdapter, MssqlLock, MysqlLock, OracleLock, PostgresLock};
use crate::config::LockOptions;
use crate::error::{LockError, Result};
use crate::key::NormalizedKey;
use crate::types::Dialect;

type AdapterCtor = fn(NormalizedKey, &LockOptions) -> Result<Box<dyn Adapter>>;
type AsyncAdapterCtor = fn(NormalizedKey, &LockOptions) -> Result<Box<dyn AsyncAdapter>>;

static ADAPTERS: Lazy<HashMap<Dialect, AdapterCtor>> = Lazy::new(|| {
    HashMap::from([
        (Dialect::Mysql, mysql as AdapterCtor),
        (Dialect::Postgres, postgresql as AdapterCtor),
        (Dialect::Mssql, mssql as AdapterCtor),
        (Dialect::Oracle, oracle as AdapterCtor),
    ])
});

static ASYNC_ADAPTERS: Lazy<HashMap<Dialect, AsyncAdapterCtor>> = Lazy::new(|| {
    HashMap::from([
        (Dialect::Mysql, mysql_async as AsyncAdapterCtor),
        (Dialect::Postgres, postgresql_async as AsyncAdapterCtor),
        (Dialect::Mssql, mssql_async as AsyncAdapterCtor),
        (Dialect::Oracle, oracle_async as AsyncAdapterCtor),
    ])
});

fn mysql(key: NormalizedKey, options: &LockOptions) -> Result<Box<dyn Adapter>> {
    Ok(Box::new(MysqlLock::from_options(key, options)?))
}

fn postgresql(key: NormalizedKey, options: &LockOptions) -> Result<Box<dyn Adapter>> {
    Ok(Box::new(PostgresLock::from_options(key, options)?))
}

fn mssql(key: NormalizedKey, options: &LockOptions) -> Result<Box<dyn Adapter>> {
    Ok(Box::new(MssqlLock::from_options(key, options)?))
}

fn oracle(key: NormalizedKey, options: &LockOptions) -> Result<Box<dyn Adapter>> {
    Ok(Box::new(OracleLock::from_options(key, options)?))
}

fn mysql_async(key: NormalizedKey, options: &LockOptions) -> Result<Box<dyn AsyncAdapter>> {
    Ok(Box::new(MysqlLock::from_options(key, options)?))
}

fn postgresql_async(key: NormalizedKey, options: &LockOptions) -> Result<Box<dyn AsyncAdapter>> {
    Ok(Box::new(PostgresLock::from_options(key, options)?))
}

fn mssql_async(key: NormalizedKey, options: &LockOptions) -> Result<Box<dyn AsyncAdapter>> {
    Ok(Box::new(MssqlLock::from_options(key, options)?))
}

fn oracle_async(key: NormalizedKey, options: &LockOptions) -> Result<Box<dyn AsyncAdapter>> {
    Ok(Box::new(OracleLock::from_options(key, options)?))
}

/// Resolve the dialect a connection reports
pub fn resolve_dialect(name: &str) -> Result<Dialect> {
    Dialect::from_name(name).ok_or_else(|| LockError::unsupported_dialect(name))
}

/// Construct the blocking adapter for a dialect
pub(crate) fn adapter(dialect: Dialect, key: NormalizedKey, options: &LockOptions) -> Result<Box<dyn Adapter>> {
    let ctor = ADAPTERS
        .get(&dialect)
        .ok_or_else(|| LockError::unsupported_dialect(dialect.as_str()))?;
    ctor(key, options)
}

/// Construct the suspendable adapter for a dialect
pub(crate) fn async_adapter(dialect: Dialect, key: NormalizedKey, options: &LockOptions) -> Result<Box<dyn AsyncAdapter>> {
    let ctor = ASYNC_ADAPTERS
        .get(&dialect)
        .ok_or_else(|| LockError::unsupported_dialect(dialect.as_str()))?;
    ctor(key, options)
}
