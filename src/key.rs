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

//! Key normalization.
//!
//! Converts a caller-supplied lock key into the identifier shape a dialect
//! requires. Normalization is deterministic: the same key against the same
//! dialect always yields the same identifier, in every process. That is what
//! lets two processes naming the same logical resource target the same
//! database-level lock.

use blake2::digest::consts::U8;
use blake2::{Blake2b, Digest};

use crate::error::{LockError, Result};
use crate::types::Dialect;

/// Maximum length of a MySQL lock name
pub const MYSQL_NAME_MAX_LENGTH: usize = 64;

/// Maximum length of a SQL Server lock resource name
pub const MSSQL_RESOURCE_MAX_LENGTH: usize = 255;

/// Smallest valid Oracle user lock id
pub const ORACLE_LOCK_ID_MIN: i64 = 0;

/// Largest valid Oracle user lock id
pub const ORACLE_LOCK_ID_MAX: i64 = 1_073_741_823;

type Blake2b64 = Blake2b<U8>;

/// Caller-supplied lock key, an opaque string or a native integer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LockKey {
    Str(String),
    Int(i64),
}

impl From<&str> for LockKey {
    fn from(s: &str) -> Self {
        LockKey::Str(s.to_owned())
    }
}

impl From<String> for LockKey {
    fn from(s: String) -> Self {
        LockKey::Str(s)
    }
}

impl From<i64> for LockKey {
    fn from(i: i64) -> Self {
        LockKey::Int(i)
    }
}

impl From<i32> for LockKey {
    fn from(i: i32) -> Self {
        LockKey::Int(i64::from(i))
    }
}

impl From<u32> for LockKey {
    fn from(i: u32) -> Self {
        LockKey::Int(i64::from(i))
    }
}

impl std::fmt::Display for LockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockKey::Str(s) => f.write_str(s),
            LockKey::Int(i) => write!(f, "{i}"),
        }
    }
}

/// Dialect-specific identifier derived from a [`LockKey`]
///
/// Computed once at handle construction and immutable for the handle's
/// lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NormalizedKey {
    /// Bounded UTF-8 name (MySQL, SQL Server)
    Text(String),
    /// Signed 64-bit advisory lock key (PostgreSQL)
    Int64(i64),
    /// User lock id in `[0, 1073741823]` (Oracle)
    OracleId(u32),
}

impl std::fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalizedKey::Text(s) => f.write_str(s),
            NormalizedKey::Int64(i) => write!(f, "{i}"),
            NormalizedKey::OracleId(i) => write!(f, "{i}"),
        }
    }
}

/// Normalize a key into the identifier space of `dialect`.
///
/// String keys narrowed to an integer space are folded through an 8-byte
/// BLAKE2b digest, read little-endian so the result does not depend on the
/// host byte order. Integer keys are passed through unchanged when they fit
/// the target range and rejected with [`LockError::KeyRange`] otherwise.
pub fn normalize(key: &LockKey, dialect: Dialect) -> Result<NormalizedKey> {
    match dialect {
        Dialect::Mysql => text_key(key, MYSQL_NAME_MAX_LENGTH, dialect).map(NormalizedKey::Text),
        Dialect::Mssql => text_key(key, MSSQL_RESOURCE_MAX_LENGTH, dialect).map(NormalizedKey::Text),
        Dialect::Postgres => match key {
            // every i64 is a valid advisory lock key
            LockKey::Int(i) => Ok(NormalizedKey::Int64(*i)),
            LockKey::Str(s) => Ok(NormalizedKey::Int64(hash64(s.as_bytes()) as i64)),
        },
        Dialect::Oracle => match key {
            LockKey::Int(i) => {
                if (ORACLE_LOCK_ID_MIN..=ORACLE_LOCK_ID_MAX).contains(i) {
                    Ok(NormalizedKey::OracleId(*i as u32))
                } else {
                    Err(LockError::key_range(*i, ORACLE_LOCK_ID_MIN, ORACLE_LOCK_ID_MAX))
                }
            }
            LockKey::Str(s) => {
                let folded = hash64(s.as_bytes()) % (ORACLE_LOCK_ID_MAX as u64 + 1);
                Ok(NormalizedKey::OracleId(folded as u32))
            }
        },
    }
}

fn text_key(key: &LockKey, max: usize, dialect: Dialect) -> Result<String> {
    let name = match key {
        LockKey::Str(s) => s.clone(),
        LockKey::Int(i) => i.to_string(),
    };
    let length = name.chars().count();
    if length > max {
        return Err(LockError::key_too_long(length, max, dialect));
    }
    Ok(name)
}

fn hash64(data: &[u8]) -> u64 {
    let digest: [u8; 8] = Blake2b64::digest(data).into();
    u64::from_le_bytes(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_determinism() {
        for dialect in [Dialect::Mysql, Dialect::Postgres, Dialect::Mssql, Dialect::Oracle] {
            let key = LockKey::from("jobs/batch-42");
            let a = normalize(&key, dialect).unwrap();
            let b = normalize(&key, dialect).unwrap();
            assert_eq!(a, b, "{dialect} normalization must be deterministic");
        }
    }

    #[test]
    fn test_distinct_string_keys_do_not_collide() {
        let mut pg = HashSet::new();
        let mut oracle = HashSet::new();
        for i in 0..5000 {
            let key = LockKey::from(format!("resource-{i}"));
            pg.insert(normalize(&key, Dialect::Postgres).unwrap());
            oracle.insert(normalize(&key, Dialect::Oracle).unwrap());
        }
        assert_eq!(pg.len(), 5000);
        // the Oracle space is 2^30, a few collisions in 5000 draws would
        // already be suspicious
        assert!(oracle.len() >= 4999, "unexpected collision rate: {}", oracle.len());
    }

    #[test]
    fn test_postgres_integer_passthrough() {
        for i in [0i64, 1, -1, i64::MAX, i64::MIN] {
            let got = normalize(&LockKey::Int(i), Dialect::Postgres).unwrap();
            assert_eq!(got, NormalizedKey::Int64(i));
        }
    }

    #[test]
    fn test_oracle_integer_range() {
        assert_eq!(
            normalize(&LockKey::Int(0), Dialect::Oracle).unwrap(),
            NormalizedKey::OracleId(0)
        );
        assert_eq!(
            normalize(&LockKey::Int(ORACLE_LOCK_ID_MAX), Dialect::Oracle).unwrap(),
            NormalizedKey::OracleId(ORACLE_LOCK_ID_MAX as u32)
        );
        assert!(matches!(
            normalize(&LockKey::Int(ORACLE_LOCK_ID_MAX + 1), Dialect::Oracle),
            Err(LockError::KeyRange { .. })
        ));
        assert!(matches!(
            normalize(&LockKey::Int(-1), Dialect::Oracle),
            Err(LockError::KeyRange { .. })
        ));
    }

    #[test]
    fn test_text_length_limits() {
        let long = "x".repeat(MYSQL_NAME_MAX_LENGTH + 1);
        assert!(matches!(
            normalize(&LockKey::from(long.as_str()), Dialect::Mysql),
            Err(LockError::KeyTooLong { max: 64, .. })
        ));
        // the very same key is fine where it is hashed instead
        assert!(normalize(&LockKey::from(long.as_str()), Dialect::Postgres).is_ok());
        assert!(normalize(&LockKey::from(long.as_str()), Dialect::Oracle).is_ok());

        let long = "x".repeat(MSSQL_RESOURCE_MAX_LENGTH + 1);
        assert!(matches!(
            normalize(&LockKey::from(long.as_str()), Dialect::Mssql),
            Err(LockError::KeyTooLong { max: 255, .. })
        ));
        // 255 chars is exactly at the limit
        let exact = "x".repeat(MSSQL_RESOURCE_MAX_LENGTH);
        assert!(normalize(&LockKey::from(exact.as_str()), Dialect::Mssql).is_ok());
    }

    #[test]
    fn test_integer_keys_render_as_text_for_name_dialects() {
        assert_eq!(
            normalize(&LockKey::Int(42), Dialect::Mysql).unwrap(),
            NormalizedKey::Text("42".to_owned())
        );
        assert_eq!(
            normalize(&LockKey::Int(-7), Dialect::Mssql).unwrap(),
            NormalizedKey::Text("-7".to_owned())
        );
    }

    #[test]
    fn test_oracle_hash_inside_range() {
        for i in 0..1000 {
            let key = LockKey::from(format!("k{i}"));
            match normalize(&key, Dialect::Oracle).unwrap() {
                NormalizedKey::OracleId(id) => assert!(i64::from(id) <= ORACLE_LOCK_ID_MAX),
                other => panic!("unexpected identifier {other:?}"),
            }
        }
    }
}
