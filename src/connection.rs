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

//! Connection boundary.
//!
//! The crate never opens, pools or closes connections. Callers adapt their
//! driver of choice to [`Connection`] (blocking) or [`AsyncConnection`]
//! (suspendable) and lend it to a lock handle for the handle's lifetime.
//! A handle issues at most one statement at a time on the borrowed
//! connection; the `&mut` borrow makes concurrent use impossible.

use async_trait::async_trait;

/// Boxed driver error crossing the connection boundary
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Statement parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Text(String),
    I32(i32),
    I64(i64),
}

/// A parameterized statement produced by the per-dialect templates in
/// [`crate::statements`].
///
/// `sql` is always one of the crate's template constants, so connection
/// implementations may dispatch on it by identity if they need to.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: &'static str,
    pub params: Vec<Param>,
}

impl Statement {
    pub fn new(sql: &'static str, params: Vec<Param>) -> Self {
        Self { sql, params }
    }
}

/// First-row, first-column result of a lock statement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    /// No rows, or a NULL value
    Null,
    Bool(bool),
    Int(i64),
}

impl Scalar {
    /// Truthiness of the scalar, `None` for NULL
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(b) => Some(*b),
            Scalar::Int(i) => Some(*i != 0),
        }
    }

    /// Integer value of the scalar, `None` for NULL or booleans
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => Some(*i),
            _ => None,
        }
    }
}

/// Blocking connection-like collaborator.
///
/// Implementations execute one parameterized statement and return the
/// scalar result of its first row. Errors are returned as-is; the adapter
/// layer wraps them into [`crate::LockError::Backend`] with the cause
/// preserved.
pub trait Connection {
    /// Dialect name this connection reports, e.g. `"postgresql"`.
    ///
    /// Used by the factory for registry lookup, never for SQL generation.
    fn dialect_name(&self) -> &str;

    /// Execute a statement and read the scalar result
    fn execute(&mut self, stmt: &Statement) -> std::result::Result<Scalar, BoxError>;
}

/// Suspendable variant of [`Connection`].
///
/// `execute` is a suspension point; a handle never runs two statements
/// concurrently on the same connection.
#[async_trait]
pub trait AsyncConnection: Send {
    /// Dialect name this connection reports, e.g. `"postgresql"`
    fn dialect_name(&self) -> &str;

    /// Execute a statement and read the scalar result
    async fn execute(&mut self, stmt: &Statement) -> std::result::Result<Scalar, BoxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_as_bool() {
        assert_eq!(Scalar::Null.as_bool(), None);
        assert_eq!(Scalar::Bool(true).as_bool(), Some(true));
        assert_eq!(Scalar::Int(0).as_bool(), Some(false));
        assert_eq!(Scalar::Int(-1).as_bool(), Some(true));
    }

    #[test]
    fn test_scalar_as_i64() {
        assert_eq!(Scalar::Null.as_i64(), None);
        assert_eq!(Scalar::Bool(true).as_i64(), None);
        assert_eq!(Scalar::Int(42).as_i64(), Some(42));
    }
}
