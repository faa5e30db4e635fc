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

//! Distributed locks backed by the native locking primitives of SQL databases.
//!
//! A lock handle is bound to a single borrowed database connection. The
//! database server itself arbitrates exclusivity, so every process that
//! shares the same database observes a consistent lock state:
//!
//! * MySQL / MariaDB: `GET_LOCK()` named locks
//! * PostgreSQL: advisory locks (session or transaction scope)
//! * SQL Server: `sp_getapplock` application locks
//! * Oracle: `DBMS_LOCK.REQUEST` user locks
//!
//! The crate never manages connections, pools or transactions. Callers
//! supply a connection through the [`Connection`] / [`AsyncConnection`]
//! boundary traits and receive a [`DbLock`] / [`AsyncDbLock`] handle from
//! [`create_lock`] / [`create_async_lock`].

// ============================================================================
// Core Module Declarations
// ============================================================================

// Dialect layer
pub mod adapter;
pub mod statements;

// Lock handle layer
pub mod lock;
pub mod lock_async;

// Dispatch layer
pub mod factory;
pub mod registry;

// Core modules
pub mod config;
pub mod connection;
pub mod error;
pub mod key;
pub mod types;

// ============================================================================
// Public API Exports
// ============================================================================

pub use crate::{
    // Dialect adapters
    adapter::{Adapter, AsyncAdapter, ReleaseOutcome},
    // Handle configuration
    config::LockOptions,
    // Connection boundary
    connection::{AsyncConnection, BoxError, Connection, Param, Scalar, Statement},
    // Error types
    error::{LockError, Result},
    // Lock handle construction
    factory::{create_async_lock, create_lock},
    key::{LockKey, NormalizedKey},
    // Lock handles
    lock::DbLock,
    lock_async::AsyncDbLock,
    // Core types
    types::{Dialect, LockMode, LockState},
};

// ============================================================================
// Version Information
// ============================================================================

/// Current version of the lock crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
