//! SQLite storage bootstrap, schema migrations and the shared connection pool.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the room store.
//! - Apply schema migrations in deterministic order.
//! - Hand out pooled connections to request handlers.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Room data must not be read or written before migrations succeed.
//! - The pool never holds more than its configured capacity of connections.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
pub mod pool;

pub use open::{open_db, open_db_in_memory, open_db_with_timeout, DEFAULT_BUSY_TIMEOUT};
pub use pool::{
    ConnectionPool, PoolOptions, PoolStatus, PooledConnection, DEFAULT_CHECKOUT_TIMEOUT,
};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Pool could not hand out a connection in time or failed to open one.
    Pool(r2d2::Error),
    /// Pool was asked for a connection after `close()`.
    PoolClosed,
    /// Pool options are unusable, e.g. zero capacity.
    InvalidPoolOptions(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Pool(err) => write!(f, "connection pool error: {err}"),
            Self::PoolClosed => write!(f, "connection pool is closed"),
            Self::InvalidPoolOptions(message) => write!(f, "invalid pool options: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Pool(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::PoolClosed => None,
            Self::InvalidPoolOptions(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<r2d2::Error> for DbError {
    fn from(value: r2d2::Error) -> Self {
        Self::Pool(value)
    }
}
