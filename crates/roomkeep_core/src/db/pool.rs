//! Bounded SQLite connection pool over `r2d2`.
//!
//! # Responsibility
//! - Open configured connections to one database file lazily, up to capacity.
//! - Apply pending migrations once, before the first checkout.
//! - Reject checkouts after the pool is closed.
//!
//! # Invariants
//! - `opened <= capacity` at all times.
//! - Waiters are not capped; each waits at most the checkout timeout.
//! - After `close()` every checkout fails with `DbError::PoolClosed`.

use super::migrations::apply_migrations;
use super::open::{configure_connection, DEFAULT_BUSY_TIMEOUT};
use super::{DbError, DbResult};
use log::{debug, info, warn};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Default maximum number of simultaneously open connections.
pub const DEFAULT_POOL_CAPACITY: usize = 10;

/// Default upper bound on how long one checkout waits for a free connection.
pub const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection checked out from a [`ConnectionPool`]; returns to it on drop.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Construction options for [`ConnectionPool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    /// Maximum number of open connections. Must be >= 1.
    pub capacity: usize,
    /// Per-connection SQLite busy timeout.
    pub busy_timeout: Duration,
    /// How long `get()` waits while every connection is checked out.
    pub checkout_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_POOL_CAPACITY,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            checkout_timeout: DEFAULT_CHECKOUT_TIMEOUT,
        }
    }
}

/// Point-in-time pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub capacity: usize,
    pub opened: usize,
    pub idle: usize,
    pub closed: bool,
}

/// Process-wide pool of connections to one SQLite database file.
pub struct ConnectionPool {
    path: PathBuf,
    inner: Pool<SqliteConnectionManager>,
    closed: AtomicBool,
}

impl ConnectionPool {
    /// Builds the pool and runs migrations on its first connection.
    ///
    /// A pool that constructs successfully points at a usable schema.
    pub fn open(path: impl AsRef<Path>, options: PoolOptions) -> DbResult<Self> {
        if options.capacity == 0 {
            return Err(DbError::InvalidPoolOptions(
                "capacity must be at least 1".to_string(),
            ));
        }
        let max_size = u32::try_from(options.capacity).map_err(|_| {
            DbError::InvalidPoolOptions(format!("capacity {} is too large", options.capacity))
        })?;

        let path = path.as_ref().to_path_buf();
        let busy_timeout = options.busy_timeout;
        let manager = SqliteConnectionManager::file(&path)
            .with_init(move |conn| configure_connection(conn, busy_timeout));
        let inner = Pool::builder()
            .max_size(max_size)
            .min_idle(Some(0))
            .connection_timeout(options.checkout_timeout)
            .build(manager)?;

        {
            let mut conn = inner.get()?;
            apply_migrations(&mut conn)?;
        }
        info!(
            "event=pool_open module=db status=ok capacity={}",
            options.capacity
        );

        Ok(Self {
            path,
            inner,
            closed: AtomicBool::new(false),
        })
    }

    /// Checks out one connection, waiting while the pool is exhausted.
    pub fn get(&self) -> DbResult<PooledConnection> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DbError::PoolClosed);
        }
        debug!("event=pool_checkout module=db status=start");
        self.inner.get().map_err(|err| {
            warn!(
                "event=pool_checkout module=db status=error error_code=pool_checkout_failed error={}",
                err
            );
            DbError::Pool(err)
        })
    }

    /// Closes the pool for new checkouts. Connections already checked out
    /// stay usable until dropped.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("event=pool_close module=db status=ok");
        }
    }

    pub fn status(&self) -> PoolStatus {
        let state = self.inner.state();
        PoolStatus {
            capacity: self.inner.max_size() as usize,
            opened: state.connections as usize,
            idle: state.idle_connections as usize,
            closed: self.closed.load(Ordering::Acquire),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
