//! Room store: the dependency-injected entry point for room operations.
//!
//! # Responsibility
//! - Own a shared [`ConnectionPool`] handle and an attachment resolver.
//! - Check out one pooled connection per operation and run the room service on it.
//!
//! # Invariants
//! - The store never creates global state; callers construct and close it.
//! - A connection is held only for the duration of one operation.

use crate::attachment::{AttachmentResolver, RoomUploads, StoredPathResolver};
use crate::config::StoreConfig;
use crate::db::{ConnectionPool, DbResult, PoolOptions};
use crate::model::input::{CreateRoomInput, RoomPatch};
use crate::model::room::{RoomMutation, RoomSummary, RoomView};
use crate::repo::room_repo::SqliteRoomRepository;
use crate::service::room_service::{BedDetailsPolicy, RoomService, RoomServiceResult};
use std::sync::Arc;

/// Room aggregate store bound to one pool.
pub struct RoomStore<A: AttachmentResolver = StoredPathResolver> {
    pool: Arc<ConnectionPool>,
    attachments: A,
    bed_policy: BedDetailsPolicy,
}

impl RoomStore<StoredPathResolver> {
    /// Opens the pool described by `config` and builds a store on it.
    pub fn open(config: &StoreConfig) -> DbResult<Self> {
        let pool = ConnectionPool::open(
            &config.db_path,
            PoolOptions {
                capacity: config.pool_capacity,
                busy_timeout: config.busy_timeout(),
                checkout_timeout: config.checkout_timeout(),
            },
        )?;
        let attachments = match config.attachment_base_uri.as_deref() {
            Some(base_uri) => StoredPathResolver::with_base_uri(base_uri),
            None => StoredPathResolver::new(),
        };

        Ok(Self::new(Arc::new(pool), attachments).with_bed_policy(config.bed_policy))
    }
}

impl<A: AttachmentResolver> RoomStore<A> {
    pub fn new(pool: Arc<ConnectionPool>, attachments: A) -> Self {
        Self {
            pool,
            attachments,
            bed_policy: BedDetailsPolicy::default(),
        }
    }

    pub fn with_bed_policy(mut self, bed_policy: BedDetailsPolicy) -> Self {
        self.bed_policy = bed_policy;
        self
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Lists every room with its pictures.
    pub fn list_rooms(&self) -> RoomServiceResult<Vec<RoomSummary>> {
        self.with_service(|service| service.list_rooms())
    }

    /// Loads one room aggregate.
    pub fn get_room(&self, room_id: &str) -> RoomServiceResult<RoomView> {
        self.with_service(|service| service.get_room(room_id))
    }

    /// Creates a room aggregate and returns its generated id.
    pub fn create_room(
        &self,
        input: CreateRoomInput,
        uploads: &RoomUploads,
    ) -> RoomServiceResult<RoomMutation> {
        self.with_service(|service| service.create_room(input, uploads))
    }

    /// Applies a partial update to one room aggregate.
    pub fn edit_room(
        &self,
        room_id: &str,
        patch: RoomPatch,
        uploads: &RoomUploads,
    ) -> RoomServiceResult<RoomMutation> {
        self.with_service(|service| service.edit_room(room_id, patch, uploads))
    }

    /// Deletes one room aggregate atomically.
    pub fn delete_room(&self, room_id: &str) -> RoomServiceResult<&'static str> {
        self.with_service(|service| service.delete_room(room_id))
    }

    /// Closes the underlying pool. Other stores sharing it are closed too.
    pub fn close(self) {
        self.pool.close();
    }

    fn with_service<T>(
        &self,
        operation: impl FnOnce(&RoomService<SqliteRoomRepository<'_>, &A>) -> RoomServiceResult<T>,
    ) -> RoomServiceResult<T> {
        let conn = self.pool.get()?;
        let repo = SqliteRoomRepository::try_new(&conn)?;
        let service = RoomService::new(repo, &self.attachments).with_bed_policy(self.bed_policy);
        operation(&service)
    }
}
