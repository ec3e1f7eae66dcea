//! Room aggregate persistence for the lodging admin backend.
//! This crate is the single source of truth for room aggregate invariants.

pub mod attachment;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use attachment::{
    AttachmentError, AttachmentResolver, RoomUploads, StoredPathResolver, UploadedFile,
};
pub use config::{ConfigError, StoreConfig, ENV_PREFIX};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::input::{decode_bed_details, BedDetailsError, CreateRoomInput, RawJson, RoomPatch};
pub use model::patch::Patch;
pub use model::room::{
    Amenities, BathroomLine, BedLine, Room, RoomId, RoomMutation, RoomSummary,
    RoomValidationError, RoomView,
};
pub use repo::room_repo::{
    BedWrite, RoomRepoError, RoomRepoResult, RoomRepository, RoomUpdate, SqliteRoomRepository,
};
pub use service::room_service::{
    BedDetailsPolicy, RoomService, RoomServiceError, RoomServiceResult, ROOM_CREATED_MESSAGE,
    ROOM_DELETED_MESSAGE, ROOM_UPDATED_MESSAGE,
};
pub use store::RoomStore;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
