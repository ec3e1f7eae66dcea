//! Room aggregate use-case service.
//!
//! # Responsibility
//! - Validate create payloads and merge edit payloads field by field.
//! - Resolve uploaded files to attachment references.
//! - Map repository failures onto the caller-facing error taxonomy.
//!
//! # Invariants
//! - Supplied patch values always win, absent ones keep stored values.
//! - A supplied bed-details value that fails to decode fails the edit.
//! - Attachments are resolved before any statement is issued.
//! - `Display` output never includes raw storage-engine messages; causes
//!   stay reachable through `Error::source`.

use crate::attachment::{AttachmentError, AttachmentResolver, RoomUploads};
use crate::db::DbError;
use crate::model::input::{decode_bed_details, BedDetailsError, CreateRoomInput, RoomPatch};
use crate::model::room::{
    new_room_id, BedLine, Room, RoomId, RoomMutation, RoomSummary, RoomValidationError, RoomView,
};
use crate::repo::room_repo::{BedWrite, RoomRepoError, RoomRepository, RoomUpdate};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub const ROOM_CREATED_MESSAGE: &str = "Room created successfully";
pub const ROOM_UPDATED_MESSAGE: &str = "Room updated successfully";
pub const ROOM_DELETED_MESSAGE: &str = "Room deleted successfully";

/// Effect of supplied bed details on an edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BedDetailsPolicy {
    /// New lines are added; existing lines are kept.
    #[default]
    Append,
    /// Existing lines are deleted and the supplied set is inserted.
    Replace,
}

/// Caller-facing error for room use-cases.
#[derive(Debug)]
pub enum RoomServiceError {
    /// No room row matches the id.
    NotFound(RoomId),
    /// Payload is missing a required field or holds an invalid value.
    InvalidInput(String),
    /// Delete transaction failed and was rolled back.
    DeletionFailed {
        room_id: RoomId,
        source: RoomRepoError,
    },
    /// Storage could not serve the request.
    StoreUnavailable(RoomRepoError),
}

impl Display for RoomServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(room_id) => write!(f, "room not found: {room_id}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::DeletionFailed { room_id, .. } => {
                write!(f, "failed to delete room {room_id}; no rows were removed")
            }
            Self::StoreUnavailable(_) => write!(f, "room store is unavailable"),
        }
    }
}

impl Error for RoomServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DeletionFailed { source, .. } => Some(source),
            Self::StoreUnavailable(source) => Some(source),
            _ => None,
        }
    }
}

impl From<RoomRepoError> for RoomServiceError {
    fn from(value: RoomRepoError) -> Self {
        match value {
            RoomRepoError::NotFound(room_id) => Self::NotFound(room_id),
            other => Self::StoreUnavailable(other),
        }
    }
}

impl From<DbError> for RoomServiceError {
    fn from(value: DbError) -> Self {
        Self::StoreUnavailable(RoomRepoError::Db(value))
    }
}

impl From<RoomValidationError> for RoomServiceError {
    fn from(value: RoomValidationError) -> Self {
        Self::InvalidInput(value.to_string())
    }
}

impl From<BedDetailsError> for RoomServiceError {
    fn from(value: BedDetailsError) -> Self {
        Self::InvalidInput(value.to_string())
    }
}

impl From<AttachmentError> for RoomServiceError {
    fn from(value: AttachmentError) -> Self {
        Self::InvalidInput(value.to_string())
    }
}

impl RoomServiceError {
    /// Stable machine-readable code for logs and API mapping.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::DeletionFailed { .. } => "deletion_failed",
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

pub type RoomServiceResult<T> = Result<T, RoomServiceError>;

/// Room service facade over a repository and an attachment resolver.
pub struct RoomService<R: RoomRepository, A: AttachmentResolver> {
    repo: R,
    attachments: A,
    bed_policy: BedDetailsPolicy,
}

impl<R: RoomRepository, A: AttachmentResolver> RoomService<R, A> {
    /// Creates a service with the default bed policy (`Append`).
    pub fn new(repo: R, attachments: A) -> Self {
        Self {
            repo,
            attachments,
            bed_policy: BedDetailsPolicy::default(),
        }
    }

    pub fn with_bed_policy(mut self, bed_policy: BedDetailsPolicy) -> Self {
        self.bed_policy = bed_policy;
        self
    }

    /// Lists every room with its pictures.
    pub fn list_rooms(&self) -> RoomServiceResult<Vec<RoomSummary>> {
        self.repo.list_rooms().map_err(Into::into)
    }

    /// Loads the full aggregate view of one room.
    pub fn get_room(&self, room_id: &str) -> RoomServiceResult<RoomView> {
        self.repo
            .get_room(room_id)?
            .ok_or_else(|| RoomServiceError::NotFound(room_id.to_string()))
    }

    /// Creates a room with its bed lines and pictures.
    ///
    /// # Contract
    /// - `roomName`, `userId`, `capacity`, `roomType`, `price` are required.
    /// - Missing amenity flags are stored as `false`; `isOccupied` is `false`.
    /// - Absent bed details create no bed lines.
    /// - Room, beds and pictures are written in one transaction.
    pub fn create_room(
        &self,
        input: CreateRoomInput,
        uploads: &RoomUploads,
    ) -> RoomServiceResult<RoomMutation> {
        let started_at = Instant::now();
        info!("event=room_create module=service status=start");

        let result = self.create_room_inner(input, uploads);
        log_mutation("room_create", started_at, &result);
        result
    }

    /// Applies a partial update to an existing room.
    ///
    /// # Contract
    /// - Absent fields keep their stored values.
    /// - `userId` and `isOccupied` are never changed.
    /// - Supplied bed details follow the configured [`BedDetailsPolicy`].
    /// - Supplied pictures replace the stored set; otherwise it is kept.
    /// - A new thumbnail replaces the stored reference; otherwise it is kept.
    pub fn edit_room(
        &self,
        room_id: &str,
        patch: RoomPatch,
        uploads: &RoomUploads,
    ) -> RoomServiceResult<RoomMutation> {
        let started_at = Instant::now();
        info!("event=room_edit module=service status=start room_id={room_id}");

        let result = self.edit_room_inner(room_id, patch, uploads);
        log_mutation("room_edit", started_at, &result);
        result
    }

    /// Deletes a room and every dependent line in one transaction.
    ///
    /// Unknown ids succeed without touching any row.
    pub fn delete_room(&self, room_id: &str) -> RoomServiceResult<&'static str> {
        let started_at = Instant::now();
        info!("event=room_delete module=service status=start room_id={room_id}");

        match self.repo.delete_room(room_id) {
            Ok(()) => {
                info!(
                    "event=room_delete module=service status=ok room_id={} duration_ms={}",
                    room_id,
                    started_at.elapsed().as_millis()
                );
                Ok(ROOM_DELETED_MESSAGE)
            }
            Err(source) => {
                error!(
                    "event=room_delete module=service status=error room_id={} duration_ms={} error_code=deletion_failed error={}",
                    room_id,
                    started_at.elapsed().as_millis(),
                    source
                );
                Err(RoomServiceError::DeletionFailed {
                    room_id: room_id.to_string(),
                    source,
                })
            }
        }
    }

    fn create_room_inner(
        &self,
        input: CreateRoomInput,
        uploads: &RoomUploads,
    ) -> RoomServiceResult<RoomMutation> {
        let beds = match input.bed_details.as_ref() {
            Some(raw) => decode_bed_details(raw.as_str())?,
            None => Vec::new(),
        };

        let room = Room {
            room_id: new_room_id(),
            user_id: required(input.user_id, "userId")?,
            room_name: required(input.room_name, "roomName")?,
            capacity: required(input.capacity, "capacity")?,
            room_type: required(input.room_type, "roomType")?,
            price: required(input.price, "price")?,
            description: input.description,
            thumbnail: self.resolve_thumbnail(uploads)?,
            is_occupied: false,
            amenities: input.amenities,
        };
        room.validate()?;

        let pictures = self.resolve_pictures(uploads)?;
        self.repo.create_room(&room, &beds, &pictures)?;

        Ok(RoomMutation {
            message: ROOM_CREATED_MESSAGE.to_string(),
            room_id: room.room_id,
        })
    }

    fn edit_room_inner(
        &self,
        room_id: &str,
        patch: RoomPatch,
        uploads: &RoomUploads,
    ) -> RoomServiceResult<RoomMutation> {
        let current = self.get_room(room_id)?.room;
        let amenities = patch.resolve_amenities(current.amenities);

        let new_beds: Option<Vec<BedLine>> = patch
            .bed_details
            .as_ref()
            .map(|raw| decode_bed_details(raw.as_str()))
            .into_option()
            .transpose()?;

        let thumbnail = match self.resolve_thumbnail(uploads)? {
            Some(reference) => Some(reference),
            None => current.thumbnail.clone(),
        };

        let merged = Room {
            room_name: patch.room_name.resolve(current.room_name),
            capacity: patch.capacity.resolve(current.capacity),
            description: patch.description.resolve(current.description),
            room_type: patch.room_type.resolve(current.room_type),
            price: patch.price.resolve(current.price),
            amenities,
            thumbnail,
            ..current
        };
        merged.validate()?;

        let pictures = if uploads.pictures.is_empty() {
            None
        } else {
            Some(self.resolve_pictures(uploads)?)
        };

        let beds = match (new_beds.as_deref(), self.bed_policy) {
            (None, _) => BedWrite::Keep,
            (Some(lines), BedDetailsPolicy::Append) => BedWrite::Append(lines),
            (Some(lines), BedDetailsPolicy::Replace) => BedWrite::Replace(lines),
        };

        self.repo.update_room(&RoomUpdate {
            room: &merged,
            beds,
            pictures: pictures.as_deref(),
        })?;

        Ok(RoomMutation {
            message: ROOM_UPDATED_MESSAGE.to_string(),
            room_id: merged.room_id,
        })
    }

    fn resolve_thumbnail(&self, uploads: &RoomUploads) -> RoomServiceResult<Option<String>> {
        uploads
            .thumbnail
            .as_ref()
            .map(|file| self.attachments.resolve(file))
            .transpose()
            .map_err(Into::into)
    }

    fn resolve_pictures(&self, uploads: &RoomUploads) -> RoomServiceResult<Vec<String>> {
        uploads
            .pictures
            .iter()
            .map(|file| self.attachments.resolve(file).map_err(Into::into))
            .collect()
    }
}

fn required<T>(value: Option<T>, field: &str) -> RoomServiceResult<T> {
    value.ok_or_else(|| RoomServiceError::InvalidInput(format!("missing required field `{field}`")))
}

fn log_mutation(event: &str, started_at: Instant, result: &RoomServiceResult<RoomMutation>) {
    match result {
        Ok(mutation) => info!(
            "event={} module=service status=ok room_id={} duration_ms={}",
            event,
            mutation.room_id,
            started_at.elapsed().as_millis()
        ),
        Err(err @ RoomServiceError::InvalidInput(_)) => warn!(
            "event={} module=service status=error duration_ms={} error_code={} error={}",
            event,
            started_at.elapsed().as_millis(),
            err.code(),
            err
        ),
        Err(err) => error!(
            "event={} module=service status=error duration_ms={} error_code={} error={} cause={}",
            event,
            started_at.elapsed().as_millis(),
            err.code(),
            err,
            err.source()
                .map_or_else(|| "none".to_string(), |cause| cause.to_string())
        ),
    }
}
