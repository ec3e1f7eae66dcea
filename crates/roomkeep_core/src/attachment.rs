//! Attachment reference resolution for uploaded room images.
//!
//! # Responsibility
//! - Turn files already stored by the upload handler into stable references.
//!
//! # Invariants
//! - References are opaque to the room store and persisted verbatim.
//! - Resolution never touches file contents.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// File delivered by the upload handler, already written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Location assigned by the upload handler.
    pub path: PathBuf,
    /// Client-side file name, if the handler kept it.
    pub original_name: Option<String>,
}

impl UploadedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            original_name: None,
        }
    }
}

/// Files attached to one create or edit request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomUploads {
    /// Zero or more gallery pictures.
    pub pictures: Vec<UploadedFile>,
    /// Optional cover image.
    pub thumbnail: Option<UploadedFile>,
}

impl RoomUploads {
    pub fn is_empty(&self) -> bool {
        self.pictures.is_empty() && self.thumbnail.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentError {
    /// Upload handler produced an empty path.
    EmptyPath,
    /// Stored path cannot be represented as UTF-8 text.
    NonUtf8Path(PathBuf),
}

impl Display for AttachmentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPath => write!(f, "uploaded file has an empty storage path"),
            Self::NonUtf8Path(path) => {
                write!(f, "uploaded file path is not valid UTF-8: {}", path.display())
            }
        }
    }
}

impl Error for AttachmentError {}

/// Maps one uploaded file to the reference stored in the room tables.
pub trait AttachmentResolver {
    fn resolve(&self, file: &UploadedFile) -> Result<String, AttachmentError>;
}

impl<T: AttachmentResolver + ?Sized> AttachmentResolver for &T {
    fn resolve(&self, file: &UploadedFile) -> Result<String, AttachmentError> {
        (**self).resolve(file)
    }
}

/// Uses the upload handler's storage path as the reference, optionally
/// rewritten under a public base URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredPathResolver {
    base_uri: Option<String>,
}

impl StoredPathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_uri(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: Some(base_uri.into()),
        }
    }
}

impl AttachmentResolver for StoredPathResolver {
    fn resolve(&self, file: &UploadedFile) -> Result<String, AttachmentError> {
        let path = file
            .path
            .to_str()
            .ok_or_else(|| AttachmentError::NonUtf8Path(file.path.clone()))?;
        if path.trim().is_empty() {
            return Err(AttachmentError::EmptyPath);
        }

        // Forward slashes only; references must not depend on the host OS.
        let normalized = path.replace('\\', "/");
        Ok(match self.base_uri.as_deref() {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                normalized.trim_start_matches('/')
            ),
            None => normalized,
        })
    }
}
