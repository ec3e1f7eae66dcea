//! Inbound payload shapes for room create and edit.
//!
//! # Responsibility
//! - Describe request fields as delivered by the HTTP layer (camelCase).
//! - Carry bed details as raw JSON text so presence is decided before decode.
//! - Decode bed details into validated [`BedLine`] values.

use super::patch::Patch;
use super::room::{Amenities, BedLine};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// JSON-encoded composite field, kept in serialized form.
///
/// Multipart forms deliver bed details as a JSON string; JSON bodies may
/// inline the array. Both deserialize to the same raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawJson(pub String);

impl RawJson {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for RawJson {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for RawJson {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(text) => Ok(Self(text)),
            serde_json::Value::Null => Err(D::Error::custom("bed details must not be null")),
            other => Ok(Self(other.to_string())),
        }
    }
}

/// Create payload. Required fields are optional here so that a missing
/// field is reported as invalid input rather than a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateRoomInput {
    pub room_name: Option<String>,
    pub user_id: Option<String>,
    pub capacity: Option<i64>,
    pub room_type: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub bed_details: Option<RawJson>,
    /// Flags not present in the payload default to `false`.
    #[serde(flatten)]
    pub amenities: Amenities,
}

/// Edit payload. Every field is independently optional.
///
/// `userId` is intentionally absent: ownership is not editable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomPatch {
    pub room_name: Patch<String>,
    pub capacity: Patch<i64>,
    pub description: Patch<Option<String>>,
    pub room_type: Patch<String>,
    pub price: Patch<f64>,
    pub bed_details: Patch<RawJson>,
    pub has_wifi: Patch<bool>,
    pub has_kitchen: Patch<bool>,
    #[serde(rename = "hasTV")]
    pub has_tv: Patch<bool>,
    pub has_shower: Patch<bool>,
    pub has_aircon: Patch<bool>,
    pub has_grill: Patch<bool>,
    pub has_refrigerator: Patch<bool>,
    pub has_heater: Patch<bool>,
}

impl RoomPatch {
    /// Merges amenity flags against the stored set.
    pub fn resolve_amenities(&self, existing: Amenities) -> Amenities {
        Amenities {
            has_wifi: self.has_wifi.resolve(existing.has_wifi),
            has_kitchen: self.has_kitchen.resolve(existing.has_kitchen),
            has_tv: self.has_tv.resolve(existing.has_tv),
            has_shower: self.has_shower.resolve(existing.has_shower),
            has_aircon: self.has_aircon.resolve(existing.has_aircon),
            has_grill: self.has_grill.resolve(existing.has_grill),
            has_refrigerator: self.has_refrigerator.resolve(existing.has_refrigerator),
            has_heater: self.has_heater.resolve(existing.has_heater),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BedEntry {
    bed_type: String,
    #[serde(alias = "count")]
    bed_count: i64,
}

/// Bed details payload could not be decoded or holds invalid entries.
#[derive(Debug)]
pub enum BedDetailsError {
    Malformed(serde_json::Error),
    InvalidEntry { index: usize, message: String },
}

impl Display for BedDetailsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(err) => write!(f, "malformed bed details: {err}"),
            Self::InvalidEntry { index, message } => {
                write!(f, "invalid bed details entry {index}: {message}")
            }
        }
    }
}

impl Error for BedDetailsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Malformed(err) => Some(err),
            Self::InvalidEntry { .. } => None,
        }
    }
}

/// Decodes a JSON array of `{bedType, bedCount}` entries.
///
/// `count` is accepted as an alias of `bedCount`, which is the shape the
/// read model emits.
pub fn decode_bed_details(raw: &str) -> Result<Vec<BedLine>, BedDetailsError> {
    let entries: Vec<BedEntry> = serde_json::from_str(raw).map_err(BedDetailsError::Malformed)?;
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let line = BedLine {
                bed_type: entry.bed_type,
                count: entry.bed_count,
            };
            line.validate()
                .map_err(|err| BedDetailsError::InvalidEntry {
                    index,
                    message: err.to_string(),
                })?;
            Ok(line)
        })
        .collect()
}
