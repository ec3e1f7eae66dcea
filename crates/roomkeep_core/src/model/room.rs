//! Room aggregate domain model.
//!
//! # Responsibility
//! - Define the room record and its dependent bed/bathroom/picture lines.
//! - Define the read models returned to callers (`RoomView`, `RoomSummary`).
//! - Validate attribute ranges before persistence.
//!
//! # Invariants
//! - `room_id` is generated once by the store and never re-derived.
//! - `capacity >= 1` and `price` is finite and non-negative.
//! - `is_occupied` starts as `false` and is not changed by edits.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque room identifier.
pub type RoomId = String;

/// Generates a fresh collision-resistant room id.
pub fn new_room_id() -> RoomId {
    Uuid::new_v4().to_string()
}

/// Amenity flags stored as boolean columns on `rooms`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Amenities {
    pub has_wifi: bool,
    pub has_kitchen: bool,
    #[serde(rename = "hasTV")]
    pub has_tv: bool,
    pub has_shower: bool,
    pub has_aircon: bool,
    pub has_grill: bool,
    pub has_refrigerator: bool,
    pub has_heater: bool,
}

/// Column names for [`Amenities`], in [`Amenities::to_array`] order.
pub const AMENITY_COLUMNS: [&str; 8] = [
    "hasWifi",
    "hasKitchen",
    "hasTV",
    "hasShower",
    "hasAircon",
    "hasGrill",
    "hasRefrigerator",
    "hasHeater",
];

impl Amenities {
    pub fn to_array(self) -> [bool; 8] {
        [
            self.has_wifi,
            self.has_kitchen,
            self.has_tv,
            self.has_shower,
            self.has_aircon,
            self.has_grill,
            self.has_refrigerator,
            self.has_heater,
        ]
    }

    pub fn from_array(flags: [bool; 8]) -> Self {
        let [has_wifi, has_kitchen, has_tv, has_shower, has_aircon, has_grill, has_refrigerator, has_heater] =
            flags;
        Self {
            has_wifi,
            has_kitchen,
            has_tv,
            has_shower,
            has_aircon,
            has_grill,
            has_refrigerator,
            has_heater,
        }
    }
}

/// Canonical `rooms` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: RoomId,
    /// Owning user; existence is not checked by this crate.
    pub user_id: String,
    pub room_name: String,
    pub capacity: i64,
    pub room_type: String,
    pub price: f64,
    pub description: Option<String>,
    /// Attachment reference for the cover image.
    pub thumbnail: Option<String>,
    pub is_occupied: bool,
    pub amenities: Amenities,
}

impl Room {
    /// Checks attribute ranges shared by create and edit paths.
    pub fn validate(&self) -> Result<(), RoomValidationError> {
        // Text fields may be empty strings; only the generated id must not be.
        if self.room_id.trim().is_empty() {
            return Err(RoomValidationError::BlankField("roomId"));
        }
        if self.capacity < 1 {
            return Err(RoomValidationError::CapacityOutOfRange(self.capacity));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(RoomValidationError::InvalidPrice(self.price));
        }
        Ok(())
    }
}

/// One `roombed` row. Several lines may share a `bed_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedLine {
    pub bed_type: String,
    pub count: i64,
}

impl BedLine {
    pub fn validate(&self) -> Result<(), RoomValidationError> {
        if self.bed_type.trim().is_empty() {
            return Err(RoomValidationError::BlankField("bedType"));
        }
        if self.count < 1 {
            return Err(RoomValidationError::BedCountOutOfRange(self.count));
        }
        Ok(())
    }
}

/// One `roomBathroom` row. Read-only for this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BathroomLine {
    pub bath_room_type: String,
    pub count: i64,
}

/// Full single-room read model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    #[serde(flatten)]
    pub room: Room,
    pub bed_details: Vec<BedLine>,
    pub bathroom_details: Vec<BathroomLine>,
    pub pictures: Vec<String>,
}

/// Lightweight list projection: no bed, bathroom or amenity data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub room_name: String,
    pub user_id: String,
    pub capacity: i64,
    pub price: f64,
    pub thumbnail: Option<String>,
    pub is_occupied: bool,
    pub pictures: Vec<String>,
}

/// Result envelope for create and edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMutation {
    pub message: String,
    pub room_id: RoomId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoomValidationError {
    BlankField(&'static str),
    CapacityOutOfRange(i64),
    InvalidPrice(f64),
    BedCountOutOfRange(i64),
}

impl Display for RoomValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
            Self::CapacityOutOfRange(value) => {
                write!(f, "`capacity` must be at least 1, got {value}")
            }
            Self::InvalidPrice(value) => {
                write!(f, "`price` must be a non-negative number, got {value}")
            }
            Self::BedCountOutOfRange(value) => {
                write!(f, "bed `count` must be at least 1, got {value}")
            }
        }
    }
}

impl Error for RoomValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_room() -> Room {
        Room {
            room_id: new_room_id(),
            user_id: "u1".to_string(),
            room_name: "Ocean View".to_string(),
            capacity: 2,
            room_type: "suite".to_string(),
            price: 150.0,
            description: None,
            thumbnail: None,
            is_occupied: false,
            amenities: Amenities::default(),
        }
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(new_room_id(), new_room_id());
    }

    #[test]
    fn amenities_array_order_matches_columns() {
        let amenities = Amenities {
            has_tv: true,
            has_heater: true,
            ..Amenities::default()
        };
        let flags = amenities.to_array();
        assert!(flags[2]);
        assert!(flags[7]);
        assert_eq!(AMENITY_COLUMNS[2], "hasTV");
        assert_eq!(Amenities::from_array(flags), amenities);
    }

    #[test]
    fn amenities_use_wire_names() {
        let json = serde_json::to_value(Amenities {
            has_tv: true,
            ..Amenities::default()
        })
        .unwrap();
        assert_eq!(json["hasTV"], true);
        assert_eq!(json["hasWifi"], false);
        assert_eq!(json["hasRefrigerator"], false);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut room = sample_room();
        room.validate().unwrap();

        room.capacity = 0;
        assert_eq!(
            room.validate(),
            Err(RoomValidationError::CapacityOutOfRange(0))
        );

        room.capacity = 1;
        room.price = -1.0;
        assert!(matches!(
            room.validate(),
            Err(RoomValidationError::InvalidPrice(_))
        ));

        room.price = 0.0;
        room.room_id = String::new();
        assert_eq!(
            room.validate(),
            Err(RoomValidationError::BlankField("roomId"))
        );
    }

    #[test]
    fn validate_accepts_empty_text_fields() {
        let mut room = sample_room();
        room.room_name = String::new();
        room.room_type = String::new();
        room.user_id = String::new();
        assert_eq!(room.validate(), Ok(()));
    }

    #[test]
    fn room_view_flattens_room_fields() {
        let view = RoomView {
            room: sample_room(),
            bed_details: vec![BedLine {
                bed_type: "queen".to_string(),
                count: 1,
            }],
            bathroom_details: Vec::new(),
            pictures: Vec::new(),
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["roomName"], "Ocean View");
        assert_eq!(json["isOccupied"], false);
        assert_eq!(json["amenities"]["hasWifi"], false);
        assert_eq!(json["bedDetails"][0]["bedType"], "queen");
        assert_eq!(json["bedDetails"][0]["count"], 1);
    }
}
