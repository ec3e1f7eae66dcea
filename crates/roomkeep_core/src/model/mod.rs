//! Room aggregate domain model and inbound payload shapes.
//!
//! # Responsibility
//! - Define canonical data structures used by room business logic.
//! - Model partial updates with explicit field presence.
//!
//! # Invariants
//! - A room and its bed, bathroom and picture lines form one aggregate
//!   identified by `RoomId`.

pub mod input;
pub mod patch;
pub mod room;
