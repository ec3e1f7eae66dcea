//! Field-level merge-patch values.
//!
//! # Invariants
//! - `Supplied` always wins over the stored value, including `false`, `0`
//!   and empty strings.
//! - A field missing from an incoming payload deserializes as `Absent`.
//! - An explicit JSON `null` for a nullable field is `Supplied(None)`.

use serde::{Deserialize, Deserializer};

/// Incoming value for one attribute of a partial update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Patch<T> {
    /// Caller did not send the field; keep the stored value.
    Absent,
    /// Caller sent a value; persist it.
    Supplied(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> Patch<T> {
    /// Picks the value to persist given the currently stored one.
    pub fn resolve(self, existing: T) -> T {
        match self {
            Self::Absent => existing,
            Self::Supplied(value) => value,
        }
    }

    pub fn is_supplied(&self) -> bool {
        matches!(self, Self::Supplied(_))
    }

    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Self::Absent => Patch::Absent,
            Self::Supplied(value) => Patch::Supplied(value),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Self::Absent => Patch::Absent,
            Self::Supplied(value) => Patch::Supplied(f(value)),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Absent => None,
            Self::Supplied(value) => Some(value),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Self::Supplied)
    }
}
