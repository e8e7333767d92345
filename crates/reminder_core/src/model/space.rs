//! Space domain model.
//!
//! A space is an organizational label for reminders. Removing one never
//! removes its reminders unless the caller asks for a cascading delete.

use crate::clock::EpochMs;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable space identifier.
pub type SpaceId = Uuid;

/// Validation failures for space records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpaceValidationError {
    NilId,
    EmptyName,
}

impl Display for SpaceValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "space id must not be nil"),
            Self::EmptyName => write!(f, "space name must not be blank"),
        }
    }
}

impl Error for SpaceValidationError {}

/// Canonical space record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub id: SpaceId,
    pub name: String,
    /// ARGB color value.
    pub color: u32,
    /// Opaque icon key understood by the host UI.
    pub icon: String,
    pub created_at: EpochMs,
}

impl Space {
    pub fn new(
        name: impl Into<String>,
        color: u32,
        icon: impl Into<String>,
        created_at: EpochMs,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color,
            icon: icon.into(),
            created_at,
        }
    }

    pub fn validate(&self) -> Result<(), SpaceValidationError> {
        if self.id.is_nil() {
            return Err(SpaceValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(SpaceValidationError::EmptyName);
        }
        Ok(())
    }
}
