use serde::{Deserialize, Serialize};

use certflow_core::{AggregateId, DomainError, DomainResult, Entity};

/// Stock location identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub AggregateId);

impl LocationId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for LocationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A warehouse location.
///
/// Locations flagged with `requires_certification` trigger service creation
/// for material arriving there, and gate material leaving them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    id: LocationId,
    name: String,
    requires_certification: bool,
}

impl Location {
    pub fn new(id: LocationId, name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("location name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            requires_certification: false,
        })
    }

    pub fn with_requires_certification(mut self, requires: bool) -> Self {
        self.requires_certification = requires;
        self
    }

    pub fn id_typed(&self) -> LocationId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requires_certification(&self) -> bool {
        self.requires_certification
    }
}

impl Entity for Location {
    type Id = LocationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
