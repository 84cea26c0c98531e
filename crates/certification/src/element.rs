use serde::{Deserialize, Serialize};

use certflow_core::{AggregateId, DomainError, DomainResult, Entity};

/// Certification element identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub AggregateId);

impl ElementId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ElementId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A physical/chemical property measured during certification (e.g. a metal
/// content, a particle size).
///
/// `density` is free text: operators record "n/a" for elements where density
/// does not apply, so a numeric field would be too strict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    id: ElementId,
    name: String,
    short_name: String,
    density: String,
}

impl Element {
    pub fn new(
        id: ElementId,
        name: impl Into<String>,
        short_name: impl Into<String>,
        density: impl Into<String>,
    ) -> DomainResult<Self> {
        let name = name.into();
        let short_name = short_name.into();
        let density = density.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("element name cannot be empty"));
        }
        if short_name.trim().is_empty() {
            return Err(DomainError::validation("element short name cannot be empty"));
        }
        if density.trim().is_empty() {
            return Err(DomainError::validation("element density cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            short_name,
            density,
        })
    }

    pub fn id_typed(&self) -> ElementId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn density(&self) -> &str {
        &self.density
    }
}

impl Entity for Element {
    type Id = ElementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
