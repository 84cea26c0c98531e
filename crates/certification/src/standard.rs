use serde::{Deserialize, Serialize};

use certflow_core::{AggregateId, DomainError, DomainResult, Entity};

use crate::element::Element;
use crate::lot::LotId;

/// In-house standard identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StandardId(pub AggregateId);

impl StandardId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for StandardId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A reference calibration record.
///
/// Every certification service must reference at least one standard before it
/// can progress; the same standard may back several services. The reference
/// readings are free-text notations taken from the calibration sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InHouseStandard {
    id: StandardId,
    element: Element,
    /// The reference lot the standard was calibrated against.
    lot_id: LotId,
    initial_reading: String,
    subsequent: Option<String>,
}

impl InHouseStandard {
    pub fn new(
        id: StandardId,
        element: Element,
        lot_id: LotId,
        initial_reading: impl Into<String>,
    ) -> DomainResult<Self> {
        let initial_reading = initial_reading.into();
        if initial_reading.trim().is_empty() {
            return Err(DomainError::validation(
                "standard initial reading cannot be empty",
            ));
        }
        Ok(Self {
            id,
            element,
            lot_id,
            initial_reading,
            subsequent: None,
        })
    }

    pub fn with_subsequent(mut self, subsequent: impl Into<String>) -> Self {
        self.subsequent = Some(subsequent.into());
        self
    }

    pub fn id_typed(&self) -> StandardId {
        self.id
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn name(&self) -> &str {
        self.element.name()
    }

    pub fn lot_id(&self) -> LotId {
        self.lot_id
    }

    pub fn initial_reading(&self) -> &str {
        &self.initial_reading
    }

    pub fn subsequent(&self) -> Option<&str> {
        self.subsequent.as_deref()
    }
}

impl Entity for InHouseStandard {
    type Id = StandardId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
