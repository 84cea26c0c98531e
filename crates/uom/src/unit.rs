use serde::{Deserialize, Serialize};

use certflow_core::{AggregateId, DomainError, DomainResult, Entity};

/// Unit-of-measure identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UomId(pub AggregateId);

impl UomId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for UomId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Identifier of a unit category (mass, concentration, ...).
///
/// Units are only convertible within one category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UomCategoryId(pub AggregateId);

impl UomCategoryId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for UomCategoryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Round `value` to a precision step (e.g. 0.01), half away from zero.
pub fn float_round(value: f64, precision: f64) -> f64 {
    if precision <= 0.0 {
        return value;
    }
    (value / precision).round() * precision
}

/// A unit of measure.
///
/// `factor` expresses how many of this unit make up one reference unit of its
/// category (the reference unit has factor 1.0). `rounding` is the precision
/// step quantities in this unit are rounded to when rounding is requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitOfMeasure {
    id: UomId,
    name: String,
    category_id: UomCategoryId,
    factor: f64,
    rounding: f64,
}

impl UnitOfMeasure {
    pub fn new(
        id: UomId,
        name: impl Into<String>,
        category_id: UomCategoryId,
        factor: f64,
        rounding: f64,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("unit name cannot be empty"));
        }
        if !(factor > 0.0) {
            return Err(DomainError::validation("unit factor must be positive"));
        }
        if !(rounding > 0.0) {
            return Err(DomainError::validation("unit rounding must be positive"));
        }
        Ok(Self {
            id,
            name,
            category_id,
            factor,
            rounding,
        })
    }

    /// The reference unit of a category: factor 1.0, default precision 0.01.
    pub fn reference(
        id: UomId,
        name: impl Into<String>,
        category_id: UomCategoryId,
    ) -> DomainResult<Self> {
        Self::new(id, name, category_id, 1.0, 0.01)
    }

    pub fn id_typed(&self) -> UomId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category_id(&self) -> UomCategoryId {
        self.category_id
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn rounding(&self) -> f64 {
        self.rounding
    }

    /// Convert `value` expressed in `self` into `to`.
    ///
    /// Both units must belong to the same category. When `round` is false the
    /// raw converted value is returned; otherwise it is rounded to the target
    /// unit's precision.
    pub fn convert(&self, value: f64, to: &UnitOfMeasure, round: bool) -> DomainResult<f64> {
        if self.category_id != to.category_id {
            return Err(DomainError::validation(format!(
                "cannot convert between units of different categories ({} -> {})",
                self.name, to.name
            )));
        }

        let mut converted = value;
        if self.id != to.id {
            converted = value / self.factor * to.factor;
        }

        if round {
            converted = float_round(converted, to.rounding);
        }
        Ok(converted)
    }
}

impl Entity for UnitOfMeasure {
    type Id = UomId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
