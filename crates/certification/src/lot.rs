use serde::{Deserialize, Serialize};

use certflow_core::{AggregateId, DomainError, DomainResult, Entity, ValueObject};
use certflow_uom::UnitOfMeasure;

use crate::element::{Element, ElementId};

/// Serialized lot identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotId(pub AggregateId);

impl LotId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for LotId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Manufacturer identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManufacturerId(pub AggregateId);

impl ManufacturerId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ManufacturerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// The manufacturer that declared a lot's labeled values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    id: ManufacturerId,
    name: String,
}

impl Manufacturer {
    pub fn new(id: ManufacturerId, name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("manufacturer name cannot be empty"));
        }
        Ok(Self { id, name })
    }

    pub fn id_typed(&self) -> ManufacturerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for Manufacturer {
    type Id = ManufacturerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Manufacturer-declared reference measurement for one element on a lot.
///
/// Ground truth for the certification evaluation. The optional second
/// value/unit pair carries an alternative notation from the label (purity vs.
/// concentration, for instance); it does not participate in the evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledValue {
    sequence: u32,
    element: Element,
    value: f64,
    uom: UnitOfMeasure,
    second_value: Option<f64>,
    second_uom: Option<UnitOfMeasure>,
}

impl LabeledValue {
    pub fn new(sequence: u32, element: Element, value: f64, uom: UnitOfMeasure) -> Self {
        Self {
            sequence,
            element,
            value,
            uom,
            second_value: None,
            second_uom: None,
        }
    }

    pub fn with_second(mut self, value: f64, uom: UnitOfMeasure) -> Self {
        self.second_value = Some(value);
        self.second_uom = Some(uom);
        self
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn uom(&self) -> &UnitOfMeasure {
        &self.uom
    }

    pub fn second_value(&self) -> Option<f64> {
        self.second_value
    }

    pub fn second_uom(&self) -> Option<&UnitOfMeasure> {
        self.second_uom.as_ref()
    }
}

impl ValueObject for LabeledValue {}

/// A serialized/traceable batch of a physical product, carrying the labeled
/// values used as ground truth when certifying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    id: LotId,
    serial: String,
    manufacturer: Option<Manufacturer>,
    labeled_values: Vec<LabeledValue>,
}

impl Lot {
    pub fn new(id: LotId, serial: impl Into<String>) -> DomainResult<Self> {
        let serial = serial.into();
        if serial.trim().is_empty() {
            return Err(DomainError::validation("lot serial cannot be empty"));
        }
        Ok(Self {
            id,
            serial,
            manufacturer: None,
            labeled_values: Vec::new(),
        })
    }

    pub fn with_manufacturer(mut self, manufacturer: Manufacturer) -> Self {
        self.manufacturer = Some(manufacturer);
        self
    }

    /// Attach labeled values; they are kept ordered by display sequence.
    pub fn with_labeled_values(mut self, mut values: Vec<LabeledValue>) -> Self {
        values.sort_by_key(LabeledValue::sequence);
        self.labeled_values = values;
        self
    }

    pub fn id_typed(&self) -> LotId {
        self.id
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn manufacturer(&self) -> Option<&Manufacturer> {
        self.manufacturer.as_ref()
    }

    pub fn labeled_values(&self) -> &[LabeledValue] {
        &self.labeled_values
    }

    /// First labeled value declared for `element`, if any.
    pub fn labeled_value_for(&self, element: ElementId) -> Option<&LabeledValue> {
        self.labeled_values
            .iter()
            .find(|lv| lv.element().id_typed() == element)
    }

    /// Elements selectable for a certification of this lot: those the label
    /// declares a value for, deduplicated, in label sequence order.
    pub fn selectable_elements(&self) -> Vec<Element> {
        let mut seen: Vec<ElementId> = Vec::new();
        let mut elements = Vec::new();
        for lv in &self.labeled_values {
            let id = lv.element().id_typed();
            if !seen.contains(&id) {
                seen.push(id);
                elements.push(lv.element().clone());
            }
        }
        elements
    }
}

impl Entity for Lot {
    type Id = LotId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
