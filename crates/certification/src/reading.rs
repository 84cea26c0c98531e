use serde::{Deserialize, Serialize};

use certflow_core::ValueObject;

use crate::element::Element;

/// A single measurement of one element taken during a certification service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    sequence: u32,
    element: Element,
    value: f64,
}

impl Reading {
    pub fn new(sequence: u32, element: Element, value: f64) -> Self {
        Self {
            sequence,
            element,
            value,
        }
    }

    /// A freshly generated reading: zero-valued, awaiting measurement.
    pub fn zero(sequence: u32, element: Element) -> Self {
        Self::new(sequence, element, 0.0)
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

    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    /// Display label, e.g. `[Copper] 97.2`.
    pub fn display_name(&self) -> String {
        format!("[{}] {}", self.element.name(), self.value)
    }
}

impl ValueObject for Reading {}
