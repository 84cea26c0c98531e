//! Measurement units of measure.
//!
//! Quantities in this suite are recorded against a unit of measure and may be
//! converted between units of the same category (mass, concentration, ...).
//! Conversion is factor-based against the category's reference unit, with
//! optional precision rounding.

pub mod unit;

pub use unit::{float_round, UnitOfMeasure, UomCategoryId, UomId};
