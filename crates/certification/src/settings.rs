use serde::{Deserialize, Serialize};

use certflow_core::{DomainError, DomainResult, ValueObject};
use certflow_uom::UnitOfMeasure;

/// Readings generated per element when a service is seeded.
pub const DEFAULT_REQUIRED_READING_COUNT: u32 = 5;

/// Maximum percentage deviation from the labeled value for an element to pass.
pub const DEFAULT_PASS_THRESHOLD_PERCENT: f64 = 10.0;

/// Certification configuration, passed explicitly into every computation.
///
/// The reading unit of measure is a company-wide inventory setting; it must be
/// configured before results can be computed. The pass threshold is kept here
/// rather than hard-coded: the acceptable deviation is a business decision
/// that has been revised before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationSettings {
    reading_uom: Option<UnitOfMeasure>,
    required_reading_count: u32,
    pass_threshold_percent: f64,
}

impl CertificationSettings {
    pub fn new(reading_uom: UnitOfMeasure) -> Self {
        Self {
            reading_uom: Some(reading_uom),
            required_reading_count: DEFAULT_REQUIRED_READING_COUNT,
            pass_threshold_percent: DEFAULT_PASS_THRESHOLD_PERCENT,
        }
    }

    pub fn with_required_reading_count(mut self, count: u32) -> Self {
        self.required_reading_count = count;
        self
    }

    pub fn with_pass_threshold_percent(mut self, threshold: f64) -> Self {
        self.pass_threshold_percent = threshold;
        self
    }

    /// The configured reading unit, or a configuration error if unset.
    pub fn reading_uom(&self) -> DomainResult<&UnitOfMeasure> {
        self.reading_uom.as_ref().ok_or_else(|| {
            DomainError::configuration(
                "define the unit of measure for readings in the inventory settings before proceeding",
            )
        })
    }

    pub fn required_reading_count(&self) -> u32 {
        self.required_reading_count
    }

    pub fn pass_threshold_percent(&self) -> f64 {
        self.pass_threshold_percent
    }
}

impl Default for CertificationSettings {
    /// Settings with no reading unit configured yet.
    fn default() -> Self {
        Self {
            reading_uom: None,
            required_reading_count: DEFAULT_REQUIRED_READING_COUNT,
            pass_threshold_percent: DEFAULT_PASS_THRESHOLD_PERCENT,
        }
    }
}

impl ValueObject for CertificationSettings {}
