//! Result evaluation: the decision procedure at the heart of certification.
//!
//! Readings are grouped per element and averaged; each average is compared
//! against the lot's labeled value, converted into the configured reading
//! unit, and the percentage deviation decides pass or fail. Evaluation is a
//! pure function: it never mutates the service, so a failed precondition
//! leaves no trace.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use certflow_core::{DomainError, DomainResult, ValueObject};

use crate::element::{Element, ElementId};
use crate::lot::LabeledValue;
use crate::reading::Reading;
use crate::settings::CertificationSettings;

/// Pass/fail classification of one element result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultState {
    Pass,
    Fail,
}

/// Evaluation outcome for one element of a certification service.
///
/// Results are a derived, disposable cache: recomputation always rebuilds the
/// full set from the current readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementResult {
    /// Display sequence inherited from the labeled value (0 without a label).
    sequence: u32,
    element: Element,
    average: f64,
    diff_from_label: f64,
    percent_diff_from_label: f64,
    state: ResultState,
}

impl ElementResult {
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn name(&self) -> &str {
        self.element.name()
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    pub fn diff_from_label(&self) -> f64 {
        self.diff_from_label
    }

    pub fn percent_diff_from_label(&self) -> f64 {
        self.percent_diff_from_label
    }

    pub fn state(&self) -> ResultState {
        self.state
    }

    pub fn is_fail(&self) -> bool {
        self.state == ResultState::Fail
    }
}

impl ValueObject for ElementResult {}

/// Service-level pass: at least one result and no failures.
pub fn overall_pass(results: &[ElementResult]) -> bool {
    !results.is_empty() && !results.iter().any(ElementResult::is_fail)
}

struct Accumulator {
    element: Element,
    sum: f64,
    count: u32,
}

/// Evaluate `readings` against the lot's `labels` under `settings`.
///
/// Returns one result per distinct element present in the reading set,
/// ordered by label sequence. Fails with a configuration error when the
/// reading unit is unset, and with a validation error naming the first
/// element that has fewer than the required number of readings. On failure
/// nothing is produced; the caller's result set stays untouched.
pub fn evaluate(
    readings: &[Reading],
    labels: &[LabeledValue],
    settings: &CertificationSettings,
) -> DomainResult<Vec<ElementResult>> {
    let reading_uom = settings.reading_uom()?;

    // Accumulate sum/count per element, keeping first-appearance order.
    let mut order: Vec<ElementId> = Vec::new();
    let mut groups: HashMap<ElementId, Accumulator> = HashMap::new();
    for reading in readings {
        let id = reading.element().id_typed();
        let entry = groups.entry(id).or_insert_with(|| {
            order.push(id);
            Accumulator {
                element: reading.element().clone(),
                sum: 0.0,
                count: 0,
            }
        });
        entry.sum += reading.value();
        entry.count += 1;
    }

    let required = settings.required_reading_count();
    for id in &order {
        let group = &groups[id];
        if group.count < required {
            return Err(DomainError::validation(format!(
                "element {} has fewer than {} readings",
                group.element.name(),
                required
            )));
        }
    }

    let mut results = Vec::with_capacity(order.len());
    for id in &order {
        let group = &groups[id];
        let average = group.sum / f64::from(group.count);

        let mut sequence = 0;
        let mut label = 0.0;
        let mut diff = 0.0;
        if let Some(lv) = labels.iter().find(|lv| lv.element().id_typed() == *id) {
            sequence = lv.sequence();
            // Label converted into the reading unit, unrounded.
            label = lv.uom().convert(lv.value(), reading_uom, false)?;
            diff = (average - label).abs();
        }

        let percent_diff_from_label = if label != 0.0 {
            diff / label * 100.0
        } else {
            0.0
        };

        let state = if percent_diff_from_label < settings.pass_threshold_percent() {
            ResultState::Pass
        } else {
            ResultState::Fail
        };

        results.push(ElementResult {
            sequence,
            element: group.element.clone(),
            average,
            diff_from_label: diff,
            percent_diff_from_label,
            state,
        });
    }

    results.sort_by_key(ElementResult::sequence);
    Ok(results)
}
