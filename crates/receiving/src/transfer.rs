use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use certflow_core::{AggregateId, DomainError, DomainResult, Entity};

use certflow_certification::{GroupId, Lot, MoveLineId, ProductId};

use crate::location::Location;

/// Stock transfer identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(pub AggregateId);

impl TransferId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for TransferId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Transfer lifecycle as seen by the certification gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferState {
    Draft,
    Done,
}

/// One product/lot movement within a stock transfer.
///
/// The serviced lot is the serialized batch to certify; it carries the labeled
/// values the certification will be evaluated against. `origin_line_ids`
/// point at the lines of the preceding transfer in a chained route, so that
/// leaving a certification location can be gated on their services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferLine {
    id: MoveLineId,
    name: String,
    product_id: Option<ProductId>,
    service_lot: Option<Lot>,
    group_id: Option<GroupId>,
    source_location: Location,
    dest_location: Location,
    planned_qty: f64,
    done_qty: f64,
    origin_line_ids: Vec<MoveLineId>,
    date_calibration: Option<NaiveDate>,
    date_received: Option<DateTime<Utc>>,
}

impl TransferLine {
    pub fn new(
        id: MoveLineId,
        name: impl Into<String>,
        source_location: Location,
        dest_location: Location,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("move line name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            product_id: None,
            service_lot: None,
            group_id: None,
            source_location,
            dest_location,
            planned_qty: 0.0,
            done_qty: 0.0,
            origin_line_ids: Vec::new(),
            date_calibration: None,
            date_received: None,
        })
    }

    pub fn with_product(mut self, product_id: ProductId) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn with_service_lot(mut self, lot: Lot) -> Self {
        self.service_lot = Some(lot);
        self
    }

    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_planned_qty(mut self, qty: f64) -> Self {
        self.planned_qty = qty;
        self
    }

    pub fn with_origin_lines(mut self, origin_line_ids: Vec<MoveLineId>) -> Self {
        self.origin_line_ids = origin_line_ids;
        self
    }

    pub fn with_date_calibration(mut self, date: NaiveDate) -> Self {
        self.date_calibration = Some(date);
        self
    }

    pub fn with_date_received(mut self, date: DateTime<Utc>) -> Self {
        self.date_received = Some(date);
        self
    }

    pub fn id_typed(&self) -> MoveLineId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn product_id(&self) -> Option<ProductId> {
        self.product_id
    }

    pub fn service_lot(&self) -> Option<&Lot> {
        self.service_lot.as_ref()
    }

    pub fn group_id(&self) -> Option<GroupId> {
        self.group_id
    }

    pub fn source_location(&self) -> &Location {
        &self.source_location
    }

    pub fn dest_location(&self) -> &Location {
        &self.dest_location
    }

    pub fn planned_qty(&self) -> f64 {
        self.planned_qty
    }

    pub fn done_qty(&self) -> f64 {
        self.done_qty
    }

    pub fn set_done_qty(&mut self, qty: f64) {
        self.done_qty = qty;
    }

    pub fn origin_line_ids(&self) -> &[MoveLineId] {
        &self.origin_line_ids
    }

    pub fn date_calibration(&self) -> Option<NaiveDate> {
        self.date_calibration
    }

    pub fn date_received(&self) -> Option<DateTime<Utc>> {
        self.date_received
    }

    /// The line arrives at a location that requires certification.
    pub fn requires_certification(&self) -> bool {
        self.dest_location.requires_certification()
    }

    /// The line leaves a location that requires certification.
    pub fn leaves_certification_location(&self) -> bool {
        self.source_location.requires_certification()
    }
}

impl Entity for TransferLine {
    type Id = MoveLineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A stock transfer: a batch of move lines validated as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    id: TransferId,
    state: TransferState,
    lines: Vec<TransferLine>,
}

impl Transfer {
    pub fn new(id: TransferId) -> Self {
        Self {
            id,
            state: TransferState::Draft,
            lines: Vec::new(),
        }
    }

    pub fn with_lines(mut self, lines: Vec<TransferLine>) -> Self {
        self.lines = lines;
        self
    }

    pub fn id_typed(&self) -> TransferId {
        self.id
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == TransferState::Done
    }

    pub fn lines(&self) -> &[TransferLine] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut [TransferLine] {
        &mut self.lines
    }

    pub(crate) fn mark_done(&mut self) {
        self.state = TransferState::Done;
    }
}

impl Entity for Transfer {
    type Id = TransferId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
