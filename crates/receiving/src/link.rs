use chrono::Utc;
use tracing::{debug, info};

use certflow_certification::{
    CertificationService, CertificationSettings, CreateService, Lot, MoveLineId, ServiceCommand,
    ServiceId,
};
use certflow_core::{Aggregate, AggregateId, DomainError, DomainResult, TenantId};

use crate::store::ServiceStore;
use crate::transfer::{Transfer, TransferLine};

/// Display name of a generated service: serial, labeled values, manufacturer.
fn service_display_name(lot: &Lot) -> String {
    let values = lot
        .labeled_values()
        .iter()
        .map(|lv| format!("{} {} {}", lv.element().name(), lv.value(), lv.uom().name()))
        .collect::<Vec<_>>()
        .join(" - ");
    let manufacturer = lot
        .manufacturer()
        .map(|m| m.name())
        .unwrap_or_default();
    format!("{} {} / {}", lot.serial(), values, manufacturer)
}

/// The certification side of the receiving workflow.
///
/// Owns the two contracts the stock transfer workflow relies on: generating a
/// certification service when material arrives at a certification location,
/// and gating transfer completion on the services being done.
pub struct CertificationLink<S> {
    store: S,
}

impl<S: ServiceStore> CertificationLink<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a certification service for `line`, exactly once per line.
    ///
    /// No-op (returns `None`) when the line's destination does not require
    /// certification, when the line lacks a product, a serviced lot or a
    /// procurement group, or when a service for the line already exists. The
    /// created service is seeded with `required_reading_count` readings per
    /// selectable element of the lot.
    pub fn generate_certification_service(
        &self,
        tenant_id: TenantId,
        line: &TransferLine,
        settings: &CertificationSettings,
    ) -> DomainResult<Option<ServiceId>> {
        if !line.requires_certification() {
            return Ok(None);
        }
        let (Some(product_id), Some(lot), Some(group_id)) =
            (line.product_id(), line.service_lot(), line.group_id())
        else {
            debug!(line = %line.id_typed(), "line not eligible for certification");
            return Ok(None);
        };

        if self
            .store
            .find_by_move_line(tenant_id, line.id_typed())?
            .is_some()
        {
            debug!(line = %line.id_typed(), "certification service already exists");
            return Ok(None);
        }

        let service_id = ServiceId::new(AggregateId::new());
        let command = ServiceCommand::CreateService(CreateService {
            tenant_id,
            service_id,
            name: service_display_name(lot),
            product_id,
            lot_id: lot.id_typed(),
            move_line_id: line.id_typed(),
            group_id,
            elements: lot.selectable_elements(),
            required_reading_count: settings.required_reading_count(),
            date_calibration: line.date_calibration(),
            date_received: line.date_received(),
            occurred_at: Utc::now(),
        });

        let service = CertificationService::empty(service_id);
        let events = service.handle(&command)?;
        self.store.append(tenant_id, service_id, events)?;

        info!(
            service = %service_id,
            line = %line.id_typed(),
            lot = %lot.serial(),
            "generated certification service"
        );
        Ok(Some(service_id))
    }

    /// True when no services exist for `move_line_ids`, or all existing ones
    /// are done. Gates transfer completion.
    pub fn certification_services_done(
        &self,
        tenant_id: TenantId,
        move_line_ids: &[MoveLineId],
    ) -> DomainResult<bool> {
        let services = self.store.find_by_move_lines(tenant_id, move_line_ids)?;
        Ok(services.iter().all(CertificationService::is_done))
    }

    /// Validate a transfer against the certification workflow.
    ///
    /// - An empty transfer is rejected.
    /// - Lines leaving a certification location are blocked until the
    ///   services of their originating lines are done; once cleared, their
    ///   done quantity is filled from the planned quantity.
    /// - Lines arriving at a certification location must carry a serviced
    ///   lot.
    /// - On success the transfer is marked done and certification services
    ///   are generated for the eligible arriving lines.
    pub fn validate_transfer(
        &self,
        tenant_id: TenantId,
        transfer: &mut Transfer,
        settings: &CertificationSettings,
    ) -> DomainResult<Vec<ServiceId>> {
        if transfer.is_done() {
            return Err(DomainError::invariant("transfer is already validated"));
        }
        if transfer.lines().is_empty() {
            return Err(DomainError::validation("transfer has no lines to move"));
        }

        // Outgoing gate: material may only leave a certification location
        // once its certification services are completed.
        for line in transfer.lines() {
            if !line.leaves_certification_location() {
                continue;
            }
            if !self.certification_services_done(tenant_id, line.origin_line_ids())? {
                return Err(DomainError::validation(
                    "cannot validate a transfer before its certification services are completed",
                ));
            }
        }

        // Incoming gate: arriving at a certification location requires the
        // serviced serial number on every line.
        let missing: Vec<&str> = transfer
            .lines()
            .iter()
            .filter(|line| line.requires_certification() && line.service_lot().is_none())
            .map(|line| line.name())
            .collect();
        if !missing.is_empty() {
            return Err(DomainError::validation(format!(
                "serviced serial number required for {}",
                missing.join(", ")
            )));
        }

        // Cleared: fill done quantities on the gated outgoing lines.
        for line in transfer.lines_mut() {
            if line.leaves_certification_location() && line.planned_qty() > 0.0 {
                line.set_done_qty(line.planned_qty());
            }
        }
        transfer.mark_done();

        let mut generated = Vec::new();
        for line in transfer.lines() {
            if let Some(service_id) =
                self.generate_certification_service(tenant_id, line, settings)?
            {
                generated.push(service_id);
            }
        }

        debug!(
            transfer = %transfer.id_typed(),
            services = generated.len(),
            "transfer validated"
        );
        Ok(generated)
    }
}
