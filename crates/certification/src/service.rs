use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use certflow_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId};
use certflow_events::Event;

use crate::element::Element;
use crate::evaluation::{evaluate, overall_pass, ElementResult};
use crate::lot::{LabeledValue, LotId};
use crate::reading::Reading;
use crate::settings::CertificationSettings;
use crate::standard::StandardId;

/// Certification service identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(pub AggregateId);

impl ServiceId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Identifier of the received product being certified.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Identifier of the stock move line the service certifies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveLineId(pub AggregateId);

impl MoveLineId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for MoveLineId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Identifier of the procurement group that sourced the transfer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub AggregateId);

impl GroupId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for GroupId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Certification service lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Draft,
    WorkingOn,
    Done,
}

/// Aggregate root: CertificationService.
///
/// One certification run for one received lot. Readings are seeded when the
/// service is created (or started with none), edited while the service is
/// draft or being worked on, and frozen once done. Results are derived from
/// readings on demand and fully replaced on every recomputation.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificationService {
    id: ServiceId,
    tenant_id: Option<TenantId>,
    name: String,
    product_id: Option<ProductId>,
    lot_id: Option<LotId>,
    move_line_id: Option<MoveLineId>,
    group_id: Option<GroupId>,
    state: ServiceState,
    elements: Vec<Element>,
    readings: Vec<Reading>,
    results: Vec<ElementResult>,
    standards: Vec<StandardId>,
    is_pass: bool,
    date_calibration: Option<NaiveDate>,
    date_received: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl CertificationService {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ServiceId) -> Self {
        Self {
            id,
            tenant_id: None,
            name: String::new(),
            product_id: None,
            lot_id: None,
            move_line_id: None,
            group_id: None,
            state: ServiceState::Draft,
            elements: Vec::new(),
            readings: Vec::new(),
            results: Vec::new(),
            standards: Vec::new(),
            is_pass: false,
            date_calibration: None,
            date_received: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ServiceId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn product_id(&self) -> Option<ProductId> {
        self.product_id
    }

    pub fn lot_id(&self) -> Option<LotId> {
        self.lot_id
    }

    pub fn move_line_id(&self) -> Option<MoveLineId> {
        self.move_line_id
    }

    pub fn group_id(&self) -> Option<GroupId> {
        self.group_id
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn results(&self) -> &[ElementResult] {
        &self.results
    }

    pub fn standards(&self) -> &[StandardId] {
        &self.standards
    }

    pub fn is_pass(&self) -> bool {
        self.is_pass
    }

    pub fn date_calibration(&self) -> Option<NaiveDate> {
        self.date_calibration
    }

    pub fn date_received(&self) -> Option<DateTime<Utc>> {
        self.date_received
    }

    pub fn is_done(&self) -> bool {
        self.state == ServiceState::Done
    }

    /// Readings may only be edited while the service is draft or being worked on.
    pub fn is_reading_editable(&self) -> bool {
        matches!(self.state, ServiceState::Draft | ServiceState::WorkingOn)
    }
}

impl AggregateRoot for CertificationService {
    type Id = ServiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateService.
///
/// `elements` are the lot's selectable elements; readings are seeded for them
/// immediately (`required_reading_count` zero-valued readings per element).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateService {
    pub tenant_id: TenantId,
    pub service_id: ServiceId,
    pub name: String,
    pub product_id: ProductId,
    pub lot_id: LotId,
    pub move_line_id: MoveLineId,
    pub group_id: GroupId,
    pub elements: Vec<Element>,
    pub required_reading_count: u32,
    pub date_calibration: Option<NaiveDate>,
    pub date_received: Option<DateTime<Utc>>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AssignStandards (replaces the referenced in-house standards).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignStandards {
    pub tenant_id: TenantId,
    pub service_id: ServiceId,
    pub standard_ids: Vec<StandardId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordReading (overwrite the value of one existing reading).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordReading {
    pub tenant_id: TenantId,
    pub service_id: ServiceId,
    /// Position of the reading in the service's reading list.
    pub index: usize,
    pub value: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: StartService.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartService {
    pub tenant_id: TenantId,
    pub service_id: ServiceId,
    pub required_reading_count: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ComputeResults.
///
/// Carries the lot's labeled values and the certification settings explicitly;
/// the aggregate never reaches out to ambient configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeResults {
    pub tenant_id: TenantId,
    pub service_id: ServiceId,
    pub labeled_values: Vec<LabeledValue>,
    pub settings: CertificationSettings,
    pub occurred_at: DateTime<Utc>,
}

/// Command: FinishService.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishService {
    pub tenant_id: TenantId,
    pub service_id: ServiceId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServiceCommand {
    CreateService(CreateService),
    AssignStandards(AssignStandards),
    RecordReading(RecordReading),
    StartService(StartService),
    ComputeResults(ComputeResults),
    FinishService(FinishService),
}

/// Event: ServiceCreated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCreated {
    pub tenant_id: TenantId,
    pub service_id: ServiceId,
    pub name: String,
    pub product_id: ProductId,
    pub lot_id: LotId,
    pub move_line_id: MoveLineId,
    pub group_id: GroupId,
    pub elements: Vec<Element>,
    pub readings: Vec<Reading>,
    pub date_calibration: Option<NaiveDate>,
    pub date_received: Option<DateTime<Utc>>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StandardsAssigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardsAssigned {
    pub tenant_id: TenantId,
    pub service_id: ServiceId,
    pub standard_ids: Vec<StandardId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReadingRecorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecorded {
    pub tenant_id: TenantId,
    pub service_id: ServiceId,
    pub index: usize,
    pub value: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReadingsGenerated (seeded zero-valued readings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingsGenerated {
    pub tenant_id: TenantId,
    pub service_id: ServiceId,
    pub readings: Vec<Reading>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ServiceStarted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStarted {
    pub tenant_id: TenantId,
    pub service_id: ServiceId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ResultsComputed (full replacement of the result set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsComputed {
    pub tenant_id: TenantId,
    pub service_id: ServiceId,
    pub results: Vec<ElementResult>,
    pub is_pass: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ServiceFinished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFinished {
    pub tenant_id: TenantId,
    pub service_id: ServiceId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServiceEvent {
    ServiceCreated(ServiceCreated),
    StandardsAssigned(StandardsAssigned),
    ReadingRecorded(ReadingRecorded),
    ReadingsGenerated(ReadingsGenerated),
    ServiceStarted(ServiceStarted),
    ResultsComputed(ResultsComputed),
    ServiceFinished(ServiceFinished),
}

impl Event for ServiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ServiceEvent::ServiceCreated(_) => "certification.service.created",
            ServiceEvent::StandardsAssigned(_) => "certification.service.standards_assigned",
            ServiceEvent::ReadingRecorded(_) => "certification.service.reading_recorded",
            ServiceEvent::ReadingsGenerated(_) => "certification.service.readings_generated",
            ServiceEvent::ServiceStarted(_) => "certification.service.started",
            ServiceEvent::ResultsComputed(_) => "certification.service.results_computed",
            ServiceEvent::ServiceFinished(_) => "certification.service.finished",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ServiceEvent::ServiceCreated(e) => e.occurred_at,
            ServiceEvent::StandardsAssigned(e) => e.occurred_at,
            ServiceEvent::ReadingRecorded(e) => e.occurred_at,
            ServiceEvent::ReadingsGenerated(e) => e.occurred_at,
            ServiceEvent::ServiceStarted(e) => e.occurred_at,
            ServiceEvent::ResultsComputed(e) => e.occurred_at,
            ServiceEvent::ServiceFinished(e) => e.occurred_at,
        }
    }
}

/// Seed `count` zero-valued readings per element, numbered consecutively.
fn generate_readings(elements: &[Element], count: u32) -> Vec<Reading> {
    let mut readings = Vec::with_capacity(elements.len() * count as usize);
    let mut sequence = 0;
    for element in elements {
        for _ in 0..count {
            sequence += 1;
            readings.push(Reading::zero(sequence, element.clone()));
        }
    }
    readings
}

impl Aggregate for CertificationService {
    type Command = ServiceCommand;
    type Event = ServiceEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ServiceEvent::ServiceCreated(e) => {
                self.id = e.service_id;
                self.tenant_id = Some(e.tenant_id);
                self.name = e.name.clone();
                self.product_id = Some(e.product_id);
                self.lot_id = Some(e.lot_id);
                self.move_line_id = Some(e.move_line_id);
                self.group_id = Some(e.group_id);
                self.state = ServiceState::Draft;
                self.elements = e.elements.clone();
                self.readings = e.readings.clone();
                self.results.clear();
                self.standards.clear();
                self.is_pass = false;
                self.date_calibration = e.date_calibration;
                self.date_received = e.date_received;
                self.created = true;
            }
            ServiceEvent::StandardsAssigned(e) => {
                self.standards = e.standard_ids.clone();
            }
            ServiceEvent::ReadingRecorded(e) => {
                if let Some(reading) = self.readings.get_mut(e.index) {
                    reading.set_value(e.value);
                }
            }
            ServiceEvent::ReadingsGenerated(e) => {
                self.readings = e.readings.clone();
            }
            ServiceEvent::ServiceStarted(_) => {
                self.state = ServiceState::WorkingOn;
            }
            ServiceEvent::ResultsComputed(e) => {
                // Full replacement: prior results are a disposable cache.
                self.results = e.results.clone();
                self.is_pass = e.is_pass;
            }
            ServiceEvent::ServiceFinished(_) => {
                self.state = ServiceState::Done;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ServiceCommand::CreateService(cmd) => self.handle_create(cmd),
            ServiceCommand::AssignStandards(cmd) => self.handle_assign_standards(cmd),
            ServiceCommand::RecordReading(cmd) => self.handle_record_reading(cmd),
            ServiceCommand::StartService(cmd) => self.handle_start(cmd),
            ServiceCommand::ComputeResults(cmd) => self.handle_compute_results(cmd),
            ServiceCommand::FinishService(cmd) => self.handle_finish(cmd),
        }
    }
}

impl CertificationService {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_service_id(&self, service_id: ServiceId) -> Result<(), DomainError> {
        if self.id != service_id {
            return Err(DomainError::invariant("service_id mismatch"));
        }
        Ok(())
    }

    fn ensure_standards(&self) -> Result<(), DomainError> {
        if self.standards.is_empty() {
            return Err(DomainError::validation(
                "must have at least one in-house standard",
            ));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateService) -> Result<Vec<ServiceEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("certification service already exists"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("service name cannot be empty"));
        }
        if cmd.required_reading_count == 0 {
            return Err(DomainError::validation(
                "required reading count must be positive",
            ));
        }

        let readings = generate_readings(&cmd.elements, cmd.required_reading_count);

        Ok(vec![ServiceEvent::ServiceCreated(ServiceCreated {
            tenant_id: cmd.tenant_id,
            service_id: cmd.service_id,
            name: cmd.name.clone(),
            product_id: cmd.product_id,
            lot_id: cmd.lot_id,
            move_line_id: cmd.move_line_id,
            group_id: cmd.group_id,
            elements: cmd.elements.clone(),
            readings,
            date_calibration: cmd.date_calibration,
            date_received: cmd.date_received,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_assign_standards(
        &self,
        cmd: &AssignStandards,
    ) -> Result<Vec<ServiceEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_service_id(cmd.service_id)?;

        if self.is_done() {
            return Err(DomainError::invariant(
                "a completed certification service is read-only",
            ));
        }
        if cmd.standard_ids.is_empty() {
            return Err(DomainError::validation(
                "must have at least one in-house standard",
            ));
        }

        Ok(vec![ServiceEvent::StandardsAssigned(StandardsAssigned {
            tenant_id: cmd.tenant_id,
            service_id: cmd.service_id,
            standard_ids: cmd.standard_ids.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_record_reading(
        &self,
        cmd: &RecordReading,
    ) -> Result<Vec<ServiceEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_service_id(cmd.service_id)?;
        self.ensure_standards()?;

        if !self.is_reading_editable() {
            return Err(DomainError::invariant(
                "readings cannot be edited once the service is done",
            ));
        }
        if cmd.index >= self.readings.len() {
            return Err(DomainError::validation(format!(
                "no reading at position {}",
                cmd.index
            )));
        }

        Ok(vec![ServiceEvent::ReadingRecorded(ReadingRecorded {
            tenant_id: cmd.tenant_id,
            service_id: cmd.service_id,
            index: cmd.index,
            value: cmd.value,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_start(&self, cmd: &StartService) -> Result<Vec<ServiceEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_service_id(cmd.service_id)?;
        self.ensure_standards()?;

        if self.is_done() {
            return Err(DomainError::invariant(
                "cannot restart a completed certification service",
            ));
        }
        if cmd.required_reading_count == 0 {
            return Err(DomainError::validation(
                "required reading count must be positive",
            ));
        }

        let mut events = vec![ServiceEvent::ServiceStarted(ServiceStarted {
            tenant_id: cmd.tenant_id,
            service_id: cmd.service_id,
            occurred_at: cmd.occurred_at,
        })];

        // Seed readings only when none exist: repeated starts must not duplicate.
        if self.readings.is_empty() && !self.elements.is_empty() {
            events.push(ServiceEvent::ReadingsGenerated(ReadingsGenerated {
                tenant_id: cmd.tenant_id,
                service_id: cmd.service_id,
                readings: generate_readings(&self.elements, cmd.required_reading_count),
                occurred_at: cmd.occurred_at,
            }));
        }

        Ok(events)
    }

    fn handle_compute_results(
        &self,
        cmd: &ComputeResults,
    ) -> Result<Vec<ServiceEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_service_id(cmd.service_id)?;
        self.ensure_standards()?;

        if self.is_done() {
            return Err(DomainError::invariant(
                "results are frozen once the service is done",
            ));
        }
        if self.readings.is_empty() {
            return Err(DomainError::validation("service has no readings to evaluate"));
        }

        let results = evaluate(&self.readings, &cmd.labeled_values, &cmd.settings)?;
        let is_pass = overall_pass(&results);

        Ok(vec![ServiceEvent::ResultsComputed(ResultsComputed {
            tenant_id: cmd.tenant_id,
            service_id: cmd.service_id,
            results,
            is_pass,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_finish(&self, cmd: &FinishService) -> Result<Vec<ServiceEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_service_id(cmd.service_id)?;
        self.ensure_standards()?;

        if self.state != ServiceState::WorkingOn {
            return Err(DomainError::invariant(
                "only a service being worked on can be finished",
            ));
        }

        Ok(vec![ServiceEvent::ServiceFinished(ServiceFinished {
            tenant_id: cmd.tenant_id,
            service_id: cmd.service_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementId;
    use crate::settings::DEFAULT_REQUIRED_READING_COUNT;
    use certflow_uom::{UnitOfMeasure, UomCategoryId, UomId};

    fn test_tenant_id() -> TenantId {
        TenantId::new()
    }

    fn test_service_id() -> ServiceId {
        ServiceId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn copper() -> Element {
        Element::new(ElementId::new(AggregateId::new()), "Copper", "Cu", "8.96").unwrap()
    }

    fn iron() -> Element {
        Element::new(ElementId::new(AggregateId::new()), "Iron", "Fe", "7.87").unwrap()
    }

    fn pct_unit() -> UnitOfMeasure {
        UnitOfMeasure::reference(
            UomId::new(AggregateId::new()),
            "%",
            UomCategoryId::new(AggregateId::new()),
        )
        .unwrap()
    }

    fn create_cmd(
        tenant_id: TenantId,
        service_id: ServiceId,
        elements: Vec<Element>,
    ) -> CreateService {
        CreateService {
            tenant_id,
            service_id,
            name: "LOT-0001 Copper 99.9 % / Acme Metals".to_string(),
            product_id: ProductId::new(AggregateId::new()),
            lot_id: LotId::new(AggregateId::new()),
            move_line_id: MoveLineId::new(AggregateId::new()),
            group_id: GroupId::new(AggregateId::new()),
            elements,
            required_reading_count: DEFAULT_REQUIRED_READING_COUNT,
            date_calibration: None,
            date_received: Some(test_time()),
            occurred_at: test_time(),
        }
    }

    /// Create + assign one standard; returns a service in draft.
    fn draft_service(elements: Vec<Element>) -> (CertificationService, TenantId, ServiceId) {
        let tenant_id = test_tenant_id();
        let service_id = test_service_id();
        let mut service = CertificationService::empty(service_id);

        let events = service
            .handle(&ServiceCommand::CreateService(create_cmd(
                tenant_id, service_id, elements,
            )))
            .unwrap();
        for event in &events {
            service.apply(event);
        }

        let events = service
            .handle(&ServiceCommand::AssignStandards(AssignStandards {
                tenant_id,
                service_id,
                standard_ids: vec![StandardId::new(AggregateId::new())],
                occurred_at: test_time(),
            }))
            .unwrap();
        for event in &events {
            service.apply(event);
        }

        (service, tenant_id, service_id)
    }

    fn set_readings(
        service: &mut CertificationService,
        tenant_id: TenantId,
        service_id: ServiceId,
        values: &[f64],
    ) {
        for (index, value) in values.iter().enumerate() {
            let events = service
                .handle(&ServiceCommand::RecordReading(RecordReading {
                    tenant_id,
                    service_id,
                    index,
                    value: *value,
                    occurred_at: test_time(),
                }))
                .unwrap();
            for event in &events {
                service.apply(event);
            }
        }
    }

    #[test]
    fn create_seeds_five_zero_readings_per_element() {
        let tenant_id = test_tenant_id();
        let service_id = test_service_id();
        let service = CertificationService::empty(service_id);

        let events = service
            .handle(&ServiceCommand::CreateService(create_cmd(
                tenant_id,
                service_id,
                vec![copper(), iron()],
            )))
            .unwrap();
        assert_eq!(events.len(), 1);

        match &events[0] {
            ServiceEvent::ServiceCreated(e) => {
                assert_eq!(e.readings.len(), 10);
                assert!(e.readings.iter().all(|r| r.value() == 0.0));
                assert_eq!(e.readings[0].element().name(), "Copper");
                assert_eq!(e.readings[5].element().name(), "Iron");
            }
            _ => panic!("Expected ServiceCreated event"),
        }
    }

    #[test]
    fn create_twice_is_a_conflict() {
        let tenant_id = test_tenant_id();
        let service_id = test_service_id();
        let mut service = CertificationService::empty(service_id);

        let events = service
            .handle(&ServiceCommand::CreateService(create_cmd(
                tenant_id,
                service_id,
                vec![copper()],
            )))
            .unwrap();
        service.apply(&events[0]);

        let err = service
            .handle(&ServiceCommand::CreateService(create_cmd(
                tenant_id,
                service_id,
                vec![copper()],
            )))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn mutating_commands_require_an_in_house_standard() {
        let tenant_id = test_tenant_id();
        let service_id = test_service_id();
        let mut service = CertificationService::empty(service_id);

        let events = service
            .handle(&ServiceCommand::CreateService(create_cmd(
                tenant_id,
                service_id,
                vec![copper()],
            )))
            .unwrap();
        service.apply(&events[0]);

        let err = service
            .handle(&ServiceCommand::StartService(StartService {
                tenant_id,
                service_id,
                required_reading_count: DEFAULT_REQUIRED_READING_COUNT,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("in-house standard") => {}
            other => panic!("Expected Validation about standards, got {other:?}"),
        }
    }

    #[test]
    fn start_moves_to_working_on_without_regenerating_readings() {
        let (mut service, tenant_id, service_id) = draft_service(vec![copper()]);
        assert_eq!(service.state(), ServiceState::Draft);
        assert_eq!(service.readings().len(), 5);

        let events = service
            .handle(&ServiceCommand::StartService(StartService {
                tenant_id,
                service_id,
                required_reading_count: DEFAULT_REQUIRED_READING_COUNT,
                occurred_at: test_time(),
            }))
            .unwrap();
        // Readings already exist: only the state change is emitted.
        assert_eq!(events.len(), 1);
        for event in &events {
            service.apply(event);
        }
        assert_eq!(service.state(), ServiceState::WorkingOn);
        assert_eq!(service.readings().len(), 5);
    }

    #[test]
    fn start_generates_readings_when_none_exist() {
        let tenant_id = test_tenant_id();
        let service_id = test_service_id();
        let mut service = CertificationService::empty(service_id);

        // A service created before its lot had labeled values attached.
        service.apply(&ServiceEvent::ServiceCreated(ServiceCreated {
            tenant_id,
            service_id,
            name: "LOT-0002".to_string(),
            product_id: ProductId::new(AggregateId::new()),
            lot_id: LotId::new(AggregateId::new()),
            move_line_id: MoveLineId::new(AggregateId::new()),
            group_id: GroupId::new(AggregateId::new()),
            elements: vec![copper()],
            readings: vec![],
            date_calibration: None,
            date_received: None,
            occurred_at: test_time(),
        }));
        service.apply(&ServiceEvent::StandardsAssigned(StandardsAssigned {
            tenant_id,
            service_id,
            standard_ids: vec![StandardId::new(AggregateId::new())],
            occurred_at: test_time(),
        }));

        let events = service
            .handle(&ServiceCommand::StartService(StartService {
                tenant_id,
                service_id,
                required_reading_count: DEFAULT_REQUIRED_READING_COUNT,
                occurred_at: test_time(),
            }))
            .unwrap();
        assert_eq!(events.len(), 2);
        for event in &events {
            service.apply(event);
        }
        assert_eq!(service.state(), ServiceState::WorkingOn);
        assert_eq!(service.readings().len(), 5);
    }

    #[test]
    fn start_on_done_service_is_rejected() {
        let (mut service, tenant_id, service_id) = draft_service(vec![copper()]);
        let start = ServiceCommand::StartService(StartService {
            tenant_id,
            service_id,
            required_reading_count: DEFAULT_REQUIRED_READING_COUNT,
            occurred_at: test_time(),
        });

        let events = service.handle(&start).unwrap();
        for event in &events {
            service.apply(event);
        }
        let events = service
            .handle(&ServiceCommand::FinishService(FinishService {
                tenant_id,
                service_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        for event in &events {
            service.apply(event);
        }
        assert_eq!(service.state(), ServiceState::Done);

        let err = service.handle(&start).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn record_reading_overwrites_the_value() {
        let (mut service, tenant_id, service_id) = draft_service(vec![copper()]);

        let events = service
            .handle(&ServiceCommand::RecordReading(RecordReading {
                tenant_id,
                service_id,
                index: 2,
                value: 97.3,
                occurred_at: test_time(),
            }))
            .unwrap();
        for event in &events {
            service.apply(event);
        }
        assert_eq!(service.readings()[2].value(), 97.3);
        assert_eq!(service.readings()[0].value(), 0.0);
    }

    #[test]
    fn record_reading_out_of_range_is_rejected() {
        let (service, tenant_id, service_id) = draft_service(vec![copper()]);

        let err = service
            .handle(&ServiceCommand::RecordReading(RecordReading {
                tenant_id,
                service_id,
                index: 99,
                value: 97.3,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn compute_results_passes_for_close_readings() {
        let (mut service, tenant_id, service_id) = draft_service(vec![copper()]);
        set_readings(&mut service, tenant_id, service_id, &[95.0, 98.0, 97.0, 96.0, 99.0]);

        let uom = pct_unit();
        let element = service.elements()[0].clone();
        let events = service
            .handle(&ServiceCommand::ComputeResults(ComputeResults {
                tenant_id,
                service_id,
                labeled_values: vec![LabeledValue::new(1, element, 100.0, uom.clone())],
                settings: CertificationSettings::new(uom),
                occurred_at: test_time(),
            }))
            .unwrap();
        for event in &events {
            service.apply(event);
        }

        assert_eq!(service.results().len(), 1);
        let result = &service.results()[0];
        assert_eq!(result.average(), 97.0);
        assert_eq!(result.diff_from_label(), 3.0);
        assert_eq!(result.percent_diff_from_label(), 3.0);
        assert!(service.is_pass());
    }

    #[test]
    fn recompute_fully_replaces_results_and_clears_pass() {
        let (mut service, tenant_id, service_id) = draft_service(vec![copper()]);
        let uom = pct_unit();
        let element = service.elements()[0].clone();
        let labels = vec![LabeledValue::new(1, element, 100.0, uom.clone())];
        let settings = CertificationSettings::new(uom);

        set_readings(&mut service, tenant_id, service_id, &[95.0, 98.0, 97.0, 96.0, 99.0]);
        let events = service
            .handle(&ServiceCommand::ComputeResults(ComputeResults {
                tenant_id,
                service_id,
                labeled_values: labels.clone(),
                settings: settings.clone(),
                occurred_at: test_time(),
            }))
            .unwrap();
        for event in &events {
            service.apply(event);
        }
        assert!(service.is_pass());

        // Drift the readings out of tolerance and recompute.
        set_readings(&mut service, tenant_id, service_id, &[80.0, 82.0, 81.0, 79.0, 78.0]);
        let events = service
            .handle(&ServiceCommand::ComputeResults(ComputeResults {
                tenant_id,
                service_id,
                labeled_values: labels,
                settings,
                occurred_at: test_time(),
            }))
            .unwrap();
        for event in &events {
            service.apply(event);
        }

        assert_eq!(service.results().len(), 1);
        assert!(service.results()[0].is_fail());
        assert!(!service.is_pass());
    }

    #[test]
    fn compute_with_insufficient_readings_changes_nothing() {
        let (mut service, tenant_id, service_id) = draft_service(vec![copper()]);
        set_readings(&mut service, tenant_id, service_id, &[95.0, 98.0, 97.0, 96.0, 99.0]);

        let uom = pct_unit();
        // Six required readings but only five recorded.
        let settings = CertificationSettings::new(uom.clone()).with_required_reading_count(6);
        let element = service.elements()[0].clone();
        let before = service.clone();

        let err = service
            .handle(&ServiceCommand::ComputeResults(ComputeResults {
                tenant_id,
                service_id,
                labeled_values: vec![LabeledValue::new(1, element, 100.0, uom)],
                settings,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Validation(msg) => {
                assert!(msg.contains("Copper"));
                assert!(msg.contains('6'));
            }
            other => panic!("Expected Validation, got {other:?}"),
        }
        assert_eq!(service, before);
    }

    #[test]
    fn compute_without_reading_unit_is_a_configuration_error() {
        let (mut service, tenant_id, service_id) = draft_service(vec![copper()]);
        set_readings(&mut service, tenant_id, service_id, &[95.0, 98.0, 97.0, 96.0, 99.0]);

        let err = service
            .handle(&ServiceCommand::ComputeResults(ComputeResults {
                tenant_id,
                service_id,
                labeled_values: vec![],
                settings: CertificationSettings::default(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Configuration(_)));
        assert!(service.results().is_empty());
    }

    #[test]
    fn finish_requires_working_on() {
        let (mut service, tenant_id, service_id) = draft_service(vec![copper()]);
        let finish = ServiceCommand::FinishService(FinishService {
            tenant_id,
            service_id,
            occurred_at: test_time(),
        });

        // Draft: not yet started.
        let err = service.handle(&finish).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        let events = service
            .handle(&ServiceCommand::StartService(StartService {
                tenant_id,
                service_id,
                required_reading_count: DEFAULT_REQUIRED_READING_COUNT,
                occurred_at: test_time(),
            }))
            .unwrap();
        for event in &events {
            service.apply(event);
        }

        let events = service.handle(&finish).unwrap();
        for event in &events {
            service.apply(event);
        }
        assert_eq!(service.state(), ServiceState::Done);

        // Done: no second finish.
        let err = service.handle(&finish).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn done_service_is_read_only() {
        let (mut service, tenant_id, service_id) = draft_service(vec![copper()]);
        for command in [
            ServiceCommand::StartService(StartService {
                tenant_id,
                service_id,
                required_reading_count: DEFAULT_REQUIRED_READING_COUNT,
                occurred_at: test_time(),
            }),
            ServiceCommand::FinishService(FinishService {
                tenant_id,
                service_id,
                occurred_at: test_time(),
            }),
        ] {
            let events = service.handle(&command).unwrap();
            for event in &events {
                service.apply(event);
            }
        }
        assert!(service.is_done());
        assert!(!service.is_reading_editable());

        let err = service
            .handle(&ServiceCommand::RecordReading(RecordReading {
                tenant_id,
                service_id,
                index: 0,
                value: 1.0,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        let err = service
            .handle(&ServiceCommand::ComputeResults(ComputeResults {
                tenant_id,
                service_id,
                labeled_values: vec![],
                settings: CertificationSettings::new(pct_unit()),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        let err = service
            .handle(&ServiceCommand::AssignStandards(AssignStandards {
                tenant_id,
                service_id,
                standard_ids: vec![StandardId::new(AggregateId::new())],
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let (service, tenant_id, service_id) = draft_service(vec![copper()]);
        let before = service.clone();

        let command = ServiceCommand::RecordReading(RecordReading {
            tenant_id,
            service_id,
            index: 0,
            value: 42.0,
            occurred_at: test_time(),
        });
        let events1 = service.handle(&command).unwrap();
        let events2 = service.handle(&command).unwrap();

        assert_eq!(service, before);
        assert_eq!(events1, events2);
    }

    #[test]
    fn version_increments_on_apply() {
        let tenant_id = test_tenant_id();
        let service_id = test_service_id();
        let mut service = CertificationService::empty(service_id);
        assert_eq!(service.version(), 0);

        let events = service
            .handle(&ServiceCommand::CreateService(create_cmd(
                tenant_id,
                service_id,
                vec![copper()],
            )))
            .unwrap();
        service.apply(&events[0]);
        assert_eq!(service.version(), 1);

        let events = service
            .handle(&ServiceCommand::AssignStandards(AssignStandards {
                tenant_id,
                service_id,
                standard_ids: vec![StandardId::new(AggregateId::new())],
                occurred_at: test_time(),
            }))
            .unwrap();
        service.apply(&events[0]);
        assert_eq!(service.version(), 2);
    }

    #[test]
    fn apply_is_deterministic() {
        let tenant_id = test_tenant_id();
        let service_id = test_service_id();
        let cmd = create_cmd(tenant_id, service_id, vec![copper(), iron()]);

        let probe = CertificationService::empty(service_id);
        let events = probe
            .handle(&ServiceCommand::CreateService(cmd))
            .unwrap();

        let mut first = CertificationService::empty(service_id);
        let mut second = CertificationService::empty(service_id);
        for event in &events {
            first.apply(event);
            second.apply(event);
        }

        assert_eq!(first, second);
        assert_eq!(first.version(), second.version());
        assert_eq!(first.state(), ServiceState::Draft);
    }
}
