//! Certification domain module.
//!
//! Quality certification for received raw material: serialized lots arrive
//! with manufacturer-labeled reference values per chemical/physical element;
//! a certification service records in-house readings, averages them per
//! element, compares the averages against the labeled values and classifies
//! each element (and the service as a whole) as pass or fail.
//!
//! This crate contains business rules only, implemented as deterministic
//! domain logic (no IO, no HTTP, no storage).

pub mod element;
pub mod evaluation;
pub mod lot;
pub mod reading;
pub mod service;
pub mod settings;
pub mod standard;

pub use element::{Element, ElementId};
pub use evaluation::{evaluate, overall_pass, ElementResult, ResultState};
pub use lot::{LabeledValue, Lot, LotId, Manufacturer, ManufacturerId};
pub use reading::Reading;
pub use service::{
    AssignStandards, CertificationService, ComputeResults, CreateService, FinishService,
    GroupId, MoveLineId, ProductId, ReadingRecorded, ReadingsGenerated, RecordReading,
    ResultsComputed, ServiceCommand, ServiceCreated, ServiceEvent, ServiceFinished, ServiceId,
    ServiceStarted, ServiceState, StandardsAssigned, StartService,
};
pub use settings::{
    CertificationSettings, DEFAULT_PASS_THRESHOLD_PERCENT, DEFAULT_REQUIRED_READING_COUNT,
};
pub use standard::{InHouseStandard, StandardId};
