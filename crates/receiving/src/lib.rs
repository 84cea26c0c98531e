//! Receiving workflow integration.
//!
//! Connects incoming stock transfers to the certification domain: arriving at
//! a location flagged as requiring certification creates a certification
//! service for each serialized lot, and a transfer cannot leave such a
//! location until its certification services are done.

pub mod link;
pub mod location;
pub mod store;
pub mod transfer;

pub use link::CertificationLink;
pub use location::{Location, LocationId};
pub use store::{InMemoryServiceStore, ServiceStore};
pub use transfer::{Transfer, TransferId, TransferLine, TransferState};
