//! Domain events.
//!
//! Business operations decide **events** (immutable facts); state evolves by
//! applying them. This crate holds the domain-agnostic contracts shared by all
//! certification modules.

pub mod envelope;
pub mod event;

pub use envelope::EventEnvelope;
pub use event::Event;
