//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound port traits in memory.

mod clock;
mod event_sink;
mod memory_store;
mod treasury;

pub use clock::{ManualClock, SystemTimeSource};
pub use event_sink::{NoopEventSink, RecordingEventSink};
pub use memory_store::InMemoryLedgerStore;
pub use treasury::InMemoryTreasury;
