//! # Covenant Engine
//!
//! Agreement lifecycle and enforcement: multi-party agreements with
//! signatures, collateral, deadline-bound terms, breach penalties and
//! collateral release.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Lifecycle
//!
//! ```text
//! Pending ──all parties signed──→ Active ──all terms resolved──→ Completed
//!    │                              │
//!    └──creator cancels──→ Cancelled └──breach enforced──→ Breached
//! ```
//!
//! Completed, Breached and Cancelled are terminal. From any of them every
//! party may withdraw its remaining deposit exactly once.
//!
//! ## Guarantees
//!
//! | Guarantee | Mechanism |
//! |-----------|-----------|
//! | All-or-nothing calls | Draft record, invariant check, then one commit |
//! | Serialized per agreement | One lock per record in the ledger store |
//! | Consistent deadlines | One clock reading per call |
//! | No double payout | `has_withdrawn` plus terminal-status gate |
//! | Balanced escrow | Σ deposits == total collateral == journal balance |
//!
//! ## Module Structure
//!
//! ```text
//! covenant-engine/
//! ├── domain/          # Agreement, Party, Term, errors, invariants
//! ├── algorithms/      # Signatures, terms, lifecycle, escrow
//! ├── ports/           # CovenantApi, LedgerStore, Treasury, TimeSource
//! ├── adapters/        # In-memory store, treasury, clocks, sinks
//! └── service.rs       # Entry-point facade
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod config;
pub mod domain;
pub mod events;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{
    InMemoryLedgerStore, InMemoryTreasury, ManualClock, NoopEventSink, RecordingEventSink,
    SystemTimeSource,
};
pub use algorithms::{SignOutcome, TermOutcome};
pub use config::EngineConfig;
pub use domain::{
    fmt_address, Address, AgreementId, AgreementParams, AgreementStatus, AgreementTuple,
    AgreementView, Amount, CallContext, CovenantError, Penalty, PenaltyRecipient, PartyTuple,
    PartyView, StatusCode, TermParams, TermStatus, TermTuple, TermView, Timestamp, ZERO_ADDRESS,
};
pub use events::CovenantEvent;
pub use ports::{CovenantApi, EventSink, LedgerStore, TimeSource, Treasury};
pub use service::{CovenantService, ServiceStats};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
