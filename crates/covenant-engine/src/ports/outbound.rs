//! # Outbound Ports
//!
//! Traits for the engine's dependencies: the ledger store, the treasury that
//! actually moves value, the clock, and the event sink.

use crate::domain::{
    Address, AgreementId, AgreementRecord, Amount, CovenantError, Settlement, Timestamp,
};
use crate::events::CovenantEvent;

/// Builds a new record once the store has assigned its id.
pub type RecordBuilder<'a> =
    dyn FnMut(AgreementId) -> Result<AgreementRecord, CovenantError> + 'a;

/// Plans the next state of a record from its current state.
pub type RecordTransition<'a> =
    dyn FnMut(&AgreementRecord) -> Result<AgreementRecord, CovenantError> + 'a;

/// Append-only agreement ledger - outbound port.
///
/// Implementations serialize [`transact`](LedgerStore::transact) calls per
/// agreement id; different agreements may proceed concurrently.
pub trait LedgerStore: Send + Sync {
    /// Assign the next id, build the record and store it.
    ///
    /// If `build` fails nothing is stored and the id is not consumed.
    fn insert(&self, build: &mut RecordBuilder<'_>) -> Result<AgreementId, CovenantError>;

    /// Run `visit` against the current record.
    fn read(
        &self,
        id: AgreementId,
        visit: &mut dyn FnMut(&AgreementRecord),
    ) -> Result<(), CovenantError>;

    /// Replace the record with the one `plan` returns, holding the
    /// agreement's lock for the whole call. A failing `plan` leaves the
    /// record untouched.
    fn transact(
        &self,
        id: AgreementId,
        plan: &mut RecordTransition<'_>,
    ) -> Result<(), CovenantError>;

    /// Agreements `wallet` created or is a party of, in creation order.
    fn agreements_of(&self, wallet: &Address) -> Vec<AgreementId>;

    /// Number of agreements stored.
    fn total(&self) -> u64;
}

/// Value custody - outbound port.
///
/// The only component that moves funds in or out of the escrow.
pub trait Treasury: Send + Sync {
    /// Perform every transfer of `settlement` for `agreement`, or none.
    fn settle(&self, agreement: AgreementId, settlement: &Settlement) -> Result<(), CovenantError>;

    /// Value currently held for `agreement`.
    fn held(&self, agreement: AgreementId) -> Amount;
}

/// Time source for deadline checks.
pub trait TimeSource: Send + Sync {
    /// Current timestamp in seconds since epoch.
    fn now(&self) -> Timestamp;
}

/// Receiver of committed events.
pub trait EventSink: Send + Sync {
    /// Called once per event, after the emitting call committed.
    fn publish(&self, event: &CovenantEvent);
}
