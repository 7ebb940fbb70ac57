//! In-Memory Ledger Store Adapter
//!
//! Implements `LedgerStore` as an arena of records addressed by stable ids.
//! Every record sits behind its own lock, so calls on one agreement are
//! serialized while calls on different agreements run independently.

use crate::domain::{Address, AgreementId, AgreementRecord, CovenantError};
use crate::ports::outbound::{LedgerStore, RecordBuilder, RecordTransition};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Arena-backed agreement ledger.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    /// Records indexed by agreement id.
    records: RwLock<Vec<Arc<Mutex<AgreementRecord>>>>,
    /// Wallet → agreements it participates in, in creation order.
    by_wallet: RwLock<HashMap<Address, Vec<AgreementId>>>,
}

impl InMemoryLedgerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: AgreementId) -> Result<Arc<Mutex<AgreementRecord>>, CovenantError> {
        let records = self.records.read();
        usize::try_from(id)
            .ok()
            .and_then(|index| records.get(index))
            .cloned()
            .ok_or(CovenantError::AgreementNotFound(id))
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn insert(&self, build: &mut RecordBuilder<'_>) -> Result<AgreementId, CovenantError> {
        let mut records = self.records.write();
        let id = records.len() as AgreementId;
        let record = build(id)?;

        let mut by_wallet = self.by_wallet.write();
        for wallet in record.participants() {
            by_wallet.entry(wallet).or_default().push(id);
        }
        records.push(Arc::new(Mutex::new(record)));

        debug!("[covenant] Stored agreement {}", id);
        Ok(id)
    }

    fn read(
        &self,
        id: AgreementId,
        visit: &mut dyn FnMut(&AgreementRecord),
    ) -> Result<(), CovenantError> {
        let slot = self.slot(id)?;
        let record = slot.lock();
        visit(&record);
        Ok(())
    }

    fn transact(
        &self,
        id: AgreementId,
        plan: &mut RecordTransition<'_>,
    ) -> Result<(), CovenantError> {
        let slot = self.slot(id)?;
        let mut record = slot.lock();
        let next = plan(&record)?;
        *record = next;
        Ok(())
    }

    fn agreements_of(&self, wallet: &Address) -> Vec<AgreementId> {
        self.by_wallet
            .read()
            .get(wallet)
            .cloned()
            .unwrap_or_default()
    }

    fn total(&self) -> u64 {
        self.records.read().len() as u64
    }
}
