//! In-Memory Treasury Adapter
//!
//! Implements `Treasury` with per-agreement holdings and per-wallet balances.
//! A settlement is applied under a single write lock so partial transfers are
//! never observable.

use crate::domain::{fmt_address, Address, AgreementId, Amount, CovenantError, Settlement};
use crate::ports::outbound::Treasury;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

#[derive(Default)]
struct Books {
    /// Value held in escrow per agreement.
    held: HashMap<AgreementId, Amount>,
    /// Value paid in per wallet.
    received: HashMap<Address, Amount>,
    /// Value paid out per wallet.
    paid: HashMap<Address, Amount>,
}

/// In-memory custody for tests and script replay.
#[derive(Default)]
pub struct InMemoryTreasury {
    books: RwLock<Books>,
    halted: AtomicBool,
}

impl InMemoryTreasury {
    /// Create an empty treasury.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every non-empty settlement until resumed.
    pub fn halt(&self) {
        self.halted.store(true, Ordering::SeqCst);
    }

    /// Accept settlements again.
    pub fn resume(&self) {
        self.halted.store(false, Ordering::SeqCst);
    }

    /// Total paid out to `wallet`.
    pub fn paid_to(&self, wallet: &Address) -> Amount {
        self.books.read().paid.get(wallet).copied().unwrap_or(0)
    }

    /// Total received from `wallet`.
    pub fn received_from(&self, wallet: &Address) -> Amount {
        self.books.read().received.get(wallet).copied().unwrap_or(0)
    }
}

impl Treasury for InMemoryTreasury {
    fn settle(&self, agreement: AgreementId, settlement: &Settlement) -> Result<(), CovenantError> {
        if settlement.is_empty() {
            return Ok(());
        }
        if self.halted.load(Ordering::SeqCst) {
            warn!("[covenant] Treasury halted, refusing settlement for {}", agreement);
            return Err(CovenantError::TransferFailed("treasury halted".to_string()));
        }

        let receipts = settlement
            .total_receipt()
            .ok_or(CovenantError::AmountOverflow)?;
        let payouts = settlement
            .total_payout()
            .ok_or(CovenantError::AmountOverflow)?;

        let mut books = self.books.write();
        let held = books.held.get(&agreement).copied().unwrap_or(0);
        let available = held
            .checked_add(receipts)
            .ok_or(CovenantError::AmountOverflow)?;
        let remaining = available
            .checked_sub(payouts)
            .ok_or(CovenantError::InsufficientValue {
                required: payouts,
                available,
            })?;

        for transfer in &settlement.receipts {
            let total = books.received.entry(transfer.wallet).or_default();
            *total = total.saturating_add(transfer.amount);
        }
        for transfer in &settlement.payouts {
            let total = books.paid.entry(transfer.wallet).or_default();
            *total = total.saturating_add(transfer.amount);
            debug!(
                "[covenant] Paid {} to {}",
                transfer.amount,
                fmt_address(&transfer.wallet)
            );
        }
        books.held.insert(agreement, remaining);
        Ok(())
    }

    fn held(&self, agreement: AgreementId) -> Amount {
        self.books.read().held.get(&agreement).copied().unwrap_or(0)
    }
}
