//! # Domain Value Objects
//!
//! Status machines, penalty specifications and the per-call context.

use super::errors::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Agreement lifecycle state machine.
///
/// ```text
/// Pending ──all signed──→ Active ──all terms resolved──→ Completed
///    │                      │
///    └──creator cancels──→ Cancelled      └──breach enforced──→ Breached
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgreementStatus {
    /// Created, waiting for signatures.
    #[default]
    Pending,
    /// Every party signed; terms are live.
    Active,
    /// Every term resolved.
    Completed,
    /// A breach was enforced.
    Breached,
    /// Cancelled by the creator before activation.
    Cancelled,
}

impl AgreementStatus {
    /// Wire code: 0 Pending, 1 Active, 2 Completed, 3 Breached, 4 Cancelled.
    pub fn code(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Active => 1,
            Self::Completed => 2,
            Self::Breached => 3,
            Self::Cancelled => 4,
        }
    }

    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: AgreementStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Active)
                | (Self::Pending, Self::Cancelled)
                | (Self::Active, Self::Completed)
                | (Self::Active, Self::Breached)
        )
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Breached | Self::Cancelled)
    }

    /// Deposits may be withdrawn only from these states. Under Breached the
    /// breaching parties are still excluded.
    pub fn is_withdrawable(&self) -> bool {
        self.is_terminal()
    }
}

impl fmt::Display for AgreementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "Pending",
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Breached => "Breached",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

/// A status code as seen by consumers of the call surface.
///
/// Out-of-range codes decode to `Unknown` instead of failing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
    /// A recognised status.
    Known(AgreementStatus),
    /// Any code outside 0..=4.
    Unknown(u8),
}

impl From<u8> for StatusCode {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::Known(AgreementStatus::Pending),
            1 => Self::Known(AgreementStatus::Active),
            2 => Self::Known(AgreementStatus::Completed),
            3 => Self::Known(AgreementStatus::Breached),
            4 => Self::Known(AgreementStatus::Cancelled),
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(status) => status.fmt(f),
            Self::Unknown(_) => f.write_str("Unknown"),
        }
    }
}

/// Obligation state of a single term.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermStatus {
    /// Not yet fulfilled, not yet breached.
    #[default]
    Open,
    /// Fulfilled before the deadline.
    Resolved,
    /// Deadline elapsed while unmet. Set at most once.
    Breached,
}

impl TermStatus {
    /// Wire code: 0 Open, 1 Resolved, 2 Breached.
    pub fn code(&self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Resolved => 1,
            Self::Breached => 2,
        }
    }
}

/// Where a penalty goes when the responsible party breaches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PenaltyRecipient {
    /// Credited to another party's deposit in the same agreement.
    Party(usize),
    /// Paid out of escrow to an outside wallet.
    External(Address),
    /// Forfeited and split evenly across the non-breaching parties.
    Counterparties,
}

/// Penalty attached to a term.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalty {
    /// Amount taken from the breaching party's deposit.
    pub amount: Amount,
    /// Destination of the penalty.
    pub recipient: PenaltyRecipient,
}

impl Penalty {
    /// A zero-value penalty forfeited to the counterparties.
    pub fn none() -> Self {
        Self {
            amount: 0,
            recipient: PenaltyRecipient::Counterparties,
        }
    }
}

/// Caller identity and attached value for one entry-point call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// Wallet making the call.
    pub caller: Address,
    /// Value attached to the call.
    pub value: Amount,
}

impl CallContext {
    /// A call from `caller` with no value attached.
    pub fn new(caller: Address) -> Self {
        Self { caller, value: 0 }
    }

    /// A call from `caller` carrying `value`.
    pub fn with_value(caller: Address, value: Amount) -> Self {
        Self { caller, value }
    }
}

/// A single movement of value between the escrow and a wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Wallet paying in or being paid.
    pub wallet: Address,
    /// Amount moved.
    pub amount: Amount,
}

/// Value movements one call asks the treasury to perform atomically.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Value received into escrow.
    pub receipts: Vec<Transfer>,
    /// Value paid out of escrow.
    pub payouts: Vec<Transfer>,
}

impl Settlement {
    /// A settlement that receives `amount` from `wallet`.
    pub fn receive(wallet: Address, amount: Amount) -> Self {
        Self {
            receipts: vec![Transfer { wallet, amount }],
            payouts: Vec::new(),
        }
    }

    /// A settlement that pays `amount` to `wallet`.
    pub fn pay(wallet: Address, amount: Amount) -> Self {
        Self {
            receipts: Vec::new(),
            payouts: vec![Transfer { wallet, amount }],
        }
    }

    /// Nothing to move (zero-value transfers count as nothing).
    pub fn is_empty(&self) -> bool {
        self.receipts.iter().chain(&self.payouts).all(|t| t.amount == 0)
    }

    /// Merge another settlement into this one.
    pub fn extend(&mut self, other: Settlement) {
        self.receipts.extend(other.receipts);
        self.payouts.extend(other.payouts);
    }

    /// Sum of payouts.
    pub fn total_payout(&self) -> Option<Amount> {
        self.payouts
            .iter()
            .try_fold(0u128, |acc, t| acc.checked_add(t.amount))
    }

    /// Sum of receipts.
    pub fn total_receipt(&self) -> Option<Amount> {
        self.receipts
            .iter()
            .try_fold(0u128, |acc, t| acc.checked_add(t.amount))
    }
}
