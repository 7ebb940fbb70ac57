//! # Agreement Events
//!
//! Events appended to an agreement's log by committed calls and handed to
//! the configured [`EventSink`](crate::ports::EventSink) after commit.
//! A reverted call emits nothing.

use crate::domain::{Address, AgreementId, Amount, PenaltyRecipient, Timestamp};
use serde::{Deserialize, Serialize};

/// Something that happened to an agreement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CovenantEvent {
    /// New agreement recorded.
    AgreementCreated {
        /// Agreement id.
        agreement_id: AgreementId,
        /// Creator wallet.
        creator: Address,
        /// Number of parties.
        party_count: u64,
        /// When.
        at: Timestamp,
    },
    /// A party signed.
    AgreementSigned {
        /// Agreement id.
        agreement_id: AgreementId,
        /// Party index.
        party: usize,
        /// Party wallet.
        wallet: Address,
        /// Collateral attached.
        deposit: Amount,
        /// When.
        at: Timestamp,
    },
    /// Last signature admitted.
    AgreementActivated {
        /// Agreement id.
        agreement_id: AgreementId,
        /// When.
        at: Timestamp,
    },
    /// Obligation added.
    TermAdded {
        /// Agreement id.
        agreement_id: AgreementId,
        /// Term index.
        term: usize,
        /// Responsible party index.
        responsible_party: usize,
        /// Deadline.
        deadline: Timestamp,
    },
    /// Obligation fulfilled.
    TermResolved {
        /// Agreement id.
        agreement_id: AgreementId,
        /// Term index.
        term: usize,
        /// When.
        at: Timestamp,
    },
    /// Obligation missed its deadline.
    TermBreached {
        /// Agreement id.
        agreement_id: AgreementId,
        /// Term index.
        term: usize,
        /// Breaching party index.
        responsible_party: usize,
        /// When the breach was recorded.
        at: Timestamp,
    },
    /// Escrow moved a penalty.
    PenaltyApplied {
        /// Agreement id.
        agreement_id: AgreementId,
        /// Term index.
        term: usize,
        /// Breaching party index.
        from_party: usize,
        /// Destination.
        recipient: PenaltyRecipient,
        /// Amount moved.
        applied: Amount,
        /// Part of the penalty the deposit could not cover.
        shortfall: Amount,
    },
    /// Every term resolved.
    AgreementCompleted {
        /// Agreement id.
        agreement_id: AgreementId,
        /// When.
        at: Timestamp,
    },
    /// Breach enforced.
    AgreementBreached {
        /// Agreement id.
        agreement_id: AgreementId,
        /// Breached terms that were enforced.
        terms: Vec<usize>,
        /// When.
        at: Timestamp,
    },
    /// Creator cancelled before activation.
    AgreementCancelled {
        /// Agreement id.
        agreement_id: AgreementId,
        /// When.
        at: Timestamp,
    },
    /// Deposit paid back to its party.
    CollateralWithdrawn {
        /// Agreement id.
        agreement_id: AgreementId,
        /// Party index.
        party: usize,
        /// Destination wallet.
        wallet: Address,
        /// Amount paid.
        amount: Amount,
    },
    /// A party contested a term.
    DisputeRaised {
        /// Agreement id.
        agreement_id: AgreementId,
        /// Term index.
        term: usize,
        /// Party index.
        party: usize,
    },
    /// The arbiter ruled on a dispute.
    DisputeResolved {
        /// Agreement id.
        agreement_id: AgreementId,
        /// Term index.
        term: usize,
        /// True if the obligation was deemed met.
        upheld: bool,
    },
}

impl CovenantEvent {
    /// Agreement the event belongs to.
    pub fn agreement_id(&self) -> AgreementId {
        match self {
            Self::AgreementCreated { agreement_id, .. }
            | Self::AgreementSigned { agreement_id, .. }
            | Self::AgreementActivated { agreement_id, .. }
            | Self::TermAdded { agreement_id, .. }
            | Self::TermResolved { agreement_id, .. }
            | Self::TermBreached { agreement_id, .. }
            | Self::PenaltyApplied { agreement_id, .. }
            | Self::AgreementCompleted { agreement_id, .. }
            | Self::AgreementBreached { agreement_id, .. }
            | Self::AgreementCancelled { agreement_id, .. }
            | Self::CollateralWithdrawn { agreement_id, .. }
            | Self::DisputeRaised { agreement_id, .. }
            | Self::DisputeResolved { agreement_id, .. } => *agreement_id,
        }
    }
}
