//! # Domain Entities
//!
//! Agreement, Party and Term records plus the escrow journal.
//!
//! Records are append-only: nothing is ever deleted, and party/term indexes
//! are stable for the life of the agreement.

use super::errors::{Address, AgreementId, Amount, Timestamp};
use super::value_objects::{AgreementStatus, Penalty, PenaltyRecipient, TermStatus};
use crate::events::CovenantEvent;
use serde::{Deserialize, Serialize};

/// Top-level multi-party agreement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agreement {
    /// Unique identifier.
    pub id: AgreementId,
    /// Title, immutable.
    pub title: String,
    /// Description, immutable.
    pub description: String,
    /// Wallet that created the record.
    pub creator: Address,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Set once when the last signature is admitted; 0 until then.
    pub activated_at: Timestamp,
    /// Current status.
    pub status: AgreementStatus,
    /// Sum of all party deposits still held.
    pub total_collateral: Amount,
    /// Whether breach detection enforces immediately.
    pub auto_enforce: bool,
    /// Timestamp of the terminal transition, if any.
    pub closed_at: Option<Timestamp>,
}

/// A signer of an agreement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Wallet identity, unique within the agreement.
    pub wallet: Address,
    /// Display label.
    pub name: String,
    /// Never reverts to false once set.
    pub has_signed: bool,
    /// Value held for this party. Mutated only by the escrow.
    pub deposit_amount: Amount,
    /// Once true the deposit has been paid out.
    pub has_withdrawn: bool,
    /// When the signature was admitted.
    pub signed_at: Option<Timestamp>,
}

impl Party {
    /// Create an unsigned party.
    pub fn new(wallet: Address, name: String) -> Self {
        Self {
            wallet,
            name,
            has_signed: false,
            deposit_amount: 0,
            has_withdrawn: false,
            signed_at: None,
        }
    }
}

/// An open dispute on a term.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispute {
    /// Party index that raised it.
    pub raised_by: usize,
    /// When it was raised.
    pub raised_at: Timestamp,
}

/// An obligation with a deadline and penalty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// What is owed.
    pub description: String,
    /// Index of the party responsible for the obligation.
    pub responsible_party: usize,
    /// Deadline (inclusive): breach only when `now > deadline`.
    pub deadline: Timestamp,
    /// Obligation state.
    pub status: TermStatus,
    /// Penalty applied on breach.
    pub penalty: Penalty,
    /// Open dispute, if any.
    pub dispute: Option<Dispute>,
    /// When the term was resolved.
    pub resolved_at: Option<Timestamp>,
    /// When the breach was recorded.
    pub breached_at: Option<Timestamp>,
    /// Whether the penalty has been moved by the escrow.
    pub penalty_applied: bool,
}

/// Parameters for adding a term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermParams {
    /// What is owed.
    pub description: String,
    /// Responsible party index.
    pub responsible_party: usize,
    /// Deadline timestamp.
    pub deadline: Timestamp,
    /// Penalty on breach.
    pub penalty: Penalty,
}

impl Term {
    /// Create an open term.
    pub fn new(params: TermParams) -> Self {
        Self {
            description: params.description,
            responsible_party: params.responsible_party,
            deadline: params.deadline,
            status: TermStatus::Open,
            penalty: params.penalty,
            dispute: None,
            resolved_at: None,
            breached_at: None,
            penalty_applied: false,
        }
    }

    /// Check if the deadline has elapsed.
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        now > self.deadline
    }

    /// Breach = deadline elapsed and obligation unmet.
    pub fn is_breach(&self, now: Timestamp) -> bool {
        self.status == TermStatus::Open && self.is_overdue(now)
    }

    /// Breached, undisputed and not yet penalised.
    pub fn is_enforceable(&self) -> bool {
        self.status == TermStatus::Breached && self.dispute.is_none() && !self.penalty_applied
    }
}

/// Parameters for creating an agreement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgreementParams {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Party wallets, one per party.
    pub party_wallets: Vec<Address>,
    /// Party names, same length as wallets.
    pub party_names: Vec<String>,
    /// Auto-enforcement flag.
    pub auto_enforce: bool,
}

/// Append-only escrow journal entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowEntry {
    /// Collateral locked at signing.
    Deposit {
        /// Depositing party.
        party: usize,
        /// Amount locked.
        amount: Amount,
        /// When.
        at: Timestamp,
    },
    /// Penalty moved between parties inside the escrow.
    PenaltyCredit {
        /// Breached term.
        term: usize,
        /// Breaching party.
        from: usize,
        /// Credited party.
        to: usize,
        /// Amount moved.
        amount: Amount,
    },
    /// Penalty paid out of the escrow.
    PenaltyPayout {
        /// Breached term.
        term: usize,
        /// Breaching party.
        from: usize,
        /// External wallet.
        to: Address,
        /// Amount paid.
        amount: Amount,
    },
    /// Deposit returned to its party.
    Withdrawal {
        /// Withdrawing party.
        party: usize,
        /// Destination wallet.
        to: Address,
        /// Amount paid.
        amount: Amount,
        /// When.
        at: Timestamp,
    },
}

impl EscrowEntry {
    /// Net effect of the entry on the escrow's holdings.
    pub fn inflow(&self) -> Amount {
        match self {
            Self::Deposit { amount, .. } => *amount,
            _ => 0,
        }
    }

    /// Value leaving the escrow.
    pub fn outflow(&self) -> Amount {
        match self {
            Self::PenaltyPayout { amount, .. } | Self::Withdrawal { amount, .. } => *amount,
            _ => 0,
        }
    }
}

/// Everything the ledger stores for one agreement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementRecord {
    /// Agreement header.
    pub agreement: Agreement,
    /// Parties in creation order.
    pub parties: Vec<Party>,
    /// Terms in insertion order.
    pub terms: Vec<Term>,
    /// Escrow journal.
    pub journal: Vec<EscrowEntry>,
    /// Events emitted by committed calls.
    pub events: Vec<CovenantEvent>,
}

impl AgreementRecord {
    /// Derived party count.
    pub fn party_count(&self) -> u64 {
        self.parties.len() as u64
    }

    /// Derived term count.
    pub fn term_count(&self) -> u64 {
        self.terms.len() as u64
    }

    /// Index of the party holding `wallet`.
    pub fn party_index(&self, wallet: &Address) -> Option<usize> {
        self.parties.iter().position(|p| &p.wallet == wallet)
    }

    /// Number of parties that still have to sign.
    pub fn unsigned_count(&self) -> usize {
        self.parties.iter().filter(|p| !p.has_signed).count()
    }

    /// Every wallet with an interest in this agreement (creator first, deduplicated).
    pub fn participants(&self) -> Vec<Address> {
        let mut wallets = vec![self.agreement.creator];
        for party in &self.parties {
            if !wallets.contains(&party.wallet) {
                wallets.push(party.wallet);
            }
        }
        wallets
    }

    /// Append an event to the record's log.
    pub fn emit(&mut self, event: CovenantEvent) {
        self.events.push(event);
    }
}

/// Fixed tuple shape of an agreement:
/// (id, title, description, creator, createdAt, activatedAt, status,
/// totalCollateral, autoEnforce, partyCount, termCount).
pub type AgreementTuple = (
    AgreementId,
    String,
    String,
    Address,
    Timestamp,
    Timestamp,
    u8,
    Amount,
    bool,
    u64,
    u64,
);

/// Fixed tuple shape of a party: (wallet, name, hasSigned, depositAmount, hasWithdrawn).
pub type PartyTuple = (Address, String, bool, Amount, bool);

/// Fixed tuple shape of a term:
/// (description, responsibleParty, deadline, status, disputed, penaltyAmount, penaltyRecipient).
pub type TermTuple = (String, u64, Timestamp, u8, bool, Amount, PenaltyRecipient);

/// Read-only projection of an agreement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementView {
    /// Identifier.
    pub id: AgreementId,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Creator wallet.
    pub creator: Address,
    /// Creation time.
    pub created_at: Timestamp,
    /// Activation time, 0 if not active yet.
    pub activated_at: Timestamp,
    /// Status.
    pub status: AgreementStatus,
    /// Collateral held.
    pub total_collateral: Amount,
    /// Auto-enforcement flag.
    pub auto_enforce: bool,
    /// Number of parties.
    pub party_count: u64,
    /// Number of terms.
    pub term_count: u64,
}

impl AgreementView {
    /// The fixed tuple shape, status encoded as its wire code.
    pub fn as_tuple(&self) -> AgreementTuple {
        (
            self.id,
            self.title.clone(),
            self.description.clone(),
            self.creator,
            self.created_at,
            self.activated_at,
            self.status.code(),
            self.total_collateral,
            self.auto_enforce,
            self.party_count,
            self.term_count,
        )
    }
}

impl From<&AgreementRecord> for AgreementView {
    fn from(record: &AgreementRecord) -> Self {
        let a = &record.agreement;
        Self {
            id: a.id,
            title: a.title.clone(),
            description: a.description.clone(),
            creator: a.creator,
            created_at: a.created_at,
            activated_at: a.activated_at,
            status: a.status,
            total_collateral: a.total_collateral,
            auto_enforce: a.auto_enforce,
            party_count: record.party_count(),
            term_count: record.term_count(),
        }
    }
}

/// Read-only projection of a party.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyView {
    /// Wallet.
    pub wallet: Address,
    /// Name.
    pub name: String,
    /// Signed flag.
    pub has_signed: bool,
    /// Deposit still held.
    pub deposit_amount: Amount,
    /// Withdrawn flag.
    pub has_withdrawn: bool,
}

impl PartyView {
    /// The fixed tuple shape.
    pub fn as_tuple(&self) -> PartyTuple {
        (
            self.wallet,
            self.name.clone(),
            self.has_signed,
            self.deposit_amount,
            self.has_withdrawn,
        )
    }
}

impl From<&Party> for PartyView {
    fn from(party: &Party) -> Self {
        Self {
            wallet: party.wallet,
            name: party.name.clone(),
            has_signed: party.has_signed,
            deposit_amount: party.deposit_amount,
            has_withdrawn: party.has_withdrawn,
        }
    }
}

/// Read-only projection of a term.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermView {
    /// Obligation.
    pub description: String,
    /// Responsible party index.
    pub responsible_party: usize,
    /// Deadline.
    pub deadline: Timestamp,
    /// Obligation state.
    pub status: TermStatus,
    /// Whether a dispute is open.
    pub disputed: bool,
    /// Penalty specification.
    pub penalty: Penalty,
}

impl TermView {
    /// The fixed tuple shape, status encoded as its wire code.
    pub fn as_tuple(&self) -> TermTuple {
        (
            self.description.clone(),
            self.responsible_party as u64,
            self.deadline,
            self.status.code(),
            self.disputed,
            self.penalty.amount,
            self.penalty.recipient,
        )
    }
}

impl From<&Term> for TermView {
    fn from(term: &Term) -> Self {
        Self {
            description: term.description.clone(),
            responsible_party: term.responsible_party,
            deadline: term.deadline,
            status: term.status,
            disputed: term.dispute.is_some(),
            penalty: term.penalty,
        }
    }
}
