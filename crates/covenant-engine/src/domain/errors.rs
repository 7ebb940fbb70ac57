//! # Domain Errors
//!
//! Error types for the agreement engine. Every entry point fails closed:
//! any of these aborts the whole call and leaves the ledger untouched.

use super::value_objects::AgreementStatus;
use thiserror::Error;

/// Wallet identity (20-byte, fixed width).
pub type Address = [u8; 20];

/// Monetary amount in integer base units.
pub type Amount = u128;

/// Ledger time in seconds since the Unix epoch.
pub type Timestamp = u64;

/// Stable agreement identifier, assigned from zero and never reused.
pub type AgreementId = u64;

/// The all-zero address. Never a valid party wallet.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Agreement engine error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CovenantError {
    /// Party list rejected at creation (size, duplicates, zero wallet, name mismatch).
    #[error("Invalid party list: {0}")]
    InvalidPartyList(String),

    /// Caller is not a registered party of the agreement.
    #[error("Caller {caller} is not a party of agreement {agreement_id}")]
    NotAParty {
        /// Agreement being addressed.
        agreement_id: AgreementId,
        /// Hex-encoded caller wallet.
        caller: String,
    },

    /// Party already submitted its signature.
    #[error("Party {party} already signed agreement {agreement_id}")]
    AlreadySigned {
        /// Agreement being addressed.
        agreement_id: AgreementId,
        /// Party index.
        party: usize,
    },

    /// Term index out of range.
    #[error("Term {term} not found in agreement {agreement_id}")]
    TermNotFound {
        /// Agreement being addressed.
        agreement_id: AgreementId,
        /// Requested term index.
        term: usize,
    },

    /// Term is already resolved.
    #[error("Term {term} already resolved")]
    AlreadyResolved {
        /// Term index.
        term: usize,
    },

    /// Term deadline has elapsed (or a breach is already recorded).
    #[error("Term {term} deadline {deadline} passed at {now}")]
    DeadlinePassed {
        /// Term index.
        term: usize,
        /// Term deadline.
        deadline: Timestamp,
        /// Time of the call.
        now: Timestamp,
    },

    /// The lifecycle state machine does not allow the requested transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition {
        /// Current status.
        from: AgreementStatus,
        /// Attempted status.
        to: AgreementStatus,
    },

    /// Collateral cannot be withdrawn in the current state.
    #[error("Collateral of party {party} not withdrawable: {reason}")]
    NotWithdrawable {
        /// Party index.
        party: usize,
        /// Why the withdrawal was refused.
        reason: String,
    },

    /// Requested value exceeds the available balance.
    #[error("Insufficient value: required {required}, available {available}")]
    InsufficientValue {
        /// Amount requested.
        required: Amount,
        /// Amount available.
        available: Amount,
    },

    /// Agreement id was never assigned.
    #[error("Agreement {0} not found")]
    AgreementNotFound(AgreementId),

    /// Party index out of range.
    #[error("Party {party} not found in agreement {agreement_id}")]
    PartyNotFound {
        /// Agreement being addressed.
        agreement_id: AgreementId,
        /// Requested party index.
        party: usize,
    },

    /// Only the creator may perform this action.
    #[error("Only the creator of agreement {0} may do this")]
    NotCreator(AgreementId),

    /// Caller is a party but not entitled to this action.
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// Value was attached to a call that does not accept it.
    #[error("Call does not accept value (got {0})")]
    UnexpectedValue(Amount),

    /// Term already carries an open dispute.
    #[error("Term {term} already disputed")]
    DisputeActive {
        /// Term index.
        term: usize,
    },

    /// Term has no open dispute to resolve.
    #[error("Term {term} has no open dispute")]
    NoDispute {
        /// Term index.
        term: usize,
    },

    /// A text field exceeds the configured limit.
    #[error("{field} too long: {len} > {max}")]
    TextTooLong {
        /// Field name.
        field: &'static str,
        /// Actual length in bytes.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Agreement already holds the maximum number of terms.
    #[error("Too many terms: limit {0}")]
    TooManyTerms(usize),

    /// Arithmetic on amounts overflowed.
    #[error("Amount overflow")]
    AmountOverflow,

    /// The treasury could not move value; the call is reverted.
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// A committed transition would break a ledger invariant.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Render a wallet as `0x`-prefixed hex.
pub fn fmt_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}
