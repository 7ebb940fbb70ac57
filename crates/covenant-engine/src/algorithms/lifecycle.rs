//! # Lifecycle Controller
//!
//! Owns every status change of an agreement.
//!
//! ```text
//! Pending ──activate──→ Active ──complete──→ Completed
//!    │                    │
//!    └──cancel──→ Cancelled  └──enter_breached──→ Breached
//! ```

use super::{escrow, terms};
use crate::domain::{
    AgreementRecord, AgreementStatus, CovenantError, Settlement, TermStatus, Timestamp,
};
use crate::events::CovenantEvent;
use tracing::debug;

/// Move the agreement to `next`, failing if the state machine forbids it.
pub fn transition(
    record: &mut AgreementRecord,
    next: AgreementStatus,
    now: Timestamp,
) -> Result<(), CovenantError> {
    let current = record.agreement.status;
    if !current.can_transition_to(next) {
        return Err(CovenantError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    record.agreement.status = next;
    if next.is_terminal() {
        record.agreement.closed_at = Some(now);
    }
    debug!(
        "[covenant] Agreement {} {} -> {}",
        record.agreement.id, current, next
    );
    Ok(())
}

/// Pending → Active, stamping the activation time.
pub fn activate(record: &mut AgreementRecord, now: Timestamp) -> Result<(), CovenantError> {
    transition(record, AgreementStatus::Active, now)?;
    record.agreement.activated_at = now;
    record.emit(CovenantEvent::AgreementActivated {
        agreement_id: record.agreement.id,
        at: now,
    });
    Ok(())
}

/// Pending → Cancelled. Deposits stay in escrow until withdrawn.
pub fn cancel(record: &mut AgreementRecord, now: Timestamp) -> Result<(), CovenantError> {
    transition(record, AgreementStatus::Cancelled, now)?;
    record.emit(CovenantEvent::AgreementCancelled {
        agreement_id: record.agreement.id,
        at: now,
    });
    Ok(())
}

/// Active → Completed. Every term must be resolved; an agreement with no
/// terms completes trivially.
pub fn complete(record: &mut AgreementRecord, now: Timestamp) -> Result<(), CovenantError> {
    let agreement_id = record.agreement.id;
    if record.terms.iter().any(|t| t.status != TermStatus::Resolved) {
        return Err(CovenantError::InvalidStateTransition {
            from: record.agreement.status,
            to: AgreementStatus::Completed,
        });
    }
    transition(record, AgreementStatus::Completed, now)?;
    record.emit(CovenantEvent::AgreementCompleted {
        agreement_id,
        at: now,
    });
    Ok(())
}

/// Complete the agreement if it is Active, has terms, and all are resolved.
///
/// Returns whether the agreement completed.
pub fn complete_if_settled(
    record: &mut AgreementRecord,
    now: Timestamp,
) -> Result<bool, CovenantError> {
    let settled = record.agreement.status == AgreementStatus::Active
        && !record.terms.is_empty()
        && record.terms.iter().all(|t| t.status == TermStatus::Resolved);
    if settled {
        complete(record, now)?;
    }
    Ok(settled)
}

/// Active → Breached, applying the penalty of every enforceable term.
///
/// Returns the settlement for any external penalty payouts.
pub fn enter_breached(
    record: &mut AgreementRecord,
    now: Timestamp,
) -> Result<Settlement, CovenantError> {
    let enforceable: Vec<usize> = record
        .terms
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_enforceable())
        .map(|(i, _)| i)
        .collect();
    if enforceable.is_empty() {
        return Err(CovenantError::InvalidStateTransition {
            from: record.agreement.status,
            to: AgreementStatus::Breached,
        });
    }

    transition(record, AgreementStatus::Breached, now)?;
    let settlement = escrow::apply_penalties(record, &enforceable)?;
    record.emit(CovenantEvent::AgreementBreached {
        agreement_id: record.agreement.id,
        terms: enforceable,
        at: now,
    });
    Ok(settlement)
}

/// Explicit enforcement: record every overdue breach, then enter Breached.
pub fn enforce(record: &mut AgreementRecord, now: Timestamp) -> Result<Settlement, CovenantError> {
    let status = record.agreement.status;
    if status != AgreementStatus::Active {
        return Err(CovenantError::InvalidStateTransition {
            from: status,
            to: AgreementStatus::Breached,
        });
    }
    terms::sweep_overdue(record, now);
    enter_breached(record, now)
}
