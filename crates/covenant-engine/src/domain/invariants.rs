//! # Domain Invariants
//!
//! Ledger rules checked against every draft before it is committed.
//! A failing check turns into [`CovenantError::InvariantViolation`] and the
//! call reverts.

use super::entities::AgreementRecord;
use super::errors::{Amount, CovenantError};
use super::value_objects::TermStatus;

fn violation(msg: impl Into<String>) -> CovenantError {
    CovenantError::InvariantViolation(msg.into())
}

/// Invariant: Σ party deposits == total collateral == journal inflow − outflow.
pub fn invariant_collateral_balanced(record: &AgreementRecord) -> Result<(), CovenantError> {
    let mut deposits: Amount = 0;
    for party in &record.parties {
        deposits = deposits
            .checked_add(party.deposit_amount)
            .ok_or(CovenantError::AmountOverflow)?;
    }
    if deposits != record.agreement.total_collateral {
        return Err(violation(format!(
            "deposits {} != total collateral {}",
            deposits, record.agreement.total_collateral
        )));
    }

    let mut net: Amount = 0;
    for entry in &record.journal {
        net = net
            .checked_add(entry.inflow())
            .and_then(|n| n.checked_sub(entry.outflow()))
            .ok_or_else(|| violation("escrow journal pays out more than it received"))?;
    }
    if net != record.agreement.total_collateral {
        return Err(violation(format!(
            "journal balance {} != total collateral {}",
            net, record.agreement.total_collateral
        )));
    }
    Ok(())
}

/// Invariant: every index stored inside the record points at a live record.
pub fn invariant_references_valid(record: &AgreementRecord) -> Result<(), CovenantError> {
    let parties = record.parties.len();
    for (index, term) in record.terms.iter().enumerate() {
        if term.responsible_party >= parties {
            return Err(violation(format!("term {index} references missing party")));
        }
        if let Some(dispute) = term.dispute {
            if dispute.raised_by >= parties {
                return Err(violation(format!("term {index} dispute by missing party")));
            }
        }
        if term.status == TermStatus::Breached {
            match term.breached_at {
                Some(at) if at > term.deadline => {}
                _ => return Err(violation(format!("term {index} breached before deadline"))),
            }
        }
    }
    Ok(())
}

/// Invariant: a transition from `before` to `after` respects monotonicity.
///
/// - immutable header fields never change
/// - status only moves along the lifecycle machine
/// - `activated_at` is set exactly once
/// - no party or term record disappears
/// - `has_signed` / `has_withdrawn` never revert
/// - resolved and breached terms stay that way
pub fn invariant_monotonic(
    before: &AgreementRecord,
    after: &AgreementRecord,
) -> Result<(), CovenantError> {
    let (a, b) = (&before.agreement, &after.agreement);
    if a.id != b.id
        || a.title != b.title
        || a.description != b.description
        || a.creator != b.creator
        || a.created_at != b.created_at
        || a.auto_enforce != b.auto_enforce
    {
        return Err(violation("immutable agreement field changed"));
    }
    if a.status != b.status && !a.status.can_transition_to(b.status) {
        return Err(CovenantError::InvalidStateTransition {
            from: a.status,
            to: b.status,
        });
    }
    if a.activated_at != 0 && a.activated_at != b.activated_at {
        return Err(violation("activation time rewritten"));
    }
    if after.parties.len() != before.parties.len() {
        return Err(violation("party records added or removed"));
    }
    if after.terms.len() < before.terms.len() || after.journal.len() < before.journal.len() {
        return Err(violation("records removed"));
    }
    for (old, new) in before.parties.iter().zip(&after.parties) {
        if old.wallet != new.wallet || old.name != new.name {
            return Err(violation("party identity changed"));
        }
        if (old.has_signed && !new.has_signed) || (old.has_withdrawn && !new.has_withdrawn) {
            return Err(violation("party flag reverted"));
        }
    }
    for (index, (old, new)) in before.terms.iter().zip(&after.terms).enumerate() {
        if old.status != TermStatus::Open && old.status != new.status {
            return Err(violation(format!("term {index} left a settled state")));
        }
        if old.penalty_applied && !new.penalty_applied {
            return Err(violation(format!("term {index} penalty un-applied")));
        }
    }
    if before.journal[..] != after.journal[..before.journal.len()] {
        return Err(violation("escrow journal rewritten"));
    }
    Ok(())
}

/// Run every invariant against a freshly created record.
pub fn check_record(record: &AgreementRecord) -> Result<(), CovenantError> {
    invariant_collateral_balanced(record)?;
    invariant_references_valid(record)
}

/// Run every invariant against a draft transition.
pub fn check_transition(
    before: &AgreementRecord,
    after: &AgreementRecord,
) -> Result<(), CovenantError> {
    invariant_monotonic(before, after)?;
    check_record(after)
}
