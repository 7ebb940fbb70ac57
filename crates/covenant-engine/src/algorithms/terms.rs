//! # Term & Deadline Tracker
//!
//! Obligation bookkeeping: adding terms, resolving them, detecting breaches
//! and the dispute pair that gates the breach path.
//!
//! Breach detection: `now > deadline && status == Open && no open dispute`.
//! The deadline itself is still on time.

use super::{lifecycle, signatures};
use crate::config::EngineConfig;
use crate::domain::{
    fmt_address, Address, AgreementRecord, AgreementStatus, CovenantError, Dispute,
    PenaltyRecipient, Settlement, Term, TermParams, TermStatus, Timestamp, ZERO_ADDRESS,
};
use crate::events::CovenantEvent;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What an evaluation found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TermOutcome {
    /// Deadline not yet passed.
    NotDue,
    /// Obligation already fulfilled.
    Resolved,
    /// Overdue or not, an open dispute holds the breach path.
    Disputed,
    /// Breach recorded. `enforced` is true once the agreement entered Breached.
    Breached {
        /// Whether the penalty path has run.
        enforced: bool,
    },
    /// Agreement is not Active; nothing is evaluated.
    Inactive {
        /// Current agreement status.
        status: AgreementStatus,
    },
}

fn term_ref(record: &AgreementRecord, term: usize) -> Result<&Term, CovenantError> {
    record.terms.get(term).ok_or(CovenantError::TermNotFound {
        agreement_id: record.agreement.id,
        term,
    })
}

fn term_mut(record: &mut AgreementRecord, term: usize) -> Result<&mut Term, CovenantError> {
    let agreement_id = record.agreement.id;
    record
        .terms
        .get_mut(term)
        .ok_or(CovenantError::TermNotFound { agreement_id, term })
}

fn require_active(record: &AgreementRecord, to: AgreementStatus) -> Result<(), CovenantError> {
    let status = record.agreement.status;
    if status != AgreementStatus::Active {
        return Err(CovenantError::InvalidStateTransition { from: status, to });
    }
    Ok(())
}

/// Append a term on behalf of `caller`. Returns the new term index.
pub fn add_term(
    record: &mut AgreementRecord,
    caller: &Address,
    params: TermParams,
    config: &EngineConfig,
) -> Result<usize, CovenantError> {
    let agreement_id = record.agreement.id;
    signatures::require_party(record, caller)?;

    let status = record.agreement.status;
    if !matches!(status, AgreementStatus::Pending | AgreementStatus::Active) {
        return Err(CovenantError::InvalidStateTransition {
            from: status,
            to: AgreementStatus::Active,
        });
    }
    if record.terms.len() >= config.max_terms {
        return Err(CovenantError::TooManyTerms(config.max_terms));
    }
    signatures::validate_text("term description", &params.description, config.max_text_len)?;

    let responsible = params.responsible_party;
    let holder = record
        .parties
        .get(responsible)
        .ok_or(CovenantError::PartyNotFound {
            agreement_id,
            party: responsible,
        })?;

    match params.penalty.recipient {
        PenaltyRecipient::Party(to) if to >= record.parties.len() => {
            return Err(CovenantError::PartyNotFound {
                agreement_id,
                party: to,
            });
        }
        PenaltyRecipient::Party(to) if to == responsible => {
            return Err(CovenantError::NotAuthorized(
                "penalty cannot be paid to the breaching party".to_string(),
            ));
        }
        PenaltyRecipient::External(wallet) if wallet == ZERO_ADDRESS => {
            return Err(CovenantError::NotAuthorized(
                "penalty cannot be paid to the zero address".to_string(),
            ));
        }
        _ => {}
    }

    if status == AgreementStatus::Active && params.penalty.amount > holder.deposit_amount {
        return Err(CovenantError::InsufficientValue {
            required: params.penalty.amount,
            available: holder.deposit_amount,
        });
    }

    let index = record.terms.len();
    let deadline = params.deadline;
    record.terms.push(Term::new(params));
    record.emit(CovenantEvent::TermAdded {
        agreement_id,
        term: index,
        responsible_party: responsible,
        deadline,
    });
    Ok(index)
}

/// Mark a term fulfilled. Returns whether this completed the agreement.
pub fn resolve_term(
    record: &mut AgreementRecord,
    caller: &Address,
    term: usize,
    now: Timestamp,
) -> Result<bool, CovenantError> {
    let responsible = term_ref(record, term)?.responsible_party;
    let party = signatures::require_party(record, caller)?;
    if party == responsible {
        return Err(CovenantError::NotAuthorized(format!(
            "{} cannot resolve its own obligation",
            fmt_address(caller)
        )));
    }
    require_active(record, AgreementStatus::Completed)?;

    let target = term_mut(record, term)?;
    match target.status {
        TermStatus::Resolved => return Err(CovenantError::AlreadyResolved { term }),
        TermStatus::Breached => {
            return Err(CovenantError::DeadlinePassed {
                term,
                deadline: target.deadline,
                now,
            })
        }
        TermStatus::Open => {}
    }
    if target.is_overdue(now) {
        return Err(CovenantError::DeadlinePassed {
            term,
            deadline: target.deadline,
            now,
        });
    }

    settle_resolved(record, term, now);
    lifecycle::complete_if_settled(record, now)
}

fn settle_resolved(record: &mut AgreementRecord, term: usize, now: Timestamp) {
    let agreement_id = record.agreement.id;
    let target = &mut record.terms[term];
    target.status = TermStatus::Resolved;
    target.resolved_at = Some(now);
    target.dispute = None;
    record.emit(CovenantEvent::TermResolved {
        agreement_id,
        term,
        at: now,
    });
}

/// Record the breach of an overdue open term. Returns whether a breach was
/// newly recorded.
pub fn mark_breached(record: &mut AgreementRecord, term: usize, now: Timestamp) -> bool {
    let agreement_id = record.agreement.id;
    let Some(target) = record.terms.get_mut(term) else {
        return false;
    };
    if !target.is_breach(now) || target.dispute.is_some() {
        return false;
    }
    target.status = TermStatus::Breached;
    target.breached_at = Some(now);
    let responsible_party = target.responsible_party;
    record.emit(CovenantEvent::TermBreached {
        agreement_id,
        term,
        responsible_party,
        at: now,
    });
    debug!(
        "[covenant] Breach recorded on agreement {} term {}",
        agreement_id, term
    );
    true
}

/// Record every overdue, undisputed open term as breached under one clock
/// reading. Returns the newly breached indexes.
pub fn sweep_overdue(record: &mut AgreementRecord, now: Timestamp) -> Vec<usize> {
    (0..record.terms.len())
        .filter(|&term| mark_breached(record, term, now))
        .collect()
}

/// Evaluate one term against `now`.
///
/// Under auto-enforce a newly found breach runs the breach path in the same
/// call; the returned settlement carries any external penalty payouts.
pub fn evaluate(
    record: &mut AgreementRecord,
    term: usize,
    now: Timestamp,
) -> Result<(TermOutcome, Settlement), CovenantError> {
    let current = term_ref(record, term)?;
    let (term_status, disputed, overdue) =
        (current.status, current.dispute.is_some(), current.is_overdue(now));
    let status = record.agreement.status;
    if status != AgreementStatus::Active {
        return Ok((TermOutcome::Inactive { status }, Settlement::default()));
    }

    let outcome = match term_status {
        TermStatus::Resolved => TermOutcome::Resolved,
        TermStatus::Breached => TermOutcome::Breached { enforced: false },
        TermStatus::Open if disputed => TermOutcome::Disputed,
        TermStatus::Open if !overdue => TermOutcome::NotDue,
        TermStatus::Open => {
            mark_breached(record, term, now);
            if record.agreement.auto_enforce {
                let settlement = lifecycle::enter_breached(record, now)?;
                return Ok((TermOutcome::Breached { enforced: true }, settlement));
            }
            TermOutcome::Breached { enforced: false }
        }
    };
    Ok((outcome, Settlement::default()))
}

/// Open a dispute on an open term of an Active agreement.
pub fn raise_dispute(
    record: &mut AgreementRecord,
    caller: &Address,
    term: usize,
    now: Timestamp,
) -> Result<(), CovenantError> {
    let agreement_id = record.agreement.id;
    term_ref(record, term)?;
    let party = signatures::require_party(record, caller)?;
    require_active(record, AgreementStatus::Breached)?;

    let target = term_mut(record, term)?;
    match target.status {
        TermStatus::Resolved => return Err(CovenantError::AlreadyResolved { term }),
        TermStatus::Breached => {
            return Err(CovenantError::DeadlinePassed {
                term,
                deadline: target.deadline,
                now,
            })
        }
        TermStatus::Open => {}
    }
    if target.is_overdue(now) {
        return Err(CovenantError::DeadlinePassed {
            term,
            deadline: target.deadline,
            now,
        });
    }
    if target.dispute.is_some() {
        return Err(CovenantError::DisputeActive { term });
    }
    target.dispute = Some(Dispute {
        raised_by: party,
        raised_at: now,
    });
    record.emit(CovenantEvent::DisputeRaised {
        agreement_id,
        term,
        party,
    });
    Ok(())
}

/// Rule on an open dispute as the agreement's arbiter (its creator).
///
/// Upheld: the term is resolved and the agreement may complete. Rejected: the
/// dispute is dropped and, if the term is overdue, its breach is recorded and
/// enforced under auto-enforce.
///
/// A creator that is itself responsible for the term cannot rule on it, and
/// an upheld ruling only resolves a dispute raised on or before the deadline.
pub fn resolve_dispute(
    record: &mut AgreementRecord,
    caller: &Address,
    term: usize,
    upheld: bool,
    now: Timestamp,
) -> Result<(TermOutcome, Settlement), CovenantError> {
    let agreement_id = record.agreement.id;
    term_ref(record, term)?;
    if *caller != record.agreement.creator {
        return Err(CovenantError::NotCreator(agreement_id));
    }
    let responsible = term_ref(record, term)?.responsible_party;
    if record.parties[responsible].wallet == *caller {
        return Err(CovenantError::NotAuthorized(format!(
            "{} cannot rule on its own obligation",
            fmt_address(caller)
        )));
    }
    require_active(record, AgreementStatus::Breached)?;

    let target = term_mut(record, term)?;
    let Some(dispute) = target.dispute else {
        return Err(CovenantError::NoDispute { term });
    };
    if upheld && dispute.raised_at > target.deadline {
        return Err(CovenantError::DeadlinePassed {
            term,
            deadline: target.deadline,
            now: dispute.raised_at,
        });
    }
    target.dispute = None;
    record.emit(CovenantEvent::DisputeResolved {
        agreement_id,
        term,
        upheld,
    });

    if upheld {
        settle_resolved(record, term, now);
        lifecycle::complete_if_settled(record, now)?;
        return Ok((TermOutcome::Resolved, Settlement::default()));
    }
    evaluate(record, term, now)
}
