//! # Collateral Escrow
//!
//! The only code that touches `deposit_amount` or `total_collateral`.
//! Three call sites move value: signing (deposit), breach (penalty) and
//! withdrawal. Each returns the [`Settlement`] the treasury must perform.

use crate::domain::{
    fmt_address, AgreementRecord, AgreementStatus, Amount, CovenantError, EscrowEntry,
    PenaltyRecipient, Settlement, TermStatus, Timestamp,
};
use crate::events::CovenantEvent;
use tracing::debug;

/// Lock `amount` for `party`.
pub fn deposit(
    record: &mut AgreementRecord,
    party: usize,
    amount: Amount,
    now: Timestamp,
) -> Result<Settlement, CovenantError> {
    if amount == 0 {
        return Ok(Settlement::default());
    }

    let new_total = record
        .agreement
        .total_collateral
        .checked_add(amount)
        .ok_or(CovenantError::AmountOverflow)?;
    let holder = &mut record.parties[party];
    holder.deposit_amount = holder
        .deposit_amount
        .checked_add(amount)
        .ok_or(CovenantError::AmountOverflow)?;
    record.agreement.total_collateral = new_total;
    record.journal.push(EscrowEntry::Deposit {
        party,
        amount,
        at: now,
    });

    Ok(Settlement::receive(holder.wallet, amount))
}

fn credit(
    record: &mut AgreementRecord,
    term: usize,
    from: usize,
    to: usize,
    amount: Amount,
) -> Result<(), CovenantError> {
    if amount == 0 {
        return Ok(());
    }
    let agreement_id = record.agreement.id;
    let target = record
        .parties
        .get_mut(to)
        .ok_or(CovenantError::PartyNotFound {
            agreement_id,
            party: to,
        })?;
    target.deposit_amount = target
        .deposit_amount
        .checked_add(amount)
        .ok_or(CovenantError::AmountOverflow)?;
    record.journal.push(EscrowEntry::PenaltyCredit {
        term,
        from,
        to,
        amount,
    });
    Ok(())
}

/// Move the penalty of every listed term out of its breaching party's deposit.
///
/// The amount applied is capped at what the breaching party still holds; the
/// uncovered remainder is reported as `shortfall` in the event.
pub fn apply_penalties(
    record: &mut AgreementRecord,
    terms: &[usize],
) -> Result<Settlement, CovenantError> {
    let agreement_id = record.agreement.id;
    let mut settlement = Settlement::default();

    for &index in terms {
        let term = record
            .terms
            .get(index)
            .ok_or(CovenantError::TermNotFound {
                agreement_id,
                term: index,
            })?;
        if term.penalty_applied {
            continue;
        }
        let from = term.responsible_party;
        let penalty = term.penalty;
        let available = record.parties[from].deposit_amount;
        let applied = penalty.amount.min(available);
        let shortfall = penalty.amount - applied;

        record.parties[from].deposit_amount -= applied;
        match penalty.recipient {
            PenaltyRecipient::Party(to) => credit(record, index, from, to, applied)?,
            PenaltyRecipient::Counterparties => {
                let others: Vec<usize> = (0..record.parties.len()).filter(|&i| i != from).collect();
                let count = others.len() as Amount;
                let share = applied / count;
                let remainder = applied % count;
                for (n, to) in others.into_iter().enumerate() {
                    let amount = if n == 0 { share + remainder } else { share };
                    credit(record, index, from, to, amount)?;
                }
            }
            PenaltyRecipient::External(wallet) => {
                record.agreement.total_collateral -= applied;
                if applied > 0 {
                    record.journal.push(EscrowEntry::PenaltyPayout {
                        term: index,
                        from,
                        to: wallet,
                        amount: applied,
                    });
                    settlement.extend(Settlement::pay(wallet, applied));
                }
            }
        }

        record.terms[index].penalty_applied = true;
        record.emit(CovenantEvent::PenaltyApplied {
            agreement_id,
            term: index,
            from_party: from,
            recipient: penalty.recipient,
            applied,
            shortfall,
        });
        debug!(
            "[covenant] Penalty on agreement {} term {}: applied {} shortfall {}",
            agreement_id, index, applied, shortfall
        );
    }

    Ok(settlement)
}

/// Whether `party` is responsible for a term whose penalty was enforced.
pub fn is_breaching_party(record: &AgreementRecord, party: usize) -> bool {
    record.terms.iter().any(|t| {
        t.responsible_party == party && t.status == TermStatus::Breached && t.penalty_applied
    })
}

/// Release the remaining deposit of `party` back to its wallet.
///
/// After a breach only the non-breaching parties may withdraw; a breaching
/// party's remainder stays locked in escrow.
pub fn withdraw(
    record: &mut AgreementRecord,
    party: usize,
    now: Timestamp,
) -> Result<Settlement, CovenantError> {
    let agreement_id = record.agreement.id;
    let status = record.agreement.status;
    let holder = record
        .parties
        .get(party)
        .ok_or(CovenantError::PartyNotFound {
            agreement_id,
            party,
        })?;

    if !status.is_withdrawable() {
        return Err(CovenantError::NotWithdrawable {
            party,
            reason: format!("agreement is {status}"),
        });
    }
    if holder.has_withdrawn {
        return Err(CovenantError::NotWithdrawable {
            party,
            reason: "already withdrawn".to_string(),
        });
    }
    if status == AgreementStatus::Breached && is_breaching_party(record, party) {
        return Err(CovenantError::NotWithdrawable {
            party,
            reason: "breaching party remainder stays locked".to_string(),
        });
    }

    let wallet = holder.wallet;
    let amount = holder.deposit_amount;
    let available = record.agreement.total_collateral;
    let remaining = available
        .checked_sub(amount)
        .ok_or(CovenantError::InsufficientValue {
            required: amount,
            available,
        })?;

    let holder = &mut record.parties[party];
    holder.deposit_amount = 0;
    holder.has_withdrawn = true;
    record.agreement.total_collateral = remaining;
    record.journal.push(EscrowEntry::Withdrawal {
        party,
        to: wallet,
        amount,
        at: now,
    });
    record.emit(CovenantEvent::CollateralWithdrawn {
        agreement_id,
        party,
        wallet,
        amount,
    });
    debug!(
        "[covenant] Releasing {} to {} from agreement {}",
        amount,
        fmt_address(&wallet),
        agreement_id
    );

    Ok(Settlement::pay(wallet, amount))
}
