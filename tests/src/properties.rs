//! # Property Suite
//!
//! Random call sequences against one three-party agreement. After every
//! call, whether it committed or reverted:
//!
//! - deposits sum to the total collateral, which the treasury holds
//! - party and term counts match the records reachable by index
//! - a terminal status never changes again
//! - a successful withdrawal cannot be repeated
//! - a creator that is also a party never rules on its own obligation, and
//!   no dispute opens after its term's deadline

use crate::fixtures::*;
use covenant_engine::{
    Address, AgreementId, AgreementStatus, Amount, CallContext, CovenantApi, CovenantError,
    Penalty, PenaltyRecipient, TimeSource, Treasury,
};
use proptest::prelude::*;

const WALLETS: [Address; 3] = [ALICE, BOB, CAROL];

/// One call against the agreement under test.
#[derive(Debug, Clone)]
pub enum Op {
    /// Party signs with a deposit.
    Sign {
        /// Party index.
        party: usize,
        /// Deposit.
        value: u64,
    },
    /// Party adds a term.
    AddTerm {
        /// Proposing party.
        by: usize,
        /// Responsible party.
        responsible: usize,
        /// Deadline relative to the current clock.
        due_in: u64,
        /// Penalty amount.
        penalty: u64,
        /// Recipient selector.
        recipient: u8,
    },
    /// Party resolves a term.
    Resolve {
        /// Calling party.
        by: usize,
        /// Term index.
        term: usize,
    },
    /// Keeper evaluates a term.
    Evaluate {
        /// Term index.
        term: usize,
    },
    /// Keeper enforces recorded breaches.
    Enforce,
    /// Creator completes.
    Complete,
    /// Creator cancels.
    Cancel,
    /// Anyone withdraws for a party.
    Withdraw {
        /// Party index.
        party: usize,
    },
    /// Party disputes a term.
    Dispute {
        /// Calling party.
        by: usize,
        /// Term index.
        term: usize,
    },
    /// Creator rules on a dispute.
    Rule {
        /// Term index.
        term: usize,
        /// Ruling.
        upheld: bool,
    },
    /// Clock moves forward.
    Advance {
        /// Seconds.
        secs: u64,
    },
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..3usize, 0..1_000u64).prop_map(|(party, value)| Op::Sign { party, value }),
        3 => (0..3usize, 0..3usize, 0..200u64, 0..1_500u64, 0..4u8).prop_map(
            |(by, responsible, due_in, penalty, recipient)| Op::AddTerm {
                by,
                responsible,
                due_in,
                penalty,
                recipient,
            }
        ),
        2 => (0..3usize, 0..4usize).prop_map(|(by, term)| Op::Resolve { by, term }),
        2 => (0..4usize).prop_map(|term| Op::Evaluate { term }),
        1 => Just(Op::Enforce),
        1 => Just(Op::Complete),
        1 => Just(Op::Cancel),
        2 => (0..3usize).prop_map(|party| Op::Withdraw { party }),
        1 => (0..3usize, 0..4usize).prop_map(|(by, term)| Op::Dispute { by, term }),
        1 => (0..4usize, any::<bool>()).prop_map(|(term, upheld)| Op::Rule { term, upheld }),
        2 => (0..150u64).prop_map(|secs| Op::Advance { secs }),
    ]
}

fn recipient(selector: u8, responsible: usize) -> PenaltyRecipient {
    match selector {
        0 => PenaltyRecipient::Party((responsible + 1) % WALLETS.len()),
        1 => PenaltyRecipient::External([0x77; 20]),
        _ => PenaltyRecipient::Counterparties,
    }
}

/// Apply `op` with `creator` as the agreement's creator, returning the result
/// of the engine call.
fn apply(h: &Harness, id: AgreementId, creator: Address, op: &Op) -> Result<(), CovenantError> {
    let keeper = CallContext::new(KEEPER);
    let creator = CallContext::new(creator);
    match op {
        Op::Sign { party, value } => h.sign(id, WALLETS[*party], Amount::from(*value)),
        Op::AddTerm {
            by,
            responsible,
            due_in,
            penalty,
            recipient: selector,
        } => h
            .term(
                id,
                WALLETS[*by],
                *responsible,
                h.clock.now() + due_in,
                Penalty {
                    amount: Amount::from(*penalty),
                    recipient: recipient(*selector, *responsible),
                },
            )
            .map(|_| ()),
        Op::Resolve { by, term } => h
            .service
            .resolve_term(CallContext::new(WALLETS[*by]), id, *term),
        Op::Evaluate { term } => h.service.evaluate_term(keeper, id, *term).map(|_| ()),
        Op::Enforce => h.service.enforce_breach(keeper, id),
        Op::Complete => h.service.complete_agreement(creator, id),
        Op::Cancel => h.service.cancel_agreement(creator, id),
        Op::Withdraw { party } => h.service.withdraw_collateral(keeper, id, *party),
        Op::Dispute { by, term } => h
            .service
            .raise_dispute(CallContext::new(WALLETS[*by]), id, *term),
        Op::Rule { term, upheld } => h
            .service
            .resolve_dispute(creator, id, *term, *upheld)
            .map(|_| ()),
        Op::Advance { secs } => {
            h.clock.advance(*secs);
            Ok(())
        }
    }
}

/// Check the ledger invariants for `id`, returning the current status.
fn check(h: &Harness, id: AgreementId) -> Result<AgreementStatus, TestCaseError> {
    let view = h
        .service
        .get_agreement(id)
        .map_err(|e| TestCaseError::fail(e.to_string()))?;

    let mut deposits: Amount = 0;
    for party in 0..view.party_count as usize {
        let party_view = h
            .service
            .get_party(id, party)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        deposits += party_view.deposit_amount;
    }
    prop_assert_eq!(deposits, view.total_collateral);
    prop_assert_eq!(h.treasury().held(id), view.total_collateral);

    prop_assert_eq!(view.party_count, WALLETS.len() as u64);
    prop_assert!(h.service.get_party(id, view.party_count as usize).is_err());
    for term in 0..view.term_count as usize {
        prop_assert!(h.service.get_term(id, term).is_ok());
    }
    prop_assert!(h.service.get_term(id, view.term_count as usize).is_err());
    Ok(view.status)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_ledger_invariants_hold(
        auto_enforce in any::<bool>(),
        ops in prop::collection::vec(arb_op(), 1..40),
    ) {
        let h = Harness::new();
        let id = h.create(auto_enforce, &WALLETS);
        let mut status = check(&h, id)?;

        for op in &ops {
            let result = apply(&h, id, CREATOR, op);
            let next = check(&h, id)?;

            if status.is_terminal() {
                prop_assert_eq!(next, status);
            } else if next != status {
                prop_assert!(status.can_transition_to(next));
            }

            if let (Op::Withdraw { party }, Ok(())) = (op, &result) {
                let paid = h.treasury().paid_to(&WALLETS[*party]);
                let again = h
                    .service
                    .withdraw_collateral(CallContext::new(KEEPER), id, *party);
                let refused = matches!(again, Err(CovenantError::NotWithdrawable { .. }));
                prop_assert!(refused);
                prop_assert_eq!(h.treasury().paid_to(&WALLETS[*party]), paid);
                prop_assert_eq!(h.deposit(id, *party), 0);
            }
            status = next;
        }
    }

    #[test]
    fn prop_reverted_calls_leave_no_trace(
        ops in prop::collection::vec(arb_op(), 1..30),
    ) {
        let h = Harness::new();
        let id = h.create(false, &WALLETS);

        for op in &ops {
            let before = h.service.get_agreement(id).unwrap();
            let events_before = h.service.events(id).unwrap();
            if apply(&h, id, CREATOR, op).is_err() {
                let after = h.service.get_agreement(id).unwrap();
                prop_assert_eq!(&after, &before);
                prop_assert_eq!(h.service.events(id).unwrap(), events_before);
            }
        }
    }

    #[test]
    fn prop_party_creator_cannot_dodge_penalties(
        creator_is_party in any::<bool>(),
        ops in prop::collection::vec(arb_op(), 1..40),
    ) {
        let h = Harness::new();
        let creator = if creator_is_party { ALICE } else { CREATOR };
        let id = h.create_by(creator, true, &WALLETS);

        for op in &ops {
            let now = h.clock.now();
            let result = apply(&h, id, creator, op);
            check(&h, id)?;

            match (op, &result) {
                (Op::Dispute { term, .. }, Ok(())) => {
                    let view = h.service.get_term(id, *term).unwrap();
                    prop_assert!(now <= view.deadline);
                }
                (Op::Rule { term, .. }, Ok(())) => {
                    let view = h.service.get_term(id, *term).unwrap();
                    prop_assert_ne!(WALLETS[view.responsible_party], creator);
                }
                (Op::Rule { term, .. }, Err(CovenantError::NotAuthorized(_))) => {
                    let view = h.service.get_term(id, *term).unwrap();
                    prop_assert_eq!(WALLETS[view.responsible_party], creator);
                }
                _ => {}
            }
        }
    }
}
