//! # Escrow Flows
//!
//! Penalty routing, shortfalls, withdrawals after a breach and atomicity
//! when the treasury refuses a settlement.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use covenant_engine::{
        AgreementStatus, CallContext, CovenantApi, CovenantError, CovenantEvent, Penalty,
        PenaltyRecipient, TermOutcome, Treasury,
    };

    const ARBITER: [u8; 20] = [0x77; 20];

    fn balanced(h: &Harness, id: u64) -> bool {
        let view = h.service.get_agreement(id).unwrap();
        let sum: u128 = (0..view.party_count as usize)
            .map(|i| h.deposit(id, i))
            .sum();
        sum == view.total_collateral && h.treasury().held(id) == view.total_collateral
    }

    // =========================================================================
    // EXPLICIT ENFORCEMENT
    // =========================================================================

    #[test]
    fn test_recorded_breach_waits_for_enforcement() {
        let h = Harness::new();
        let id = h.activate(false, &[ALICE, BOB], &[UNIT, UNIT]);
        let term = h.term(id, BOB, 0, START + 100, to_party(UNIT / 2, 1)).unwrap();

        let early = h.service.enforce_breach(CallContext::new(KEEPER), id);
        assert!(matches!(
            early,
            Err(CovenantError::InvalidStateTransition { .. })
        ));

        h.clock.advance(101);
        let outcome = h
            .service
            .evaluate_term(CallContext::new(KEEPER), id, term)
            .unwrap();
        assert_eq!(outcome, TermOutcome::Breached { enforced: false });
        assert_eq!(h.status(id), AgreementStatus::Active);
        assert_eq!(h.deposit(id, 0), UNIT);

        let repeat = h
            .service
            .evaluate_term(CallContext::new(KEEPER), id, term)
            .unwrap();
        assert_eq!(repeat, TermOutcome::Breached { enforced: false });

        h.service.enforce_breach(CallContext::new(KEEPER), id).unwrap();
        assert_eq!(h.status(id), AgreementStatus::Breached);
        assert_eq!(h.deposit(id, 0), UNIT / 2);
        assert_eq!(h.deposit(id, 1), UNIT + UNIT / 2);
        assert!(balanced(&h, id));

        let after = h
            .service
            .evaluate_term(CallContext::new(KEEPER), id, term)
            .unwrap();
        assert_eq!(
            after,
            TermOutcome::Inactive {
                status: AgreementStatus::Breached
            }
        );
    }

    #[test]
    fn test_enforce_sweeps_overdue_terms() {
        let h = Harness::new();
        let id = h.activate(false, &[ALICE, BOB], &[UNIT, UNIT]);
        h.term(id, BOB, 0, START + 10, to_party(10, 1)).unwrap();
        h.term(id, ALICE, 1, START + 20, to_party(20, 0)).unwrap();
        h.term(id, ALICE, 1, START + 10_000, to_party(30, 0)).unwrap();
        h.clock.advance(500);

        h.service.enforce_breach(CallContext::new(KEEPER), id).unwrap();

        let breached = h.service.events(id).unwrap().into_iter().find_map(|e| match e {
            CovenantEvent::AgreementBreached { terms, .. } => Some(terms),
            _ => None,
        });
        assert_eq!(breached, Some(vec![0, 1]));
        assert_eq!(h.deposit(id, 0), UNIT - 10 + 20);
        assert_eq!(h.deposit(id, 1), UNIT + 10 - 20);
        assert!(balanced(&h, id));
    }

    #[test]
    fn test_breached_party_remainder_stays_locked() {
        let h = Harness::new();
        let id = h.activate(true, &[ALICE, BOB], &[UNIT, UNIT]);
        let term = h.term(id, BOB, 0, START + 5, to_party(UNIT / 4, 1)).unwrap();
        h.clock.advance(6);
        h.service
            .evaluate_term(CallContext::new(KEEPER), id, term)
            .unwrap();

        let result = h.service.withdraw_collateral(CallContext::new(ALICE), id, 0);
        assert!(matches!(result, Err(CovenantError::NotWithdrawable { party: 0, .. })));
        assert_eq!(h.treasury().paid_to(&ALICE), 0);
        assert_eq!(h.deposit(id, 0), UNIT - UNIT / 4);

        h.service.withdraw_collateral(CallContext::new(BOB), id, 1).unwrap();
        assert_eq!(h.treasury().paid_to(&BOB), UNIT + UNIT / 4);
        assert_eq!(h.treasury().held(id), UNIT - UNIT / 4);
        assert!(balanced(&h, id));
    }

    #[test]
    fn test_every_breaching_party_is_locked() {
        let h = Harness::new();
        let id = h.activate(false, &[ALICE, BOB, CAROL], &[100, 100, 100]);
        h.term(id, BOB, 0, START + 5, to_party(30, 2)).unwrap();
        h.term(id, ALICE, 1, START + 5, to_party(10, 2)).unwrap();
        h.clock.advance(6);
        h.service
            .enforce_breach(CallContext::new(KEEPER), id)
            .unwrap();

        for party in [0, 1] {
            assert!(matches!(
                h.service.withdraw_collateral(CallContext::new(KEEPER), id, party),
                Err(CovenantError::NotWithdrawable { .. })
            ));
        }
        h.service
            .withdraw_collateral(CallContext::new(KEEPER), id, 2)
            .unwrap();
        assert_eq!(h.treasury().paid_to(&CAROL), 140);
        assert_eq!(h.treasury().held(id), 160);
    }

    // =========================================================================
    // PENALTY ROUTING
    // =========================================================================

    #[test]
    fn test_shortfall_capped_at_deposit() {
        let h = Harness::new();
        let id = h.create(true, &[ALICE, BOB, CAROL]);
        h.term(id, BOB, 0, START + 5, to_counterparties(2 * UNIT)).unwrap();
        for wallet in [ALICE, BOB, CAROL] {
            h.sign(id, wallet, UNIT).unwrap();
        }
        h.clock.advance(10);
        h.service
            .evaluate_term(CallContext::new(KEEPER), id, 0)
            .unwrap();

        assert_eq!(h.deposit(id, 0), 0);
        assert_eq!(h.deposit(id, 1), UNIT + UNIT / 2);
        assert_eq!(h.deposit(id, 2), UNIT + UNIT / 2);
        let shortfall = h.service.events(id).unwrap().into_iter().find_map(|e| match e {
            CovenantEvent::PenaltyApplied {
                applied, shortfall, ..
            } => Some((applied, shortfall)),
            _ => None,
        });
        assert_eq!(shortfall, Some((UNIT, UNIT)));
        assert!(balanced(&h, id));
    }

    #[test]
    fn test_counterparty_split_remainder_to_first() {
        let h = Harness::new();
        let id = h.activate(true, &[ALICE, BOB, CAROL], &[100, 0, 0]);
        h.term(id, BOB, 0, START + 5, to_counterparties(7)).unwrap();
        h.clock.advance(10);
        h.service
            .evaluate_term(CallContext::new(KEEPER), id, 0)
            .unwrap();

        assert_eq!(h.deposit(id, 0), 93);
        assert_eq!(h.deposit(id, 1), 4);
        assert_eq!(h.deposit(id, 2), 3);
    }

    #[test]
    fn test_penalty_above_deposit_rejected_once_active() {
        let h = Harness::new();
        let id = h.activate(false, &[ALICE, BOB], &[10, 10]);
        let result = h.term(id, BOB, 0, START + 5, to_party(11, 1));
        assert!(matches!(
            result,
            Err(CovenantError::InsufficientValue {
                required: 11,
                available: 10
            })
        ));
        assert_eq!(h.service.get_agreement(id).unwrap().term_count, 0);
    }

    // =========================================================================
    // ATOMICITY
    // =========================================================================

    #[test]
    fn test_external_payout_failure_keeps_active() {
        let h = Harness::new();
        let id = h.activate(false, &[ALICE, BOB], &[UNIT, UNIT]);
        let penalty = Penalty {
            amount: UNIT / 2,
            recipient: PenaltyRecipient::External(ARBITER),
        };
        h.term(id, BOB, 0, START + 5, penalty).unwrap();
        h.clock.advance(10);
        let events_before = h.service.events(id).unwrap().len();

        h.treasury().halt();
        let failed = h.service.enforce_breach(CallContext::new(KEEPER), id);
        assert!(matches!(failed, Err(CovenantError::TransferFailed(_))));
        assert_eq!(h.status(id), AgreementStatus::Active);
        assert_eq!(h.deposit(id, 0), UNIT);
        assert_eq!(h.service.events(id).unwrap().len(), events_before);
        assert_eq!(
            h.service.get_term(id, 0).unwrap().status,
            covenant_engine::TermStatus::Open
        );

        h.treasury().resume();
        h.service.enforce_breach(CallContext::new(KEEPER), id).unwrap();
        assert_eq!(h.status(id), AgreementStatus::Breached);
        assert_eq!(h.treasury().paid_to(&ARBITER), UNIT / 2);
        assert_eq!(h.treasury().held(id), UNIT + UNIT / 2);
        assert!(balanced(&h, id));
    }

    #[test]
    fn test_signature_reverts_when_deposit_refused() {
        let h = Harness::new();
        let id = h.create(false, &[ALICE, BOB]);
        let published = h.sink.events().len();

        h.treasury().halt();
        assert!(matches!(
            h.sign(id, ALICE, UNIT),
            Err(CovenantError::TransferFailed(_))
        ));
        let party = h.service.get_party(id, 0).unwrap();
        assert!(!party.has_signed);
        assert_eq!(party.deposit_amount, 0);
        assert_eq!(h.sink.events().len(), published);

        h.treasury().resume();
        h.sign(id, ALICE, UNIT).unwrap();
        assert_eq!(h.deposit(id, 0), UNIT);
        assert!(balanced(&h, id));
    }

    #[test]
    fn test_value_on_non_signing_call_rejected() {
        let h = Harness::new();
        let id = h.activate(false, &[ALICE, BOB], &[0, 0]);
        let term = h.term(id, BOB, 0, START + 50, to_party(0, 1)).unwrap();

        let result = h
            .service
            .resolve_term(CallContext::with_value(BOB, 5), id, term);
        assert!(matches!(result, Err(CovenantError::UnexpectedValue(5))));
        assert_eq!(h.status(id), AgreementStatus::Active);
        assert_eq!(h.treasury().received_from(&BOB), 0);
    }
}
