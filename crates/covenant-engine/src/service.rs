//! # Covenant Service
//!
//! The entry-point facade. Every mutating call runs the same two-phase
//! sequence under the agreement's lock:
//!
//! 1. read the clock once and clone the record into a draft
//! 2. plan the transition on the draft (`algorithms`)
//! 3. check every ledger invariant against `before → draft`
//! 4. ask the treasury to move the call's value in one batch
//! 5. replace the record, then publish the new events
//!
//! A failure at any step before 5 drops the draft, so the ledger, the
//! treasury and the event log are all left as they were.

use crate::algorithms::{escrow, lifecycle, signatures, terms, TermOutcome};
use crate::config::EngineConfig;
use crate::domain::{
    check_record, check_transition, fmt_address, Address, AgreementId, AgreementParams,
    AgreementRecord, AgreementView, CallContext, CovenantError, PartyView, Settlement,
    TermParams, TermView,
};
use crate::events::CovenantEvent;
use crate::ports::inbound::CovenantApi;
use crate::ports::outbound::{EventSink, LedgerStore, TimeSource, Treasury};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Counters kept by the service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Mutating calls that committed.
    pub calls_committed: u64,
    /// Mutating calls that reverted.
    pub calls_rejected: u64,
    /// Agreements that entered Breached.
    pub breaches_enforced: u64,
}

/// The agreement engine over one ledger deployment.
pub struct CovenantService<S, T, C, E> {
    config: EngineConfig,
    store: Arc<S>,
    treasury: Arc<T>,
    clock: C,
    sink: E,
    stats: RwLock<ServiceStats>,
}

impl<S, T, C, E> CovenantService<S, T, C, E>
where
    S: LedgerStore,
    T: Treasury,
    C: TimeSource,
    E: EventSink,
{
    /// Create a service over the given ports.
    pub fn new(store: Arc<S>, treasury: Arc<T>, clock: C, sink: E, config: EngineConfig) -> Self {
        Self {
            config,
            store,
            treasury,
            clock,
            sink,
            stats: RwLock::new(ServiceStats::default()),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The treasury holding this deployment's collateral.
    pub fn treasury(&self) -> &Arc<T> {
        &self.treasury
    }

    /// Current counters.
    pub fn stats(&self) -> ServiceStats {
        self.stats.read().clone()
    }

    fn reject_value(ctx: &CallContext) -> Result<(), CovenantError> {
        if ctx.value != 0 {
            return Err(CovenantError::UnexpectedValue(ctx.value));
        }
        Ok(())
    }

    fn rejected(&self, id: AgreementId, err: CovenantError) -> CovenantError {
        self.stats.write().calls_rejected += 1;
        warn!(agreement_id = id, "[covenant] Call reverted: {}", err);
        err
    }

    /// A reverted creation has no agreement id to report.
    fn rejected_create(&self, err: CovenantError) -> CovenantError {
        self.stats.write().calls_rejected += 1;
        warn!("[covenant] Agreement creation reverted: {}", err);
        err
    }

    fn publish(&self, events: &[CovenantEvent]) {
        let mut stats = self.stats.write();
        stats.calls_committed += 1;
        for event in events {
            if matches!(event, CovenantEvent::AgreementBreached { .. }) {
                stats.breaches_enforced += 1;
            }
        }
        drop(stats);
        for event in events {
            self.sink.publish(event);
        }
    }

    /// Plan, check, settle and commit one transition of agreement `id`.
    fn commit<R>(
        &self,
        id: AgreementId,
        plan: impl FnOnce(&mut AgreementRecord) -> Result<(R, Settlement), CovenantError>,
    ) -> Result<R, CovenantError> {
        let mut plan = Some(plan);
        let mut output = None;
        let mut emitted = Vec::new();

        let result = self.store.transact(id, &mut |current| {
            let plan = plan
                .take()
                .ok_or_else(|| CovenantError::InvariantViolation("transition replayed".into()))?;
            let mut draft = current.clone();
            let (value, settlement) = plan(&mut draft)?;
            check_transition(current, &draft)?;
            self.treasury.settle(id, &settlement)?;

            emitted = draft.events[current.events.len()..].to_vec();
            output = Some(value);
            Ok(draft)
        });

        match (result, output) {
            (Ok(()), Some(value)) => {
                self.publish(&emitted);
                Ok(value)
            }
            (Ok(()), None) => Err(self.rejected(
                id,
                CovenantError::InvariantViolation("transition produced no result".into()),
            )),
            (Err(err), _) => Err(self.rejected(id, err)),
        }
    }

    /// Run `visit` against the stored record.
    fn view<R>(
        &self,
        id: AgreementId,
        visit: impl FnOnce(&AgreementRecord) -> Result<R, CovenantError>,
    ) -> Result<R, CovenantError> {
        let mut visit = Some(visit);
        let mut output = None;
        self.store.read(id, &mut |record| {
            if let Some(visit) = visit.take() {
                output = Some(visit(record));
            }
        })?;
        output.unwrap_or(Err(CovenantError::AgreementNotFound(id)))
    }
}

impl<S, T, C, E> CovenantApi for CovenantService<S, T, C, E>
where
    S: LedgerStore,
    T: Treasury,
    C: TimeSource,
    E: EventSink,
{
    #[instrument(skip(self, ctx, params), fields(caller = %fmt_address(&ctx.caller)))]
    fn create_agreement(
        &self,
        ctx: CallContext,
        params: AgreementParams,
    ) -> Result<AgreementId, CovenantError> {
        let now = self.clock.now();
        if let Err(err) = Self::reject_value(&ctx) {
            return Err(self.rejected_create(err));
        }

        let mut created = Vec::new();
        let result = self.store.insert(&mut |id| {
            let record =
                signatures::open_agreement(id, ctx.caller, params.clone(), &self.config, now)?;
            check_record(&record)?;
            created = record.events.clone();
            Ok(record)
        });

        match result {
            Ok(id) => {
                info!(
                    agreement_id = id,
                    parties = params.party_wallets.len(),
                    "[covenant] Agreement created"
                );
                self.publish(&created);
                Ok(id)
            }
            Err(err) => Err(self.rejected_create(err)),
        }
    }

    #[instrument(skip(self, ctx), fields(caller = %fmt_address(&ctx.caller), value = %ctx.value))]
    fn sign_agreement(&self, ctx: CallContext, id: AgreementId) -> Result<(), CovenantError> {
        let now = self.clock.now();
        let outcome = self.commit(id, |draft| {
            signatures::admit_signature(draft, &ctx.caller, ctx.value, now)
        })?;

        info!(
            agreement_id = id,
            party = outcome.party,
            deposit = %outcome.deposit,
            "[covenant] Signature admitted"
        );
        if outcome.activated {
            info!(agreement_id = id, "[covenant] Agreement activated");
        }
        Ok(())
    }

    #[instrument(skip(self, ctx, params), fields(caller = %fmt_address(&ctx.caller)))]
    fn add_term(
        &self,
        ctx: CallContext,
        id: AgreementId,
        params: TermParams,
    ) -> Result<usize, CovenantError> {
        let config = &self.config;
        let term = self.commit(id, |draft| {
            Self::reject_value(&ctx)?;
            let term = terms::add_term(draft, &ctx.caller, params, config)?;
            Ok((term, Settlement::default()))
        })?;
        info!(agreement_id = id, term, "[covenant] Term added");
        Ok(term)
    }

    #[instrument(skip(self, ctx), fields(caller = %fmt_address(&ctx.caller)))]
    fn resolve_term(
        &self,
        ctx: CallContext,
        id: AgreementId,
        term: usize,
    ) -> Result<(), CovenantError> {
        let now = self.clock.now();
        let completed = self.commit(id, |draft| {
            Self::reject_value(&ctx)?;
            let completed = terms::resolve_term(draft, &ctx.caller, term, now)?;
            Ok((completed, Settlement::default()))
        })?;
        info!(agreement_id = id, term, "[covenant] Term resolved");
        if completed {
            info!(agreement_id = id, "[covenant] Agreement completed");
        }
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(caller = %fmt_address(&ctx.caller)))]
    fn evaluate_term(
        &self,
        ctx: CallContext,
        id: AgreementId,
        term: usize,
    ) -> Result<TermOutcome, CovenantError> {
        let now = self.clock.now();
        let outcome = self.commit(id, |draft| {
            Self::reject_value(&ctx)?;
            terms::evaluate(draft, term, now)
        })?;
        match outcome {
            TermOutcome::Breached { enforced: true } => {
                info!(agreement_id = id, term, "[covenant] Breach enforced")
            }
            TermOutcome::Breached { enforced: false } => {
                info!(agreement_id = id, term, "[covenant] Breach recorded")
            }
            other => debug!(agreement_id = id, term, ?other, "[covenant] Term evaluated"),
        }
        Ok(outcome)
    }

    #[instrument(skip(self, ctx), fields(caller = %fmt_address(&ctx.caller)))]
    fn enforce_breach(&self, ctx: CallContext, id: AgreementId) -> Result<(), CovenantError> {
        let now = self.clock.now();
        self.commit(id, |draft| {
            Self::reject_value(&ctx)?;
            Ok(((), lifecycle::enforce(draft, now)?))
        })?;
        info!(agreement_id = id, "[covenant] Breach enforced");
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(caller = %fmt_address(&ctx.caller)))]
    fn complete_agreement(&self, ctx: CallContext, id: AgreementId) -> Result<(), CovenantError> {
        let now = self.clock.now();
        self.commit(id, |draft| {
            Self::reject_value(&ctx)?;
            if ctx.caller != draft.agreement.creator {
                signatures::require_party(draft, &ctx.caller)?;
            }
            lifecycle::complete(draft, now)?;
            Ok(((), Settlement::default()))
        })?;
        info!(agreement_id = id, "[covenant] Agreement completed");
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(caller = %fmt_address(&ctx.caller)))]
    fn cancel_agreement(&self, ctx: CallContext, id: AgreementId) -> Result<(), CovenantError> {
        let now = self.clock.now();
        self.commit(id, |draft| {
            Self::reject_value(&ctx)?;
            if ctx.caller != draft.agreement.creator {
                return Err(CovenantError::NotCreator(id));
            }
            lifecycle::cancel(draft, now)?;
            Ok(((), Settlement::default()))
        })?;
        info!(agreement_id = id, "[covenant] Agreement cancelled");
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(caller = %fmt_address(&ctx.caller)))]
    fn withdraw_collateral(
        &self,
        ctx: CallContext,
        id: AgreementId,
        party: usize,
    ) -> Result<(), CovenantError> {
        let now = self.clock.now();
        self.commit(id, |draft| {
            Self::reject_value(&ctx)?;
            Ok(((), escrow::withdraw(draft, party, now)?))
        })?;
        info!(agreement_id = id, party, "[covenant] Collateral withdrawn");
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(caller = %fmt_address(&ctx.caller)))]
    fn raise_dispute(
        &self,
        ctx: CallContext,
        id: AgreementId,
        term: usize,
    ) -> Result<(), CovenantError> {
        let now = self.clock.now();
        self.commit(id, |draft| {
            Self::reject_value(&ctx)?;
            terms::raise_dispute(draft, &ctx.caller, term, now)?;
            Ok(((), Settlement::default()))
        })?;
        info!(agreement_id = id, term, "[covenant] Dispute raised");
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(caller = %fmt_address(&ctx.caller)))]
    fn resolve_dispute(
        &self,
        ctx: CallContext,
        id: AgreementId,
        term: usize,
        upheld: bool,
    ) -> Result<TermOutcome, CovenantError> {
        let now = self.clock.now();
        let outcome = self.commit(id, |draft| {
            Self::reject_value(&ctx)?;
            terms::resolve_dispute(draft, &ctx.caller, term, upheld, now)
        })?;
        info!(agreement_id = id, term, upheld, ?outcome, "[covenant] Dispute resolved");
        Ok(outcome)
    }

    fn get_agreement(&self, id: AgreementId) -> Result<AgreementView, CovenantError> {
        self.view(id, |record| Ok(AgreementView::from(record)))
    }

    fn get_party(&self, id: AgreementId, party: usize) -> Result<PartyView, CovenantError> {
        self.view(id, |record| {
            record
                .parties
                .get(party)
                .map(PartyView::from)
                .ok_or(CovenantError::PartyNotFound {
                    agreement_id: id,
                    party,
                })
        })
    }

    fn get_term(&self, id: AgreementId, term: usize) -> Result<TermView, CovenantError> {
        self.view(id, |record| {
            record
                .terms
                .get(term)
                .map(TermView::from)
                .ok_or(CovenantError::TermNotFound {
                    agreement_id: id,
                    term,
                })
        })
    }

    fn get_user_agreements(&self, wallet: &Address) -> Vec<AgreementId> {
        self.store.agreements_of(wallet)
    }

    fn get_total_agreements(&self) -> u64 {
        self.store.total()
    }

    fn events(&self, id: AgreementId) -> Result<Vec<CovenantEvent>, CovenantError> {
        self.view(id, |record| Ok(record.events.clone()))
    }
}
