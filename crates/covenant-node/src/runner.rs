//! Script replay against one in-memory deployment.
//!
//! Engine reverts are part of a script's expected output and are reported
//! per step. Malformed input (bad hex, unknown fields) aborts the run.

use crate::script::{parse_address, Script, Step};
use anyhow::{Context, Result};
use covenant_engine::{
    fmt_address, AgreementParams, AgreementView, CallContext, CovenantApi, CovenantError,
    CovenantService, EngineConfig, InMemoryLedgerStore, InMemoryTreasury, ManualClock,
    NoopEventSink, PartyView, PenaltyRecipient, TermParams, TermView, TimeSource, Timestamp,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// The service a script runs against.
pub type ScriptService =
    CovenantService<InMemoryLedgerStore, InMemoryTreasury, ManualClock, NoopEventSink>;

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    /// Position in the script.
    pub step: usize,
    /// Step tag.
    pub op: &'static str,
    /// Clock reading the step ran at.
    pub now: Timestamp,
    /// Whether the call committed.
    pub ok: bool,
    /// Returned value, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Revert reason, if the call failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a whole script.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// Per-step outcomes.
    pub steps: Vec<StepReport>,
    /// Agreements created.
    pub total_agreements: u64,
    /// Calls that committed.
    pub calls_committed: u64,
    /// Calls that reverted.
    pub calls_rejected: u64,
    /// Agreements that entered Breached.
    pub breaches_enforced: u64,
}

/// Replays scripts against a fresh deployment.
pub struct Runner {
    service: ScriptService,
    clock: ManualClock,
}

impl Runner {
    /// Fresh deployment with an empty ledger.
    pub fn new(config: EngineConfig) -> Self {
        let clock = ManualClock::at(0);
        let service = CovenantService::new(
            Arc::new(InMemoryLedgerStore::new()),
            Arc::new(InMemoryTreasury::new()),
            clock.clone(),
            NoopEventSink,
            config,
        );
        Self { service, clock }
    }

    /// The underlying service.
    pub fn service(&self) -> &ScriptService {
        &self.service
    }

    /// Run every step from the script's start time. With `fail_fast` the
    /// run stops after the first revert.
    pub fn run(&self, script: &Script, fail_fast: bool) -> Result<RunReport> {
        self.clock.set(script.start_time);
        let mut steps = Vec::with_capacity(script.steps.len());
        for (index, step) in script.steps.iter().enumerate() {
            let outcome = self
                .execute(step)
                .with_context(|| format!("step {index} ({})", step.op()))?;
            let now = self.clock.now();
            let report = match outcome {
                Ok(result) => StepReport {
                    step: index,
                    op: step.op(),
                    now,
                    ok: true,
                    result,
                    error: None,
                },
                Err(err) => StepReport {
                    step: index,
                    op: step.op(),
                    now,
                    ok: false,
                    result: None,
                    error: Some(err.to_string()),
                },
            };
            debug!(step = index, op = step.op(), ok = report.ok, "[covenant] Step done");
            let failed = !report.ok;
            steps.push(report);
            if failed && fail_fast {
                info!(step = index, "[covenant] Stopping at first revert");
                break;
            }
        }

        let stats = self.service.stats();
        Ok(RunReport {
            steps,
            total_agreements: self.service.get_total_agreements(),
            calls_committed: stats.calls_committed,
            calls_rejected: stats.calls_rejected,
            breaches_enforced: stats.breaches_enforced,
        })
    }

    /// Execute one step. The outer error is bad input, the inner one a revert.
    fn execute(&self, step: &Step) -> Result<Result<Option<Value>, CovenantError>> {
        let api = &self.service;
        let outcome = match step {
            Step::AdvanceTime { secs } => {
                self.clock.advance(*secs);
                Ok(None)
            }
            Step::SetTime { now } => {
                self.clock.set(*now);
                Ok(None)
            }
            Step::CreateAgreement {
                caller,
                title,
                description,
                parties,
                auto_enforce,
            } => {
                let ctx = CallContext::new(parse_address(caller)?);
                let party_wallets = parties
                    .iter()
                    .map(|p| parse_address(&p.wallet))
                    .collect::<Result<Vec<_>>>()?;
                let params = AgreementParams {
                    title: title.clone(),
                    description: description.clone(),
                    party_wallets,
                    party_names: parties.iter().map(|p| p.name.clone()).collect(),
                    auto_enforce: *auto_enforce,
                };
                api.create_agreement(ctx, params)
                    .map(|id| Some(json!({ "agreement_id": id })))
            }
            Step::SignAgreement {
                caller,
                agreement,
                value,
            } => {
                let ctx = CallContext::with_value(parse_address(caller)?, u128::from(*value));
                api.sign_agreement(ctx, *agreement).map(|()| None)
            }
            Step::AddTerm {
                caller,
                agreement,
                description,
                responsible_party,
                deadline,
                penalty,
            } => {
                let ctx = CallContext::new(parse_address(caller)?);
                let params = TermParams {
                    description: description.clone(),
                    responsible_party: *responsible_party,
                    deadline: *deadline,
                    penalty: penalty.to_penalty()?,
                };
                api.add_term(ctx, *agreement, params)
                    .map(|term| Some(json!({ "term": term })))
            }
            Step::ResolveTerm {
                caller,
                agreement,
                term,
            } => {
                let ctx = CallContext::new(parse_address(caller)?);
                api.resolve_term(ctx, *agreement, *term).map(|()| None)
            }
            Step::EvaluateTerm {
                caller,
                agreement,
                term,
            } => {
                let ctx = CallContext::new(parse_address(caller)?);
                match api.evaluate_term(ctx, *agreement, *term) {
                    Ok(outcome) => Ok(Some(serde_json::to_value(outcome)?)),
                    Err(err) => Err(err),
                }
            }
            Step::EnforceBreach { caller, agreement } => {
                let ctx = CallContext::new(parse_address(caller)?);
                api.enforce_breach(ctx, *agreement).map(|()| None)
            }
            Step::CompleteAgreement { caller, agreement } => {
                let ctx = CallContext::new(parse_address(caller)?);
                api.complete_agreement(ctx, *agreement).map(|()| None)
            }
            Step::CancelAgreement { caller, agreement } => {
                let ctx = CallContext::new(parse_address(caller)?);
                api.cancel_agreement(ctx, *agreement).map(|()| None)
            }
            Step::WithdrawCollateral {
                caller,
                agreement,
                party,
            } => {
                let ctx = CallContext::new(parse_address(caller)?);
                api.withdraw_collateral(ctx, *agreement, *party)
                    .map(|()| None)
            }
            Step::RaiseDispute {
                caller,
                agreement,
                term,
            } => {
                let ctx = CallContext::new(parse_address(caller)?);
                api.raise_dispute(ctx, *agreement, *term).map(|()| None)
            }
            Step::ResolveDispute {
                caller,
                agreement,
                term,
                upheld,
            } => {
                let ctx = CallContext::new(parse_address(caller)?);
                match api.resolve_dispute(ctx, *agreement, *term, *upheld) {
                    Ok(outcome) => Ok(Some(serde_json::to_value(outcome)?)),
                    Err(err) => Err(err),
                }
            }
            Step::GetAgreement { agreement } => api
                .get_agreement(*agreement)
                .map(|view| Some(agreement_json(&view))),
            Step::GetParty { agreement, party } => api
                .get_party(*agreement, *party)
                .map(|view| Some(party_json(&view))),
            Step::GetTerm { agreement, term } => api
                .get_term(*agreement, *term)
                .map(|view| Some(term_json(&view))),
            Step::GetUserAgreements { wallet } => {
                let wallet = parse_address(wallet)?;
                Ok(Some(json!(api.get_user_agreements(&wallet))))
            }
            Step::GetTotalAgreements => Ok(Some(json!(api.get_total_agreements()))),
            Step::Events { agreement } => match api.events(*agreement) {
                Ok(events) => Ok(Some(serde_json::to_value(events)?)),
                Err(err) => Err(err),
            },
        };
        Ok(outcome)
    }
}

/// JSON form of an agreement view; amounts as decimal strings.
pub fn agreement_json(view: &AgreementView) -> Value {
    json!({
        "id": view.id,
        "title": view.title,
        "description": view.description,
        "creator": fmt_address(&view.creator),
        "created_at": view.created_at,
        "activated_at": view.activated_at,
        "status": view.status.to_string(),
        "status_code": view.status.code(),
        "total_collateral": view.total_collateral.to_string(),
        "auto_enforce": view.auto_enforce,
        "party_count": view.party_count,
        "term_count": view.term_count,
    })
}

/// JSON form of a party view.
pub fn party_json(view: &PartyView) -> Value {
    json!({
        "wallet": fmt_address(&view.wallet),
        "name": view.name,
        "has_signed": view.has_signed,
        "deposit_amount": view.deposit_amount.to_string(),
        "has_withdrawn": view.has_withdrawn,
    })
}

/// JSON form of a term view.
pub fn term_json(view: &TermView) -> Value {
    json!({
        "description": view.description,
        "responsible_party": view.responsible_party,
        "deadline": view.deadline,
        "status": format!("{:?}", view.status),
        "disputed": view.disputed,
        "penalty_amount": view.penalty.amount.to_string(),
        "penalty_recipient": recipient_json(&view.penalty.recipient),
    })
}

/// Penalty destination in the shape scripts write it.
fn recipient_json(recipient: &PenaltyRecipient) -> Value {
    match recipient {
        PenaltyRecipient::Party(index) => json!({ "party": index }),
        PenaltyRecipient::External(wallet) => json!({ "external": fmt_address(wallet) }),
        PenaltyRecipient::Counterparties => json!("counterparties"),
    }
}
