//! # Inbound Ports
//!
//! API trait defining the agreement engine's call surface.

use crate::algorithms::TermOutcome;
use crate::domain::{
    Address, AgreementId, AgreementParams, AgreementView, CallContext, CovenantError, PartyView,
    TermParams, TermView,
};
use crate::events::CovenantEvent;

/// Agreement engine API - inbound port.
///
/// Every mutating entry point is atomic: it either commits in full or
/// returns an error and leaves the ledger untouched. Queries never mutate.
pub trait CovenantApi: Send + Sync {
    /// Create a Pending agreement with the given parties.
    fn create_agreement(
        &self,
        ctx: CallContext,
        params: AgreementParams,
    ) -> Result<AgreementId, CovenantError>;

    /// Sign as the calling party, locking `ctx.value` as collateral.
    fn sign_agreement(&self, ctx: CallContext, id: AgreementId) -> Result<(), CovenantError>;

    /// Add an obligation. Returns its term index.
    fn add_term(
        &self,
        ctx: CallContext,
        id: AgreementId,
        params: TermParams,
    ) -> Result<usize, CovenantError>;

    /// Mark a term fulfilled.
    fn resolve_term(
        &self,
        ctx: CallContext,
        id: AgreementId,
        term: usize,
    ) -> Result<(), CovenantError>;

    /// Check a term against the current time (permissionless).
    fn evaluate_term(
        &self,
        ctx: CallContext,
        id: AgreementId,
        term: usize,
    ) -> Result<TermOutcome, CovenantError>;

    /// Enforce every recorded breach.
    fn enforce_breach(&self, ctx: CallContext, id: AgreementId) -> Result<(), CovenantError>;

    /// Explicit Active → Completed.
    fn complete_agreement(&self, ctx: CallContext, id: AgreementId) -> Result<(), CovenantError>;

    /// Creator cancels a Pending agreement.
    fn cancel_agreement(&self, ctx: CallContext, id: AgreementId) -> Result<(), CovenantError>;

    /// Pay a party's remaining deposit back to its wallet.
    fn withdraw_collateral(
        &self,
        ctx: CallContext,
        id: AgreementId,
        party: usize,
    ) -> Result<(), CovenantError>;

    /// Contest a term.
    fn raise_dispute(
        &self,
        ctx: CallContext,
        id: AgreementId,
        term: usize,
    ) -> Result<(), CovenantError>;

    /// Rule on a contested term.
    fn resolve_dispute(
        &self,
        ctx: CallContext,
        id: AgreementId,
        term: usize,
        upheld: bool,
    ) -> Result<TermOutcome, CovenantError>;

    /// Agreement header.
    fn get_agreement(&self, id: AgreementId) -> Result<AgreementView, CovenantError>;

    /// One party of an agreement.
    fn get_party(&self, id: AgreementId, party: usize) -> Result<PartyView, CovenantError>;

    /// One term of an agreement.
    fn get_term(&self, id: AgreementId, term: usize) -> Result<TermView, CovenantError>;

    /// Agreements a wallet created or is a party of, in creation order.
    fn get_user_agreements(&self, wallet: &Address) -> Vec<AgreementId>;

    /// Number of agreements ever created.
    fn get_total_agreements(&self) -> u64;

    /// Event log of an agreement.
    fn events(&self, id: AgreementId) -> Result<Vec<CovenantEvent>, CovenantError>;
}
