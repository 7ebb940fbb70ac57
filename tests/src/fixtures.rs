//! Shared deployment harness.

use covenant_engine::{
    Address, AgreementId, AgreementParams, AgreementStatus, Amount, CallContext, CovenantApi,
    CovenantError, CovenantService, EngineConfig, InMemoryLedgerStore, InMemoryTreasury,
    ManualClock, Penalty, PenaltyRecipient, RecordingEventSink, TermParams, Timestamp,
};
use std::sync::Arc;

/// Service wired the way the suites need it.
pub type TestService =
    CovenantService<InMemoryLedgerStore, InMemoryTreasury, ManualClock, RecordingEventSink>;

/// One base unit of collateral at 18 decimals.
pub const UNIT: Amount = 1_000_000_000_000_000_000;

/// Clock reading every harness starts at.
pub const START: Timestamp = 1_700_000_000;

/// Default creator of harness agreements. Not a party.
pub const CREATOR: Address = [0x0C; 20];
/// First party.
pub const ALICE: Address = [0xA1; 20];
/// Second party.
pub const BOB: Address = [0xB2; 20];
/// Third party.
pub const CAROL: Address = [0xC3; 20];
/// Permissionless keeper.
pub const KEEPER: Address = [0x4E; 20];
/// Wallet outside every agreement.
pub const OUTSIDER: Address = [0xEE; 20];

/// A fresh deployment plus handles on its clock and event stream.
pub struct Harness {
    /// The engine.
    pub service: TestService,
    /// Shared clock handle.
    pub clock: ManualClock,
    /// Shared event buffer.
    pub sink: RecordingEventSink,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    /// Deployment at [`START`] with the default config.
    pub fn new() -> Self {
        let clock = ManualClock::at(START);
        let sink = RecordingEventSink::new();
        let service = CovenantService::new(
            Arc::new(InMemoryLedgerStore::new()),
            Arc::new(InMemoryTreasury::new()),
            clock.clone(),
            sink.clone(),
            EngineConfig::default(),
        );
        Self {
            service,
            clock,
            sink,
        }
    }

    /// The treasury backing the deployment.
    pub fn treasury(&self) -> &Arc<InMemoryTreasury> {
        self.service.treasury()
    }

    /// Create an agreement from [`CREATOR`] between `wallets`.
    pub fn create(&self, auto_enforce: bool, wallets: &[Address]) -> AgreementId {
        self.create_by(CREATOR, auto_enforce, wallets)
    }

    /// Create an agreement from `creator`, who may also be one of `wallets`.
    pub fn create_by(
        &self,
        creator: Address,
        auto_enforce: bool,
        wallets: &[Address],
    ) -> AgreementId {
        let params = AgreementParams {
            title: "Service agreement".to_string(),
            description: "Deliverables and payment".to_string(),
            party_wallets: wallets.to_vec(),
            party_names: (0..wallets.len()).map(|i| format!("party-{i}")).collect(),
            auto_enforce,
        };
        self.service
            .create_agreement(CallContext::new(creator), params)
            .expect("harness agreement is valid")
    }

    /// Create an agreement and have every party sign with `deposits[i]`.
    pub fn activate(
        &self,
        auto_enforce: bool,
        wallets: &[Address],
        deposits: &[Amount],
    ) -> AgreementId {
        let id = self.create(auto_enforce, wallets);
        for (wallet, deposit) in wallets.iter().zip(deposits) {
            self.sign(id, *wallet, *deposit).expect("party signs");
        }
        id
    }

    /// Sign as `wallet` attaching `value`.
    pub fn sign(
        &self,
        id: AgreementId,
        wallet: Address,
        value: Amount,
    ) -> Result<(), CovenantError> {
        self.service
            .sign_agreement(CallContext::with_value(wallet, value), id)
    }

    /// Add a term proposed by `by`.
    pub fn term(
        &self,
        id: AgreementId,
        by: Address,
        responsible_party: usize,
        deadline: Timestamp,
        penalty: Penalty,
    ) -> Result<usize, CovenantError> {
        let params = TermParams {
            description: format!("obligation of party {responsible_party}"),
            responsible_party,
            deadline,
            penalty,
        };
        self.service.add_term(CallContext::new(by), id, params)
    }

    /// Current status of `id`.
    pub fn status(&self, id: AgreementId) -> AgreementStatus {
        self.service
            .get_agreement(id)
            .expect("agreement exists")
            .status
    }

    /// Remaining deposit of `party`.
    pub fn deposit(&self, id: AgreementId, party: usize) -> Amount {
        self.service
            .get_party(id, party)
            .expect("party exists")
            .deposit_amount
    }
}

/// Penalty paid to one party.
pub fn to_party(amount: Amount, party: usize) -> Penalty {
    Penalty {
        amount,
        recipient: PenaltyRecipient::Party(party),
    }
}

/// Penalty split across the counterparties.
pub fn to_counterparties(amount: Amount) -> Penalty {
    Penalty {
        amount,
        recipient: PenaltyRecipient::Counterparties,
    }
}
