//! Call scripts.
//!
//! A script is a JSON document listing calls against one deployment, in
//! order, plus `advance_time` steps that move the deployment's clock.
//!
//! ```json
//! {
//!   "start_time": 1700000000,
//!   "steps": [
//!     { "op": "create_agreement", "caller": "0x01..", "title": "Lease",
//!       "parties": [{ "wallet": "0x01..", "name": "Alice" }] },
//!     { "op": "sign_agreement", "caller": "0x01..", "agreement": 0, "value": 100 },
//!     { "op": "advance_time", "secs": 86400 }
//!   ]
//! }
//! ```
//!
//! Amounts are integer base units. Wallets are 20-byte hex, with or without
//! the `0x` prefix.

use anyhow::{bail, Context, Result};
use covenant_engine::{Address, AgreementId, Penalty, PenaltyRecipient, Timestamp};
use serde::{Deserialize, Serialize};

/// A full script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Clock reading before the first step.
    #[serde(default)]
    pub start_time: Timestamp,
    /// Steps, executed in order.
    pub steps: Vec<Step>,
}

/// A party entry of `create_agreement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySpec {
    /// Hex wallet.
    pub wallet: String,
    /// Display name.
    pub name: String,
}

/// Penalty destination as written in scripts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientSpec {
    /// Another party, by index.
    Party(usize),
    /// An outside hex wallet.
    External(String),
    /// Split across the non-breaching parties.
    #[default]
    Counterparties,
}

/// Penalty as written in scripts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltySpec {
    /// Amount in base units.
    #[serde(default)]
    pub amount: u64,
    /// Destination.
    #[serde(default)]
    pub recipient: RecipientSpec,
}

impl PenaltySpec {
    /// Resolve into an engine penalty.
    pub fn to_penalty(&self) -> Result<Penalty> {
        let recipient = match &self.recipient {
            RecipientSpec::Party(index) => PenaltyRecipient::Party(*index),
            RecipientSpec::External(wallet) => PenaltyRecipient::External(parse_address(wallet)?),
            RecipientSpec::Counterparties => PenaltyRecipient::Counterparties,
        };
        Ok(Penalty {
            amount: u128::from(self.amount),
            recipient,
        })
    }
}

/// One script step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Move the clock forward.
    AdvanceTime {
        /// Seconds to add.
        secs: u64,
    },
    /// Jump the clock to an absolute reading.
    SetTime {
        /// New reading.
        now: Timestamp,
    },
    /// Create an agreement.
    CreateAgreement {
        /// Hex caller.
        caller: String,
        /// Title.
        title: String,
        /// Description.
        #[serde(default)]
        description: String,
        /// Parties in order.
        parties: Vec<PartySpec>,
        /// Auto-enforcement flag.
        #[serde(default)]
        auto_enforce: bool,
    },
    /// Sign, optionally with collateral.
    SignAgreement {
        /// Hex caller.
        caller: String,
        /// Agreement id.
        agreement: AgreementId,
        /// Collateral in base units.
        #[serde(default)]
        value: u64,
    },
    /// Add a term.
    AddTerm {
        /// Hex caller.
        caller: String,
        /// Agreement id.
        agreement: AgreementId,
        /// Obligation.
        description: String,
        /// Responsible party index.
        responsible_party: usize,
        /// Absolute deadline.
        deadline: Timestamp,
        /// Penalty on breach.
        #[serde(default)]
        penalty: PenaltySpec,
    },
    /// Resolve a term.
    ResolveTerm {
        /// Hex caller.
        caller: String,
        /// Agreement id.
        agreement: AgreementId,
        /// Term index.
        term: usize,
    },
    /// Evaluate a term.
    EvaluateTerm {
        /// Hex caller.
        caller: String,
        /// Agreement id.
        agreement: AgreementId,
        /// Term index.
        term: usize,
    },
    /// Enforce recorded breaches.
    EnforceBreach {
        /// Hex caller.
        caller: String,
        /// Agreement id.
        agreement: AgreementId,
    },
    /// Complete explicitly.
    CompleteAgreement {
        /// Hex caller.
        caller: String,
        /// Agreement id.
        agreement: AgreementId,
    },
    /// Cancel a pending agreement.
    CancelAgreement {
        /// Hex caller.
        caller: String,
        /// Agreement id.
        agreement: AgreementId,
    },
    /// Withdraw a party's deposit.
    WithdrawCollateral {
        /// Hex caller.
        caller: String,
        /// Agreement id.
        agreement: AgreementId,
        /// Party index.
        party: usize,
    },
    /// Contest a term.
    RaiseDispute {
        /// Hex caller.
        caller: String,
        /// Agreement id.
        agreement: AgreementId,
        /// Term index.
        term: usize,
    },
    /// Rule on a contested term.
    ResolveDispute {
        /// Hex caller.
        caller: String,
        /// Agreement id.
        agreement: AgreementId,
        /// Term index.
        term: usize,
        /// True if the obligation is deemed met.
        upheld: bool,
    },
    /// Read an agreement.
    GetAgreement {
        /// Agreement id.
        agreement: AgreementId,
    },
    /// Read a party.
    GetParty {
        /// Agreement id.
        agreement: AgreementId,
        /// Party index.
        party: usize,
    },
    /// Read a term.
    GetTerm {
        /// Agreement id.
        agreement: AgreementId,
        /// Term index.
        term: usize,
    },
    /// List a wallet's agreements.
    GetUserAgreements {
        /// Hex wallet.
        wallet: String,
    },
    /// Count agreements.
    GetTotalAgreements,
    /// Read an agreement's event log.
    Events {
        /// Agreement id.
        agreement: AgreementId,
    },
}

impl Step {
    /// The `op` tag of the step.
    pub fn op(&self) -> &'static str {
        match self {
            Self::AdvanceTime { .. } => "advance_time",
            Self::SetTime { .. } => "set_time",
            Self::CreateAgreement { .. } => "create_agreement",
            Self::SignAgreement { .. } => "sign_agreement",
            Self::AddTerm { .. } => "add_term",
            Self::ResolveTerm { .. } => "resolve_term",
            Self::EvaluateTerm { .. } => "evaluate_term",
            Self::EnforceBreach { .. } => "enforce_breach",
            Self::CompleteAgreement { .. } => "complete_agreement",
            Self::CancelAgreement { .. } => "cancel_agreement",
            Self::WithdrawCollateral { .. } => "withdraw_collateral",
            Self::RaiseDispute { .. } => "raise_dispute",
            Self::ResolveDispute { .. } => "resolve_dispute",
            Self::GetAgreement { .. } => "get_agreement",
            Self::GetParty { .. } => "get_party",
            Self::GetTerm { .. } => "get_term",
            Self::GetUserAgreements { .. } => "get_user_agreements",
            Self::GetTotalAgreements => "get_total_agreements",
            Self::Events { .. } => "events",
        }
    }
}

/// Parse a 20-byte hex wallet.
pub fn parse_address(text: &str) -> Result<Address> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    let bytes = hex::decode(digits).with_context(|| format!("invalid hex wallet {text:?}"))?;
    if bytes.len() != 20 {
        bail!("wallet {text:?} is {} bytes, expected 20", bytes.len());
    }
    let mut address = [0u8; 20];
    address.copy_from_slice(&bytes);
    Ok(address)
}

/// Parse a script document.
pub fn parse_script(json: &str) -> Result<Script> {
    serde_json::from_str(json).context("malformed call script")
}
