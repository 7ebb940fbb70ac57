//! # Party & Signature Manager
//!
//! Who may join an agreement and how signatures are admitted.

use super::{escrow, lifecycle};
use crate::config::EngineConfig;
use crate::domain::{
    fmt_address, Address, Agreement, AgreementId, AgreementParams, AgreementRecord,
    AgreementStatus, Amount, CovenantError, Party, Settlement, Timestamp, ZERO_ADDRESS,
};
use crate::events::CovenantEvent;
use std::collections::HashSet;

/// Result of an admitted signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignOutcome {
    /// Index of the signing party.
    pub party: usize,
    /// Collateral locked with the signature.
    pub deposit: Amount,
    /// Whether this signature activated the agreement.
    pub activated: bool,
}

/// Reject text longer than the configured limit.
pub fn validate_text(field: &'static str, text: &str, max: usize) -> Result<(), CovenantError> {
    if text.len() > max {
        return Err(CovenantError::TextTooLong {
            field,
            len: text.len(),
            max,
        });
    }
    Ok(())
}

/// Validate a party list: length bounds, one name per wallet, no zero or duplicate wallet.
pub fn validate_party_list(
    wallets: &[Address],
    names: &[String],
    config: &EngineConfig,
) -> Result<(), CovenantError> {
    if wallets.len() != names.len() {
        return Err(CovenantError::InvalidPartyList(format!(
            "{} wallets but {} names",
            wallets.len(),
            names.len()
        )));
    }
    if wallets.len() < config.min_parties {
        return Err(CovenantError::InvalidPartyList(format!(
            "at least {} parties required, got {}",
            config.min_parties,
            wallets.len()
        )));
    }
    if wallets.len() > config.max_parties {
        return Err(CovenantError::InvalidPartyList(format!(
            "at most {} parties allowed, got {}",
            config.max_parties,
            wallets.len()
        )));
    }

    let mut seen = HashSet::with_capacity(wallets.len());
    for wallet in wallets {
        if *wallet == ZERO_ADDRESS {
            return Err(CovenantError::InvalidPartyList(
                "zero address cannot be a party".to_string(),
            ));
        }
        if !seen.insert(wallet) {
            return Err(CovenantError::InvalidPartyList(format!(
                "duplicate wallet {}",
                fmt_address(wallet)
            )));
        }
    }
    for name in names {
        validate_text("party name", name, config.max_text_len)?;
    }
    Ok(())
}

/// Build the record of a new Pending agreement.
pub fn open_agreement(
    id: AgreementId,
    creator: Address,
    params: AgreementParams,
    config: &EngineConfig,
    now: Timestamp,
) -> Result<AgreementRecord, CovenantError> {
    validate_text("title", &params.title, config.max_text_len)?;
    validate_text("description", &params.description, config.max_text_len)?;
    validate_party_list(&params.party_wallets, &params.party_names, config)?;

    let parties: Vec<Party> = params
        .party_wallets
        .into_iter()
        .zip(params.party_names)
        .map(|(wallet, name)| Party::new(wallet, name))
        .collect();

    let mut record = AgreementRecord {
        agreement: Agreement {
            id,
            title: params.title,
            description: params.description,
            creator,
            created_at: now,
            activated_at: 0,
            status: AgreementStatus::Pending,
            total_collateral: 0,
            auto_enforce: params.auto_enforce,
            closed_at: None,
        },
        parties,
        terms: Vec::new(),
        journal: Vec::new(),
        events: Vec::new(),
    };
    let party_count = record.party_count();
    record.emit(CovenantEvent::AgreementCreated {
        agreement_id: id,
        creator,
        party_count,
        at: now,
    });
    Ok(record)
}

/// Index of `caller` among the parties, or `NotAParty`.
pub fn require_party(record: &AgreementRecord, caller: &Address) -> Result<usize, CovenantError> {
    record
        .party_index(caller)
        .ok_or_else(|| CovenantError::NotAParty {
            agreement_id: record.agreement.id,
            caller: fmt_address(caller),
        })
}

/// Admit the signature of `caller`, locking `value` as collateral.
///
/// The last signature activates the agreement.
pub fn admit_signature(
    record: &mut AgreementRecord,
    caller: &Address,
    value: Amount,
    now: Timestamp,
) -> Result<(SignOutcome, Settlement), CovenantError> {
    let agreement_id = record.agreement.id;
    let party = require_party(record, caller)?;
    if record.parties[party].has_signed {
        return Err(CovenantError::AlreadySigned {
            agreement_id,
            party,
        });
    }
    let status = record.agreement.status;
    if status != AgreementStatus::Pending {
        return Err(CovenantError::InvalidStateTransition {
            from: status,
            to: AgreementStatus::Active,
        });
    }

    let signer = &mut record.parties[party];
    signer.has_signed = true;
    signer.signed_at = Some(now);
    let wallet = signer.wallet;
    let settlement = escrow::deposit(record, party, value, now)?;
    record.emit(CovenantEvent::AgreementSigned {
        agreement_id,
        party,
        wallet,
        deposit: value,
        at: now,
    });

    let activated = record.unsigned_count() == 0;
    if activated {
        lifecycle::activate(record, now)?;
    }

    Ok((
        SignOutcome {
            party,
            deposit: value,
            activated,
        },
        settlement,
    ))
}
