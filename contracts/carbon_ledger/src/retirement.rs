//! # Retirement Ledger
//!
//! Burns ton-units for good and records a certificate for each burn.
//! Certificates are written once, at retirement time, and never change.

use soroban_sdk::{Address, Env, String, Vec};

use crate::events;
use crate::ledger;
use crate::storage::{self, Counter, DataKey};
use crate::types::RetirementRecord;
use crate::Error;

/// Retire `units` held by `owner`. Returns the certificate id.
pub fn retire(
    env: &Env,
    owner: &Address,
    units: i128,
    purpose: String,
    evidence_ref: String,
) -> Result<u64, Error> {
    if units <= 0 || purpose.len() == 0 {
        return Err(Error::InvalidArgument);
    }

    ledger::burn(env, owner, units)?;

    let id = storage::next_id(env, Counter::Retirement);
    let record = RetirementRecord {
        id,
        owner: owner.clone(),
        units,
        purpose,
        evidence_ref,
        timestamp: env.ledger().timestamp(),
    };
    storage::write(env, &DataKey::Retirement(id), &record);
    storage::push_id(env, &DataKey::OwnerRetirements(owner.clone()), id);

    events::emit_credits_retired(env, id, owner.clone(), units);
    Ok(id)
}

pub fn load(env: &Env, id: u64) -> Result<RetirementRecord, Error> {
    storage::read(env, &DataKey::Retirement(id)).ok_or(Error::NotFound)
}

/// Certificate ids issued to `owner`, oldest first.
pub fn list_by_owner(env: &Env, owner: &Address) -> Vec<u64> {
    storage::read_ids(env, &DataKey::OwnerRetirements(owner.clone()))
}

pub fn count(env: &Env) -> u64 {
    storage::count(env, Counter::Retirement)
}
