//! # Batch Registry
//!
//! One non-fungible batch per approved claim. Batches are issued only by
//! audit approval and change hands either through [`transfer`] by their
//! current owner or through the marketplace when a single purchase takes a
//! full-batch sale.

use soroban_sdk::{Address, Env, String, Vec};

use crate::events;
use crate::market::{self, MarketSeal};
use crate::storage::{self, Counter, DataKey};
use crate::types::Batch;
use crate::Error;

/// Issue the batch for `claim_id`, owned by `owner`.
pub(crate) fn issue(env: &Env, claim_id: u64, owner: &Address, audit_ref: String, tons: i128) -> Batch {
    let id = storage::next_id(env, Counter::Batch);
    let batch = Batch {
        id,
        claim_id,
        owner: owner.clone(),
        audit_ref,
        tons,
    };

    storage::write(env, &DataKey::Batch(id), &batch);
    storage::write(env, &DataKey::ClaimBatch(claim_id), &id);
    storage::push_id(env, &DataKey::OwnerBatches(owner.clone()), id);
    batch
}

pub fn load(env: &Env, id: u64) -> Result<Batch, Error> {
    storage::read(env, &DataKey::Batch(id)).ok_or(Error::NotFound)
}

/// Batch issued for `claim_id`, if the claim has been approved.
pub fn of_claim(env: &Env, claim_id: u64) -> Option<u64> {
    storage::read(env, &DataKey::ClaimBatch(claim_id))
}

pub fn list_by_owner(env: &Env, owner: &Address) -> Vec<u64> {
    storage::read_ids(env, &DataKey::OwnerBatches(owner.clone()))
}

fn reassign_owner(env: &Env, mut batch: Batch, to: &Address) {
    let from = batch.owner.clone();
    storage::remove_id(env, &DataKey::OwnerBatches(from.clone()), batch.id);
    storage::push_id(env, &DataKey::OwnerBatches(to.clone()), batch.id);

    batch.owner = to.clone();
    storage::write(env, &DataKey::Batch(batch.id), &batch);
    events::emit_batch_transferred(env, batch.id, from, to.clone());
}

/// Owner-initiated transfer. Refused while the batch is listed.
pub fn transfer(env: &Env, from: &Address, to: &Address, batch_id: u64) -> Result<(), Error> {
    let batch = load(env, batch_id)?;
    if &batch.owner != from {
        return Err(Error::Unauthorized);
    }
    if market::has_active_sale(env, batch_id) {
        return Err(Error::InvalidState);
    }
    if from == to {
        return Ok(());
    }

    reassign_owner(env, batch, to);
    Ok(())
}

/// Marketplace-initiated transfer on completion of a full-batch trade.
pub(crate) fn settle_to_buyer(env: &Env, _seal: &MarketSeal, batch: Batch, buyer: &Address) {
    reassign_owner(env, batch, buyer);
}
