//! # Claim Lifecycle Engine
//!
//! Drives a reduction claim from submission through audit, and records the
//! sale-related outcomes reported by the marketplace. This module is the
//! only writer of `Claim.status`.
//!
//! Approval and rejection are mutually exclusive and each happens at most
//! once: any audit decision on a non-`Pending` claim fails with
//! `InvalidState`, leaving the first decision's effects in place.
//!
//! The three `mark_*` callbacks take a [`MarketSeal`], which only the
//! marketplace can produce, so no other code path can move a claim into or
//! out of a sale state.

use soroban_sdk::{Address, Env, String, Vec};

use crate::batches;
use crate::events;
use crate::ledger;
use crate::market::MarketSeal;
use crate::projects;
use crate::rbac::{self, Authorizer};
use crate::storage::{self, Counter, DataKey};
use crate::types::{Claim, ClaimStatus};
use crate::Error;

// ── Persistence ──────────────────────────────────────────────────────

pub fn load(env: &Env, id: u64) -> Result<Claim, Error> {
    storage::read(env, &DataKey::Claim(id)).ok_or(Error::NotFound)
}

fn save(env: &Env, claim: &Claim) {
    storage::write(env, &DataKey::Claim(claim.id), claim);
}

/// Ids of claims still awaiting audit among the claim ids scanned by
/// `storage::page(start, limit)`, in submission order. Callers continue from
/// `start + limit` until `start` reaches [`count`].
pub fn pending(env: &Env, start: u64, limit: u32) -> Vec<u64> {
    let mut ids = Vec::new(env);
    for id in storage::page(env, Counter::Claim, start, limit) {
        if let Ok(claim) = load(env, id) {
            if claim.status == ClaimStatus::Pending {
                ids.push_back(id);
            }
        }
    }
    ids
}

/// Ids of every claim filed against `project_id`, in submission order.
pub fn by_project(env: &Env, project_id: u64) -> Vec<u64> {
    storage::read_ids(env, &DataKey::ProjectClaims(project_id))
}

pub fn count(env: &Env) -> u64 {
    storage::count(env, Counter::Claim)
}

// ── Submission ───────────────────────────────────────────────────────

/// File a claim against `project_id`. Only the project owner may do so.
pub fn submit(
    env: &Env,
    caller: &Address,
    project_id: u64,
    tons: i128,
    period_start: u64,
    period_end: u64,
    evidence_ref: String,
) -> Result<u64, Error> {
    let project = projects::load(env, project_id)?;
    if &project.owner != caller {
        return Err(Error::Unauthorized);
    }
    if tons <= 0 || period_start >= period_end {
        return Err(Error::InvalidArgument);
    }

    let id = storage::next_id(env, Counter::Claim);
    let claim = Claim {
        id,
        project_id,
        tons,
        period_start,
        period_end,
        evidence_ref,
        status: ClaimStatus::Pending,
        batch_id: None,
    };

    save(env, &claim);
    storage::push_id(env, &DataKey::ProjectClaims(project_id), id);

    events::emit_claim_submitted(env, id, project_id, caller.clone(), tons);
    Ok(id)
}

// ── Audit ────────────────────────────────────────────────────────────

fn load_pending(env: &Env, claim_id: u64) -> Result<Claim, Error> {
    let claim = load(env, claim_id)?;
    if claim.status != ClaimStatus::Pending {
        return Err(Error::InvalidState);
    }
    Ok(claim)
}

/// Approve a pending claim: mint its tons to the project owner, issue the
/// batch, and move the claim to `Approved`. Returns the new batch id.
pub fn audit_approve(
    env: &Env,
    auth: &impl Authorizer,
    auditor: &Address,
    claim_id: u64,
    audit_ref: String,
) -> Result<u64, Error> {
    rbac::require_auditor(auth, auditor)?;
    let mut claim = load_pending(env, claim_id)?;
    let project = projects::load(env, claim.project_id)?;

    ledger::mint(env, &project.owner, claim.tons)?;
    let batch = batches::issue(env, claim.id, &project.owner, audit_ref, claim.tons);

    claim.status = ClaimStatus::Approved;
    claim.batch_id = Some(batch.id);
    save(env, &claim);

    events::emit_claim_approved(env, claim.id, batch.id, auditor.clone(), claim.tons);
    Ok(batch.id)
}

/// Reject a pending claim. Terminal; a fresh claim must be filed instead.
pub fn audit_reject(
    env: &Env,
    auth: &impl Authorizer,
    auditor: &Address,
    claim_id: u64,
) -> Result<(), Error> {
    rbac::require_auditor(auth, auditor)?;
    let mut claim = load_pending(env, claim_id)?;

    claim.status = ClaimStatus::Rejected;
    save(env, &claim);

    events::emit_claim_rejected(env, claim.id, auditor.clone());
    Ok(())
}

// ── Marketplace callbacks ────────────────────────────────────────────

fn transition(
    env: &Env,
    claim_id: u64,
    from: ClaimStatus,
    to: ClaimStatus,
) -> Result<(), Error> {
    let mut claim = load(env, claim_id)?;
    if claim.status != from {
        return Err(Error::InvalidState);
    }
    claim.status = to;
    save(env, &claim);
    Ok(())
}

/// `Approved → OnSale`.
pub(crate) fn mark_on_sale(env: &Env, _seal: &MarketSeal, claim_id: u64) -> Result<(), Error> {
    transition(env, claim_id, ClaimStatus::Approved, ClaimStatus::OnSale)
}

/// `OnSale → Sold`.
pub(crate) fn mark_sold(env: &Env, _seal: &MarketSeal, claim_id: u64) -> Result<(), Error> {
    transition(env, claim_id, ClaimStatus::OnSale, ClaimStatus::Sold)
}

/// `OnSale → Approved` when nothing was bought, so the batch can be listed
/// again; `OnSale → Cancelled` once part of the sale has been filled.
pub(crate) fn mark_sale_cancelled(
    env: &Env,
    _seal: &MarketSeal,
    claim_id: u64,
    partially_filled: bool,
) -> Result<(), Error> {
    let to = if partially_filled {
        ClaimStatus::Cancelled
    } else {
        ClaimStatus::Approved
    };
    transition(env, claim_id, ClaimStatus::OnSale, to)
}
