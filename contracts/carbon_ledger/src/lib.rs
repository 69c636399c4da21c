//! # Carbon Ledger Contract
//!
//! Issues, audits, trades and retires tokenized carbon-reduction credits.
//! The single Soroban contract `CarbonLedger` exposes:
//!
//! | Phase        | Entry Point(s)                                              |
//! |--------------|-------------------------------------------------------------|
//! | Bootstrap    | [`CarbonLedger::init`]                                      |
//! | Role admin   | `grant_role`, `revoke_role`, `transfer_super_admin`, `add_auditor`, `list_auditors` |
//! | Emergency    | `pause`, `unpause`                                          |
//! | Registration | `register_project`                                          |
//! | Claims       | `submit_claim`, `audit_approve`, `audit_reject`             |
//! | Batches      | `transfer_batch`                                            |
//! | Market       | `open_sale`, `buy`, `cancel_sale`                           |
//! | Credits      | `approve`, `transfer`, `transfer_from`, `retire`            |
//! | Queries      | `get_*`, `list_*`, `balance_of`, `allowance`, `quote`, ...  |
//!
//! ## Architecture
//!
//! Authorization is delegated to [`rbac`], persistence to `storage`, and
//! each component (`projects`, `claims`, `batches`, `ledger`, `market`,
//! `retirement`) owns its own rows. This file only authenticates callers,
//! applies the pause gate and forwards to the components.
//!
//! Every command returns `Result<_, Error>`. All checks run before the
//! first write, and the host discards every write of a failed invocation,
//! so a failing command never leaves partial state.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, Address, Env, String, Vec};

mod batches;
mod claims;
pub mod events;
mod ledger;
mod market;
mod projects;
pub mod rbac;
mod retirement;
mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod market_test;
#[cfg(test)]
mod test_events;

pub use rbac::Role;
use rbac::StoredRoles;
pub use types::{
    Batch, Claim, ClaimStatus, Project, PurchaseRecord, RetirementRecord, Sale, DECIMALS, ONE_TON,
};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    /// Caller lacks the required role or ownership.
    Unauthorized = 1,
    /// Referenced id does not exist.
    NotFound = 2,
    /// Operation not legal from the current status.
    InvalidState = 3,
    /// Zero/negative amount, malformed range, or payment mismatch.
    InvalidArgument = 4,
    /// Balance or allowance too low.
    InsufficientFunds = 5,
    /// Arithmetic bound exceeded.
    Overflow = 6,
    AlreadyInitialized = 7,
    NotInitialized = 8,
    ProtocolPaused = 9,
}

#[contract]
pub struct CarbonLedger;

#[contractimpl]
impl CarbonLedger {
    // ─────────────────────────────────────────────────────────
    // Initialisation
    // ─────────────────────────────────────────────────────────

    /// Initialise the contract: set the first SuperAdmin and the token
    /// buyers pay with. Fails with `AlreadyInitialized` on a second call.
    pub fn init(env: Env, super_admin: Address, payment_token: Address) -> Result<(), Error> {
        super_admin.require_auth();
        rbac::init_super_admin(&env, &super_admin)?;
        storage::set_payment_token(&env, &payment_token);
        Ok(())
    }

    pub fn payment_token(env: Env) -> Result<Address, Error> {
        storage::payment_token(&env).ok_or(Error::NotInitialized)
    }

    // ─────────────────────────────────────────────────────────
    // Role management
    // ─────────────────────────────────────────────────────────

    /// Grant `role` to `target`. `caller` must hold `SuperAdmin` or `Admin`;
    /// only `SuperAdmin` can grant `SuperAdmin`.
    pub fn grant_role(env: Env, caller: Address, target: Address, role: Role) -> Result<(), Error> {
        caller.require_auth();
        rbac::grant_role(&env, &caller, &target, role)
    }

    /// Revoke any role from `target`. Cannot remove the SuperAdmin.
    pub fn revoke_role(env: Env, caller: Address, target: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::revoke_role(&env, &caller, &target)
    }

    /// Hand the SuperAdmin role to `new_super_admin`.
    pub fn transfer_super_admin(
        env: Env,
        current_super_admin: Address,
        new_super_admin: Address,
    ) -> Result<(), Error> {
        current_super_admin.require_auth();
        rbac::transfer_super_admin(&env, &current_super_admin, &new_super_admin)
    }

    /// Grant the Auditor role to `auditor`.
    pub fn add_auditor(env: Env, caller: Address, auditor: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::grant_role(&env, &caller, &auditor, Role::Auditor)
    }

    pub fn role_of(env: Env, address: Address) -> Option<Role> {
        rbac::get_role(&env, &address)
    }

    pub fn has_role(env: Env, address: Address, role: Role) -> bool {
        rbac::get_role(&env, &address) == Some(role)
    }

    /// Every current auditor, in the order they were appointed.
    pub fn list_auditors(env: Env) -> Vec<Address> {
        rbac::role_members(&env, &Role::Auditor)
    }

    // ─────────────────────────────────────────────────────────
    // Emergency control
    // ─────────────────────────────────────────────────────────

    /// Halt every command. `caller` must hold `SuperAdmin` or `Admin`.
    pub fn pause(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin_or_above(&StoredRoles::new(&env), &caller)?;
        storage::set_paused(&env, true);
        events::emit_protocol_paused(&env, caller);
        Ok(())
    }

    pub fn unpause(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin_or_above(&StoredRoles::new(&env), &caller)?;
        storage::set_paused(&env, false);
        events::emit_protocol_unpaused(&env, caller);
        Ok(())
    }

    pub fn is_paused(env: Env) -> bool {
        storage::is_paused(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Project registry
    // ─────────────────────────────────────────────────────────

    /// Register a project owned by `owner`.
    pub fn register_project(
        env: Env,
        owner: Address,
        name: String,
        baseline: i128,
    ) -> Result<Project, Error> {
        Self::require_not_paused(&env)?;
        owner.require_auth();
        projects::register(&env, &owner, name, baseline)
    }

    pub fn get_project(env: Env, id: u64) -> Result<Project, Error> {
        projects::load(&env, id)
    }

    pub fn list_projects_by_owner(env: Env, owner: Address) -> Vec<u64> {
        projects::list_by_owner(&env, &owner)
    }

    pub fn project_count(env: Env) -> u64 {
        projects::count(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Claim lifecycle
    // ─────────────────────────────────────────────────────────

    /// File a reduction claim. `caller` must own the project.
    pub fn submit_claim(
        env: Env,
        caller: Address,
        project_id: u64,
        tons: i128,
        period_start: u64,
        period_end: u64,
        evidence_ref: String,
    ) -> Result<u64, Error> {
        Self::require_not_paused(&env)?;
        caller.require_auth();
        claims::submit(
            &env,
            &caller,
            project_id,
            tons,
            period_start,
            period_end,
            evidence_ref,
        )
    }

    /// Approve a pending claim; mints its tons and issues a batch.
    /// Returns the batch id.
    pub fn audit_approve(
        env: Env,
        auditor: Address,
        claim_id: u64,
        audit_ref: String,
    ) -> Result<u64, Error> {
        Self::require_not_paused(&env)?;
        auditor.require_auth();
        claims::audit_approve(&env, &StoredRoles::new(&env), &auditor, claim_id, audit_ref)
    }

    /// Reject a pending claim.
    pub fn audit_reject(env: Env, auditor: Address, claim_id: u64) -> Result<(), Error> {
        Self::require_not_paused(&env)?;
        auditor.require_auth();
        claims::audit_reject(&env, &StoredRoles::new(&env), &auditor, claim_id)
    }

    pub fn get_claim(env: Env, id: u64) -> Result<Claim, Error> {
        claims::load(&env, id)
    }

    /// Pending claim ids among claim ids `start..start + limit`; `limit`
    /// is capped at 100. Page on until `start >= claim_count()`.
    pub fn get_pending_claims(env: Env, start: u64, limit: u32) -> Vec<u64> {
        claims::pending(&env, start, limit)
    }

    pub fn get_claims_by_project(env: Env, project_id: u64) -> Vec<u64> {
        claims::by_project(&env, project_id)
    }

    pub fn claim_count(env: Env) -> u64 {
        claims::count(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Batch registry
    // ─────────────────────────────────────────────────────────

    pub fn get_batch(env: Env, id: u64) -> Result<Batch, Error> {
        batches::load(&env, id)
    }

    pub fn batch_of_claim(env: Env, claim_id: u64) -> Option<u64> {
        batches::of_claim(&env, claim_id)
    }

    pub fn list_batches_by_owner(env: Env, owner: Address) -> Vec<u64> {
        batches::list_by_owner(&env, &owner)
    }

    /// Move a batch to `to`. Refused while the batch is listed.
    pub fn transfer_batch(env: Env, from: Address, to: Address, batch_id: u64) -> Result<(), Error> {
        Self::require_not_paused(&env)?;
        from.require_auth();
        batches::transfer(&env, &from, &to, batch_id)
    }

    // ─────────────────────────────────────────────────────────
    // Marketplace
    // ─────────────────────────────────────────────────────────

    /// List `units` of a batch at `price_per_ton`. The seller must first
    /// `approve` this contract's address for at least `units`.
    pub fn open_sale(
        env: Env,
        seller: Address,
        batch_id: u64,
        units: i128,
        price_per_ton: i128,
    ) -> Result<Sale, Error> {
        Self::require_not_paused(&env)?;
        seller.require_auth();
        market::open_sale(&env, &seller, batch_id, units, price_per_ton)
    }

    /// Buy `units` from a batch's active sale. `payment_amount` must equal
    /// [`CarbonLedger::quote`] for the same units. Returns units still available.
    pub fn buy(
        env: Env,
        buyer: Address,
        batch_id: u64,
        units: i128,
        payment_amount: i128,
    ) -> Result<i128, Error> {
        Self::require_not_paused(&env)?;
        buyer.require_auth();
        market::buy(&env, &buyer, batch_id, units, payment_amount)
    }

    pub fn cancel_sale(env: Env, seller: Address, batch_id: u64) -> Result<(), Error> {
        Self::require_not_paused(&env)?;
        seller.require_auth();
        market::cancel_sale(&env, &seller, batch_id)
    }

    /// Exact payment for `units` from the active sale of `batch_id`.
    pub fn quote(env: Env, batch_id: u64, units: i128) -> Result<i128, Error> {
        market::quote(&env, batch_id, units)
    }

    pub fn get_batch_sale(env: Env, batch_id: u64) -> Option<Sale> {
        market::get_sale(&env, batch_id)
    }

    /// Batch ids with an active sale among batch ids `start..start + limit`
    /// (`limit` capped at 100).
    pub fn get_active_batch_sales(env: Env, start: u64, limit: u32) -> Vec<u64> {
        market::active_sales(&env, start, limit)
    }

    pub fn get_purchase_history(env: Env, account: Address) -> Vec<PurchaseRecord> {
        market::purchase_history(&env, &account)
    }

    // ─────────────────────────────────────────────────────────
    // Credit units
    // ─────────────────────────────────────────────────────────

    /// Set `spender`'s allowance over `owner`'s units. Overwrites.
    pub fn approve(env: Env, owner: Address, spender: Address, amount: i128) -> Result<(), Error> {
        Self::require_not_paused(&env)?;
        owner.require_auth();
        ledger::approve(&env, &owner, &spender, amount)
    }

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) -> Result<(), Error> {
        Self::require_not_paused(&env)?;
        from.require_auth();
        ledger::transfer(&env, &from, &to, amount)
    }

    pub fn transfer_from(
        env: Env,
        spender: Address,
        owner: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), Error> {
        Self::require_not_paused(&env)?;
        spender.require_auth();
        ledger::transfer_from(&env, &spender, &owner, &to, amount)
    }

    pub fn balance_of(env: Env, account: Address) -> i128 {
        ledger::balance_of(&env, &account)
    }

    pub fn allowance(env: Env, owner: Address, spender: Address) -> i128 {
        ledger::allowance(&env, &owner, &spender)
    }

    pub fn total_minted(env: Env) -> i128 {
        ledger::total_minted(&env)
    }

    pub fn total_burned(env: Env) -> i128 {
        ledger::total_burned(&env)
    }

    pub fn decimals(_env: Env) -> u32 {
        DECIMALS
    }

    // ─────────────────────────────────────────────────────────
    // Retirement
    // ─────────────────────────────────────────────────────────

    /// Burn `units` held by `owner` and mint a retirement certificate.
    /// Returns the certificate id.
    pub fn retire(
        env: Env,
        owner: Address,
        units: i128,
        purpose: String,
        evidence_ref: String,
    ) -> Result<u64, Error> {
        Self::require_not_paused(&env)?;
        owner.require_auth();
        retirement::retire(&env, &owner, units, purpose, evidence_ref)
    }

    pub fn get_retirement(env: Env, id: u64) -> Result<RetirementRecord, Error> {
        retirement::load(&env, id)
    }

    pub fn get_retirements(env: Env, owner: Address) -> Vec<u64> {
        retirement::list_by_owner(&env, &owner)
    }

    pub fn retirement_count(env: Env) -> u64 {
        retirement::count(&env)
    }
}

impl CarbonLedger {
    fn require_not_paused(env: &Env) -> Result<(), Error> {
        if storage::is_paused(env) {
            return Err(Error::ProtocolPaused);
        }
        Ok(())
    }
}
