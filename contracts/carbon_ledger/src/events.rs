//! Contract events. Topics are `(symbol, subject_id)`; data is one of the
//! structs below. Off-chain indexers key on the leading symbol.

use soroban_sdk::{contracttype, symbol_short, Address, Env};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectRegistered {
    pub project_id: u64,
    pub owner: Address,
    pub baseline: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClaimSubmitted {
    pub claim_id: u64,
    pub project_id: u64,
    pub owner: Address,
    pub tons: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClaimApproved {
    pub claim_id: u64,
    pub batch_id: u64,
    pub auditor: Address,
    pub tons: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClaimRejected {
    pub claim_id: u64,
    pub auditor: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchTransferred {
    pub batch_id: u64,
    pub from: Address,
    pub to: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaleOpened {
    pub batch_id: u64,
    pub seller: Address,
    pub units: i128,
    pub price_per_ton: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreditsPurchased {
    pub batch_id: u64,
    pub buyer: Address,
    pub units: i128,
    pub amount_paid: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaleClosed {
    pub batch_id: u64,
    pub seller: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SaleCancelled {
    pub batch_id: u64,
    pub seller: Address,
    pub units_unsold: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreditsRetired {
    pub certificate_id: u64,
    pub owner: Address,
    pub units: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreditsTransferred {
    pub from: Address,
    pub to: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AllowanceSet {
    pub owner: Address,
    pub spender: Address,
    pub amount: i128,
}

pub fn emit_project_registered(env: &Env, project_id: u64, owner: Address, baseline: i128) {
    let topics = (symbol_short!("proj_reg"), project_id);
    let data = ProjectRegistered {
        project_id,
        owner,
        baseline,
    };
    env.events().publish(topics, data);
}

pub fn emit_claim_submitted(env: &Env, claim_id: u64, project_id: u64, owner: Address, tons: i128) {
    let topics = (symbol_short!("claim_sub"), claim_id);
    let data = ClaimSubmitted {
        claim_id,
        project_id,
        owner,
        tons,
    };
    env.events().publish(topics, data);
}

pub fn emit_claim_approved(env: &Env, claim_id: u64, batch_id: u64, auditor: Address, tons: i128) {
    let topics = (symbol_short!("approved"), claim_id);
    let data = ClaimApproved {
        claim_id,
        batch_id,
        auditor,
        tons,
    };
    env.events().publish(topics, data);
}

pub fn emit_claim_rejected(env: &Env, claim_id: u64, auditor: Address) {
    let topics = (symbol_short!("rejected"), claim_id);
    env.events().publish(topics, ClaimRejected { claim_id, auditor });
}

pub fn emit_batch_transferred(env: &Env, batch_id: u64, from: Address, to: Address) {
    let topics = (symbol_short!("batch_xfr"), batch_id);
    env.events()
        .publish(topics, BatchTransferred { batch_id, from, to });
}

pub fn emit_sale_opened(env: &Env, batch_id: u64, seller: Address, units: i128, price_per_ton: i128) {
    let topics = (symbol_short!("sale_open"), batch_id);
    let data = SaleOpened {
        batch_id,
        seller,
        units,
        price_per_ton,
    };
    env.events().publish(topics, data);
}

pub fn emit_credits_purchased(
    env: &Env,
    batch_id: u64,
    buyer: Address,
    units: i128,
    amount_paid: i128,
) {
    let topics = (symbol_short!("purchase"), batch_id);
    let data = CreditsPurchased {
        batch_id,
        buyer,
        units,
        amount_paid,
    };
    env.events().publish(topics, data);
}

pub fn emit_sale_closed(env: &Env, batch_id: u64, seller: Address) {
    let topics = (symbol_short!("sale_done"), batch_id);
    env.events().publish(topics, SaleClosed { batch_id, seller });
}

pub fn emit_sale_cancelled(env: &Env, batch_id: u64, seller: Address, units_unsold: i128) {
    let topics = (symbol_short!("sale_stop"), batch_id);
    let data = SaleCancelled {
        batch_id,
        seller,
        units_unsold,
    };
    env.events().publish(topics, data);
}

pub fn emit_credits_retired(env: &Env, certificate_id: u64, owner: Address, units: i128) {
    let topics = (symbol_short!("retired"), certificate_id);
    let data = CreditsRetired {
        certificate_id,
        owner,
        units,
    };
    env.events().publish(topics, data);
}

pub fn emit_credits_transferred(env: &Env, from: Address, to: Address, amount: i128) {
    let topics = (symbol_short!("transfer"), from.clone());
    env.events()
        .publish(topics, CreditsTransferred { from, to, amount });
}

pub fn emit_allowance_set(env: &Env, owner: Address, spender: Address, amount: i128) {
    let topics = (symbol_short!("approve"), owner.clone());
    let data = AllowanceSet {
        owner,
        spender,
        amount,
    };
    env.events().publish(topics, data);
}

pub fn emit_protocol_paused(env: &Env, caller: Address) {
    env.events().publish((symbol_short!("paused"),), caller);
}

pub fn emit_protocol_unpaused(env: &Env, caller: Address) {
    env.events().publish((symbol_short!("unpaused"),), caller);
}
