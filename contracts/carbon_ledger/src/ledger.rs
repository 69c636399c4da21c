//! # Credit Unit Ledger
//!
//! Fungible ton-unit balances, allowances, and the global mint/burn
//! counters. Conservation holds after every call:
//!
//! ```text
//! sum(balances) + total_burned == total_minted
//! ```
//!
//! `mint` and `burn` are crate-private: only audit approval mints and only
//! retirement burns. Every check runs before the first write, so a failing
//! call leaves balances, allowances and counters untouched.

use soroban_sdk::{Address, Env};

use crate::events;
use crate::storage::{self, DataKey};
use crate::Error;

// ── Reads ────────────────────────────────────────────────────────────

pub fn balance_of(env: &Env, account: &Address) -> i128 {
    storage::read(env, &DataKey::Balance(account.clone())).unwrap_or(0)
}

pub fn allowance(env: &Env, owner: &Address, spender: &Address) -> i128 {
    storage::read(env, &DataKey::Allowance(owner.clone(), spender.clone())).unwrap_or(0)
}

pub fn total_minted(env: &Env) -> i128 {
    storage::read_instance(env, &DataKey::TotalMinted).unwrap_or(0)
}

pub fn total_burned(env: &Env) -> i128 {
    storage::read_instance(env, &DataKey::TotalBurned).unwrap_or(0)
}

// ── Writes (private) ─────────────────────────────────────────────────

fn write_balance(env: &Env, account: &Address, amount: i128) {
    storage::write(env, &DataKey::Balance(account.clone()), &amount);
}

fn write_allowance(env: &Env, owner: &Address, spender: &Address, amount: i128) {
    storage::write(
        env,
        &DataKey::Allowance(owner.clone(), spender.clone()),
        &amount,
    );
}

fn require_positive(amount: i128) -> Result<(), Error> {
    if amount <= 0 {
        return Err(Error::InvalidArgument);
    }
    Ok(())
}

// ── Issuance ─────────────────────────────────────────────────────────

/// Credit `amount` fresh ton-units to `to`.
pub(crate) fn mint(env: &Env, to: &Address, amount: i128) -> Result<(), Error> {
    require_positive(amount)?;
    let balance = balance_of(env, to)
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    let minted = total_minted(env)
        .checked_add(amount)
        .ok_or(Error::Overflow)?;

    write_balance(env, to, balance);
    storage::write_instance(env, &DataKey::TotalMinted, &minted);
    Ok(())
}

/// Destroy `amount` ton-units held by `owner`.
pub(crate) fn burn(env: &Env, owner: &Address, amount: i128) -> Result<(), Error> {
    require_positive(amount)?;
    let balance = balance_of(env, owner);
    if balance < amount {
        return Err(Error::InsufficientFunds);
    }
    let burned = total_burned(env)
        .checked_add(amount)
        .ok_or(Error::Overflow)?;

    write_balance(env, owner, balance - amount);
    storage::write_instance(env, &DataKey::TotalBurned, &burned);
    Ok(())
}

// ── Movement ─────────────────────────────────────────────────────────

/// Set the allowance `owner` grants `spender`. Overwrites; never adds.
pub fn approve(env: &Env, owner: &Address, spender: &Address, amount: i128) -> Result<(), Error> {
    if amount < 0 {
        return Err(Error::InvalidArgument);
    }
    write_allowance(env, owner, spender, amount);
    events::emit_allowance_set(env, owner.clone(), spender.clone(), amount);
    Ok(())
}

/// Move `amount` from `from` to `to`.
pub fn transfer(env: &Env, from: &Address, to: &Address, amount: i128) -> Result<(), Error> {
    require_positive(amount)?;
    let from_balance = balance_of(env, from);
    if from_balance < amount {
        return Err(Error::InsufficientFunds);
    }

    if from != to {
        let to_balance = balance_of(env, to)
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        write_balance(env, from, from_balance - amount);
        write_balance(env, to, to_balance);
    }

    events::emit_credits_transferred(env, from.clone(), to.clone(), amount);
    Ok(())
}

/// Move `amount` of `owner`'s units to `to` on behalf of `spender`,
/// consuming exactly `amount` of the allowance.
pub fn transfer_from(
    env: &Env,
    spender: &Address,
    owner: &Address,
    to: &Address,
    amount: i128,
) -> Result<(), Error> {
    require_positive(amount)?;
    let allowed = allowance(env, owner, spender);
    if allowed < amount {
        return Err(Error::InsufficientFunds);
    }
    if balance_of(env, owner) < amount {
        return Err(Error::InsufficientFunds);
    }

    transfer(env, owner, to, amount)?;
    write_allowance(env, owner, spender, allowed - amount);
    Ok(())
}
