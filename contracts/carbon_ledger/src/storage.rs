//! # Storage
//!
//! Key layout and typed helpers over Soroban's two storage tiers.
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key               | Type      | Description                          |
//! |-------------------|-----------|--------------------------------------|
//! | `Counter(kind)`   | `u64`     | Auto-increment id per entity kind    |
//! | `TotalMinted`     | `i128`    | Ton-units ever minted                |
//! | `TotalBurned`     | `i128`    | Ton-units ever retired               |
//! | `PaymentToken`    | `Address` | Settlement asset used by `buy`       |
//! | `Paused`          | `bool`    | Emergency stop flag                  |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! Entity rows (`Project`, `Claim`, `Batch`, `Sale`, `Purchase`,
//! `Retirement`), fungible balances and allowances, and the id indexes that
//! back the list queries. Each component module owns the keys for its own
//! entities; nothing else writes them.
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.

use core::ops::Range;

use soroban_sdk::{contracttype, Address, Env, IntoVal, TryFromVal, Val, Vec};

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

/// Entity kinds that draw ids from an instance counter.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Counter {
    Project,
    Claim,
    Batch,
    Purchase,
    Retirement,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    // Instance tier
    Counter(Counter),
    TotalMinted,
    TotalBurned,
    PaymentToken,
    Paused,

    // Project registry
    Project(u64),
    OwnerProjects(Address),

    // Claim lifecycle
    Claim(u64),
    ProjectClaims(u64),

    // Batch registry
    Batch(u64),
    ClaimBatch(u64),
    OwnerBatches(Address),

    // Credit unit ledger
    Balance(Address),
    Allowance(Address, Address),

    // Marketplace
    Sale(u64),
    Purchase(u64),
    BuyerPurchases(Address),

    // Retirement
    Retirement(u64),
    OwnerRetirements(Address),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

/// Extend instance storage TTL if it falls below the threshold.
fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

/// Read a value from instance storage.
pub fn read_instance<T: TryFromVal<Env, Val>>(env: &Env, key: &DataKey) -> Option<T> {
    bump_instance(env);
    env.storage().instance().get(key)
}

/// Write a value to instance storage.
pub fn write_instance<T: IntoVal<Env, Val>>(env: &Env, key: &DataKey, value: &T) {
    env.storage().instance().set(key, value);
    bump_instance(env);
}

/// Atomically reads, increments, and stores the counter for `kind`.
/// Returns the id to use for the *current* entity (pre-increment value).
pub fn next_id(env: &Env, kind: Counter) -> u64 {
    let key = DataKey::Counter(kind);
    let current: u64 = read_instance(env, &key).unwrap_or(0);
    write_instance(env, &key, &(current + 1));
    current
}

/// Number of ids handed out so far for `kind`.
pub fn count(env: &Env, kind: Counter) -> u64 {
    read_instance(env, &DataKey::Counter(kind)).unwrap_or(0)
}

/// Most ids a single paged query will scan.
pub const MAX_PAGE: u32 = 100;

/// Ids of `kind` scanned by a page starting at `start`: at most
/// `min(limit, MAX_PAGE)` of them, never past the last id handed out.
pub fn page(env: &Env, kind: Counter, start: u64, limit: u32) -> Range<u64> {
    let end = start
        .saturating_add(u64::from(limit.min(MAX_PAGE)))
        .min(count(env, kind));
    start..end.max(start)
}

pub fn is_paused(env: &Env) -> bool {
    read_instance(env, &DataKey::Paused).unwrap_or(false)
}

pub fn set_paused(env: &Env, paused: bool) {
    write_instance(env, &DataKey::Paused, &paused);
}

pub fn payment_token(env: &Env) -> Option<Address> {
    read_instance(env, &DataKey::PaymentToken)
}

pub fn set_payment_token(env: &Env, token: &Address) {
    write_instance(env, &DataKey::PaymentToken, token);
}

// ── Persistent Storage Helpers ───────────────────────────────────────

/// Extend the TTL for a persistent storage key.
pub fn bump_persistent<K: IntoVal<Env, Val>>(env: &Env, key: &K) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Read a persistent entry, bumping its TTL when present.
pub fn read<T: TryFromVal<Env, Val>>(env: &Env, key: &DataKey) -> Option<T> {
    let value: Option<T> = env.storage().persistent().get(key);
    if value.is_some() {
        bump_persistent(env, key);
    }
    value
}

/// Write a persistent entry and bump its TTL.
pub fn write<T: IntoVal<Env, Val>>(env: &Env, key: &DataKey, value: &T) {
    env.storage().persistent().set(key, value);
    bump_persistent(env, key);
}

// ── Id indexes ───────────────────────────────────────────────────────

/// Load an id index; a missing index is empty.
pub fn read_ids(env: &Env, key: &DataKey) -> Vec<u64> {
    read(env, key).unwrap_or_else(|| Vec::new(env))
}

/// Append `id` to the index stored under `key`.
pub fn push_id(env: &Env, key: &DataKey, id: u64) {
    let mut ids = read_ids(env, key);
    ids.push_back(id);
    write(env, key, &ids);
}

/// Drop every occurrence of `id` from the index stored under `key`,
/// preserving the order of the remaining ids.
pub fn remove_id(env: &Env, key: &DataKey, id: u64) {
    let mut kept = Vec::new(env);
    for existing in read_ids(env, key).iter() {
        if existing != id {
            kept.push_back(existing);
        }
    }
    write(env, key, &kept);
}
