//! # Fractional Marketplace
//!
//! Sells pieces of a batch. Per batch:
//!
//! ```text
//! no sale ──open_sale──► active ──buy (units_available > 0)──► active
//!                          │  └──buy (units_available == 0)──► closed (claim Sold)
//!                          └──cancel_sale──────────────────────► closed
//! ```
//!
//! A batch has a single `Sale` slot, so at most one sale per batch can be
//! active. Units move from seller to buyer through the credit ledger's
//! `transfer_from`, with this contract's own address as the spender; the
//! seller grants that allowance before listing.
//!
//! Pricing: a sale carries a price per whole ton in the payment token's
//! base units. A purchase of `units` costs
//! `ceil(units * price_per_ton / ONE_TON)` and the buyer must pay exactly
//! that amount.

use soroban_sdk::{token, Address, Env, Vec, I256};

use crate::batches;
use crate::claims;
use crate::events;
use crate::ledger;
use crate::storage::{self, Counter, DataKey};
use crate::types::{ClaimStatus, PurchaseRecord, Sale, ONE_TON};
use crate::Error;

/// Capability handed to the claim and batch modules when the marketplace
/// drives a status or ownership change. Only this module can build one.
pub struct MarketSeal {
    _private: (),
}

impl MarketSeal {
    fn new() -> Self {
        Self { _private: () }
    }
}

// ── Reads ────────────────────────────────────────────────────────────

pub fn get_sale(env: &Env, batch_id: u64) -> Option<Sale> {
    storage::read(env, &DataKey::Sale(batch_id))
}

pub fn has_active_sale(env: &Env, batch_id: u64) -> bool {
    get_sale(env, batch_id).map(|sale| sale.active).unwrap_or(false)
}

/// Batch ids with an active sale among the batch ids scanned by
/// `storage::page(start, limit)`, in batch order.
pub fn active_sales(env: &Env, start: u64, limit: u32) -> Vec<u64> {
    let mut ids = Vec::new(env);
    for batch_id in storage::page(env, Counter::Batch, start, limit) {
        if has_active_sale(env, batch_id) {
            ids.push_back(batch_id);
        }
    }
    ids
}

/// Every purchase made by `buyer`, oldest first.
pub fn purchase_history(env: &Env, buyer: &Address) -> Vec<PurchaseRecord> {
    let mut records = Vec::new(env);
    for id in storage::read_ids(env, &DataKey::BuyerPurchases(buyer.clone())).iter() {
        if let Some(record) = storage::read::<PurchaseRecord>(env, &DataKey::Purchase(id)) {
            records.push_back(record);
        }
    }
    records
}

fn load_active(env: &Env, batch_id: u64) -> Result<Sale, Error> {
    let sale = get_sale(env, batch_id).ok_or(Error::NotFound)?;
    if !sale.active {
        return Err(Error::InvalidState);
    }
    Ok(sale)
}

/// `ceil(units * price_per_ton / ONE_TON)`. The product is taken in 256 bits,
/// so only a cost that does not fit `i128` fails with `Overflow`.
fn cost(env: &Env, units: i128, price_per_ton: i128) -> Result<i128, Error> {
    let one_ton = I256::from_i128(env, ONE_TON);
    let gross = I256::from_i128(env, units).mul(&I256::from_i128(env, price_per_ton));
    let mut whole = gross.div(&one_ton);
    if gross.rem_euclid(&one_ton) != I256::from_i32(env, 0) {
        whole = whole.add(&I256::from_i32(env, 1));
    }
    whole.to_i128().ok_or(Error::Overflow)
}

/// Exact payment required to buy `units` from the active sale of `batch_id`.
pub fn quote(env: &Env, batch_id: u64, units: i128) -> Result<i128, Error> {
    if units <= 0 {
        return Err(Error::InvalidArgument);
    }
    let sale = load_active(env, batch_id)?;
    cost(env, units, sale.price_per_ton)
}

fn save_sale(env: &Env, sale: &Sale) {
    storage::write(env, &DataKey::Sale(sale.batch_id), sale);
}

fn close(env: &Env, sale: &mut Sale) {
    sale.active = false;
    save_sale(env, sale);
}

// ── Commands ─────────────────────────────────────────────────────────

/// List `units` of `batch_id` for sale at `price_per_ton`.
pub fn open_sale(
    env: &Env,
    seller: &Address,
    batch_id: u64,
    units: i128,
    price_per_ton: i128,
) -> Result<Sale, Error> {
    if units <= 0 || price_per_ton <= 0 {
        return Err(Error::InvalidArgument);
    }
    let batch = batches::load(env, batch_id)?;
    if &batch.owner != seller {
        return Err(Error::Unauthorized);
    }
    if units > batch.tons {
        return Err(Error::InvalidArgument);
    }
    let claim = claims::load(env, batch.claim_id)?;
    if claim.status != ClaimStatus::Approved || has_active_sale(env, batch_id) {
        return Err(Error::InvalidState);
    }
    let market = env.current_contract_address();
    if ledger::allowance(env, seller, &market) < units {
        return Err(Error::InsufficientFunds);
    }

    let sale = Sale {
        batch_id,
        seller: seller.clone(),
        total_units: units,
        units_available: units,
        price_per_ton,
        active: true,
    };
    claims::mark_on_sale(env, &MarketSeal::new(), claim.id)?;
    save_sale(env, &sale);

    events::emit_sale_opened(env, batch_id, seller.clone(), units, price_per_ton);
    Ok(sale)
}

/// Buy `units` from the active sale of `batch_id`, paying exactly
/// [`quote`] in the payment token. Returns the units still available.
pub fn buy(
    env: &Env,
    buyer: &Address,
    batch_id: u64,
    units: i128,
    payment_amount: i128,
) -> Result<i128, Error> {
    let mut sale = load_active(env, batch_id)?;
    if units <= 0 || units > sale.units_available || buyer == &sale.seller {
        return Err(Error::InvalidArgument);
    }
    if payment_amount != cost(env, units, sale.price_per_ton)? {
        return Err(Error::InvalidArgument);
    }

    let market = env.current_contract_address();
    if ledger::allowance(env, &sale.seller, &market) < units
        || ledger::balance_of(env, &sale.seller) < units
    {
        return Err(Error::InsufficientFunds);
    }
    let payment_token = storage::payment_token(env).ok_or(Error::NotInitialized)?;
    let batch = batches::load(env, batch_id)?;

    token::Client::new(env, &payment_token).transfer(buyer, &sale.seller, &payment_amount);
    ledger::transfer_from(env, &market, &sale.seller, buyer, units)?;

    sale.units_available -= units;
    let exhausted = sale.units_available == 0;
    if exhausted {
        close(env, &mut sale);
    } else {
        save_sale(env, &sale);
    }

    let record_id = storage::next_id(env, Counter::Purchase);
    let record = PurchaseRecord {
        batch_id,
        buyer: buyer.clone(),
        units,
        amount_paid: payment_amount,
        timestamp: env.ledger().timestamp(),
    };
    storage::write(env, &DataKey::Purchase(record_id), &record);
    storage::push_id(env, &DataKey::BuyerPurchases(buyer.clone()), record_id);
    events::emit_credits_purchased(env, batch_id, buyer.clone(), units, payment_amount);

    if exhausted {
        let seal = MarketSeal::new();
        let claim_id = batch.claim_id;
        if units == sale.total_units && sale.total_units == batch.tons {
            batches::settle_to_buyer(env, &seal, batch, buyer);
        }
        claims::mark_sold(env, &seal, claim_id)?;
        events::emit_sale_closed(env, batch_id, sale.seller.clone());
    }

    Ok(sale.units_available)
}

/// Withdraw the active sale of `batch_id`. Only its seller may do so.
pub fn cancel_sale(env: &Env, seller: &Address, batch_id: u64) -> Result<(), Error> {
    let mut sale = get_sale(env, batch_id).ok_or(Error::NotFound)?;
    if &sale.seller != seller {
        return Err(Error::Unauthorized);
    }
    if !sale.active {
        return Err(Error::InvalidState);
    }
    let batch = batches::load(env, batch_id)?;
    let partially_filled = sale.units_available < sale.total_units;

    claims::mark_sale_cancelled(env, &MarketSeal::new(), batch.claim_id, partially_filled)?;
    close(env, &mut sale);

    events::emit_sale_cancelled(env, batch_id, seller.clone(), sale.units_available);
    Ok(())
}
