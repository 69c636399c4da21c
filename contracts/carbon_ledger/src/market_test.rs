#![cfg(test)]

extern crate std;

use soroban_sdk::{testutils::Address as _, token, Address, Env, String};

use crate::invariants::*;
use crate::{CarbonLedger, CarbonLedgerClient, ClaimStatus, Error, ONE_TON};

/// Payment-token base units per whole ton.
const PRICE: i128 = 10_000_000;

struct Market {
    env: Env,
    client: CarbonLedgerClient<'static>,
    payment: token::Client<'static>,
    auditor: Address,
}

impl Market {
    fn new() -> Self {
        let env = Env::default();
        env.mock_all_auths();

        let sac = env.register_stellar_asset_contract_v2(Address::generate(&env));
        let payment = token::Client::new(&env, &sac.address());
        let contract_id = env.register(CarbonLedger, ());
        let client = CarbonLedgerClient::new(&env, &contract_id);

        let super_admin = Address::generate(&env);
        client.init(&super_admin, &payment.address);
        let auditor = Address::generate(&env);
        client.add_auditor(&super_admin, &auditor);

        Market { env, client, payment, auditor }
    }

    fn text(&self, s: &str) -> String {
        String::from_str(&self.env, s)
    }

    /// Register a project, file a claim of `tons` and approve it.
    /// Returns `(owner, claim_id, batch_id)`.
    fn approved_batch(&self, tons: i128) -> (Address, u64, u64) {
        let owner = Address::generate(&self.env);
        let project = self
            .client
            .register_project(&owner, &self.text("Rimba Raya peat forest"), &1_000);
        let claim_id = self.client.submit_claim(
            &owner,
            &project.id,
            &tons,
            &1_672_531_200,
            &1_704_067_200,
            &self.text("bafyevidence"),
        );
        let batch_id = self
            .client
            .audit_approve(&self.auditor, &claim_id, &self.text("bafyaudit"));
        (owner, claim_id, batch_id)
    }

    /// Approve the marketplace for `units` and list them.
    fn list(&self, seller: &Address, batch_id: u64, units: i128) {
        self.client.approve(seller, &self.client.address, &units);
        self.client.open_sale(seller, &batch_id, &units, &PRICE);
    }

    /// A fresh buyer holding `amount` of the payment token.
    fn funded_buyer(&self, amount: i128) -> Address {
        let buyer = Address::generate(&self.env);
        token::StellarAssetClient::new(&self.env, &self.payment.address).mint(&buyer, &amount);
        buyer
    }
}

// ─── Opening ─────────────────────────────────────────────

#[test]
fn test_open_sale_moves_claim_on_sale() {
    let m = Market::new();
    let (seller, claim_id, batch_id) = m.approved_batch(100 * ONE_TON);

    m.list(&seller, batch_id, 100 * ONE_TON);

    let sale = m.client.get_batch_sale(&batch_id).unwrap();
    assert!(sale.active);
    assert_eq!(sale.seller, seller);
    assert_eq!(sale.total_units, 100 * ONE_TON);
    assert_eq!(sale.units_available, 100 * ONE_TON);
    assert_eq!(sale.price_per_ton, PRICE);
    assert_sale_bounds(&sale);

    assert_eq!(m.client.get_claim(&claim_id).status, ClaimStatus::OnSale);
    assert_eq!(m.client.get_active_batch_sales(&0, &100).get(0), Some(batch_id));
}

#[test]
fn test_open_sale_requires_allowance() {
    let m = Market::new();
    let (seller, claim_id, batch_id) = m.approved_batch(10 * ONE_TON);

    m.client.approve(&seller, &m.client.address, &ONE_TON);
    assert_eq!(
        m.client.try_open_sale(&seller, &batch_id, &(2 * ONE_TON), &PRICE),
        Err(Ok(Error::InsufficientFunds))
    );
    assert_eq!(m.client.get_claim(&claim_id).status, ClaimStatus::Approved);
    assert_eq!(m.client.get_batch_sale(&batch_id), None);
}

#[test]
fn test_open_sale_by_non_owner_is_unauthorized() {
    let m = Market::new();
    let (_seller, _claim_id, batch_id) = m.approved_batch(10 * ONE_TON);
    let stranger = Address::generate(&m.env);

    m.client.approve(&stranger, &m.client.address, &ONE_TON);
    assert_eq!(
        m.client.try_open_sale(&stranger, &batch_id, &ONE_TON, &PRICE),
        Err(Ok(Error::Unauthorized))
    );
}

#[test]
fn test_open_sale_validates_units_and_price() {
    let m = Market::new();
    let (seller, _claim_id, batch_id) = m.approved_batch(10 * ONE_TON);
    m.client.approve(&seller, &m.client.address, &(20 * ONE_TON));

    assert_eq!(
        m.client.try_open_sale(&seller, &batch_id, &0, &PRICE),
        Err(Ok(Error::InvalidArgument))
    );
    assert_eq!(
        m.client.try_open_sale(&seller, &batch_id, &ONE_TON, &0),
        Err(Ok(Error::InvalidArgument))
    );
    assert_eq!(
        m.client.try_open_sale(&seller, &batch_id, &(11 * ONE_TON), &PRICE),
        Err(Ok(Error::InvalidArgument))
    );
    assert_eq!(
        m.client.try_open_sale(&seller, &42, &ONE_TON, &PRICE),
        Err(Ok(Error::NotFound))
    );
}

#[test]
fn test_only_one_active_sale_per_batch() {
    let m = Market::new();
    let (seller, _claim_id, batch_id) = m.approved_batch(10 * ONE_TON);
    m.list(&seller, batch_id, 5 * ONE_TON);

    m.client.approve(&seller, &m.client.address, &(10 * ONE_TON));
    assert_eq!(
        m.client.try_open_sale(&seller, &batch_id, &ONE_TON, &PRICE),
        Err(Ok(Error::InvalidState))
    );
    assert_eq!(m.client.get_active_batch_sales(&0, &100).len(), 1);
}

// ─── Buying ──────────────────────────────────────────────

#[test]
fn test_partial_fills_then_exhaustion_marks_claim_sold() {
    let m = Market::new();
    let (seller, claim_id, batch_id) = m.approved_batch(100 * ONE_TON);
    m.list(&seller, batch_id, 100 * ONE_TON);

    let buyer = m.funded_buyer(PRICE * 200);

    let cost = m.client.quote(&batch_id, &(60 * ONE_TON));
    assert_eq!(cost, 60 * PRICE);
    let remaining = m.client.buy(&buyer, &batch_id, &(60 * ONE_TON), &cost);
    assert_eq!(remaining, 40 * ONE_TON);
    assert_eq!(m.client.balance_of(&buyer), 60 * ONE_TON);
    assert_eq!(m.client.get_claim(&claim_id).status, ClaimStatus::OnSale);

    assert_eq!(
        m.client.try_buy(&buyer, &batch_id, &(41 * ONE_TON), &(41 * PRICE)),
        Err(Ok(Error::InvalidArgument))
    );

    let remaining = m.client.buy(&buyer, &batch_id, &(40 * ONE_TON), &(40 * PRICE));
    assert_eq!(remaining, 0);

    let sale = m.client.get_batch_sale(&batch_id).unwrap();
    assert!(!sale.active);
    assert_sale_bounds(&sale);
    assert_eq!(m.client.get_claim(&claim_id).status, ClaimStatus::Sold);
    assert_eq!(m.client.get_active_batch_sales(&0, &100).len(), 0);

    assert_eq!(m.client.balance_of(&buyer), 100 * ONE_TON);
    assert_eq!(m.client.balance_of(&seller), 0);
    assert_eq!(m.payment.balance(&seller), 100 * PRICE);
    assert_eq!(m.payment.balance(&buyer), 100 * PRICE);
    assert_eq!(m.client.allowance(&seller, &m.client.address), 0);

    // Two fills, so the batch itself stays with the seller.
    assert_eq!(m.client.get_batch(&batch_id).owner, seller);
    assert_conservation(&m.client, &[seller, buyer]);
}

#[test]
fn test_single_full_purchase_hands_over_batch() {
    let m = Market::new();
    let (seller, claim_id, batch_id) = m.approved_batch(3 * ONE_TON);
    m.list(&seller, batch_id, 3 * ONE_TON);
    let buyer = m.funded_buyer(3 * PRICE);

    m.client.buy(&buyer, &batch_id, &(3 * ONE_TON), &(3 * PRICE));

    assert_eq!(m.client.get_batch(&batch_id).owner, buyer);
    assert_eq!(m.client.list_batches_by_owner(&buyer).get(0), Some(batch_id));
    assert_eq!(m.client.list_batches_by_owner(&seller).len(), 0);
    assert_eq!(m.client.get_claim(&claim_id).status, ClaimStatus::Sold);
    assert_eq!(m.payment.balance(&buyer), 0);
}

#[test]
fn test_payment_must_match_quote_exactly() {
    let m = Market::new();
    let (seller, _claim_id, batch_id) = m.approved_batch(10 * ONE_TON);
    m.list(&seller, batch_id, 10 * ONE_TON);
    let buyer = m.funded_buyer(100 * PRICE);

    assert_eq!(
        m.client.try_buy(&buyer, &batch_id, &ONE_TON, &(PRICE - 1)),
        Err(Ok(Error::InvalidArgument))
    );
    assert_eq!(
        m.client.try_buy(&buyer, &batch_id, &ONE_TON, &(PRICE + 1)),
        Err(Ok(Error::InvalidArgument))
    );
    assert_eq!(m.client.balance_of(&buyer), 0);
    assert_eq!(m.payment.balance(&buyer), 100 * PRICE);
}

#[test]
fn test_quote_rounds_up_fractional_units() {
    let m = Market::new();
    let (seller, _claim_id, batch_id) = m.approved_batch(10 * ONE_TON);
    m.list(&seller, batch_id, 10 * ONE_TON);

    // Half a ton at 10_000_000 per ton is exact.
    assert_eq!(m.client.quote(&batch_id, &(ONE_TON / 2)), PRICE / 2);
    // One base unit of a ton still costs one base unit of payment.
    assert_eq!(m.client.quote(&batch_id, &1), 1);
    assert_eq!(
        m.client.try_quote(&batch_id, &0),
        Err(Ok(Error::InvalidArgument))
    );

    let buyer = m.funded_buyer(1);
    m.client.buy(&buyer, &batch_id, &1, &1);
    assert_eq!(m.client.balance_of(&buyer), 1);
}

#[test]
fn test_quote_with_eighteen_decimal_price() {
    let m = Market::new();
    let (seller, _claim_id, batch_id) = m.approved_batch(100 * ONE_TON);
    // 100 whole payment tokens per ton, with an 18-decimal payment token.
    let price = 100 * ONE_TON;
    m.client.approve(&seller, &m.client.address, &(100 * ONE_TON));
    m.client.open_sale(&seller, &batch_id, &(100 * ONE_TON), &price);

    // units * price is 2e38 here, past i128::MAX, while the cost is not.
    assert_eq!(m.client.quote(&batch_id, &(2 * ONE_TON)), 200 * ONE_TON);
    assert_eq!(m.client.quote(&batch_id, &(100 * ONE_TON)), 10_000 * ONE_TON);

    let buyer = m.funded_buyer(200 * ONE_TON);
    m.client.buy(&buyer, &batch_id, &(2 * ONE_TON), &(200 * ONE_TON));
    assert_eq!(m.client.balance_of(&buyer), 2 * ONE_TON);
    assert_eq!(m.payment.balance(&seller), 200 * ONE_TON);
    assert_eq!(m.payment.balance(&buyer), 0);
}

#[test]
fn test_quote_overflows_only_when_cost_exceeds_i128() {
    let m = Market::new();
    let (seller, _claim_id, batch_id) = m.approved_batch(100 * ONE_TON);
    m.client.approve(&seller, &m.client.address, &(100 * ONE_TON));
    m.client.open_sale(&seller, &batch_id, &(100 * ONE_TON), &(i128::MAX / 10));

    // A tenth of a ton costs i128::MAX / 100: fits.
    assert_eq!(m.client.quote(&batch_id, &(ONE_TON / 10)), i128::MAX / 100 + 1);
    // A hundred tons costs ten times i128::MAX: does not.
    assert_eq!(
        m.client.try_quote(&batch_id, &(100 * ONE_TON)),
        Err(Ok(Error::Overflow))
    );
}

#[test]
fn test_seller_cannot_buy_own_sale() {
    let m = Market::new();
    let (seller, _claim_id, batch_id) = m.approved_batch(10 * ONE_TON);
    m.list(&seller, batch_id, 10 * ONE_TON);
    token::StellarAssetClient::new(&m.env, &m.payment.address).mint(&seller, &(10 * PRICE));

    assert_eq!(
        m.client.try_buy(&seller, &batch_id, &ONE_TON, &PRICE),
        Err(Ok(Error::InvalidArgument))
    );
}

#[test]
fn test_buy_without_payment_funds_changes_nothing() {
    let m = Market::new();
    let (seller, _claim_id, batch_id) = m.approved_batch(10 * ONE_TON);
    m.list(&seller, batch_id, 10 * ONE_TON);
    let buyer = Address::generate(&m.env);

    assert!(m.client.try_buy(&buyer, &batch_id, &ONE_TON, &PRICE).is_err());

    let sale = m.client.get_batch_sale(&batch_id).unwrap();
    assert_eq!(sale.units_available, 10 * ONE_TON);
    assert_eq!(m.client.balance_of(&buyer), 0);
    assert_eq!(m.client.balance_of(&seller), 10 * ONE_TON);
    assert_eq!(m.client.get_purchase_history(&buyer).len(), 0);
}

#[test]
fn test_buy_fails_when_seller_spent_the_listed_units() {
    let m = Market::new();
    let (seller, _claim_id, batch_id) = m.approved_batch(10 * ONE_TON);
    m.list(&seller, batch_id, 10 * ONE_TON);

    // Listing does not escrow: the seller can still move units away.
    let elsewhere = Address::generate(&m.env);
    m.client.transfer(&seller, &elsewhere, &(8 * ONE_TON));

    let buyer = m.funded_buyer(5 * PRICE);
    assert_eq!(
        m.client.try_buy(&buyer, &batch_id, &(5 * ONE_TON), &(5 * PRICE)),
        Err(Ok(Error::InsufficientFunds))
    );
    m.client.buy(&buyer, &batch_id, &(2 * ONE_TON), &(2 * PRICE));
    assert_conservation(&m.client, &[seller, elsewhere, buyer]);
}

#[test]
fn test_buy_on_missing_or_closed_sale() {
    let m = Market::new();
    let (seller, _claim_id, batch_id) = m.approved_batch(ONE_TON);
    let buyer = m.funded_buyer(10 * PRICE);

    assert_eq!(
        m.client.try_buy(&buyer, &batch_id, &ONE_TON, &PRICE),
        Err(Ok(Error::NotFound))
    );

    m.list(&seller, batch_id, ONE_TON);
    m.client.buy(&buyer, &batch_id, &ONE_TON, &PRICE);
    assert_eq!(
        m.client.try_buy(&buyer, &batch_id, &1, &1),
        Err(Ok(Error::InvalidState))
    );
}

#[test]
fn test_purchase_history_is_oldest_first() {
    let m = Market::new();
    let (seller, _claim_id, batch_id) = m.approved_batch(10 * ONE_TON);
    m.list(&seller, batch_id, 10 * ONE_TON);
    let buyer = m.funded_buyer(10 * PRICE);

    m.client.buy(&buyer, &batch_id, &ONE_TON, &PRICE);
    m.client.buy(&buyer, &batch_id, &(3 * ONE_TON), &(3 * PRICE));

    let history = m.client.get_purchase_history(&buyer);
    assert_eq!(history.len(), 2);
    let first = history.get(0).unwrap();
    let second = history.get(1).unwrap();
    assert_eq!(first.units, ONE_TON);
    assert_eq!(first.amount_paid, PRICE);
    assert_eq!(second.units, 3 * ONE_TON);
    assert_eq!(second.batch_id, batch_id);
}

// ─── Cancelling ──────────────────────────────────────────

#[test]
fn test_cancel_untouched_sale_allows_relisting() {
    let m = Market::new();
    let (seller, claim_id, batch_id) = m.approved_batch(10 * ONE_TON);
    m.list(&seller, batch_id, 10 * ONE_TON);

    m.client.cancel_sale(&seller, &batch_id);

    assert!(!m.client.get_batch_sale(&batch_id).unwrap().active);
    assert_eq!(m.client.get_claim(&claim_id).status, ClaimStatus::Approved);
    assert_eq!(m.client.get_active_batch_sales(&0, &100).len(), 0);

    m.list(&seller, batch_id, 4 * ONE_TON);
    assert_eq!(m.client.get_claim(&claim_id).status, ClaimStatus::OnSale);
    assert_eq!(
        m.client.get_batch_sale(&batch_id).unwrap().units_available,
        4 * ONE_TON
    );
}

#[test]
fn test_cancel_after_partial_fill_is_terminal() {
    let m = Market::new();
    let (seller, claim_id, batch_id) = m.approved_batch(10 * ONE_TON);
    m.list(&seller, batch_id, 10 * ONE_TON);
    let buyer = m.funded_buyer(10 * PRICE);
    m.client.buy(&buyer, &batch_id, &(2 * ONE_TON), &(2 * PRICE));

    m.client.cancel_sale(&seller, &batch_id);

    assert_eq!(m.client.get_claim(&claim_id).status, ClaimStatus::Cancelled);
    assert_eq!(m.client.balance_of(&buyer), 2 * ONE_TON);
    assert_eq!(m.client.balance_of(&seller), 8 * ONE_TON);

    m.client.approve(&seller, &m.client.address, &ONE_TON);
    assert_eq!(
        m.client.try_open_sale(&seller, &batch_id, &ONE_TON, &PRICE),
        Err(Ok(Error::InvalidState))
    );
}

#[test]
fn test_cancel_by_stranger_or_twice_fails() {
    let m = Market::new();
    let (seller, _claim_id, batch_id) = m.approved_batch(10 * ONE_TON);
    assert_eq!(
        m.client.try_cancel_sale(&seller, &batch_id),
        Err(Ok(Error::NotFound))
    );

    m.list(&seller, batch_id, 10 * ONE_TON);
    let stranger = Address::generate(&m.env);
    assert_eq!(
        m.client.try_cancel_sale(&stranger, &batch_id),
        Err(Ok(Error::Unauthorized))
    );

    m.client.cancel_sale(&seller, &batch_id);
    assert_eq!(
        m.client.try_cancel_sale(&seller, &batch_id),
        Err(Ok(Error::InvalidState))
    );
}

#[test]
fn test_listed_batch_cannot_be_transferred() {
    let m = Market::new();
    let (seller, _claim_id, batch_id) = m.approved_batch(10 * ONE_TON);
    m.list(&seller, batch_id, 10 * ONE_TON);
    let other = Address::generate(&m.env);

    assert_eq!(
        m.client.try_transfer_batch(&seller, &other, &batch_id),
        Err(Ok(Error::InvalidState))
    );

    m.client.cancel_sale(&seller, &batch_id);
    m.client.transfer_batch(&seller, &other, &batch_id);
    assert_eq!(m.client.get_batch(&batch_id).owner, other);
}

#[test]
fn test_paused_market_rejects_buys() {
    let env = Env::default();
    env.mock_all_auths();
    let sac = env.register_stellar_asset_contract_v2(Address::generate(&env));
    let contract_id = env.register(CarbonLedger, ());
    let client = CarbonLedgerClient::new(&env, &contract_id);
    let super_admin = Address::generate(&env);
    client.init(&super_admin, &sac.address());

    client.pause(&super_admin);
    let buyer = Address::generate(&env);
    assert_eq!(
        client.try_buy(&buyer, &0, &ONE_TON, &PRICE),
        Err(Ok(Error::ProtocolPaused))
    );
    assert_eq!(
        client.try_cancel_sale(&buyer, &0),
        Err(Ok(Error::ProtocolPaused))
    );
}
