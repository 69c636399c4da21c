#![allow(dead_code)]

extern crate std;

use soroban_sdk::Address;

use crate::types::{Claim, ClaimStatus, Sale};
use crate::CarbonLedgerClient;

/// Conservation. `sum(balances) + total_burned == total_minted`.
/// `accounts` must list every address that has ever held units.
pub fn assert_conservation(client: &CarbonLedgerClient, accounts: &[Address]) {
    let held: i128 = accounts.iter().map(|a| client.balance_of(a)).sum();
    let burned = client.total_burned();
    let minted = client.total_minted();
    assert_eq!(
        held + burned,
        minted,
        "balances {} + burned {} != minted {}",
        held,
        burned,
        minted
    );
}

/// `0 <= units_available <= total_units`, and an exhausted sale is inactive.
pub fn assert_sale_bounds(sale: &Sale) {
    assert!(
        sale.units_available >= 0 && sale.units_available <= sale.total_units,
        "batch {} has {} of {} units available",
        sale.batch_id,
        sale.units_available,
        sale.total_units
    );
    if sale.units_available == 0 {
        assert!(!sale.active, "exhausted sale still active");
    }
}

/// `batch_id` is set iff the claim has been approved.
pub fn assert_claim_batch_link(claim: &Claim) {
    assert_eq!(
        claim.batch_id.is_some(),
        claim.status.has_batch(),
        "claim {} in {:?} with batch {:?}",
        claim.id,
        claim.status,
        claim.batch_id
    );
}

/// Claimed tons are always positive and the period well-formed.
pub fn assert_claim_well_formed(claim: &Claim) {
    assert!(claim.tons > 0, "claim {} has no tons", claim.id);
    assert!(
        claim.period_start < claim.period_end,
        "claim {} has an empty period",
        claim.id
    );
}

/// Only legal edges of the claim state machine are ever taken.
pub fn assert_valid_status_transition(from: &ClaimStatus, to: &ClaimStatus) {
    if from == to {
        return;
    }
    let valid = matches!(
        (from, to),
        (ClaimStatus::Pending, ClaimStatus::Approved)
            | (ClaimStatus::Pending, ClaimStatus::Rejected)
            | (ClaimStatus::Approved, ClaimStatus::OnSale)
            | (ClaimStatus::OnSale, ClaimStatus::Approved)
            | (ClaimStatus::OnSale, ClaimStatus::Sold)
            | (ClaimStatus::OnSale, ClaimStatus::Cancelled)
    );
    assert!(
        valid,
        "invalid status transition from {:?} to {:?}",
        from, to
    );
}

/// Terminal statuses never change.
pub fn assert_terminal_unchanged(before: &ClaimStatus, after: &ClaimStatus) {
    if before.is_terminal() {
        assert_eq!(
            before, after,
            "terminal status {:?} changed to {:?}",
            before, after
        );
    }
}

/// Run all stateless claim invariants.
pub fn assert_all_claim_invariants(claim: &Claim) {
    assert_claim_batch_link(claim);
    assert_claim_well_formed(claim);
}
