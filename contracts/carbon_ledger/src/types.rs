//! # Types
//!
//! Shared data structures used across all modules of the carbon ledger.
//!
//! ## Amounts
//!
//! Ton-units are `i128` fixed-point values with [`DECIMALS`] fractional
//! digits, so [`ONE_TON`] base units represent one ton of CO₂-equivalent.
//!
//! ## Claim status as a finite-state machine
//!
//! ```text
//! Pending ──► Approved ──► OnSale ──► Sold
//!    │            ▲           │
//!    │            └───────────┤ (cancelled before any fill)
//!    ▼                        ▼
//! Rejected                Cancelled (cancelled after a partial fill)
//! ```
//!
//! `Rejected`, `Sold` and `Cancelled` are terminal. Only the `claims` module
//! writes a status; the marketplace drives the sale-related edges through
//! the sealed callbacks in that module.

use soroban_sdk::{contracttype, Address, String};

/// Number of fractional digits carried by a ton-unit.
pub const DECIMALS: u32 = 18;

/// Base units in one whole ton.
pub const ONE_TON: i128 = 1_000_000_000_000_000_000;

/// Lifecycle status of a reduction claim.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClaimStatus {
    /// Submitted by the project owner; awaiting an auditor.
    Pending,
    /// Audited; credits minted and a batch issued.
    Approved,
    /// Audit refused. Terminal.
    Rejected,
    /// The batch behind the claim has an active sale.
    OnSale,
    /// The sale ran out of supply. Terminal.
    Sold,
    /// The sale was withdrawn after part of it had been bought. Terminal.
    Cancelled,
}

impl ClaimStatus {
    /// True once no operation may change the status again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ClaimStatus::Rejected | ClaimStatus::Sold | ClaimStatus::Cancelled
        )
    }

    /// True for every status reached through an approval.
    pub fn has_batch(&self) -> bool {
        matches!(
            self,
            ClaimStatus::Approved | ClaimStatus::OnSale | ClaimStatus::Sold | ClaimStatus::Cancelled
        )
    }
}

/// An emissions-reduction project. Immutable after registration.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Project {
    pub id: u64,
    /// Sole authority allowed to file claims against the project.
    pub owner: Address,
    pub name: String,
    /// Baseline emissions per year, in whole tons.
    pub baseline: i128,
}

/// A reduction claim filed by a project owner.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Claim {
    pub id: u64,
    pub project_id: u64,
    /// Claimed reduction in ton-units.
    pub tons: i128,
    /// Unix seconds, strictly before `period_end`.
    pub period_start: u64,
    pub period_end: u64,
    /// Opaque reference into the evidence store.
    pub evidence_ref: String,
    pub status: ClaimStatus,
    /// Set exactly once, on approval.
    pub batch_id: Option<u64>,
}

/// The non-fungible record issued for one approved claim.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Batch {
    pub id: u64,
    pub claim_id: u64,
    pub owner: Address,
    /// Reference to the auditor's evidence package.
    pub audit_ref: String,
    /// Ton-units minted when the batch was issued.
    pub tons: i128,
}

/// An open (or closed) fractional sale of a batch.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Sale {
    pub batch_id: u64,
    pub seller: Address,
    pub total_units: i128,
    pub units_available: i128,
    /// Price of one whole ton, in the payment token's base units.
    pub price_per_ton: i128,
    pub active: bool,
}

/// One successful purchase. Append-only.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PurchaseRecord {
    pub batch_id: u64,
    pub buyer: Address,
    pub units: i128,
    pub amount_paid: i128,
    pub timestamp: u64,
}

/// Certificate minted when credits are burned. Append-only.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RetirementRecord {
    pub id: u64,
    pub owner: Address,
    pub units: i128,
    pub purpose: String,
    pub evidence_ref: String,
    pub timestamp: u64,
}
