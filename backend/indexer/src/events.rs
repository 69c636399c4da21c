//! Canonical event types emitted by the carbon ledger contract.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/carbon_ledger/src/events.rs` and `contracts/carbon_ledger/src/rbac.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the carbon ledger contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A project was registered (`proj_reg` topic).
    ProjectRegistered,
    /// A reduction claim was filed (`claim_sub` topic).
    ClaimSubmitted,
    /// An auditor approved a claim; credits were minted (`approved` topic).
    ClaimApproved,
    /// An auditor rejected a claim (`rejected` topic).
    ClaimRejected,
    /// A batch changed owner (`batch_xfr` topic).
    BatchTransferred,
    /// A batch was listed for sale (`sale_open` topic).
    SaleOpened,
    /// Units were bought from a sale (`purchase` topic).
    CreditsPurchased,
    /// A sale sold out (`sale_done` topic).
    SaleClosed,
    /// A sale was withdrawn by its seller (`sale_stop` topic).
    SaleCancelled,
    /// Units were burned and a certificate issued (`retired` topic).
    CreditsRetired,
    /// Units moved between accounts (`transfer` topic).
    CreditsTransferred,
    /// An allowance was set (`approve` topic).
    AllowanceSet,
    /// A role was granted or replaced (`role_set` topic).
    RoleSet,
    /// A role was revoked (`role_del` topic).
    RoleDel,
    /// Protocol was paused (`paused` topic).
    ProtocolPaused,
    /// Protocol was unpaused (`unpaused` topic).
    ProtocolUnpaused,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "proj_reg" => Self::ProjectRegistered,
            "claim_sub" => Self::ClaimSubmitted,
            "approved" => Self::ClaimApproved,
            "rejected" => Self::ClaimRejected,
            "batch_xfr" => Self::BatchTransferred,
            "sale_open" => Self::SaleOpened,
            "purchase" => Self::CreditsPurchased,
            "sale_done" => Self::SaleClosed,
            "sale_stop" => Self::SaleCancelled,
            "retired" => Self::CreditsRetired,
            "transfer" => Self::CreditsTransferred,
            "approve" => Self::AllowanceSet,
            "role_set" => Self::RoleSet,
            "role_del" => Self::RoleDel,
            "paused" => Self::ProtocolPaused,
            "unpaused" => Self::ProtocolUnpaused,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectRegistered => "project_registered",
            Self::ClaimSubmitted => "claim_submitted",
            Self::ClaimApproved => "claim_approved",
            Self::ClaimRejected => "claim_rejected",
            Self::BatchTransferred => "batch_transferred",
            Self::SaleOpened => "sale_opened",
            Self::CreditsPurchased => "credits_purchased",
            Self::SaleClosed => "sale_closed",
            Self::SaleCancelled => "sale_cancelled",
            Self::CreditsRetired => "credits_retired",
            Self::CreditsTransferred => "credits_transferred",
            Self::AllowanceSet => "allowance_set",
            Self::RoleSet => "role_set",
            Self::RoleDel => "role_del",
            Self::ProtocolPaused => "protocol_paused",
            Self::ProtocolUnpaused => "protocol_unpaused",
            Self::Unknown => "unknown",
        }
    }

    /// The entity named by the second topic, if this kind carries one.
    /// Ledger-level events (`transfer`, `approve`) key on an address instead.
    pub fn entity(&self) -> Option<EntityKind> {
        match self {
            Self::ProjectRegistered => Some(EntityKind::Project),
            Self::ClaimSubmitted | Self::ClaimApproved | Self::ClaimRejected => {
                Some(EntityKind::Claim)
            }
            Self::BatchTransferred
            | Self::SaleOpened
            | Self::CreditsPurchased
            | Self::SaleClosed
            | Self::SaleCancelled => Some(EntityKind::Batch),
            Self::CreditsRetired => Some(EntityKind::Certificate),
            _ => None,
        }
    }
}

/// Entities that events can be grouped under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Project,
    Claim,
    Batch,
    Certificate,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Claim => "claim",
            Self::Batch => "batch",
            Self::Certificate => "certificate",
        }
    }

    /// Map the plural collection segment of a REST path (`/claims/:id/events`).
    pub fn from_collection(segment: &str) -> Option<Self> {
        match segment {
            "projects" => Some(Self::Project),
            "claims" => Some(Self::Claim),
            "batches" => Some(Self::Batch),
            "certificates" => Some(Self::Certificate),
            _ => None,
        }
    }
}

/// A fully decoded carbon ledger event, ready to be stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarbonEvent {
    /// RPC-assigned event id; unique across the network.
    pub event_id: String,
    pub event_type: String,
    pub entity_kind: Option<String>,
    pub entity_id: Option<String>,
    /// Account that caused the event (seller, buyer, auditor, owner ...).
    pub actor: Option<String>,
    /// Receiving side of transfers and allowances.
    pub counterparty: Option<String>,
    /// Raw integer amount as emitted (ton base units or payment base units).
    pub amount: Option<String>,
    /// Ton-units rendered as a decimal string, when the event moves tons.
    pub tons: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub entity_kind: Option<String>,
    pub entity_id: Option<String>,
    pub actor: Option<String>,
    pub counterparty: Option<String>,
    pub amount: Option<String>,
    pub tons: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}
