//! Soroban RPC client. Polls `getEvents` and decodes carbon ledger events.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or rate-limit
//!   response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried silently.
//!
//! ## Topic and data encoding
//!
//! Requests ask for `xdrFormat: "json"`, so a current RPC answers with
//! `topicJson` / `valueJson` holding stellar-xdr JSON `ScVal`s
//! (`{"symbol":"purchase"}`, `{"map":[{"key":…,"val":…}]}`). These are
//! flattened into plain JSON before decoding. Older nodes ignore the flag and
//! send `topic` as base64 XDR `ScVal`s or `{"type":…,"value":…}` objects;
//! those topics are still accepted for the symbol and `u64` values this
//! contract emits.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{CarbonEvent, EventKind};
use crate::units;

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

// XDR `ScValType` discriminants.
const SCV_U64: u32 = 5;
const SCV_SYMBOL: u32 = 15;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawEvent {
    /// Topic list, JSON-decoded or base64 XDR
    #[serde(default)]
    pub topic: Vec<String>,
    /// Topic list as stellar-xdr JSON, present when `xdrFormat` is `json`
    #[serde(rename = "topicJson", default)]
    pub topic_json: Vec<Value>,
    /// Event value / data
    #[serde(default)]
    pub value: Value,
    /// Event data as stellar-xdr JSON, present when `xdrFormat` is `json`
    #[serde(rename = "valueJson")]
    pub value_json: Option<Value>,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
    #[serde(rename = "pagingToken")]
    pub paging_token: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events from the RPC.
///
/// * `start_ledger`: the ledger sequence to scan from (inclusive).
/// * `cursor`: optional opaque pagination cursor from a previous response.
/// * `limit`: maximum number of events to return.
///
/// Returns `(events, next_cursor, latest_ledger)`.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<(Vec<RawEvent>, Option<String>, Option<u64>)> {
    let mut backoff = INITIAL_BACKOFF_SECS;

    loop {
        let params = build_params(contract_id, start_ledger, cursor, limit);

        let response = client
            .post(rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "getEvents",
                "params": params,
            }))
            .send()
            .await;

        let resp = match response {
            Ok(resp) => resp,
            Err(e) => {
                warn!("RPC request failed (will retry in {backoff}s): {e}");
                backoff = sleep_and_grow(backoff).await;
                continue;
            }
        };

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate-limited by RPC (will retry in {backoff}s)");
            backoff = sleep_and_grow(backoff).await;
            continue;
        }

        let body: RpcResponse = resp.json().await?;

        if let Some(err) = body.error {
            if is_hard_error(err.code) {
                return Err(IndexerError::EventParse(format!(
                    "RPC hard error {}: {}",
                    err.code, err.message
                )));
            }
            warn!(
                "RPC soft error (will retry in {backoff}s): {} {}",
                err.code, err.message
            );
            backoff = sleep_and_grow(backoff).await;
            continue;
        }

        let result = body.result.ok_or_else(|| {
            IndexerError::EventParse("Empty result from getEvents".to_string())
        })?;

        debug!(
            "Fetched {} events (latest_ledger={:?})",
            result.events.len(),
            result.latest_ledger
        );

        return Ok((result.events, result.cursor, result.latest_ledger));
    }
}

/// Invalid request / method not found: retrying will not help.
fn is_hard_error(code: i64) -> bool {
    code == -32600 || code == -32601
}

async fn sleep_and_grow(backoff: u64) -> u64 {
    tokio::time::sleep(Duration::from_secs(backoff)).await;
    next_backoff(backoff)
}

fn next_backoff(backoff: u64) -> u64 {
    (backoff * 2).min(MAX_BACKOFF_SECS)
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [
            {
                "type": "contract",
                "contractIds": [contract_id]
            }
        ],
        "pagination": {
            "limit": limit
        },
        "xdrFormat": "json"
    });

    if let Some(cur) = cursor {
        params["pagination"]["cursor"] = json!(cur);
    } else {
        params["startLedger"] = json!(start_ledger);
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode a list of raw RPC events into [`CarbonEvent`] structs.
/// Events from failed contract calls are dropped.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<CarbonEvent> {
    raw.iter()
        .enumerate()
        .filter(|(_, e)| e.in_successful_contract_call != Some(false))
        .filter_map(|(index, e)| decode_single(e, index, contract_id))
        .collect()
}

/// Fields pulled out of an event's data blob.
#[derive(Debug, Default, PartialEq)]
struct Parties {
    actor: Option<String>,
    counterparty: Option<String>,
    amount: Option<String>,
    tons: Option<String>,
}

fn decode_single(raw: &RawEvent, index: usize, contract_id: &str) -> Option<CarbonEvent> {
    let topics: Vec<String> = if raw.topic_json.is_empty() {
        raw.topic.iter().map(|t| topic_text(t)).collect()
    } else {
        raw.topic_json.iter().map(scval_text).collect()
    };
    // Leading topic symbol determines the event type.
    let kind = EventKind::from_topic(topics.first()?);

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);
    let tx_hash = raw.tx_hash.as_deref().and_then(normalize_tx_hash);

    let event_id = raw
        .id
        .clone()
        .or_else(|| raw.paging_token.clone())
        .unwrap_or_else(|| {
            format!(
                "{ledger}-{}-{index}",
                tx_hash.as_deref().unwrap_or("notx")
            )
        });

    let second_topic = topics.get(1).cloned();
    let entity = kind.entity();
    let entity_id = entity.and(second_topic.clone());

    let data = match &raw.value_json {
        Some(v) => flatten_scval(v),
        None => raw.value.clone(),
    };
    let mut parties = decode_data(&data, &kind);
    if matches!(kind, EventKind::RoleSet | EventKind::RoleDel) {
        parties.counterparty = second_topic;
    }

    Some(CarbonEvent {
        event_id,
        event_type: kind.as_str().to_string(),
        entity_kind: entity.map(|e| e.as_str().to_string()),
        entity_id,
        actor: parties.actor,
        counterparty: parties.counterparty,
        amount: parties.amount,
        tons: parties.tons,
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash,
    })
}

/// Pull apart the JSON `value` blob that Soroban returns for event data.
///
/// `amount` carries the raw integer most relevant to the event (payment
/// for purchases, price for listings, ton-units otherwise); `tons` carries
/// the ton-units moved, formatted as a decimal.
fn decode_data(value: &Value, kind: &EventKind) -> Parties {
    let field = |keys: &[&str]| extract_field(value, keys);
    let with_tons = |actor: Option<String>, counterparty: Option<String>, key: &str| {
        let raw = field(&[key]);
        Parties {
            actor,
            counterparty,
            tons: raw.as_deref().and_then(units::format_tons),
            amount: raw,
        }
    };

    match kind {
        EventKind::ProjectRegistered => Parties {
            actor: field(&["owner"]),
            amount: field(&["baseline"]),
            ..Parties::default()
        },
        EventKind::ClaimSubmitted => with_tons(field(&["owner"]), None, "tons"),
        EventKind::ClaimApproved => with_tons(field(&["auditor"]), None, "tons"),
        EventKind::ClaimRejected => Parties {
            actor: field(&["auditor"]),
            ..Parties::default()
        },
        EventKind::BatchTransferred => Parties {
            actor: field(&["from"]),
            counterparty: field(&["to"]),
            ..Parties::default()
        },
        EventKind::SaleOpened => Parties {
            actor: field(&["seller"]),
            amount: field(&["price_per_ton"]),
            tons: field(&["units"]).as_deref().and_then(units::format_tons),
            ..Parties::default()
        },
        EventKind::CreditsPurchased => Parties {
            actor: field(&["buyer"]),
            amount: field(&["amount_paid"]),
            tons: field(&["units"]).as_deref().and_then(units::format_tons),
            ..Parties::default()
        },
        EventKind::SaleClosed => Parties {
            actor: field(&["seller"]),
            ..Parties::default()
        },
        EventKind::SaleCancelled => with_tons(field(&["seller"]), None, "units_unsold"),
        EventKind::CreditsRetired => with_tons(field(&["owner"]), None, "units"),
        EventKind::CreditsTransferred => with_tons(field(&["from"]), field(&["to"]), "amount"),
        EventKind::AllowanceSet => with_tons(field(&["owner"]), field(&["spender"]), "amount"),
        EventKind::RoleSet
        | EventKind::RoleDel
        | EventKind::ProtocolPaused
        | EventKind::ProtocolUnpaused => Parties {
            // The data is the caller address itself (or `None` at init).
            actor: value
                .as_str()
                .map(String::from)
                .or_else(|| field(&["value", "address"])),
            ..Parties::default()
        },
        EventKind::Unknown => Parties::default(),
    }
}

fn extract_field(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(v) = value.get(key) {
            let s = match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            };
            if s.is_some() {
                return s;
            }
        }
    }
    None
}

/// Flatten a stellar-xdr JSON `ScVal` into plain JSON: maps become objects
/// keyed by their symbol keys, addresses and symbols become strings, integers
/// become decimal strings and `void` becomes `null`. Anything that is not
/// `ScVal`-shaped is returned unchanged.
fn flatten_scval(v: &Value) -> Value {
    let Value::Object(obj) = v else {
        return match v {
            Value::String(s) if s == "void" => Value::Null,
            other => other.clone(),
        };
    };
    let mut entries = obj.iter();
    let (Some((tag, inner)), None) = (entries.next(), entries.next()) else {
        return v.clone();
    };
    match tag.as_str() {
        "map" => {
            let mut out = serde_json::Map::new();
            for entry in inner.as_array().into_iter().flatten() {
                let (Some(key), Some(val)) = (entry.get("key"), entry.get("val")) else {
                    continue;
                };
                out.insert(scval_text(key), flatten_scval(val));
            }
            Value::Object(out)
        }
        "vec" => Value::Array(
            inner
                .as_array()
                .into_iter()
                .flatten()
                .map(flatten_scval)
                .collect(),
        ),
        "symbol" | "string" | "address" | "bytes" | "bool" => inner.clone(),
        "u32" | "i32" => inner.clone(),
        "u64" | "i64" | "u128" | "i128" | "timepoint" | "duration" => {
            int_text(inner).map(Value::String).unwrap_or_else(|| inner.clone())
        }
        "void" => Value::Null,
        _ => v.clone(),
    }
}

/// Decimal text of a JSON integer: a number, a decimal string, or the
/// `{"hi":…,"lo":…}` pair older stellar-xdr releases emit for 128-bit values.
fn int_text(v: &Value) -> Option<String> {
    match v {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Object(parts) => {
            let hi = parts.get("hi")?.as_i64()?;
            let lo = parts.get("lo")?.as_u64()?;
            Some(((i128::from(hi) << 64) | i128::from(lo)).to_string())
        }
        _ => None,
    }
}

/// Text form of a stellar-xdr JSON topic.
fn scval_text(v: &Value) -> String {
    match flatten_scval(v) {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Text form of a topic: the `value` of a JSON-decoded topic, the symbol or
/// number inside a base64 XDR `ScVal`, or the raw string as a fallback.
fn topic_text(raw: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        match v.get("value") {
            Some(Value::String(s)) => return s.clone(),
            Some(Value::Number(n)) => return n.to_string(),
            _ => {}
        }
    }
    if let Some(decoded) = decode_xdr_scval(raw) {
        return decoded;
    }
    raw.to_string()
}

/// Decode a base64 XDR `ScVal` holding a `Symbol` or `u64`.
fn decode_xdr_scval(raw: &str) -> Option<String> {
    let bytes = BASE64.decode(raw).ok()?;
    let (tag, body) = bytes.split_first_chunk::<4>()?;
    match u32::from_be_bytes(*tag) {
        SCV_SYMBOL => {
            let (len, rest) = body.split_first_chunk::<4>()?;
            let len = u32::from_be_bytes(*len) as usize;
            let symbol = rest.get(..len)?;
            std::str::from_utf8(symbol).ok().map(String::from)
        }
        SCV_U64 => {
            let (value, _) = body.split_first_chunk::<8>()?;
            Some(u64::from_be_bytes(*value).to_string())
        }
        _ => None,
    }
}

/// Lower-case a 32-byte hex transaction hash; anything else is dropped.
fn normalize_tx_hash(raw: &str) -> Option<String> {
    match hex::decode(raw) {
        Ok(bytes) if bytes.len() == 32 => Some(hex::encode(bytes)),
        _ => {
            debug!("Ignoring malformed tx hash {raw:?}");
            None
        }
    }
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
