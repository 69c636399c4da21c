//! Axum REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db;
use crate::errors::Result;
use crate::events::{EntityKind, EventRecord};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EntityEventsResponse {
    pub entity_kind: &'static str,
    pub entity_id: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AccountEventsResponse {
    pub address: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}

/// 200 with the serialized body, or 500 carrying the database error.
fn respond<T: Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /events`
///
/// Returns all indexed events.
pub async fn get_all_events(State(state): State<Arc<ApiState>>) -> Response {
    respond(
        db::get_all_events(&state.pool)
            .await
            .map(|events| AllEventsResponse {
                count: events.len(),
                events,
            }),
    )
}

/// `GET /events/:event_type`
///
/// Returns every event of one type, e.g. `credits_retired`.
pub async fn get_events_by_type(
    State(state): State<Arc<ApiState>>,
    Path(event_type): Path<String>,
) -> Response {
    respond(
        db::get_events_by_type(&state.pool, &event_type)
            .await
            .map(|events| AllEventsResponse {
                count: events.len(),
                events,
            }),
    )
}

/// `GET /:collection/:id/events` for `projects`, `claims`, `batches` and
/// `certificates`.
pub async fn get_entity_events(
    State(state): State<Arc<ApiState>>,
    Path((collection, entity_id)): Path<(String, String)>,
) -> Response {
    let Some(kind) = EntityKind::from_collection(&collection) else {
        return error(
            StatusCode::NOT_FOUND,
            format!("unknown collection '{collection}'"),
        );
    };
    let result = db::get_events_for_entity(&state.pool, kind, &entity_id).await;
    respond(result.map(|events| EntityEventsResponse {
        entity_kind: kind.as_str(),
        entity_id,
        count: events.len(),
        events,
    }))
}

/// `GET /accounts/:address/events`
///
/// Returns every event where the account acted or received.
pub async fn get_account_events(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
) -> Response {
    let result = db::get_events_for_account(&state.pool, &address).await;
    respond(result.map(|events| AccountEventsResponse {
        address,
        count: events.len(),
        events,
    }))
}
