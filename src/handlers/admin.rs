use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::Booking;
use crate::services::lifecycle::{BookingStats, StatusOutcome};
use crate::services::session::{IssuedSession, Session};
use crate::state::AppState;

fn bearer_token(headers: &HeaderMap) -> &str {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .unwrap_or("")
}

fn check_auth(headers: &HeaderMap, state: &AppState) -> Result<Session, AppError> {
    state.sessions.authorize(bearer_token(headers))
}

// POST /api/admin/login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<IssuedSession>, AppError> {
    let issued = state.sessions.login(&body.email, &body.password)?;
    Ok(Json(issued))
}

// POST /api/admin/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    state.sessions.logout(bearer_token(&headers));
    Json(serde_json::json!({"ok": true}))
}

// GET /api/admin/session
#[derive(Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    session: Session,
    expires_at: Option<DateTime<Utc>>,
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, AppError> {
    let session = check_auth(&headers, &state)?;
    Ok(Json(SessionResponse {
        expires_at: session.expires_at(),
        session,
    }))
}

// GET /api/admin/bookings
pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Booking>>, AppError> {
    check_auth(&headers, &state)?;
    let bookings = state.bookings.list_all().await?;
    Ok(Json(bookings))
}

// GET /api/admin/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<BookingStats>, AppError> {
    check_auth(&headers, &state)?;
    let stats = state.bookings.stats().await?;
    Ok(Json(stats))
}

// POST /api/admin/bookings/:id/confirm
pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<StatusOutcome>, AppError> {
    check_auth(&headers, &state)?;
    let outcome = state.bookings.confirm(&id).await?;
    Ok(Json(outcome))
}

/// Destructive staff actions carry `?confirm=true` once the operator has
/// agreed to the prompt.
#[derive(Deserialize, Default)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

// POST /api/admin/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<StatusOutcome>, AppError> {
    check_auth(&headers, &state)?;
    let outcome = state.bookings.cancel(&id, query.confirm).await?;
    Ok(Json(outcome))
}

// DELETE /api/admin/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state)?;
    state.bookings.delete(&id, query.confirm).await?;
    Ok(Json(serde_json::json!({"ok": true, "id": id})))
}
