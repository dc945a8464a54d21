use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Booking, BookingForm, Schedule};
use crate::services::lifecycle::CreateOutcome;
use crate::services::validation::{Field, ValidationErrors};
use crate::state::AppState;

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(form): Json<BookingForm>,
) -> Result<(StatusCode, Json<CreateOutcome>), AppError> {
    let outcome = state.bookings.create(&form).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

// GET /api/bookings/lookup
#[derive(Deserialize)]
pub struct LookupQuery {
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub async fn lookup_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let email = query.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    let phone = query.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());

    let bookings = match (email, phone) {
        (Some(email), _) => state.bookings.lookup_by_email(email).await?,
        (None, Some(phone)) => state.bookings.lookup_by_phone(phone).await?,
        (None, None) => {
            return Err(AppError::Validation(ValidationErrors::single(
                Field::Email,
                "Please enter an email address or phone number",
            )))
        }
    };
    Ok(Json(bookings))
}

// GET /api/slots
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: String,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    date: String,
    slots: Vec<String>,
    schedule: Schedule,
}

pub async fn available_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, AppError> {
    let slots = state.bookings.available_slots(&query.date)?;
    Ok(Json(SlotsResponse {
        date: query.date,
        slots,
        schedule: state.bookings.schedule().clone(),
    }))
}
