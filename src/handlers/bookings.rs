use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::booking::{parse_date, DATE_FORMAT};
use crate::models::{Booking, BookingKind, DayAvailability};
use crate::services::scheduling;
use crate::state::AppState;

use super::auth::current_user;

const DEFAULT_LIST_LIMIT: i64 = 50;

#[derive(Deserialize)]
pub struct BookingRequest {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub booking_date: Option<String>,
    pub booking_type: Option<String>,
    pub booking_slot: Option<String>,
    pub booking_time_from: Option<String>,
    pub booking_time_to: Option<String>,
}

struct ValidBooking {
    customer_name: String,
    customer_email: String,
    booking_date: NaiveDate,
    kind: BookingKind,
}

impl BookingRequest {
    fn validate(self) -> Result<ValidBooking, AppError> {
        let customer_name = self
            .customer_name
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::validation("Customer name is required"))?;
        let customer_email = self
            .customer_email
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::validation("Customer email is required"))?;
        let booking_date = self
            .booking_date
            .as_deref()
            .ok_or_else(|| AppError::validation("Booking date is required"))
            .and_then(|d| parse_date(d).map_err(|e| AppError::validation(e.to_string())))?;
        let booking_type = self
            .booking_type
            .ok_or_else(|| AppError::validation("Booking type is required"))?;

        let kind = BookingKind::from_labels(
            &booking_type,
            self.booking_slot.as_deref(),
            self.booking_time_from.as_deref(),
            self.booking_time_to.as_deref(),
        )
        .map_err(|e| AppError::validation(e.to_string()))?;

        Ok(ValidBooking {
            customer_name,
            customer_email,
            booking_date,
            kind,
        })
    }
}

#[derive(Serialize)]
pub struct BookingResponse {
    id: String,
    customer_name: String,
    customer_email: String,
    booking_date: String,
    booking_type: &'static str,
    booking_slot: Option<&'static str>,
    booking_time_from: Option<String>,
    booking_time_to: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        let range = b.kind.time_range();
        Self {
            id: b.id,
            customer_name: b.customer_name,
            customer_email: b.customer_email,
            booking_date: b.booking_date.format(DATE_FORMAT).to_string(),
            booking_type: b.kind.label(),
            booking_slot: b.kind.slot().map(|s| s.label()),
            booking_time_from: range.map(|r| r.start_hhmm()),
            booking_time_to: range.map(|r| r.end_hhmm()),
            created_at: b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            updated_at: b.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

fn booking_not_found() -> AppError {
    AppError::NotFound("Booking not found".to_string())
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<BookingRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let user = current_user(&state, &headers)?;
    let input = body.validate()?;

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.id,
        customer_name: input.customer_name,
        customer_email: input.customer_email,
        booking_date: input.booking_date,
        kind: input.kind,
        created_at: now,
        updated_at: now,
    };

    {
        // Check and insert under one lock so two requests cannot claim the same slot.
        let db = state.db()?;
        scheduling::ensure_no_overlap(&db, booking.booking_date, &booking.kind, None)?;
        queries::create_booking(&db, &booking)?;
    }

    tracing::info!(
        booking_id = %booking.id,
        date = %booking.booking_date,
        kind = booking.kind.as_str(),
        "booking created"
    );

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Booking created successfully",
            "booking": BookingResponse::from(booking),
        })),
    ))
}

// GET /api/bookings
#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = current_user(&state, &headers)?;
    let limit = query.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIST_LIMIT);

    let (bookings, total) = {
        let db = state.db()?;
        (
            queries::get_bookings_for_user(&db, &user.id, limit)?,
            queries::count_bookings_for_user(&db, &user.id)?,
        )
    };

    let bookings: Vec<BookingResponse> = bookings.into_iter().map(BookingResponse::from).collect();

    Ok(Json(serde_json::json!({
        "bookings": bookings,
        "total": total,
    })))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let user = current_user(&state, &headers)?;

    let booking = {
        let db = state.db()?;
        queries::get_booking_for_user(&db, &id, &user.id)?
    };

    booking
        .map(|b| Json(BookingResponse::from(b)))
        .ok_or_else(booking_not_found)
}

// PUT /api/bookings/:id
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<BookingRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = current_user(&state, &headers)?;

    let db = state.db()?;
    let existing = queries::get_booking_for_user(&db, &id, &user.id)?.ok_or_else(booking_not_found)?;
    let input = body.validate()?;

    let updated = Booking {
        id: existing.id,
        user_id: existing.user_id,
        customer_name: input.customer_name,
        customer_email: input.customer_email,
        booking_date: input.booking_date,
        kind: input.kind,
        created_at: existing.created_at,
        updated_at: Utc::now().naive_utc(),
    };

    scheduling::ensure_no_overlap(&db, updated.booking_date, &updated.kind, Some(&updated.id))?;
    if !queries::update_booking(&db, &updated)? {
        return Err(booking_not_found());
    }
    drop(db);

    tracing::info!(
        booking_id = %updated.id,
        date = %updated.booking_date,
        kind = updated.kind.as_str(),
        "booking updated"
    );

    Ok(Json(serde_json::json!({
        "message": "Booking updated successfully",
        "booking": BookingResponse::from(updated),
    })))
}

// DELETE /api/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = current_user(&state, &headers)?;

    let deleted = {
        let db = state.db()?;
        queries::delete_booking_for_user(&db, &id, &user.id)?
    };

    if !deleted {
        return Err(booking_not_found());
    }

    tracing::info!(booking_id = %id, "booking deleted");

    Ok(Json(serde_json::json!({ "message": "Booking deleted successfully" })))
}

// GET /api/bookings/availability?date=YYYY-MM-DD
#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<String>,
}

pub async fn check_availability(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    current_user(&state, &headers)?;

    let date = query
        .date
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| AppError::validation("Date is required"))?;
    let date = parse_date(&date).map_err(|e| AppError::validation(e.to_string()))?;

    let bookings = {
        let db = state.db()?;
        queries::get_bookings_on_date(&db, date, None)?
    };

    Ok(Json(serde_json::json!({
        "date": date.format(DATE_FORMAT).to_string(),
        "availability": DayAvailability::from_bookings(&bookings),
    })))
}
