//! Booking endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        booking::{Availability, AvailabilityRequest, BookingDetails, BookingQuery, CreateBooking},
        Page,
    },
};

use super::{AuthenticatedUser, PaginatedResponse};

/// Created booking with the page where it must be paid
#[derive(Serialize, ToSchema)]
pub struct CreateBookingResponse {
    /// Hosted payment page URL
    pub payment_url: String,
    pub booking: BookingDetails,
}

/// Book a tour date and open a payment session
#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    request_body = CreateBooking,
    responses(
        (status = 201, description = "Booking created, awaiting payment", body = CreateBookingResponse),
        (status = 400, description = "Invalid date, guest count or incomplete profile"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User or tour not found"),
        (status = 409, description = "Not enough seats left"),
        (status = 502, description = "Payment gateway failure")
    )
)]
pub async fn create_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<CreateBooking>,
) -> AppResult<(StatusCode, Json<CreateBookingResponse>)> {
    let created = state
        .services
        .bookings
        .create_booking(&payload, claims.user_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            payment_url: created.payment_url,
            booking: created.booking,
        }),
    ))
}

/// Check seat availability for a tour date
#[utoipa::path(
    post,
    path = "/bookings/check-availability",
    tag = "bookings",
    request_body = AvailabilityRequest,
    responses(
        (status = 200, description = "Availability of the date", body = Availability),
        (status = 400, description = "Invalid date or guest count"),
        (status = 404, description = "Tour not found")
    )
)]
pub async fn check_availability(
    State(state): State<crate::AppState>,
    Json(request): Json<AvailabilityRequest>,
) -> AppResult<Json<Availability>> {
    let availability = state.services.availability.check(&request).await?;
    Ok(Json(availability))
}

/// Check seat availability for a tour date (query string form)
#[utoipa::path(
    get,
    path = "/bookings/check-availability",
    tag = "bookings",
    params(AvailabilityRequest),
    responses(
        (status = 200, description = "Availability of the date", body = Availability),
        (status = 400, description = "Invalid date or guest count"),
        (status = 404, description = "Tour not found")
    )
)]
pub async fn check_availability_query(
    State(state): State<crate::AppState>,
    Query(request): Query<AvailabilityRequest>,
) -> AppResult<Json<Availability>> {
    let availability = state.services.availability.check(&request).await?;
    Ok(Json(availability))
}

/// List all bookings (admin)
#[utoipa::path(
    get,
    path = "/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(BookingQuery),
    responses(
        (status = 200, description = "List of bookings", body = PaginatedResponse<BookingDetails>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn list_bookings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BookingQuery>,
) -> AppResult<Json<PaginatedResponse<BookingDetails>>> {
    claims.require_admin()?;

    let page = Page::new(query.page, query.per_page)?;
    let (items, total) = state.services.bookings.list_bookings(&query).await?;

    Ok(Json(PaginatedResponse {
        items,
        total,
        page: page.page,
        per_page: page.per_page,
    }))
}

/// Bookings of the current user, newest first
#[utoipa::path(
    get,
    path = "/bookings/my",
    tag = "bookings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Bookings of the current user", body = Vec<BookingDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_bookings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BookingDetails>>> {
    let bookings = state.services.bookings.get_user_bookings(claims.user_id).await?;
    Ok(Json(bookings))
}

/// Get booking details by ID
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking details", body = BookingDetails),
        (status = 403, description = "Booking belongs to another user"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookingDetails>> {
    let booking = state.services.bookings.get_booking(id, &claims).await?;
    Ok(Json(booking))
}

/// Cancel a pending booking
#[utoipa::path(
    post,
    path = "/bookings/{id}/cancel",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking cancelled", body = BookingDetails),
        (status = 403, description = "Booking belongs to another user"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is no longer pending")
    )
)]
pub async fn cancel_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BookingDetails>> {
    let booking = state.services.bookings.cancel_booking(id, &claims).await?;
    Ok(Json(booking))
}
