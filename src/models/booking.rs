//! Booking model, populated projections and lifecycle rules

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{
    payment::{Payment, PaymentOutcome, PaymentStatus},
    tour::TourSummary,
};
use crate::error::{AppError, AppResult};

/// Booking status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirm,
    Failed,
    Cancelled,
}

text_enum!(BookingStatus {
    Pending => "PENDING",
    Confirm => "CONFIRM",
    Failed => "FAILED",
    Cancelled => "CANCELLED",
});

impl BookingStatus {
    /// Statuses that hold seats on a tour date
    pub const RESERVING: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirm];
}

/// Booking record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Booking {
    pub id: i32,
    pub user_id: i32,
    pub tour_id: i32,
    pub date: NaiveDate,
    pub guest_count: i32,
    pub status: BookingStatus,
    pub payment_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contact fields of the booking user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Booking with its user, tour and payment populated
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingDetails {
    pub id: i32,
    pub date: NaiveDate,
    pub guest_count: i32,
    pub status: BookingStatus,
    pub user: BookingUser,
    pub tour: TourSummary,
    pub payment: Option<Payment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flat row behind `BookingDetails`
#[derive(Debug, Clone, FromRow)]
pub struct BookingDetailsRow {
    pub id: i32,
    pub date: NaiveDate,
    pub guest_count: i32,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: i32,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: Option<String>,
    pub user_address: Option<String>,
    pub tour_id: i32,
    pub tour_title: String,
    pub tour_cost_from: Option<Decimal>,
    pub payment_id: Option<i32>,
    pub payment_transaction_id: Option<String>,
    pub payment_amount: Option<Decimal>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_gateway_data: Option<serde_json::Value>,
    pub payment_created_at: Option<DateTime<Utc>>,
    pub payment_updated_at: Option<DateTime<Utc>>,
}

impl From<BookingDetailsRow> for BookingDetails {
    fn from(row: BookingDetailsRow) -> Self {
        let payment = match (
            row.payment_id,
            row.payment_transaction_id,
            row.payment_amount,
            row.payment_status,
            row.payment_created_at,
            row.payment_updated_at,
        ) {
            (Some(id), Some(transaction_id), Some(amount), Some(status), Some(created_at), Some(updated_at)) => {
                Some(Payment {
                    id,
                    booking_id: row.id,
                    transaction_id,
                    amount,
                    status,
                    gateway_data: row.payment_gateway_data,
                    created_at,
                    updated_at,
                })
            }
            _ => None,
        };

        BookingDetails {
            id: row.id,
            date: row.date,
            guest_count: row.guest_count,
            status: row.status,
            user: BookingUser {
                id: row.user_id,
                name: row.user_name,
                email: row.user_email,
                phone: row.user_phone,
                address: row.user_address,
            },
            tour: TourSummary {
                id: row.tour_id,
                title: row.tour_title,
                cost_from: row.tour_cost_from,
            },
            payment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Create booking request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBooking {
    /// Tour ID
    pub tour: i32,
    /// Tour date (YYYY-MM-DD)
    pub date: String,
    #[validate(range(min = 1, message = "At least 1 guest is required"))]
    pub guest_count: i32,
}

/// Availability check request (body or query string)
#[derive(Debug, Clone, Deserialize, Validate, IntoParams, ToSchema)]
pub struct AvailabilityRequest {
    /// Tour ID
    pub tour: i32,
    /// Tour date (YYYY-MM-DD)
    pub date: String,
    #[validate(range(min = 1, message = "At least 1 guest is required"))]
    pub guest_count: i32,
}

/// Availability of a tour date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Availability {
    pub available: bool,
    /// Seats left; negative if the date is overbooked
    pub remaining_seats: i64,
    pub message: String,
}

/// Booking list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookingQuery {
    pub status: Option<BookingStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Parse a tour date in `YYYY-MM-DD` form
pub fn parse_tour_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid date '{}', expected YYYY-MM-DD", value)))
}

/// Change to apply to a booking and its payment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Apply {
        payment: PaymentStatus,
        booking: BookingStatus,
    },
    /// The outcome was already recorded; nothing to write
    AlreadyApplied,
}

/// Decide how a payment outcome moves a booking and its payment.
///
/// Only an unpaid payment on a pending booking may transition. Replaying the
/// outcome that produced the current state is a no-op; any other change to a
/// settled booking is a conflict.
pub fn plan_transition(
    payment: PaymentStatus,
    booking: BookingStatus,
    outcome: PaymentOutcome,
) -> AppResult<Transition> {
    let (payment_target, booking_target) = outcome.targets();

    if payment == payment_target && booking == booking_target {
        return Ok(Transition::AlreadyApplied);
    }

    if payment == PaymentStatus::Unpaid && booking == BookingStatus::Pending {
        return Ok(Transition::Apply {
            payment: payment_target,
            booking: booking_target,
        });
    }

    Err(AppError::Conflict(format!(
        "Cannot apply '{}' to a booking in status {} with payment {}",
        outcome.as_str(),
        booking,
        payment
    )))
}
