//! Booking creation, lookup and cancellation
//!
//! Creating a booking writes the booking, its payment and the link between
//! them in one unit of work, then opens a payment session with the gateway.
//! The unit is committed only once the gateway has answered with a payment
//! page; any failure before that rolls every write back, so a booking never
//! exists without its payment or vice versa.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        booking::{parse_tour_date, BookingDetails, BookingQuery, CreateBooking},
        payment::PaymentOutcome,
        tour::Tour,
        user::{User, UserClaims},
    },
    repository::{Repository, UnitOfWork},
    services::{
        availability::{within_window, SeatInventory},
        gateway::{PaymentGateway, PaymentInitRequest},
        payments::settle,
    },
};

/// Persisted booking and the page where it can be paid
#[derive(Debug, Clone)]
pub struct BookingCreated {
    pub payment_url: String,
    pub booking: BookingDetails,
}

/// Total price of a booking, bounded by what a payment row can store
/// (`NUMERIC(12, 2)`)
pub fn booking_amount(cost: Decimal, guest_count: i32) -> AppResult<Decimal> {
    let max = Decimal::new(999_999_999_999, 2);

    cost.checked_mul(Decimal::from(guest_count))
        .map(|amount| amount.round_dp(2))
        .filter(|amount| !amount.is_sign_negative() && *amount <= max)
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Total for {} guests at {} each is not a payable amount",
                guest_count, cost
            ))
        })
}

/// Fresh gateway correlation key
pub fn new_transaction_id() -> String {
    format!("tran_{}", Uuid::new_v4().simple())
}

#[derive(Clone)]
pub struct BookingsService {
    repository: Repository,
    gateway: Arc<dyn PaymentGateway>,
}

impl BookingsService {
    pub fn new(repository: Repository, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { repository, gateway }
    }

    /// Reserve seats for a user and open a payment session for them
    pub async fn create_booking(&self, payload: &CreateBooking, user_id: i32) -> AppResult<BookingCreated> {
        payload.validate()?;
        let date = parse_tour_date(&payload.date)?;

        let user = self.repository.users.get_by_id(user_id).await?;
        if !user.has_contact_details() {
            return Err(AppError::BadRequest(
                "Please update your profile with phone and address to book a tour".to_string(),
            ));
        }

        let tour = self.repository.tours.get_by_id(payload.tour).await?;
        let cost = tour
            .cost_from
            .ok_or_else(|| AppError::BadRequest("No tour cost found".to_string()))?;

        if payload.guest_count > tour.max_guest {
            return Err(AppError::BadRequest(format!(
                "Guest count {} exceeds the tour capacity of {}",
                payload.guest_count, tour.max_guest
            )));
        }

        let amount = booking_amount(cost, payload.guest_count)?;
        let transaction_id = new_transaction_id();

        let mut uow = self.repository.begin().await?;

        match self
            .reserve_and_open_session(&mut uow, &user, &tour, date, payload.guest_count, amount, &transaction_id)
            .await
        {
            Ok(created) => {
                uow.commit().await?;
                tracing::info!(
                    booking_id = created.booking.id,
                    tour_id = tour.id,
                    transaction_id = %transaction_id,
                    guest_count = payload.guest_count,
                    "Booking created"
                );
                Ok(created)
            }
            Err(e) => {
                if let Err(rollback_err) = uow.rollback().await {
                    tracing::error!("Failed to roll back booking creation: {}", rollback_err);
                }
                tracing::warn!(
                    tour_id = tour.id,
                    transaction_id = %transaction_id,
                    "Booking creation aborted: {}",
                    e
                );
                Err(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn reserve_and_open_session(
        &self,
        uow: &mut UnitOfWork,
        user: &User,
        tour: &Tour,
        date: NaiveDate,
        guest_count: i32,
        amount: Decimal,
        transaction_id: &str,
    ) -> AppResult<BookingCreated> {
        let conn = uow.conn();

        // Concurrent bookings for this tour wait here until we commit or roll back
        let locked = self.repository.tours.lock_by_id(conn, tour.id).await?;

        if locked.window().is_some() && !within_window(&locked, date)? {
            return Err(AppError::BadRequest(
                "Selected date is outside of the tour dates".to_string(),
            ));
        }

        let inventory = SeatInventory {
            max_guest: locked.max_guest as i64,
            already_booked: self.repository.bookings.booked_seats(&mut *conn, locked.id, date).await?,
        };
        if !inventory.fits(guest_count as i64) {
            return Err(AppError::Conflict(format!(
                "Only {} seats left on {} for this tour",
                inventory.remaining().max(0),
                date
            )));
        }

        let booking = self
            .repository
            .bookings
            .create(conn, user.id, locked.id, date, guest_count)
            .await?;
        let payment = self
            .repository
            .payments
            .create(conn, booking.id, transaction_id, amount)
            .await?;
        self.repository.bookings.set_payment(conn, booking.id, payment.id).await?;

        let details = self.repository.bookings.get_details_with(&mut *conn, booking.id).await?;

        let request = PaymentInitRequest {
            name: details.user.name.clone(),
            email: details.user.email.clone(),
            phone_number: details.user.phone.clone().unwrap_or_default(),
            address: details.user.address.clone().unwrap_or_default(),
            amount,
            transaction_id: transaction_id.to_string(),
        };
        let session = self.gateway.init_session(&request).await?;

        Ok(BookingCreated {
            payment_url: session.redirect_url,
            booking: details,
        })
    }

    /// Get a booking visible to the caller
    pub async fn get_booking(&self, booking_id: i32, claims: &UserClaims) -> AppResult<BookingDetails> {
        let booking = self.repository.bookings.get_details(booking_id).await?;
        claims.require_owner_or_admin(booking.user.id)?;
        Ok(booking)
    }

    /// Bookings of the calling user
    pub async fn get_user_bookings(&self, user_id: i32) -> AppResult<Vec<BookingDetails>> {
        self.repository.bookings.list_for_user(user_id).await
    }

    /// All bookings (administration)
    pub async fn list_bookings(&self, query: &BookingQuery) -> AppResult<(Vec<BookingDetails>, i64)> {
        self.repository.bookings.list(query).await
    }

    /// Cancel a pending booking together with its unpaid payment
    pub async fn cancel_booking(&self, booking_id: i32, claims: &UserClaims) -> AppResult<BookingDetails> {
        let booking = self.repository.bookings.get_by_id(booking_id).await?;
        claims.require_owner_or_admin(booking.user_id)?;

        let payment_id = booking
            .payment_id
            .ok_or_else(|| AppError::Conflict(format!("Booking {} has no payment", booking_id)))?;

        let mut uow = self.repository.begin().await?;
        let result = async {
            let conn = uow.conn();
            let payment = self.repository.payments.lock_by_id(conn, payment_id).await?;
            settle(&self.repository, conn, &payment, PaymentOutcome::Cancel, None).await
        }
        .await;

        match result {
            Ok(changed) => {
                uow.commit().await?;
                if changed {
                    tracing::info!(booking_id, user_id = claims.user_id, "Booking cancelled");
                }
            }
            Err(e) => {
                if let Err(rollback_err) = uow.rollback().await {
                    tracing::error!("Failed to roll back booking cancellation: {}", rollback_err);
                }
                return Err(e);
            }
        }

        self.repository.bookings.get_details(booking_id).await
    }
}
