//! Payment lifecycle: gateway callbacks and payment session re-initiation

use std::sync::Arc;

use sqlx::PgConnection;

use crate::{
    error::{AppError, AppResult},
    models::{
        booking::{plan_transition, BookingStatus, Transition},
        payment::{CallbackQuery, CallbackResult, Payment, PaymentOutcome, PaymentStatus},
        user::UserClaims,
    },
    repository::{Repository, UnitOfWork},
    services::gateway::{PaymentGateway, PaymentInitRequest},
};

/// Apply a payment outcome to a payment and its booking.
///
/// The payment row must already be locked by the caller; the booking row is
/// locked here, keeping the payment-then-booking lock order everywhere.
/// Returns false when the outcome had already been applied.
pub async fn settle(
    repository: &Repository,
    conn: &mut PgConnection,
    payment: &Payment,
    outcome: PaymentOutcome,
    gateway_data: Option<serde_json::Value>,
) -> AppResult<bool> {
    let booking = repository.bookings.lock_by_id(conn, payment.booking_id).await?;

    match plan_transition(payment.status, booking.status, outcome)? {
        Transition::AlreadyApplied => Ok(false),
        Transition::Apply {
            payment: payment_status,
            booking: booking_status,
        } => {
            repository
                .payments
                .update_status(conn, payment.id, payment_status, gateway_data)
                .await?;
            repository
                .bookings
                .update_status(conn, booking.id, booking_status)
                .await?;
            Ok(true)
        }
    }
}

#[derive(Clone)]
pub struct PaymentsService {
    repository: Repository,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentsService {
    pub fn new(repository: Repository, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { repository, gateway }
    }

    /// Record a gateway callback against the payment it refers to
    pub async fn handle_callback(&self, outcome: PaymentOutcome, query: &CallbackQuery) -> AppResult<CallbackResult> {
        if outcome == PaymentOutcome::Success {
            self.confirm_with_gateway(&query.transaction_id).await?;
        }

        let mut uow = self.repository.begin().await?;

        match self.apply_callback(&mut uow, outcome, query).await {
            Ok(result) => {
                uow.commit().await?;
                if result.changed {
                    tracing::info!(
                        transaction_id = %result.transaction_id,
                        outcome = outcome.as_str(),
                        "Payment callback applied"
                    );
                } else {
                    tracing::debug!(
                        transaction_id = %result.transaction_id,
                        outcome = outcome.as_str(),
                        "Payment callback replayed"
                    );
                }
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = uow.rollback().await {
                    tracing::error!("Failed to roll back payment callback: {}", rollback_err);
                }
                tracing::warn!(
                    transaction_id = %query.transaction_id,
                    outcome = outcome.as_str(),
                    "Payment callback rejected: {}",
                    e
                );
                Err(e)
            }
        }
    }

    /// Success callbacks come from the customer's browser; only the provider's
    /// own record of the transaction may confirm a booking
    async fn confirm_with_gateway(&self, transaction_id: &str) -> AppResult<()> {
        let payment = self
            .repository
            .payments
            .find_by_transaction_id(transaction_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment with transaction id {} not found", transaction_id)))?;

        if self.gateway.is_paid(transaction_id, payment.amount).await? {
            Ok(())
        } else {
            tracing::warn!(
                transaction_id = %transaction_id,
                booking_id = payment.booking_id,
                "Success callback not confirmed by the payment gateway"
            );
            Err(AppError::BadRequest(format!(
                "Payment {} has not been completed with the payment gateway",
                transaction_id
            )))
        }
    }

    async fn apply_callback(
        &self,
        uow: &mut UnitOfWork,
        outcome: PaymentOutcome,
        query: &CallbackQuery,
    ) -> AppResult<CallbackResult> {
        let conn = uow.conn();
        let payment = self
            .repository
            .payments
            .lock_by_transaction_id(conn, &query.transaction_id)
            .await?;

        let gateway_data = serde_json::json!({
            "outcome": outcome.as_str(),
            "amount": query.amount,
            "status": query.status,
        });
        let changed = settle(&self.repository, conn, &payment, outcome, Some(gateway_data)).await?;

        Ok(CallbackResult {
            outcome,
            transaction_id: payment.transaction_id,
            amount: payment.amount,
            changed,
        })
    }

    /// Open a new hosted payment session for a booking that is still unpaid.
    ///
    /// The payment keeps its transaction ID, so no new payment record is made.
    pub async fn reinitiate(&self, booking_id: i32, claims: &UserClaims) -> AppResult<String> {
        let booking = self.repository.bookings.get_details(booking_id).await?;
        claims.require_owner_or_admin(booking.user.id)?;

        let payment = booking
            .payment
            .as_ref()
            .ok_or_else(|| AppError::Conflict(format!("Booking {} has no payment", booking_id)))?;

        if booking.status != BookingStatus::Pending || payment.status != PaymentStatus::Unpaid {
            return Err(AppError::Conflict(format!(
                "Booking {} is {} with payment {}; only pending unpaid bookings can be paid",
                booking_id, booking.status, payment.status
            )));
        }

        let (phone, address) = match (&booking.user.phone, &booking.user.address) {
            (Some(phone), Some(address)) => (phone.clone(), address.clone()),
            _ => {
                return Err(AppError::BadRequest(
                    "Please update your profile with phone and address to pay for a tour".to_string(),
                ))
            }
        };

        let session = self
            .gateway
            .init_session(&PaymentInitRequest {
                name: booking.user.name.clone(),
                email: booking.user.email.clone(),
                phone_number: phone,
                address,
                amount: payment.amount,
                transaction_id: payment.transaction_id.clone(),
            })
            .await?;

        Ok(session.redirect_url)
    }

    /// Get a payment by transaction ID, visible to the booking owner and admins
    pub async fn get_by_transaction_id(&self, transaction_id: &str, claims: &UserClaims) -> AppResult<Payment> {
        let payment = self
            .repository
            .payments
            .find_by_transaction_id(transaction_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment with transaction id {} not found", transaction_id)))?;

        let booking = self.repository.bookings.get_by_id(payment.booking_id).await?;
        claims.require_owner_or_admin(booking.user_id)?;

        Ok(payment)
    }
}
