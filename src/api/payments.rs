//! Payment endpoints: gateway callbacks and payment session re-initiation

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::payment::{CallbackQuery, Payment, PaymentOutcome},
};

use super::AuthenticatedUser;

/// Hosted payment page for an existing booking
#[derive(Serialize, ToSchema)]
pub struct PaymentUrlResponse {
    pub payment_url: String,
}

fn outcome_message(outcome: PaymentOutcome) -> &'static str {
    match outcome {
        PaymentOutcome::Success => "Payment completed successfully",
        PaymentOutcome::Fail => "Payment failed",
        PaymentOutcome::Cancel => "Payment cancelled",
    }
}

async fn handle_callback(
    state: crate::AppState,
    outcome: PaymentOutcome,
    query: CallbackQuery,
) -> AppResult<Redirect> {
    let result = state.services.payments.handle_callback(outcome, &query).await?;

    let target = state.config.payment.frontend_redirect(
        outcome,
        &result.transaction_id,
        outcome_message(outcome),
        result.amount,
    )?;
    Ok(Redirect::to(&target))
}

/// Gateway callback for a completed payment
#[utoipa::path(
    get,
    path = "/payments/success",
    tag = "payments",
    params(CallbackQuery),
    responses(
        (status = 303, description = "Redirect to the frontend success page"),
        (status = 404, description = "Unknown transaction ID"),
        (status = 409, description = "Payment already settled with another outcome")
    )
)]
pub async fn payment_success(
    State(state): State<crate::AppState>,
    Query(query): Query<CallbackQuery>,
) -> AppResult<Redirect> {
    handle_callback(state, PaymentOutcome::Success, query).await
}

/// Gateway callback for a failed payment
#[utoipa::path(
    get,
    path = "/payments/fail",
    tag = "payments",
    params(CallbackQuery),
    responses(
        (status = 303, description = "Redirect to the frontend failure page"),
        (status = 404, description = "Unknown transaction ID"),
        (status = 409, description = "Payment already settled with another outcome")
    )
)]
pub async fn payment_fail(
    State(state): State<crate::AppState>,
    Query(query): Query<CallbackQuery>,
) -> AppResult<Redirect> {
    handle_callback(state, PaymentOutcome::Fail, query).await
}

/// Gateway callback for a payment cancelled by the customer
#[utoipa::path(
    get,
    path = "/payments/cancel",
    tag = "payments",
    params(CallbackQuery),
    responses(
        (status = 303, description = "Redirect to the frontend cancellation page"),
        (status = 404, description = "Unknown transaction ID"),
        (status = 409, description = "Payment already settled with another outcome")
    )
)]
pub async fn payment_cancel(
    State(state): State<crate::AppState>,
    Query(query): Query<CallbackQuery>,
) -> AppResult<Redirect> {
    handle_callback(state, PaymentOutcome::Cancel, query).await
}

/// Open a new payment session for an unpaid booking
#[utoipa::path(
    post,
    path = "/payments/init/{booking_id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("booking_id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Payment page URL", body = PaymentUrlResponse),
        (status = 403, description = "Booking belongs to another user"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is not awaiting payment"),
        (status = 502, description = "Payment gateway failure")
    )
)]
pub async fn init_payment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(booking_id): Path<i32>,
) -> AppResult<Json<PaymentUrlResponse>> {
    let payment_url = state.services.payments.reinitiate(booking_id, &claims).await?;
    Ok(Json(PaymentUrlResponse { payment_url }))
}

/// Get a payment by its transaction ID
#[utoipa::path(
    get,
    path = "/payments/{transaction_id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(
        ("transaction_id" = String, Path, description = "Gateway transaction ID")
    ),
    responses(
        (status = 200, description = "Payment", body = Payment),
        (status = 403, description = "Payment belongs to another user"),
        (status = 404, description = "Payment not found")
    )
)]
pub async fn get_payment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(transaction_id): Path<String>,
) -> AppResult<Json<Payment>> {
    let payment = state
        .services
        .payments
        .get_by_transaction_id(&transaction_id, &claims)
        .await?;
    Ok(Json(payment))
}
