//! Payment model and gateway callback types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::booking::BookingStatus;

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Failed,
    Cancelled,
}

text_enum!(PaymentStatus {
    Unpaid => "UNPAID",
    Paid => "PAID",
    Failed => "FAILED",
    Cancelled => "CANCELLED",
});

/// Payment record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: i32,
    pub booking_id: i32,
    /// Correlation key shared with the payment gateway
    pub transaction_id: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    /// Parameters of the last gateway callback
    #[schema(value_type = Option<Object>)]
    pub gateway_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result reported by the payment gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
    Success,
    Fail,
    Cancel,
}

impl PaymentOutcome {
    /// Payment and booking statuses this outcome leads to
    pub fn targets(&self) -> (PaymentStatus, BookingStatus) {
        match self {
            PaymentOutcome::Success => (PaymentStatus::Paid, BookingStatus::Confirm),
            PaymentOutcome::Fail => (PaymentStatus::Failed, BookingStatus::Failed),
            PaymentOutcome::Cancel => (PaymentStatus::Cancelled, BookingStatus::Cancelled),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentOutcome::Success => "success",
            PaymentOutcome::Fail => "fail",
            PaymentOutcome::Cancel => "cancel",
        }
    }
}

/// Query parameters sent back by the gateway on the callback URLs
#[derive(Debug, Clone, Serialize, Deserialize, IntoParams, ToSchema)]
pub struct CallbackQuery {
    #[serde(alias = "transactionId", alias = "tran_id")]
    pub transaction_id: String,
    pub amount: Option<String>,
    pub status: Option<String>,
}

/// Result of a processed gateway callback
#[derive(Debug, Clone)]
pub struct CallbackResult {
    pub outcome: PaymentOutcome,
    pub transaction_id: String,
    pub amount: Decimal,
    /// False when the callback replayed an already applied outcome
    pub changed: bool,
}
