//! Hosted payment page gateway client (SSLCommerz session API)

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    config::PaymentConfig,
    error::{AppError, AppResult},
    models::payment::PaymentOutcome,
};

/// Customer and amount details sent when opening a payment session
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentInitRequest {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub amount: Decimal,
    pub transaction_id: String,
}

/// Opened payment session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSession {
    /// Hosted payment page the customer is sent to
    pub redirect_url: String,
}

/// Request/response adapter to the payment provider. Implementations hold no
/// local state and never retry.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn init_session(&self, request: &PaymentInitRequest) -> AppResult<PaymentSession>;

    /// Whether the provider holds a settled payment of `amount` for the
    /// transaction
    async fn is_paid(&self, transaction_id: &str, amount: Decimal) -> AppResult<bool>;
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    status: Option<String>,
    #[serde(rename = "failedreason")]
    failed_reason: Option<String>,
    #[serde(rename = "GatewayPageURL")]
    gateway_page_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransactionQueryResponse {
    #[serde(rename = "APIConnect")]
    api_connect: Option<String>,
    #[serde(default)]
    element: Vec<TransactionRecord>,
}

#[derive(Debug, Deserialize)]
struct TransactionRecord {
    status: Option<String>,
    amount: Option<String>,
}

impl TransactionRecord {
    fn settles(&self, amount: Decimal) -> bool {
        let settled = self
            .status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("VALID") || s.eq_ignore_ascii_case("VALIDATED"));
        let paid = self
            .amount
            .as_deref()
            .and_then(|a| a.trim().parse::<Decimal>().ok());

        settled && paid == Some(amount)
    }
}

fn transport_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Gateway("Payment gateway timed out".to_string())
    } else {
        AppError::Gateway(format!("Payment gateway unreachable: {}", e))
    }
}

/// SSLCommerz session initiation and transaction query over HTTP
#[derive(Clone)]
pub struct SslCommerzGateway {
    client: reqwest::Client,
    config: PaymentConfig,
}

impl SslCommerzGateway {
    pub fn new(config: PaymentConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build payment HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn form(&self, request: &PaymentInitRequest) -> Vec<(&'static str, String)> {
        let callback = |outcome: PaymentOutcome| {
            self.config
                .callback_url(outcome.as_str(), &request.transaction_id, request.amount)
        };

        vec![
            ("store_id", self.config.store_id.clone()),
            ("store_passwd", self.config.store_password.clone()),
            ("total_amount", request.amount.to_string()),
            ("currency", self.config.currency.clone()),
            ("tran_id", request.transaction_id.clone()),
            ("success_url", callback(PaymentOutcome::Success)),
            ("fail_url", callback(PaymentOutcome::Fail)),
            ("cancel_url", callback(PaymentOutcome::Cancel)),
            ("shipping_method", "N/A".to_string()),
            ("product_name", "Tour".to_string()),
            ("product_category", "Service".to_string()),
            ("product_profile", "general".to_string()),
            ("cus_name", request.name.clone()),
            ("cus_email", request.email.clone()),
            ("cus_add1", request.address.clone()),
            ("cus_city", "N/A".to_string()),
            ("cus_country", "N/A".to_string()),
            ("cus_phone", request.phone_number.clone()),
        ]
    }
}

#[async_trait]
impl PaymentGateway for SslCommerzGateway {
    async fn init_session(&self, request: &PaymentInitRequest) -> AppResult<PaymentSession> {
        let response = self
            .client
            .post(&self.config.session_url)
            .form(&self.form(request))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Gateway(format!("Payment gateway returned HTTP {}", status)));
        }

        let body: SessionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Malformed payment gateway response: {}", e)))?;

        if !body.status.as_deref().is_some_and(|s| s.eq_ignore_ascii_case("SUCCESS")) {
            let reason = body
                .failed_reason
                .unwrap_or_else(|| "payment session was rejected".to_string());
            return Err(AppError::Gateway(reason));
        }

        match body.gateway_page_url {
            Some(url) if !url.is_empty() => {
                tracing::debug!(transaction_id = %request.transaction_id, "Payment session opened");
                Ok(PaymentSession { redirect_url: url })
            }
            _ => Err(AppError::Gateway(
                "Payment gateway response has no redirect URL".to_string(),
            )),
        }
    }

    async fn is_paid(&self, transaction_id: &str, amount: Decimal) -> AppResult<bool> {
        let response = self
            .client
            .get(&self.config.validation_url)
            .query(&[
                ("tran_id", transaction_id),
                ("store_id", self.config.store_id.as_str()),
                ("store_passwd", self.config.store_password.as_str()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Gateway(format!("Payment gateway returned HTTP {}", status)));
        }

        let body: TransactionQueryResponse = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Malformed payment gateway response: {}", e)))?;

        if !body.api_connect.as_deref().is_some_and(|s| s.eq_ignore_ascii_case("DONE")) {
            return Err(AppError::Gateway(format!(
                "Payment gateway refused the transaction query: {}",
                body.api_connect.unwrap_or_else(|| "no status".to_string())
            )));
        }

        Ok(body.element.iter().any(|record| record.settles(amount)))
    }
}
