//! Payments repository for database operations

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::payment::{Payment, PaymentStatus},
};

#[derive(Clone)]
pub struct PaymentsRepository {
    pool: Pool<Postgres>,
}

impl PaymentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get payment by ID and lock its row for the rest of the transaction
    pub async fn lock_by_id(&self, conn: &mut PgConnection, id: i32) -> AppResult<Payment> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment with id {} not found", id)))
    }

    /// Find a payment by its gateway transaction ID
    pub async fn find_by_transaction_id(&self, transaction_id: &str) -> AppResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE transaction_id = $1")
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }

    /// Get a payment by transaction ID and lock its row for the rest of the transaction
    pub async fn lock_by_transaction_id(&self, conn: &mut PgConnection, transaction_id: &str) -> AppResult<Payment> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE transaction_id = $1 FOR UPDATE")
            .bind(transaction_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Payment with transaction id {} not found", transaction_id))
            })
    }

    /// Insert an unpaid payment for a booking
    pub async fn create(
        &self,
        conn: &mut PgConnection,
        booking_id: i32,
        transaction_id: &str,
        amount: Decimal,
    ) -> AppResult<Payment> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (booking_id, transaction_id, amount, status)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(booking_id)
        .bind(transaction_id)
        .bind(amount)
        .bind(PaymentStatus::Unpaid)
        .fetch_one(&mut *conn)
        .await?;

        Ok(payment)
    }

    /// Set the status of a payment, recording the gateway parameters that caused it
    pub async fn update_status(
        &self,
        conn: &mut PgConnection,
        payment_id: i32,
        status: PaymentStatus,
        gateway_data: Option<serde_json::Value>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = $1, gateway_data = COALESCE($2, gateway_data), updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(status)
        .bind(gateway_data)
        .bind(Utc::now())
        .bind(payment_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Payment with id {} not found", payment_id)));
        }
        Ok(())
    }
}
