//! Bookings repository for database operations

use chrono::{NaiveDate, Utc};
use sqlx::{Executor, PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        booking::{Booking, BookingDetails, BookingDetailsRow, BookingQuery, BookingStatus},
        Page,
    },
};

/// Booking joined with user contact fields, tour summary and payment
const DETAILS_SELECT: &str = r#"
    SELECT b.id, b.date, b.guest_count, b.status, b.created_at, b.updated_at,
           u.id AS user_id, u.name AS user_name, u.email AS user_email,
           u.phone AS user_phone, u.address AS user_address,
           t.id AS tour_id, t.title AS tour_title, t.cost_from AS tour_cost_from,
           p.id AS payment_id, p.transaction_id AS payment_transaction_id,
           p.amount AS payment_amount, p.status AS payment_status,
           p.gateway_data AS payment_gateway_data,
           p.created_at AS payment_created_at, p.updated_at AS payment_updated_at
    FROM bookings b
    JOIN users u ON u.id = b.user_id
    JOIN tours t ON t.id = b.tour_id
    LEFT JOIN payments p ON p.id = b.payment_id
"#;

#[derive(Clone)]
pub struct BookingsRepository {
    pool: Pool<Postgres>,
}

impl BookingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Seats held on a tour date by pending and confirmed bookings
    pub async fn booked_seats<'e, E>(&self, executor: E, tour_id: i32, date: NaiveDate) -> AppResult<i64>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let reserving = BookingStatus::RESERVING.map(|status| status.as_str());

        let booked: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(guest_count), 0)::bigint
            FROM bookings
            WHERE tour_id = $1 AND date = $2 AND status = ANY($3)
            "#,
        )
        .bind(tour_id)
        .bind(date)
        .bind(&reserving[..])
        .fetch_one(executor)
        .await?;

        Ok(booked)
    }

    /// Seats held on a tour date, read from the pool
    pub async fn booked_seats_now(&self, tour_id: i32, date: NaiveDate) -> AppResult<i64> {
        self.booked_seats(&self.pool, tour_id, date).await
    }

    /// Get booking by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking with id {} not found", id)))
    }

    /// Get booking by ID and lock its row for the rest of the transaction
    pub async fn lock_by_id(&self, conn: &mut PgConnection, id: i32) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking with id {} not found", id)))
    }

    /// Insert a pending booking
    pub async fn create(
        &self,
        conn: &mut PgConnection,
        user_id: i32,
        tour_id: i32,
        date: NaiveDate,
        guest_count: i32,
    ) -> AppResult<Booking> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (user_id, tour_id, date, guest_count, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(tour_id)
        .bind(date)
        .bind(guest_count)
        .bind(BookingStatus::Pending)
        .fetch_one(&mut *conn)
        .await?;

        Ok(booking)
    }

    /// Link a booking to its payment
    pub async fn set_payment(&self, conn: &mut PgConnection, booking_id: i32, payment_id: i32) -> AppResult<()> {
        let result = sqlx::query("UPDATE bookings SET payment_id = $1, updated_at = $2 WHERE id = $3")
            .bind(payment_id)
            .bind(Utc::now())
            .bind(booking_id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Booking with id {} not found", booking_id)));
        }
        Ok(())
    }

    /// Set the status of a booking
    pub async fn update_status(&self, conn: &mut PgConnection, booking_id: i32, status: BookingStatus) -> AppResult<()> {
        let result = sqlx::query("UPDATE bookings SET status = $1, updated_at = $2 WHERE id = $3")
            .bind(status)
            .bind(Utc::now())
            .bind(booking_id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Booking with id {} not found", booking_id)));
        }
        Ok(())
    }

    /// Get a populated booking through any executor (pool or open transaction)
    pub async fn get_details_with<'e, E>(&self, executor: E, id: i32) -> AppResult<BookingDetails>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let query = format!("{} WHERE b.id = $1", DETAILS_SELECT);
        sqlx::query_as::<_, BookingDetailsRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await?
            .map(BookingDetails::from)
            .ok_or_else(|| AppError::NotFound(format!("Booking with id {} not found", id)))
    }

    /// Get a populated booking
    pub async fn get_details(&self, id: i32) -> AppResult<BookingDetails> {
        self.get_details_with(&self.pool, id).await
    }

    /// List bookings of a user, newest first
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<BookingDetails>> {
        let query = format!("{} WHERE b.user_id = $1 ORDER BY b.created_at DESC", DETAILS_SELECT);
        let rows = sqlx::query_as::<_, BookingDetailsRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(BookingDetails::from).collect())
    }

    /// List all bookings with optional status filter and pagination
    pub async fn list(&self, query: &BookingQuery) -> AppResult<(Vec<BookingDetails>, i64)> {
        let page = Page::new(query.page, query.per_page)?;
        let status = query.status.map(|s| s.as_str());

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let select = format!(
            "{} WHERE ($1::text IS NULL OR b.status = $1) ORDER BY b.created_at DESC LIMIT $2 OFFSET $3",
            DETAILS_SELECT
        );
        let rows = sqlx::query_as::<_, BookingDetailsRow>(&select)
            .bind(status)
            .bind(page.per_page)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(BookingDetails::from).collect(), total))
    }
}
