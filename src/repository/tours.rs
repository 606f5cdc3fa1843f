//! Tours repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        tour::{CreateTour, Tour, TourQuery},
        Page,
    },
};

#[derive(Clone)]
pub struct ToursRepository {
    pool: Pool<Postgres>,
}

impl ToursRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get tour by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Tour> {
        sqlx::query_as::<_, Tour>("SELECT * FROM tours WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tour with id {} not found", id)))
    }

    /// Get a tour and hold its row lock until the transaction ends.
    ///
    /// Booking attempts for the same tour serialize on this lock, so seat
    /// counts read afterwards in the same transaction cannot go stale.
    pub async fn lock_by_id(&self, conn: &mut PgConnection, id: i32) -> AppResult<Tour> {
        sqlx::query_as::<_, Tour>("SELECT * FROM tours WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tour with id {} not found", id)))
    }

    /// List tours with optional title search and pagination
    pub async fn list(&self, query: &TourQuery) -> AppResult<(Vec<Tour>, i64)> {
        let page = Page::new(query.page, query.per_page)?;
        let pattern = query.search.as_ref().map(|s| format!("%{}%", s.trim()));

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tours WHERE ($1::text IS NULL OR title ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let tours = sqlx::query_as::<_, Tour>(
            r#"
            SELECT * FROM tours
            WHERE ($1::text IS NULL OR title ILIKE $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(page.per_page)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((tours, total))
    }

    /// Create a tour; a duplicate title is a conflict
    pub async fn create(&self, data: &CreateTour) -> AppResult<Tour> {
        sqlx::query_as::<_, Tour>(
            r#"
            INSERT INTO tours (title, description, cost_from, max_guest, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.cost_from)
        .bind(data.max_guest)
        .bind(data.start_date)
        .bind(data.end_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(format!("A tour titled '{}' already exists", data.title))
            }
            other => AppError::Database(other),
        })
    }
}
