//! Tour model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Tour record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Tour {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    /// Cost per guest
    pub cost_from: Option<Decimal>,
    /// Seats available per tour date
    pub max_guest: i32,
    /// First bookable date (inclusive)
    pub start_date: Option<NaiveDate>,
    /// Last bookable date (inclusive)
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tour {
    /// Bookable window, when both ends are defined
    pub fn window(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.start_date.zip(self.end_date)
    }
}

/// Tour summary embedded in booking responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TourSummary {
    pub id: i32,
    pub title: String,
    pub cost_from: Option<Decimal>,
}

/// Create tour request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTour {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub cost_from: Option<Decimal>,
    #[validate(range(min = 1, message = "max_guest must be at least 1"))]
    pub max_guest: i32,
    /// First bookable date (YYYY-MM-DD)
    pub start_date: Option<NaiveDate>,
    /// Last bookable date (YYYY-MM-DD)
    pub end_date: Option<NaiveDate>,
}

/// Tour list query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct TourQuery {
    /// Case-insensitive title search
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
