//! Data models for TriPlan

/// Implements string conversions and TEXT column mapping for a fieldless enum.
///
/// Variants are stored as their upper-case names (e.g. `PENDING`).
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_uppercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($name), s)),
                }
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s: &str = sqlx::Decode::<sqlx::Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

pub mod booking;
pub mod payment;
pub mod tour;
pub mod user;

use crate::error::{AppError, AppResult};

// Re-export commonly used types
pub use booking::{Booking, BookingDetails, BookingStatus};
pub use payment::{Payment, PaymentOutcome, PaymentStatus};
pub use tour::{Tour, TourSummary};
pub use user::{Role, User, UserClaims};

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;

/// Page window of a list query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub per_page: i64,
    pub offset: i64,
}

impl Page {
    /// Resolve optional `page`/`per_page` parameters; pages start at 1 and
    /// `per_page` is kept within 1..=100
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> AppResult<Self> {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let offset = (page - 1)
            .checked_mul(per_page)
            .ok_or_else(|| AppError::Validation(format!("Page {} is out of range", page)))?;

        Ok(Self { page, per_page, offset })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_and_bounds() {
        assert_eq!(Page::new(None, None).unwrap(), Page { page: 1, per_page: 20, offset: 0 });
        assert_eq!(Page::new(Some(0), Some(500)).unwrap(), Page { page: 1, per_page: 100, offset: 0 });
        assert_eq!(Page::new(Some(3), Some(10)).unwrap().offset, 20);
    }

    #[test]
    fn huge_page_numbers_are_rejected() {
        assert!(matches!(Page::new(Some(i64::MAX), Some(100)), Err(AppError::Validation(_))));
        assert!(matches!(Page::new(Some(i64::MAX), None), Err(AppError::Validation(_))));
        // A single item per page never overflows
        assert_eq!(Page::new(Some(i64::MAX), Some(1)).unwrap().offset, i64::MAX - 1);
    }
}
