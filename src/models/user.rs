//! User model and authentication claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    User,
    Guide,
}

text_enum!(Role {
    SuperAdmin => "SUPER_ADMIN",
    Admin => "ADMIN",
    User => "USER",
    Guide => "GUIDE",
});

/// User model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Phone and address are both needed before a tour can be paid for
    pub fn has_contact_details(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false);
        filled(&self.phone) && filled(&self.address)
    }
}

/// Update own profile request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 6, max = 20, message = "Phone must be 6-20 characters"))]
    pub phone: Option<String>,
    #[validate(length(min = 3, max = 255, message = "Address must be 3-255 characters"))]
    pub address: Option<String>,
}

/// JWT claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin | Role::SuperAdmin)
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    /// Owners and administrators may access a user's resources
    pub fn require_owner_or_admin(&self, owner_id: i32) -> Result<(), AppError> {
        if self.user_id == owner_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("You do not have access to this resource".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(phone: Option<&str>, address: Option<&str>) -> User {
        User {
            id: 1,
            name: "Rahim".to_string(),
            email: "rahim@example.com".to_string(),
            phone: phone.map(str::to_string),
            address: address.map(str::to_string),
            role: Role::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn contact_details_require_phone_and_address() {
        assert!(user(Some("01700000000"), Some("Dhaka")).has_contact_details());
        assert!(!user(None, Some("Dhaka")).has_contact_details());
        assert!(!user(Some("01700000000"), None).has_contact_details());
        assert!(!user(Some("  "), Some("Dhaka")).has_contact_details());
    }

    #[test]
    fn token_verification_rejects_wrong_secret() {
        let claims = UserClaims {
            sub: "rahim@example.com".to_string(),
            user_id: 7,
            role: Role::Guide,
            exp: Utc::now().timestamp() + 3600,
            iat: Utc::now().timestamp(),
        };
        let token = claims.create_token("secret-a").unwrap();

        let parsed = UserClaims::from_token(&token, "secret-a").unwrap();
        assert_eq!(parsed.user_id, 7);
        assert_eq!(parsed.role, Role::Guide);
        assert!(UserClaims::from_token(&token, "secret-b").is_err());
    }

    #[test]
    fn owner_or_admin_access() {
        let mut claims = UserClaims {
            sub: "u".to_string(),
            user_id: 3,
            role: Role::User,
            exp: 0,
            iat: 0,
        };
        assert!(claims.require_owner_or_admin(3).is_ok());
        assert!(claims.require_owner_or_admin(4).is_err());
        assert!(claims.require_admin().is_err());

        claims.role = Role::SuperAdmin;
        assert!(claims.require_owner_or_admin(4).is_ok());
        assert!(claims.require_admin().is_ok());
    }

    #[test]
    fn role_parses_stored_text() {
        assert_eq!("SUPER_ADMIN".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!(Role::Guide.to_string(), "GUIDE");
        assert!("OWNER".parse::<Role>().is_err());
    }
}
