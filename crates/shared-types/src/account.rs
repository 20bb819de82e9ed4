use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "validation")]
use validator::Validate;

use crate::common::ProviderType;

/// Kind of account a user holds. Stored lowercase in `users.account_type`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[default]
    Subscriber,
    Lawyer,
    LegalArmLawyer,
    Partner,
    PartnerEmployee,
    Admin,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Subscriber => "subscriber",
            AccountType::Lawyer => "lawyer",
            AccountType::LegalArmLawyer => "legal_arm_lawyer",
            AccountType::Partner => "partner",
            AccountType::PartnerEmployee => "partner_employee",
            AccountType::Admin => "admin",
        }
    }

    /// Parse from the JWT / DB value. Unknown values default to Subscriber.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "lawyer" => AccountType::Lawyer,
            "legal_arm_lawyer" => AccountType::LegalArmLawyer,
            "partner" => AccountType::Partner,
            "partner_employee" => AccountType::PartnerEmployee,
            "admin" => AccountType::Admin,
            _ => AccountType::Subscriber,
        }
    }

    /// The provider type a session of this account acts as, if any.
    pub fn provider_type(&self) -> Option<ProviderType> {
        match self {
            AccountType::Lawyer => Some(ProviderType::Lawyer),
            AccountType::LegalArmLawyer => Some(ProviderType::LegalArm),
            AccountType::Partner | AccountType::PartnerEmployee => Some(ProviderType::Partner),
            AccountType::Subscriber | AccountType::Admin => None,
        }
    }
}

/// A row in `users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub phone: Option<String>,
    pub display_name: String,
    pub password_hash: String,
    pub account_type: String,
    pub phone_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub display_name: String,
    pub account_type: String,
    pub phone_verified: bool,
    pub created_at: String,
}

impl From<UserRow> for User {
    fn from(u: UserRow) -> Self {
        Self {
            id: u.id,
            email: u.email,
            phone: u.phone,
            display_name: u.display_name,
            account_type: u.account_type,
            phone_verified: u.phone_verified,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// Request DTO for subscriber self-registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct RegisterRequest {
    #[cfg_attr(
        feature = "validation",
        validate(email(message = "Invalid email address"))
    )]
    pub email: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 8, message = "Password must be at least 8 characters"))
    )]
    pub password: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Display name is required"))
    )]
    pub display_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct LoginRequest {
    #[cfg_attr(
        feature = "validation",
        validate(email(message = "Invalid email address"))
    )]
    pub email: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Password is required"))
    )]
    pub password: String,
}

/// Returned by register and login. The token is also set as a cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub expires_in_minutes: i64,
}

/// Admin request attaching a user to the provider they act for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LinkProviderRequest {
    pub account_type: AccountType,
    pub provider_type: ProviderType,
    pub provider_id: uuid::Uuid,
}

impl LinkProviderRequest {
    /// The account type must be one that acts for this provider type.
    pub fn is_consistent(&self) -> bool {
        self.account_type.provider_type() == Some(self.provider_type)
    }
}
