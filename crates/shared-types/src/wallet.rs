use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::pricing::commission_amount;

pub const IBAN_COUNTRY_PREFIX: &str = "SA";
pub const IBAN_LENGTH: usize = 24;

/// Check a Saudi IBAN with whitespace removed: must start with an
/// upper-case `SA` and be exactly 24 characters.
pub fn validate_iban(raw: &str) -> Result<String, AppError> {
    let iban: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    if !iban.starts_with(IBAN_COUNTRY_PREFIX) {
        return Err(AppError::invalid_field("iban", "IBAN must start with SA"));
    }
    if iban.chars().count() != IBAN_LENGTH {
        return Err(AppError::invalid_field(
            "iban",
            format!("IBAN must be exactly {IBAN_LENGTH} characters"),
        ));
    }
    if !iban.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::invalid_field("iban", "IBAN may only contain letters and digits"));
    }
    Ok(iban)
}

/// Provider share of one completed request.
pub fn provider_share(price: f64, commission_rate: i32) -> f64 {
    price - commission_amount(price, commission_rate)
}

/// Earnings less withdrawals that have not been rejected.
pub fn available_balance(earned: f64, withdrawn: f64) -> f64 {
    earned - withdrawn
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct WithdrawalRequest {
    pub id: Uuid,
    pub provider_type: String,
    pub provider_id: Uuid,
    pub amount: f64,
    pub iban: String,
    pub account_holder: String,
    /// "pending", "approved", "paid" or "rejected".
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateWithdrawalRequest {
    pub amount: f64,
    pub iban: String,
    pub account_holder: String,
}

impl CreateWithdrawalRequest {
    /// Checks that need no database access. Returns the normalised IBAN.
    pub fn check(&self) -> Result<String, AppError> {
        let iban = validate_iban(&self.iban)?;
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(AppError::invalid_field("amount", "Amount must be greater than zero"));
        }
        if self.account_holder.trim().is_empty() {
            return Err(AppError::invalid_field("account_holder", "Account holder is required"));
        }
        Ok(iban)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WalletBalance {
    pub earned: f64,
    pub withdrawn: f64,
    pub available: f64,
}

impl WalletBalance {
    pub fn new(earned: f64, withdrawn: f64) -> Self {
        Self {
            earned,
            withdrawn,
            available: available_balance(earned, withdrawn),
        }
    }
}
