//! Subscriptions, family members, loyalty points and referrals.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub const MAX_SUBSCRIPTION_MONTHS: u32 = 24;
pub const MAX_FAMILY_MEMBERS: i64 = 5;
pub const REFERRER_POINTS: i64 = 100;
pub const REFERRED_POINTS: i64 = 50;
const REFERRAL_PREFIX: &str = "WK";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    Basic,
    Premium,
    Family,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Basic => "basic",
            SubscriptionPlan::Premium => "premium",
            SubscriptionPlan::Family => "family",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: i64,
    pub plan: String,
    /// "active", "replaced" or "expired".
    pub status: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SubscribeRequest {
    pub plan: SubscriptionPlan,
    pub months: u32,
}

impl SubscribeRequest {
    /// End of a subscription starting at `start`.
    pub fn period_end(&self, start: DateTime<Utc>) -> Result<DateTime<Utc>, AppError> {
        if self.months == 0 || self.months > MAX_SUBSCRIPTION_MONTHS {
            return Err(AppError::invalid_field(
                "months",
                format!("Months must be between 1 and {MAX_SUBSCRIPTION_MONTHS}"),
            ));
        }
        start
            .checked_add_months(Months::new(self.months))
            .ok_or_else(|| AppError::bad_request("Subscription period out of range"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Member {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub owner_id: i64,
    pub full_name: String,
    pub relation: String,
    pub national_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AddMemberRequest {
    pub full_name: String,
    pub relation: String,
    #[serde(default)]
    pub national_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct UserPoints {
    pub user_id: i64,
    pub balance: i64,
    pub lifetime: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReferralCodeResponse {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RedeemReferralRequest {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RedeemReferralResponse {
    pub referrer_id: i64,
    pub points_awarded: i64,
    pub points: UserPoints,
}

/// `WK` followed by the user id zero-padded to six digits.
pub fn referral_code(user_id: i64) -> String {
    format!("{REFERRAL_PREFIX}{user_id:06}")
}

/// Inverse of [`referral_code`]. Case-insensitive on the prefix.
pub fn parse_referral_code(code: &str) -> Option<i64> {
    let code = code.trim();
    if code.len() <= REFERRAL_PREFIX.len()
        || !code[..REFERRAL_PREFIX.len()].eq_ignore_ascii_case(REFERRAL_PREFIX)
    {
        return None;
    }
    let digits = &code[REFERRAL_PREFIX.len()..];
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|id: &i64| *id > 0)
}
