use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const OTP_LENGTH: usize = 6;
pub const OTP_EXPIRY_MINUTES: i64 = 10;
pub const OTP_MAX_PER_HOUR: i64 = 3;
pub const OTP_MAX_ATTEMPTS: i32 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum OtpChannel {
    #[default]
    Sms,
    Email,
}

impl OtpChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpChannel::Sms => "sms",
            OtpChannel::Email => "email",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SendOtpRequest {
    pub destination: String,
    #[serde(default)]
    pub channel: OtpChannel,
    /// e.g. "verify_phone", "login", "withdrawal".
    #[serde(default = "default_purpose")]
    pub purpose: String,
}

fn default_purpose() -> String {
    "verify_phone".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VerifyOtpRequest {
    pub destination: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VerifyOtpResponse {
    pub verified: bool,
    pub phone_verified: bool,
}

/// Reject anything that is not exactly six ASCII digits.
pub fn validate_otp_format(code: &str) -> Result<(), AppError> {
    let code = code.trim();
    if code.chars().count() != OTP_LENGTH {
        return Err(AppError::invalid_field("code", "OTP length mismatch"));
    }
    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::invalid_field("code", "OTP must contain digits only"));
    }
    Ok(())
}

/// Normalise a destination so "+966 50 000 0000" and "+966500000000" match.
pub fn normalize_destination(destination: &str) -> String {
    let trimmed = destination.trim();
    if trimmed.contains('@') {
        trimmed.to_lowercase()
    } else {
        trimmed.chars().filter(|c| !c.is_whitespace() && *c != '-').collect()
    }
}
