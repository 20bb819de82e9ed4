use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use shared_types::{
    normalize_destination, validate_otp_format, AppError, OtpChannel, SendOtpRequest,
    VerifyOtpRequest, VerifyOtpResponse, OTP_EXPIRY_MINUTES, OTP_MAX_ATTEMPTS, OTP_MAX_PER_HOUR,
};
use sqlx::{Pool, Postgres};

use crate::auth::jwt::Claims;
use crate::config::feature_flags;

/// Six random digits, never starting with zero.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000u32).to_string()
}

/// Only the SHA-256 hex digest of a code is stored.
pub fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn check_destination(channel: OtpChannel, destination: &str) -> Result<(), AppError> {
    let ok = match channel {
        OtpChannel::Email => {
            destination.contains('@') && !destination.starts_with('@') && !destination.ends_with('@')
        }
        OtpChannel::Sms => {
            let digits = destination.strip_prefix('+').unwrap_or(destination);
            (8..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
        }
    };
    if ok {
        Ok(())
    } else {
        Err(AppError::invalid_field("destination", "Invalid destination for this channel"))
    }
}

/// Issue a code: rate-limit, store the hash, then deliver.
#[tracing::instrument(skip(pool, req), fields(channel = req.channel.as_str()))]
pub async fn send(pool: &Pool<Postgres>, req: &SendOtpRequest) -> Result<(), AppError> {
    let destination = normalize_destination(&req.destination);
    check_destination(req.channel, &destination)?;

    let code = generate_code();
    let expires_at = Utc::now() + Duration::minutes(OTP_EXPIRY_MINUTES);
    crate::repo::otp::issue(
        pool,
        &destination,
        req.channel.as_str(),
        req.purpose.trim(),
        &hash_code(&code),
        expires_at,
        OTP_MAX_PER_HOUR,
    )
    .await?;

    let flags = feature_flags();
    let delivery = match req.channel {
        OtpChannel::Sms if flags.twilio => {
            Some(crate::twilio::send_sms(&destination, &crate::twilio::otp_sms_body(&code)).await)
        }
        OtpChannel::Email if flags.mailgun => {
            Some(crate::mailgun::send_otp_email(&destination, &code).await)
        }
        _ => None,
    };

    match delivery {
        Some(Err(e)) => {
            tracing::error!(error = %e, "OTP delivery failed");
            Err(AppError::internal("Failed to deliver verification code"))
        }
        Some(Ok(())) => Ok(()),
        None => {
            tracing::info!("OTP delivery disabled for channel; code stored only");
            Ok(())
        }
    }
}

/// Check a code. The format check runs before any database access.
#[tracing::instrument(skip(pool, claims, req))]
pub async fn verify(
    pool: &Pool<Postgres>,
    claims: Option<&Claims>,
    req: &VerifyOtpRequest,
) -> Result<VerifyOtpResponse, AppError> {
    validate_otp_format(&req.code)?;
    let destination = normalize_destination(&req.destination);

    let pending = crate::repo::otp::latest_pending(pool, &destination)
        .await?
        .ok_or_else(|| {
            AppError::invalid_field("code", "No pending verification code. Please request a new one.")
        })?;

    // The cap is enforced by the update itself so concurrent guesses cannot overrun it.
    if !crate::repo::otp::record_attempt(pool, pending.id, OTP_MAX_ATTEMPTS).await? {
        return Err(AppError::rate_limited(
            "Too many failed attempts. Please request a new code.",
        ));
    }

    if hash_code(req.code.trim()) != pending.code_hash {
        return Err(AppError::invalid_field("code", "Invalid verification code"));
    }

    if !crate::repo::otp::consume(pool, pending.id).await? {
        return Err(AppError::conflict("Verification code already used"));
    }

    let mut phone_verified = false;
    if let Some(claims) = claims {
        if pending.channel == OtpChannel::Sms.as_str() {
            phone_verified = crate::repo::users::mark_phone_verified(pool, claims.sub, &destination).await?;
        }
    }

    tracing::info!(phone_verified, "OTP verified");
    Ok(VerifyOtpResponse {
        verified: true,
        phone_verified,
    })
}
