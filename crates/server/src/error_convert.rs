use shared_types::AppError;

/// Convert a sqlx::Error into an AppError.
pub fn sqlx_to_app_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::RowNotFound => AppError::not_found("Resource not found"),
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            // unique_violation
            Some("23505") => {
                let detail = db_err.constraint().unwrap_or_else(|| db_err.message());
                let friendly = if detail.contains("email") {
                    "An account with this email already exists"
                } else if detail.contains("phone") {
                    "This phone number is already in use"
                } else if detail.contains("provider_services") {
                    "This service is already enabled for the provider"
                } else if detail.contains("license_number") {
                    "A lawyer with this license number already exists"
                } else if detail.contains("referred_id") {
                    "A referral code has already been redeemed for this account"
                } else {
                    "A record with this value already exists"
                };
                AppError::conflict(friendly)
            }
            // foreign_key_violation
            Some("23503") => AppError::bad_request("Referenced record does not exist"),
            _ => AppError::database(err.to_string()),
        },
        _ => AppError::database(err.to_string()),
    }
}

/// Extension trait providing `.into_app_error()` on sqlx::Error.
pub trait SqlxErrorExt {
    fn into_app_error(self) -> AppError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_app_error(self) -> AppError {
        sqlx_to_app_error(self)
    }
}

/// Trait for validating request DTOs before processing.
pub trait ValidateRequest {
    fn validate_request(&self) -> Result<(), AppError>;
}

impl<T: validator::Validate> ValidateRequest for T {
    fn validate_request(&self) -> Result<(), AppError> {
        self.validate().map_err(AppError::from)
    }
}
