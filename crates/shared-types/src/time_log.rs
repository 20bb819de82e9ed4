use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub const MAX_MINUTES_PER_ENTRY: i32 = 24 * 60;

/// Time a lawyer logged against a service request (DB row).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct TimeLog {
    pub id: Uuid,
    pub request_id: Uuid,
    pub provider_type: String,
    pub provider_id: Uuid,
    pub minutes: i32,
    pub description: String,
    pub logged_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateTimeLogRequest {
    pub request_id: Uuid,
    pub minutes: i32,
    #[serde(default)]
    pub description: String,
    /// Defaults to today.
    #[serde(default)]
    pub logged_on: Option<NaiveDate>,
}

impl CreateTimeLogRequest {
    pub fn validate_minutes(&self) -> Result<(), AppError> {
        if self.minutes <= 0 || self.minutes > MAX_MINUTES_PER_ENTRY {
            return Err(AppError::invalid_field(
                "minutes",
                format!("Minutes must be between 1 and {MAX_MINUTES_PER_ENTRY}"),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct TimeLogListParams {
    pub request_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TimeLogListResponse {
    pub entries: Vec<TimeLog>,
    pub total_minutes: i64,
}

impl TimeLogListResponse {
    pub fn new(entries: Vec<TimeLog>) -> Self {
        let total_minutes = entries.iter().map(|e| e.minutes as i64).sum();
        Self { entries, total_minutes }
    }
}
