use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "validation")]
use validator::Validate;

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Case management
// ---------------------------------------------------------------------------

pub const CASE_STATUSES: &[&str] = &["open", "closed"];

/// A provider's case file (row in `case_management`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct CaseFile {
    pub id: Uuid,
    pub provider_type: String,
    pub provider_id: Uuid,
    pub request_id: Option<Uuid>,
    pub title: String,
    pub client_name: String,
    pub status: String,
    pub sla_deadline: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CaseFile {
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.status == "open" && self.sla_deadline.is_some_and(|d| d < now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreateCaseRequest {
    #[serde(default)]
    pub request_id: Option<Uuid>,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Title is required"))
    )]
    pub title: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Client name is required"))
    )]
    pub client_name: String,
    #[serde(default)]
    pub sla_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateCaseRequest {
    pub title: Option<String>,
    pub client_name: Option<String>,
    pub sla_deadline: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct CaseListParams {
    pub status: Option<String>,
}

impl CaseListParams {
    pub fn validated_status(&self) -> Result<Option<&str>, AppError> {
        match self.status.as_deref() {
            None => Ok(None),
            Some(s) if CASE_STATUSES.contains(&s) => Ok(Some(s)),
            Some(s) => Err(AppError::bad_request(format!("Unknown case status: {s}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct CalendarEvent {
    pub id: Uuid,
    pub provider_type: String,
    pub provider_id: Uuid,
    pub case_id: Option<Uuid>,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateCalendarEventRequest {
    #[serde(default)]
    pub case_id: Option<Uuid>,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
}

impl CreateCalendarEventRequest {
    pub fn check(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::invalid_field("title", "Title is required"));
        }
        if self.ends_at <= self.starts_at {
            return Err(AppError::invalid_field(
                "ends_at",
                "End time must be after start time",
            ));
        }
        Ok(())
    }
}

/// Half-open window `[from, to)`.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct CalendarWindowParams {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}
