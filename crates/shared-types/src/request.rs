//! Service requests placed by subscribers with a provider, their lifecycle,
//! SLA deadlines, and the message thread attached to each request.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "validation")]
use validator::Validate;

use crate::common::ProviderType;

// ---------------------------------------------------------------------------
// Status & priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
    Rejected,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 6] = [
        RequestStatus::Pending,
        RequestStatus::Accepted,
        RequestStatus::InProgress,
        RequestStatus::Completed,
        RequestStatus::Cancelled,
        RequestStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }

    /// Whether the request still counts against its SLA.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            RequestStatus::Pending | RequestStatus::Accepted | RequestStatus::InProgress
        )
    }

    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Accepted, InProgress)
                | (Accepted, Cancelled)
                | (InProgress, Completed)
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum RequestPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl RequestPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestPriority::Low => "low",
            RequestPriority::Normal => "normal",
            RequestPriority::High => "high",
            RequestPriority::Urgent => "urgent",
        }
    }
}

/// Hours allowed per priority before a request is overdue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SlaPolicy {
    #[serde(default = "default_urgent")]
    pub urgent: i64,
    #[serde(default = "default_high")]
    pub high: i64,
    #[serde(default = "default_normal")]
    pub normal: i64,
    #[serde(default = "default_low")]
    pub low: i64,
}

fn default_urgent() -> i64 {
    24
}
fn default_high() -> i64 {
    48
}
fn default_normal() -> i64 {
    72
}
fn default_low() -> i64 {
    120
}

impl Default for SlaPolicy {
    fn default() -> Self {
        Self {
            urgent: default_urgent(),
            high: default_high(),
            normal: default_normal(),
            low: default_low(),
        }
    }
}

impl SlaPolicy {
    pub fn hours_for(&self, priority: RequestPriority) -> i64 {
        match priority {
            RequestPriority::Urgent => self.urgent,
            RequestPriority::High => self.high,
            RequestPriority::Normal => self.normal,
            RequestPriority::Low => self.low,
        }
    }

    pub fn deadline_from(&self, start: DateTime<Utc>, priority: RequestPriority) -> DateTime<Utc> {
        start + Duration::hours(self.hours_for(priority))
    }
}

// ---------------------------------------------------------------------------
// Service request
// ---------------------------------------------------------------------------

/// A subscriber's request for a provider's service (DB row).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct ServiceRequest {
    pub id: Uuid,
    pub subscriber_id: i64,
    pub service_id: Uuid,
    pub provider_type: String,
    pub provider_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub quoted_price: Option<f64>,
    pub commission_rate: i32,
    pub sla_deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceRequest {
    pub fn status(&self) -> Option<RequestStatus> {
        RequestStatus::from_str_opt(&self.status)
    }

    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.status().is_some_and(|s| s.is_open()) && self.sla_deadline < now
    }

    pub fn is_owned_by_provider(&self, provider_type: ProviderType, provider_id: Uuid) -> bool {
        self.provider_type == provider_type.as_str() && self.provider_id == provider_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ServiceRequestResponse {
    pub id: String,
    pub subscriber_id: i64,
    pub service_id: String,
    pub provider_type: String,
    pub provider_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quoted_price: Option<f64>,
    pub sla_deadline: String,
    pub overdue: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ServiceRequest> for ServiceRequestResponse {
    fn from(r: ServiceRequest) -> Self {
        let overdue = r.is_overdue_at(Utc::now());
        Self {
            id: r.id.to_string(),
            subscriber_id: r.subscriber_id,
            service_id: r.service_id.to_string(),
            provider_type: r.provider_type,
            provider_id: r.provider_id.to_string(),
            title: r.title,
            description: r.description,
            status: r.status,
            priority: r.priority,
            quoted_price: r.quoted_price,
            sla_deadline: r.sla_deadline.to_rfc3339(),
            overdue,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreateServiceRequestRequest {
    pub service_id: Uuid,
    pub provider_type: ProviderType,
    pub provider_id: Uuid,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 200, message = "Title is required"))
    )]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: RequestPriority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateRequestStatusRequest {
    pub status: RequestStatus,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct RequestListParams {
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// A chat message on a service request (DB row).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Message {
    pub id: Uuid,
    pub request_id: Uuid,
    pub sender_id: i64,
    /// "subscriber" or "provider".
    pub sender_role: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct PostMessageRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 5000, message = "Message cannot be empty"))
    )]
    pub body: String,
}

/// Incremental polling cursor.
///
/// Messages sharing a timestamp are ordered by id, so a client passes the
/// `created_at` and `id` of the last message it holds. With `after` alone
/// only messages strictly newer than that instant come back.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct MessageListParams {
    pub after: Option<DateTime<Utc>>,
    pub after_id: Option<Uuid>,
}

/// Append `incoming` to `existing`, skipping ids already present.
///
/// Order of `existing` is kept; new messages keep their arrival order.
pub fn merge_messages(existing: &mut Vec<Message>, incoming: Vec<Message>) -> usize {
    let mut seen: HashSet<Uuid> = existing.iter().map(|m| m.id).collect();
    let before = existing.len();
    for m in incoming {
        if seen.insert(m.id) {
            existing.push(m);
        }
    }
    existing.len() - before
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct RequestAttachment {
    pub id: Uuid,
    pub request_id: Uuid,
    pub uploaded_by: i64,
    pub file_name: String,
    pub content_type: String,
    pub object_key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct InitAttachmentRequest {
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, max = 255, message = "File name is required"))
    )]
    pub file_name: String,
    #[cfg_attr(
        feature = "validation",
        validate(length(min = 1, message = "Content type is required"))
    )]
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InitAttachmentResponse {
    pub attachment_id: String,
    pub object_key: String,
    pub upload_url: String,
    pub required_headers: HashMap<String, String>,
}

/// Short-lived download link for an attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AttachmentUrlResponse {
    pub url: String,
    pub file_name: String,
}

/// Object key for an attachment. Only `[A-Za-z0-9._-]` survive from the
/// original file name.
pub fn attachment_object_key(request_id: Uuid, attachment_id: Uuid, file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("requests/{request_id}/{attachment_id}-{safe}")
}
