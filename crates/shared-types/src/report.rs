use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pricing::commission_amount;
use crate::request::{RequestStatus, ServiceRequest};

/// Optional reporting window over `created_at`.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct ReportParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProviderSummary {
    pub total_requests: usize,
    pub by_status: BTreeMap<String, usize>,
    pub completed_revenue: f64,
    pub commission: f64,
    pub provider_share: f64,
    pub total_minutes: i64,
}

/// Aggregate already-fetched requests into a provider summary.
pub fn summarize_requests(requests: &[ServiceRequest], total_minutes: i64) -> ProviderSummary {
    let mut summary = ProviderSummary {
        total_requests: requests.len(),
        total_minutes,
        ..Default::default()
    };
    for r in requests {
        *summary.by_status.entry(r.status.clone()).or_default() += 1;
        if r.status() == Some(RequestStatus::Completed) {
            if let Some(price) = r.quoted_price {
                let commission = commission_amount(price, r.commission_rate);
                summary.completed_revenue += price;
                summary.commission += commission;
                summary.provider_share += price - commission;
            }
        }
    }
    summary
}

/// One line of the CSV/HTML export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportRow {
    pub id: String,
    pub title: String,
    pub status: String,
    pub priority: String,
    pub quoted_price: Option<f64>,
    pub sla_deadline: String,
    pub created_at: String,
}

impl From<&ServiceRequest> for ReportRow {
    fn from(r: &ServiceRequest) -> Self {
        Self {
            id: r.id.to_string(),
            title: r.title.clone(),
            status: r.status.clone(),
            priority: r.priority.clone(),
            quoted_price: r.quoted_price,
            sla_deadline: r.sla_deadline.to_rfc3339(),
            created_at: r.created_at.to_rfc3339(),
        }
    }
}
