use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pricing::{commission_amount, PricingType};

/// A provider's enabled leaf service with its pricing (DB row).
///
/// Unique on `(provider_type, provider_id, service_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct ProviderService {
    pub id: Uuid,
    /// ProviderType stored as snake_case text.
    pub provider_type: String,
    pub provider_id: Uuid,
    pub service_id: Uuid,
    /// PricingType stored as snake_case text.
    pub pricing_type: String,
    pub price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub estimated_duration: Option<String>,
    pub commission_rate: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProviderService {
    pub fn pricing(&self) -> PricingType {
        PricingType::from_str_opt(&self.pricing_type).unwrap_or_default()
    }

    /// Commission shown next to a fixed price. `None` for range and quote.
    pub fn displayed_commission(&self) -> Option<f64> {
        match (self.pricing(), self.price) {
            (PricingType::Fixed, Some(price)) => Some(commission_amount(price, self.commission_rate)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProviderServiceResponse {
    pub id: String,
    pub service_id: String,
    pub pricing_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<String>,
    pub commission_rate: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission: Option<f64>,
    pub is_active: bool,
    pub updated_at: String,
}

impl From<ProviderService> for ProviderServiceResponse {
    fn from(p: ProviderService) -> Self {
        let commission = p.displayed_commission();
        Self {
            id: p.id.to_string(),
            service_id: p.service_id.to_string(),
            pricing_type: p.pricing_type,
            price: p.price,
            min_price: p.min_price,
            max_price: p.max_price,
            estimated_duration: p.estimated_duration,
            commission_rate: p.commission_rate,
            commission,
            is_active: p.is_active,
            updated_at: p.updated_at.to_rfc3339(),
        }
    }
}
