//! Pricing and commission rules for provider services.
//!
//! A provider prices each leaf service in one of three ways: a fixed price,
//! a min/max range, or "on quote". The platform keeps a commission whose
//! rate depends on the provider type.

use serde::{Deserialize, Serialize};

use crate::common::ProviderType;
use crate::error::AppError;

/// How a provider prices a service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum PricingType {
    Fixed,
    Range,
    #[default]
    Quote,
}

impl PricingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingType::Fixed => "fixed",
            PricingType::Range => "range",
            PricingType::Quote => "quote",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "fixed" => Some(PricingType::Fixed),
            "range" => Some(PricingType::Range),
            "quote" => Some(PricingType::Quote),
            _ => None,
        }
    }
}

/// Pricing as submitted from the enable-service form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PricingInput {
    pub pricing_type: PricingType,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    /// Free-text estimate such as "3 أيام" or "2 weeks".
    #[serde(default)]
    pub estimated_duration: Option<String>,
}

impl PricingInput {
    /// Default shape used by bulk enable.
    pub fn quote() -> Self {
        Self::default()
    }
}

/// Pricing that passed validation, with fields irrelevant to its type cleared.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ValidatedPricing {
    pub pricing_type: PricingType,
    pub price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub estimated_duration: Option<String>,
}

fn positive(value: Option<f64>, field: &str, label: &str) -> Result<f64, AppError> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        Some(_) => Err(AppError::invalid_field(
            field,
            format!("{label} must be greater than zero"),
        )),
        None => Err(AppError::invalid_field(field, format!("{label} is required"))),
    }
}

/// Check a pricing submission. Runs before any storage call.
///
/// - `fixed` requires `price > 0`
/// - `range` requires `min_price > 0`, `max_price > 0` and `min_price < max_price`
/// - `quote` requires nothing
pub fn validate_pricing(input: &PricingInput) -> Result<ValidatedPricing, AppError> {
    let estimated_duration = input
        .estimated_duration
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    match input.pricing_type {
        PricingType::Fixed => {
            let price = positive(input.price, "price", "Price")?;
            Ok(ValidatedPricing {
                pricing_type: PricingType::Fixed,
                price: Some(price),
                min_price: None,
                max_price: None,
                estimated_duration,
            })
        }
        PricingType::Range => {
            let min = positive(input.min_price, "min_price", "Minimum price")?;
            let max = positive(input.max_price, "max_price", "Maximum price")?;
            if min >= max {
                return Err(AppError::invalid_field(
                    "max_price",
                    "Maximum price must be greater than minimum price",
                ));
            }
            Ok(ValidatedPricing {
                pricing_type: PricingType::Range,
                price: None,
                min_price: Some(min),
                max_price: Some(max),
                estimated_duration,
            })
        }
        PricingType::Quote => Ok(ValidatedPricing {
            pricing_type: PricingType::Quote,
            price: None,
            min_price: None,
            max_price: None,
            estimated_duration,
        }),
    }
}

pub const DEFAULT_LEGAL_ARM_COMMISSION_RATE: i32 = 50;
pub const DEFAULT_COMMISSION_RATE: i32 = 70;

/// Commission percentages kept by the platform, per provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CommissionPolicy {
    #[serde(default = "default_legal_arm_rate")]
    pub legal_arm_rate: i32,
    #[serde(default = "default_rate")]
    pub default_rate: i32,
}

fn default_legal_arm_rate() -> i32 {
    DEFAULT_LEGAL_ARM_COMMISSION_RATE
}

fn default_rate() -> i32 {
    DEFAULT_COMMISSION_RATE
}

impl Default for CommissionPolicy {
    fn default() -> Self {
        Self {
            legal_arm_rate: DEFAULT_LEGAL_ARM_COMMISSION_RATE,
            default_rate: DEFAULT_COMMISSION_RATE,
        }
    }
}

impl CommissionPolicy {
    pub fn rate_for(&self, provider_type: ProviderType) -> i32 {
        match provider_type {
            ProviderType::LegalArm => self.legal_arm_rate,
            ProviderType::Partner | ProviderType::Lawyer => self.default_rate,
        }
    }
}

/// Commission on a price: `round(price × rate / 100)`.
pub fn commission_amount(price: f64, rate: i32) -> f64 {
    (price * rate as f64 / 100.0).round()
}

/// Breakdown of a price into platform commission and provider share.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CommissionPreview {
    pub price: f64,
    pub rate: i32,
    pub commission: f64,
    pub provider_share: f64,
}

impl CommissionPreview {
    pub fn compute(price: f64, rate: i32) -> Self {
        let commission = commission_amount(price, rate);
        Self {
            price,
            rate,
            commission,
            provider_share: price - commission,
        }
    }
}

/// Query parameters for the commission preview endpoint.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct CommissionPreviewParams {
    pub price: f64,
}
