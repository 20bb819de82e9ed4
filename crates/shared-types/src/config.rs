use serde::{Deserialize, Serialize};

use crate::pricing::CommissionPolicy;
use crate::request::SlaPolicy;

/// Feature flags controlling which optional integrations are active.
///
/// Every field defaults to `false` so that a missing or incomplete config
/// file disables all optional integrations.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FeatureFlags {
    /// Presigned uploads for request attachments.
    #[serde(default)]
    pub s3: bool,
    /// OTP delivery by SMS.
    #[serde(default)]
    pub twilio: bool,
    /// OTP delivery by email.
    #[serde(default)]
    pub mailgun: bool,
    #[serde(default)]
    pub telemetry: bool,
}

/// Top-level config file structure matching `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default)]
    pub commission: CommissionPolicy,
    #[serde(default)]
    pub sla: SlaPolicy,
}
