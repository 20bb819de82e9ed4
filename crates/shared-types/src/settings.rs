use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub const LANGUAGES: &[&str] = &["ar", "en"];
pub const THEMES: &[&str] = &["light", "dark", "system"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct UserSettings {
    pub user_id: i64,
    pub language: String,
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub theme: String,
}

impl UserSettings {
    /// Settings for a user who never saved any.
    pub fn defaults_for(user_id: i64) -> Self {
        Self {
            user_id,
            language: "ar".to_string(),
            email_notifications: true,
            sms_notifications: true,
            theme: "system".to_string(),
        }
    }

    /// Apply a partial update, validating enumerated fields.
    pub fn apply(mut self, update: UpdateSettingsRequest) -> Result<Self, AppError> {
        if let Some(lang) = update.language {
            if !LANGUAGES.contains(&lang.as_str()) {
                return Err(AppError::invalid_field("language", "Language must be ar or en"));
            }
            self.language = lang;
        }
        if let Some(theme) = update.theme {
            if !THEMES.contains(&theme.as_str()) {
                return Err(AppError::invalid_field("theme", "Unknown theme"));
            }
            self.theme = theme;
        }
        if let Some(v) = update.email_notifications {
            self.email_notifications = v;
        }
        if let Some(v) = update.sms_notifications {
            self.sms_notifications = v;
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateSettingsRequest {
    pub language: Option<String>,
    pub email_notifications: Option<bool>,
    pub sms_notifications: Option<bool>,
    pub theme: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct UserDevice {
    pub id: Uuid,
    pub user_id: i64,
    pub device_token: String,
    pub platform: String,
    pub last_seen_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterDeviceRequest {
    pub device_token: String,
    /// "ios", "android" or "web".
    pub platform: String,
}
