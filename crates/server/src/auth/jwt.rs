use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared_types::{AccountType, ProviderRef, ProviderType};
use uuid::Uuid;

/// JWT claims carried by the session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub account_type: String,
    /// Provider this account acts for. Absent for subscribers and admins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<Uuid>,
    pub exp: i64,
    pub iat: i64,
    /// Unique token identifier so two tokens issued in the same second differ.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    pub fn account(&self) -> AccountType {
        AccountType::from_str_or_default(&self.account_type)
    }

    pub fn is_admin(&self) -> bool {
        self.account() == AccountType::Admin
    }

    pub fn provider(&self) -> Option<ProviderRef> {
        Some(ProviderRef {
            provider_type: ProviderType::parse(self.provider_type.as_deref()?)?,
            provider_id: self.provider_id?,
        })
    }
}

fn jwt_secret() -> Result<String, jsonwebtoken::errors::Error> {
    std::env::var("JWT_SECRET")
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ErrorKind::InvalidKeyFormat.into())
}

pub fn access_token_expiry_minutes() -> i64 {
    std::env::var("JWT_ACCESS_TOKEN_EXPIRY_MINUTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(60)
}

pub fn create_access_token(
    user_id: i64,
    email: &str,
    account_type: &str,
    provider: Option<ProviderRef>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        account_type: account_type.to_string(),
        provider_type: provider.map(|p| p.provider_type.as_str().to_string()),
        provider_id: provider.map(|p| p.provider_id),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(access_token_expiry_minutes())).timestamp(),
        jti: Some(Uuid::new_v4().to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret()?.as_bytes()),
    )
}

pub fn validate_access_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret()?.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
