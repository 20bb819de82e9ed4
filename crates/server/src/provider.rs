use axum::{extract::FromRequestParts, http::request::Parts};
use shared_types::{AppError, ProviderRef, ProviderType};
use uuid::Uuid;

use crate::auth::jwt::Claims;
use crate::auth::provider_access::resolve_provider_access;

pub const PROVIDER_TYPE_HEADER: &str = "x-provider-type";
pub const PROVIDER_ID_HEADER: &str = "x-provider-id";

/// Extractor that resolves which provider a request acts for.
///
/// Always requires a session (401 without one). The scope comes from the
/// session claims; `X-Provider-Type` + `X-Provider-Id` headers only name
/// a provider, and `resolve_provider_access` decides whether the session
/// may act for it (403 otherwise).
#[derive(Debug, Clone, Copy)]
pub struct ProviderScope(pub ProviderRef);

impl ProviderScope {
    pub fn provider_type(&self) -> ProviderType {
        self.0.provider_type
    }

    pub fn provider_id(&self) -> Uuid {
        self.0.provider_id
    }

    /// Provider type as stored in the database.
    pub fn type_str(&self) -> &'static str {
        self.0.provider_type.as_str()
    }

    fn from_headers(parts: &Parts) -> Result<Option<ProviderRef>, AppError> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        let (Some(raw_type), Some(raw_id)) = (header(PROVIDER_TYPE_HEADER), header(PROVIDER_ID_HEADER))
        else {
            return Ok(None);
        };

        let provider_type = ProviderType::parse(raw_type).ok_or_else(|| {
            AppError::bad_request(format!("Unknown provider type: {raw_type}"))
        })?;
        let provider_id = Uuid::parse_str(raw_id)
            .map_err(|_| AppError::bad_request("X-Provider-Id must be a UUID"))?;

        Ok(Some(ProviderRef {
            provider_type,
            provider_id,
        }))
    }
}

impl<S> FromRequestParts<S> for ProviderScope
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let requested = Self::from_headers(parts)?;
        let claims = parts
            .extensions
            .get::<Claims>()
            .ok_or_else(|| AppError::unauthorized("Authentication required"))?;

        resolve_provider_access(claims, requested)?
            .map(ProviderScope)
            .ok_or_else(|| {
                AppError::bad_request("Missing required headers: X-Provider-Type and X-Provider-Id")
            })
    }
}

/// Optional provider scope. `None` when the caller names no provider and
/// the session carries none; naming one goes through the same checks as
/// `ProviderScope`.
#[derive(Debug, Clone, Copy)]
pub struct MaybeProvider(pub Option<ProviderRef>);

impl<S> FromRequestParts<S> for MaybeProvider
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let requested = ProviderScope::from_headers(parts)?;
        match parts.extensions.get::<Claims>() {
            Some(claims) => Ok(MaybeProvider(resolve_provider_access(claims, requested)?)),
            None if requested.is_some() => Err(AppError::unauthorized("Authentication required")),
            None => Ok(MaybeProvider(None)),
        }
    }
}
