use shared_types::{AppError, ProviderRef};

use super::jwt::Claims;

/// Resolve which provider a session may act for. No DB query: the link
/// between an account and its provider rides in the claims (set at login).
///
/// - A provider account acts for its own provider. Headers naming any
///   other provider are refused.
/// - Admins may act for any provider named in the headers.
/// - Everyone else is refused when they name a provider.
///
/// Returns `Ok(None)` when nothing is requested and the session carries no
/// provider.
pub fn resolve_provider_access(
    claims: &Claims,
    requested: Option<ProviderRef>,
) -> Result<Option<ProviderRef>, AppError> {
    match (claims.provider(), requested) {
        (Some(own), None) => Ok(Some(own)),
        (Some(own), Some(wanted)) if own == wanted => Ok(Some(own)),
        (Some(_), Some(_)) => Err(AppError::forbidden(
            "This account is not linked to the requested provider",
        )),
        (None, Some(wanted)) if claims.is_admin() => Ok(Some(wanted)),
        (None, Some(_)) => Err(AppError::forbidden(
            "This account is not linked to any provider",
        )),
        (None, None) => Ok(None),
    }
}
