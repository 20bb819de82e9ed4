use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use super::cookies;
use super::jwt::validate_access_token;

/// Permissive auth middleware.
///
/// Validates the session token from the cookie (or Bearer header fallback)
/// and inserts the `Claims` into request extensions. Missing or invalid
/// tokens pass through unauthenticated; extractors decide authorization.
pub async fn auth_middleware(mut req: Request, next: Next) -> Response {
    if let Some(token) = cookies::extract_access_token(req.headers()) {
        match validate_access_token(&token) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid session token");
            }
        }
    }

    next.run(req).await
}
