use axum::http::{header, HeaderMap, HeaderValue};
use cookie::Cookie;

use super::jwt;

pub const SESSION_COOKIE: &str = "wakeel_session";

fn cookie_secure() -> bool {
    std::env::var("COOKIE_SECURE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false)
}

fn cookie_domain() -> Option<String> {
    std::env::var("COOKIE_DOMAIN").ok().filter(|d| !d.is_empty())
}

fn session_cookie(value: &str, max_age: cookie::time::Duration) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, value.to_string()))
        .http_only(true)
        .same_site(cookie::SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .secure(cookie_secure());

    if let Some(domain) = cookie_domain() {
        cookie = cookie.domain(domain);
    }
    cookie.build()
}

/// Build a Set-Cookie header value for the session token.
/// Returns `None` if the token contains bytes not allowed in a header.
pub fn build_session_cookie(token: &str, max_age_minutes: i64) -> Option<HeaderValue> {
    let cookie = session_cookie(token, cookie::time::Duration::seconds(max_age_minutes * 60));
    HeaderValue::from_str(&cookie.to_string()).ok()
}

/// Build a Set-Cookie header value that clears the session cookie.
pub fn build_clear_cookie() -> Option<HeaderValue> {
    HeaderValue::from_str(&session_cookie("", cookie::time::Duration::ZERO).to_string()).ok()
}

/// Extract the session token from the cookie (preferred) or Bearer header (fallback).
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_cookie(headers, SESSION_COOKIE).filter(|t| !t.is_empty()) {
        return Some(token);
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Parse a specific cookie value from the Cookie header.
fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for header_value in headers.get_all(header::COOKIE) {
        if let Ok(cookie_str) = header_value.to_str() {
            for piece in cookie_str.split(';') {
                if let Ok(c) = Cookie::parse(piece.trim().to_string()) {
                    if c.name() == name {
                        return Some(c.value().to_string());
                    }
                }
            }
        }
    }
    None
}

/// Set the session cookie on a response using the configured token expiry.
pub fn set_session_cookie(headers: &mut HeaderMap, token: &str) {
    if let Some(value) = build_session_cookie(token, jwt::access_token_expiry_minutes()) {
        headers.append(header::SET_COOKIE, value);
    }
}

pub fn clear_session_cookie(headers: &mut HeaderMap) {
    if let Some(value) = build_clear_cookie() {
        headers.append(header::SET_COOKIE, value);
    }
}
