pub mod cookies;
pub mod extractors;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod provider_access;

use sqlx::{Pool, Postgres};

/// Check if the given email matches the `ADMIN_EMAIL` env var (case-insensitive).
/// Returns `false` if the env var is empty or unset.
pub fn is_admin_email(email: &str) -> bool {
    match std::env::var("ADMIN_EMAIL") {
        Ok(admin) if !admin.is_empty() => admin.eq_ignore_ascii_case(email),
        _ => false,
    }
}

/// If the email matches `ADMIN_EMAIL`, promote the user to admin.
/// Returns the (possibly updated) account type. DB errors are non-fatal:
/// the current account type is returned unchanged on failure.
pub async fn maybe_promote_admin(
    pool: &Pool<Postgres>,
    user_id: i64,
    email: &str,
    current: String,
) -> String {
    if !is_admin_email(email) || current == "admin" {
        return current;
    }

    match sqlx::query!("UPDATE users SET account_type = 'admin' WHERE id = $1", user_id)
        .execute(pool)
        .await
    {
        Ok(_) => {
            tracing::info!(user_id, email, "Promoted user to admin via ADMIN_EMAIL");
            "admin".to_string()
        }
        Err(e) => {
            tracing::error!(user_id, email, %e, "Failed to promote admin");
            current
        }
    }
}
