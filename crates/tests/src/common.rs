use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    Router,
};
use serde_json::Value;
use shared_types::{ProviderRef, ProviderType};
use sqlx::{Pool, Postgres};
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

/// Global mutex ensuring tests run sequentially against the shared database.
/// Each test acquires this lock before truncating and seeding, preventing
/// concurrent tests from interfering with each other's data.
static TEST_MUTEX: std::sync::LazyLock<Mutex<()>> = std::sync::LazyLock::new(|| Mutex::new(()));

pub const SUBSCRIBER_ID: i64 = 1;
pub const ADMIN_ID: i64 = 2;
pub const PARTNER_USER_ID: i64 = 3;
pub const OTHER_SUBSCRIBER_ID: i64 = 4;
pub const OTHER_PARTNER_USER_ID: i64 = 5;
pub const LEGAL_ARM_USER_ID: i64 = 6;

pub const PARTNER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0001);
pub const OTHER_PARTNER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0002);
pub const LEGAL_ARM_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0003);

const TRUNCATE: &str = "TRUNCATE users, otp_codes, partners, partner_roles, ref_departments, \
    ref_job_titles, partner_employees, legal_arms, legal_arm_roles, lawyers, service_categories, \
    service_subcategories, service_paths, legal_services, provider_services, service_requests, \
    messages, request_attachments, lawyer_time_logs, activity_logs, case_management, \
    calendar_events, notifications, support_tickets, support_ticket_replies, user_settings, \
    user_devices, subscriptions, members, user_points, referrals, withdrawal_requests \
    RESTART IDENTITY CASCADE";

pub fn partner() -> ProviderRef {
    ProviderRef {
        provider_type: ProviderType::Partner,
        provider_id: PARTNER_ID,
    }
}

pub fn other_partner() -> ProviderRef {
    ProviderRef {
        provider_type: ProviderType::Partner,
        provider_id: OTHER_PARTNER_ID,
    }
}

pub fn legal_arm() -> ProviderRef {
    ProviderRef {
        provider_type: ProviderType::LegalArm,
        provider_id: LEGAL_ARM_ID,
    }
}

async fn connect_and_reset() -> Pool<Postgres> {
    let _ = dotenvy::dotenv();
    if std::env::var("JWT_SECRET").map_or(true, |s| s.is_empty()) {
        std::env::set_var("JWT_SECRET", "integration-test-secret");
    }

    let database_url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("TEST_DATABASE_URL or DATABASE_URL must be set for tests");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    sqlx::query("DROP TRIGGER IF EXISTS reject_notifications ON notifications")
        .execute(&pool)
        .await
        .expect("Failed to drop notification trigger");

    sqlx::query(TRUNCATE)
        .execute(&pool)
        .await
        .expect("Failed to truncate");

    seed(&pool).await;
    pool
}

/// Six users (two subscribers, an admin, an operator for each partner and
/// a legal-arm lawyer), two partners and one legal arm.
async fn seed(pool: &Pool<Postgres>) {
    sqlx::query(
        "INSERT INTO partners (id, name) VALUES ($1, 'Test Partner'), ($2, 'Other Partner')",
    )
    .bind(PARTNER_ID)
    .bind(OTHER_PARTNER_ID)
    .execute(pool)
    .await
    .expect("Failed to seed partners");

    sqlx::query("INSERT INTO legal_arms (id, name) VALUES ($1, 'Test Legal Arm')")
        .bind(LEGAL_ARM_ID)
        .execute(pool)
        .await
        .expect("Failed to seed legal arm");

    sqlx::query(
        r#"
        INSERT INTO users (id, email, display_name, password_hash, account_type, provider_type, provider_id)
        VALUES
            (1, 'subscriber@test.sa', 'Subscriber', 'x', 'subscriber', NULL, NULL),
            (2, 'admin@test.sa', 'Admin', 'x', 'admin', NULL, NULL),
            (3, 'partner@test.sa', 'Partner Operator', 'x', 'partner', 'partner', $1),
            (4, 'other@test.sa', 'Other Subscriber', 'x', 'subscriber', NULL, NULL),
            (5, 'other-partner@test.sa', 'Other Operator', 'x', 'partner', 'partner', $2),
            (6, 'arm@test.sa', 'Arm Lawyer', 'x', 'legal_arm_lawyer', 'legal_arm', $3)
        "#,
    )
    .bind(PARTNER_ID)
    .bind(OTHER_PARTNER_ID)
    .bind(LEGAL_ARM_ID)
    .execute(pool)
    .await
    .expect("Failed to seed users");

    // Keep API-registered users clear of the fixed ids above.
    sqlx::query("SELECT setval('users_id_seq', 100)")
        .execute(pool)
        .await
        .expect("Failed to bump users sequence");
}

fn with_auth(router: Router<server::db::AppState>, pool: &Pool<Postgres>) -> Router {
    let state = server::db::AppState::new(pool.clone());
    router
        .layer(middleware::from_fn(server::auth::middleware::auth_middleware))
        .with_state(state)
}

/// Build a test router backed by a real Postgres pool.
/// Acquires a global lock, truncates all tables, and re-seeds fixtures.
/// The returned `MutexGuard` must be held for the duration of the test.
pub async fn test_app() -> (Router, Pool<Postgres>, tokio::sync::MutexGuard<'static, ()>) {
    let guard = TEST_MUTEX.lock().await;
    let pool = connect_and_reset().await;
    let router = with_auth(server::rest::api_router(), &pool);
    (router, pool, guard)
}

/// Build a test router with a very tight rate limit for testing 429 responses.
pub async fn test_app_rate_limited(
    max_requests: u32,
) -> (Router, Pool<Postgres>, tokio::sync::MutexGuard<'static, ()>) {
    let guard = TEST_MUTEX.lock().await;
    let pool = connect_and_reset().await;
    let rate_limit = server::rate_limit::RateLimitState::new(
        max_requests,
        std::time::Duration::from_secs(60),
    );
    let router = with_auth(server::rest::api_router_with_rate_limit(rate_limit), &pool);
    (router, pool, guard)
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

pub fn token_for(user_id: i64, account_type: &str, provider: Option<ProviderRef>) -> String {
    server::auth::jwt::create_access_token(
        user_id,
        &format!("user{user_id}@test.sa"),
        account_type,
        provider,
    )
    .expect("Failed to create test JWT")
}

pub fn subscriber_token() -> String {
    token_for(SUBSCRIBER_ID, "subscriber", None)
}

pub fn other_subscriber_token() -> String {
    token_for(OTHER_SUBSCRIBER_ID, "subscriber", None)
}

pub fn admin_token() -> String {
    token_for(ADMIN_ID, "admin", None)
}

/// Session of the seeded partner operator; the provider scope rides in the claims.
pub fn partner_token() -> String {
    token_for(PARTNER_USER_ID, "partner", Some(partner()))
}

/// Session of the seeded account linked to `provider`.
pub fn provider_token(provider: ProviderRef) -> String {
    let (user_id, account_type) = match provider.provider_id {
        OTHER_PARTNER_ID => (OTHER_PARTNER_USER_ID, "partner"),
        LEGAL_ARM_ID => (LEGAL_ARM_USER_ID, "legal_arm_lawyer"),
        _ => (PARTNER_USER_ID, "partner"),
    };
    token_for(user_id, account_type, Some(provider))
}

/// Make every insert into `notifications` fail until the next reset.
pub async fn break_notifications(pool: &Pool<Postgres>) {
    sqlx::query(
        r#"
        CREATE OR REPLACE FUNCTION reject_notification() RETURNS trigger AS $$
        BEGIN
            RAISE EXCEPTION 'notifications unavailable';
        END;
        $$ LANGUAGE plpgsql
        "#,
    )
    .execute(pool)
    .await
    .expect("Failed to create trigger function");

    sqlx::query(
        "CREATE TRIGGER reject_notifications BEFORE INSERT ON notifications \
         FOR EACH ROW EXECUTE FUNCTION reject_notification()",
    )
    .execute(pool)
    .await
    .expect("Failed to create trigger");
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Who a test request is sent as.
#[derive(Clone, Copy)]
pub enum As<'a> {
    Anonymous,
    Token(&'a str),
    /// Session of the seeded account linked to this provider.
    Provider(ProviderRef),
    /// A session plus `X-Provider-*` headers naming a provider.
    Acting(&'a str, ProviderRef),
    /// Provider headers only, no session.
    Headers(ProviderRef),
}

fn build(method: &str, uri: &str, body: Option<&str>, who: As<'_>) -> Request<Body> {
    let bearer = |token: &str| format!("Bearer {token}");
    let mut builder = Request::builder().method(method).uri(uri);
    let named = match who {
        As::Anonymous => None,
        As::Token(token) => {
            builder = builder.header("authorization", bearer(token));
            None
        }
        As::Provider(p) => {
            builder = builder.header("authorization", bearer(&provider_token(p)));
            None
        }
        As::Acting(token, p) => {
            builder = builder.header("authorization", bearer(token));
            Some(p)
        }
        As::Headers(p) => Some(p),
    };
    if let Some(p) = named {
        builder = builder
            .header("x-provider-type", p.provider_type.as_str())
            .header("x-provider-id", p.provider_id.to_string());
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn get(app: &Router, uri: &str, who: As<'_>) -> (StatusCode, Value) {
    send(app, build("GET", uri, None, who)).await
}

pub async fn post_json(app: &Router, uri: &str, body: &Value, who: As<'_>) -> (StatusCode, Value) {
    send(app, build("POST", uri, Some(&body.to_string()), who)).await
}

pub async fn post_empty(app: &Router, uri: &str, who: As<'_>) -> (StatusCode, Value) {
    send(app, build("POST", uri, None, who)).await
}

pub async fn put_json(app: &Router, uri: &str, body: &Value, who: As<'_>) -> (StatusCode, Value) {
    send(app, build("PUT", uri, Some(&body.to_string()), who)).await
}

pub async fn patch_json(app: &Router, uri: &str, body: &Value, who: As<'_>) -> (StatusCode, Value) {
    send(app, build("PATCH", uri, Some(&body.to_string()), who)).await
}

pub async fn delete(app: &Router, uri: &str, who: As<'_>) -> (StatusCode, Value) {
    send(app, build("DELETE", uri, None, who)).await
}

/// Send a request through the router and parse the response.
async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, _headers, body_bytes) = send_raw(app, req).await;

    let body: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&body_bytes).to_string(),
        ))
    };

    (status, body)
}

/// Send a request and return raw bytes + status + headers (for CSV/HTML exports).
pub async fn send_raw(
    app: &Router,
    req: Request<Body>,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(req)
        .await
        .expect("Failed to send request");

    let status = response.status();
    let headers = response.headers().clone();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");

    (status, headers, body_bytes.to_vec())
}

pub async fn get_raw(
    app: &Router,
    uri: &str,
    who: As<'_>,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    send_raw(app, build("GET", uri, None, who)).await
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Ids of a one-branch catalog: category > subcategory > path > services.
pub struct CatalogBranch {
    pub category_id: Uuid,
    pub subcategory_id: Uuid,
    pub path_id: Uuid,
    pub service_ids: Vec<Uuid>,
}

impl CatalogBranch {
    pub fn service(&self) -> Uuid {
        self.service_ids[0]
    }
}

/// Insert a branch with `services` active leaf services directly in the DB.
pub async fn create_catalog_branch(pool: &Pool<Postgres>, name: &str, services: usize) -> CatalogBranch {
    let category_id: Uuid =
        sqlx::query_scalar("INSERT INTO service_categories (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(pool)
            .await
            .expect("Failed to create category");

    let subcategory_id: Uuid = sqlx::query_scalar(
        "INSERT INTO service_subcategories (category_id, name) VALUES ($1, $2) RETURNING id",
    )
    .bind(category_id)
    .bind(format!("{name} / sub"))
    .fetch_one(pool)
    .await
    .expect("Failed to create subcategory");

    let path_id: Uuid = sqlx::query_scalar(
        "INSERT INTO service_paths (subcategory_id, name) VALUES ($1, $2) RETURNING id",
    )
    .bind(subcategory_id)
    .bind(format!("{name} / path"))
    .fetch_one(pool)
    .await
    .expect("Failed to create path");

    let mut service_ids = Vec::with_capacity(services);
    for i in 0..services {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO legal_services (path_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(path_id)
        .bind(format!("{name} service {i}"))
        .fetch_one(pool)
        .await
        .expect("Failed to create service");
        service_ids.push(id);
    }

    CatalogBranch {
        category_id,
        subcategory_id,
        path_id,
        service_ids,
    }
}

/// Enable `service_id` for the seeded partner at a fixed price.
pub async fn enable_fixed(app: &Router, service_id: Uuid, price: f64) -> Value {
    let body = serde_json::json!({ "pricing_type": "fixed", "price": price });
    let uri = format!("/api/provider-services/{service_id}");
    let (status, response) = put_json(app, &uri, &body, As::Provider(partner())).await;
    assert_eq!(status, StatusCode::OK, "Failed to enable service: {response}");
    response
}

/// Create a request from the seeded subscriber to the seeded partner.
pub async fn create_test_request(app: &Router, service_id: Uuid, title: &str) -> Value {
    let body = serde_json::json!({
        "service_id": service_id,
        "provider_type": "partner",
        "provider_id": PARTNER_ID,
        "title": title,
    });
    let token = subscriber_token();
    let (status, response) = post_json(app, "/api/requests", &body, As::Token(&token)).await;
    assert_eq!(status, StatusCode::CREATED, "Failed to create request: {response}");
    response
}

/// Move a request to `status` as the seeded partner.
pub async fn set_request_status(app: &Router, request_id: &str, status: &str) -> (StatusCode, Value) {
    let uri = format!("/api/requests/{request_id}/status");
    patch_json(app, &uri, &serde_json::json!({ "status": status }), As::Provider(partner())).await
}

/// A request walked all the way to `completed`.
pub async fn create_completed_request(app: &Router, service_id: Uuid) -> Value {
    let request = create_test_request(app, service_id, "Completed work").await;
    let id = request["id"].as_str().unwrap().to_string();
    for next in ["accepted", "in_progress", "completed"] {
        let (status, body) = set_request_status(app, &id, next).await;
        assert_eq!(status, StatusCode::OK, "Transition to {next} failed: {body}");
    }
    request
}
