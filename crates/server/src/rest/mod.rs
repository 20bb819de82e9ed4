pub mod activity;
pub mod auth;
pub mod cases;
pub mod catalog;
pub mod lawyers;
pub mod membership;
pub mod messages;
pub mod notifications;
pub mod organizations;
pub mod otp;
pub mod provider_services;
pub mod reports;
pub mod requests;
pub mod settings;
pub mod support;
pub mod time_logs;
pub mod wallet;

use axum::{routing::{delete, get, patch, post, put}, Router};
use shared_types::AppError;
use uuid::Uuid;

use crate::db::AppState;

/// Parse a path or query id, naming the offending field on failure.
pub fn parse_uuid(raw: &str, field: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::bad_request(format!("Invalid {field} UUID format")))
}

/// Build the combined REST API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/admin/users/{id}/provider", put(auth::link_provider))
        // OTP
        .route("/api/otp/send", post(otp::send_otp))
        .route("/api/otp/verify", post(otp::verify_otp))
        // Catalog
        .route("/api/catalog/tree", get(catalog::catalog_tree))
        .route("/api/catalog/categories", get(catalog::list_categories).post(catalog::create_category))
        .route("/api/catalog/subcategories", get(catalog::list_subcategories).post(catalog::create_subcategory))
        .route("/api/catalog/paths", get(catalog::list_paths).post(catalog::create_path))
        .route("/api/catalog/services", get(catalog::list_services).post(catalog::create_service))
        // Provider services
        .route("/api/provider-services", get(provider_services::list_mine))
        .route("/api/provider-services/bulk-enable", post(provider_services::bulk_enable))
        .route("/api/provider-services/commission-preview", get(provider_services::commission_preview))
        .route(
            "/api/provider-services/clipboard",
            get(provider_services::get_clipboard).put(provider_services::copy_price),
        )
        .route(
            "/api/provider-services/{service_id}",
            put(provider_services::enable).delete(provider_services::disable),
        )
        // Service requests
        .route("/api/requests", post(requests::create_request))
        .route("/api/requests/mine", get(requests::list_mine))
        .route("/api/requests/{id}", get(requests::get_request))
        .route("/api/requests/{id}/status", patch(requests::update_status))
        .route("/api/provider/requests", get(requests::list_for_provider))
        .route("/api/provider/requests/overdue", get(requests::list_overdue))
        // Messages & attachments
        .route("/api/requests/{id}/messages", get(messages::list_messages).post(messages::post_message))
        .route(
            "/api/requests/{id}/attachments",
            get(messages::list_attachments).post(messages::init_attachment),
        )
        .route(
            "/api/requests/{id}/attachments/{attachment_id}/download",
            get(messages::download_attachment),
        )
        // Time logs
        .route("/api/time-logs", get(time_logs::list_time_logs).post(time_logs::create_time_log))
        // Cases & calendar
        .route("/api/cases", get(cases::list_cases).post(cases::create_case))
        .route("/api/cases/overdue", get(cases::list_overdue_cases))
        .route("/api/cases/{id}", get(cases::get_case).patch(cases::update_case))
        .route("/api/cases/{id}/close", post(cases::close_case))
        .route("/api/calendar/events", get(cases::list_events).post(cases::create_event))
        .route("/api/calendar/events/{id}", delete(cases::delete_event))
        // Organisations
        .route("/api/admin/partners", post(organizations::create_partner))
        .route("/api/admin/partners/{id}/status", patch(organizations::set_partner_status))
        .route("/api/partners", get(organizations::list_partners))
        .route("/api/partners/{id}", get(organizations::get_partner))
        .route(
            "/api/partners/{id}/roles",
            get(organizations::list_partner_roles).post(organizations::create_partner_role),
        )
        .route(
            "/api/partners/{id}/employees",
            get(organizations::list_employees).post(organizations::create_employee),
        )
        .route(
            "/api/partners/{id}/employees/{employee_id}/status",
            patch(organizations::set_employee_status),
        )
        .route("/api/admin/legal-arms", post(organizations::create_legal_arm))
        .route("/api/admin/legal-arms/{id}/status", patch(organizations::set_legal_arm_status))
        .route("/api/admin/legal-arms/{id}/roles", post(organizations::create_legal_arm_role))
        .route("/api/legal-arms", get(organizations::list_legal_arms))
        .route("/api/legal-arms/{id}/roles", get(organizations::list_legal_arm_roles))
        .route("/api/admin/departments", post(organizations::create_department))
        .route("/api/departments", get(organizations::list_departments))
        .route("/api/admin/job-titles", post(organizations::create_job_title))
        .route("/api/job-titles", get(organizations::list_job_titles))
        // Lawyers
        .route("/api/lawyers/register", post(lawyers::register_lawyer))
        .route("/api/lawyers", get(lawyers::list_lawyers))
        .route("/api/lawyers/{id}", get(lawyers::get_lawyer))
        .route("/api/admin/lawyers/{id}/status", patch(lawyers::set_lawyer_status))
        // Notifications
        .route("/api/notifications", get(notifications::list_notifications))
        .route("/api/notifications/unread-count", get(notifications::unread_count))
        .route("/api/notifications/read-all", post(notifications::mark_all_read))
        .route("/api/notifications/{id}/read", post(notifications::mark_read))
        // Support
        .route("/api/support/tickets", get(support::list_my_tickets).post(support::create_ticket))
        .route("/api/support/tickets/{id}", get(support::get_ticket))
        .route("/api/support/tickets/{id}/replies", post(support::reply_ticket))
        .route("/api/support/tickets/{id}/close", post(support::close_ticket))
        .route("/api/admin/support/tickets", get(support::admin_queue))
        // Settings & devices
        .route("/api/settings", get(settings::get_settings).patch(settings::update_settings))
        .route("/api/devices", get(settings::list_devices).post(settings::register_device))
        .route("/api/devices/{id}", delete(settings::delete_device))
        // Membership
        .route("/api/membership", get(membership::current_subscription))
        .route("/api/membership/subscribe", post(membership::subscribe))
        .route("/api/membership/members", get(membership::list_members).post(membership::add_member))
        .route("/api/membership/members/{id}", delete(membership::remove_member))
        .route("/api/membership/points", get(membership::get_points))
        .route("/api/membership/referral-code", get(membership::my_referral_code))
        .route("/api/membership/referrals/redeem", post(membership::redeem_referral))
        // Wallet
        .route("/api/wallet", get(wallet::get_balance))
        .route(
            "/api/wallet/withdrawals",
            get(wallet::list_withdrawals).post(wallet::request_withdrawal),
        )
        // Reports
        .route("/api/reports/summary", get(reports::summary))
        .route("/api/reports/requests.csv", get(reports::export_csv))
        .route("/api/reports/requests.html", get(reports::export_html))
        // Activity
        .route("/api/activity", get(activity::my_activity))
        .route("/api/admin/activity", get(activity::all_activity))
}

/// Build the REST API router with rate limiting applied.
pub fn api_router_with_rate_limit(
    rate_limit: crate::rate_limit::RateLimitState,
) -> Router<AppState> {
    api_router().layer(axum::middleware::from_fn_with_state(
        rate_limit,
        crate::rate_limit::rate_limit_middleware,
    ))
}
