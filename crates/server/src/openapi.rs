use axum::Router;
use shared_types::{
    // Accounts
    AccountType, AppError, AppErrorKind, AuthResponse, LinkProviderRequest, LoginRequest,
    RegisterRequest, User,
    // OTP
    OtpChannel, SendOtpRequest, VerifyOtpRequest, VerifyOtpResponse,
    // Common
    MessageResponse, PaginationMeta, ProviderRef, ProviderType, SetStatusRequest,
    // Catalog
    BulkEnableRequest, BulkEnableResponse, BulkScope, CategoryNode, CreateCategoryRequest,
    CreateLegalServiceRequest, CreatePathRequest, CreateSubcategoryRequest, LegalService,
    PathNode, ServiceCategory, ServicePath, ServiceSubcategory, SubcategoryNode,
    // Pricing & provider services
    CommissionPolicy, CommissionPreview, PricingInput, PricingType, ProviderService,
    ProviderServiceResponse, ValidatedPricing,
    // Requests & messages
    AttachmentUrlResponse, CreateServiceRequestRequest, InitAttachmentRequest,
    InitAttachmentResponse, Message, PostMessageRequest, RequestAttachment, RequestPriority,
    RequestStatus, ServiceRequest, ServiceRequestResponse, UpdateRequestStatusRequest,
    // Work management
    CalendarEvent, CaseFile, CreateCalendarEventRequest, CreateCaseRequest, CreateTimeLogRequest,
    TimeLog, TimeLogListResponse, UpdateCaseRequest,
    // Organisations & lawyers
    CreateLegalArmRequest, CreatePartnerEmployeeRequest, CreatePartnerRequest,
    CreateReferenceRequest, CreateRoleRequest, Department, JobTitle, Lawyer, LegalArm,
    LegalArmRole, Partner, PartnerEmployee, PartnerRole, RegisterLawyerRequest,
    RegisterLawyerResponse,
    // Notifications, support, settings
    CreateTicketRequest, MarkAllReadResponse, Notification, RegisterDeviceRequest, SupportTicket,
    TicketDetail, TicketReply, TicketReplyRequest, TicketStatus, UnreadCountResponse,
    UpdateSettingsRequest, UserDevice, UserSettings,
    // Membership & wallet
    AddMemberRequest, CreateWithdrawalRequest, Member, RedeemReferralRequest,
    RedeemReferralResponse, ReferralCodeResponse, SubscribeRequest, Subscription,
    SubscriptionPlan, UserPoints, WalletBalance, WithdrawalRequest,
    // Reports & activity
    ActivityLog, ProviderSummary,
};
use sqlx::{Pool, Postgres};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::db::AppState;
use crate::health;
use crate::rest;

/// OpenAPI documentation for the API.
#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        rest::auth::register,
        rest::auth::login,
        rest::auth::logout,
        rest::auth::me,
        rest::auth::link_provider,
        // OTP
        rest::otp::send_otp,
        rest::otp::verify_otp,
        // Catalog
        rest::catalog::list_categories,
        rest::catalog::list_subcategories,
        rest::catalog::list_paths,
        rest::catalog::list_services,
        rest::catalog::catalog_tree,
        rest::catalog::create_category,
        rest::catalog::create_subcategory,
        rest::catalog::create_path,
        rest::catalog::create_service,
        // Provider services
        rest::provider_services::list_mine,
        rest::provider_services::enable,
        rest::provider_services::disable,
        rest::provider_services::bulk_enable,
        rest::provider_services::commission_preview,
        rest::provider_services::get_clipboard,
        rest::provider_services::copy_price,
        // Requests
        rest::requests::create_request,
        rest::requests::list_mine,
        rest::requests::list_for_provider,
        rest::requests::list_overdue,
        rest::requests::get_request,
        rest::requests::update_status,
        // Messages
        rest::messages::post_message,
        rest::messages::list_messages,
        rest::messages::init_attachment,
        rest::messages::list_attachments,
        rest::messages::download_attachment,
        // Time logs
        rest::time_logs::create_time_log,
        rest::time_logs::list_time_logs,
        // Cases & calendar
        rest::cases::create_case,
        rest::cases::list_cases,
        rest::cases::list_overdue_cases,
        rest::cases::get_case,
        rest::cases::update_case,
        rest::cases::close_case,
        rest::cases::create_event,
        rest::cases::list_events,
        rest::cases::delete_event,
        // Organisations
        rest::organizations::create_partner,
        rest::organizations::list_partners,
        rest::organizations::get_partner,
        rest::organizations::set_partner_status,
        rest::organizations::create_partner_role,
        rest::organizations::list_partner_roles,
        rest::organizations::create_employee,
        rest::organizations::list_employees,
        rest::organizations::set_employee_status,
        rest::organizations::create_legal_arm,
        rest::organizations::list_legal_arms,
        rest::organizations::set_legal_arm_status,
        rest::organizations::create_legal_arm_role,
        rest::organizations::list_legal_arm_roles,
        rest::organizations::create_department,
        rest::organizations::list_departments,
        rest::organizations::create_job_title,
        rest::organizations::list_job_titles,
        // Lawyers
        rest::lawyers::register_lawyer,
        rest::lawyers::list_lawyers,
        rest::lawyers::get_lawyer,
        rest::lawyers::set_lawyer_status,
        // Notifications
        rest::notifications::list_notifications,
        rest::notifications::unread_count,
        rest::notifications::mark_read,
        rest::notifications::mark_all_read,
        // Support
        rest::support::create_ticket,
        rest::support::list_my_tickets,
        rest::support::get_ticket,
        rest::support::reply_ticket,
        rest::support::close_ticket,
        rest::support::admin_queue,
        // Settings
        rest::settings::get_settings,
        rest::settings::update_settings,
        rest::settings::register_device,
        rest::settings::list_devices,
        rest::settings::delete_device,
        // Membership
        rest::membership::subscribe,
        rest::membership::current_subscription,
        rest::membership::add_member,
        rest::membership::list_members,
        rest::membership::remove_member,
        rest::membership::get_points,
        rest::membership::my_referral_code,
        rest::membership::redeem_referral,
        // Wallet
        rest::wallet::get_balance,
        rest::wallet::request_withdrawal,
        rest::wallet::list_withdrawals,
        // Reports
        rest::reports::summary,
        rest::reports::export_csv,
        rest::reports::export_html,
        // Activity
        rest::activity::my_activity,
        rest::activity::all_activity,
        // Health
        health::health_check,
    ),
    components(schemas(
        AppError, AppErrorKind, MessageResponse, PaginationMeta, ProviderRef, ProviderType,
        SetStatusRequest,
        AccountType, User, RegisterRequest, LoginRequest, AuthResponse, LinkProviderRequest,
        OtpChannel, SendOtpRequest, VerifyOtpRequest, VerifyOtpResponse,
        ServiceCategory, ServiceSubcategory, ServicePath, LegalService, CreateCategoryRequest,
        CreateSubcategoryRequest, CreatePathRequest, CreateLegalServiceRequest, CategoryNode,
        SubcategoryNode, PathNode, BulkScope, BulkEnableRequest, BulkEnableResponse,
        PricingType, PricingInput, ValidatedPricing, CommissionPolicy, CommissionPreview,
        ProviderService, ProviderServiceResponse,
        RequestStatus, RequestPriority, ServiceRequest, ServiceRequestResponse,
        CreateServiceRequestRequest, UpdateRequestStatusRequest, Message, PostMessageRequest,
        RequestAttachment, InitAttachmentRequest, InitAttachmentResponse, AttachmentUrlResponse,
        CaseFile, CreateCaseRequest, UpdateCaseRequest, CalendarEvent, CreateCalendarEventRequest,
        TimeLog, CreateTimeLogRequest, TimeLogListResponse,
        Partner, CreatePartnerRequest, PartnerRole, CreateRoleRequest, PartnerEmployee,
        CreatePartnerEmployeeRequest, LegalArm, CreateLegalArmRequest, LegalArmRole, Department,
        JobTitle, CreateReferenceRequest, Lawyer, RegisterLawyerRequest, RegisterLawyerResponse,
        Notification, UnreadCountResponse, MarkAllReadResponse,
        TicketStatus, SupportTicket, TicketReply, TicketDetail, CreateTicketRequest,
        TicketReplyRequest,
        UserSettings, UpdateSettingsRequest, UserDevice, RegisterDeviceRequest,
        SubscriptionPlan, Subscription, SubscribeRequest, Member, AddMemberRequest, UserPoints,
        ReferralCodeResponse, RedeemReferralRequest, RedeemReferralResponse,
        WalletBalance, WithdrawalRequest, CreateWithdrawalRequest,
        ProviderSummary, ActivityLog,
        health::HealthResponse,
    )),
    tags(
        (name = "auth", description = "Registration, login and sessions"),
        (name = "otp", description = "One-time verification codes"),
        (name = "catalog", description = "Service catalog: categories, subcategories, paths and services"),
        (name = "provider-services", description = "Enabling services and setting prices"),
        (name = "requests", description = "Service requests and their lifecycle"),
        (name = "messages", description = "Request conversations and attachments"),
        (name = "time-logs", description = "Time tracking against requests"),
        (name = "cases", description = "Provider case files"),
        (name = "calendar", description = "Provider calendar"),
        (name = "organizations", description = "Partners, legal arms, staff and reference data"),
        (name = "lawyers", description = "Lawyer registration and directory"),
        (name = "notifications", description = "In-app notifications"),
        (name = "support", description = "Support tickets"),
        (name = "settings", description = "User settings and devices"),
        (name = "membership", description = "Subscriptions, family members, points and referrals"),
        (name = "wallet", description = "Provider earnings and withdrawals"),
        (name = "reports", description = "Provider reports and exports"),
        (name = "activity", description = "Audit trail"),
        (name = "health", description = "Health check endpoint")
    ),
    info(
        title = "Wakeel API",
        description = "Legal services marketplace API",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

/// Build an Axum router that serves the API docs at `/docs`,
/// the REST API at `/api/*` and the health check at `/health`.
pub fn api_router(pool: Pool<Postgres>) -> Router {
    let state = AppState::new(pool);
    let rate_limit = crate::rate_limit::RateLimitState::from_env();

    Router::new()
        .merge(rest::api_router_with_rate_limit(rate_limit))
        .route("/health", axum::routing::get(health::health_check))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
}
