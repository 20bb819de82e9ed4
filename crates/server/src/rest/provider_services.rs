use axum::{
    extract::{Path, Query, State},
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    plan_bulk_enable, validate_pricing, AppError, BulkEnableRequest, BulkEnableResponse,
    CommissionPreview, CommissionPreviewParams, NewActivity, PricingInput,
    ProviderServiceResponse, ValidatedPricing,
};

use crate::auth::extractors::AuthRequired;
use crate::clipboard::PricingClipboard;
use crate::config::commission_policy;
use crate::provider::ProviderScope;
use crate::rest::parse_uuid;

// ---------------------------------------------------------------------------
// GET /api/provider-services
// ---------------------------------------------------------------------------

/// Every service the provider has enabled or disabled, with pricing.
#[utoipa::path(
    get,
    path = "/api/provider-services",
    params(
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    responses((status = 200, description = "Provider services", body = Vec<ProviderServiceResponse>)),
    tag = "provider-services"
)]
pub async fn list_mine(
    State(pool): State<Pool<Postgres>>,
    scope: ProviderScope,
) -> Result<Json<Vec<ProviderServiceResponse>>, AppError> {
    let rows = crate::repo::provider_services::list_for_provider(&pool, scope.0).await?;
    Ok(Json(rows.into_iter().map(ProviderServiceResponse::from).collect()))
}

// ---------------------------------------------------------------------------
// PUT /api/provider-services/{service_id}
// ---------------------------------------------------------------------------

/// Enable a leaf service, or change its pricing if already enabled.
#[utoipa::path(
    put,
    path = "/api/provider-services/{service_id}",
    params(
        ("service_id" = String, Path, description = "Leaf service UUID"),
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    request_body = PricingInput,
    responses(
        (status = 200, description = "Service enabled", body = ProviderServiceResponse),
        (status = 401, description = "No session", body = AppError),
        (status = 403, description = "Session not linked to this provider", body = AppError),
        (status = 404, description = "Unknown or inactive service", body = AppError),
        (status = 422, description = "Invalid pricing", body = AppError)
    ),
    tag = "provider-services"
)]
#[tracing::instrument(skip(pool, clipboard, claims, body), fields(provider = %scope.provider_id()))]
pub async fn enable(
    State(pool): State<Pool<Postgres>>,
    State(clipboard): State<PricingClipboard>,
    AuthRequired(claims): AuthRequired,
    scope: ProviderScope,
    Path(service_id): Path<String>,
    Json(body): Json<PricingInput>,
) -> Result<Json<ProviderServiceResponse>, AppError> {
    let pricing = validate_pricing(&body)?;
    let service_id = parse_uuid(&service_id, "service_id")?;

    let service = crate::repo::catalog::find_service(&pool, service_id)
        .await?
        .filter(|s| s.is_active)
        .ok_or_else(|| AppError::not_found(format!("Service {service_id} not found")))?;

    let rate = commission_policy().rate_for(scope.provider_type());
    let row =
        crate::repo::provider_services::upsert(&pool, scope.0, service.id, &pricing, rate).await?;
    clipboard.put(scope.0, pricing);

    crate::repo::activity::record(
        &pool,
        NewActivity {
            actor_id: Some(claims.sub),
            provider: Some(scope.0),
            action: "provider_service.enable",
            entity_type: "legal_service",
            entity_id: service.id.to_string(),
            details: serde_json::json!({
                "pricing_type": row.pricing_type,
                "commission_rate": row.commission_rate,
            }),
        },
    )
    .await;

    Ok(Json(ProviderServiceResponse::from(row)))
}

// ---------------------------------------------------------------------------
// DELETE /api/provider-services/{service_id}
// ---------------------------------------------------------------------------

/// Disable a service. The row is kept with `is_active = false`.
#[utoipa::path(
    delete,
    path = "/api/provider-services/{service_id}",
    params(
        ("service_id" = String, Path, description = "Leaf service UUID"),
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    responses(
        (status = 200, description = "Service disabled", body = ProviderServiceResponse),
        (status = 404, description = "Service was never enabled", body = AppError)
    ),
    tag = "provider-services"
)]
pub async fn disable(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    scope: ProviderScope,
    Path(service_id): Path<String>,
) -> Result<Json<ProviderServiceResponse>, AppError> {
    let service_id = parse_uuid(&service_id, "service_id")?;
    let row = crate::repo::provider_services::disable(&pool, scope.0, service_id)
        .await?
        .ok_or_else(|| AppError::not_found("Service is not enabled for this provider"))?;

    crate::repo::activity::record(
        &pool,
        NewActivity {
            actor_id: Some(claims.sub),
            provider: Some(scope.0),
            action: "provider_service.disable",
            entity_type: "legal_service",
            entity_id: service_id.to_string(),
            details: serde_json::Value::Null,
        },
    )
    .await;

    Ok(Json(ProviderServiceResponse::from(row)))
}

// ---------------------------------------------------------------------------
// POST /api/provider-services/bulk-enable
// ---------------------------------------------------------------------------

/// Enable every active service under a category, subcategory or path.
/// Newly enabled services get quote pricing.
#[utoipa::path(
    post,
    path = "/api/provider-services/bulk-enable",
    params(
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    request_body = BulkEnableRequest,
    responses((status = 200, description = "Bulk enable result", body = BulkEnableResponse)),
    tag = "provider-services"
)]
#[tracing::instrument(skip(pool, claims, body), fields(provider = %scope.provider_id(), branch = body.scope.as_str()))]
pub async fn bulk_enable(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    scope: ProviderScope,
    Json(body): Json<BulkEnableRequest>,
) -> Result<Json<BulkEnableResponse>, AppError> {
    let (services, rows) = tokio::try_join!(
        crate::repo::catalog::list_services(&pool),
        crate::repo::provider_services::list_for_provider(&pool, scope.0),
    )?;

    let plan = plan_bulk_enable(&services, &rows, body.scope, body.id);
    let rate = commission_policy().rate_for(scope.provider_type());
    let written =
        crate::repo::provider_services::bulk_enable(&pool, scope.0, &plan.to_enable, rate).await?;

    tracing::info!(
        total = plan.total_in_branch,
        already_enabled = plan.already_enabled,
        enabled = written,
        "Bulk enable finished"
    );

    if written > 0 {
        crate::repo::activity::record(
            &pool,
            NewActivity {
                actor_id: Some(claims.sub),
                provider: Some(scope.0),
                action: "provider_service.bulk_enable",
                entity_type: body.scope.as_str(),
                entity_id: body.id.to_string(),
                details: serde_json::json!({ "enabled": written }),
            },
        )
        .await;
    }

    Ok(Json(BulkEnableResponse {
        scope: body.scope,
        total_in_branch: plan.total_in_branch,
        already_enabled: plan.already_enabled,
        enabled: written as usize,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/provider-services/commission-preview
// ---------------------------------------------------------------------------

/// Split a price into platform commission and provider share.
#[utoipa::path(
    get,
    path = "/api/provider-services/commission-preview",
    params(
        CommissionPreviewParams,
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    responses(
        (status = 200, description = "Commission breakdown", body = CommissionPreview),
        (status = 422, description = "Price must be positive", body = AppError)
    ),
    tag = "provider-services"
)]
pub async fn commission_preview(
    scope: ProviderScope,
    Query(params): Query<CommissionPreviewParams>,
) -> Result<Json<CommissionPreview>, AppError> {
    if !params.price.is_finite() || params.price <= 0.0 {
        return Err(AppError::invalid_field("price", "Price must be greater than zero"));
    }
    let rate = commission_policy().rate_for(scope.provider_type());
    Ok(Json(CommissionPreview::compute(params.price, rate)))
}

// ---------------------------------------------------------------------------
// GET/PUT /api/provider-services/clipboard
// ---------------------------------------------------------------------------

/// The pricing last saved or copied by this provider.
#[utoipa::path(
    get,
    path = "/api/provider-services/clipboard",
    params(
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    responses(
        (status = 200, description = "Copied pricing", body = ValidatedPricing),
        (status = 404, description = "Nothing copied yet", body = AppError)
    ),
    tag = "provider-services"
)]
pub async fn get_clipboard(
    State(clipboard): State<PricingClipboard>,
    scope: ProviderScope,
) -> Result<Json<ValidatedPricing>, AppError> {
    clipboard
        .get(&scope.0)
        .map(Json)
        .ok_or_else(|| AppError::not_found("No pricing has been copied"))
}

/// Copy a pricing shape so the next service can be pre-filled from it.
#[utoipa::path(
    put,
    path = "/api/provider-services/clipboard",
    params(
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    request_body = PricingInput,
    responses(
        (status = 200, description = "Pricing copied", body = ValidatedPricing),
        (status = 422, description = "Invalid pricing", body = AppError)
    ),
    tag = "provider-services"
)]
pub async fn copy_price(
    State(clipboard): State<PricingClipboard>,
    scope: ProviderScope,
    Json(body): Json<PricingInput>,
) -> Result<Json<ValidatedPricing>, AppError> {
    let pricing = validate_pricing(&body)?;
    clipboard.put(scope.0, pricing.clone());
    Ok(Json(pricing))
}
