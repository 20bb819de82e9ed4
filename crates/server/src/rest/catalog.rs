use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};

use shared_types::{
    build_catalog_tree, filter_services, AppError, CategoryNode, CreateCategoryRequest,
    CreateLegalServiceRequest, CreatePathRequest, CreateSubcategoryRequest, LegalService,
    PathListParams, ServiceCategory, ServiceFilter, ServicePath, ServiceSubcategory,
    SubcategoryListParams,
};

use crate::auth::extractors::AdminRequired;
use crate::error_convert::ValidateRequest;
use crate::provider::MaybeProvider;

// ---------------------------------------------------------------------------
// GET /api/catalog/categories
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/catalog/categories",
    responses((status = 200, description = "Categories", body = Vec<ServiceCategory>)),
    tag = "catalog"
)]
pub async fn list_categories(
    State(pool): State<Pool<Postgres>>,
) -> Result<Json<Vec<ServiceCategory>>, AppError> {
    Ok(Json(crate::repo::catalog::list_categories(&pool).await?))
}

// ---------------------------------------------------------------------------
// GET /api/catalog/subcategories
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/catalog/subcategories",
    params(SubcategoryListParams),
    responses((status = 200, description = "Subcategories", body = Vec<ServiceSubcategory>)),
    tag = "catalog"
)]
pub async fn list_subcategories(
    State(pool): State<Pool<Postgres>>,
    Query(params): Query<SubcategoryListParams>,
) -> Result<Json<Vec<ServiceSubcategory>>, AppError> {
    Ok(Json(
        crate::repo::catalog::list_subcategories(&pool, params.category_id).await?,
    ))
}

// ---------------------------------------------------------------------------
// GET /api/catalog/paths
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/catalog/paths",
    params(PathListParams),
    responses((status = 200, description = "Service paths", body = Vec<ServicePath>)),
    tag = "catalog"
)]
pub async fn list_paths(
    State(pool): State<Pool<Postgres>>,
    Query(params): Query<PathListParams>,
) -> Result<Json<Vec<ServicePath>>, AppError> {
    Ok(Json(
        crate::repo::catalog::list_paths(&pool, params.subcategory_id).await?,
    ))
}

// ---------------------------------------------------------------------------
// GET /api/catalog/services
// ---------------------------------------------------------------------------

/// Active leaf services, filtered by branch and search text.
///
/// `mine_only=true` needs a provider scope and keeps only the services that
/// provider has enabled.
#[utoipa::path(
    get,
    path = "/api/catalog/services",
    params(
        ServiceFilter,
        ("X-Provider-Type" = Option<String>, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = Option<String>, Header, description = "Provider UUID")
    ),
    responses(
        (status = 200, description = "Matching services", body = Vec<LegalService>),
        (status = 400, description = "mine_only without a provider scope", body = AppError)
    ),
    tag = "catalog"
)]
pub async fn list_services(
    State(pool): State<Pool<Postgres>>,
    MaybeProvider(provider): MaybeProvider,
    Query(filter): Query<ServiceFilter>,
) -> Result<Json<Vec<LegalService>>, AppError> {
    let services: Vec<LegalService> = crate::repo::catalog::list_services(&pool)
        .await?
        .into_iter()
        .filter(|s| s.is_active)
        .collect();

    let provider_rows = match (filter.mine_only, provider) {
        (false, _) => Vec::new(),
        (true, Some(p)) => crate::repo::provider_services::list_for_provider(&pool, p).await?,
        (true, None) => {
            return Err(AppError::bad_request(
                "mine_only requires X-Provider-Type and X-Provider-Id",
            ))
        }
    };

    let matched = filter_services(&services, &provider_rows, &filter)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(matched))
}

// ---------------------------------------------------------------------------
// GET /api/catalog/tree
// ---------------------------------------------------------------------------

/// The whole catalog nested category → subcategory → path → service.
#[utoipa::path(
    get,
    path = "/api/catalog/tree",
    responses((status = 200, description = "Nested catalog", body = Vec<CategoryNode>)),
    tag = "catalog"
)]
pub async fn catalog_tree(
    State(pool): State<Pool<Postgres>>,
) -> Result<Json<Vec<CategoryNode>>, AppError> {
    let (categories, subcategories, paths, services) = tokio::try_join!(
        crate::repo::catalog::list_categories(&pool),
        crate::repo::catalog::list_subcategories(&pool, None),
        crate::repo::catalog::list_paths(&pool, None),
        crate::repo::catalog::list_services(&pool),
    )?;
    let services = services.into_iter().filter(|s| s.is_active).collect();
    Ok(Json(build_catalog_tree(categories, subcategories, paths, services)))
}

// ---------------------------------------------------------------------------
// POST /api/catalog/* (admin)
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/catalog/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ServiceCategory),
        (status = 403, description = "Admin only", body = AppError),
        (status = 409, description = "Duplicate name", body = AppError)
    ),
    tag = "catalog"
)]
pub async fn create_category(
    State(pool): State<Pool<Postgres>>,
    _admin: AdminRequired,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ServiceCategory>), AppError> {
    body.validate_request()?;
    let row = crate::repo::catalog::create_category(&pool, &body).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    post,
    path = "/api/catalog/subcategories",
    request_body = CreateSubcategoryRequest,
    responses(
        (status = 201, description = "Subcategory created", body = ServiceSubcategory),
        (status = 400, description = "Unknown category", body = AppError),
        (status = 403, description = "Admin only", body = AppError)
    ),
    tag = "catalog"
)]
pub async fn create_subcategory(
    State(pool): State<Pool<Postgres>>,
    _admin: AdminRequired,
    Json(body): Json<CreateSubcategoryRequest>,
) -> Result<(StatusCode, Json<ServiceSubcategory>), AppError> {
    body.validate_request()?;
    let row = crate::repo::catalog::create_subcategory(&pool, &body).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    post,
    path = "/api/catalog/paths",
    request_body = CreatePathRequest,
    responses(
        (status = 201, description = "Path created", body = ServicePath),
        (status = 400, description = "Unknown subcategory", body = AppError),
        (status = 403, description = "Admin only", body = AppError)
    ),
    tag = "catalog"
)]
pub async fn create_path(
    State(pool): State<Pool<Postgres>>,
    _admin: AdminRequired,
    Json(body): Json<CreatePathRequest>,
) -> Result<(StatusCode, Json<ServicePath>), AppError> {
    body.validate_request()?;
    let row = crate::repo::catalog::create_path(&pool, &body).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    post,
    path = "/api/catalog/services",
    request_body = CreateLegalServiceRequest,
    responses(
        (status = 201, description = "Service created", body = LegalService),
        (status = 400, description = "Unknown path", body = AppError),
        (status = 403, description = "Admin only", body = AppError)
    ),
    tag = "catalog"
)]
pub async fn create_service(
    State(pool): State<Pool<Postgres>>,
    _admin: AdminRequired,
    Json(body): Json<CreateLegalServiceRequest>,
) -> Result<(StatusCode, Json<LegalService>), AppError> {
    body.validate_request()?;
    let row = crate::repo::catalog::create_service(&pool, &body).await?;
    Ok((StatusCode::CREATED, Json(row)))
}
