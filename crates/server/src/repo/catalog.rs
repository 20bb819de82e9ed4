use shared_types::{
    AppError, CreateCategoryRequest, CreateLegalServiceRequest, CreatePathRequest,
    CreateSubcategoryRequest, LegalService, ServiceCategory, ServicePath, ServiceSubcategory,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

pub async fn list_categories(pool: &Pool<Postgres>) -> Result<Vec<ServiceCategory>, AppError> {
    sqlx::query_as!(
        ServiceCategory,
        r#"
        SELECT id, name, name_ar, sort_order
        FROM service_categories
        ORDER BY sort_order, name
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_subcategories(
    pool: &Pool<Postgres>,
    category_id: Option<Uuid>,
) -> Result<Vec<ServiceSubcategory>, AppError> {
    sqlx::query_as!(
        ServiceSubcategory,
        r#"
        SELECT id, category_id, name, name_ar, sort_order
        FROM service_subcategories
        WHERE ($1::uuid IS NULL OR category_id = $1)
        ORDER BY sort_order, name
        "#,
        category_id,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_paths(
    pool: &Pool<Postgres>,
    subcategory_id: Option<Uuid>,
) -> Result<Vec<ServicePath>, AppError> {
    sqlx::query_as!(
        ServicePath,
        r#"
        SELECT id, subcategory_id, name, name_ar, sort_order
        FROM service_paths
        WHERE ($1::uuid IS NULL OR subcategory_id = $1)
        ORDER BY sort_order, name
        "#,
        subcategory_id,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// All leaf services, active or not, in display order. Each row carries
/// its full ancestry so filters need no extra lookups.
pub async fn list_services(pool: &Pool<Postgres>) -> Result<Vec<LegalService>, AppError> {
    sqlx::query_as!(
        LegalService,
        r#"
        SELECT s.id, s.path_id, p.subcategory_id, sc.category_id,
            s.name, s.description, s.is_active
        FROM legal_services s
        JOIN service_paths p ON p.id = s.path_id
        JOIN service_subcategories sc ON sc.id = p.subcategory_id
        ORDER BY s.name
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_service(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<LegalService>, AppError> {
    sqlx::query_as!(
        LegalService,
        r#"
        SELECT s.id, s.path_id, p.subcategory_id, sc.category_id,
            s.name, s.description, s.is_active
        FROM legal_services s
        JOIN service_paths p ON p.id = s.path_id
        JOIN service_subcategories sc ON sc.id = p.subcategory_id
        WHERE s.id = $1
        "#,
        id,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn create_category(
    pool: &Pool<Postgres>,
    req: &CreateCategoryRequest,
) -> Result<ServiceCategory, AppError> {
    sqlx::query_as!(
        ServiceCategory,
        r#"
        INSERT INTO service_categories (name, name_ar, sort_order)
        VALUES ($1, $2, $3)
        RETURNING id, name, name_ar, sort_order
        "#,
        req.name.trim(),
        req.name_ar.as_deref(),
        req.sort_order,
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn create_subcategory(
    pool: &Pool<Postgres>,
    req: &CreateSubcategoryRequest,
) -> Result<ServiceSubcategory, AppError> {
    sqlx::query_as!(
        ServiceSubcategory,
        r#"
        INSERT INTO service_subcategories (category_id, name, name_ar, sort_order)
        VALUES ($1, $2, $3, $4)
        RETURNING id, category_id, name, name_ar, sort_order
        "#,
        req.category_id,
        req.name.trim(),
        req.name_ar.as_deref(),
        req.sort_order,
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn create_path(pool: &Pool<Postgres>, req: &CreatePathRequest) -> Result<ServicePath, AppError> {
    sqlx::query_as!(
        ServicePath,
        r#"
        INSERT INTO service_paths (subcategory_id, name, name_ar, sort_order)
        VALUES ($1, $2, $3, $4)
        RETURNING id, subcategory_id, name, name_ar, sort_order
        "#,
        req.subcategory_id,
        req.name.trim(),
        req.name_ar.as_deref(),
        req.sort_order,
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn create_service(
    pool: &Pool<Postgres>,
    req: &CreateLegalServiceRequest,
) -> Result<LegalService, AppError> {
    let id = sqlx::query_scalar!(
        r#"
        INSERT INTO legal_services (path_id, name, description) VALUES ($1, $2, $3)
        RETURNING id
        "#,
        req.path_id,
        req.name.trim(),
        req.description.as_deref(),
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)?;

    find_service(pool, id)
        .await?
        .ok_or_else(|| AppError::internal("Created service could not be read back"))
}
