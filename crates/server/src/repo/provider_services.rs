use shared_types::{AppError, PricingType, ProviderRef, ProviderService, ValidatedPricing};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

/// Every row for the provider, active or not.
pub async fn list_for_provider(
    pool: &Pool<Postgres>,
    provider: ProviderRef,
) -> Result<Vec<ProviderService>, AppError> {
    sqlx::query_as!(
        ProviderService,
        r#"
        SELECT id, provider_type, provider_id, service_id, pricing_type,
            price, min_price, max_price, estimated_duration,
            commission_rate, is_active, created_at, updated_at
        FROM provider_services
        WHERE provider_type = $1 AND provider_id = $2
        ORDER BY updated_at DESC
        "#,
        provider.provider_type.as_str(),
        provider.provider_id,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// The provider's row for a service, only if it is active.
pub async fn find_active(
    pool: &Pool<Postgres>,
    provider: ProviderRef,
    service_id: Uuid,
) -> Result<Option<ProviderService>, AppError> {
    sqlx::query_as!(
        ProviderService,
        r#"
        SELECT id, provider_type, provider_id, service_id, pricing_type,
            price, min_price, max_price, estimated_duration,
            commission_rate, is_active, created_at, updated_at
        FROM provider_services
        WHERE provider_type = $1 AND provider_id = $2 AND service_id = $3 AND is_active
        "#,
        provider.provider_type.as_str(),
        provider.provider_id,
        service_id,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Enable (or re-price) a service for a provider.
pub async fn upsert(
    pool: &Pool<Postgres>,
    provider: ProviderRef,
    service_id: Uuid,
    pricing: &ValidatedPricing,
    commission_rate: i32,
) -> Result<ProviderService, AppError> {
    sqlx::query_as!(
        ProviderService,
        r#"
        INSERT INTO provider_services (
            provider_type, provider_id, service_id, pricing_type,
            price, min_price, max_price, estimated_duration, commission_rate
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (provider_type, provider_id, service_id) DO UPDATE SET
            pricing_type = EXCLUDED.pricing_type,
            price = EXCLUDED.price,
            min_price = EXCLUDED.min_price,
            max_price = EXCLUDED.max_price,
            estimated_duration = EXCLUDED.estimated_duration,
            commission_rate = EXCLUDED.commission_rate,
            is_active = TRUE,
            updated_at = NOW()
        RETURNING id, provider_type, provider_id, service_id, pricing_type,
            price, min_price, max_price, estimated_duration,
            commission_rate, is_active, created_at, updated_at
        "#,
        provider.provider_type.as_str(),
        provider.provider_id,
        service_id,
        pricing.pricing_type.as_str(),
        pricing.price,
        pricing.min_price,
        pricing.max_price,
        pricing.estimated_duration.as_deref(),
        commission_rate,
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Soft-disable. Returns `None` if the provider never enabled the service.
pub async fn disable(
    pool: &Pool<Postgres>,
    provider: ProviderRef,
    service_id: Uuid,
) -> Result<Option<ProviderService>, AppError> {
    sqlx::query_as!(
        ProviderService,
        r#"
        UPDATE provider_services
        SET is_active = FALSE, updated_at = NOW()
        WHERE provider_type = $1 AND provider_id = $2 AND service_id = $3
        RETURNING id, provider_type, provider_id, service_id, pricing_type,
            price, min_price, max_price, estimated_duration,
            commission_rate, is_active, created_at, updated_at
        "#,
        provider.provider_type.as_str(),
        provider.provider_id,
        service_id,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Enable every listed service with quote pricing in one transaction.
///
/// An inactive row is reactivated and reset to plain quote pricing with no
/// duration estimate; an active one is left untouched. Returns the number of
/// rows written.
pub async fn bulk_enable(
    pool: &Pool<Postgres>,
    provider: ProviderRef,
    service_ids: &[Uuid],
    commission_rate: i32,
) -> Result<u64, AppError> {
    if service_ids.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await.map_err(SqlxErrorExt::into_app_error)?;
    let mut written = 0;

    for service_id in service_ids {
        let result = sqlx::query!(
            r#"
            INSERT INTO provider_services (
                provider_type, provider_id, service_id, pricing_type, commission_rate
            )
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (provider_type, provider_id, service_id) DO UPDATE SET
                pricing_type = EXCLUDED.pricing_type,
                price = NULL,
                min_price = NULL,
                max_price = NULL,
                estimated_duration = NULL,
                commission_rate = EXCLUDED.commission_rate,
                is_active = TRUE,
                updated_at = NOW()
            WHERE provider_services.is_active = FALSE
            "#,
            provider.provider_type.as_str(),
            provider.provider_id,
            service_id,
            PricingType::Quote.as_str(),
            commission_rate,
        )
        .execute(&mut *tx)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;
        written += result.rows_affected();
    }

    tx.commit().await.map_err(SqlxErrorExt::into_app_error)?;
    Ok(written)
}
