use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use shared_types::{
    summarize_requests, AppError, ProviderRef, ProviderSummary, ReportParams, ReportRow,
};

use crate::export::{attachment_headers, requests_csv, requests_html};
use crate::provider::ProviderScope;

async fn load_report(
    pool: &Pool<Postgres>,
    provider: ProviderRef,
    params: &ReportParams,
) -> Result<(ProviderSummary, Vec<ReportRow>), AppError> {
    if let (Some(from), Some(to)) = (params.from, params.to) {
        if to <= from {
            return Err(AppError::bad_request("`to` must be after `from`"));
        }
    }

    let requests =
        crate::repo::requests::list_in_window(pool, provider, params.from, params.to).await?;
    let ids: Vec<Uuid> = requests.iter().map(|r| r.id).collect();
    let minutes = crate::repo::time_logs::total_minutes(pool, provider, Some(&ids)).await?;

    let summary = summarize_requests(&requests, minutes);
    let rows = requests.iter().map(ReportRow::from).collect();
    Ok((summary, rows))
}

#[utoipa::path(
    get,
    path = "/api/reports/summary",
    params(
        ReportParams,
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    responses((status = 200, description = "Provider summary", body = ProviderSummary)),
    tag = "reports"
)]
pub async fn summary(
    State(pool): State<Pool<Postgres>>,
    scope: ProviderScope,
    Query(params): Query<ReportParams>,
) -> Result<Json<ProviderSummary>, AppError> {
    let (summary, _) = load_report(&pool, scope.0, &params).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/reports/requests.csv",
    params(
        ReportParams,
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    responses((status = 200, description = "CSV export", content_type = "text/csv", body = String)),
    tag = "reports"
)]
pub async fn export_csv(
    State(pool): State<Pool<Postgres>>,
    scope: ProviderScope,
    Query(params): Query<ReportParams>,
) -> Result<(HeaderMap, String), AppError> {
    let (_, rows) = load_report(&pool, scope.0, &params).await?;
    let csv = requests_csv(&rows)?;
    Ok((attachment_headers("text/csv; charset=utf-8", "requests.csv"), csv))
}

/// Printable page; the browser handles PDF output.
#[utoipa::path(
    get,
    path = "/api/reports/requests.html",
    params(
        ReportParams,
        ("X-Provider-Type" = String, Header, description = "partner, legal_arm or lawyer"),
        ("X-Provider-Id" = String, Header, description = "Provider UUID")
    ),
    responses((status = 200, description = "Printable report", content_type = "text/html", body = String)),
    tag = "reports"
)]
pub async fn export_html(
    State(pool): State<Pool<Postgres>>,
    scope: ProviderScope,
    Query(params): Query<ReportParams>,
) -> Result<(HeaderMap, String), AppError> {
    let (summary, rows) = load_report(&pool, scope.0, &params).await?;
    let html = requests_html("Service requests report", &summary, &rows);
    Ok((attachment_headers("text/html; charset=utf-8", "requests.html"), html))
}
