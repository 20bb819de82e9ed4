use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::{Pool, Postgres};

use shared_types::{
    normalize_pagination, AppError, CreateTicketRequest, PaginatedResponse, SupportTicket,
    TicketDetail, TicketReply, TicketReplyRequest, TicketStatus,
};

use crate::auth::extractors::{AdminRequired, AuthRequired};
use crate::auth::jwt::Claims;
use crate::error_convert::ValidateRequest;
use crate::rest::parse_uuid;

/// Admin queue filter.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct TicketQueueParams {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Owners see their own tickets; admins see all. Others get 404.
async fn load_ticket(pool: &Pool<Postgres>, claims: &Claims, raw_id: &str) -> Result<SupportTicket, AppError> {
    let id = parse_uuid(raw_id, "id")?;
    crate::repo::support::find(pool, id)
        .await?
        .filter(|t| claims.is_admin() || t.user_id == claims.sub)
        .ok_or_else(|| AppError::not_found(format!("Ticket {id} not found")))
}

#[utoipa::path(
    post,
    path = "/api/support/tickets",
    request_body = CreateTicketRequest,
    responses((status = 201, description = "Ticket opened", body = SupportTicket)),
    tag = "support"
)]
pub async fn create_ticket(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Json(body): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<SupportTicket>), AppError> {
    body.validate_request()?;
    let ticket = crate::repo::support::create(&pool, claims.sub, &body).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

#[utoipa::path(
    get,
    path = "/api/support/tickets",
    responses((status = 200, description = "Caller's tickets", body = Vec<SupportTicket>)),
    tag = "support"
)]
pub async fn list_my_tickets(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
) -> Result<Json<Vec<SupportTicket>>, AppError> {
    Ok(Json(crate::repo::support::list_for_user(&pool, claims.sub).await?))
}

#[utoipa::path(
    get,
    path = "/api/support/tickets/{id}",
    params(("id" = String, Path, description = "Ticket UUID")),
    responses(
        (status = 200, description = "Ticket with replies", body = TicketDetail),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "support"
)]
pub async fn get_ticket(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<TicketDetail>, AppError> {
    let ticket = load_ticket(&pool, &claims, &id).await?;
    let replies = crate::repo::support::replies(&pool, ticket.id).await?;
    Ok(Json(TicketDetail { ticket, replies }))
}

/// A staff reply marks the ticket answered; an owner reply reopens it.
#[utoipa::path(
    post,
    path = "/api/support/tickets/{id}/replies",
    params(("id" = String, Path, description = "Ticket UUID")),
    request_body = TicketReplyRequest,
    responses(
        (status = 201, description = "Reply added", body = TicketReply),
        (status = 409, description = "Ticket is closed", body = AppError)
    ),
    tag = "support"
)]
pub async fn reply_ticket(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Path(id): Path<String>,
    Json(body): Json<TicketReplyRequest>,
) -> Result<(StatusCode, Json<TicketReply>), AppError> {
    body.validate_request()?;
    let ticket = load_ticket(&pool, &claims, &id).await?;

    let is_staff = claims.is_admin();
    let closed = || AppError::conflict("Ticket is closed");
    let next = TicketStatus::from_str_opt(&ticket.status)
        .and_then(|s| s.after_reply(is_staff))
        .ok_or_else(closed)?;

    let reply = crate::repo::support::reply(&pool, ticket.id, claims.sub, is_staff, &body.body, next)
        .await?
        .ok_or_else(closed)?;

    if is_staff && ticket.user_id != claims.sub {
        let link = format!("/support/{}", ticket.id);
        let notice = shared_types::NewNotification {
            user_id: ticket.user_id,
            title: "Support replied".to_string(),
            body: ticket.subject.clone(),
            kind: "support.reply",
            link: Some(link),
        };
        if let Err(e) = crate::repo::notifications::insert(&pool, &notice).await {
            tracing::warn!(ticket_id = %ticket.id, error = %e.message, "Support reply notification failed");
        }
    }

    Ok((StatusCode::CREATED, Json(reply)))
}

#[utoipa::path(
    post,
    path = "/api/support/tickets/{id}/close",
    params(("id" = String, Path, description = "Ticket UUID")),
    responses(
        (status = 200, description = "Ticket closed", body = SupportTicket),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "support"
)]
pub async fn close_ticket(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<SupportTicket>, AppError> {
    let ticket = load_ticket(&pool, &claims, &id).await?;
    crate::repo::support::close(&pool, ticket.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Ticket {} not found", ticket.id)))
}

// ---------------------------------------------------------------------------
// GET /api/admin/support/tickets
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/admin/support/tickets",
    params(TicketQueueParams),
    responses(
        (status = 200, description = "Ticket queue", body = PaginatedResponse<SupportTicket>),
        (status = 403, description = "Admin account required", body = AppError)
    ),
    tag = "support"
)]
pub async fn admin_queue(
    State(pool): State<Pool<Postgres>>,
    AdminRequired(_admin): AdminRequired,
    Query(params): Query<TicketQueueParams>,
) -> Result<Json<PaginatedResponse<SupportTicket>>, AppError> {
    let status = params
        .status
        .as_deref()
        .map(|s| {
            TicketStatus::from_str_opt(s)
                .ok_or_else(|| AppError::bad_request(format!("Unknown ticket status: {s}")))
        })
        .transpose()?;
    let (page, limit) = normalize_pagination(params.page, params.limit);

    let (rows, total) = crate::repo::support::list_all(&pool, status, page, limit).await?;
    Ok(Json(PaginatedResponse::new(rows, page, limit, total)))
}
