use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use shared_types::{
    attachment_object_key, AppError, AttachmentUrlResponse, InitAttachmentRequest,
    InitAttachmentResponse, Message, MessageListParams, PostMessageRequest, RequestAttachment,
};

use crate::auth::extractors::AuthRequired;
use crate::config::feature_flags;
use crate::error_convert::ValidateRequest;
use crate::provider::MaybeProvider;
use crate::rest::parse_uuid;
use crate::rest::requests::load_for_party;
use crate::storage::{ObjectStore, S3ObjectStore};

// ---------------------------------------------------------------------------
// POST /api/requests/{id}/messages
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/requests/{id}/messages",
    params(("id" = String, Path, description = "Request UUID")),
    request_body = PostMessageRequest,
    responses(
        (status = 201, description = "Message posted", body = Message),
        (status = 404, description = "Request not found", body = AppError)
    ),
    tag = "messages"
)]
pub async fn post_message(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    MaybeProvider(provider): MaybeProvider,
    Path(id): Path<String>,
    Json(body): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    body.validate_request()?;
    let (request, party) = load_for_party(&pool, &id, Some(&claims), provider).await?;

    let message =
        crate::repo::messages::create(&pool, request.id, claims.sub, party.role(), &body.body).await?;
    tracing::debug!(request_id = %request.id, role = party.role(), "Message posted");

    Ok((StatusCode::CREATED, Json(message)))
}

// ---------------------------------------------------------------------------
// GET /api/requests/{id}/messages
// ---------------------------------------------------------------------------

/// Conversation on a request. Pass `after` to poll for new messages only.
#[utoipa::path(
    get,
    path = "/api/requests/{id}/messages",
    params(("id" = String, Path, description = "Request UUID"), MessageListParams),
    responses((status = 200, description = "Messages, oldest first", body = Vec<Message>)),
    tag = "messages"
)]
pub async fn list_messages(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    MaybeProvider(provider): MaybeProvider,
    Path(id): Path<String>,
    Query(params): Query<MessageListParams>,
) -> Result<Json<Vec<Message>>, AppError> {
    let (request, _) = load_for_party(&pool, &id, Some(&claims), provider).await?;
    let messages = crate::repo::messages::list(&pool, request.id, params.after, params.after_id).await?;
    Ok(Json(messages))
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

fn object_store() -> Result<S3ObjectStore, AppError> {
    if !feature_flags().s3 {
        return Err(AppError::bad_request("File attachments are not enabled"));
    }
    S3ObjectStore::from_env()
}

/// POST /api/requests/{id}/attachments
///
/// Record the attachment and hand back a presigned upload URL.
#[utoipa::path(
    post,
    path = "/api/requests/{id}/attachments",
    params(("id" = String, Path, description = "Request UUID")),
    request_body = InitAttachmentRequest,
    responses(
        (status = 201, description = "Upload initiated", body = InitAttachmentResponse),
        (status = 400, description = "Attachments disabled", body = AppError),
        (status = 404, description = "Request not found", body = AppError)
    ),
    tag = "messages"
)]
pub async fn init_attachment(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    MaybeProvider(provider): MaybeProvider,
    Path(id): Path<String>,
    Json(body): Json<InitAttachmentRequest>,
) -> Result<(StatusCode, Json<InitAttachmentResponse>), AppError> {
    body.validate_request()?;
    let store = object_store()?;
    let (request, _) = load_for_party(&pool, &id, Some(&claims), provider).await?;

    let attachment_id = Uuid::new_v4();
    let object_key = attachment_object_key(request.id, attachment_id, &body.file_name);

    let (upload_url, required_headers) = store
        .presign_put(&object_key, &body.content_type)
        .await
        .map_err(|e| AppError::internal(format!("Failed to generate presigned URL: {e}")))?;

    let attachment = crate::repo::messages::create_attachment(
        &pool,
        &RequestAttachment {
            id: attachment_id,
            request_id: request.id,
            uploaded_by: claims.sub,
            file_name: body.file_name.trim().to_string(),
            content_type: body.content_type,
            object_key: object_key.clone(),
            created_at: chrono::Utc::now(),
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(InitAttachmentResponse {
            attachment_id: attachment.id.to_string(),
            object_key,
            upload_url,
            required_headers,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/requests/{id}/attachments",
    params(("id" = String, Path, description = "Request UUID")),
    responses((status = 200, description = "Attachments", body = Vec<RequestAttachment>)),
    tag = "messages"
)]
pub async fn list_attachments(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    MaybeProvider(provider): MaybeProvider,
    Path(id): Path<String>,
) -> Result<Json<Vec<RequestAttachment>>, AppError> {
    let (request, _) = load_for_party(&pool, &id, Some(&claims), provider).await?;
    let rows = crate::repo::messages::list_attachments(&pool, request.id).await?;
    Ok(Json(rows))
}

/// GET /api/requests/{id}/attachments/{attachment_id}/download
#[utoipa::path(
    get,
    path = "/api/requests/{id}/attachments/{attachment_id}/download",
    params(
        ("id" = String, Path, description = "Request UUID"),
        ("attachment_id" = String, Path, description = "Attachment UUID")
    ),
    responses(
        (status = 200, description = "Presigned download URL", body = AttachmentUrlResponse),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "messages"
)]
pub async fn download_attachment(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    MaybeProvider(provider): MaybeProvider,
    Path((id, attachment_id)): Path<(String, String)>,
) -> Result<Json<AttachmentUrlResponse>, AppError> {
    let store = object_store()?;
    let (request, _) = load_for_party(&pool, &id, Some(&claims), provider).await?;
    let attachment_id = parse_uuid(&attachment_id, "attachment_id")?;

    let attachment = crate::repo::messages::list_attachments(&pool, request.id)
        .await?
        .into_iter()
        .find(|a| a.id == attachment_id)
        .ok_or_else(|| AppError::not_found(format!("Attachment {attachment_id} not found")))?;

    let url = store
        .presign_get(&attachment.object_key)
        .await
        .map_err(|e| AppError::internal(format!("Failed to generate download URL: {e}")))?;

    Ok(Json(AttachmentUrlResponse {
        url,
        file_name: attachment.file_name,
    }))
}
