use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use shared_types::{
    AppError, CreateLegalArmRequest, CreatePartnerEmployeeRequest, CreatePartnerRequest,
    CreateReferenceRequest, CreateRoleRequest, Department, JobTitle, JobTitleListParams, LegalArm,
    LegalArmRole, NewActivity, Partner, PartnerEmployee, PartnerRole, ProviderRef, ProviderType,
    SetStatusRequest,
};

use crate::auth::extractors::{AdminRequired, AuthRequired};
use crate::auth::jwt::Claims;
use crate::error_convert::ValidateRequest;
use crate::rest::parse_uuid;

fn checked_status(body: &SetStatusRequest) -> Result<&str, AppError> {
    if !body.is_valid() {
        return Err(AppError::invalid_field("status", "Status must be active or inactive"));
    }
    Ok(body.status.as_str())
}

/// Admins manage every partner; a partner account manages only itself.
fn require_partner_manager(claims: &Claims, partner_id: Uuid) -> Result<(), AppError> {
    let own = ProviderRef {
        provider_type: ProviderType::Partner,
        provider_id: partner_id,
    };
    if claims.is_admin() || claims.provider() == Some(own) {
        Ok(())
    } else {
        Err(AppError::forbidden("Not allowed to manage this partner"))
    }
}

async fn ensure_partner(pool: &Pool<Postgres>, id: Uuid) -> Result<Partner, AppError> {
    crate::repo::organizations::find_partner(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Partner {id} not found")))
}

// ---------------------------------------------------------------------------
// Partners
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/admin/partners",
    request_body = CreatePartnerRequest,
    responses(
        (status = 201, description = "Partner created", body = Partner),
        (status = 403, description = "Admin account required", body = AppError)
    ),
    tag = "organizations"
)]
pub async fn create_partner(
    State(pool): State<Pool<Postgres>>,
    AdminRequired(claims): AdminRequired,
    Json(body): Json<CreatePartnerRequest>,
) -> Result<(StatusCode, Json<Partner>), AppError> {
    body.validate_request()?;
    let partner = crate::repo::organizations::create_partner(&pool, &body).await?;

    crate::repo::activity::record(
        &pool,
        NewActivity {
            actor_id: Some(claims.sub),
            provider: None,
            action: "partner.create",
            entity_type: "partner",
            entity_id: partner.id.to_string(),
            details: serde_json::json!({ "name": partner.name }),
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(partner)))
}

#[utoipa::path(
    get,
    path = "/api/partners",
    responses((status = 200, description = "Partners", body = Vec<Partner>)),
    tag = "organizations"
)]
pub async fn list_partners(
    State(pool): State<Pool<Postgres>>,
) -> Result<Json<Vec<Partner>>, AppError> {
    Ok(Json(crate::repo::organizations::list_partners(&pool).await?))
}

#[utoipa::path(
    get,
    path = "/api/partners/{id}",
    params(("id" = String, Path, description = "Partner UUID")),
    responses(
        (status = 200, description = "Partner", body = Partner),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "organizations"
)]
pub async fn get_partner(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<Partner>, AppError> {
    let id = parse_uuid(&id, "id")?;
    Ok(Json(ensure_partner(&pool, id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/admin/partners/{id}/status",
    params(("id" = String, Path, description = "Partner UUID")),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Partner),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "organizations"
)]
pub async fn set_partner_status(
    State(pool): State<Pool<Postgres>>,
    AdminRequired(_admin): AdminRequired,
    Path(id): Path<String>,
    Json(body): Json<SetStatusRequest>,
) -> Result<Json<Partner>, AppError> {
    let id = parse_uuid(&id, "id")?;
    let status = checked_status(&body)?;
    crate::repo::organizations::set_partner_status(&pool, id, status)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Partner {id} not found")))
}

// ---------------------------------------------------------------------------
// Partner roles and employees
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/partners/{id}/roles",
    params(("id" = String, Path, description = "Partner UUID")),
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created", body = PartnerRole),
        (status = 403, description = "Not allowed", body = AppError)
    ),
    tag = "organizations"
)]
pub async fn create_partner_role(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Path(id): Path<String>,
    Json(body): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<PartnerRole>), AppError> {
    body.validate_request()?;
    let partner_id = parse_uuid(&id, "id")?;
    require_partner_manager(&claims, partner_id)?;
    ensure_partner(&pool, partner_id).await?;

    let role = crate::repo::organizations::create_partner_role(&pool, partner_id, &body).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    get,
    path = "/api/partners/{id}/roles",
    params(("id" = String, Path, description = "Partner UUID")),
    responses((status = 200, description = "Roles", body = Vec<PartnerRole>)),
    tag = "organizations"
)]
pub async fn list_partner_roles(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<Vec<PartnerRole>>, AppError> {
    let partner_id = parse_uuid(&id, "id")?;
    require_partner_manager(&claims, partner_id)?;
    Ok(Json(crate::repo::organizations::list_partner_roles(&pool, partner_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/partners/{id}/employees",
    params(("id" = String, Path, description = "Partner UUID")),
    request_body = CreatePartnerEmployeeRequest,
    responses(
        (status = 201, description = "Employee added", body = PartnerEmployee),
        (status = 422, description = "Role does not belong to this partner", body = AppError)
    ),
    tag = "organizations"
)]
pub async fn create_employee(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Path(id): Path<String>,
    Json(body): Json<CreatePartnerEmployeeRequest>,
) -> Result<(StatusCode, Json<PartnerEmployee>), AppError> {
    body.validate_request()?;
    let partner_id = parse_uuid(&id, "id")?;
    require_partner_manager(&claims, partner_id)?;
    ensure_partner(&pool, partner_id).await?;

    if let Some(role_id) = body.role_id {
        if !crate::repo::organizations::partner_role_exists(&pool, partner_id, role_id).await? {
            return Err(AppError::invalid_field("role_id", "Role does not belong to this partner"));
        }
    }

    let employee = crate::repo::organizations::create_employee(&pool, partner_id, &body).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

#[utoipa::path(
    get,
    path = "/api/partners/{id}/employees",
    params(("id" = String, Path, description = "Partner UUID")),
    responses((status = 200, description = "Employees", body = Vec<PartnerEmployee>)),
    tag = "organizations"
)]
pub async fn list_employees(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Path(id): Path<String>,
) -> Result<Json<Vec<PartnerEmployee>>, AppError> {
    let partner_id = parse_uuid(&id, "id")?;
    require_partner_manager(&claims, partner_id)?;
    Ok(Json(crate::repo::organizations::list_employees(&pool, partner_id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/partners/{id}/employees/{employee_id}/status",
    params(
        ("id" = String, Path, description = "Partner UUID"),
        ("employee_id" = String, Path, description = "Employee UUID")
    ),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = PartnerEmployee),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "organizations"
)]
pub async fn set_employee_status(
    State(pool): State<Pool<Postgres>>,
    AuthRequired(claims): AuthRequired,
    Path((id, employee_id)): Path<(String, String)>,
    Json(body): Json<SetStatusRequest>,
) -> Result<Json<PartnerEmployee>, AppError> {
    let partner_id = parse_uuid(&id, "id")?;
    let employee_id = parse_uuid(&employee_id, "employee_id")?;
    require_partner_manager(&claims, partner_id)?;
    let status = checked_status(&body)?;

    crate::repo::organizations::set_employee_status(&pool, partner_id, employee_id, status)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Employee {employee_id} not found")))
}

// ---------------------------------------------------------------------------
// Legal arms
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/admin/legal-arms",
    request_body = CreateLegalArmRequest,
    responses((status = 201, description = "Legal arm created", body = LegalArm)),
    tag = "organizations"
)]
pub async fn create_legal_arm(
    State(pool): State<Pool<Postgres>>,
    AdminRequired(claims): AdminRequired,
    Json(body): Json<CreateLegalArmRequest>,
) -> Result<(StatusCode, Json<LegalArm>), AppError> {
    body.validate_request()?;
    let arm = crate::repo::organizations::create_legal_arm(&pool, &body).await?;

    crate::repo::activity::record(
        &pool,
        NewActivity {
            actor_id: Some(claims.sub),
            provider: None,
            action: "legal_arm.create",
            entity_type: "legal_arm",
            entity_id: arm.id.to_string(),
            details: serde_json::json!({ "name": arm.name }),
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(arm)))
}

#[utoipa::path(
    get,
    path = "/api/legal-arms",
    responses((status = 200, description = "Legal arms", body = Vec<LegalArm>)),
    tag = "organizations"
)]
pub async fn list_legal_arms(
    State(pool): State<Pool<Postgres>>,
) -> Result<Json<Vec<LegalArm>>, AppError> {
    Ok(Json(crate::repo::organizations::list_legal_arms(&pool).await?))
}

#[utoipa::path(
    patch,
    path = "/api/admin/legal-arms/{id}/status",
    params(("id" = String, Path, description = "Legal arm UUID")),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = LegalArm),
        (status = 404, description = "Not found", body = AppError)
    ),
    tag = "organizations"
)]
pub async fn set_legal_arm_status(
    State(pool): State<Pool<Postgres>>,
    AdminRequired(_admin): AdminRequired,
    Path(id): Path<String>,
    Json(body): Json<SetStatusRequest>,
) -> Result<Json<LegalArm>, AppError> {
    let id = parse_uuid(&id, "id")?;
    let status = checked_status(&body)?;
    crate::repo::organizations::set_legal_arm_status(&pool, id, status)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Legal arm {id} not found")))
}

#[utoipa::path(
    post,
    path = "/api/admin/legal-arms/{id}/roles",
    params(("id" = String, Path, description = "Legal arm UUID")),
    request_body = CreateRoleRequest,
    responses((status = 201, description = "Role created", body = LegalArmRole)),
    tag = "organizations"
)]
pub async fn create_legal_arm_role(
    State(pool): State<Pool<Postgres>>,
    AdminRequired(_admin): AdminRequired,
    Path(id): Path<String>,
    Json(body): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<LegalArmRole>), AppError> {
    body.validate_request()?;
    let id = parse_uuid(&id, "id")?;
    let role = crate::repo::organizations::create_legal_arm_role(&pool, id, &body).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    get,
    path = "/api/legal-arms/{id}/roles",
    params(("id" = String, Path, description = "Legal arm UUID")),
    responses((status = 200, description = "Roles", body = Vec<LegalArmRole>)),
    tag = "organizations"
)]
pub async fn list_legal_arm_roles(
    State(pool): State<Pool<Postgres>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<LegalArmRole>>, AppError> {
    let id = parse_uuid(&id, "id")?;
    Ok(Json(crate::repo::organizations::list_legal_arm_roles(&pool, id).await?))
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/admin/departments",
    request_body = CreateReferenceRequest,
    responses((status = 201, description = "Department created", body = Department)),
    tag = "organizations"
)]
pub async fn create_department(
    State(pool): State<Pool<Postgres>>,
    AdminRequired(_admin): AdminRequired,
    Json(body): Json<CreateReferenceRequest>,
) -> Result<(StatusCode, Json<Department>), AppError> {
    body.validate_request()?;
    let dept = crate::repo::organizations::create_department(&pool, &body).await?;
    Ok((StatusCode::CREATED, Json(dept)))
}

#[utoipa::path(
    get,
    path = "/api/departments",
    responses((status = 200, description = "Departments", body = Vec<Department>)),
    tag = "organizations"
)]
pub async fn list_departments(
    State(pool): State<Pool<Postgres>>,
) -> Result<Json<Vec<Department>>, AppError> {
    Ok(Json(crate::repo::organizations::list_departments(&pool).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/job-titles",
    request_body = CreateReferenceRequest,
    responses((status = 201, description = "Job title created", body = JobTitle)),
    tag = "organizations"
)]
pub async fn create_job_title(
    State(pool): State<Pool<Postgres>>,
    AdminRequired(_admin): AdminRequired,
    Json(body): Json<CreateReferenceRequest>,
) -> Result<(StatusCode, Json<JobTitle>), AppError> {
    body.validate_request()?;
    let title = crate::repo::organizations::create_job_title(&pool, &body).await?;
    Ok((StatusCode::CREATED, Json(title)))
}

#[utoipa::path(
    get,
    path = "/api/job-titles",
    params(JobTitleListParams),
    responses((status = 200, description = "Job titles", body = Vec<JobTitle>)),
    tag = "organizations"
)]
pub async fn list_job_titles(
    State(pool): State<Pool<Postgres>>,
    Query(params): Query<JobTitleListParams>,
) -> Result<Json<Vec<JobTitle>>, AppError> {
    Ok(Json(
        crate::repo::organizations::list_job_titles(&pool, params.department_id).await?,
    ))
}
