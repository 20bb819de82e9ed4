use shared_types::{
    AppError, CreateLegalArmRequest, CreatePartnerEmployeeRequest, CreatePartnerRequest,
    CreateReferenceRequest, CreateRoleRequest, Department, JobTitle, LegalArm, LegalArmRole,
    Partner, PartnerEmployee, PartnerRole,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;

// ---------------------------------------------------------------------------
// Partners
// ---------------------------------------------------------------------------

pub async fn create_partner(pool: &Pool<Postgres>, req: &CreatePartnerRequest) -> Result<Partner, AppError> {
    sqlx::query_as!(
        Partner,
        r#"
        INSERT INTO partners (name, commercial_register, email, phone)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, commercial_register, email, phone, status, created_at
        "#,
        req.name.trim(),
        req.commercial_register.as_deref(),
        req.email.as_deref(),
        req.phone.as_deref(),
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_partners(pool: &Pool<Postgres>) -> Result<Vec<Partner>, AppError> {
    sqlx::query_as!(
        Partner,
        r#"
        SELECT id, name, commercial_register, email, phone, status, created_at
        FROM partners
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_partner(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Partner>, AppError> {
    sqlx::query_as!(
        Partner,
        r#"
        SELECT id, name, commercial_register, email, phone, status, created_at
        FROM partners
        WHERE id = $1
        "#,
        id,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn set_partner_status(pool: &Pool<Postgres>, id: Uuid, status: &str) -> Result<Option<Partner>, AppError> {
    sqlx::query_as!(
        Partner,
        r#"
        UPDATE partners
        SET status = $2
        WHERE id = $1
        RETURNING id, name, commercial_register, email, phone, status, created_at
        "#,
        id,
        status,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn create_partner_role(
    pool: &Pool<Postgres>,
    partner_id: Uuid,
    req: &CreateRoleRequest,
) -> Result<PartnerRole, AppError> {
    sqlx::query_as!(
        PartnerRole,
        r#"
        INSERT INTO partner_roles (partner_id, name, permissions)
        VALUES ($1, $2, $3)
        RETURNING id, partner_id, name, permissions, created_at
        "#,
        partner_id,
        req.name.trim(),
        &req.permissions,
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_partner_roles(pool: &Pool<Postgres>, partner_id: Uuid) -> Result<Vec<PartnerRole>, AppError> {
    sqlx::query_as!(
        PartnerRole,
        r#"
        SELECT id, partner_id, name, permissions, created_at
        FROM partner_roles
        WHERE partner_id = $1
        ORDER BY name
        "#,
        partner_id,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Whether `role_id` is one of `partner_id`'s roles.
pub async fn partner_role_exists(pool: &Pool<Postgres>, partner_id: Uuid, role_id: Uuid) -> Result<bool, AppError> {
    sqlx::query_scalar!(
        r#"SELECT EXISTS (SELECT 1 FROM partner_roles WHERE id = $1 AND partner_id = $2) AS "exists!""#,
        role_id,
        partner_id,
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn create_employee(
    pool: &Pool<Postgres>,
    partner_id: Uuid,
    req: &CreatePartnerEmployeeRequest,
) -> Result<PartnerEmployee, AppError> {
    sqlx::query_as!(
        PartnerEmployee,
        r#"
        INSERT INTO partner_employees (partner_id, role_id, department_id, job_title_id, full_name, email, phone)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, partner_id, role_id, department_id, job_title_id,
            full_name, email, phone, status, created_at
        "#,
        partner_id,
        req.role_id,
        req.department_id,
        req.job_title_id,
        req.full_name.trim(),
        req.email.trim().to_lowercase(),
        req.phone.as_deref(),
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_employees(pool: &Pool<Postgres>, partner_id: Uuid) -> Result<Vec<PartnerEmployee>, AppError> {
    sqlx::query_as!(
        PartnerEmployee,
        r#"
        SELECT id, partner_id, role_id, department_id, job_title_id,
            full_name, email, phone, status, created_at
        FROM partner_employees
        WHERE partner_id = $1
        ORDER BY full_name
        "#,
        partner_id,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn set_employee_status(
    pool: &Pool<Postgres>,
    partner_id: Uuid,
    employee_id: Uuid,
    status: &str,
) -> Result<Option<PartnerEmployee>, AppError> {
    sqlx::query_as!(
        PartnerEmployee,
        r#"
        UPDATE partner_employees SET status = $3
        WHERE id = $1 AND partner_id = $2
        RETURNING id, partner_id, role_id, department_id, job_title_id,
            full_name, email, phone, status, created_at
        "#,
        employee_id,
        partner_id,
        status,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

// ---------------------------------------------------------------------------
// Legal arms
// ---------------------------------------------------------------------------

pub async fn create_legal_arm(pool: &Pool<Postgres>, req: &CreateLegalArmRequest) -> Result<LegalArm, AppError> {
    sqlx::query_as!(
        LegalArm,
        r#"
        INSERT INTO legal_arms (name, description)
        VALUES ($1, $2)
        RETURNING id, name, description, status, created_at
        "#,
        req.name.trim(),
        req.description.as_deref(),
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_legal_arms(pool: &Pool<Postgres>) -> Result<Vec<LegalArm>, AppError> {
    sqlx::query_as!(
        LegalArm,
        "SELECT id, name, description, status, created_at FROM legal_arms ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn set_legal_arm_status(
    pool: &Pool<Postgres>,
    id: Uuid,
    status: &str,
) -> Result<Option<LegalArm>, AppError> {
    sqlx::query_as!(
        LegalArm,
        r#"
        UPDATE legal_arms
        SET status = $2
        WHERE id = $1
        RETURNING id, name, description, status, created_at
        "#,
        id,
        status,
    )
    .fetch_optional(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

/// Active legal arms only; a lawyer cannot join an inactive one.
pub async fn legal_arm_is_active(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    sqlx::query_scalar!(
        r#"SELECT EXISTS (SELECT 1 FROM legal_arms WHERE id = $1 AND status = 'active') AS "exists!""#,
        id,
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn create_legal_arm_role(
    pool: &Pool<Postgres>,
    legal_arm_id: Uuid,
    req: &CreateRoleRequest,
) -> Result<LegalArmRole, AppError> {
    sqlx::query_as!(
        LegalArmRole,
        r#"
        INSERT INTO legal_arm_roles (legal_arm_id, name, permissions)
        VALUES ($1, $2, $3)
        RETURNING id, legal_arm_id, name, permissions, created_at
        "#,
        legal_arm_id,
        req.name.trim(),
        &req.permissions,
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_legal_arm_roles(pool: &Pool<Postgres>, legal_arm_id: Uuid) -> Result<Vec<LegalArmRole>, AppError> {
    sqlx::query_as!(
        LegalArmRole,
        r#"
        SELECT id, legal_arm_id, name, permissions, created_at
        FROM legal_arm_roles
        WHERE legal_arm_id = $1
        ORDER BY name
        "#,
        legal_arm_id,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

pub async fn create_department(pool: &Pool<Postgres>, req: &CreateReferenceRequest) -> Result<Department, AppError> {
    sqlx::query_as!(
        Department,
        r#"
        INSERT INTO ref_departments (name, name_ar) VALUES ($1, $2)
        RETURNING id, name, name_ar
        "#,
        req.name.trim(),
        req.name_ar.as_deref(),
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_departments(pool: &Pool<Postgres>) -> Result<Vec<Department>, AppError> {
    sqlx::query_as!(
        Department,
        "SELECT id, name, name_ar FROM ref_departments ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn create_job_title(pool: &Pool<Postgres>, req: &CreateReferenceRequest) -> Result<JobTitle, AppError> {
    sqlx::query_as!(
        JobTitle,
        r#"
        INSERT INTO ref_job_titles (department_id, name, name_ar)
        VALUES ($1, $2, $3)
        RETURNING id, department_id, name, name_ar
        "#,
        req.department_id,
        req.name.trim(),
        req.name_ar.as_deref(),
    )
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn list_job_titles(pool: &Pool<Postgres>, department_id: Option<Uuid>) -> Result<Vec<JobTitle>, AppError> {
    sqlx::query_as!(
        JobTitle,
        r#"
        SELECT id, department_id, name, name_ar
        FROM ref_job_titles
        WHERE ($1::uuid IS NULL OR department_id = $1)
        ORDER BY name
        "#,
        department_id,
    )
    .fetch_all(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}
