use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    self, admin_token, partner_token, subscriber_token, token_for, As, LEGAL_ARM_ID,
    OTHER_PARTNER_ID, PARTNER_ID,
};

#[tokio::test]
async fn admin_creates_partner_and_toggles_status() {
    let (app, _pool, _guard) = common::test_app().await;
    let token = admin_token();

    let body = json!({ "name": "Al-Adl Law Firm", "commercial_register": "1010101010" });
    let (status, partner) =
        common::post_json(&app, "/api/admin/partners", &body, As::Token(&token)).await;
    assert_eq!(status, StatusCode::CREATED, "{partner}");
    assert_eq!(partner["status"], "active");

    let (status, _) =
        common::post_json(&app, "/api/admin/partners", &body, As::Token(&token)).await;
    assert_eq!(status, StatusCode::CONFLICT, "Commercial register is unique");

    let uri = format!("/api/admin/partners/{}/status", partner["id"].as_str().unwrap());
    let (status, updated) =
        common::patch_json(&app, &uri, &json!({ "status": "inactive" }), As::Token(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "inactive");

    let (status, _) =
        common::patch_json(&app, &uri, &json!({ "status": "deleted" }), As::Token(&token)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, list) = common::get(&app, "/api/partners", As::Anonymous).await;
    assert_eq!(list.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn partner_creation_is_admin_only() {
    let (app, _pool, _guard) = common::test_app().await;
    let token = partner_token();
    let (status, _) = common::post_json(
        &app,
        "/api/admin/partners",
        &json!({ "name": "Sneaky" }),
        As::Token(&token),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn partner_manages_own_roles_and_employees() {
    let (app, _pool, _guard) = common::test_app().await;
    let token = partner_token();

    let roles_uri = format!("/api/partners/{PARTNER_ID}/roles");
    let (status, role) = common::post_json(
        &app,
        &roles_uri,
        &json!({ "name": "Case manager", "permissions": ["requests.read", "requests.write"] }),
        As::Token(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{role}");
    assert_eq!(role["permissions"].as_array().unwrap().len(), 2);

    let employees_uri = format!("/api/partners/{PARTNER_ID}/employees");
    let (status, employee) = common::post_json(
        &app,
        &employees_uri,
        &json!({ "full_name": "Nora", "email": "nora@firm.sa", "role_id": role["id"] }),
        As::Token(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{employee}");
    assert_eq!(employee["role_id"], role["id"]);

    let (_, employees) = common::get(&app, &employees_uri, As::Token(&token)).await;
    assert_eq!(employees.as_array().unwrap().len(), 1);

    let uri = format!(
        "/api/partners/{PARTNER_ID}/employees/{}/status",
        employee["id"].as_str().unwrap()
    );
    let (status, updated) =
        common::patch_json(&app, &uri, &json!({ "status": "inactive" }), As::Token(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "inactive");
}

#[tokio::test]
async fn partner_cannot_manage_another_partner() {
    let (app, _pool, _guard) = common::test_app().await;
    let token = partner_token();
    let uri = format!("/api/partners/{OTHER_PARTNER_ID}/employees");

    let (status, _) = common::get(&app, &uri, As::Token(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let token = subscriber_token();
    let (status, _) = common::get(&app, &uri, As::Token(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let token = admin_token();
    let (status, _) = common::get(&app, &uri, As::Token(&token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn employee_role_must_belong_to_partner() {
    let (app, _pool, _guard) = common::test_app().await;
    let admin = admin_token();
    let (_, foreign_role) = common::post_json(
        &app,
        &format!("/api/partners/{OTHER_PARTNER_ID}/roles"),
        &json!({ "name": "Viewer" }),
        As::Token(&admin),
    )
    .await;

    let token = partner_token();
    let (status, response) = common::post_json(
        &app,
        &format!("/api/partners/{PARTNER_ID}/employees"),
        &json!({ "full_name": "Ali", "email": "ali@firm.sa", "role_id": foreign_role["id"] }),
        As::Token(&token),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response["field_errors"]["role_id"].is_string());
}

#[tokio::test]
async fn legal_arms_and_reference_data() {
    let (app, _pool, _guard) = common::test_app().await;
    let token = admin_token();

    let (status, arm) = common::post_json(
        &app,
        "/api/admin/legal-arms",
        &json!({ "name": "Legal Aid Society" }),
        As::Token(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{arm}");

    let arm_id = arm["id"].as_str().unwrap();
    let (status, _) = common::post_json(
        &app,
        &format!("/api/admin/legal-arms/{arm_id}/roles"),
        &json!({ "name": "Supervisor" }),
        As::Token(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, roles) = common::get(&app, &format!("/api/legal-arms/{arm_id}/roles"), As::Anonymous).await;
    assert_eq!(roles[0]["name"], "Supervisor");

    let (status, dept) = common::post_json(
        &app,
        "/api/admin/departments",
        &json!({ "name": "Litigation", "name_ar": "التقاضي" }),
        As::Token(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = common::post_json(
        &app,
        "/api/admin/job-titles",
        &json!({ "name": "Paralegal", "department_id": dept["id"] }),
        As::Token(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, titles) = common::get(
        &app,
        &format!("/api/job-titles?department_id={}", dept["id"].as_str().unwrap()),
        As::Anonymous,
    )
    .await;
    assert_eq!(titles.as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Lawyers
// ---------------------------------------------------------------------------

fn lawyer_body(email: &str, license: &str) -> serde_json::Value {
    json!({
        "email": email,
        "password": "StrongPass123!",
        "display_name": "Khalid Al-Harbi",
        "license_number": license,
        "specialization": "Commercial",
        "legal_arm_id": LEGAL_ARM_ID,
    })
}

#[tokio::test]
async fn lawyer_registration_links_provider() {
    let (app, pool, _guard) = common::test_app().await;

    let (status, response) = common::post_json(
        &app,
        "/api/lawyers/register",
        &lawyer_body("khalid@law.sa", "LIC-001"),
        As::Anonymous,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{response}");
    assert_eq!(response["lawyer"]["legal_arm_id"], LEGAL_ARM_ID.to_string());

    let user_id = response["user_id"].as_i64().unwrap();
    let (account_type, provider_type): (String, Option<String>) =
        sqlx::query_as("SELECT account_type, provider_type FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(account_type, "legal_arm_lawyer");
    assert_eq!(provider_type.as_deref(), Some("legal_arm"));

    let (_, list) = common::get(
        &app,
        &format!("/api/lawyers?legal_arm_id={LEGAL_ARM_ID}"),
        As::Anonymous,
    )
    .await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn lawyer_registration_is_all_or_nothing() {
    let (app, pool, _guard) = common::test_app().await;
    common::post_json(
        &app,
        "/api/lawyers/register",
        &lawyer_body("first@law.sa", "LIC-777"),
        As::Anonymous,
    )
    .await;

    let (status, _) = common::post_json(
        &app,
        "/api/lawyers/register",
        &lawyer_body("second@law.sa", "LIC-777"),
        As::Anonymous,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let orphan: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = 'second@law.sa'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orphan, 0, "Failed registration must not leave a user behind");
}

#[tokio::test]
async fn lawyer_needs_active_legal_arm() {
    let (app, _pool, _guard) = common::test_app().await;
    let admin = admin_token();
    common::patch_json(
        &app,
        &format!("/api/admin/legal-arms/{LEGAL_ARM_ID}/status"),
        &json!({ "status": "inactive" }),
        As::Token(&admin),
    )
    .await;

    let (status, response) = common::post_json(
        &app,
        "/api/lawyers/register",
        &lawyer_body("late@law.sa", "LIC-002"),
        As::Anonymous,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response["field_errors"]["legal_arm_id"].is_string());
}

#[tokio::test]
async fn admin_deactivates_lawyer() {
    let (app, _pool, _guard) = common::test_app().await;
    let (_, response) = common::post_json(
        &app,
        "/api/lawyers/register",
        &lawyer_body("k@law.sa", "LIC-003"),
        As::Anonymous,
    )
    .await;
    let uri = format!(
        "/api/admin/lawyers/{}/status",
        response["lawyer"]["id"].as_str().unwrap()
    );

    let lawyer_token = token_for(response["user_id"].as_i64().unwrap(), "legal_arm_lawyer", None);
    let (status, _) = common::patch_json(
        &app,
        &uri,
        &json!({ "status": "inactive" }),
        As::Token(&lawyer_token),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = admin_token();
    let (status, updated) =
        common::patch_json(&app, &uri, &json!({ "status": "inactive" }), As::Token(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "inactive");
}
