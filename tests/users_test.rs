mod common;

use axum::http::{Method, StatusCode};
use common::{create_farmer, setup};
use organic_farm::models::user;
use sea_orm::EntityTrait;
use serde_json::json;

#[tokio::test]
async fn test_list_users_admin_only() {
    let app = setup().await;
    let (_, admin_token) = app.admin().await;
    let (_, _, farmer_token) = app.farmer("grower@test.com").await;

    let res = app.get("/api/v1/users/", Some(&admin_token)).await;
    assert_eq!(res.status, StatusCode::OK);
    let users = res.body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("hashed_password").is_none()));

    let res = app.get("/api/v1/users/", Some(&farmer_token)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_user() {
    let app = setup().await;
    let (_, admin_token) = app.admin().await;
    let farmer = create_farmer(app.db(), "Second Login Farm").await;

    let res = app
        .json(
            Method::POST,
            "/api/v1/users/",
            Some(&admin_token),
            json!({ "email": "helper@test.com", "password": "HelperPass1", "farmer_id": farmer.id }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let id = res.body["user_id"].as_i64().unwrap() as i32;
    let created = user::Entity::find_by_id(id).one(app.db()).await.unwrap().unwrap();
    assert_eq!(created.role, "farmer");
    assert_eq!(created.farmer_id, Some(farmer.id));

    let res = app
        .json(
            Method::POST,
            "/api/v1/users/",
            Some(&admin_token),
            json!({ "email": "helper@test.com", "password": "HelperPass1" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .json(
            Method::POST,
            "/api/v1/users/",
            Some(&admin_token),
            json!({ "email": "weak@test.com", "password": "NODIGITSHERE" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .json(
            Method::POST,
            "/api/v1/users/",
            Some(&admin_token),
            json!({ "email": "orphan@test.com", "password": "OrphanPass1", "farmer_id": 9999 }),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app
        .json(
            Method::POST,
            "/api/v1/users/",
            Some(&admin_token),
            json!({ "email": "boss@test.com", "password": "BossPass1", "role": "superuser" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_user() {
    let app = setup().await;
    let (admin, admin_token) = app.admin().await;
    let (_, farmer_user, _) = app.farmer("grower@test.com").await;

    let res = app
        .empty(Method::DELETE, &format!("/api/v1/users/{}", admin.id), Some(&admin_token))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["detail"], "Cannot delete your own account");

    let res = app
        .empty(Method::DELETE, &format!("/api/v1/users/{}", farmer_user.id), Some(&admin_token))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "User deleted");

    let res = app
        .empty(Method::DELETE, &format!("/api/v1/users/{}", farmer_user.id), Some(&admin_token))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reset_password() {
    let app = setup().await;
    let (_, admin_token) = app.admin().await;
    let (_, farmer_user, _) = app.farmer("grower@test.com").await;

    let res = app
        .empty(
            Method::POST,
            &format!("/api/v1/users/{}/reset-password", farmer_user.id),
            Some(&admin_token),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let temporary = res.body["temporary_password"].as_str().unwrap().to_string();
    assert_eq!(temporary.len(), 10);

    let res = app
        .json(
            Method::POST,
            "/api/v1/auth/login",
            None,
            json!({ "username": "grower@test.com", "password": temporary }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app
        .empty(Method::POST, "/api/v1/users/9999/reset-password", Some(&admin_token))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_role() {
    let app = setup().await;
    let (admin, admin_token) = app.admin().await;
    let (_, farmer_user, farmer_token) = app.farmer("grower@test.com").await;

    let res = app
        .empty(
            Method::PATCH,
            &format!("/api/v1/users/{}/role?role=admin", farmer_user.id),
            Some(&admin_token),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "Role updated");
    assert_eq!(res.body["new_role"], "admin");

    // The promoted user's existing token now passes admin checks
    let res = app.get("/api/v1/users/", Some(&farmer_token)).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = app
        .empty(
            Method::PATCH,
            &format!("/api/v1/users/{}/role?role=farmer", admin.id),
            Some(&admin_token),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["detail"], "Cannot change your own admin role");

    let res = app
        .empty(
            Method::PATCH,
            &format!("/api/v1/users/{}/role?role=owner", farmer_user.id),
            Some(&admin_token),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["detail"], "Invalid role");

    let res = app
        .empty(Method::PATCH, "/api/v1/users/9999/role?role=farmer", Some(&admin_token))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
