mod common;

use axum::http::{Method, StatusCode};
use common::{
    auth_token, create_super_admin, create_test_school, create_test_user, role_slugs, send,
    setup_test_app,
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

#[sqlx::test(migrations = "./migrations")]
async fn test_create_school_admin(pool: PgPool) {
    let app = setup_test_app(pool.clone()).await;
    let admin = create_super_admin(&pool).await;
    let token = auth_token(&app, &admin).await;
    let school_id = create_test_school(&pool, None).await;
    let user = create_test_user(&pool, &[]).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/school-admins",
        Some(&token),
        Some(json!({ "schoolId": school_id, "userId": user.id })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "School admin created successfully");
    assert_eq!(body["data"]["schoolAdmin"]["schoolId"], school_id.to_string());
    assert_eq!(body["data"]["schoolAdmin"]["userId"], user.id.to_string());
    assert_eq!(body["data"]["schoolAdmin"]["createdBy"], admin.id.to_string());
    assert_eq!(
        role_slugs(&pool, user.id).await,
        vec!["school-administrator".to_string(), "user".to_string()]
    );

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/school-admins",
        Some(&token),
        Some(json!({ "schoolId": school_id, "userId": user.id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User is already a school admin");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_school_admin_missing_targets(pool: PgPool) {
    let app = setup_test_app(pool.clone()).await;
    let admin = create_super_admin(&pool).await;
    let token = auth_token(&app, &admin).await;
    let school_id = create_test_school(&pool, None).await;
    let user = create_test_user(&pool, &[]).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/school-admins",
        Some(&token),
        Some(json!({ "schoolId": Uuid::new_v4(), "userId": user.id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "School not found");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/school-admins",
        Some(&token),
        Some(json!({ "schoolId": school_id, "userId": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/school-admins",
        Some(&token),
        Some(json!({ "schoolId": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Invalid school admin data");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_get_and_list_school_admins(pool: PgPool) {
    let app = setup_test_app(pool.clone()).await;
    let admin = create_super_admin(&pool).await;
    let token = auth_token(&app, &admin).await;
    let first = create_test_user(&pool, &[]).await;
    let second = create_test_user(&pool, &[]).await;
    let school_id = create_test_school(&pool, Some(first.id)).await;
    create_test_school(&pool, Some(second.id)).await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/school-admins?schoolId={}", school_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "School admins fetched successfully");
    assert_eq!(body["data"]["meta"]["total"], 1);
    let entry = &body["data"]["data"][0];
    assert_eq!(entry["user"]["username"], first.username);
    let admin_id = entry["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/api/school-admins", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["meta"]["total"], 2);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/school-admins/{}", admin_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["schoolAdmin"]["user"]["id"], first.id.to_string());

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/school-admins/{}", Uuid::new_v4()),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "School admin not found");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_school_admin_revokes_role(pool: PgPool) {
    let app = setup_test_app(pool.clone()).await;
    let admin = create_super_admin(&pool).await;
    let token = auth_token(&app, &admin).await;
    let user = create_test_user(&pool, &[]).await;
    let school_id = create_test_school(&pool, Some(user.id)).await;

    let admin_id: Uuid = sqlx::query_scalar(
        "SELECT id FROM school_admins WHERE school_id = $1 AND user_id = $2",
    )
    .bind(school_id)
    .bind(user.id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/school-admins/{}", admin_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "School admin deleted successfully");
    assert_eq!(role_slugs(&pool, user.id).await, vec!["user".to_string()]);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/school-admins/{}", admin_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_keeps_role_while_other_schools_remain(pool: PgPool) {
    let app = setup_test_app(pool.clone()).await;
    let admin = create_super_admin(&pool).await;
    let token = auth_token(&app, &admin).await;
    let user = create_test_user(&pool, &[]).await;
    let school_id = create_test_school(&pool, Some(user.id)).await;
    create_test_school(&pool, Some(user.id)).await;

    let admin_id: Uuid = sqlx::query_scalar(
        "SELECT id FROM school_admins WHERE school_id = $1 AND user_id = $2",
    )
    .bind(school_id)
    .bind(user.id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/school-admins/{}", admin_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(role_slugs(&pool, user.id).await.contains(&"school-administrator".to_string()));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_school_admins_require_super_admin(pool: PgPool) {
    let app = setup_test_app(pool.clone()).await;
    let user = create_test_user(&pool, &[]).await;
    let token = auth_token(&app, &user).await;

    let (status, _) = send(&app, Method::GET, "/api/school-admins", Some(&token), None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}
