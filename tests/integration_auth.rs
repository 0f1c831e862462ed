mod common;

use axum::http::{Method, StatusCode};
use common::{TEST_PASSWORD, create_test_user, role_slugs, send, setup_test_app, unique_username};
use serde_json::{Value, json};
use sqlx::PgPool;

fn registration(username: &str) -> Value {
    json!({
        "username": username,
        "email": format!("{}@example.com", username),
        "password": "password123",
        "confirm_password": "password123",
        "first_name": "Ada",
        "last_name": "Obi",
    })
}

#[sqlx::test(migrations = "./migrations")]
async fn test_register_success(pool: PgPool) {
    let app = common::setup_test_app(pool.clone()).await;
    let username = unique_username();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(registration(&username)),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["ok"], true);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["data"]["user"]["username"], username);
    assert_eq!(body["data"]["user"]["first_name"], "Ada");
    assert!(body["data"]["user"].get("password").is_none());
    assert!(body["data"]["authToken"].is_string());
    assert!(body["data"]["refreshToken"].is_string());

    let user_id: uuid::Uuid = body["data"]["user"]["id"].as_str().unwrap().parse().unwrap();
    assert_eq!(role_slugs(&pool, user_id).await, vec!["user".to_string()]);

    let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM refresh_tokens WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_register_password_mismatch(pool: PgPool) {
    let app = setup_test_app(pool).await;
    let mut body = registration(&unique_username());
    body["confirm_password"] = json!("different1");

    let (status, body) = send(&app, Method::POST, "/api/auth/register", None, Some(body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["ok"], false);
    assert_eq!(body["message"], "Invalid registration data");
    assert_eq!(body["errors"][0]["path"], "confirm_password");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_register_invalid_data(pool: PgPool) {
    let app = setup_test_app(pool).await;
    let mut body = registration(&unique_username());
    body["email"] = json!("not-an-email");

    let (status, body) = send(&app, Method::POST, "/api/auth/register", None, Some(body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Invalid registration data");
    assert!(!body["errors"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_register_duplicate_username(pool: PgPool) {
    let app = setup_test_app(pool.clone()).await;
    let existing = create_test_user(&pool, &[]).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(registration(&existing.username)),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Username already taken");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_success(pool: PgPool) {
    let app = setup_test_app(pool.clone()).await;
    let user = create_test_user(&pool, &[]).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": user.username, "password": TEST_PASSWORD })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["data"]["user"]["id"], user.id.to_string());
    assert!(body["data"]["authToken"].is_string());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_bad_credentials(pool: PgPool) {
    let app = setup_test_app(pool.clone()).await;
    let user = create_test_user(&pool, &[]).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": user.username, "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Invalid login credentials");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "nobody_here", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Invalid login credentials");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_missing_fields(pool: PgPool) {
    let app = setup_test_app(pool).await;

    let (status, body) =
        send(&app, Method::POST, "/api/auth/login", None, Some(json!({}))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Invalid login data");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_auth_index(pool: PgPool) {
    let app = setup_test_app(pool).await;

    for method in [Method::GET, Method::POST] {
        let (status, body) = send(&app, method, "/api/auth", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Auth module is running");
        assert_eq!(body["data"], json!({}));
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_invalid_json_payload(pool: PgPool) {
    let app = setup_test_app(pool).await;

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{\"username\": "))
        .unwrap();

    use http_body_util::BodyExt;
    use tower::ServiceExt;
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "Invalid JSON payload");
    assert_eq!(body["ok"], false);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unknown_routes(pool: PgPool) {
    let app = setup_test_app(pool).await;

    let (status, body) = send(&app, Method::POST, "/api/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "POST request to /api/nope not found");

    let (status, body) = send(&app, Method::GET, "/elsewhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "GET request to /elsewhere not found");
}
