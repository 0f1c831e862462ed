use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use scholaris::api::CortexHandle;
use scholaris::modules::start_cortex;
use scholaris::router::init_router;
use scholaris::state::AppState;
use scholaris_config::{CorsConfig, JwtConfig, RateLimitConfig};
use scholaris_core::hash_password;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

pub use scholaris_models::users::system_roles;

pub const TEST_PASSWORD: &str = "password123";
pub const TEST_DEVICE: &str = "scholaris-tests/1.0";

#[allow(dead_code)]
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Application state with a running event bus and no Redis.
pub fn test_state(pool: PgPool) -> AppState {
    dotenvy::dotenv().ok();
    let (cortex, inbox) = CortexHandle::channel(16);
    let state = AppState {
        db: pool,
        cache: None,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::default(),
        rate_limit_config: RateLimitConfig::disabled(),
        cortex,
    };
    start_cortex(&state, inbox).unwrap();
    state
}

pub async fn setup_test_app(pool: PgPool) -> Router {
    init_router(test_state(pool)).unwrap()
}

pub fn unique_username() -> String {
    format!("u{}", &Uuid::new_v4().simple().to_string()[..12])
}

#[allow(dead_code)]
pub fn unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

/// Inserts a user holding the `user` role plus `roles`.
pub async fn create_test_user(pool: &PgPool, roles: &[Uuid]) -> TestUser {
    let username = unique_username();
    let email = format!("{}@test.com", username);
    let hashed = hash_password(TEST_PASSWORD).unwrap();

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO users (first_name, last_name, username, email, password)
         VALUES ('Test', 'User', $1, $2, $3)
         RETURNING id",
    )
    .bind(&username)
    .bind(&email)
    .bind(&hashed)
    .fetch_one(pool)
    .await
    .unwrap();

    for role_id in std::iter::once(&system_roles::USER).chain(roles) {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(role_id)
        .execute(pool)
        .await
        .unwrap();
    }

    TestUser {
        id,
        username,
        email,
        password: TEST_PASSWORD.to_string(),
    }
}

#[allow(dead_code)]
pub async fn create_super_admin(pool: &PgPool) -> TestUser {
    create_test_user(pool, &[system_roles::SUPER_ADMIN]).await
}

/// Inserts a school. When `admin` is given it becomes a school admin of it.
#[allow(dead_code)]
pub async fn create_test_school(pool: &PgPool, admin: Option<Uuid>) -> Uuid {
    let school_id: Uuid = sqlx::query_scalar(
        "INSERT INTO schools (name, address, phone, website, description)
         VALUES ($1, '1 Test Road', '0800000000', 'https://school.test', 'A test school')
         RETURNING id",
    )
    .bind(format!("School {}", Uuid::new_v4()))
    .fetch_one(pool)
    .await
    .unwrap();

    if let Some(user_id) = admin {
        make_school_admin(pool, school_id, user_id).await;
    }

    school_id
}

#[allow(dead_code)]
pub async fn make_school_admin(pool: &PgPool, school_id: Uuid, user_id: Uuid) {
    sqlx::query("INSERT INTO school_admins (school_id, user_id) VALUES ($1, $2)")
        .bind(school_id)
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(user_id)
        .bind(system_roles::SCHOOL_ADMINISTRATOR)
        .execute(pool)
        .await
        .unwrap();
}

#[allow(dead_code)]
pub async fn create_test_class_room(pool: &PgPool, school_id: Uuid, name: &str) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO class_rooms (name, school_id, capacity) VALUES ($1, $2, 30) RETURNING id",
    )
    .bind(name)
    .bind(school_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[allow(dead_code)]
pub async fn role_slugs(pool: &PgPool, user_id: Uuid) -> Vec<String> {
    sqlx::query_scalar(
        "SELECT r.slug FROM user_roles ur JOIN roles r ON r.id = ur.role_id
         WHERE ur.user_id = $1 ORDER BY r.slug",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .unwrap()
}

/// Sends one request through the router and returns the status and the
/// decoded envelope.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::USER_AGENT, TEST_DEVICE);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    (status, body)
}

/// Logs in and returns `(authToken, refreshToken)`.
pub async fn login(app: &Router, user: &TestUser) -> (String, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": user.username, "password": user.password })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "login failed: {}", body);

    (
        body["data"]["authToken"].as_str().unwrap().to_string(),
        body["data"]["refreshToken"].as_str().unwrap().to_string(),
    )
}

#[allow(dead_code)]
pub async fn auth_token(app: &Router, user: &TestUser) -> String {
    login(app, user).await.0
}
