mod common;

use common::{create_test_school, create_test_user, test_state};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

#[sqlx::test(migrations = "./migrations")]
async fn test_get_user_over_the_bus(pool: PgPool) {
    let state = test_state(pool.clone());
    let user = create_test_user(&pool, &[]).await;

    let reply = state
        .cortex
        .emit("users.getUser", json!({ "userId": user.id }))
        .await
        .unwrap();
    assert_eq!(reply["user"]["id"], user.id.to_string());
    assert_eq!(reply["user"]["username"], user.username);
    assert!(reply["user"].get("password").is_none());

    let reply = state
        .cortex
        .emit("users.getUserRoles", json!({ "userId": user.id }))
        .await
        .unwrap();
    assert_eq!(reply["roles"], json!(["user"]));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_get_school_over_the_bus(pool: PgPool) {
    let state = test_state(pool.clone());
    let school_id = create_test_school(&pool, None).await;

    let reply = state
        .cortex
        .emit("schools.getSchoolById", json!({ "schoolId": school_id }))
        .await
        .unwrap();
    assert_eq!(reply["school"]["id"], school_id.to_string());

    let reply = state
        .cortex
        .emit("schools.getSchoolById", json!({ "schoolId": Uuid::new_v4() }))
        .await
        .unwrap();
    assert!(reply["school"].is_null());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_bus_errors_are_generic(pool: PgPool) {
    let state = test_state(pool);

    let reply = state.cortex.emit("grades.list", json!({})).await.unwrap();
    assert_eq!(reply, json!({ "error": "module grades not found" }));

    let reply = state
        .cortex
        .emit("users.getUser", json!({ "userId": "not-a-uuid" }))
        .await
        .unwrap();
    assert_eq!(reply, json!({ "error": "failed to execute getUser" }));

    let reply = state
        .cortex
        .emit("users.deleteUser", json!({}))
        .await
        .unwrap();
    assert_eq!(reply, json!({ "error": "failed to execute deleteUser" }));
}
