use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use ems_client::api::{ApiClient, Body, FetchOptions, ReloadCounter, ReqwestTransport};
use ems_client::error::AppError;
use ems_client::storage::{MemoryStore, SessionStore, TOKEN_KEY};

async fn list_students(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    Json(json!({
        "data": [{ "id": 1, "name_km": "សុខា" }],
        "current_page": params.get("page").and_then(|p| p.parse::<u32>().ok()).unwrap_or(1),
        "total_pages": 1,
        "auth": auth,
        "search": params.get("search").cloned().unwrap_or_default(),
    }))
}

async fn echo(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    (
        StatusCode::CREATED,
        Json(json!({ "received": body, "content_type": content_type })),
    )
}

async fn expired() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Token expired" })),
    )
}

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/api/students", get(list_students))
        .route("/api/subjects", post(echo))
        .route("/api/teachers", get(expired));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server failed");
    });
    format!("http://{}", addr)
}

fn client(base: &str) -> (ApiClient, Arc<MemoryStore>, Arc<ReloadCounter>) {
    let store = Arc::new(MemoryStore::with_entries([(TOKEN_KEY, "abc.def.ghi")]));
    let reload = Arc::new(ReloadCounter::new());
    let transport = Arc::new(ReqwestTransport::new().expect("Failed to build transport"));
    (
        ApiClient::new(base, transport, store.clone(), reload.clone()),
        store,
        reload,
    )
}

#[tokio::test]
async fn sends_bearer_token_and_query_over_http() {
    let base = spawn_server().await;
    let (api, _, _) = client(&base);

    let body: Value = api
        .get_json(
            "/api/students",
            FetchOptions::get().query("search", "សុខា").query("page", 2),
            "Failed to load students.",
        )
        .await
        .unwrap();

    assert_eq!(body["auth"], "Bearer abc.def.ghi");
    assert_eq!(body["search"], "សុខា");
    assert_eq!(body["current_page"], 2);
}

#[tokio::test]
async fn posts_json_with_content_type() {
    let base = spawn_server().await;
    let (api, _, _) = client(&base);

    let body = Body::json(&json!({ "name": "Math" })).unwrap();
    let response = api
        .fetch_with_auth("/api/subjects", FetchOptions::post(body))
        .await
        .unwrap();

    assert_eq!(response.status, 201);
    let echoed: Value = response.json().unwrap();
    assert_eq!(echoed["received"], json!({ "name": "Math" }));
    assert!(echoed["content_type"].as_str().unwrap().starts_with("application/json"));
}

#[tokio::test]
async fn real_401_clears_token_and_reloads() {
    let base = spawn_server().await;
    let (api, store, reload) = client(&base);

    let err = api
        .fetch_with_auth("/api/teachers", FetchOptions::get())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Unauthorized));
    assert_eq!(store.get(TOKEN_KEY), None);
    assert_eq!(reload.count(), 1);
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let (api, _, reload) = client(&format!("http://{}", addr));

    let err = api
        .fetch_with_auth("/api/students", FetchOptions::get())
        .await
        .unwrap_err();

    assert!(err.is_network());
    assert_eq!(reload.count(), 0);
}
