use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde_json::{json, Value};
use tower::ServiceExt;

use daily_log_backend::{build_router, build_service, config::Config, LOGS_PATH};

fn memory_config() -> Config {
    Config {
        database_url: ":memory:".to_string(),
        ..Config::default()
    }
}

fn app() -> Router {
    let config = memory_config();
    build_router(&config, build_service(&config))
}

async fn send(app: &Router, method: Method, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(LOGS_PATH);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router, content: &str, date: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        Some(json!({ "content": content, "date": date })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn run_then_delete_scenario() {
    let app = app();

    let created = create(&app, "Went for a run", "2024-05-01").await;
    assert_eq!(created["content"], "Went for a run");
    assert_eq!(created["date"], "2024-05-01");
    let id = created["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());

    let (status, body) = send(&app, Method::DELETE, Some(json!({ "id": id }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Log deleted successfully" }));

    let (status, body) = send(&app, Method::GET, None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|log| log["id"].as_str().unwrap())
        .collect();
    assert!(!ids.contains(&id.as_str()));
}

#[tokio::test]
async fn created_log_carries_server_fields() {
    let app = app();
    let created = create(&app, "  padded  ", "2024-05-01T00:00:00.000Z").await;

    assert_eq!(created["content"], "padded");
    assert_eq!(created["date"], "2024-05-01");
    let timestamp: DateTime<Utc> = created["timestamp"].as_str().unwrap().parse().unwrap();
    assert!(timestamp <= Utc::now());
    assert!(created["createdAt"].is_string());
    assert!(created["updatedAt"].is_string());
}

#[tokio::test]
async fn list_returns_every_log_newest_first() {
    let app = app();
    for i in 0..5 {
        create(&app, &format!("entry {i}"), "2024-05-01").await;
    }

    let (status, body) = send(&app, Method::GET, None).await;
    assert_eq!(status, StatusCode::OK);
    let logs = body.as_array().unwrap();
    assert_eq!(logs.len(), 5);

    let timestamps: Vec<DateTime<Utc>> = logs
        .iter()
        .map(|log| log["timestamp"].as_str().unwrap().parse().unwrap())
        .collect();
    assert!(timestamps.windows(2).all(|pair| pair[0] >= pair[1]));
    assert_eq!(logs[0]["content"], "entry 4");
}

#[tokio::test]
async fn round_trip_matches_submission() {
    let app = app();
    let created = create(&app, "Read a book", "2024-02-29").await;

    let (_, body) = send(&app, Method::GET, None).await;
    let listed = &body.as_array().unwrap()[0];
    assert_eq!(listed, &created);
}

#[tokio::test]
async fn blank_content_is_rejected() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        Some(json!({ "content": "   ", "date": "2024-05-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("content"));

    let (_, body) = send(&app, Method::GET, None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn missing_date_is_rejected() {
    let (status, body) = send(&app(), Method::POST, Some(json!({ "content": "no date" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_body_keeps_error_shape() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri(LOGS_PATH)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn out_of_range_timestamp_is_rejected_and_list_stays_readable() {
    let app = app();
    for timestamp in ["+10000-01-01T00:00:00Z", "-0001-01-01T00:00:00Z"] {
        let (status, body) = send(
            &app,
            Method::POST,
            Some(json!({ "content": "x", "date": "2024-05-01", "timestamp": timestamp })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{timestamp}: {body}");
        assert!(body["error"].as_str().unwrap().contains("timestamp"));
    }

    let (status, body) = send(&app, Method::GET, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn supplied_timestamp_is_kept() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        Some(json!({
            "content": "backfilled",
            "date": "2023-01-02",
            "timestamp": "2023-01-02T03:04:05Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let stored: DateTime<Utc> = body["timestamp"].as_str().unwrap().parse().unwrap();
    assert_eq!(stored, "2023-01-02T03:04:05Z".parse::<DateTime<Utc>>().unwrap());

    let (status, body) = send(&app, Method::GET, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn extra_fields_are_ignored() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        Some(json!({ "content": "tagged", "date": "2024-05-01", "mood": "great" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body.get("mood").is_none());
}

#[tokio::test]
async fn update_changes_content_and_date_only() {
    let app = app();
    let created = create(&app, "draft", "2024-05-01").await;

    let (status, updated) = send(
        &app,
        Method::PUT,
        Some(json!({ "id": created["id"], "content": "final", "date": "2024-05-03" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["timestamp"], created["timestamp"]);
    assert_eq!(updated["createdAt"], created["createdAt"]);
    assert_eq!(updated["content"], "final");
    assert_eq!(updated["date"], "2024-05-03");
}

#[tokio::test]
async fn update_of_unknown_id_is_not_found() {
    let (status, body) = send(
        &app(),
        Method::PUT,
        Some(json!({
            "id": uuid::Uuid::new_v4().to_string(),
            "content": "ghost",
            "date": "2024-05-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn delete_of_unknown_id_reports_success() {
    let app = app();
    create(&app, "survivor", "2024-05-01").await;

    let (status, body) = send(
        &app,
        Method::DELETE,
        Some(json!({ "id": uuid::Uuid::new_v4().to_string() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Log deleted successfully");

    let (_, body) = send(&app, Method::GET, None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unreachable_store_is_service_unavailable() {
    let blocker = tempfile::NamedTempFile::new().unwrap();
    let config = Config {
        database_url: blocker
            .path()
            .join("logs.db")
            .to_string_lossy()
            .into_owned(),
        ..Config::default()
    };
    let app = build_router(&config, build_service(&config));

    let (status, body) = send(&app, Method::GET, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn file_store_persists_across_services() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        database_url: format!("sqlite://{}", dir.path().join("logs.db").display()),
        ..Config::default()
    };

    let first = build_router(&config, build_service(&config));
    create(&first, "written once", "2024-05-01").await;

    let second = build_router(&config, build_service(&config));
    let (_, body) = send(&second, Method::GET, None).await;
    assert_eq!(body[0]["content"], "written once");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_connects_share_one_handle() {
    let config = memory_config();
    let service = build_service(&config);

    let handles = join_all((0..16).map(|_| {
        let service = service.clone();
        async move { service.connections().connect().await.unwrap() }
    }))
    .await;

    assert!(handles
        .windows(2)
        .all(|pair| pair[0].same_connection(&pair[1])));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_all_land() {
    let app = app();
    join_all((0..20).map(|i| {
        let app = app.clone();
        async move { create(&app, &format!("note {i}"), "2024-05-01").await }
    }))
    .await;

    let (_, body) = send(&app, Method::GET, None).await;
    assert_eq!(body.as_array().unwrap().len(), 20);
}
