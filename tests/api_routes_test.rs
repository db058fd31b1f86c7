//! Integration tests for the HTTP API.
//!
//! Each test builds a router over an in-memory database and drives it with
//! `tower::ServiceExt::oneshot`, covering the full request path: routing,
//! body deserialization, storage, and error-to-status mapping.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tasktimer::server::{router, AppState};
use tasktimer::storage::Storage;
use tower::ServiceExt;

fn test_app() -> Router {
    let storage = Storage::open_in_memory().unwrap();
    router(AppState::new(storage))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_board(app: &Router, label: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/boards",
        Some(json!({"label": label, "color": "#4a90d9"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_board_crud_flow() {
    let app = test_app();
    let a = create_board(&app, "A").await;
    let b = create_board(&app, "B").await;
    let _c = create_board(&app, "C").await;

    let (status, boards) = send(&app, Method::GET, "/api/boards", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(boards.as_array().unwrap().len(), 3);
    assert_eq!(boards[0]["label"], "A");

    // Patch only the label; color must survive
    let (status, patched) = send(
        &app,
        Method::PATCH,
        &format!("/api/boards/{a}"),
        Some(json!({"label": "Backlog"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["label"], "Backlog");
    assert_eq!(patched["color"], "#4a90d9");

    // Empty patch is a 400
    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/boards/{a}"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("no fields"));

    // Delete the middle board: the list compacts
    let (status, _) = send(&app, Method::DELETE, &format!("/api/boards/{b}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, boards) = send(&app, Method::GET, "/api/boards", None).await;
    let orders: Vec<i64> = boards
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["sort_order"].as_i64().unwrap())
        .collect();
    assert_eq!(orders, vec![0, 1]);
}

#[tokio::test]
async fn test_board_reorder_route() {
    let app = test_app();
    let a = create_board(&app, "A").await;
    let _b = create_board(&app, "B").await;
    let _c = create_board(&app, "C").await;

    let (status, moved) = send(
        &app,
        Method::POST,
        &format!("/api/boards/{a}/reorder"),
        Some(json!({"sort_order": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["sort_order"], 2);

    let (_, boards) = send(&app, Method::GET, "/api/boards", None).await;
    let labels: Vec<&str> = boards
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["B", "C", "A"]);
}

#[tokio::test]
async fn test_board_not_found() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/boards/nope/reorder",
        Some(json!({"sort_order": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_task_lifecycle() {
    let app = test_app();
    let board = create_board(&app, "Todo").await;

    let (status, task) = send(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({"title": "Write report", "board_id": board})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["board_id"], board.as_str());
    assert_eq!(task["sort_order"], 0);
    let task_id = task["id"].as_str().unwrap().to_string();

    // Completed flag becomes a timestamp
    let (status, task) = send(
        &app,
        Method::PATCH,
        &format!("/api/tasks/{task_id}"),
        Some(json!({"completed": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(task["completed_at"].is_string());

    let (_, task) = send(
        &app,
        Method::PATCH,
        &format!("/api/tasks/{task_id}"),
        Some(json!({"completed": false})),
    )
    .await;
    assert!(task["completed_at"].is_null());

    let (status, _) = send(&app, Method::DELETE, &format!("/api/tasks/{task_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, Method::DELETE, &format!("/api/tasks/{task_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_task_inbox_and_cross_board_move() {
    let app = test_app();
    let x = create_board(&app, "X").await;
    let y = create_board(&app, "Y").await;

    // One inbox task, one task on each board
    let (_, inbox_task) = send(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({"title": "inbox"})),
    )
    .await;
    assert!(inbox_task.get("board_id").is_none());
    let inbox_id = inbox_task["id"].as_str().unwrap().to_string();

    let (_, on_x) = send(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({"title": "on x", "board_id": x})),
    )
    .await;
    let on_x_id = on_x["id"].as_str().unwrap().to_string();

    let (_, unassigned) = send(&app, Method::GET, "/api/tasks/unassigned", None).await;
    assert_eq!(unassigned.as_array().unwrap().len(), 1);

    // Pull the inbox task onto board X at the front
    let (status, moved) = send(
        &app,
        Method::POST,
        &format!("/api/tasks/{inbox_id}/reorder"),
        Some(json!({"board_id": x, "sort_order": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["sort_order"], 0);

    // Move the other task across to Y
    let (status, moved) = send(
        &app,
        Method::POST,
        &format!("/api/tasks/{on_x_id}/reorder"),
        Some(json!({"board_id": y, "sort_order": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["board_id"], y.as_str());

    let (_, tasks) = send(&app, Method::GET, "/api/tasks", None).await;
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    for task in tasks {
        assert_eq!(task["sort_order"], 0);
    }

    // Unassign back to the inbox
    let (status, back) = send(
        &app,
        Method::POST,
        &format!("/api/tasks/{on_x_id}/reorder"),
        Some(json!({"board_id": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(back.get("board_id").is_none());
}

#[tokio::test]
async fn test_task_unknown_board_is_bad_request() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({"title": "t", "board_id": "missing"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("board_id"));
}

#[tokio::test]
async fn test_project_flow() {
    let app = test_app();
    let board = create_board(&app, "Todo").await;

    let (status, project) = send(
        &app,
        Method::POST,
        "/api/projects",
        Some(json!({"name": "Alpha", "short_name": "AL"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let project_id = project["id"].as_str().unwrap().to_string();
    assert!(project["color"].is_null());

    // Task on a board, referencing the project
    let (_, task) = send(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({"title": "t", "board_id": board, "project_id": project_id})),
    )
    .await;
    assert_eq!(task["project"]["short_name"], "AL");

    let (status, tasks) = send(
        &app,
        Method::GET,
        &format!("/api/projects/{project_id}/tasks"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["board_name"], "Todo");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/projects/{project_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/projects/{project_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
