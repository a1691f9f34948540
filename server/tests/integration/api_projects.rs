use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::helpers::{FakePm2, ScriptedShell, ok};
use crate::support::{app, send};

#[tokio::test]
async fn health_reports_ok() {
    let app = app(FakePm2::with(&[]));
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn create_then_duplicate_is_409() {
    let app = app(FakePm2::with(&[]));
    let req = json!({ "name": "app1", "path": "/srv/app1" });

    let (status, body) = send(&app, Method::POST, "/api/projects", Some(req.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["project"]["id"], "1");
    assert_eq!(body["project"]["pm2Name"], "app1");
    assert_eq!(body["project"]["type"], "mern");

    let (status, body) = send(&app, Method::POST, "/api/projects", Some(req)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Project with this name already exists");
}

#[tokio::test]
async fn create_without_path_is_400() {
    let app = app(FakePm2::with(&[]));
    let (status, body) =
        send(&app, Method::POST, "/api/projects", Some(json!({ "name": "app1" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Project name and path are required");
}

#[tokio::test]
async fn create_with_option_like_pm2_name_is_400() {
    let app = app(FakePm2::with(&[]));
    let req = json!({ "name": "app1", "path": "/srv/app1", "pm2Name": "--help" });
    let (status, body) = send(&app, Method::POST, "/api/projects", Some(req)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, body) = send(&app, Method::GET, "/api/projects", None).await;
    assert_eq!(body["projects"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn update_list_and_delete() {
    let app = app(FakePm2::with(&[]));
    send(
        &app,
        Method::POST,
        "/api/projects",
        Some(json!({ "name": "app1", "path": "/srv/app1", "buildSteps": ["git pull"] })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/projects/1",
        Some(json!({ "description": "shop", "deploySteps": [{ "type": "command", "command": "npm ci" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project"]["description"], "shop");
    assert_eq!(body["project"]["buildSteps"][0]["command"], "git pull");
    assert_eq!(body["project"]["deploySteps"][0]["type"], "command");

    let (_, body) = send(&app, Method::GET, "/api/projects", None).await;
    assert_eq!(body["projects"].as_array().map(Vec::len), Some(1));

    let (status, body) = send(&app, Method::DELETE, "/api/projects/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Project deleted");

    let (status, _) = send(&app, Method::DELETE, "/api/projects/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn clone_failure_is_502_with_details() {
    let shell = ScriptedShell::replying(vec![
        ok("NOT_EXISTS\n"),
        crate::helpers::failed(128, "fatal: repository not found\n"),
    ]);
    let app = app(shell);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/projects/clone",
        Some(json!({ "gitUrl": "https://example.com/x.git", "targetPath": "/home/bitnami/x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Failed to clone repository");
    assert_eq!(body["details"], "fatal: repository not found\n");

    let (_, body) = send(&app, Method::GET, "/api/projects", None).await;
    assert_eq!(body["projects"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn clone_into_existing_directory_is_409() {
    let app = app(ScriptedShell::replying(vec![ok("EXISTS\n")]));
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/projects/clone",
        Some(json!({ "gitUrl": "https://example.com/x.git", "targetPath": "/home/bitnami/x" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Clone failed: Directory /home/bitnami/x already exists");
}

#[tokio::test]
async fn build_of_unknown_project_is_404() {
    let app = app(FakePm2::with(&[]));
    let (status, body) = send(&app, Method::POST, "/api/build/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Project 'nope' not found");
}

#[tokio::test]
async fn build_flattens_report() {
    let app = app(ScriptedShell::replying(vec![ok("SPLIT\n"), ok("built\n")]));
    send(
        &app,
        Method::POST,
        "/api/projects",
        Some(json!({ "name": "shop", "path": "/srv/shop" })),
    )
    .await;
    let (status, body) = send(&app, Method::POST, "/api/build/shop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["output"], "built\n");
    assert_eq!(body["projectType"], "split");
}

#[tokio::test]
async fn store_probe_never_fails() {
    let app = app(FakePm2::with(&[]));
    let (status, body) = send(&app, Method::GET, "/api/system/store", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"]["backend"], "memory");
    assert_eq!(body["store"]["connected"], true);
}
