use std::time::Duration;

use axum::http::{Method, StatusCode};

use crate::helpers::{FakePm2, ScriptedShell};
use crate::support::{app, send};
use lightdeck::domain::DeckError;

#[tokio::test]
async fn status_lists_processes() {
    let app = app(FakePm2::with(&["api", "worker"]));
    let (status, body) = send(&app, Method::GET, "/api/pm2/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processes"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["processes"][0]["pm2_env"]["status"], "online");
}

#[tokio::test]
async fn unknown_process_is_404() {
    let app = app(FakePm2::with(&["api"]));
    let (status, body) = send(&app, Method::GET, "/api/pm2/status/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Process 'nope' not found");

    let (status, body) = send(&app, Method::GET, "/api/pm2/status/api", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["process"]["name"], "api");
}

#[tokio::test]
async fn restart_ghost_fails_then_start_succeeds() {
    let fake = FakePm2::with(&[]);
    let app = app(fake.clone());

    let (status, body) = send(&app, Method::POST, "/api/pm2/restart/ghost", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(fake.names().is_empty());

    let (_, body) = send(&app, Method::POST, "/api/pm2/start/ghost", None).await;
    assert_eq!(body["success"], true);

    let (status, _) = send(&app, Method::GET, "/api/pm2/status/ghost", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn start_with_relative_cwd_is_400() {
    let app = app(FakePm2::with(&[]));
    let (status, _) = send(&app, Method::POST, "/api/pm2/start/shop?cwd=srv/shop", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn option_like_process_names_are_400() {
    let fake = FakePm2::with(&["api"]);
    let app = app(fake.clone());
    for uri in [
        "/api/pm2/stop/--help",
        "/api/pm2/restart/-s",
        "/api/pm2/start/--version",
    ] {
        let (status, body) = send(&app, Method::POST, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["success"], false);
    }
    let (status, _) = send(&app, Method::GET, "/api/logs/--help", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        send(&app, Method::POST, "/api/pm2/start/shop?cwd=/srv/shop&entry=--help", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(fake.commands().is_empty());
}

#[tokio::test]
async fn sync_and_auto_map() {
    let app = app(FakePm2::with(&["api", "worker"]));
    let (status, body) = send(&app, Method::GET, "/api/pm2/sync", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["totalPM2"], 2);
    assert_eq!(body["totalDB"], 0);
    assert_eq!(body["unmappedCount"], 2);

    let (status, body) = send(&app, Method::POST, "/api/pm2/auto-map", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["mapped"][0]["pm2Name"], "api");

    let (_, body) = send(&app, Method::GET, "/api/pm2/sync", None).await;
    assert_eq!(body["unmappedCount"], 0);
    assert_eq!(body["mappedCount"], 2);
}

#[tokio::test]
async fn logs_default_and_capped_line_counts() {
    let shell = ScriptedShell::replying(vec![crate::helpers::ok("a\n"), crate::helpers::ok("b\n")]);
    let app = app(shell.clone());

    let (status, body) = send(&app, Method::GET, "/api/logs/api?lines=abc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["logs"], "a\n");
    send(&app, Method::GET, "/api/logs/api?lines=999999", None).await;

    let commands = shell.commands();
    assert!(commands[0].contains("--lines 100 "));
    assert!(commands[1].contains("--lines 10000 "));
}

#[tokio::test]
async fn transport_failures_map_to_gateway_statuses() {
    let shell = ScriptedShell::new(vec![
        Err(DeckError::Transport("Connection refused".into())),
        Err(DeckError::Timeout(Duration::from_secs(30))),
        Err(DeckError::Configuration("SSH private key not loaded".into())),
    ]);
    let app = app(shell);

    let (status, body) = send(&app, Method::GET, "/api/pm2/status", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["error"],
        "PM2 status failed: SSH transport error: Connection refused"
    );

    let (status, _) = send(&app, Method::POST, "/api/pm2/stop/api", None).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);

    let (status, _) = send(&app, Method::POST, "/api/pm2/restart/api", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
