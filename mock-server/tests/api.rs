use std::sync::Arc;

use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_state, share_app, Device, CSRF_HEADER};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes: bytes::Bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get_request(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, token: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header(CSRF_HEADER, token)
        .body(body.to_string())
        .unwrap()
}

fn content_type(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn device() -> (mock_server::Db, String) {
    let device = Device::default();
    let token = device.csrf_token.clone();
    (Arc::new(RwLock::new(device)), token)
}

// --- page ---

#[tokio::test]
async fn index_embeds_csrf_token() {
    let (db, token) = device();
    let resp = app_with_state(db).oneshot(get_request("/")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(content_type(&resp).starts_with("text/html"));
    let html = body_text(resp).await;
    assert!(html.contains(&format!(r#"<meta name="csrf-token" content="{token}">"#)));
}

// --- legacy envelope endpoints ---

#[tokio::test]
async fn version_uses_envelope() {
    let resp = app().oneshot(get_request("/api/version")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(content_type(&resp).starts_with("application/json"));
    let body = body_json(resp).await;
    assert_eq!(body, json!({"success": true, "error": null, "version": "1.9.1"}));
}

#[tokio::test]
async fn update_status_starts_not_running() {
    let resp = app().oneshot(get_request("/api/update")).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["status"], "NOT_RUNNING");
}

#[tokio::test]
async fn repeated_update_succeeds() {
    use tower::Service;

    let (db, token) = device();
    let mut app = app_with_state(db.clone()).into_service();

    for _ in 0..2 {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(json_request("PUT", "/api/update", &token, ""))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"success": true, "error": null}));
    }
    assert_eq!(db.read().await.update_status, "DONE");
}

#[tokio::test]
async fn set_video_fps_out_of_range_is_logical_failure() {
    let (db, token) = device();
    let resp = app_with_state(db.clone())
        .oneshot(json_request("PUT", "/api/settings/video/fps", &token, r#"{"videoFps":60}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Frame rate must be between 1 and 30");
    assert_eq!(db.read().await.video_fps, 30);
}

#[tokio::test]
async fn debug_logs_are_plain_text() {
    let resp = app().oneshot(get_request("/api/debugLogs")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(content_type(&resp).starts_with("text/plain"));
    assert!(body_text(resp).await.contains("ustreamer"));
}

// --- csrf ---

#[tokio::test]
async fn mutation_without_token_is_rejected_as_html() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/settings/video/apply")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(content_type(&resp).starts_with("text/html"));
    assert_eq!(body_text(resp).await, "The CSRF token is missing.");
}

#[tokio::test]
async fn mutation_with_stale_token_is_rejected() {
    let resp = app()
        .oneshot(json_request("PUT", "/api/update", "stale", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(resp).await, "The CSRF token is invalid.");
}

// --- power ---

#[tokio::test]
async fn shutdown_answers_502_and_rotates_token() {
    let (db, token) = device();
    let resp = app_with_state(db.clone())
        .oneshot(json_request("POST", "/api/restart", &token, ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_ne!(db.read().await.csrf_token, token);
}

// --- hostname (uniform) ---

#[tokio::test]
async fn change_hostname_invalid_returns_message_and_code() {
    let (db, token) = device();
    let resp = app_with_state(db)
        .oneshot(json_request("PUT", "/api/hostname", &token, r#"{"hostname":"-bad"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body, json!({"message": "Invalid hostname", "code": "INVALID_HOSTNAME"}));
}

#[tokio::test]
async fn change_hostname_lifecycle() {
    use tower::Service;

    let (db, token) = device();
    let mut app = app_with_state(db).into_service();

    // change
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("PUT", "/api/hostname", &token, r#"{"hostname":"device-1"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"hostname": "device-1"}));

    // read back — bare JSON, no envelope
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request("/api/hostname"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({"hostname": "device-1"}));
}

// --- share host ---

#[tokio::test]
async fn share_host_stores_paste() {
    use tower::Service;

    let mut app = share_app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("PUT")
                .uri("/")
                .body("log text".to_string())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let id = body_json(resp).await["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 8);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request(&format!("/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "log text");
}
