//! In-process stand-in for the device backend and the log-sharing host.
//!
//! Legacy endpoints answer with the `{success, error}` envelope, the
//! hostname endpoints with bare JSON and `{message, code}` errors. Mutations
//! require the `X-CSRFToken` header to match the token embedded in `GET /`.
//! Shutdown and restart rotate the token and answer 502, the way the
//! device's reverse proxy does once its upstream has gone away.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const CSRF_HEADER: &str = "x-csrftoken";

#[derive(Clone, Debug)]
pub struct Device {
    pub csrf_token: String,
    pub version: String,
    pub latest_release: String,
    pub hostname: String,
    pub update_status: String,
    pub video_fps: u32,
    pub video_jpeg_quality: u32,
    pub applied_video_settings: Option<(u32, u32)>,
    pub debug_logs: String,
}

impl Default for Device {
    fn default() -> Self {
        Self {
            csrf_token: new_token(),
            version: "1.9.1".to_string(),
            latest_release: "1.9.2".to_string(),
            hostname: "tinypilot".to_string(),
            update_status: "NOT_RUNNING".to_string(),
            video_fps: 30,
            video_jpeg_quality: 80,
            applied_video_settings: None,
            debug_logs: "ustreamer: started\nnginx: started\n".to_string(),
        }
    }
}

#[derive(Deserialize)]
pub struct HostnameBody {
    pub hostname: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFpsBody {
    pub video_fps: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoJpegQualityBody {
    pub video_jpeg_quality: u32,
}

pub type Db = Arc<RwLock<Device>>;
pub type Pastes = Arc<RwLock<HashMap<String, String>>>;

pub fn app() -> Router {
    app_with_state(Arc::new(RwLock::new(Device::default())))
}

pub fn app_with_state(db: Db) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/version", get(version))
        .route("/api/latestRelease", get(latest_release))
        .route("/api/shutdown", post(shutdown))
        .route("/api/restart", post(shutdown))
        .route("/api/update", get(update_status).put(start_update))
        .route("/api/hostname", get(hostname).put(change_hostname))
        .route("/api/status", get(status))
        .route("/api/debugLogs", get(debug_logs))
        .route("/api/settings/video/fps", get(video_fps).put(set_video_fps))
        .route(
            "/api/settings/video/jpeg_quality",
            get(video_jpeg_quality).put(set_video_jpeg_quality),
        )
        .route("/api/settings/video/apply", post(apply_video_settings))
        .with_state(db)
}

/// The log-sharing host: `PUT /` stores a paste, `GET /{id}` returns it.
pub fn share_app() -> Router {
    let pastes: Pastes = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/", put(create_paste))
        .route("/{id}", get(get_paste))
        .with_state(pastes)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_share(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, share_app()).await
}

fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

fn envelope(fields: Value) -> Json<Value> {
    let mut body = json!({ "success": true, "error": null });
    if let (Some(body), Value::Object(fields)) = (body.as_object_mut(), fields) {
        body.extend(fields);
    }
    Json(body)
}

fn failure(message: &str) -> Json<Value> {
    Json(json!({ "success": false, "error": message }))
}

fn check_csrf(device: &Device, headers: &HeaderMap) -> Result<(), Response> {
    match headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok()) {
        None => Err((StatusCode::BAD_REQUEST, Html("The CSRF token is missing.")).into_response()),
        Some(token) if token != device.csrf_token => {
            Err((StatusCode::BAD_REQUEST, Html("The CSRF token is invalid.")).into_response())
        }
        Some(_) => Ok(()),
    }
}

/// Hostname rules the device enforces: 1-63 characters of `[a-z0-9-]`, no
/// leading or trailing dash, and not `localhost`.
pub fn validate_hostname(hostname: &str) -> Result<(), &'static str> {
    let valid_chars = hostname
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if hostname.is_empty() || hostname.len() > 63 || !valid_chars {
        return Err("Invalid hostname");
    }
    if hostname.starts_with('-') || hostname.ends_with('-') {
        return Err("Invalid hostname");
    }
    if hostname == "localhost" {
        return Err("The hostname `localhost` is reserved");
    }
    Ok(())
}

async fn index(State(db): State<Db>) -> Html<String> {
    let device = db.read().await;
    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"csrf-token\" content=\"{}\">\n<title>{}</title>\n</head>\n\
         <body></body>\n</html>\n",
        device.csrf_token, device.hostname
    ))
}

async fn version(State(db): State<Db>) -> Json<Value> {
    envelope(json!({ "version": db.read().await.version }))
}

async fn latest_release(State(db): State<Db>) -> Json<Value> {
    envelope(json!({ "version": db.read().await.latest_release }))
}

async fn shutdown(State(db): State<Db>, headers: HeaderMap) -> Response {
    let mut device = db.write().await;
    if let Err(rejection) = check_csrf(&device, &headers) {
        return rejection;
    }
    device.csrf_token = new_token();
    tracing::info!("device going down, sessions reset");
    (
        StatusCode::BAD_GATEWAY,
        Html("<html><body><h1>502 Bad Gateway</h1></body></html>"),
    )
        .into_response()
}

async fn start_update(State(db): State<Db>, headers: HeaderMap) -> Response {
    let mut device = db.write().await;
    if let Err(rejection) = check_csrf(&device, &headers) {
        return rejection;
    }
    device.update_status = "DONE".to_string();
    envelope(json!({})).into_response()
}

async fn update_status(State(db): State<Db>) -> Json<Value> {
    envelope(json!({ "status": db.read().await.update_status }))
}

async fn hostname(State(db): State<Db>) -> Json<Value> {
    Json(json!({ "hostname": db.read().await.hostname }))
}

async fn change_hostname(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<HostnameBody>,
) -> Response {
    let mut device = db.write().await;
    if let Err(rejection) = check_csrf(&device, &headers) {
        return rejection;
    }
    if let Err(message) = validate_hostname(&input.hostname) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": message, "code": "INVALID_HOSTNAME" })),
        )
            .into_response();
    }
    tracing::info!(hostname = %input.hostname, "hostname changed");
    device.hostname = input.hostname;
    Json(json!({ "hostname": device.hostname })).into_response()
}

async fn status() -> Json<Value> {
    envelope(json!({}))
}

async fn debug_logs(State(db): State<Db>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        db.read().await.debug_logs.clone(),
    )
}

async fn video_fps(State(db): State<Db>) -> Json<Value> {
    envelope(json!({ "videoFps": db.read().await.video_fps }))
}

async fn set_video_fps(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<VideoFpsBody>,
) -> Response {
    let mut device = db.write().await;
    if let Err(rejection) = check_csrf(&device, &headers) {
        return rejection;
    }
    if !(1..=30).contains(&input.video_fps) {
        return failure("Frame rate must be between 1 and 30").into_response();
    }
    device.video_fps = input.video_fps;
    envelope(json!({})).into_response()
}

async fn video_jpeg_quality(State(db): State<Db>) -> Json<Value> {
    envelope(json!({ "videoJpegQuality": db.read().await.video_jpeg_quality }))
}

async fn set_video_jpeg_quality(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<VideoJpegQualityBody>,
) -> Response {
    let mut device = db.write().await;
    if let Err(rejection) = check_csrf(&device, &headers) {
        return rejection;
    }
    if !(1..=100).contains(&input.video_jpeg_quality) {
        return failure("JPEG quality must be between 1 and 100").into_response();
    }
    device.video_jpeg_quality = input.video_jpeg_quality;
    envelope(json!({})).into_response()
}

async fn apply_video_settings(State(db): State<Db>, headers: HeaderMap) -> Response {
    let mut device = db.write().await;
    if let Err(rejection) = check_csrf(&device, &headers) {
        return rejection;
    }
    device.applied_video_settings = Some((device.video_fps, device.video_jpeg_quality));
    envelope(json!({})).into_response()
}

async fn create_paste(State(pastes): State<Pastes>, body: String) -> Json<Value> {
    let id = Uuid::new_v4().simple().to_string()[..8].to_string();
    pastes.write().await.insert(id.clone(), body);
    Json(json!({ "id": id }))
}

async fn get_paste(
    State(pastes): State<Pastes>,
    Path(id): Path<String>,
) -> Result<String, StatusCode> {
    pastes.read().await.get(&id).cloned().ok_or(StatusCode::NOT_FOUND)
}
