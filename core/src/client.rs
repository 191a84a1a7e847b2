//! Stateless HTTP request builder and response parser for the device API.
//!
//! # Design
//! `DeviceApi` holds only configuration and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The caller executes the HTTP round-trip in between and reads the CSRF
//! token itself, so mutating builders take the token as an argument.
//!
//! `shutdown` and the token refresh parse a `Result<HttpResponse,
//! TransportError>` instead of a bare response: both have to interpret
//! transport failures, not just responses.

use serde::Serialize;
use serde_json::Value;

use crate::classify::{check_json_success, classify, read_legacy_response};
use crate::config::{ApiConfig, ShutdownPolicy, DEFAULT_LOG_SHARE_URL};
use crate::csrf::{extract_token, CSRF_HEADER};
use crate::endpoints::{self, Endpoint};
use crate::error::OperationError;
use crate::http::{HttpRequest, HttpResponse, TransportError};
use crate::types::{ChangeHostname, SetVideoFps, SetVideoJpegQuality, ShutdownResponse};

/// Synchronous, stateless client for the device API.
#[derive(Debug, Clone)]
pub struct DeviceApi {
    base_url: String,
    log_share_url: String,
    shutdown: ShutdownPolicy,
}

impl DeviceApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            log_share_url: DEFAULT_LOG_SHARE_URL.to_string(),
            shutdown: ShutdownPolicy::default(),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(&config.base_url)
            .with_log_share_url(&config.log_share_url)
            .with_shutdown_policy(config.shutdown)
    }

    pub fn with_log_share_url(mut self, url: &str) -> Self {
        self.log_share_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_shutdown_policy(mut self, policy: ShutdownPolicy) -> Self {
        self.shutdown = policy;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn log_share_url(&self) -> &str {
        &self.log_share_url
    }

    // --- version ---

    pub fn build_get_version(&self) -> HttpRequest {
        self.request(&endpoints::VERSION, None)
    }

    pub fn parse_get_version(&self, response: HttpResponse) -> Result<String, OperationError> {
        string_field(&legacy_envelope(&response)?, "version")
    }

    pub fn build_get_latest_release(&self) -> HttpRequest {
        self.request(&endpoints::LATEST_RELEASE, None)
    }

    pub fn parse_get_latest_release(&self, response: HttpResponse) -> Result<String, OperationError> {
        string_field(&legacy_envelope(&response)?, "version")
    }

    // --- power ---

    pub fn build_shutdown(&self, restart: bool, csrf_token: &str) -> HttpRequest {
        let endpoint = if restart {
            &endpoints::RESTART
        } else {
            &endpoints::SHUTDOWN
        };
        self.request(endpoint, Some(csrf_token))
    }

    /// A device that is going down tends to take the connection (or the
    /// proxy's upstream) with it. Those outcomes count as success when the
    /// shutdown policy says so.
    pub fn parse_shutdown(
        &self,
        outcome: Result<HttpResponse, TransportError>,
    ) -> Result<ShutdownResponse, OperationError> {
        let result = match outcome {
            Ok(response) if response.status == 502 && self.shutdown.bad_gateway_is_success => {
                tracing::info!("shutdown answered with 502, treating as success");
                return Ok(ShutdownResponse {});
            }
            Ok(response) => legacy_envelope(&response).map(|_| ShutdownResponse {}),
            Err(err) => Err(OperationError::from(err)),
        };

        match result {
            Err(err) if err.is_connection_lost() && self.shutdown.connection_lost_is_success => {
                tracing::info!(error = %err, "connection lost during shutdown, treating as success");
                Ok(ShutdownResponse {})
            }
            other => other,
        }
    }

    // --- update ---

    pub fn build_update(&self, csrf_token: &str) -> HttpRequest {
        self.request(&endpoints::START_UPDATE, Some(csrf_token))
    }

    /// Resolves with the backend's envelope unchanged.
    pub fn parse_update(&self, response: HttpResponse) -> Result<Value, OperationError> {
        legacy_envelope(&response)
    }

    pub fn build_get_update_status(&self) -> HttpRequest {
        self.request(&endpoints::UPDATE_STATUS, None)
    }

    pub fn parse_get_update_status(&self, response: HttpResponse) -> Result<String, OperationError> {
        string_field(&legacy_envelope(&response)?, "status")
    }

    // --- hostname ---

    pub fn build_determine_hostname(&self) -> HttpRequest {
        self.request(&endpoints::HOSTNAME, None)
    }

    pub fn parse_determine_hostname(&self, response: HttpResponse) -> Result<String, OperationError> {
        let body = classify(endpoints::HOSTNAME.strategy, &response)?;
        string_field(&body, "hostname")
    }

    pub fn build_change_hostname(
        &self,
        hostname: &str,
        csrf_token: &str,
    ) -> Result<HttpRequest, OperationError> {
        let payload = ChangeHostname {
            hostname: hostname.to_string(),
        };
        self.json_request(&endpoints::CHANGE_HOSTNAME, csrf_token, &payload)
    }

    /// The backend applies the name on reboot, so the requested name is the
    /// result.
    pub fn parse_change_hostname(
        &self,
        response: HttpResponse,
        requested: &str,
    ) -> Result<String, OperationError> {
        classify(endpoints::CHANGE_HOSTNAME.strategy, &response)?;
        Ok(requested.to_string())
    }

    // --- status ---

    /// `base_url` probes another device (cross-origin); `None` probes this one.
    pub fn build_check_status(&self, base_url: Option<&str>) -> HttpRequest {
        let base = base_url.map_or(self.base_url.as_str(), |b| b.trim_end_matches('/'));
        build(base, &endpoints::STATUS, None)
    }

    pub fn parse_check_status(&self, response: HttpResponse) -> Result<bool, OperationError> {
        legacy_envelope(&response)?;
        Ok(true)
    }

    // --- logs ---

    pub fn build_get_debug_logs(&self) -> HttpRequest {
        self.request(&endpoints::DEBUG_LOGS, None)
    }

    pub fn parse_get_debug_logs(&self, response: HttpResponse) -> Result<String, OperationError> {
        if !response.is_success() {
            return Err(OperationError::backend(response.reason_phrase(), None));
        }
        Ok(response.body)
    }

    pub fn build_text_to_shareable_url(&self, text: &str) -> HttpRequest {
        let mut request = build(&self.log_share_url, &endpoints::SHARE_LOGS, None);
        request
            .headers
            .push(("content-type".to_string(), "text/plain".to_string()));
        request.body = Some(text.to_string());
        request
    }

    /// The sharing host does not use the `{success, error}` envelope, so
    /// only the transport-level check applies.
    pub fn parse_text_to_shareable_url(&self, response: HttpResponse) -> Result<String, OperationError> {
        let body = read_legacy_response(&response)?;
        let id = match body.get("id") {
            None => return Err(OperationError::missing_field("id")),
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            Some(_) => return Err(OperationError::unexpected_type("id")),
        };
        Ok(format!("{}/{id}", self.log_share_url))
    }

    // --- video settings ---

    pub fn build_get_video_fps(&self) -> HttpRequest {
        self.request(&endpoints::VIDEO_FPS, None)
    }

    pub fn parse_get_video_fps(&self, response: HttpResponse) -> Result<u32, OperationError> {
        u32_field(&legacy_envelope(&response)?, "videoFps")
    }

    pub fn build_set_video_fps(
        &self,
        video_fps: u32,
        csrf_token: &str,
    ) -> Result<HttpRequest, OperationError> {
        self.json_request(&endpoints::SET_VIDEO_FPS, csrf_token, &SetVideoFps { video_fps })
    }

    pub fn parse_set_video_fps(&self, response: HttpResponse) -> Result<(), OperationError> {
        legacy_envelope(&response).map(drop)
    }

    pub fn build_get_video_jpeg_quality(&self) -> HttpRequest {
        self.request(&endpoints::VIDEO_JPEG_QUALITY, None)
    }

    pub fn parse_get_video_jpeg_quality(&self, response: HttpResponse) -> Result<u32, OperationError> {
        u32_field(&legacy_envelope(&response)?, "videoJpegQuality")
    }

    pub fn build_set_video_jpeg_quality(
        &self,
        video_jpeg_quality: u32,
        csrf_token: &str,
    ) -> Result<HttpRequest, OperationError> {
        let payload = SetVideoJpegQuality { video_jpeg_quality };
        self.json_request(&endpoints::SET_VIDEO_JPEG_QUALITY, csrf_token, &payload)
    }

    pub fn parse_set_video_jpeg_quality(&self, response: HttpResponse) -> Result<(), OperationError> {
        legacy_envelope(&response).map(drop)
    }

    pub fn build_apply_video_settings(&self, csrf_token: &str) -> HttpRequest {
        self.request(&endpoints::APPLY_VIDEO_SETTINGS, Some(csrf_token))
    }

    pub fn parse_apply_video_settings(&self, response: HttpResponse) -> Result<(), OperationError> {
        legacy_envelope(&response).map(drop)
    }

    // --- csrf ---

    /// Fetch the server-rendered root page, which embeds a fresh token.
    pub fn build_refresh_csrf_token(&self) -> HttpRequest {
        self.request(&endpoints::ROOT_PAGE, None)
    }

    /// Extract the token from the fetched page. The status is not checked:
    /// any page carrying the meta element is good enough.
    pub fn parse_refresh_csrf_token(
        &self,
        outcome: Result<HttpResponse, TransportError>,
    ) -> Result<String, OperationError> {
        let response = outcome.map_err(|err| refresh_failed(&err.message))?;
        extract_token(&response.body)
            .ok_or_else(|| refresh_failed("page has no csrf-token meta element"))
    }

    fn request(&self, endpoint: &Endpoint, csrf_token: Option<&str>) -> HttpRequest {
        build(&self.base_url, endpoint, csrf_token)
    }

    fn json_request<T: Serialize>(
        &self,
        endpoint: &Endpoint,
        csrf_token: &str,
        payload: &T,
    ) -> Result<HttpRequest, OperationError> {
        let body = serde_json::to_string(payload).map_err(OperationError::serialization)?;
        let mut request = self.request(endpoint, Some(csrf_token));
        request
            .headers
            .push(("content-type".to_string(), "application/json".to_string()));
        request.body = Some(body);
        Ok(request)
    }
}

fn build(base: &str, endpoint: &Endpoint, csrf_token: Option<&str>) -> HttpRequest {
    debug_assert_eq!(endpoint.mutating, csrf_token.is_some());
    let mut headers = vec![("cache-control".to_string(), "no-cache".to_string())];
    if let Some(token) = csrf_token {
        headers.push((CSRF_HEADER.to_string(), token.to_string()));
    }
    HttpRequest {
        method: endpoint.method,
        path: format!("{base}{}", endpoint.path),
        headers,
        body: None,
    }
}

/// Both legacy stages: transport-level check, then the envelope.
fn legacy_envelope(response: &HttpResponse) -> Result<Value, OperationError> {
    read_legacy_response(response).and_then(check_json_success)
}

fn refresh_failed(cause: &str) -> OperationError {
    OperationError::csrf(format!("Failed to refresh CSRF token: {cause}"))
}

fn string_field(body: &Value, field: &str) -> Result<String, OperationError> {
    match body.get(field) {
        None => Err(OperationError::missing_field(field)),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(OperationError::unexpected_type(field)),
    }
}

fn u32_field(body: &Value, field: &str) -> Result<u32, OperationError> {
    let value = body.get(field).ok_or_else(|| OperationError::missing_field(field))?;
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| OperationError::unexpected_type(field))
}
