//! Asynchronous device operations.
//!
//! # Design
//! `Controller` composes the sans-io `DeviceApi` with a `Transport` and a
//! `CsrfStore`. Each operation reads the token fresh, builds one request,
//! awaits one response and parses it. Nothing is cached or retried; a
//! failed operation can simply be called again.

use pilot_core::{
    CsrfStore, DeviceApi, HttpRequest, HttpResponse, MetaTokenStore, OperationError,
    ShutdownResponse, TransportError,
};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::transport::{ReqwestTransport, Transport};

pub struct Controller<T, S> {
    api: DeviceApi,
    transport: T,
    csrf: S,
}

impl Controller<ReqwestTransport, MetaTokenStore> {
    /// A controller over reqwest with an empty token store. Call
    /// `refresh_csrf_token` before any mutating operation.
    pub fn from_config(config: &ClientConfig) -> Result<Self, OperationError> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self::new(
            DeviceApi::from_config(&config.api),
            transport,
            MetaTokenStore::empty(),
        ))
    }
}

impl<T: Transport, S: CsrfStore> Controller<T, S> {
    pub fn new(api: DeviceApi, transport: T, csrf: S) -> Self {
        Self {
            api,
            transport,
            csrf,
        }
    }

    pub fn api(&self) -> &DeviceApi {
        &self.api
    }

    pub fn csrf(&self) -> &S {
        &self.csrf
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        tracing::debug!(method = %request.method, path = %request.path, "sending request");
        let outcome = self.transport.execute(request).await;
        match &outcome {
            Ok(response) => tracing::debug!(status = response.status, "response received"),
            Err(err) => tracing::debug!(error = %err, kind = ?err.kind, "transport failed"),
        }
        outcome
    }

    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, OperationError> {
        Ok(self.send(request).await?)
    }

    pub async fn get_version(&self) -> Result<String, OperationError> {
        let response = self.fetch(self.api.build_get_version()).await?;
        self.api.parse_get_version(response)
    }

    pub async fn get_latest_release(&self) -> Result<String, OperationError> {
        let response = self.fetch(self.api.build_get_latest_release()).await?;
        self.api.parse_get_latest_release(response)
    }

    /// Shut down, or restart when `restart` is set. Resolves once the device
    /// accepted the request or visibly went down.
    pub async fn shutdown(&self, restart: bool) -> Result<ShutdownResponse, OperationError> {
        let request = self.api.build_shutdown(restart, &self.csrf.read()?);
        let outcome = self.send(request).await;
        self.api.parse_shutdown(outcome)
    }

    pub async fn update(&self) -> Result<Value, OperationError> {
        let request = self.api.build_update(&self.csrf.read()?);
        let response = self.fetch(request).await?;
        self.api.parse_update(response)
    }

    pub async fn get_update_status(&self) -> Result<String, OperationError> {
        let response = self.fetch(self.api.build_get_update_status()).await?;
        self.api.parse_get_update_status(response)
    }

    pub async fn determine_hostname(&self) -> Result<String, OperationError> {
        let response = self.fetch(self.api.build_determine_hostname()).await?;
        self.api.parse_determine_hostname(response)
    }

    pub async fn change_hostname(&self, hostname: &str) -> Result<String, OperationError> {
        let request = self.api.build_change_hostname(hostname, &self.csrf.read()?)?;
        let response = self.fetch(request).await?;
        self.api.parse_change_hostname(response, hostname)
    }

    /// Probe whether a device answers. `base_url` targets another device.
    pub async fn check_status(&self, base_url: Option<&str>) -> Result<bool, OperationError> {
        let response = self.fetch(self.api.build_check_status(base_url)).await?;
        self.api.parse_check_status(response)
    }

    pub async fn get_debug_logs(&self) -> Result<String, OperationError> {
        let response = self.fetch(self.api.build_get_debug_logs()).await?;
        self.api.parse_get_debug_logs(response)
    }

    /// Upload `text` to the log-sharing host and return its public URL.
    pub async fn text_to_shareable_url(&self, text: &str) -> Result<String, OperationError> {
        let response = self.fetch(self.api.build_text_to_shareable_url(text)).await?;
        self.api.parse_text_to_shareable_url(response)
    }

    pub async fn get_video_fps(&self) -> Result<u32, OperationError> {
        let response = self.fetch(self.api.build_get_video_fps()).await?;
        self.api.parse_get_video_fps(response)
    }

    pub async fn set_video_fps(&self, video_fps: u32) -> Result<(), OperationError> {
        let request = self.api.build_set_video_fps(video_fps, &self.csrf.read()?)?;
        let response = self.fetch(request).await?;
        self.api.parse_set_video_fps(response)
    }

    pub async fn get_video_jpeg_quality(&self) -> Result<u32, OperationError> {
        let response = self.fetch(self.api.build_get_video_jpeg_quality()).await?;
        self.api.parse_get_video_jpeg_quality(response)
    }

    pub async fn set_video_jpeg_quality(&self, video_jpeg_quality: u32) -> Result<(), OperationError> {
        let request = self
            .api
            .build_set_video_jpeg_quality(video_jpeg_quality, &self.csrf.read()?)?;
        let response = self.fetch(request).await?;
        self.api.parse_set_video_jpeg_quality(response)
    }

    pub async fn apply_video_settings(&self) -> Result<(), OperationError> {
        let request = self.api.build_apply_video_settings(&self.csrf.read()?);
        let response = self.fetch(request).await?;
        self.api.parse_apply_video_settings(response)
    }

    /// Re-read the token from the server-rendered page, e.g. after a restart
    /// reset the sessions. Reads issued before this completes saw the old
    /// token.
    pub async fn refresh_csrf_token(&self) -> Result<(), OperationError> {
        let outcome = self.send(self.api.build_refresh_csrf_token()).await;
        let token = self
            .api
            .parse_refresh_csrf_token(outcome)
            .inspect_err(|err| tracing::warn!(error = %err, "CSRF token refresh failed"))?;
        self.csrf.write(&token);
        Ok(())
    }
}
