//! Request payloads and result types.
//!
//! Field names follow the backend's camelCase JSON.

use serde::{Deserialize, Serialize};

/// Body of `PUT /api/hostname`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeHostname {
    pub hostname: String,
}

/// Body of `PUT /api/settings/video/fps`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SetVideoFps {
    pub video_fps: u32,
}

/// Body of `PUT /api/settings/video/jpeg_quality`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SetVideoJpegQuality {
    pub video_jpeg_quality: u32,
}

/// Result of a shutdown or restart. The backend sends no details, so this
/// serializes to `{}`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShutdownResponse {}
