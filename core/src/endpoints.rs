//! The device's HTTP endpoints.

use crate::classify::Strategy;
use crate::http::HttpMethod;

/// One backend capability: where it lives and how its responses read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub method: HttpMethod,
    pub path: &'static str,
    pub strategy: Strategy,
    /// Mutating requests carry the anti-forgery token.
    pub mutating: bool,
}

const fn get(path: &'static str, strategy: Strategy) -> Endpoint {
    Endpoint {
        method: HttpMethod::Get,
        path,
        strategy,
        mutating: false,
    }
}

const fn mutate(method: HttpMethod, path: &'static str, strategy: Strategy) -> Endpoint {
    Endpoint {
        method,
        path,
        strategy,
        mutating: true,
    }
}

pub const VERSION: Endpoint = get("/api/version", Strategy::Legacy);
pub const LATEST_RELEASE: Endpoint = get("/api/latestRelease", Strategy::Legacy);
pub const SHUTDOWN: Endpoint = mutate(HttpMethod::Post, "/api/shutdown", Strategy::Legacy);
pub const RESTART: Endpoint = mutate(HttpMethod::Post, "/api/restart", Strategy::Legacy);
pub const START_UPDATE: Endpoint = mutate(HttpMethod::Put, "/api/update", Strategy::Legacy);
pub const UPDATE_STATUS: Endpoint = get("/api/update", Strategy::Legacy);
pub const HOSTNAME: Endpoint = get("/api/hostname", Strategy::Uniform);
pub const CHANGE_HOSTNAME: Endpoint = mutate(HttpMethod::Put, "/api/hostname", Strategy::Uniform);
pub const STATUS: Endpoint = get("/api/status", Strategy::Legacy);
/// Plain text, so only the status is checked.
pub const DEBUG_LOGS: Endpoint = get("/api/debugLogs", Strategy::Legacy);
pub const VIDEO_FPS: Endpoint = get("/api/settings/video/fps", Strategy::Legacy);
pub const SET_VIDEO_FPS: Endpoint =
    mutate(HttpMethod::Put, "/api/settings/video/fps", Strategy::Legacy);
pub const VIDEO_JPEG_QUALITY: Endpoint = get("/api/settings/video/jpeg_quality", Strategy::Legacy);
pub const SET_VIDEO_JPEG_QUALITY: Endpoint =
    mutate(HttpMethod::Put, "/api/settings/video/jpeg_quality", Strategy::Legacy);
pub const APPLY_VIDEO_SETTINGS: Endpoint =
    mutate(HttpMethod::Post, "/api/settings/video/apply", Strategy::Legacy);
/// Root of the log-sharing host. Cross-origin, so it never sees the token.
pub const SHARE_LOGS: Endpoint = Endpoint {
    method: HttpMethod::Put,
    path: "/",
    strategy: Strategy::Legacy,
    mutating: false,
};
/// The server-rendered page that embeds the token.
pub const ROOT_PAGE: Endpoint = get("/", Strategy::Legacy);
