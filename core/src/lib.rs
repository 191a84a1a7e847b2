//! Sans-io client core for the device's control API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The caller executes the
//! actual HTTP round-trip, making the core fully deterministic and testable.
//!
//! # Design
//! - `DeviceApi` is stateless: it holds only configuration.
//! - Each operation is split into `build_*` and `parse_*`.
//! - Response interpretation lives in `classify`, with one named strategy
//!   per backend convention.
//! - The anti-forgery token is owned by a `CsrfStore`; builders take the
//!   token value, so nothing here caches it.

pub mod classify;
pub mod client;
pub mod config;
pub mod csrf;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod types;

pub use classify::{check_json_success, classify, Strategy};
pub use client::DeviceApi;
pub use config::{ApiConfig, ShutdownPolicy};
pub use csrf::{CsrfStore, MetaTokenStore};
pub use error::{ErrorKind, OperationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, TransportError, TransportErrorKind};
pub use types::{ChangeHostname, SetVideoFps, SetVideoJpegQuality, ShutdownResponse};
