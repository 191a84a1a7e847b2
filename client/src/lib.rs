//! Asynchronous client for the device's control API.
//!
//! # Overview
//! Wraps the sans-io `pilot-core` with a `Transport` that performs the
//! actual HTTP round-trip. `Controller` exposes every device operation as
//! an `async fn` returning `Result<_, OperationError>`.
//!
//! # Design
//! - `Transport` is a trait so tests and other HTTP stacks can stand in for
//!   `ReqwestTransport`.
//! - The CSRF token stays in one `CsrfStore`; the controller reads it on
//!   every mutating call and `refresh_csrf_token` is the only writer.
//! - No retries, caching or timeouts beyond the transport's own.

pub mod config;
pub mod controller;
pub mod transport;

pub use config::ClientConfig;
pub use controller::Controller;
pub use pilot_core::{CsrfStore, MetaTokenStore, OperationError, ShutdownResponse};
pub use transport::{ReqwestTransport, Transport};
