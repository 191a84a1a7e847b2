//! Executing `HttpRequest` values.
//!
//! # Design
//! `Transport` is the seam between the sans-io core and a real HTTP stack.
//! Implementations must report failures with an explicit
//! `TransportErrorKind` so that callers never inspect error text.

use std::future::Future;
use std::io;
use std::time::Duration;

use pilot_core::{HttpMethod, HttpRequest, HttpResponse, TransportError, TransportErrorKind};

/// Executes one request and reports either the response or why there is
/// none. Redirects must not be followed.
pub trait Transport {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// `Transport` backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// `timeout` bounds the whole request; `None` waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::custom(
            |attempt| attempt.error("redirects are not followed"),
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| TransportError::new(TransportErrorKind::Other, err.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
        };
        let mut builder = self.client.request(method, &request.path);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(classify_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(classify_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Map a reqwest failure onto the transport taxonomy. Anything that fails
/// while sending (refused, reset, closed early) means the connection is
/// gone.
pub fn classify_error(err: reqwest::Error) -> TransportError {
    let kind = if err.is_redirect() {
        TransportErrorKind::Redirect
    } else if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() || err.is_request() || lost_connection_cause(&err) {
        TransportErrorKind::ConnectionLost
    } else {
        TransportErrorKind::Other
    };
    TransportError::new(kind, err.to_string())
}

fn lost_connection_cause(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Wrapper(io::Error);

    impl std::fmt::Display for Wrapper {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "request failed")
        }
    }

    impl std::error::Error for Wrapper {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[derive(Debug)]
    struct Outer(Wrapper);

    impl std::fmt::Display for Outer {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "outer")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn finds_reset_deep_in_source_chain() {
        let err = Outer(Wrapper(io::Error::from(io::ErrorKind::ConnectionReset)));
        assert!(lost_connection_cause(&err));
    }

    #[test]
    fn other_io_errors_are_not_connection_loss() {
        let err = Outer(Wrapper(io::Error::from(io::ErrorKind::InvalidData)));
        assert!(!lost_connection_cause(&err));
    }

    #[test]
    fn builds_with_and_without_timeout() {
        assert!(ReqwestTransport::new(None).is_ok());
        assert!(ReqwestTransport::new(Some(Duration::from_secs(5))).is_ok());
    }
}
