use std::future::Future;

use crate::outcome::TransportResult;
use crate::request::PreparedRequest;

/// Sends one prepared request and reports what came back.
///
/// Implementations never fail: every problem is folded into a [`TransportResult`]. The
/// dispatcher puts its own deadline around `send`, so a transport only needs to report
/// `TimedOut` for deadlines it enforces itself.
///
/// # Example
/// ```rust
/// use volley::{PreparedRequest, Transport, TransportResult};
///
/// struct AlwaysOk;
///
/// impl Transport for AlwaysOk {
///     async fn send(&self, _request: &PreparedRequest) -> TransportResult {
///         TransportResult::Responded(200)
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    fn send(&self, request: &PreparedRequest) -> impl Future<Output = TransportResult> + Send;
}

#[cfg(feature = "builtins")]
pub use builtins::*;

#[cfg(feature = "builtins")]
mod builtins {
    use super::*;
    use crate::request::HttpMethod;
    use reqwest::{Client, Method};

    /// [`Transport`] backed by a shared `reqwest::Client`.
    ///
    /// Build it once per run; the client pools connections across attempts.
    #[derive(Clone, Debug, Default)]
    pub struct ReqwestTransport {
        client: Client,
    }

    impl ReqwestTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_client(client: Client) -> Self {
            Self { client }
        }
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn from_error(err: &reqwest::Error) -> TransportResult {
        if err.is_timeout() {
            TransportResult::TimedOut
        } else {
            TransportResult::Failed(err.status().map(|s| s.as_u16()))
        }
    }

    impl Transport for ReqwestTransport {
        async fn send(&self, request: &PreparedRequest) -> TransportResult {
            let mut builder = self.client.request(method(request.method), &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = match builder.send().await {
                Ok(response) => response,
                Err(err) => {
                    tracing::trace!(error = %err, url = %request.url, "request failed");
                    return from_error(&err);
                }
            };

            let status = response.status().as_u16();
            // Latency covers the whole body, not just the status line.
            match response.bytes().await {
                Err(err) if err.is_timeout() => TransportResult::TimedOut,
                _ => TransportResult::Responded(status),
            }
        }
    }
}
