use thiserror::Error;

/// Problems detected while building a run, before any request goes out.
///
/// A `ConfigError` always aborts the whole run; nothing is dispatched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("at least one virtual user is required")]
    NoUsers,
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
    #[error("unsupported HTTP method `{0}` (expected GET, POST, PUT or DELETE)")]
    UnsupportedMethod(String),
    #[error("invalid target URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("invalid body field `{0}` (expected key=value)")]
    InvalidField(String),
    #[error("invalid header `{0}` (expected `Name: value`)")]
    InvalidHeader(String),
}

/// Failure while rendering results.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum VolleyError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Report(#[from] ReportError),
}
