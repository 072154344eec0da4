//! Volley — a batch-driven HTTP load tester.
//!
//! Volley simulates N virtual users. Each one sends a single request with the chosen
//! method to a target endpoint, optionally with a JSON body whose values embed the
//! user's index. Results stream to a reporter as they arrive and are folded into latency
//! and outcome statistics.
//!
//! # Architecture
//!
//! - [`RequestTemplate`] / [`RequestSpec`]: what every virtual user sends. Body values
//!   may contain `{i}`, replaced by the user's 1-based index.
//! - [`Transport`]: puts a [`PreparedRequest`] on the wire and reports a
//!   [`TransportResult`]. [`ReqwestTransport`] is the built-in one.
//! - [`classify`]: turns a transport result into an [`Outcome`] (Success, Timeout,
//!   Error). Any HTTP response, 5xx included, is a Success.
//! - [`Dispatcher`]: runs the specs in fixed-size batches, every attempt of a batch
//!   concurrently, with a short pause between batches and a deadline per attempt.
//! - [`StatsAggregator`]: concurrency-safe collector of [`AttemptResult`]s, summarized
//!   into a [`StatsSnapshot`].
//! - [`Reporter`]: the I/O boundary. Sees every attempt and the final [`RunSummary`].
//! - [`Scenario`]: ties a template, a [`RunConfig`], a transport and a reporter together.
//!
//! # Example
//!
//! ```rust,no_run
//! use volley::{
//!     BodyTemplate, HttpMethod, ReqwestTransport, RequestTemplate, RunConfig, Scenario,
//!     StdoutReporter,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), volley::VolleyError> {
//!     let scenario = Scenario::builder()
//!         .name("signup burst")
//!         .request(
//!             RequestTemplate::builder()
//!                 .method(HttpMethod::Post)
//!                 .url("http://localhost:3000/users")
//!                 .body(BodyTemplate::new().field("email", "user{i}@example.com"))
//!                 .build(),
//!         )
//!         .config(RunConfig::builder().users(5_000).build())
//!         .build();
//!
//!     scenario.run(ReqwestTransport::new(), &StdoutReporter).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Feature flags
//!
//! - `builtins`: the reqwest-backed [`ReqwestTransport`] and the coloured
//!   [`StdoutReporter`]. Enabled by default.
//! - `cli`: the `volley` binary and the crates only it uses (`clap`, `anyhow`,
//!   `tracing-subscriber`). Enabled by default; implies `builtins`.

/// Metric aggregators
pub mod aggregate;
/// Run configuration
pub mod config;
pub mod error;
/// Batch dispatch of virtual users
pub mod executor;
/// Single samples
pub mod metric;
pub mod outcome;
/// Snapshots, summaries and reporters
pub mod report;
/// Per-user requests and body templating
pub mod request;
/// Glue that ties everything together
pub mod scenario;
pub mod transport;

pub use aggregate::{Aggregate, LatencyAggregate, StatsAggregator};
pub use config::RunConfig;
pub use error::{ConfigError, ReportError, VolleyError};
pub use executor::Dispatcher;
pub use metric::{AttemptResult, Metric};
pub use outcome::{Outcome, TransportResult, classify};
pub use report::{JsonReporter, Reporter, RunSummary, StatsSnapshot};
pub use request::{BodyTemplate, HttpMethod, PreparedRequest, RequestSpec, RequestTemplate};
pub use scenario::Scenario;
pub use transport::Transport;

#[cfg(feature = "builtins")]
pub use report::StdoutReporter;
#[cfg(feature = "builtins")]
pub use transport::ReqwestTransport;

/// Procedural macros to reduce boilerplate
pub mod macros {
    pub use volley_macros::*;
}
