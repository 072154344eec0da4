use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use volley::{
    BodyTemplate, HttpMethod, JsonReporter, Reporter, ReqwestTransport, RequestTemplate,
    RunConfig, Scenario, StdoutReporter,
    config::{DEFAULT_BATCH_SIZE, DEFAULT_PAUSE, DEFAULT_TIMEOUT},
    request::parse_header,
};

/// Fire N virtual users at an HTTP endpoint and summarize how it held up.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of virtual users to simulate
    #[arg(short, long)]
    users: usize,

    /// HTTP method: GET, POST, PUT or DELETE
    #[arg(short = 'X', long, default_value = "GET", value_parser = parse_method)]
    method: HttpMethod,

    /// Target URL
    #[arg(long)]
    url: String,

    /// Value of the Origin header (omitted when blank)
    #[arg(long)]
    origin: Option<String>,

    /// Extra header, `Name: value` (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Body field for POST/PUT, `key=value`; `{i}` becomes the user index (repeatable)
    #[arg(short, long = "field", value_parser = BodyTemplate::parse_field)]
    fields: Vec<(String, String)>,

    /// Virtual users launched together
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Pause between batches in milliseconds
    #[arg(long, default_value_t = DEFAULT_PAUSE.as_millis() as u64)]
    pause_ms: u64,

    /// Per-request timeout in milliseconds (0 disables it)
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_millis() as u64)]
    timeout_ms: u64,

    /// Print the summary as JSON instead of per-user lines
    #[arg(long)]
    json: bool,
}

fn parse_method(raw: &str) -> Result<HttpMethod, volley::ConfigError> {
    raw.parse()
}

impl Args {
    fn scenario(self) -> Scenario {
        if !self.method.has_body() && !self.fields.is_empty() {
            tracing::warn!(method = %self.method, "body fields are ignored for this method");
        }

        let request = RequestTemplate::builder()
            .method(self.method)
            .url(self.url)
            .origin(self.origin)
            .headers(self.headers)
            .body(self.fields.into_iter().collect())
            .build();

        let config = RunConfig::builder()
            .users(self.users)
            .batch_size(self.batch_size)
            .pause(Duration::from_millis(self.pause_ms))
            .timeout(Duration::from_millis(self.timeout_ms))
            .build();

        Scenario::builder()
            .name("volley")
            .request(request)
            .config(config)
            .build()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let json = args.json;
    let scenario = args.scenario();
    scenario.validate().context("invalid run configuration")?;

    if !json {
        println!(
            "\nStarting test with {} users using {}...\n",
            scenario.config.users, scenario.request.method
        );
    }

    let reporter: Box<dyn Reporter> = if json {
        Box::new(JsonReporter)
    } else {
        Box::new(StdoutReporter)
    };
    scenario
        .run(ReqwestTransport::new(), reporter.as_ref())
        .await
        .context("load test failed")?;

    Ok(())
}
