use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::aggregate::LatencyAggregate;
use crate::error::ReportError;
use crate::metric::AttemptResult;
use crate::outcome::Outcome;

/// Read-only statistics over every recorded attempt.
///
/// Latency figures are in milliseconds and are `None` when nothing was recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub timeout_count: usize,
    pub min_ms: Option<f64>,
    pub max_ms: Option<f64>,
    pub avg_ms: Option<f64>,
    pub median_ms: Option<f64>,
}

impl From<LatencyAggregate> for StatsSnapshot {
    fn from(value: LatencyAggregate) -> Self {
        let mut ms: Vec<f64> = value
            .latencies
            .iter()
            .map(|d| d.as_nanos() as f64 / 1_000_000.0)
            .collect();
        ms.sort_by(f64::total_cmp);

        let avg_ms = (!ms.is_empty()).then(|| ms.iter().sum::<f64>() / ms.len() as f64);
        let median_ms = match ms.len() {
            0 => None,
            n if n % 2 == 0 => Some((ms[n / 2 - 1] + ms[n / 2]) / 2.0),
            n => Some(ms[n / 2]),
        };

        Self {
            total: value.total(),
            success_count: value.success_count,
            error_count: value.error_count,
            timeout_count: value.timeout_count,
            min_ms: ms.first().copied(),
            max_ms: ms.last().copied(),
            avg_ms,
            median_ms,
        }
    }
}

/// What a finished run hands to a [`Reporter`].
///
/// `elapsed` is serialized as `elapsed_ms`, fractional milliseconds like the snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub snapshot: StatsSnapshot,
    pub batches: usize,
    #[serde(rename = "elapsed_ms", with = "millis")]
    pub elapsed: Duration,
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_nanos() as f64 / 1_000_000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let ms = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(ms / 1000.0).map_err(D::Error::custom)
    }
}

impl RunSummary {
    /// Completed attempts per wall-clock second, pauses included.
    pub fn throughput(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        (secs > 0.0).then(|| self.snapshot.total as f64 / secs)
    }
}

/// A [`Reporter`] is the I/O boundary of a run: it sees every attempt as soon as it
/// finishes and the summary once at the end.
///
/// `attempt` is called concurrently from every in-flight attempt of a batch.
#[async_trait]
pub trait Reporter: Send + Sync {
    async fn attempt(&self, result: &AttemptResult);

    async fn summary(&self, summary: &RunSummary) -> Result<(), ReportError>;
}

fn fmt_ms(value: Option<f64>) -> String {
    match value {
        Some(ms) => format!("{ms:.2}ms"),
        None => "n/a".to_string(),
    }
}

/// One console line per attempt, e.g. `User 7 - Status: 200 - 12.34ms`.
pub fn attempt_line(result: &AttemptResult) -> String {
    let ms = result.duration_ms();
    match result.outcome {
        Outcome::Success => match result.status {
            Some(status) => format!("User {} - Status: {status} - {ms:.2}ms", result.index),
            None => format!("User {} - Status: ? - {ms:.2}ms", result.index),
        },
        Outcome::Timeout => format!("User {} - RTO (timeout) - {ms:.2}ms", result.index),
        Outcome::Error => {
            let status = result
                .status
                .map_or_else(|| "NO_RESPONSE".to_string(), |s| s.to_string());
            format!("User {} - ERROR ({status}) - {ms:.2}ms", result.index)
        }
    }
}

/// The end-of-run block.
pub fn summary_block(summary: &RunSummary) -> String {
    let s = &summary.snapshot;
    let throughput = summary
        .throughput()
        .map_or_else(|| "n/a".to_string(), |rps| format!("{rps:.2}"));
    let rows = [
        ("Total Requests", s.total.to_string()),
        ("Success", s.success_count.to_string()),
        ("Errors", s.error_count.to_string()),
        ("RTOs", s.timeout_count.to_string()),
        ("Avg Response Time", fmt_ms(s.avg_ms)),
        ("Min Response Time", fmt_ms(s.min_ms)),
        ("Max Response Time", fmt_ms(s.max_ms)),
        ("Median Response", fmt_ms(s.median_ms)),
        ("Batches", summary.batches.to_string()),
        ("Elapsed", format!("{:.2}s", summary.elapsed.as_secs_f64())),
        ("Requests/sec", throughput),
    ];

    let mut out = String::from("=== Test Summary ===\n");
    for (label, value) in rows {
        out.push_str(&format!("{label:<19}: {value}\n"));
    }
    out
}

/// Silent per attempt, prints the summary as a single JSON document.
pub struct JsonReporter;

#[async_trait]
impl Reporter for JsonReporter {
    async fn attempt(&self, _result: &AttemptResult) {}

    async fn summary(&self, summary: &RunSummary) -> Result<(), ReportError> {
        let value = serde_json::to_string_pretty(summary)?;
        println!("{value}");
        Ok(())
    }
}

#[cfg(feature = "builtins")]
pub use builtins::*;

#[cfg(feature = "builtins")]
mod builtins {
    use super::*;
    use colored::Colorize;
    use std::io::Write;

    /// Coloured console output: green for responses, yellow for timeouts, red for errors.
    pub struct StdoutReporter;

    #[async_trait]
    impl Reporter for StdoutReporter {
        async fn attempt(&self, result: &AttemptResult) {
            let line = attempt_line(result);
            let line = match result.outcome {
                Outcome::Success => line.green(),
                Outcome::Timeout => line.yellow(),
                Outcome::Error => line.red(),
            };
            println!("{line}");
        }

        async fn summary(&self, summary: &RunSummary) -> Result<(), ReportError> {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout)?;
            write!(stdout, "{}", summary_block(summary).bold())?;
            stdout.flush()?;
            Ok(())
        }
    }
}
