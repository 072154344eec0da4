use crate::Metric;
use serde::{Serialize, de::DeserializeOwned};
use std::{fmt::Debug, time::Duration};
use tokio::sync::Mutex;

use crate::macros::aggregate;
use crate::metric::AttemptResult;
use crate::outcome::Outcome;
use crate::report::StatsSnapshot;

/// The `Aggregate` trait defines how raw [`Metric`] values are collected into an
/// intermediate, mergeable representation.
///
/// Aggregates keep raw data (counts, samples). Derived numbers such as averages belong in
/// a report built from the aggregate, see [`StatsSnapshot`].
///
/// # Implementor notes
/// - `merge` must be **associative** and **commutative**.
/// - `consume` is called once per sample and should stay cheap.
pub trait Aggregate
where
    Self: Serialize + DeserializeOwned + PartialOrd + PartialEq + Send + Sync + Debug + Clone,
{
    /// The metric type this aggregate summarizes.
    type Metric: Metric;

    /// Create a new, empty instance of the aggregate.
    fn new() -> Self;

    /// Aggregate multiple metrics into the current instance.
    fn aggregate(&mut self, metrics: &[Self::Metric]) {
        metrics.iter().for_each(|m| self.consume(m));
    }

    /// Incorporate a single metric into the aggregate.
    fn consume(&mut self, metric: &Self::Metric);

    /// Combine two different aggregates into one.
    fn merge(&mut self, other: Self);
}

/// Every attempt latency in arrival order plus one counter per [`Outcome`].
#[aggregate]
#[derive(Default)]
pub struct LatencyAggregate {
    pub latencies: Vec<Duration>,
    pub success_count: usize,
    pub error_count: usize,
    pub timeout_count: usize,
}

impl LatencyAggregate {
    pub fn total(&self) -> usize {
        self.success_count + self.error_count + self.timeout_count
    }
}

impl Aggregate for LatencyAggregate {
    type Metric = AttemptResult;

    fn new() -> Self {
        LatencyAggregate::default()
    }

    fn consume(&mut self, metric: &Self::Metric) {
        self.latencies.push(metric.latency);
        match metric.outcome {
            Outcome::Success => self.success_count += 1,
            Outcome::Error => self.error_count += 1,
            Outcome::Timeout => self.timeout_count += 1,
        }
    }

    fn merge(&mut self, other: Self) {
        self.latencies.extend(other.latencies);
        self.success_count += other.success_count;
        self.error_count += other.error_count;
        self.timeout_count += other.timeout_count;
    }
}

/// Shared, append-only collector fed by every in-flight attempt of a run.
///
/// Each `record` takes the lock for one push and one increment, so concurrent attempts
/// never lose an update.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    inner: Mutex<LatencyAggregate>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, result: &AttemptResult) {
        self.inner.lock().await.consume(result);
    }

    /// Summary over everything recorded so far. Meant to be read once the run is over.
    pub async fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot::from(self.inner.lock().await.clone())
    }

    pub fn into_inner(self) -> LatencyAggregate {
        self.inner.into_inner()
    }
}
