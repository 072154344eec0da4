use std::{fmt::Debug, time::Duration};

use serde::{Serialize, de::DeserializeOwned};

use crate::macros::metric;
use crate::outcome::{Outcome, TransportResult, classify};

/// A single sample produced by one attempt.
///
/// Use the `#[metric]` attribute to derive the required bounds and the impl.
pub trait Metric
where
    Self: Serialize + DeserializeOwned + PartialOrd + PartialEq + Send + Sync + Debug + Clone,
{
}

/// The result of one virtual user's attempt, created exactly once when it finishes.
#[metric]
pub struct AttemptResult {
    pub index: usize,
    pub latency: Duration,
    pub outcome: Outcome,
    pub status: Option<u16>,
}

impl AttemptResult {
    pub fn from_transport(index: usize, latency: Duration, result: TransportResult) -> Self {
        let (outcome, status) = classify(result);
        Self {
            index,
            latency,
            outcome,
            status,
        }
    }

    pub fn duration_ms(&self) -> f64 {
        self.latency.as_nanos() as f64 / 1_000_000.0
    }
}
