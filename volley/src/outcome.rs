use serde::{Deserialize, Serialize};

/// What the transport observed for one attempt, before classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportResult {
    /// A response arrived, whatever its status.
    Responded(u16),
    /// The deadline elapsed before any response.
    TimedOut,
    /// Connection, DNS, TLS or protocol failure. Carries a status if one was attached.
    Failed(Option<u16>),
}

/// Terminal state of one attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Timeout,
    Error,
}

/// Maps a transport result to its outcome and the status code worth reporting.
///
/// Any response counts as [`Outcome::Success`], 4xx and 5xx included. Only a missing
/// response is an error.
pub fn classify(result: TransportResult) -> (Outcome, Option<u16>) {
    match result {
        TransportResult::TimedOut => (Outcome::Timeout, None),
        TransportResult::Responded(status) => (Outcome::Success, Some(status)),
        TransportResult::Failed(status) => (Outcome::Error, status),
    }
}
