//! Executor — batch-driven dispatch of virtual users
//!
//! The [`Dispatcher`] drives exactly one attempt per [`RequestSpec`] and bounds the
//! number of attempts in flight by splitting the specs into fixed-size batches.
//!
//! # High-level flow
//! 1. The specs (indices `1..=users`, in order) are cut into contiguous chunks of at most
//!    `batch_size`.
//! 2. Every attempt of a chunk is started at once and driven concurrently on the
//!    dispatcher's own task (`join_all`, no spawning). Attempts only suspend on I/O or on
//!    their deadline, so they resolve in any order.
//! 3. Each attempt resolves to exactly one [`AttemptResult`](crate::AttemptResult), which is
//!    recorded in the [`StatsAggregator`](crate::StatsAggregator) and handed to the
//!    [`Reporter`](crate::Reporter) right away.
//! 4. Once the whole chunk has resolved the dispatcher sleeps for `pause`, then moves on.
//!    Batch N never starts before batch N−1 is done: that is the only backpressure.
//!
//! # Attempt isolation
//! An attempt cannot fail the run. Transport problems come back as a
//! [`TransportResult`](crate::TransportResult), an elapsed deadline becomes
//! `TimedOut`, and the classification happens locally. Nothing is retried.
//!
//! # Deadlines
//! The deadline wraps the transport future with `tokio::time::timeout`. Dropping the
//! future cancels only that attempt's wait; it still reports a Timeout.
pub mod batch;
pub use batch::Dispatcher;

use crate::request::RequestSpec;

/// Contiguous chunks of at most `batch_size` specs, in index order.
///
/// A `batch_size` of zero is treated as one.
pub fn batches(specs: &[RequestSpec], batch_size: usize) -> std::slice::Chunks<'_, RequestSpec> {
    specs.chunks(batch_size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{HttpMethod, RequestTemplate};

    fn specs(users: usize) -> Vec<RequestSpec> {
        RequestTemplate::builder()
            .method(HttpMethod::Get)
            .url("http://localhost")
            .build()
            .specs(users)
    }

    #[test]
    fn five_users_in_batches_of_two() {
        let specs = specs(5);
        let sizes: Vec<usize> = batches(&specs, 2).map(<[RequestSpec]>::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn batches_preserve_index_order() {
        let specs = specs(7);
        let indices: Vec<Vec<usize>> = batches(&specs, 3)
            .map(|b| b.iter().map(|s| s.index).collect())
            .collect();
        assert_eq!(indices, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]);
    }

    #[test]
    fn zero_batch_size_degrades_to_one() {
        let specs = specs(3);
        assert_eq!(batches(&specs, 0).count(), 3);
    }

    #[test]
    fn no_specs_no_batches() {
        assert_eq!(batches(&[], 10).count(), 0);
    }
}
