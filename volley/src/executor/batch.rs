use futures::future::join_all;
use tokio::time::{Instant, sleep, timeout};

use super::batches;
use crate::{
    aggregate::StatsAggregator,
    config::RunConfig,
    metric::AttemptResult,
    outcome::TransportResult,
    report::{Reporter, RunSummary},
    request::RequestSpec,
    transport::Transport,
};

/// Runs every spec once, at most `batch_size` at a time, pausing between batches.
///
/// The dispatcher never fails: whatever happens to an attempt ends up classified in the
/// aggregator, and `run` always returns after the last batch's pause.
pub struct Dispatcher<T> {
    transport: T,
    config: RunConfig,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, config: RunConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub async fn run<R>(
        &self,
        specs: &[RequestSpec],
        stats: &StatsAggregator,
        reporter: &R,
    ) -> RunSummary
    where
        R: Reporter + ?Sized,
    {
        let started = Instant::now();
        let mut dispatched = 0;

        for (n, batch) in batches(specs, self.config.batch_size).enumerate() {
            tracing::debug!(batch = n + 1, size = batch.len(), "dispatching batch");
            join_all(batch.iter().map(|spec| self.attempt(spec, stats, reporter))).await;
            dispatched += 1;
            tracing::debug!(batch = n + 1, "batch complete");
            sleep(self.config.pause).await;
        }

        RunSummary {
            snapshot: stats.snapshot().await,
            batches: dispatched,
            elapsed: started.elapsed(),
        }
    }

    /// One virtual user: `Pending` until the transport answers, fails or runs out of time.
    async fn attempt<R>(&self, spec: &RequestSpec, stats: &StatsAggregator, reporter: &R)
    where
        R: Reporter + ?Sized,
    {
        let request = spec.prepare();
        let start = Instant::now();
        let result = match self.config.deadline() {
            Some(deadline) => timeout(deadline, self.transport.send(&request))
                .await
                .unwrap_or(TransportResult::TimedOut),
            None => self.transport.send(&request).await,
        };

        let result = AttemptResult::from_transport(spec.index, start.elapsed(), result);
        tracing::trace!(
            index = result.index,
            outcome = ?result.outcome,
            status = ?result.status,
            "attempt finished"
        );
        stats.record(&result).await;
        reporter.attempt(&result).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::outcome::Outcome;
    use crate::request::{HttpMethod, PreparedRequest, RequestTemplate};
    use async_trait::async_trait;
    use std::{
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    #[derive(Clone, Copy)]
    enum Plan {
        Respond(u16),
        Hang,
        Fail,
    }

    /// Answers according to `plan(call_number)` after `delay`, tracking concurrency.
    struct Stub {
        plan: fn(usize) -> Plan,
        delay: Duration,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Stub {
        fn new(plan: fn(usize) -> Plan, delay: Duration) -> Self {
            Self {
                plan,
                delay,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    struct InFlight<'a>(&'a AtomicUsize);

    impl Drop for InFlight<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl Transport for Stub {
        async fn send(&self, _request: &PreparedRequest) -> TransportResult {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            let _guard = InFlight(&self.in_flight);
            self.peak.fetch_max(now, Ordering::SeqCst);

            match (self.plan)(call) {
                Plan::Respond(status) => {
                    sleep(self.delay).await;
                    TransportResult::Responded(status)
                }
                Plan::Hang => {
                    sleep(Duration::from_secs(3600)).await;
                    TransportResult::Responded(200)
                }
                Plan::Fail => {
                    sleep(self.delay).await;
                    TransportResult::Failed(None)
                }
            }
        }
    }

    #[derive(Default)]
    struct Collect {
        seen: Mutex<Vec<AttemptResult>>,
    }

    #[async_trait]
    impl Reporter for Collect {
        async fn attempt(&self, result: &AttemptResult) {
            self.seen.lock().unwrap().push(result.clone());
        }

        async fn summary(&self, _summary: &RunSummary) -> Result<(), ReportError> {
            Ok(())
        }
    }

    fn specs(users: usize) -> Vec<RequestSpec> {
        RequestTemplate::builder()
            .method(HttpMethod::Get)
            .url("http://localhost:3000")
            .build()
            .specs(users)
    }

    fn config(users: usize, batch_size: usize) -> RunConfig {
        RunConfig::builder().users(users).batch_size(batch_size).build()
    }

    async fn run(stub: Stub, config: RunConfig) -> (RunSummary, Vec<AttemptResult>, Stub) {
        let specs = specs(config.users);
        let stats = StatsAggregator::new();
        let reporter = Collect::default();
        let dispatcher = Dispatcher::new(stub, config);
        let summary = dispatcher.run(&specs, &stats, &reporter).await;
        let seen = reporter.seen.into_inner().unwrap();
        (summary, seen, dispatcher.transport)
    }

    #[tokio::test(start_paused = true)]
    async fn two_responses_and_one_deadline() {
        let stub = Stub::new(
            |call| if call == 3 { Plan::Hang } else { Plan::Respond(200) },
            Duration::from_millis(5),
        );
        let (summary, seen, _) = run(stub, config(3, 1000)).await;

        let s = summary.snapshot;
        assert_eq!((s.total, s.success_count, s.timeout_count, s.error_count), (3, 2, 1, 0));
        let timed_out = seen.iter().find(|r| r.outcome == Outcome::Timeout).unwrap();
        assert_eq!(timed_out.index, 3);
        assert_eq!(timed_out.status, None);
        assert!(timed_out.latency >= Duration::from_millis(5000));
    }

    #[tokio::test(start_paused = true)]
    async fn five_users_run_in_three_paused_batches() {
        let stub = Stub::new(|_| Plan::Respond(200), Duration::from_millis(100));
        let (summary, _, _) = run(stub, config(5, 2)).await;

        assert_eq!(summary.batches, 3);
        // three rounds of 100ms work followed by the 10ms pause
        assert!(summary.elapsed >= Duration::from_millis(330));
        assert!(summary.elapsed < Duration::from_millis(340));
    }

    #[tokio::test(start_paused = true)]
    async fn later_batches_wait_for_earlier_ones() {
        let stub = Stub::new(|_| Plan::Respond(200), Duration::from_millis(50));
        let (_, seen, _) = run(stub, config(6, 2)).await;

        let order: Vec<usize> = seen.iter().map(|r| r.index).collect();
        let batch_of = |index: usize| (index - 1) / 2;
        assert!(order.windows(2).all(|w| batch_of(w[0]) <= batch_of(w[1])));
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_never_exceeds_batch_size() {
        for (users, batch_size) in [(1, 1), (10, 4), (25, 7), (12, 12), (3, 50)] {
            let stub = Stub::new(|_| Plan::Respond(200), Duration::from_millis(20));
            let (summary, _, stub) = run(stub, config(users, batch_size)).await;

            assert_eq!(summary.snapshot.total, users);
            assert_eq!(
                stub.peak.load(Ordering::SeqCst),
                batch_size.min(users),
                "users={users} batch_size={batch_size}"
            );
            assert_eq!(stub.in_flight.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn every_user_reported_exactly_once() {
        let stub = Stub::new(
            |call| match call % 4 {
                0 => Plan::Hang,
                1 => Plan::Fail,
                _ => Plan::Respond(503),
            },
            Duration::from_millis(3),
        );
        let (summary, seen, _) = run(stub, config(23, 5)).await;

        let s = summary.snapshot;
        assert_eq!(s.success_count + s.error_count + s.timeout_count, 23);
        assert_eq!(s.total, 23);

        let mut indices: Vec<usize> = seen.iter().map(|r| r.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, (1..=23).collect::<Vec<_>>());
    }

    #[tokio::test(start_paused = true)]
    async fn failures_stay_contained() {
        let stub = Stub::new(
            |call| if call % 2 == 0 { Plan::Fail } else { Plan::Respond(500) },
            Duration::from_millis(1),
        );
        let (summary, seen, _) = run(stub, config(10, 3)).await;

        assert_eq!(summary.snapshot.error_count, 5);
        assert_eq!(summary.snapshot.success_count, 5);
        assert!(
            seen.iter()
                .filter(|r| r.outcome == Outcome::Success)
                .all(|r| r.status == Some(500))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_runs_produce_the_same_counts() {
        let plan = |call: usize| if call % 3 == 0 { Plan::Hang } else { Plan::Respond(200) };
        let mut counts = Vec::new();
        for _ in 0..3 {
            let (summary, _, _) = run(Stub::new(plan, Duration::from_millis(2)), config(9, 4)).await;
            let s = summary.snapshot;
            counts.push((s.success_count, s.error_count, s.timeout_count));
        }
        assert!(counts.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(counts[0], (6, 0, 3));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_waits_for_the_response() {
        let stub = Stub::new(|_| Plan::Respond(200), Duration::from_secs(60));
        let config = RunConfig::builder()
            .users(2)
            .timeout(Duration::ZERO)
            .build();
        let (summary, _, _) = run(stub, config).await;

        assert_eq!(summary.snapshot.success_count, 2);
        assert_eq!(summary.snapshot.timeout_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn no_specs_means_empty_snapshot() {
        let stats = StatsAggregator::new();
        let dispatcher = Dispatcher::new(
            Stub::new(|_| Plan::Respond(200), Duration::ZERO),
            config(1, 10),
        );
        let summary = dispatcher.run(&[], &stats, &Collect::default()).await;

        assert_eq!(summary.batches, 0);
        assert_eq!(summary.snapshot.total, 0);
        assert_eq!(summary.snapshot.avg_ms, None);
    }
}
