use typed_builder::TypedBuilder;

use crate::{
    aggregate::StatsAggregator,
    config::RunConfig,
    error::VolleyError,
    executor::Dispatcher,
    report::{Reporter, RunSummary},
    request::RequestTemplate,
    transport::Transport,
};

/// Glue for a whole run: what to send, how hard, through which transport and to whom the
/// results go.
#[derive(Clone, Debug, TypedBuilder)]
pub struct Scenario {
    #[builder(setter(into))]
    pub name: String,
    pub request: RequestTemplate,
    pub config: RunConfig,
}

impl Scenario {
    /// Rejects a run that cannot start. Nothing is sent when this fails.
    pub fn validate(&self) -> Result<(), VolleyError> {
        self.config.validate()?;
        self.request.validate()?;
        Ok(())
    }

    /// Validates, dispatches every virtual user and hands the summary to `reporter`.
    pub async fn run<T, R>(&self, transport: T, reporter: &R) -> Result<RunSummary, VolleyError>
    where
        T: Transport,
        R: Reporter + ?Sized,
    {
        self.validate()?;

        let specs = self.request.specs(self.config.users);
        let dispatcher = Dispatcher::new(transport, self.config.clone());
        let stats = StatsAggregator::new();

        tracing::info!(
            scenario = %self.name,
            users = specs.len(),
            method = %self.request.method,
            url = %self.request.url,
            batches = dispatcher.config().batch_count(),
            "starting run"
        );
        let summary = dispatcher.run(&specs, &stats, reporter).await;
        tracing::info!(
            scenario = %self.name,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "run complete"
        );

        reporter.summary(&summary).await?;
        Ok(summary)
    }
}
