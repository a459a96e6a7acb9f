use std::{sync::Arc, time::Duration};

use geo_client::ClientError;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::{
    registry::{MetricRegistry, PollPass},
    sources::ReadingSource,
    transform,
};

/// Outcome of one poll cycle: gauge writes per pass, `None` if its fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    pub live: Option<usize>,
    pub periodic: Option<usize>,
}

/// Fetches readings on a fixed interval and projects them onto a registry.
pub struct Poller<S, R> {
    source: S,
    registry: Arc<R>,
    interval: Duration,
}

impl<S, R> Poller<S, R>
where
    S: ReadingSource,
    R: MetricRegistry,
{
    pub fn new(source: S, registry: Arc<R>, interval: Duration) -> Self {
        Self {
            source,
            registry,
            interval,
        }
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    /// Poll immediately, then once per interval until `shutdown` fires.
    ///
    /// A cycle that overruns the interval delays the next one; missed ticks
    /// are never replayed.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(interval = ?self.interval, "starting poller");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let report = self.tick().await;
            tracing::debug!(live = ?report.live, periodic = ?report.periodic, "poll complete");
        }

        tracing::info!("poller stopped");
    }

    /// Run the live pass then the periodic pass. A failed fetch in one pass
    /// does not prevent the other from running.
    pub async fn tick(&self) -> TickReport {
        let live = match self.poll_live().await {
            Ok(published) => Some(published),
            Err(e) => {
                tracing::error!(error = %e, pass = PollPass::Live.as_str(), "getting live data failed");
                self.registry.record_poll_failure(PollPass::Live);
                None
            }
        };

        let periodic = match self.poll_periodic().await {
            Ok(published) => Some(published),
            Err(e) => {
                tracing::error!(error = %e, pass = PollPass::Periodic.as_str(), "getting periodic data failed");
                self.registry.record_poll_failure(PollPass::Periodic);
                None
            }
        };

        TickReport { live, periodic }
    }

    async fn poll_live(&self) -> Result<usize, ClientError> {
        let data = self.source.live().await?;

        let readings = transform::live_readings(&data);
        for reading in &readings {
            self.registry.set_live_usage(reading.utility, reading.watts);
        }

        Ok(readings.len())
    }

    async fn poll_periodic(&self) -> Result<usize, ClientError> {
        let data = self.source.periodic().await?;
        let mut published = 0;

        for reading in transform::meter_readings(&data) {
            self.registry
                .set_meter_reading(reading.utility, reading.watts, reading.reading_time);
            published += 1;
        }

        for batch in transform::cost_batches(&data) {
            for entry in &batch.entries {
                self.registry
                    .set_cost(entry.utility, entry.period, entry.price_pence);
                published += 1;
            }

            match batch.timestamp {
                Some(ts) => {
                    self.registry.set_cost_delay(batch.utility, ts);
                    published += 1;
                }
                None => tracing::debug!(utility = batch.utility.as_str(), "cost batch has no timestamp"),
            }
        }

        Ok(published)
    }
}
