use anyhow::Result;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info_span, Instrument};

use crate::pipeline::{self, Mode};
use crate::state::State;

/// Background task that re-runs the ingestion pipeline on a fixed interval, so the
/// store is warm even between client polls. Curated mode is used whenever a
/// classifier is configured.
pub struct Refresher {
    state: State,
}

impl Refresher {
    pub fn new(state: State) -> Self {
        Self { state }
    }

    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        async move {
            let mode = if self.state.classifier.is_some() {
                Mode::Curated
            } else {
                Mode::Raw
            };
            let interval: std::time::Duration = self.state.cfg.refresh_interval.into();
            debug!(?mode, "Refreshing articles every {}s", interval.as_secs());

            let mut tick = time::interval(interval);
            tick.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

            loop {
                select! {
                    _ = cancel.cancelled() => {
                        debug!("Received a cancellation signal; exiting");
                        break;
                    }

                    _ = tick.tick() => {}
                }

                if let Err(e) = pipeline::run(&self.state, mode).await {
                    error!("Encountered a failure while refreshing articles: {e:#}");
                }
            }

            Ok(())
        }
        .instrument(info_span!("refresh"))
        .await
    }
}
