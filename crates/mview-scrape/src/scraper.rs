//! Periodic scrape loop.
//!
//! Owns the [`MetricStore`], so identities and metric order persist across
//! scrapes. Each successful cycle publishes one immutable snapshot to the
//! pipeline.

use std::sync::Arc;
use std::time::Duration;

use mview_core::parser::parse;
use mview_core::{MetricStore, PipelineHandle, Snapshot};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::ScrapeResult;
use crate::transport::Source;

pub struct Scraper<S> {
    source: S,
    tracked: Vec<String>,
    store: MetricStore,
    interval: Duration,
}

impl<S: Source> Scraper<S> {
    pub fn new(source: S, tracked: Vec<String>, interval: Duration) -> Self {
        Self {
            source,
            tracked,
            store: MetricStore::new(),
            interval,
        }
    }

    pub fn store(&self) -> &MetricStore {
        &self.store
    }

    /// Fetch, parse, and merge one scrape. Malformed lines are logged and skipped.
    pub async fn scrape_once(&mut self) -> ScrapeResult<Arc<Snapshot>> {
        let raw = self.source.scrape().await?;
        let parsed = parse(&raw, self.tracked.as_slice());
        for warning in &parsed.warnings {
            warn!(
                line_number = warning.line_number,
                line = %warning.line,
                reason = %warning.kind,
                "skipping malformed metric line"
            );
        }

        let events = parsed.events.len();
        let snapshot = self.store.apply(parsed.events);
        debug!(
            bytes = raw.len(),
            events,
            warnings = parsed.warnings.len(),
            values = snapshot.value_count(),
            "scrape applied"
        );
        Ok(Arc::new(snapshot))
    }

    /// Scrape immediately, then every interval, until shutdown or until the
    /// pipeline stops accepting snapshots.
    pub async fn run(mut self, pipeline: PipelineHandle, mut shutdown: watch::Receiver<bool>) {
        if *shutdown.borrow() {
            return;
        }
        info!(
            interval_secs = self.interval.as_secs(),
            metrics = self.tracked.len(),
            "scraper started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            let result = tokio::select! {
                result = self.scrape_once() => result,
                _ = shutdown.changed() => break,
            };

            match result {
                Ok(snapshot) => {
                    if !pipeline.publish_snapshot(snapshot) {
                        debug!("pipeline closed");
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "scrape failed, keeping previous snapshot"),
            }
        }

        info!("scraper shutting down");
    }
}
