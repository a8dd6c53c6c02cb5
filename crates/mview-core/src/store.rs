//! Metric store — identity-stable merge of parsed events.
//!
//! Holds one [`Metric`] per tracked name and, under it, one [`MetricValue`]
//! per distinct label set. A label set seen again in a later scrape
//! overwrites the value in its existing slot, so the store size is bounded
//! by the number of distinct series rather than the number of scrapes.

use std::collections::HashMap;
use std::time::SystemTime;

use tracing::{debug, trace};

use crate::parser::ParsedEvent;
use crate::types::{IdentityHash, Metric, MetricValue, Snapshot, identity_hash};

/// What applying a single event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// HELP or TYPE recorded.
    Metadata,
    /// A new series slot was appended.
    Inserted,
    /// An existing series slot was overwritten.
    Updated,
    /// A non-`_sum` series of a known histogram was discarded.
    Suppressed,
}

/// Per-metric lookup from identity hash to position in `Metric::values`.
#[derive(Debug, Default)]
struct SeriesIndex {
    by_identity: HashMap<IdentityHash, usize>,
}

/// In-memory store of the latest value per tracked series.
///
/// Owned by exactly one scrape task; consumers only ever see the
/// [`Snapshot`]s it hands out.
#[derive(Debug, Default)]
pub struct MetricStore {
    metrics: Vec<Metric>,
    /// metric name → position in `metrics`.
    by_name: HashMap<String, usize>,
    /// Parallel to `metrics`.
    series: Vec<SeriesIndex>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one scrape's events in order and return the resulting snapshot.
    pub fn apply<I>(&mut self, events: I) -> Snapshot
    where
        I: IntoIterator<Item = ParsedEvent>,
    {
        let (mut inserted, mut updated, mut suppressed) = (0usize, 0usize, 0usize);
        for event in events {
            match self.apply_event(event) {
                Applied::Inserted => inserted += 1,
                Applied::Updated => updated += 1,
                Applied::Suppressed => suppressed += 1,
                Applied::Metadata => {}
            }
        }

        debug!(
            inserted,
            updated,
            suppressed,
            metrics = self.metrics.len(),
            series = self.value_count(),
            "scrape applied to metric store"
        );
        self.snapshot()
    }

    /// Apply a single event.
    pub fn apply_event(&mut self, event: ParsedEvent) -> Applied {
        match event {
            ParsedEvent::Description { name, description } => {
                let idx = self.metric_index(&name);
                self.metrics[idx].description = Some(description);
                Applied::Metadata
            }
            ParsedEvent::Type { name, metric_type } => {
                let idx = self.metric_index(&name);
                self.metrics[idx].metric_type = Some(metric_type);
                Applied::Metadata
            }
            ParsedEvent::Value {
                name,
                sample,
                labels,
                value,
            } => {
                let idx = self.metric_index(&name);
                let metric = &mut self.metrics[idx];

                // Only the sum is kept for histograms, and only once TYPE has been seen.
                if metric.is_histogram() && !is_histogram_sum(&sample, &name) {
                    trace!(metric = %name, %sample, "histogram series suppressed");
                    return Applied::Suppressed;
                }

                let identity = identity_hash(&labels);
                let index = &mut self.series[idx];
                match index.by_identity.get(&identity) {
                    Some(&slot) => {
                        metric.values[slot].value = value;
                        Applied::Updated
                    }
                    None => {
                        index.by_identity.insert(identity.clone(), metric.values.len());
                        metric.values.push(MetricValue {
                            labels,
                            identity,
                            value,
                        });
                        Applied::Inserted
                    }
                }
            }
        }
    }

    /// Deep copy of the current contents, stamped with the current time.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            metrics: self.metrics.clone(),
            taken_at: Some(SystemTime::now()),
        }
    }

    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.by_name.get(name).map(|&i| &self.metrics[i])
    }

    pub fn metric_count(&self) -> usize {
        self.metrics.len()
    }

    pub fn value_count(&self) -> usize {
        self.metrics.iter().map(|m| m.values.len()).sum()
    }

    /// Position of `name`, creating the metric if it is new.
    fn metric_index(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.by_name.get(name) {
            return idx;
        }
        let idx = self.metrics.len();
        self.metrics.push(Metric::new(name));
        self.series.push(SeriesIndex::default());
        self.by_name.insert(name.to_string(), idx);
        debug!(metric = %name, "tracking new metric");
        idx
    }
}

fn is_histogram_sum(sample: &str, name: &str) -> bool {
    sample.strip_prefix(name).is_some_and(|rest| rest.starts_with("_sum"))
}
