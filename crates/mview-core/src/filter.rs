//! Filter engine — regex selection of series within a snapshot.

use regex::Regex;

use crate::error::FilterError;
use crate::types::{Metric, MetricValue, Snapshot};

/// A compiled filter pattern. The empty pattern matches everything.
#[derive(Debug, Clone, Default)]
pub struct MetricFilter {
    regex: Option<Regex>,
}

impl MetricFilter {
    /// Compile `pattern`. An empty pattern yields the match-all filter.
    pub fn compile(pattern: &str) -> Result<Self, FilterError> {
        if pattern.is_empty() {
            return Ok(Self::match_all());
        }
        let regex = Regex::new(pattern).map_err(|source| FilterError {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { regex: Some(regex) })
    }

    pub fn match_all() -> Self {
        Self { regex: None }
    }

    pub fn is_match_all(&self) -> bool {
        self.regex.is_none()
    }

    /// Whether a series of `metric` is retained.
    ///
    /// Matches against the metric name, the raw value, and every label key
    /// and label value of the series.
    pub fn matches(&self, metric: &Metric, value: &MetricValue) -> bool {
        let Some(regex) = &self.regex else {
            return true;
        };
        regex.is_match(&metric.name)
            || regex.is_match(&value.value)
            || value
                .labels
                .iter()
                .any(|l| regex.is_match(&l.key) || regex.is_match(&l.value))
    }

    /// Retain matching series; drop metrics left without any.
    pub fn apply(&self, snapshot: &Snapshot) -> Snapshot {
        if self.is_match_all() {
            return snapshot.clone();
        }

        let metrics = snapshot
            .metrics
            .iter()
            .filter_map(|metric| {
                let values: Vec<MetricValue> = metric
                    .values
                    .iter()
                    .filter(|v| self.matches(metric, v))
                    .cloned()
                    .collect();
                if values.is_empty() {
                    return None;
                }
                Some(Metric {
                    name: metric.name.clone(),
                    description: metric.description.clone(),
                    metric_type: metric.metric_type.clone(),
                    values,
                })
            })
            .collect();

        Snapshot {
            metrics,
            taken_at: snapshot.taken_at,
        }
    }
}

/// Filter `snapshot` by `pattern`.
///
/// An invalid pattern never fails the caller: the unfiltered snapshot is
/// returned together with the error so it can be shown to the user.
pub fn filter(snapshot: &Snapshot, pattern: &str) -> (Snapshot, Option<FilterError>) {
    match MetricFilter::compile(pattern) {
        Ok(f) => (f.apply(snapshot), None),
        Err(e) => (snapshot.clone(), Some(e)),
    }
}
