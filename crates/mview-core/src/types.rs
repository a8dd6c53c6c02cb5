//! Data model shared by the parser, store, and view stages.

use std::time::SystemTime;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Content-derived identity of a label set (hex-encoded SHA-256).
pub type IdentityHash = String;

/// One `key=value` pair from a sample line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Label {
    pub key: String,
    pub value: String,
}

impl Label {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Hash a label set in its textual order.
///
/// Keys never contain `=` and `0xff` never occurs in UTF-8, so the encoding
/// `key=value\xff...` is unambiguous.
pub fn identity_hash(labels: &[Label]) -> IdentityHash {
    let mut hasher = Sha256::new();
    for label in labels {
        hasher.update(label.key.as_bytes());
        hasher.update(b"=");
        hasher.update(label.value.as_bytes());
        hasher.update([0xff]);
    }
    hex::encode(hasher.finalize())
}

/// Labels joined as `key=value`, space-separated, in label order.
pub fn label_string(labels: &[Label]) -> String {
    labels
        .iter()
        .map(|l| format!("{}={}", l.key, l.value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The latest value of one series of a metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricValue {
    pub labels: Vec<Label>,
    pub identity: IdentityHash,
    /// Numeric literal exactly as scraped.
    pub value: String,
}

impl MetricValue {
    pub fn new(labels: Vec<Label>, value: impl Into<String>) -> Self {
        let identity = identity_hash(&labels);
        Self {
            labels,
            identity,
            value: value.into(),
        }
    }

    /// Value of the label named `key`, if present.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.key == key)
            .map(|l| l.value.as_str())
    }

    pub fn label_string(&self) -> String {
        label_string(&self.labels)
    }
}

/// A tracked metric and every series discovered for it so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metric {
    pub name: String,
    /// Last `# HELP` text seen.
    pub description: Option<String>,
    /// Last `# TYPE` text seen (`counter`, `gauge`, `histogram`, ...).
    pub metric_type: Option<String>,
    /// Series in discovery order.
    pub values: Vec<MetricValue>,
}

impl Metric {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            metric_type: None,
            values: Vec::new(),
        }
    }

    pub fn is_histogram(&self) -> bool {
        self.metric_type.as_deref() == Some("histogram")
    }
}

/// Immutable point-in-time view of all tracked metrics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    /// Metrics in store (discovery) order.
    pub metrics: Vec<Metric>,
    /// When the scrape that produced this snapshot completed.
    pub taken_at: Option<SystemTime>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }

    /// Total number of series across all metrics.
    pub fn value_count(&self) -> usize {
        self.metrics.iter().map(|m| m.values.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
