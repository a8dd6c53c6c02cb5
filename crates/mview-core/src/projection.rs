//! Projection builder — flattens a snapshot into display rows.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::types::Snapshot;

/// One table row: a single series with every label column populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    pub metric_name: String,
    #[serde(rename = "type")]
    pub metric_type: Option<String>,
    pub description: Option<String>,
    /// Every label key of the snapshot; `""` where this series lacks it.
    pub labels: BTreeMap<String, String>,
    pub value: String,
}

impl DisplayRow {
    /// Non-empty labels only, in key order.
    pub fn present_labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// All label keys in the snapshot, sorted.
pub fn label_columns(snapshot: &Snapshot) -> Vec<String> {
    snapshot
        .metrics
        .iter()
        .flat_map(|m| &m.values)
        .flat_map(|v| &v.labels)
        .map(|l| l.key.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Rows for every series: metrics in store order, series in their current order.
pub fn project(snapshot: &Snapshot) -> Vec<DisplayRow> {
    let columns = label_columns(snapshot);

    let mut rows = Vec::with_capacity(snapshot.value_count());
    for metric in &snapshot.metrics {
        for value in &metric.values {
            let mut labels: BTreeMap<String, String> = columns
                .iter()
                .map(|key| (key.clone(), String::new()))
                .collect();
            for label in &value.labels {
                labels.insert(label.key.clone(), label.value.clone());
            }

            rows.push(DisplayRow {
                metric_name: metric.name.clone(),
                metric_type: metric.metric_type.clone(),
                description: metric.description.clone(),
                labels,
                value: value.value.clone(),
            });
        }
    }
    rows
}
