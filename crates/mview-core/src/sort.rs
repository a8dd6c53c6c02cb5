//! Sort engine — per-metric ordering of series.
//!
//! Metrics keep their store order; only the series inside each metric are
//! reordered. Sorting is stable and lexicographic on strings, values
//! included.

use std::cmp::Ordering;

use crate::types::{MetricValue, Snapshot};

/// Sortable table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    /// Column 0: metric name. Every series of a metric shares it.
    #[default]
    Name,
    /// Column 1: canonical label string.
    Labels,
    /// Column 2: raw value string.
    Value,
}

impl SortColumn {
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(SortColumn::Name),
            1 => Some(SortColumn::Labels),
            2 => Some(SortColumn::Value),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            SortColumn::Name => 0,
            SortColumn::Labels => 1,
            SortColumn::Value => 2,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SortColumn::Name => "name",
            SortColumn::Labels => "labels",
            SortColumn::Value => "value",
        }
    }
}

/// Column plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: SortColumn,
    pub ascending: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            column: SortColumn::Name,
            ascending: true,
        }
    }
}

impl SortSpec {
    pub fn new(column: SortColumn, ascending: bool) -> Self {
        Self { column, ascending }
    }

    /// Build from a renderer column index; `None` if out of range.
    pub fn from_index(column: usize, ascending: bool) -> Option<Self> {
        SortColumn::from_index(column).map(|column| Self { column, ascending })
    }

    fn compare(&self, a: &MetricValue, b: &MetricValue) -> Ordering {
        let (a, b) = if self.ascending { (a, b) } else { (b, a) };
        match self.column {
            // Series of one metric all share its name.
            SortColumn::Name => Ordering::Equal,
            SortColumn::Labels => a.label_string().cmp(&b.label_string()),
            SortColumn::Value => a.value.cmp(&b.value),
        }
    }
}

/// Return a copy of `snapshot` with every metric's series ordered by `spec`.
pub fn sort(snapshot: &Snapshot, spec: SortSpec) -> Snapshot {
    let mut sorted = snapshot.clone();
    sort_in_place(&mut sorted, spec);
    sorted
}

/// Order every metric's series by `spec`. Ties keep their prior order.
pub fn sort_in_place(snapshot: &mut Snapshot, spec: SortSpec) {
    for metric in &mut snapshot.metrics {
        metric.values.sort_by(|a, b| spec.compare(a, b));
    }
}
