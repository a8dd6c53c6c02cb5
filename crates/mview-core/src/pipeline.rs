//! Pipeline coordinator — combine-latest over scrapes, filter, and sort.
//!
//! Three independently changing inputs (the latest scrape snapshot, the
//! filter pattern, the sort order) reach a single [`Coordinator`] task over
//! one ordered channel. Every input replaces the [`PipelineState`] wholesale
//! and triggers exactly one recombination: filter → sort → project, then
//! publish a [`View`] to the output sink.
//!
//! ```text
//! scrape task ──publish_snapshot()──┐
//! renderer ─────on_filter_changed()─┼──► Coordinator ──► View ──► renderer
//! renderer ─────on_sort_changed()───┘
//! ```
//!
//! Recombinations are serialized on the coordinator task, so a consumer
//! never observes a partially combined state.

use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::FilterError;
use crate::filter::MetricFilter;
use crate::projection::{DisplayRow, label_columns, project};
use crate::sort::{SortSpec, sort_in_place};
use crate::types::Snapshot;

/// A new value on one of the three input streams.
#[derive(Debug, Clone)]
pub enum PipelineInput {
    Snapshot(Arc<Snapshot>),
    Filter(String),
    Sort(SortSpec),
}

/// The filter pattern in effect, compiled once per change.
#[derive(Debug, Clone, Default)]
pub struct ActiveFilter {
    pub pattern: String,
    matcher: MetricFilter,
    /// Set when `pattern` did not compile; the filter then matches everything.
    pub error: Option<FilterError>,
}

impl ActiveFilter {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        match MetricFilter::compile(&pattern) {
            Ok(matcher) => Self {
                pattern,
                matcher,
                error: None,
            },
            Err(e) => {
                warn!(error = %e, "invalid filter regex, showing unfiltered data");
                Self {
                    pattern,
                    matcher: MetricFilter::match_all(),
                    error: Some(e),
                }
            }
        }
    }
}

/// Latest value of every input stream.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub snapshot: Arc<Snapshot>,
    pub filter: ActiveFilter,
    pub sort: SortSpec,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::initial()
    }
}

impl PipelineState {
    /// Empty snapshot, empty filter, column 0 ascending.
    pub fn initial() -> Self {
        Self {
            snapshot: Arc::new(Snapshot::empty()),
            filter: ActiveFilter::default(),
            sort: SortSpec::default(),
        }
    }

    /// The state after `input`, keeping the latest value of the other inputs.
    pub fn with_input(&self, input: PipelineInput) -> Self {
        match input {
            PipelineInput::Snapshot(snapshot) => Self {
                snapshot,
                ..self.clone()
            },
            PipelineInput::Filter(pattern) => {
                let filter = if pattern == self.filter.pattern {
                    self.filter.clone()
                } else {
                    ActiveFilter::new(pattern)
                };
                Self {
                    filter,
                    ..self.clone()
                }
            }
            PipelineInput::Sort(sort) => Self {
                sort,
                ..self.clone()
            },
        }
    }

    /// Run filter → sort → projection over the current inputs.
    pub fn render(&self, sequence: u64) -> View {
        let mut shaped = self.filter.matcher.apply(&self.snapshot);
        sort_in_place(&mut shaped, self.sort);

        View {
            sequence,
            columns: label_columns(&shaped),
            rows: project(&shaped),
            filter: self.filter.pattern.clone(),
            filter_error: self.filter.error.as_ref().map(ToString::to_string),
            sort: self.sort,
            scraped_at: self.snapshot.taken_at,
        }
    }
}

/// One fully combined, display-ready table.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    /// 1 for the startup view, +1 per recombination.
    pub sequence: u64,
    pub rows: Vec<DisplayRow>,
    /// Sorted union of label keys across `rows`.
    pub columns: Vec<String>,
    pub filter: String,
    pub filter_error: Option<String>,
    pub sort: SortSpec,
    /// When the underlying scrape completed; `None` before the first scrape.
    pub scraped_at: Option<SystemTime>,
}

impl View {
    /// Number of distinct metric groups in `rows`.
    pub fn metric_count(&self) -> usize {
        let mut count = 0;
        let mut current: Option<&str> = None;
        for row in &self.rows {
            if current != Some(row.metric_name.as_str()) {
                count += 1;
                current = Some(row.metric_name.as_str());
            }
        }
        count
    }
}

/// Producer side of the pipeline, handed to the scrape task and the renderer.
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    inputs: mpsc::UnboundedSender<PipelineInput>,
}

impl PipelineHandle {
    /// Publish a freshly scraped snapshot. Returns `false` once the coordinator is gone.
    pub fn publish_snapshot(&self, snapshot: Arc<Snapshot>) -> bool {
        self.send(PipelineInput::Snapshot(snapshot))
    }

    /// Renderer callback: the user submitted a new filter pattern.
    pub fn on_filter_changed(&self, pattern: impl Into<String>) -> bool {
        self.send(PipelineInput::Filter(pattern.into()))
    }

    /// Renderer callback: the user picked a sort column and direction.
    pub fn on_sort_changed(&self, column: usize, ascending: bool) -> bool {
        match SortSpec::from_index(column, ascending) {
            Some(spec) => self.set_sort(spec),
            None => {
                warn!(column, "ignoring sort request for unknown column");
                false
            }
        }
    }

    pub fn set_sort(&self, spec: SortSpec) -> bool {
        self.send(PipelineInput::Sort(spec))
    }

    pub fn is_closed(&self) -> bool {
        self.inputs.is_closed()
    }

    fn send(&self, input: PipelineInput) -> bool {
        self.inputs.send(input).is_ok()
    }
}

/// The single recombination point.
pub struct Coordinator {
    inputs: mpsc::UnboundedReceiver<PipelineInput>,
    sink: mpsc::Sender<View>,
    state: PipelineState,
    sequence: u64,
}

/// Create a coordinator, its input handle, and the receiving end of its
/// output sink (`buffer` views deep).
pub fn channel(buffer: usize) -> (PipelineHandle, Coordinator, mpsc::Receiver<View>) {
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let (view_tx, view_rx) = mpsc::channel(buffer.max(1));
    let coordinator = Coordinator {
        inputs: input_rx,
        sink: view_tx,
        state: PipelineState::initial(),
        sequence: 0,
    };
    (PipelineHandle { inputs: input_tx }, coordinator, view_rx)
}

impl Coordinator {
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Publish the startup view, then recombine on every input until
    /// shutdown, until every handle is dropped, or until the sink closes.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        if *shutdown.borrow() {
            return;
        }
        info!("pipeline coordinator started");

        if self.publish(&mut shutdown).await {
            loop {
                tokio::select! {
                    input = self.inputs.recv() => {
                        let Some(input) = input else {
                            debug!("all pipeline handles dropped");
                            break;
                        };
                        self.state = self.state.with_input(input);
                        if !self.publish(&mut shutdown).await {
                            break;
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
        }

        info!(published = self.sequence, "pipeline coordinator stopped");
    }

    /// Render the current state and hand it to the sink.
    async fn publish(&mut self, shutdown: &mut watch::Receiver<bool>) -> bool {
        self.sequence += 1;
        let view = self.state.render(self.sequence);
        debug!(
            sequence = view.sequence,
            rows = view.rows.len(),
            filter = %view.filter,
            "view published"
        );

        tokio::select! {
            sent = self.sink.send(view) => {
                if sent.is_err() {
                    debug!("view sink closed");
                }
                sent.is_ok()
            }
            _ = shutdown.changed() => false,
        }
    }
}
