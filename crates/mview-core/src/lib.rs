//! mview-core — ingestion and live-view pipeline for metrics-viewer.
//!
//! Turns exposition text scraped from a metrics endpoint into a
//! label-addressed metric store, and keeps a filtered, sorted, display-ready
//! projection of it current as new scrapes and user intents arrive.
//!
//! # Architecture
//!
//! ```text
//! raw text ──► parser::parse() ──► ParsedEvent*
//!                                      │
//!                                      ▼
//!                          MetricStore::apply() ──► Arc<Snapshot>
//!                                                        │
//!   on_filter_changed() ─┐                               │
//!   on_sort_changed()  ──┼──► PipelineHandle ◄───────────┘
//!                        │          │
//!                        │          ▼
//!                        │    Coordinator (combine-latest)
//!                        │      filter → sort → project
//!                        │          │
//!                        └──────────┴──► View { rows, columns, ... } ──► renderer
//! ```
//!
//! Identity of a series is the SHA-256 of its label set, so repeated
//! scrapes update values in place instead of growing the store.

pub mod config;
pub mod error;
pub mod filter;
pub mod parser;
pub mod pipeline;
pub mod projection;
pub mod sort;
pub mod store;
pub mod types;

pub use config::{Settings, SourceConfig, ViewerConfig};
pub use error::{ConfigError, FilterError, ParseWarning, ParseWarningKind};
pub use filter::MetricFilter;
pub use parser::{ParseOutput, ParsedEvent};
pub use pipeline::{Coordinator, PipelineHandle, PipelineInput, PipelineState, View};
pub use projection::DisplayRow;
pub use sort::{SortColumn, SortSpec};
pub use store::MetricStore;
pub use types::*;
