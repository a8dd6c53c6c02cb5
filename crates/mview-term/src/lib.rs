//! mview-term — terminal front end for the live view.
//!
//! Renderers draw [`View`](mview_core::View)s produced by the pipeline
//! coordinator; [`KeyInput`] turns raw key bytes into user intents that are
//! fed back through the [`PipelineHandle`](mview_core::PipelineHandle).
//!
//! ```text
//!  stdin bytes ──► KeyInput ──► Action::{Sort, Filter} ──► PipelineHandle
//!                                                               │
//!  Renderer::render(Frame { view, prompt, now }) ◄── View ◄─────┘
//! ```
//!
//! Two renderers share the [`Renderer`] trait: [`ScreenTable`] redraws the
//! whole screen, [`LinePrinter`] appends bordered tables for pipes and dumb
//! terminals.

pub mod format;
pub mod input;
pub mod plain;
pub mod render;
pub mod screen;
pub mod terminal;

pub use format::{format_value, human_duration, labels_display, truncate};
pub use input::{Action, KeyInput};
pub use plain::LinePrinter;
pub use render::{Frame, Renderer};
pub use screen::ScreenTable;
pub use terminal::{RawMode, spawn_key_reader, stdin_is_tty, terminal_width};
