//! mview-scrape — fetches exposition text and feeds the live-view pipeline.
//!
//! # Architecture
//!
//! ```text
//!   ┌────────────┐  text   ┌──────────────────────┐  Arc<Snapshot>  ┌──────────────┐
//!   │ HttpSource │ ──────► │ Scraper              │ ──────────────► │ PipelineHandle│
//!   │ (reqwest)  │         │  parse → store.apply │                 └──────────────┘
//!   └────────────┘         └──────────────────────┘
//!         ▲                         │ every scrape_interval
//!         └──── Source::scrape() ◄──┘
//! ```
//!
//! A failed scrape is logged and skipped; the previous snapshot stays on
//! screen until the next successful one.

pub mod error;
pub mod scraper;
pub mod transport;

pub use error::{ScrapeError, ScrapeResult};
pub use scraper::Scraper;
pub use transport::{HttpSource, Source, read_token};
