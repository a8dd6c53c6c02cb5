//! `metrics-viewer dump` — one scrape, printed once.

use std::io;
use std::time::SystemTime;

use anyhow::Context;
use mview_core::{PipelineInput, PipelineState, View, ViewerConfig};
use mview_scrape::{Scraper, Source};
use mview_term::{Frame, LinePrinter, Renderer, terminal_width};

pub async fn run<S: Source>(config: &ViewerConfig, source: S, format: &str) -> anyhow::Result<()> {
    let view = scrape_view(config, source).await?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&view.rows)?);
        }
        _ => {
            let mut printer = LinePrinter::new(io::stdout());
            printer.render(&Frame::new(&view, SystemTime::now(), terminal_width()))?;
        }
    }

    Ok(())
}

/// Scrape once and shape the result with the default filter and sort.
async fn scrape_view<S: Source>(config: &ViewerConfig, source: S) -> anyhow::Result<View> {
    let mut scraper = Scraper::new(source, config.metrics.clone(), config.scrape_interval());
    let snapshot = scraper.scrape_once().await.context("scrape failed")?;
    Ok(PipelineState::initial()
        .with_input(PipelineInput::Snapshot(snapshot))
        .render(1))
}
