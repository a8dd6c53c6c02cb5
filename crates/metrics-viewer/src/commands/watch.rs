//! `metrics-viewer watch` — the live view.
//!
//! Task layout:
//!
//! ```text
//! Scraper::run ──snapshots──► Coordinator::run ──views──► UI loop (this task)
//!                                  ▲                          │
//!                                  └──── filter / sort ◄──────┘ (keys)
//! ```
//!
//! The quit key, Ctrl-C or SIGTERM sends on the shutdown watch channel; both
//! background tasks are awaited before the terminal is restored.

use std::future::Future;
use std::io::{self, IsTerminal};
use std::pin::pin;
use std::time::{Duration, SystemTime};

use anyhow::Context;
use mview_core::pipeline;
use mview_core::{PipelineHandle, View, ViewerConfig};
use mview_scrape::{Scraper, Source};
use mview_term::{
    Action, Frame, KeyInput, LinePrinter, RawMode, Renderer, ScreenTable, spawn_key_reader,
    stdin_is_tty, terminal_width,
};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Views buffered between the coordinator and the UI loop.
const VIEW_BUFFER: usize = 16;

/// Whether `watch` takes over the screen rather than printing tables.
pub fn is_interactive(plain: bool) -> bool {
    !plain && stdin_is_tty() && io::stdout().is_terminal()
}

pub async fn run<S>(config: &ViewerConfig, source: S, plain: bool) -> anyhow::Result<()>
where
    S: Source + 'static,
{
    let interactive = is_interactive(plain);
    info!(interactive, "metrics-viewer starting");

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Start background tasks ─────────────────────────────────

    let (pipeline, coordinator, mut views) = pipeline::channel(VIEW_BUFFER);
    let coordinator_handle = tokio::spawn(coordinator.run(shutdown_rx.clone()));

    let scraper = Scraper::new(source, config.metrics.clone(), config.scrape_interval());
    let scraper_handle = tokio::spawn(scraper.run(pipeline.clone(), shutdown_rx));

    // ── UI loop ────────────────────────────────────────────────

    let result = if interactive {
        let title = format!("metrics-viewer {}", env!("CARGO_PKG_VERSION"));
        interactive_loop(&pipeline, &mut views, config.refresh_interval(), title).await
    } else {
        plain_loop(&mut views).await
    };

    info!("shutting down");
    let _ = shutdown_tx.send(true);
    drop(pipeline);
    let _ = scraper_handle.await;
    let _ = coordinator_handle.await;

    result
}

async fn interactive_loop(
    pipeline: &PipelineHandle,
    views: &mut mpsc::Receiver<View>,
    refresh: Duration,
    title: String,
) -> anyhow::Result<()> {
    // Registered before raw mode so SIGTERM can never skip the restore.
    let mut stop = pin!(shutdown_signal());
    let raw = RawMode::enable().context("unable to switch terminal to raw mode")?;
    let mut keys = spawn_key_reader().context("unable to start key reader")?;
    let mut screen = ScreenTable::new(io::stdout(), title);
    let mut input = KeyInput::new();
    let mut current: Option<View> = None;

    let mut ticker = tokio::time::interval(refresh);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let outcome = loop {
        tokio::select! {
            view = views.recv() => match view {
                Some(view) => current = Some(view),
                None => break Ok(()),
            },
            key = keys.recv() => {
                let Some(byte) = key else { break Ok(()) };
                match input.feed(byte) {
                    Action::Quit => break Ok(()),
                    Action::Sort(spec) => {
                        pipeline.set_sort(spec);
                        continue;
                    }
                    Action::Filter(pattern) => {
                        pipeline.on_filter_changed(pattern);
                    }
                    Action::Redraw => {}
                    Action::None => continue,
                }
            }
            // Keeps "last update N seconds ago" current between scrapes.
            _ = ticker.tick() => {}
            _ = &mut stop => break Ok(()),
        }

        if let Some(view) = &current {
            let frame = Frame::new(view, SystemTime::now(), terminal_width())
                .with_prompt(input.prompt());
            if let Err(e) = screen.render(&frame) {
                break Err(e).context("unable to draw screen");
            }
        }
    };

    screen.finish()?;
    drop(raw);
    outcome
}

async fn plain_loop(views: &mut mpsc::Receiver<View>) -> anyhow::Result<()> {
    let mut printer = LinePrinter::new(io::stdout());
    let mut stop = pin!(shutdown_signal());

    loop {
        tokio::select! {
            view = views.recv() => {
                let Some(view) = view else { return Ok(()) };
                // Nothing to print until the first scrape lands.
                if view.scraped_at.is_none() && view.rows.is_empty() {
                    continue;
                }
                printer.render(&Frame::new(&view, SystemTime::now(), terminal_width()))?;
            }
            _ = &mut stop => return Ok(()),
        }
    }
}

/// Resolves on Ctrl-C or SIGTERM.
///
/// The SIGTERM handler is installed when this is called, not on first poll.
fn shutdown_signal() -> impl Future<Output = ()> {
    #[cfg(unix)]
    let terminate = {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(sig) => Some(sig),
            Err(e) => {
                warn!(error = %e, "unable to install SIGTERM handler");
                None
            }
        }
    };

    async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "unable to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async move {
            match terminate {
                Some(mut sig) => {
                    sig.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => debug!("received Ctrl-C"),
            _ = terminate => debug!("received SIGTERM"),
        }
    }
}
