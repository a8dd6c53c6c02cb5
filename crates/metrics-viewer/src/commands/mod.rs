pub mod config;
pub mod dump;
pub mod watch;

use std::path::Path;

use anyhow::Context;
use mview_core::ViewerConfig;
use mview_core::config::expand_home;
use mview_scrape::{HttpSource, read_token};
use tracing::info;

/// Load (or create) the config file, apply the URL override, and validate.
pub fn load_config(path: &Path, url: Option<String>) -> anyhow::Result<ViewerConfig> {
    let config = ViewerConfig::load_or_create(path)?.with_url_override(url);
    config.validate()?;
    Ok(config)
}

/// HTTP source for the configured endpoint, with the bearer token if given.
pub fn build_source(config: &ViewerConfig, token_file: Option<&Path>) -> anyhow::Result<HttpSource> {
    let token = token_file
        .map(|path| read_token(&expand_home(path)))
        .transpose()?;
    let url = config
        .source
        .url
        .clone()
        .context("no source url configured")?;
    let ca_cert = config.source.ca_cert.as_deref().map(expand_home);

    let source = HttpSource::new(
        url,
        token,
        config.scrape_timeout(),
        config.source.insecure,
        ca_cert.as_deref(),
    )?;
    info!(
        url = %source.url(),
        metrics = config.metrics.len(),
        interval_secs = config.settings.scrape_interval,
        "metrics source configured"
    );
    Ok(source)
}
