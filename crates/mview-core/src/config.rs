//! metrics-viewer.toml configuration parser.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;

/// Written when the configuration file does not exist yet.
pub const DEFAULT_CONFIG: &str = r#"metrics = [
  "apiserver_flowcontrol_rejected_requests_total",
  "apiserver_flowcontrol_current_inqueue_requests",
  "apiserver_flowcontrol_request_wait_duration_seconds",
  "apiserver_flowcontrol_current_limit_seats",
  "apiserver_flowcontrol_lower_limit_seats",
  "apiserver_flowcontrol_upper_limit_seats",
  "apiserver_flowcontrol_nominal_limit_seats",
]

[settings]
scrape_interval = 1

[source]
url = "https://127.0.0.1:6443/metrics"
"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Tracked metric names, in configured order.
    pub metrics: Vec<String>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub source: SourceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Seconds between scrapes.
    #[serde(default = "default_scrape_interval")]
    pub scrape_interval: u64,
    /// Seconds before a scrape request is abandoned.
    #[serde(default = "default_scrape_timeout")]
    pub scrape_timeout: u64,
    /// Seconds between status-line refreshes.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scrape_interval: default_scrape_interval(),
            scrape_timeout: default_scrape_timeout(),
            refresh_interval: default_refresh_interval(),
        }
    }
}

fn default_scrape_interval() -> u64 {
    1
}

fn default_scrape_timeout() -> u64 {
    10
}

fn default_refresh_interval() -> u64 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Full URL of the metrics endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub insecure: bool,
    /// Extra PEM root certificate to trust.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
}

impl ViewerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`, writing [`DEFAULT_CONFIG`] there first if it is missing.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        let path = expand_home(path);
        if !path.exists() {
            write_private(&path, DEFAULT_CONFIG).map_err(|source| ConfigError::WriteDefault {
                path: path.clone(),
                source,
            })?;
            info!(path = %path.display(), "created default configuration file");
        }

        debug!(path = %path.display(), "loading configuration file");
        Self::from_file(&path)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Replace the source URL when `url` is given.
    pub fn with_url_override(mut self, url: Option<String>) -> Self {
        if url.is_some() {
            self.source.url = url;
        }
        self
    }

    /// Check the invariants the scrape loop and renderer rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metrics.is_empty() {
            return Err(ConfigError::Invalid("no metrics configured".into()));
        }
        if let Some(bad) = self
            .metrics
            .iter()
            .find(|m| m.is_empty() || m.contains(char::is_whitespace))
        {
            return Err(ConfigError::Invalid(format!("invalid metric name {bad:?}")));
        }
        if self.settings.scrape_interval < 1 {
            return Err(ConfigError::Invalid("scrape_interval must be at least 1 second".into()));
        }
        if self.settings.scrape_timeout < 1 {
            return Err(ConfigError::Invalid("scrape_timeout must be at least 1 second".into()));
        }
        if self.settings.refresh_interval < 1 {
            return Err(ConfigError::Invalid("refresh_interval must be at least 1 second".into()));
        }
        match self.source.url.as_deref() {
            None | Some("") => Err(ConfigError::Invalid("no source url configured".into())),
            Some(_) => Ok(()),
        }
    }

    pub fn scrape_interval(&self) -> Duration {
        Duration::from_secs(self.settings.scrape_interval)
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.scrape_timeout)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.settings.refresh_interval)
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

#[cfg(unix)]
fn write_private(path: &Path, content: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(content.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &str) -> std::io::Result<()> {
    std::fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_parses_and_validates() {
        let config: ViewerConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.metrics.len(), 7);
        assert_eq!(config.settings.scrape_interval, 1);
        assert_eq!(config.settings.scrape_timeout, 10);
        config.validate().unwrap();
    }

    #[test]
    fn parse_minimal() {
        let toml_str = r#"
metrics = ["up"]
"#;
        let config: ViewerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.metrics, vec!["up"]);
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.source.url, None);
        assert!(!config.source.insecure);
    }

    #[test]
    fn missing_file_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics-viewer.toml");

        let config = ViewerConfig::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.metrics[0], "apiserver_flowcontrol_rejected_requests_total");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn existing_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("viewer.toml");
        std::fs::write(&path, "metrics = [\"only_this\"]\n").unwrap();

        let config = ViewerConfig::load_or_create(&path).unwrap();
        assert_eq!(config.metrics, vec!["only_this"]);
    }

    #[test]
    fn unreadable_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "metrics = 42\n").unwrap();
        assert!(matches!(
            ViewerConfig::load_or_create(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config: ViewerConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        config.settings.scrape_interval = 0;
        assert!(config.validate().is_err());

        let mut config: ViewerConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        config.metrics.clear();
        assert!(config.validate().is_err());

        let mut config: ViewerConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        config.metrics.push("two words".into());
        assert!(config.validate().is_err());

        let config: ViewerConfig = toml::from_str("metrics = [\"up\"]").unwrap();
        assert!(config.validate().is_err(), "url is required");
    }

    #[test]
    fn url_override_wins() {
        let config: ViewerConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        let config = config.with_url_override(Some("http://localhost:9090/metrics".into()));
        assert_eq!(config.source.url.as_deref(), Some("http://localhost:9090/metrics"));

        let config = config.with_url_override(None);
        assert_eq!(config.source.url.as_deref(), Some("http://localhost:9090/metrics"));
    }

    #[test]
    fn round_trip_through_toml() {
        let config: ViewerConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        let rendered = config.to_toml_string().unwrap();
        let parsed: ViewerConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn expand_home_leaves_plain_paths() {
        assert_eq!(expand_home(Path::new("/etc/x.toml")), PathBuf::from("/etc/x.toml"));
        assert_eq!(expand_home(Path::new("rel.toml")), PathBuf::from("rel.toml"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/x.toml")), home.join("x.toml"));
        }
    }
}
