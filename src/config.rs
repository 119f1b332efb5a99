use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_REFRESH_SECS: u64 = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Optional on-disk settings; environment variables take precedence
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub url: Option<String>,
    pub refresh_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub cookie: Option<String>,
    pub log_level: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub base_url: String,
    pub refresh_interval: Duration,
    pub request_timeout: Option<Duration>,
    pub cookie: Option<String>,
    pub log_level: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("refresh_interval", &self.refresh_interval)
            .field("request_timeout", &self.request_timeout)
            .field("cookie", &self.cookie.as_ref().map(|_| "<redacted>"))
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Environment over `GAUGEWATCH_CONFIG` file over defaults
    pub fn load() -> Result<Self, ConfigError> {
        let file = match env::var("GAUGEWATCH_CONFIG") {
            Ok(path) => FileConfig::load(Path::new(&path))?,
            Err(_) => FileConfig::default(),
        };
        Ok(Self::resolve(file, |key| env::var(key).ok()))
    }

    fn resolve(file: FileConfig, var: impl Fn(&str) -> Option<String>) -> Self {
        let refresh_secs = var("GAUGEWATCH_REFRESH_SECS")
            .and_then(|s| s.parse().ok())
            .or(file.refresh_secs)
            .unwrap_or(DEFAULT_REFRESH_SECS)
            .max(1);

        Self {
            base_url: var("GAUGEWATCH_URL")
                .or(file.url)
                .unwrap_or_else(|| DEFAULT_URL.to_string()),
            refresh_interval: Duration::from_secs(refresh_secs),
            request_timeout: var("GAUGEWATCH_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .or(file.timeout_secs)
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            cookie: var("GAUGEWATCH_COOKIE").or(file.cookie),
            log_level: var("GAUGEWATCH_LOG_LEVEL")
                .or(file.log_level)
                .unwrap_or_else(|| "info".to_string()),
        }
    }
}
