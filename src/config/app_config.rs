use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::classify::Classifier;
use crate::error::ConfigError;

pub const DEFAULT_SERVICE_URL: &str = "https://performance.sucuri.net/index.php?ajaxcall";
const DEFAULT_CONFIG_FILE: &str = "config.yml";
const VANTAGE_FILE_NAME: &str = ".webttfb.cfg";

/// Settings for a run, read from a YAML file. Every field is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Endpoint of the load time testing service.
    pub service_url: String,

    /// Per probe timeout in seconds.
    pub timeout_seconds: u64,

    /// Location of the vantage directory. Defaults to `~/.webttfb.cfg`.
    pub vantage_file: Option<PathBuf>,

    /// Ceilings used to color values and grade the run.
    pub thresholds: Classifier,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            timeout_seconds: 30,
            vantage_file: None,
            thresholds: Classifier::default(),
        }
    }
}

impl AppConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn vantage_file(&self) -> PathBuf {
        self.vantage_file.clone().unwrap_or_else(default_vantage_file)
    }

    pub fn from_yaml(yaml: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn default_vantage_file() -> PathBuf {
    env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(VANTAGE_FILE_NAME)
}

/// Load the application configuration from a YAML file and environment variables.
///
/// The file is `path` when given, otherwise the one named by `CONFIG_FILE`,
/// otherwise `config.yml`. A missing default file is not an error, the
/// built-in defaults are used. `WEBTTFB_SERVICE_URL` and `WEBTTFB_VANTAGE_FILE`
/// override the values from the file.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let explicit = path
        .map(Path::to_path_buf)
        .or_else(|| env::var_os("CONFIG_FILE").map(PathBuf::from));
    let location = explicit
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut config = match std::fs::read_to_string(&location) {
        Ok(yaml) => {
            log::info!("Using config file: {}", location.display());
            AppConfig::from_yaml(&yaml, &location)?
        }
        Err(err) if explicit.is_none() && err.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("No {} found, using defaults", location.display());
            AppConfig::default()
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: location,
                source,
            });
        }
    };

    if let Ok(url) = env::var("WEBTTFB_SERVICE_URL") {
        config.service_url = url;
    }
    if let Some(file) = env::var_os("WEBTTFB_VANTAGE_FILE") {
        config.vantage_file = Some(PathBuf::from(file));
    }

    log::info!("Using service: {}", config.service_url);

    Ok(config)
}
