use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that stop a run before any probe is dispatched.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Testing server list is empty")]
    EmptyDirectory,
    #[error("Domain is invalid: {0:?}")]
    InvalidDomain(String),
    #[error("Invalid service URL {url}: {source}")]
    InvalidServiceUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// A single probe going wrong. Never fatal for the run, it ends up in the error log.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("{vantage}: request failed")]
    Http {
        vantage: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{vantage}: unexpected HTTP status {status}")]
    Status { vantage: String, status: u16 },
    #[error("{vantage}: {message}")]
    Rejected { vantage: String, message: String },
    #[error("{vantage}: malformed response")]
    Decode {
        vantage: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{vantage}: failed to run curl")]
    Command {
        vantage: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{vantage}: timed out after {timeout:?}")]
    Timeout { vantage: String, timeout: Duration },
}
