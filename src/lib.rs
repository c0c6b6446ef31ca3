//! Website time to first byte tester.
//!
//! Runs one timing probe per vantage point concurrently, then ranks,
//! averages and grades the results.

pub mod classify;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod probe;
pub mod rank;
pub mod render;
pub mod report;
pub mod stats;

pub use classify::{Band, Classifier, Grade, GradeScale, Thresholds};
pub use config::{AppConfig, VantageDirectory, VantagePoint};
pub use error::{ConfigError, ProbeError};
pub use orchestrator::{Orchestrator, RunOutcome};
pub use probe::{
    ErrorLog, LocalProbe, Measurement, Metric, Probe, ProbeResult, RemoteProbe, ResultSet,
};
pub use rank::{SortCriterion, rank, rank_in_place};
pub use report::Report;
pub use stats::average;
