use std::cmp::Ordering;

use serde::Serialize;

use crate::config::vantage::VantagePoint;

/// Timing triple reported by a probe, all values in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Measurement {
    pub connect_time: f64,
    pub first_byte_time: f64,
    pub total_time: f64,
}

/// The three timings a report talks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Connect,
    FirstByte,
    Total,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Connect, Metric::FirstByte, Metric::Total];
}

impl Measurement {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Connect => self.connect_time,
            Metric::FirstByte => self.first_byte_time,
            Metric::Total => self.total_time,
        }
    }
}

/// Ranking key. Failed results order after every successful one, whatever the value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SortKey {
    pub failed: bool,
    pub value: f64,
}

impl Eq for SortKey {}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.failed
            .cmp(&other.failed)
            .then_with(|| self.value.total_cmp(&other.value))
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Outcome of one probe from one vantage point. Failed probes keep a zeroed measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub vantage: VantagePoint,
    pub measurement: Measurement,
    pub succeeded: bool,
    pub sort_key: SortKey,
}

impl ProbeResult {
    pub fn success(vantage: VantagePoint, measurement: Measurement) -> Self {
        Self {
            vantage,
            measurement,
            succeeded: true,
            sort_key: SortKey::default(),
        }
    }

    /// Placeholder stored when the probe failed, so every vantage point keeps its row.
    pub fn placeholder(vantage: VantagePoint) -> Self {
        Self {
            vantage,
            measurement: Measurement::default(),
            succeeded: false,
            sort_key: SortKey::default(),
        }
    }
}

/// One entry per dispatched vantage point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    results: Vec<ProbeResult>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProbeResult> {
        self.results.iter()
    }

    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.succeeded).count()
    }

    pub fn into_vec(self) -> Vec<ProbeResult> {
        self.results
    }
}

impl From<Vec<ProbeResult>> for ResultSet {
    fn from(results: Vec<ProbeResult>) -> Self {
        Self { results }
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ProbeResult;
    type IntoIter = std::slice::Iter<'a, ProbeResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// A failed probe as shown after the report table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeFailure {
    pub vantage_id: String,
    pub cause: String,
}

/// Failures in the order they came in. Append only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorLog {
    entries: Vec<ProbeFailure>,
}

impl ErrorLog {
    pub fn push(&mut self, vantage_id: impl Into<String>, cause: impl Into<String>) {
        self.entries.push(ProbeFailure {
            vantage_id: vantage_id.into(),
            cause: cause.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProbeFailure> {
        self.entries.iter()
    }
}
