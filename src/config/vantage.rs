use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;

use crate::error::ConfigError;

/// Width of a server identifier at the start of each directory line.
const ID_WIDTH: usize = 7;
/// Byte offset where the label starts, after the identifier and its separator.
const LABEL_OFFSET: usize = 9;
const MIN_LINE_LEN: usize = 10;

/// A location the service can run a test from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VantagePoint {
    pub id: String,
    pub label: String,
}

impl VantagePoint {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// The set of vantage points for a run. Never empty, identifiers are unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VantageDirectory {
    points: Vec<VantagePoint>,
}

impl VantageDirectory {
    /// Builds a directory, keeping the first occurrence of a duplicated id and
    /// skipping points with an empty label.
    pub fn new(points: impl IntoIterator<Item = VantagePoint>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let points: Vec<VantagePoint> = points
            .into_iter()
            .filter(|p| !p.label.is_empty())
            .filter(|p| seen.insert(p.id.clone()))
            .collect();

        if points.is_empty() {
            return Err(ConfigError::EmptyDirectory);
        }

        Ok(Self { points })
    }

    /// Parses the `.webttfb.cfg` format: one `<id:7> <label>` entry per line,
    /// `;` and `#` start a comment.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let points = contents.lines().filter_map(parse_line);
        Self::new(points)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let directory = Self::parse(&contents)?;
        log::info!(
            "Loaded {} vantage points from {}",
            directory.len(),
            path.display()
        );
        Ok(directory)
    }

    /// The single point used when testing from this machine.
    pub fn local() -> Self {
        Self {
            points: vec![VantagePoint::new("localxx", "Local")],
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VantagePoint> {
        self.points.iter()
    }
}

fn parse_line(line: &str) -> Option<VantagePoint> {
    if line.len() < MIN_LINE_LEN || line.starts_with(';') || line.starts_with('#') {
        return None;
    }

    let id = line.get(..ID_WIDTH)?;
    let label = line.get(LABEL_OFFSET..)?.trim_end();

    Some(VantagePoint::new(id, label))
}
