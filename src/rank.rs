use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::probe::{Metric, ProbeResult, SortKey};

/// What the report is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortCriterion {
    /// Successful tests first.
    #[default]
    Status,
    Connect,
    FirstByte,
    Total,
}

impl SortCriterion {
    fn key(self, result: &ProbeResult) -> SortKey {
        let value = match self {
            SortCriterion::Status if result.succeeded => 1.0,
            SortCriterion::Status => 2.0,
            SortCriterion::Connect => result.measurement.get(Metric::Connect),
            SortCriterion::FirstByte => result.measurement.get(Metric::FirstByte),
            SortCriterion::Total => result.measurement.get(Metric::Total),
        };

        SortKey {
            failed: !result.succeeded,
            value,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortCriterion::Status => "status",
            SortCriterion::Connect => "conn",
            SortCriterion::FirstByte => "ttfb",
            SortCriterion::Total => "ttl",
        }
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status" => Ok(SortCriterion::Status),
            "conn" => Ok(SortCriterion::Connect),
            "ttfb" => Ok(SortCriterion::FirstByte),
            "ttl" => Ok(SortCriterion::Total),
            other => Err(format!(
                "unknown sorting {other:?}, expected one of: status, conn, ttfb, ttl"
            )),
        }
    }
}

/// Recomputes every sort key for `criterion` and sorts in place, ascending and
/// stable. Failed results always end up after the successful ones.
pub fn rank_in_place(results: &mut [ProbeResult], criterion: SortCriterion) {
    for result in results.iter_mut() {
        result.sort_key = criterion.key(result);
    }

    results.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
}

/// Owned variant of [`rank_in_place`].
pub fn rank(
    results: impl IntoIterator<Item = ProbeResult>,
    criterion: SortCriterion,
) -> Vec<ProbeResult> {
    let mut ranked: Vec<ProbeResult> = results.into_iter().collect();
    rank_in_place(&mut ranked, criterion);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::vantage::VantagePoint;
    use crate::probe::Measurement;
    use pretty_assertions::assert_eq;

    fn ok(id: &str, connect: f64, first_byte: f64, total: f64) -> ProbeResult {
        ProbeResult::success(
            VantagePoint::new(id, id),
            Measurement {
                connect_time: connect,
                first_byte_time: first_byte,
                total_time: total,
            },
        )
    }

    fn failed(id: &str) -> ProbeResult {
        ProbeResult::placeholder(VantagePoint::new(id, id))
    }

    fn ids(results: &[ProbeResult]) -> Vec<&str> {
        results.iter().map(|r| r.vantage.id.as_str()).collect()
    }

    fn sample() -> Vec<ProbeResult> {
        vec![
            failed("f1"),
            ok("a", 0.30, 0.90, 1.20),
            ok("b", 0.10, 0.50, 2.00),
            failed("f2"),
            ok("c", 0.20, 0.70, 0.60),
        ]
    }

    #[test]
    fn test_rank_by_status_is_stable() {
        let ranked = rank(sample(), SortCriterion::Status);
        assert_eq!(ids(&ranked), vec!["a", "b", "c", "f1", "f2"]);
        assert_eq!(ranked[0].sort_key, SortKey { failed: false, value: 1.0 });
        assert_eq!(ranked[4].sort_key, SortKey { failed: true, value: 2.0 });
    }

    #[test]
    fn test_rank_by_metric() {
        assert_eq!(
            ids(&rank(sample(), SortCriterion::Connect)),
            vec!["b", "c", "a", "f1", "f2"]
        );
        assert_eq!(
            ids(&rank(sample(), SortCriterion::FirstByte)),
            vec!["b", "c", "a", "f1", "f2"]
        );
        assert_eq!(
            ids(&rank(sample(), SortCriterion::Total)),
            vec!["c", "a", "b", "f1", "f2"]
        );
    }

    #[test]
    fn test_failures_always_last() {
        for criterion in [
            SortCriterion::Status,
            SortCriterion::Connect,
            SortCriterion::FirstByte,
            SortCriterion::Total,
        ] {
            let ranked = rank(sample(), criterion);
            assert_eq!(ranked.len(), 5);

            let first_failure = ranked.iter().position(|r| !r.succeeded).expect("has failures");
            assert!(ranked[first_failure..].iter().all(|r| !r.succeeded));

            let worst_success = ranked[..first_failure].iter().map(|r| r.sort_key).max();
            let best_failure = ranked[first_failure..].iter().map(|r| r.sort_key).min();
            assert!(worst_success < best_failure);
        }
    }

    #[test]
    fn test_failure_beats_huge_values() {
        let ranked = rank(vec![failed("f"), ok("slow", 900.0, 900.0, 900.0)], SortCriterion::Total);
        assert_eq!(ids(&ranked), vec!["slow", "f"]);
    }

    #[test]
    fn test_rerank_is_idempotent() {
        let mut results = sample();
        rank_in_place(&mut results, SortCriterion::Total);
        let once = results.clone();
        rank_in_place(&mut results, SortCriterion::Connect);
        rank_in_place(&mut results, SortCriterion::Total);
        assert_eq!(ids(&results), ids(&once));
        rank_in_place(&mut results, SortCriterion::Total);
        assert_eq!(results, once);
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank(Vec::new(), SortCriterion::Status).is_empty());
    }

    #[test]
    fn test_parse_criterion() {
        assert_eq!("ttfb".parse::<SortCriterion>(), Ok(SortCriterion::FirstByte));
        assert_eq!("conn".parse::<SortCriterion>(), Ok(SortCriterion::Connect));
        assert!("speed".parse::<SortCriterion>().is_err());
        assert_eq!(SortCriterion::Total.to_string(), "ttl");
    }
}
