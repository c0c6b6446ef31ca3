use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classify::{Band, Classifier, Grade};
use crate::orchestrator::RunOutcome;
use crate::probe::{ErrorLog, Metric, ProbeResult};
use crate::rank::{SortCriterion, rank};
use crate::stats::average;

/// Band of each timing in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowBands {
    pub connect: Band,
    pub first_byte: Band,
    pub total: Band,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub vantage_id: String,
    pub label: String,
    pub succeeded: bool,
    pub connect_time: f64,
    pub first_byte_time: f64,
    pub total_time: f64,
    pub bands: RowBands,
}

impl ReportRow {
    fn new(result: &ProbeResult, classifier: &Classifier) -> Self {
        let m = &result.measurement;
        Self {
            vantage_id: result.vantage.id.clone(),
            label: result.vantage.label.clone(),
            succeeded: result.succeeded,
            connect_time: m.connect_time,
            first_byte_time: m.first_byte_time,
            total_time: m.total_time,
            bands: RowBands {
                connect: classifier.classify(Metric::Connect, m.connect_time),
                first_byte: classifier.classify(Metric::FirstByte, m.first_byte_time),
                total: classifier.classify(Metric::Total, m.total_time),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub avg_connect: f64,
    pub avg_first_byte: f64,
    pub avg_total: f64,
    pub failures: usize,
    pub grade: Grade,
}

/// Ranked, classified and summarized outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub domain: String,
    pub sorted_by: SortCriterion,
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<ReportRow>,
    pub summary: Summary,
    pub errors: ErrorLog,
}

impl Report {
    pub fn build(
        domain: impl Into<String>,
        outcome: RunOutcome,
        criterion: SortCriterion,
        classifier: &Classifier,
    ) -> Self {
        let RunOutcome { results, errors } = outcome;

        let avg_connect = average(&results, Metric::Connect);
        let avg_first_byte = average(&results, Metric::FirstByte);
        let avg_total = average(&results, Metric::Total);
        let failures = errors.len();

        let rows = rank(results.into_vec(), criterion)
            .iter()
            .map(|result| ReportRow::new(result, classifier))
            .collect();

        Self {
            domain: domain.into(),
            sorted_by: criterion,
            generated_at: Utc::now(),
            rows,
            summary: Summary {
                avg_connect,
                avg_first_byte,
                avg_total,
                failures,
                grade: classifier.grade(avg_total, failures),
            },
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::vantage::VantagePoint;
    use crate::probe::{Measurement, ResultSet};
    use pretty_assertions::assert_eq;

    fn outcome(totals: &[(&str, Option<f64>)]) -> RunOutcome {
        let mut errors = ErrorLog::default();
        let results: Vec<ProbeResult> = totals
            .iter()
            .map(|(id, total)| {
                let vantage = VantagePoint::new(*id, format!("{id} label"));
                match total {
                    Some(total) => ProbeResult::success(
                        vantage,
                        Measurement {
                            connect_time: 0.1,
                            first_byte_time: total / 2.0,
                            total_time: *total,
                        },
                    ),
                    None => {
                        errors.push(*id, format!("{id}: Unable to connect"));
                        ProbeResult::placeholder(vantage)
                    }
                }
            })
            .collect();

        RunOutcome {
            results: ResultSet::from(results),
            errors,
        }
    }

    #[test]
    fn test_three_locations() {
        let run = outcome(&[("loc1", Some(0.4)), ("loc2", Some(0.6)), ("loc3", Some(3.0))]);
        let report =
            Report::build("example.com", run, SortCriterion::Total, &Classifier::default());

        assert_eq!(report.summary.avg_total, 0.6);
        assert_eq!(report.summary.avg_connect, 0.1);
        assert_eq!(report.summary.failures, 0);
        assert_eq!(report.summary.grade, Grade::A);

        let ids: Vec<&str> = report.rows.iter().map(|r| r.vantage_id.as_str()).collect();
        assert_eq!(ids, vec!["loc1", "loc2", "loc3"]);
        assert_eq!(report.rows[0].bands.total, Band::Good);
        assert_eq!(report.rows[2].bands.total, Band::Danger);
    }

    #[test]
    fn test_partial_failure_falls_through_to_bands() {
        // 3 of 5 fail: not enough to force F on its own, and the two zeros
        // still leave a usable trimmed mean of the remaining values
        let run = outcome(&[
            ("loc1", None),
            ("loc2", Some(0.3)),
            ("loc3", None),
            ("loc4", Some(0.9)),
            ("loc5", None),
        ]);
        let report =
            Report::build("example.com", run, SortCriterion::Status, &Classifier::default());

        assert_eq!(report.rows.len(), 5);
        assert_eq!(report.errors.len(), 3);
        assert!((report.summary.avg_total - 0.1).abs() < 1e-9);
        assert_eq!(report.summary.grade, Grade::APlus);

        let failed: Vec<bool> = report.rows.iter().map(|r| r.succeeded).collect();
        assert_eq!(failed, vec![true, true, false, false, false]);
        for row in report.rows.iter().filter(|r| !r.succeeded) {
            assert_eq!(row.bands.connect, Band::Neutral);
            assert_eq!(row.bands.first_byte, Band::Neutral);
            assert_eq!(row.bands.total, Band::Neutral);
        }
    }

    #[test]
    fn test_too_few_results_grade_f() {
        let run = outcome(&[("loc1", Some(0.3)), ("loc2", Some(0.4))]);
        let report =
            Report::build("example.com", run, SortCriterion::Status, &Classifier::default());
        assert_eq!(report.summary.avg_total, 0.0);
        assert_eq!(report.summary.grade, Grade::F);
    }

    #[test]
    fn test_many_failures_grade_f() {
        let run = outcome(&[
            ("loc1", Some(0.3)),
            ("loc2", Some(0.3)),
            ("loc3", Some(0.3)),
            ("loc4", Some(0.3)),
            ("loc5", None),
            ("loc6", None),
            ("loc7", None),
            ("loc8", None),
            ("loc9", None),
        ]);
        let report =
            Report::build("example.com", run, SortCriterion::Status, &Classifier::default());
        assert_eq!(report.summary.failures, 5);
        assert_eq!(report.summary.grade, Grade::F);
    }

    #[test]
    fn test_serializes_to_json() {
        let run = outcome(&[("loc1", Some(0.4)), ("loc2", None)]);
        let report =
            Report::build("example.com", run, SortCriterion::Connect, &Classifier::default());
        let json = serde_json::to_value(&report).expect("serializable");

        assert_eq!(json["domain"], "example.com");
        assert_eq!(json["sorted_by"], "connect");
        assert_eq!(json["summary"]["grade"], "F");
        assert_eq!(json["rows"][0]["bands"]["total"], "good");
        assert_eq!(json["errors"][0]["vantage_id"], "loc2");
    }
}
