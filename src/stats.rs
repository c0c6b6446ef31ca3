use crate::probe::{Metric, ProbeResult};

/// Below this many values there is nothing left once the extremes are dropped.
const MIN_SAMPLES: usize = 3;

/// Average of `metric` across all results, ignoring the single highest and
/// lowest value so one slow or failed location does not skew the number.
///
/// Failed results count with their zeroed placeholder. Returns `0.0` when
/// fewer than three values are available.
pub fn average<'a>(results: impl IntoIterator<Item = &'a ProbeResult>, metric: Metric) -> f64 {
    let values: Vec<f64> = results
        .into_iter()
        .map(|r| r.measurement.get(metric))
        .collect();

    trimmed_mean(values)
}

/// Arithmetic mean after dropping one minimum and one maximum.
pub fn trimmed_mean(mut values: Vec<f64>) -> f64 {
    if values.len() < MIN_SAMPLES {
        return 0.0;
    }

    values.sort_by(f64::total_cmp);

    let kept = &values[1..values.len() - 1];
    kept.iter().sum::<f64>() / kept.len() as f64
}
