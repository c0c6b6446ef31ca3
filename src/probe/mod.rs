pub mod local;
pub mod remote;
pub mod result;

use std::fmt::Write;
use std::future::Future;

use crate::config::vantage::VantagePoint;
use crate::error::ProbeError;

pub use local::LocalProbe;
pub use remote::RemoteProbe;
pub use result::{ErrorLog, Measurement, Metric, ProbeFailure, ProbeResult, ResultSet, SortKey};

/// One timing test against a domain from one vantage point.
///
/// Implementations are responsible for their own timeout, the orchestrator
/// never cancels a probe in flight.
pub trait Probe: Send + Sync + 'static {
    fn probe(
        &self,
        domain: &str,
        vantage: &VantagePoint,
        private: bool,
    ) -> impl Future<Output = Result<Measurement, ProbeError>> + Send;
}

/// Flattens an error and all of its sources into a single line.
pub fn report(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = format!("{}", err);
    while let Some(src) = err.source() {
        let _ = write!(s, ": {}", src);
        err = src;
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_includes_source_chain() {
        let err = ProbeError::Command {
            vantage: "localxx".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "curl not found"),
        };
        assert_eq!(report(&err), "localxx: failed to run curl: curl not found");
    }
}
