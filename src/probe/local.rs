use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;

use super::Probe;
use super::result::Measurement;
use crate::config::vantage::VantagePoint;
use crate::error::ProbeError;

/// curl `--write-out` template, rendered as one JSON object.
const WRITE_OUT: &str = concat!(
    "{",
    "\"http_code\": %{http_code},",
    "\"connect_time\": %{time_connect},",
    "\"firstbyte_time\": %{time_starttransfer},",
    "\"total_time\": %{time_total},",
    "\"namelookup\": %{time_namelookup},",
    "\"redirect_time\": %{time_redirect},",
    "\"num_redirects\": %{num_redirects},",
    "\"download_speed\": %{speed_download}",
    "}"
);

/// Times a single request from this machine with curl.
pub struct LocalProbe {
    curl: String,
    timeout: Duration,
}

impl LocalProbe {
    pub fn new(timeout: Duration) -> Self {
        Self {
            curl: "curl".to_string(),
            timeout,
        }
    }

    /// Use a different curl binary.
    pub fn with_binary(mut self, curl: impl Into<String>) -> Self {
        self.curl = curl.into();
        self
    }
}

impl Probe for LocalProbe {
    async fn probe(
        &self,
        domain: &str,
        vantage: &VantagePoint,
        _private: bool,
    ) -> Result<Measurement, ProbeError> {
        let mut command = Command::new(&self.curl);
        command
            .args(["-L", "-s", "-o", "/dev/null", "-w", WRITE_OUT, domain])
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| ProbeError::Timeout {
                vantage: vantage.id.clone(),
                timeout: self.timeout,
            })?
            .map_err(|source| ProbeError::Command {
                vantage: vantage.id.clone(),
                source,
            })?;

        // curl reports a failed transfer through its exit code, the write-out
        // it still prints (http_code 000) is not valid JSON
        if !output.status.success() {
            return Err(ProbeError::Rejected {
                vantage: vantage.id.clone(),
                message: format!("curl {} for {}", output.status, domain),
            });
        }

        parse_output(&output.stdout, vantage)
    }
}

#[derive(Debug, Deserialize)]
struct CurlStats {
    http_code: u16,
    connect_time: f64,
    firstbyte_time: f64,
    total_time: f64,
    #[serde(default)]
    download_speed: f64,
}

fn parse_output(stdout: &[u8], vantage: &VantagePoint) -> Result<Measurement, ProbeError> {
    let stats: CurlStats = serde_json::from_slice(stdout).map_err(|source| ProbeError::Decode {
        vantage: vantage.id.clone(),
        source,
    })?;

    log::info!(
        "{}: HTTP {} at {:.2} kB/s",
        vantage.id,
        stats.http_code,
        stats.download_speed / 1000.0
    );

    if stats.http_code != 200 {
        return Err(ProbeError::Status {
            vantage: vantage.id.clone(),
            status: stats.http_code,
        });
    }

    Ok(Measurement {
        connect_time: stats.connect_time,
        first_byte_time: stats.firstbyte_time,
        total_time: stats.total_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vantage() -> VantagePoint {
        VantagePoint::new("localxx", "Local")
    }

    #[test]
    fn test_parse_curl_output() {
        let stdout = br#"{"http_code": 200,"connect_time": 0.012,"firstbyte_time": 0.087,
            "total_time": 0.091,"namelookup": 0.004,"redirect_time": 0.000,
            "num_redirects": 0,"download_speed": 13912.000}"#;
        let measurement = parse_output(stdout, &vantage()).expect("valid output");
        assert_eq!(measurement.connect_time, 0.012);
        assert_eq!(measurement.first_byte_time, 0.087);
        assert_eq!(measurement.total_time, 0.091);
    }

    #[test]
    fn test_non_200_is_a_failure() {
        let stdout = br#"{"http_code": 404,"connect_time": 0.01,"firstbyte_time": 0.02,
            "total_time": 0.03,"download_speed": 0}"#;
        let err = parse_output(stdout, &vantage()).unwrap_err();
        assert_eq!(err.to_string(), "localxx: unexpected HTTP status 404");
    }

    #[test]
    fn test_garbage_output() {
        let err = parse_output(b"", &vantage()).unwrap_err();
        assert!(matches!(err, ProbeError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let probe =
            LocalProbe::new(Duration::from_secs(5)).with_binary("/nonexistent/curl-binary");
        let err = probe.probe("example.com", &vantage(), false).await.unwrap_err();
        assert!(matches!(err, ProbeError::Command { .. }));
    }

    /// Writes an executable shell script standing in for curl.
    #[cfg(unix)]
    fn fake_curl(name: &str, body: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = std::env::temp_dir().join(format!("webttfb-{}-{name}", std::process::id()));
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("make script executable");
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_curl_times_out() {
        let script = fake_curl("sleepy-curl", "sleep 10");
        let probe = LocalProbe::new(Duration::from_millis(200))
            .with_binary(script.to_string_lossy().into_owned());

        let started = std::time::Instant::now();
        let err = probe.probe("example.com", &vantage(), false).await.unwrap_err();
        let _ = std::fs::remove_file(&script);

        assert!(matches!(
            err,
            ProbeError::Timeout { timeout, .. } if timeout == Duration::from_millis(200)
        ));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_transfer_is_rejected() {
        let script = fake_curl("failing-curl", "printf '{\"http_code\": 000}'\nexit 6");
        let probe = LocalProbe::new(Duration::from_secs(5))
            .with_binary(script.to_string_lossy().into_owned());

        let err = probe.probe("example.com", &vantage(), false).await.unwrap_err();
        let _ = std::fs::remove_file(&script);

        assert!(matches!(err, ProbeError::Rejected { .. }));
        assert!(err.to_string().starts_with("localxx: curl exit status: 6"));
    }
}
