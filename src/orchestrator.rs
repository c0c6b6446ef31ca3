use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::vantage::{VantageDirectory, VantagePoint};
use crate::error::{ConfigError, ProbeError};
use crate::probe::{ErrorLog, Measurement, Probe, ProbeResult, ResultSet, report};

/// Everything a finished run produced.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub results: ResultSet,
    pub errors: ErrorLog,
}

/// Message sent by a probe task when it is done, tagged with its slot.
struct Completion {
    slot: usize,
    outcome: Result<Measurement, ProbeError>,
}

/// Runs one probe per vantage point, all at the same time.
pub struct Orchestrator<P> {
    probe: Arc<P>,
    domain: String,
    private: bool,
}

impl<P: Probe> Orchestrator<P> {
    pub fn new(probe: P, domain: impl Into<String>, private: bool) -> Result<Self, ConfigError> {
        let domain = domain.into();
        check_domain(&domain)?;

        Ok(Self {
            probe: Arc::new(probe),
            domain,
            private,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub async fn run(&self, directory: &VantageDirectory) -> Result<RunOutcome, ConfigError> {
        self.run_with_progress(directory, |_, _| {}).await
    }

    /// Dispatches every probe, then waits for all of them.
    ///
    /// A failing probe never stops the others: it gets a zeroed placeholder
    /// result and an entry in the error log. `on_progress` is called with
    /// `(completed, total)` each time a probe finishes.
    pub async fn run_with_progress<F>(
        &self,
        directory: &VantageDirectory,
        mut on_progress: F,
    ) -> Result<RunOutcome, ConfigError>
    where
        F: FnMut(usize, usize),
    {
        if directory.is_empty() {
            return Err(ConfigError::EmptyDirectory);
        }

        let vantages: Vec<VantagePoint> = directory.iter().cloned().collect();
        let total = vantages.len();
        let (tx, mut rx) = mpsc::channel::<Completion>(total);

        log::info!("Testing {} from {} locations", self.domain, total);

        let handles: Vec<JoinHandle<()>> = vantages
            .iter()
            .enumerate()
            .map(|(slot, vantage)| {
                let probe = Arc::clone(&self.probe);
                let domain = self.domain.clone();
                let vantage = vantage.clone();
                let private = self.private;
                let tx = tx.clone();

                tokio::spawn(async move {
                    let outcome = probe.probe(&domain, &vantage, private).await;
                    // The receiver lives until every slot is filled.
                    let _ = tx.send(Completion { slot, outcome }).await;
                })
            })
            .collect();
        drop(tx);

        // One slot per vantage point, each written exactly once.
        let mut slots: Vec<Option<ProbeResult>> = vec![None; total];
        let mut errors = ErrorLog::default();
        let mut done = 0;

        while let Some(Completion { slot, outcome }) = rx.recv().await {
            let vantage = vantages[slot].clone();
            slots[slot] = Some(match outcome {
                Ok(measurement) => {
                    log::debug!("{}: {:?}", vantage.id, measurement);
                    ProbeResult::success(vantage, measurement)
                }
                Err(err) => {
                    let cause = report(&err);
                    log::warn!("Probe failed: {cause}");
                    errors.push(vantage.id.clone(), cause);
                    ProbeResult::placeholder(vantage)
                }
            });

            done += 1;
            on_progress(done, total);
        }

        // All senders are gone, so every task has ended. A task that panicked
        // never reported, give it a placeholder like any other failure.
        for (slot, handle) in handles.into_iter().enumerate() {
            if let Err(err) = handle.await {
                if slots[slot].is_none() {
                    let vantage = vantages[slot].clone();
                    let cause = format!("{}: probe task aborted: {err}", vantage.id);
                    log::error!("{cause}");
                    errors.push(vantage.id.clone(), cause);
                    slots[slot] = Some(ProbeResult::placeholder(vantage));

                    done += 1;
                    on_progress(done, total);
                }
            }
        }

        let results: Vec<ProbeResult> = slots
            .into_iter()
            .zip(vantages)
            .map(|(slot, vantage)| slot.unwrap_or_else(|| ProbeResult::placeholder(vantage)))
            .collect();

        log::info!(
            "Finished {} probes, {} failed",
            results.len(),
            errors.len()
        );

        Ok(RunOutcome {
            results: ResultSet::from(results),
            errors,
        })
    }
}

/// Accepts a host name (with optional port and path) or an http(s) URL.
/// Anything starting with `-` is refused so it can never be read as a curl option.
fn check_domain(domain: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::InvalidDomain(domain.to_string());

    if domain.is_empty() || domain.starts_with('-') || domain.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let candidate = if domain.contains("://") {
        domain.to_string()
    } else {
        format!("http://{domain}")
    };
    let url = url::Url::parse(&candidate).map_err(|_| invalid())?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|host| !host.is_empty()) => Ok(()),
        _ => Err(invalid()),
    }
}
