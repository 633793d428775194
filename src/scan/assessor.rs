//! Worker-side assessment of queued domains.
//!
//! Coordinates report location, the external scan and report interpretation.
//! Designed with trait-based dependencies for testability.

use std::path::PathBuf;

use chrono::Local;
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};

use super::location::{self, LocateError, ReportLocator};
use super::report::{self, Finding, ReportError};
use super::scanner::{ScanError, ScanRequest, Scanner};
use crate::dispatch::ScanJob;
use crate::metrics::{FINDINGS_TOTAL, SCANS_TOTAL};

/// Error type for a single assessment. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum AssessError {
    #[error("no report directory: {0}")]
    ReportDirectory(#[from] LocateError),

    #[error("TestSSL did not execute successfully: {0}")]
    Scan(#[from] ScanError),

    #[error("cannot interpret report {path:?}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: ReportError,
    },
}

/// Statistics for the assessment worker.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AssessorStats {
    pub completed: u64,
    pub failed: u64,
    pub findings: u64,
}

/// Runs one scan per job and interprets its report.
pub struct Assessor<S, L>
where
    S: Scanner,
    L: ReportLocator,
{
    scanner: S,
    locator: L,
}

impl<S, L> Assessor<S, L>
where
    S: Scanner,
    L: ReportLocator,
{
    pub const fn new(scanner: S, locator: L) -> Self {
        Self { scanner, locator }
    }

    /// Scan a domain and return the findings of its report.
    #[instrument(skip(self, job), fields(domain = %job.domain))]
    pub async fn assess(&self, job: &ScanJob) -> Result<Vec<Finding>, AssessError> {
        let dir = self.locator.report_dir()?;
        let report_path = location::report_path(&dir, &job.domain, &Local::now());

        let request = ScanRequest {
            domain: job.domain.clone(),
            address: job.address,
            report_path,
        };
        self.scanner.scan(&request).await?;
        info!("Report generated: {}", request.report_path.display());

        report::parse_file(&request.report_path)
            .await
            .map_err(|source| AssessError::Report {
                path: request.report_path.clone(),
                source,
            })
    }
}

/// Assess queued jobs one after another until the queue closes.
///
/// Running a single scan at a time keeps finding lines from different
/// domains from interleaving.
pub async fn run_assessor<S, L>(
    mut jobs: mpsc::Receiver<ScanJob>,
    assessor: Assessor<S, L>,
) -> AssessorStats
where
    S: Scanner,
    L: ReportLocator,
{
    let mut stats = AssessorStats::default();

    while let Some(job) = jobs.recv().await {
        match assessor.assess(&job).await {
            Ok(findings) => {
                stats.completed += 1;
                stats.findings += findings.len() as u64;
                metrics::counter!(SCANS_TOTAL, "result" => "completed").increment(1);
                print_findings(&job, &findings);
            }
            Err(err) => {
                stats.failed += 1;
                metrics::counter!(SCANS_TOTAL, "result" => "failed").increment(1);
                error!("Assessment of {} abandoned: {err}", job.domain);
            }
        }
    }

    stats
}

fn print_findings(job: &ScanJob, findings: &[Finding]) {
    if findings.is_empty() {
        info!("No vulnerabilities reported for {}", job.domain);
        return;
    }

    for finding in findings {
        metrics::counter!(FINDINGS_TOTAL, "severity" => finding.severity.to_string()).increment(1);
        warn!("{finding}");
    }
}
