//! External TLS scanner trait and the testssl.sh implementation.
//!
//! Provides abstraction over the scanner to enable:
//! - Testing without testssl.sh installed
//! - Swapping in another scanner that writes the same report format

use std::ffi::OsString;
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use super::report::Severity;
use crate::dns::{DomainName, ResolvedAddress};

/// Everything a scanner needs to assess one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub domain: DomainName,
    pub address: ResolvedAddress,
    /// Where the scanner must write its JSON report.
    pub report_path: PathBuf,
}

/// Error type for scanner invocations.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("failed to start {executable:?}: {source}")]
    Spawn {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scanner did not execute successfully ({status}): {output}")]
    Failed { status: String, output: String },

    #[error("scanner exited successfully but wrote no report at {0:?}")]
    MissingReport(PathBuf),
}

/// Trait for TLS scanners.
pub trait Scanner: Send + Sync + 'static {
    /// Scan the request's address and write a report to its `report_path`.
    fn scan(&self, request: &ScanRequest) -> impl Future<Output = Result<(), ScanError>> + Send;
}

/// Scanner backed by the `testssl.sh` script.
#[derive(Debug, Clone)]
pub struct TestSsl {
    executable: PathBuf,
    severity: Severity,
    openssl_timeout: Duration,
}

impl TestSsl {
    pub fn new(executable: impl Into<PathBuf>, severity: Severity, openssl_timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            severity,
            openssl_timeout,
        }
    }

    /// Command-line arguments for one scan, target address last.
    pub fn arguments(&self, request: &ScanRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--vulnerable",
            "--warnings",
            "off",
            "--openssl-timeout",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();

        args.push(self.openssl_timeout.as_secs().to_string().into());
        args.push("--severity".into());
        args.push(self.severity.as_str().into());
        args.extend(["--quiet", "--sneaky", "--nodns", "-oJ"].map(OsString::from));
        args.push(request.report_path.clone().into_os_string());
        args.push(request.address.to_string().into());
        args
    }
}

impl Scanner for TestSsl {
    async fn scan(&self, request: &ScanRequest) -> Result<(), ScanError> {
        debug!(executable = ?self.executable, domain = %request.domain, "starting scanner");

        let output = Command::new(&self.executable)
            .args(self.arguments(request))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ScanError::Spawn {
                executable: self.executable.clone(),
                source,
            })?;

        if !output.status.success() {
            let mut captured = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                if !captured.is_empty() {
                    captured.push(' ');
                }
                captured.push_str(stderr.trim());
            }
            return Err(ScanError::Failed {
                status: output.status.to_string(),
                output: captured.replace('\n', " "),
            });
        }

        match tokio::fs::try_exists(&request.report_path).await {
            Ok(true) => Ok(()),
            _ => Err(ScanError::MissingReport(request.report_path.clone())),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock scanner for testing.
    ///
    /// Records every request and writes a canned report, or fails.
    #[derive(Clone)]
    pub struct MockScanner {
        pub requests: Arc<Mutex<Vec<ScanRequest>>>,
        pub report: Arc<Mutex<Option<String>>>,
    }

    impl MockScanner {
        /// Scanner that writes `report` to the requested path.
        pub fn with_report(report: &str) -> Self {
            Self {
                requests: Arc::default(),
                report: Arc::new(Mutex::new(Some(report.to_string()))),
            }
        }

        /// Scanner that exits with a failure status.
        pub fn failing() -> Self {
            Self {
                requests: Arc::default(),
                report: Arc::default(),
            }
        }

        pub fn scan_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn scanned_domains(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.domain.to_string())
                .collect()
        }
    }

    impl Scanner for MockScanner {
        async fn scan(&self, request: &ScanRequest) -> Result<(), ScanError> {
            self.requests.lock().unwrap().push(request.clone());
            let report = self.report.lock().unwrap().clone();
            match report {
                Some(report) => {
                    std::fs::write(&request.report_path, report).unwrap();
                    Ok(())
                }
                None => Err(ScanError::Failed {
                    status: "exit status: 1".into(),
                    output: "mock failure".into(),
                }),
            }
        }
    }

    fn request() -> ScanRequest {
        ScanRequest {
            domain: DomainName::new("example.com"),
            address: ResolvedAddress::parse("93.184.216.34").unwrap(),
            report_path: PathBuf::from("/tmp/reports/example.com_20240101-120000.json"),
        }
    }

    #[test]
    fn should_build_testssl_arguments() {
        let scanner = TestSsl::new("./testssl.sh/testssl.sh", Severity::High, Duration::from_secs(20));

        let args = scanner.arguments(&request());

        let expected: Vec<OsString> = [
            "--vulnerable",
            "--warnings",
            "off",
            "--openssl-timeout",
            "20",
            "--severity",
            "HIGH",
            "--quiet",
            "--sneaky",
            "--nodns",
            "-oJ",
            "/tmp/reports/example.com_20240101-120000.json",
            "93.184.216.34",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        assert_eq!(args, expected);
    }

    #[test]
    fn should_pass_configured_threshold_and_timeout() {
        let scanner = TestSsl::new("testssl.sh", Severity::Critical, Duration::from_secs(5));

        let args = scanner.arguments(&request());

        assert_eq!(args[4], OsString::from("5"));
        assert_eq!(args[6], OsString::from("CRITICAL"));
        assert_eq!(args.last().unwrap(), &OsString::from("93.184.216.34"));
    }

    #[tokio::test]
    async fn should_fail_to_spawn_missing_executable() {
        let scanner = TestSsl::new(
            "/nonexistent/testssl.sh",
            Severity::High,
            Duration::from_secs(20),
        );

        let result = scanner.scan(&request()).await;

        assert!(matches!(result, Err(ScanError::Spawn { .. })));
    }

    #[tokio::test]
    async fn should_record_mock_requests() {
        let dir = tempfile::TempDir::new().unwrap();
        let scanner = MockScanner::with_report("{}");
        let mut request = request();
        request.report_path = dir.path().join("report.json");

        scanner.scan(&request).await.unwrap();

        assert_eq!(scanner.scan_count(), 1);
        assert!(request.report_path.exists());
    }
}
