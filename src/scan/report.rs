//! Interpretation of testssl.sh JSON reports.
//!
//! Only the part of the report needed for display is decoded: the
//! vulnerabilities of the first scan result.
//!
//! ```json
//! {
//!   "scanResult": [
//!     {
//!       "vulnerabilities": [
//!         { "id": "BREACH", "severity": "HIGH", "cve": "CVE-2013-3587" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use serde_json::error::Category;

/// Severity levels used by testssl.sh.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum Severity {
    Ok,
    Info,
    Low,
    Medium,
    High,
    Critical,
    Warn,
    Fatal,
    Other(String),
}

impl Severity {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ok => "OK",
            Self::Info => "INFO",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
            Self::Warn => "WARN",
            Self::Fatal => "FATAL",
            Self::Other(other) => other,
        }
    }

    /// Whether testssl.sh accepts this level for `--severity`.
    pub const fn is_threshold(&self) -> bool {
        matches!(self, Self::Low | Self::Medium | Self::High | Self::Critical)
    }
}

impl FromStr for Severity {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "OK" => Self::Ok,
            "INFO" => Self::Info,
            "LOW" => Self::Low,
            "MEDIUM" => Self::Medium,
            "HIGH" => Self::High,
            "CRITICAL" => Self::Critical,
            "WARN" => Self::Warn,
            "FATAL" => Self::Fatal,
            other => Self::Other(other.to_string()),
        })
    }
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(severity) => severity,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vulnerability reported by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub identifier: String,
    /// CVE reference, when the vulnerability has one.
    pub reference: Option<String>,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-severity vulnerability found: {}",
            self.severity, self.identifier
        )?;
        if let Some(reference) = &self.reference {
            write!(f, " ({reference})")?;
        }
        Ok(())
    }
}

/// Error type for report interpretation.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to read report {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("report is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// The document is JSON but not the shape testssl.sh writes.
    #[error("malformed report: {0}")]
    Malformed(String),
}

#[derive(Deserialize)]
struct RawReport {
    #[serde(rename = "scanResult")]
    scan_result: Vec<RawScanResult>,
}

#[derive(Deserialize)]
struct RawScanResult {
    vulnerabilities: Vec<RawVulnerability>,
}

#[derive(Deserialize)]
struct RawVulnerability {
    id: String,
    severity: Severity,
    #[serde(default)]
    cve: Option<String>,
}

impl From<RawVulnerability> for Finding {
    fn from(raw: RawVulnerability) -> Self {
        Self {
            severity: raw.severity,
            identifier: raw.id,
            reference: raw.cve.filter(|cve| !cve.trim().is_empty()),
        }
    }
}

/// Extract the findings from report content.
pub fn parse_report(content: &str) -> Result<Vec<Finding>, ReportError> {
    let raw: RawReport = serde_json::from_str(content).map_err(|e| match e.classify() {
        Category::Data => ReportError::Malformed(e.to_string()),
        _ => ReportError::InvalidJson(e),
    })?;

    let first = raw
        .scan_result
        .into_iter()
        .next()
        .ok_or_else(|| ReportError::Malformed("scanResult is empty".into()))?;

    Ok(first.vulnerabilities.into_iter().map(Finding::from).collect())
}

/// Read a report file and extract its findings.
pub async fn parse_file(path: &Path) -> Result<Vec<Finding>, ReportError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_report(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn should_extract_finding_with_cve() {
        let report = r#"{
            "scanResult": [{
                "vulnerabilities": [
                    {"severity": "HIGH", "id": "BREACH", "cve": "CVE-2013-3587"}
                ]
            }]
        }"#;

        let findings = parse_report(report).unwrap();

        assert_eq!(
            findings,
            vec![Finding {
                severity: Severity::High,
                identifier: "BREACH".into(),
                reference: Some("CVE-2013-3587".into()),
            }]
        );
    }

    #[test]
    fn should_leave_reference_empty_without_cve() {
        let report = r#"{"scanResult": [{"vulnerabilities": [
            {"severity": "CRITICAL", "id": "heartbleed"},
            {"severity": "LOW", "id": "LUCKY13", "cve": ""}
        ]}]}"#;

        let findings = parse_report(report).unwrap();

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].reference, None);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[1].reference, None);
    }

    #[test]
    fn should_ignore_extra_fields() {
        let report = r#"{
            "Invocation": "testssl.sh --vulnerable",
            "scanResult": [{
                "targetHost": "example.com",
                "ip": "93.184.216.34",
                "vulnerabilities": [
                    {"id": "ROBOT", "severity": "HIGH", "cve": "CVE-2017-17382", "cwe": "CWE-203", "finding": "VULNERABLE"}
                ]
            }]
        }"#;

        let findings = parse_report(report).unwrap();
        assert_eq!(findings[0].identifier, "ROBOT");
    }

    #[test]
    fn should_return_no_findings_for_empty_list() {
        let report = r#"{"scanResult": [{"vulnerabilities": []}]}"#;

        assert!(parse_report(report).unwrap().is_empty());
    }

    #[test]
    fn should_reject_report_without_scan_result() {
        let report = r#"{"vulnerabilities": []}"#;

        assert!(matches!(parse_report(report), Err(ReportError::Malformed(_))));
    }

    #[test]
    fn should_reject_scan_result_without_vulnerabilities() {
        let report = r#"{"scanResult": [{"targetHost": "example.com"}]}"#;

        assert!(matches!(parse_report(report), Err(ReportError::Malformed(_))));
    }

    #[test]
    fn should_reject_empty_scan_result() {
        let report = r#"{"scanResult": []}"#;

        assert!(matches!(parse_report(report), Err(ReportError::Malformed(_))));
    }

    #[test]
    fn should_reject_vulnerability_without_id() {
        let report = r#"{"scanResult": [{"vulnerabilities": [{"severity": "HIGH"}]}]}"#;

        assert!(matches!(parse_report(report), Err(ReportError::Malformed(_))));
    }

    #[test]
    fn should_distinguish_invalid_json() {
        assert!(matches!(
            parse_report("{\"scanResult\": ["),
            Err(ReportError::InvalidJson(_))
        ));
        assert!(matches!(parse_report("not json"), Err(ReportError::InvalidJson(_))));
    }

    #[test]
    fn should_format_findings() {
        let with_cve = Finding {
            severity: Severity::High,
            identifier: "BREACH".into(),
            reference: Some("CVE-2013-3587".into()),
        };
        let without_cve = Finding {
            severity: Severity::Medium,
            identifier: "BEAST".into(),
            reference: None,
        };

        assert_eq!(
            with_cve.to_string(),
            "HIGH-severity vulnerability found: BREACH (CVE-2013-3587)"
        );
        assert_eq!(
            without_cve.to_string(),
            "MEDIUM-severity vulnerability found: BEAST"
        );
    }

    #[test]
    fn should_parse_severity_case_insensitively() {
        assert_eq!("high".parse::<Severity>().unwrap(), Severity::High);
        assert_eq!(
            "debug".parse::<Severity>().unwrap(),
            Severity::Other("DEBUG".into())
        );
        assert!(Severity::Critical.is_threshold());
        assert!(!Severity::Info.is_threshold());
    }

    #[tokio::test]
    async fn should_parse_report_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"scanResult": [{{"vulnerabilities": [{{"severity": "HIGH", "id": "BREACH"}}]}}]}}"#
        )
        .unwrap();
        file.flush().unwrap();

        let findings = parse_file(file.path()).await.unwrap();
        assert_eq!(findings.len(), 1);
    }

    #[tokio::test]
    async fn should_report_missing_file() {
        let result = parse_file(Path::new("/nonexistent/report.json")).await;

        assert!(matches!(result, Err(ReportError::Io { .. })));
    }
}
