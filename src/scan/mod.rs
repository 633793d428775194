//! TLS assessment of dispatched domains.

pub mod assessor;
pub mod location;
pub mod report;
pub mod scanner;

pub use assessor::{AssessError, Assessor, AssessorStats, run_assessor};
pub use location::{FixedReportDir, LocateError, PlatformReportDir, ReportLocator};
pub use report::{Finding, ReportError, Severity, parse_file, parse_report};
pub use scanner::{ScanError, ScanRequest, Scanner, TestSsl};
