//! Where scan reports are written.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::dns::DomainName;

/// Directory name used under the platform base directory.
pub const APP_DIR_NAME: &str = "smell-test";

/// Error type for report directory resolution.
#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    #[error("no report directory is defined for this platform")]
    Unsupported,

    #[error("Cannot create {0:?} due to insufficient permissions.")]
    PermissionDenied(PathBuf),

    #[error("cannot create {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Strategy for resolving the report directory.
///
/// Called once per scan, so implementations may create the directory lazily.
pub trait ReportLocator: Send + Sync + 'static {
    fn report_dir(&self) -> Result<PathBuf, LocateError>;
}

/// The per-user directory of the running platform.
///
/// - Linux: `$XDG_CACHE_HOME/smell-test/` (usually `~/.cache/smell-test/`)
/// - macOS: `~/Library/Application Support/smell-test/`
/// - anything else: unsupported
#[derive(Debug, Default, Clone, Copy)]
pub struct PlatformReportDir;

impl ReportLocator for PlatformReportDir {
    fn report_dir(&self) -> Result<PathBuf, LocateError> {
        let dir = platform_report_dir().ok_or(LocateError::Unsupported)?;
        ensure_dir(dir)
    }
}

/// A directory chosen in configuration.
#[derive(Debug, Clone)]
pub struct FixedReportDir {
    dir: PathBuf,
}

impl FixedReportDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ReportLocator for FixedReportDir {
    fn report_dir(&self) -> Result<PathBuf, LocateError> {
        ensure_dir(self.dir.clone())
    }
}

/// The platform report directory, without creating it.
#[must_use]
pub fn platform_report_dir() -> Option<PathBuf> {
    platform_base_dir().map(|base| base.join(APP_DIR_NAME))
}

#[cfg(target_os = "linux")]
fn platform_base_dir() -> Option<PathBuf> {
    dirs::cache_dir()
}

#[cfg(target_os = "macos")]
fn platform_base_dir() -> Option<PathBuf> {
    dirs::data_dir()
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn platform_base_dir() -> Option<PathBuf> {
    None
}

fn ensure_dir(dir: PathBuf) -> Result<PathBuf, LocateError> {
    match std::fs::create_dir_all(&dir) {
        Ok(()) => Ok(dir),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            Err(LocateError::PermissionDenied(dir))
        }
        Err(source) => Err(LocateError::Io { path: dir, source }),
    }
}

/// `<domain>_<YYYYMMDD-HHMMSS>.json`
pub fn report_file_name<Tz>(domain: &DomainName, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{domain}_{}.json", at.format("%Y%m%d-%H%M%S"))
}

/// Full path of the report for `domain` taken at `at`.
pub fn report_path<Tz>(dir: &Path, domain: &DomainName, at: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    dir.join(report_file_name(domain, at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn should_name_report_after_domain_and_timestamp() {
        let at = Utc.with_ymd_and_hms(2018, 3, 7, 16, 41, 36).unwrap();
        let domain = DomainName::new("www.example.com.");

        assert_eq!(
            report_file_name(&domain, &at),
            "www.example.com_20180307-164136.json"
        );
        assert_eq!(
            report_path(Path::new("/reports"), &domain, &at),
            PathBuf::from("/reports/www.example.com_20180307-164136.json")
        );
    }

    #[test]
    fn should_create_fixed_directory() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("nested").join("reports");
        let locator = FixedReportDir::new(&target);

        let dir = locator.report_dir().unwrap();

        assert_eq!(dir, target);
        assert!(dir.is_dir());
    }

    #[test]
    fn should_fail_when_directory_cannot_be_created() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("occupied");
        std::fs::write(&file, b"not a directory").unwrap();
        let locator = FixedReportDir::new(file.join("reports"));

        let result = locator.report_dir();

        assert!(matches!(result, Err(LocateError::Io { .. })));
    }

    #[cfg(any(target_os = "linux", target_os = "macos"))]
    #[test]
    fn should_place_platform_directory_under_app_name() {
        if let Some(dir) = platform_report_dir() {
            assert!(dir.ends_with(APP_DIR_NAME));
        }
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn should_use_application_support_on_macos() {
        let dir = platform_report_dir().unwrap();
        assert!(dir.ends_with("Library/Application Support/smell-test"));
    }
}
