//! Configuration loading and validation.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result, ValidationError};
use crate::scan::Severity;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

/// Configuration file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "smell-test.toml";

/// Main configuration for smell-test.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Network interface to capture on. If None or empty, auto-detect.
    pub interface: Option<String>,

    #[serde(default)]
    pub capture: CaptureSettings,

    #[serde(default)]
    pub scanner: ScannerSettings,

    #[serde(default)]
    pub reports: ReportSettings,

    #[serde(default)]
    pub pipeline: PipelineSettings,

    #[serde(default)]
    pub metrics: MetricsSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureSettings {
    /// How long a read may block before the shutdown flag is checked again.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl CaptureSettings {
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// testssl.sh invocation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScannerSettings {
    #[serde(default = "default_executable")]
    pub executable: PathBuf,

    /// Lowest severity testssl.sh reports.
    #[serde(default = "default_severity")]
    pub severity: Severity,

    #[serde(default = "default_openssl_timeout_secs")]
    pub openssl_timeout_secs: u64,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            severity: default_severity(),
            openssl_timeout_secs: default_openssl_timeout_secs(),
        }
    }
}

impl ScannerSettings {
    pub const fn openssl_timeout(&self) -> Duration {
        Duration::from_secs(self.openssl_timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportSettings {
    /// Overrides the per-platform report directory.
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSettings {
    /// Scan jobs waiting for the worker before capture blocks.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Prometheus exporter settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_metrics_listen")]
    pub listen: SocketAddr,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: default_metrics_listen(),
        }
    }
}

const fn default_read_timeout_ms() -> u64 {
    500
}

fn default_executable() -> PathBuf {
    PathBuf::from("./testssl.sh/testssl.sh")
}

const fn default_severity() -> Severity {
    Severity::High
}

const fn default_openssl_timeout_secs() -> u64 {
    20
}

const fn default_queue_capacity() -> usize {
    64
}

const fn default_metrics_listen() -> SocketAddr {
    SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 9100)
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse(&content)
    }

    /// Load from `CONFIG_PATH`, then `smell-test.toml`, falling back to defaults.
    pub fn load_or_default() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::load(path);
        }
        if Path::new(DEFAULT_CONFIG_FILE).is_file() {
            return Self::load(DEFAULT_CONFIG_FILE);
        }
        Ok(Self::default())
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate().map_err(ConfigError::from)?;
        Ok(config)
    }

    /// The configured interface name, treating an empty name as unset.
    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref().filter(|name| !name.trim().is_empty())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.capture.read_timeout_ms == 0 {
            return Err(ValidationError::ZeroReadTimeout);
        }

        if self.scanner.executable.as_os_str().is_empty() {
            return Err(ValidationError::EmptyScannerExecutable);
        }

        if self.scanner.openssl_timeout_secs == 0 {
            return Err(ValidationError::ZeroOpensslTimeout);
        }

        if !self.scanner.severity.is_threshold() {
            return Err(ValidationError::InvalidSeverityThreshold {
                severity: self.scanner.severity.to_string(),
            });
        }

        if let Some(dir) = &self.reports.directory
            && dir.as_os_str().is_empty()
        {
            return Err(ValidationError::EmptyReportDirectory);
        }

        if self.pipeline.queue_capacity == 0 {
            return Err(ValidationError::ZeroQueueCapacity);
        }

        Ok(())
    }
}
