//! Error types for the smell-test pipeline.
//!
//! Stage-specific failures (packet classification, dispatch, scanning,
//! report parsing) live next to the code that raises them. This module holds
//! the errors that can stop the process: configuration, capture setup and
//! metrics installation.

use std::io;

use thiserror::Error;

/// Main error type for smell-test operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("metrics error: {0}")]
    Metrics(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Validation errors for configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("capture.read_timeout_ms must be greater than 0")]
    ZeroReadTimeout,

    #[error("scanner.executable cannot be empty")]
    EmptyScannerExecutable,

    #[error("scanner.openssl_timeout_secs must be greater than 0")]
    ZeroOpensslTimeout,

    #[error("scanner.severity must be one of LOW, MEDIUM, HIGH, CRITICAL, got {severity:?}")]
    InvalidSeverityThreshold { severity: String },

    #[error("reports.directory cannot be empty")]
    EmptyReportDirectory,

    #[error("pipeline.queue_capacity must be greater than 0")]
    ZeroQueueCapacity,
}

/// Network-related errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("no suitable network interface found")]
    NoInterface,

    #[error("network interface {0:?} not found")]
    UnknownInterface(String),

    #[error("failed to open capture on {interface:?}: {reason}")]
    ChannelOpen { interface: String, reason: String },

    #[error("unsupported channel type on {0:?}")]
    UnsupportedChannel(String),

    #[error("packet capture failed: {0}")]
    Capture(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;
