//! smell-test - passive TLS assessment of the domains your network resolves.
//!
//! smell-test sniffs DNS responses on a local interface, extracts every
//! `(domain, IPv4 address)` resolution and runs an external TLS scanner
//! (`testssl.sh`) once against each domain it has not seen before. Findings
//! from the scanner's JSON report are printed as they come in.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`config`]: Configuration loading and validation
//! - [`network`]: Packet capture and the capture loop
//! - [`dns`]: Domain names, address validation and DNS response classification
//! - [`dispatch`]: Deduplication of seen domains and the scan queue
//! - [`scan`]: External scanner, report location and report interpretation
//! - [`pipeline`]: Per-packet orchestration on the capture thread
//! - [`output`]: Operator-facing log formatting
//! - [`metrics`]: Prometheus exporter setup
//! - [`error`]: Error types
//!
//! # Testing
//!
//! The capture source, the scanner and the report directory are trait seams,
//! so the whole pipeline can be exercised without a network or `testssl.sh`:
//!
//! ```rust
//! use smell_test::dispatch::SeenDomains;
//! use smell_test::dns::DomainName;
//!
//! let mut seen = SeenDomains::new();
//! assert!(seen.insert(DomainName::new("Example.COM.")));
//! assert!(seen.contains(&DomainName::new("example.com")));
//! ```

pub mod config;
pub mod dispatch;
pub mod dns;
pub mod error;
pub mod metrics;
pub mod network;
pub mod output;
pub mod pipeline;
pub mod scan;

pub use config::Config;
pub use error::{Error, Result};
