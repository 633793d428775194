//! DNS-related modules.

pub mod address;
pub mod classifier;
pub mod name;

pub use address::{ResolvedAddress, is_valid_ipv4};
pub use classifier::{ClassifyError, IgnoreReason, Resolution, Verdict, classify, inspect};
pub use name::DomainName;
