//! Deduplication and queueing of newly observed domains.

pub mod dispatcher;
pub mod seen;

pub use dispatcher::{DispatchError, DispatchOutcome, Dispatcher, ScanJob};
pub use seen::SeenDomains;
