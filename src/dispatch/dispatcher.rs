//! Capture-side dispatch of new resolutions to the scan worker.

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::SeenDomains;
use crate::dns::{DomainName, ResolvedAddress, Resolution};
use crate::metrics::DISPATCH_TOTAL;

/// A domain waiting to be assessed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanJob {
    pub domain: DomainName,
    pub address: ResolvedAddress,
}

/// What happened to a resolution handed to the [`Dispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The domain was dispatched earlier; nothing to do.
    AlreadySeen,
    /// The domain was recorded and queued for scanning.
    Queued,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("scan worker is gone, cannot queue {0}")]
    WorkerGone(DomainName),
}

/// Deduplicates resolutions and queues each new domain exactly once.
///
/// Owns the [`SeenDomains`] set. The domain is recorded before the job is
/// queued, so a second answer for the same name arriving while its scan is
/// still pending is dropped here.
pub struct Dispatcher {
    seen: SeenDomains,
    queue: mpsc::Sender<ScanJob>,
}

impl Dispatcher {
    pub fn new(queue: mpsc::Sender<ScanJob>) -> Self {
        Self {
            seen: SeenDomains::new(),
            queue,
        }
    }

    /// Dispatch a resolution.
    ///
    /// Blocks while the scan queue is full, so this must run on a blocking
    /// thread rather than inside the async runtime.
    pub fn dispatch(&mut self, resolution: Resolution) -> Result<DispatchOutcome, DispatchError> {
        let Resolution { domain, address } = resolution;

        if self.seen.contains(&domain) {
            debug!(domain = %domain, "already dispatched");
            metrics::counter!(DISPATCH_TOTAL, "outcome" => "already_seen").increment(1);
            return Ok(DispatchOutcome::AlreadySeen);
        }

        self.seen.insert(domain.clone());
        info!("Requested \"{domain}\" DNS responded \"{address}\"");
        info!("Evaluating {domain}");

        let job = ScanJob {
            domain: domain.clone(),
            address,
        };
        if self.queue.blocking_send(job).is_err() {
            metrics::counter!(DISPATCH_TOTAL, "outcome" => "worker_gone").increment(1);
            return Err(DispatchError::WorkerGone(domain));
        }

        metrics::counter!(DISPATCH_TOTAL, "outcome" => "queued").increment(1);
        Ok(DispatchOutcome::Queued)
    }

    pub fn seen(&self) -> &SeenDomains {
        &self.seen
    }
}
