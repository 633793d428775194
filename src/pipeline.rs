//! Per-packet orchestration on the capture thread.
//!
//! Each matching frame is classified, and resolutions are handed to the
//! [`Dispatcher`]. Nothing here awaits: the pipeline runs on a blocking
//! thread and only blocks when the scan queue is full.

use std::io;
use std::ops::ControlFlow;
use std::sync::atomic::AtomicBool;

use tokio::sync::mpsc;
use tracing::{error, info};

use crate::dispatch::{DispatchError, DispatchOutcome, Dispatcher, ScanJob};
use crate::dns::classify;
use crate::error::Result;
use crate::network::{CaptureFilter, CaptureStats, PacketCapture, run_capture};

/// Statistics for the capture-side pipeline.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub resolutions: u64,
    pub queued: u64,
    pub duplicates: u64,
}

/// Classifies frames and dispatches new domains.
pub struct Pipeline {
    dispatcher: Dispatcher,
    stats: PipelineStats,
}

impl Pipeline {
    pub fn new(queue: mpsc::Sender<ScanJob>) -> Self {
        Self {
            dispatcher: Dispatcher::new(queue),
            stats: PipelineStats::default(),
        }
    }

    /// Handle one captured frame.
    ///
    /// Breaks only when the scan worker is gone.
    pub fn handle_packet(&mut self, frame: &[u8]) -> ControlFlow<()> {
        let Some(resolution) = classify(frame) else {
            return ControlFlow::Continue(());
        };
        self.stats.resolutions += 1;

        match self.dispatcher.dispatch(resolution) {
            Ok(DispatchOutcome::Queued) => self.stats.queued += 1,
            Ok(DispatchOutcome::AlreadySeen) => self.stats.duplicates += 1,
            Err(err @ DispatchError::WorkerGone(_)) => {
                error!("{err}");
                return ControlFlow::Break(());
            }
        }

        ControlFlow::Continue(())
    }

    /// Capture DNS traffic until the source closes, `running` is cleared or
    /// the worker goes away.
    pub fn run<C>(&mut self, capture: &mut C, running: &AtomicBool) -> Result<CaptureStats>
    where
        C: PacketCapture + ?Sized,
    {
        let filter = CaptureFilter::dns();
        info!("Capturing {filter}");
        run_capture(capture, &filter, running, |frame| self.handle_packet(frame))
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

/// Resolve once `signal` fires.
///
/// If the signal cannot be listened for, the failure is logged and this
/// never resolves, leaving shutdown to the end of capture.
pub async fn wait_for_interrupt<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(err) = signal.await {
        error!("Cannot listen for Ctrl-C: {err}");
        std::future::pending::<()>().await;
    }
}
