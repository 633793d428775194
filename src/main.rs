//! smell-test - Entry point.
//!
//! This binary watches DNS responses on the local network and runs a TLS
//! vulnerability scan against every newly resolved domain, printing the
//! findings of each report.

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use smell_test::config::Config;
use smell_test::dispatch::ScanJob;
use smell_test::error::Error;
use smell_test::network::{PnetCapture, open_failure_message};
use smell_test::pipeline::{Pipeline, PipelineStats, wait_for_interrupt};
use smell_test::scan::{
    Assessor, AssessorStats, FixedReportDir, PlatformReportDir, ReportLocator, TestSsl,
    run_assessor,
};

/// Spawn the assessment worker with the configured report directory.
fn spawn_assessor(config: &Config, jobs: mpsc::Receiver<ScanJob>) -> JoinHandle<AssessorStats> {
    let scanner = TestSsl::new(
        config.scanner.executable.clone(),
        config.scanner.severity.clone(),
        config.scanner.openssl_timeout(),
    );

    match &config.reports.directory {
        Some(dir) => {
            info!("Reports directory: {}", dir.display());
            spawn_with_locator(scanner, FixedReportDir::new(dir), jobs)
        }
        None => spawn_with_locator(scanner, PlatformReportDir, jobs),
    }
}

fn spawn_with_locator<L: ReportLocator>(
    scanner: TestSsl,
    locator: L,
    jobs: mpsc::Receiver<ScanJob>,
) -> JoinHandle<AssessorStats> {
    tokio::spawn(run_assessor(jobs, Assessor::new(scanner, locator)))
}

/// Spawn the packet capture thread that feeds the scan queue.
fn spawn_capture_task(
    mut capture: PnetCapture,
    queue: mpsc::Sender<ScanJob>,
    running: Arc<AtomicBool>,
) -> JoinHandle<smell_test::Result<PipelineStats>> {
    tokio::task::spawn_blocking(move || {
        let mut pipeline = Pipeline::new(queue);
        let capture_stats = pipeline.run(&mut capture, &running)?;
        info!(
            seen = capture_stats.frames_seen,
            matched = capture_stats.frames_matched,
            "capture stopped"
        );
        Ok(pipeline.stats())
    })
}

/// Wait for Ctrl-C or the end of capture, then stop the worker.
async fn wait_for_shutdown(
    running: Arc<AtomicBool>,
    mut capture_handle: JoinHandle<smell_test::Result<PipelineStats>>,
    worker_handle: JoinHandle<AssessorStats>,
) -> Result<()> {
    let finished = tokio::select! {
        () = wait_for_interrupt(tokio::signal::ctrl_c()) => None,
        result = &mut capture_handle => Some(result),
    };

    running.store(false, Ordering::SeqCst);
    worker_handle.abort();

    let capture_result = match finished {
        Some(result) => result,
        None => {
            info!("Ctrl-C received, shutting down...");
            capture_handle.await
        }
    };

    let stats = capture_result
        .context("Capture task panicked")?
        .context("Packet capture failed")?;
    info!(
        resolutions = stats.resolutions,
        queued = stats.queued,
        duplicates = stats.duplicates,
        "Shutdown complete."
    );

    Ok(())
}

async fn run() -> Result<()> {
    let config = Config::load_or_default().context("Failed to load configuration")?;

    smell_test::metrics::init(&config.metrics).context("Failed to initialize metrics")?;
    if config.metrics.enabled {
        info!("Metrics enabled on {}", config.metrics.listen);
    }

    info!("Beginning \"Smell Test\"");

    let capture = PnetCapture::open(config.interface(), config.capture.read_timeout())
        .map_err(|err| match err {
            Error::Network(err) => anyhow::anyhow!(open_failure_message(config.interface(), &err)),
            other => anyhow::Error::new(other),
        })?;
    info!("Listening on interface: {}", capture.interface_name());

    let (queue_tx, queue_rx) = mpsc::channel::<ScanJob>(config.pipeline.queue_capacity);
    let running = Arc::new(AtomicBool::new(true));

    let worker_handle = spawn_assessor(&config, queue_rx);
    let capture_handle = spawn_capture_task(capture, queue_tx, Arc::clone(&running));

    wait_for_shutdown(running, capture_handle, worker_handle).await
}

#[tokio::main]
async fn main() -> ExitCode {
    smell_test::output::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
