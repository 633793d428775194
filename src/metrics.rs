//! Prometheus exporter for pipeline counters.
//!
//! | counter | label |
//! |---|---|
//! | `smell_test_packets_total` | `outcome`: `resolution` or an ignore reason, `malformed` |
//! | `smell_test_dispatch_total` | `outcome`: `queued`, `already_seen`, `worker_gone` |
//! | `smell_test_scans_total` | `result`: `completed`, `failed` |
//! | `smell_test_findings_total` | `severity` |

use metrics::{Unit, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::MetricsSettings;
use crate::error::{Error, Result};

pub const PACKETS_TOTAL: &str = "smell_test_packets_total";
pub const DISPATCH_TOTAL: &str = "smell_test_dispatch_total";
pub const SCANS_TOTAL: &str = "smell_test_scans_total";
pub const FINDINGS_TOTAL: &str = "smell_test_findings_total";

/// Install the exporter when enabled.
///
/// Counters recorded without an installed recorder are discarded, so a
/// disabled exporter costs nothing on the capture path.
pub fn init(settings: &MetricsSettings) -> Result<()> {
    if !settings.enabled {
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(settings.listen)
        .install()
        .map_err(|e| Error::Metrics(e.to_string()))?;

    describe();
    Ok(())
}

fn describe() {
    describe_counter!(PACKETS_TOTAL, Unit::Count, "Captured DNS frames by outcome");
    describe_counter!(DISPATCH_TOTAL, Unit::Count, "Resolutions by dispatch outcome");
    describe_counter!(SCANS_TOTAL, Unit::Count, "Completed and failed assessments");
    describe_counter!(FINDINGS_TOTAL, Unit::Count, "Reported vulnerabilities by severity");
}
