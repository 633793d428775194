//! Operator-facing log output.
//!
//! Every event is printed on one line behind a marker for its level:
//!
//! ```text
//! [+] Evaluating example.com
//! [!] HIGH-severity vulnerability found: BREACH (CVE-2013-3587)
//! [-] Assessment of example.com abandoned: ...
//! ```

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent};
use tracing_subscriber::registry::LookupSpan;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Marker printed in front of events of `level`.
pub fn marker(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[ ]",
        Level::DEBUG => "[?]",
        Level::INFO => "[+]",
        Level::WARN => "[!]",
        Level::ERROR => "[-]",
    }
}

/// Event format writing `<marker> <fields>`.
pub struct OperatorFormatter;

impl<S, N> FormatEvent<S, N> for OperatorFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        write!(writer, "{} ", marker(event.metadata().level()))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_ansi(false)
        .event_format(OperatorFormatter)
        .with_env_filter(filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::classify;
    use crate::network::frame::tests::udp_frame;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture_output(emit: impl FnOnce()) -> String {
        capture_filtered(EnvFilter::new("trace"), emit)
    }

    fn capture_filtered(filter: EnvFilter, emit: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .event_format(OperatorFormatter)
            .with_env_filter(filter)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, emit);

        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn should_prefix_each_level() {
        let output = capture_output(|| {
            tracing::trace!("frame ignored");
            tracing::debug!("already dispatched");
            tracing::info!("Evaluating example.com");
            tracing::warn!("HIGH-severity vulnerability found: BREACH");
            tracing::error!("Assessment abandoned");
        });

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "[ ] frame ignored",
                "[?] already dispatched",
                "[+] Evaluating example.com",
                "[!] HIGH-severity vulnerability found: BREACH",
                "[-] Assessment abandoned",
            ]
        );
    }

    #[test]
    fn should_keep_structured_fields() {
        let output = capture_output(|| {
            tracing::debug!(domain = "example.com", "already dispatched");
        });

        assert_eq!(output, "[?] already dispatched domain=\"example.com\"\n");
        assert!(!output.contains('\u{1b}'));
    }

    #[test]
    fn should_report_malformed_packets_at_default_level() {
        let frame = udp_frame(53, 40000, &[0xde, 0xad, 0xbe]);
        let mut verdict = None;

        let output = capture_filtered(EnvFilter::new(DEFAULT_FILTER), || {
            verdict = Some(classify(&frame));
        });

        assert_eq!(verdict, Some(None));
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[-] Skipping malformed packet: "));
    }

    #[test]
    fn should_hide_ignored_packets_at_default_level() {
        let output = capture_filtered(EnvFilter::new(DEFAULT_FILTER), || {
            assert!(classify(&udp_frame(40000, 53, b"query")).is_none());
        });

        assert!(output.is_empty());
    }
}
