//! Stderr logger for detector processes.
//!
//! A frame producer and the detection worker log concurrently, so every line
//! names its thread and the emitting component:
//!
//! ```text
//! [  0.412s DEBUG facecascade-worker haar::scan] 118 windows at scale 2.44
//! ```
//!
//! The component is the `log` target with the `facecascade_` crate prefix
//! dropped. The level comes from `FACECASCADE_LOG` when installed with
//! [`init_from_env`].

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Variable read by [`init_from_env`].
pub const LOG_ENV: &str = "FACECASCADE_LOG";

struct DetectorLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for DetectorLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let current = std::thread::current();
        let line = format_line(
            self.started.elapsed().as_secs_f64(),
            record.level(),
            current.name().unwrap_or("unnamed"),
            record.target(),
            record.args(),
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn component(target: &str) -> &str {
    target.strip_prefix("facecascade_").unwrap_or(target)
}

fn format_line(
    elapsed: f64,
    level: log::Level,
    thread: &str,
    target: &str,
    args: impl std::fmt::Display,
) -> String {
    format!(
        "[{elapsed:7.3}s {level:>5} {thread} {}] {args}",
        component(target)
    )
}

/// Level named by `value` (`error`, `warn`, `info`, `debug`, `trace`, `off`),
/// case-insensitive.
pub fn parse_level(value: &str) -> Option<LevelFilter> {
    value.trim().parse().ok()
}

static LOGGER: OnceLock<DetectorLogger> = OnceLock::new();

/// Install the stderr logger at `level`. Later calls are no-ops.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| DetectorLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Install the stderr logger at the level named by `FACECASCADE_LOG`,
/// `info` when unset or unparsable.
pub fn init_from_env() -> Result<(), log::SetLoggerError> {
    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|v| parse_level(&v))
        .unwrap_or(LevelFilter::Info);
    init_with_level(level)
}

/// Install a `tracing` subscriber for detector spans.
///
/// The filter comes from `RUST_LOG` (default `info`). Closed spans are
/// reported, which gives per-frame scan and suppression timings, and thread
/// names are kept so worker output stays distinguishable.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_thread_names(true);
    let installed = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
    if installed.is_err() {
        log::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_carry_thread_and_component() {
        let line = format_line(
            0.4123,
            log::Level::Debug,
            "facecascade-worker",
            "facecascade_haar::scan",
            "118 windows",
        );
        assert_eq!(
            line,
            "[  0.412s DEBUG facecascade-worker haar::scan] 118 windows"
        );
        assert_eq!(component("my_app::capture"), "my_app::capture");
    }

    #[test]
    fn level_names_parse() {
        assert_eq!(parse_level("debug"), Some(LevelFilter::Debug));
        assert_eq!(parse_level(" WARN "), Some(LevelFilter::Warn));
        assert_eq!(parse_level("off"), Some(LevelFilter::Off));
        assert_eq!(parse_level("loud"), None);
    }
}
