//! Logging setup for the sail-shape tools.
//!
//! The `-v` count selects the level for the workspace's own crates
//! (`sail_shape*` targets); everything else (image decoders, imageproc)
//! stays at `warn` unless the user asks for trace output.

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

const OWN_TARGET_PREFIX: &str = "sail_shape";

/// `0 → info`, `1 → debug`, `2+ → trace`.
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Level applied to third-party targets for a given own level.
fn dependency_level(own: LevelFilter) -> LevelFilter {
    if own >= LevelFilter::Trace {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    }
}

struct SailLogger {
    own: LevelFilter,
    deps: LevelFilter,
    started: Instant,
}

impl SailLogger {
    fn new(own: LevelFilter) -> Self {
        Self {
            own,
            deps: dependency_level(own),
            started: Instant::now(),
        }
    }

    fn is_own(target: &str) -> bool {
        target.starts_with(OWN_TARGET_PREFIX)
    }
}

impl Log for SailLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let limit = if Self::is_own(metadata.target()) {
            self.own
        } else {
            self.deps
        };
        metadata.level() <= limit
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut stderr = std::io::stderr().lock();
        // Own records are short enough without the module path.
        let _ = if Self::is_own(record.target()) {
            writeln!(stderr, "[{elapsed:7.3}s {:>5}] {}", record.level(), record.args())
        } else {
            writeln!(
                stderr,
                "[{elapsed:7.3}s {:>5} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        };
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<SailLogger> = OnceLock::new();

/// Install the stderr logger with `level` for the sail-shape crates.
///
/// Only the first call installs anything.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| SailLogger::new(level));
    log::set_logger(logger)?;
    log::set_max_level(logger.own.max(logger.deps));
    Ok(())
}

/// Install the stderr logger from a `-v` count.
pub fn init_with_verbosity(verbose: u8) -> Result<(), log::SetLoggerError> {
    init_with_level(level_for_verbosity(verbose))
}

/// `EnvFilter` directives used when `RUST_LOG` is unset.
#[cfg(feature = "tracing")]
pub fn default_directives(verbose: u8) -> String {
    let own = level_for_verbosity(verbose).to_string().to_lowercase();
    let deps = dependency_level(level_for_verbosity(verbose))
        .to_string()
        .to_lowercase();
    format!("{deps},{OWN_TARGET_PREFIX}={own}")
}

/// Install a `tracing` subscriber. `RUST_LOG` wins over the `-v` count.
#[cfg(feature = "tracing")]
pub fn init_tracing(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, MetadataBuilder};

    fn meta(target: &str, level: Level) -> Metadata<'_> {
        MetadataBuilder::new().target(target).level(level).build()
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for_verbosity(0), LevelFilter::Info);
        assert_eq!(level_for_verbosity(1), LevelFilter::Debug);
        assert_eq!(level_for_verbosity(7), LevelFilter::Trace);
    }

    #[test]
    fn dependencies_stay_quiet_until_trace() {
        let logger = SailLogger::new(LevelFilter::Debug);
        assert!(logger.enabled(&meta("sail_shape_stripe::rectify", Level::Debug)));
        assert!(logger.enabled(&meta("sail_shape", Level::Info)));
        assert!(!logger.enabled(&meta("png::decoder", Level::Info)));
        assert!(logger.enabled(&meta("png::decoder", Level::Warn)));

        let loud = SailLogger::new(LevelFilter::Trace);
        assert!(loud.enabled(&meta("png::decoder", Level::Debug)));
        assert!(!loud.enabled(&meta("png::decoder", Level::Trace)));
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn tracing_directives_follow_verbosity() {
        assert_eq!(default_directives(0), "warn,sail_shape=info");
        assert_eq!(default_directives(2), "debug,sail_shape=trace");
    }
}
