//! Opt-in stderr logging, configured from `JNI_PROPERTY_SET_LOG`.
//!
//! Nothing is installed unless the variable is set, so by default the library
//! stays silent.

use std::sync::Once;

use log::{LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;

/// Environment variable holding a `RUST_LOG`-style filter.
pub(crate) const LOG_ENV: &str = "JNI_PROPERTY_SET_LOG";

static LOGGER_INIT: Once = Once::new();
static FILTER: Lazy<Option<LogFilter>> = Lazy::new(|| {
    let value = std::env::var(LOG_ENV).ok()?;
    LogFilter::parse(&value).ok()
});
static STDERR_LOGGER: StderrLogger = StderrLogger;

#[derive(Clone, Debug, PartialEq)]
struct TargetFilter {
    target: String,
    level: LevelFilter,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LogFilter {
    default: LevelFilter,
    directives: Vec<TargetFilter>,
}

impl LogFilter {
    pub(crate) fn parse(input: &str) -> Result<Self, String> {
        let mut default = LevelFilter::Off;
        let mut directives = Vec::new();

        for (index, raw) in input.split(',').enumerate() {
            let directive = raw.trim();
            if directive.is_empty() {
                continue;
            }
            let mut parts = directive.splitn(2, '=');
            let left = parts.next().unwrap_or_default().trim();
            let right = parts.next().map(str::trim);

            if left.is_empty() {
                return Err(format!("empty log directive at position {index}"));
            }

            match right {
                Some("") => return Err(format!("missing log level for target `{left}`")),
                Some(level) => directives.push(TargetFilter {
                    target: left.to_string(),
                    level: parse_level(level).ok_or_else(|| format!("invalid level `{level}`"))?,
                }),
                None => match parse_level(left) {
                    Some(level) => default = level,
                    None => directives.push(TargetFilter {
                        target: left.to_string(),
                        level: LevelFilter::Trace,
                    }),
                },
            }
        }

        Ok(Self { default, directives })
    }

    fn level_for(&self, target: &str) -> LevelFilter {
        self.directives
            .iter()
            .filter(|directive| target.starts_with(&directive.target))
            .max_by_key(|directive| directive.target.len())
            .map_or(self.default, |directive| directive.level)
    }

    pub(crate) fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level().to_level_filter() <= self.level_for(metadata.target())
    }

    pub(crate) fn max_level(&self) -> LevelFilter {
        self.directives
            .iter()
            .map(|directive| directive.level)
            .fold(self.default, Ord::max)
    }
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        FILTER.as_ref().is_some_and(|filter| filter.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{} {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Installs the stderr logger if `JNI_PROPERTY_SET_LOG` holds a valid filter.
///
/// Safe to call repeatedly; only the first call has any effect. An invalid
/// filter or a logger installed by someone else leaves logging untouched.
pub(crate) fn init_from_env() {
    LOGGER_INIT.call_once(|| {
        let Some(filter) = FILTER.as_ref() else {
            return;
        };
        if log::set_logger(&STDERR_LOGGER).is_ok() {
            log::set_max_level(filter.max_level());
        }
    });
}
