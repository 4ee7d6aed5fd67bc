//! Logging facade and the process-wide log backend.
//!
//! Library code logs through the macros re-exported here. Binaries install a
//! `tracing-subscriber` backend once at start-up with [`init`], passing an
//! explicit [`LogConfig`]; `log` records reach it through the tracing-log bridge.

use std::fmt::{Display, Write as _};
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::arcstr::{self, ArcStr};
use crate::error::{ErrorSource, Result};

#[cfg(test)]
#[allow(unused_imports)]
pub use std::{
    println as trace, println as debug, println as info, println as warn, println as error,
};

#[cfg(not(test))]
#[allow(unused_imports)]
pub use ::log::{debug, error, info, trace, warn};

pub use tracing_subscriber::filter::LevelFilter;

pub trait Log {
    fn log(&self);
}

pub const DEFAULT_TIME_FORMAT: &str = "%d-%b-%Y %H:%M:%S";

/// Log levels accepted in configuration files and on the command line.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    #[default]
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "off" => Self::Off,
            "error" => Self::Error,
            "warn" | "warning" => Self::Warn,
            "info" => Self::Info,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => return Err(format!("unknown log level: {s}")),
        })
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LogConfig {
    /// The most verbose level that is emitted.
    pub level: LevelFilter,
    time_format: ArcStr,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::DEBUG,
            time_format: arcstr::literal!(DEFAULT_TIME_FORMAT),
        }
    }
}

impl LogConfig {
    pub fn with_level(mut self, level: impl Into<LevelFilter>) -> Self {
        self.level = level.into();
        self
    }

    /// Sets the `chrono` format string of the timestamp column.
    ///
    /// Fails if `format` contains an unknown or malformed specifier.
    pub fn with_time_format(mut self, format: impl Into<ArcStr>) -> Result<Self> {
        let format = format.into();
        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(ErrorSource::InvalidArgs(format!("invalid time format: {format:?}")).into());
        }
        self.time_format = format;
        Ok(self)
    }

    pub fn time_format(&self) -> &str {
        &self.time_format
    }
}

/// Formats events as `<time> | <LEVEL> | <message>` lines.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LineFormat {
    time_format: ArcStr,
}

impl LineFormat {
    pub fn new(config: &LogConfig) -> Self {
        Self {
            time_format: config.time_format.clone(),
        }
    }

    pub fn format_line(
        &self,
        time: &DateTime<Local>,
        level: Level,
        message: &dyn Display,
    ) -> String {
        let mut line = String::new();
        if write!(line, "{}", time.format(&self.time_format)).is_err() {
            line.clear();
            let _ = write!(line, "{}", time.format(DEFAULT_TIME_FORMAT));
        }
        let _ = write!(line, " | {:<7} | {}", level_name(level), message);
        line
    }
}

fn level_name(level: Level) -> &'static str {
    if level == Level::ERROR {
        "ERROR"
    } else if level == Level::WARN {
        "WARNING"
    } else if level == Level::INFO {
        "INFO"
    } else if level == Level::DEBUG {
        "DEBUG"
    } else {
        "TRACE"
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut message = String::new();
        ctx.field_format()
            .format_fields(Writer::new(&mut message), event)?;
        let level = *event.metadata().level();
        writeln!(writer, "{}", self.format_line(&Local::now(), level, &message))
    }
}

/// Installs the process-wide log backend, writing to standard error.
///
/// Fails if a backend has already been installed.
pub fn init(config: LogConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(config.level)
        .with_writer(std::io::stderr)
        .event_format(LineFormat::new(&config))
        .try_init()
        .map_err(ErrorSource::Logger)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use chrono::TimeZone;

    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2023, 3, 7, 9, 5, 1).unwrap()
    }

    #[test]
    fn test_format_line() {
        let fmt = LineFormat::new(&LogConfig::default());
        let line = fmt.format_line(&time(), Level::INFO, &"run: klayout -b");
        assert_eq!(line, "07-Mar-2023 09:05:01 | INFO    | run: klayout -b");

        let line = fmt.format_line(&time(), Level::WARN, &"careful");
        assert_eq!(line, "07-Mar-2023 09:05:01 | WARNING | careful");
    }

    #[test]
    fn test_time_format() {
        let config = LogConfig::default().with_time_format("%H:%M").unwrap();
        assert_eq!(config.time_format(), "%H:%M");
        let line = LineFormat::new(&config).format_line(&time(), Level::ERROR, &"x");
        assert_eq!(line, "09:05 | ERROR   | x");

        assert!(LogConfig::default().with_time_format("%Q").is_err());
    }

    #[test]
    fn test_malformed_time_format_falls_back() {
        let fmt = LineFormat {
            time_format: arcstr::literal!("%Q"),
        };
        let line = fmt.format_line(&time(), Level::INFO, &"still logged");
        assert_eq!(line, "07-Mar-2023 09:05:01 | INFO    | still logged");
    }

    #[test]
    fn test_subscriber_output() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let config = LogConfig::default().with_level(LogLevel::Info);
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(config.level)
            .with_writer(move || writer.clone())
            .event_format(LineFormat::new(&config))
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("hidden");
            tracing::error!("shown {}", 3);
        });

        let out = buf.contents();
        assert!(!out.contains("hidden"));
        assert!(out.ends_with(" | ERROR   | shown 3\n"));
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn test_log_level_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            level: LogLevel,
        }
        let w: Wrapper = toml::from_str("level = \"warn\"").unwrap();
        assert_eq!(LevelFilter::from(w.level), LevelFilter::WARN);

        assert_eq!("WARNING".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
