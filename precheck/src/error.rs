use std::fmt::{Debug, Display};
use std::path::PathBuf;

use thiserror::Error;

use crate::arcstr::ArcStr;

pub type Result<T> = std::result::Result<T, PrecheckError>;

pub struct PrecheckError {
    pub(crate) source: ErrorSource,
    pub(crate) context: Vec<ErrorContext>,
}

impl PrecheckError {
    pub fn source(&self) -> &ErrorSource {
        &self.source
    }

    pub fn context(&self) -> &[ErrorContext] {
        &self.context
    }
}

impl std::error::Error for PrecheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl Display for PrecheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Error:\n{}", self.source)?;
        if !self.context.is_empty() {
            writeln!(f, "\nError occurred:")?;
            for item in self.context.iter() {
                writeln!(f, "\twhile {}", item)?;
            }
        }
        Ok(())
    }
}

impl Debug for PrecheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.source)?;
        if !self.context.is_empty() {
            writeln!(f, "\nError occurred:")?;
            for (i, item) in self.context.iter().enumerate() {
                writeln!(f, "\t{}: {:?}", i, item)?;
            }
        }
        Ok(())
    }
}

impl<T> From<T> for PrecheckError
where
    T: Into<ErrorSource>,
{
    fn from(value: T) -> Self {
        Self {
            source: value.into(),
            context: Vec::new(),
        }
    }
}

impl PrecheckError {
    pub fn new(source: impl Into<ErrorSource>) -> Self {
        Self {
            source: source.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<ErrorContext>) -> Self {
        self.context.push(ctx.into());
        self
    }

    #[inline]
    pub fn into_inner(self) -> ErrorSource {
        self.source
    }

    /// The source message followed by each context, on a single line.
    pub fn summary(&self) -> String {
        let mut line = self.source.to_string();
        for item in self.context.iter() {
            line.push_str(&format!(" while {item}"));
        }
        line
    }
}

#[inline]
pub fn with_err_context<T, E, C>(result: std::result::Result<T, E>, ctx: C) -> Result<T>
where
    C: FnOnce() -> ErrorContext,
    E: Into<PrecheckError>,
{
    result.map_err(|err| err.into().with_context(ctx()))
}

#[derive(Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorContext {
    CreateFile(PathBuf),
    ReadFile(PathBuf),
    Task(ArcStr),
}

impl Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ErrorContext::*;
        match self {
            CreateFile(path) => write!(f, "creating file {path:?}"),
            ReadFile(path) => write!(f, "reading file {path:?}"),
            Task(task) => write!(f, "{task}"),
        }
    }
}

/// The exit status of an external tool, as reported in error messages.
///
/// A process terminated by a signal is recorded as the negated signal
/// number. Holds `None` only when neither is available.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ExitStat(pub Option<i32>);

impl Display for ExitStat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(code) => write!(f, "{code}"),
            None => write!(f, "unknown"),
        }
    }
}

impl From<std::process::ExitStatus> for ExitStat {
    fn from(value: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = value.signal() {
                return Self(Some(-signal));
            }
        }
        Self(value.code())
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorSource {
    #[error("ERROR {check} FAILED, stat={status}, see {}", .log_path.display())]
    ToolFailed {
        check: ArcStr,
        status: ExitStat,
        log_path: PathBuf,
    },

    #[error("ERROR {check} FAILED TO GENERATE {file_name}: {source}")]
    MissingArtifact {
        check: ArcStr,
        file_name: ArcStr,
        source: std::io::Error,
    },

    #[error("ERROR {check} WROTE DEGENERATE {file_name}: empty")]
    DegenerateReport { check: ArcStr, file_name: ArcStr },

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("error parsing TOML: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("error installing logger: {0}")]
    Logger(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_failure_message() {
        let err = ErrorSource::ToolFailed {
            check: arcstr::literal!("klayout_drc"),
            status: ExitStat(Some(2)),
            log_path: PathBuf::from("/out/logs/klayout_drc_check.log"),
        };
        assert_eq!(
            err.to_string(),
            "ERROR klayout_drc FAILED, stat=2, see /out/logs/klayout_drc_check.log"
        );

    }

    #[cfg(unix)]
    #[test]
    fn signal_exit_is_negated() {
        use std::os::unix::process::ExitStatusExt;

        let status = ExitStat::from(std::process::ExitStatus::from_raw(9));
        assert_eq!(status, ExitStat(Some(-9)));

        // A normal exit with code 3 is encoded as 3 << 8.
        let status = ExitStat::from(std::process::ExitStatus::from_raw(3 << 8));
        assert_eq!(status, ExitStat(Some(3)));

        let err = ErrorSource::ToolFailed {
            check: arcstr::literal!("klayout_drc"),
            status: ExitStat::from(std::process::ExitStatus::from_raw(15)),
            log_path: PathBuf::from("drc.log"),
        };
        assert_eq!(err.to_string(), "ERROR klayout_drc FAILED, stat=-15, see drc.log");
    }

    #[test]
    fn artifact_messages_name_the_file() {
        let err = ErrorSource::MissingArtifact {
            check: arcstr::literal!("klayout_drc"),
            file_name: arcstr::literal!("klayout_drc_check.xml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(
            err.to_string(),
            "ERROR klayout_drc FAILED TO GENERATE klayout_drc_check.xml: not found"
        );

        let err = ErrorSource::DegenerateReport {
            check: arcstr::literal!("klayout_drc"),
            file_name: arcstr::literal!("klayout_drc_check.xml"),
        };
        assert_eq!(
            err.to_string(),
            "ERROR klayout_drc WROTE DEGENERATE klayout_drc_check.xml: empty"
        );
    }

    #[test]
    fn context_is_displayed() {
        let err = PrecheckError::new(ErrorSource::InvalidArgs("boom".to_string()))
            .with_context(ErrorContext::Task(arcstr::literal!("running DRC")));
        let msg = err.to_string();
        assert!(msg.contains("invalid arguments: boom"));
        assert!(msg.contains("while running DRC"));
        assert_eq!(err.context().len(), 1);
        assert_eq!(err.summary(), "invalid arguments: boom while running DRC");
    }
}
