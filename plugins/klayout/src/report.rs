//! Inspection of KLayout's XML marker database.
//!
//! Reports are not parsed as XML: every `<item>` element is one violation.

use std::io::Read;
use std::path::Path;

use arcstr::ArcStr;
use precheck::error::{ErrorSource, Result};
use precheck::io::file_name;

pub const VIOLATION_MARKER: &str = "<item>";

/// Counts the non-overlapping occurrences of [`VIOLATION_MARKER`] in `content`.
pub fn count_violations(content: &str) -> usize {
    content.matches(VIOLATION_MARKER).count()
}

/// Reads the report at `path`.
///
/// Fails if the report cannot be opened or read, or if it is empty.
/// Content that is not valid UTF-8 is decoded lossily.
pub fn read_report(check_name: &ArcStr, path: &Path) -> Result<String> {
    let missing = |source: std::io::Error| missing_artifact(check_name, path, source);

    let mut file = std::fs::File::open(path).map_err(missing)?;
    let size = file.metadata().map_err(missing)?.len();
    if size == 0 {
        return Err(ErrorSource::DegenerateReport {
            check: check_name.clone(),
            file_name: file_name(path).into(),
        }
        .into());
    }

    let mut data = Vec::with_capacity(size as usize);
    file.read_to_end(&mut data).map_err(missing)?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Writes the violation count to `path` as a bare decimal number.
pub fn write_total(check_name: &ArcStr, path: &Path, violations: usize) -> Result<()> {
    std::fs::write(path, violations.to_string())
        .map_err(|source| missing_artifact(check_name, path, source))?;
    Ok(())
}

fn missing_artifact(check_name: &ArcStr, path: &Path, source: std::io::Error) -> ErrorSource {
    ErrorSource::MissingArtifact {
        check: check_name.clone(),
        file_name: file_name(path).into(),
        source,
    }
}
