//! DRC plugin API.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::arcstr::ArcStr;
use crate::error::Result;
use crate::layout::LayoutFormat;
use crate::log::Log;

/// A `key=value` substitution passed to the DRC rule script.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Directive {
    pub key: ArcStr,
    pub value: ArcStr,
}

impl Directive {
    pub fn new(key: impl Into<ArcStr>, value: impl Into<ArcStr>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// A directive that enables the rule deck section `key`.
    pub fn enable(key: impl Into<ArcStr>) -> Self {
        Self::new(key, arcstr::literal!("true"))
    }
}

impl Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Inputs passed to a [`DrcTool`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DrcInput {
    /// The name of the check, used to derive artifact file names.
    pub check_name: ArcStr,
    /// The name of the cell to run DRC on.
    pub cell_name: ArcStr,
    /// The directory containing the `outputs/reports` and `logs` subdirectories.
    pub work_dir: PathBuf,
    /// The path to the layout file containing the cell of interest.
    pub layout_path: PathBuf,
    /// The format of the layout file.
    pub layout_format: LayoutFormat,
    /// Extra directives, passed to the tool in order after the standard ones.
    pub directives: Vec<Directive>,
}

impl DrcInput {
    /// Creates a [`DrcInput`] whose top cell is named after the layout file.
    pub fn new(
        check_name: impl Into<ArcStr>,
        layout_path: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        let layout_path = layout_path.into();
        let cell_name = layout_path
            .file_stem()
            .map(|s| ArcStr::from(&*s.to_string_lossy()))
            .unwrap_or_default();
        Self {
            check_name: check_name.into(),
            cell_name,
            work_dir: work_dir.into(),
            layout_format: LayoutFormat::from_path(&layout_path).unwrap_or_default(),
            layout_path,
            directives: Vec::new(),
        }
    }

    pub fn with_directives(mut self, directives: impl IntoIterator<Item = Directive>) -> Self {
        self.directives.extend(directives);
        self
    }

    #[inline]
    pub fn paths(&self) -> CheckPaths {
        CheckPaths::new(&self.check_name, &self.work_dir)
    }
}

/// Locations of the artifacts belonging to a single check.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CheckPaths {
    /// The XML report written by the DRC tool.
    pub report: PathBuf,
    /// Captured standard output and standard error of the DRC tool.
    pub log: PathBuf,
    /// The violation count.
    pub total: PathBuf,
}

impl CheckPaths {
    pub fn new(check_name: &str, work_dir: impl AsRef<Path>) -> Self {
        let work_dir = work_dir.as_ref();
        let logs = work_dir.join("logs");
        Self {
            report: work_dir
                .join("outputs/reports")
                .join(format!("{check_name}_check.xml")),
            log: logs.join(format!("{check_name}_check.log")),
            total: logs.join(format!("{check_name}_check.total")),
        }
    }
}

/// An enumeration describing the high-level result of a DRC run.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum DrcSummary {
    /// DRC run passed.
    Pass,
    /// DRC run failed.
    Fail,
}

impl DrcSummary {
    /// Checks if a [`DrcSummary`] describes a passing DRC run.
    pub fn is_ok(&self) -> bool {
        match self {
            Self::Pass => true,
            Self::Fail => false,
        }
    }

    pub fn from_count(violations: usize) -> Self {
        if violations == 0 {
            Self::Pass
        } else {
            Self::Fail
        }
    }
}

/// Outputs emitted by a [`DrcTool`].
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct DrcOutput {
    /// A summary of the DRC run.
    pub summary: DrcSummary,
    /// The number of violations found in the report.
    pub violations: usize,
    /// The report the violations were counted in.
    pub report_path: PathBuf,
    /// The file the violation count was written to.
    pub total_path: PathBuf,
}

impl Log for DrcOutput {
    fn log(&self) {
        use crate::log::*;

        if self.summary.is_ok() {
            info!("No DRC Violations found");
        } else {
            error!(
                "Total # of DRC violations is {} Please check {} For more details",
                self.violations,
                self.report_path.display()
            );
        }
    }
}

/// The trait that DRC plugins must implement.
pub trait DrcTool {
    /// Runs the DRC tool on the provided input files.
    fn run_drc(&self, input: DrcInput) -> Result<DrcOutput>;
}
