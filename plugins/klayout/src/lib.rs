use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use arcstr::ArcStr;
use derive_builder::Builder;
use precheck::error::{with_err_context, ErrorContext, ErrorSource, Result};
use precheck::io::create_file;
use precheck::log::{self, Log};
use precheck::verification::drc::{CheckPaths, Directive, DrcInput, DrcOutput, DrcSummary, DrcTool};

pub mod report;

/// The executable used when none is configured.
pub const DEFAULT_KLAYOUT: &str = "klayout";

/// Runs KLayout in batch mode with a DRC rule script.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[non_exhaustive]
#[builder(pattern = "owned")]
pub struct KlayoutDrc {
    /// The DRC rule script passed to `-r`.
    #[builder(setter(into))]
    pub rules_file: PathBuf,
    /// The KLayout executable, resolved through `PATH` if it is a bare name.
    #[builder(setter(into), default = "PathBuf::from(DEFAULT_KLAYOUT)")]
    pub klayout: PathBuf,
}

impl KlayoutDrc {
    pub fn builder() -> KlayoutDrcBuilder {
        KlayoutDrcBuilder::default()
    }

    pub fn new(rules_file: impl Into<PathBuf>) -> Self {
        Self {
            rules_file: rules_file.into(),
            klayout: PathBuf::from(DEFAULT_KLAYOUT),
        }
    }

    /// Arguments passed to KLayout for `input`, excluding the executable itself.
    pub fn command_args(&self, input: &DrcInput, paths: &CheckPaths) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-b".into(), "-r".into(), self.rules_file.clone().into()];
        let mut directive = |value: OsString| {
            args.push("-rd".into());
            args.push(value);
        };
        directive(path_directive("input", &input.layout_path));
        directive(format!("topcell={}", input.cell_name).into());
        directive(path_directive("report", &paths.report));
        for d in input.directives.iter() {
            directive(d.to_string().into());
        }
        args
    }

    /// Runs the check described by `input` and counts the violations in its report.
    ///
    /// The log file is created before KLayout starts and receives both of its
    /// output streams. The total file is only written once the report has been read.
    pub fn run_check(&self, input: &DrcInput) -> Result<DrcOutput> {
        let paths = input.paths();
        let args = self.command_args(input, &paths);
        self.run_klayout(&input.check_name, &args, &paths.log)?;

        let content = report::read_report(&input.check_name, &paths.report)?;
        let violations = report::count_violations(&content);
        report::write_total(&input.check_name, &paths.total, violations)?;

        Ok(DrcOutput {
            summary: DrcSummary::from_count(violations),
            violations,
            report_path: paths.report,
            total_path: paths.total,
        })
    }

    fn run_klayout(&self, check_name: &ArcStr, args: &[OsString], log_path: &Path) -> Result<()> {
        let out_file = create_file(log_path)?;
        log::info!(
            "run: {} >& {}",
            display_command(&self.klayout, args),
            log_path.display()
        );
        let err_file = with_err_context(out_file.try_clone(), || {
            ErrorContext::CreateFile(log_path.to_path_buf())
        })?;

        let status = with_err_context(
            Command::new(&self.klayout)
                .args(args)
                .stdout(out_file)
                .stderr(err_file)
                .status(),
            || ErrorContext::Task(arcstr::format!("running {}", self.klayout.display())),
        )?;

        if !status.success() {
            return Err(ErrorSource::ToolFailed {
                check: check_name.clone(),
                status: status.into(),
                log_path: log_path.to_path_buf(),
            }
            .into());
        }
        Ok(())
    }
}

impl DrcTool for KlayoutDrc {
    fn run_drc(&self, input: DrcInput) -> Result<DrcOutput> {
        with_err_context(self.run_check(&input), || {
            ErrorContext::Task(arcstr::format!("running KLayout DRC check {}", input.check_name))
        })
    }
}

fn path_directive(key: &str, path: &Path) -> OsString {
    let mut value = OsString::from(format!("{key}="));
    value.push(path);
    value
}

fn display_command(program: &Path, args: &[OsString]) -> String {
    let mut cmd = program.to_string_lossy().into_owned();
    for arg in args {
        cmd.push(' ');
        cmd.push_str(&arg.to_string_lossy());
    }
    cmd
}

/// Runs a KLayout DRC check and reports whether the layout is clean.
///
/// Every failure, whether KLayout exiting unsuccessfully, a missing or empty
/// report, an unwritable total file, or a nonzero violation count, is logged
/// and yields `false`. Use [`KlayoutDrc::run_check`] to inspect the cause.
pub fn run_check(
    check_name: impl Into<ArcStr>,
    rules_file: impl Into<PathBuf>,
    layout_path: impl Into<PathBuf>,
    output_dir: impl Into<PathBuf>,
    directives: impl IntoIterator<Item = Directive>,
) -> bool {
    run_check_with(
        &KlayoutDrc::new(rules_file),
        &DrcInput::new(check_name, layout_path, output_dir).with_directives(directives),
    )
}

/// Like [`run_check`], but with a preconfigured tool.
pub fn run_check_with(tool: &KlayoutDrc, input: &DrcInput) -> bool {
    match tool.run_check(input) {
        Ok(output) => {
            output.log();
            output.summary.is_ok()
        }
        Err(err) => {
            log::error!("{}", err.summary());
            false
        }
    }
}
