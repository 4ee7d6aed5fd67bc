use std::ffi::OsString;
use std::path::{Path, PathBuf};

use arcstr::ArcStr;
use clap::Parser;
use klayout::{run_check_with, KlayoutDrc, DEFAULT_KLAYOUT};
use precheck::config::DrcConfig;
use precheck::error::{ErrorSource, Result};
use precheck::layout::LayoutFormat;
use precheck::log::{self, LogLevel};
use precheck::verification::drc::{Directive, DrcInput};

pub const DEFAULT_CHECK_NAME: &str = "klayout_drc";
/// The rule deck, relative to the precheck root.
pub const DEFAULT_DRC_SCRIPT: &str = "tech-files/sky130A_mr.drc";

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about,
    long_about = "Runs KLayout DRC checks on a given GDS file and reports whether it is clean"
)]
pub struct Args {
    /// GDS file to apply DRC checks on.
    #[arg(short = 'g', long = "gds_input_file_path")]
    pub gds_input_file_path: PathBuf,
    /// Output directory, containing `outputs/reports` and `logs`.
    #[arg(short = 'o', long = "output_directory")]
    pub output_directory: PathBuf,
    /// Run FEOL rules.
    #[arg(short = 'f', long)]
    pub feol: bool,
    /// Run BEOL rules.
    #[arg(short = 'b', long)]
    pub beol: bool,
    /// Run OFFGRID rules (also accepted as `-og`).
    #[arg(long = "off_grid")]
    pub off_grid: bool,
    /// DRC rule script; defaults to the precheck root's sky130A deck.
    #[arg(short = 'd', long = "drc_script_path")]
    pub drc_script_path: Option<PathBuf>,
    /// KLayout executable.
    #[arg(long, env = "KLAYOUT")]
    pub klayout: Option<PathBuf>,
    /// Directory containing `tech-files`.
    #[arg(long = "precheck_root", env = "PRECHECK_ROOT")]
    pub precheck_root: Option<PathBuf>,
    /// Name used to derive report and log file names.
    #[arg(long = "check_name")]
    pub check_name: Option<ArcStr>,
    /// TOML configuration file.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,
    #[arg(long = "log_level")]
    pub log_level: Option<LogLevel>,
}

/// Rewrites the two-letter `-og` flag, which clap cannot express, to `--off_grid`.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(|arg| {
            let arg = arg.into();
            if arg == "-og" {
                OsString::from("--off_grid")
            } else {
                arg
            }
        })
        .collect()
}

impl Args {
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// Rule deck directives selected by flags, in `feol`, `beol`, `offgrid` order.
    pub fn directives(&self) -> Vec<Directive> {
        [
            (self.feol, "feol"),
            (self.beol, "beol"),
            (self.off_grid, "offgrid"),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .map(|(_, key)| Directive::enable(key))
        .collect()
    }

    /// Merges the arguments with `config`. Arguments win.
    pub fn settings(&self, config: &DrcConfig) -> Settings {
        let drc_script = self
            .drc_script_path
            .clone()
            .or_else(|| config.drc_script.clone())
            .unwrap_or_else(|| match self.precheck_root {
                Some(ref root) => root.join(DEFAULT_DRC_SCRIPT),
                None => PathBuf::from(DEFAULT_DRC_SCRIPT),
            });
        Settings {
            check_name: self
                .check_name
                .clone()
                .or_else(|| config.check_name.clone())
                .unwrap_or_else(|| arcstr::literal!(DEFAULT_CHECK_NAME)),
            drc_script,
            klayout: self
                .klayout
                .clone()
                .or_else(|| config.klayout.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_KLAYOUT)),
            log_level: self.log_level.or(config.log_level).unwrap_or_default(),
        }
    }
}

/// Fully resolved run settings.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Settings {
    pub check_name: ArcStr,
    pub drc_script: PathBuf,
    pub klayout: PathBuf,
    pub log_level: LogLevel,
}

/// Checks that the layout is an existing GDS file and the output directory exists.
pub fn validate(gds_input_file_path: &Path, output_directory: &Path) -> Result<()> {
    if !gds_input_file_path.exists()
        || LayoutFormat::from_path(gds_input_file_path) != Some(LayoutFormat::Gds)
    {
        return Err(not_valid(gds_input_file_path).into());
    }
    if !output_directory.is_dir() {
        return Err(not_valid(output_directory).into());
    }
    Ok(())
}

fn not_valid(path: &Path) -> ErrorSource {
    ErrorSource::InvalidArgs(format!("{} is not valid", path.display()))
}

/// Validates the inputs and runs the check.
///
/// Returns `None` if the inputs were rejected, otherwise whether the layout is clean.
pub fn run(args: &Args, settings: &Settings) -> Option<bool> {
    if let Err(err) = validate(&args.gds_input_file_path, &args.output_directory) {
        match err.into_inner() {
            ErrorSource::InvalidArgs(msg) => log::error!("{msg}"),
            other => log::error!("{other}"),
        }
        return None;
    }

    let tool = KlayoutDrc::builder()
        .rules_file(settings.drc_script.clone())
        .klayout(settings.klayout.clone())
        .build();
    let tool = match tool {
        Ok(tool) => tool,
        Err(err) => {
            log::error!("{err}");
            return None;
        }
    };
    let input = DrcInput::new(
        settings.check_name.clone(),
        &args.gds_input_file_path,
        &args.output_directory,
    )
    .with_directives(args.directives());

    let clean = run_check_with(&tool, &input);
    if clean {
        log::info!("Klayout GDS DRC Clean");
    } else {
        log::info!("Klayout GDS DRC Dirty");
    }
    Some(clean)
}
