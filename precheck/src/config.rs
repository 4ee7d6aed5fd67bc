//! Precheck configuration files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::arcstr::ArcStr;
use crate::error::Result;
use crate::log::LogLevel;

/// Settings read from a TOML configuration file.
///
/// Every key is optional; command line arguments take precedence.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct DrcConfig {
    /// The KLayout executable.
    #[serde(default)]
    pub klayout: Option<PathBuf>,
    /// The DRC rule script.
    #[serde(default)]
    pub drc_script: Option<PathBuf>,
    /// The check name used to derive report and log file names.
    #[serde(default)]
    pub check_name: Option<ArcStr>,
    #[serde(default)]
    pub log_level: Option<LogLevel>,
}

impl DrcConfig {
    pub fn from_toml(input: &str) -> Result<Self> {
        let value = toml::from_str(input)?;
        Ok(value)
    }

    /// Reads a config file, resolving relative paths against its directory.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input = crate::io::read_to_string(path)?;
        let mut value = Self::from_toml(&input)?;
        value.resolve_paths(path);
        Ok(value)
    }

    fn resolve_paths(&mut self, path: &Path) {
        let Some(base) = path.parent() else {
            return;
        };
        if let Some(ref mut p) = self.klayout {
            // Bare executable names are left for `PATH` lookup.
            if p.is_relative() && p.components().count() > 1 {
                *p = base.join(&*p);
            }
        }
        if let Some(ref mut p) = self.drc_script {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempdir::TempDir;

    use super::*;

    #[test]
    fn test_from_toml() {
        let cfg = DrcConfig::from_toml(
            r#"
            klayout = "/opt/klayout/bin/klayout"
            check_name = "klayout_beol"
            log_level = "info"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.klayout, Some(PathBuf::from("/opt/klayout/bin/klayout")));
        assert_eq!(cfg.check_name.as_deref(), Some("klayout_beol"));
        assert_eq!(cfg.log_level, Some(LogLevel::Info));
        assert_eq!(cfg.drc_script, None);

        assert_eq!(DrcConfig::from_toml("").unwrap(), DrcConfig::default());
        assert!(DrcConfig::from_toml("log_level = \"loud\"").is_err());
    }

    #[test]
    fn test_resolve_paths() {
        let dir = TempDir::new("precheck_config").unwrap();
        let path = dir.path().join("precheck.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "klayout = \"klayout\"").unwrap();
        writeln!(f, "drc_script = \"tech-files/sky130A_mr.drc\"").unwrap();
        drop(f);

        let cfg = DrcConfig::from_toml_file(&path).unwrap();
        assert_eq!(cfg.klayout, Some(PathBuf::from("klayout")));
        assert_eq!(
            cfg.drc_script,
            Some(dir.path().join("tech-files/sky130A_mr.drc"))
        );
    }

    #[test]
    fn test_missing_file() {
        let err = DrcConfig::from_toml_file("/nonexistent/precheck.toml").unwrap_err();
        assert!(err.to_string().contains("reading file"));
    }
}
