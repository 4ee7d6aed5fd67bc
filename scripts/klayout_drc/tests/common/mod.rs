#![allow(dead_code)]

use std::os::unix::prelude::PermissionsExt;
use std::path::{Path, PathBuf};

use tempdir::TempDir;

pub const FAKE_KLAYOUT: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../plugins/klayout/data/fake_klayout.sh"
);

/// Returns the path to the stand-in KLayout executable, making sure it is executable.
pub fn fake_klayout() -> PathBuf {
    let path = PathBuf::from(FAKE_KLAYOUT);
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// An output directory laid out the way the DRC check expects,
/// plus a GDS file for it to check.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new(name: &str) -> Self {
        let dir = TempDir::new(name).unwrap();
        for sub in ["out/outputs/reports", "out/logs", "out/fixture"] {
            std::fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        std::fs::write(dir.path().join("user_proj.gds"), b"").unwrap();
        Self { dir }
    }

    pub fn gds(&self) -> PathBuf {
        self.dir.path().join("user_proj.gds")
    }

    pub fn out(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn set_report(&self, content: &str) {
        std::fs::write(self.out().join("fixture/report.xml"), content).unwrap();
    }

    pub fn read_out(&self, rel: impl AsRef<Path>) -> Option<String> {
        std::fs::read_to_string(self.out().join(rel)).ok()
    }
}
