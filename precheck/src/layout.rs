//! Layout file formats.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// An enumeration of layout formats.
#[derive(Default, Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum LayoutFormat {
    #[default]
    Gds,
}

impl LayoutFormat {
    /// The file extension associated with this format, without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gds => "gds",
        }
    }

    /// Infers the layout format of `path` from its extension.
    ///
    /// The match is case sensitive: `top.GDS` is not recognized.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?;
        if ext == Self::Gds.extension() {
            Some(Self::Gds)
        } else {
            None
        }
    }
}
