//! Build labels used for bookkeeping.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Human-readable name of the build a session was captured from.
///
/// Labels only feed log fields, window titles and output names; no
/// algorithm depends on them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildLabel(String);

impl BuildLabel {
    /// Create a label, returning `None` for blank input.
    pub fn new(label: impl Into<String>) -> Option<Self> {
        let label = label.into();
        let trimmed = label.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    /// Derive a label from the temperature file's build folder.
    ///
    /// Build folders are named `<number>_<description>`; the label is the
    /// part before the first underscore, e.g. `.../4312_ti64_cube/temps.npy`
    /// gives `4312`.
    pub fn from_temperature_path(path: &Path) -> Option<Self> {
        let folder = path.parent()?.file_name()?.to_str()?;
        let number = folder.split('_').next().unwrap_or(folder);
        Self::new(number)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Label restricted to characters safe in file names.
    pub fn file_safe(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect()
    }
}

impl fmt::Display for BuildLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
