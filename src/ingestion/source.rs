//! Source enumeration.
//!
//! Lists the files under an input location whose names match a glob pattern. Paths are sorted so
//! that document order, and with it first-wins schema unification, is reproducible.

use std::path::{Path, PathBuf};

use glob::Pattern;
use walkdir::WalkDir;

use crate::error::FlattenResult;

/// Options controlling which files under the input location become documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOptions {
    /// Glob matched against each file name (not the full path).
    pub pattern: String,
    /// Descend into subdirectories.
    pub recursive: bool,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            pattern: "*.json".to_string(),
            recursive: false,
        }
    }
}

/// Enumerate matching files under `dir`, sorted by path.
///
/// A `dir` that is itself a file is returned as the only source when it matches.
pub fn list_sources(dir: impl AsRef<Path>, options: &SourceOptions) -> FlattenResult<Vec<PathBuf>> {
    let pattern = Pattern::new(&options.pattern)?;
    let max_depth = if options.recursive { usize::MAX } else { 1 };

    let mut paths = Vec::new();
    for entry in WalkDir::new(dir.as_ref()).max_depth(max_depth) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .map(|name| pattern.matches(name))
            .unwrap_or(false);
        if matches {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}
