//! Source file resolution for pipelines.
//!
//! Resolves glob patterns against the project root into an ordered,
//! deduplicated file list. Ordering is the contract that makes concatenating
//! stages deterministic: patterns contribute in declared order, and matches
//! within one pattern are sorted lexicographically because the OS gives no
//! ordering guarantee for directory listings.

use glob::glob;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Error while resolving source globs.
#[derive(Debug)]
pub enum SourceError {
    /// Invalid glob pattern
    InvalidPattern(String, glob::PatternError),
    /// IO error during file enumeration
    Io(std::io::Error),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::InvalidPattern(pattern, err) => {
                write!(f, "Invalid glob pattern '{}': {}", pattern, err)
            }
            SourceError::Io(err) => write!(f, "IO error during resolution: {}", err),
        }
    }
}

impl std::error::Error for SourceError {}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Io(err)
    }
}

/// Resolve an ordered list of glob patterns into matching files.
///
/// A path matched by more than one pattern is kept at its first occurrence
/// only, so an explicit early entry (e.g. `css/reset.css`) pins a file to the
/// front even when a later wildcard also covers it.
///
/// An empty result is not an error; the pipeline treats it as a no-op run.
pub fn resolve_sources(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, SourceError> {
    let mut files = Vec::new();
    let mut seen = HashSet::new();

    for pattern in patterns {
        let full_pattern = root.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        let paths = glob(&pattern_str)
            .map_err(|e| SourceError::InvalidPattern(pattern.clone(), e))?;

        let mut matched = Vec::new();
        for entry in paths {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        matched.push(path);
                    }
                }
                Err(e) => {
                    // Log but continue on unreadable entries
                    eprintln!("Warning: error reading path: {}", e);
                }
            }
        }

        matched.sort();
        for path in matched {
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }

    Ok(files)
}
