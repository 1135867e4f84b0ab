//! Glob expansion for target discovery.

use glob::MatchOptions;
use log::debug;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("invalid glob pattern `{pattern}`: {source}")]
pub struct DiscoverError {
    pub pattern: String,
    #[source]
    pub source: glob::PatternError,
}

/// Expand `pattern` against the file system.
///
/// `**` matches zero or more directory levels but does not descend into
/// dot-prefixed directories. Only regular files are returned, in the order
/// the walk yields them. Directories that cannot be read during the walk are
/// skipped, and an empty result is not an error.
pub fn expand(pattern: &str) -> Result<Vec<PathBuf>, DiscoverError> {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let paths = glob::glob_with(pattern, options).map_err(|source| DiscoverError {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_dir() => continue,
            Ok(path) => files.push(path),
            Err(e) => debug!("skipping unreadable path {}: {}", e.path().display(), e.error()),
        }
    }

    debug!("{} matched {} file(s)", pattern, files.len());
    Ok(files)
}
