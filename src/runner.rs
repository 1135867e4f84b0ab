//! Patch runner - expands target patterns and rewrites matching files
//!
//! For every file a pattern expands to, the runner:
//! - Reads the whole file as UTF-8, skipping paths that vanished
//! - Applies the rule set in order
//! - Writes the file back only if its content changed
//! - Emits one `[patch] <path>` notice per rewritten file

use crate::discover::{expand, DiscoverError};
use crate::rule::{apply_rules, PatchRule, RuleStatus, LV_TICK_RULES};
use log::debug;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatchError {
    #[error(transparent)]
    Pattern(#[from] DiscoverError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to emit notice: {0}")]
    Notice(#[source] io::Error),
}

/// What happened to a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "FileOutcome should be checked for whether the file was patched"]
pub enum FileOutcome {
    /// Content changed and was written (or would be, in a dry run)
    Patched {
        file: PathBuf,
        original: String,
        patched: String,
    },
    /// File exists but no rule changed it
    Unchanged { file: PathBuf },
    /// Path disappeared between expansion and read
    Missing { file: PathBuf },
}

impl FileOutcome {
    pub fn file(&self) -> &Path {
        match self {
            FileOutcome::Patched { file, .. }
            | FileOutcome::Unchanged { file }
            | FileOutcome::Missing { file } => file,
        }
    }

    pub fn is_patched(&self) -> bool {
        matches!(self, FileOutcome::Patched { .. })
    }
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOutcome::Patched { file, .. } => write!(f, "patched {}", file.display()),
            FileOutcome::Unchanged { file } => write!(f, "unchanged {}", file.display()),
            FileOutcome::Missing { file } => write!(f, "missing {}", file.display()),
        }
    }
}

/// Outcomes of one or more runner invocations, in visit order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl PatchReport {
    pub fn patched_files(&self) -> impl Iterator<Item = &Path> {
        self.outcomes
            .iter()
            .filter(|o| o.is_patched())
            .map(FileOutcome::file)
    }

    pub fn patched_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_patched()).count()
    }

    pub fn unchanged_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Unchanged { .. }))
            .count()
    }

    pub fn missing_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Missing { .. }))
            .count()
    }

    pub fn extend(&mut self, other: PatchReport) {
        self.outcomes.extend(other.outcomes);
    }
}

/// Applies a fixed rule set to every file a pattern expands to.
#[derive(Debug, Clone, Copy)]
pub struct Patcher<'r> {
    rules: &'r [PatchRule],
    dry_run: bool,
}

impl Default for Patcher<'static> {
    fn default() -> Self {
        Self::new(&LV_TICK_RULES)
    }
}

impl<'r> Patcher<'r> {
    pub fn new(rules: &'r [PatchRule]) -> Self {
        Self {
            rules,
            dry_run: false,
        }
    }

    /// Skip writes; notices are still emitted, marked as a dry run.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Expand `pattern` and patch every file it matches, writing one notice
    /// line per rewritten file to `notices`.
    pub fn patch_pattern<W: Write>(
        &self,
        pattern: &str,
        notices: &mut W,
    ) -> Result<PatchReport, PatchError> {
        let files = expand(pattern)?;
        self.patch_files(files, notices)
    }

    /// Patch an explicit list of paths. Paths that do not exist are reported
    /// as [`FileOutcome::Missing`].
    pub fn patch_files<W, I, P>(&self, files: I, notices: &mut W) -> Result<PatchReport, PatchError>
    where
        W: Write,
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut report = PatchReport::default();
        for file in files {
            let outcome = self.patch_file(file.into())?;
            debug!("{}", outcome);
            if let FileOutcome::Patched { file, .. } = &outcome {
                let suffix = if self.dry_run { " (dry run)" } else { "" };
                writeln!(notices, "[patch] {}{}", file.display(), suffix)
                    .map_err(PatchError::Notice)?;
            }
            report.outcomes.push(outcome);
        }
        Ok(report)
    }

    fn patch_file(&self, file: PathBuf) -> Result<FileOutcome, PatchError> {
        let original = match read_target(&file)? {
            Some(content) => content,
            None => {
                debug!("{} vanished before it could be read", file.display());
                return Ok(FileOutcome::Missing { file });
            }
        };

        let patched = apply_rules(self.rules, &original);
        if patched == original.as_str() {
            return Ok(FileOutcome::Unchanged { file });
        }
        let patched = patched.into_owned();

        if !self.dry_run {
            atomic_write(&file, patched.as_bytes()).map_err(|source| PatchError::Write {
                path: file.clone(),
                source,
            })?;
        }

        Ok(FileOutcome::Patched {
            file,
            original,
            patched,
        })
    }

    /// Read-only classification of every file `pattern` expands to.
    pub fn status(&self, pattern: &str) -> Result<Vec<(PathBuf, RuleStatus)>, PatchError> {
        let mut statuses = Vec::new();
        for file in expand(pattern)? {
            if let Some(content) = read_target(&file)? {
                statuses.push((file, RuleStatus::of(self.rules, &content)));
            }
        }
        Ok(statuses)
    }
}

/// Run the default rule set over `patterns` in order, printing notices to
/// stdout. Duplicate paths across patterns are visited again.
pub fn patch<I, S>(patterns: I) -> Result<PatchReport, PatchError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let patcher = Patcher::default();
    let stdout = io::stdout();
    let mut notices = stdout.lock();
    let mut report = PatchReport::default();
    for pattern in patterns {
        report.extend(patcher.patch_pattern(pattern.as_ref(), &mut notices)?);
    }
    Ok(report)
}

/// Read the whole file as UTF-8; `None` if it does not exist.
fn read_target(path: &Path) -> Result<Option<String>, PatchError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(PatchError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Symlinks are resolved first so the file behind the link is replaced and
/// the link itself survives. The original file's permissions are carried
/// over to the replacement.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let path = fs::canonicalize(path)?;
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "Path has no parent directory")
    })?;

    let permissions = fs::metadata(&path)?.permissions();

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.as_file().set_permissions(permissions)?;

    temp.persist(&path).map_err(|e| e.error)?;
    Ok(())
}
