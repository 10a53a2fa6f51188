//! Per-statement, per-file and per-run execution outcomes.

use std::fmt;
use std::path::{Path, PathBuf};

/// Result of executing one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementOutcome {
    /// Executed by the candidate at this position in the candidate list.
    Succeeded { candidate: usize },
    /// Every candidate was tried without success.
    Exhausted,
}

impl StatementOutcome {
    /// Returns true if the statement was executed.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Result of deploying one script file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    /// The script path.
    pub path: PathBuf,
    /// Outcome of each retained statement, in order.
    pub statements: Vec<StatementOutcome>,
    /// Set when the file could not be read or decoded.
    pub error: Option<String>,
}

impl FileOutcome {
    /// Creates an outcome for a file that was processed.
    pub fn new(path: impl Into<PathBuf>, statements: Vec<StatementOutcome>) -> Self {
        Self {
            path: path.into(),
            statements,
            error: None,
        }
    }

    /// Creates a zero-progress outcome for a file that could not be loaded.
    pub fn failed(path: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            statements: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Returns the script path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of statements that were executed.
    pub fn succeeded(&self) -> usize {
        self.statements.iter().filter(|s| s.is_success()).count()
    }

    /// Number of statements found in the file.
    pub fn total(&self) -> usize {
        self.statements.len()
    }

    /// Returns `(succeeded, total)`.
    pub fn counts(&self) -> (usize, usize) {
        (self.succeeded(), self.total())
    }

    /// A file counts as deployed when at least one statement succeeded.
    pub fn is_success(&self) -> bool {
        self.succeeded() > 0
    }
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "{}: failed ({})", self.path.display(), error),
            None => write!(
                f,
                "{}: {}/{} statements executed",
                self.path.display(),
                self.succeeded(),
                self.total()
            ),
        }
    }
}

/// Result of deploying an ordered list of files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Outcome of each file, in submission order.
    pub files: Vec<FileOutcome>,
}

impl RunSummary {
    /// Number of files with at least one executed statement.
    pub fn files_with_progress(&self) -> usize {
        self.files.iter().filter(|f| f.is_success()).count()
    }

    /// Number of files submitted.
    pub fn total_files(&self) -> usize {
        self.files.len()
    }

    /// Returns `(files_with_progress, total_files)`.
    pub fn counts(&self) -> (usize, usize) {
        (self.files_with_progress(), self.total_files())
    }

    /// Total executed statements across all files.
    pub fn statements_succeeded(&self) -> usize {
        self.files.iter().map(FileOutcome::succeeded).sum()
    }

    /// Total statements across all files.
    pub fn statements_total(&self) -> usize {
        self.files.iter().map(FileOutcome::total).sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            writeln!(f, "  {file}")?;
        }
        write!(
            f,
            "Deployment summary: {}/{} files processed ({}/{} statements)",
            self.files_with_progress(),
            self.total_files(),
            self.statements_succeeded(),
            self.statements_total()
        )
    }
}
