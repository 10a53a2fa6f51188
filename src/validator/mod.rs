//! Pre-deployment text validation for SQL scripts.
//!
//! Runs every check over the whole file and collects all findings in one
//! pass. Issues make a file invalid; notes are informational only. Nothing
//! is fixed automatically.

mod checks;
mod escape;

pub use escape::{EscapeCheck, EscapeRule};

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::ValidatorConfig;
use crate::error::{DeployError, Result};

/// A finding that makes a script invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// Different numbers of `(` and `)`.
    UnmatchedParens { open: usize, close: usize },
    /// Odd number of `'`.
    UnmatchedQuotes { count: usize },
    /// Bytes that are not valid UTF-8, starting at this offset.
    EncodingError { byte_offset: usize },
    /// A known fragment written with a single apostrophe.
    MisEscapedLiteral { label: String, fragment: String },
}

impl Issue {
    /// Returns a stable tag for the issue kind.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::UnmatchedParens { .. } => "unmatched-parens",
            Self::UnmatchedQuotes { .. } => "unmatched-quotes",
            Self::EncodingError { .. } => "encoding-error",
            Self::MisEscapedLiteral { .. } => "mis-escaped-literal",
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmatchedParens { open, close } => {
                write!(f, "Unmatched parentheses ({open} open, {close} close)")
            }
            Self::UnmatchedQuotes { count } => {
                write!(f, "Unmatched single quotes ({count} found)")
            }
            Self::EncodingError { byte_offset } => {
                write!(f, "Invalid UTF-8 text at byte {byte_offset}")
            }
            Self::MisEscapedLiteral { label, fragment } => write!(
                f,
                "Incorrectly escaped apostrophe in {label} ({fragment}); double it as {}",
                fragment.replace('\'', "''")
            ),
        }
    }
}

/// An observation that does not affect validity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Note {
    /// The file has no non-whitespace content.
    EmptyScript,
    /// The file contains right-to-left script text.
    ContainsRtlText,
    /// A known fragment is present with its apostrophe doubled.
    EscapedLiteralConfirmed { label: String },
    /// A `CREATE TABLE` without `IF NOT EXISTS`; re-running the script fails.
    CreateTableWithoutIfNotExists,
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyScript => write!(f, "File is empty"),
            Self::ContainsRtlText => write!(f, "Contains right-to-left text"),
            Self::EscapedLiteralConfirmed { label } => {
                write!(f, "Apostrophe in {label} properly escaped")
            }
            Self::CreateTableWithoutIfNotExists => {
                write!(f, "Missing IF NOT EXISTS for table creation")
            }
        }
    }
}

/// Validation result for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// The validated file.
    pub path: PathBuf,
    /// Findings that make the file invalid.
    pub issues: Vec<Issue>,
    /// Informational findings.
    pub notes: Vec<Note>,
}

impl ValidationReport {
    /// A file is valid when no issue was found.
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Counts issues with the given tag.
    pub fn count(&self, tag: &str) -> usize {
        self.issues.iter().filter(|i| i.tag() == tag).count()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validating: {}", self.path.display())?;
        if self.is_valid() {
            writeln!(f, "  VALID: No syntax issues found")?;
        } else {
            writeln!(f, "  ISSUES FOUND:")?;
            for issue in &self.issues {
                writeln!(f, "    - {issue}")?;
            }
        }
        for note in &self.notes {
            writeln!(f, "  - {note}")?;
        }
        Ok(())
    }
}

/// Result of validating an ordered list of files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    /// Reports for files that could be read.
    pub reports: Vec<ValidationReport>,
    /// Files that could not be read, with the reason.
    pub unreadable: Vec<(PathBuf, String)>,
}

impl ValidationSummary {
    /// True when every file was read and is valid.
    pub fn all_valid(&self) -> bool {
        self.unreadable.is_empty() && self.reports.iter().all(ValidationReport::is_valid)
    }

    /// Number of valid files.
    pub fn valid_files(&self) -> usize {
        self.reports.iter().filter(|r| r.is_valid()).count()
    }

    /// Number of files submitted.
    pub fn total_files(&self) -> usize {
        self.reports.len() + self.unreadable.len()
    }

    /// Process exit status: 0 when all files are valid, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.all_valid() {
            0
        } else {
            1
        }
    }
}

/// Validator configured with a list of escape rules.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    rules: Vec<EscapeRule>,
}

impl Validator {
    /// Creates a validator with the given escape rules.
    pub fn new(rules: Vec<EscapeRule>) -> Self {
        Self { rules }
    }

    /// Creates a validator from configuration.
    pub fn from_config(config: &ValidatorConfig) -> Result<Self> {
        let rules = config
            .escape_rules
            .iter()
            .map(EscapeRule::from_config)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(rules))
    }

    /// Returns the configured escape rules.
    pub fn rules(&self) -> &[EscapeRule] {
        &self.rules
    }

    /// Reads and validates one file.
    pub fn validate(&self, path: &Path) -> Result<ValidationReport> {
        let bytes = std::fs::read(path)
            .map_err(|e| DeployError::file(format!("{}: {e}", path.display())))?;
        Ok(self.validate_bytes(path, &bytes))
    }

    /// Validates raw file content.
    pub fn validate_bytes(&self, path: &Path, bytes: &[u8]) -> ValidationReport {
        let (text, encoding_issue) = checks::decode(bytes);
        let mut report = self.validate_text(path, &text);
        if let Some(issue) = encoding_issue {
            report.issues.push(issue);
        }
        report
    }

    /// Validates decoded text.
    pub fn validate_text(&self, path: &Path, text: &str) -> ValidationReport {
        let mut issues = Vec::new();
        let mut notes = Vec::new();

        for rule in &self.rules {
            match rule.check(text) {
                EscapeCheck::MisEscaped => issues.push(Issue::MisEscapedLiteral {
                    label: rule.label().to_string(),
                    fragment: rule.fragment().to_string(),
                }),
                EscapeCheck::Escaped => notes.push(Note::EscapedLiteralConfirmed {
                    label: rule.label().to_string(),
                }),
                EscapeCheck::Absent => {}
            }
        }

        issues.extend(checks::check_parens(text));
        issues.extend(checks::check_quotes(text));

        if text.trim().is_empty() {
            notes.push(Note::EmptyScript);
        }
        if checks::contains_rtl(text) {
            notes.push(Note::ContainsRtlText);
        }
        if checks::has_unguarded_create_table(text) {
            notes.push(Note::CreateTableWithoutIfNotExists);
        }

        ValidationReport {
            path: path.to_path_buf(),
            issues,
            notes,
        }
    }

    /// Validates files in order. Unreadable files count as invalid.
    pub fn validate_all(&self, paths: &[PathBuf]) -> ValidationSummary {
        let mut summary = ValidationSummary::default();
        for path in paths {
            match self.validate(path) {
                Ok(report) => {
                    if report.is_valid() {
                        info!("{}: valid", path.display());
                    } else {
                        for issue in &report.issues {
                            warn!("{}: {}", path.display(), issue);
                        }
                    }
                    summary.reports.push(report);
                }
                Err(e) => {
                    error!("{}: {}", e.category(), e);
                    summary.unreadable.push((path.clone(), e.to_string()));
                }
            }
        }
        summary
    }
}
