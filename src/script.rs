//! SQL script loading and lexical statement splitting.
//!
//! Splitting is purely lexical: the script is cut on every `;`, so a
//! terminator inside a string literal or function body also ends the
//! statement.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::SplitConfig;
use crate::error::{DeployError, Result};

/// Statement terminator.
pub const TERMINATOR: char = ';';

/// Line comment marker.
pub const LINE_COMMENT: &str = "--";

/// How fragments that start with a line comment are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitMode {
    /// Drop every fragment whose first non-blank text is a comment, even
    /// when SQL follows on later lines.
    #[default]
    DropCommentLeading,
    /// Remove leading comment lines first, then keep whatever SQL remains.
    StripLeadingComments,
}

impl From<&SplitConfig> for SplitMode {
    fn from(config: &SplitConfig) -> Self {
        if config.strip_leading_comments {
            Self::StripLeadingComments
        } else {
            Self::DropCommentLeading
        }
    }
}

/// The decoded text of one SQL file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    path: PathBuf,
    text: String,
}

impl Script {
    /// Creates a script from already decoded text.
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Reads and decodes a script file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| DeployError::file(format!("{}: {e}", path.display())))?;
        Self::from_bytes(path, bytes)
    }

    /// Decodes raw bytes as UTF-8.
    pub fn from_bytes(path: &Path, bytes: Vec<u8>) -> Result<Self> {
        let text = String::from_utf8(bytes).map_err(|e| {
            DeployError::encoding(format!(
                "{}: invalid UTF-8 at byte {}",
                path.display(),
                e.utf8_error().valid_up_to()
            ))
        })?;
        Ok(Self::new(path, text))
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the decoded text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the number of lines in the script.
    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }

    /// Splits the script into executable statements.
    pub fn statements(&self, mode: SplitMode) -> Vec<String> {
        split_statements(&self.text, mode)
    }
}

/// Splits SQL text on the terminator and returns the retained statements.
///
/// A fragment is retained if, after trimming, it is non-empty and does not
/// begin with `--`. With [`SplitMode::StripLeadingComments`] leading comment
/// lines are removed before that check.
pub fn split_statements(sql: &str, mode: SplitMode) -> Vec<String> {
    sql.split(TERMINATOR)
        .filter_map(|fragment| retain_fragment(fragment, mode))
        .collect()
}

fn retain_fragment(fragment: &str, mode: SplitMode) -> Option<String> {
    let trimmed = fragment.trim();
    if trimmed.is_empty() {
        return None;
    }

    if !trimmed.starts_with(LINE_COMMENT) {
        return Some(trimmed.to_string());
    }

    let remainder = strip_leading_comments(trimmed);
    match mode {
        SplitMode::StripLeadingComments if !remainder.is_empty() => Some(remainder.to_string()),
        SplitMode::StripLeadingComments => None,
        SplitMode::DropCommentLeading => {
            if !remainder.is_empty() {
                let first_line = remainder.lines().next().unwrap_or_default();
                warn!(
                    "Skipping statement that starts with a comment but contains SQL: {}",
                    first_line
                );
            }
            None
        }
    }
}

/// Removes leading `--` comment lines and surrounding whitespace.
fn strip_leading_comments(mut text: &str) -> &str {
    loop {
        text = text.trim_start();
        if !text.starts_with(LINE_COMMENT) {
            return text.trim_end();
        }
        text = match text.find('\n') {
            Some(newline) => &text[newline + 1..],
            None => "",
        };
    }
}
