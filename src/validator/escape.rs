//! Escape rules for known literal fragments.
//!
//! Some right-to-left words are written with an apostrophe used as a letter
//! (geresh), e.g. `מנצ'סטר`. Inside a SQL string literal that apostrophe has
//! to be doubled, otherwise it closes the literal early. A general check
//! would need a full string-literal parser, so detection is limited to a
//! list of known fragments.

use regex::Regex;

use crate::config::EscapeRuleConfig;
use crate::error::{DeployError, Result};

const APOSTROPHE: char = '\'';

/// What an escape rule found in a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeCheck {
    /// The fragment was not present in either form.
    Absent,
    /// The fragment appears with its apostrophe doubled.
    Escaped,
    /// The fragment appears with a single apostrophe.
    MisEscaped,
}

/// A compiled rule for one known fragment.
#[derive(Debug, Clone)]
pub struct EscapeRule {
    label: String,
    fragment: String,
    mis_escaped: Regex,
    escaped: Regex,
}

impl EscapeRule {
    /// Compiles a rule for a fragment containing exactly one internal
    /// apostrophe.
    pub fn new(label: impl Into<String>, fragment: impl Into<String>) -> Result<Self> {
        let label = label.into();
        let fragment = fragment.into();

        let (prefix, suffix) = fragment
            .split_once(APOSTROPHE)
            .filter(|(prefix, suffix)| {
                !prefix.is_empty() && !suffix.is_empty() && !suffix.contains(APOSTROPHE)
            })
            .ok_or_else(|| {
                DeployError::config(format!(
                    "Escape rule '{label}': fragment '{fragment}' must contain exactly one \
                     apostrophe between two letters"
                ))
            })?;

        let prefix = regex::escape(prefix);
        let suffix = regex::escape(suffix);
        // A single apostrophe, optionally followed by whitespace, then the rest
        // of the word. The suffix never starts with an apostrophe, so the doubled
        // form cannot match here.
        let mis_escaped = compile(&label, &format!("{prefix}'\\s*{suffix}"))?;
        let escaped = compile(&label, &format!("{prefix}''{suffix}"))?;

        Ok(Self {
            label,
            fragment,
            mis_escaped,
            escaped,
        })
    }

    /// Compiles a rule from configuration.
    pub fn from_config(config: &EscapeRuleConfig) -> Result<Self> {
        Self::new(config.label.clone(), config.fragment.clone())
    }

    /// Returns the human-readable label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the fragment as written in natural text.
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Returns the correctly escaped SQL form of the fragment.
    pub fn escaped_form(&self) -> String {
        self.fragment.replace(APOSTROPHE, "''")
    }

    /// Checks the text for this fragment.
    ///
    /// A mis-escaped occurrence wins over a correctly escaped one.
    pub fn check(&self, text: &str) -> EscapeCheck {
        if self.mis_escaped.is_match(text) {
            EscapeCheck::MisEscaped
        } else if self.escaped.is_match(text) {
            EscapeCheck::Escaped
        } else {
            EscapeCheck::Absent
        }
    }
}

fn compile(label: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| DeployError::config(format!("Escape rule '{label}': invalid pattern: {e}")))
}
