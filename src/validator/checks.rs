//! Individual lexical checks run by the validator.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

use super::Issue;

/// Decodes raw bytes, reporting the first invalid sequence.
///
/// Invalid sequences are replaced so the remaining checks can still run.
pub fn decode(bytes: &[u8]) -> (Cow<'_, str>, Option<Issue>) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (Cow::Borrowed(text), None),
        Err(e) => (
            String::from_utf8_lossy(bytes),
            Some(Issue::EncodingError {
                byte_offset: e.valid_up_to(),
            }),
        ),
    }
}

pub fn check_parens(text: &str) -> Option<Issue> {
    let open = text.matches('(').count();
    let close = text.matches(')').count();
    (open != close).then_some(Issue::UnmatchedParens { open, close })
}

/// Doubled quotes contribute two characters, so escaping keeps the count even.
pub fn check_quotes(text: &str) -> Option<Issue> {
    let count = text.matches('\'').count();
    (count % 2 != 0).then_some(Issue::UnmatchedQuotes { count })
}

/// True if the text contains Hebrew, Arabic or related right-to-left letters.
pub fn contains_rtl(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c,
            '\u{0590}'..='\u{08FF}'
            | '\u{FB1D}'..='\u{FDFF}'
            | '\u{FE70}'..='\u{FEFC}')
    })
}

/// True if any `CREATE TABLE` lacks `IF NOT EXISTS`.
pub fn has_unguarded_create_table(text: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\bcreate\s+table\s+(if\s+not\s+exists\b)?")
            .expect("CREATE TABLE pattern is a valid regex")
    });

    pattern
        .captures_iter(text)
        .any(|captures| captures.get(1).is_none())
}
