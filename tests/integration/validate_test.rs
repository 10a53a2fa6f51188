//! Validator integration tests over files on disk.

use pretty_assertions::assert_eq;
use sqldeploy::config::{Config, ValidatorConfig};
use sqldeploy::validator::{Issue, Note, Validator};
use tempfile::tempdir;

use super::common::write_file;

fn validator() -> Validator {
    Validator::from_config(&ValidatorConfig::default()).unwrap()
}

#[test]
fn test_clean_file_is_valid() {
    let dir = tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "schema.sql",
        "CREATE TABLE IF NOT EXISTS teams (id int, name text);\n\
         INSERT INTO teams (name) VALUES ('מנצ''סטר סיטי'), ('פריז סן ז''רמן');\n",
    );

    let report = validator().validate(&path).unwrap();

    assert!(report.is_valid());
    assert_eq!(
        report.notes,
        vec![
            Note::EscapedLiteralConfirmed {
                label: "Manchester City".to_string()
            },
            Note::EscapedLiteralConfirmed {
                label: "Paris Saint-Germain".to_string()
            },
            Note::ContainsRtlText,
        ]
    );
}

#[test]
fn test_mis_escaped_file() {
    let dir = tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "schema.sql",
        "INSERT INTO teams (name) VALUES ('מנצ'סטר סיטי');\n",
    );

    let report = validator().validate(&path).unwrap();

    assert_eq!(
        report.issues,
        vec![
            Issue::MisEscapedLiteral {
                label: "Manchester City".to_string(),
                fragment: "מנצ'סטר".to_string(),
            },
            Issue::UnmatchedQuotes { count: 3 },
        ]
    );
}

#[test]
fn test_invalid_utf8_file() {
    let dir = tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "latin1.sql",
        b"INSERT INTO t VALUES ('caf\xe9');".to_vec(),
    );

    let report = validator().validate(&path).unwrap();

    assert_eq!(report.issues, vec![Issue::EncodingError { byte_offset: 26 }]);
}

#[test]
fn test_validate_all_mixed() {
    let dir = tempdir().unwrap();
    let files = vec![
        write_file(dir.path(), "schema.sql", "SELECT 1;"),
        dir.path().join("rls-policies.sql"),
        write_file(dir.path(), "functions.sql", "SELECT (1;"),
    ];

    let summary = validator().validate_all(&files);

    assert!(!summary.all_valid());
    assert_eq!(summary.total_files(), 3);
    assert_eq!(summary.valid_files(), 1);
    assert_eq!(summary.unreadable.len(), 1);
    assert_eq!(summary.exit_code(), 1);
}

#[test]
fn test_validate_all_valid_exit_code() {
    let dir = tempdir().unwrap();
    let files = vec![
        write_file(dir.path(), "schema.sql", "SELECT 1;"),
        write_file(dir.path(), "functions.sql", "SELECT 'a''b';"),
    ];

    let summary = validator().validate_all(&files);

    assert!(summary.all_valid());
    assert_eq!(summary.exit_code(), 0);
}

#[test]
fn test_custom_rules_from_config_file() {
    let dir = tempdir().unwrap();
    let config_path = write_file(
        dir.path(),
        "config.toml",
        r#"
[[validator.escape_rules]]
label = "Côte d'Ivoire"
fragment = "d'Ivoire"
"#,
    );
    let config = Config::load_from_file(&config_path).unwrap();
    let validator = Validator::from_config(&config.validator).unwrap();
    assert_eq!(validator.rules().len(), 1);

    let sql = write_file(
        dir.path(),
        "seed.sql",
        "INSERT INTO countries VALUES ('Côte d'Ivoire', 'מנצ'סטר');",
    );
    let report = validator.validate(&sql).unwrap();

    // Only the configured rule applies; the default fragments are not checked.
    assert_eq!(report.count("mis-escaped-literal"), 1);
}
