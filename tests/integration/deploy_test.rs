//! Batch deployment integration tests.
//!
//! Drives the executor over real files with the mock transport.

use std::time::Duration;

use pretty_assertions::assert_eq;
use sqldeploy::config::Config;
use sqldeploy::executor::{
    verify_tables, BatchExecutor, CandidateList, MockTransport, PayloadShape, StatementOutcome,
    TableStatus,
};
use sqldeploy::script::SplitMode;
use tempfile::tempdir;

use super::common::{default_candidates, write_file};

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS leagues (id serial primary key, name text);
CREATE TABLE IF NOT EXISTS teams (id serial primary key, name text);
INSERT INTO teams (name) VALUES ('מנצ''סטר סיטי');
";

const POLICIES_ALL_COMMENTS: &str = "\
-- Row level security policies
-- (to be written)
";

const FUNCTIONS: &str = "\
CREATE OR REPLACE VIEW team_names AS SELECT name FROM teams;
";

#[tokio::test]
async fn test_empty_middle_file_does_not_stop_run() {
    let dir = tempdir().unwrap();
    let files = vec![
        write_file(dir.path(), "schema.sql", SCHEMA),
        write_file(dir.path(), "rls-policies.sql", POLICIES_ALL_COMMENTS),
        write_file(dir.path(), "functions.sql", FUNCTIONS),
    ];

    let mock = MockTransport::accepting();
    let executor = BatchExecutor::new(&mock, default_candidates()).with_delay(Duration::ZERO);
    let summary = executor.deploy_all(&files).await;

    assert_eq!(summary.counts(), (2, 3));
    assert_eq!(summary.files[0].counts(), (3, 3));
    assert_eq!(summary.files[1].counts(), (0, 0));
    assert_eq!(summary.files[2].counts(), (1, 1));
    assert_eq!(mock.call_count(), 4);
}

#[tokio::test]
async fn test_unreadable_files_degrade_to_zero_progress() {
    let dir = tempdir().unwrap();
    let files = vec![
        dir.path().join("missing.sql"),
        write_file(dir.path(), "latin1.sql", b"INSERT INTO t VALUES ('caf\xe9');".to_vec()),
        write_file(dir.path(), "functions.sql", FUNCTIONS),
    ];

    let mock = MockTransport::accepting();
    let executor = BatchExecutor::new(&mock, default_candidates()).with_delay(Duration::ZERO);
    let summary = executor.deploy_all(&files).await;

    assert_eq!(summary.counts(), (1, 3));
    assert!(summary.files[0].error.as_deref().unwrap().contains("File error"));
    assert!(summary.files[1]
        .error
        .as_deref()
        .unwrap()
        .contains("Encoding error"));
    assert!(summary.files[2].error.is_none());
}

#[tokio::test]
async fn test_candidate_order_restarts_for_each_statement() {
    let dir = tempdir().unwrap();
    let files = vec![write_file(
        dir.path(),
        "schema.sql",
        "SELECT 1;\nSELECT 2;\n",
    )];

    let mock = MockTransport::new().succeed_on("/rpc/query", PayloadShape::Sql);
    let executor = BatchExecutor::new(&mock, default_candidates()).with_delay(Duration::ZERO);
    let summary = executor.deploy_all(&files).await;

    assert_eq!(
        summary.files[0].statements,
        vec![
            StatementOutcome::Succeeded { candidate: 4 },
            StatementOutcome::Succeeded { candidate: 4 },
        ]
    );

    let calls = mock.calls();
    assert_eq!(calls.len(), 10);
    assert_eq!(calls[0].statement, "SELECT 1");
    assert_eq!(calls[0].candidate.shape, PayloadShape::Query);
    assert_eq!(calls[5].statement, "SELECT 2");
    assert_eq!(calls[5].candidate.shape, PayloadShape::Query);
    assert_eq!(calls[5].candidate.url.path(), "/rest/v1/rpc/sql");
}

#[tokio::test]
async fn test_no_candidate_succeeds() {
    let dir = tempdir().unwrap();
    let files = vec![
        write_file(dir.path(), "schema.sql", SCHEMA),
        write_file(dir.path(), "functions.sql", FUNCTIONS),
    ];

    let mock = MockTransport::unreachable();
    let executor = BatchExecutor::new(&mock, default_candidates()).with_delay(Duration::ZERO);
    let summary = executor.deploy_all(&files).await;

    assert_eq!(summary.counts(), (0, 2));
    assert_eq!(summary.statements_total(), 4);
    assert_eq!(mock.call_count(), 4 * 9);
}

#[tokio::test]
async fn test_executor_from_config() {
    let toml = r#"
[remote]
url = "https://abc.supabase.co"
endpoints = ["/rest/v1/rpc/exec_sql"]
payloads = ["raw"]
statement_delay_ms = 1

[split]
strip_leading_comments = true
"#;
    let config: Config = toml::from_str(toml).unwrap();
    let candidates = CandidateList::from_config(&config.remote).unwrap();
    assert_eq!(candidates.len(), 1);

    let dir = tempdir().unwrap();
    let files = vec![write_file(
        dir.path(),
        "schema.sql",
        "-- teams\nCREATE TABLE IF NOT EXISTS teams (id int);",
    )];

    let mock = MockTransport::new().succeed_on("/exec_sql", PayloadShape::Raw);
    let executor = BatchExecutor::new(&mock, candidates)
        .with_delay(config.remote.statement_delay())
        .with_split_mode(SplitMode::from(&config.split));
    let summary = executor.deploy_all(&files).await;

    assert_eq!(summary.counts(), (1, 1));
    assert_eq!(
        mock.calls()[0].statement,
        "CREATE TABLE IF NOT EXISTS teams (id int)"
    );
}

#[tokio::test]
async fn test_verify_configured_tables_after_deploy() {
    let toml = r#"
[remote]
url = "https://abc.supabase.co"
verify_tables = ["leagues", "teams", "predictions"]
"#;
    let config: Config = toml::from_str(toml).unwrap();

    let dir = tempdir().unwrap();
    let files = vec![write_file(dir.path(), "schema.sql", SCHEMA)];

    let mock = MockTransport::accepting().with_tables(["leagues", "teams"]);
    let executor = BatchExecutor::new(&mock, default_candidates()).with_delay(Duration::ZERO);
    let summary = executor.deploy_all(&files).await;
    assert_eq!(summary.counts(), (1, 1));

    let base = config.remote.base_url().unwrap();
    let report = verify_tables(&mock, &base, &config.remote.verify_tables).await;

    assert_eq!((report.verified(), report.total()), (2, 3));
    assert_eq!(report.checks[2].table, "predictions");
    assert_eq!(report.checks[2].status, TableStatus::Missing);
    // Table reads do not count as statement attempts.
    assert_eq!(mock.call_count(), 3);
}
