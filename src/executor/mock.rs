//! Mock transport for testing.
//!
//! Answers requests from a list of scripted rules and records every call,
//! so tests can assert on candidate order without a network. Table reads
//! answer from a separate list of known tables.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use crate::error::{DeployError, Result};
use crate::executor::candidate::{Candidate, PayloadShape};
use crate::executor::SqlTransport;

/// What the mock answers when a rule matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    Status(StatusCode),
    Error(String),
}

/// A scripted answer. Unset fields match anything.
#[derive(Debug, Clone)]
pub struct MockRule {
    /// Matches when the candidate URL path ends with this suffix.
    pub endpoint: Option<String>,
    /// Matches this payload shape only.
    pub shape: Option<PayloadShape>,
    /// Matches when the statement contains this text.
    pub statement: Option<String>,
    /// The answer.
    pub reply: MockReply,
}

impl MockRule {
    fn matches(&self, candidate: &Candidate, statement: &str) -> bool {
        self.endpoint
            .as_deref()
            .map_or(true, |suffix| candidate.url.path().ends_with(suffix))
            && self.shape.map_or(true, |shape| candidate.shape == shape)
            && self
                .statement
                .as_deref()
                .map_or(true, |text| statement.contains(text))
    }
}

/// One request received by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub candidate: Candidate,
    pub statement: String,
}

/// A transport that returns scripted replies.
///
/// Rules are checked in insertion order; the first match answers. Without
/// a match the default reply (404) is returned.
///
/// Tables registered with [`MockTransport::with_table_reply`] answer with
/// their reply. Other tables answer 404, or fail when the default reply is
/// an error.
#[derive(Debug)]
pub struct MockTransport {
    rules: Vec<MockRule>,
    default_reply: MockReply,
    tables: Vec<(String, MockReply)>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    /// Creates a mock that rejects every request with 404.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            default_reply: MockReply::Status(StatusCode::NOT_FOUND),
            tables: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock that accepts every request with 200.
    pub fn accepting() -> Self {
        Self::new().with_default(MockReply::Status(StatusCode::OK))
    }

    /// Creates a mock where every request fails at the network level.
    pub fn unreachable() -> Self {
        Self::new().with_default(MockReply::Error("connection refused".to_string()))
    }

    /// Sets the reply used when no rule matches.
    pub fn with_default(mut self, reply: MockReply) -> Self {
        self.default_reply = reply;
        self
    }

    /// Adds a rule.
    pub fn with_rule(mut self, rule: MockRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Accepts requests to an endpoint with the given payload shape.
    pub fn succeed_on(self, endpoint: impl Into<String>, shape: PayloadShape) -> Self {
        self.with_rule(MockRule {
            endpoint: Some(endpoint.into()),
            shape: Some(shape),
            statement: None,
            reply: MockReply::Status(StatusCode::OK),
        })
    }

    /// Fails every request for statements containing `text`.
    pub fn error_when_statement_contains(self, text: impl Into<String>) -> Self {
        self.with_rule(MockRule {
            endpoint: None,
            shape: None,
            statement: Some(text.into()),
            reply: MockReply::Error("simulated network failure".to_string()),
        })
    }

    /// Sets the reply for reads of one table.
    pub fn with_table_reply(mut self, table: impl Into<String>, reply: MockReply) -> Self {
        self.tables.push((table.into(), reply));
        self
    }

    /// Answers 200 for reads of each named table.
    pub fn with_tables<I, S>(self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        tables.into_iter().fold(self, |mock, table| {
            mock.with_table_reply(table, MockReply::Status(StatusCode::OK))
        })
    }

    /// Returns every recorded call in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Returns the number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn reply_for(&self, candidate: &Candidate, statement: &str) -> MockReply {
        self.rules
            .iter()
            .find(|rule| rule.matches(candidate, statement))
            .map(|rule| rule.reply.clone())
            .unwrap_or_else(|| self.default_reply.clone())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SqlTransport for MockTransport {
    async fn execute(&self, candidate: &Candidate, statement: &str) -> Result<StatusCode> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedCall {
                candidate: candidate.clone(),
                statement: statement.to_string(),
            });

        match self.reply_for(candidate, statement) {
            MockReply::Status(status) => Ok(status),
            MockReply::Error(msg) => Err(DeployError::transport(format!("{candidate}: {msg}"))),
        }
    }

    async fn table_status(&self, base: &Url, table: &str) -> Result<StatusCode> {
        let reply = self
            .tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| match &self.default_reply {
                MockReply::Error(msg) => MockReply::Error(msg.clone()),
                MockReply::Status(_) => MockReply::Status(StatusCode::NOT_FOUND),
            });

        match reply {
            MockReply::Status(status) => Ok(status),
            MockReply::Error(msg) => Err(DeployError::transport(format!(
                "GET {base} table {table}: {msg}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn candidate(path: &str, shape: PayloadShape) -> Candidate {
        Candidate::new(
            Url::parse(&format!("https://abc.supabase.co{path}")).unwrap(),
            shape,
        )
    }

    #[tokio::test]
    async fn test_default_rejects() {
        let mock = MockTransport::new();
        let status = mock
            .execute(&candidate("/sql", PayloadShape::Raw), "SELECT 1")
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_rule_matches_endpoint_and_shape() {
        let mock = MockTransport::new().succeed_on("/rpc/query", PayloadShape::Sql);

        let hit = mock
            .execute(&candidate("/rest/v1/rpc/query", PayloadShape::Sql), "SELECT 1")
            .await
            .unwrap();
        let miss = mock
            .execute(&candidate("/rest/v1/rpc/query", PayloadShape::Query), "SELECT 1")
            .await
            .unwrap();

        assert_eq!(hit, StatusCode::OK);
        assert_eq!(miss, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_error_rule_takes_precedence_in_order() {
        let mock = MockTransport::accepting().error_when_statement_contains("DROP");
        let result = mock
            .execute(&candidate("/sql", PayloadShape::Raw), "DROP TABLE x")
            .await;
        assert!(result.is_err());

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].statement, "DROP TABLE x");
    }

    #[tokio::test]
    async fn test_table_replies() {
        let base = Url::parse("https://abc.supabase.co").unwrap();
        let mock = MockTransport::accepting()
            .with_tables(["teams"])
            .with_table_reply("profiles", MockReply::Status(StatusCode::FORBIDDEN));

        assert_eq!(mock.table_status(&base, "teams").await.unwrap(), StatusCode::OK);
        assert_eq!(
            mock.table_status(&base, "profiles").await.unwrap(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            mock.table_status(&base, "matches").await.unwrap(),
            StatusCode::NOT_FOUND
        );
        // Table reads are not statement calls.
        assert_eq!(mock.call_count(), 0);

        let unreachable = MockTransport::unreachable();
        assert!(unreachable.table_status(&base, "teams").await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable() {
        let mock = MockTransport::unreachable();
        let err = mock
            .execute(&candidate("/sql", PayloadShape::Query), "SELECT 1")
            .await
            .unwrap_err();
        assert_eq!(err.category(), "Transport Error");
    }
}
