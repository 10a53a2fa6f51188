//! Batch execution of SQL scripts against the remote service.
//!
//! Each statement is sent to an ordered list of candidates until one
//! answers with a 2xx status. Failures are counted, never propagated: a
//! statement that no candidate accepts is skipped, and a file that cannot
//! be read yields zero progress.

mod candidate;
mod http;
mod mock;
mod outcome;
mod verify;

pub use candidate::{
    Candidate, CandidateList, Payload, PayloadShape, JSON_CONTENT_TYPE, SQL_CONTENT_TYPE,
};
pub use http::HttpTransport;
pub use mock::{MockReply, MockRule, MockTransport, RecordedCall};
pub use outcome::{FileOutcome, RunSummary, StatementOutcome};
pub use verify::{verify_tables, TableCheck, TableStatus, VerificationReport};

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::Result;
use crate::script::{Script, SplitMode};

/// Default pause between statements.
pub const DEFAULT_STATEMENT_DELAY: Duration = Duration::from_millis(200);

/// Trait for transports that can submit a statement to one candidate.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
#[async_trait]
pub trait SqlTransport: Send + Sync {
    /// Sends the statement using the candidate's URL and payload shape.
    ///
    /// Returns the response status; network failures are errors.
    async fn execute(&self, candidate: &Candidate, statement: &str) -> Result<StatusCode>;

    /// Reads at most one row of `table` through the REST gateway at `base`.
    ///
    /// Returns the response status; network failures are errors.
    async fn table_status(&self, base: &Url, table: &str) -> Result<StatusCode>;
}

/// Executes scripts statement by statement through a [`SqlTransport`].
pub struct BatchExecutor<'a> {
    transport: &'a dyn SqlTransport,
    candidates: CandidateList,
    delay: Duration,
    split_mode: SplitMode,
}

impl<'a> BatchExecutor<'a> {
    /// Creates a new executor with the default delay and split mode.
    pub fn new(transport: &'a dyn SqlTransport, candidates: CandidateList) -> Self {
        Self {
            transport,
            candidates,
            delay: DEFAULT_STATEMENT_DELAY,
            split_mode: SplitMode::default(),
        }
    }

    /// Sets the pause between statements.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets how comment-leading fragments are treated.
    pub fn with_split_mode(mut self, split_mode: SplitMode) -> Self {
        self.split_mode = split_mode;
        self
    }

    /// Returns the candidate list.
    pub fn candidates(&self) -> &CandidateList {
        &self.candidates
    }

    /// Tries every candidate in order until one accepts the statement.
    pub async fn execute_statement(&self, statement: &str) -> StatementOutcome {
        for (index, candidate) in self.candidates.iter().enumerate() {
            match self.transport.execute(candidate, statement).await {
                Ok(status) if status.is_success() => {
                    debug!("{} accepted statement ({})", candidate, status);
                    return StatementOutcome::Succeeded { candidate: index };
                }
                Ok(status) => debug!("{} rejected statement ({})", candidate, status),
                Err(e) => debug!("{}", e),
            }
        }
        StatementOutcome::Exhausted
    }

    /// Executes every statement of an already loaded script.
    pub async fn deploy_script(&self, script: &Script) -> FileOutcome {
        let statements = script.statements(self.split_mode);
        let total = statements.len();
        info!(
            "Deploying {}: {} statements ({} lines)",
            script.path().display(),
            total,
            script.line_count()
        );

        let mut outcomes = Vec::with_capacity(total);
        for (i, statement) in statements.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            debug!("Executing statement {}/{}", i + 1, total);
            let outcome = self.execute_statement(statement).await;
            if outcome == StatementOutcome::Exhausted {
                warn!(
                    "Statement {}/{} in {} could not be executed via API",
                    i + 1,
                    total,
                    script.path().display()
                );
            }
            outcomes.push(outcome);
        }

        let outcome = FileOutcome::new(script.path(), outcomes);
        info!("{}", outcome);
        outcome
    }

    /// Loads and deploys one file. Load failures yield zero progress.
    pub async fn deploy(&self, path: &Path) -> FileOutcome {
        match Script::load(path) {
            Ok(script) => self.deploy_script(&script).await,
            Err(e) => {
                error!("{}: {}", e.category(), e);
                FileOutcome::failed(path, e.to_string())
            }
        }
    }

    /// Deploys files in order; every file is attempted.
    pub async fn deploy_all(&self, paths: &[PathBuf]) -> RunSummary {
        let mut summary = RunSummary::default();
        for path in paths {
            summary.files.push(self.deploy(path).await);
        }
        info!(
            "Deployment summary: {}/{} files processed",
            summary.files_with_progress(),
            summary.total_files()
        );
        summary
    }
}
