//! Post-deployment check that expected tables exist.
//!
//! Each table is read through the REST gateway with a one-row select. A
//! permission error still proves the table exists; row level security may
//! hide its rows from the caller.

use std::fmt;

use reqwest::StatusCode;
use tracing::{debug, info, warn};
use url::Url;

use crate::executor::SqlTransport;

/// What a one-row read of a table revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    /// The read succeeded.
    Exists,
    /// The read was refused (401/403); the table is there.
    Restricted(StatusCode),
    /// The gateway does not know the table (404).
    Missing,
    /// Any other status.
    Unexpected(StatusCode),
    /// The request did not complete.
    Unreachable(String),
}

impl TableStatus {
    /// Classifies a response status.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            s if s.is_success() => Self::Exists,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Restricted(status),
            StatusCode::NOT_FOUND => Self::Missing,
            s => Self::Unexpected(s),
        }
    }

    /// Returns true if the table is known to exist.
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Exists | Self::Restricted(_))
    }
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exists => write!(f, "verified"),
            Self::Restricted(status) => write!(f, "verified (access restricted, {status})"),
            Self::Missing => write!(f, "not found"),
            Self::Unexpected(status) => write!(f, "unexpected status {status}"),
            Self::Unreachable(reason) => write!(f, "unreachable ({reason})"),
        }
    }
}

/// The check result for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCheck {
    pub table: String,
    pub status: TableStatus,
}

impl fmt::Display for TableCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.table, self.status)
    }
}

/// Results for every table checked, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    pub checks: Vec<TableCheck>,
}

impl VerificationReport {
    /// Number of tables known to exist.
    pub fn verified(&self) -> usize {
        self.checks.iter().filter(|c| c.status.is_present()).count()
    }

    /// Number of tables checked.
    pub fn total(&self) -> usize {
        self.checks.len()
    }

    /// Returns true if every table exists.
    pub fn all_present(&self) -> bool {
        self.verified() == self.total()
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            writeln!(f, "  {check}")?;
        }
        write!(
            f,
            "Verification: {}/{} tables verified",
            self.verified(),
            self.total()
        )
    }
}

/// Checks each table in order. Failures are recorded, never raised.
pub async fn verify_tables(
    transport: &dyn SqlTransport,
    base: &Url,
    tables: &[String],
) -> VerificationReport {
    let mut report = VerificationReport::default();
    for table in tables {
        let status = match transport.table_status(base, table).await {
            Ok(status) => TableStatus::from_status(status),
            Err(e) => {
                debug!("{}", e);
                TableStatus::Unreachable(e.to_string())
            }
        };

        if status.is_present() {
            debug!("Table {} {}", table, status);
        } else {
            warn!("Table {} {}", table, status);
        }
        report.checks.push(TableCheck {
            table: table.clone(),
            status,
        });
    }

    info!(
        "Verification: {}/{} tables verified",
        report.verified(),
        report.total()
    );
    report
}
