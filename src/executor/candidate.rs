//! Endpoint candidates tried for every statement.
//!
//! A candidate pairs a target URL with a payload shape. The list is built
//! endpoint-major: every payload shape is tried against the first endpoint
//! before moving on to the next one.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::RemoteConfig;
use crate::error::{DeployError, Result};

/// Content type for structured payloads.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type for raw SQL payloads.
pub const SQL_CONTENT_TYPE: &str = "application/sql";

/// The body layout sent for a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadShape {
    /// `{"query": "<statement>"}`
    Query,
    /// `{"sql": "<statement>"}`
    Sql,
    /// The statement text as the request body.
    Raw,
}

impl PayloadShape {
    /// All shapes in their default trial order.
    pub const ALL: [PayloadShape; 3] = [Self::Query, Self::Sql, Self::Raw];

    /// Returns the shape as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Sql => "sql",
            Self::Raw => "raw",
        }
    }

    /// Returns the `Content-Type` header value for this shape.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Query | Self::Sql => JSON_CONTENT_TYPE,
            Self::Raw => SQL_CONTENT_TYPE,
        }
    }

    /// Builds the request body for a statement.
    pub fn body(&self, statement: &str) -> Payload {
        match self {
            Self::Query => Payload::Json(serde_json::json!({ "query": statement })),
            Self::Sql => Payload::Json(serde_json::json!({ "sql": statement })),
            Self::Raw => Payload::Text(statement.to_string()),
        }
    }
}

impl fmt::Display for PayloadShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request body ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    Text(String),
}

/// One (address, payload shape, content type) combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Target URL.
    pub url: Url,
    /// Payload shape; also determines the content type.
    pub shape: PayloadShape,
}

impl Candidate {
    /// Creates a new candidate.
    pub fn new(url: Url, shape: PayloadShape) -> Self {
        Self { url, shape }
    }

    /// Returns the `Content-Type` header value.
    pub fn content_type(&self) -> &'static str {
        self.shape.content_type()
    }

    /// Builds the request body for a statement.
    pub fn payload(&self, statement: &str) -> Payload {
        self.shape.body(statement)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "POST {} [{}]", self.url, self.shape)
    }
}

/// Ordered list of candidates; execution stops at the first success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateList {
    candidates: Vec<Candidate>,
}

impl CandidateList {
    /// Builds the list from a base URL, endpoint paths and payload shapes.
    ///
    /// Endpoints may be paths appended to the base URL or absolute URLs.
    pub fn new(base: &Url, endpoints: &[String], shapes: &[PayloadShape]) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(DeployError::config("At least one endpoint is required"));
        }
        if shapes.is_empty() {
            return Err(DeployError::config("At least one payload shape is required"));
        }

        let mut candidates = Vec::with_capacity(endpoints.len() * shapes.len());
        for endpoint in endpoints {
            let url = resolve_endpoint(base, endpoint)?;
            for shape in shapes {
                candidates.push(Candidate::new(url.clone(), *shape));
            }
        }

        Ok(Self { candidates })
    }

    /// Builds the list from the remote configuration.
    pub fn from_config(remote: &RemoteConfig) -> Result<Self> {
        Self::new(&remote.base_url()?, &remote.endpoints, &remote.payloads)
    }

    /// Returns the number of candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Returns true if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Returns the candidate at the given position.
    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    /// Iterates the candidates in trial order.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }
}

fn resolve_endpoint(base: &Url, endpoint: &str) -> Result<Url> {
    let raw = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    };

    Url::parse(&raw).map_err(|e| DeployError::config(format!("Invalid endpoint '{raw}': {e}")))
}
