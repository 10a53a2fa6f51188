//! Common test utilities.

use std::path::{Path, PathBuf};

use sqldeploy::executor::{CandidateList, PayloadShape};
use url::Url;

/// Writes a fixture file and returns its path.
pub fn write_file(dir: &Path, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// The default three endpoints with all payload shapes.
pub fn default_candidates() -> CandidateList {
    CandidateList::new(
        &Url::parse("https://abc.supabase.co").unwrap(),
        &[
            "/rest/v1/rpc/sql".to_string(),
            "/rest/v1/rpc/query".to_string(),
            "/sql".to_string(),
        ],
        &PayloadShape::ALL,
    )
    .unwrap()
}
