use serde::Serialize;
use std::path::PathBuf;

/// Terminal result of a single fetch attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Downloaded during this run.
    Fresh,
    /// Answered from disk, no network I/O.
    Cached,
    /// Failed, and the failure was contained at this URL.
    Skipped,
    /// Failed, and the failure ends the run.
    Failed,
}

#[derive(Clone, Debug)]
pub struct Fetched {
    pub path: PathBuf,
    pub outcome: FetchOutcome,
}
