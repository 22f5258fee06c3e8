use crate::manifest::SecondaryEntryPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub mirror: MirrorConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    pub output: OutputConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MirrorConfig {
    /// Every manifest path is resolved against this URL.
    pub base_url: String,
    /// Root manifest archive, relative to `base_url`.
    #[serde(default = "default_root_manifest")]
    pub root_manifest: String,
    /// Entry inside the root manifest archive that holds the index XML.
    #[serde(default = "default_root_manifest_entry")]
    pub root_manifest_entry: String,
    #[serde(default)]
    pub secondary_entries: SecondaryEntryPolicy,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Sent verbatim with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            headers: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    /// Upper bound on simultaneous fetches for the whole run.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl OutputConfig {
    pub const DEFAULT_LOG_FILE_NAME: &'static str = "debug.log";

    pub fn log_file_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.path.join(Self::DEFAULT_LOG_FILE_NAME))
    }
}

fn default_root_manifest() -> String {
    "dlc/DLCIndex.zip".to_string()
}

fn default_root_manifest_entry() -> String {
    "DLCIndex.xml".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_in_flight() -> usize {
    10
}
