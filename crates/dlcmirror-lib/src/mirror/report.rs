use crate::download::{FetchError, FetchOutcome};
use crate::error::MirrorError;
use crate::manifest::ManifestRole;
use serde::Serialize;
use std::path::Path;

/// Fetch outcomes of one phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PhaseTally {
    pub fresh: usize,
    pub cached: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PhaseTally {
    pub fn record(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Fresh => self.fresh += 1,
            FetchOutcome::Cached => self.cached += 1,
            FetchOutcome::Skipped => self.skipped += 1,
            FetchOutcome::Failed => self.failed += 1,
        }
    }

    pub fn attempted(&self) -> usize {
        self.fresh + self.cached + self.skipped + self.failed
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SkippedFetch {
    pub url: String,
    pub role: ManifestRole,
    pub reason: String,
    pub status: Option<u16>,
    pub retryable: bool,
}

/// What a run did. Skips are expected and do not make a run fail.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MirrorReport {
    pub root_manifest: Option<FetchOutcome>,
    pub secondary_manifests: PhaseTally,
    pub packages: PhaseTally,
    pub duplicate_packages: usize,
    pub malformed_elements: usize,
    pub skipped: Vec<SkippedFetch>,
}

impl MirrorReport {
    fn tally_mut(&mut self, role: ManifestRole) -> Option<&mut PhaseTally> {
        match role {
            ManifestRole::RootManifest => None,
            ManifestRole::SecondaryManifest => Some(&mut self.secondary_manifests),
            ManifestRole::Package => Some(&mut self.packages),
        }
    }

    pub(crate) fn record(&mut self, role: ManifestRole, outcome: FetchOutcome) {
        match self.tally_mut(role) {
            Some(tally) => tally.record(outcome),
            None => self.root_manifest = Some(outcome),
        }
    }

    pub(crate) fn record_fetch_failure(&mut self, role: ManifestRole, url: &str, error: &FetchError) {
        self.record(role, FetchOutcome::Skipped);
        self.skipped.push(SkippedFetch {
            url: url.to_string(),
            role,
            reason: error.to_string(),
            status: error.status().map(|s| s.as_u16()),
            retryable: error.is_retryable(),
        });
    }

    /// A fetched file that could not be used afterwards.
    pub(crate) fn record_unusable(&mut self, role: ManifestRole, url: &str, reason: String) {
        self.record(role, FetchOutcome::Skipped);
        self.skipped.push(SkippedFetch {
            url: url.to_string(),
            role,
            reason,
            status: None,
            retryable: false,
        });
    }

    pub fn log_summary(&self) {
        tracing::info!(
            secondary_fresh = self.secondary_manifests.fresh,
            secondary_cached = self.secondary_manifests.cached,
            secondary_skipped = self.secondary_manifests.skipped,
            packages_fresh = self.packages.fresh,
            packages_cached = self.packages.cached,
            packages_skipped = self.packages.skipped,
            malformed_elements = self.malformed_elements,
            "Mirror run finished"
        );
        if !self.skipped.is_empty() {
            tracing::info!(
                "{} fetches were skipped, see warnings above for details",
                self.skipped.len()
            );
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<(), MirrorError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| MirrorError::OutputWrite {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_record_routes_outcomes_by_role() {
        let mut report = MirrorReport::default();
        report.record(ManifestRole::RootManifest, FetchOutcome::Fresh);
        report.record(ManifestRole::SecondaryManifest, FetchOutcome::Cached);
        report.record(ManifestRole::Package, FetchOutcome::Fresh);
        report.record(ManifestRole::Package, FetchOutcome::Fresh);

        assert_eq!(report.root_manifest, Some(FetchOutcome::Fresh));
        assert_eq!(report.secondary_manifests.cached, 1);
        assert_eq!(report.packages.fresh, 2);
        assert_eq!(report.packages.attempted(), 2);
    }

    #[test]
    fn test_fetch_failures_are_listed_as_skips() {
        let mut report = MirrorReport::default();
        let error = FetchError::HttpStatus {
            url: "http://cdn.example.com/dlc/gone.zip".to_string(),
            status: StatusCode::NOT_FOUND,
        };
        report.record_fetch_failure(
            ManifestRole::SecondaryManifest,
            "http://cdn.example.com/dlc/gone.zip",
            &error,
        );

        assert_eq!(report.secondary_manifests.skipped, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].status, Some(404));
        assert!(!report.skipped[0].retryable);
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/run.json");
        let mut report = MirrorReport::default();
        report.record(ManifestRole::Package, FetchOutcome::Cached);

        report.write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["packages"]["cached"], 1);
        assert_eq!(value["root_manifest"], serde_json::Value::Null);
    }
}
