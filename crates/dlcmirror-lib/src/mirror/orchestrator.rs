use super::report::MirrorReport;
use crate::cache::{CachePolicy, CacheStore};
use crate::config::Config;
use crate::download::{ClientProfile, FetchOutcome, Fetcher};
use crate::error::MirrorError;
use crate::manifest::{
    ManifestReference, ManifestRole, MirrorRoot, ParsedManifest, SecondaryEntryPolicy,
    parse_root_manifest, parse_secondary_manifest,
};
use futures::stream::{self, FuturesUnordered, StreamExt};
use itertools::Itertools;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub struct MirrorOptions {
    pub root_manifest: String,
    pub root_manifest_entry: String,
    pub secondary_entries: SecondaryEntryPolicy,
    /// How many secondary manifests are processed at once. Network I/O is
    /// bounded separately by the fetcher's permits.
    pub secondary_parallelism: usize,
}

impl MirrorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            root_manifest: config.mirror.root_manifest.clone(),
            root_manifest_entry: config.mirror.root_manifest_entry.clone(),
            secondary_entries: config.mirror.secondary_entries,
            secondary_parallelism: config.fetch.max_in_flight.max(1),
        }
    }
}

/// Package references found in phases 0 and 1, in manifest order.
#[derive(Debug)]
pub struct Discovery {
    pub packages: Vec<ManifestReference>,
    pub report: MirrorReport,
}

/// Drives a run: root manifest, then secondary manifests, then packages.
pub struct Mirror {
    fetcher: Fetcher,
    root: MirrorRoot,
    options: MirrorOptions,
}

impl Mirror {
    pub fn new(fetcher: Fetcher, root: MirrorRoot, options: MirrorOptions) -> Self {
        Self {
            fetcher,
            root,
            options,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, MirrorError> {
        if config.fetch.max_in_flight == 0 {
            return Err(MirrorError::CliArgumentValidation {
                details: "fetch.max_in_flight must be greater than 0.".to_string(),
            });
        }

        let root =
            MirrorRoot::parse(&config.mirror.base_url).map_err(|source| MirrorError::MirrorRoot {
                url: config.mirror.base_url.clone(),
                source,
            })?;
        let client = ClientProfile::from_config(&config.client).build_client()?;
        let permits = Arc::new(Semaphore::new(config.fetch.max_in_flight));
        let fetcher = Fetcher::new(client, CacheStore::new(&config.output.path), permits);

        Ok(Self::new(fetcher, root, MirrorOptions::from_config(config)))
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Full run. Only root manifest failures are returned as errors.
    pub async fn run(&self) -> Result<MirrorReport, MirrorError> {
        let Discovery {
            packages,
            mut report,
        } = self.discover_packages().await?;

        self.fetch_packages(packages, &mut report).await;

        report.log_summary();
        Ok(report)
    }

    /// Phases 0 and 1: fetch and parse the root manifest, then every secondary
    /// manifest it lists.
    pub async fn discover_packages(&self) -> Result<Discovery, MirrorError> {
        let mut report = MirrorReport::default();

        let root_parsed = self.fetch_root(&mut report).await?;
        report.malformed_elements += root_parsed.warnings.len();
        info!(
            "Root manifest lists {} secondary manifests",
            root_parsed.references.len()
        );

        let results: Vec<_> = stream::iter(root_parsed.references.iter())
            .map(|reference| self.fetch_secondary(reference))
            .buffered(self.options.secondary_parallelism.max(1))
            .collect()
            .await;

        let mut packages = Vec::new();
        for (reference, result) in root_parsed.references.iter().zip(results) {
            let url = reference.url.as_str();
            match result {
                Ok((outcome, parsed)) => {
                    report.record(ManifestRole::SecondaryManifest, outcome);
                    report.malformed_elements += parsed.warnings.len();
                    packages.extend(parsed.references);
                }
                Err(SecondaryFailure::Fetch(e)) => {
                    warn!(url, "Skipping secondary manifest: {}", e);
                    report.record_fetch_failure(ManifestRole::SecondaryManifest, url, &e);
                }
                Err(SecondaryFailure::Parse(e)) => {
                    warn!(url, "Skipping unreadable secondary manifest: {}", e);
                    report.record_unusable(ManifestRole::SecondaryManifest, url, e.to_string());
                }
            }
        }

        info!("Discovered {} package references", packages.len());
        Ok(Discovery { packages, report })
    }

    async fn fetch_root(&self, report: &mut MirrorReport) -> Result<ParsedManifest, MirrorError> {
        let url = self
            .root
            .resolve(&self.options.root_manifest)
            .map_err(|source| MirrorError::MirrorRoot {
                url: format!("{}{}", self.root, self.options.root_manifest),
                source,
            })?;

        info!(url = %url, "Fetching root manifest");
        let fetched = match self.fetcher.fetch(&url, CachePolicy::Refresh).await {
            Ok(fetched) => fetched,
            Err(e) => {
                report.record(ManifestRole::RootManifest, FetchOutcome::Failed);
                return Err(MirrorError::RootManifestFetch(e));
            }
        };
        report.record(ManifestRole::RootManifest, fetched.outcome);

        tokio::task::block_in_place(|| {
            parse_root_manifest(&fetched.path, &self.options.root_manifest_entry, &self.root)
        })
        .map_err(MirrorError::RootManifest)
    }

    async fn fetch_secondary(
        &self,
        reference: &ManifestReference,
    ) -> Result<(FetchOutcome, ParsedManifest), SecondaryFailure> {
        let fetched = self
            .fetcher
            .fetch(&reference.url, CachePolicy::UseCache)
            .await
            .map_err(SecondaryFailure::Fetch)?;

        let parsed = tokio::task::block_in_place(|| {
            parse_secondary_manifest(&fetched.path, &self.root, self.options.secondary_entries)
        })
        .map_err(SecondaryFailure::Parse)?;
        Ok((fetched.outcome, parsed))
    }

    /// Phase 2. Every package is fetched under the shared bound; failures are
    /// recorded and never stop the others.
    pub async fn fetch_packages(&self, packages: Vec<ManifestReference>, report: &mut MirrorReport) {
        let total = packages.len();
        let packages: Vec<_> = packages.into_iter().unique().collect();
        report.duplicate_packages += total - packages.len();
        if packages.len() < total {
            debug!("Dropped {} duplicate package references", total - packages.len());
        }

        info!("Fetching {} packages...", packages.len());

        let mut futs: FuturesUnordered<_> = packages
            .iter()
            .map(|package| async move {
                let result = self
                    .fetcher
                    .fetch(&package.url, CachePolicy::UseCache)
                    .await;
                (package, result)
            })
            .collect();

        while let Some((package, result)) = futs.next().await {
            match result {
                Ok(fetched) => report.record(package.role, fetched.outcome),
                Err(e) => {
                    warn!(url = %package.url, "Package fetch failed: {}", e);
                    report.record_fetch_failure(package.role, package.url.as_str(), &e);
                }
            }
        }
    }
}

enum SecondaryFailure {
    Fetch(crate::download::FetchError),
    Parse(crate::manifest::ManifestError),
}
