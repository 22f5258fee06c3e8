use super::error::FetchError;
use super::types::{FetchOutcome, Fetched};
use crate::cache::{CachePolicy, CacheState, CacheStore};
use futures::StreamExt;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

/// Performs bounded GET-to-file transfers.
///
/// Every call to [`Fetcher::fetch`] holds one permit from `permits` for its
/// whole duration, so the semaphore size is the number of fetches in flight
/// across everything sharing it.
pub struct Fetcher {
    client: reqwest::Client,
    cache: CacheStore,
    permits: Arc<Semaphore>,
}

impl Fetcher {
    pub fn new(client: reqwest::Client, cache: CacheStore, permits: Arc<Semaphore>) -> Self {
        Self {
            client,
            cache,
            permits,
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub async fn fetch(&self, url: &Url, policy: CachePolicy) -> Result<Fetched, FetchError> {
        let _permit = self.permits.acquire().await?;

        let output_path = self.cache.resolve(url);
        tracing::trace!(url = %url, output = %output_path.display(), "Checking");

        let usable = tokio::task::block_in_place(|| self.cache.is_usable(&output_path, policy))
            .map_err(|e| FetchError::io(&output_path, e))?;
        if usable {
            debug!(url = %url, output = %output_path.display(), "URL is cached, skipping download");
            return Ok(Fetched {
                path: output_path,
                outcome: FetchOutcome::Cached,
            });
        }

        let parent = output_path
            .parent()
            .unwrap_or_else(|| self.cache.output_root());
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FetchError::io(parent, e))?;

        info!(url = %url, output = %output_path.display(), "Downloading");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Unexpected non-success status");
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        write_body(url, response, parent, &output_path).await?;

        let state = tokio::task::block_in_place(|| self.cache.check(&output_path))
            .map_err(|e| FetchError::io(&output_path, e))?;
        if state == CacheState::Repaired {
            warn!(url = %url, output = %output_path.display(), "Downloaded archive failed validation");
        }

        Ok(Fetched {
            path: output_path,
            outcome: FetchOutcome::Fresh,
        })
    }
}

/// Streams the body into a temporary sibling of `output_path`, then renames it
/// into place. The temporary file is removed if anything fails before the rename.
///
/// The staging file gets the mode of a plain `File::create` (0666 minus the
/// umask), not tempfile's owner-only default.
async fn write_body(
    url: &Url,
    response: reqwest::Response,
    parent: &Path,
    output_path: &Path,
) -> Result<(), FetchError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".dlcmirror-").suffix(".part");
    #[cfg(unix)]
    builder.permissions(std::fs::Permissions::from_mode(0o666));

    let (file, temp_path) = builder
        .tempfile_in(parent)
        .map_err(|e| FetchError::io(parent, e))?
        .into_parts();

    let mut writer = tokio::io::BufWriter::new(tokio::fs::File::from_std(file));
    let mut body = response.bytes_stream();

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(&*temp_path, e))?;
    }

    writer
        .flush()
        .await
        .map_err(|e| FetchError::io(&*temp_path, e))?;
    drop(writer);

    temp_path
        .persist(output_path)
        .map_err(|e| FetchError::io(output_path, e.error))?;
    Ok(())
}
