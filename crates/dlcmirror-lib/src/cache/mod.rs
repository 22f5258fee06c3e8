use crate::verification::{is_archive_path, is_valid_archive};
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// Whether a fetch may be answered from disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CachePolicy {
    /// A valid local copy short-circuits the network fetch.
    UseCache,
    /// Always go to the network, but still repair a corrupt local copy first.
    Refresh,
}

impl CachePolicy {
    pub fn caching_enabled(self) -> bool {
        matches!(self, CachePolicy::UseCache)
    }
}

/// Result of inspecting a local path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheState {
    Missing,
    /// The file was an unreadable archive and has been deleted.
    Repaired,
    Valid,
}

/// Maps remote URLs onto `output_root/<host>/<url-path>` and decides whether
/// the file already there can be reused.
#[derive(Clone, Debug)]
pub struct CacheStore {
    output_root: PathBuf,
}

impl CacheStore {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Local path for a URL. Query and fragment do not take part in the mapping.
    pub fn resolve(&self, url: &Url) -> PathBuf {
        let mut path = self.output_root.join(host_directory(url));
        if let Some(segments) = url.path_segments() {
            for segment in segments.filter(|s| !s.is_empty() && *s != "." && *s != "..") {
                path.push(segment);
            }
        }
        path
    }

    /// Inspects `path`, deleting it if it claims to be an archive but is not a
    /// readable one.
    pub fn check(&self, path: &Path) -> io::Result<CacheState> {
        if !path.exists() {
            return Ok(CacheState::Missing);
        }

        if is_archive_path(path) && !is_valid_archive(path) {
            std::fs::remove_file(path)?;
            tracing::warn!(path = %path.display(), "Invalid archive on disk, deleted");
            return Ok(CacheState::Repaired);
        }

        Ok(CacheState::Valid)
    }

    /// True when the caller must skip the network fetch for `path`.
    pub fn is_usable(&self, path: &Path, policy: CachePolicy) -> io::Result<bool> {
        let state = self.check(path)?;
        Ok(state == CacheState::Valid && policy.caching_enabled())
    }
}

fn host_directory(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn write_zip(path: &Path) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("DLCIndex.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<DlcIndex/>").unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn test_resolve_mirrors_host_and_path() {
        let store = CacheStore::new("/output");
        let path = store.resolve(&url("http://cdn.example.com/gameasset/dlc/DLCIndex.zip"));
        assert_eq!(
            path,
            PathBuf::from("/output/cdn.example.com/gameasset/dlc/DLCIndex.zip")
        );
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let store = CacheStore::new("/output");
        let a = url("http://cdn.example.com/dlc/a.zip");
        assert_eq!(store.resolve(&a), store.resolve(&a.clone()));
        assert_eq!(
            store.resolve(&a),
            store.resolve(&url("http://cdn.example.com/dlc/a.zip?ignored=1"))
        );
    }

    #[test]
    fn test_resolve_distinguishes_hosts_ports_and_paths() {
        let store = CacheStore::new("/output");
        let urls = [
            url("http://cdn.example.com/dlc/a.zip"),
            url("http://cdn.example.com/dlc/b.zip"),
            url("http://cdn.example.com/other/a.zip"),
            url("http://mirror.example.com/dlc/a.zip"),
            url("http://cdn.example.com:8080/dlc/a.zip"),
        ];
        let paths: std::collections::HashSet<_> = urls.iter().map(|u| store.resolve(u)).collect();
        assert_eq!(paths.len(), urls.len());
    }

    #[test]
    fn test_resolve_drops_empty_segments() {
        let store = CacheStore::new("/output");
        assert_eq!(
            store.resolve(&url("http://cdn.example.com/dlc//a.zip")),
            store.resolve(&url("http://cdn.example.com/dlc/a.zip"))
        );
    }

    #[test]
    fn test_missing_file_is_not_usable() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let path = dir.path().join("missing.zip");

        assert_eq!(store.check(&path).unwrap(), CacheState::Missing);
        assert!(!store.is_usable(&path, CachePolicy::UseCache).unwrap());
    }

    #[test]
    fn test_valid_archive_is_usable_only_with_caching() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let path = dir.path().join("index.zip");
        write_zip(&path);

        assert!(store.is_usable(&path, CachePolicy::UseCache).unwrap());
        assert!(!store.is_usable(&path, CachePolicy::Refresh).unwrap());
        assert!(path.exists(), "refresh must not delete a valid file");
    }

    #[test]
    fn test_corrupt_archive_is_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let path = dir.path().join("index.zip");
        std::fs::write(&path, b"PK\x03\x04truncated").unwrap();

        assert_eq!(store.check(&path).unwrap(), CacheState::Repaired);
        assert!(!path.exists());
        assert!(!store.is_usable(&path, CachePolicy::UseCache).unwrap());
    }

    #[test]
    fn test_non_archive_file_is_usable() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let path = dir.path().join("asset.bin");
        std::fs::write(&path, b"payload").unwrap();

        assert!(store.is_usable(&path, CachePolicy::UseCache).unwrap());
    }
}
