use dlcmirror_e2e_tests::{TestServer, init_tracing, local_path, publish_package};
use dlcmirror_lib::cache::{CachePolicy, CacheStore};
use dlcmirror_lib::download::{ClientProfile, FetchError, FetchOutcome, Fetcher};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

fn fetcher(output: &std::path::Path, max_in_flight: usize) -> Fetcher {
    let client = ClientProfile {
        headers: BTreeMap::new(),
        request_timeout: Duration::from_secs(5),
    }
    .build_client()
    .expect("client");
    Fetcher::new(
        client,
        CacheStore::new(output),
        Arc::new(Semaphore::new(max_in_flight)),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cache_policy_controls_network_use() {
    init_tracing();
    let server = TestServer::start().await.expect("start server");
    publish_package(&server, "pkg/a.zip");
    let output = tempfile::tempdir().expect("tempdir");
    let fetcher = fetcher(output.path(), 2);
    let url = Url::parse(&server.url("pkg/a.zip")).expect("url");

    let first = fetcher.fetch(&url, CachePolicy::UseCache).await.expect("fetch");
    let second = fetcher.fetch(&url, CachePolicy::UseCache).await.expect("fetch");
    let refreshed = fetcher.fetch(&url, CachePolicy::Refresh).await.expect("fetch");

    assert_eq!(first.outcome, FetchOutcome::Fresh);
    assert_eq!(second.outcome, FetchOutcome::Cached);
    assert_eq!(refreshed.outcome, FetchOutcome::Fresh);
    assert_eq!(server.hits("pkg/a.zip"), 2);
    assert_eq!(first.path, local_path(&server, output.path(), "pkg/a.zip"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_non_success_status_leaves_no_file() {
    init_tracing();
    let server = TestServer::start().await.expect("start server");
    let output = tempfile::tempdir().expect("tempdir");
    let fetcher = fetcher(output.path(), 2);
    let url = Url::parse(&server.url("pkg/missing.zip")).expect("url");

    let err = fetcher
        .fetch(&url, CachePolicy::UseCache)
        .await
        .expect_err("404 must fail");

    assert!(matches!(err, FetchError::HttpStatus { .. }));
    assert!(!err.is_retryable());
    assert!(!local_path(&server, output.path(), "pkg/missing.zip").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connection_failure_is_a_retryable_transport_error() {
    init_tracing();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let address = listener.local_addr().expect("address");
    drop(listener);

    let output = tempfile::tempdir().expect("tempdir");
    let fetcher = fetcher(output.path(), 1);
    let url = Url::parse(&format!("http://{address}/pkg/a.zip")).expect("url");

    let err = fetcher
        .fetch(&url, CachePolicy::UseCache)
        .await
        .expect_err("nothing is listening");

    assert!(matches!(err, FetchError::Transport { .. }));
    assert!(err.is_retryable());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_non_archive_downloads_are_kept_verbatim() {
    init_tracing();
    let server = TestServer::start().await.expect("start server");
    server.put("pkg/texture.pvr", b"raw texture bytes".to_vec());
    let output = tempfile::tempdir().expect("tempdir");
    let fetcher = fetcher(output.path(), 1);
    let url = Url::parse(&server.url("pkg/texture.pvr")).expect("url");

    let fetched = fetcher.fetch(&url, CachePolicy::UseCache).await.expect("fetch");

    assert_eq!(
        std::fs::read(&fetched.path).expect("read"),
        b"raw texture bytes"
    );
    let leftovers: Vec<_> = std::fs::read_dir(fetched.path.parent().expect("parent"))
        .expect("read dir")
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
        .collect();
    assert!(leftovers.is_empty(), "temporary files must be renamed away");
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn test_mirrored_files_get_default_create_mode() {
    use std::os::unix::fs::PermissionsExt;

    init_tracing();
    let server = TestServer::start().await.expect("start server");
    publish_package(&server, "pkg/a.zip");
    let output = tempfile::tempdir().expect("tempdir");
    let fetcher = fetcher(output.path(), 1);
    let url = Url::parse(&server.url("pkg/a.zip")).expect("url");

    let fetched = fetcher.fetch(&url, CachePolicy::UseCache).await.expect("fetch");
    let plain = fetched.path.with_file_name("plain.bin");
    std::fs::write(&plain, b"plain").expect("write plain file");

    let mode = |path: &std::path::Path| {
        std::fs::metadata(path).expect("metadata").permissions().mode() & 0o777
    };
    assert_eq!(
        mode(&fetched.path),
        mode(&plain),
        "mirrored file mode must match a plainly created file"
    );
}
