use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use dlcmirror_lib::cache::CacheStore;
use dlcmirror_lib::config::{ClientConfig, Config, FetchConfig, MirrorConfig, OutputConfig};
use dlcmirror_lib::manifest::SecondaryEntryPolicy;
use eyre::Result;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use zip::write::SimpleFileOptions;

/// Path prefix under which the test server exposes the mirror root.
pub const MIRROR_PREFIX: &str = "simpsons/";
pub const ROOT_MANIFEST_PATH: &str = "dlc/DLCIndex.zip";
pub const ROOT_MANIFEST_ENTRY: &str = "DLCIndex.xml";

#[derive(Default)]
struct ServerState {
    files: Mutex<HashMap<String, Vec<u8>>>,
    hits: Mutex<HashMap<String, usize>>,
    last_headers: Mutex<Option<HeaderMap>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    delay: Duration,
}

/// In-process HTTP server serving an in-memory file tree and counting requests.
pub struct TestServer {
    address: String,
    state: Arc<ServerState>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with_delay(Duration::ZERO).await
    }

    /// Every response is held back by `delay`, which makes overlapping
    /// requests observable.
    pub async fn start_with_delay(delay: Duration) -> Result<Self> {
        let state = Arc::new(ServerState {
            delay,
            ..Default::default()
        });
        let app = Router::new()
            .fallback(serve_file)
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let address = format!("http://{}/", listener.local_addr()?);
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            address,
            state,
            handle,
        })
    }

    /// Mirror root URL handed to the code under test.
    pub fn base_url(&self) -> String {
        format!("{}{}", self.address, MIRROR_PREFIX)
    }

    /// Absolute URL of a path relative to the mirror root.
    pub fn url(&self, relative: &str) -> String {
        format!("{}{}", self.base_url(), relative)
    }

    pub fn put(&self, relative: &str, body: impl Into<Vec<u8>>) {
        self.state
            .files
            .lock()
            .unwrap()
            .insert(server_key(relative), body.into());
    }

    pub fn remove(&self, relative: &str) {
        self.state.files.lock().unwrap().remove(&server_key(relative));
    }

    pub fn hits(&self, relative: &str) -> usize {
        self.state
            .hits
            .lock()
            .unwrap()
            .get(&server_key(relative))
            .copied()
            .unwrap_or_default()
    }

    pub fn total_hits(&self) -> usize {
        self.state.hits.lock().unwrap().values().sum()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.state.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn last_headers(&self) -> Option<HeaderMap> {
        self.state.last_headers.lock().unwrap().clone()
    }

    pub fn reset_counters(&self) {
        self.state.hits.lock().unwrap().clear();
        self.state.peak_in_flight.store(0, Ordering::SeqCst);
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn server_key(relative: &str) -> String {
    format!("{}{}", MIRROR_PREFIX, relative.trim_start_matches('/'))
}

async fn serve_file(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let key = uri.path().trim_start_matches('/').to_string();
    *state.hits.lock().unwrap().entry(key.clone()).or_default() += 1;
    *state.last_headers.lock().unwrap() = Some(headers);

    let current = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.peak_in_flight.fetch_max(current, Ordering::SeqCst);
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    let body = state.files.lock().unwrap().get(&key).cloned();
    state.in_flight.fetch_sub(1, Ordering::SeqCst);

    match body {
        Some(body) => (StatusCode::OK, body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Builds an in-memory zip with the given entries, in order.
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, body) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start zip entry");
        writer.write_all(body.as_bytes()).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Root index XML. `None` produces an `IndexFile` without its `index` attribute.
pub fn root_index_xml(indexes: &[Option<&str>]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<DlcIndex>\n");
    for index in indexes {
        match index {
            Some(index) => xml.push_str(&format!("  <IndexFile index=\"{index}\"/>\n")),
            None => xml.push_str("  <IndexFile lang=\"en\"/>\n"),
        }
    }
    xml.push_str("</DlcIndex>\n");
    xml
}

/// Secondary index XML with one well-formed `Package` per value.
pub fn package_index_xml(vals: &[&str]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<DlcPackages>\n");
    for val in vals {
        xml.push_str(&format!(
            "  <Package platform=\"android\"><FileName val=\"{val}\"/><Version val=\"1\"/></Package>\n"
        ));
    }
    xml.push_str("</DlcPackages>\n");
    xml
}

/// Publishes a root manifest listing `indexes`.
pub fn publish_root(server: &TestServer, indexes: &[Option<&str>]) {
    server.put(
        ROOT_MANIFEST_PATH,
        zip_bytes(&[(ROOT_MANIFEST_ENTRY, &root_index_xml(indexes))]),
    );
}

/// Publishes a secondary manifest at `path` (`/`-separated) listing `vals`.
pub fn publish_secondary(server: &TestServer, path: &str, vals: &[&str]) {
    server.put(
        path,
        zip_bytes(&[("index.xml", &package_index_xml(vals))]),
    );
}

/// Publishes a small valid zip package at `path` (`/`-separated).
pub fn publish_package(server: &TestServer, path: &str) {
    server.put(path, zip_bytes(&[("content.bin", path)]));
}

pub fn create_test_config(base_url: &str, output: &Path, max_in_flight: usize) -> Config {
    Config {
        mirror: MirrorConfig {
            base_url: base_url.to_string(),
            root_manifest: ROOT_MANIFEST_PATH.to_string(),
            root_manifest_entry: ROOT_MANIFEST_ENTRY.to_string(),
            secondary_entries: SecondaryEntryPolicy::First,
        },
        client: ClientConfig {
            request_timeout_secs: 10,
            headers: BTreeMap::from([
                ("client_version".to_string(), "4.69.5".to_string()),
                ("platform".to_string(), "android".to_string()),
            ]),
        },
        fetch: FetchConfig { max_in_flight },
        output: OutputConfig {
            path: output.to_path_buf(),
            log_file: None,
        },
    }
}

/// Where the mirror stores the resource at `relative` under the mirror root.
pub fn local_path(server: &TestServer, output: &Path, relative: &str) -> PathBuf {
    let url = url::Url::parse(&server.url(relative)).expect("valid test URL");
    CacheStore::new(output).resolve(&url)
}

/// Every regular file below `root` with its contents, keyed by relative path.
pub fn snapshot_tree(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                walk(root, &path, out);
            } else if let Ok(data) = std::fs::read(&path) {
                let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
                out.insert(relative, data);
            }
        }
    }

    let mut out = BTreeMap::new();
    walk(root, root, &mut out);
    out
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("dlcmirror_lib=debug,dlcmirror_e2e_tests=debug")
        .with_test_writer()
        .try_init()
        .ok();
}
