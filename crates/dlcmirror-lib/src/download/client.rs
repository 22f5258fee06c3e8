use crate::config::ClientConfig;
use crate::error::MirrorError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::time::Duration;

/// Static identity and limits for every request of a run.
///
/// Built once and handed to the [`Fetcher`](super::Fetcher); nothing about the
/// client is process-global. No `User-Agent` is sent unless one is listed in
/// `headers`.
#[derive(Clone, Debug)]
pub struct ClientProfile {
    pub headers: BTreeMap<String, String>,
    pub request_timeout: Duration,
}

impl ClientProfile {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            headers: config.headers.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    pub fn header_map(&self) -> Result<HeaderMap, MirrorError> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| MirrorError::ClientSetup {
                    reason: format!("invalid header name {name:?}: {e}"),
                })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| MirrorError::ClientSetup {
                    reason: format!("invalid value for header {name:?}: {e}"),
                })?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }

    pub fn build_client(&self) -> Result<reqwest::Client, MirrorError> {
        reqwest::Client::builder()
            .default_headers(self.header_map()?)
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| MirrorError::ClientSetup {
                reason: e.to_string(),
            })
    }
}
