mod client;
#[allow(clippy::module_inception)]
mod download;
mod error;
mod types;

pub use crate::cache::CachePolicy;
pub use client::ClientProfile;
pub use download::Fetcher;
pub use error::FetchError;
pub use types::{FetchOutcome, Fetched};
