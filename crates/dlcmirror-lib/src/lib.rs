pub mod cache;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod manifest;
pub mod mirror;
pub mod verification;

pub use config::Config;
pub use error::MirrorError;
pub use mirror::{Mirror, MirrorReport};
