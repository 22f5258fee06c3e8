mod loader;
mod model;

pub use loader::{ENV_PREFIX, load_config};
pub use model::{ClientConfig, Config, FetchConfig, MirrorConfig, OutputConfig};
