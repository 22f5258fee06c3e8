use super::Config;
use crate::error::MirrorError;
use config::Config as ConfigBuilder;

/// Environment variables starting with `DLCMIRROR__` override file values,
/// e.g. `DLCMIRROR__FETCH__MAX_IN_FLIGHT=4`.
pub const ENV_PREFIX: &str = "DLCMIRROR";

pub fn load_config(config_path: &str) -> Result<Config, MirrorError> {
    let config_builder = ConfigBuilder::builder()
        .add_source(config::File::with_name(config_path))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config_builder.try_deserialize().map_err(Into::into)
}
