mod args;
mod list_packages;
mod logging;
mod mirror;
mod params;
mod resolved_command;

pub use args::{Args, Command, SourceOverrides, parse_args, try_parse_args_from};
pub use list_packages::run_list_packages;
pub use logging::init_logging;
pub use mirror::run_mirror;
pub use params::{ListPackagesParams, MirrorParams};
pub use resolved_command::{ResolvedCommand, apply_overrides, resolve_command, validate_config};
