use crate::config::Config;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct MirrorParams {
    pub app_config: Config,
    pub log_file: PathBuf,
    pub report_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ListPackagesParams {
    pub app_config: Config,
    pub log_file: PathBuf,
    pub output_path: Option<PathBuf>,
}
