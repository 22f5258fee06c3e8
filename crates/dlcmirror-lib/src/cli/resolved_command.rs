use crate::cli::args::{Command, SourceOverrides};
use crate::cli::params::{ListPackagesParams, MirrorParams};
use crate::config::{Config, load_config};
use crate::error::MirrorError;
use crate::manifest::MirrorRoot;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    Mirror(MirrorParams),
    ListPackages(ListPackagesParams),
}

impl ResolvedCommand {
    pub fn log_file(&self) -> &Path {
        match self {
            ResolvedCommand::Mirror(params) => &params.log_file,
            ResolvedCommand::ListPackages(params) => &params.log_file,
        }
    }
}

pub fn resolve_command(command: Command) -> Result<ResolvedCommand, MirrorError> {
    match command {
        Command::Mirror {
            source,
            report_path,
        } => {
            let (app_config, log_file) = resolve_source(source)?;
            Ok(ResolvedCommand::Mirror(MirrorParams {
                app_config,
                log_file,
                report_path: report_path.map(PathBuf::from),
            }))
        }
        Command::ListPackages {
            source,
            output_path,
        } => {
            let (app_config, log_file) = resolve_source(source)?;
            Ok(ResolvedCommand::ListPackages(ListPackagesParams {
                app_config,
                log_file,
                output_path: output_path.map(PathBuf::from),
            }))
        }
    }
}

fn resolve_source(source: SourceOverrides) -> Result<(Config, PathBuf), MirrorError> {
    let mut app_config = load_config(&source.config_path)?;
    apply_overrides(&mut app_config, &source);
    validate_config(&app_config)?;

    let log_file = source
        .log_file
        .map(PathBuf::from)
        .unwrap_or_else(|| app_config.output.log_file_path());
    Ok((app_config, log_file))
}

pub fn apply_overrides(app_config: &mut Config, source: &SourceOverrides) {
    if let Some(output_dir) = &source.output_dir {
        app_config.output.path = PathBuf::from(output_dir);
    }
    if let Some(base_url) = &source.base_url {
        app_config.mirror.base_url = base_url.clone();
    }
    if let Some(max_in_flight) = source.max_in_flight {
        app_config.fetch.max_in_flight = max_in_flight;
    }
}

pub fn validate_config(app_config: &Config) -> Result<(), MirrorError> {
    for (name, value) in [
        ("max-in-flight", app_config.fetch.max_in_flight as u64),
        ("request-timeout-secs", app_config.client.request_timeout_secs),
    ] {
        if value == 0 {
            return Err(MirrorError::CliArgumentValidation {
                details: format!("{name} must be greater than 0."),
            });
        }
    }

    for (name, value) in [
        ("mirror.root_manifest", &app_config.mirror.root_manifest),
        ("mirror.root_manifest_entry", &app_config.mirror.root_manifest_entry),
    ] {
        if value.trim().is_empty() {
            return Err(MirrorError::CliArgumentValidation {
                details: format!("{name} must not be empty."),
            });
        }
    }

    MirrorRoot::parse(&app_config.mirror.base_url).map_err(|source| MirrorError::MirrorRoot {
        url: app_config.mirror.base_url.clone(),
        source,
    })?;
    Ok(())
}
