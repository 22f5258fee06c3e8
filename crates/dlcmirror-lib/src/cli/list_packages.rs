use crate::cli::ListPackagesParams;
use crate::error::MirrorError;
use crate::mirror::{Discovery, Mirror};
use std::io::{BufWriter, Write};

/// Discovers package URLs and writes them one per line. Returns how many
/// were written.
pub async fn run_list_packages(params: ListPackagesParams) -> Result<usize, MirrorError> {
    let ListPackagesParams {
        app_config,
        output_path,
        ..
    } = params;

    let mirror = Mirror::from_config(&app_config)?;
    let Discovery { packages, report } = mirror
        .discover_packages()
        .await
        .inspect_err(|e| tracing::error!("Package discovery aborted: {}", e))?;

    let count = match &output_path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::File::create(path).map_err(|e| MirrorError::OutputWrite {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            write_urls(BufWriter::new(file), &packages)?
        }
        None => write_urls(BufWriter::new(std::io::stdout().lock()), &packages)?,
    };

    tracing::info!(
        packages = count,
        skipped_manifests = report.secondary_manifests.skipped,
        malformed_elements = report.malformed_elements,
        "Package listing finished"
    );
    Ok(count)
}

fn write_urls<W: Write>(
    mut writer: W,
    packages: &[crate::manifest::ManifestReference],
) -> Result<usize, MirrorError> {
    for package in packages {
        writeln!(writer, "{}", package.url)?;
    }
    writer.flush()?;
    Ok(packages.len())
}
