use crate::cli::MirrorParams;
use crate::error::MirrorError;
use crate::mirror::{Mirror, MirrorReport};

pub async fn run_mirror(params: MirrorParams) -> Result<MirrorReport, MirrorError> {
    let MirrorParams {
        app_config,
        report_path,
        ..
    } = params;

    tracing::info!(
        base_url = %app_config.mirror.base_url,
        output = %app_config.output.path.display(),
        max_in_flight = app_config.fetch.max_in_flight,
        "Starting mirror run"
    );

    let mirror = Mirror::from_config(&app_config)?;
    let report = mirror
        .run()
        .await
        .inspect_err(|e| tracing::error!("Mirror run aborted: {}", e))?;

    if let Some(report_path) = report_path {
        tracing::info!("Writing run report to {}", report_path.display());
        report.write_json(&report_path)?;
    }

    tracing::info!("Mirror completed successfully");
    Ok(report)
}
