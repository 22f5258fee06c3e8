use dlcmirror_lib::cli::{
    ResolvedCommand, init_logging, parse_args, resolve_command, run_list_packages, run_mirror,
};
use dlcmirror_lib::error::MirrorError;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), MirrorError> {
    color_eyre::install()?;

    let args = parse_args();
    let command = resolve_command(args.command)?;
    let _log_guard = init_logging(args.log_level, command.log_file())?;

    match command {
        ResolvedCommand::Mirror(params) => {
            run_mirror(params).await?;
        }
        ResolvedCommand::ListPackages(params) => {
            run_list_packages(params).await?;
        }
    }

    Ok(())
}
