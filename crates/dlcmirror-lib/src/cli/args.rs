use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use tracing::Level;

/// Settings shared by every command that talks to the mirror.
#[derive(Debug, Clone, Default)]
pub struct SourceOverrides {
    pub config_path: String,
    pub output_dir: Option<String>,
    pub base_url: Option<String>,
    pub max_in_flight: Option<usize>,
    pub log_file: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Command {
    Mirror {
        source: SourceOverrides,
        report_path: Option<String>,
    },
    ListPackages {
        source: SourceOverrides,
        output_path: Option<String>,
    },
}

pub struct Args {
    pub command: Command,
    pub log_level: Level,
}

#[derive(Debug, Parser)]
#[command(
    name = "dlcmirror",
    version,
    about = "Mirror a manifest-driven content-delivery tree to local disk"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count,
        global = true
    )]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, ClapArgs)]
struct SourceArgs {
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Sets a custom config file",
        default_value = "config.yaml"
    )]
    config: String,

    #[arg(
        short = 'o',
        long = "output-dir",
        value_name = "DIR",
        help = "Overrides the directory the mirror is written to"
    )]
    output_dir: Option<String>,

    #[arg(
        long = "base-url",
        value_name = "URL",
        help = "Overrides the mirror root every manifest path is resolved against"
    )]
    base_url: Option<String>,

    #[arg(
        long = "max-in-flight",
        value_name = "N",
        help = "Maximum number of simultaneous fetches for the whole run"
    )]
    max_in_flight: Option<usize>,

    #[arg(
        long = "log-file",
        value_name = "FILE",
        help = "Persistent log file (default: output.log_file or <output-dir>/debug.log)"
    )]
    log_file: Option<String>,
}

impl From<SourceArgs> for SourceOverrides {
    fn from(args: SourceArgs) -> Self {
        Self {
            config_path: args.config,
            output_dir: args.output_dir,
            base_url: args.base_url,
            max_in_flight: args.max_in_flight,
            log_file: args.log_file,
        }
    }
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Fetch the root manifest, every secondary manifest and every package
    Mirror {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(
            long = "report",
            value_name = "FILE",
            help = "Writes a JSON summary of the run to FILE"
        )]
        report: Option<String>,
    },

    /// Fetch the manifests and print every package URL without downloading packages
    #[command(name = "list-packages")]
    ListPackages {
        #[command(flatten)]
        source: SourceArgs,

        #[arg(
            long = "output",
            value_name = "FILE",
            help = "Writes the URLs to FILE instead of stdout"
        )]
        output: Option<String>,
    },
}

pub fn parse_args() -> Args {
    args_from_cli(Cli::parse())
}

pub fn try_parse_args_from<I, T>(iter: I) -> Result<Args, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter).map(args_from_cli)
}

fn args_from_cli(cli: Cli) -> Args {
    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let command = match cli.command {
        CliCommand::Mirror { source, report } => Command::Mirror {
            source: source.into(),
            report_path: report,
        },
        CliCommand::ListPackages { source, output } => Command::ListPackages {
            source: source.into(),
            output_path: output,
        },
    };

    Args { command, log_level }
}
