//! otf-profiler standalone binary.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "otf-profiler")]
#[command(about = "Summarize an OTF2 trace into a JSON profile", long_about = None)]
struct Cli {
    /// Input trace (only .otf2 archives are supported)
    #[arg(value_name = "TRACE")]
    input: PathBuf,

    /// Output prefix; the profile is written to <PREFIX>.json. Defaults to
    /// the trace path without its extension.
    #[arg(short, long, value_name = "PREFIX")]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match otf_profiler::run(&cli.input, cli.output.as_deref()) {
        Ok(path) => {
            println!("profile written to {}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            ExitCode::FAILURE
        }
    }
}
