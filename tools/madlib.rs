/// Madlib — fills a story template with random dictionary words.
///
/// Usage: madlib <DICTIONARY> <TEMPLATE> <OUTPUT> [--seed <n>] [--log-level <level>]

use clap::{CommandFactory, Parser};
use log::{error, info, LevelFilter};
use madlib::core::pipeline::{MadlibEngine, PipelineError};
use madlib::core::substitution::StoryStats;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status for a command-line usage error.
const USAGE_EXIT: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "madlib")]
#[command(about = "Fill a story template with random words from a dictionary", version)]
struct Args {
    /// Word dictionary: JSON array of {"word", "type"} objects, or a .ron map
    dictionary: PathBuf,

    /// Story template with [category] placeholders
    template: PathBuf,

    /// Where to write the filled story
    output: PathBuf,

    /// Seed for the random source (for reproducible stories)
    #[arg(long, env = "MADLIB_SEED")]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err)
            if matches!(
                err.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) =>
        {
            err.exit()
        }
        Err(_) => {
            eprintln!("{}", Args::command().render_usage());
            return ExitCode::from(USAGE_EXIT);
        }
    };

    init_logging(&args.log_level);

    match run(&args) {
        Ok(_) => {
            info!("Output file generated '{}'", args.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.kind().exit_code())
        }
    }
}

fn init_logging(level: &str) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level.parse().unwrap_or(LevelFilter::Info))
        .format_timestamp(None)
        .format_target(false)
        .parse_default_env()
        .init();
}

fn run(args: &Args) -> Result<StoryStats, PipelineError> {
    let mut builder = MadlibEngine::builder().dictionary_path(&args.dictionary);
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    let mut engine = builder.build()?;
    engine.generate(&args.template, &args.output)
}
