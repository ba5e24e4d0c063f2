mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use output::{
    ClassifyInfo, ClassifyOutput, FileOutcomeInfo, InitOutput, LogEntryInfo, LogOutput,
    OnceOutput, OutputWriter,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use trove_core::{Algorithm, CategoryTable, Config, LogStore, Sorter};

/// Trove - sort files dropped into a watch folder
#[derive(Parser)]
#[command(name = "trove")]
#[command(about = "Watch a folder and sort arriving files by type", long_about = None)]
#[command(version)]
struct Cli {
    /// Base directory for the default layout (defaults to TROVE_ROOT env var or .)
    #[arg(short, long, global = true)]
    base: Option<PathBuf>,

    /// Folder to watch (defaults to TROVE_WATCH_DIR or <base>/watch_folder)
    #[arg(long, global = true)]
    watch_dir: Option<PathBuf>,

    /// Destination root (defaults to TROVE_DEST_DIR or <base>/sorted)
    #[arg(long, global = true)]
    dest_dir: Option<PathBuf>,

    /// JSON log file (defaults to TROVE_LOG_FILE or <base>/logs/log.json)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Hash algorithm for log entries
    #[arg(long, global = true, default_value = "sha256")]
    algo: String,

    /// Extra extension mapping, e.g. `--map .heic=images` (repeatable)
    #[arg(long = "map", global = true, value_name = ".EXT=CATEGORY")]
    mappings: Vec<String>,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the watch folder until interrupted
    Watch {
        /// Seconds between polls
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
    },

    /// Sort what is in the watch folder once and exit
    Once,

    /// Create the watch folder, destination tree and log
    Init,

    /// Show recent log entries
    Log {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Print the category each file name would be sorted into
    Classify {
        /// File names to classify
        #[arg(required = true)]
        names: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let output = OutputWriter::new(cli.json);
    match run(cli, &output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output.write_error(&e, 1);
            ExitCode::from(1)
        }
    }
}

/// Diagnostics go to stderr; RUST_LOG overrides the default `info` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli, output: &OutputWriter) -> Result<()> {
    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::Watch { interval } => cmd_watch(config, interval),
        Commands::Once => cmd_once(config, output),
        Commands::Init => cmd_init(config, output),
        Commands::Log { limit } => cmd_log(&config, limit, output),
        Commands::Classify { names } => cmd_classify(&config, &names, output),
    }
}

/// Build the configuration: CLI arg > env var > default under the base dir.
fn resolve_config(cli: &Cli) -> Result<Config> {
    resolve_config_with(cli, env_path)
}

/// [`resolve_config`] with the environment lookup passed in.
fn resolve_config_with(cli: &Cli, env: impl Fn(&str) -> Option<PathBuf>) -> Result<Config> {
    let base = cli
        .base
        .clone()
        .or_else(|| env("TROVE_ROOT"))
        .unwrap_or_else(|| PathBuf::from("."));

    let mut config = Config::with_base(&base);
    if let Some(dir) = cli.watch_dir.clone().or_else(|| env("TROVE_WATCH_DIR")) {
        config = config.watch_dir(dir);
    }
    if let Some(dir) = cli.dest_dir.clone().or_else(|| env("TROVE_DEST_DIR")) {
        config = config.dest_dir(dir);
    }
    if let Some(path) = cli.log_file.clone().or_else(|| env("TROVE_LOG_FILE")) {
        config = config.log_file(path);
    }

    let algorithm = Algorithm::parse(&cli.algo)
        .with_context(|| format!("Unsupported algorithm: {}", cli.algo))?;

    let mut categories = CategoryTable::default();
    for mapping in &cli.mappings {
        categories = categories
            .with_mapping(mapping)
            .with_context(|| format!("Invalid --map value: {}", mapping))?;
    }

    Ok(config.algorithm(algorithm).categories(categories))
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn open_sorter(config: Config) -> Result<Sorter> {
    let watch_dir = config.watch_dir.clone();
    Sorter::from_env(config)
        .with_context(|| format!("Failed to set up sorter for {}", watch_dir.display()))
}

fn cmd_watch(config: Config, interval: u64) -> Result<()> {
    let sorter = open_sorter(config.poll_interval(Duration::from_secs(interval)))?;
    sorter.watch()
}

fn cmd_once(config: Config, output: &OutputWriter) -> Result<()> {
    let sorter = open_sorter(config)?;
    let report = sorter.tick().with_context(|| {
        format!(
            "Failed to list watch folder {}",
            sorter.config().watch_dir.display()
        )
    })?;

    let files: Vec<FileOutcomeInfo> = report.outcomes.iter().map(FileOutcomeInfo::from).collect();
    let data = OnceOutput {
        success: true,
        result_code: 0,
        sorted: report.sorted(),
        unlogged: report.unlogged(),
        skipped: report.skipped(),
        files,
    };

    output.write(&data)
}

fn cmd_init(config: Config, output: &OutputWriter) -> Result<()> {
    let sorter = open_sorter(config)?;
    let config = sorter.config();

    let data = InitOutput {
        success: true,
        result_code: 0,
        watch_dir: config.watch_dir.display().to_string(),
        dest_dir: config.dest_dir.display().to_string(),
        log_file: config.log_file.display().to_string(),
        categories: config
            .categories
            .categories()
            .into_iter()
            .map(String::from)
            .collect(),
    };

    output.write(&data)
}

fn cmd_log(config: &Config, limit: usize, output: &OutputWriter) -> Result<()> {
    // Opening creates an empty log if none exists yet
    let log = LogStore::open(&config.log_file)
        .with_context(|| format!("Failed to open log at {}", config.log_file.display()))?;

    let entries: Vec<LogEntryInfo> = log
        .read_recent(limit)
        .with_context(|| format!("Failed to read log at {}", config.log_file.display()))?
        .into_iter()
        .map(LogEntryInfo::from)
        .collect();

    let data = LogOutput {
        success: true,
        result_code: 0,
        entries,
    };

    output.write(&data)
}

fn cmd_classify(config: &Config, names: &[String], output: &OutputWriter) -> Result<()> {
    let results: Vec<ClassifyInfo> = names
        .iter()
        .map(|name| ClassifyInfo {
            name: name.clone(),
            category: config.categories.classify(name).to_string(),
        })
        .collect();

    let data = ClassifyOutput {
        success: true,
        result_code: 0,
        results,
    };

    output.write(&data)
}
