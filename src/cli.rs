//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, init, validate), and their associated argument
//! structs. Every tuning flag has an environment variable equivalent for
//! scheduled CI runs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "infraharvest",
    version,
    about = "Resilient multi-endpoint fetcher for public infrastructure datasets",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        infraharvest init                     Create a starter job file\n  \
        infraharvest run                      Run every job in ./infraharvest.yaml\n  \
        infraharvest run --only osm-power     Run a single job"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every configured dataset
    Run(Box<RunArgs>),

    /// Generate a starter job file
    Init(InitArgs),

    /// Validate a job file without fetching anything
    Validate(ValidateArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        infraharvest run                                   Auto-detect job file\n  \
        infraharvest run -c jobs.yaml                      Specific job file\n  \
        infraharvest run --only cables --concurrency 10    One job, gentler fan-out")]
pub struct RunArgs {
    /// Job file path (.yaml, .json, .toml)
    #[arg(short, long, env = "INFRAHARVEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run only the named job (repeatable)
    #[arg(long = "only", value_name = "JOB")]
    pub only: Vec<String>,

    /// Output directory (overrides the job file)
    #[arg(short, long, env = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    // -- Tuning --
    /// Attempts per endpoint before failing over
    #[arg(long, env = "MAX_RETRIES", help_heading = "Tuning")]
    pub max_retries: Option<u32>,

    /// Maximum in-flight detail lookups during enrichment
    #[arg(long, env = "CONCURRENCY_LIMIT", help_heading = "Tuning")]
    pub concurrency: Option<usize>,

    /// Per-attempt timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", help_heading = "Tuning")]
    pub timeout: Option<u64>,
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        infraharvest init                          Starter job file (yaml)\n  \
        infraharvest init -f toml -o jobs.toml     TOML format")]
pub struct InitArgs {
    /// Output format
    #[arg(short, long, default_value = "yaml")]
    pub format: ConfigFormat,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Job file to validate
    #[arg(default_value = "infraharvest.yaml")]
    pub config: PathBuf,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ValidateFormat,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ValidateFormat {
    Text,
    Json,
}
