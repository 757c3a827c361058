use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use soundpost_core::{Container, JobMode};

/// Inject or extract `[sound=URL]` audio for imageboard media.
#[derive(Parser, Debug)]
#[clap(name = "soundpost", version)]
pub struct CliArgs {
    /// Configuration file (defaults to $SOUNDPOST_CONFIG, if set).
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[clap(short, long, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download the tagged audio and mux it into the file.
    Inject(JobArgs),
    /// Upload the file's audio and write a silent, re-tagged copy.
    Extract(JobArgs),
    /// Print the effective configuration (secrets redacted) and exit.
    Config,
}

#[derive(Args, Debug)]
pub struct JobArgs {
    /// The video or image to convert.
    pub source: PathBuf,

    /// Output container (defaults to the configured one).
    #[clap(long, value_enum)]
    pub container: Option<ContainerArg>,

    /// Size budget of the extracted video, e.g. 4194304, 4096K or 4M.
    #[clap(long, value_parser = parse_size)]
    pub target_size: Option<u64>,

    /// Delete the source once the output is in place.
    #[clap(long)]
    pub delete_original: bool,

    /// Overwrite an existing output without asking.
    #[clap(short, long, conflicts_with = "no_clobber")]
    pub yes: bool,

    /// Never overwrite an existing output.
    #[clap(short, long)]
    pub no_clobber: bool,

    /// Print the job's metrics in Prometheus text format when done.
    #[clap(long)]
    pub metrics: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerArg {
    Mp4,
    Webm,
}

impl From<ContainerArg> for Container {
    fn from(arg: ContainerArg) -> Self {
        match arg {
            ContainerArg::Mp4 => Container::Mp4,
            ContainerArg::Webm => Container::Webm,
        }
    }
}

impl Command {
    /// Mode and arguments of a job command.
    pub fn job(&self) -> Option<(JobMode, &JobArgs)> {
        match self {
            Command::Inject(args) => Some((JobMode::Inject, args)),
            Command::Extract(args) => Some((JobMode::Extract, args)),
            Command::Config => None,
        }
    }
}

/// Parses a byte count with an optional binary K/M/G suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    let (digits, suffix) = s.split_at(split);
    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid size: {:?}", s))?;

    let multiplier: u64 = match suffix.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" | "KIB" => 1024,
        "M" | "MB" | "MIB" => 1024 * 1024,
        "G" | "GB" | "GIB" => 1024 * 1024 * 1024,
        other => return Err(format!("unknown size suffix: {:?}", other)),
    };

    match value.checked_mul(multiplier) {
        Some(0) | None => Err(format!("size must be positive and fit in 64 bits: {:?}", s)),
        Some(bytes) => Ok(bytes),
    }
}
