use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// A tool to search, tail, and inspect structured application log files
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory containing the log files
    #[arg(short, long, env = "LOG_DIR", default_value = "logs", global = true)]
    pub dir: PathBuf,

    /// Output format
    #[arg(short = 'F', long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List discovered log files, most recently modified first
    Files {
        /// Keep only files whose name contains this environment token
        #[arg(short, long)]
        env: Option<String>,
    },
    /// Search log entries across all files
    Search {
        /// Case-insensitive substring to look for in messages
        term: Option<String>,

        /// Regex matched against messages (supports the /pattern/flags form)
        #[arg(short, long)]
        regex: Option<String>,

        /// Filter by log level (e.g. "ERROR")
        #[arg(short, long)]
        level: Option<String>,

        /// Filter by channel (e.g. "security")
        #[arg(short, long)]
        channel: Option<String>,

        /// Keep only files whose name contains this environment token
        #[arg(short, long)]
        env: Option<String>,

        /// Context key to inspect
        #[arg(long, requires = "context_value")]
        context_key: Option<String>,

        /// Text the context value must contain
        #[arg(long, requires = "context_key")]
        context_value: Option<String>,

        /// Maximum number of entries to return
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Number of matching entries to skip first
        #[arg(short, long, default_value_t = 0)]
        offset: usize,

        /// Read a single named file instead of the whole directory
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Show the most recent entries from the newest log file
    Tail {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value_t = 50)]
        count: usize,

        /// Keep only entries with this level
        #[arg(short, long)]
        level: Option<String>,

        /// Keep only files whose name contains this environment token
        #[arg(short, long)]
        env: Option<String>,
    },
    /// List the unique channels seen across all log files
    Channels,
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
