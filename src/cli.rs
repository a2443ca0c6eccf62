use clap::{Parser, Subcommand, ValueEnum};
use codescan::Platform;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codescan")]
#[command(about = "Barcode scan history and scanner settings", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Override the configured platform")]
    pub platform: Option<Platform>,
    #[arg(long, global = true, help = "Override the storage directory")]
    pub data_dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Keep history and settings in memory only")]
    pub ephemeral: bool,
    #[arg(long, global = true, help = "Enable debug logging")]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Replay a detector feed through a scan session")]
    Scan {
        #[arg(short, long, help = "JSON-lines feed file (stdin if omitted)")]
        input: Option<PathBuf>,
        #[arg(long, help = "Dismiss each result as soon as it is shown")]
        auto_dismiss: bool,
        #[arg(short = 'F', long, default_value = "human")]
        format: OutputFormat,
    },
    #[command(about = "Normalize and validate a single code")]
    Validate {
        #[arg(short = 't', long = "type")]
        code_type: String,
        #[arg(short, long)]
        value: String,
        #[arg(short = 'F', long, default_value = "human")]
        format: OutputFormat,
    },
    #[command(about = "Browse and manage scan history")]
    History {
        #[command(subcommand)]
        action: HistoryActions,
    },
    #[command(about = "Manage enabled code types")]
    Settings {
        #[command(subcommand)]
        action: SettingsActions,
    },
    #[command(about = "Manage configuration")]
    Config {
        #[command(subcommand)]
        action: ConfigActions,
    },
}

#[derive(Subcommand)]
pub enum HistoryActions {
    #[command(about = "List scans, most recent first")]
    List {
        #[arg(short, long, default_value = "20")]
        limit: usize,
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short = 'F', long, default_value = "human")]
        format: OutputFormat,
    },
    #[command(about = "Show the number of stored scans")]
    Count,
    #[command(about = "Delete one scan")]
    Delete {
        #[arg(long)]
        id: String,
    },
    #[command(about = "Delete all scans")]
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum SettingsActions {
    #[command(about = "Show enabled code types")]
    Show,
    #[command(about = "Enable one code type")]
    Enable { code_type: String },
    #[command(about = "Disable one code type")]
    Disable { code_type: String },
    #[command(about = "Enable every supported code type")]
    EnableAll,
    #[command(about = "Disable every code type")]
    DisableAll,
    #[command(about = "Replace the enabled code types")]
    Set {
        #[arg(required = true)]
        code_types: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigActions {
    #[command(about = "Show current configuration")]
    Show,
    #[command(about = "Set a configuration value")]
    Set {
        #[arg(short, long)]
        key: String,
        #[arg(short, long)]
        value: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}
