mod cli;
mod output;

use anyhow::Result;
use cli::{Cli, Commands, ConfigActions, HistoryActions, OutputFormat, SettingsActions};
use codescan::utils::{format_relative_time, format_timestamp};
use codescan::{
    validate, CodeType, Config, Detection, FeedReader, FileStore, HistoryStore, KeyValueStore,
    MemoryStore, Normalizer, Platform, Replay, ScanOutcome, ScanSession, SettingsStore,
};
use output::{HistoryListResult, ScanReplayResult, SettingsResult};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    let result = match Config::load() {
        Ok(config) => run(cli, config),
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "codescan=debug" } else { "codescan=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

struct Stores {
    platform: Platform,
    history: Arc<HistoryStore>,
    settings: Arc<SettingsStore>,
}

fn open_stores(cli: &Cli, config: &Config) -> Stores {
    let platform = cli.platform.unwrap_or(config.scanner.platform);
    let backend: Arc<dyn KeyValueStore> = if cli.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        let dir = cli.data_dir.clone().unwrap_or_else(|| config.data_dir());
        debug!("using data directory {}", dir.display());
        Arc::new(FileStore::new(dir))
    };

    Stores {
        platform,
        history: Arc::new(HistoryStore::with_max_items(
            backend.clone(),
            config.history.max_items,
        )),
        settings: Arc::new(SettingsStore::new(backend, platform)),
    }
}

fn run(cli: Cli, config: Config) -> Result<ExitCode> {
    let stores = open_stores(&cli, &config);

    match cli.command {
        Commands::Scan {
            input,
            auto_dismiss,
            format,
        } => {
            let reader: Box<dyn BufRead> = match input {
                Some(path) => Box::new(BufReader::new(File::open(path)?)),
                None => Box::new(BufReader::new(io::stdin())),
            };
            tokio::runtime::Runtime::new()
                .map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {}", e))?
                .block_on(run_scan(reader, &stores, &config, auto_dismiss, format))?;
        }
        Commands::Validate {
            code_type,
            value,
            format,
        } => run_validate(&code_type, &value, stores.platform, format)?,
        Commands::History { action } => run_history(action, &stores)?,
        Commands::Settings { action } => run_settings(action, &stores)?,
        Commands::Config { action } => run_config(action, config)?,
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_scan(
    reader: Box<dyn BufRead>,
    stores: &Stores,
    config: &Config,
    auto_dismiss: bool,
    format: OutputFormat,
) -> Result<()> {
    let mut session = ScanSession::new(
        stores.history.clone(),
        stores.settings.clone(),
        tokio::runtime::Handle::current(),
    )
    .with_settle_delay(config.scanner.settle_delay());

    let mut results = Vec::new();
    let replayed = {
        let mut replay = Replay::new(&mut session).auto_dismiss(auto_dismiss);
        let mut failure = None;
        for item in FeedReader::new(reader) {
            let event = match item {
                Ok((_, event)) => event,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            };
            if let Some(outcome) = replay.apply(event) {
                if let OutputFormat::Human = format {
                    print_outcome(&outcome);
                }
                results.push(outcome);
            }
        }
        (replay.summary(), failure)
    };

    session.flush().await;

    let (summary, failure) = replayed;
    if let Some(e) = failure {
        return Err(e.into());
    }

    match format {
        OutputFormat::Json => {
            let report = ScanReplayResult::new(results, summary);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Human => {
            println!();
            println!(
                "Frames: {}, accepted: {}, invalid: {}",
                summary.frames, summary.accepted, summary.invalid
            );
        }
    }

    Ok(())
}

fn print_outcome(outcome: &ScanOutcome) {
    println!("[{}] {}", outcome.code_type.label(), outcome.value);
    match &outcome.validation.error {
        Some(error) => println!("    Invalid: {}", error),
        None => println!("    Valid"),
    }
    if outcome.is_url {
        if let Some(url) = codescan::barcode::open_url(&outcome.value) {
            println!("    Open: {}", url);
        }
    }
}

fn run_validate(
    code_type: &str,
    value: &str,
    platform: Platform,
    format: OutputFormat,
) -> Result<()> {
    let normalizer = Normalizer::new(platform);
    let detection = normalizer.normalize(Detection::new(CodeType::from(code_type), value));
    let validation = validate(&detection.code_type, detection.value());

    let value = detection.value.unwrap_or_default();
    let outcome = ScanOutcome {
        code_type: detection.code_type,
        is_url: codescan::barcode::is_url(&value),
        value,
        validation,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Human => print_outcome(&outcome),
    }

    Ok(())
}

fn run_history(action: HistoryActions, stores: &Stores) -> Result<()> {
    let history = &stores.history;

    match action {
        HistoryActions::List {
            limit,
            search,
            format,
        } => {
            let records = match &search {
                Some(query) => history.search(query),
                None => history.get_history(),
            };
            let total = records.len();
            let shown: Vec<_> = records.into_iter().take(limit).collect();

            match format {
                OutputFormat::Json => {
                    let result = HistoryListResult::new(shown, total, search);
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                OutputFormat::Human => {
                    if shown.is_empty() {
                        println!("No history found.");
                        return Ok(());
                    }

                    println!("Last {} of {} scan(s):\n", shown.len(), total);
                    let now = chrono::Utc::now();
                    for record in shown {
                        println!(
                            "{} [{}] {}",
                            format_timestamp(record.timestamp),
                            record.code_type.label(),
                            record.value
                        );
                        println!(
                            "    {}  id={}",
                            format_relative_time(record.timestamp, now),
                            record.id
                        );
                        if let Some(error) = &record.error {
                            println!("    Invalid: {}", error);
                        }
                    }
                }
            }
        }
        HistoryActions::Count => println!("{}", history.get_history_count()),
        HistoryActions::Delete { id } => {
            history.delete_barcode(&id)?;
            println!("Deleted {}", id);
        }
        HistoryActions::Clear { yes } => {
            if !yes {
                println!(
                    "This removes {} scan(s) from history",
                    history.get_history_count()
                );
                println!("Use --yes to execute");
                return Ok(());
            }
            history.clear_history()?;
            println!("History cleared");
        }
    }

    Ok(())
}

fn run_settings(action: SettingsActions, stores: &Stores) -> Result<()> {
    let settings = &stores.settings;

    match action {
        SettingsActions::Show => {
            let result = SettingsResult::new(stores.platform, settings.get_enabled_types());
            println!("Platform: {}", result.platform);
            println!("Enabled types:");
            for code_type in &result.enabled_types {
                println!("  - {}", code_type);
            }
            if !result.disabled_types.is_empty() {
                println!("Disabled types:");
                for code_type in &result.disabled_types {
                    println!("  - {}", code_type);
                }
            }
        }
        SettingsActions::Enable { code_type } => {
            settings.enable_type(CodeType::from(code_type.as_str()))?;
            println!("Enabled {}", code_type);
        }
        SettingsActions::Disable { code_type } => {
            settings.disable_type(&CodeType::from(code_type.as_str()))?;
            println!("Disabled {}", code_type);
        }
        SettingsActions::EnableAll => {
            settings.enable_all_types()?;
            println!("Enabled all {} supported types", stores.platform);
        }
        SettingsActions::DisableAll => {
            settings.disable_all_types()?;
            println!("Disabled all types");
        }
        SettingsActions::Set { code_types } => {
            let types: Vec<CodeType> = code_types
                .iter()
                .map(|t| CodeType::from(t.as_str()))
                .collect();
            settings.set_enabled_types(&types)?;
            println!("Enabled types set to: {}", code_types.join(", "));
        }
    }

    Ok(())
}

fn run_config(action: ConfigActions, mut config: Config) -> Result<()> {
    match action {
        ConfigActions::Show => {
            println!("Current configuration:");
            println!("  Platform: {}", config.scanner.platform);
            println!("  Settle delay: {}ms", config.scanner.settle_delay_ms);
            println!("  Max history items: {}", config.history.max_items);
            println!("  Data directory: {}", config.data_dir().display());
            println!("  Config file: {}", Config::config_path().display());
        }
        ConfigActions::Set { key, value } => {
            config.set_value(&key, &value)?;
            config.save()?;
            println!("Set {} to {}", key, value);
        }
    }

    Ok(())
}
