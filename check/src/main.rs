use clap::{Parser, Subcommand};
use dm_collector::{
    LogPacketType, REGISTRY,
    collector::{ClassifierStats, PacketClassifier},
    diag::build_log_mask_requests,
    filter::PacketFilter,
    qmdl::QmdlReader,
};
use futures::TryStreamExt;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::{
    path::{Path, PathBuf},
    pin::pin,
};
use tokio::fs::File;
use walkdir::WalkDir;

mod config;
mod error;

use config::{Config, parse_config};
use error::CheckError;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(short, long, global = true, help = "TOML config file")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Only print warnings/errors")]
    quiet: bool,

    #[arg(short, long, global = true, help = "Show debug messages")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every registered packet type
    List {
        #[arg(long, value_enum, default_value = "text", help = "Output format")]
        format: OutputFormat,
    },
    /// Look up a packet type by code (0xb0c0 or 45248) or by name
    Lookup { query: String },
    /// Print the log mask requests that enable the configured packet types
    Mask,
    /// Classify the frames of every QMDL file under a path
    Scan {
        #[arg(short = 'p', long, help = "A QMDL file or a directory of them")]
        path: PathBuf,

        #[arg(long, help = "List the codes of unsupported packets")]
        show_unsupported: bool,

        #[arg(long, value_enum, default_value = "text", help = "Output format")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct ListEntry {
    code: String,
    name: &'static str,
}

#[derive(Serialize)]
struct ScanReport<'a> {
    path: &'a str,
    stats: &'a ClassifierStats,
}

fn parse_code(query: &str) -> Option<u16> {
    match query.strip_prefix("0x").or_else(|| query.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => query.parse().ok(),
    }
}

fn list(format: OutputFormat) -> Result<(), CheckError> {
    for entry in REGISTRY.entries() {
        match format {
            OutputFormat::Text => println!("{:#06x}  {}", entry.code, entry.name),
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string(&ListEntry {
                    code: format!("{:#06x}", entry.code),
                    name: entry.name,
                })?
            ),
        }
    }
    Ok(())
}

fn lookup(query: &str) -> Result<(), CheckError> {
    let found = match parse_code(query) {
        Some(code) => REGISTRY.name_for_code(code).map(|name| (code, name)),
        None => REGISTRY.code_for_name(query).map(|code| (code, query)),
    };
    let Some((code, name)) = found else {
        return Err(CheckError::UnknownPacketType(query.to_string()));
    };
    println!("{code:#06x}  {name}");
    if let Ok(packet_type) = LogPacketType::try_from(code) {
        if let (Some(direction), Some(counterpart)) =
            (packet_type.direction(), packet_type.counterpart())
        {
            info!(
                "{packet_type} carries {direction:?} messages, paired with {counterpart} ({:#06x})",
                counterpart.code()
            );
        }
    }
    Ok(())
}

fn print_mask(config: &Config) -> Result<(), CheckError> {
    let filter = config.packet_filter()?;
    if filter.is_empty() {
        warn!("no packet types enabled, nothing to mask");
    }
    for request in build_log_mask_requests(&filter, config.log_mask_bitsize) {
        debug!("{request:?}");
        let bytes = request.to_hdlc_bytes()?;
        let hex: Vec<String> = bytes.iter().map(|b| format!("{b:02x}")).collect();
        println!("{}", hex.join(" "));
    }
    Ok(())
}

async fn scan_qmdl(
    qmdl_path: &Path,
    filter: PacketFilter,
    show_unsupported: bool,
    format: OutputFormat,
) -> Result<(), CheckError> {
    let path_str = qmdl_path.display().to_string();
    let qmdl_file = File::open(qmdl_path)
        .await
        .map_err(|e| CheckError::QmdlReadError(path_str.clone(), e))?;
    let file_size = qmdl_file
        .metadata()
        .await
        .map_err(|e| CheckError::QmdlReadError(path_str.clone(), e))?
        .len();
    let mut qmdl_reader = QmdlReader::new(qmdl_file, Some(file_size as usize));
    let mut qmdl_stream = pin!(qmdl_reader.as_stream().into_stream());

    let mut classifier = PacketClassifier::new(filter);
    while let Some(frame) = qmdl_stream
        .try_next()
        .await
        .map_err(|e| CheckError::QmdlReadError(path_str.clone(), e))?
    {
        classifier.classify(&frame);
    }
    let stats = classifier.into_stats();

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&ScanReport {
                path: &path_str,
                stats: &stats,
            })?
        ),
        OutputFormat::Text => {
            info!(
                "{path_str}: {} frames, {} accepted, {} filtered, {} unsupported, {} non-log, {} malformed",
                stats.total,
                stats.total_accepted(),
                stats.filtered,
                stats.total_unsupported(),
                stats.not_a_log,
                stats.malformed
            );
            if !stats.accepted.is_empty() {
                info!("{path_str}: accepted packet types:");
                for (packet_type, count) in &stats.accepted {
                    info!("    - {count}: {packet_type} ({:#06x})", packet_type.code());
                }
            }
            if show_unsupported && !stats.unsupported.is_empty() {
                info!("{path_str}: unsupported packet types:");
                for (code, count) in &stats.unsupported {
                    info!("    - {count}: {code:#06x}");
                }
            }
        }
    }
    Ok(())
}

async fn scan(
    path: &Path,
    config: &Config,
    show_unsupported: bool,
    format: OutputFormat,
) -> Result<(), CheckError> {
    let filter = config.packet_filter()?;
    for maybe_entry in WalkDir::new(path) {
        let entry = match maybe_entry {
            Ok(entry) => entry,
            Err(err) => {
                error!("failed to open dir entry: {err}");
                continue;
            }
        };
        let is_qmdl = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == "qmdl");
        if !entry.file_type().is_file() || !is_qmdl {
            continue;
        }
        info!("**** Beginning scan of {}", entry.path().display());
        scan_qmdl(
            entry.path(),
            filter.clone(),
            show_unsupported || config.show_unsupported,
            format,
        )
        .await?;
    }
    Ok(())
}

async fn run(args: Args) -> Result<(), CheckError> {
    let config = parse_config(args.config.as_ref())?;
    match args.command {
        Command::List { format } => list(format),
        Command::Lookup { query } => lookup(&query),
        Command::Mask => print_mask(&config),
        Command::Scan {
            path,
            show_unsupported,
            format,
        } => scan(&path, &config, show_unsupported, format).await,
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let level = if args.debug {
        log::LevelFilter::Debug
    } else if args.quiet {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    };
    if let Err(err) = simple_logger::SimpleLogger::new()
        .with_colors(true)
        .without_timestamps()
        .with_level(level)
        .init()
    {
        eprintln!("failed to initialize logger: {err}");
    }

    if let Err(err) = run(args).await {
        error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_code() {
        assert_eq!(parse_code("0xb0c0"), Some(0xb0c0));
        assert_eq!(parse_code("0XB0C0"), Some(0xb0c0));
        assert_eq!(parse_code("45248"), Some(0xb0c0));
        assert_eq!(parse_code("0x10000"), None);
        assert_eq!(parse_code("LTE_RRC_OTA_Packet"), None);
    }

    #[test]
    fn test_lookup() {
        assert!(lookup("0xb0c0").is_ok());
        assert!(lookup("UMTS_NAS_OTA").is_ok());
        assert!(matches!(
            lookup("0x1234"),
            Err(CheckError::UnknownPacketType(_))
        ));
        assert!(matches!(
            lookup("umts_nas_ota"),
            Err(CheckError::UnknownPacketType(_))
        ));
    }
}
