//! tiff-meta - Read metadata from TIFF-family files.
//!
//! This binary wires the CLI to the parser and prints the results.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiff_meta::{
    config::{Cli, Command, DumpConfig, ShowConfig, ThumbnailConfig},
    format::jpeg,
    tag_name, ParseOptions, SeekReader, TagValue, TiffError, TiffParser,
};

type FileParser = TiffParser<SeekReader<BufReader<File>>>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = cli.command.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    match cli.command {
        Command::Show(config) => run_show(config),
        Command::Dump(config) => run_dump(config),
        Command::Thumbnail(config) => run_thumbnail(config),
    }
}

/// Initialize the tracing/logging subsystem.
///
/// Logs go to stderr so that stdout stays clean for JSON output.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tiff_meta=debug"
    } else {
        "tiff_meta=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open(path: &Path, options: ParseOptions) -> Result<FileParser, TiffError> {
    let reader = SeekReader::open(path)?;
    TiffParser::with_options(reader, options)
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to serialize output: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Show Command
// =============================================================================

#[derive(Serialize)]
struct ShownTag {
    tag: u16,
    name: String,
    #[serde(flatten)]
    value: TagValue,
}

#[derive(Serialize)]
struct ShowOutput {
    container: &'static str,
    tags: Vec<ShownTag>,
}

fn run_show(config: ShowConfig) -> ExitCode {
    let mut parser = match open(&config.file, config.parse_options()) {
        Ok(parser) => parser,
        Err(e) => {
            error!("Failed to open {}: {}", config.file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let container = match parser.container_kind() {
        Ok(kind) => kind,
        Err(e) => {
            error!("Failed to read {}: {}", config.file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    // The default selection spans every group; most files lack GPSInfo
    let wanted = config.requested_tags();
    let result = if config.tags.is_empty() {
        parser.parse_available(wanted.iter().copied())
    } else {
        parser.parse(wanted.iter().copied())
    };
    let entries = match result {
        Ok(entries) => entries,
        Err(e) => {
            error!("Failed to parse {}: {}", config.file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let mut tags = Vec::with_capacity(entries.len());
    for tag in wanted {
        let Some(entry) = entries.get(&tag) else {
            continue;
        };
        match parser.read_value(entry) {
            Ok(value) => tags.push(ShownTag {
                tag,
                name: tag_name(tag),
                value,
            }),
            Err(e) => warn!("Skipping {}: {}", tag_name(tag), e),
        }
    }

    let output = ShowOutput {
        container: container.name(),
        tags,
    };

    if config.json {
        return print_json(&output);
    }

    println!("{} ({})", config.file.display(), output.container);
    for shown in &output.tags {
        println!("  {:<20} {}", shown.name, shown.value);
    }
    ExitCode::SUCCESS
}

// =============================================================================
// Dump Command
// =============================================================================

#[derive(Serialize)]
struct DumpEntry {
    tag: u16,
    name: String,
    #[serde(rename = "type")]
    field_type: String,
    count: u32,
    value: Option<TagValue>,
}

#[derive(Serialize)]
struct DumpDirectory {
    label: String,
    offset: u64,
    entries: Vec<DumpEntry>,
}

fn run_dump(config: DumpConfig) -> ExitCode {
    let mut parser = match open(&config.file, config.parse_options()) {
        Ok(parser) => parser,
        Err(e) => {
            error!("Failed to open {}: {}", config.file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let directories = match parser.walk() {
        Ok(directories) => directories,
        Err(e) => {
            error!("Failed to walk {}: {}", config.file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let mut dumped = Vec::with_capacity(directories.len());
    for directory in directories {
        let mut entries = Vec::with_capacity(directory.entries.len());
        for entry in &directory.entries {
            let value = match parser.read_value(entry) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("{} 0x{:04X}: {}", directory.label, entry.tag_id, e);
                    None
                }
            };
            entries.push(DumpEntry {
                tag: entry.tag_id,
                name: tag_name(entry.tag_id),
                field_type: entry.type_name(),
                count: entry.count,
                value,
            });
        }
        dumped.push(DumpDirectory {
            label: directory.label,
            offset: directory.offset,
            entries,
        });
    }

    if config.json {
        return print_json(&dumped);
    }

    for directory in &dumped {
        println!(
            "{} @ {} ({} entries)",
            directory.label,
            directory.offset,
            directory.entries.len()
        );
        for entry in &directory.entries {
            let value = entry
                .value
                .as_ref()
                .map_or_else(|| "<unreadable>".to_string(), ToString::to_string);
            println!(
                "  0x{:04X} {:<24} {:<18} {:>6}  {}",
                entry.tag, entry.name, entry.field_type, entry.count, value
            );
        }
    }
    ExitCode::SUCCESS
}

// =============================================================================
// Thumbnail Command
// =============================================================================

fn run_thumbnail(config: ThumbnailConfig) -> ExitCode {
    let mut parser = match open(&config.file, ParseOptions::default()) {
        Ok(parser) => parser,
        Err(e) => {
            error!("Failed to open {}: {}", config.file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let data = match parser.read_resource(config.locator()) {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to extract resource: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if !jpeg::is_jpeg_start(&data) {
        warn!("Resource does not start with a JPEG SOI marker; writing raw bytes");
    }
    let data = jpeg::trim_padding(data);

    if let Err(e) = std::fs::write(&config.output, &data) {
        error!("Failed to write {}: {}", config.output.display(), e);
        return ExitCode::FAILURE;
    }

    info!("Wrote {} bytes to {}", data.len(), config.output.display());
    ExitCode::SUCCESS
}
