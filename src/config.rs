//! Command-line configuration for tiff-meta.
//!
//! This module provides the CLI definition:
//! - Subcommands and arguments via clap
//! - Environment variables with `TIFF_META_` prefix
//! - Tag identifiers accepted as decimal, `0x`-hex or a known tag name
//!
//! # Environment Variables
//!
//! - `TIFF_META_VERBOSE` - Enable debug logging (default: false)
//! - `TIFF_META_PACKED` - Use the packed inline policy (default: false)
//! - `TIFF_META_JSON` - Print JSON instead of text (default: false)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::format::tiff::{Group, InlinePolicy, ParseOptions, ResourceLocator, TiffTag};

// =============================================================================
// CLI Arguments
// =============================================================================

/// tiff-meta - Read metadata from TIFF, CR2 and ORF files.
///
/// Only the directory records needed for the requested fields are read.
#[derive(Parser, Debug, Clone)]
#[command(name = "tiff-meta")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false, env = "TIFF_META_VERBOSE")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print selected tags from IFD0, Exif and GPSInfo.
    Show(ShowConfig),

    /// Print every entry of every reachable directory.
    Dump(DumpConfig),

    /// Extract the embedded thumbnail (or another offset/length resource).
    Thumbnail(ThumbnailConfig),
}

impl Command {
    /// Validate the selected subcommand's configuration.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Command::Show(config) => config.validate(),
            Command::Dump(_) => Ok(()),
            Command::Thumbnail(config) => config.validate(),
        }
    }
}

// =============================================================================
// Show
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ShowConfig {
    /// File to read.
    pub file: PathBuf,

    /// Tag to show (decimal, 0x-hex or name). Repeatable.
    ///
    /// Defaults to every named tag of IFD0, Exif and GPSInfo; directories
    /// the file does not have are skipped.
    #[arg(short, long = "tag", value_parser = parse_tag)]
    pub tags: Vec<u16>,

    /// Route a tag to a directory, as ID=GROUP (GROUP: ifd0, exif, gps).
    #[arg(long = "map", value_parser = parse_mapping)]
    pub mappings: Vec<(u16, Group)>,

    /// Treat any value of at most 4 bytes as inline.
    #[arg(long, default_value_t = false, env = "TIFF_META_PACKED")]
    pub packed: bool,

    /// Print JSON instead of text.
    #[arg(long, default_value_t = false, env = "TIFF_META_JSON")]
    pub json: bool,
}

impl ShowConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        let pointers = [TiffTag::ExifPointer.as_u16(), TiffTag::GpsPointer.as_u16()];
        if let Some((tag, _)) = self.mappings.iter().find(|(tag, _)| pointers.contains(tag)) {
            return Err(format!(
                "tag 0x{tag:04X} is a sub-directory pointer and cannot be remapped"
            ));
        }
        Ok(())
    }

    /// Session options built from the flags.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::default()
            .with_mapping(self.mappings.iter().copied())
            .with_inline_policy(inline_policy(self.packed))
    }

    /// Tags to request: the explicit list, or every named tag with a
    /// default group plus the remapped ones.
    pub fn requested_tags(&self) -> Vec<u16> {
        if !self.tags.is_empty() {
            return self.tags.clone();
        }
        let mut tags: Vec<u16> = TiffTag::ALL
            .iter()
            .filter(|tag| tag.default_group().is_some())
            .map(|tag| tag.as_u16())
            .chain(self.mappings.iter().map(|(tag, _)| *tag))
            .collect();
        tags.sort_unstable();
        tags.dedup();
        tags
    }
}

// =============================================================================
// Dump
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct DumpConfig {
    /// File to read.
    pub file: PathBuf,

    /// Treat any value of at most 4 bytes as inline.
    #[arg(long, default_value_t = false, env = "TIFF_META_PACKED")]
    pub packed: bool,

    /// Print JSON instead of text.
    #[arg(long, default_value_t = false, env = "TIFF_META_JSON")]
    pub json: bool,
}

impl DumpConfig {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::default().with_inline_policy(inline_policy(self.packed))
    }
}

// =============================================================================
// Thumbnail
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ThumbnailConfig {
    /// File to read.
    pub file: PathBuf,

    /// Where to write the extracted bytes.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Index of the directory in the root chain (0 = IFD0).
    #[arg(long, default_value_t = 1)]
    pub directory: usize,

    /// Tag holding the resource offset.
    #[arg(long, value_parser = parse_tag, default_value = "0x0201")]
    pub offset_tag: u16,

    /// Tag holding the resource length.
    #[arg(long, value_parser = parse_tag, default_value = "0x0202")]
    pub length_tag: u16,
}

impl ThumbnailConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.offset_tag == self.length_tag {
            return Err("offset and length tags must differ".to_string());
        }
        if self.output == self.file {
            return Err("output would overwrite the input file".to_string());
        }
        Ok(())
    }

    pub fn locator(&self) -> ResourceLocator {
        ResourceLocator::new(self.directory, self.offset_tag, self.length_tag)
    }
}

// =============================================================================
// Value Parsers
// =============================================================================

fn inline_policy(packed: bool) -> InlinePolicy {
    if packed {
        InlinePolicy::Packed
    } else {
        InlinePolicy::Scalar
    }
}

/// Parse a tag identifier: decimal, `0x`-hex, or a known tag name.
pub fn parse_tag(s: &str) -> Result<u16, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u16::from_str_radix(hex, 16).map_err(|e| format!("invalid hex tag '{s}': {e}"));
    }
    if s.chars().all(|c| c.is_ascii_digit()) && !s.is_empty() {
        return s.parse().map_err(|e| format!("invalid tag '{s}': {e}"));
    }
    TiffTag::from_name(s)
        .map(TiffTag::as_u16)
        .ok_or_else(|| format!("unknown tag name '{s}'"))
}

/// Parse an `ID=GROUP` mapping override.
pub fn parse_mapping(s: &str) -> Result<(u16, Group), String> {
    let (tag, group) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=GROUP, got '{s}'"))?;
    let tag = parse_tag(tag)?;
    let group = Group::from_name(group.trim())
        .ok_or_else(|| format!("unknown group '{}' (expected ifd0, exif or gps)", group.trim()))?;
    Ok((tag, group))
}

// =============================================================================
// Tests
// =============================================================================
