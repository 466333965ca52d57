//! # tiff-meta
//!
//! Selective metadata extraction from TIFF-family files (plain TIFF, Canon
//! CR2, Olympus ORF).
//!
//! The parser reads only what a query needs: the 8-byte header once, then
//! the directory records up to the largest wanted tag, then the values of
//! the matched records. Directories with thousands of entries cost a handful
//! of 12-byte reads when the caller only wants the image size.
//!
//! ## Features
//!
//! - **Bounded directory scans**: stop as soon as no wanted tag can follow
//! - **Sub-directory routing**: Exif and GPSInfo tags are found through the
//!   pointers in IFD0, driven by a configurable tag → group mapping
//! - **Typed values**: strings, integers, rationals and floats, with type
//!   checks on every accessor
//! - **Resources**: embedded thumbnails and other offset/length byte ranges
//!
//! ## Architecture
//!
//! - [`io`] - Positioned reads over files and in-memory buffers
//! - [`mod@format`] - Header, directory and value decoding
//! - [`config`] - CLI types
//!
//! ## Example
//!
//! ```rust,no_run
//! use tiff_meta::{SeekReader, TiffParser, TiffTag};
//!
//! let mut parser = TiffParser::new(SeekReader::open("image.orf")?)?;
//! let entries = parser.parse([TiffTag::Make, TiffTag::DateTimeOriginal])?;
//!
//! if let Some(make) = entries.get(&TiffTag::Make.as_u16()) {
//!     println!("make: {}", parser.read_string(make)?);
//! }
//! let thumbnail = parser.read_thumbnail()?;
//! println!("thumbnail: {} bytes", thumbnail.len());
//! # Ok::<(), tiff_meta::TiffError>(())
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod io;

// Re-export commonly used types
pub use error::{IoError, TiffError};
pub use format::tiff::{
    tag_name, ByteOrder, Directory, FieldType, GpsPosition, Group, IfdEntry, IfdScanner,
    InlinePolicy, ParseOptions, Payload, ResourceLocator, SRational, TagMapping, TagValue,
    TiffHeader, TiffParser, TiffTag, URational, ValueReader, WantedSet, TIFF_HEADER_SIZE,
};
pub use format::{is_tiff_header, ContainerKind};
pub use io::{RangeReader, SeekReader};
