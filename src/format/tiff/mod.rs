//! TIFF directory parsing.
//!
//! # Key Concepts
//!
//! - **Byte order**: TIFF files declare their endianness (II = little-endian,
//!   MM = big-endian) in the header. All multi-byte values must be read
//!   respecting this order.
//!
//! - **IFD (Image File Directory)**: a sorted list of 12-byte records. IFD0
//!   holds the main image fields and points to the Exif and GPSInfo
//!   sub-directories; IFD1, reached through IFD0's next pointer, usually
//!   describes the thumbnail.
//!
//! - **Inline vs offset values**: small values are stored inside the record,
//!   larger values at an offset the record points to. Which is which is
//!   decided once per record, under the session's [`InlinePolicy`].
//!
//! - **Bounded scans**: records are sorted by tag, so a scan stops as soon as
//!   it has passed the largest wanted tag.

mod directory;
mod parser;
mod session;
mod tags;
mod values;
mod wanted;

pub use directory::IfdScanner;
pub use parser::{
    ByteOrder, IfdEntry, InlinePolicy, Payload, TiffHeader, IFD_ENTRY_SIZE, MAGIC_ORF,
    MAGIC_ORF_SWAPPED, MAGIC_TIFF, MAGIC_TIFF_SWAPPED, TIFF_HEADER_SIZE,
};
pub use session::{Directory, GpsPosition, ParseOptions, ResourceLocator, TiffParser};
pub use tags::{tag_name, FieldType, Group, TagMapping, TiffTag};
pub use values::{SRational, TagValue, URational, ValueReader};
pub use wanted::WantedSet;
