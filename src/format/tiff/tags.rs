//! TIFF tag, field type and group definitions.
//!
//! This module defines the vocabulary for IFD parsing:
//! - Field types that determine how values are encoded
//! - Tag IDs for the metadata fields the crate knows by name
//! - Groups (IFD0, Exif, GPSInfo) and the tag → group mapping used to route
//!   requests to the right directory
//!
//! The tag list is a convenience, not a limit: any `u16` identifier can be
//! requested, and manufacturer quirks are handled by overriding the mapping.

use std::collections::HashMap;
use std::fmt;

use super::parser::InlinePolicy;

// =============================================================================
// TIFF Field Types
// =============================================================================

/// TIFF field types that determine how values are encoded.
///
/// Each field type has a fixed size in bytes, which determines:
/// - Whether a value fits inline in an IFD entry
/// - How many bytes to read for a value stored at an offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer
    Byte = 1,

    /// 8-bit ASCII character, NUL-terminated
    Ascii = 2,

    /// Unsigned 16-bit integer
    Short = 3,

    /// Unsigned 32-bit integer
    Long = 4,

    /// Two Longs: numerator, denominator
    Rational = 5,

    /// Signed 8-bit integer
    SByte = 6,

    /// Opaque byte data
    Undefined = 7,

    /// Signed 16-bit integer
    SShort = 8,

    /// Signed 32-bit integer
    SLong = 9,

    /// Two SLongs: numerator, denominator
    SRational = 10,

    /// IEEE single precision float
    Float = 11,

    /// IEEE double precision float
    Double = 12,
}

impl FieldType {
    /// Size of a single value of this type in bytes.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::SByte | FieldType::Undefined => 1,
            FieldType::Short | FieldType::SShort => 2,
            FieldType::Long | FieldType::SLong | FieldType::Float => 4,
            FieldType::Rational | FieldType::SRational | FieldType::Double => 8,
        }
    }

    /// Create a FieldType from its numeric value.
    ///
    /// Returns `None` for unknown type values.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(FieldType::Byte),
            2 => Some(FieldType::Ascii),
            3 => Some(FieldType::Short),
            4 => Some(FieldType::Long),
            5 => Some(FieldType::Rational),
            6 => Some(FieldType::SByte),
            7 => Some(FieldType::Undefined),
            8 => Some(FieldType::SShort),
            9 => Some(FieldType::SLong),
            10 => Some(FieldType::SRational),
            11 => Some(FieldType::Float),
            12 => Some(FieldType::Double),
            _ => None,
        }
    }

    /// Get the numeric type code.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Maximum bytes that can be stored inline in a classic TIFF IFD entry.
    pub const INLINE_THRESHOLD: usize = 4;

    /// Check if `count` values of this type live inside the entry's payload.
    ///
    /// Under [`InlinePolicy::Scalar`] only single values narrower than the
    /// payload are inline; strings and rationals are always stored at an
    /// offset. [`InlinePolicy::Packed`] applies the TIFF rule: anything whose
    /// total size fits in 4 bytes is inline.
    #[inline]
    pub fn fits_inline(self, count: u32, policy: InlinePolicy) -> bool {
        match policy {
            InlinePolicy::Scalar => match self {
                FieldType::Ascii | FieldType::Rational | FieldType::SRational => false,
                _ => count == 1 && self.size_in_bytes() <= Self::INLINE_THRESHOLD,
            },
            InlinePolicy::Packed => {
                self.size_in_bytes() as u64 * count as u64 <= Self::INLINE_THRESHOLD as u64
            }
        }
    }

    /// Human-readable name of the type.
    pub const fn name(self) -> &'static str {
        match self {
            FieldType::Byte => "unsigned byte",
            FieldType::Ascii => "string",
            FieldType::Short => "unsigned short",
            FieldType::Long => "unsigned long",
            FieldType::Rational => "unsigned rational",
            FieldType::SByte => "signed byte",
            FieldType::Undefined => "undefined",
            FieldType::SShort => "signed short",
            FieldType::SLong => "signed long",
            FieldType::SRational => "signed rational",
            FieldType::Float => "float",
            FieldType::Double => "double",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Tags
// =============================================================================

/// Tag IDs the crate knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TiffTag {
    // -------------------------------------------------------------------------
    // IFD0
    // -------------------------------------------------------------------------
    /// Image width in pixels
    ImageWidth = 0x0100,

    /// Image height in pixels
    ImageHeight = 0x0101,

    /// Bits per sample, one value per component
    BitsPerSample = 0x0102,

    /// Compression scheme
    Compression = 0x0103,

    /// Free-form description
    ImageDescription = 0x010E,

    /// Camera manufacturer
    Make = 0x010F,

    /// Camera model
    Model = 0x0110,

    /// Offsets of image strips (the full-size preview in CR2 IFD0)
    StripOffsets = 0x0111,

    /// Image orientation
    Orientation = 0x0112,

    /// Byte counts of image strips
    StripByteCounts = 0x0117,

    /// Software used to write the file
    Software = 0x0131,

    /// File modification date/time
    DateTime = 0x0132,

    /// Photographer
    Artist = 0x013B,

    /// Offset of the JPEG thumbnail (in IFD1)
    ThumbnailOffset = 0x0201,

    /// Length of the JPEG thumbnail (in IFD1)
    ThumbnailLength = 0x0202,

    /// Copyright notice
    Copyright = 0x8298,

    /// Pointer to the Exif sub-IFD
    ExifPointer = 0x8769,

    /// Pointer to the GPSInfo sub-IFD
    GpsPointer = 0x8825,

    // -------------------------------------------------------------------------
    // Exif sub-IFD
    // -------------------------------------------------------------------------
    /// Exposure time in seconds
    ExposureTime = 0x829A,

    /// F number
    FNumber = 0x829D,

    /// Exposure program
    ExposureProgram = 0x8822,

    /// ISO speed
    Iso = 0x8827,

    /// Date/time the original image was taken
    DateTimeOriginal = 0x9003,

    /// Date/time the image was digitized
    DateTimeDigitized = 0x9004,

    /// Timezone offset of DateTime
    OffsetTime = 0x9010,

    /// Timezone offset of DateTimeOriginal, e.g. "+02:00"
    OffsetTimeOriginal = 0x9011,

    /// Focal length in millimeters
    FocalLength = 0x920A,

    /// Manufacturer-specific data (opaque)
    MakerNote = 0x927C,

    /// Pointer to the Interoperability sub-IFD
    InteropPointer = 0xA005,

    /// Lens model
    LensModel = 0xA434,

    // -------------------------------------------------------------------------
    // GPSInfo sub-IFD
    // -------------------------------------------------------------------------
    /// "N" or "S"
    GpsLatitudeRef = 0x0001,

    /// Degrees, minutes, seconds as three rationals
    GpsLatitude = 0x0002,

    /// "E" or "W"
    GpsLongitudeRef = 0x0003,

    /// Degrees, minutes, seconds as three rationals
    GpsLongitude = 0x0004,

    /// 0 = above sea level, 1 = below
    GpsAltitudeRef = 0x0005,

    /// Altitude in meters
    GpsAltitude = 0x0006,
}

impl TiffTag {
    /// Every named tag, in declaration order.
    pub const ALL: [TiffTag; 36] = [
        TiffTag::ImageWidth,
        TiffTag::ImageHeight,
        TiffTag::BitsPerSample,
        TiffTag::Compression,
        TiffTag::ImageDescription,
        TiffTag::Make,
        TiffTag::Model,
        TiffTag::StripOffsets,
        TiffTag::Orientation,
        TiffTag::StripByteCounts,
        TiffTag::Software,
        TiffTag::DateTime,
        TiffTag::Artist,
        TiffTag::ThumbnailOffset,
        TiffTag::ThumbnailLength,
        TiffTag::Copyright,
        TiffTag::ExifPointer,
        TiffTag::GpsPointer,
        TiffTag::ExposureTime,
        TiffTag::FNumber,
        TiffTag::ExposureProgram,
        TiffTag::Iso,
        TiffTag::DateTimeOriginal,
        TiffTag::DateTimeDigitized,
        TiffTag::OffsetTime,
        TiffTag::OffsetTimeOriginal,
        TiffTag::FocalLength,
        TiffTag::MakerNote,
        TiffTag::InteropPointer,
        TiffTag::LensModel,
        TiffTag::GpsLatitudeRef,
        TiffTag::GpsLatitude,
        TiffTag::GpsLongitudeRef,
        TiffTag::GpsLongitude,
        TiffTag::GpsAltitudeRef,
        TiffTag::GpsAltitude,
    ];

    /// Get the numeric tag ID.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Name of the tag as used in Exif documentation.
    pub const fn name(self) -> &'static str {
        match self {
            TiffTag::ImageWidth => "ImageWidth",
            TiffTag::ImageHeight => "ImageHeight",
            TiffTag::BitsPerSample => "BitsPerSample",
            TiffTag::Compression => "Compression",
            TiffTag::ImageDescription => "ImageDescription",
            TiffTag::Make => "Make",
            TiffTag::Model => "Model",
            TiffTag::StripOffsets => "StripOffsets",
            TiffTag::Orientation => "Orientation",
            TiffTag::StripByteCounts => "StripByteCounts",
            TiffTag::Software => "Software",
            TiffTag::DateTime => "DateTime",
            TiffTag::Artist => "Artist",
            TiffTag::ThumbnailOffset => "ThumbnailOffset",
            TiffTag::ThumbnailLength => "ThumbnailLength",
            TiffTag::Copyright => "Copyright",
            TiffTag::ExifPointer => "ExifOffset",
            TiffTag::GpsPointer => "GPSInfo",
            TiffTag::ExposureTime => "ExposureTime",
            TiffTag::FNumber => "FNumber",
            TiffTag::ExposureProgram => "ExposureProgram",
            TiffTag::Iso => "ISO",
            TiffTag::DateTimeOriginal => "DateTimeOriginal",
            TiffTag::DateTimeDigitized => "DateTimeDigitized",
            TiffTag::OffsetTime => "OffsetTime",
            TiffTag::OffsetTimeOriginal => "OffsetTimeOriginal",
            TiffTag::FocalLength => "FocalLength",
            TiffTag::MakerNote => "MakerNote",
            TiffTag::InteropPointer => "InteropOffset",
            TiffTag::LensModel => "LensModel",
            TiffTag::GpsLatitudeRef => "GPSLatitudeRef",
            TiffTag::GpsLatitude => "GPSLatitude",
            TiffTag::GpsLongitudeRef => "GPSLongitudeRef",
            TiffTag::GpsLongitude => "GPSLongitude",
            TiffTag::GpsAltitudeRef => "GPSAltitudeRef",
            TiffTag::GpsAltitude => "GPSAltitude",
        }
    }

    /// Look up a named tag by its numeric ID.
    ///
    /// GPS tags share small IDs with nothing else in the list, so the lookup
    /// is unambiguous.
    pub fn from_u16(value: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|tag| tag.as_u16() == value)
    }

    /// Look up a named tag by name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|tag| tag.name().eq_ignore_ascii_case(name))
    }

    /// Group the tag is stored in by default.
    ///
    /// Thumbnail and strip tags belong to IFD1/IFD0 of the root chain and are
    /// reached through [`ResourceLocator`](super::ResourceLocator), not
    /// through the mapping.
    pub const fn default_group(self) -> Option<Group> {
        match self {
            TiffTag::ImageWidth
            | TiffTag::ImageHeight
            | TiffTag::BitsPerSample
            | TiffTag::Compression
            | TiffTag::ImageDescription
            | TiffTag::Make
            | TiffTag::Model
            | TiffTag::Orientation
            | TiffTag::Software
            | TiffTag::DateTime
            | TiffTag::Artist
            | TiffTag::Copyright => Some(Group::Ifd0),

            TiffTag::ExposureTime
            | TiffTag::FNumber
            | TiffTag::ExposureProgram
            | TiffTag::Iso
            | TiffTag::DateTimeOriginal
            | TiffTag::DateTimeDigitized
            | TiffTag::OffsetTime
            | TiffTag::OffsetTimeOriginal
            | TiffTag::FocalLength
            | TiffTag::MakerNote
            | TiffTag::LensModel => Some(Group::Exif),

            TiffTag::GpsLatitudeRef
            | TiffTag::GpsLatitude
            | TiffTag::GpsLongitudeRef
            | TiffTag::GpsLongitude
            | TiffTag::GpsAltitudeRef
            | TiffTag::GpsAltitude => Some(Group::GpsInfo),

            TiffTag::StripOffsets
            | TiffTag::StripByteCounts
            | TiffTag::ThumbnailOffset
            | TiffTag::ThumbnailLength
            | TiffTag::ExifPointer
            | TiffTag::GpsPointer
            | TiffTag::InteropPointer => None,
        }
    }
}

impl From<TiffTag> for u16 {
    fn from(tag: TiffTag) -> u16 {
        tag.as_u16()
    }
}

/// Display name for an arbitrary tag ID.
pub fn tag_name(tag: u16) -> String {
    match TiffTag::from_u16(tag) {
        Some(known) => known.name().to_string(),
        None => format!("0x{tag:04X}"),
    }
}

// =============================================================================
// Groups
// =============================================================================

/// Logical directory a tag lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    /// The root directory (IFD0)
    Ifd0,
    /// The Exif sub-IFD, reached through tag 0x8769
    Exif,
    /// The GPSInfo sub-IFD, reached through tag 0x8825
    GpsInfo,
}

impl Group {
    /// Tag in IFD0 that holds the offset of this group's directory.
    pub const fn pointer_tag(self) -> Option<u16> {
        match self {
            Group::Ifd0 => None,
            Group::Exif => Some(TiffTag::ExifPointer.as_u16()),
            Group::GpsInfo => Some(TiffTag::GpsPointer.as_u16()),
        }
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Group::Ifd0 => "IFD0",
            Group::Exif => "Exif",
            Group::GpsInfo => "GPSInfo",
        }
    }

    /// Parse a group name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ifd0" | "root" => Some(Group::Ifd0),
            "exif" => Some(Group::Exif),
            "gps" | "gpsinfo" => Some(Group::GpsInfo),
            _ => None,
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Tag Mapping
// =============================================================================

/// Tag → group mapping used to route a request to the right directory.
///
/// Built once from the defaults and the caller's overrides; overrides win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMapping {
    groups: HashMap<u16, Group>,
}

impl TagMapping {
    /// Mapping for every named tag that has a default group.
    pub fn defaults() -> Self {
        let groups = TiffTag::ALL
            .iter()
            .filter_map(|tag| tag.default_group().map(|group| (tag.as_u16(), group)))
            .collect();
        Self { groups }
    }

    /// Defaults merged with `overrides`.
    pub fn with_overrides<I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (u16, Group)>,
    {
        let mut mapping = Self::defaults();
        mapping.groups.extend(overrides);
        mapping
    }

    /// Group a tag is mapped to, if any.
    #[inline]
    pub fn group_of(&self, tag: u16) -> Option<Group> {
        self.groups.get(&tag).copied()
    }

    /// Number of mapped tags.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if nothing is mapped.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Default for TagMapping {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Extend<(u16, Group)> for TagMapping {
    fn extend<I: IntoIterator<Item = (u16, Group)>>(&mut self, iter: I) {
        self.groups.extend(iter);
    }
}

// =============================================================================
// Tests
// =============================================================================
