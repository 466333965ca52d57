//! TIFF header and directory record parsing.
//!
//! # TIFF Header Structure
//!
//! ```text
//! Bytes 0-1: Byte order (0x4949 = little-endian "II", 0x4D4D = big-endian "MM")
//! Bytes 2-3: Magic number (42, or the ORF variants "RO"/"OR")
//! Bytes 4-7: Offset to first IFD (4 bytes)
//! ```
//!
//! # IFD Entry Structure
//!
//! ```text
//! Bytes 0-1:  Tag ID
//! Bytes 2-3:  Field type
//! Bytes 4-7:  Count (number of values, not bytes)
//! Bytes 8-11: Value if it fits, otherwise offset to the value
//! ```

use crate::error::TiffError;

use super::tags::FieldType;

// =============================================================================
// Constants
// =============================================================================

/// Byte order marker for little-endian files ("II" for Intel)
const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;

/// Byte order marker for big-endian files ("MM" for Motorola)
const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;

/// Standard TIFF magic number
pub const MAGIC_TIFF: u16 = 0x002A;

/// Standard TIFF magic number, byte-swapped
pub const MAGIC_TIFF_SWAPPED: u16 = 0x2A00;

/// Olympus ORF magic number ("RO" stored little-endian)
pub const MAGIC_ORF: u16 = 0x4F52;

/// Olympus ORF magic number, byte-swapped
pub const MAGIC_ORF_SWAPPED: u16 = 0x524F;

/// Size of the classic TIFF header in bytes
pub const TIFF_HEADER_SIZE: usize = 8;

/// Size of one IFD entry in bytes
pub const IFD_ENTRY_SIZE: usize = 12;

/// Size of the entry count at the start of an IFD
pub const IFD_COUNT_SIZE: usize = 2;

/// Size of the next-IFD offset at the end of an IFD
pub const IFD_NEXT_OFFSET_SIZE: usize = 4;

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order (endianness) of a TIFF file.
///
/// TIFF files declare their byte order in the first two bytes of the header.
/// All multi-byte values in the file must be read respecting this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian ("II" = Intel)
    LittleEndian,
    /// Big-endian ("MM" = Motorola)
    BigEndian,
}

impl ByteOrder {
    // Readers use the leading bytes of the slice and panic if it is too short.

    /// Read a u16 from a byte slice using this byte order.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(leading(bytes)),
            ByteOrder::BigEndian => u16::from_be_bytes(leading(bytes)),
        }
    }

    /// Read a u32 from a byte slice using this byte order.
    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(leading(bytes)),
            ByteOrder::BigEndian => u32::from_be_bytes(leading(bytes)),
        }
    }

    /// Read a u64 from a byte slice using this byte order.
    #[inline]
    pub fn read_u64(self, bytes: &[u8]) -> u64 {
        match self {
            ByteOrder::LittleEndian => u64::from_le_bytes(leading(bytes)),
            ByteOrder::BigEndian => u64::from_be_bytes(leading(bytes)),
        }
    }

    /// Encode a u16 using this byte order.
    #[inline]
    pub fn u16_bytes(self, value: u16) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }

    /// Encode a u32 using this byte order.
    #[inline]
    pub fn u32_bytes(self, value: u32) -> [u8; 4] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }
}

/// Copy the first `N` bytes of a slice into an array.
#[inline]
fn leading<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed TIFF file header.
///
/// Created once per parsing session and never modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order for all multi-byte values in the file
    pub byte_order: ByteOrder,

    /// Magic number as read with `byte_order`
    pub magic: u16,

    /// Offset to the first IFD in the file
    pub first_ifd_offset: u64,
}

impl TiffHeader {
    /// Parse a TIFF header from raw bytes.
    ///
    /// # Errors
    /// - `MalformedHeader` if fewer than 8 bytes are given
    /// - `UnknownByteOrder` if bytes 0-1 are not II or MM
    /// - `UnknownMagicNumber` if bytes 2-3 are not an accepted magic number
    pub fn parse(bytes: &[u8]) -> Result<Self, TiffError> {
        if bytes.len() < TIFF_HEADER_SIZE {
            return Err(TiffError::MalformedHeader(format!(
                "need {} bytes, got {}",
                TIFF_HEADER_SIZE,
                bytes.len()
            )));
        }

        // II and MM read the same in either order
        let marker = u16::from_le_bytes([bytes[0], bytes[1]]);
        let byte_order = match marker {
            BYTE_ORDER_LITTLE_ENDIAN => ByteOrder::LittleEndian,
            BYTE_ORDER_BIG_ENDIAN => ByteOrder::BigEndian,
            _ => return Err(TiffError::UnknownByteOrder(marker)),
        };

        let magic = byte_order.read_u16(&bytes[2..4]);
        if !matches!(
            magic,
            MAGIC_TIFF | MAGIC_TIFF_SWAPPED | MAGIC_ORF | MAGIC_ORF_SWAPPED
        ) {
            return Err(TiffError::UnknownMagicNumber(magic));
        }

        let first_ifd_offset = byte_order.read_u32(&bytes[4..8]) as u64;

        Ok(TiffHeader {
            byte_order,
            magic,
            first_ifd_offset,
        })
    }

    /// Check if the magic number is one of the ORF variants.
    #[inline]
    pub const fn is_orf(&self) -> bool {
        matches!(self.magic, MAGIC_ORF | MAGIC_ORF_SWAPPED)
    }
}

// =============================================================================
// IfdEntry
// =============================================================================

/// How the payload of a directory record is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InlinePolicy {
    /// Only single values of at most 4 bytes are inline. Strings and
    /// rationals are always stored at an offset.
    #[default]
    Scalar,

    /// Any value whose total size is at most 4 bytes is inline (the rule of
    /// the TIFF 6.0 specification).
    Packed,
}

/// Where the value of an entry is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// The raw 4 payload bytes hold the value, left-justified.
    Inline([u8; 4]),
    /// The value starts at this absolute offset in the source.
    External(u32),
}

/// A single directory record.
///
/// The inline/external decision is taken once, when the record is decoded,
/// and carried in [`Payload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfdEntry {
    /// Tag ID
    pub tag_id: u16,

    /// Parsed field type, `None` for unknown type codes
    pub field_type: Option<FieldType>,

    /// Raw field type code
    pub field_type_raw: u16,

    /// Number of values (not bytes)
    pub count: u32,

    /// Inline value or offset to the value
    pub payload: Payload,
}

impl IfdEntry {
    /// Decode a 12-byte directory record.
    ///
    /// # Panics
    /// Panics if `bytes` is shorter than [`IFD_ENTRY_SIZE`].
    pub fn parse(bytes: &[u8], byte_order: ByteOrder, policy: InlinePolicy) -> Self {
        let tag_id = byte_order.read_u16(&bytes[0..2]);
        let field_type_raw = byte_order.read_u16(&bytes[2..4]);
        let count = byte_order.read_u32(&bytes[4..8]);
        let field_type = FieldType::from_u16(field_type_raw);

        let raw = [bytes[8], bytes[9], bytes[10], bytes[11]];
        let payload = match field_type {
            Some(ft) if ft.fits_inline(count, policy) => Payload::Inline(raw),
            _ => Payload::External(byte_order.read_u32(&raw)),
        };

        IfdEntry {
            tag_id,
            field_type,
            field_type_raw,
            count,
            payload,
        }
    }

    /// Check if the value is stored inside the record.
    #[inline]
    pub fn is_inline(&self) -> bool {
        matches!(self.payload, Payload::Inline(_))
    }

    /// Offset of the value, if stored externally.
    #[inline]
    pub fn value_offset(&self) -> Option<u32> {
        match self.payload {
            Payload::External(offset) => Some(offset),
            Payload::Inline(_) => None,
        }
    }

    /// The 4 payload bytes exactly as stored in the record.
    ///
    /// External payloads were decoded as an offset; re-encoding it in the
    /// same byte order gives back the original bytes.
    pub fn raw_payload(&self, byte_order: ByteOrder) -> [u8; 4] {
        match self.payload {
            Payload::Inline(raw) => raw,
            Payload::External(offset) => byte_order.u32_bytes(offset),
        }
    }

    /// Total size of the value in bytes, `None` for unknown types.
    pub fn value_byte_size(&self) -> Option<u64> {
        self.field_type
            .map(|ft| ft.size_in_bytes() as u64 * self.count as u64)
    }

    /// Name of the entry's type, for error messages.
    pub fn type_name(&self) -> String {
        match self.field_type {
            Some(ft) => ft.name().to_string(),
            None => format!("unknown type {}", self.field_type_raw),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
