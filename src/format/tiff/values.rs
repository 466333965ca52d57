//! TIFF tag value reading.
//!
//! A directory record only says *where* its value is: inline in the 4-byte
//! payload, or at an absolute offset (see [`Payload`]). This module turns a
//! record into a typed value, issuing one positioned read for external
//! values.
//!
//! Each typed accessor checks the entry's datatype first and fails with
//! `TypeMismatch` rather than coercing; scalar accessors also require a
//! count of exactly one.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{ByteOrder, IfdEntry, Payload};
use super::tags::FieldType;

// =============================================================================
// Value Types
// =============================================================================

/// Unsigned rational: numerator / denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct URational {
    pub numerator: u32,
    pub denominator: u32,
}

impl URational {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Value as a float; `None` for a zero denominator.
    pub fn to_f64(self) -> Option<f64> {
        (self.denominator != 0).then(|| self.numerator as f64 / self.denominator as f64)
    }
}

impl fmt::Display for URational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

/// Signed rational: numerator / denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SRational {
    pub numerator: i32,
    pub denominator: i32,
}

impl SRational {
    pub const fn new(numerator: i32, denominator: i32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Value as a float; `None` for a zero denominator.
    pub fn to_f64(self) -> Option<f64> {
        (self.denominator != 0).then(|| self.numerator as f64 / self.denominator as f64)
    }
}

impl fmt::Display for SRational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

/// A decoded entry value, one variant per field type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum TagValue {
    Byte(Vec<u8>),
    Ascii(String),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<URational>),
    SByte(Vec<i8>),
    #[serde(serialize_with = "serialize_bytes")]
    Undefined(Bytes),
    SShort(Vec<i16>),
    SLong(Vec<i32>),
    SRational(Vec<SRational>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

fn serialize_bytes<S: serde::Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(bytes.iter())
}

impl TagValue {
    /// Field type this value was decoded from.
    pub fn field_type(&self) -> FieldType {
        match self {
            TagValue::Byte(_) => FieldType::Byte,
            TagValue::Ascii(_) => FieldType::Ascii,
            TagValue::Short(_) => FieldType::Short,
            TagValue::Long(_) => FieldType::Long,
            TagValue::Rational(_) => FieldType::Rational,
            TagValue::SByte(_) => FieldType::SByte,
            TagValue::Undefined(_) => FieldType::Undefined,
            TagValue::SShort(_) => FieldType::SShort,
            TagValue::SLong(_) => FieldType::SLong,
            TagValue::SRational(_) => FieldType::SRational,
            TagValue::Float(_) => FieldType::Float,
            TagValue::Double(_) => FieldType::Double,
        }
    }
}

/// Write one value bare, several as `[a, b, c]`.
fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T]) -> fmt::Result {
    if let [single] = values {
        return write!(f, "{single}");
    }
    f.write_str("[")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{value}")?;
    }
    f.write_str("]")
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Byte(v) => write_list(f, v),
            TagValue::Ascii(s) => write!(f, "{s:?}"),
            TagValue::Short(v) => write_list(f, v),
            TagValue::Long(v) => write_list(f, v),
            TagValue::Rational(v) => write_list(f, v),
            TagValue::SByte(v) => write_list(f, v),
            TagValue::Undefined(b) => write!(f, "<{} bytes>", b.len()),
            TagValue::SShort(v) => write_list(f, v),
            TagValue::SLong(v) => write_list(f, v),
            TagValue::SRational(v) => write_list(f, v),
            TagValue::Float(v) => write_list(f, v),
            TagValue::Double(v) => write_list(f, v),
        }
    }
}

// =============================================================================
// ValueReader
// =============================================================================

/// Reads entry values from a source in a given byte order.
pub struct ValueReader<'a, R: RangeReader> {
    reader: &'a mut R,
    byte_order: ByteOrder,
}

impl<'a, R: RangeReader> ValueReader<'a, R> {
    /// Create a new ValueReader.
    pub fn new(reader: &'a mut R, byte_order: ByteOrder) -> Self {
        Self { reader, byte_order }
    }

    /// Raw bytes of an entry's value.
    ///
    /// For inline values, returns the leading bytes of the payload.
    /// For external values, fetches `count * size` bytes from the source.
    pub fn read_bytes(&mut self, entry: &IfdEntry) -> Result<Bytes, TiffError> {
        let size = entry
            .value_byte_size()
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        match entry.payload {
            Payload::Inline(raw) => Ok(Bytes::copy_from_slice(&raw[..size as usize])),
            Payload::External(offset) => {
                let len = usize::try_from(size).map_err(|_| TiffError::LengthMismatch {
                    tag: entry.tag_id,
                    count: entry.count,
                })?;
                Ok(self.reader.read_exact_at(offset as u64, len)?)
            }
        }
    }

    /// Decode an entry into the [`TagValue`] variant matching its type.
    pub fn read_value(&mut self, entry: &IfdEntry) -> Result<TagValue, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;
        let bytes = self.read_bytes(entry)?;
        let order = self.byte_order;

        let value = match field_type {
            FieldType::Byte => TagValue::Byte(bytes.to_vec()),
            FieldType::Ascii => TagValue::Ascii(decode_ascii(&bytes)),
            FieldType::Short => TagValue::Short(decode_u16s(&bytes, order)),
            FieldType::Long => TagValue::Long(decode_u32s(&bytes, order)),
            FieldType::Rational => TagValue::Rational(decode_urationals(&bytes, order)),
            FieldType::SByte => TagValue::SByte(bytes.iter().map(|&b| b as i8).collect()),
            FieldType::Undefined => TagValue::Undefined(bytes),
            FieldType::SShort => TagValue::SShort(
                decode_u16s(&bytes, order).into_iter().map(|v| v as i16).collect(),
            ),
            FieldType::SLong => TagValue::SLong(
                decode_u32s(&bytes, order).into_iter().map(|v| v as i32).collect(),
            ),
            FieldType::SRational => TagValue::SRational(decode_srationals(&bytes, order)),
            FieldType::Float => TagValue::Float(decode_f32s(&bytes, order)),
            FieldType::Double => TagValue::Double(decode_f64s(&bytes, order)),
        };

        Ok(value)
    }

    // -------------------------------------------------------------------------
    // Typed accessors
    // -------------------------------------------------------------------------

    /// Read a string (ASCII type), dropping one trailing NUL.
    pub fn read_string(&mut self, entry: &IfdEntry) -> Result<String, TiffError> {
        expect_type(entry, FieldType::Ascii)?;
        let bytes = self.read_bytes(entry)?;
        Ok(decode_ascii(&bytes))
    }

    /// Read a string of at most 4 bytes from the record itself.
    ///
    /// Reference fields such as GPSLatitudeRef ("N\0") always sit in the
    /// payload, whatever the session's inline policy says about strings.
    /// Longer strings are read like [`read_string`](Self::read_string).
    pub fn read_short_string(&mut self, entry: &IfdEntry) -> Result<String, TiffError> {
        expect_type(entry, FieldType::Ascii)?;
        if entry.count > 4 {
            return self.read_string(entry);
        }
        let raw = entry.raw_payload(self.byte_order);
        Ok(decode_ascii(&raw[..entry.count as usize]))
    }

    /// Read a single unsigned byte.
    pub fn read_u8(&mut self, entry: &IfdEntry) -> Result<u8, TiffError> {
        expect_scalar(entry, FieldType::Byte)?;
        Ok(self.read_bytes(entry)?[0])
    }

    /// Read unsigned bytes.
    pub fn read_u8s(&mut self, entry: &IfdEntry) -> Result<Vec<u8>, TiffError> {
        expect_type(entry, FieldType::Byte)?;
        Ok(self.read_bytes(entry)?.to_vec())
    }

    /// Read a single unsigned 16-bit value.
    pub fn read_u16(&mut self, entry: &IfdEntry) -> Result<u16, TiffError> {
        expect_scalar(entry, FieldType::Short)?;
        let bytes = self.read_bytes(entry)?;
        Ok(self.byte_order.read_u16(&bytes))
    }

    /// Read unsigned 16-bit values.
    pub fn read_u16s(&mut self, entry: &IfdEntry) -> Result<Vec<u16>, TiffError> {
        expect_type(entry, FieldType::Short)?;
        let bytes = self.read_bytes(entry)?;
        Ok(decode_u16s(&bytes, self.byte_order))
    }

    /// Read a single unsigned 32-bit value.
    pub fn read_u32(&mut self, entry: &IfdEntry) -> Result<u32, TiffError> {
        expect_scalar(entry, FieldType::Long)?;
        let bytes = self.read_bytes(entry)?;
        Ok(self.byte_order.read_u32(&bytes))
    }

    /// Read unsigned 32-bit values.
    pub fn read_u32s(&mut self, entry: &IfdEntry) -> Result<Vec<u32>, TiffError> {
        expect_type(entry, FieldType::Long)?;
        let bytes = self.read_bytes(entry)?;
        Ok(decode_u32s(&bytes, self.byte_order))
    }

    /// Read a single Short or Long, widened to u32.
    ///
    /// Offsets and lengths are written as either type depending on the
    /// manufacturer.
    pub fn read_unsigned(&mut self, entry: &IfdEntry) -> Result<u32, TiffError> {
        match entry.field_type {
            Some(FieldType::Short) => self.read_u16(entry).map(u32::from),
            Some(FieldType::Long) => self.read_u32(entry),
            _ => Err(TiffError::TypeMismatch {
                tag: entry.tag_id,
                expected: "unsigned short or unsigned long",
                actual: entry.type_name(),
            }),
        }
    }

    /// Read a sub-directory offset from a pointer entry.
    ///
    /// Accepts a Short or Long scalar, and also the IFD type (13) or any
    /// other unknown type with a count of 1, whose 4 payload bytes are the
    /// offset.
    pub fn read_offset(&mut self, entry: &IfdEntry) -> Result<u32, TiffError> {
        match entry.field_type {
            None if entry.count == 1 => {
                Ok(self.byte_order.read_u32(&entry.raw_payload(self.byte_order)))
            }
            _ => self.read_unsigned(entry),
        }
    }

    /// Read a single unsigned rational.
    pub fn read_urational(&mut self, entry: &IfdEntry) -> Result<URational, TiffError> {
        expect_scalar(entry, FieldType::Rational)?;
        let bytes = self.read_bytes(entry)?;
        Ok(URational::new(
            self.byte_order.read_u32(&bytes[0..4]),
            self.byte_order.read_u32(&bytes[4..8]),
        ))
    }

    /// Read unsigned rationals.
    pub fn read_urationals(&mut self, entry: &IfdEntry) -> Result<Vec<URational>, TiffError> {
        expect_type(entry, FieldType::Rational)?;
        let bytes = self.read_bytes(entry)?;
        Ok(decode_urationals(&bytes, self.byte_order))
    }

    /// Read signed bytes.
    pub fn read_i8s(&mut self, entry: &IfdEntry) -> Result<Vec<i8>, TiffError> {
        expect_type(entry, FieldType::SByte)?;
        Ok(self.read_bytes(entry)?.iter().map(|&b| b as i8).collect())
    }

    /// Read a single signed 16-bit value.
    pub fn read_i16(&mut self, entry: &IfdEntry) -> Result<i16, TiffError> {
        expect_scalar(entry, FieldType::SShort)?;
        let bytes = self.read_bytes(entry)?;
        Ok(self.byte_order.read_u16(&bytes) as i16)
    }

    /// Read signed 16-bit values.
    pub fn read_i16s(&mut self, entry: &IfdEntry) -> Result<Vec<i16>, TiffError> {
        expect_type(entry, FieldType::SShort)?;
        let bytes = self.read_bytes(entry)?;
        Ok(decode_u16s(&bytes, self.byte_order)
            .into_iter()
            .map(|v| v as i16)
            .collect())
    }

    /// Read a single signed 32-bit value.
    pub fn read_i32(&mut self, entry: &IfdEntry) -> Result<i32, TiffError> {
        expect_scalar(entry, FieldType::SLong)?;
        let bytes = self.read_bytes(entry)?;
        Ok(self.byte_order.read_u32(&bytes) as i32)
    }

    /// Read signed 32-bit values.
    pub fn read_i32s(&mut self, entry: &IfdEntry) -> Result<Vec<i32>, TiffError> {
        expect_type(entry, FieldType::SLong)?;
        let bytes = self.read_bytes(entry)?;
        Ok(decode_u32s(&bytes, self.byte_order)
            .into_iter()
            .map(|v| v as i32)
            .collect())
    }

    /// Read a single signed rational.
    pub fn read_srational(&mut self, entry: &IfdEntry) -> Result<SRational, TiffError> {
        expect_scalar(entry, FieldType::SRational)?;
        let bytes = self.read_bytes(entry)?;
        Ok(SRational::new(
            self.byte_order.read_u32(&bytes[0..4]) as i32,
            self.byte_order.read_u32(&bytes[4..8]) as i32,
        ))
    }

    /// Read signed rationals.
    pub fn read_srationals(&mut self, entry: &IfdEntry) -> Result<Vec<SRational>, TiffError> {
        expect_type(entry, FieldType::SRational)?;
        let bytes = self.read_bytes(entry)?;
        Ok(decode_srationals(&bytes, self.byte_order))
    }

    /// Read single precision floats.
    pub fn read_f32s(&mut self, entry: &IfdEntry) -> Result<Vec<f32>, TiffError> {
        expect_type(entry, FieldType::Float)?;
        let bytes = self.read_bytes(entry)?;
        Ok(decode_f32s(&bytes, self.byte_order))
    }

    /// Read double precision floats.
    pub fn read_f64s(&mut self, entry: &IfdEntry) -> Result<Vec<f64>, TiffError> {
        expect_type(entry, FieldType::Double)?;
        let bytes = self.read_bytes(entry)?;
        Ok(decode_f64s(&bytes, self.byte_order))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn expect_type(entry: &IfdEntry, expected: FieldType) -> Result<(), TiffError> {
    if entry.field_type != Some(expected) {
        return Err(TiffError::TypeMismatch {
            tag: entry.tag_id,
            expected: expected.name(),
            actual: entry.type_name(),
        });
    }
    Ok(())
}

fn expect_scalar(entry: &IfdEntry, expected: FieldType) -> Result<(), TiffError> {
    expect_type(entry, expected)?;
    if entry.count != 1 {
        return Err(TiffError::LengthMismatch {
            tag: entry.tag_id,
            count: entry.count,
        });
    }
    Ok(())
}

/// Text of an ASCII value with a single trailing NUL removed.
fn decode_ascii(bytes: &[u8]) -> String {
    let text = bytes.strip_suffix(&[0]).unwrap_or(bytes);
    String::from_utf8_lossy(text).into_owned()
}

fn decode_u16s(bytes: &[u8], order: ByteOrder) -> Vec<u16> {
    bytes.chunks_exact(2).map(|chunk| order.read_u16(chunk)).collect()
}

fn decode_u32s(bytes: &[u8], order: ByteOrder) -> Vec<u32> {
    bytes.chunks_exact(4).map(|chunk| order.read_u32(chunk)).collect()
}

fn decode_urationals(bytes: &[u8], order: ByteOrder) -> Vec<URational> {
    bytes
        .chunks_exact(8)
        .map(|pair| URational::new(order.read_u32(&pair[0..4]), order.read_u32(&pair[4..8])))
        .collect()
}

fn decode_srationals(bytes: &[u8], order: ByteOrder) -> Vec<SRational> {
    bytes
        .chunks_exact(8)
        .map(|pair| {
            SRational::new(
                order.read_u32(&pair[0..4]) as i32,
                order.read_u32(&pair[4..8]) as i32,
            )
        })
        .collect()
}

fn decode_f32s(bytes: &[u8], order: ByteOrder) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_bits(order.read_u32(chunk)))
        .collect()
}

fn decode_f64s(bytes: &[u8], order: ByteOrder) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|chunk| f64::from_bits(order.read_u64(chunk)))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
