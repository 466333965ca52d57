//! JPEG framing checks for embedded thumbnails.
//!
//! Thumbnails in IFD1 are stored as complete JPEG streams: SOI (FFD8) at the
//! start and EOI (FFD9) at the end. Some writers pad the stream to an even or
//! word-aligned length, so the EOI may be followed by zero bytes that are
//! still counted in the length tag.

use bytes::Bytes;

// =============================================================================
// JPEG Markers
// =============================================================================

/// Start Of Image marker
pub const SOI: [u8; 2] = [0xFF, 0xD8];

/// End Of Image marker
pub const EOI: [u8; 2] = [0xFF, 0xD9];

// =============================================================================
// Stream Checks
// =============================================================================

/// Check if data starts with a JPEG SOI marker.
pub fn is_jpeg_start(data: &[u8]) -> bool {
    data.starts_with(&SOI)
}

/// Position just past the last EOI marker, ignoring trailing zero padding.
fn end_of_stream(data: &[u8]) -> Option<usize> {
    let unpadded = data.len() - data.iter().rev().take_while(|&&b| b == 0).count();
    data[..unpadded].ends_with(&EOI).then_some(unpadded)
}

/// Check if data is a framed JPEG stream: SOI first, EOI last (padding
/// allowed).
pub fn is_complete_stream(data: &[u8]) -> bool {
    data.len() >= SOI.len() + EOI.len() && is_jpeg_start(data) && end_of_stream(data).is_some()
}

/// Drop zero padding after the EOI marker.
///
/// Returns the input unchanged when it is not a framed JPEG stream.
pub fn trim_padding(data: Bytes) -> Bytes {
    if !is_complete_stream(&data) {
        return data;
    }
    match end_of_stream(&data) {
        Some(end) => data.slice(..end),
        None => data,
    }
}

// =============================================================================
// Tests
// =============================================================================
