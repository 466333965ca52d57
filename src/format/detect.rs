//! Container detection for TIFF-family files.
//!
//! Raw formats reuse the TIFF header and mark themselves in one of two ways:
//!
//! - **Olympus ORF**: a non-standard magic number ("RO" / "OR")
//! - **Canon CR2**: a standard header followed by the "CR" signature at
//!   bytes 8-9
//!
//! Anything else with a valid header is treated as plain TIFF.

use serde::Serialize;

use super::tiff::TiffHeader;

/// CR2 signature, stored right after the 8-byte TIFF header.
pub const CR2_SIGNATURE: [u8; 2] = *b"CR";

/// Offset of the CR2 signature.
pub const CR2_SIGNATURE_OFFSET: u64 = 8;

/// Detected container kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContainerKind {
    /// Plain TIFF
    Tiff,
    /// Canon CR2 raw
    Cr2,
    /// Olympus ORF raw
    Orf,
}

impl ContainerKind {
    /// Classify a file from its parsed header and the two bytes that follow
    /// it. `signature` may be shorter than two bytes for tiny files.
    pub fn detect(header: &TiffHeader, signature: &[u8]) -> Self {
        if header.is_orf() {
            ContainerKind::Orf
        } else if signature.starts_with(&CR2_SIGNATURE) {
            ContainerKind::Cr2
        } else {
            ContainerKind::Tiff
        }
    }

    /// Get a human-readable name for the container.
    pub const fn name(&self) -> &'static str {
        match self {
            ContainerKind::Tiff => "TIFF",
            ContainerKind::Cr2 => "Canon CR2",
            ContainerKind::Orf => "Olympus ORF",
        }
    }
}

/// Check if bytes look like the start of a TIFF-family file.
///
/// Only the byte order and magic number are checked.
pub fn is_tiff_header(bytes: &[u8]) -> bool {
    TiffHeader::parse(bytes).is_ok()
}
