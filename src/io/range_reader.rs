use bytes::Bytes;

use crate::error::IoError;

/// Trait for positioned reads against a seekable byte source.
///
/// The TIFF parser never needs the whole file: every structure is reached by
/// an absolute offset. Implementations move a single shared cursor, so reads
/// take `&mut self` and a source must not be shared between parsers.
pub trait RangeReader {
    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Returns an error if the range is out of bounds or if the read fails.
    fn read_exact_at(&mut self, offset: u64, len: usize) -> Result<Bytes, IoError>;

    /// Get the total size of the source in bytes.
    fn size(&self) -> u64;

    /// Get a human-readable identifier for this source (used in log events).
    fn identifier(&self) -> &str;
}

impl<R: RangeReader + ?Sized> RangeReader for &mut R {
    fn read_exact_at(&mut self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        (**self).read_exact_at(offset, len)
    }

    fn size(&self) -> u64 {
        (**self).size()
    }

    fn identifier(&self) -> &str {
        (**self).identifier()
    }
}
