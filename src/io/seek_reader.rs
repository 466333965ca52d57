use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use bytes::{Bytes, BytesMut};

use super::RangeReader;
use crate::error::IoError;

/// `RangeReader` over anything that implements `Read + Seek`.
///
/// Each read seeks to an absolute position and fills the requested number of
/// bytes. The source size is determined once on creation by seeking to the end.
pub struct SeekReader<R> {
    inner: R,
    size: u64,
    identifier: String,
}

impl<R: Read + Seek> SeekReader<R> {
    /// Wrap a seekable stream.
    pub fn new(mut inner: R, identifier: impl Into<String>) -> Result<Self, IoError> {
        let size = inner.seek(SeekFrom::End(0)).map_err(|e| IoError::Read {
            offset: 0,
            len: 0,
            message: e.to_string(),
        })?;

        Ok(Self {
            inner,
            size,
            identifier: identifier.into(),
        })
    }

    /// Consume the reader and return the wrapped stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl SeekReader<BufReader<File>> {
    /// Open a file on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| IoError::Open(format!("{}: {}", path.display(), e)))?;
        Self::new(BufReader::new(file), path.display().to_string())
    }
}

impl SeekReader<Cursor<Bytes>> {
    /// Read from an in-memory buffer.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let size = data.len() as u64;
        Self {
            inner: Cursor::new(data),
            size,
            identifier: "memory".to_string(),
        }
    }
}

impl<R: Read + Seek> RangeReader for SeekReader<R> {
    fn read_exact_at(&mut self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        let end = offset.checked_add(len as u64);
        if end.map_or(true, |end| end > self.size) {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.size,
            });
        }

        let read_err = |e: std::io::Error| IoError::Read {
            offset,
            len,
            message: e.to_string(),
        };

        self.inner.seek(SeekFrom::Start(offset)).map_err(read_err)?;
        let mut buf = BytesMut::zeroed(len);
        self.inner.read_exact(&mut buf).map_err(read_err)?;
        Ok(buf.freeze())
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}
