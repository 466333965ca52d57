use thiserror::Error;

/// I/O errors that can occur when reading from the underlying source
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// The source could not be opened
    #[error("Cannot open source: {0}")]
    Open(String),

    /// Seek or read failure at a given position
    #[error("Read of {len} bytes at offset {offset} failed: {message}")]
    Read {
        offset: u64,
        len: usize,
        message: String,
    },

    /// Requested range exceeds source bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },
}

/// Errors that can occur when parsing TIFF-family files
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Header is shorter than 8 bytes or could not be read
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// Byte order marker is neither II nor MM
    #[error("Unknown byte order: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    UnknownByteOrder(u16),

    /// Magic number is not one of the accepted TIFF/ORF values
    #[error("Unknown magic number: 0x{0:04X}")]
    UnknownMagicNumber(u16),

    /// A pointer tag needed to reach a sub-directory is absent from IFD0
    #[error("{group} sub-directory not found: pointer tag 0x{pointer_tag:04X} missing from IFD0")]
    SubDirectoryNotFound {
        group: &'static str,
        pointer_tag: u16,
    },

    /// Offset or length tag of a raw resource is missing
    #[error("Resource not found: tag 0x{tag:04X} missing")]
    ResourceNotFound { tag: u16 },

    /// Accessor does not match the entry's datatype
    #[error("Type mismatch for tag 0x{tag:04X}: expected {expected}, found {actual}")]
    TypeMismatch {
        tag: u16,
        expected: &'static str,
        actual: String,
    },

    /// Scalar accessor used on a multi-valued entry
    #[error("Length mismatch for tag 0x{tag:04X}: expected a single value, found {count}")]
    LengthMismatch { tag: u16, count: u32 },

    /// Datatype code outside the known set
    #[error("Unknown field type: {0}")]
    UnknownFieldType(u16),

    /// Directory chain ended before the requested index
    #[error("Directory #{0} not found")]
    DirectoryNotFound(usize),

    /// A directory pointer leads back to an already visited directory
    #[error("Cyclic directory pointer to offset {0}")]
    CyclicDirectory(u64),

    /// A date/time field could not be interpreted
    #[error("Invalid date/time: {0}")]
    InvalidDateTime(String),
}
