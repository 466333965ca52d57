//! Byte sources for the parser.
//!
//! Everything the parser reads goes through [`RangeReader`]: positioned,
//! exact-length reads against a file or an in-memory buffer.

mod range_reader;
mod seek_reader;

pub use range_reader::RangeReader;
pub use seek_reader::SeekReader;
