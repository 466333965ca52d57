//! Parsers for TIFF-family containers.
//!
//! Plain TIFF, Canon CR2 and Olympus ORF share the same header and directory
//! layout; [`detect::ContainerKind`] tells them apart.

pub mod detect;
pub mod jpeg;
pub mod tiff;

pub use detect::{is_tiff_header, ContainerKind};
