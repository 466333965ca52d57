//! Parsing session over a single TIFF-family source.
//!
//! A [`TiffParser`] reads and validates the header once, then answers any
//! number of queries against the source. Nothing is cached between queries:
//! each [`parse`](TiffParser::parse) call scans only as much of IFD0 and the
//! Exif/GPSInfo sub-directories as the requested tags require.
//!
//! # Example
//!
//! ```no_run
//! use tiff_meta::{SeekReader, TiffParser, TiffTag};
//!
//! let reader = SeekReader::open("image.cr2")?;
//! let mut parser = TiffParser::new(reader)?;
//!
//! let entries = parser.parse([TiffTag::ImageWidth, TiffTag::ExposureTime])?;
//! if let Some(width) = entries.get(&TiffTag::ImageWidth.as_u16()) {
//!     println!("width: {}", parser.read_unsigned(width)?);
//! }
//! # Ok::<(), tiff_meta::TiffError>(())
//! ```

use std::collections::{HashMap, HashSet, VecDeque};

use bytes::Bytes;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tracing::debug;

use crate::error::TiffError;
use crate::format::detect::{ContainerKind, CR2_SIGNATURE_OFFSET};
use crate::io::RangeReader;

use super::directory::IfdScanner;
use super::parser::{IfdEntry, InlinePolicy, TiffHeader, TIFF_HEADER_SIZE};
use super::tags::{Group, TagMapping, TiffTag};
use super::values::{SRational, TagValue, URational, ValueReader};
use super::wanted::WantedSet;

// =============================================================================
// ParseOptions
// =============================================================================

/// Immutable configuration of a parsing session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Tag → group routing
    pub mapping: TagMapping,

    /// How directory record payloads are interpreted
    pub inline_policy: InlinePolicy,
}

impl ParseOptions {
    /// Route additional tags, or re-route known ones. Later entries win.
    pub fn with_mapping<I>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (u16, Group)>,
    {
        self.mapping.extend(overrides);
        self
    }

    /// Set the inline policy.
    pub fn with_inline_policy(mut self, policy: InlinePolicy) -> Self {
        self.inline_policy = policy;
        self
    }
}

// =============================================================================
// ResourceLocator
// =============================================================================

/// Where to find a raw byte range described by an offset/length tag pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLocator {
    /// Index in the root directory chain (0 = IFD0)
    pub directory: usize,

    /// Tag holding the absolute offset of the resource
    pub offset_tag: u16,

    /// Tag holding the length of the resource in bytes
    pub length_tag: u16,
}

impl ResourceLocator {
    /// Embedded thumbnail: IFD1, tags 0x0201/0x0202.
    pub const THUMBNAIL: ResourceLocator = ResourceLocator {
        directory: 1,
        offset_tag: TiffTag::ThumbnailOffset.as_u16(),
        length_tag: TiffTag::ThumbnailLength.as_u16(),
    };

    pub fn new(directory: usize, offset_tag: impl Into<u16>, length_tag: impl Into<u16>) -> Self {
        Self {
            directory,
            offset_tag: offset_tag.into(),
            length_tag: length_tag.into(),
        }
    }
}

// =============================================================================
// Walk output
// =============================================================================

/// One directory visited by [`TiffParser::walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    /// "IFD0", "IFD1", ..., "Exif", "GPSInfo" or "Interop"
    pub label: String,

    /// Absolute offset of the directory
    pub offset: u64,

    /// Every record, in file order
    pub entries: Vec<IfdEntry>,
}

/// Pointer tags followed by the walk, with the label of their directory.
const SUB_DIRECTORY_POINTERS: [(TiffTag, &str); 3] = [
    (TiffTag::ExifPointer, "Exif"),
    (TiffTag::GpsPointer, "GPSInfo"),
    (TiffTag::InteropPointer, "Interop"),
];

/// Position in decimal degrees. Negative for south and west.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpsPosition {
    pub latitude: f64,
    pub longitude: f64,
}

// =============================================================================
// TiffParser
// =============================================================================

/// A parsing session: a source plus its validated header.
pub struct TiffParser<R: RangeReader> {
    reader: R,
    header: TiffHeader,
    options: ParseOptions,
}

impl<R: RangeReader> TiffParser<R> {
    /// Open a session with the default mapping and inline policy.
    pub fn new(reader: R) -> Result<Self, TiffError> {
        Self::with_options(reader, ParseOptions::default())
    }

    /// Open a session with explicit options.
    ///
    /// Reads and validates the 8-byte header. A source too short to hold it
    /// fails with `MalformedHeader`.
    pub fn with_options(mut reader: R, options: ParseOptions) -> Result<Self, TiffError> {
        let bytes = reader
            .read_exact_at(0, TIFF_HEADER_SIZE)
            .map_err(|e| TiffError::MalformedHeader(e.to_string()))?;
        let header = TiffHeader::parse(&bytes)?;

        debug!(
            source = reader.identifier(),
            byte_order = ?header.byte_order,
            magic = header.magic,
            first_ifd = header.first_ifd_offset,
            "opened TIFF source"
        );

        Ok(Self {
            reader,
            header,
            options,
        })
    }

    /// Get the parsed header.
    pub fn header(&self) -> &TiffHeader {
        &self.header
    }

    /// Get the session options.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Get a reference to the underlying source.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Consume the session and return the source.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn scanner(&mut self) -> IfdScanner<'_, R> {
        IfdScanner::new(
            &mut self.reader,
            self.header.byte_order,
            self.options.inline_policy,
        )
    }

    fn values(&mut self) -> ValueReader<'_, R> {
        ValueReader::new(&mut self.reader, self.header.byte_order)
    }

    // -------------------------------------------------------------------------
    // Parse
    // -------------------------------------------------------------------------

    /// Collect the entries for `tags` from IFD0 and its sub-directories.
    ///
    /// Tags are routed through the session's [`TagMapping`]; tags with no
    /// group are dropped without error. The result is keyed by tag ID and
    /// never contains the Exif/GPSInfo pointer entries.
    ///
    /// # Errors
    /// - `SubDirectoryNotFound` if an Exif or GPSInfo tag was requested and
    ///   IFD0 has no pointer to that directory
    /// - `Io` if any read fails; partial results are discarded
    pub fn parse<I, T>(&mut self, tags: I) -> Result<HashMap<u16, IfdEntry>, TiffError>
    where
        I: IntoIterator<Item = T>,
        T: Into<u16>,
    {
        self.collect_groups(tags, true)
    }

    /// Like [`parse`](Self::parse), but a sub-directory whose pointer is
    /// missing from IFD0 only drops the tags routed to it.
    ///
    /// Suited to broad queries ("every known tag") over files that may have
    /// no GPSInfo or even no Exif directory.
    pub fn parse_available<I, T>(&mut self, tags: I) -> Result<HashMap<u16, IfdEntry>, TiffError>
    where
        I: IntoIterator<Item = T>,
        T: Into<u16>,
    {
        self.collect_groups(tags, false)
    }

    fn collect_groups<I, T>(
        &mut self,
        tags: I,
        require_pointers: bool,
    ) -> Result<HashMap<u16, IfdEntry>, TiffError>
    where
        I: IntoIterator<Item = T>,
        T: Into<u16>,
    {
        let mut root = WantedSet::new();
        let mut exif = WantedSet::new();
        let mut gps = WantedSet::new();

        for tag in tags {
            let id = tag.into();
            match self.options.mapping.group_of(id) {
                Some(Group::Ifd0) => root.insert(id),
                Some(Group::Exif) => exif.insert(id),
                Some(Group::GpsInfo) => gps.insert(id),
                None => debug!(tag = id, "dropping unmapped tag"),
            }
        }

        let exif_pointer = TiffTag::ExifPointer.as_u16();
        let gps_pointer = TiffTag::GpsPointer.as_u16();
        if !exif.is_empty() {
            root.insert(exif_pointer);
        }
        if !gps.is_empty() {
            root.insert(gps_pointer);
        }

        let mut result = HashMap::new();
        if root.is_empty() {
            return Ok(result);
        }

        let first = self.header.first_ifd_offset;
        let mut root_entries = self.scanner().collect(first, &root)?;
        let pointers = [
            (Group::Exif, exif, root_entries.remove(&exif_pointer)),
            (Group::GpsInfo, gps, root_entries.remove(&gps_pointer)),
        ];
        result.extend(root_entries);

        for (group, wanted, pointer) in pointers {
            if wanted.is_empty() {
                continue;
            }
            if pointer.is_none() && !require_pointers {
                debug!(group = group.name(), "sub-directory absent, skipping");
                continue;
            }
            let offset = self.sub_directory_offset(group, pointer.as_ref())?;
            debug!(group = group.name(), offset, "following sub-directory pointer");
            result.extend(self.scanner().collect(offset, &wanted)?);
        }

        Ok(result)
    }

    fn sub_directory_offset(
        &mut self,
        group: Group,
        pointer: Option<&IfdEntry>,
    ) -> Result<u64, TiffError> {
        let pointer_tag = group.pointer_tag().unwrap_or_default();
        let entry = pointer.ok_or(TiffError::SubDirectoryNotFound {
            group: group.name(),
            pointer_tag,
        })?;
        Ok(self.values().read_offset(entry)? as u64)
    }

    // -------------------------------------------------------------------------
    // Value accessors
    // -------------------------------------------------------------------------

    /// Decode an entry into whichever [`TagValue`] its type calls for.
    pub fn read_value(&mut self, entry: &IfdEntry) -> Result<TagValue, TiffError> {
        self.values().read_value(entry)
    }

    /// Raw bytes of an entry's value, of any type.
    pub fn read_bytes(&mut self, entry: &IfdEntry) -> Result<Bytes, TiffError> {
        self.values().read_bytes(entry)
    }

    pub fn read_string(&mut self, entry: &IfdEntry) -> Result<String, TiffError> {
        self.values().read_string(entry)
    }

    pub fn read_u8(&mut self, entry: &IfdEntry) -> Result<u8, TiffError> {
        self.values().read_u8(entry)
    }

    pub fn read_u8s(&mut self, entry: &IfdEntry) -> Result<Vec<u8>, TiffError> {
        self.values().read_u8s(entry)
    }

    pub fn read_u16(&mut self, entry: &IfdEntry) -> Result<u16, TiffError> {
        self.values().read_u16(entry)
    }

    pub fn read_u16s(&mut self, entry: &IfdEntry) -> Result<Vec<u16>, TiffError> {
        self.values().read_u16s(entry)
    }

    pub fn read_u32(&mut self, entry: &IfdEntry) -> Result<u32, TiffError> {
        self.values().read_u32(entry)
    }

    pub fn read_u32s(&mut self, entry: &IfdEntry) -> Result<Vec<u32>, TiffError> {
        self.values().read_u32s(entry)
    }

    /// Single Short or Long, widened to u32.
    pub fn read_unsigned(&mut self, entry: &IfdEntry) -> Result<u32, TiffError> {
        self.values().read_unsigned(entry)
    }

    pub fn read_urational(&mut self, entry: &IfdEntry) -> Result<URational, TiffError> {
        self.values().read_urational(entry)
    }

    pub fn read_urationals(&mut self, entry: &IfdEntry) -> Result<Vec<URational>, TiffError> {
        self.values().read_urationals(entry)
    }

    pub fn read_i8s(&mut self, entry: &IfdEntry) -> Result<Vec<i8>, TiffError> {
        self.values().read_i8s(entry)
    }

    pub fn read_i16(&mut self, entry: &IfdEntry) -> Result<i16, TiffError> {
        self.values().read_i16(entry)
    }

    pub fn read_i16s(&mut self, entry: &IfdEntry) -> Result<Vec<i16>, TiffError> {
        self.values().read_i16s(entry)
    }

    pub fn read_i32(&mut self, entry: &IfdEntry) -> Result<i32, TiffError> {
        self.values().read_i32(entry)
    }

    pub fn read_i32s(&mut self, entry: &IfdEntry) -> Result<Vec<i32>, TiffError> {
        self.values().read_i32s(entry)
    }

    pub fn read_srational(&mut self, entry: &IfdEntry) -> Result<SRational, TiffError> {
        self.values().read_srational(entry)
    }

    pub fn read_srationals(&mut self, entry: &IfdEntry) -> Result<Vec<SRational>, TiffError> {
        self.values().read_srationals(entry)
    }

    pub fn read_f32s(&mut self, entry: &IfdEntry) -> Result<Vec<f32>, TiffError> {
        self.values().read_f32s(entry)
    }

    pub fn read_f64s(&mut self, entry: &IfdEntry) -> Result<Vec<f64>, TiffError> {
        self.values().read_f64s(entry)
    }

    // -------------------------------------------------------------------------
    // Resources
    // -------------------------------------------------------------------------

    /// Read a raw byte range located by an offset/length tag pair.
    ///
    /// # Errors
    /// - `DirectoryNotFound` / `CyclicDirectory` if the chain does not reach
    ///   `locator.directory`
    /// - `ResourceNotFound` if either tag is missing from that directory
    pub fn read_resource(&mut self, locator: ResourceLocator) -> Result<Bytes, TiffError> {
        let first = self.header.first_ifd_offset;
        let directory = self.scanner().chain_offset(first, locator.directory)?;

        let wanted: WantedSet = [locator.offset_tag, locator.length_tag]
            .into_iter()
            .collect();
        let entries = self.scanner().collect(directory, &wanted)?;

        let offset_entry = entries
            .get(&locator.offset_tag)
            .ok_or(TiffError::ResourceNotFound {
                tag: locator.offset_tag,
            })?;
        let length_entry = entries
            .get(&locator.length_tag)
            .ok_or(TiffError::ResourceNotFound {
                tag: locator.length_tag,
            })?;

        let offset = self.values().read_unsigned(offset_entry)? as u64;
        let length = self.values().read_unsigned(length_entry)? as usize;

        debug!(
            directory = locator.directory,
            offset, length, "reading resource"
        );
        Ok(self.reader.read_exact_at(offset, length)?)
    }

    /// Read the embedded thumbnail (usually a JPEG) from IFD1.
    pub fn read_thumbnail(&mut self) -> Result<Bytes, TiffError> {
        self.read_resource(ResourceLocator::THUMBNAIL)
    }

    // -------------------------------------------------------------------------
    // Derived metadata
    // -------------------------------------------------------------------------

    /// Detect the container kind (plain TIFF, CR2 or ORF).
    pub fn container_kind(&mut self) -> Result<ContainerKind, TiffError> {
        let signature = if self.reader.size() >= CR2_SIGNATURE_OFFSET + 2 {
            self.reader.read_exact_at(CR2_SIGNATURE_OFFSET, 2)?
        } else {
            Bytes::new()
        };
        Ok(ContainerKind::detect(&self.header, &signature))
    }

    /// Capture time from `DateTimeOriginal`, with the `OffsetTimeOriginal`
    /// zone when present and UTC otherwise.
    ///
    /// # Errors
    /// - `SubDirectoryNotFound` if the file has no Exif directory
    /// - `InvalidDateTime` if the tag is missing or unparseable
    pub fn original_datetime(&mut self) -> Result<DateTime<FixedOffset>, TiffError> {
        let datetime_tag = TiffTag::DateTimeOriginal.as_u16();
        let offset_tag = TiffTag::OffsetTimeOriginal.as_u16();
        let entries = self.parse([datetime_tag, offset_tag])?;

        let datetime = match entries.get(&datetime_tag) {
            Some(entry) => self.read_string(entry)?,
            None => {
                return Err(TiffError::InvalidDateTime(
                    "DateTimeOriginal not found".to_string(),
                ))
            }
        };
        let offset = match entries.get(&offset_tag) {
            Some(entry) => self.read_string(entry)?,
            None => "+00:00".to_string(),
        };

        parse_exif_datetime(&datetime, &offset)
    }

    /// Position from the GPSInfo directory, `None` if absent or incomplete.
    ///
    /// The "N"/"S" and "E"/"W" reference fields are read from the record
    /// payload under either inline policy.
    pub fn gps_position(&mut self) -> Result<Option<GpsPosition>, TiffError> {
        let tags = [
            TiffTag::GpsLatitudeRef,
            TiffTag::GpsLatitude,
            TiffTag::GpsLongitudeRef,
            TiffTag::GpsLongitude,
        ];
        let entries = match self.parse(tags) {
            Ok(entries) => entries,
            Err(TiffError::SubDirectoryNotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let latitude = self.coordinate(&entries, TiffTag::GpsLatitude, TiffTag::GpsLatitudeRef, 'S')?;
        let longitude =
            self.coordinate(&entries, TiffTag::GpsLongitude, TiffTag::GpsLongitudeRef, 'W')?;

        Ok(latitude
            .zip(longitude)
            .map(|(latitude, longitude)| GpsPosition {
                latitude,
                longitude,
            }))
    }

    fn coordinate(
        &mut self,
        entries: &HashMap<u16, IfdEntry>,
        value_tag: TiffTag,
        ref_tag: TiffTag,
        negative_ref: char,
    ) -> Result<Option<f64>, TiffError> {
        let (Some(value), Some(reference)) = (
            entries.get(&value_tag.as_u16()),
            entries.get(&ref_tag.as_u16()),
        ) else {
            return Ok(None);
        };

        let parts = self.read_urationals(value)?;
        let reference = self.values().read_short_string(reference)?;

        let Some(degrees) = dms_to_degrees(&parts) else {
            return Ok(None);
        };
        if reference.trim_end_matches('\0').starts_with(negative_ref) {
            Ok(Some(-degrees))
        } else {
            Ok(Some(degrees))
        }
    }

    // -------------------------------------------------------------------------
    // Walk
    // -------------------------------------------------------------------------

    /// Read every directory reachable from the header: the root chain plus
    /// the Exif, GPSInfo and Interoperability sub-directories.
    ///
    /// Each directory is visited at most once; a pointer to an offset that
    /// was already visited is skipped.
    pub fn walk(&mut self) -> Result<Vec<Directory>, TiffError> {
        let mut directories = Vec::new();
        let mut visited = HashSet::new();
        let mut queue: VecDeque<(String, u64, Option<usize>)> = VecDeque::new();
        queue.push_back(("IFD0".to_string(), self.header.first_ifd_offset, Some(0)));

        while let Some((label, offset, chain_index)) = queue.pop_front() {
            if !visited.insert(offset) {
                debug!(label = %label, offset, "skipping visited directory");
                continue;
            }

            let entries = self.scanner().entries(offset)?;

            for (tag, sub_label) in SUB_DIRECTORY_POINTERS {
                let Some(pointer) = entries.iter().find(|e| e.tag_id == tag.as_u16()) else {
                    continue;
                };
                match self.values().read_offset(pointer) {
                    Ok(0) => {}
                    Ok(sub_offset) => {
                        queue.push_back((sub_label.to_string(), sub_offset as u64, None))
                    }
                    Err(e) => debug!(label = %label, error = %e, "unreadable sub-directory pointer"),
                }
            }

            if let Some(index) = chain_index {
                let next = self.scanner().next_ifd_offset(offset)?;
                if next != 0 {
                    queue.push_back((format!("IFD{}", index + 1), next, Some(index + 1)));
                }
            }

            directories.push(Directory {
                label,
                offset,
                entries,
            });
        }

        Ok(directories)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Parse an Exif "YYYY:MM:DD HH:MM:SS" timestamp with a "+HH:MM" offset.
fn parse_exif_datetime(datetime: &str, offset: &str) -> Result<DateTime<FixedOffset>, TiffError> {
    let datetime = datetime.trim_end_matches('\0').trim();
    let offset = offset.trim_end_matches('\0').trim();
    let combined = format!("{datetime} {offset}");
    DateTime::<FixedOffset>::parse_from_str(&combined, "%Y:%m:%d %H:%M:%S %:z")
        .map_err(|e| TiffError::InvalidDateTime(format!("{combined:?}: {e}")))
}

/// Degrees/minutes/seconds to decimal degrees.
fn dms_to_degrees(parts: &[URational]) -> Option<f64> {
    let [degrees, minutes, seconds] = parts else {
        return None;
    };
    Some(degrees.to_f64()? + minutes.to_f64()? / 60.0 + seconds.to_f64()? / 3600.0)
}
