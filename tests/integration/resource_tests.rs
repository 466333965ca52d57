//! Resource extraction and derived metadata tests.
//!
//! Tests verify:
//! - Thumbnail and custom offset/length resources
//! - Directory chain errors (missing and cyclic directories)
//! - Capture time, GPS position and container detection
//! - Full directory walks
//! - Reading from a file on disk

use std::io::Write;

use tiff_meta::{
    ContainerKind, InlinePolicy, ParseOptions, ResourceLocator, SeekReader, TiffError, TiffParser,
    TiffTag,
};

use super::test_utils::{
    cr2_builder, cr2_fixture, is_valid_jpeg, orf_fixture, ByteOrderType, IfdBuilder, Packing,
    TiffBuilder, TrackingReader, THUMBNAIL_JPEG,
};

fn open(data: Vec<u8>) -> TiffParser<TrackingReader> {
    TiffParser::new(TrackingReader::new(data, "memory://test")).unwrap()
}

// =============================================================================
// Resources
// =============================================================================

#[test]
fn test_cr2_thumbnail() {
    let mut parser = open(cr2_fixture());
    let thumbnail = parser.read_thumbnail().unwrap();

    assert!(is_valid_jpeg(&thumbnail));
    assert_eq!(&thumbnail[..], THUMBNAIL_JPEG);
}

#[test]
fn test_thumbnail_request_pattern() {
    let mut parser = open(cr2_fixture());
    parser.read_thumbnail().unwrap();

    // The last request is the thumbnail itself, in one read
    let &(_, len) = parser.get_ref().requests().last().unwrap();
    assert_eq!(len, THUMBNAIL_JPEG.len());
}

#[test]
fn test_orf_has_no_second_directory() {
    let mut parser = open(orf_fixture());
    assert!(matches!(
        parser.read_thumbnail(),
        Err(TiffError::DirectoryNotFound(1))
    ));
}

#[test]
fn test_custom_locator() {
    let preview = b"preview bytes".to_vec();
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::new().short(0x0100, 8).blob(0x0111, 0x0117, &preview))
        .build();
    let mut parser = open(data);

    let locator = ResourceLocator::new(0, TiffTag::StripOffsets, TiffTag::StripByteCounts);
    let bytes = parser.read_resource(locator).unwrap();
    assert_eq!(&bytes[..], &preview[..]);
}

#[test]
fn test_missing_length_tag() {
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::new().short(0x0100, 8))
        .add_ifd(IfdBuilder::new().long(0x0201, 8))
        .build();
    let mut parser = open(data);

    assert!(matches!(
        parser.read_thumbnail(),
        Err(TiffError::ResourceNotFound { tag: 0x0202 })
    ));
}

#[test]
fn test_missing_offset_tag() {
    let mut parser = open(cr2_fixture());
    let locator = ResourceLocator::new(0, TiffTag::StripOffsets, TiffTag::StripByteCounts);

    assert!(matches!(
        parser.read_resource(locator),
        Err(TiffError::ResourceNotFound { tag: 0x0111 })
    ));
}

#[test]
fn test_resource_out_of_bounds() {
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::new().short(0x0100, 8))
        .add_ifd(IfdBuilder::new().long(0x0201, 8).long(0x0202, 1_000_000))
        .build();
    let mut parser = open(data);

    assert!(matches!(parser.read_thumbnail(), Err(TiffError::Io(_))));
}

#[test]
fn test_cyclic_chain() {
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::new().short(0x0100, 8))
        .with_cyclic_chain()
        .build();
    let mut parser = open(data);

    assert!(matches!(
        parser.read_thumbnail(),
        Err(TiffError::CyclicDirectory(8))
    ));
}

// =============================================================================
// Derived Metadata
// =============================================================================

#[test]
fn test_original_datetime_defaults_to_utc() {
    let mut parser = open(cr2_fixture());
    let datetime = parser.original_datetime().unwrap();
    assert_eq!(datetime.to_rfc3339(), "2021-11-19T12:21:10+00:00");
}

#[test]
fn test_original_datetime_with_offset() {
    let mut parser = open(orf_fixture());
    let datetime = parser.original_datetime().unwrap();
    assert_eq!(datetime.to_rfc3339(), "2016-08-12T13:32:54+09:00");
    assert_eq!(datetime.offset().local_minus_utc(), 9 * 3600);
}

#[test]
fn test_original_datetime_without_exif() {
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::new().short(0x0100, 8))
        .build();
    let mut parser = open(data);

    assert!(matches!(
        parser.original_datetime(),
        Err(TiffError::SubDirectoryNotFound { .. })
    ));
}

#[test]
fn test_original_datetime_missing_tag() {
    let exif = IfdBuilder::new().rational(0x829A, 1, 60);
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::new().sub_ifd(0x8769, exif))
        .build();
    let mut parser = open(data);

    assert!(matches!(
        parser.original_datetime(),
        Err(TiffError::InvalidDateTime(_))
    ));
}

#[test]
fn test_gps_position() {
    let mut parser = open(cr2_fixture());
    let position = parser.gps_position().unwrap().unwrap();

    assert!((position.latitude - 48.858375).abs() < 1e-9);
    assert!((position.longitude - 2.2945).abs() < 1e-9);
}

#[test]
fn test_gps_position_packed() {
    let data = cr2_builder().with_packing(Packing::Packed).build();
    let options = ParseOptions::default().with_inline_policy(InlinePolicy::Packed);
    let mut parser = TiffParser::with_options(TrackingReader::new(data, "memory://packed"), options)
        .unwrap();

    let position = parser.gps_position().unwrap().unwrap();
    assert!((position.latitude - 48.858375).abs() < 1e-9);
    assert!((position.longitude - 2.2945).abs() < 1e-9);
}

fn southern_western(order: ByteOrderType) -> Vec<u8> {
    let gps = IfdBuilder::new()
        .ascii(0x0001, "S")
        .rationals(0x0002, &[(33, 1), (51, 1), (36, 1)])
        .ascii(0x0003, "W")
        .rationals(0x0004, &[(70, 1), (30, 1), (0, 1)]);

    // Standard layout: the two-byte references sit in their records
    TiffBuilder::new()
        .with_byte_order(order)
        .with_packing(Packing::Packed)
        .add_ifd(IfdBuilder::new().sub_ifd(0x8825, gps))
        .build()
}

#[test]
fn test_gps_position_southern_western() {
    for order in [ByteOrderType::LittleEndian, ByteOrderType::BigEndian] {
        let mut parser = open(southern_western(order));
        assert_eq!(parser.options().inline_policy, InlinePolicy::Scalar);

        let position = parser.gps_position().unwrap().unwrap();
        assert!((position.latitude + 33.86).abs() < 1e-9, "{order:?}");
        assert!((position.longitude + 70.5).abs() < 1e-9, "{order:?}");
    }
}

#[test]
fn test_gps_position_southern_western_packed_policy() {
    let options = ParseOptions::default().with_inline_policy(InlinePolicy::Packed);
    let data = southern_western(ByteOrderType::LittleEndian);
    let mut parser =
        TiffParser::with_options(TrackingReader::new(data, "memory://packed"), options).unwrap();

    let position = parser.gps_position().unwrap().unwrap();
    assert!((position.latitude + 33.86).abs() < 1e-9);
    assert!((position.longitude + 70.5).abs() < 1e-9);
}

#[test]
fn test_gps_position_absent() {
    let mut parser = open(orf_fixture());
    assert_eq!(parser.gps_position().unwrap(), None);
}

#[test]
fn test_gps_position_incomplete() {
    let gps = IfdBuilder::new()
        .reference(0x0001, "N")
        .rationals(0x0002, &[(48, 1), (51, 1), (3015, 100)]);
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::new().sub_ifd(0x8825, gps))
        .build();
    let mut parser = open(data);

    assert_eq!(parser.gps_position().unwrap(), None);
}

#[test]
fn test_container_kind() {
    assert_eq!(open(cr2_fixture()).container_kind().unwrap(), ContainerKind::Cr2);
    assert_eq!(open(orf_fixture()).container_kind().unwrap(), ContainerKind::Orf);

    let plain = TiffBuilder::new()
        .add_ifd(IfdBuilder::new().short(0x0100, 8))
        .build();
    assert_eq!(open(plain).container_kind().unwrap(), ContainerKind::Tiff);
}

// =============================================================================
// Walk
// =============================================================================

#[test]
fn test_walk_cr2() {
    let mut parser = open(cr2_fixture());
    let directories = parser.walk().unwrap();

    let labels: Vec<&str> = directories.iter().map(|d| d.label.as_str()).collect();
    assert_eq!(labels, vec!["IFD0", "Exif", "GPSInfo", "IFD1"]);

    let counts: Vec<usize> = directories.iter().map(|d| d.entries.len()).collect();
    assert_eq!(counts, vec![9, 7, 5, 3]);

    assert_eq!(directories[0].offset, 16);
    let tags: Vec<u16> = directories[3].entries.iter().map(|e| e.tag_id).collect();
    assert_eq!(tags, vec![0x0103, 0x0201, 0x0202]);
}

#[test]
fn test_walk_follows_ifd_typed_pointers() {
    let exif = IfdBuilder::new().rational(0x829A, 1, 125);
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::new().short(0x0100, 8).sub_ifd_typed(0x8769, 13, exif))
        .build();
    let mut parser = open(data);

    let directories = parser.walk().unwrap();
    let labels: Vec<&str> = directories.iter().map(|d| d.label.as_str()).collect();
    assert_eq!(labels, vec!["IFD0", "Exif"]);
    assert_eq!(directories[1].entries[0].tag_id, 0x829A);
}

#[test]
fn test_walk_cyclic_chain_terminates() {
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::new().short(0x0100, 8))
        .with_cyclic_chain()
        .build();
    let mut parser = open(data);

    let directories = parser.walk().unwrap();
    assert_eq!(directories.len(), 1);
    assert_eq!(directories[0].label, "IFD0");
}

#[test]
fn test_walk_values_readable() {
    let mut parser = open(orf_fixture());
    let directories = parser.walk().unwrap();
    assert_eq!(directories.len(), 2);

    for directory in &directories {
        for entry in &directory.entries {
            parser.read_value(entry).unwrap();
        }
    }
}

// =============================================================================
// Files on Disk
// =============================================================================

#[test]
fn test_parse_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&cr2_fixture()).unwrap();
    file.flush().unwrap();

    let reader = SeekReader::open(file.path()).unwrap();
    let mut parser = TiffParser::new(reader).unwrap();

    let entries = parser.parse([TiffTag::Model, TiffTag::Iso]).unwrap();
    assert_eq!(
        parser.read_string(&entries[&0x0110]).unwrap(),
        "Canon EOS 80D"
    );
    assert_eq!(parser.read_u16(&entries[&0x8827]).unwrap(), 400);
    assert_eq!(parser.read_thumbnail().unwrap(), THUMBNAIL_JPEG);
}

#[test]
fn test_open_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = SeekReader::open(dir.path().join("missing.cr2"));
    assert!(matches!(result, Err(tiff_meta::IoError::Open(_))));
}

#[test]
fn test_parse_from_memory() {
    let mut parser = TiffParser::new(SeekReader::from_bytes(orf_fixture())).unwrap();
    let entries = parser.parse([TiffTag::Model]).unwrap();
    assert_eq!(parser.read_string(&entries[&0x0110]).unwrap(), "E-M10MarkII");
}
