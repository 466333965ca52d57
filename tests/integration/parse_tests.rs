//! Tag selection tests.
//!
//! Tests verify:
//! - Requested tags are found in IFD0 and through the Exif/GPSInfo pointers
//! - Datatypes differ between manufacturers for the same tag
//! - Scans stop at the largest wanted tag
//! - Header errors are reported before any directory is read

use clap::Parser;
use tiff_meta::config::{Cli, Command};
use tiff_meta::{
    FieldType, Group, InlinePolicy, IoError, ParseOptions, SRational, TiffError, TiffParser,
    TiffTag, URational,
};

use super::test_utils::{
    cr2_builder, cr2_fixture, orf_fixture, ByteOrderType, IfdBuilder, Packing, TiffBuilder,
    TrackingReader,
};

const SCENARIO_TAGS: [TiffTag; 6] = [
    TiffTag::ImageWidth,
    TiffTag::ImageHeight,
    TiffTag::BitsPerSample,
    TiffTag::Make,
    TiffTag::DateTimeOriginal,
    TiffTag::ExposureTime,
];

fn open(data: Vec<u8>) -> TiffParser<TrackingReader> {
    TiffParser::new(TrackingReader::new(data, "memory://test")).unwrap()
}

fn open_with(data: Vec<u8>, options: ParseOptions) -> TiffParser<TrackingReader> {
    TiffParser::with_options(TrackingReader::new(data, "memory://test"), options).unwrap()
}

// =============================================================================
// End-to-end Scenarios
// =============================================================================

#[test]
fn test_cr2_scenario() {
    let mut parser = open(cr2_fixture());
    let entries = parser.parse(SCENARIO_TAGS).unwrap();
    assert_eq!(entries.len(), 6);

    let width = &entries[&0x0100];
    assert_eq!(width.field_type, Some(FieldType::Short));
    assert_eq!(parser.read_u16(width).unwrap(), 5184);
    assert_eq!(parser.read_u16(&entries[&0x0101]).unwrap(), 3456);
    assert_eq!(parser.read_u16s(&entries[&0x0102]).unwrap(), vec![8, 8, 8]);
    assert_eq!(parser.read_string(&entries[&0x010F]).unwrap(), "Canon");
    assert_eq!(
        parser.read_string(&entries[&0x9003]).unwrap(),
        "2021:11:19 12:21:10"
    );
    assert_eq!(
        parser.read_urational(&entries[&0x829A]).unwrap(),
        URational::new(1, 40)
    );
}

#[test]
fn test_orf_scenario() {
    let mut parser = open(orf_fixture());
    let entries = parser.parse(SCENARIO_TAGS).unwrap();
    assert_eq!(entries.len(), 6);

    let width = &entries[&0x0100];
    assert_eq!(width.field_type, Some(FieldType::Long));
    assert_eq!(parser.read_u32(width).unwrap(), 4640);
    assert_eq!(parser.read_u32(&entries[&0x0101]).unwrap(), 3472);

    // Scalar here, a sequence of three in the CR2
    let bits = &entries[&0x0102];
    assert_eq!(bits.count, 1);
    assert_eq!(parser.read_u16(bits).unwrap(), 16);

    assert_eq!(
        parser.read_string(&entries[&0x010F]).unwrap(),
        "OLYMPUS CORPORATION    "
    );
    assert_eq!(
        parser.read_urational(&entries[&0x829A]).unwrap(),
        URational::new(1, 200)
    );
    assert_eq!(
        parser.read_string(&entries[&0x9003]).unwrap(),
        "2016:08:12 13:32:54"
    );
}

#[test]
fn test_read_unsigned_across_manufacturers() {
    let mut cr2 = open(cr2_fixture());
    let entries = cr2.parse([TiffTag::ImageWidth]).unwrap();
    assert_eq!(cr2.read_unsigned(&entries[&0x0100]).unwrap(), 5184);

    let mut orf = open(orf_fixture());
    let entries = orf.parse([TiffTag::ImageWidth]).unwrap();
    assert_eq!(orf.read_unsigned(&entries[&0x0100]).unwrap(), 4640);
}

#[test]
fn test_big_endian_matches_little_endian() {
    let le = cr2_fixture();
    let be = cr2_builder().with_byte_order(ByteOrderType::BigEndian).build();
    assert_eq!(&be[0..2], b"MM");

    let mut le_parser = open(le);
    let mut be_parser = open(be);
    let le_entries = le_parser.parse(SCENARIO_TAGS).unwrap();
    let be_entries = be_parser.parse(SCENARIO_TAGS).unwrap();

    for tag in SCENARIO_TAGS {
        let id = tag.as_u16();
        assert_eq!(
            le_parser.read_value(&le_entries[&id]).unwrap(),
            be_parser.read_value(&be_entries[&id]).unwrap(),
            "{} differs between byte orders",
            tag.name()
        );
    }
}

#[test]
fn test_packed_file_with_packed_policy() {
    let data = cr2_builder().with_packing(Packing::Packed).build();
    let mut parser = open_with(
        data,
        ParseOptions::default().with_inline_policy(InlinePolicy::Packed),
    );

    let entries = parser.parse([TiffTag::Make, TiffTag::BitsPerSample]).unwrap();
    assert_eq!(parser.read_string(&entries[&0x010F]).unwrap(), "Canon");
    assert_eq!(parser.read_u16s(&entries[&0x0102]).unwrap(), vec![8, 8, 8]);
}

#[test]
fn test_signed_and_float_values() {
    let ifd = IfdBuilder::new()
        .sshort(0xC001, -5)
        .srational(0xC002, -1, 3)
        .double(0xC003, 2.5)
        .longs(0xC004, &[70_000, 80_000]);
    let data = TiffBuilder::new()
        .with_byte_order(ByteOrderType::BigEndian)
        .add_ifd(ifd)
        .build();
    let mapping = [0xC001u16, 0xC002, 0xC003, 0xC004].map(|tag| (tag, Group::Ifd0));
    let mut parser = open_with(data, ParseOptions::default().with_mapping(mapping));

    let entries = parser.parse([0xC001u16, 0xC002, 0xC003, 0xC004]).unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(parser.read_i16(&entries[&0xC001]).unwrap(), -5);
    assert_eq!(
        parser.read_srational(&entries[&0xC002]).unwrap(),
        SRational::new(-1, 3)
    );
    assert_eq!(parser.read_f64s(&entries[&0xC003]).unwrap(), vec![2.5]);
    assert_eq!(
        parser.read_u32s(&entries[&0xC004]).unwrap(),
        vec![70_000, 80_000]
    );
}

// =============================================================================
// Result Shape
// =============================================================================

#[test]
fn test_pointer_entries_not_returned() {
    let mut parser = open(cr2_fixture());
    let entries = parser
        .parse([TiffTag::Make, TiffTag::ExposureTime, TiffTag::GpsLatitude])
        .unwrap();

    assert_eq!(entries.len(), 3);
    assert!(!entries.contains_key(&0x8769));
    assert!(!entries.contains_key(&0x8825));
}

#[test]
fn test_pointer_tags_requested_directly_are_dropped() {
    let mut parser = open(cr2_fixture());
    let entries = parser.parse([0x8769u16, 0x8825]).unwrap();
    assert!(entries.is_empty());
}

#[test]
fn test_unmapped_tag_is_omitted() {
    let mut parser = open(cr2_fixture());
    let entries = parser.parse([0x0100u16, 0xC0DE]).unwrap();

    assert_eq!(entries.len(), 1);
    assert!(entries.contains_key(&0x0100));
    assert!(!entries.contains_key(&0xC0DE));
}

#[test]
fn test_mapped_but_absent_tag_is_omitted() {
    let mut parser = open(orf_fixture());
    let entries = parser.parse([TiffTag::Make, TiffTag::Artist]).unwrap();
    assert_eq!(entries.len(), 1);
    assert!(!entries.contains_key(&TiffTag::Artist.as_u16()));
}

#[test]
fn test_empty_request() {
    let mut parser = open(cr2_fixture());
    let before = parser.get_ref().request_count();

    let entries = parser.parse(Vec::<u16>::new()).unwrap();
    assert!(entries.is_empty());
    assert_eq!(parser.get_ref().request_count(), before);
}

#[test]
fn test_mapping_override() {
    // GPSVersionID (0x0000) has no default group
    let mut parser = open(cr2_fixture());
    assert!(parser.parse([0x0000u16]).unwrap().is_empty());

    let options = ParseOptions::default().with_mapping([(0x0000, Group::GpsInfo)]);
    let mut parser = open_with(cr2_fixture(), options);
    let entries = parser.parse([0x0000u16]).unwrap();
    assert_eq!(parser.read_u8s(&entries[&0x0000]).unwrap(), vec![2, 3, 0, 0]);
}

#[test]
fn test_mapping_override_moves_tag() {
    // Routing Make to Exif looks for it in the wrong directory
    let options = ParseOptions::default().with_mapping([(0x010F, Group::Exif)]);
    let mut parser = open_with(cr2_fixture(), options);
    let entries = parser.parse([TiffTag::Make]).unwrap();
    assert!(entries.is_empty());
}

#[test]
fn test_idempotent() {
    let mut parser = open(cr2_fixture());
    let first = parser.parse(SCENARIO_TAGS).unwrap();
    let first_requests = parser.get_ref().requests().to_vec();

    // Nothing is cached: a repeated query issues the same reads
    let mut reader = parser.into_inner();
    reader.reset_tracking();
    let mut parser = TiffParser::new(reader).unwrap();
    let second = parser.parse(SCENARIO_TAGS).unwrap();

    assert_eq!(first, second);
    assert_eq!(parser.get_ref().requests(), &first_requests[..]);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_missing_gps_directory() {
    let mut parser = open(orf_fixture());
    let result = parser.parse([TiffTag::Make, TiffTag::GpsLatitude]);

    match result {
        Err(TiffError::SubDirectoryNotFound { group, pointer_tag }) => {
            assert_eq!(group, "GPSInfo");
            assert_eq!(pointer_tag, 0x8825);
        }
        other => panic!("expected SubDirectoryNotFound, got {other:?}"),
    }
}

#[test]
fn test_missing_exif_directory() {
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::new().short(0x0100, 64))
        .build();
    let mut parser = open(data);

    assert!(matches!(
        parser.parse([TiffTag::ExposureTime]),
        Err(TiffError::SubDirectoryNotFound { pointer_tag: 0x8769, .. })
    ));
}

#[test]
fn test_missing_directories_skipped_by_parse_available() {
    let mut parser = open(orf_fixture());
    let entries = parser
        .parse_available([TiffTag::Make, TiffTag::ExposureTime, TiffTag::GpsLatitude])
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert!(entries.contains_key(&0x010F));
    assert!(entries.contains_key(&0x829A));
}

#[test]
fn test_default_show_selection_on_file_without_gps() {
    let cli = Cli::try_parse_from(["tiff-meta", "show", "photo.orf"]).unwrap();
    let Command::Show(config) = cli.command else {
        panic!("expected show command");
    };
    assert!(config.tags.is_empty());

    let wanted = config.requested_tags();
    let mut parser = open_with(orf_fixture(), config.parse_options());
    assert!(matches!(
        parser.parse(wanted.iter().copied()),
        Err(TiffError::SubDirectoryNotFound { pointer_tag: 0x8825, .. })
    ));

    let entries = parser.parse_available(wanted.iter().copied()).unwrap();
    assert_eq!(parser.read_u32(&entries[&0x0100]).unwrap(), 4640);
    assert_eq!(parser.read_string(&entries[&0x9011]).unwrap(), "+09:00");
    assert!(!entries.keys().any(|tag| (0x0001..=0x0006).contains(tag)));
}

#[test]
fn test_ifd_typed_exif_pointer() {
    let exif = IfdBuilder::new()
        .rational(0x829A, 1, 125)
        .ascii(0x9003, "2020:01:02 03:04:05");
    for order in [ByteOrderType::LittleEndian, ByteOrderType::BigEndian] {
        let data = TiffBuilder::new()
            .with_byte_order(order)
            .add_ifd(
                IfdBuilder::new()
                    .short(0x0100, 64)
                    .sub_ifd_typed(0x8769, 13, exif.clone()),
            )
            .build();
        let mut parser = open(data);

        let entries = parser.parse([TiffTag::ExposureTime]).unwrap();
        assert_eq!(
            parser.read_urational(&entries[&0x829A]).unwrap(),
            URational::new(1, 125)
        );
        assert_eq!(
            parser.original_datetime().unwrap().to_rfc3339(),
            "2020-01-02T03:04:05+00:00"
        );
    }
}

#[test]
fn test_multi_valued_pointer_rejected() {
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::new().raw(0x8769, 13, 2, [0x40, 0, 0, 0]))
        .build();
    let mut parser = open(data);

    assert!(matches!(
        parser.parse([TiffTag::ExposureTime]),
        Err(TiffError::TypeMismatch { tag: 0x8769, .. })
    ));
}

#[test]
fn test_type_mismatch() {
    let mut parser = open(orf_fixture());
    let entries = parser.parse([TiffTag::ImageWidth]).unwrap();

    assert!(matches!(
        parser.read_string(&entries[&0x0100]),
        Err(TiffError::TypeMismatch { tag: 0x0100, .. })
    ));
    assert!(matches!(
        parser.read_u16(&entries[&0x0100]),
        Err(TiffError::TypeMismatch { .. })
    ));
}

#[test]
fn test_length_mismatch() {
    let mut parser = open(cr2_fixture());
    let entries = parser.parse([TiffTag::BitsPerSample]).unwrap();
    assert!(matches!(
        parser.read_u16(&entries[&0x0102]),
        Err(TiffError::LengthMismatch { tag: 0x0102, count: 3 })
    ));
}

#[test]
fn test_unknown_field_type() {
    let data = TiffBuilder::new()
        .add_ifd(IfdBuilder::new().raw(0x0100, 99, 1, [1, 0, 0, 0]))
        .build();
    let mut parser = open(data);
    let entries = parser.parse([TiffTag::ImageWidth]).unwrap();
    let entry = &entries[&0x0100];

    assert_eq!(entry.field_type, None);
    assert!(matches!(
        parser.read_value(entry),
        Err(TiffError::UnknownFieldType(99))
    ));
}

#[test]
fn test_truncated_directory() {
    let mut data = cr2_fixture();
    // Cut inside IFD0's records
    data.truncate(16 + 2 + 12 * 3);
    let mut parser = open(data);

    assert!(matches!(
        parser.parse([TiffTag::Orientation]),
        Err(TiffError::Io(IoError::RangeOutOfBounds { .. }))
    ));
}

#[test]
fn test_header_errors() {
    let source = |data: &[u8]| TrackingReader::new(data.to_vec(), "memory://bad");

    assert!(matches!(
        TiffParser::new(source(b"II*")),
        Err(TiffError::MalformedHeader(_))
    ));
    assert!(matches!(
        TiffParser::new(source(b"XX*\x00\x08\x00\x00\x00")),
        Err(TiffError::UnknownByteOrder(0x5858))
    ));
    assert!(matches!(
        TiffParser::new(source(b"II+\x00\x08\x00\x00\x00")),
        Err(TiffError::UnknownMagicNumber(0x002B))
    ));
}

#[test]
fn test_orf_magic_accepted() {
    let parser = open(orf_fixture());
    assert!(parser.header().is_orf());

    let data = TiffBuilder::new()
        .with_byte_order(ByteOrderType::BigEndian)
        .with_magic(0x4F52)
        .add_ifd(IfdBuilder::new().short(0x0100, 1))
        .build();
    assert_eq!(&data[0..4], b"MMOR");
    assert!(open(data).header().is_orf());
}

// =============================================================================
// Request Patterns
// =============================================================================

#[test]
fn test_header_read_once() {
    let mut parser = open(cr2_fixture());
    assert_eq!(parser.get_ref().requests(), &[(0, 8)]);

    parser.parse([TiffTag::Make]).unwrap();
    parser.parse([TiffTag::Make]).unwrap();
    let header_reads = parser
        .get_ref()
        .requests()
        .iter()
        .filter(|&&request| request == (0, 8))
        .count();
    assert_eq!(header_reads, 1);
}

#[test]
fn test_scan_stops_at_largest_wanted_tag() {
    let ifd = IfdBuilder::new()
        .short(5, 5)
        .short(10, 10)
        .short(20, 20)
        .short(30, 30);
    let data = TiffBuilder::new().add_ifd(ifd).build();
    let mapping = [5u16, 10, 20, 30].map(|tag| (tag, Group::Ifd0));
    let mut parser = open_with(data, ParseOptions::default().with_mapping(mapping));

    let entries = parser.parse([10u16]).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(parser.read_u16(&entries[&10]).unwrap(), 10);

    // Entry 10 is the last one read; 20 and 30 are never touched
    assert_eq!(parser.get_ref().entry_reads(), 2);
}

#[test]
fn test_scan_stops_past_missing_tag() {
    let ifd = IfdBuilder::new()
        .short(5, 5)
        .short(10, 10)
        .short(20, 20)
        .short(30, 30);
    let data = TiffBuilder::new().add_ifd(ifd).build();
    let mut parser = open_with(data, ParseOptions::default().with_mapping([(15, Group::Ifd0)]));

    assert!(parser.parse([15u16]).unwrap().is_empty());
    assert_eq!(parser.get_ref().entry_reads(), 3);
}

#[test]
fn test_first_entry_request_reads_one_record() {
    let mut parser = open(cr2_fixture());
    let entries = parser.parse([TiffTag::ImageWidth]).unwrap();
    assert_eq!(entries.len(), 1);

    // Header, IFD0 count, one record; the inline value needs no read
    assert_eq!(parser.get_ref().entry_reads(), 1);
    parser.read_u16(&entries[&0x0100]).unwrap();
    assert_eq!(parser.get_ref().request_count(), 3);
}

#[test]
fn test_exif_request_pattern() {
    let mut parser = open(cr2_fixture());
    let entries = parser.parse([TiffTag::ExposureTime]).unwrap();
    assert_eq!(entries.len(), 1);

    // IFD0 is scanned up to the Exif pointer (8 records), the Exif directory
    // up to ExposureTime (its first record)
    assert_eq!(parser.get_ref().entry_reads(), 8 + 1);
}
