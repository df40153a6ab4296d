//! Reading streams from known broken producers.
use dcmio_core::{Length, Tag, TagVrMap, VR};
use dcmio_encoding::transfer_syntax::entries::{
    EXPLICIT_VR_LITTLE_ENDIAN, IMPLICIT_VR_LITTLE_ENDIAN, JPEG_BASELINE,
};
use dcmio_encoding::ElementCodec;
use dcmio_parser::dataset::read::ReadError;
use dcmio_parser::{read_dataset, read_dataset_with_dictionary, Error, ReadOptions, RecoveryKind};
use pretty_assertions::assert_eq;
use std::io::Cursor;

fn implicit() -> ReadOptions {
    ReadOptions::for_transfer_syntax(&IMPLICIT_VR_LITTLE_ENDIAN)
}

fn explicit() -> ReadOptions {
    ReadOptions::for_transfer_syntax(&EXPLICIT_VR_LITTLE_ENDIAN)
}

fn kinds(outcome: &dcmio_parser::ReadOutcome) -> Vec<RecoveryKind> {
    outcome.recoveries.iter().map(|r| r.kind).collect()
}

fn bytes_of(outcome: &dcmio_parser::ReadOutcome, tag: Tag) -> Vec<u8> {
    outcome
        .dataset
        .get(tag)
        .unwrap()
        .value()
        .bytes()
        .unwrap()
        .as_bytes()
        .to_vec()
}

#[test]
fn ge_length_13_is_read_as_10() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x10, 0x00, 0x10, 0x00, 0x0D, 0x00, 0x00, 0x00, // (0010,0010) VL 13
        b'D', b'O', b'E', b'^', b'J', b'O', b'H', b'N', b' ', b' ',
        0x10, 0x00, 0x20, 0x00, 0x04, 0x00, 0x00, 0x00, // (0010,0020) VL 4
        b'1', b'2', b'3', b'4',
    ];
    let outcome = read_dataset(Cursor::new(data), implicit()).unwrap();
    assert_eq!(outcome.dataset.len(), 2);
    assert_eq!(bytes_of(&outcome, Tag(0x0010, 0x0010)), b"DOE^JOHN  ");
    assert_eq!(bytes_of(&outcome, Tag(0x0010, 0x0020)), b"1234");
    assert_eq!(kinds(&outcome), vec![RecoveryKind::GeLength13]);
    assert_eq!(outcome.recoveries.iter().next().unwrap().position, 0);
}

#[test]
fn stray_delimiters_are_skipped() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00, // item delimiter
        0x08, 0x00, 0x60, 0x00, 0x02, 0x00, 0x00, 0x00, b'M', b'R',
        0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00, // sequence delimiter
    ];
    let outcome = read_dataset(Cursor::new(data), implicit()).unwrap();
    assert_eq!(outcome.dataset.len(), 1);
    assert_eq!(
        kinds(&outcome),
        vec![RecoveryKind::StrayDelimiter, RecoveryKind::StrayDelimiter]
    );
    let positions: Vec<u64> = outcome.recoveries.iter().map(|r| r.position).collect();
    assert_eq!(positions, vec![0, 18]);
}

#[test]
fn undefined_pixel_data_needs_encapsulated_syntax() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0xE0, 0x7F, 0x10, 0x00, b'O', b'B', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFE, 0xFF, 0x00, 0xE0, 0x00, 0x00, 0x00, 0x00, // empty offset table
        0xFE, 0xFF, 0x00, 0xE0, 0x04, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04,
        0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
    ];

    let outcome =
        read_dataset(Cursor::new(data), ReadOptions::for_transfer_syntax(&JPEG_BASELINE)).unwrap();
    assert!(outcome.is_clean());
    let pixel_data = outcome.dataset.get(Tag::PIXEL_DATA).unwrap();
    let fragments = pixel_data.value().fragments().unwrap();
    assert!(fragments.offset_table().is_empty());
    assert_eq!(fragments.fragments(), &[vec![1, 2, 3, 4]]);

    let err = read_dataset(Cursor::new(data), explicit()).unwrap_err();
    assert!(matches!(
        err,
        Error::Parse {
            source: ReadError::UnexpectedEncapsulation { .. },
            ..
        }
    ));
    assert_eq!(err.last_element().map(|h| h.tag), Some(Tag::PIXEL_DATA));
}

#[test]
fn undefined_pixel_data_in_implicit_syntax() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0xE0, 0x7F, 0x10, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFE, 0xFF, 0x00, 0xE0, 0x00, 0x00, 0x00, 0x00,
        0xFE, 0xFF, 0x00, 0xE0, 0x02, 0x00, 0x00, 0x00, 0xAA, 0xBB,
        0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
    ];
    let outcome = read_dataset(Cursor::new(data), implicit()).unwrap();
    assert_eq!(
        kinds(&outcome),
        vec![RecoveryKind::UndefinedPixelDataInNativeSyntax]
    );
    let pixel_data = outcome.dataset.get(Tag::PIXEL_DATA).unwrap();
    assert_eq!(pixel_data.value().fragments().unwrap().number_of_fragments(), 1);

    assert!(read_dataset(Cursor::new(data), implicit().recover(false)).is_err());
}

#[test]
fn truncated_pixel_data_keeps_what_was_read() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0xE0, 0x7F, 0x10, 0x00, b'O', b'W', 0x00, 0x00, 0x08, 0x00, 0x00, 0x00,
        0x01, 0x02, 0x03, 0x04,
    ];
    let outcome = read_dataset(Cursor::new(data), explicit()).unwrap();
    assert_eq!(kinds(&outcome), vec![RecoveryKind::TruncatedPixelData]);
    assert_eq!(bytes_of(&outcome, Tag::PIXEL_DATA), vec![1, 2, 3, 4]);

    let err = read_dataset(Cursor::new(data), explicit().recover(false)).unwrap_err();
    assert!(matches!(
        err,
        Error::Parse {
            source: ReadError::TruncatedValue { len: 8, found: 4, .. },
            ..
        }
    ));
}

#[test]
fn swapped_explicit_sequence_in_implicit_stream() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x08, 0x00, 0x18, 0x22, 0xFF, 0xFF, 0xFF, 0xFF, // (0008,2218) undefined
        0xFF, 0xFE, 0xE0, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, // big endian item
        0x00, 0x28, 0x00, 0x10, b'U', b'S', 0x00, 0x02, 0x00, 0x02,
        0xFF, 0xFE, 0xE0, 0x0D, 0x00, 0x00, 0x00, 0x00,
        0xFF, 0xFE, 0xE0, 0xDD, 0x00, 0x00, 0x00, 0x00,
    ];
    let outcome = read_dataset(Cursor::new(data), implicit()).unwrap();
    assert_eq!(kinds(&outcome), vec![RecoveryKind::ExplicitSequenceInImplicit]);
    let seq = outcome.dataset.get(Tag(0x0008, 0x2218)).unwrap();
    let items = seq.value().items().unwrap();
    assert_eq!(items.len(), 1);
    let rows = items.items()[0].nested().get(Tag(0x0028, 0x0010)).unwrap();
    assert_eq!(rows.vr(), VR::US);
    // kept in little endian in memory
    assert_eq!(rows.value().bytes().unwrap().as_bytes(), &[0x02, 0x00]);
}

#[test]
fn swapped_implicit_item_falls_back() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x08, 0x00, 0x18, 0x22, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFF, 0xFE, 0xE0, 0x00, 0x00, 0x00, 0x00, 0x0A, // big endian item, VL 10
        0x00, 0x28, 0x00, 0x10, 0x00, 0x00, 0x00, 0x02, 0x00, 0x02,
        0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
    ];
    let dict: TagVrMap = [(Tag(0x0028, 0x0010), VR::US)].into_iter().collect();
    let outcome = read_dataset_with_dictionary(Cursor::new(data), implicit(), dict).unwrap();
    assert_eq!(kinds(&outcome), vec![RecoveryKind::SwappedItem]);
    let seq = outcome.dataset.get(Tag(0x0008, 0x2218)).unwrap();
    let item = &seq.value().items().unwrap().items()[0];
    assert_eq!(item.length(), Length(10));
    let rows = item.nested().get(Tag(0x0028, 0x0010)).unwrap();
    assert_eq!(rows.value().bytes().unwrap().as_bytes(), &[0x02, 0x00]);
}

#[test]
fn swapped_item_in_explicit_sequence() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x08, 0x00, 0x18, 0x22, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFF, 0xFE, 0xE0, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
        0x00, 0x28, 0x00, 0x10, b'U', b'S', 0x00, 0x02, 0x00, 0x02,
        0xFF, 0xFE, 0xE0, 0x0D, 0x00, 0x00, 0x00, 0x00,
        0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
    ];
    let outcome = read_dataset(Cursor::new(data), explicit()).unwrap();
    assert_eq!(kinds(&outcome), vec![RecoveryKind::SwappedItem]);
    let seq = outcome.dataset.get(Tag(0x0008, 0x2218)).unwrap();
    let item = &seq.value().items().unwrap().items()[0];
    let rows = item.nested().get(Tag(0x0028, 0x0010)).unwrap();
    assert_eq!(rows.value().bytes().unwrap().as_bytes(), &[0x02, 0x00]);

    let err = read_dataset(Cursor::new(data), explicit().recover(false)).unwrap_err();
    assert!(matches!(
        err,
        Error::Parse {
            source: ReadError::UnexpectedItemTag { .. },
            ..
        }
    ));
}

#[test]
fn private_sequence_in_inverted_byte_order() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x01, 0x20, 0x5F, 0xE0, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFF, 0xFE, 0xE0, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
        0x00, 0x28, 0x00, 0x10, b'U', b'S', 0x00, 0x02, 0x00, 0x02,
        0xFF, 0xFE, 0xE0, 0x0D, 0x00, 0x00, 0x00, 0x00,
        0xFF, 0xFE, 0xE0, 0xDD, 0x00, 0x00, 0x00, 0x00,
        0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x04, 0x00, b'D', b'O', b'E', b'^',
    ];
    let outcome = read_dataset(Cursor::new(data), explicit()).unwrap();
    assert_eq!(kinds(&outcome), vec![RecoveryKind::SwappedPrivateSequence]);
    assert_eq!(outcome.dataset.len(), 2);
    assert_eq!(bytes_of(&outcome, Tag(0x0010, 0x0010)), b"DOE^");
}

#[test]
fn un_of_undefined_length_holding_implicit_items() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x09, 0x00, 0x10, 0x10, b'U', b'N', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
        0x08, 0x00, 0x00, 0x01, 0x06, 0x00, 0x00, 0x00,
        b'T', b'-', b'1', b'2', b'3', b'4',
        0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
        0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x04, 0x00, b'D', b'O', b'E', b'^',
    ];
    let outcome = read_dataset(Cursor::new(data), explicit()).unwrap();
    assert!(outcome.is_clean());
    let un = outcome.dataset.get(Tag(0x0009, 0x1010)).unwrap();
    assert_eq!(un.vr(), VR::UN);
    assert_eq!(un.wire_vr(), VR::SQ);
    let item = &un.value().items().unwrap().items()[0];
    assert!(item.nested().contains(Tag(0x0008, 0x0100)));
    assert_eq!(bytes_of(&outcome, Tag(0x0010, 0x0010)), b"DOE^");
}

#[test]
fn un_of_undefined_length_scanned_flat() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x09, 0x00, 0x10, 0x10, b'U', b'N', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06,
        0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x04, 0x00, b'D', b'O', b'E', b'^',
    ];
    let outcome = read_dataset(Cursor::new(data), explicit()).unwrap();
    // the failed sequence attempts leave nothing behind
    assert_eq!(kinds(&outcome), vec![RecoveryKind::UnFlatScan]);
    assert_eq!(bytes_of(&outcome, Tag(0x0009, 0x1010)), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(bytes_of(&outcome, Tag(0x0010, 0x0010)), b"DOE^");
}

#[test]
fn unknown_vr_triggers_whole_stream_retry() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x02, 0x00, b'M', b'R',
        0x09, 0x00, 0x10, 0x00, 0xC3, 0x81, 0x04, 0x00, 0x01, 0x02, 0x03, 0x04,
        0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x04, 0x00, b'D', b'O', b'E', b'^',
    ];
    let options = explicit().codec(ElementCodec::Explicit);
    let outcome = read_dataset(Cursor::new(data), options).unwrap();
    assert_eq!(
        kinds(&outcome),
        vec![RecoveryKind::Cp246Retry, RecoveryKind::InvalidVr]
    );
    let odd = outcome.dataset.get(Tag(0x0009, 0x0010)).unwrap();
    assert_eq!(odd.vr(), VR::UN);
    assert_eq!(outcome.dataset.len(), 3);

    let err = read_dataset(Cursor::new(data), options.recover(false)).unwrap_err();
    assert!(matches!(
        err,
        Error::Parse {
            source: ReadError::ReadHeader { .. },
            ..
        }
    ));
    assert_eq!(err.last_element().map(|h| h.tag), Some(Tag(0x0008, 0x0060)));
}

#[test]
fn defined_sequence_with_wrong_length() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x08, 0x00, 0x18, 0x22, b'S', b'Q', 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00, // VL 10
        0xFE, 0xFF, 0x00, 0xE0, 0x0E, 0x00, 0x00, 0x00,
        0x08, 0x00, 0x00, 0x01, b'S', b'H', 0x06, 0x00,
        b'T', b'-', b'1', b'2', b'3', b'4',
        0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x04, 0x00, b'D', b'O', b'E', b'^',
    ];
    let outcome = read_dataset(Cursor::new(data), explicit()).unwrap();
    assert_eq!(kinds(&outcome), vec![RecoveryKind::SequenceLengthCorrected]);
    let seq = outcome.dataset.get(Tag(0x0008, 0x2218)).unwrap();
    assert_eq!(seq.value().items().unwrap().length(), Length(22));
    assert_eq!(bytes_of(&outcome, Tag(0x0010, 0x0010)), b"DOE^");
}

#[test]
fn delimiter_inside_defined_sequence() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x08, 0x00, 0x18, 0x22, b'S', b'Q', 0x00, 0x00, 0x1E, 0x00, 0x00, 0x00, // VL 30
        0xFE, 0xFF, 0x00, 0xE0, 0x0E, 0x00, 0x00, 0x00,
        0x08, 0x00, 0x00, 0x01, b'S', b'H', 0x06, 0x00,
        b'T', b'-', b'1', b'2', b'3', b'4',
        0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
    ];
    let outcome = read_dataset(Cursor::new(data), explicit()).unwrap();
    assert_eq!(kinds(&outcome), vec![RecoveryKind::DelimiterInDefinedSequence]);
    let items = outcome.dataset.get(Tag(0x0008, 0x2218)).unwrap();
    let items = items.value().items().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.items()[1].is_delimiter());
    assert_eq!(items.length(), Length(30));
}

#[test]
fn element_longer_than_its_item() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x08, 0x00, 0x18, 0x22, b'S', b'Q', 0x00, 0x00, 0x16, 0x00, 0x00, 0x00,
        0xFE, 0xFF, 0x00, 0xE0, 0x08, 0x00, 0x00, 0x00, // item VL 8
        0x08, 0x00, 0x00, 0x01, b'S', b'H', 0x06, 0x00,
        b'T', b'-', b'1', b'2', b'3', b'4',
    ];
    let err = read_dataset(Cursor::new(data), explicit()).unwrap_err();
    assert!(matches!(
        err,
        Error::Parse {
            source: ReadError::ElementExceedsItem { len: 6, remaining: 0, .. },
            ..
        }
    ));
}

#[test]
fn nesting_limit() {
    // three sequences, each holding one item with the next one
    let mut data: Vec<u8> = Vec::new();
    for _ in 0..3 {
        data.extend_from_slice(&[0x08, 0x00, 0x18, 0x22, b'S', b'Q', 0x00, 0x00]);
        data.extend_from_slice(&[0xFF; 4]);
        data.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF]);
    }
    for _ in 0..3 {
        data.extend_from_slice(&[0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00]);
        data.extend_from_slice(&[0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00]);
    }

    let outcome = read_dataset(Cursor::new(&data), explicit().max_depth(3)).unwrap();
    assert!(outcome.is_clean());

    let err = read_dataset(Cursor::new(&data), explicit().max_depth(2)).unwrap_err();
    assert!(matches!(
        err,
        Error::Parse {
            source: ReadError::MaxDepthExceeded { max_depth: 2, .. },
            ..
        }
    ));
}

#[test]
fn base_offset_shifts_reported_positions() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x08, 0x00, 0x60, 0x00, 0x02, 0x00, 0x00, 0x00, b'M', b'R',
        0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
    ];
    let outcome = read_dataset(Cursor::new(data), implicit().base_offset(132)).unwrap();
    assert_eq!(outcome.recoveries.iter().next().unwrap().position, 142);
}

#[test]
fn undefined_length_text_is_not_read_past() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x08, 0x00, 0x60, 0x00, b'U', b'T', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, // UT undefined
        0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x04, 0x00, b'D', b'O', b'E', b'^',
        0x10, 0x00, 0x20, 0x00, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        0x10, 0x00, 0x30, 0x00, b'D', b'A', 0x08, 0x00,
        b'2', b'0', b'2', b'4', b'0', b'1', b'0', b'1',
    ];
    for options in [explicit(), explicit().recover(false)] {
        let err = read_dataset(Cursor::new(data), options).unwrap_err();
        assert!(matches!(
            err,
            Error::Parse {
                source: ReadError::UndefinedLength {
                    tag: Tag(0x0008, 0x0060),
                    vr: VR::UT,
                    ..
                },
                ..
            }
        ));
        assert_eq!(err.last_element().map(|h| h.tag), Some(Tag(0x0008, 0x0060)));
    }
}

#[test]
fn undefined_length_binary_holding_items() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x09, 0x00, 0x10, 0x10, b'O', b'B', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
        0x08, 0x00, 0x00, 0x01, b'S', b'H', 0x06, 0x00,
        b'T', b'-', b'1', b'2', b'3', b'4',
        0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
        0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x04, 0x00, b'D', b'O', b'E', b'^',
    ];
    let outcome = read_dataset(Cursor::new(data), explicit()).unwrap();
    assert_eq!(kinds(&outcome), vec![RecoveryKind::UndefinedLengthAsSequence]);
    let element = outcome.dataset.get(Tag(0x0009, 0x1010)).unwrap();
    assert_eq!(element.vr(), VR::OB);
    assert_eq!(element.wire_vr(), VR::SQ);
    let item = &element.value().items().unwrap().items()[0];
    assert!(item.nested().contains(Tag(0x0008, 0x0100)));
    assert_eq!(bytes_of(&outcome, Tag(0x0010, 0x0010)), b"DOE^");

    let err = read_dataset(Cursor::new(data), explicit().recover(false)).unwrap_err();
    assert!(matches!(
        err,
        Error::Parse {
            source: ReadError::UndefinedLength { vr: VR::OB, .. },
            ..
        }
    ));
}

#[test]
fn un_of_undefined_length_holding_explicit_items() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x09, 0x00, 0x10, 0x10, b'U', b'N', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
        0x08, 0x00, 0x00, 0x01, b'S', b'H', 0x06, 0x00, // explicit, like the parent
        b'T', b'-', b'1', b'2', b'3', b'4',
        0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
        0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x04, 0x00, b'D', b'O', b'E', b'^',
    ];
    let outcome = read_dataset(Cursor::new(data), explicit()).unwrap();
    // the implicit attempt leaves nothing behind
    assert_eq!(kinds(&outcome), vec![RecoveryKind::UnSequenceSameEncoding]);
    let un = outcome.dataset.get(Tag(0x0009, 0x1010)).unwrap();
    let items = un.value().items().unwrap();
    assert_eq!(items.len(), 1);
    let code = items.items()[0].nested().get(Tag(0x0008, 0x0100)).unwrap();
    assert_eq!(code.vr(), VR::SH);
    assert_eq!(code.value().bytes().unwrap().as_bytes(), b"T-1234");
    assert_eq!(bytes_of(&outcome, Tag(0x0010, 0x0010)), b"DOE^");
}

#[test]
fn sequence_delimiter_closes_open_item() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x08, 0x00, 0x18, 0x22, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
        0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
        0x08, 0x00, 0x00, 0x01, b'S', b'H', 0x06, 0x00,
        b'T', b'-', b'1', b'2', b'3', b'4',
        0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00, // no item delimiter
        0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x04, 0x00, b'D', b'O', b'E', b'^',
    ];
    let outcome = read_dataset(Cursor::new(data), explicit()).unwrap();
    assert_eq!(kinds(&outcome), vec![RecoveryKind::MissingItemDelimiter]);
    assert_eq!(outcome.recoveries.iter().next().unwrap().position, 34);
    let items = outcome.dataset.get(Tag(0x0008, 0x2218)).unwrap();
    let items = items.value().items().unwrap();
    assert_eq!(items.len(), 1);
    assert!(items.items()[0].nested().contains(Tag(0x0008, 0x0100)));
    assert_eq!(bytes_of(&outcome, Tag(0x0010, 0x0010)), b"DOE^");

    let err = read_dataset(Cursor::new(data), explicit().recover(false)).unwrap_err();
    assert!(matches!(
        err,
        Error::Parse {
            source: ReadError::UnexpectedItemTag { .. },
            ..
        }
    ));
}

#[test]
fn item_delimiter_inside_defined_item() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x08, 0x00, 0x18, 0x22, b'S', b'Q', 0x00, 0x00, 0x1E, 0x00, 0x00, 0x00, // VL 30
        0xFE, 0xFF, 0x00, 0xE0, 0x16, 0x00, 0x00, 0x00, // item VL 22
        0x08, 0x00, 0x00, 0x01, b'S', b'H', 0x06, 0x00,
        b'T', b'-', b'1', b'2', b'3', b'4',
        0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
        0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x04, 0x00, b'D', b'O', b'E', b'^',
    ];
    let outcome = read_dataset(Cursor::new(data), explicit()).unwrap();
    assert_eq!(kinds(&outcome), vec![RecoveryKind::DelimiterInDefinedItem]);
    let items = outcome.dataset.get(Tag(0x0008, 0x2218)).unwrap();
    let items = items.value().items().unwrap();
    assert_eq!(items.length(), Length(30));
    assert_eq!(items.len(), 1);
    assert_eq!(items.items()[0].length(), Length(22));
    assert!(items.items()[0].nested().contains(Tag(0x0008, 0x0100)));
    assert_eq!(bytes_of(&outcome, Tag(0x0010, 0x0010)), b"DOE^");

    let err = read_dataset(Cursor::new(data), explicit().recover(false)).unwrap_err();
    assert!(matches!(
        err,
        Error::Parse {
            source: ReadError::UnexpectedItemTag { .. },
            ..
        }
    ));
}

#[test]
fn un_explicit_stream() {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x02, 0x00, b'M', b'R',
        0x09, 0x00, 0x10, 0x10, b'U', b'N', 0x04, 0x00, 0x00, 0x00, // no reserved field
        0x01, 0x02, 0x03, 0x04,
        0x09, 0x00, 0x20, 0x10, b'O', b'B', 0x00, 0x00, 0x02, 0x00, 0x00, 0x00,
        0x05, 0x06,
        0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x04, 0x00, b'D', b'O', b'E', b'^',
    ];
    let outcome =
        read_dataset(Cursor::new(data), explicit().codec(ElementCodec::UnExplicit)).unwrap();
    assert!(outcome.is_clean());
    assert_eq!(outcome.dataset.len(), 4);
    assert_eq!(outcome.dataset.get(Tag(0x0009, 0x1010)).unwrap().vr(), VR::UN);
    assert_eq!(bytes_of(&outcome, Tag(0x0009, 0x1010)), vec![1, 2, 3, 4]);
    assert_eq!(bytes_of(&outcome, Tag(0x0009, 0x1020)), vec![5, 6]);
    assert_eq!(bytes_of(&outcome, Tag(0x0010, 0x0010)), b"DOE^");

    // the standard framing reads the UN length from the wrong bytes
    assert!(read_dataset(Cursor::new(data), explicit()).is_err());
}
