//! Length bookkeeping across nested sequences.
use dcmio_core::{DataElement, DataSet, Item, Length, SequenceOfItems, Tag, VrEncoding, VR};
use pretty_assertions::assert_eq;

const OUTER: Tag = Tag(0x0040, 0x0275);
const INNER: Tag = Tag(0x0040, 0x0008);

fn nested_tree() -> DataSet {
    let mut code = DataSet::new();
    code.insert(DataElement::new(Tag(0x0008, 0x0100), VR::SH, "T-1234"));

    let mut step = DataSet::new();
    step.insert(DataElement::new(
        INNER,
        VR::SQ,
        SequenceOfItems::from_items(vec![Item::new(code)]),
    ));

    let mut ds = DataSet::new();
    ds.insert(DataElement::new(
        OUTER,
        VR::SQ,
        SequenceOfItems::from_items(vec![Item::new(step)]),
    ));
    ds
}

fn lengths(ds: &DataSet) -> (Length, Length) {
    let outer = ds.get(OUTER).unwrap().value().items().unwrap();
    let inner = outer.items()[0]
        .nested()
        .get(INNER)
        .unwrap()
        .value()
        .items()
        .unwrap();
    (outer.length(), inner.length())
}

#[test]
fn defined_lengths_follow_the_encoding() {
    let mut ds = nested_tree();
    assert_eq!(lengths(&ds), (Length::UNDEFINED, Length::UNDEFINED));

    ds.make_lengths_defined(VrEncoding::Explicit);
    // inner: item header + short element header + 6 bytes
    // outer: item header + SQ header (12) + inner
    assert_eq!(lengths(&ds), (Length(42), Length(22)));

    // SQ headers shrink to 8 bytes without the VR
    ds.update_lengths(VrEncoding::Implicit);
    assert_eq!(lengths(&ds), (Length(38), Length(22)));
    assert_eq!(ds.encoded_size(VrEncoding::Implicit), 8 + 38);
}

#[test]
fn undefined_lengths_are_left_alone() {
    let mut ds = nested_tree();
    ds.update_lengths(VrEncoding::Explicit);
    assert_eq!(lengths(&ds), (Length::UNDEFINED, Length::UNDEFINED));
    // every sequence and item adds its delimiter
    assert_eq!(ds.encoded_size(VrEncoding::Explicit), 12 + 8 + 12 + 8 + 14 + 8 + 8 + 8 + 8);
}
