//! The recursive data set tree:
//! data elements, the items of a sequence, and the data sets they nest.
//!
//! Ownership flows strictly downwards.
//! A data set owns its elements, an element owns its value,
//! and a sequence value owns its items and their nested data sets,
//! so the tree has no cycles nor back references.

use crate::header::{DataElementHeader, HasLength, Header, Length, Tag, VrEncoding, VR};
use crate::value::{SequenceOfItems, Value};
use crate::vm::VM;
use std::collections::btree_map::{self, BTreeMap};
use std::ops::RangeBounds;

/// A data element: a tag, a value representation, and a value.
///
/// The value length is always derived from the value itself,
/// so that header and value cannot fall out of sync.
#[derive(Debug, Clone, PartialEq)]
pub struct DataElement {
    tag: Tag,
    vr: VR,
    value: Value,
}

impl DataElement {
    /// Create a data element from its parts.
    ///
    /// Byte values of odd length are padded to an even length
    /// with the padding byte of `vr`.
    pub fn new<V: Into<Value>>(tag: Tag, vr: VR, value: V) -> Self {
        let mut value = value.into();
        if let Value::Bytes(bytes) = &mut value {
            bytes.pad_to_even(vr.padding());
        }
        DataElement { tag, vr, value }
    }

    /// Create an element with an empty value.
    /// Sequence elements get an empty sequence of undefined length.
    pub fn empty(tag: Tag, vr: VR) -> Self {
        let value = if vr == VR::SQ {
            Value::Items(SequenceOfItems::new())
        } else {
            Value::empty()
        };
        DataElement { tag, vr, value }
    }

    /// The element's header.
    pub fn header(&self) -> DataElementHeader {
        DataElementHeader::new(self.tag, self.vr, self.length())
    }

    /// The element's tag.
    #[inline]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// The element's value representation as recorded.
    #[inline]
    pub fn vr(&self) -> VR {
        self.vr
    }

    /// Override the element's value representation.
    #[inline]
    pub fn set_vr(&mut self, vr: VR) {
        self.vr = vr;
    }

    /// The VR to put on the wire under an explicit VR encoding.
    ///
    /// A sequence of items is always written as SQ,
    /// and encapsulated pixel data as OB unless recorded as OW.
    pub fn wire_vr(&self) -> VR {
        match &self.value {
            Value::Items(_) => VR::SQ,
            Value::Fragments(_) if !self.vr.is_ob_ow() => VR::OB,
            _ => self.vr,
        }
    }

    /// The element's value.
    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Mutable access to the element's value.
    #[inline]
    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    /// Take the element's value.
    #[inline]
    pub fn into_value(self) -> Value {
        self.value
    }

    /// The number of bytes this element takes when encoded,
    /// header included.
    pub fn encoded_size(&self, encoding: VrEncoding) -> u64 {
        u64::from(encoding.header_size(self.wire_vr())) + self.value.encoded_size(encoding)
    }

    /// Count the values held by this element, as used for
    /// value multiplicity validation.
    ///
    /// Returns `None` when the count cannot be determined from the
    /// value representation (unknown or variable size binary data).
    pub fn multiplicity(&self) -> Option<u32> {
        match &self.value {
            Value::Items(_) | Value::Fragments(_) => Some(1),
            Value::Bytes(bytes) if self.vr.is_ascii() => match self.vr {
                // text which may contain backslashes
                VR::LT | VR::ST | VR::UT | VR::UR => {
                    Some(u32::from(VM::count_text_values(bytes.as_bytes()) > 0))
                }
                _ => Some(VM::count_text_values(bytes.as_bytes())),
            },
            Value::Bytes(bytes) => match (self.vr, self.vr.sample_size()) {
                (VR::OB | VR::OW | VR::OD | VR::OF | VR::OL | VR::OV, _) => {
                    Some(u32::from(!bytes.is_empty()))
                }
                (VR::UN, _) | (_, None) => None,
                (_, Some(size)) => Some((bytes.len() / size as usize) as u32),
            },
        }
    }

    /// Check this element's value count against a declared multiplicity.
    pub fn check_multiplicity(&self, vm: VM) -> bool {
        match self.multiplicity() {
            Some(0) => true,
            Some(count) => vm.is_valid(count),
            None => true,
        }
    }
}

impl HasLength for DataElement {
    #[inline]
    fn length(&self) -> Length {
        self.value.length()
    }
}

impl Header for DataElement {
    #[inline]
    fn tag(&self) -> Tag {
        self.tag
    }
}

/// A component of a sequence of items, wrapping one nested data set.
///
/// Its tag is Item (FFFE,E000),
/// except for a stray sequence delimitation item (FFFE,E0DD)
/// found inside a defined length sequence,
/// which is kept as an empty item of zero length.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    tag: Tag,
    length: Length,
    nested: DataSet,
}

impl Item {
    /// Create an item of undefined length,
    /// closed by an item delimitation item when encoded.
    pub fn new(nested: DataSet) -> Self {
        Item {
            tag: Tag::ITEM,
            length: Length::UNDEFINED,
            nested,
        }
    }

    /// Create an item of defined length.
    /// The actual length is computed when encoding.
    pub fn with_defined_length(nested: DataSet) -> Self {
        Item {
            tag: Tag::ITEM,
            length: Length(0),
            nested,
        }
    }

    /// Create an item from its raw parts, as found on the wire.
    pub fn from_parts(tag: Tag, length: Length, nested: DataSet) -> Self {
        Item {
            tag,
            length,
            nested,
        }
    }

    /// A sequence delimitation item kept inside a defined length sequence.
    pub fn sequence_delimiter() -> Self {
        Item {
            tag: Tag::SEQUENCE_DELIMITER,
            length: Length(0),
            nested: DataSet::new(),
        }
    }

    /// The item's tag.
    #[inline]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Whether this is a sequence delimitation item rather than an item.
    #[inline]
    pub fn is_delimiter(&self) -> bool {
        self.tag == Tag::SEQUENCE_DELIMITER
    }

    /// The declared item length.
    #[inline]
    pub fn length(&self) -> Length {
        self.length
    }

    /// Override the declared item length.
    #[inline]
    pub fn set_length(&mut self, length: Length) {
        self.length = length;
    }

    /// The nested data set.
    #[inline]
    pub fn nested(&self) -> &DataSet {
        &self.nested
    }

    /// Mutable access to the nested data set.
    #[inline]
    pub fn nested_mut(&mut self) -> &mut DataSet {
        &mut self.nested
    }

    /// Take the nested data set.
    #[inline]
    pub fn into_nested(self) -> DataSet {
        self.nested
    }

    /// Remove every element from the nested data set.
    pub fn clear(&mut self) {
        self.nested.clear();
    }

    /// Compute the item value length for the given encoding:
    /// the encoded size of the nested data set.
    pub fn compute_length(&self, encoding: VrEncoding) -> Length {
        if self.is_delimiter() {
            return Length(0);
        }
        Length(self.nested.encoded_size(encoding) as u32)
    }

    /// The number of bytes this item takes when encoded,
    /// item header and item delimitation item included.
    pub fn encoded_size(&self, encoding: VrEncoding) -> u64 {
        if self.is_delimiter() {
            return 8;
        }
        let nested = self.nested.encoded_size(encoding);
        if self.length.is_undefined() {
            8 + nested + 8
        } else {
            8 + nested
        }
    }

    /// Recompute every defined length in this item, recursively.
    pub fn update_lengths(&mut self, encoding: VrEncoding) {
        self.nested.update_lengths(encoding);
        if self.length.is_defined() {
            self.length = self.compute_length(encoding);
        }
    }

    /// Turn this item and its nested content into defined length form.
    pub fn make_lengths_defined(&mut self, encoding: VrEncoding) {
        self.nested.make_lengths_defined(encoding);
        self.length = self.compute_length(encoding);
    }
}

/// An ordered collection of data elements, unique by tag.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DataSet {
    entries: BTreeMap<Tag, DataElement>,
}

impl DataSet {
    /// Create an empty data set.
    pub fn new() -> Self {
        DataSet::default()
    }

    /// Insert an element, replacing and returning
    /// any previous element with the same tag.
    pub fn insert(&mut self, element: DataElement) -> Option<DataElement> {
        self.entries.insert(element.tag(), element)
    }

    /// Retrieve the element with the given tag.
    pub fn get(&self, tag: Tag) -> Option<&DataElement> {
        self.entries.get(&tag)
    }

    /// Retrieve the element with the given tag, mutably.
    pub fn get_mut(&mut self, tag: Tag) -> Option<&mut DataElement> {
        self.entries.get_mut(&tag)
    }

    /// Whether an element with the given tag exists.
    pub fn contains(&self, tag: Tag) -> bool {
        self.entries.contains_key(&tag)
    }

    /// Remove the element with the given tag.
    pub fn remove(&mut self, tag: Tag) -> Option<DataElement> {
        self.entries.remove(&tag)
    }

    /// Find the first element at or after the given tag.
    ///
    /// This is used to scan ranges of homogeneous tags,
    /// such as repeating groups of overlays or curves:
    ///
    /// ```
    /// # use dcmio_core::{DataElement, DataSet, Tag, VR};
    /// let mut ds = DataSet::new();
    /// ds.insert(DataElement::new(Tag(0x6002, 0x0010), VR::US, vec![0, 2]));
    /// let next = ds.find_next(Tag(0x6000, 0x0000)).unwrap();
    /// assert_eq!(next.tag(), Tag(0x6002, 0x0010));
    /// ```
    pub fn find_next(&self, tag: Tag) -> Option<&DataElement> {
        self.entries.range(tag..).next().map(|(_, e)| e)
    }

    /// Iterate over the elements within the given tag range.
    pub fn range<R>(&self, range: R) -> impl Iterator<Item = &DataElement>
    where
        R: RangeBounds<Tag>,
    {
        self.entries.range(range).map(|(_, e)| e)
    }

    /// Iterate over all elements in tag order.
    pub fn iter(&self) -> btree_map::Values<'_, Tag, DataElement> {
        self.entries.values()
    }

    /// Iterate mutably over all elements in tag order.
    pub fn iter_mut(&mut self) -> btree_map::ValuesMut<'_, Tag, DataElement> {
        self.entries.values_mut()
    }

    /// The number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the data set has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all elements.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The number of bytes this data set takes when encoded
    /// with the given VR encoding.
    pub fn encoded_size(&self, encoding: VrEncoding) -> u64 {
        self.iter().map(|e| e.encoded_size(encoding)).sum()
    }

    /// Recompute every defined sequence and item length
    /// in this data set, recursively, for the given encoding.
    pub fn update_lengths(&mut self, encoding: VrEncoding) {
        for element in self.iter_mut() {
            if let Value::Items(items) = element.value_mut() {
                items.update_lengths(encoding);
            }
        }
    }

    /// Turn every sequence and item in this data set,
    /// recursively, into defined length form.
    pub fn make_lengths_defined(&mut self, encoding: VrEncoding) {
        for element in self.iter_mut() {
            if let Value::Items(items) = element.value_mut() {
                items.make_lengths_defined(encoding);
            }
        }
    }
}

impl Extend<DataElement> for DataSet {
    fn extend<T: IntoIterator<Item = DataElement>>(&mut self, iter: T) {
        for element in iter {
            self.insert(element);
        }
    }
}

impl FromIterator<DataElement> for DataSet {
    fn from_iter<T: IntoIterator<Item = DataElement>>(iter: T) -> Self {
        let mut ds = DataSet::new();
        ds.extend(iter);
        ds
    }
}

impl IntoIterator for DataSet {
    type Item = DataElement;
    type IntoIter = btree_map::IntoValues<Tag, DataElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}

impl<'a> IntoIterator for &'a DataSet {
    type Item = &'a DataElement;
    type IntoIter = btree_map::Values<'a, Tag, DataElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
