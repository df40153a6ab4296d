//! Sequences of items.

use crate::dataset::Item;
use crate::header::{Length, VrEncoding};

/// An ordered list of items, each wrapping a nested data set.
///
/// The declared length is either undefined,
/// in which case a sequence delimitation item closes the sequence,
/// or defined, in which case it is recomputed from the nested content
/// whenever the sequence is encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceOfItems {
    items: Vec<Item>,
    length: Length,
}

impl Default for SequenceOfItems {
    fn default() -> Self {
        SequenceOfItems::new()
    }
}

impl SequenceOfItems {
    /// Create an empty sequence of undefined length.
    pub fn new() -> Self {
        SequenceOfItems {
            items: Vec::new(),
            length: Length::UNDEFINED,
        }
    }

    /// Create a sequence of undefined length with the given items.
    pub fn from_items(items: Vec<Item>) -> Self {
        SequenceOfItems {
            items,
            length: Length::UNDEFINED,
        }
    }

    /// Create a sequence of defined length with the given items.
    /// The length is computed for the given encoding.
    pub fn defined(items: Vec<Item>, encoding: VrEncoding) -> Self {
        let mut seq = SequenceOfItems {
            items,
            length: Length(0),
        };
        seq.length = seq.compute_length(encoding);
        seq
    }

    /// The declared length of the sequence.
    #[inline]
    pub fn length(&self) -> Length {
        self.length
    }

    /// Override the declared length of the sequence.
    #[inline]
    pub fn set_length(&mut self, length: Length) {
        self.length = length;
    }

    /// Whether the sequence is delimited (undefined length).
    #[inline]
    pub fn is_undefined_length(&self) -> bool {
        self.length.is_undefined()
    }

    /// The items of the sequence.
    #[inline]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Mutable access to the items of the sequence.
    #[inline]
    pub fn items_mut(&mut self) -> &mut Vec<Item> {
        &mut self.items
    }

    /// Append an item.
    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    /// The number of items.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the sequence has no items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Compute the value length of the sequence content
    /// when encoded with the given VR encoding,
    /// excluding any sequence delimitation item.
    ///
    /// Implicit and explicit encodings yield different lengths,
    /// since every nested element header has a different size.
    pub fn compute_length(&self, encoding: VrEncoding) -> Length {
        Length(
            self.items
                .iter()
                .map(|item| item.encoded_size(encoding))
                .sum::<u64>() as u32,
        )
    }

    /// The number of bytes this sequence value takes when encoded,
    /// including the sequence delimitation item if the length is undefined.
    pub fn encoded_size(&self, encoding: VrEncoding) -> u64 {
        let content = self
            .items
            .iter()
            .map(|item| item.encoded_size(encoding))
            .sum::<u64>();
        if self.length.is_undefined() {
            content + 8
        } else {
            content
        }
    }

    /// Recompute every defined length in this sequence,
    /// recursively, for the given encoding.
    pub fn update_lengths(&mut self, encoding: VrEncoding) {
        for item in &mut self.items {
            item.update_lengths(encoding);
        }
        if self.length.is_defined() {
            self.length = self.compute_length(encoding);
        }
    }

    /// Turn this sequence and all of its items,
    /// recursively, into defined length form.
    pub fn make_lengths_defined(&mut self, encoding: VrEncoding) {
        for item in &mut self.items {
            item.make_lengths_defined(encoding);
        }
        self.length = self.compute_length(encoding);
    }
}

impl FromIterator<Item> for SequenceOfItems {
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        SequenceOfItems::from_items(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DataElement, DataSet};
    use crate::header::{Tag, VR};

    fn item_with_code_string() -> Item {
        let mut ds = DataSet::new();
        ds.insert(DataElement::new(Tag(0x0008, 0x0100), VR::SH, "T-1234"));
        Item::new(ds)
    }

    #[test]
    fn length_depends_on_encoding() {
        let seq = SequenceOfItems::defined(vec![item_with_code_string()], VrEncoding::Explicit);
        // item header (8) + element header (8) + value (6) + item delimiter (8)
        assert_eq!(seq.length(), Length(30));
        // implicit element header has the same size for short VRs
        assert_eq!(seq.compute_length(VrEncoding::Implicit), Length(30));

        let mut ds = DataSet::new();
        ds.insert(DataElement::new(Tag(0x0009, 0x1001), VR::OB, vec![1, 2]));
        let seq = SequenceOfItems::defined(vec![Item::with_defined_length(ds)], VrEncoding::Explicit);
        // item header (8) + element header (12) + value (2)
        assert_eq!(seq.length(), Length(22));
        assert_eq!(seq.compute_length(VrEncoding::Implicit), Length(18));
    }

    #[test]
    fn undefined_length_adds_delimiter() {
        let seq = SequenceOfItems::from_items(vec![item_with_code_string()]);
        assert!(seq.is_undefined_length());
        assert_eq!(seq.encoded_size(VrEncoding::Explicit), 38);
    }
}
