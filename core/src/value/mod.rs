//! Value containers.
//!
//! A data element's value takes exactly one of three shapes,
//! chosen at parse time from the element's tag, VR and length:
//!
//! - [`ByteValue`]: an opaque buffer of VL bytes, padded to an even length;
//! - [`SequenceOfItems`]: a list of nested data sets (VR SQ,
//!   or an undefined length field which turned out to be a sequence);
//! - [`SequenceOfFragments`]: encapsulated pixel data with undefined length.
//!
//! Binary values are kept in little endian byte order in memory,
//! whatever the byte order of the stream they were read from.

use crate::header::{Length, VrEncoding};

pub mod fragments;
pub mod sequence;

pub use self::fragments::SequenceOfFragments;
pub use self::sequence::SequenceOfItems;

/// The value of a data element.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A flat byte buffer.
    Bytes(ByteValue),
    /// A sequence of items, each holding a nested data set.
    Items(SequenceOfItems),
    /// A sequence of opaque pixel data fragments.
    Fragments(SequenceOfFragments),
}

impl Value {
    /// An empty byte value.
    pub fn empty() -> Self {
        Value::Bytes(ByteValue::default())
    }

    /// The value length as it would be declared in the element header.
    ///
    /// Byte values always have a defined length,
    /// fragment sequences never do,
    /// and item sequences report their declared length.
    pub fn length(&self) -> Length {
        match self {
            Value::Bytes(v) => v.length(),
            Value::Items(v) => v.length(),
            Value::Fragments(_) => Length::UNDEFINED,
        }
    }

    /// The number of bytes this value takes when encoded,
    /// including delimitation items for undefined lengths.
    pub fn encoded_size(&self, encoding: VrEncoding) -> u64 {
        match self {
            Value::Bytes(v) => u64::from(v.even_length().0),
            Value::Items(v) => v.encoded_size(encoding),
            Value::Fragments(v) => v.encoded_size(),
        }
    }

    /// Retrieve the byte buffer, if this is a flat value.
    pub fn bytes(&self) -> Option<&ByteValue> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// Retrieve the item sequence, if this is a sequence of items.
    pub fn items(&self) -> Option<&SequenceOfItems> {
        match self {
            Value::Items(v) => Some(v),
            _ => None,
        }
    }

    /// Retrieve the item sequence mutably, if this is a sequence of items.
    pub fn items_mut(&mut self) -> Option<&mut SequenceOfItems> {
        match self {
            Value::Items(v) => Some(v),
            _ => None,
        }
    }

    /// Retrieve the fragment sequence, if this is encapsulated pixel data.
    pub fn fragments(&self) -> Option<&SequenceOfFragments> {
        match self {
            Value::Fragments(v) => Some(v),
            _ => None,
        }
    }
}

impl From<ByteValue> for Value {
    fn from(v: ByteValue) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(ByteValue::from(v))
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(ByteValue::from(v.to_vec()))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Bytes(ByteValue::from(v))
    }
}

impl From<SequenceOfItems> for Value {
    fn from(v: SequenceOfItems) -> Self {
        Value::Items(v)
    }
}

impl From<SequenceOfFragments> for Value {
    fn from(v: SequenceOfFragments) -> Self {
        Value::Fragments(v)
    }
}

/// An opaque, length-prefixed byte buffer.
///
/// No semantic interpretation is made of its contents.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct ByteValue {
    data: Vec<u8>,
}

impl ByteValue {
    /// Create a byte value from its buffer.
    pub fn new(data: Vec<u8>) -> Self {
        ByteValue { data }
    }

    /// Resize the buffer to the given length,
    /// padding with zeros or truncating as needed.
    pub fn set_length(&mut self, len: u32) {
        self.data.resize(len as usize, 0);
    }

    /// The declared length of this value, always defined.
    #[inline]
    pub fn length(&self) -> Length {
        Length(self.data.len() as u32)
    }

    /// The length this value takes when encoded,
    /// rounded up to the next even number.
    #[inline]
    pub fn even_length(&self) -> Length {
        Length(((self.data.len() + 1) & !1) as u32)
    }

    /// Append `pad` if the buffer has an odd length.
    pub fn pad_to_even(&mut self, pad: u8) {
        if self.data.len() % 2 == 1 {
            self.data.push(pad);
        }
    }

    /// The number of bytes in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read access to the buffer.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Write access to the buffer.
    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Take the underlying buffer.
    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for ByteValue {
    fn from(data: Vec<u8>) -> Self {
        ByteValue { data }
    }
}

impl From<&str> for ByteValue {
    fn from(text: &str) -> Self {
        ByteValue {
            data: text.as_bytes().to_vec(),
        }
    }
}

impl AsRef<[u8]> for ByteValue {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
