//! This modules contains the fixed-size primitives for interpreting data elements:
//! the attribute tag, the value representation, the value length,
//! and the element header built on top of them.

use std::fmt;
use std::str::{from_utf8, FromStr};

/// Trait for any entity (element or item) which may have a length.
pub trait HasLength {
    /// Retrieve the value data's length as specified by the data element or
    /// item, in bytes.
    ///
    /// It is named `length` to make it distinct from the conventional method
    /// signature `len(&self) -> usize` for the number of elements of a
    /// collection.
    fn length(&self) -> Length;

    /// Check whether the value is empty (0 length).
    fn is_empty(&self) -> bool {
        self.length() == Length(0)
    }
}

/// A trait for a data type containing a header.
pub trait Header: HasLength {
    /// Retrieve the element's tag.
    fn tag(&self) -> Tag;

    /// Check whether this is the header of an item.
    fn is_item(&self) -> bool {
        self.tag() == Tag::ITEM
    }

    /// Check whether this is the header of an item delimiter.
    fn is_item_delimiter(&self) -> bool {
        self.tag() == Tag::ITEM_DELIMITER
    }

    /// Check whether this is the header of a sequence delimiter.
    fn is_sequence_delimiter(&self) -> bool {
        self.tag() == Tag::SEQUENCE_DELIMITER
    }

    /// Check whether this is the header of an encapsulated pixel data.
    fn is_encapsulated_pixeldata(&self) -> bool {
        self.tag() == Tag::PIXEL_DATA && self.length().is_undefined()
    }
}

/// A data structure for a data element header, containing
/// a tag, value representation and specified length.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct DataElementHeader {
    /// attribute tag
    pub tag: Tag,
    /// value representation
    pub vr: VR,
    /// element length
    pub len: Length,
}

impl HasLength for DataElementHeader {
    #[inline]
    fn length(&self) -> Length {
        self.len
    }
}

impl Header for DataElementHeader {
    #[inline]
    fn tag(&self) -> Tag {
        self.tag
    }
}

impl DataElementHeader {
    /// Create a new data element header with the given properties.
    /// This is just a trivial constructor.
    #[inline]
    pub fn new<T: Into<Tag>>(tag: T, vr: VR, len: Length) -> DataElementHeader {
        DataElementHeader {
            tag: tag.into(),
            vr,
            len,
        }
    }

    /// Retrieve the element's value representation, which can be unknown.
    #[inline]
    pub fn vr(&self) -> VR {
        self.vr
    }
}

impl fmt::Display for DataElementHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} ({})", self.tag, self.vr, self.len)
    }
}

/// An enum type for a value representation.
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Ord, PartialOrd)]
pub enum VR {
    /// Application Entity
    AE,
    /// Age String
    AS,
    /// Attribute Tag
    AT,
    /// Code String
    CS,
    /// Date
    DA,
    /// Decimal String
    DS,
    /// Date Time
    DT,
    /// Floating Point Single
    FL,
    /// Floating Point Double
    FD,
    /// Integer String
    IS,
    /// Long String
    LO,
    /// Long Text
    LT,
    /// Other Byte
    OB,
    /// Other Double
    OD,
    /// Other Float
    OF,
    /// Other Long
    OL,
    /// Other Very Long
    OV,
    /// Other Word
    OW,
    /// Person Name
    PN,
    /// Short String
    SH,
    /// Signed Long
    SL,
    /// Sequence of Items
    SQ,
    /// Signed Short
    SS,
    /// Short Text
    ST,
    /// Signed Very Long
    SV,
    /// Time
    TM,
    /// Unlimited Characters
    UC,
    /// Unique Identifier (UID)
    UI,
    /// Unsigned Long
    UL,
    /// Unknown
    UN,
    /// Universal Resource Identifier or Universal Resource Locator (URI/URL)
    UR,
    /// Unsigned Short
    US,
    /// Unlimited Text
    UT,
    /// Unsigned Very Long
    UV,
}

impl VR {
    /// Obtain the value representation corresponding to the given two bytes.
    /// Each byte should represent an alphabetic character in upper case.
    pub fn from_binary(chars: [u8; 2]) -> Option<Self> {
        from_utf8(chars.as_ref())
            .ok()
            .and_then(|s| VR::from_str(s).ok())
    }

    /// Check whether the two bytes form a known value representation code.
    #[inline]
    pub fn is_valid_code(chars: [u8; 2]) -> bool {
        VR::from_binary(chars).is_some()
    }

    /// Retrieve a string representation of this VR.
    pub fn to_string(self) -> &'static str {
        use VR::*;
        match self {
            AE => "AE",
            AS => "AS",
            AT => "AT",
            CS => "CS",
            DA => "DA",
            DS => "DS",
            DT => "DT",
            FL => "FL",
            FD => "FD",
            IS => "IS",
            LO => "LO",
            LT => "LT",
            OB => "OB",
            OD => "OD",
            OF => "OF",
            OL => "OL",
            OV => "OV",
            OW => "OW",
            PN => "PN",
            SH => "SH",
            SL => "SL",
            SQ => "SQ",
            SS => "SS",
            ST => "ST",
            SV => "SV",
            TM => "TM",
            UC => "UC",
            UI => "UI",
            UL => "UL",
            UN => "UN",
            UR => "UR",
            US => "US",
            UT => "UT",
            UV => "UV",
        }
    }

    /// Retrieve a copy of this VR's byte representation.
    /// The function returns two alphabetic characters in upper case.
    pub fn to_bytes(self) -> [u8; 2] {
        let bytes = self.to_string().as_bytes();
        [bytes[0], bytes[1]]
    }

    /// The width in bytes of the value length field
    /// which follows this VR in an explicit VR encoding.
    ///
    /// PS3.5 7.1.2: AE, AS, AT, CS, DA, DS, DT, FL, FD, IS, LO, LT, PN,
    /// SH, SL, SS, ST, TM, UI, UL and US carry a 16-bit length.
    /// All other VRs are followed by two reserved bytes
    /// and a 32-bit length.
    pub fn length_field_size(self) -> u32 {
        use VR::*;
        match self {
            AE | AS | AT | CS | DA | DS | DT | FL | FD | IS | LO | LT | PN | SH | SL | SS
            | ST | TM | UI | UL | US => 2,
            OB | OD | OF | OL | OV | OW | SQ | SV | UC | UN | UR | UT | UV => 4,
        }
    }

    /// Whether values of this representation are character strings,
    /// which are never byte swapped.
    pub fn is_ascii(self) -> bool {
        use VR::*;
        matches!(
            self,
            AE | AS | CS | DA | DS | DT | IS | LO | LT | PN | SH | ST | TM | UC | UI | UR | UT
        )
    }

    /// Whether values of this representation are binary data.
    #[inline]
    pub fn is_binary(self) -> bool {
        !self.is_ascii()
    }

    /// The byte appended to odd length values of this representation.
    ///
    /// Text is padded with a space, except for UIDs and binary data,
    /// which take a NUL.
    #[inline]
    pub fn padding(self) -> u8 {
        if self.is_ascii() && self != VR::UI {
            b' '
        } else {
            0
        }
    }

    /// Whether this is one of the VRs admitted for native pixel data.
    #[inline]
    pub fn is_ob_ow(self) -> bool {
        matches!(self, VR::OB | VR::OW)
    }

    /// The size of a single value sample, in bytes,
    /// or `None` if the representation has no fixed sample size.
    pub fn sample_size(self) -> Option<u32> {
        use VR::*;
        match self {
            OB | UN => Some(1),
            OW | SS | US => Some(2),
            FL | OF | OL | SL | UL | AT => Some(4),
            FD | OD | OV | SV | UV => Some(8),
            _ => None,
        }
    }

    /// The width of each byte swap unit when converting
    /// a value of this representation between byte orders.
    ///
    /// Returns `1` when the value is never swapped:
    /// text, single byte data, unknown data, and sequences.
    /// Attribute tags are swapped in 2-byte units,
    /// since they are pairs of 16-bit numbers.
    pub fn swap_width(self) -> u32 {
        match self {
            VR::AT => 2,
            VR::UN | VR::SQ => 1,
            vr if vr.is_ascii() => 1,
            vr => vr.sample_size().unwrap_or(1),
        }
    }
}

/// Obtain the value representation corresponding to the given string.
/// The string should hold exactly two UTF-8 encoded alphabetic characters
/// in upper case, otherwise no match is made.
impl FromStr for VR {
    type Err = &'static str;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        use VR::*;
        match string {
            "AE" => Ok(AE),
            "AS" => Ok(AS),
            "AT" => Ok(AT),
            "CS" => Ok(CS),
            "DA" => Ok(DA),
            "DS" => Ok(DS),
            "DT" => Ok(DT),
            "FL" => Ok(FL),
            "FD" => Ok(FD),
            "IS" => Ok(IS),
            "LO" => Ok(LO),
            "LT" => Ok(LT),
            "OB" => Ok(OB),
            "OD" => Ok(OD),
            "OF" => Ok(OF),
            "OL" => Ok(OL),
            "OV" => Ok(OV),
            "OW" => Ok(OW),
            "PN" => Ok(PN),
            "SH" => Ok(SH),
            "SL" => Ok(SL),
            "SQ" => Ok(SQ),
            "SS" => Ok(SS),
            "ST" => Ok(ST),
            "SV" => Ok(SV),
            "TM" => Ok(TM),
            "UC" => Ok(UC),
            "UI" => Ok(UI),
            "UL" => Ok(UL),
            "UN" => Ok(UN),
            "UR" => Ok(UR),
            "US" => Ok(US),
            "UT" => Ok(UT),
            "UV" => Ok(UV),
            _ => Err("no such value representation"),
        }
    }
}

impl fmt::Display for VR {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(VR::to_string(*self))
    }
}

/// Idiomatic alias for a tag's group number.
pub type GroupNumber = u16;
/// Idiomatic alias for a tag's element number.
pub type ElementNumber = u16;

/// The data type for data element tags.
///
/// Tags are ordered by group, then by element,
/// which is the order of elements in a data set.
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Copy)]
pub struct Tag(pub GroupNumber, pub ElementNumber);

impl Tag {
    /// Item (FFFE,E000)
    pub const ITEM: Tag = Tag(0xFFFE, 0xE000);
    /// Item Delimitation Item (FFFE,E00D)
    pub const ITEM_DELIMITER: Tag = Tag(0xFFFE, 0xE00D);
    /// Sequence Delimitation Item (FFFE,E0DD)
    pub const SEQUENCE_DELIMITER: Tag = Tag(0xFFFE, 0xE0DD);
    /// Pixel Data (7FE0,0010)
    pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

    /// Getter for the tag's group value.
    #[inline]
    pub fn group(self) -> GroupNumber {
        self.0
    }

    /// Getter for the tag's element value.
    #[inline]
    pub fn element(self) -> ElementNumber {
        self.1
    }

    /// Whether the tag belongs to a private group (odd group number).
    #[inline]
    pub fn is_private(self) -> bool {
        self.0 % 2 == 1
    }

    /// Whether this is a group length tag (gggg,0000).
    #[inline]
    pub fn is_group_length(self) -> bool {
        self.1 == 0x0000
    }

    /// Whether this is a private creator tag (odd group, element 0010-00FF).
    #[inline]
    pub fn is_private_creator(self) -> bool {
        self.is_private() && (0x0010..=0x00FF).contains(&self.1)
    }

    /// Whether this is one of the three structural delimiter tags
    /// (item, item delimiter, sequence delimiter).
    #[inline]
    pub fn is_delimiter(self) -> bool {
        self.0 == 0xFFFE
    }

    /// Obtain the tag that would have been read
    /// had the group and element been encoded in the opposite byte order.
    ///
    /// ```
    /// # use dcmio_core::Tag;
    /// assert_eq!(Tag(0xFFFE, 0xE000).swapped(), Tag(0xFEFF, 0x00E0));
    /// ```
    #[inline]
    pub fn swapped(self) -> Tag {
        Tag(self.0.swap_bytes(), self.1.swap_bytes())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({:#06X?}, {:#06X?})", self.0, self.1)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.0, self.1)
    }
}

impl PartialEq<(u16, u16)> for Tag {
    fn eq(&self, other: &(u16, u16)) -> bool {
        self.0 == other.0 && self.1 == other.1
    }
}

impl From<(u16, u16)> for Tag {
    #[inline]
    fn from(value: (u16, u16)) -> Tag {
        Tag(value.0, value.1)
    }
}

impl From<[u16; 2]> for Tag {
    #[inline]
    fn from(value: [u16; 2]) -> Tag {
        Tag(value[0], value[1])
    }
}

/// A type for representing value length, in bytes.
/// An internal value of `0xFFFF_FFFF` represents an undefined
/// (unspecified) length, which would have to be determined
/// with a traversal based on the content's encoding.
///
/// Two undefined lengths compare equal,
/// so that a decoded tree can be compared structurally.
/// Any addition with at least one undefined length
/// results in an undefined length.
///
/// ```
/// # use dcmio_core::Length;
/// assert!((Length::defined(64) + Length::UNDEFINED).is_undefined());
/// assert_eq!(Length::defined(8) + Length::defined(4), Length(12));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Length(pub u32);

const UNDEFINED_LEN: u32 = 0xFFFF_FFFF;

impl Length {
    /// A length that is undefined.
    pub const UNDEFINED: Self = Length(UNDEFINED_LEN);

    /// Create a new length value with the given number of bytes.
    ///
    /// # Panic
    ///
    /// This function will panic if `len` represents an undefined length.
    #[inline]
    pub fn defined(len: u32) -> Self {
        assert_ne!(len, UNDEFINED_LEN);
        Length(len)
    }

    /// Check whether this length is undefined (unknown).
    #[inline]
    pub fn is_undefined(self) -> bool {
        self.0 == UNDEFINED_LEN
    }

    /// Check whether this length is well defined (not undefined).
    #[inline]
    pub fn is_defined(self) -> bool {
        !self.is_undefined()
    }

    /// Fetch the concrete length value, if available.
    /// Returns `None` if it represents an undefined length.
    #[inline]
    pub fn get(self) -> Option<u32> {
        match self.0 {
            UNDEFINED_LEN => None,
            v => Some(v),
        }
    }
}

impl From<u32> for Length {
    #[inline]
    fn from(o: u32) -> Self {
        Length(o)
    }
}

impl std::ops::Add<Length> for Length {
    type Output = Self;

    fn add(self, rhs: Length) -> Self::Output {
        match (self.0, rhs.0) {
            (UNDEFINED_LEN, _) | (_, UNDEFINED_LEN) => Length::UNDEFINED,
            (l1, l2) => {
                let o = l1.saturating_add(l2);
                debug_assert!(
                    o != UNDEFINED_LEN,
                    "integer overflow (0xFFFF_FFFF reserved for undefined length)"
                );
                Length(o)
            }
        }
    }
}

impl std::ops::Add<u32> for Length {
    type Output = Self;

    fn add(self, rhs: u32) -> Self::Output {
        self + Length(rhs)
    }
}

impl fmt::Debug for Length {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            UNDEFINED_LEN => f.write_str("Length(Undefined)"),
            l => f.debug_tuple("Length").field(&l).finish(),
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            UNDEFINED_LEN => f.write_str("U/L"),
            l => write!(f, "{}", &l),
        }
    }
}

/// The framing flavor a data set is encoded with,
/// which determines the size of each element header.
///
/// Encoded lengths of nested content depend on this choice,
/// so length computations are parameterized by it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VrEncoding {
    /// The VR is not present on the wire.
    Implicit,
    /// The VR is written as two characters after the tag.
    Explicit,
}

impl VrEncoding {
    /// The number of bytes taken by a data element header
    /// with the given value representation.
    pub fn header_size(self, vr: VR) -> u32 {
        match self {
            VrEncoding::Implicit => 8,
            VrEncoding::Explicit if vr.length_field_size() == 2 => 8,
            VrEncoding::Explicit => 12,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vr_length_field_classes() {
        assert_eq!(VR::CS.length_field_size(), 2);
        assert_eq!(VR::AT.length_field_size(), 2);
        assert_eq!(VR::OB.length_field_size(), 4);
        assert_eq!(VR::UN.length_field_size(), 4);
        assert_eq!(VR::SQ.length_field_size(), 4);
        assert_eq!(VR::UC.length_field_size(), 4);
    }

    #[test]
    fn vr_swap_widths() {
        assert_eq!(VR::AT.swap_width(), 2);
        assert_eq!(VR::US.swap_width(), 2);
        assert_eq!(VR::UL.swap_width(), 4);
        assert_eq!(VR::FD.swap_width(), 8);
        assert_eq!(VR::OB.swap_width(), 1);
        assert_eq!(VR::UN.swap_width(), 1);
        assert_eq!(VR::LO.swap_width(), 1);
        assert!(VR::OW.is_ob_ow());
        assert!(!VR::OF.is_ob_ow());
    }

    #[test]
    fn vr_from_binary() {
        assert_eq!(VR::from_binary(*b"CS"), Some(VR::CS));
        assert_eq!(VR::from_binary([0x2C, 0x00]), None);
        assert!(!VR::is_valid_code(*b"cs"));
        assert_eq!(VR::UV.to_bytes(), *b"UV");
    }

    #[test]
    fn tag_predicates() {
        assert!(Tag(0x0009, 0x0010).is_private_creator());
        assert!(!Tag(0x0009, 0x1010).is_private_creator());
        assert!(Tag(0x0028, 0x0000).is_group_length());
        assert!(Tag::ITEM.is_delimiter());
        assert_eq!(Tag(0x0010, 0x0010).to_string(), "(0010,0010)");
        assert!(Tag(0x0008, 0xFFFF) < Tag(0x0010, 0x0000));
    }

    #[test]
    fn header_sizes() {
        assert_eq!(VrEncoding::Implicit.header_size(VR::OB), 8);
        assert_eq!(VrEncoding::Explicit.header_size(VR::CS), 8);
        assert_eq!(VrEncoding::Explicit.header_size(VR::SQ), 12);
    }
}
