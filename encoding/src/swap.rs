//! Byte order state and the byte swapping primitives.
//!
//! The active [`SwapCode`] is threaded explicitly through every read and
//! write call, so that a nested region of the stream
//! can be processed under a different policy than its parent.

use byteordered::Endianness;
use dcmio_core::VR;

/// The byte order convention in force for a region of the stream.
///
/// The "bad" variants stand for a region whose producer declared one
/// byte order but wrote multi-byte fields in the opposite one,
/// as seen in some private sequences.
/// A bad little endian region is read as big endian, and vice versa.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SwapCode {
    /// Not determined yet. Read as little endian.
    Unknown,
    /// Little endian, the byte order of most transfer syntaxes.
    #[default]
    LittleEndian,
    /// Big endian.
    BigEndian,
    /// Declared little endian, actually big endian.
    BadLittleEndian,
    /// Declared big endian, actually little endian.
    BadBigEndian,
}

impl SwapCode {
    /// The byte order in which multi-byte fields are actually encoded.
    pub fn endianness(self) -> Endianness {
        match self {
            SwapCode::Unknown | SwapCode::LittleEndian | SwapCode::BadBigEndian => {
                Endianness::Little
            }
            SwapCode::BigEndian | SwapCode::BadLittleEndian => Endianness::Big,
        }
    }

    /// The swap code of a region written in the opposite byte order
    /// of this one.
    ///
    /// Inverting twice yields the original policy,
    /// except for `Unknown` which is resolved to little endian first.
    ///
    /// ```
    /// # use dcmio_encoding::swap::SwapCode;
    /// assert_eq!(SwapCode::LittleEndian.inverted(), SwapCode::BadLittleEndian);
    /// assert_eq!(SwapCode::LittleEndian.inverted().inverted(), SwapCode::LittleEndian);
    /// ```
    pub fn inverted(self) -> SwapCode {
        match self {
            SwapCode::Unknown | SwapCode::LittleEndian => SwapCode::BadLittleEndian,
            SwapCode::BadLittleEndian => SwapCode::LittleEndian,
            SwapCode::BigEndian => SwapCode::BadBigEndian,
            SwapCode::BadBigEndian => SwapCode::BigEndian,
        }
    }

    /// Whether this policy contradicts the declared byte order.
    pub fn is_bad(self) -> bool {
        matches!(self, SwapCode::BadLittleEndian | SwapCode::BadBigEndian)
    }

    /// Whether multi-byte values must be swapped
    /// to and from their little endian in-memory form.
    #[inline]
    pub fn needs_swap(self) -> bool {
        self.endianness() == Endianness::Big
    }
}

impl From<Endianness> for SwapCode {
    fn from(e: Endianness) -> Self {
        match e {
            Endianness::Little => SwapCode::LittleEndian,
            Endianness::Big => SwapCode::BigEndian,
        }
    }
}

/// Reverse the bytes of each `width` sized unit of the buffer, in place.
///
/// Widths of 0 or 1 leave the buffer untouched.
/// A trailing partial unit is left as is.
pub fn swap_in_place(buf: &mut [u8], width: usize) {
    if width <= 1 {
        return;
    }
    for unit in buf.chunks_exact_mut(width) {
        unit.reverse();
    }
}

/// Convert a value of the given representation between
/// the stream byte order and the little endian in-memory form.
///
/// The conversion is its own inverse.
/// Character strings and single byte data are never swapped,
/// and attribute tags are swapped in 2-byte units.
pub fn swap_value(buf: &mut [u8], vr: VR, swap: SwapCode) {
    if swap.needs_swap() {
        swap_in_place(buf, vr.swap_width() as usize);
    }
}
