//! This module contains the data element header decoding logic
//! of the four element codec variants.
//!
//! Only the fixed-size framing is decoded here:
//! tag, value representation and value length.
//! Choosing the shape of the value and reading it
//! is left to the data set reader, which owns the stream position.

use crate::swap::SwapCode;
use byteordered::Endianness;
use dcmio_core::dictionary::{implicit_vr, VrDictionary};
use dcmio_core::header::{DataElementHeader, Length, Tag, VrEncoding, VR};
use snafu::{Backtrace, ResultExt, Snafu};
use std::io::{self, Read};

pub mod basic;

use self::basic::BasicDecoder;

/// Module-level error type:
/// for errors which may occur while decoding element headers.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Failed to read the header's tag field: {}", source))]
    ReadTag {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the value representation of {}: {}", tag, source))]
    ReadVr {
        tag: Tag,
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the reserved bytes of {}: {}", tag, source))]
    ReadReserved {
        tag: Tag,
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to read the value length of {}: {}", tag, source))]
    ReadLength {
        tag: Tag,
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display(
        "Invalid value representation {:02X?} for element {}",
        bytes,
        tag
    ))]
    InvalidVr {
        tag: Tag,
        bytes: [u8; 2],
        backtrace: Backtrace,
    },
    #[snafu(display("Unexpected delimiter {} where a data element was expected", tag))]
    UnexpectedDelimiter { tag: Tag, backtrace: Backtrace },
}

impl Error {
    /// Whether the error was caused by an unrecognized VR code.
    pub fn is_invalid_vr(&self) -> bool {
        matches!(self, Error::InvalidVr { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/** Type trait for reading and decoding basic data values from a data source.
 *
 * This trait aims to provide methods for reading binary numbers based on the
 * source's endianness. Only the integer widths needed by element framing
 * are decoded here: value contents are kept as raw bytes.
 */
pub trait BasicDecode {
    /// Retrieve the source's endianness, as expected by this decoder.
    fn endianness(&self) -> Endianness;

    /// Decode an unsigned short value from the given source.
    fn decode_us<S>(&self, source: S) -> io::Result<u16>
    where
        S: Read;

    /// Decode an unsigned long value from the given source.
    fn decode_ul<S>(&self, source: S) -> io::Result<u32>
    where
        S: Read;

    /// Decode a DICOM attribute tag from the given source.
    fn decode_tag<S>(&self, mut source: S) -> io::Result<Tag>
    where
        S: Read,
    {
        let g = self.decode_us(&mut source)?;
        let e = self.decode_us(source)?;
        Ok(Tag(g, e))
    }
}

/// The element codec variant, selecting how VR and VL are derived
/// from the bytes following each tag.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ElementCodec {
    /// VR not on the wire: resolved from a dictionary,
    /// followed by a 32-bit length.
    Implicit,
    /// Standard explicit VR. Unknown VR codes are an error.
    #[default]
    Explicit,
    /// Explicit VR tolerating unknown VR codes,
    /// which are read as UN followed by a 16-bit length.
    Cp246Explicit,
    /// Explicit VR where UN is followed by its 32-bit length directly,
    /// without the reserved bytes.
    UnExplicit,
}

/// A correction applied to a header that was read
/// from a known broken producer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeaderFixup {
    /// A length of 13 read as 10 under implicit VR.
    GeLength13,
    /// The corrupt Papyrus length 0x031F031C read as 202.
    PapyrusLength,
    /// An unknown VR code read as UN with a 16-bit length.
    InvalidVr([u8; 2]),
}

impl HeaderFixup {
    /// The length found on the wire, for the fixups which replaced it.
    pub fn original_length(self) -> Option<Length> {
        match self {
            HeaderFixup::GeLength13 => Some(Length(13)),
            HeaderFixup::PapyrusLength => Some(Length(PAPYRUS_BAD_LENGTH)),
            HeaderFixup::InvalidVr(_) => None,
        }
    }
}

/// A decoded element header, as found on the wire.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DecodedHeader {
    /// The element header.
    /// Delimiters are reported with VR UN.
    pub header: DataElementHeader,
    /// The number of bytes consumed by the header.
    pub size: u32,
    /// A correction applied while decoding, if any.
    pub fixup: Option<HeaderFixup>,
}

const GE_LENGTH_EXCEPTIONS: [Tag; 2] = [Tag(0x0008, 0x0070), Tag(0x0008, 0x0080)];
const PAPYRUS_TAG: Tag = Tag(0x031E, 0x0324);
const PAPYRUS_BAD_LENGTH: u32 = 0x031F_031C;
const PAPYRUS_LENGTH: u32 = 202;

impl ElementCodec {
    /// The VR encoding used when computing lengths for this variant.
    pub fn vr_encoding(self) -> VrEncoding {
        match self {
            ElementCodec::Implicit => VrEncoding::Implicit,
            _ => VrEncoding::Explicit,
        }
    }

    /// Whether the VR is carried on the wire.
    #[inline]
    pub fn is_explicit(self) -> bool {
        self != ElementCodec::Implicit
    }

    /// The codec to attempt first when a UN element of undefined length
    /// turns out to hold a sequence of items written in the other encoding.
    pub fn other(self) -> ElementCodec {
        match self {
            ElementCodec::Implicit => ElementCodec::Explicit,
            _ => ElementCodec::Implicit,
        }
    }

    /// Decode the next element header from the source.
    ///
    /// Returns `Ok(None)` if the source ended cleanly before the tag,
    /// which is the normal end of a data set.
    /// A partially read tag is an error.
    ///
    /// Item and sequence delimiters are decoded in their implicit form
    /// (tag and 32-bit length), with VR UN.
    pub fn decode_header<S, D>(
        self,
        source: &mut S,
        swap: SwapCode,
        dict: &D,
    ) -> Result<Option<DecodedHeader>>
    where
        S: ?Sized + Read,
        D: ?Sized + VrDictionary,
    {
        let decoder = BasicDecoder::from(swap);
        let tag = match read_tag_or_eof(source, swap)? {
            Some(tag) => tag,
            None => return Ok(None),
        };

        if tag.is_delimiter() {
            if self == ElementCodec::UnExplicit && tag == Tag::SEQUENCE_DELIMITER {
                return UnexpectedDelimiterSnafu { tag }.fail();
            }
            let len = decoder.decode_ul(&mut *source).context(ReadLengthSnafu { tag })?;
            return Ok(Some(DecodedHeader {
                header: DataElementHeader::new(tag, VR::UN, Length(len)),
                size: 8,
                fixup: None,
            }));
        }

        if self == ElementCodec::Implicit {
            let mut len = decoder.decode_ul(&mut *source).context(ReadLengthSnafu { tag })?;
            let mut fixup = None;
            if len == 13 && !GE_LENGTH_EXCEPTIONS.contains(&tag) {
                len = 10;
                fixup = Some(HeaderFixup::GeLength13);
            } else if tag == PAPYRUS_TAG && len == PAPYRUS_BAD_LENGTH {
                len = PAPYRUS_LENGTH;
                fixup = Some(HeaderFixup::PapyrusLength);
            }
            let vr = implicit_vr(dict, tag);
            return Ok(Some(DecodedHeader {
                header: DataElementHeader::new(tag, vr, Length(len)),
                size: 8,
                fixup,
            }));
        }

        let mut vr_bytes = [0u8; 2];
        source
            .read_exact(&mut vr_bytes)
            .context(ReadVrSnafu { tag })?;

        let (vr, fixup) = match VR::from_binary(vr_bytes) {
            Some(vr) => (vr, None),
            None if self == ElementCodec::Cp246Explicit => {
                (VR::UN, Some(HeaderFixup::InvalidVr(vr_bytes)))
            }
            None => {
                return InvalidVrSnafu {
                    tag,
                    bytes: vr_bytes,
                }
                .fail()
            }
        };

        // an unknown VR code has no reserved bytes and a 16-bit length
        let long_form = fixup.is_none() && vr.length_field_size() == 4;
        let (len, size) = if long_form {
            if !(self == ElementCodec::UnExplicit && vr == VR::UN) {
                let mut reserved = [0u8; 2];
                source
                    .read_exact(&mut reserved)
                    .context(ReadReservedSnafu { tag })?;
                let len = decoder.decode_ul(&mut *source).context(ReadLengthSnafu { tag })?;
                (len, 12)
            } else {
                let len = decoder.decode_ul(&mut *source).context(ReadLengthSnafu { tag })?;
                (len, 10)
            }
        } else {
            let len = decoder.decode_us(&mut *source).context(ReadLengthSnafu { tag })?;
            (u32::from(len), 8)
        };

        Ok(Some(DecodedHeader {
            header: DataElementHeader::new(tag, vr, Length(len)),
            size,
            fixup,
        }))
    }
}

/// Read a tag, telling a clean end of stream apart from a truncated tag.
///
/// Returns `Ok(None)` if no byte could be read at all.
pub fn read_tag_or_eof<S>(source: &mut S, swap: SwapCode) -> Result<Option<Tag>>
where
    S: ?Sized + Read,
{
    let mut buf = [0u8; 4];
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e).context(ReadTagSnafu),
        }
    }
    match filled {
        0 => Ok(None),
        4 => {
            let tag = BasicDecoder::from(swap)
                .decode_tag(&buf[..])
                .context(ReadTagSnafu)?;
            Ok(Some(tag))
        }
        _ => Err(io::Error::from(io::ErrorKind::UnexpectedEof)).context(ReadTagSnafu),
    }
}

/// Read the 32-bit length which follows an item or delimiter tag.
pub fn read_item_length<S>(source: &mut S, tag: Tag, swap: SwapCode) -> Result<Length>
where
    S: ?Sized + Read,
{
    BasicDecoder::from(swap)
        .decode_ul(source)
        .map(Length)
        .context(ReadLengthSnafu { tag })
}
