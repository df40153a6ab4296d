//! This module contains the data element header encoding logic,
//! mirroring the decoders in [`decode`](crate::decode).
//!
//! Headers are always written in canonical form:
//! the VR is written verbatim under explicit encodings,
//! with the reserved bytes and 32-bit length of the long form
//! where the VR requires it.

use crate::swap::SwapCode;
use byteordered::Endianness;
use dcmio_core::header::{DataElementHeader, Length, Tag, VrEncoding};
use dcmio_core::VR;
use snafu::{Backtrace, ResultExt, Snafu};
use std::io::{self, Write};

pub mod basic;

use self::basic::BasicEncoder;

/// Module-level error type:
/// for errors which may occur while encoding data elements.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Failed to write the tag of {}: {}", tag, source))]
    WriteTag {
        tag: Tag,
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write the value representation of {}: {}", tag, source))]
    WriteVr {
        tag: Tag,
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write the reserved bytes of {}: {}", tag, source))]
    WriteReserved {
        tag: Tag,
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Failed to write the value length of {}: {}", tag, source))]
    WriteLength {
        tag: Tag,
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Value of {} ({}) is too long for its length field: {}", tag, vr, len))]
    ValueTooLong {
        tag: Tag,
        vr: VR,
        len: Length,
        backtrace: Backtrace,
    },
    #[snafu(display("Undefined length {} cannot be written with implicit VR", tag))]
    UndefinedLengthImplicit { tag: Tag, backtrace: Backtrace },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/** Type trait for encoding basic data values into a writer.
 *
 * Only the integer widths needed by element framing are encoded here:
 * value contents are written as raw bytes.
 */
pub trait BasicEncode {
    /// Retrieve the encoder's endianness.
    fn endianness(&self) -> Endianness;

    /// Encode an unsigned short value to the given writer.
    fn encode_us<S>(&self, to: S, value: u16) -> io::Result<()>
    where
        S: Write;

    /// Encode an unsigned long value to the given writer.
    fn encode_ul<S>(&self, to: S, value: u32) -> io::Result<()>
    where
        S: Write;

    /// Encode a DICOM attribute tag to the given writer.
    fn encode_tag<S>(&self, mut to: S, tag: Tag) -> io::Result<()>
    where
        S: Write,
    {
        self.encode_us(&mut to, tag.group())?;
        self.encode_us(to, tag.element())
    }
}

/// Encode a data element header.
///
/// The header's VR is expected to be the one to put on the wire.
/// Returns the number of bytes written.
///
/// An undefined length is only admitted where a sequence or
/// encapsulated pixel data may follow:
/// pixel data of undefined length cannot be written with implicit VR.
pub fn encode_header<W>(
    to: &mut W,
    encoding: VrEncoding,
    swap: SwapCode,
    header: DataElementHeader,
) -> Result<usize>
where
    W: ?Sized + Write,
{
    let encoder = BasicEncoder::from(swap);
    let DataElementHeader { tag, vr, len } = header;

    match encoding {
        VrEncoding::Implicit => {
            if tag == Tag::PIXEL_DATA && len.is_undefined() {
                return UndefinedLengthImplicitSnafu { tag }.fail();
            }
            encoder
                .encode_tag(&mut *to, tag)
                .context(WriteTagSnafu { tag })?;
            encoder
                .encode_ul(&mut *to, len.0)
                .context(WriteLengthSnafu { tag })?;
            Ok(8)
        }
        VrEncoding::Explicit => {
            let short = if vr.length_field_size() == 2 {
                let short = u16::try_from(len.0)
                    .ok()
                    .filter(|_| len.is_defined())
                    .ok_or_else(|| ValueTooLongSnafu { tag, vr, len }.build())?;
                Some(short)
            } else {
                None
            };
            encoder
                .encode_tag(&mut *to, tag)
                .context(WriteTagSnafu { tag })?;
            to.write_all(&vr.to_bytes()).context(WriteVrSnafu { tag })?;
            match short {
                Some(short) => {
                    encoder
                        .encode_us(&mut *to, short)
                        .context(WriteLengthSnafu { tag })?;
                    Ok(8)
                }
                None => {
                    to.write_all(&[0, 0]).context(WriteReservedSnafu { tag })?;
                    encoder
                        .encode_ul(&mut *to, len.0)
                        .context(WriteLengthSnafu { tag })?;
                    Ok(12)
                }
            }
        }
    }
}

/// Encode an item, item delimitation or sequence delimitation header:
/// the tag followed by a 32-bit length, whatever the VR encoding.
pub fn encode_item_header<W>(to: &mut W, swap: SwapCode, tag: Tag, len: Length) -> Result<()>
where
    W: ?Sized + Write,
{
    let encoder = BasicEncoder::from(swap);
    encoder
        .encode_tag(&mut *to, tag)
        .context(WriteTagSnafu { tag })?;
    encoder
        .encode_ul(&mut *to, len.0)
        .context(WriteLengthSnafu { tag })
}
