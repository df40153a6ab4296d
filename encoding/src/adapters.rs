//! Core module for the pixel data codec boundary.
//!
//! The data set codec never looks inside encapsulated pixel data:
//! it only hands the sequence of fragments and the declared geometry
//! over to a [`PixelDataCodec`], and takes back a flat buffer
//! (or the reverse when encoding).
//! Compression formats are implemented elsewhere,
//! [`EncapsulatedUncompressed`] being the only in-tree codec.

use dcmio_core::{DataElement, SequenceOfFragments, Tag, Value, VR};
use snafu::{ensure, OptionExt, Snafu};

/// The possible error conditions when decoding (reading) pixel data.
///
/// Users of this type are free to handle errors based on their variant,
/// but should not make decisions based on the display message,
/// since that is not considered part of the API
/// and may change on any new release.
///
/// When no suitable variant is available,
/// the [`Custom`](DecodeError::Custom) variant may be used.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub), module)]
pub enum DecodeError {
    /// A custom error occurred when decoding,
    /// reported as a dynamic error value with a message.
    ///
    /// The [`whatever!`](snafu::whatever) macro can be used
    /// to easily create an error of this kind.
    #[snafu(whatever, display("{}", message))]
    Custom {
        /// The error message.
        message: String,
        /// The underlying error cause, if any.
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync + 'static>, Some)))]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },

    /// The input pixel data is not encapsulated.
    ///
    /// Either the image needs no decoding
    /// or the compressed imaging data was in a flat pixel data element by mistake.
    NotEncapsulated,

    /// The element given is not a pixel data element.
    #[snafu(display("Element {} is not pixel data", tag))]
    NotPixelData { tag: Tag },

    /// The requested frame is outside the fragment sequence.
    #[snafu(display("Frame {} is out of bounds", frame))]
    FrameRangeOutOfBounds { frame: u32 },

    /// The decoded data does not match the declared geometry.
    #[snafu(display("Expected {} bytes of pixel data, found {}", expected, found))]
    SizeMismatch { expected: u64, found: u64 },
}

/// The possible error conditions when encoding (writing) pixel data.
///
/// Users of this type are free to handle errors based on their variant,
/// but should not make decisions based on the display message,
/// since that is not considered part of the API
/// and may change on any new release.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub), module)]
pub enum EncodeError {
    /// A custom error when encoding fails.
    /// Read the `message` and the underlying `source`
    /// for more details.
    #[snafu(whatever, display("{}", message))]
    Custom {
        /// The error message.
        message: String,
        /// The underlying error cause, if any.
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync + 'static>, Some)))]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },

    /// Input pixel data is not native, should be decoded first.
    NotNative,

    /// The element given is not a pixel data element.
    #[snafu(display("Element {} is not pixel data", tag))]
    NotPixelData { tag: Tag },

    /// The native data does not match the declared geometry.
    #[snafu(display("Expected {} bytes of pixel data, found {}", expected, found))]
    SizeMismatch { expected: u64, found: u64 },
}

/// The result of decoding (reading) pixel data
pub type DecodeResult<T, E = DecodeError> = Result<T, E>;

/// The result of encoding (writing) pixel data
pub type EncodeResult<T, E = EncodeError> = Result<T, E>;

/// The declared geometry of an image,
/// taken from the image pixel module of the data set.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    /// Rows (0028,0010)
    pub rows: u16,
    /// Columns (0028,0011)
    pub columns: u16,
    /// Samples per Pixel (0028,0002)
    pub samples_per_pixel: u16,
    /// Bits Allocated (0028,0100)
    pub bits_allocated: u16,
    /// Number of Frames (0028,0008), 1 if absent
    pub number_of_frames: u32,
}

impl PixelFormat {
    /// The number of bytes of a single native frame.
    pub fn frame_size(&self) -> u64 {
        let bits = u64::from(self.rows)
            * u64::from(self.columns)
            * u64::from(self.samples_per_pixel)
            * u64::from(self.bits_allocated);
        (bits + 7) / 8
    }

    /// The number of bytes of all native frames.
    pub fn total_size(&self) -> u64 {
        self.frame_size() * u64::from(self.number_of_frames.max(1))
    }

    /// The VR of native pixel data in this format.
    pub fn native_vr(&self) -> VR {
        if self.bits_allocated > 8 {
            VR::OW
        } else {
            VR::OB
        }
    }
}

/// Trait for pixel data codecs of an encapsulated transfer syntax.
///
/// Only the fragment container and the declared geometry
/// cross this boundary.
pub trait PixelDataCodec {
    /// Decode all frames into one native buffer.
    fn decode(&self, fragments: &SequenceOfFragments, format: &PixelFormat)
        -> DecodeResult<Vec<u8>>;

    /// Encode a native buffer into a sequence of fragments.
    fn encode(&self, native: &[u8], format: &PixelFormat) -> EncodeResult<SequenceOfFragments>;
}

impl<T: ?Sized + PixelDataCodec> PixelDataCodec for &T {
    fn decode(
        &self,
        fragments: &SequenceOfFragments,
        format: &PixelFormat,
    ) -> DecodeResult<Vec<u8>> {
        (**self).decode(fragments, format)
    }

    fn encode(&self, native: &[u8], format: &PixelFormat) -> EncodeResult<SequenceOfFragments> {
        (**self).encode(native, format)
    }
}

/// Codec for Encapsulated Uncompressed Explicit VR Little Endian:
/// each frame is stored as is in its own fragment,
/// padded to an even length.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EncapsulatedUncompressed;

impl PixelDataCodec for EncapsulatedUncompressed {
    fn decode(
        &self,
        fragments: &SequenceOfFragments,
        format: &PixelFormat,
    ) -> DecodeResult<Vec<u8>> {
        let frame_size = format.frame_size() as usize;
        let frames = format.number_of_frames.max(1);
        let mut out = Vec::with_capacity(format.total_size() as usize);
        for frame in 0..frames {
            // fragments carry an even length, frames may not
            let fragment = fragments
                .fragment(frame as usize)
                .context(decode_error::FrameRangeOutOfBoundsSnafu { frame })?;
            ensure!(
                fragment.len() >= frame_size,
                decode_error::SizeMismatchSnafu {
                    expected: frame_size as u64,
                    found: fragment.len() as u64,
                }
            );
            out.extend_from_slice(&fragment[..frame_size]);
        }
        Ok(out)
    }

    fn encode(&self, native: &[u8], format: &PixelFormat) -> EncodeResult<SequenceOfFragments> {
        ensure!(
            native.len() as u64 == format.total_size(),
            encode_error::SizeMismatchSnafu {
                expected: format.total_size(),
                found: native.len() as u64,
            }
        );
        let frame_size = format.frame_size() as usize;
        if frame_size == 0 {
            return Ok(SequenceOfFragments::new(Vec::new(), vec![Vec::new()]));
        }
        Ok(SequenceOfFragments::from_frames(
            native.chunks(frame_size).map(<[u8]>::to_vec),
            0,
        ))
    }
}

/// Decode an encapsulated pixel data element into a native one,
/// with VR OB or OW depending on the bits allocated.
pub fn decode_pixel_data(
    element: &DataElement,
    format: &PixelFormat,
    codec: &dyn PixelDataCodec,
) -> DecodeResult<DataElement> {
    ensure!(
        element.tag() == Tag::PIXEL_DATA,
        decode_error::NotPixelDataSnafu { tag: element.tag() }
    );
    let fragments = element
        .value()
        .fragments()
        .context(decode_error::NotEncapsulatedSnafu)?;
    let native = codec.decode(fragments, format)?;
    Ok(DataElement::new(Tag::PIXEL_DATA, format.native_vr(), native))
}

/// Encode a native pixel data element into an encapsulated one.
pub fn encode_pixel_data(
    element: &DataElement,
    format: &PixelFormat,
    codec: &dyn PixelDataCodec,
) -> EncodeResult<DataElement> {
    ensure!(
        element.tag() == Tag::PIXEL_DATA,
        encode_error::NotPixelDataSnafu { tag: element.tag() }
    );
    let native = match element.value() {
        Value::Bytes(bytes) => bytes.as_bytes(),
        _ => return encode_error::NotNativeSnafu.fail(),
    };
    // drop the padding byte of odd sized images
    let total = format.total_size() as usize;
    let native = if native.len() == total + 1 {
        &native[..total]
    } else {
        native
    };
    let fragments = codec.encode(native, format)?;
    Ok(DataElement::new(Tag::PIXEL_DATA, VR::OB, fragments))
}
