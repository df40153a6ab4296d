//! Options of the data set reader and writer.

use dcmio_core::VrEncoding;
use dcmio_encoding::transfer_syntax::{entries, TransferSyntax};
use dcmio_encoding::{ElementCodec, SwapCode};

/// The default limit of nested sequences.
pub const DEFAULT_MAX_DEPTH: u32 = 64;

/// The set of options for the data set reader.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub struct ReadOptions {
    /// the element codec variant
    pub codec: ElementCodec,
    /// the byte order of the stream
    pub swap: SwapCode,
    /// whether pixel data of undefined length is expected
    pub encapsulated: bool,
    /// whether to tolerate the known broken producer patterns
    pub recover: bool,
    /// the maximum number of nested sequences
    pub max_depth: u32,
    /// the position of the reader as received at building time
    pub base_offset: u64,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions::for_transfer_syntax(&entries::IMPLICIT_VR_LITTLE_ENDIAN)
    }
}

impl ReadOptions {
    /// Create the reading options of a stream in the given transfer syntax,
    /// with recovery enabled.
    pub fn for_transfer_syntax(ts: &TransferSyntax) -> Self {
        ReadOptions {
            codec: ts.element_codec(true),
            swap: ts.swap_code(),
            encapsulated: ts.is_encapsulated(),
            recover: true,
            max_depth: DEFAULT_MAX_DEPTH,
            base_offset: 0,
        }
    }

    /// Replace the element codec variant of the options.
    pub fn codec(mut self, codec: ElementCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Replace the swap code of the options.
    pub fn swap(mut self, swap: SwapCode) -> Self {
        self.swap = swap;
        self
    }

    /// Replace whether pixel data is expected to be encapsulated.
    pub fn encapsulated(mut self, encapsulated: bool) -> Self {
        self.encapsulated = encapsulated;
        self
    }

    /// Enable or disable recovery.
    ///
    /// Disabling recovery also selects the plain explicit VR codec
    /// in place of the variant tolerating unknown VR codes.
    pub fn recover(mut self, recover: bool) -> Self {
        self.recover = recover;
        if !recover && self.codec == ElementCodec::Cp246Explicit {
            self.codec = ElementCodec::Explicit;
        }
        self
    }

    /// Replace the nesting limit of the options.
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Replace the base reader offset of the options.
    pub fn base_offset(mut self, base_offset: u64) -> Self {
        self.base_offset = base_offset;
        self
    }
}

/// The set of options for the data set writer.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub struct WriteOptions {
    /// whether the VR is written
    pub encoding: VrEncoding,
    /// the byte order of the output
    pub swap: SwapCode,
    /// whether sequences and items of undefined length
    /// are written with defined lengths instead
    pub explicit_sequence_lengths: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions::for_transfer_syntax(&entries::IMPLICIT_VR_LITTLE_ENDIAN)
    }
}

impl WriteOptions {
    /// Create the writing options of a stream in the given transfer syntax.
    pub fn for_transfer_syntax(ts: &TransferSyntax) -> Self {
        WriteOptions {
            encoding: ts.vr_encoding(),
            swap: ts.swap_code(),
            explicit_sequence_lengths: false,
        }
    }

    /// Replace the VR encoding of the options.
    pub fn encoding(mut self, encoding: VrEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Replace the swap code of the options.
    pub fn swap(mut self, swap: SwapCode) -> Self {
        self.swap = swap;
        self
    }

    /// Write every sequence and item with a defined length.
    pub fn explicit_sequence_lengths(mut self, explicit: bool) -> Self {
        self.explicit_sequence_lengths = explicit;
        self
    }
}
