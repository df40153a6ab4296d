//! This module provides the primitive decoder of binary numbers,
//! which may be in either little endian or big endian.

use super::BasicDecode;
use crate::swap::SwapCode;
use byteordered::{ByteOrdered, Endianness};
use std::io::Read;

type Result<T> = std::io::Result<T>;

/// A basic decoder of primitive numbers,
/// with the byte order resolved at run time from the active swap policy.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BasicDecoder {
    endianness: Endianness,
}

impl BasicDecoder {
    /// Create a basic decoder for the given byte order.
    pub fn new(endianness: Endianness) -> Self {
        BasicDecoder { endianness }
    }
}

impl Default for BasicDecoder {
    fn default() -> Self {
        BasicDecoder::new(Endianness::Little)
    }
}

impl From<SwapCode> for BasicDecoder {
    fn from(swap: SwapCode) -> Self {
        BasicDecoder::new(swap.endianness())
    }
}

impl BasicDecode for BasicDecoder {
    fn endianness(&self) -> Endianness {
        self.endianness
    }

    fn decode_us<S>(&self, source: S) -> Result<u16>
    where
        S: Read,
    {
        ByteOrdered::runtime(source, self.endianness).read_u16()
    }

    fn decode_ul<S>(&self, source: S) -> Result<u32>
    where
        S: Read,
    {
        ByteOrdered::runtime(source, self.endianness).read_u32()
    }
}
