//! This module provides the primitive encoder of binary numbers,
//! which may be in either little endian or big endian.

use super::BasicEncode;
use crate::swap::SwapCode;
use byteordered::{ByteOrdered, Endianness};
use std::io::Write;

type Result<T> = std::io::Result<T>;

/// A basic encoder of primitive numbers,
/// with the byte order resolved at run time from the active swap policy.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BasicEncoder {
    endianness: Endianness,
}

impl BasicEncoder {
    /// Create a basic encoder for the given byte order.
    pub fn new(endianness: Endianness) -> Self {
        BasicEncoder { endianness }
    }
}

impl Default for BasicEncoder {
    fn default() -> Self {
        BasicEncoder::new(Endianness::Little)
    }
}

impl From<SwapCode> for BasicEncoder {
    fn from(swap: SwapCode) -> Self {
        BasicEncoder::new(swap.endianness())
    }
}

impl BasicEncode for BasicEncoder {
    fn endianness(&self) -> Endianness {
        self.endianness
    }

    fn encode_us<S>(&self, to: S, value: u16) -> Result<()>
    where
        S: Write,
    {
        ByteOrdered::runtime(to, self.endianness).write_u16(value)
    }

    fn encode_ul<S>(&self, to: S, value: u32) -> Result<()>
    where
        S: Write,
    {
        ByteOrdered::runtime(to, self.endianness).write_u32(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmio_core::Tag;

    #[test]
    fn write_both_orders() {
        let mut out = Vec::new();
        BasicEncoder::from(SwapCode::LittleEndian)
            .encode_tag(&mut out, Tag(0x0028, 0x0010))
            .unwrap();
        BasicEncoder::from(SwapCode::BigEndian)
            .encode_tag(&mut out, Tag(0x0028, 0x0010))
            .unwrap();
        assert_eq!(out, vec![0x28, 0x00, 0x10, 0x00, 0x00, 0x28, 0x00, 0x10]);
    }
}
