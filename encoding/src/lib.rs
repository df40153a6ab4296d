#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(unused_qualifications, unused_import_braces)]

//! Encoding and decoding primitives of the data set stream codec.
//!
//! - [`swap`] holds the byte order state threaded through every call.
//! - [`decode`] reads element headers with one of the four
//!   [element codec variants](decode::ElementCodec).
//! - [`encode`] writes element and item headers.
//! - [`transfer_syntax`] describes the known transfer syntaxes.
//! - [`adapters`] is the boundary to pixel data codecs.

pub mod adapters;
pub mod decode;
pub mod encode;
pub mod swap;
pub mod transfer_syntax;

pub use byteordered::Endianness;
pub use decode::ElementCodec;
pub use swap::SwapCode;
pub use transfer_syntax::TransferSyntax;

// re-export crates that are part of the public API
pub use snafu;
