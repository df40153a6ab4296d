#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    missing_docs,
    unused_qualifications,
    unused_import_braces
)]

//! This is the core library of the data set codec,
//! containing the data structures shared by the decoder and the encoder.
//!
//! The current structure of this crate is as follows:
//!
//! - [`header`] comprises the fixed-size primitives of an element header:
//!   tags, value representations and value lengths.
//! - [`vm`] describes value multiplicities, used for validation.
//! - [`value`] holds the three shapes an element value may take.
//! - [`dataset`] defines data elements, items, and the data set tree.
//! - [`dictionary`] is the boundary to a Tag to VR dictionary,
//!   needed to read implicit VR encodings.

pub mod dataset;
pub mod dictionary;
pub mod header;
pub mod value;
pub mod vm;

pub use dataset::{DataElement, DataSet, Item};
pub use dictionary::{NoDictionary, TagVrMap, VrDictionary};
pub use header::{
    DataElementHeader, HasLength, Header, Length, Tag, VrEncoding, VR,
};
pub use value::{ByteValue, SequenceOfFragments, SequenceOfItems, Value};
pub use vm::VM;
