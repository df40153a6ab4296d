#![deny(unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    unused_qualifications,
    unused_import_braces
)]

//! This crate works on top of the core and encoding crates
//! to read and write complete data sets.
//!
//! - [`dataset`] holds the recursive [`DataSetReader`]
//!   and its counterpart, the [`DataSetWriter`].
//! - [`recovery`] describes the non-conformances of known broken producers
//!   which the reader tolerates, and the report of those found.
//! - [`options`] holds the reading and writing options.
//! - [`byteswap`] converts the byte order of a decoded data set in place.
//!
//! For the common case, [`read_dataset`] and [`write_dataset`]
//! do the whole job in one call:
//!
//! ```
//! # use dcmio_core::{DataElement, DataSet, Tag, VR};
//! # use dcmio_encoding::transfer_syntax::entries::EXPLICIT_VR_LITTLE_ENDIAN;
//! use dcmio_parser::{read_dataset, write_dataset, ReadOptions, WriteOptions};
//! use std::io::Cursor;
//!
//! let mut ds = DataSet::new();
//! ds.insert(DataElement::new(Tag(0x0008, 0x0060), VR::CS, "MR"));
//!
//! let mut bytes = Vec::new();
//! write_dataset(&mut bytes, &ds, WriteOptions::for_transfer_syntax(&EXPLICIT_VR_LITTLE_ENDIAN))?;
//!
//! let outcome = read_dataset(
//!     Cursor::new(bytes),
//!     ReadOptions::for_transfer_syntax(&EXPLICIT_VR_LITTLE_ENDIAN),
//! )?;
//! assert!(outcome.is_clean());
//! assert_eq!(outcome.dataset, ds);
//! # Ok::<(), dcmio_parser::Error>(())
//! ```

pub mod byteswap;
pub mod dataset;
pub mod error;
pub mod options;
pub mod recovery;

pub use crate::byteswap::byte_swap_dataset;
pub use crate::dataset::{DataSetReader, DataSetWriter};
pub use crate::error::{Error, Result};
pub use crate::options::{ReadOptions, WriteOptions};
pub use crate::recovery::{ReadOutcome, Recovery, RecoveryKind, RecoveryLog};

use crate::error::{UnsupportedTransferSyntaxSnafu, WriteSnafu};
use dcmio_core::{DataSet, VrDictionary};
use dcmio_encoding::transfer_syntax::{self, TransferSyntax};
use snafu::{OptionExt, ResultExt};
use std::io::{Read, Seek, Write};

/// Read a whole data set from the source,
/// without a data dictionary.
pub fn read_dataset<S>(source: S, options: ReadOptions) -> Result<ReadOutcome>
where
    S: Read + Seek,
{
    DataSetReader::new(source, options).read()
}

/// Read a whole data set from the source,
/// resolving implicit VRs with the given dictionary.
pub fn read_dataset_with_dictionary<S, D>(
    source: S,
    options: ReadOptions,
    dict: D,
) -> Result<ReadOutcome>
where
    S: Read + Seek,
    D: VrDictionary,
{
    DataSetReader::with_dictionary(source, options, dict).read()
}

/// Write a whole data set into the given writer.
///
/// Returns the number of bytes written.
pub fn write_dataset<W>(to: W, dataset: &DataSet, options: WriteOptions) -> Result<u64>
where
    W: Write,
{
    let mut writer = DataSetWriter::new(to, options);
    writer.write(dataset).context(WriteSnafu)?;
    Ok(writer.bytes_written())
}

/// Look up a transfer syntax which this crate can read and write.
///
/// Deflated transfer syntaxes are known but not supported.
pub fn supported_transfer_syntax(uid: &str) -> Result<&'static TransferSyntax> {
    transfer_syntax::get(uid)
        .filter(|ts| ts.is_supported())
        .context(UnsupportedTransferSyntaxSnafu { uid })
}
