//! Crate-level error types.
use crate::dataset::read::ReadError;
use crate::dataset::write::WriteError;
use dcmio_core::DataElementHeader;
use snafu::Snafu;

/// The main error type of the data set codec.
///
/// Parsing errors carry the stream position where reading failed,
/// relative to the base offset of the reader,
/// and the header of the last data element read.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display(
        "Could not parse data set at position {:#x} (last element: {})",
        position,
        last_element.map(|h| h.to_string()).unwrap_or_else(|| "none".to_string())
    ))]
    Parse {
        position: u64,
        last_element: Option<DataElementHeader>,
        #[snafu(backtrace)]
        source: ReadError,
    },
    #[snafu(display("Could not write data set"))]
    Write {
        #[snafu(backtrace)]
        source: WriteError,
    },
    #[snafu(display("Unsupported transfer syntax `{}`", uid))]
    UnsupportedTransferSyntax { uid: String },
}

impl Error {
    /// The position of a parsing failure, if that is what this is.
    pub fn position(&self) -> Option<u64> {
        match self {
            Error::Parse { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// The header of the last element read before a parsing failure.
    pub fn last_element(&self) -> Option<DataElementHeader> {
        match self {
            Error::Parse { last_element, .. } => *last_element,
            _ => None,
        }
    }
}

/// Type alias for a result from this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
