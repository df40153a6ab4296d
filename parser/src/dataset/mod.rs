//! Reading and writing of whole data sets.
//!
//! The reader materializes the stream into a [`DataSet`](dcmio_core::DataSet) tree,
//! and the writer serializes such a tree back,
//! possibly under another transfer syntax.

pub mod read;
pub mod write;

pub use self::read::DataSetReader;
pub use self::write::DataSetWriter;
