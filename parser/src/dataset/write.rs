//! This module contains the data set writer,
//! the counterpart of the data set reader.
//!
//! Lengths are never taken on faith from the data set:
//! every defined sequence and item length is recomputed
//! for the target VR encoding before it is written.
use crate::options::WriteOptions;
use dcmio_core::header::{DataElementHeader, Length, Tag};
use dcmio_core::{DataElement, DataSet, Item, SequenceOfFragments, SequenceOfItems, Value, VR};
use dcmio_encoding::encode::basic::BasicEncoder;
use dcmio_encoding::encode::{self, encode_header, encode_item_header, BasicEncode};
use dcmio_encoding::swap::swap_value;
use snafu::{Backtrace, ResultExt, Snafu};
use std::io::{self, Write};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum WriteError {
    #[snafu(display("Could not write element header"))]
    EncodeHeader {
        #[snafu(backtrace)]
        source: encode::Error,
    },
    #[snafu(display("Could not write value of element tagged {}", tag))]
    WriteValue {
        tag: Tag,
        backtrace: Backtrace,
        source: io::Error,
    },
}

pub type Result<T, E = WriteError> = std::result::Result<T, E>;

/// A writer of complete data sets into a byte sink.
#[derive(Debug)]
pub struct DataSetWriter<W> {
    to: W,
    options: WriteOptions,
    bytes_written: u64,
}

impl<W> DataSetWriter<W>
where
    W: Write,
{
    /// Create a new data set writer.
    pub fn new(to: W, options: WriteOptions) -> Self {
        DataSetWriter {
            to,
            options,
            bytes_written: 0,
        }
    }

    /// The number of bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Retrieve the inner writer.
    pub fn into_inner(self) -> W {
        self.to
    }

    /// Write all elements of the data set, in tag order.
    pub fn write(&mut self, dataset: &DataSet) -> Result<()> {
        let encoding = self.options.encoding;
        for element in dataset {
            match element.value() {
                Value::Items(seq) => {
                    let mut seq = seq.clone();
                    if self.options.explicit_sequence_lengths {
                        seq.make_lengths_defined(encoding);
                    } else {
                        seq.update_lengths(encoding);
                    }
                    self.write_sequence(element.tag(), &seq)?;
                }
                _ => self.write_element(element)?,
            }
        }
        Ok(())
    }

    /// Write an element whose nested lengths are already up to date.
    fn write_element(&mut self, element: &DataElement) -> Result<()> {
        let tag = element.tag();
        match element.value() {
            Value::Bytes(bytes) => {
                let vr = element.wire_vr();
                self.write_header(DataElementHeader::new(tag, vr, bytes.even_length()))?;
                if self.options.swap.needs_swap() && vr.swap_width() > 1 {
                    let mut buf = bytes.as_bytes().to_vec();
                    swap_value(&mut buf, vr, self.options.swap);
                    self.write_raw(tag, &buf)?;
                } else {
                    self.write_raw(tag, bytes.as_bytes())?;
                }
                if bytes.len() % 2 == 1 {
                    self.write_raw(tag, &[vr.padding()])?;
                }
                Ok(())
            }
            Value::Items(seq) => self.write_sequence(tag, seq),
            Value::Fragments(fragments) => self.write_fragments(element, fragments),
        }
    }

    fn write_sequence(&mut self, tag: Tag, seq: &SequenceOfItems) -> Result<()> {
        self.write_header(DataElementHeader::new(tag, VR::SQ, seq.length()))?;
        for item in seq.items() {
            self.write_item(item)?;
        }
        if seq.is_undefined_length() {
            self.write_item_header(Tag::SEQUENCE_DELIMITER, Length(0))?;
        }
        Ok(())
    }

    fn write_item(&mut self, item: &Item) -> Result<()> {
        if item.is_delimiter() {
            return self.write_item_header(Tag::SEQUENCE_DELIMITER, Length(0));
        }
        self.write_item_header(Tag::ITEM, item.length())?;
        for element in item.nested() {
            self.write_element(element)?;
        }
        if item.length().is_undefined() {
            self.write_item_header(Tag::ITEM_DELIMITER, Length(0))?;
        }
        Ok(())
    }

    fn write_fragments(&mut self, element: &DataElement, fragments: &SequenceOfFragments) -> Result<()> {
        let tag = element.tag();
        self.write_header(DataElementHeader::new(
            tag,
            element.wire_vr(),
            Length::UNDEFINED,
        ))?;

        let offset_table = fragments.offset_table();
        self.write_item_header(Tag::ITEM, Length(offset_table.len() as u32 * 4))?;
        let encoder = BasicEncoder::from(self.options.swap);
        for offset in offset_table {
            encoder
                .encode_ul(&mut self.to, *offset)
                .context(WriteValueSnafu { tag })?;
        }
        self.bytes_written += offset_table.len() as u64 * 4;

        for fragment in fragments.fragments() {
            self.write_item_header(Tag::ITEM, Length(fragment.len() as u32))?;
            self.write_raw(tag, fragment)?;
        }
        self.write_item_header(Tag::SEQUENCE_DELIMITER, Length(0))
    }

    fn write_header(&mut self, header: DataElementHeader) -> Result<()> {
        let n = encode_header(&mut self.to, self.options.encoding, self.options.swap, header)
            .context(EncodeHeaderSnafu)?;
        self.bytes_written += n as u64;
        Ok(())
    }

    fn write_item_header(&mut self, tag: Tag, len: Length) -> Result<()> {
        encode_item_header(&mut self.to, self.options.swap, tag, len).context(EncodeHeaderSnafu)?;
        self.bytes_written += 8;
        Ok(())
    }

    fn write_raw(&mut self, tag: Tag, data: &[u8]) -> Result<()> {
        self.to.write_all(data).context(WriteValueSnafu { tag })?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmio_core::VrEncoding;
    use dcmio_encoding::SwapCode;
    use pretty_assertions::assert_eq;

    fn write(dataset: &DataSet, options: WriteOptions) -> Vec<u8> {
        let mut writer = DataSetWriter::new(Vec::new(), options);
        writer.write(dataset).unwrap();
        assert_eq!(writer.bytes_written(), writer.to.len() as u64);
        writer.into_inner()
    }

    #[test]
    fn write_code_string_explicit() {
        let mut ds = DataSet::new();
        ds.insert(DataElement::new(Tag(0x0008, 0x0060), VR::CS, "FOO "));
        let out = write(&ds, WriteOptions::default().encoding(VrEncoding::Explicit));
        assert_eq!(
            out,
            vec![0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x04, 0x00, b'F', b'O', b'O', b' ']
        );
    }

    #[test]
    fn odd_values_are_padded_on_write() {
        let mut ds = DataSet::new();
        let mut uid = DataElement::empty(Tag(0x0008, 0x0016), VR::UI);
        *uid.value_mut() = Value::from("1.2.3");
        ds.insert(uid);
        let out = write(&ds, WriteOptions::default());
        assert_eq!(
            out,
            vec![0x08, 0x00, 0x16, 0x00, 0x06, 0x00, 0x00, 0x00, b'1', b'.', b'2', b'.', b'3', 0x00]
        );
    }

    #[test]
    fn write_sequence_implicit() {
        let mut nested = DataSet::new();
        nested.insert(DataElement::new(Tag(0x0008, 0x0100), VR::SH, "T-1234"));
        let mut ds = DataSet::new();
        ds.insert(DataElement::new(
            Tag(0x0008, 0x2218),
            VR::SQ,
            SequenceOfItems::from_items(vec![Item::new(nested)]),
        ));
        let out = write(&ds, WriteOptions::default());

        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0x08, 0x00, 0x18, 0x22, 0xFF, 0xFF, 0xFF, 0xFF, // (0008,2218) undefined
            0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF, // item, undefined
            0x08, 0x00, 0x00, 0x01, 0x06, 0x00, 0x00, 0x00, // (0008,0100) len 6
            b'T', b'-', b'1', b'2', b'3', b'4',
            0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00, // item delimiter
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00, // sequence delimiter
        ];
        assert_eq!(out, expected);

        let out = write(&ds, WriteOptions::default().explicit_sequence_lengths(true));
        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0x08, 0x00, 0x18, 0x22, 0x16, 0x00, 0x00, 0x00, // (0008,2218) len 22
            0xFE, 0xFF, 0x00, 0xE0, 0x0E, 0x00, 0x00, 0x00, // item, len 14
            0x08, 0x00, 0x00, 0x01, 0x06, 0x00, 0x00, 0x00, // (0008,0100) len 6
            b'T', b'-', b'1', b'2', b'3', b'4',
        ];
        assert_eq!(out, expected);
    }

    #[test]
    fn write_big_endian_swaps_binary_values() {
        let mut ds = DataSet::new();
        ds.insert(DataElement::new(Tag(0x0028, 0x0010), VR::US, vec![0x00, 0x02]));
        let out = write(
            &ds,
            WriteOptions::default()
                .encoding(VrEncoding::Explicit)
                .swap(SwapCode::BigEndian),
        );
        assert_eq!(
            out,
            vec![0x00, 0x28, 0x00, 0x10, b'U', b'S', 0x00, 0x02, 0x02, 0x00]
        );
    }

    #[test]
    fn write_fragments() {
        let mut ds = DataSet::new();
        ds.insert(DataElement::new(
            Tag::PIXEL_DATA,
            VR::OB,
            SequenceOfFragments::new(vec![], vec![vec![0x99; 4]]),
        ));
        let out = write(&ds, WriteOptions::default().encoding(VrEncoding::Explicit));
        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            0xE0, 0x7F, 0x10, 0x00, b'O', b'B', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            0xFE, 0xFF, 0x00, 0xE0, 0x00, 0x00, 0x00, 0x00, // empty offset table
            0xFE, 0xFF, 0x00, 0xE0, 0x04, 0x00, 0x00, 0x00,
            0x99, 0x99, 0x99, 0x99,
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];
        assert_eq!(out, expected);

        let mut writer = DataSetWriter::new(Vec::new(), WriteOptions::default());
        assert!(writer.write(&ds).is_err());
    }
}
