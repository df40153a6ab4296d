//! This module contains the data set reader,
//! which turns a byte stream into a tree of data elements.
//!
//! Reading is driven by a codec variant and a swap policy,
//! both of which may change for a nested region of the stream
//! when the reader detects one of the known broken producer patterns.
//! Every such correction is logged as a warning
//! and recorded in the returned [`RecoveryLog`].
//!
//! Corrections which may turn out to be wrong are attempted speculatively:
//! the reader takes a checkpoint of its position and recovery log,
//! and rolls back to it when the attempt fails.
use crate::byteswap::byte_swap_dataset;
use crate::error::Error;
use crate::options::ReadOptions;
use crate::recovery::{ReadOutcome, Recovery, RecoveryKind, RecoveryLog};
use dcmio_core::dictionary::{NoDictionary, VrDictionary};
use dcmio_core::header::{DataElementHeader, Header, Length, Tag, VR};
use dcmio_core::{ByteValue, DataElement, DataSet, Item, SequenceOfFragments, SequenceOfItems, Value};
use dcmio_encoding::decode::basic::BasicDecoder;
use dcmio_encoding::decode::{
    self, read_item_length, read_tag_or_eof, BasicDecode, DecodedHeader, HeaderFixup,
};
use dcmio_encoding::swap::swap_value;
use dcmio_encoding::{ElementCodec, Endianness, SwapCode};
use snafu::{ensure, Backtrace, OptionExt, ResultExt, Snafu};
use std::io::{self, Read, Seek, SeekFrom};
use tracing::{debug, trace, warn};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ReadError {
    #[snafu(display("Could not read element header"))]
    ReadHeader {
        #[snafu(backtrace)]
        source: decode::Error,
    },
    #[snafu(display("Could not read item header"))]
    ReadItemHeader {
        #[snafu(backtrace)]
        source: decode::Error,
    },
    #[snafu(display("Could not read {} value bytes for element tagged {}", len, tag))]
    ReadValue {
        tag: Tag,
        len: u32,
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display(
        "Value of element {} ended after {} of {} bytes",
        tag,
        found,
        len
    ))]
    TruncatedValue {
        tag: Tag,
        len: u32,
        found: u64,
        backtrace: Backtrace,
    },
    #[snafu(display("Could not scan the value of element {}", tag))]
    ScanValue {
        tag: Tag,
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("No sequence delimiter after value of element {}", tag))]
    UnterminatedValue { tag: Tag, backtrace: Backtrace },
    #[snafu(display("Could not seek in the source"))]
    Seek {
        backtrace: Backtrace,
        source: io::Error,
    },
    #[snafu(display("Unexpected tag {} where an item was expected", tag))]
    UnexpectedItemTag { tag: Tag, backtrace: Backtrace },
    #[snafu(display("Unexpected item header where a data element was expected"))]
    UnexpectedItem { backtrace: Backtrace },
    /// Undefined pixel item length
    UndefinedItemLength { backtrace: Backtrace },
    #[snafu(display(
        "Element {} declares {} bytes but only {} remain in its item",
        tag,
        len,
        remaining
    ))]
    ElementExceedsItem {
        tag: Tag,
        len: u32,
        remaining: u64,
        backtrace: Backtrace,
    },
    #[snafu(display(
        "Inconsistent item end: expected end at {} bytes but read {}",
        len,
        read
    ))]
    ItemOverrun {
        len: u32,
        read: u64,
        backtrace: Backtrace,
    },
    #[snafu(display("Undefined length for element {} with VR {}", tag, vr))]
    UndefinedLength {
        tag: Tag,
        vr: VR,
        backtrace: Backtrace,
    },
    #[snafu(display("Pixel data of undefined length in a native transfer syntax"))]
    UnexpectedEncapsulation { backtrace: Backtrace },
    #[snafu(display("Unexpected end of stream inside {}", context))]
    UnexpectedEof {
        context: &'static str,
        backtrace: Backtrace,
    },
    #[snafu(display("Sequences nested deeper than {} levels", max_depth))]
    MaxDepthExceeded { max_depth: u32, backtrace: Backtrace },
}

impl ReadError {
    /// The tag of the element whose VR code was not recognized,
    /// if that is what failed.
    pub fn invalid_vr_tag(&self) -> Option<Tag> {
        match self {
            ReadError::ReadHeader {
                source: decode::Error::InvalidVr { tag, .. },
            } => Some(*tag),
            _ => None,
        }
    }
}

pub type Result<T, E = ReadError> = std::result::Result<T, E>;

/// The decoding context of a region of the stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct Ctx {
    codec: ElementCodec,
    swap: SwapCode,
}

impl Ctx {
    fn inverted(self) -> Self {
        Ctx {
            swap: self.swap.inverted(),
            ..self
        }
    }
}

/// A token produced by reading one header at the current level.
#[derive(Debug)]
enum Next {
    Element(DataElement),
    Delimiter(Tag),
    Item(Length),
    End,
}

/// The state restored when a speculative read is rolled back.
#[derive(Debug, Copy, Clone)]
struct Checkpoint {
    position: u64,
    recoveries: usize,
    last_header: Option<DataElementHeader>,
}

/// The known private sequences which some producers
/// write in the opposite byte order of the stream.
const SWAPPED_PRIVATE_SEQUENCES: [Tag; 5] = [
    Tag(0x2001, 0xE05F),
    Tag(0x2001, 0xE100),
    Tag(0x2005, 0xE080),
    Tag(0x2005, 0xE083),
    Tag(0x2005, 0xE084),
];

/// A reader of a complete data set from a seekable byte source.
///
/// The dictionary resolves the VR of elements in implicit VR regions.
#[derive(Debug)]
pub struct DataSetReader<S, D = NoDictionary> {
    source: S,
    dict: D,
    options: ReadOptions,
    /// the stream position where reading started
    start: u64,
    recoveries: RecoveryLog,
    last_header: Option<DataElementHeader>,
    depth: u32,
}

impl<S> DataSetReader<S>
where
    S: Read + Seek,
{
    /// Create a data set reader without a data dictionary:
    /// implicit VR elements are read as UN,
    /// unless they are group lengths or private creators.
    pub fn new(source: S, options: ReadOptions) -> Self {
        DataSetReader::with_dictionary(source, options, NoDictionary)
    }
}

impl<S, D> DataSetReader<S, D>
where
    S: Read + Seek,
    D: VrDictionary,
{
    /// Create a data set reader resolving implicit VRs
    /// with the given dictionary.
    pub fn with_dictionary(source: S, options: ReadOptions, dict: D) -> Self {
        DataSetReader {
            source,
            dict,
            options,
            start: 0,
            recoveries: RecoveryLog::new(),
            last_header: None,
            depth: 0,
        }
    }

    /// The options of this reader.
    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// The header of the last element read, if any.
    pub fn last_header(&self) -> Option<DataElementHeader> {
        self.last_header
    }

    /// Retrieve the inner source, positioned wherever reading stopped.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Read the data set from the current position
    /// to the end of the source.
    ///
    /// On failure, the error carries the position of the failure
    /// relative to the base offset, and the last element header read.
    pub fn read(&mut self) -> std::result::Result<ReadOutcome, Error> {
        let result = self.read_from_start();
        result.map_err(|source| {
            let position = self.offset().unwrap_or(self.options.base_offset);
            Error::Parse {
                position,
                last_element: self.last_header,
                source,
            }
        })
    }

    fn read_from_start(&mut self) -> Result<ReadOutcome> {
        self.start = self.position()?;
        self.reset();
        let ctx = Ctx {
            codec: self.options.codec,
            swap: self.options.swap,
        };
        let dataset = match self.read_top(ctx) {
            Ok(dataset) => dataset,
            Err(e) => match e.invalid_vr_tag() {
                Some(tag) if self.options.recover && ctx.codec == ElementCodec::Explicit => {
                    debug!("{}, reading again tolerating unknown VRs", e);
                    self.seek_to(self.start)?;
                    self.reset();
                    self.record(RecoveryKind::Cp246Retry, tag, self.options.base_offset);
                    self.read_top(Ctx {
                        codec: ElementCodec::Cp246Explicit,
                        ..ctx
                    })?
                }
                _ => return Err(e),
            },
        };
        Ok(ReadOutcome {
            dataset,
            recoveries: std::mem::take(&mut self.recoveries),
        })
    }

    fn reset(&mut self) {
        self.recoveries.clear();
        self.last_header = None;
        self.depth = 0;
    }

    fn read_top(&mut self, ctx: Ctx) -> Result<DataSet> {
        let mut dataset = DataSet::new();
        loop {
            let pos = self.offset()?;
            match self.read_element(ctx, None)? {
                Next::Element(element) => {
                    dataset.insert(element);
                }
                Next::Delimiter(tag) => {
                    self.record(RecoveryKind::StrayDelimiter, tag, pos);
                }
                Next::Item(_) if self.options.recover => {
                    self.record(RecoveryKind::StrayItem, Tag::ITEM, pos);
                }
                Next::Item(_) => return UnexpectedItemSnafu.fail(),
                Next::End => return Ok(dataset),
            }
        }
    }

    /// Read one header and, for data elements, the value that follows.
    ///
    /// `remaining` is the number of bytes left in the enclosing
    /// defined length item, if any.
    fn read_element(&mut self, ctx: Ctx, remaining: Option<u64>) -> Result<Next> {
        let pos = self.offset()?;
        let decoded = ctx
            .codec
            .decode_header(&mut self.source, ctx.swap, &self.dict)
            .context(ReadHeaderSnafu)?;
        let Some(DecodedHeader {
            mut header,
            size,
            fixup,
        }) = decoded
        else {
            return Ok(Next::End);
        };

        if let Some(fixup) = fixup {
            match fixup.original_length() {
                Some(original) if !self.options.recover => header.len = original,
                _ => self.record(recovery_of(fixup), header.tag, pos),
            }
        }

        if header.is_item_delimiter() || header.is_sequence_delimiter() {
            if header.len != Length(0) {
                self.record(RecoveryKind::NonZeroDelimiterLength, header.tag, pos);
            }
            return Ok(Next::Delimiter(header.tag));
        }
        if header.is_item() {
            return Ok(Next::Item(header.len));
        }

        self.last_header = Some(header);
        if let (Some(remaining), Some(len)) = (remaining, header.len.get()) {
            let available = remaining.saturating_sub(u64::from(size));
            ensure!(
                u64::from(len) <= available,
                ElementExceedsItemSnafu {
                    tag: header.tag,
                    len,
                    remaining: available,
                }
            );
        }

        let value = self.read_value(ctx, header, pos)?;
        trace!("{} {} {}", header.tag, header.vr, header.len);
        Ok(Next::Element(DataElement::new(header.tag, header.vr, value)))
    }

    fn read_value(&mut self, ctx: Ctx, header: DataElementHeader, pos: u64) -> Result<Value> {
        let DataElementHeader { tag, vr, len } = header;

        if header.is_encapsulated_pixeldata() {
            if self.options.encapsulated {
                return self.read_fragments(ctx).map(Value::Fragments);
            }
            if self.options.recover && ctx.codec == ElementCodec::Implicit {
                self.record(RecoveryKind::UndefinedPixelDataInNativeSyntax, tag, pos);
                return self.read_fragments(ctx).map(Value::Fragments);
            }
            return UnexpectedEncapsulationSnafu.fail();
        }

        if vr == VR::SQ {
            if self.options.recover && SWAPPED_PRIVATE_SEQUENCES.contains(&tag) {
                return self.read_private_sequence(ctx, tag, len, pos).map(Value::Items);
            }
            return self.read_sequence(ctx, tag, len).map(Value::Items);
        }

        match len.get() {
            Some(len) => self.read_bytes(ctx, tag, vr, len).map(Value::Bytes),
            None if ctx.codec == ElementCodec::Implicit => {
                self.read_implicit_undefined(ctx, tag, vr, pos)
            }
            None if vr == VR::UN => self.read_un_undefined(ctx, tag, pos),
            None if self.options.recover => self.read_explicit_undefined(ctx, tag, vr, pos),
            None => UndefinedLengthSnafu { tag, vr }.fail(),
        }
    }

    fn read_bytes(&mut self, ctx: Ctx, tag: Tag, vr: VR, len: u32) -> Result<ByteValue> {
        let mut buf = Vec::new();
        (&mut self.source)
            .take(u64::from(len))
            .read_to_end(&mut buf)
            .context(ReadValueSnafu { tag, len })?;

        if buf.len() < len as usize {
            if tag == Tag::PIXEL_DATA && self.options.recover {
                let pos = self.offset()?;
                self.record(RecoveryKind::TruncatedPixelData, tag, pos);
                if let Some(header) = self.last_header.as_mut() {
                    header.len = Length(buf.len() as u32);
                }
            } else {
                return TruncatedValueSnafu {
                    tag,
                    len,
                    found: buf.len() as u64,
                }
                .fail();
            }
        }

        swap_value(&mut buf, vr, ctx.swap);
        Ok(ByteValue::from(buf))
    }

    fn read_fragments(&mut self, ctx: Ctx) -> Result<SequenceOfFragments> {
        let mut offset_table = None;
        let mut fragments = Vec::new();
        loop {
            let tag = self.read_item_tag(ctx, "pixel data fragments")?;
            let len = self.read_item_len(ctx, tag)?;
            match tag {
                Tag::ITEM => {
                    let len = len.get().context(UndefinedItemLengthSnafu)?;
                    let mut buf = Vec::new();
                    (&mut self.source)
                        .take(u64::from(len))
                        .read_to_end(&mut buf)
                        .context(ReadValueSnafu { tag, len })?;
                    ensure!(
                        buf.len() == len as usize,
                        TruncatedValueSnafu {
                            tag,
                            len,
                            found: buf.len() as u64,
                        }
                    );
                    if offset_table.is_none() {
                        let decoder = BasicDecoder::from(ctx.swap);
                        let table = buf
                            .chunks_exact(4)
                            .map(|offset| decoder.decode_ul(offset))
                            .collect::<io::Result<Vec<u32>>>()
                            .context(ReadValueSnafu { tag, len })?;
                        offset_table = Some(table);
                    } else {
                        fragments.push(buf);
                    }
                }
                Tag::SEQUENCE_DELIMITER => break,
                tag => return UnexpectedItemTagSnafu { tag }.fail(),
            }
        }
        Ok(SequenceOfFragments::new(
            offset_table.unwrap_or_default(),
            fragments,
        ))
    }

    fn read_sequence(&mut self, ctx: Ctx, tag: Tag, len: Length) -> Result<SequenceOfItems> {
        self.depth += 1;
        let result = if self.depth > self.options.max_depth {
            MaxDepthExceededSnafu {
                max_depth: self.options.max_depth,
            }
            .fail()
        } else {
            match len.get() {
                None => self.read_undefined_sequence(ctx),
                Some(len) => self.read_defined_sequence(ctx, tag, len),
            }
        };
        self.depth -= 1;
        result
    }

    fn read_undefined_sequence(&mut self, ctx: Ctx) -> Result<SequenceOfItems> {
        let mut seq = SequenceOfItems::new();
        loop {
            let pos = self.offset()?;
            let tag = self.read_item_tag(ctx, "sequence")?;
            match tag {
                Tag::ITEM => {
                    let len = self.read_item_len(ctx, tag)?;
                    let (item, closed) = self.read_item(ctx, len)?;
                    seq.push(item);
                    if closed {
                        break;
                    }
                }
                Tag::SEQUENCE_DELIMITER => {
                    self.read_delimiter_len(ctx, tag, pos)?;
                    break;
                }
                Tag::ITEM_DELIMITER if self.options.recover => {
                    self.read_delimiter_len(ctx, tag, pos)?;
                    self.record(RecoveryKind::StrayDelimiter, tag, pos);
                }
                tag if tag == Tag::ITEM.swapped() && self.options.recover => {
                    let (item, closed) = self.read_swapped_item(ctx, pos)?;
                    seq.push(item);
                    if closed {
                        break;
                    }
                }
                tag if tag == Tag::SEQUENCE_DELIMITER.swapped() && self.options.recover => {
                    self.read_delimiter_len(ctx.inverted(), Tag::SEQUENCE_DELIMITER, pos)?;
                    break;
                }
                tag => return UnexpectedItemTagSnafu { tag }.fail(),
            }
        }
        Ok(seq)
    }

    fn read_defined_sequence(&mut self, ctx: Ctx, seq_tag: Tag, len: u32) -> Result<SequenceOfItems> {
        let mut seq = SequenceOfItems::new();
        let start = self.position()?;
        let end = start + u64::from(len);
        let seq_pos = self.offset()?;

        while self.position()? < end {
            let pos = self.offset()?;
            let tag = match read_tag_or_eof(&mut self.source, ctx.swap).context(ReadItemHeaderSnafu)? {
                Some(tag) => tag,
                None if self.options.recover => break,
                None => return UnexpectedEofSnafu { context: "sequence" }.fail(),
            };
            match tag {
                Tag::ITEM => {
                    let len = self.read_item_len(ctx, tag)?;
                    let (item, _) = self.read_item(ctx, len)?;
                    seq.push(item);
                }
                Tag::SEQUENCE_DELIMITER if self.options.recover => {
                    self.read_delimiter_len(ctx, tag, pos)?;
                    self.record(RecoveryKind::DelimiterInDefinedSequence, tag, pos);
                    seq.push(Item::sequence_delimiter());
                    break;
                }
                tag if tag == Tag::ITEM.swapped() && self.options.recover => {
                    let (item, _) = self.read_swapped_item(ctx, pos)?;
                    seq.push(item);
                }
                tag => return UnexpectedItemTagSnafu { tag }.fail(),
            }
        }

        let read = self.position()? - start;
        if read != u64::from(len) {
            ensure!(
                self.options.recover,
                ItemOverrunSnafu { len, read }
            );
            self.record(RecoveryKind::SequenceLengthCorrected, seq_tag, seq_pos);
            seq.set_length(Length(read as u32));
        } else {
            seq.set_length(Length(len));
        }
        Ok(seq)
    }

    /// Read the content of an item whose header was just read.
    ///
    /// Returns the item and whether a sequence delimiter
    /// closed it in place of an item delimiter.
    fn read_item(&mut self, ctx: Ctx, len: Length) -> Result<(Item, bool)> {
        match len.get() {
            None => {
                let (nested, closed) = self.read_nested(ctx)?;
                Ok((Item::from_parts(Tag::ITEM, len, nested), closed))
            }
            Some(defined) => {
                let nested = self.read_with_length(ctx, defined)?;
                Ok((Item::from_parts(Tag::ITEM, len, nested), false))
            }
        }
    }

    /// Read the elements of an item of undefined length
    /// up to its item delimiter.
    fn read_nested(&mut self, ctx: Ctx) -> Result<(DataSet, bool)> {
        let mut dataset = DataSet::new();
        loop {
            let pos = self.offset()?;
            match self.read_element(ctx, None)? {
                Next::Element(element) => {
                    dataset.insert(element);
                }
                Next::Delimiter(Tag::ITEM_DELIMITER) => return Ok((dataset, false)),
                Next::Delimiter(tag) if self.options.recover => {
                    self.record(RecoveryKind::MissingItemDelimiter, tag, pos);
                    return Ok((dataset, true));
                }
                Next::Delimiter(tag) => return UnexpectedItemTagSnafu { tag }.fail(),
                Next::Item(_) => return UnexpectedItemSnafu.fail(),
                Next::End => return UnexpectedEofSnafu { context: "item" }.fail(),
            }
        }
    }

    /// Read the elements of an item of defined length,
    /// never reading an element value past the end of the item.
    fn read_with_length(&mut self, ctx: Ctx, len: u32) -> Result<DataSet> {
        let mut dataset = DataSet::new();
        let start = self.position()?;
        let end = start + u64::from(len);
        loop {
            let here = self.position()?;
            if here >= end {
                break;
            }
            let pos = self.offset()?;
            match self.read_element(ctx, Some(end - here))? {
                Next::Element(element) => {
                    dataset.insert(element);
                }
                Next::Delimiter(Tag::ITEM_DELIMITER) if self.options.recover => {
                    self.record(RecoveryKind::DelimiterInDefinedItem, Tag::ITEM_DELIMITER, pos);
                    return Ok(dataset);
                }
                Next::Delimiter(tag) => return UnexpectedItemTagSnafu { tag }.fail(),
                Next::Item(_) => return UnexpectedItemSnafu.fail(),
                Next::End => return UnexpectedEofSnafu { context: "item" }.fail(),
            }
        }
        let read = self.position()? - start;
        ensure!(read == u64::from(len), ItemOverrunSnafu { len, read });
        Ok(dataset)
    }

    /// Read an item whose tag was found byte swapped.
    ///
    /// The item is first read with the inverted swap policy.
    /// Should that fail, it is read again with the stream policy
    /// and its content swapped afterwards.
    fn read_swapped_item(&mut self, ctx: Ctx, pos: u64) -> Result<(Item, bool)> {
        let inverted = ctx.inverted();
        let attempt = self.speculate(|reader| {
            reader.record(RecoveryKind::SwappedItem, Tag::ITEM, pos);
            let len = reader.read_item_len(inverted, Tag::ITEM)?;
            reader.read_item(inverted, len)
        })?;
        match attempt {
            Ok(item) => Ok(item),
            Err(e) => {
                debug!("Swapped item at {:#x} failed with inverted byte order: {}", pos, e);
                self.record(RecoveryKind::SwappedItemFallback, Tag::ITEM, pos);
                let len = self.read_item_len(inverted, Tag::ITEM)?;
                let (mut item, closed) = self.read_item(ctx, len)?;
                byte_swap_dataset(item.nested_mut(), true);
                Ok((item, closed))
            }
        }
    }

    /// Read one of the private sequences known to be written
    /// in the opposite byte order of the stream by some producers.
    fn read_private_sequence(
        &mut self,
        ctx: Ctx,
        tag: Tag,
        len: Length,
        pos: u64,
    ) -> Result<SequenceOfItems> {
        let first = self.peek_tag(ctx.swap)?;
        let swapped = first == Some(Tag::ITEM.swapped())
            || first == Some(Tag::SEQUENCE_DELIMITER.swapped());
        if !swapped {
            return self.read_sequence(ctx, tag, len);
        }

        let inverted = ctx.inverted();
        let attempt = self.speculate(|reader| {
            reader.record(RecoveryKind::SwappedPrivateSequence, tag, pos);
            reader.read_sequence(inverted, tag, len)
        })?;
        match attempt {
            Ok(seq) => Ok(seq),
            Err(e) => {
                debug!("Private sequence {} in inverted byte order failed: {}", tag, e);
                self.read_sequence(ctx, tag, len)
            }
        }
    }

    /// Read the value of an element of undefined length
    /// in an implicit VR region, peeking at what follows.
    fn read_implicit_undefined(&mut self, ctx: Ctx, tag: Tag, vr: VR, pos: u64) -> Result<Value> {
        match self.peek_tag(ctx.swap)? {
            Some(Tag::ITEM) | Some(Tag::SEQUENCE_DELIMITER) => self
                .read_sequence(ctx, tag, Length::UNDEFINED)
                .map(Value::Items),
            Some(next) if next == Tag::ITEM.swapped() && self.options.recover => {
                let explicit = Ctx {
                    codec: ElementCodec::Explicit,
                    swap: ctx.swap.inverted(),
                };
                let attempt = self.speculate(|reader| {
                    reader.record(RecoveryKind::ExplicitSequenceInImplicit, tag, pos);
                    reader.read_sequence(explicit, tag, Length::UNDEFINED)
                })?;
                match attempt {
                    Ok(seq) => Ok(Value::Items(seq)),
                    Err(e) => {
                        debug!("Sequence {} is not explicit VR: {}", tag, e);
                        self.record(RecoveryKind::SwappedItem, tag, pos);
                        self.read_sequence(ctx.inverted(), tag, Length::UNDEFINED)
                            .map(Value::Items)
                    }
                }
            }
            _ if vr == VR::UN && self.options.recover => {
                self.record(RecoveryKind::UnFlatScan, tag, pos);
                self.scan_to_sequence_delimiter(ctx, tag).map(Value::Bytes)
            }
            _ => UndefinedLengthSnafu { tag, vr }.fail(),
        }
    }

    /// Read the value of an explicit VR element of undefined length
    /// whose VR is neither SQ nor UN.
    ///
    /// Only an item header right after the element header
    /// makes it a sequence.
    fn read_explicit_undefined(&mut self, ctx: Ctx, tag: Tag, vr: VR, pos: u64) -> Result<Value> {
        match self.peek_tag(ctx.swap)? {
            Some(next) if next == Tag::ITEM || next == Tag::ITEM.swapped() => {
                self.record(RecoveryKind::UndefinedLengthAsSequence, tag, pos);
                self.read_sequence(ctx, tag, Length::UNDEFINED)
                    .map(Value::Items)
            }
            _ => UndefinedLengthSnafu { tag, vr }.fail(),
        }
    }

    /// Read the value of a UN element of undefined length.
    ///
    /// The value is tried as a sequence in the other VR encoding,
    /// then in the same encoding, and finally read as flat bytes
    /// up to the next sequence delimiter.
    fn read_un_undefined(&mut self, ctx: Ctx, tag: Tag, pos: u64) -> Result<Value> {
        let other = Ctx {
            codec: ctx.codec.other(),
            ..ctx
        };
        match self.speculate(|reader| reader.read_sequence(other, tag, Length::UNDEFINED))? {
            Ok(seq) => return Ok(Value::Items(seq)),
            Err(e) => trace!("{} is not a sequence in {:?}: {}", tag, other.codec, e),
        }

        let same = self.speculate(|reader| {
            reader.record(RecoveryKind::UnSequenceSameEncoding, tag, pos);
            reader.read_sequence(ctx, tag, Length::UNDEFINED)
        })?;
        match same {
            Ok(seq) => return Ok(Value::Items(seq)),
            Err(e) => trace!("{} is not a sequence in {:?}: {}", tag, ctx.codec, e),
        }

        self.record(RecoveryKind::UnFlatScan, tag, pos);
        self.scan_to_sequence_delimiter(ctx, tag).map(Value::Bytes)
    }

    /// Collect bytes up to the next sequence delimiter,
    /// leaving the source right after the delimiter.
    fn scan_to_sequence_delimiter(&mut self, ctx: Ctx, tag: Tag) -> Result<ByteValue> {
        let pattern: [u8; 4] = match ctx.swap.endianness() {
            Endianness::Little => [0xFE, 0xFF, 0xDD, 0xE0],
            Endianness::Big => [0xFF, 0xFE, 0xE0, 0xDD],
        };
        let start = self.position()?;
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let mut searched = 0;
        loop {
            let n = match self.source.read(&mut chunk) {
                Ok(0) => return UnterminatedValueSnafu { tag }.fail(),
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context(ScanValueSnafu { tag }),
            };
            buf.extend_from_slice(&chunk[..n]);
            if let Some(i) = buf[searched..].windows(4).position(|w| w == pattern) {
                let at = searched + i;
                // skip the delimiter tag and its length
                self.seek_to(start + at as u64 + 8)?;
                buf.truncate(at);
                return Ok(ByteValue::from(buf));
            }
            searched = buf.len().saturating_sub(3);
        }
    }

    /// Run a read which may be rolled back.
    ///
    /// The outer result fails only if the source could not be
    /// repositioned; the inner result is the outcome of the attempt.
    fn speculate<T, F>(&mut self, f: F) -> Result<Result<T>>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let checkpoint = Checkpoint {
            position: self.position()?,
            recoveries: self.recoveries.mark(),
            last_header: self.last_header,
        };
        match f(self) {
            Ok(value) => Ok(Ok(value)),
            Err(e) => {
                self.seek_to(checkpoint.position)?;
                self.recoveries.truncate(checkpoint.recoveries);
                self.last_header = checkpoint.last_header;
                Ok(Err(e))
            }
        }
    }

    fn peek_tag(&mut self, swap: SwapCode) -> Result<Option<Tag>> {
        let position = self.position()?;
        let tag = read_tag_or_eof(&mut self.source, swap).ok().flatten();
        self.seek_to(position)?;
        Ok(tag)
    }

    fn read_item_tag(&mut self, ctx: Ctx, context: &'static str) -> Result<Tag> {
        read_tag_or_eof(&mut self.source, ctx.swap)
            .context(ReadItemHeaderSnafu)?
            .context(UnexpectedEofSnafu { context })
    }

    fn read_item_len(&mut self, ctx: Ctx, tag: Tag) -> Result<Length> {
        read_item_length(&mut self.source, tag, ctx.swap).context(ReadItemHeaderSnafu)
    }

    fn read_delimiter_len(&mut self, ctx: Ctx, tag: Tag, pos: u64) -> Result<()> {
        let len = self.read_item_len(ctx, tag)?;
        if len != Length(0) {
            self.record(RecoveryKind::NonZeroDelimiterLength, tag, pos);
        }
        Ok(())
    }

    fn record(&mut self, kind: RecoveryKind, tag: Tag, position: u64) {
        warn!("{} at {:#x}: {}", tag, position, kind);
        self.recoveries.push(Recovery {
            kind,
            tag,
            position,
        });
    }

    fn position(&mut self) -> Result<u64> {
        self.source.stream_position().context(SeekSnafu)
    }

    /// The current position relative to the start of reading,
    /// plus the base offset.
    fn offset(&mut self) -> Result<u64> {
        let position = self.position()?;
        Ok(position.saturating_sub(self.start) + self.options.base_offset)
    }

    fn seek_to(&mut self, position: u64) -> Result<()> {
        self.source
            .seek(SeekFrom::Start(position))
            .context(SeekSnafu)?;
        Ok(())
    }
}

fn recovery_of(fixup: HeaderFixup) -> RecoveryKind {
    match fixup {
        HeaderFixup::GeLength13 => RecoveryKind::GeLength13,
        HeaderFixup::PapyrusLength => RecoveryKind::PapyrusLength,
        HeaderFixup::InvalidVr(_) => RecoveryKind::InvalidVr,
    }
}
