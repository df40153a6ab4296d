//! Printing of decoded data sets as indented element trees,
//! followed by the list of recoveries made while reading them.
//!
//! # Example
//!
//! A quick and easy way to dump the result of reading a data set
//! is via [`dump_outcome`]
//! (or [`dump_outcome_to`] to print to an arbitrary writer).
//!
//! ```no_run
//! use dcmio_dump::dump_outcome;
//! use dcmio_encoding::transfer_syntax::entries::EXPLICIT_VR_LITTLE_ENDIAN;
//! use dcmio_parser::{read_dataset, ReadOptions};
//!
//! let file = std::fs::File::open("path/to/dataset.bin")?;
//! let outcome = read_dataset(
//!     std::io::BufReader::new(file),
//!     ReadOptions::for_transfer_syntax(&EXPLICIT_VR_LITTLE_ENDIAN),
//! )?;
//! dump_outcome(&outcome)?;
//! # Result::<(), Box<dyn std::error::Error>>::Ok(())
//! ```
//!
//! Width, value trimming and coloring are set through [`DumpOptions`].
use dcmio_core::{DataElement, DataSet, Item, SequenceOfFragments, Tag, Value, VR};
use dcmio_parser::{ReadOutcome, RecoveryLog};
use owo_colors::*;
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::io::{stdout, Result as IoResult, Write};
use std::str::FromStr;

/// Builder for the layout of a data set dump.
///
/// [`dump_outcome`] and [`dump_outcome_to`] print the element tree
/// followed by the recovery report,
/// while [`dump_dataset`] and [`dump_dataset_to`] print only the tree.
///
/// [`dump_outcome`]: DumpOptions::dump_outcome
/// [`dump_outcome_to`]: DumpOptions::dump_outcome_to
/// [`dump_dataset`]: DumpOptions::dump_dataset
/// [`dump_dataset_to`]: DumpOptions::dump_dataset_to
///
/// ```no_run
/// # use dcmio_core::DataSet;
/// use dcmio_dump::{ColorMode, DumpOptions};
///
/// # let dataset = DataSet::new();
/// let mut options = DumpOptions::new();
/// options
///     .width(100)
///     .no_text_limit(true)
///     .color_mode(ColorMode::Never)
///     .dump_dataset(&dataset)?;
/// # Result::<(), Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
#[non_exhaustive]
pub struct DumpOptions {
    /// coloring of the printed values
    pub color: ColorMode,
    /// line width used to cut long values, detected from the terminal if unset
    pub width: Option<u32>,
    /// print text values in full
    pub no_text_limit: bool,
    /// print every value in full, text included
    pub no_limit: bool,
}

impl DumpOptions {
    pub fn new() -> Self {
        Default::default()
    }

    /// Cut long values so that lines fit in `width` characters.
    /// Dumps to arbitrary writers always print values in full.
    pub fn width(&mut self, width: u32) -> &mut Self {
        self.width = Some(width);
        self
    }

    /// Take the line width from the terminal, falling back to 120.
    pub fn width_auto(&mut self) -> &mut Self {
        self.width = None;
        self
    }

    /// Print text values in full.
    pub fn no_text_limit(&mut self, no_text_limit: bool) -> &mut Self {
        self.no_text_limit = no_text_limit;
        self
    }

    /// Print all values in full.
    pub fn no_limit(&mut self, no_limit: bool) -> &mut Self {
        self.no_limit = no_limit;
        self
    }

    /// Choose when values are colored.
    pub fn color_mode(&mut self, color: ColorMode) -> &mut Self {
        self.color = color;
        self
    }

    /// Dump a data set and its recovery report to standard output.
    pub fn dump_outcome(&self, outcome: &ReadOutcome) -> IoResult<()> {
        self.dump_outcome_impl(stdout(), outcome, true)
    }

    /// Dump a data set and its recovery report to the given writer.
    pub fn dump_outcome_to(&self, to: impl Write, outcome: &ReadOutcome) -> IoResult<()> {
        self.dump_outcome_impl(to, outcome, false)
    }

    fn dump_outcome_impl(
        &self,
        mut to: impl Write,
        outcome: &ReadOutcome,
        to_stdout: bool,
    ) -> IoResult<()> {
        self.dump_dataset_impl(&mut to, &outcome.dataset, to_stdout)?;
        writeln!(to, "{:-<58}", "")?;
        recovery_dump(&mut to, &outcome.recoveries)
    }

    /// Dump the contents of a data set to standard output.
    #[inline]
    pub fn dump_dataset(&self, dataset: &DataSet) -> IoResult<()> {
        self.dump_dataset_impl(stdout(), dataset, true)
    }

    /// Dump the contents of a data set to the given writer.
    #[inline]
    pub fn dump_dataset_to(&self, to: impl Write, dataset: &DataSet) -> IoResult<()> {
        self.dump_dataset_impl(to, dataset, false)
    }

    fn dump_dataset_impl(
        &self,
        mut to: impl Write,
        dataset: &DataSet,
        to_stdout: bool,
    ) -> IoResult<()> {
        match (self.color, to_stdout) {
            (ColorMode::Never, _) => owo_colors::set_override(false),
            (ColorMode::Always, _) => owo_colors::set_override(true),
            (ColorMode::Auto, false) => owo_colors::set_override(false),
            (ColorMode::Auto, true) => owo_colors::unset_override(),
        }

        let width = determine_width(self.width);

        let limits = if to_stdout {
            Limits {
                width,
                no_text_limit: self.no_text_limit,
                no_limit: self.no_limit,
            }
        } else {
            Limits {
                width,
                no_text_limit: true,
                no_limit: true,
            }
        };

        dump(&mut to, dataset, limits, 0)
    }
}

/// When to color the dump.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub enum ColorMode {
    /// Color only when standard output is a terminal.
    /// Dumps to arbitrary writers stay plain.
    #[default]
    Auto,
    /// Plain text.
    Never,
    /// Color regardless of the destination.
    Always,
}

impl Display for ColorMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ColorMode::Never => f.write_str("never"),
            ColorMode::Auto => f.write_str("auto"),
            ColorMode::Always => f.write_str("always"),
        }
    }
}

impl FromStr for ColorMode {
    type Err = ColorModeError;
    fn from_str(color: &str) -> Result<Self, Self::Err> {
        match color {
            "never" => Ok(ColorMode::Never),
            "auto" => Ok(ColorMode::Auto),
            "always" => Ok(ColorMode::Always),
            _ => Err(ColorModeError),
        }
    }
}

/// A color mode other than `auto`, `never` or `always`.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub struct ColorModeError;

impl Display for ColorModeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("invalid color mode")
    }
}

impl std::error::Error for ColorModeError {}

/// Dump a data set and its recovery report to stdout.
pub fn dump_outcome(outcome: &ReadOutcome) -> IoResult<()> {
    DumpOptions::new().dump_outcome(outcome)
}

/// Dump a data set and its recovery report to the given writer.
pub fn dump_outcome_to(to: impl Write, outcome: &ReadOutcome) -> IoResult<()> {
    DumpOptions::new().dump_outcome_to(to, outcome)
}

/// Dump the contents of a data set to stdout.
pub fn dump_dataset(dataset: &DataSet) -> IoResult<()> {
    DumpOptions::new().dump_dataset(dataset)
}

/// Dump the contents of a data set to the given writer.
pub fn dump_dataset_to(to: impl Write, dataset: &DataSet) -> IoResult<()> {
    DumpOptions::new().dump_dataset_to(to, dataset)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DumpValue<T>
where
    T: ToString,
{
    TagNum(T),
    Alias(T),
    Num(T),
    Str(T),
    Invalid(T),
    Nothing,
}

impl<T> Display for DumpValue<T>
where
    T: Display,
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        fn write_value_with_width(value: impl Display, f: &mut Formatter) -> fmt::Result {
            if let Some(width) = f.width() {
                write!(f, "{:width$}", value, width = width)
            } else {
                write!(f, "{}", value)
            }
        }

        match self {
            DumpValue::TagNum(v) => {
                let value = v.if_supports_color(Stream::Stdout, |v| v.dimmed());
                write_value_with_width(value, f)
            }
            DumpValue::Alias(v) => {
                let value = v.if_supports_color(Stream::Stdout, |v| v.bold());
                write_value_with_width(value, f)
            }
            DumpValue::Num(v) => {
                let value = v.if_supports_color(Stream::Stdout, |v| v.cyan());
                write_value_with_width(value, f)
            }
            DumpValue::Str(v) => {
                let value = v.if_supports_color(Stream::Stdout, |v| v.yellow());
                write_value_with_width(value, f)
            }
            DumpValue::Invalid(v) => {
                let value = v.if_supports_color(Stream::Stdout, |v| v.red());
                write_value_with_width(value, f)
            }
            DumpValue::Nothing => {
                let value = "(no value)".if_supports_color(Stream::Stdout, |v| v.italic());
                write_value_with_width(value, f)
            }
        }
    }
}

#[derive(Debug, Copy, Clone)]
struct Limits {
    width: u32,
    no_text_limit: bool,
    no_limit: bool,
}

impl Limits {
    fn max_characters(self, vr: VR, used: u32) -> Option<u32> {
        match (self.no_limit, self.no_text_limit) {
            (true, _) => None,
            (false, true) if vr.is_ascii() => None,
            _ => Some(self.width.saturating_sub(used)),
        }
    }
}

#[inline]
fn whitespace_or_null(c: char) -> bool {
    c.is_whitespace() || c == '\0'
}

fn recovery_dump<W>(to: &mut W, recoveries: &RecoveryLog) -> IoResult<()>
where
    W: ?Sized + Write,
{
    if recoveries.is_empty() {
        writeln!(to, "{}", "No recoveries".if_supports_color(Stream::Stdout, |v| v.bold()))?;
        return Ok(());
    }
    writeln!(
        to,
        "{} ({}):",
        "Recoveries".if_supports_color(Stream::Stdout, |v| v.bold()),
        recoveries.len(),
    )?;
    for recovery in recoveries {
        writeln!(
            to,
            "  {:#010x} {} {}",
            recovery.position,
            DumpValue::TagNum(recovery.tag),
            DumpValue::Invalid(recovery.kind),
        )?;
    }
    Ok(())
}

fn dump<W>(to: &mut W, dataset: &DataSet, limits: Limits, depth: u32) -> IoResult<()>
where
    W: ?Sized + Write,
{
    for elem in dataset {
        dump_element(&mut *to, elem, limits, depth)?;
    }

    Ok(())
}

fn dump_element<W>(to: &mut W, elem: &DataElement, limits: Limits, depth: u32) -> IoResult<()>
where
    W: ?Sized + Write,
{
    let indent = "  ".repeat(depth as usize);
    let vr = elem.vr();

    match elem.value() {
        Value::Items(seq) => {
            let n = seq.len();
            writeln!(
                to,
                "{}{} {} ({} Item{}, {} bytes)",
                indent,
                DumpValue::TagNum(elem.tag()),
                vr,
                n,
                if n == 1 { "" } else { "s" },
                seq.length(),
            )?;
            for item in seq.items() {
                dump_item(&mut *to, item, limits, depth + 1)?;
            }
            if seq.is_undefined_length() {
                writeln!(
                    to,
                    "{}{} {}",
                    indent,
                    DumpValue::TagNum(Tag::SEQUENCE_DELIMITER),
                    DumpValue::Alias("SequenceDelimitationItem"),
                )?;
            }
        }
        Value::Fragments(seq) => {
            dump_fragments(&mut *to, elem, seq, limits, depth)?;
        }
        Value::Bytes(bytes) => {
            let vm = match elem.multiplicity() {
                Some(vm) => vm.to_string(),
                None => "?".to_string(),
            };
            writeln!(
                to,
                "{}{} {} ({},{:>3} bytes): {}",
                indent,
                DumpValue::TagNum(elem.tag()),
                vr,
                vm,
                bytes.len(),
                value_summary(
                    bytes.as_bytes(),
                    vr,
                    limits.max_characters(vr, 36 + depth * 2),
                ),
            )?;
        }
    }

    Ok(())
}

fn dump_item<W>(to: &mut W, item: &Item, limits: Limits, depth: u32) -> IoResult<()>
where
    W: ?Sized + Write,
{
    let indent: String = "  ".repeat(depth as usize);
    if item.is_delimiter() {
        // kept in place of a premature sequence delimiter
        writeln!(
            to,
            "{}{} {}",
            indent,
            DumpValue::TagNum(Tag::SEQUENCE_DELIMITER),
            DumpValue::Invalid("SequenceDelimitationItem (in place of an item)"),
        )?;
        return Ok(());
    }
    writeln!(
        to,
        "{}{} {} ({} bytes)",
        indent,
        DumpValue::TagNum(Tag::ITEM),
        DumpValue::Alias("Item"),
        item.length(),
    )?;
    dump(to, item.nested(), limits, depth + 1)?;
    if item.length().is_undefined() {
        writeln!(
            to,
            "{}{} {}",
            indent,
            DumpValue::TagNum(Tag::ITEM_DELIMITER),
            DumpValue::Alias("ItemDelimitationItem"),
        )?;
    }
    Ok(())
}

fn dump_fragments<W>(
    to: &mut W,
    elem: &DataElement,
    seq: &SequenceOfFragments,
    limits: Limits,
    depth: u32,
) -> IoResult<()>
where
    W: ?Sized + Write,
{
    let indent = "  ".repeat(depth as usize);
    // write pixel sequence start line
    let num_items = 1 + seq.number_of_fragments();
    writeln!(
        to,
        "{}{} {} (PixelSequence, {} Item{})",
        indent,
        DumpValue::TagNum(elem.tag()),
        elem.vr(),
        num_items,
        if num_items == 1 { "" } else { "s" },
    )?;

    let max_characters = limits.max_characters(VR::OB, 38 + depth * 2);

    // write offset table
    let offset_table = seq.offset_table();
    writeln!(
        to,
        "{}  {} offset table ({:>2}, {:>2} bytes): {}",
        indent,
        DumpValue::TagNum(Tag::ITEM),
        offset_table.len(),
        offset_table.len() * 4,
        offset_table_summary(offset_table, max_characters),
    )?;

    // write compressed fragments
    for fragment in seq.fragments() {
        writeln!(
            to,
            "{}  {} pi ({:>3} bytes): {}",
            indent,
            DumpValue::TagNum(Tag::ITEM),
            fragment.len(),
            DumpValue::Num(hex_summary(fragment, max_characters)),
        )?;
    }
    Ok(())
}

/// Render a value for display.
/// Binary values are held little endian in memory.
fn value_summary(data: &[u8], vr: VR, max_characters: Option<u32>) -> DumpValue<String> {
    if data.is_empty() {
        return DumpValue::Nothing;
    }

    macro_rules! numbers {
        ($t:ty, $n:expr) => {
            DumpValue::Num(format_value_list(
                data.chunks_exact($n)
                    .map(|c| {
                        let mut buf = [0u8; $n];
                        buf.copy_from_slice(c);
                        <$t>::from_le_bytes(buf)
                    })
                    .collect::<Vec<_>>(),
                max_characters,
                false,
            ))
        };
    }

    match vr {
        VR::US => numbers!(u16, 2),
        VR::SS => numbers!(i16, 2),
        VR::UL => numbers!(u32, 4),
        VR::SL => numbers!(i32, 4),
        VR::UV => numbers!(u64, 8),
        VR::SV => numbers!(i64, 8),
        VR::FL => numbers!(f32, 4),
        VR::FD => numbers!(f64, 8),
        VR::AT => DumpValue::Str(format_value_list(
            data.chunks_exact(4)
                .map(|c| Tag(u16::from_le_bytes([c[0], c[1]]), u16::from_le_bytes([c[2], c[3]])))
                .collect::<Vec<_>>(),
            max_characters,
            false,
        )),
        VR::LT | VR::ST | VR::UT | VR::UR => {
            let text = String::from_utf8_lossy(data);
            let txt = format!(
                "\"{}\"",
                sanitize(text.trim_end_matches(whitespace_or_null))
            );
            match max_characters {
                Some(max) => DumpValue::Str(cut_str(&txt, max).into_owned()),
                None => DumpValue::Str(txt),
            }
        }
        vr if vr.is_ascii() => {
            let text = String::from_utf8_lossy(data);
            if !text.is_ascii() && !matches!(vr, VR::LO | VR::PN | VR::SH | VR::UC) {
                return DumpValue::Invalid(format_value_list(
                    text.split('\\').collect::<Vec<_>>(),
                    max_characters,
                    true,
                ));
            }
            DumpValue::Str(format_value_list(
                text.split('\\')
                    .map(|s| s.trim_end_matches(whitespace_or_null))
                    .collect::<Vec<_>>(),
                max_characters,
                true,
            ))
        }
        _ => DumpValue::Num(hex_summary(data, max_characters)),
    }
}

fn hex_summary(data: &[u8], max_characters: Option<u32>) -> String {
    // three characters per byte are enough to fill the line
    let shown = match max_characters {
        Some(max) => data.len().min(max as usize / 3 + 1),
        None => data.len(),
    };
    let mut out = data[..shown]
        .iter()
        .map(|n| format!("{:02X}", n))
        .collect::<Vec<_>>()
        .join(", ");
    if shown < data.len() {
        out.push_str(", ...");
    }
    if data.len() > 1 {
        out = format!("[{}]", out);
    }
    match max_characters {
        Some(max) => cut_str(&out, max).into_owned(),
        None => out,
    }
}

fn offset_table_summary(data: &[u32], max_characters: Option<u32>) -> String {
    if data.is_empty() {
        format!("{}", "(empty)".if_supports_color(Stream::Stdout, |v| v.italic()))
    } else {
        format_value_list(
            data.iter().map(|n| format!("{:04X}", n)),
            max_characters,
            false,
        )
    }
}

fn sanitize(piece: &str) -> String {
    piece
        .replace('\n', "␊")
        .replace('\r', "␍")
        .replace('\0', "␀")
        .replace(|c: char| c.is_control(), "�")
}

fn format_value_list<I>(values: I, max_characters: Option<u32>, quoted: bool) -> String
where
    I: IntoIterator,
    I::IntoIter: ExactSizeIterator,
    I::Item: Display,
{
    let values = values.into_iter();
    let len = values.len();
    let mut acc_size = 0;
    let mut pieces = String::new();
    if len > 1 {
        pieces.push('[');
    }
    for piece in values {
        let mut piece = sanitize(&piece.to_string());

        if acc_size > 0 {
            pieces.push_str(", ");
        }

        if quoted {
            piece = piece.replace('\"', "\\\"");
            pieces.push('"');
        }

        acc_size += piece.len();
        pieces.push_str(&piece);
        if quoted {
            pieces.push('"');
        }
        // stop earlier if applicable
        if max_characters
            .filter(|max| (*max as usize) < acc_size)
            .is_some()
        {
            break;
        }
    }
    if len > 1 {
        pieces.push(']');
    }
    if let Some(max_characters) = max_characters {
        cut_str(&pieces, max_characters).into_owned()
    } else {
        pieces
    }
}

fn cut_str(s: &str, max_characters: u32) -> Cow<str> {
    let max = (max_characters.saturating_sub(3)) as usize;
    let len = s.chars().count();

    if len > max {
        s.chars()
            .take(max)
            .chain("...".chars())
            .collect::<String>()
            .into()
    } else {
        s.into()
    }
}

fn determine_width(user_width: Option<u32>) -> u32 {
    user_width
        .or_else(|| terminal_size::terminal_size().map(|(width, _)| width.0 as u32))
        .unwrap_or(120)
}
