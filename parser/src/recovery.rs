//! Reporting of tolerated non-conformances.
//!
//! Each time the reader corrects data from a known broken producer,
//! it records a [`Recovery`] event next to the usual warning log,
//! so that callers can tell a clean read from a read with corrections.

use dcmio_core::{DataSet, Tag};
use std::fmt;

/// The kind of non-conformance which was tolerated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RecoveryKind {
    /// Implicit VR length 13 read as 10.
    GeLength13,
    /// Corrupt Papyrus length replaced by 202.
    PapyrusLength,
    /// Unknown VR code read as UN with a 16-bit length.
    InvalidVr,
    /// The whole stream was read again tolerating unknown VR codes.
    Cp246Retry,
    /// An item or sequence delimiter outside of any sequence was skipped.
    StrayDelimiter,
    /// An item header outside of any sequence was skipped.
    StrayItem,
    /// A delimiter had a non-zero length.
    NonZeroDelimiterLength,
    /// An item written in the opposite byte order was read
    /// with the inverted swap policy.
    SwappedItem,
    /// A swapped item was read with the stream policy
    /// and its content byte swapped afterwards.
    SwappedItemFallback,
    /// A known private sequence was read with the inverted swap policy.
    SwappedPrivateSequence,
    /// An explicit VR sequence was found inside an implicit VR stream.
    ExplicitSequenceInImplicit,
    /// A UN element of undefined length held items
    /// in the same encoding as its parent.
    UnSequenceSameEncoding,
    /// A UN element of undefined length was read as flat bytes
    /// up to the sequence delimiter.
    UnFlatScan,
    /// An element of undefined length with a VR other than SQ or UN
    /// was followed by an item and read as a sequence.
    UndefinedLengthAsSequence,
    /// A defined sequence length did not match its content.
    SequenceLengthCorrected,
    /// A sequence delimiter ended a defined length sequence.
    DelimiterInDefinedSequence,
    /// An item delimiter ended a defined length item.
    DelimiterInDefinedItem,
    /// A sequence delimiter closed an item of undefined length.
    MissingItemDelimiter,
    /// Pixel data ended before its declared length.
    TruncatedPixelData,
    /// Pixel data of undefined length in a native transfer syntax
    /// was read as fragments.
    UndefinedPixelDataInNativeSyntax,
}

impl RecoveryKind {
    /// A short human readable description.
    pub fn description(self) -> &'static str {
        match self {
            RecoveryKind::GeLength13 => "length 13 read as 10",
            RecoveryKind::PapyrusLength => "corrupt Papyrus length replaced",
            RecoveryKind::InvalidVr => "unknown VR read as UN",
            RecoveryKind::Cp246Retry => "stream read again tolerating unknown VRs",
            RecoveryKind::StrayDelimiter => "stray delimiter skipped",
            RecoveryKind::StrayItem => "stray item header skipped",
            RecoveryKind::NonZeroDelimiterLength => "delimiter with non-zero length",
            RecoveryKind::SwappedItem => "byte swapped item",
            RecoveryKind::SwappedItemFallback => "byte swapped item content swapped back",
            RecoveryKind::SwappedPrivateSequence => "private sequence in inverted byte order",
            RecoveryKind::ExplicitSequenceInImplicit => "explicit VR sequence in implicit VR stream",
            RecoveryKind::UnSequenceSameEncoding => "UN sequence in the parent encoding",
            RecoveryKind::UnFlatScan => "UN of undefined length read as bytes",
            RecoveryKind::UndefinedLengthAsSequence => "undefined length value read as a sequence",
            RecoveryKind::SequenceLengthCorrected => "sequence length corrected",
            RecoveryKind::DelimiterInDefinedSequence => "delimiter in defined length sequence",
            RecoveryKind::DelimiterInDefinedItem => "delimiter in defined length item",
            RecoveryKind::MissingItemDelimiter => "item closed by sequence delimiter",
            RecoveryKind::TruncatedPixelData => "truncated pixel data",
            RecoveryKind::UndefinedPixelDataInNativeSyntax => {
                "encapsulated pixel data in native transfer syntax"
            }
        }
    }
}

impl fmt::Display for RecoveryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A tolerated non-conformance, located in the stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Recovery {
    /// What was corrected.
    pub kind: RecoveryKind,
    /// The tag of the element, item or delimiter involved.
    pub tag: Tag,
    /// The stream position where the correction applied.
    pub position: u64,
}

impl fmt::Display for Recovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x} {}: {}", self.position, self.tag, self.kind)
    }
}

/// The ordered list of recoveries made while reading.
///
/// Speculative reads take a mark of the log
/// and truncate it back when they are rolled back.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecoveryLog {
    events: Vec<Recovery>,
}

impl RecoveryLog {
    /// Create an empty log.
    pub fn new() -> Self {
        RecoveryLog::default()
    }

    /// Record a recovery event.
    pub fn push(&mut self, recovery: Recovery) {
        self.events.push(recovery);
    }

    /// The current size of the log, to be restored with [`truncate`](Self::truncate).
    pub fn mark(&self) -> usize {
        self.events.len()
    }

    /// Discard every event recorded after the given mark.
    pub fn truncate(&mut self, mark: usize) {
        self.events.truncate(mark);
    }

    /// Iterate over the recorded events.
    pub fn iter(&self) -> std::slice::Iter<'_, Recovery> {
        self.events.iter()
    }

    /// The number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether an event of the given kind was recorded.
    pub fn contains(&self, kind: RecoveryKind) -> bool {
        self.events.iter().any(|r| r.kind == kind)
    }

    /// Clear the log.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl IntoIterator for RecoveryLog {
    type Item = Recovery;
    type IntoIter = std::vec::IntoIter<Recovery>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecoveryLog {
    type Item = &'a Recovery;
    type IntoIter = std::slice::Iter<'a, Recovery>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// The result of reading a data set:
/// the data set and the corrections made along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome {
    /// The data set read.
    pub dataset: DataSet,
    /// The tolerated non-conformances, in stream order of detection.
    pub recoveries: RecoveryLog,
}

impl ReadOutcome {
    /// Whether the data set was read without any correction.
    pub fn is_clean(&self) -> bool {
        self.recoveries.is_empty()
    }

    /// Take the data set, discarding the recovery report.
    pub fn into_dataset(self) -> DataSet {
        self.dataset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_rollback() {
        let mut log = RecoveryLog::new();
        log.push(Recovery {
            kind: RecoveryKind::GeLength13,
            tag: Tag(0x0010, 0x0010),
            position: 8,
        });
        let mark = log.mark();
        log.push(Recovery {
            kind: RecoveryKind::SwappedItem,
            tag: Tag::ITEM,
            position: 64,
        });
        assert!(log.contains(RecoveryKind::SwappedItem));
        log.truncate(mark);
        assert_eq!(log.len(), 1);
        assert!(!log.contains(RecoveryKind::SwappedItem));
        assert_eq!(
            log.iter().next().unwrap().to_string(),
            "0x00000008 (0010,0010): length 13 read as 10"
        );
    }
}
