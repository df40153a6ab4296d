//! Encapsulated pixel data fragments.
use std::io::{self, Write};

/// A single opaque chunk of encapsulated pixel data.
pub type Fragment = Vec<u8>;

/// The list of fragments of an encapsulated pixel data element,
/// preceded by the basic offset table.
///
/// The offset table holds, for each frame,
/// the byte offset of its first fragment item
/// relative to the first fragment item.
/// It is often empty.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SequenceOfFragments {
    offset_table: Vec<u32>,
    fragments: Vec<Fragment>,
}

impl SequenceOfFragments {
    /// Create a fragment sequence from its parts.
    pub fn new(offset_table: Vec<u32>, fragments: Vec<Fragment>) -> Self {
        SequenceOfFragments {
            offset_table,
            fragments,
        }
    }

    /// Build a fragment sequence out of whole frames,
    /// splitting each frame into fragments of at most `fragment_size` bytes
    /// (0 for one fragment per frame).
    ///
    /// Fragments are padded to an even length,
    /// and the offset table is filled in when there is more than one frame.
    pub fn from_frames<I>(frames: I, fragment_size: u32) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        let mut offset_table = Vec::new();
        let mut fragments = Vec::new();
        let mut current_offset = 0u32;

        for frame in frames {
            offset_table.push(current_offset);
            let size = if fragment_size == 0 {
                frame.len().max(1)
            } else {
                (fragment_size + fragment_size % 2) as usize
            };
            for chunk in frame.chunks(size) {
                let mut fragment = chunk.to_vec();
                if fragment.len() % 2 != 0 {
                    fragment.push(0);
                }
                current_offset += fragment.len() as u32 + 8;
                fragments.push(fragment);
            }
        }

        if offset_table.len() <= 1 {
            offset_table.clear();
        }

        SequenceOfFragments {
            offset_table,
            fragments,
        }
    }

    /// The basic offset table.
    #[inline]
    pub fn offset_table(&self) -> &[u32] {
        &self.offset_table
    }

    /// Replace the basic offset table.
    pub fn set_offset_table(&mut self, offset_table: Vec<u32>) {
        self.offset_table = offset_table;
    }

    /// All fragments, in order.
    #[inline]
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Retrieve the fragment at the given index.
    #[inline]
    pub fn fragment(&self, index: usize) -> Option<&[u8]> {
        self.fragments.get(index).map(|f| f.as_slice())
    }

    /// The number of fragments, excluding the offset table.
    #[inline]
    pub fn number_of_fragments(&self) -> usize {
        self.fragments.len()
    }

    /// Whether there are no fragments.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Append a fragment.
    pub fn push(&mut self, fragment: Fragment) {
        self.fragments.push(fragment);
    }

    /// The total number of bytes of fragment data,
    /// excluding item headers and the offset table.
    pub fn compute_byte_length(&self) -> u64 {
        self.fragments.iter().map(|f| f.len() as u64).sum()
    }

    /// Concatenate all fragments into one contiguous buffer.
    pub fn to_buffer(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.compute_byte_length() as usize);
        for fragment in &self.fragments {
            out.extend_from_slice(fragment);
        }
        out
    }

    /// Stream all fragments, in order, into the given writer.
    pub fn write_buffer<W: Write>(&self, mut to: W) -> io::Result<u64> {
        let mut written = 0;
        for fragment in &self.fragments {
            to.write_all(fragment)?;
            written += fragment.len() as u64;
        }
        Ok(written)
    }

    /// The number of bytes this value takes when encoded:
    /// the offset table item, one item per fragment,
    /// and the sequence delimitation item.
    pub fn encoded_size(&self) -> u64 {
        8 + 4 * self.offset_table.len() as u64
            + self
                .fragments
                .iter()
                .map(|f| 8 + f.len() as u64)
                .sum::<u64>()
            + 8
    }
}

#[cfg(test)]
mod tests {
    use super::SequenceOfFragments;

    #[test]
    fn single_frame_single_fragment() {
        let seq = SequenceOfFragments::from_frames(vec![vec![1, 2, 3, 4]], 0);
        assert_eq!(seq.number_of_fragments(), 1);
        assert!(seq.offset_table().is_empty());
        assert_eq!(seq.to_buffer(), vec![1, 2, 3, 4]);
        assert_eq!(seq.encoded_size(), 8 + 8 + 4 + 8);
    }

    #[test]
    fn multi_frame_offsets() {
        let seq = SequenceOfFragments::from_frames(vec![vec![0; 6], vec![1; 3]], 0);
        assert_eq!(seq.offset_table(), &[0, 14]);
        assert_eq!(seq.fragment(1), Some(&[1, 1, 1, 0][..]));
        assert_eq!(seq.compute_byte_length(), 10);
    }

    #[test]
    fn split_frames_into_fragments() {
        let seq = SequenceOfFragments::from_frames(vec![vec![7; 10]], 4);
        assert_eq!(seq.number_of_fragments(), 3);
        assert_eq!(seq.fragment(2), Some(&[7, 7][..]));
        let mut out = Vec::new();
        assert_eq!(seq.write_buffer(&mut out).unwrap(), 10);
        assert_eq!(out, vec![7; 10]);
    }
}
