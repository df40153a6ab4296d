//! Module containing the transfer syntax descriptor and the registry
//! of known transfer syntaxes.
//!
//! A transfer syntax is selected by a collaborator which already
//! parsed the file meta group. It determines the byte order,
//! whether the VR is explicit, and whether pixel data is encapsulated,
//! hence which element codec variant and swap policy a reader uses.

pub mod entries;

use crate::decode::ElementCodec;
use crate::swap::SwapCode;
use dcmio_core::VrEncoding;

pub use byteordered::Endianness;

/// A DICOM transfer syntax specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSyntax {
    /// The unique identifier of the transfer syntax.
    uid: &'static str,
    /// The name of the transfer syntax.
    name: &'static str,
    /// The byte order of data.
    byte_order: Endianness,
    /// Whether the transfer syntax mandates an explicit value representation,
    /// or the VR is implicit.
    explicit_vr: bool,
    /// Whether pixel data is encapsulated in fragments.
    encapsulated: bool,
    /// Whether the whole data set is deflated.
    deflated: bool,
}

impl TransferSyntax {
    /// Create a native (non encapsulated) transfer syntax descriptor.
    pub const fn new(
        uid: &'static str,
        name: &'static str,
        byte_order: Endianness,
        explicit_vr: bool,
    ) -> Self {
        TransferSyntax {
            uid,
            name,
            byte_order,
            explicit_vr,
            encapsulated: false,
            deflated: false,
        }
    }

    /// Create a descriptor for an explicit VR little endian transfer syntax
    /// with encapsulated pixel data.
    pub const fn new_encapsulated(uid: &'static str, name: &'static str) -> Self {
        TransferSyntax {
            uid,
            name,
            byte_order: Endianness::Little,
            explicit_vr: true,
            encapsulated: true,
            deflated: false,
        }
    }

    /// Create a descriptor for a deflated explicit VR little endian
    /// transfer syntax.
    pub const fn new_deflated(uid: &'static str, name: &'static str) -> Self {
        TransferSyntax {
            uid,
            name,
            byte_order: Endianness::Little,
            explicit_vr: true,
            encapsulated: false,
            deflated: true,
        }
    }

    /// Obtain this transfer syntax' unique identifier.
    pub const fn uid(&self) -> &'static str {
        self.uid
    }

    /// Obtain the name of this transfer syntax.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Obtain this transfer syntax' expected endianness.
    pub const fn endianness(&self) -> Endianness {
        self.byte_order
    }

    /// Check whether this transfer syntax expects an explicit VR.
    pub const fn is_explicit_vr(&self) -> bool {
        self.explicit_vr
    }

    /// Check whether pixel data is encapsulated in this transfer syntax.
    pub const fn is_encapsulated(&self) -> bool {
        self.encapsulated
    }

    /// Check whether the data set is deflated in this transfer syntax.
    /// Deflated data sets are recognized but cannot be decoded.
    pub const fn is_deflated(&self) -> bool {
        self.deflated
    }

    /// Whether data sets in this transfer syntax
    /// can be read and written by this library.
    pub const fn is_supported(&self) -> bool {
        !self.deflated
    }

    /// The swap policy of a stream in this transfer syntax.
    pub fn swap_code(&self) -> SwapCode {
        SwapCode::from(self.byte_order)
    }

    /// The VR encoding of this transfer syntax.
    pub fn vr_encoding(&self) -> VrEncoding {
        if self.explicit_vr {
            VrEncoding::Explicit
        } else {
            VrEncoding::Implicit
        }
    }

    /// The element codec variant to read this transfer syntax with.
    ///
    /// With recovery enabled, explicit VR streams are read
    /// with the variant tolerating unknown VR codes.
    pub fn element_codec(&self, recover: bool) -> ElementCodec {
        match (self.explicit_vr, recover) {
            (false, _) => ElementCodec::Implicit,
            (true, true) => ElementCodec::Cp246Explicit,
            (true, false) => ElementCodec::Explicit,
        }
    }
}

/// Trait for containers of transfer syntax specifiers.
pub trait TransferSyntaxIndex {
    /// Obtain a DICOM transfer syntax by its respective UID.
    ///
    /// Implementations of this method should be robust to the possible
    /// presence of trailing null characters (`\0`) or spaces in `uid`.
    fn get(&self, uid: &str) -> Option<&TransferSyntax>;
}

impl<T: ?Sized> TransferSyntaxIndex for &T
where
    T: TransferSyntaxIndex,
{
    fn get(&self, uid: &str) -> Option<&TransferSyntax> {
        (**self).get(uid)
    }
}

/// The index of transfer syntaxes known to this library.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct TransferSyntaxRegistry;

impl TransferSyntaxRegistry {
    /// Iterate over all known transfer syntaxes.
    pub fn iter(&self) -> impl Iterator<Item = &'static TransferSyntax> {
        entries::ALL.iter().copied()
    }
}

impl TransferSyntaxIndex for TransferSyntaxRegistry {
    fn get(&self, uid: &str) -> Option<&TransferSyntax> {
        get(uid)
    }
}

/// Look up a known transfer syntax by UID.
///
/// ```
/// # use dcmio_encoding::transfer_syntax;
/// let ts = transfer_syntax::get("1.2.840.10008.1.2.2\0").unwrap();
/// assert_eq!(ts.name(), "Explicit VR Big Endian");
/// ```
pub fn get(uid: &str) -> Option<&'static TransferSyntax> {
    let uid = uid.trim_end_matches(|c: char| c == '\0' || c.is_whitespace());
    entries::ALL.iter().copied().find(|ts| ts.uid == uid)
}
