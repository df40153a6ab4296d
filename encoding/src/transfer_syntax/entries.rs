//! A list of known transfer syntax specifiers.
//!
//! Encapsulated transfer syntaxes are known for their framing only:
//! their data sets can be read and written,
//! their pixel data fragments are kept opaque.

use super::TransferSyntax as Ts;
use byteordered::Endianness;

// -- the native transfer syntaxes --

/// Implicit VR Little Endian: Default Transfer Syntax for DICOM
pub const IMPLICIT_VR_LITTLE_ENDIAN: Ts = Ts::new(
    "1.2.840.10008.1.2",
    "Implicit VR Little Endian",
    Endianness::Little,
    false,
);

/// Explicit VR Little Endian
pub const EXPLICIT_VR_LITTLE_ENDIAN: Ts = Ts::new(
    "1.2.840.10008.1.2.1",
    "Explicit VR Little Endian",
    Endianness::Little,
    true,
);

/// Explicit VR Big Endian (retired)
pub const EXPLICIT_VR_BIG_ENDIAN: Ts = Ts::new(
    "1.2.840.10008.1.2.2",
    "Explicit VR Big Endian",
    Endianness::Big,
    true,
);

/// GE Private Implicit VR Big Endian
pub const GE_PRIVATE_IMPLICIT_VR_BIG_ENDIAN: Ts = Ts::new(
    "1.2.840.113619.5.2",
    "GE Private Implicit VR Big Endian",
    Endianness::Big,
    false,
);

/// Deflated Explicit VR Little Endian: recognized, not decodable
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: Ts = Ts::new_deflated(
    "1.2.840.10008.1.2.1.99",
    "Deflated Explicit VR Little Endian",
);

// -- encapsulated pixel data --

/// Encapsulated Uncompressed Explicit VR Little Endian
pub const ENCAPSULATED_UNCOMPRESSED_EXPLICIT_VR_LITTLE_ENDIAN: Ts = Ts::new_encapsulated(
    "1.2.840.10008.1.2.1.98",
    "Encapsulated Uncompressed Explicit VR Little Endian",
);

/// JPEG Baseline (Process 1)
pub const JPEG_BASELINE: Ts = Ts::new_encapsulated("1.2.840.10008.1.2.4.50", "JPEG Baseline");

/// JPEG Extended (Process 2 & 4)
pub const JPEG_EXTENDED: Ts = Ts::new_encapsulated("1.2.840.10008.1.2.4.51", "JPEG Extended");

/// JPEG Lossless, Non-Hierarchical (Process 14)
pub const JPEG_LOSSLESS_NON_HIERARCHICAL: Ts =
    Ts::new_encapsulated("1.2.840.10008.1.2.4.57", "JPEG Lossless, Non-Hierarchical");

/// JPEG Lossless, Non-Hierarchical, First-Order Prediction (Process 14, Selection Value 1)
pub const JPEG_LOSSLESS_NON_HIERARCHICAL_FIRST_ORDER_PREDICTION: Ts = Ts::new_encapsulated(
    "1.2.840.10008.1.2.4.70",
    "JPEG Lossless, Non-Hierarchical, First-Order Prediction",
);

/// JPEG-LS Lossless Image Compression
pub const JPEG_LS_LOSSLESS_IMAGE_COMPRESSION: Ts =
    Ts::new_encapsulated("1.2.840.10008.1.2.4.80", "JPEG-LS Lossless");

/// JPEG-LS Lossy (Near-Lossless) Image Compression
pub const JPEG_LS_LOSSY_IMAGE_COMPRESSION: Ts =
    Ts::new_encapsulated("1.2.840.10008.1.2.4.81", "JPEG-LS Lossy (Near-Lossless)");

/// JPEG 2000 Image Compression (Lossless Only)
pub const JPEG_2000_IMAGE_COMPRESSION_LOSSLESS_ONLY: Ts =
    Ts::new_encapsulated("1.2.840.10008.1.2.4.90", "JPEG 2000 (Lossless Only)");

/// JPEG 2000 Image Compression
pub const JPEG_2000_IMAGE_COMPRESSION: Ts =
    Ts::new_encapsulated("1.2.840.10008.1.2.4.91", "JPEG 2000");

/// RLE Lossless
pub const RLE_LOSSLESS: Ts = Ts::new_encapsulated("1.2.840.10008.1.2.5", "RLE Lossless");

/// Every transfer syntax in this list.
pub static ALL: &[&Ts] = &[
    &IMPLICIT_VR_LITTLE_ENDIAN,
    &EXPLICIT_VR_LITTLE_ENDIAN,
    &EXPLICIT_VR_BIG_ENDIAN,
    &GE_PRIVATE_IMPLICIT_VR_BIG_ENDIAN,
    &DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN,
    &ENCAPSULATED_UNCOMPRESSED_EXPLICIT_VR_LITTLE_ENDIAN,
    &JPEG_BASELINE,
    &JPEG_EXTENDED,
    &JPEG_LOSSLESS_NON_HIERARCHICAL,
    &JPEG_LOSSLESS_NON_HIERARCHICAL_FIRST_ORDER_PREDICTION,
    &JPEG_LS_LOSSLESS_IMAGE_COMPRESSION,
    &JPEG_LS_LOSSY_IMAGE_COMPRESSION,
    &JPEG_2000_IMAGE_COMPRESSION_LOSSLESS_ONLY,
    &JPEG_2000_IMAGE_COMPRESSION,
    &RLE_LOSSLESS,
];
