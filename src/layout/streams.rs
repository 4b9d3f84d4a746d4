//! Stream names, header overhead formulas, and heap-size inputs for the metadata root.
//!
//! The metadata root begins with a storage signature (magic, format version, and a padded
//! version string), followed by a stream directory whose entries each cost a fixed 8 bytes
//! plus the stream name padded with its terminator to a 4-byte multiple. This module holds
//! the names, the padding arithmetic, and the heap-size flag byte the table stream header
//! carries; [`crate::layout::MetadataSizes`] combines them into full stream totals.
//!
//! # References
//!
//! - [ECMA-335 II.24.2.1/II.24.2.2](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf) - Metadata root and stream headers

use bitflags::bitflags;

/// The MAGIC value opening the metadata root ("BSJB").
pub const CIL_HEADER_MAGIC: u32 = 0x424A_5342;

/// Name of the compressed table stream.
pub const TABLE_STREAM_NAME: &str = "#~";

/// Name of the uncompressed table stream used by minimal deltas.
pub const UNCOMPRESSED_TABLE_STREAM_NAME: &str = "#-";

/// Name of the string heap stream.
pub const STRING_HEAP_NAME: &str = "#Strings";

/// Name of the user-string heap stream.
pub const USER_STRING_HEAP_NAME: &str = "#US";

/// Name of the GUID heap stream.
pub const GUID_HEAP_NAME: &str = "#GUID";

/// Name of the blob heap stream.
pub const BLOB_HEAP_NAME: &str = "#Blob";

/// Name of the zero-length marker stream identifying a minimal edit-and-continue delta.
pub const MINIMAL_DELTA_MARKER_NAME: &str = "#JTD";

/// Name of the stream carrying the standalone debug metadata header.
pub const STANDALONE_DEBUG_STREAM_NAME: &str = "#Pdb";

/// Version string written into type-system metadata roots.
pub const METADATA_VERSION: &str = "v4.0.30319";

/// Version string written into standalone debug metadata roots.
pub const STANDALONE_DEBUG_VERSION: &str = "PDB v1.0";

/// Alignment of every stream within the metadata root.
pub const STREAM_ALIGNMENT: u32 = 4;

/// Aligns a value to the next multiple of the given alignment.
///
/// The alignment must be a power of 2 for correct behavior.
#[must_use]
pub fn align_to(value: u32, alignment: u32) -> u32 {
    (value + alignment - 1) & !(alignment - 1)
}

/// Aligns a value to the next 4-byte boundary, the alignment ECMA-335 II.24.2.2
/// requires of every metadata stream.
#[must_use]
pub fn align_to_4_bytes(value: u32) -> u32 {
    align_to(value, STREAM_ALIGNMENT)
}

/// Size of one stream directory entry: 8 bytes of offset/size plus the name with its
/// terminator, padded to a 4-byte multiple.
#[must_use]
pub fn stream_header_size(name: &str) -> u32 {
    8 + align_to_4_bytes(name.len() as u32 + 1)
}

/// Size of the padded version string field in the storage signature.
#[must_use]
pub fn padded_version_length(version: &str) -> u32 {
    align_to_4_bytes(version.len() as u32 + 1)
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// The `HeapSizes` byte of the table stream header.
    ///
    /// The three low bits widen the corresponding heap index fields from 2 to 4 bytes;
    /// the EnC bits mark a stream that carries edit-and-continue deltas.
    pub struct HeapSizeFlags: u8 {
        /// `#Strings` offsets are 4 bytes wide
        const STRING_LARGE = 0x01;
        /// `#GUID` offsets are 4 bytes wide
        const GUID_LARGE = 0x02;
        /// `#Blob` offsets are 4 bytes wide
        const BLOB_LARGE = 0x04;
        /// Stream contains only edit-and-continue deltas
        const ENC_DELTAS = 0x20;
        /// Deleted rows are marked rather than removed
        const DELETED_MARKS = 0x80;
    }
}

/// Final byte sizes of the four metadata heaps, an input to the sizing engine.
///
/// These are content sizes as built; the sizing engine aligns each to a 4-byte
/// boundary when computing stream totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapSizes {
    /// Byte size of the `#Strings` heap
    pub string: u32,
    /// Byte size of the `#US` heap
    pub user_string: u32,
    /// Byte size of the `#GUID` heap
    pub guid: u32,
    /// Byte size of the `#Blob` heap
    pub blob: u32,
}

impl HeapSizes {
    /// Create a heap size set from the four content sizes.
    #[must_use]
    pub fn new(string: u32, user_string: u32, guid: u32, blob: u32) -> Self {
        HeapSizes {
            string,
            user_string,
            guid,
            blob,
        }
    }
}
