//! The metadata layout sizing engine.
//!
//! [`MetadataSizes`] answers the chicken-and-egg question of metadata emission: the byte
//! width of every cross-reference (table row indices, heap offsets, coded indexes) depends
//! on final row and heap counts, yet those widths must be fixed before any dependent row
//! can be serialized. Once all content is known, the writer feeds the final counts in and
//! reads every width and aggregate size back out; the computation is a pure function of
//! its inputs, so recomputing from the same counts always yields the same layout.
//!
//! # Key Components
//!
//! - [`MetadataSizes`] - Widths, row sizes, bitmasks, and stream totals for one emission
//! - [`EmissionFlags`] - The three emission modes (full, minimal delta, standalone debug)
//! - [`SORTED_TABLES`] - The fixed set of tables the format requires to be sorted
//!
//! # Usage Examples
//!
//! ```rust
//! use cilemit::layout::{EmissionFlags, HeapSizes, MetadataSizes, TableId, TABLE_ID_LIMIT};
//!
//! let mut rows = [0u32; TABLE_ID_LIMIT];
//! rows[TableId::Module as usize] = 1;
//! rows[TableId::TypeDef as usize] = 80_000;
//!
//! let sizes = MetadataSizes::new(rows, HeapSizes::default(), EmissionFlags::default());
//! assert_eq!(sizes.table_index_size(TableId::TypeDef), 4);
//! assert_eq!(sizes.table_index_size(TableId::Module), 2);
//! ```
//!
//! # Emission Modes
//!
//! - **Full metadata**: the compressed `#~` stream; every width is chosen minimally.
//! - **Minimal delta**: an edit-and-continue increment; the stream is uncompressed (`#-`)
//!   and every width is forced to 4 bytes for positional stability across generations.
//! - **Standalone debug metadata**: a Portable-PDB-style stream holding only the debug
//!   tables; the remaining present tables are recorded as external references whose row
//!   counts readers must obtain from the companion type-system stream.

use strum::{EnumCount, IntoEnumIterator};

use crate::layout::{
    codedindex::CodedIndexKind,
    streams::{
        align_to_4_bytes, padded_version_length, stream_header_size, HeapSizeFlags, HeapSizes,
        BLOB_HEAP_NAME, GUID_HEAP_NAME, METADATA_VERSION, MINIMAL_DELTA_MARKER_NAME,
        STANDALONE_DEBUG_STREAM_NAME, STANDALONE_DEBUG_VERSION, STRING_HEAP_NAME,
        TABLE_STREAM_NAME, UNCOMPRESSED_TABLE_STREAM_NAME, USER_STRING_HEAP_NAME,
    },
    tableid::{RowCounts, TableId},
};

/// Tables the format requires to be emitted in sorted order, as a `Sorted` bitmask.
///
/// Covers the type-system tables sorted by their parent/owner column (`InterfaceImpl`,
/// `Constant`, `CustomAttribute`, `FieldMarshal`, `DeclSecurity`, `ClassLayout`,
/// `FieldLayout`, `MethodSemantics`, `MethodImpl`, `ImplMap`, `FieldRVA`, `NestedClass`,
/// `GenericParam`, `GenericParamConstraint`) plus the sorted debug tables (`LocalScope`,
/// `StateMachineMethod`, `CustomDebugInformation`).
pub const SORTED_TABLES: u64 = 0x00C4_1600_3301_FA00;

/// Mask of the Portable PDB debug tables (0x30-0x37).
const DEBUG_TABLES: u64 = 0xFF00_0000_0000_0000;

/// Fixed part of the table stream header: 4 reserved bytes, major/minor version,
/// heap-size flags, row-id width, and the two 8-byte valid/sorted bitmasks.
const TABLE_STREAM_HEADER_FIXED: u32 = 4 + 1 + 1 + 1 + 1 + 8 + 8;

/// Fixed part of the `#Pdb` stream: 20-byte id, 4-byte entry point, 8-byte
/// referenced-table mask.
const STANDALONE_DEBUG_HEADER_FIXED: u32 = 20 + 4 + 8;

/// Storage signature preamble: magic, major/minor version, reserved word, and the
/// version string length field. The padded version string itself follows.
const STORAGE_SIGNATURE_FIXED: u32 = 4 + 2 + 2 + 4 + 4;

/// The emission-mode flags steering a layout computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmissionFlags {
    /// The stream is a minimal edit-and-continue delta: uncompressed table stream,
    /// every index width forced to 4 bytes.
    pub is_minimal_delta: bool,

    /// Debug tables will be emitted into a separate standalone stream; this
    /// (type-system) computation must therefore see zero rows for them.
    pub emit_standalone_debug: bool,

    /// This computation is itself for the standalone debug stream: only debug tables
    /// serialize here, everything else present is recorded as external.
    pub is_standalone_debug: bool,
}

/// Computed index widths, row sizes, and stream totals for one metadata emission.
///
/// Construct with [`MetadataSizes::new`] after all row counts and heap sizes are final.
/// All accessors are pure reads of the precomputed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataSizes {
    row_counts: RowCounts,
    heap_sizes: HeapSizes,
    flags: EmissionFlags,

    present_tables: u64,
    external_tables: u64,
    string_large: bool,
    guid_large: bool,
    blob_large: bool,
    coded_index_large: [bool; CodedIndexKind::COUNT],

    table_stream_size: u32,
    stream_storage_size: u32,
    header_size: u32,
}

impl MetadataSizes {
    /// Compute the full layout from final row counts, heap sizes, and mode flags.
    ///
    /// # Panics
    ///
    /// Panics if a reserved or obsolete table slot carries rows, or if debug tables
    /// carry rows in a type-system computation that delegates them to a standalone
    /// debug stream. Both indicate a programmer error in the upstream table
    /// population logic, not a recoverable condition.
    #[must_use]
    pub fn new(row_counts: RowCounts, heap_sizes: HeapSizes, flags: EmissionFlags) -> Self {
        for table_id in TableId::iter() {
            let rows = row_counts[table_id as usize];
            if table_id.is_reserved() {
                assert!(
                    rows == 0,
                    "reserved table {table_id:?} must not have rows, found {rows}"
                );
            }
            if flags.emit_standalone_debug && !flags.is_standalone_debug && table_id.is_debug() {
                assert!(
                    rows == 0,
                    "debug table {table_id:?} belongs to the standalone debug stream, found {rows} rows"
                );
            }
        }

        let mut present = 0u64;
        for table_id in TableId::iter() {
            if row_counts[table_id as usize] > 0 {
                present |= table_id.bit();
            }
        }

        let (present_tables, external_tables) = if flags.is_standalone_debug {
            (present & DEBUG_TABLES, present & !DEBUG_TABLES)
        } else {
            (present, 0)
        };

        let mut sizes = MetadataSizes {
            row_counts,
            heap_sizes,
            flags,
            present_tables,
            external_tables,
            string_large: flags.is_minimal_delta || heap_sizes.string > 0xFFFF,
            guid_large: flags.is_minimal_delta || heap_sizes.guid > 0xFFFF,
            blob_large: flags.is_minimal_delta || heap_sizes.blob > 0xFFFF,
            coded_index_large: [false; CodedIndexKind::COUNT],
            table_stream_size: 0,
            stream_storage_size: 0,
            header_size: 0,
        };

        for kind in CodedIndexKind::iter() {
            sizes.coded_index_large[kind as usize] = sizes.compute_coded_index_large(kind);
        }

        let mut table_stream = sizes.table_stream_header_size();
        for table_id in TableId::iter() {
            if sizes.present_tables & table_id.bit() != 0 {
                table_stream += sizes.row_counts[table_id as usize] * sizes.row_size(table_id);
            }
        }
        // one trailing terminator byte, then stream alignment
        sizes.table_stream_size = align_to_4_bytes(table_stream + 1);

        sizes.stream_storage_size = sizes.table_stream_size
            + align_to_4_bytes(heap_sizes.string)
            + align_to_4_bytes(heap_sizes.user_string)
            + align_to_4_bytes(heap_sizes.guid)
            + align_to_4_bytes(heap_sizes.blob)
            + sizes.standalone_debug_stream_size();

        sizes.header_size = sizes.compute_header_size();
        sizes
    }

    /// True if this layout is for a minimal edit-and-continue delta.
    #[must_use]
    pub fn is_minimal_delta(&self) -> bool {
        self.flags.is_minimal_delta
    }

    /// True if this layout is for a standalone debug metadata stream.
    #[must_use]
    pub fn is_standalone_debug(&self) -> bool {
        self.flags.is_standalone_debug
    }

    /// The row count supplied for a table.
    ///
    /// In a standalone debug computation this includes the external type-system tables;
    /// their counts size the references even though the rows live elsewhere.
    #[must_use]
    pub fn row_count(&self, table: TableId) -> u32 {
        self.row_counts[table as usize]
    }

    /// True if the table serializes rows into this stream.
    #[must_use]
    pub fn is_present(&self, table: TableId) -> bool {
        self.present_tables & table.bit() != 0
    }

    /// The `Valid` bitmask: every table whose rows this stream stores.
    #[must_use]
    pub fn present_tables_mask(&self) -> u64 {
        self.present_tables
    }

    /// Tables that are present overall but stored in the companion type-system stream;
    /// nonzero only for standalone debug metadata.
    #[must_use]
    pub fn external_tables_mask(&self) -> u64 {
        self.external_tables
    }

    /// The `Sorted` bitmask: the fixed sorted-table set restricted to present tables.
    #[must_use]
    pub fn sorted_tables_mask(&self) -> u64 {
        SORTED_TABLES & self.present_tables
    }

    /// Byte width of `#Strings` heap offsets (2 or 4).
    #[must_use]
    pub fn string_index_size(&self) -> u32 {
        if self.string_large {
            4
        } else {
            2
        }
    }

    /// Byte width of `#GUID` heap indices (2 or 4).
    #[must_use]
    pub fn guid_index_size(&self) -> u32 {
        if self.guid_large {
            4
        } else {
            2
        }
    }

    /// Byte width of `#Blob` heap offsets (2 or 4).
    #[must_use]
    pub fn blob_index_size(&self) -> u32 {
        if self.blob_large {
            4
        } else {
            2
        }
    }

    /// Byte width of a simple index into `table` (2 or 4).
    ///
    /// 4 bytes when the table stream is uncompressed (minimal delta) or the target's
    /// row count exceeds `0xFFFF`.
    #[must_use]
    pub fn table_index_size(&self, table: TableId) -> u32 {
        if self.flags.is_minimal_delta || self.row_count(table) > 0xFFFF {
            4
        } else {
            2
        }
    }

    /// Byte width of a coded index of the given kind (2 or 4).
    #[must_use]
    pub fn coded_index_size(&self, kind: CodedIndexKind) -> u32 {
        if self.coded_index_large[kind as usize] {
            4
        } else {
            2
        }
    }

    /// A coded index needs 4 bytes unless the stream is compressed and every candidate
    /// table's row count fits in the bits left after the tag.
    fn compute_coded_index_large(&self, kind: CodedIndexKind) -> bool {
        if self.flags.is_minimal_delta {
            return true;
        }
        let row_limit = 1u32 << (16 - kind.tag_bits());
        kind.tables()
            .iter()
            .any(|&table| self.row_count(table) >= row_limit)
    }

    /// The `HeapSizes` flag byte of the table stream header.
    #[must_use]
    pub fn heap_size_flags(&self) -> HeapSizeFlags {
        let mut flags = HeapSizeFlags::empty();
        if self.string_large {
            flags |= HeapSizeFlags::STRING_LARGE;
        }
        if self.guid_large {
            flags |= HeapSizeFlags::GUID_LARGE;
        }
        if self.blob_large {
            flags |= HeapSizeFlags::BLOB_LARGE;
        }
        if self.flags.is_minimal_delta {
            flags |= HeapSizeFlags::ENC_DELTAS | HeapSizeFlags::DELETED_MARKS;
        }
        flags
    }

    /// Byte size of one row of `table` under the computed widths.
    #[must_use]
    pub fn row_size(&self, table: TableId) -> u32 {
        let string = self.string_index_size();
        let guid = self.guid_index_size();
        let blob = self.blob_index_size();

        match table {
            TableId::Module => 2 + string + 3 * guid,
            TableId::TypeRef => self.coded_index_size(CodedIndexKind::ResolutionScope) + 2 * string,
            TableId::TypeDef => {
                4 + 2 * string
                    + self.coded_index_size(CodedIndexKind::TypeDefOrRef)
                    + self.table_index_size(TableId::Field)
                    + self.table_index_size(TableId::MethodDef)
            }
            TableId::FieldPtr => self.table_index_size(TableId::Field),
            TableId::Field => 2 + string + blob,
            TableId::MethodPtr => self.table_index_size(TableId::MethodDef),
            TableId::MethodDef => 4 + 2 + 2 + string + blob + self.table_index_size(TableId::Param),
            TableId::ParamPtr => self.table_index_size(TableId::Param),
            TableId::Param => 2 + 2 + string,
            TableId::InterfaceImpl => {
                self.table_index_size(TableId::TypeDef)
                    + self.coded_index_size(CodedIndexKind::TypeDefOrRef)
            }
            TableId::MemberRef => {
                self.coded_index_size(CodedIndexKind::MemberRefParent) + string + blob
            }
            TableId::Constant => 1 + 1 + self.coded_index_size(CodedIndexKind::HasConstant) + blob,
            TableId::CustomAttribute => {
                self.coded_index_size(CodedIndexKind::HasCustomAttribute)
                    + self.coded_index_size(CodedIndexKind::CustomAttributeType)
                    + blob
            }
            TableId::FieldMarshal => {
                self.coded_index_size(CodedIndexKind::HasFieldMarshal) + blob
            }
            TableId::DeclSecurity => {
                2 + self.coded_index_size(CodedIndexKind::HasDeclSecurity) + blob
            }
            TableId::ClassLayout => 2 + 4 + self.table_index_size(TableId::TypeDef),
            TableId::FieldLayout => 4 + self.table_index_size(TableId::Field),
            TableId::StandAloneSig => blob,
            TableId::EventMap => {
                self.table_index_size(TableId::TypeDef) + self.table_index_size(TableId::Event)
            }
            TableId::EventPtr => self.table_index_size(TableId::Event),
            TableId::Event => 2 + string + self.coded_index_size(CodedIndexKind::TypeDefOrRef),
            TableId::PropertyMap => {
                self.table_index_size(TableId::TypeDef) + self.table_index_size(TableId::Property)
            }
            TableId::PropertyPtr => self.table_index_size(TableId::Property),
            TableId::Property => 2 + string + blob,
            TableId::MethodSemantics => {
                2 + self.table_index_size(TableId::MethodDef)
                    + self.coded_index_size(CodedIndexKind::HasSemantics)
            }
            TableId::MethodImpl => {
                self.table_index_size(TableId::TypeDef)
                    + 2 * self.coded_index_size(CodedIndexKind::MethodDefOrRef)
            }
            TableId::ModuleRef => string,
            TableId::TypeSpec => blob,
            TableId::ImplMap => {
                2 + self.coded_index_size(CodedIndexKind::MemberForwarded)
                    + string
                    + self.table_index_size(TableId::ModuleRef)
            }
            TableId::FieldRVA => 4 + self.table_index_size(TableId::Field),
            TableId::EncLog => 4 + 4,
            TableId::EncMap => 4,
            TableId::Assembly => 4 + 8 + 4 + blob + 2 * string,
            TableId::AssemblyProcessor => 4,
            TableId::AssemblyOS => 12,
            TableId::AssemblyRef => 8 + 4 + 2 * blob + 2 * string,
            TableId::AssemblyRefProcessor => 4 + self.table_index_size(TableId::AssemblyRef),
            TableId::AssemblyRefOS => 12 + self.table_index_size(TableId::AssemblyRef),
            TableId::File => 4 + string + blob,
            TableId::ExportedType => {
                4 + 4 + 2 * string + self.coded_index_size(CodedIndexKind::Implementation)
            }
            TableId::ManifestResource => {
                4 + 4 + string + self.coded_index_size(CodedIndexKind::Implementation)
            }
            TableId::NestedClass => 2 * self.table_index_size(TableId::TypeDef),
            TableId::GenericParam => {
                2 + 2 + self.coded_index_size(CodedIndexKind::TypeOrMethodDef) + string
            }
            TableId::MethodSpec => self.coded_index_size(CodedIndexKind::MethodDefOrRef) + blob,
            TableId::GenericParamConstraint => {
                self.table_index_size(TableId::GenericParam)
                    + self.coded_index_size(CodedIndexKind::TypeDefOrRef)
            }
            TableId::Document => 2 * blob + 2 * guid,
            TableId::MethodDebugInformation => self.table_index_size(TableId::Document) + blob,
            TableId::LocalScope => {
                self.table_index_size(TableId::MethodDef)
                    + self.table_index_size(TableId::ImportScope)
                    + self.table_index_size(TableId::LocalVariable)
                    + self.table_index_size(TableId::LocalConstant)
                    + 4
                    + 4
            }
            TableId::LocalVariable => 2 + 2 + string,
            TableId::LocalConstant => string + blob,
            TableId::ImportScope => self.table_index_size(TableId::ImportScope) + blob,
            TableId::StateMachineMethod => 2 * self.table_index_size(TableId::MethodDef),
            TableId::CustomDebugInformation => {
                self.coded_index_size(CodedIndexKind::HasCustomDebugInformation) + guid + blob
            }
        }
    }

    /// Size of the table stream header: the fixed fields plus one 4-byte row count per
    /// present table.
    #[must_use]
    pub fn table_stream_header_size(&self) -> u32 {
        TABLE_STREAM_HEADER_FIXED + 4 * self.present_tables.count_ones()
    }

    /// Total size of the table stream: header, rows, terminator byte, 4-byte aligned.
    #[must_use]
    pub fn table_stream_size(&self) -> u32 {
        self.table_stream_size
    }

    /// The heap sizes this layout was computed from.
    #[must_use]
    pub fn heap_sizes(&self) -> &HeapSizes {
        &self.heap_sizes
    }

    /// The four heap sizes rounded up to the 4-byte stream alignment, as they occupy
    /// the metadata root.
    #[must_use]
    pub fn aligned_heap_sizes(&self) -> HeapSizes {
        HeapSizes {
            string: align_to_4_bytes(self.heap_sizes.string),
            user_string: align_to_4_bytes(self.heap_sizes.user_string),
            guid: align_to_4_bytes(self.heap_sizes.guid),
            blob: align_to_4_bytes(self.heap_sizes.blob),
        }
    }

    /// Size of the `#Pdb` stream: id, entry point, referenced-table mask, and one
    /// 4-byte row count per externally referenced present table. Zero outside
    /// standalone debug mode.
    #[must_use]
    pub fn standalone_debug_stream_size(&self) -> u32 {
        if self.flags.is_standalone_debug {
            STANDALONE_DEBUG_HEADER_FIXED + 4 * self.external_tables.count_ones()
        } else {
            0
        }
    }

    /// Combined size of all streams: table stream, the four aligned heaps, and the
    /// `#Pdb` stream when one is emitted.
    #[must_use]
    pub fn stream_storage_size(&self) -> u32 {
        self.stream_storage_size
    }

    /// Size of the metadata root header: storage signature, padded version string,
    /// flags, stream count, and one directory entry per present stream.
    #[must_use]
    pub fn header_size(&self) -> u32 {
        self.header_size
    }

    /// Total size of the metadata root: header plus stream storage.
    #[must_use]
    pub fn total_size(&self) -> u32 {
        self.header_size + self.stream_storage_size
    }

    /// The version string belonging in this stream's storage signature.
    #[must_use]
    pub fn version(&self) -> &'static str {
        if self.flags.is_standalone_debug {
            STANDALONE_DEBUG_VERSION
        } else {
            METADATA_VERSION
        }
    }

    fn compute_header_size(&self) -> u32 {
        let mut size = STORAGE_SIGNATURE_FIXED + padded_version_length(self.version());
        // flags + stream count
        size += 2 + 2;

        if self.flags.is_standalone_debug {
            size += stream_header_size(STANDALONE_DEBUG_STREAM_NAME);
        }

        size += stream_header_size(if self.flags.is_minimal_delta {
            UNCOMPRESSED_TABLE_STREAM_NAME
        } else {
            TABLE_STREAM_NAME
        });

        if self.heap_sizes.string > 0 {
            size += stream_header_size(STRING_HEAP_NAME);
        }
        // deltas carry #US and #Blob even when empty so cross-generation tokens resolve
        if self.heap_sizes.user_string > 0 || self.flags.is_minimal_delta {
            size += stream_header_size(USER_STRING_HEAP_NAME);
        }
        if self.heap_sizes.guid > 0 {
            size += stream_header_size(GUID_HEAP_NAME);
        }
        if self.heap_sizes.blob > 0 || self.flags.is_minimal_delta {
            size += stream_header_size(BLOB_HEAP_NAME);
        }
        if self.flags.is_minimal_delta {
            size += stream_header_size(MINIMAL_DELTA_MARKER_NAME);
        }

        size
    }
}
