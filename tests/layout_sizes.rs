//! Integration tests for the metadata layout sizing engine.
//!
//! These tests pin the exact arithmetic a reader of the emitted stream will re-derive:
//! index widths at the documented boundaries, full table-stream sums including header
//! overhead and alignment, and the stream directory overhead per emission mode.

use cilemit::layout::{
    streams, CodedIndexKind, EmissionFlags, HeapSizes, MetadataSizes, RowCounts, TableId,
    TABLE_ID_LIMIT,
};

fn rows(counts: &[(TableId, u32)]) -> RowCounts {
    let mut row_counts = [0u32; TABLE_ID_LIMIT];
    for &(table_id, count) in counts {
        row_counts[table_id as usize] = count;
    }
    row_counts
}

/// Three present tables with row counts {10, 70000, 5}: the 70000-row table crosses the
/// 2-byte boundary and must be referenced with 4 bytes everywhere, the others with 2;
/// the stream total must equal the exact sum-of-row-sizes formula plus header overhead,
/// 4-byte aligned.
#[test]
fn mixed_row_count_scenario() {
    let sizes = MetadataSizes::new(
        rows(&[
            (TableId::Field, 70_000),
            (TableId::FieldLayout, 10),
            (TableId::ModuleRef, 5),
        ]),
        HeapSizes::default(),
        EmissionFlags::default(),
    );

    assert_eq!(sizes.table_index_size(TableId::Field), 4);
    assert_eq!(sizes.table_index_size(TableId::FieldLayout), 2);
    assert_eq!(sizes.table_index_size(TableId::ModuleRef), 2);

    // every coded index with Field among its candidates goes wide too
    assert_eq!(sizes.coded_index_size(CodedIndexKind::HasFieldMarshal), 4);
    assert_eq!(sizes.coded_index_size(CodedIndexKind::HasConstant), 4);
    assert_eq!(sizes.coded_index_size(CodedIndexKind::MemberForwarded), 4);
    assert_eq!(sizes.coded_index_size(CodedIndexKind::TypeDefOrRef), 2);

    // Field row: 2 flags + 2 string + 2 blob
    assert_eq!(sizes.row_size(TableId::Field), 6);
    // FieldLayout row: 4 offset + 4 wide Field index
    assert_eq!(sizes.row_size(TableId::FieldLayout), 8);
    // ModuleRef row: 2 string
    assert_eq!(sizes.row_size(TableId::ModuleRef), 2);

    // header: 24 fixed + 3 * 4 row counts
    assert_eq!(sizes.table_stream_header_size(), 36);

    // 36 + 70000*6 + 10*8 + 5*2 + 1 terminator = 420127, aligned to 420128
    assert_eq!(sizes.table_stream_size(), 420_128);
}

#[test]
fn index_width_boundary_is_exact() {
    let at_boundary = MetadataSizes::new(
        rows(&[(TableId::MethodDef, 0xFFFF)]),
        HeapSizes::default(),
        EmissionFlags::default(),
    );
    assert_eq!(at_boundary.table_index_size(TableId::MethodDef), 2);

    let past_boundary = MetadataSizes::new(
        rows(&[(TableId::MethodDef, 0x1_0000)]),
        HeapSizes::default(),
        EmissionFlags::default(),
    );
    assert_eq!(past_boundary.table_index_size(TableId::MethodDef), 4);
}

#[test]
fn heap_width_boundary_is_exact() {
    let small = MetadataSizes::new(
        rows(&[]),
        HeapSizes::new(0xFFFF, 0, 0, 0xFFFF),
        EmissionFlags::default(),
    );
    assert_eq!(small.string_index_size(), 2);
    assert_eq!(small.blob_index_size(), 2);

    let large = MetadataSizes::new(
        rows(&[]),
        HeapSizes::new(0x1_0000, 0, 0, 0x1_0000),
        EmissionFlags::default(),
    );
    assert_eq!(large.string_index_size(), 4);
    assert_eq!(large.blob_index_size(), 4);
}

#[test]
fn minimal_delta_overrides_every_count() {
    let sizes = MetadataSizes::new(
        rows(&[(TableId::TypeDef, 2)]),
        HeapSizes::new(10, 10, 16, 10),
        EmissionFlags {
            is_minimal_delta: true,
            ..EmissionFlags::default()
        },
    );

    assert_eq!(sizes.string_index_size(), 4);
    assert_eq!(sizes.guid_index_size(), 4);
    assert_eq!(sizes.blob_index_size(), 4);
    assert_eq!(sizes.table_index_size(TableId::TypeDef), 4);
    assert_eq!(sizes.coded_index_size(CodedIndexKind::TypeDefOrRef), 4);

    // TypeDef row under uniform 4-byte widths: 4 flags + 4 + 4 names + 4 extends + 4 + 4 lists
    assert_eq!(sizes.row_size(TableId::TypeDef), 24);
}

#[test]
fn module_row_uses_guid_width() {
    let narrow = MetadataSizes::new(
        rows(&[(TableId::Module, 1)]),
        HeapSizes::default(),
        EmissionFlags::default(),
    );
    // 2 generation + 2 name + 3 * 2 guid indices
    assert_eq!(narrow.row_size(TableId::Module), 10);

    let wide = MetadataSizes::new(
        rows(&[(TableId::Module, 1)]),
        HeapSizes::new(0, 0, 0x1_0000, 0),
        EmissionFlags::default(),
    );
    // guid indices widen to 4 bytes each
    assert_eq!(wide.row_size(TableId::Module), 16);
}

#[test]
fn header_counts_present_streams_only() {
    // all four heaps populated: preamble 32 + #~ 12 + #Strings 20 + #US 12 + #GUID 16 + #Blob 16
    let full = MetadataSizes::new(
        rows(&[(TableId::Module, 1)]),
        HeapSizes::new(100, 8, 16, 40),
        EmissionFlags::default(),
    );
    assert_eq!(full.header_size(), 108);

    // empty heaps drop out of the directory
    let sparse = MetadataSizes::new(
        rows(&[(TableId::Module, 1)]),
        HeapSizes::new(100, 0, 0, 0),
        EmissionFlags::default(),
    );
    assert_eq!(sparse.header_size(), 32 + 12 + 20);
}

#[test]
fn minimal_delta_header_carries_marker_streams() {
    let sizes = MetadataSizes::new(
        rows(&[]),
        HeapSizes::default(),
        EmissionFlags {
            is_minimal_delta: true,
            ..EmissionFlags::default()
        },
    );

    // preamble 32 + #- 12 + #US 12 + #Blob 16 + #JTD 16; empty #US/#Blob still present
    assert_eq!(sizes.header_size(), 88);
}

#[test]
fn standalone_debug_stream_totals() {
    let sizes = MetadataSizes::new(
        rows(&[
            (TableId::MethodDef, 3),
            (TableId::TypeDef, 2),
            (TableId::Document, 4),
            (TableId::MethodDebugInformation, 3),
        ]),
        HeapSizes::new(0, 0, 64, 200),
        EmissionFlags {
            is_standalone_debug: true,
            ..EmissionFlags::default()
        },
    );

    // only debug tables serialize here
    assert_eq!(
        sizes.present_tables_mask(),
        TableId::Document.bit() | TableId::MethodDebugInformation.bit()
    );
    assert_eq!(
        sizes.external_tables_mask(),
        TableId::MethodDef.bit() | TableId::TypeDef.bit()
    );

    // 20 id + 4 entry point + 8 mask + 2 external row counts
    assert_eq!(sizes.standalone_debug_stream_size(), 40);

    // Document: 2 blob + 2 guid indices; MethodDebugInformation: Document index + blob
    assert_eq!(sizes.row_size(TableId::Document), 8);
    assert_eq!(sizes.row_size(TableId::MethodDebugInformation), 4);

    // header 24 + 2 * 4 counts, rows 4*8 + 3*4, terminator, aligned
    let expected_table_stream = streams::align_to_4_bytes(24 + 8 + 32 + 12 + 1);
    assert_eq!(sizes.table_stream_size(), expected_table_stream);

    // storage = tables + aligned guid + aligned blob + #Pdb stream
    assert_eq!(
        sizes.stream_storage_size(),
        expected_table_stream + 64 + 200 + 40
    );

    // directory: preamble 32 + #Pdb 16 + #~ 12 + #GUID 16 + #Blob 16
    assert_eq!(sizes.header_size(), 92);
    assert_eq!(sizes.total_size(), sizes.header_size() + sizes.stream_storage_size());
}

#[test]
fn storage_size_aligns_each_heap() {
    let sizes = MetadataSizes::new(
        rows(&[]),
        HeapSizes::new(10, 7, 16, 3),
        EmissionFlags::default(),
    );

    let aligned = sizes.aligned_heap_sizes();
    assert_eq!(aligned, HeapSizes::new(12, 8, 16, 4));

    let expected_heaps = 12 + 8 + 16 + 4;
    assert_eq!(
        sizes.stream_storage_size(),
        sizes.table_stream_size() + expected_heaps
    );
}
