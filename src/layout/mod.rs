//! Table identities, coded indexes, and the metadata layout sizing engine.
//!
//! Everything in this module exists to answer one question precisely: given final row
//! counts for every metadata table and final byte sizes for every heap, how wide is each
//! reference field and how large is each stream? The table stream cannot be serialized
//! until those widths are fixed, and they cannot be fixed until all content is known, so
//! the sizing computation runs exactly once per emission, after the builders for every
//! region have been filled.
//!
//! # Key Components
//!
//! - [`TableId`] / [`RowCounts`] - Table identities and the dense row-count input
//! - [`CodedIndexKind`] - Multi-table reference kinds and their tag arithmetic
//! - [`HeapSizes`] / [`HeapSizeFlags`] - Heap inputs and the header flag byte
//! - [`MetadataSizes`] / [`EmissionFlags`] - The sizing engine and its mode switches
//! - Stream name constants and the header overhead formulas in [`streams`]
//!
//! # Integration
//!
//! The widths computed here tell the table serialization logic, per column, how many
//! bytes to reserve in its [`crate::buffer::BlobBuilder`]; the aggregate sizes place
//! each stream within the metadata root.

mod codedindex;
mod sizes;
pub mod streams;
mod tableid;

pub use codedindex::CodedIndexKind;
pub use sizes::{EmissionFlags, MetadataSizes, SORTED_TABLES};
pub use streams::{HeapSizeFlags, HeapSizes};
pub use tableid::{RowCounts, TableId, TABLE_ID_LIMIT};
