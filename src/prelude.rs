//! # cilemit Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the cilemit library. Import this module to get quick access to the essential
//! types for metadata emission.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all cilemit operations
pub use crate::Error;

/// The result type used throughout cilemit
pub use crate::Result;

// ================================================================================================
// Buffer Building
// ================================================================================================

/// The chunked byte-buffer builder and its deferred patch windows
pub use crate::buffer::{BlobBuilder, Reservation};

/// The injectable chunk allocation strategy
pub use crate::buffer::{ChunkAllocator, DefaultChunkAllocator};

// ================================================================================================
// Primitive Encoding
// ================================================================================================

/// Constant value layouts written into blobs
pub use crate::encode::{DateTime, Decimal};

/// Compressed integer encoding entry points
pub use crate::encode::{compress_signed, compress_unsigned, compressed_uint_size};

// ================================================================================================
// Layout Sizing
// ================================================================================================

/// The sizing engine and its inputs
pub use crate::layout::{EmissionFlags, HeapSizes, MetadataSizes, RowCounts};

/// Table and coded-index identities
pub use crate::layout::{CodedIndexKind, TableId, TABLE_ID_LIMIT};
