//! Chunked byte-buffer building for metadata emission.
//!
//! This module provides the append-optimized buffer machinery every stream and blob writer
//! in the crate is built on. Content accumulates into fixed-capacity chunks so that growth
//! never copies what was already written, independently built buffers can be grafted into
//! one another in O(1), and fixed-width fields whose values are discovered late (lengths,
//! row counts, fixups) can be reserved up front and patched once known.
//!
//! # Key Components
//!
//! - [`BlobBuilder`] - The chunk chain with the full write, splice, and flatten API
//! - [`Reservation`] - A deferred fixed-length patch window
//! - [`Chunks`] - Enumeration of chunk views in logical order
//! - [`ChunkAllocator`] / [`DefaultChunkAllocator`] - The injectable allocation strategy
//!
//! # Integration
//!
//! Builders produce the raw bytes whose final positions and reference widths are decided
//! by [`crate::layout`]; the usual flow is one builder per logical region (IL stream,
//! string heap, table stream) plus many short-lived builders for per-method and
//! per-attribute blobs, spliced or copied into the region builders as they finish.

mod builder;
mod chunk;

pub use builder::{BlobBuilder, Chunks, Reservation};
pub use chunk::{ChunkAllocator, DefaultChunkAllocator, DEFAULT_CHUNK_SIZE, MIN_CHUNK_SIZE};
