//! Chunk storage and the pluggable allocation strategy behind [`crate::buffer::BlobBuilder`].
//!
//! A chunk is one fixed-capacity byte segment of a builder's chain. Chunks are never
//! exposed on their own; the builder owns a sequence of finished (frozen) chunks plus a
//! single live tail it appends into. Chunk storage comes from a [`ChunkAllocator`], an
//! injectable strategy that lets a surrounding system supply pooled buffers without this
//! crate knowing about pooling. The default strategy allocates fresh storage and drops
//! released storage for ordinary reclamation.

use std::fmt;

/// Default chunk capacity used when a builder is created without an explicit capacity.
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Smallest chunk capacity ever allocated.
///
/// Large enough for the widest atomic write, a 16-byte decimal or GUID, so every
/// fixed-width primitive always fits contiguously in a fresh chunk.
pub const MIN_CHUNK_SIZE: usize = 16;

/// One fixed-capacity byte segment of a builder's chain.
///
/// The backing storage never grows; `used` tracks how much of it holds content. A chunk
/// is mutable only while it is the builder's live tail; once a larger write forces a new
/// tail, or the chunk is spliced into another builder as non-tail content, its bytes in
/// `[0, used)` never change again.
pub(crate) struct Chunk {
    storage: Box<[u8]>,
    used: usize,
}

impl Chunk {
    pub(crate) fn new(storage: Box<[u8]>) -> Self {
        Chunk { storage, used: 0 }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub(crate) fn used(&self) -> usize {
        self.used
    }

    pub(crate) fn free(&self) -> usize {
        self.storage.len() - self.used
    }

    /// The written content, `[0, used)`.
    pub(crate) fn content(&self) -> &[u8] {
        &self.storage[..self.used]
    }

    /// Mutable view of already written content, for reservation patching.
    pub(crate) fn content_mut(&mut self) -> &mut [u8] {
        &mut self.storage[..self.used]
    }

    /// Claim `size` contiguous bytes at the tail. The caller must have checked `free()`.
    pub(crate) fn advance(&mut self, size: usize) -> &mut [u8] {
        let start = self.used;
        self.used += size;
        &mut self.storage[start..start + size]
    }

    /// The unwritten tail, `[used, capacity)`. Bytes written here become content only
    /// after a matching [`Chunk::commit`].
    pub(crate) fn free_space_mut(&mut self) -> &mut [u8] {
        &mut self.storage[self.used..]
    }

    /// Accept `size` bytes previously written into [`Chunk::free_space_mut`].
    pub(crate) fn commit(&mut self, size: usize) {
        self.used += size;
    }

    pub(crate) fn reset(&mut self) {
        self.used = 0;
    }

    pub(crate) fn into_storage(self) -> Box<[u8]> {
        self.storage
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("capacity", &self.capacity())
            .field("used", &self.used)
            .finish()
    }
}

/// Allocation strategy for chunk storage.
///
/// A builder requests storage of at least `min_size` bytes for every new chunk and hands
/// storage back through [`ChunkAllocator::release`] when content is discarded (`clear`)
/// or a zero-length donor is consumed by a splice. Implementations may recycle released
/// storage into later [`ChunkAllocator::allocate`] calls to avoid allocator churn across
/// many short-lived encodings; the default strategy performs no pooling.
///
/// # Thread Safety
///
/// Builders themselves are single-owner, but independent builders holding the same
/// strategy may live on different threads, so implementations must be `Send + Sync`.
pub trait ChunkAllocator: Send + Sync {
    /// Provide storage of at least `min_size` bytes.
    fn allocate(&self, min_size: usize) -> Box<[u8]>;

    /// Accept storage back from a builder. The default drops it.
    fn release(&self, storage: Box<[u8]>) {
        drop(storage);
    }
}

/// The default, non-pooling allocation strategy.
///
/// Allocates zeroed storage of exactly `max(min_size, MIN_CHUNK_SIZE)` bytes and drops
/// whatever is released.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultChunkAllocator;

impl ChunkAllocator for DefaultChunkAllocator {
    fn allocate(&self, min_size: usize) -> Box<[u8]> {
        vec![0u8; min_size.max(MIN_CHUNK_SIZE)].into_boxed_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_advance_tracks_used() {
        let mut chunk = Chunk::new(DefaultChunkAllocator.allocate(32));
        assert_eq!(chunk.capacity(), 32);
        assert_eq!(chunk.used(), 0);
        assert_eq!(chunk.free(), 32);

        chunk.advance(5).copy_from_slice(b"hello");
        assert_eq!(chunk.used(), 5);
        assert_eq!(chunk.free(), 27);
        assert_eq!(chunk.content(), b"hello");

        chunk.reset();
        assert_eq!(chunk.used(), 0);
    }

    #[test]
    fn default_allocator_honors_minimum() {
        let storage = DefaultChunkAllocator.allocate(4);
        assert_eq!(storage.len(), MIN_CHUNK_SIZE);

        let storage = DefaultChunkAllocator.allocate(100);
        assert_eq!(storage.len(), 100);
    }
}
