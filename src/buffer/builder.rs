//! The append-optimized chunked blob builder.
//!
//! [`BlobBuilder`] accumulates bytes into a chain of fixed-capacity chunks: zero or more
//! finished (frozen) chunks followed by exactly one live tail that all writes append into.
//! Growing never reallocates or copies previously written content, and two builders can be
//! merged structurally in O(1) with [`BlobBuilder::link_prefix`] /
//! [`BlobBuilder::link_suffix`], which transfer chunk ownership instead of copying bytes.
//! This is what lets thousands of independently built sub-blobs (one per method body, one
//! per custom-attribute record) be assembled into a single logical stream cheaply.
//!
//! # Key Components
//!
//! - [`BlobBuilder`] - The chunk chain and the full write/splice/flatten API
//! - [`Reservation`] - A fixed-length window reserved for later patching
//! - [`Chunks`] - Lazy, restartable enumeration of chunk views in logical order
//!
//! # Usage Examples
//!
//! ```rust
//! use cilemit::buffer::BlobBuilder;
//!
//! let mut body = BlobBuilder::new();
//! let length = body.reserve_bytes(4);
//! body.write_bytes(b"payload");
//! body.patch_u32(&length, 7)?;
//!
//! let mut stream = BlobBuilder::new();
//! stream.write_u16(0x1234);
//! stream.link_suffix(body);
//!
//! assert_eq!(stream.len(), 2 + 4 + 7);
//! # Ok::<(), cilemit::Error>(())
//! ```
//!
//! # Ownership Rules
//!
//! A splice consumes the donor builder by value; the type system prevents any further
//! write through it, which is the loudest possible form of the "donor must not be used
//! again" rule. A zero-length donor contributes nothing and its storage goes back to the
//! allocation strategy. [`Reservation`]s are bound to one builder and one content epoch:
//! patching after a `link_prefix` or `clear` moved the bytes underneath fails with
//! [`crate::Error::StaleReservation`] instead of corrupting unrelated content.
//!
//! # Thread Safety
//!
//! A builder has a single owner and is not synchronized. Independent builders may be
//! filled on independent threads and spliced together afterwards on one thread.

use std::{
    io::{Read, Write},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use uguid::Guid;
use widestring::U16String;

use crate::{
    buffer::chunk::{Chunk, ChunkAllocator, DefaultChunkAllocator, DEFAULT_CHUNK_SIZE},
    encode::{self, DateTime, Decimal},
    Error, Result,
};

/// Source of unique builder identities for reservation validation.
static NEXT_BUILDER_ID: AtomicU64 = AtomicU64::new(1);

/// A fixed-length writable window obtained from [`BlobBuilder::reserve_bytes`].
///
/// Records where the reserved bytes live so they can be patched once their value is known,
/// the standard two-pass pattern for length fields discovered only after their payload has
/// been written. A reservation is only valid on the builder that produced it, and only
/// while that builder's content has not been shifted by [`BlobBuilder::link_prefix`] or
/// discarded by [`BlobBuilder::clear`].
#[derive(Debug, Clone)]
#[must_use]
pub struct Reservation {
    builder: u64,
    epoch: u32,
    start: usize,
    len: usize,
}

impl Reservation {
    /// Absolute offset of the reserved window within the builder content.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Length of the reserved window in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-length reservation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// An append-optimized byte-buffer builder backed by a chain of chunks.
///
/// See the [module documentation](self) for the design overview. All write operations
/// append at the logical end; previously written bytes only ever change through a
/// [`Reservation`] patch.
pub struct BlobBuilder {
    frozen: Vec<Chunk>,
    current: Chunk,
    /// Sum of `used` over all frozen chunks, cached so `len()` never re-sums the chain.
    prefix_length: usize,
    chunk_capacity: usize,
    id: u64,
    epoch: u32,
    allocator: Arc<dyn ChunkAllocator>,
}

impl BlobBuilder {
    /// Create a builder with the default chunk capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHUNK_SIZE)
    }

    /// Create a builder whose chunks hold at least `capacity` bytes each.
    ///
    /// The capacity is clamped below by the minimum chunk size; a single oversized write
    /// still gets a chunk large enough to hold it contiguously.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_allocator(capacity, Arc::new(DefaultChunkAllocator))
    }

    /// Create a builder drawing chunk storage from the given allocation strategy.
    #[must_use]
    pub fn with_allocator(capacity: usize, allocator: Arc<dyn ChunkAllocator>) -> Self {
        let storage = allocator.allocate(capacity);
        BlobBuilder {
            frozen: Vec::new(),
            current: Chunk::new(storage),
            prefix_length: 0,
            chunk_capacity: capacity,
            id: NEXT_BUILDER_ID.fetch_add(1, Ordering::Relaxed),
            epoch: 0,
            allocator,
        }
    }

    /// Total number of content bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prefix_length + self.current.used()
    }

    /// True if no content has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freeze the live chunk and install a fresh one of at least `min_size` bytes.
    ///
    /// An empty live chunk is returned to the allocator instead of entering the frozen
    /// chain; frozen chunks always carry content.
    fn grow(&mut self, min_size: usize) {
        let request = min_size.max(self.chunk_capacity);
        let storage = self.allocator.allocate(request);
        let old = std::mem::replace(&mut self.current, Chunk::new(storage));
        if old.used() > 0 {
            self.prefix_length += old.used();
            self.frozen.push(old);
        } else {
            self.allocator.release(old.into_storage());
        }
    }

    /// Claim `size` contiguous bytes at the tail, growing the chain if needed.
    fn reserve_span(&mut self, size: usize) -> &mut [u8] {
        if self.current.free() < size {
            self.grow(size);
        }
        self.current.advance(size)
    }

    /// Append a byte slice, splitting across chunk boundaries as needed.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let mut remaining = bytes;
        loop {
            let free = self.current.free();
            if remaining.len() <= free {
                if !remaining.is_empty() {
                    self.current.advance(remaining.len()).copy_from_slice(remaining);
                }
                return;
            }
            if free > 0 {
                let (head, tail) = remaining.split_at(free);
                self.current.advance(free).copy_from_slice(head);
                remaining = tail;
            }
            self.grow(remaining.len());
        }
    }

    /// Append `count` copies of `value`.
    pub fn write_bytes_repeated(&mut self, value: u8, count: usize) {
        let mut remaining = count;
        while remaining > 0 {
            if self.current.free() == 0 {
                self.grow(remaining.min(self.chunk_capacity));
            }
            let take = remaining.min(self.current.free());
            self.current.advance(take).fill(value);
            remaining -= take;
        }
    }

    /// Copy up to `count` bytes from an external byte source directly into chunk storage.
    ///
    /// Returns the number of bytes actually transferred. A source that runs dry before
    /// `count` produces a short, inspectable `Ok`; partial transfer is a legitimate
    /// result, not an error, and no retry happens here.
    ///
    /// # Errors
    /// Returns [`crate::Error::IoError`] if the source itself fails.
    pub fn write_stream(&mut self, source: &mut impl Read, count: usize) -> Result<usize> {
        let mut transferred = 0;
        while transferred < count {
            if self.current.free() == 0 {
                self.grow((count - transferred).min(self.chunk_capacity));
            }
            let want = (count - transferred).min(self.current.free());
            let read = source.read(&mut self.current.free_space_mut()[..want])?;
            if read == 0 {
                break;
            }
            self.current.commit(read);
            transferred += read;
        }
        Ok(transferred)
    }

    /// Append a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.reserve_span(1)[0] = value;
    }

    /// Append a signed byte.
    pub fn write_i8(&mut self, value: i8) {
        self.write_u8(value as u8);
    }

    /// Append a little-endian `u16`.
    pub fn write_u16(&mut self, value: u16) {
        self.reserve_span(2).copy_from_slice(&value.to_le_bytes());
    }

    /// Append a little-endian `i16`.
    pub fn write_i16(&mut self, value: i16) {
        self.reserve_span(2).copy_from_slice(&value.to_le_bytes());
    }

    /// Append a big-endian `u16`, for the few externally mandated big-endian fields.
    pub fn write_u16_be(&mut self, value: u16) {
        self.reserve_span(2).copy_from_slice(&value.to_be_bytes());
    }

    /// Append a little-endian `u32`.
    pub fn write_u32(&mut self, value: u32) {
        self.reserve_span(4).copy_from_slice(&value.to_le_bytes());
    }

    /// Append a little-endian `i32`.
    pub fn write_i32(&mut self, value: i32) {
        self.reserve_span(4).copy_from_slice(&value.to_le_bytes());
    }

    /// Append a big-endian `u32`, for the few externally mandated big-endian fields.
    pub fn write_u32_be(&mut self, value: u32) {
        self.reserve_span(4).copy_from_slice(&value.to_be_bytes());
    }

    /// Append a little-endian `u64`.
    pub fn write_u64(&mut self, value: u64) {
        self.reserve_span(8).copy_from_slice(&value.to_le_bytes());
    }

    /// Append a little-endian `i64`.
    pub fn write_i64(&mut self, value: i64) {
        self.reserve_span(8).copy_from_slice(&value.to_le_bytes());
    }

    /// Append a little-endian IEEE 754 single.
    pub fn write_f32(&mut self, value: f32) {
        self.reserve_span(4).copy_from_slice(&value.to_le_bytes());
    }

    /// Append a little-endian IEEE 754 double.
    pub fn write_f64(&mut self, value: f64) {
        self.reserve_span(8).copy_from_slice(&value.to_le_bytes());
    }

    /// Append a 16-byte decimal constant.
    pub fn write_decimal(&mut self, value: Decimal) {
        self.reserve_span(16).copy_from_slice(&value.to_le_bytes());
    }

    /// Append an 8-byte date-time constant (tick count).
    pub fn write_date_time(&mut self, value: DateTime) {
        self.reserve_span(8).copy_from_slice(&value.to_le_bytes());
    }

    /// Append a 16-byte GUID.
    pub fn write_guid(&mut self, value: Guid) {
        self.reserve_span(16).copy_from_slice(&value.to_bytes());
    }

    /// Append an ECMA-335 compressed unsigned integer.
    ///
    /// # Errors
    /// Returns [`crate::Error::CompressedUnsignedOutOfRange`] for values the format
    /// cannot express; nothing is written in that case.
    pub fn write_compressed_uint(&mut self, value: u32) -> Result<()> {
        let encoded = encode::compress_unsigned(value)?;
        self.write_bytes(encoded.as_slice());
        Ok(())
    }

    /// Append an ECMA-335 compressed signed integer.
    ///
    /// # Errors
    /// Returns [`crate::Error::CompressedSignedOutOfRange`] for values the format
    /// cannot express; nothing is written in that case.
    pub fn write_compressed_int(&mut self, value: i32) -> Result<()> {
        let encoded = encode::compress_signed(value)?;
        self.write_bytes(encoded.as_slice());
        Ok(())
    }

    /// Append a `SerString`: `None` encodes as the single byte `0xFF`, otherwise a
    /// compressed byte count followed by UTF-8 bytes with no terminator.
    ///
    /// # Errors
    /// Returns [`crate::Error::CompressedUnsignedOutOfRange`] if the UTF-8 byte count
    /// exceeds the compressed integer domain.
    pub fn write_ser_string(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            None => {
                self.write_u8(0xFF);
                Ok(())
            }
            Some(s) => {
                let len = u32::try_from(s.len()).unwrap_or(u32::MAX);
                self.write_compressed_uint(len)?;
                self.write_bytes(s.as_bytes());
                Ok(())
            }
        }
    }

    /// Append raw UTF-8 bytes, no length prefix and no terminator.
    pub fn write_utf8(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    /// Append raw little-endian UTF-16 code units, no length prefix and no terminator.
    pub fn write_utf16(&mut self, value: &str) {
        let encoded = U16String::from_str(value);
        for &unit in encoded.as_slice() {
            self.write_u16(unit);
        }
    }

    /// Append zero bytes until the content length is a multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) {
        let remainder = self.len() % alignment;
        if remainder != 0 {
            self.write_bytes_repeated(0, alignment - remainder);
        }
    }

    /// Append zero bytes until the content length reaches the absolute `position`.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidPadPosition`] if `position` lies behind content
    /// already written.
    pub fn pad_to(&mut self, position: usize) -> Result<()> {
        let len = self.len();
        if position < len {
            return Err(Error::InvalidPadPosition { position, len });
        }
        self.write_bytes_repeated(0, position - len);
        Ok(())
    }

    /// Reserve `len` contiguous zeroed bytes for later patching.
    ///
    /// Allocates a fresh chunk first if the live chunk cannot hold `len` contiguous
    /// bytes, so the window never straddles a boundary.
    pub fn reserve_bytes(&mut self, len: usize) -> Reservation {
        self.reserve_span(len).fill(0);
        Reservation {
            builder: self.id,
            epoch: self.epoch,
            start: self.len() - len,
            len,
        }
    }

    /// Overwrite a reserved window with `bytes`.
    ///
    /// # Errors
    /// Returns [`crate::Error::StaleReservation`] if the reservation belongs to another
    /// builder or predates a content shift (`link_prefix`, `clear`).
    ///
    /// # Panics
    /// Panics if `bytes.len()` differs from the reserved length; a mismatched patch is a
    /// programmer error.
    pub fn patch_bytes(&mut self, reservation: &Reservation, bytes: &[u8]) -> Result<()> {
        assert_eq!(
            bytes.len(),
            reservation.len,
            "patch length {} does not match the reserved window of {} bytes",
            bytes.len(),
            reservation.len
        );
        if reservation.builder != self.id || reservation.epoch != self.epoch {
            return Err(Error::StaleReservation);
        }
        if reservation.len == 0 {
            return Ok(());
        }

        let mut offset = reservation.start;
        let mut remaining = bytes;
        for chunk in self
            .frozen
            .iter_mut()
            .chain(std::iter::once(&mut self.current))
        {
            let used = chunk.used();
            if offset >= used {
                offset -= used;
                continue;
            }
            let take = remaining.len().min(used - offset);
            chunk.content_mut()[offset..offset + take].copy_from_slice(&remaining[..take]);
            remaining = &remaining[take..];
            if remaining.is_empty() {
                return Ok(());
            }
            offset = 0;
        }

        // The window was valid when reserved; reaching here means the content shrank
        // without an epoch bump, which clear() rules out.
        Err(Error::StaleReservation)
    }

    /// Overwrite a 1-byte reserved window.
    ///
    /// # Errors
    /// Same conditions as [`BlobBuilder::patch_bytes`].
    pub fn patch_u8(&mut self, reservation: &Reservation, value: u8) -> Result<()> {
        self.patch_bytes(reservation, &[value])
    }

    /// Overwrite a 2-byte reserved window with a little-endian `u16`.
    ///
    /// # Errors
    /// Same conditions as [`BlobBuilder::patch_bytes`].
    pub fn patch_u16(&mut self, reservation: &Reservation, value: u16) -> Result<()> {
        self.patch_bytes(reservation, &value.to_le_bytes())
    }

    /// Overwrite a 4-byte reserved window with a little-endian `u32`.
    ///
    /// # Errors
    /// Same conditions as [`BlobBuilder::patch_bytes`].
    pub fn patch_u32(&mut self, reservation: &Reservation, value: u32) -> Result<()> {
        self.patch_bytes(reservation, &value.to_le_bytes())
    }

    /// Insert the donor's entire content before this builder's content, without copying.
    ///
    /// Consuming the donor transfers ownership of all its chunks; the type system
    /// prevents any further write through it. A zero-length donor is a no-op and its
    /// storage goes back to the allocation strategy. Outstanding reservations on this
    /// builder become stale because every absolute offset shifts.
    pub fn link_prefix(&mut self, donor: BlobBuilder) {
        if donor.is_empty() {
            donor.release_all();
            return;
        }

        let donor_len = donor.len();
        let BlobBuilder {
            frozen: donor_frozen,
            current: donor_current,
            allocator: donor_allocator,
            ..
        } = donor;

        let mut new_frozen = donor_frozen;
        if donor_current.used() > 0 {
            new_frozen.push(donor_current);
        } else {
            donor_allocator.release(donor_current.into_storage());
        }
        new_frozen.append(&mut self.frozen);

        self.frozen = new_frozen;
        self.prefix_length += donor_len;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Append the donor's entire content after this builder's content, without copying.
    ///
    /// Consuming the donor transfers ownership of all its chunks; the donor's live tail
    /// becomes this builder's live tail, so subsequent writes continue after the donated
    /// content. A zero-length donor is a no-op and its storage goes back to the
    /// allocation strategy. Reservations on this builder remain valid (nothing shifts).
    ///
    /// Writing through a consumed donor is rejected at compile time:
    ///
    /// ```compile_fail
    /// use cilemit::buffer::BlobBuilder;
    ///
    /// let mut stream = BlobBuilder::new();
    /// let mut body = BlobBuilder::new();
    /// body.write_u8(1);
    ///
    /// stream.link_suffix(body);
    /// body.write_u8(2); // use of moved value
    /// ```
    pub fn link_suffix(&mut self, donor: BlobBuilder) {
        if donor.is_empty() {
            donor.release_all();
            return;
        }

        let BlobBuilder {
            frozen: mut donor_frozen,
            current: donor_current,
            prefix_length: donor_prefix,
            ..
        } = donor;

        let old = std::mem::replace(&mut self.current, donor_current);
        if old.used() > 0 {
            self.prefix_length += old.used();
            self.frozen.push(old);
        } else {
            self.allocator.release(old.into_storage());
        }
        self.frozen.append(&mut donor_frozen);
        self.prefix_length += donor_prefix;
    }

    /// Lazy, forward-only enumeration of chunk views in logical order.
    ///
    /// Each call restarts from the first chunk. The yielded slices are exactly the
    /// written content of each chunk; concatenated they form the builder's byte sequence.
    #[must_use]
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks {
            frozen: self.frozen.iter(),
            current: Some(&self.current),
        }
    }

    /// Compare the logical byte sequences of two builders chunk by chunk.
    ///
    /// Short-circuits on length mismatch and never flattens either side; the internal
    /// chunk boundaries of the two builders are irrelevant. Used for exact-duplicate
    /// detection when identical method bodies should be emitted only once.
    #[must_use]
    pub fn content_equals(&self, other: &BlobBuilder) -> bool {
        if self.len() != other.len() {
            return false;
        }

        let mut left_chunks = self.chunks();
        let mut right_chunks = other.chunks();
        let mut left: &[u8] = &[];
        let mut right: &[u8] = &[];

        loop {
            if left.is_empty() {
                match left_chunks.next() {
                    Some(chunk) => left = chunk,
                    // Equal totals: the right side is exhausted too.
                    None => return true,
                }
            }
            if right.is_empty() {
                match right_chunks.next() {
                    Some(chunk) => right = chunk,
                    None => return true,
                }
            }

            let take = left.len().min(right.len());
            if left[..take] != right[..take] {
                return false;
            }
            left = &left[take..];
            right = &right[take..];
        }
    }

    /// Flatten the whole content into one contiguous vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for chunk in self.chunks() {
            out.extend_from_slice(chunk);
        }
        out
    }

    /// Flatten a sub-range of the content into one contiguous vector.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] unless `start + count <= len()`.
    pub fn to_vec_range(&self, start: usize, count: usize) -> Result<Vec<u8>> {
        let len = self.len();
        if start.checked_add(count).map_or(true, |end| end > len) {
            return Err(Error::OutOfBounds { start, count, len });
        }

        let mut out = Vec::with_capacity(count);
        let mut skip = start;
        let mut remaining = count;
        for chunk in self.chunks() {
            if remaining == 0 {
                break;
            }
            if skip >= chunk.len() {
                skip -= chunk.len();
                continue;
            }
            let available = &chunk[skip..];
            let take = available.len().min(remaining);
            out.extend_from_slice(&available[..take]);
            remaining -= take;
            skip = 0;
        }
        Ok(out)
    }

    /// Flatten the whole content into an immutable shared snapshot.
    #[must_use]
    pub fn to_immutable(&self) -> Arc<[u8]> {
        Arc::from(self.to_vec())
    }

    /// Flatten a sub-range of the content into an immutable shared snapshot.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] unless `start + count <= len()`.
    pub fn to_immutable_range(&self, start: usize, count: usize) -> Result<Arc<[u8]>> {
        Ok(Arc::from(self.to_vec_range(start, count)?))
    }

    /// Stream all chunks, in order, into an external byte sink.
    ///
    /// No intermediate full-array allocation takes place.
    ///
    /// # Errors
    /// Returns [`crate::Error::IoError`] if the sink fails.
    pub fn write_content_to(&self, sink: &mut impl Write) -> Result<()> {
        for chunk in self.chunks() {
            sink.write_all(chunk)?;
        }
        Ok(())
    }

    /// Copy all content, in order, into another builder.
    ///
    /// Unlike the splice operations this duplicates the bytes and leaves `self` intact.
    pub fn write_content_to_builder(&self, target: &mut BlobBuilder) {
        for chunk in self.chunks() {
            target.write_bytes(chunk);
        }
    }

    /// Discard all content while keeping the live chunk's backing storage.
    ///
    /// Every other chunk goes back to the allocation strategy's release hook, so a
    /// pooling strategy can recycle the storage across many small, short-lived encodings.
    /// Outstanding reservations become stale.
    pub fn clear(&mut self) {
        for chunk in self.frozen.drain(..) {
            self.allocator.release(chunk.into_storage());
        }
        self.current.reset();
        self.prefix_length = 0;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Return every chunk's storage, including the live one, to the allocator.
    fn release_all(self) {
        let BlobBuilder {
            frozen,
            current,
            allocator,
            ..
        } = self;
        for chunk in frozen {
            allocator.release(chunk.into_storage());
        }
        allocator.release(current.into_storage());
    }
}

impl Default for BlobBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BlobBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobBuilder")
            .field("len", &self.len())
            .field("chunks", &(self.frozen.len() + 1))
            .finish()
    }
}

/// Iterator over a builder's chunk views in logical order.
///
/// Produced by [`BlobBuilder::chunks`]; finite, forward-only, and restartable by taking a
/// new iterator.
pub struct Chunks<'a> {
    frozen: std::slice::Iter<'a, Chunk>,
    current: Option<&'a Chunk>,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if let Some(chunk) = self.frozen.next() {
            return Some(chunk.content());
        }
        match self.current.take() {
            Some(chunk) if chunk.used() > 0 => Some(chunk.content()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Allocator that counts allocations and keeps released storage for inspection.
    #[derive(Default)]
    struct CountingAllocator {
        allocated: Mutex<usize>,
        released: Mutex<Vec<usize>>,
    }

    impl ChunkAllocator for CountingAllocator {
        fn allocate(&self, min_size: usize) -> Box<[u8]> {
            *self.allocated.lock().unwrap() += 1;
            DefaultChunkAllocator.allocate(min_size)
        }

        fn release(&self, storage: Box<[u8]>) {
            self.released.lock().unwrap().push(storage.len());
        }
    }

    #[test]
    fn writes_cross_chunk_boundaries() {
        let mut builder = BlobBuilder::with_capacity(16);
        for i in 0..100u8 {
            builder.write_u8(i);
        }

        assert_eq!(builder.len(), 100);
        let expected: Vec<u8> = (0..100).collect();
        assert_eq!(builder.to_vec(), expected);
        assert!(builder.chunks().count() > 1);
    }

    #[test]
    fn bulk_write_splits_at_boundary() {
        let mut builder = BlobBuilder::with_capacity(16);
        builder.write_bytes(&[0xAA; 10]);
        builder.write_bytes(&[0xBB; 10]);

        let mut expected = vec![0xAA; 10];
        expected.extend_from_slice(&[0xBB; 10]);
        assert_eq!(builder.to_vec(), expected);
    }

    #[test]
    fn primitive_byte_order() {
        let mut builder = BlobBuilder::new();
        builder.write_u16(0x1122);
        builder.write_u16_be(0x1122);
        builder.write_u32(0xAABB_CCDD);
        builder.write_u32_be(0xAABB_CCDD);

        assert_eq!(
            builder.to_vec(),
            vec![
                0x22, 0x11, 0x11, 0x22, 0xDD, 0xCC, 0xBB, 0xAA, 0xAA, 0xBB, 0xCC, 0xDD
            ]
        );
    }

    #[test]
    fn utf16_is_little_endian() {
        let mut builder = BlobBuilder::new();
        builder.write_utf16("A€");
        assert_eq!(builder.to_vec(), vec![0x41, 0x00, 0xAC, 0x20]);
    }

    #[test]
    fn ser_string_null_and_value() {
        let mut builder = BlobBuilder::new();
        builder.write_ser_string(None).unwrap();
        builder.write_ser_string(Some("ab")).unwrap();

        assert_eq!(builder.to_vec(), vec![0xFF, 0x02, b'a', b'b']);
    }

    #[test]
    fn guid_round_trip_bytes() {
        let guid = Guid::from_bytes([
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D,
            0x0E, 0x0F,
        ]);
        let mut builder = BlobBuilder::with_capacity(16);
        builder.write_u8(0);
        builder.write_guid(guid);

        // 17 bytes total; the guid must not straddle the 16-byte chunk boundary
        let flattened = builder.to_vec();
        assert_eq!(&flattened[1..], &guid.to_bytes());
    }

    #[test]
    fn align_and_pad() {
        let mut builder = BlobBuilder::new();
        builder.write_bytes(&[1, 2, 3]);
        builder.align(4);
        assert_eq!(builder.len(), 4);
        builder.align(4);
        assert_eq!(builder.len(), 4);

        builder.pad_to(10).unwrap();
        assert_eq!(builder.len(), 10);
        assert!(matches!(
            builder.pad_to(5),
            Err(Error::InvalidPadPosition { position: 5, len: 10 })
        ));
    }

    #[test]
    fn reservation_patch() {
        let mut builder = BlobBuilder::with_capacity(16);
        builder.write_bytes(&[0xEE; 14]);
        // forces a fresh chunk; the window stays contiguous
        let reservation = builder.reserve_bytes(4);
        builder.write_bytes(b"tail");
        builder.patch_u32(&reservation, 0x0403_0201).unwrap();

        let flattened = builder.to_vec();
        assert_eq!(&flattened[14..18], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&flattened[18..], b"tail");
    }

    #[test]
    fn reservation_stale_after_prefix_link() {
        let mut builder = BlobBuilder::new();
        let reservation = builder.reserve_bytes(2);

        let mut prefix = BlobBuilder::new();
        prefix.write_u8(0xAB);
        builder.link_prefix(prefix);

        assert!(matches!(
            builder.patch_u16(&reservation, 7),
            Err(Error::StaleReservation)
        ));
    }

    #[test]
    fn reservation_stale_after_clear() {
        let mut builder = BlobBuilder::new();
        let reservation = builder.reserve_bytes(4);
        builder.clear();
        builder.write_u32(0);

        assert!(builder.patch_u32(&reservation, 1).is_err());
    }

    #[test]
    fn reservation_foreign_builder_rejected() {
        let mut owner = BlobBuilder::new();
        let reservation = owner.reserve_bytes(4);

        let mut other = BlobBuilder::new();
        other.write_u32(0);
        assert!(matches!(
            other.patch_u32(&reservation, 1),
            Err(Error::StaleReservation)
        ));
    }

    #[test]
    fn reservation_survives_suffix_link() {
        let mut builder = BlobBuilder::new();
        let reservation = builder.reserve_bytes(4);

        let mut suffix = BlobBuilder::new();
        suffix.write_bytes(b"suffix");
        builder.link_suffix(suffix);

        builder.patch_u32(&reservation, 0x11223344).unwrap();
        assert_eq!(&builder.to_vec()[0..4], &[0x44, 0x33, 0x22, 0x11]);
    }

    #[test]
    fn write_stream_partial_transfer() {
        let source = [1u8, 2, 3];
        let mut cursor = std::io::Cursor::new(&source[..]);

        let mut builder = BlobBuilder::new();
        let transferred = builder.write_stream(&mut cursor, 10).unwrap();
        assert_eq!(transferred, 3);
        assert_eq!(builder.to_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn write_stream_crosses_chunks() {
        let source: Vec<u8> = (0..64).collect();
        let mut cursor = std::io::Cursor::new(&source[..]);

        let mut builder = BlobBuilder::with_capacity(16);
        let transferred = builder.write_stream(&mut cursor, 64).unwrap();
        assert_eq!(transferred, 64);
        assert_eq!(builder.to_vec(), source);
    }

    #[test]
    fn range_flatten_validation() {
        let mut builder = BlobBuilder::new();
        builder.write_bytes(b"0123456789");

        assert_eq!(builder.to_vec_range(2, 3).unwrap(), b"234");
        assert_eq!(builder.to_vec_range(0, 10).unwrap(), b"0123456789");
        assert_eq!(builder.to_vec_range(10, 0).unwrap(), b"");
        assert!(builder.to_vec_range(8, 3).is_err());
        assert!(builder.to_vec_range(usize::MAX, 2).is_err());

        let snapshot = builder.to_immutable_range(1, 4).unwrap();
        assert_eq!(&snapshot[..], b"1234");
    }

    #[test]
    fn clear_releases_frozen_chunks() {
        let allocator = Arc::new(CountingAllocator::default());
        let mut builder = BlobBuilder::with_allocator(16, allocator.clone());
        builder.write_bytes(&[0u8; 100]);
        assert!(builder.chunks().count() > 1);

        builder.clear();
        assert!(builder.is_empty());
        assert!(!allocator.released.lock().unwrap().is_empty());

        builder.write_bytes(b"reused");
        assert_eq!(builder.to_vec(), b"reused");
    }

    #[test]
    fn empty_donor_splice_is_noop() {
        let mut builder = BlobBuilder::new();
        builder.write_bytes(b"content");

        builder.link_suffix(BlobBuilder::new());
        builder.link_prefix(BlobBuilder::new());
        assert_eq!(builder.to_vec(), b"content");
    }

    #[test]
    fn content_to_writer_and_builder() {
        let mut builder = BlobBuilder::with_capacity(16);
        builder.write_bytes(&[7u8; 40]);

        let mut sink = Vec::new();
        builder.write_content_to(&mut sink).unwrap();
        assert_eq!(sink, vec![7u8; 40]);

        let mut copy = BlobBuilder::new();
        builder.write_content_to_builder(&mut copy);
        assert!(builder.content_equals(&copy));
        // the source is still usable after copying, unlike a splice
        assert_eq!(builder.len(), 40);
    }
}
