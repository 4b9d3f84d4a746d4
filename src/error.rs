use thiserror::Error;

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all possible error conditions that can occur while building metadata
/// blobs and computing stream layouts. Each variant provides specific context about the
/// failure mode to enable appropriate error handling.
///
/// # Error Categories
///
/// ## Range Violations
/// - [`Error::OutOfBounds`] - A flatten/snapshot range lies outside the builder's content
/// - [`Error::InvalidPadPosition`] - A pad target lies behind the already written content
///
/// ## Encoding-Domain Violations
/// - [`Error::CompressedUnsignedOutOfRange`] - Value too large for the compressed unsigned form
/// - [`Error::CompressedSignedOutOfRange`] - Value outside the compressed signed domain
/// - [`Error::CompressedInvalid`] - Byte sequence is not a valid compressed integer
///
/// ## Reservation Misuse
/// - [`Error::StaleReservation`] - A reservation was patched after its builder's content shifted
///
/// ## I/O and External Errors
/// - [`Error::IoError`] - Filesystem or sink I/O errors during bulk transfer
///
/// All of these are local, synchronous failures at the point of misuse; none are retried
/// inside this crate. A partial transfer from [`crate::buffer::BlobBuilder::write_stream`]
/// is an inspectable `Ok(n)`, never an error.
///
/// # Examples
///
/// ```rust
/// use cilemit::{buffer::BlobBuilder, Error};
///
/// let mut builder = BlobBuilder::new();
/// builder.write_u32(0xDEAD_BEEF);
///
/// match builder.to_vec_range(2, 8) {
///     Err(Error::OutOfBounds { start, count, len }) => {
///         eprintln!("range [{start}, {start}+{count}) exceeds content length {len}");
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A flatten or snapshot range exceeds the builder's content.
    ///
    /// This error occurs when `start + count` reaches past the logical end of the
    /// builder's byte sequence. The fields carry the rejected range and the content
    /// length at the time of the call for diagnostics.
    #[error("Range [{start}, {start}+{count}) is outside the builder content of {len} bytes")]
    OutOfBounds {
        /// Start offset of the rejected range
        start: usize,
        /// Byte count of the rejected range
        count: usize,
        /// Content length of the builder at the time of the call
        len: usize,
    },

    /// A pad target lies behind the content already written.
    ///
    /// Padding only ever appends zero bytes; a position smaller than the current
    /// content length cannot be reached.
    #[error("Cannot pad to position {position}, {len} bytes have already been written")]
    InvalidPadPosition {
        /// The requested absolute position
        position: usize,
        /// Content length of the builder at the time of the call
        len: usize,
    },

    /// The value cannot be represented as an ECMA-335 compressed unsigned integer.
    ///
    /// The compressed unsigned form covers `0..=0x1FFF_FFFF`. A larger value indicates
    /// an offset or count the binary format fundamentally cannot express; it is never
    /// silently truncated.
    #[error("Value {value:#X} exceeds the compressed unsigned integer maximum of 0x1FFFFFFF")]
    CompressedUnsignedOutOfRange {
        /// The rejected value
        value: u32,
    },

    /// The value cannot be represented as an ECMA-335 compressed signed integer.
    ///
    /// The compressed signed form covers `-0x1000_0000..=0x0FFF_FFFF`.
    #[error("Value {value} is outside the compressed signed integer domain")]
    CompressedSignedOutOfRange {
        /// The rejected value
        value: i32,
    },

    /// A byte sequence does not begin with a valid compressed integer.
    ///
    /// Returned by the decoding helpers when the lead byte carries the reserved
    /// `111xxxxx` prefix, or when the input ends before the encoding completes.
    #[error("Invalid compressed integer encoding, lead byte {lead:#04X}")]
    CompressedInvalid {
        /// The offending lead byte
        lead: u8,
    },

    /// A reservation was used after the owning builder's content shifted.
    ///
    /// Reservations record an absolute offset; linking a prefix or clearing the
    /// builder moves or discards the bytes underneath, as does patching through a
    /// reservation taken from a different builder. Failing here prevents a patch
    /// from landing on the wrong bytes.
    #[error("Reservation is stale; the builder content was moved or cleared since it was taken")]
    StaleReservation,

    /// I/O error from an external byte source or sink.
    ///
    /// Wraps standard I/O errors that can occur while copying from a reader into
    /// chunk storage or draining chunks into a writer.
    #[error("{0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
