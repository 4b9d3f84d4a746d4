// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # cilemit
//!
//! Emission primitives for ECMA-335 metadata: the chunked byte-buffer builder and the
//! table/heap layout sizing engine at the core of a .NET metadata writer. Built in pure
//! Rust, `cilemit` provides the binary-format machinery a compiler's output stage needs
//! to serialize its symbol graph into the metadata tables/heaps layout, without tying
//! itself to any particular symbol model or PE envelope.
//!
//! ## Features
//!
//! - **📦 Append-optimized buffers** - Chunked growth that never copies written content
//! - **🔗 O(1) splicing** - Graft whole buffers before or after one another by ownership
//!   transfer, no byte copies
//! - **🔢 Precise primitive encoding** - Fixed-width little-endian values, the two
//!   mandated big-endian forms, ECMA-335 II.23.2 compressed integers, `SerString`,
//!   UTF-8/UTF-16, decimal/date-time/GUID constants
//! - **📐 Exact layout sizing** - Every coded-index width, row size, bitmask, and
//!   stream total, for full, minimal-delta, and standalone-debug emissions
//! - **🛡️ Loud failure** - Range and domain violations surface immediately; nothing is
//!   silently truncated
//!
//! ## Quick Start
//!
//! Add `cilemit` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! cilemit = "0.1"
//! ```
//!
//! ### Building a blob
//!
//! ```rust
//! use cilemit::prelude::*;
//!
//! let mut builder = BlobBuilder::new();
//! builder.write_u16(0x0003);
//! builder.write_compressed_uint(0x1234)?;
//! builder.write_ser_string(Some("System.Object"))?;
//!
//! let bytes = builder.to_vec();
//! # Ok::<(), cilemit::Error>(())
//! ```
//!
//! ### Sizing a table stream
//!
//! ```rust
//! use cilemit::prelude::*;
//!
//! let mut rows = [0u32; TABLE_ID_LIMIT];
//! rows[TableId::Module as usize] = 1;
//! rows[TableId::TypeDef as usize] = 42;
//!
//! let sizes = MetadataSizes::new(rows, HeapSizes::default(), EmissionFlags::default());
//! println!(
//!     "TypeDef rows are {} bytes, table stream totals {} bytes",
//!     sizes.row_size(TableId::TypeDef),
//!     sizes.table_stream_size(),
//! );
//! ```
//!
//! ## Architecture
//!
//! `cilemit` is organized into two engines plus their shared encoders:
//!
//! - [`buffer`] - The chunk chain builder: writes, splices, reservations, enumeration,
//!   comparison, flattening, and pooled reuse
//! - [`encode`] - Stateless primitive encoders shared by all writers
//! - [`layout`] - Table identities, coded indexes, and the sizing engine
//! - [`Error`] and [`Result`] - Error handling across both engines
//!
//! The intended flow mirrors a metadata writer: accumulate content into many builders
//! (one per logical region, plus short-lived ones per method body or attribute blob),
//! splice them together, then finalize row counts and heap sizes into
//! [`layout::MetadataSizes`] and use the computed widths to serialize the table rows
//! whose reference fields could not be sized up front.
//!
//! ## Concurrency
//!
//! A builder has one owner and is never synchronized; independent builders may be filled
//! on independent threads by an external driver and spliced on a single thread. The
//! sizing engine is immutable after construction and freely shareable.

pub(crate) mod error;

pub mod buffer;
pub mod encode;
pub mod layout;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types from
/// across the library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust
/// use cilemit::prelude::*;
///
/// let mut builder = BlobBuilder::with_capacity(64);
/// builder.write_u32(0xC0FF_EE00);
/// assert_eq!(builder.len(), 4);
/// ```
pub mod prelude;

pub use error::{Error, Result};
