//! # Dynbits
//!
//! A dynamic bit vector with fast insertion, built on a packed B+-tree.
//!
//! The vector supports point access, point update and insertion of a bit at
//! any position in time logarithmic in the current length, while staying
//! close to the information-theoretic space minimum. It is intended as a
//! building block for succinct and compressed data structures (wavelet
//! trees, dynamic rank/select dictionaries, compressed text indexes).
//!
//! ## Quick Start
//!
//! ```
//! use dynbits::BitVector;
//!
//! let mut bv = BitVector::new(4096)?;
//!
//! // Append and prepend bits
//! bv.push_back(true)?;
//! bv.push_back(false)?;
//! bv.push_front(false)?;
//!
//! // Insert in the middle: everything at or after index 2 shifts up
//! bv.insert(2, true)?;
//!
//! assert_eq!(bv.size(), 4);
//! assert_eq!(bv.rank(), 2);
//! assert!(!bv.access(0)?);
//! assert!(bv.access(2)?);
//! # Ok::<(), dynbits::Error>(())
//! ```
//!
//! ## Layers
//!
//! - [`BitView`] — raw bit addressing over a word array: sub-word range
//!   get/set, overlap-aware copies, bit insertion with carry.
//! - [`PackedView`] — fixed-width packed fields over a `BitView`, with
//!   SIMD-in-a-word increment/decrement and the flag-bit threshold search.
//! - [`BitVector`] — the packed B+-tree: bit-packed leaves, cumulative
//!   counter nodes, and amortized-constant local rebalancing.
//!
//! ## Features
//!
//! - `std` (default) - std error trait impls; disable for no_std + alloc
//! - `serde` - serialization support for all public data structures
//! - `portable-popcount` - portable bitwise popcount instead of `count_ones()`

// Use no_std unless the std feature is enabled or we're in test mode
#![cfg_attr(not(any(test, feature = "std")), no_std)]

// When using no_std, we need to explicitly link the alloc crate
#[cfg(not(any(test, feature = "std")))]
extern crate alloc;

// When using std, re-export alloc types from std for compatibility
#[cfg(any(test, feature = "std"))]
extern crate std as alloc;

mod bitview;
mod broadword;
mod error;
mod packed;
mod popcount;
mod tree;

pub use bitview::BitView;
pub use error::{Error, Result};
pub use packed::{FieldIter, PackedView};
pub use popcount::{popcount_word, popcount_words};
pub use tree::{BitIter, BitVector, DEFAULT_NODE_WIDTH};
