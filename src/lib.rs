//! # bitarray-rs: Packed Bit Vectors in Rust
//!
//! **`bitarray-rs`** is a library of growable, densely packed bit vectors with
//! sequence semantics, prefix-code encoding, and a search engine over Boolean
//! terms of many bit vectors.
//!
//! ## What is a bit vector here?
//!
//! A [`BitVector`] is a sequence of bits stored eight to a byte. Every vector
//! carries its own [`BitOrder`], which fixes whether bit 0 of a byte is its
//! most- or least-significant bit. The order is observable through raw
//! byte access and serialization, and invisible through indexing.
//!
//! ## Key Features
//!
//! - **Sequence API**: negative indices, stepped slices, slice assignment that
//!   grows or shrinks the vector, insertion, deletion, search.
//! - **Word-at-a-time kernels**: bitwise operators, population counts and
//!   weight computations run over 16- and 8-byte blocks.
//! - **Prefix codes**: encode symbol streams with a variable-length code and
//!   decode them through a binary trie, eagerly or lazily.
//! - **Term search**: enumerate all `d`-combinations of a basis of vectors
//!   under AND, OR or XOR, keeping the top-`k` by weight deviation.
//!
//! ## Basic Usage
//!
//! ```rust
//! use bitarray_rs::{BitOrder, BitVector};
//! use bitarray_rs::slice::SliceSpec;
//!
//! let mut v = BitVector::from_01("1101", BitOrder::Big).unwrap();
//! v.append(false).unwrap();
//! assert_eq!(v.to_01(), "11010");
//!
//! // Negative indices count from the end.
//! assert_eq!(v.get(-2), Ok(true));
//!
//! // Unit-step slice assignment may change the length.
//! let ones = BitVector::from_01("111", BitOrder::Big).unwrap();
//! v.set_slice(1..2, &ones).unwrap();
//! assert_eq!(v.to_01(), "1111010");
//!
//! // Stepped slices select every n-th bit.
//! let even = v.get_slice(SliceSpec::step(2)).unwrap();
//! assert_eq!(even.to_01(), "1100");
//!
//! // The wire format keeps the bit count exact.
//! let wire = v.to_wire();
//! assert_eq!(BitVector::from_wire(&wire, BitOrder::Big).unwrap(), v);
//! ```
//!
//! ## Core Components
//!
//! - **[`bitvec`]**: the [`BitVector`] type, constructors and whole-vector operations.
//! - **[`storage`]**: buffer management, raw bit copies and buffer exports.
//! - **[`slice`]**: index normalization and slice access.
//! - **[`bitops`]**: bitwise operators, counting and searching.
//! - **[`codec`]**: prefix-code encoding and decoding.
//! - **[`terms`]**: Boolean term search and polynomial evaluation.

pub mod bitops;
pub mod bitvec;
pub mod codec;
pub mod combination;
pub mod error;
pub mod eval;
pub mod heap;
pub mod slice;
pub mod storage;
pub mod terms;
pub mod types;
pub mod utils;
pub mod wire;

pub use crate::bitvec::BitVector;
pub use crate::error::{BitError, Result};
pub use crate::types::{AddressWidth, BitOrder, Op};
