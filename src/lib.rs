#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(missing_docs)]
#![allow(clippy::unreadable_literal)]
#![cfg_attr(feature = "simd", feature(portable_simd))]

//! This is a crate containing the [`RoaringBitmap`] and [`RoaringTreemap`] compressed bitmap
//! types.
//!
//! [`RoaringBitmap`] is a compressed bitmap for `u32` values, [`RoaringTreemap`] extends the
//! scheme to `u64` values by keying a `BTreeMap` of [`RoaringBitmap`]s by the upper 32 bits of
//! each value.
//!
//! # Features
//!
//! - `std` (default): enables serialization/deserialization compatible with the upstream
//!   Roaring bitmap formats, and a handful of convenience trait impls that need an allocator
//!   backed by `std` rather than bare `alloc`.
//! - `serde`: implements `serde::Serialize`/`serde::Deserialize` for both bitmap types, backed
//!   by the `std`-gated binary (de)serialization.
//! - `simd`: uses portable-SIMD kernels for the array-container set operations. Requires a
//!   nightly compiler.
//! - `rkyv`: adds [`Frozen`] and [`FrozenTreemap`], zero-copy read-only views over a
//!   previously-archived bitmap/treemap. This is a non-portable, crate-internal format, not
//!   compatible with the upstream Roaring bitmap implementations.

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod bitmap;
mod treemap;

pub use bitmap::RoaringBitmap;
pub use treemap::RoaringTreemap;

#[cfg(feature = "rkyv")]
pub use bitmap::{Frozen, FrozenError};
#[cfg(feature = "rkyv")]
pub use treemap::{FrozenTreemap, FrozenTreemapError};

use core::fmt;

/// Error for when an iterator isn't sorted, returned by
/// [`RoaringBitmap::from_sorted_iter`] and [`RoaringTreemap::from_sorted_iter`].
#[derive(Debug)]
pub struct NonSortedIntegers {
    valid_until: u64,
}

impl NonSortedIntegers {
    /// Returns the number of elements that were valid, i.e. the length of the sorted prefix
    /// before the iterator stopped being in strictly increasing order.
    pub fn valid_until(&self) -> u64 {
        self.valid_until
    }
}

impl fmt::Display for NonSortedIntegers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "integers are not sorted, first invalid integer at index: {}", self.valid_until)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for NonSortedIntegers {}

/// Computes set operations over an iterator of bitmaps, choosing an order and a strategy that
/// tries to minimize the number and cost of intermediate allocations.
///
/// This trait is implemented for any `IntoIterator` over owned bitmaps, borrowed bitmaps, and
/// over `Result`s of either, so that callers that produce bitmaps fallibly (e.g. while streaming
/// them off disk) don't need to collect into a `Vec` first.
///
/// # Examples
///
/// ```rust
/// use roaring64::{MultiOps, RoaringBitmap};
///
/// let bitmaps = vec![
///     (1..4).collect::<RoaringBitmap>(),
///     (2..5).collect::<RoaringBitmap>(),
///     (3..6).collect::<RoaringBitmap>(),
/// ];
///
/// let union = bitmaps.iter().union();
/// assert_eq!(union, (1..6).collect());
/// ```
pub trait MultiOps<T> {
    /// The type produced by these operations, usually `Self` or `Result<Self, E>`.
    type Output;

    /// Unions all of the bitmaps in `self`.
    fn union(self) -> Self::Output;

    /// Intersects all of the bitmaps in `self`.
    fn intersection(self) -> Self::Output;

    /// Subtracts all but the first of the bitmaps in `self` from the first.
    fn difference(self) -> Self::Output;

    /// Computes the symmetric difference of all the bitmaps in `self`, i.e. the set of values
    /// that occur an odd number of times across every bitmap.
    fn symmetric_difference(self) -> Self::Output;
}
