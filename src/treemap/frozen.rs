//! A `rkyv`-archived, zero-copy read-only view over a [`RoaringTreemap`].
//!
//! The outer, 64-bit layer is a hand-rolled, 32-byte-aligned index over a sequence of
//! [`Frozen`] 32-bit bodies, one per outer key; see [`RoaringTreemap::freeze`] for the exact
//! byte layout.

use core::fmt;
use core::mem::size_of;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::{Frozen, FrozenError, RoaringTreemap};

const ALIGNMENT: usize = 32;
const ENTRY_HEADER_LEN: usize = size_of::<u64>() + size_of::<u32>();

/// Computes how many zero padding bytes must precede an entry header starting at
/// `offset` so that the frozen 32-bit body following the header lands on a 32-byte boundary.
fn padding_len(offset: usize) -> usize {
    let remainder = (offset + ENTRY_HEADER_LEN) % ALIGNMENT;
    if remainder == 0 {
        0
    } else {
        ALIGNMENT - remainder
    }
}

/// Error returned by [`FrozenTreemap::from_bytes`] when the buffer is truncated, malformed, or
/// contains a body that fails validation.
#[derive(Debug)]
pub enum FrozenTreemapError {
    /// The buffer ended before the declared number of entries was read.
    UnexpectedEof,
    /// One of the per-key frozen 32-bit bodies failed to validate.
    InvalidBody(FrozenError),
}

impl fmt::Display for FrozenTreemapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrozenTreemapError::UnexpectedEof => {
                write!(f, "frozen treemap buffer ended unexpectedly")
            }
            FrozenTreemapError::InvalidBody(err) => {
                write!(f, "frozen treemap contained an invalid entry: {err}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FrozenTreemapError {}

impl RoaringTreemap {
    /// Archives this treemap into a 32-byte-aligned buffer that [`FrozenTreemap::from_bytes`]
    /// can later validate and read in place.
    ///
    /// Layout: a `u64` entry count, then for each `(key, bitmap)` pair in ascending key order:
    /// zero padding so the entry's frozen body starts 32-byte aligned, a `u64` body length, a
    /// `u32` key, and the bitmap's [`RoaringBitmap::freeze`] output.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::{FrozenTreemap, RoaringTreemap};
    ///
    /// let rb: RoaringTreemap = (1..100).collect();
    /// let bytes = rb.freeze();
    /// let frozen = FrozenTreemap::from_bytes(&bytes).unwrap();
    /// assert!(frozen.contains(42));
    /// ```
    pub fn freeze(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(self.map.len() as u64).to_le_bytes());

        for (&key, bitmap) in &self.map {
            let body = bitmap.freeze();
            let pad = padding_len(buf.len());
            buf.resize(buf.len() + pad, 0);
            buf.extend_from_slice(&(body.len() as u64).to_le_bytes());
            buf.extend_from_slice(&key.to_le_bytes());
            debug_assert_eq!(buf.len() % ALIGNMENT, 0);
            buf.extend_from_slice(&body);
        }

        buf
    }
}

/// A read-only, borrowed view over a [`RoaringTreemap`] previously archived with
/// [`RoaringTreemap::freeze`].
pub struct FrozenTreemap<'a> {
    entries: Vec<(u32, Frozen<'a>)>,
}

impl<'a> FrozenTreemap<'a> {
    /// Validates `bytes` as a frozen treemap and returns a view borrowing it.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, FrozenTreemapError> {
        let read_u64 = |bytes: &[u8]| -> Result<u64, FrozenTreemapError> {
            bytes
                .get(..size_of::<u64>())
                .map(|s| u64::from_le_bytes(s.try_into().unwrap()))
                .ok_or(FrozenTreemapError::UnexpectedEof)
        };

        let count = read_u64(bytes)?;
        let mut offset = size_of::<u64>();
        let mut entries = Vec::with_capacity(count as usize);

        for _ in 0..count {
            offset += padding_len(offset);
            let body_len_bytes =
                bytes.get(offset..).ok_or(FrozenTreemapError::UnexpectedEof)?;
            let body_len = read_u64(body_len_bytes)? as usize;
            offset += size_of::<u64>();
            let key = bytes
                .get(offset..offset + size_of::<u32>())
                .map(|s| u32::from_le_bytes(s.try_into().unwrap()))
                .ok_or(FrozenTreemapError::UnexpectedEof)?;
            offset += size_of::<u32>();
            let body = bytes.get(offset..offset + body_len).ok_or(FrozenTreemapError::UnexpectedEof)?;
            offset += body_len;

            let frozen = Frozen::from_bytes(body).map_err(FrozenTreemapError::InvalidBody)?;
            entries.push((key, frozen));
        }

        Ok(FrozenTreemap { entries })
    }

    /// Returns whether `value` is present in this view.
    pub fn contains(&self, value: u64) -> bool {
        let key = (value >> 32) as u32;
        let inner = (value & 0xFFFF_FFFF) as u32;
        match self.entries.binary_search_by_key(&key, |(k, _)| *k) {
            Ok(pos) => self.entries[pos].1.contains(inner),
            Err(_) => false,
        }
    }

    /// Returns the total number of values in this view.
    pub fn len(&self) -> u64 {
        self.entries.iter().map(|(_, frozen)| frozen.len()).sum()
    }

    /// Returns whether this view contains no values.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, frozen)| frozen.is_empty())
    }
}

#[cfg(test)]
mod test {
    use super::FrozenTreemap;
    use crate::RoaringTreemap;

    #[test]
    fn freeze_roundtrip() {
        let mut rb = RoaringTreemap::new();
        rb.insert(1);
        rb.insert(1 << 40);
        rb.insert((1 << 40) + 5);
        rb.insert(u64::MAX);

        let bytes = rb.freeze();
        let frozen = FrozenTreemap::from_bytes(&bytes).unwrap();

        assert_eq!(frozen.len(), rb.len());
        for value in rb.iter() {
            assert!(frozen.contains(value));
        }
        assert!(!frozen.contains(2));
    }

    #[test]
    fn freeze_empty() {
        let rb = RoaringTreemap::new();
        let bytes = rb.freeze();
        let frozen = FrozenTreemap::from_bytes(&bytes).unwrap();
        assert!(frozen.is_empty());
    }
}
