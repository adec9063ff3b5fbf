//! A `rkyv`-archived, zero-copy read-only view over a [`RoaringBitmap`].
//!
//! This is a non-portable representation: it is not compatible with the upstream
//! C/C++/Java/Go implementations, and is only meant to be read back by this crate. It exists so
//! a bitmap can be memory-mapped or embedded in a larger buffer and queried without an upfront
//! deserialization pass.

use core::fmt;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use rkyv::rancor::Error as RkyvError;
use rkyv::{Archive, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};

use super::container::Container;
use super::store::Store;
use crate::RoaringBitmap;

#[derive(Archive, RkyvSerialize, RkyvDeserialize)]
enum FrozenStore {
    Array(Vec<u16>),
    Bitmap(Vec<u64>),
    Run(Vec<(u16, u16)>),
}

#[derive(Archive, RkyvSerialize, RkyvDeserialize)]
struct FrozenContainer {
    key: u16,
    store: FrozenStore,
}

#[derive(Archive, RkyvSerialize, RkyvDeserialize)]
struct FrozenRoaringBitmap {
    containers: Vec<FrozenContainer>,
}

/// Error returned by [`Frozen::from_bytes`] when the buffer is not a validly archived bitmap.
#[derive(Debug)]
pub struct FrozenError(RkyvError);

impl fmt::Display for FrozenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid frozen roaring bitmap: {}", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FrozenError {}

impl RoaringBitmap {
    /// Archives this bitmap into a buffer that [`Frozen::from_bytes`] can later validate and
    /// read in place, without an intermediate deserialization pass.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::{Frozen, RoaringBitmap};
    ///
    /// let rb: RoaringBitmap = (1..100).collect();
    /// let bytes = rb.freeze();
    /// let frozen = Frozen::from_bytes(&bytes).unwrap();
    /// assert!(frozen.contains(42));
    /// assert_eq!(frozen.len(), rb.len());
    /// ```
    pub fn freeze(&self) -> Vec<u8> {
        let frozen = FrozenRoaringBitmap {
            containers: self
                .containers
                .iter()
                .map(|Container { key, store }| FrozenContainer {
                    key: *key,
                    store: match store {
                        Store::Array(array) => FrozenStore::Array(array.as_slice().to_vec()),
                        Store::Bitmap(bitmap) => FrozenStore::Bitmap(bitmap.as_array().to_vec()),
                        Store::Run(runs) => FrozenStore::Run(
                            runs.as_slice()
                                .iter()
                                .map(|interval| (interval.start(), interval.end() - interval.start()))
                                .collect(),
                        ),
                    },
                })
                .collect(),
        };
        rkyv::to_bytes::<RkyvError>(&frozen)
            .expect("in-memory rkyv serialization is infallible")
            .to_vec()
    }
}

/// A read-only, borrowed view over a [`RoaringBitmap`] previously archived with
/// [`RoaringBitmap::freeze`].
pub struct Frozen<'a> {
    archived: &'a ArchivedFrozenRoaringBitmap,
}

impl<'a> Frozen<'a> {
    /// Validates `bytes` as a frozen bitmap and returns a view borrowing it.
    ///
    /// `bytes` must outlive the returned [`Frozen`].
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, FrozenError> {
        let archived =
            rkyv::access::<ArchivedFrozenRoaringBitmap, RkyvError>(bytes).map_err(FrozenError)?;
        Ok(Frozen { archived })
    }

    /// Returns whether `value` is present in this view.
    pub fn contains(&self, value: u32) -> bool {
        let key = (value >> 16) as u16;
        let index = (value & 0xFFFF) as u16;
        let Ok(pos) = self.archived.containers.binary_search_by_key(&key, |c| c.key) else {
            return false;
        };
        match &self.archived.containers[pos].store {
            ArchivedFrozenStore::Array(array) => array.binary_search(&index).is_ok(),
            ArchivedFrozenStore::Bitmap(bitmap) => {
                let word = bitmap[usize::from(index) / 64];
                (word >> (u32::from(index) % 64)) & 1 != 0
            }
            ArchivedFrozenStore::Run(runs) => runs.iter().any(|(start, len)| {
                index >= *start && index <= start.saturating_add(*len)
            }),
        }
    }

    /// Returns the total number of values in this view.
    pub fn len(&self) -> u64 {
        self.archived
            .containers
            .iter()
            .map(|c| match &c.store {
                ArchivedFrozenStore::Array(array) => array.len() as u64,
                ArchivedFrozenStore::Bitmap(bitmap) => {
                    bitmap.iter().map(|word| word.count_ones() as u64).sum::<u64>()
                }
                ArchivedFrozenStore::Run(runs) => {
                    runs.iter().map(|(_, len)| u64::from(*len) + 1).sum::<u64>()
                }
            })
            .sum()
    }

    /// Returns whether this view contains no values.
    pub fn is_empty(&self) -> bool {
        self.archived.containers.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::Frozen;
    use crate::RoaringBitmap;

    #[test]
    fn freeze_roundtrip_array_and_bitmap() {
        let mut rb = RoaringBitmap::new();
        rb.insert_range(0..100);
        rb.insert(1_000_000);
        rb.insert(1_000_001);

        let bytes = rb.freeze();
        let frozen = Frozen::from_bytes(&bytes).unwrap();

        assert_eq!(frozen.len(), rb.len());
        for value in rb.iter() {
            assert!(frozen.contains(value));
        }
        assert!(!frozen.contains(100));
    }

    #[test]
    fn freeze_empty() {
        let rb = RoaringBitmap::new();
        let bytes = rb.freeze();
        let frozen = Frozen::from_bytes(&bytes).unwrap();
        assert!(frozen.is_empty());
        assert_eq!(frozen.len(), 0);
    }

    #[test]
    fn from_bytes_rejects_garbage() {
        assert!(Frozen::from_bytes(&[1, 2, 3]).is_err());
    }
}
