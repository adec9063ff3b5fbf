use alloc::collections::BTreeMap;
use core::ops::{Bound, RangeBounds};

use super::util;
use crate::RoaringTreemap;

impl RoaringTreemap {
    /// Creates an empty `RoaringTreemap`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    /// let mut rb = RoaringTreemap::new();
    /// ```
    pub fn new() -> RoaringTreemap {
        RoaringTreemap { map: BTreeMap::new() }
    }

    /// Adds a value to the set.
    ///
    /// Returns whether the value was absent from the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let mut rb = RoaringTreemap::new();
    /// assert_eq!(rb.insert(3), true);
    /// assert_eq!(rb.insert(3), false);
    /// assert_eq!(rb.contains(3), true);
    /// ```
    pub fn insert(&mut self, value: u64) -> bool {
        let (hi, lo) = util::split(value);
        self.map.entry(hi).or_default().insert(lo)
    }

    /// Inserts a range of values.
    /// Returns the number of inserted values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let mut rb = RoaringTreemap::new();
    /// rb.insert_range(2..4);
    /// assert!(rb.contains(2));
    /// assert!(rb.contains(3));
    /// assert!(!rb.contains(4));
    /// ```
    pub fn insert_range<R>(&mut self, range: R) -> u64
    where
        R: RangeBounds<u64>,
    {
        let (start, end) = match convert_range_to_inclusive(range) {
            Some(range) => (*range.start(), *range.end()),
            None => return 0,
        };
        if start > end {
            return 0;
        }

        let (start_hi, start_lo) = util::split(start);
        let (end_hi, end_lo) = util::split(end);

        let mut inserted = 0;
        for hi in start_hi..=end_hi {
            let lo_start = if hi == start_hi { start_lo } else { 0 };
            let lo_end = if hi == end_hi { end_lo } else { u32::MAX };
            inserted += self.map.entry(hi).or_default().insert_range(lo_start..=lo_end);
        }
        inserted
    }

    /// Pushes `value` in the treemap only if it is greater than the current maximum value.
    ///
    /// Returns whether the value was inserted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let mut rb = RoaringTreemap::new();
    /// assert_eq!(rb.push(1), true);
    /// assert_eq!(rb.push(1), false);
    /// assert_eq!(rb.push(0), false);
    /// assert_eq!(rb.push(2), true);
    /// ```
    pub fn push(&mut self, value: u64) -> bool {
        let (hi, lo) = util::split(value);
        match self.map.iter_mut().next_back() {
            Some((&last_hi, last_bitmap)) if last_hi == hi => last_bitmap.push(lo),
            Some((&last_hi, _)) if last_hi > hi => false,
            _ => {
                self.map.entry(hi).or_default().push(lo);
                true
            }
        }
    }

    /// Pushes `value` in the treemap, without any checks that it is greater than the current
    /// maximum value. Caller is responsible for ensuring the treemap remains ordered.
    pub(crate) fn push_unchecked(&mut self, value: u64) {
        let (hi, lo) = util::split(value);
        self.map.entry(hi).or_default().push_unchecked(lo);
    }

    /// Removes a value from the set. Returns `true` if the value was present in the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let mut rb = RoaringTreemap::new();
    /// rb.insert(3);
    /// assert_eq!(rb.remove(3), true);
    /// assert_eq!(rb.remove(3), false);
    /// assert_eq!(rb.contains(3), false);
    /// ```
    pub fn remove(&mut self, value: u64) -> bool {
        let (hi, lo) = util::split(value);
        match self.map.get_mut(&hi) {
            Some(bitmap) => {
                let removed = bitmap.remove(lo);
                if bitmap.is_empty() {
                    self.map.remove(&hi);
                }
                removed
            }
            None => false,
        }
    }

    /// Removes a range of values from the set.
    /// Returns the number of removed values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let mut rb: RoaringTreemap = (1..10).collect();
    /// assert_eq!(rb.remove_range(2..5), 3);
    /// ```
    pub fn remove_range<R>(&mut self, range: R) -> u64
    where
        R: RangeBounds<u64>,
    {
        let (start, end) = match convert_range_to_inclusive(range) {
            Some(range) => (*range.start(), *range.end()),
            None => return 0,
        };
        if start > end {
            return 0;
        }

        let (start_hi, start_lo) = util::split(start);
        let (end_hi, end_lo) = util::split(end);

        let mut removed = 0;
        let mut emptied = alloc::vec::Vec::new();
        for (&hi, bitmap) in self.map.range_mut(start_hi..=end_hi) {
            let lo_start = if hi == start_hi { start_lo } else { 0 };
            let lo_end = if hi == end_hi { end_lo } else { u32::MAX };
            removed += bitmap.remove_range(lo_start..=lo_end);
            if bitmap.is_empty() {
                emptied.push(hi);
            }
        }
        for hi in emptied {
            self.map.remove(&hi);
        }
        removed
    }

    /// Returns `true` if this set contains the specified integer.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let mut rb = RoaringTreemap::new();
    /// rb.insert(1);
    /// assert_eq!(rb.contains(0), false);
    /// assert_eq!(rb.contains(1), true);
    /// assert_eq!(rb.contains(100), false);
    /// ```
    pub fn contains(&self, value: u64) -> bool {
        let (hi, lo) = util::split(value);
        self.map.get(&hi).is_some_and(|bitmap| bitmap.contains(lo))
    }

    /// Returns `true` if all values in the range are present in this set.
    pub fn contains_range<R>(&self, range: R) -> bool
    where
        R: RangeBounds<u64>,
    {
        let (start, end) = match convert_range_to_inclusive(range) {
            Some(range) => (*range.start(), *range.end()),
            None => return true,
        };
        if start > end {
            return true;
        }

        let (start_hi, start_lo) = util::split(start);
        let (end_hi, end_lo) = util::split(end);

        for hi in start_hi..=end_hi {
            let lo_start = if hi == start_hi { start_lo } else { 0 };
            let lo_end = if hi == end_hi { end_lo } else { u32::MAX };
            match self.map.get(&hi) {
                Some(bitmap) if bitmap.contains_range(lo_start..=lo_end) => (),
                _ => return false,
            }
        }
        true
    }

    /// Clears all integers in this set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let mut rb = RoaringTreemap::new();
    /// rb.insert(1);
    /// assert_eq!(rb.contains(1), true);
    /// rb.clear();
    /// assert_eq!(rb.contains(1), false);
    /// ```
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Returns `true` if there are no integers in this set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let mut rb = RoaringTreemap::new();
    /// assert_eq!(rb.is_empty(), true);
    ///
    /// rb.insert(3);
    /// assert_eq!(rb.is_empty(), false);
    /// ```
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the number of distinct integers added to the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let mut rb = RoaringTreemap::new();
    /// assert_eq!(rb.len(), 0);
    ///
    /// rb.insert(3);
    /// assert_eq!(rb.len(), 1);
    ///
    /// rb.insert(3);
    /// rb.insert(4);
    /// assert_eq!(rb.len(), 2);
    /// ```
    pub fn len(&self) -> u64 {
        let (count, full) = self.cardinality_nothrow();
        if full {
            u64::MAX
        } else {
            count
        }
    }

    /// Returns whether every one of the 2^64 possible values is present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let rb = RoaringTreemap::new();
    /// assert!(!rb.is_full());
    /// ```
    ///
    /// Saturating the entire 64-bit domain (shown for illustration; far too large to run as a
    /// doctest):
    ///
    /// ```ignore
    /// let mut rb = RoaringTreemap::new();
    /// rb.insert_range(0..=u64::MAX);
    /// assert!(rb.is_full());
    /// ```
    pub fn is_full(&self) -> bool {
        self.map.len() as u64 == u32::MAX as u64 + 1 && self.map.values().all(|bitmap| bitmap.is_full())
    }

    /// Returns the total cardinality of the set together with a flag indicating whether the
    /// set is fully saturated.
    ///
    /// The true cardinality of a fully saturated set is 2^64, which cannot be represented in a
    /// `u64`; in that case this returns `(0, true)` rather than overflowing. [`Self::len`]
    /// handles the same boundary by saturating at `u64::MAX` instead.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let mut rb = RoaringTreemap::new();
    /// rb.insert(3);
    /// assert_eq!(rb.cardinality_nothrow(), (1, false));
    /// ```
    ///
    /// A treemap saturating the entire 64-bit domain reports `(0, true)` rather than
    /// overflowing (shown for illustration; far too large to run as a doctest):
    ///
    /// ```ignore
    /// let mut rb = RoaringTreemap::new();
    /// rb.insert_range(0..=u64::MAX);
    /// assert_eq!(rb.cardinality_nothrow(), (0, true));
    /// ```
    pub fn cardinality_nothrow(&self) -> (u64, bool) {
        if self.is_full() {
            return (0, true);
        }
        let count = self.map.values().map(|bitmap| bitmap.len()).sum();
        (count, false)
    }

    /// Converts array and bitset containers in every inner bitmap into run containers wherever
    /// the run-length encoding would be strictly smaller, without changing the set of values
    /// present.
    ///
    /// Returns `true` if at least one container's representation changed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let mut rb: RoaringTreemap = (0..1_000_000).step_by(100).collect();
    /// assert!(rb.run_optimize());
    /// ```
    pub fn run_optimize(&mut self) -> bool {
        let mut changed = false;
        for bitmap in self.map.values_mut() {
            changed |= bitmap.run_optimize();
        }
        changed
    }

    /// Converts every run container, in every inner bitmap, back into an array or bitset
    /// container.
    ///
    /// Returns `true` if at least one container's representation changed.
    pub fn remove_run_compression(&mut self) -> bool {
        let mut changed = false;
        for bitmap in self.map.values_mut() {
            changed |= bitmap.remove_run_compression();
        }
        changed
    }

    /// Releases excess capacity held by every inner bitmap, returning the number of bytes
    /// freed.
    pub fn shrink_to_fit(&mut self) -> u64 {
        self.map.values_mut().map(|bitmap| bitmap.shrink_to_fit()).sum()
    }

    /// Returns the minimum value in the set (if the set is non-empty).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let mut rb = RoaringTreemap::new();
    /// assert_eq!(rb.min(), None);
    ///
    /// rb.insert(3);
    /// rb.insert(4);
    /// assert_eq!(rb.min(), Some(3));
    /// ```
    pub fn min(&self) -> Option<u64> {
        self.map.iter().next().and_then(|(&hi, bitmap)| bitmap.min().map(|lo| util::join(hi, lo)))
    }

    /// Returns the maximum value in the set (if the set is non-empty).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let mut rb = RoaringTreemap::new();
    /// assert_eq!(rb.max(), None);
    ///
    /// rb.insert(3);
    /// rb.insert(4);
    /// assert_eq!(rb.max(), Some(4));
    /// ```
    pub fn max(&self) -> Option<u64> {
        self.map
            .iter()
            .next_back()
            .and_then(|(&hi, bitmap)| bitmap.max().map(|lo| util::join(hi, lo)))
    }

    /// Returns the number of integers that are `<= value`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let rb: RoaringTreemap = (0..10).collect();
    /// assert_eq!(rb.rank(5), 6);
    /// ```
    pub fn rank(&self, value: u64) -> u64 {
        let (hi, lo) = util::split(value);
        let mut rank = self.map.range(..hi).map(|(_, bitmap)| bitmap.len()).sum::<u64>();
        if let Some(bitmap) = self.map.get(&hi) {
            rank += bitmap.rank(lo);
        }
        rank
    }

    /// Returns the `n`th integer in the set or `None` if `n >= len()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let rb: RoaringTreemap = (10..20).collect();
    /// assert_eq!(rb.select(0), Some(10));
    /// assert_eq!(rb.select(9), Some(19));
    /// assert_eq!(rb.select(10), None);
    /// ```
    pub fn select(&self, mut n: u64) -> Option<u64> {
        for (&hi, bitmap) in self.map.iter() {
            let len = bitmap.len();
            if n < len {
                return bitmap.select(n as u32).map(|lo| util::join(hi, lo));
            }
            n -= len;
        }
        None
    }

    /// Removes the smallest `n` values from the set.
    pub fn remove_smallest(&mut self, mut n: u64) {
        let mut emptied = alloc::vec::Vec::new();
        for (&hi, bitmap) in self.map.iter_mut() {
            if n == 0 {
                break;
            }
            let len = bitmap.len();
            if n >= len {
                emptied.push(hi);
                n -= len;
            } else {
                bitmap.remove_smallest(n);
                n = 0;
            }
        }
        for hi in emptied {
            self.map.remove(&hi);
        }
    }

    /// Removes the biggest `n` values from the set.
    pub fn remove_biggest(&mut self, mut n: u64) {
        let mut emptied = alloc::vec::Vec::new();
        for (&hi, bitmap) in self.map.iter_mut().rev() {
            if n == 0 {
                break;
            }
            let len = bitmap.len();
            if n >= len {
                emptied.push(hi);
                n -= len;
            } else {
                bitmap.remove_biggest(n);
                n = 0;
            }
        }
        for hi in emptied {
            self.map.remove(&hi);
        }
    }
}

impl Default for RoaringTreemap {
    fn default() -> RoaringTreemap {
        RoaringTreemap::new()
    }
}

impl Clone for RoaringTreemap {
    fn clone(&self) -> Self {
        RoaringTreemap { map: self.map.clone() }
    }

    fn clone_from(&mut self, other: &Self) {
        self.map.clone_from(&other.map);
    }
}

fn convert_range_to_inclusive<R>(range: R) -> Option<core::ops::RangeInclusive<u64>>
where
    R: RangeBounds<u64>,
{
    let start = match range.start_bound() {
        Bound::Included(&i) => i,
        Bound::Excluded(&i) => i.checked_add(1)?,
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&i) => i,
        Bound::Excluded(&i) => i.checked_sub(1)?,
        Bound::Unbounded => u64::MAX,
    };
    if start > end {
        return None;
    }
    Some(start..=end)
}
