mod array_store;
mod bitmap_store;
mod interval_store;

use alloc::vec;
use core::cmp::Ordering;
use core::mem;
use core::ops::{
    BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, RangeInclusive, Sub, SubAssign,
};
use core::slice;

pub use self::bitmap_store::{BitmapIter, BitmapStore, BITMAP_LENGTH};
use self::Store::{Array, Bitmap, Run};

pub(crate) use self::array_store::ArrayStore;
pub(crate) use self::interval_store::{Interval, IntervalStore};
use self::interval_store::RunIter;

use crate::bitmap::container::ARRAY_LIMIT;

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Size in bytes of a fully-materialized bitmap container, used as the
/// comparison baseline when deciding whether run-length encoding pays off.
pub(crate) const BITMAP_BYTES: usize = BITMAP_LENGTH * core::mem::size_of::<u64>();

#[derive(Clone)]
pub(crate) enum Store {
    Array(ArrayStore),
    Bitmap(BitmapStore),
    Run(IntervalStore),
}

#[derive(Clone)]
pub(crate) enum Iter<'a> {
    Array(slice::Iter<'a, u16>),
    Vec(vec::IntoIter<u16>),
    BitmapBorrowed(BitmapIter<&'a [u64; BITMAP_LENGTH]>),
    BitmapOwned(BitmapIter<Box<[u64; BITMAP_LENGTH]>>),
    Run(RunIter),
}

impl Store {
    pub fn new() -> Store {
        Store::Array(ArrayStore::new())
    }

    #[cfg(feature = "std")]
    pub fn with_capacity(capacity: usize) -> Store {
        if capacity <= ARRAY_LIMIT as usize {
            Store::Array(ArrayStore::with_capacity(capacity))
        } else {
            Store::Bitmap(BitmapStore::new())
        }
    }

    pub fn full() -> Store {
        Store::Bitmap(BitmapStore::full())
    }

    pub fn from_lsb0_bytes(bytes: &[u8], byte_offset: usize) -> Option<Self> {
        assert!(byte_offset + bytes.len() <= BITMAP_LENGTH * core::mem::size_of::<u64>());

        // It seems to be pretty considerably faster to count the bits
        // using u64s than for each byte
        let bits_set = {
            let mut bits_set = 0;
            let chunks = bytes.chunks_exact(core::mem::size_of::<u64>());
            let remainder = chunks.remainder();
            for chunk in chunks {
                let chunk = u64::from_ne_bytes(chunk.try_into().unwrap());
                bits_set += u64::from(chunk.count_ones());
            }
            for byte in remainder {
                bits_set += u64::from(byte.count_ones());
            }
            bits_set
        };
        if bits_set == 0 {
            return None;
        }

        Some(if bits_set < ARRAY_LIMIT {
            Array(ArrayStore::from_lsb0_bytes(bytes, byte_offset, bits_set))
        } else {
            Bitmap(BitmapStore::from_lsb0_bytes_unchecked(bytes, byte_offset, bits_set))
        })
    }

    #[inline]
    pub fn insert(&mut self, index: u16) -> bool {
        match self {
            Array(vec) => vec.insert(index),
            Bitmap(bits) => bits.insert(index),
            Run(runs) => runs.insert(index),
        }
    }

    pub fn insert_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        // A Range is defined as being of size 0 if start >= end.
        if range.is_empty() {
            return 0;
        }

        match self {
            Array(vec) => vec.insert_range(range),
            Bitmap(bits) => bits.insert_range(range),
            Run(runs) => runs.insert_range(range),
        }
    }

    /// Push `index` at the end of the store only if `index` is the new max.
    ///
    /// Returns whether `index` was effectively pushed.
    pub fn push(&mut self, index: u16) -> bool {
        match self {
            Array(vec) => vec.push(index),
            Bitmap(bits) => bits.push(index),
            Run(runs) => runs.push(index),
        }
    }

    ///
    /// Pushes `index` at the end of the store.
    /// It is up to the caller to have validated index > self.max()
    ///
    /// # Panics
    ///
    /// If debug_assertions enabled and index is > self.max()
    pub(crate) fn push_unchecked(&mut self, index: u16) {
        match self {
            Array(vec) => vec.push_unchecked(index),
            Bitmap(bits) => bits.push_unchecked(index),
            Run(runs) => runs.push_unchecked(index),
        }
    }

    pub fn remove(&mut self, index: u16) -> bool {
        match self {
            Array(vec) => vec.remove(index),
            Bitmap(bits) => bits.remove(index),
            Run(runs) => runs.remove(index),
        }
    }

    pub fn remove_range(&mut self, range: RangeInclusive<u16>) -> u64 {
        if range.is_empty() {
            return 0;
        }

        match self {
            Array(vec) => vec.remove_range(range),
            Bitmap(bits) => bits.remove_range(range),
            Run(runs) => runs.remove_range(range),
        }
    }

    pub fn remove_smallest(&mut self, index: u64) {
        match self {
            Array(vec) => vec.remove_smallest(index),
            Bitmap(bits) => bits.remove_smallest(index),
            Run(runs) => runs.remove_smallest(index),
        }
    }

    pub fn remove_biggest(&mut self, index: u64) {
        match self {
            Array(vec) => vec.remove_biggest(index),
            Bitmap(bits) => bits.remove_biggest(index),
            Run(runs) => runs.remove_biggest(index),
        }
    }

    pub fn contains(&self, index: u16) -> bool {
        match self {
            Array(vec) => vec.contains(index),
            Bitmap(bits) => bits.contains(index),
            Run(runs) => runs.contains(index),
        }
    }

    pub fn contains_range(&self, range: RangeInclusive<u16>) -> bool {
        match self {
            Array(vec) => vec.contains_range(range),
            Bitmap(bits) => bits.contains_range(range),
            Run(runs) => runs.contains_range(range),
        }
    }

    pub fn is_full(&self) -> bool {
        self.len() == (1 << 16)
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        match (self, other) {
            (Array(vec1), Array(vec2)) => vec1.is_disjoint(vec2),
            (Bitmap(bits1), Bitmap(bits2)) => bits1.is_disjoint(bits2),
            (Array(vec), Bitmap(bits)) | (Bitmap(bits), Array(vec)) => {
                vec.iter().all(|&i| !bits.contains(i))
            }
            (Run(runs1), Run(runs2)) => {
                let (mut i1, mut i2) = (runs1.as_slice().iter(), runs2.as_slice().iter());
                let (mut iv1, mut iv2) = (i1.next(), i2.next());
                loop {
                    match (iv1, iv2) {
                        (Some(v1), Some(v2)) => {
                            if v2.start <= v1.end && v1.start <= v2.end {
                                return false;
                            }

                            match v1.end.cmp(&v2.end) {
                                Ordering::Less => iv1 = i1.next(),
                                Ordering::Greater => iv2 = i2.next(),
                                Ordering::Equal => {
                                    iv1 = i1.next();
                                    iv2 = i2.next();
                                }
                            }
                        }
                        (_, _) => return true,
                    }
                }
            }
            (Run(runs), Array(vec)) | (Array(vec), Run(runs)) => {
                vec.iter().all(|&i| !runs.contains(i))
            }
            (Run(runs), Bitmap(bits)) | (Bitmap(bits), Run(runs)) => {
                runs.to_bitmap().is_disjoint(bits)
            }
        }
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        match (self, other) {
            (Array(vec1), Array(vec2)) => vec1.is_subset(vec2),
            (Bitmap(bits1), Bitmap(bits2)) => bits1.is_subset(bits2),
            (Array(vec), Bitmap(bits)) => vec.iter().all(|&i| bits.contains(i)),
            (Bitmap(..), Array(..)) => false,
            (Array(vec), Run(runs)) => vec.iter().all(|&i| runs.contains(i)),
            (Run(runs), Array(vec)) => runs.iter().all(|i| vec.contains(i)),
            (Bitmap(bits), Run(runs)) => bits.iter().all(|i| runs.contains(i)),
            (Run(runs), Bitmap(bits)) => runs.iter().all(|i| bits.contains(i)),
            (Run(runs1), Run(runs2)) => runs1.iter().all(|i| runs2.contains(i)),
        }
    }

    pub fn intersection_len(&self, other: &Self) -> u64 {
        match (self, other) {
            (Array(vec1), Array(vec2)) => vec1.intersection_len(vec2),
            (Bitmap(bits1), Bitmap(bits2)) => bits1.intersection_len_bitmap(bits2),
            (Array(vec), Bitmap(bits)) | (Bitmap(bits), Array(vec)) => {
                bits.intersection_len_array(vec)
            }
            (Array(vec), Run(runs)) | (Run(runs), Array(vec)) => {
                vec.iter().filter(|&&i| runs.contains(i)).count() as u64
            }
            (Bitmap(bits), Run(runs)) | (Run(runs), Bitmap(bits)) => {
                runs.iter().filter(|&i| bits.contains(i)).count() as u64
            }
            (Run(runs1), Run(runs2)) => runs1.iter().filter(|i| runs2.contains(*i)).count() as u64,
        }
    }

    pub fn len(&self) -> u64 {
        match self {
            Array(vec) => vec.len(),
            Bitmap(bits) => bits.len(),
            Run(runs) => runs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Array(vec) => vec.is_empty(),
            Bitmap(bits) => bits.is_empty(),
            Run(runs) => runs.is_empty(),
        }
    }

    pub fn min(&self) -> Option<u16> {
        match self {
            Array(vec) => vec.min(),
            Bitmap(bits) => bits.min(),
            Run(runs) => runs.min(),
        }
    }

    #[inline]
    pub fn max(&self) -> Option<u16> {
        match self {
            Array(vec) => vec.max(),
            Bitmap(bits) => bits.max(),
            Run(runs) => runs.max(),
        }
    }

    pub fn rank(&self, index: u16) -> u64 {
        match self {
            Array(vec) => vec.rank(index),
            Bitmap(bits) => bits.rank(index),
            Run(runs) => runs.rank(index),
        }
    }

    pub fn select(&self, n: u16) -> Option<u16> {
        match self {
            Array(vec) => vec.select(n),
            Bitmap(bits) => bits.select(n),
            Run(runs) => runs.select(u64::from(n)),
        }
    }

    pub fn count_runs(&self) -> u64 {
        match *self {
            Array(ref vec) => {
                vec.iter()
                    .fold((-2, 0u64), |(prev, runs), &v| {
                        let new = v as i32;
                        if prev + 1 != new {
                            (new, runs + 1)
                        } else {
                            (new, runs)
                        }
                    })
                    .1
            }
            Bitmap(ref bits) => {
                let mut num_runs = 0u64;

                for i in 0..BITMAP_LENGTH - 1 {
                    let word = bits.as_array()[i];
                    let next_word = bits.as_array()[i + 1];
                    num_runs +=
                        ((word << 1) & !word).count_ones() as u64 + ((word >> 63) & !next_word);
                }

                let last = bits.as_array()[BITMAP_LENGTH - 1];
                num_runs += ((last << 1) & !last).count_ones() as u64 + (last >> 63);
                num_runs
            }
            Run(ref runs) => runs.run_count(),
        }
    }

    /// Releases excess capacity in the underlying container, returning the number of bytes
    /// freed.
    pub fn shrink_to_fit(&mut self) -> u64 {
        match self {
            Array(vec) => vec.shrink_to_fit() as u64,
            Bitmap(_) => 0,
            Run(runs) => runs.shrink_to_fit() as u64,
        }
    }

    pub(crate) fn to_bitmap(&self) -> Store {
        match self {
            Array(arr) => Bitmap(arr.to_bitmap_store()),
            Bitmap(_) => self.clone(),
            Run(runs) => Bitmap(runs.to_bitmap()),
        }
    }

    pub(crate) fn to_run(&self) -> Self {
        match *self {
            Array(ref vec) => {
                let mut intervals = Vec::new();
                let mut start = *vec.as_slice().first().unwrap();
                for (idx, &v) in vec.as_slice()[1..].iter().enumerate() {
                    if v - vec.as_slice()[idx] > 1 {
                        intervals.push(Interval::new(start, vec.as_slice()[idx]));
                        start = v
                    }
                }
                intervals.push(Interval::new(start, *vec.as_slice().last().unwrap()));
                Run(IntervalStore::from_vec_unchecked(intervals))
            }
            Bitmap(ref bits) => {
                let mut current = bits.as_array()[0];
                let mut i = 0u16;
                let mut start;
                let mut last;

                let mut intervals = Vec::new();

                loop {
                    // Skip over empty words
                    while current == 0 && i < BITMAP_LENGTH as u16 - 1 {
                        i += 1;
                        current = bits.as_array()[i as usize];
                    }
                    // Reached end of the bitmap without finding anymore bits set
                    if current == 0 {
                        break;
                    }
                    let current_start = current.trailing_zeros() as u16;
                    start = 64 * i + current_start;

                    // Pad LSBs with 1s
                    current |= current - 1;

                    // Find next 0
                    while current == u64::MAX && i < BITMAP_LENGTH as u16 - 1 {
                        i += 1;
                        current = bits.as_array()[i as usize];
                    }

                    // Run continues until end of this container
                    if current == u64::MAX {
                        intervals.push(Interval::new(start, u16::MAX));
                        break;
                    }

                    let current_last = (!current).trailing_zeros() as u16;
                    last = 64 * i + current_last;
                    intervals.push(Interval::new(start, last - 1));

                    // pad LSBs with 0s
                    current &= current + 1;
                }
                Run(IntervalStore::from_vec_unchecked(intervals))
            }
            Run(ref _runs) => panic!("Cannot convert run to run"),
        }
    }
}

/// Merges two sorted, non-overlapping, non-adjacent interval slices into a
/// single sorted, non-overlapping, non-adjacent list (set union).
fn union_intervals(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
    let mut merged = Vec::new();
    let (mut i1, mut i2) = (a.iter(), b.iter());
    let (mut iv1, mut iv2) = (i1.next(), i2.next());
    loop {
        let iv = match (iv1, iv2) {
            (None, None) => break,
            (Some(v1), None) => {
                iv1 = i1.next();
                v1
            }
            (None, Some(v2)) => {
                iv2 = i2.next();
                v2
            }
            (Some(v1), Some(v2)) => match v1.start.cmp(&v2.start) {
                Ordering::Equal => {
                    iv1 = i1.next();
                    iv2 = i2.next();
                    v1
                }
                Ordering::Less => {
                    iv1 = i1.next();
                    v1
                }
                Ordering::Greater => {
                    iv2 = i2.next();
                    v2
                }
            },
        };

        match merged.last_mut() {
            None => merged.push(*iv),
            Some(last) => {
                // Merge when overlapping OR merely adjacent, to keep the
                // non-adjacent-run invariant that `IntervalStore` relies on.
                let touches = last.end.checked_add(1).map_or(true, |next| next >= iv.start);
                if touches {
                    last.end = core::cmp::max(last.end, iv.end);
                } else {
                    merged.push(*iv);
                }
            }
        }
    }
    merged
}

/// Intersects two sorted, non-overlapping interval slices (set intersection).
fn intersect_intervals(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
    let mut merged = Vec::new();
    let (mut i1, mut i2) = (a.iter(), b.iter());
    let (mut iv1, mut iv2) = (i1.next(), i2.next());

    while let (Some(v1), Some(v2)) = (iv1, iv2) {
        if v2.start <= v1.end && v1.start <= v2.end {
            let start = core::cmp::max(v1.start, v2.start);
            let end = core::cmp::min(v1.end, v2.end);
            merged.push(Interval::new(start, end));
        }

        match v1.end.cmp(&v2.end) {
            Ordering::Less => iv1 = i1.next(),
            Ordering::Greater => iv2 = i2.next(),
            Ordering::Equal => {
                iv1 = i1.next();
                iv2 = i2.next();
            }
        }
    }

    merged
}

impl Default for Store {
    fn default() -> Self {
        Store::new()
    }
}

impl BitOr<&Store> for &Store {
    type Output = Store;

    fn bitor(self, rhs: &Store) -> Store {
        match (self, rhs) {
            (Array(vec1), Array(vec2)) => Array(BitOr::bitor(vec1, vec2)),
            (&Bitmap(..), &Array(..)) => {
                let mut lhs = self.clone();
                BitOrAssign::bitor_assign(&mut lhs, rhs);
                lhs
            }
            (&Bitmap(..), &Bitmap(..)) => {
                let mut lhs = self.clone();
                BitOrAssign::bitor_assign(&mut lhs, rhs);
                lhs
            }
            (&Array(..), &Bitmap(..)) => {
                let mut rhs = rhs.clone();
                BitOrAssign::bitor_assign(&mut rhs, self);
                rhs
            }
            (Run(..), _) | (_, Run(..)) => {
                let mut lhs = self.clone();
                BitOrAssign::bitor_assign(&mut lhs, rhs);
                lhs
            }
        }
    }
}

impl BitOrAssign<Store> for Store {
    fn bitor_assign(&mut self, mut rhs: Store) {
        match (self, &mut rhs) {
            (&mut Array(ref mut vec1), &mut Array(ref vec2)) => {
                *vec1 = BitOr::bitor(&*vec1, vec2);
            }
            (&mut Bitmap(ref mut bits1), &mut Array(ref vec2)) => {
                BitOrAssign::bitor_assign(bits1, vec2);
            }
            (&mut Bitmap(ref mut bits1), &mut Bitmap(ref bits2)) => {
                BitOrAssign::bitor_assign(bits1, bits2);
            }
            (this @ &mut Array(..), Run(runs)) => {
                for i in runs.iter() {
                    this.insert(i);
                }
            }
            (this @ &mut Bitmap(..), Run(..)) => {
                let other = rhs.to_bitmap();
                BitOrAssign::bitor_assign(this, other);
            }
            (&mut Run(ref mut runs1), Run(ref runs2)) => {
                let merged = union_intervals(runs1.as_slice(), runs2.as_slice());
                *runs1 = IntervalStore::from_vec_unchecked(merged);
            }
            (this @ &mut Run(..), Array(vec)) => {
                for &i in vec.iter() {
                    this.insert(i);
                }
            }
            (this @ &mut Run(..), Bitmap(..)) => {
                *this = this.to_bitmap();
                BitOrAssign::bitor_assign(this, rhs);
            }
            (this @ &mut Array(..), &mut Bitmap(..)) => {
                mem::swap(this, &mut rhs);
                BitOrAssign::bitor_assign(this, rhs);
            }
        }
    }
}

impl BitOrAssign<&Store> for Store {
    fn bitor_assign(&mut self, rhs: &Store) {
        match (self, rhs) {
            (&mut Array(ref mut vec1), Array(vec2)) => {
                let this = mem::take(vec1);
                *vec1 = BitOr::bitor(&this, vec2);
            }
            (&mut Bitmap(ref mut bits1), Array(vec2)) => {
                BitOrAssign::bitor_assign(bits1, vec2);
            }
            (&mut Bitmap(ref mut bits1), Bitmap(bits2)) => {
                BitOrAssign::bitor_assign(bits1, bits2);
            }
            (this @ &mut Array(..), Bitmap(bits2)) => {
                let mut lhs: Store = Bitmap(bits2.clone());
                BitOrAssign::bitor_assign(&mut lhs, &*this);
                *this = lhs;
            }
            (this @ &mut Array(..), Run(runs)) => {
                for i in runs.iter() {
                    this.insert(i);
                }
            }
            (this @ &mut Bitmap(..), Run(..)) => {
                let other = rhs.to_bitmap();
                BitOrAssign::bitor_assign(this, &other);
            }
            (&mut Run(ref mut runs1), Run(runs2)) => {
                let merged = union_intervals(runs1.as_slice(), runs2.as_slice());
                *runs1 = IntervalStore::from_vec_unchecked(merged);
            }
            (this @ &mut Run(..), Array(vec)) => {
                for &i in vec.iter() {
                    this.insert(i);
                }
            }
            (this @ &mut Run(..), Bitmap(..)) => {
                *this = this.to_bitmap();
                BitOrAssign::bitor_assign(this, rhs);
            }
        }
    }
}

impl BitAnd<&Store> for &Store {
    type Output = Store;

    fn bitand(self, rhs: &Store) -> Store {
        match (self, rhs) {
            (Array(vec1), Array(vec2)) => Array(BitAnd::bitand(vec1, vec2)),
            (&Bitmap(..), &Array(..)) => {
                let mut rhs = rhs.clone();
                BitAndAssign::bitand_assign(&mut rhs, self);
                rhs
            }
            _ => {
                let mut lhs = self.clone();
                BitAndAssign::bitand_assign(&mut lhs, rhs);
                lhs
            }
        }
    }
}

impl BitAndAssign<Store> for Store {
    #[allow(clippy::suspicious_op_assign_impl)]
    fn bitand_assign(&mut self, mut rhs: Store) {
        match (self, &mut rhs) {
            (&mut Array(ref mut vec1), &mut Array(ref mut vec2)) => {
                if vec2.len() < vec1.len() {
                    mem::swap(vec1, vec2);
                }
                BitAndAssign::bitand_assign(vec1, &*vec2);
            }
            (&mut Array(ref mut vec), Run(runs)) => {
                vec.retain(|i| runs.contains(i));
            }
            (&mut Bitmap(ref mut bits1), &mut Bitmap(ref bits2)) => {
                BitAndAssign::bitand_assign(bits1, bits2);
            }
            (&mut Array(ref mut vec1), &mut Bitmap(ref bits2)) => {
                BitAndAssign::bitand_assign(vec1, bits2);
            }
            (this @ &mut Bitmap(..), Run(..)) => {
                let other = rhs.to_bitmap();
                BitAndAssign::bitand_assign(this, other);
            }
            (&mut Run(ref mut runs1), Run(ref runs2)) => {
                let merged = intersect_intervals(runs1.as_slice(), runs2.as_slice());
                *runs1 = IntervalStore::from_vec_unchecked(merged);
            }
            (this @ &mut Run(..), other @ Array(..)) => {
                let new = other.clone();
                BitAndAssign::bitand_assign(this, new);
            }
            (this @ &mut Run(..), other @ Bitmap(..)) => {
                let new = other.clone();
                BitAndAssign::bitand_assign(this, new);
            }
            (this @ &mut Bitmap(..), &mut Array(..)) => {
                mem::swap(this, &mut rhs);
                BitAndAssign::bitand_assign(this, rhs);
            }
        }
    }
}

impl BitAndAssign<&Store> for Store {
    #[allow(clippy::suspicious_op_assign_impl)]
    fn bitand_assign(&mut self, rhs: &Store) {
        match (self, rhs) {
            (&mut Array(ref mut vec1), Array(vec2)) => {
                let (mut lhs, rhs) = if vec2.len() < vec1.len() {
                    (vec2.clone(), &*vec1)
                } else {
                    (mem::take(vec1), vec2)
                };

                BitAndAssign::bitand_assign(&mut lhs, rhs);
                *vec1 = lhs;
            }
            (&mut Bitmap(ref mut bits1), Bitmap(bits2)) => {
                BitAndAssign::bitand_assign(bits1, bits2);
            }
            (&mut Array(ref mut vec1), Bitmap(bits2)) => {
                BitAndAssign::bitand_assign(vec1, bits2);
            }
            (this @ &mut Bitmap(..), &Array(..)) => {
                let mut new = rhs.clone();
                BitAndAssign::bitand_assign(&mut new, &*this);
                *this = new;
            }
            (&mut Array(ref mut vec), Run(runs)) => {
                vec.retain(|i| runs.contains(i));
            }
            (this @ &mut Bitmap(..), Run(..)) => {
                let other = rhs.to_bitmap();
                BitAndAssign::bitand_assign(this, &other);
            }
            (&mut Run(ref mut runs1), Run(runs2)) => {
                let merged = intersect_intervals(runs1.as_slice(), runs2.as_slice());
                *runs1 = IntervalStore::from_vec_unchecked(merged);
            }
            (this @ &mut Run(..), other @ Array(..)) => {
                let new = other.clone();
                BitAndAssign::bitand_assign(this, new);
            }
            (this @ &mut Run(..), other @ Bitmap(..)) => {
                let new = other.clone();
                BitAndAssign::bitand_assign(this, new);
            }
        }
    }
}

impl Sub<&Store> for &Store {
    type Output = Store;

    fn sub(self, rhs: &Store) -> Store {
        match (self, rhs) {
            (Array(vec1), Array(vec2)) => Array(Sub::sub(vec1, vec2)),
            _ => {
                let mut lhs = self.clone();
                SubAssign::sub_assign(&mut lhs, rhs);
                lhs
            }
        }
    }
}

impl SubAssign<&Store> for Store {
    fn sub_assign(&mut self, rhs: &Store) {
        match (self, rhs) {
            (&mut Array(ref mut vec1), Array(vec2)) => {
                SubAssign::sub_assign(vec1, vec2);
            }
            (&mut Array(ref mut vec), Run(runs)) => {
                vec.retain(|i| !runs.contains(i));
            }
            (&mut Bitmap(ref mut bits1), Array(vec2)) => {
                SubAssign::sub_assign(bits1, vec2);
            }
            (&mut Bitmap(ref mut bits1), Bitmap(bits2)) => {
                SubAssign::sub_assign(bits1, bits2);
            }
            (&mut Array(ref mut vec1), Bitmap(bits2)) => {
                SubAssign::sub_assign(vec1, bits2);
            }
            (this @ &mut Bitmap(..), Run(runs)) => {
                for iv in runs.as_slice() {
                    this.remove_range(iv.start()..=iv.end());
                }
            }
            (this @ &mut Run(..), Run(runs2)) => {
                for iv in runs2.as_slice() {
                    this.remove_range(iv.start()..=iv.end());
                }
            }
            (this @ &mut Run(..), Array(vec)) => {
                for &i in vec.iter() {
                    this.remove(i);
                }
            }
            (this @ &mut Run(..), Bitmap(..)) => {
                *this = this.to_bitmap();
                SubAssign::sub_assign(this, rhs);
            }
        }
    }
}

impl BitXor<&Store> for &Store {
    type Output = Store;

    fn bitxor(self, rhs: &Store) -> Store {
        match (self, rhs) {
            (Array(vec1), Array(vec2)) => Array(BitXor::bitxor(vec1, vec2)),
            (&Array(..), &Bitmap(..)) => {
                let mut lhs = rhs.clone();
                BitXorAssign::bitxor_assign(&mut lhs, self);
                lhs
            }
            _ => {
                let mut lhs = self.clone();
                BitXorAssign::bitxor_assign(&mut lhs, rhs);
                lhs
            }
        }
    }
}

impl BitXorAssign<Store> for Store {
    fn bitxor_assign(&mut self, mut rhs: Store) {
        match (self, &mut rhs) {
            (&mut Array(ref mut vec1), &mut Array(ref vec2)) => {
                *vec1 = BitXor::bitxor(&*vec1, vec2);
            }
            (&mut Bitmap(ref mut bits1), &mut Array(ref vec2)) => {
                BitXorAssign::bitxor_assign(bits1, vec2);
            }
            (&mut Bitmap(ref mut bits1), &mut Bitmap(ref bits2)) => {
                BitXorAssign::bitxor_assign(bits1, bits2);
            }
            (this @ &mut Array(..), &mut Bitmap(..)) => {
                mem::swap(this, &mut rhs);
                BitXorAssign::bitxor_assign(this, rhs);
            }
            (this @ &mut Array(..), Run(..)) => {
                *this = this.to_bitmap();
                let other = rhs.to_bitmap();
                BitXorAssign::bitxor_assign(this, other);
            }
            (this @ &mut Bitmap(..), Run(..)) => {
                let other = rhs.to_bitmap();
                BitXorAssign::bitxor_assign(this, other);
            }
            (this @ &mut Run(..), _) => {
                *this = this.to_bitmap();
                BitXorAssign::bitxor_assign(this, rhs);
            }
        }
    }
}

impl BitXorAssign<&Store> for Store {
    fn bitxor_assign(&mut self, rhs: &Store) {
        match (self, rhs) {
            (&mut Array(ref mut vec1), Array(vec2)) => {
                let this = mem::take(vec1);
                *vec1 = BitXor::bitxor(&this, vec2);
            }
            (&mut Bitmap(ref mut bits1), Array(vec2)) => {
                BitXorAssign::bitxor_assign(bits1, vec2);
            }
            (&mut Bitmap(ref mut bits1), Bitmap(bits2)) => {
                BitXorAssign::bitxor_assign(bits1, bits2);
            }
            (this @ &mut Array(..), Bitmap(bits2)) => {
                let mut lhs: Store = Bitmap(bits2.clone());
                BitXorAssign::bitxor_assign(&mut lhs, &*this);
                *this = lhs;
            }
            (this @ &mut Array(..), Run(..)) => {
                *this = this.to_bitmap();
                let other = rhs.to_bitmap();
                BitXorAssign::bitxor_assign(this, &other);
            }
            (this @ &mut Bitmap(..), Run(..)) => {
                let other = rhs.to_bitmap();
                BitXorAssign::bitxor_assign(this, &other);
            }
            (this @ &mut Run(..), _) => {
                *this = this.to_bitmap();
                BitXorAssign::bitxor_assign(this, rhs);
            }
        }
    }
}

impl<'a> IntoIterator for &'a Store {
    type Item = u16;
    type IntoIter = Iter<'a>;
    fn into_iter(self) -> Iter<'a> {
        match self {
            Array(vec) => Iter::Array(vec.iter()),
            Bitmap(bits) => Iter::BitmapBorrowed(bits.iter()),
            Run(runs) => Iter::Run(runs.iter()),
        }
    }
}

impl IntoIterator for Store {
    type Item = u16;
    type IntoIter = Iter<'static>;
    fn into_iter(self) -> Iter<'static> {
        match self {
            Array(vec) => Iter::Vec(vec.into_iter()),
            Bitmap(bits) => Iter::BitmapOwned(bits.into_iter()),
            Run(runs) => Iter::Run(runs.into_iter()),
        }
    }
}

impl PartialEq for Store {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Array(vec1), Array(vec2)) => vec1 == vec2,
            (Bitmap(bits1), Bitmap(bits2)) => {
                bits1.len() == bits2.len()
                    && bits1.iter().zip(bits2.iter()).all(|(i1, i2)| i1 == i2)
            }
            (Run(runs1), Run(runs2)) => runs1 == runs2,
            _ => false,
        }
    }
}

impl Iter<'_> {
    /// Advance the iterator to the first value greater than or equal to `n`.
    pub(crate) fn advance_to(&mut self, n: u16) {
        match self {
            Iter::Array(inner) => {
                let skip = inner.as_slice().partition_point(|&i| i < n);
                if let Some(nth) = skip.checked_sub(1) {
                    inner.nth(nth);
                }
            }
            Iter::Vec(inner) => {
                let skip = inner.as_slice().partition_point(|&i| i < n);
                if let Some(nth) = skip.checked_sub(1) {
                    inner.nth(nth);
                }
            }
            Iter::BitmapBorrowed(inner) => inner.advance_to(n),
            Iter::BitmapOwned(inner) => inner.advance_to(n),
            Iter::Run(inner) => inner.advance_to(n),
        }
    }

    pub(crate) fn advance_back_to(&mut self, n: u16) {
        match self {
            Iter::Array(inner) => {
                let slice = inner.as_slice();
                let from_front = slice.partition_point(|&i| i <= n);
                let skip = slice.len() - from_front;
                if let Some(nth) = skip.checked_sub(1) {
                    inner.nth_back(nth);
                }
            }
            Iter::Vec(inner) => {
                let slice = inner.as_slice();
                let from_front = slice.partition_point(|&i| i <= n);
                let skip = slice.len() - from_front;
                if let Some(nth) = skip.checked_sub(1) {
                    inner.nth_back(nth);
                }
            }
            Iter::BitmapBorrowed(inner) => inner.advance_back_to(n),
            Iter::BitmapOwned(inner) => inner.advance_back_to(n),
            Iter::Run(inner) => inner.advance_back_to(n),
        }
    }

    /// Returns the next value without consuming it.
    pub(crate) fn peek(&self) -> Option<u16> {
        match self {
            Iter::Array(inner) => inner.as_slice().first().copied(),
            Iter::Vec(inner) => inner.as_slice().first().copied(),
            Iter::BitmapBorrowed(inner) => inner.clone().next(),
            Iter::BitmapOwned(inner) => inner.clone().next(),
            Iter::Run(inner) => inner.peek(),
        }
    }

    /// Returns the last value without consuming it.
    pub(crate) fn peek_back(&self) -> Option<u16> {
        match self {
            Iter::Array(inner) => inner.as_slice().last().copied(),
            Iter::Vec(inner) => inner.as_slice().last().copied(),
            Iter::BitmapBorrowed(inner) => inner.clone().next_back(),
            Iter::BitmapOwned(inner) => inner.clone().next_back(),
            Iter::Run(inner) => inner.peek_back(),
        }
    }

    /// Consumes and returns the maximal range of consecutive values starting
    /// at the current front of the iterator.
    pub(crate) fn next_range(&mut self) -> Option<RangeInclusive<u16>> {
        if let Iter::Run(inner) = self {
            return inner.next_range();
        }
        let start = self.next()?;
        let mut end = start;
        while let Some(next) = self.peek() {
            match end.checked_add(1) {
                Some(expected) if next == expected => {
                    end = next;
                    self.next();
                }
                _ => break,
            }
        }
        Some(start..=end)
    }

    /// Consumes and returns the maximal range of consecutive values ending at
    /// the current back of the iterator.
    pub(crate) fn next_range_back(&mut self) -> Option<RangeInclusive<u16>> {
        if let Iter::Run(inner) = self {
            return inner.next_range_back();
        }
        let end = self.next_back()?;
        let mut start = end;
        while let Some(prev) = self.peek_back() {
            match start.checked_sub(1) {
                Some(expected) if prev == expected => {
                    start = prev;
                    self.next_back();
                }
                _ => break,
            }
        }
        Some(start..=end)
    }
}

impl Iterator for Iter<'_> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        match self {
            Iter::Array(inner) => inner.next().cloned(),
            Iter::Vec(inner) => inner.next(),
            Iter::BitmapBorrowed(inner) => inner.next(),
            Iter::BitmapOwned(inner) => inner.next(),
            Iter::Run(inner) => inner.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Iter::Array(inner) => inner.size_hint(),
            Iter::Vec(inner) => inner.size_hint(),
            Iter::BitmapBorrowed(inner) => inner.size_hint(),
            Iter::BitmapOwned(inner) => inner.size_hint(),
            Iter::Run(inner) => inner.size_hint(),
        }
    }

    fn count(self) -> usize
    where
        Self: Sized,
    {
        match self {
            Iter::Array(inner) => inner.count(),
            Iter::Vec(inner) => inner.count(),
            Iter::BitmapBorrowed(inner) => inner.count(),
            Iter::BitmapOwned(inner) => inner.count(),
            Iter::Run(inner) => inner.count(),
        }
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        match self {
            Iter::Array(inner) => inner.nth(n).copied(),
            Iter::Vec(inner) => inner.nth(n),
            Iter::BitmapBorrowed(inner) => inner.nth(n),
            Iter::BitmapOwned(inner) => inner.nth(n),
            Iter::Run(inner) => inner.nth(n),
        }
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        match self {
            Iter::Array(inner) => inner.next_back().cloned(),
            Iter::Vec(inner) => inner.next_back(),
            Iter::BitmapBorrowed(inner) => inner.next_back(),
            Iter::BitmapOwned(inner) => inner.next_back(),
            Iter::Run(inner) => inner.next_back(),
        }
    }
}

impl ExactSizeIterator for Iter<'_> {}
