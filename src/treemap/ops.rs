use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};

use crate::{RoaringBitmap, RoaringTreemap};

impl RoaringTreemap {
    /// Unions in-place with the specified other treemap.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let mut rb1: RoaringTreemap = (1..4).collect();
    /// let rb2: RoaringTreemap = (3..5).collect();
    /// let rb3: RoaringTreemap = (1..5).collect();
    ///
    /// rb1.union_with(&rb2);
    /// assert_eq!(rb1, rb3);
    /// ```
    pub fn union_with(&mut self, other: &RoaringTreemap) {
        BitOrAssign::bitor_assign(self, other)
    }

    /// Intersects in-place with the specified other treemap.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let mut rb1: RoaringTreemap = (1..4).collect();
    /// let rb2: RoaringTreemap = (3..5).collect();
    /// let rb3: RoaringTreemap = (3..4).collect();
    ///
    /// rb1.intersect_with(&rb2);
    /// assert_eq!(rb1, rb3);
    /// ```
    pub fn intersect_with(&mut self, other: &RoaringTreemap) {
        BitAndAssign::bitand_assign(self, other)
    }

    /// Removes all values in the specified other treemap from self, in-place.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let mut rb1: RoaringTreemap = (1..4).collect();
    /// let rb2: RoaringTreemap = (3..5).collect();
    /// let rb3: RoaringTreemap = (1..3).collect();
    ///
    /// rb1.difference_with(&rb2);
    /// assert_eq!(rb1, rb3);
    /// ```
    pub fn difference_with(&mut self, other: &RoaringTreemap) {
        SubAssign::sub_assign(self, other)
    }

    /// Replaces this treemap with one that is equivalent to `self XOR other`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use roaring64::RoaringTreemap;
    ///
    /// let mut rb1: RoaringTreemap = (1..4).collect();
    /// let rb2: RoaringTreemap = (3..6).collect();
    /// let rb3: RoaringTreemap = (1..3).chain(4..6).collect();
    ///
    /// rb1.symmetric_difference_with(&rb2);
    /// assert_eq!(rb1, rb3);
    /// ```
    pub fn symmetric_difference_with(&mut self, other: &RoaringTreemap) {
        BitXorAssign::bitxor_assign(self, other)
    }
}

impl BitOr<RoaringTreemap> for RoaringTreemap {
    type Output = RoaringTreemap;

    fn bitor(mut self, rhs: RoaringTreemap) -> RoaringTreemap {
        BitOrAssign::bitor_assign(&mut self, rhs);
        self
    }
}

impl BitOr<&RoaringTreemap> for RoaringTreemap {
    type Output = RoaringTreemap;

    fn bitor(mut self, rhs: &RoaringTreemap) -> RoaringTreemap {
        BitOrAssign::bitor_assign(&mut self, rhs);
        self
    }
}

impl BitOr<RoaringTreemap> for &RoaringTreemap {
    type Output = RoaringTreemap;

    fn bitor(self, rhs: RoaringTreemap) -> RoaringTreemap {
        rhs | self
    }
}

impl BitOr<&RoaringTreemap> for &RoaringTreemap {
    type Output = RoaringTreemap;

    fn bitor(self, rhs: &RoaringTreemap) -> RoaringTreemap {
        self.clone() | rhs
    }
}

impl BitOrAssign<RoaringTreemap> for RoaringTreemap {
    fn bitor_assign(&mut self, rhs: RoaringTreemap) {
        for (key, other_bitmap) in rhs.map {
            match self.map.get_mut(&key) {
                Some(bitmap) => BitOrAssign::bitor_assign(bitmap, other_bitmap),
                None => {
                    self.map.insert(key, other_bitmap);
                }
            }
        }
    }
}

impl BitOrAssign<&RoaringTreemap> for RoaringTreemap {
    fn bitor_assign(&mut self, rhs: &RoaringTreemap) {
        for (&key, other_bitmap) in &rhs.map {
            match self.map.get_mut(&key) {
                Some(bitmap) => BitOrAssign::bitor_assign(bitmap, other_bitmap),
                None => {
                    self.map.insert(key, other_bitmap.clone());
                }
            }
        }
    }
}

impl BitAnd<RoaringTreemap> for RoaringTreemap {
    type Output = RoaringTreemap;

    fn bitand(mut self, rhs: RoaringTreemap) -> RoaringTreemap {
        BitAndAssign::bitand_assign(&mut self, rhs);
        self
    }
}

impl BitAnd<&RoaringTreemap> for RoaringTreemap {
    type Output = RoaringTreemap;

    fn bitand(mut self, rhs: &RoaringTreemap) -> RoaringTreemap {
        BitAndAssign::bitand_assign(&mut self, rhs);
        self
    }
}

impl BitAnd<RoaringTreemap> for &RoaringTreemap {
    type Output = RoaringTreemap;

    fn bitand(self, rhs: RoaringTreemap) -> RoaringTreemap {
        rhs & self
    }
}

impl BitAnd<&RoaringTreemap> for &RoaringTreemap {
    type Output = RoaringTreemap;

    fn bitand(self, rhs: &RoaringTreemap) -> RoaringTreemap {
        self.clone() & rhs
    }
}

impl BitAndAssign<RoaringTreemap> for RoaringTreemap {
    fn bitand_assign(&mut self, rhs: RoaringTreemap) {
        // We want to avoid cloning the internal bitmaps so we don't use `retain`-style code
        // and instead only keep the keys that exist on both sides.
        let mut rhs = rhs.map;
        self.map.retain(|key, bitmap| match rhs.remove(key) {
            Some(other_bitmap) => {
                BitAndAssign::bitand_assign(bitmap, other_bitmap);
                !bitmap.is_empty()
            }
            None => false,
        });
    }
}

impl BitAndAssign<&RoaringTreemap> for RoaringTreemap {
    fn bitand_assign(&mut self, rhs: &RoaringTreemap) {
        self.map.retain(|key, bitmap| match rhs.map.get(key) {
            Some(other_bitmap) => {
                BitAndAssign::bitand_assign(bitmap, other_bitmap);
                !bitmap.is_empty()
            }
            None => false,
        });
    }
}

impl Sub<RoaringTreemap> for RoaringTreemap {
    type Output = RoaringTreemap;

    fn sub(mut self, rhs: RoaringTreemap) -> RoaringTreemap {
        SubAssign::sub_assign(&mut self, &rhs);
        self
    }
}

impl Sub<&RoaringTreemap> for RoaringTreemap {
    type Output = RoaringTreemap;

    fn sub(mut self, rhs: &RoaringTreemap) -> RoaringTreemap {
        SubAssign::sub_assign(&mut self, rhs);
        self
    }
}

impl Sub<RoaringTreemap> for &RoaringTreemap {
    type Output = RoaringTreemap;

    fn sub(self, rhs: RoaringTreemap) -> RoaringTreemap {
        self.clone() - rhs
    }
}

impl Sub<&RoaringTreemap> for &RoaringTreemap {
    type Output = RoaringTreemap;

    fn sub(self, rhs: &RoaringTreemap) -> RoaringTreemap {
        self.clone() - rhs
    }
}

impl SubAssign<RoaringTreemap> for RoaringTreemap {
    fn sub_assign(&mut self, rhs: RoaringTreemap) {
        SubAssign::sub_assign(self, &rhs)
    }
}

impl SubAssign<&RoaringTreemap> for RoaringTreemap {
    fn sub_assign(&mut self, rhs: &RoaringTreemap) {
        self.map.retain(|key, bitmap| match rhs.map.get(key) {
            Some(other_bitmap) => {
                SubAssign::sub_assign(bitmap, other_bitmap);
                !bitmap.is_empty()
            }
            None => true,
        });
    }
}

impl BitXor<RoaringTreemap> for RoaringTreemap {
    type Output = RoaringTreemap;

    fn bitxor(mut self, rhs: RoaringTreemap) -> RoaringTreemap {
        BitXorAssign::bitxor_assign(&mut self, rhs);
        self
    }
}

impl BitXor<&RoaringTreemap> for RoaringTreemap {
    type Output = RoaringTreemap;

    fn bitxor(mut self, rhs: &RoaringTreemap) -> RoaringTreemap {
        BitXorAssign::bitxor_assign(&mut self, rhs);
        self
    }
}

impl BitXor<RoaringTreemap> for &RoaringTreemap {
    type Output = RoaringTreemap;

    fn bitxor(self, rhs: RoaringTreemap) -> RoaringTreemap {
        rhs ^ self
    }
}

impl BitXor<&RoaringTreemap> for &RoaringTreemap {
    type Output = RoaringTreemap;

    fn bitxor(self, rhs: &RoaringTreemap) -> RoaringTreemap {
        self.clone() ^ rhs
    }
}

impl BitXorAssign<RoaringTreemap> for RoaringTreemap {
    fn bitxor_assign(&mut self, rhs: RoaringTreemap) {
        for (key, other_bitmap) in rhs.map {
            match self.map.get_mut(&key) {
                Some(bitmap) => BitXorAssign::bitxor_assign(bitmap, other_bitmap),
                None => {
                    self.map.insert(key, other_bitmap);
                    continue;
                }
            }
            if self.map.get(&key).is_some_and(RoaringBitmap::is_empty) {
                self.map.remove(&key);
            }
        }
    }
}

impl BitXorAssign<&RoaringTreemap> for RoaringTreemap {
    fn bitxor_assign(&mut self, rhs: &RoaringTreemap) {
        for (&key, other_bitmap) in &rhs.map {
            match self.map.get_mut(&key) {
                Some(bitmap) => BitXorAssign::bitxor_assign(bitmap, other_bitmap),
                None => {
                    self.map.insert(key, other_bitmap.clone());
                    continue;
                }
            }
            if self.map.get(&key).is_some_and(RoaringBitmap::is_empty) {
                self.map.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::RoaringTreemap;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn union_commutative(a in RoaringTreemap::arbitrary(), b in RoaringTreemap::arbitrary()) {
            prop_assert_eq!(&a | &b, &b | &a);
        }

        #[test]
        fn intersection_commutative(a in RoaringTreemap::arbitrary(), b in RoaringTreemap::arbitrary()) {
            prop_assert_eq!(&a & &b, &b & &a);
        }

        #[test]
        fn difference_is_subset(a in RoaringTreemap::arbitrary(), b in RoaringTreemap::arbitrary()) {
            prop_assert!((&a - &b).is_subset(&a));
        }

        #[test]
        fn xor_xor_is_identity(a in RoaringTreemap::arbitrary(), b in RoaringTreemap::arbitrary()) {
            prop_assert_eq!((&a ^ &b) ^ &b, a);
        }
    }
}
