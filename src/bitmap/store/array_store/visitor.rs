//! Visitors used by [`super::scalar`] and [`super::vector`] set-algebra kernels.
//!
//! Each binary operation (`and`/`or`/`sub`/`xor`) streams its result through a
//! [`BinaryOperationVisitor`] rather than building a `Vec<u16>` directly, so that
//! callers interested only in the cardinality of the result can skip the allocation.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

#[cfg(feature = "simd")]
use core::simd::u16x8;

pub trait BinaryOperationVisitor {
    #[cfg(feature = "simd")]
    fn visit_vector(&mut self, value: u16x8, mask: u8) {
        let array = value.to_array();
        let mut m = mask;
        while m != 0 {
            let i = m.trailing_zeros() as usize;
            self.visit_scalar(array[i]);
            m &= m - 1;
        }
    }

    fn visit_scalar(&mut self, value: u16);

    fn visit_slice(&mut self, values: &[u16]) {
        for &value in values {
            self.visit_scalar(value);
        }
    }
}

/// Counts the number of values visited, without retaining them.
pub struct CardinalityCounter {
    count: u64,
}

impl CardinalityCounter {
    pub fn new() -> CardinalityCounter {
        CardinalityCounter { count: 0 }
    }

    pub fn into_inner(self) -> u64 {
        self.count
    }
}

impl BinaryOperationVisitor for CardinalityCounter {
    fn visit_scalar(&mut self, _value: u16) {
        self.count += 1;
    }

    fn visit_slice(&mut self, values: &[u16]) {
        self.count += values.len() as u64;
    }
}

/// Collects the values visited into a `Vec<u16>`.
pub struct VecWriter {
    vec: Vec<u16>,
}

impl VecWriter {
    pub fn new(capacity: usize) -> VecWriter {
        VecWriter { vec: Vec::with_capacity(capacity) }
    }

    pub fn into_inner(self) -> Vec<u16> {
        self.vec
    }
}

impl BinaryOperationVisitor for VecWriter {
    fn visit_scalar(&mut self, value: u16) {
        self.vec.push(value);
    }

    fn visit_slice(&mut self, values: &[u16]) {
        self.vec.extend_from_slice(values);
    }
}
