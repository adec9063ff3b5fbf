//! Scalar (non-SIMD) merge-based set algebra over sorted `u16` slices.
//!
//! Used directly when the `simd` feature is disabled, and as the tail handler
//! for the vectorized kernels in [`super::vector`].

use super::visitor::BinaryOperationVisitor;

pub fn or(lhs: &[u16], rhs: &[u16], visitor: &mut impl BinaryOperationVisitor) {
    let (mut i, mut j) = (0, 0);
    while i < lhs.len() && j < rhs.len() {
        let (a, b) = (lhs[i], rhs[j]);
        match a.cmp(&b) {
            core::cmp::Ordering::Less => {
                visitor.visit_scalar(a);
                i += 1;
            }
            core::cmp::Ordering::Greater => {
                visitor.visit_scalar(b);
                j += 1;
            }
            core::cmp::Ordering::Equal => {
                visitor.visit_scalar(a);
                i += 1;
                j += 1;
            }
        }
    }
    if i < lhs.len() {
        visitor.visit_slice(&lhs[i..]);
    }
    if j < rhs.len() {
        visitor.visit_slice(&rhs[j..]);
    }
}

pub fn and(lhs: &[u16], rhs: &[u16], visitor: &mut impl BinaryOperationVisitor) {
    let (mut i, mut j) = (0, 0);
    while i < lhs.len() && j < rhs.len() {
        let (a, b) = (lhs[i], rhs[j]);
        match a.cmp(&b) {
            core::cmp::Ordering::Less => i += 1,
            core::cmp::Ordering::Greater => j += 1,
            core::cmp::Ordering::Equal => {
                visitor.visit_scalar(a);
                i += 1;
                j += 1;
            }
        }
    }
}

pub fn sub(lhs: &[u16], rhs: &[u16], visitor: &mut impl BinaryOperationVisitor) {
    let (mut i, mut j) = (0, 0);
    while i < lhs.len() && j < rhs.len() {
        let (a, b) = (lhs[i], rhs[j]);
        match a.cmp(&b) {
            core::cmp::Ordering::Less => {
                visitor.visit_scalar(a);
                i += 1;
            }
            core::cmp::Ordering::Greater => j += 1,
            core::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    if i < lhs.len() {
        visitor.visit_slice(&lhs[i..]);
    }
}

pub fn xor(lhs: &[u16], rhs: &[u16], visitor: &mut impl BinaryOperationVisitor) {
    let (mut i, mut j) = (0, 0);
    while i < lhs.len() && j < rhs.len() {
        let (a, b) = (lhs[i], rhs[j]);
        match a.cmp(&b) {
            core::cmp::Ordering::Less => {
                visitor.visit_scalar(a);
                i += 1;
            }
            core::cmp::Ordering::Greater => {
                visitor.visit_scalar(b);
                j += 1;
            }
            core::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    if i < lhs.len() {
        visitor.visit_slice(&lhs[i..]);
    }
    if j < rhs.len() {
        visitor.visit_slice(&rhs[j..]);
    }
}
