//! Tree flattening: the static/dynamic field split
//!
//! Operators and kernels are trees of fields. Dynamic fields hold the numeric
//! payload a gradient engine differentiates and an optimiser updates; static
//! fields hold structure (shapes, dtypes, sizes, flags) and are never exposed.
//!
//! [`Flatten::flatten`] lists the dynamic leaves in field declaration order and
//! [`Flatten::unflatten`] rebuilds the value from a new set of leaves while
//! copying every static field from `self`. Matrix-valued fields are laid out
//! column-major, matching nalgebra's storage order.
//!
//! # Example
//!
//! ```rust
//! use gp_core::{Flatten, LeafCursor, Result, Static};
//!
//! #[derive(Clone)]
//! struct Fields {
//!     a: f64,
//!     b: Static<i32>,
//!     c: f64,
//! }
//!
//! impl Flatten<f64> for Fields {
//!     fn flatten(&self) -> Vec<f64> {
//!         vec![self.a, self.c]
//!     }
//!
//!     fn unflatten(&self, leaves: &[f64]) -> Result<Self> {
//!         let mut cursor = LeafCursor::new(leaves);
//!         let a = cursor.take_scalar()?;
//!         let c = cursor.take_scalar()?;
//!         cursor.finish()?;
//!         Ok(Self { a, b: self.b, c })
//!     }
//! }
//!
//! let fields = Fields { a: 1.0, b: Static(2), c: 3.0 };
//! assert_eq!(fields.flatten(), vec![1.0, 3.0]);
//! ```

use crate::{Element, Error, Result};
use nalgebra::{DMatrix, DVector};
use std::ops::Deref;

/// Values that expose their dynamic leaves
pub trait Flatten<T: Element> {
    /// Dynamic leaves in declaration order
    fn flatten(&self) -> Vec<T>;

    /// Rebuild from new dynamic leaves, keeping static fields from `self`
    ///
    /// Fails with [`Error::LeafCount`] when `leaves` does not have exactly
    /// [`num_leaves`](Flatten::num_leaves) entries.
    fn unflatten(&self, leaves: &[T]) -> Result<Self>
    where
        Self: Sized;

    /// Number of dynamic leaves
    fn num_leaves(&self) -> usize {
        self.flatten().len()
    }
}

/// Marker for a static field
///
/// Wrapping a field in `Static` documents that it is structure, not payload.
/// [`Flatten`] implementations skip it and `unflatten` copies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Static<T>(pub T);

impl<T> Static<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Static<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// Sequential reader over a leaf slice, used by `unflatten` implementations
#[derive(Debug)]
pub struct LeafCursor<'a, T> {
    leaves: &'a [T],
    pos: usize,
}

impl<'a, T: Element> LeafCursor<'a, T> {
    pub fn new(leaves: &'a [T]) -> Self {
        Self { leaves, pos: 0 }
    }

    /// Take the next `n` leaves
    pub fn take(&mut self, n: usize) -> Result<&'a [T]> {
        let end = self.pos + n;
        if end > self.leaves.len() {
            return Err(Error::LeafCount {
                expected: end,
                actual: self.leaves.len(),
            });
        }
        let slice = &self.leaves[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn take_scalar(&mut self) -> Result<T> {
        Ok(self.take(1)?[0])
    }

    pub fn take_vector(&mut self, len: usize) -> Result<DVector<T>> {
        Ok(DVector::from_column_slice(self.take(len)?))
    }

    /// Take an `nrows x ncols` matrix stored column-major
    pub fn take_matrix(&mut self, nrows: usize, ncols: usize) -> Result<DMatrix<T>> {
        Ok(DMatrix::from_column_slice(nrows, ncols, self.take(nrows * ncols)?))
    }

    /// Leaves not yet consumed
    pub fn remaining(&self) -> usize {
        self.leaves.len() - self.pos
    }

    /// Ensure every leaf was consumed
    pub fn finish(self) -> Result<()> {
        if self.pos != self.leaves.len() {
            return Err(Error::LeafCount {
                expected: self.pos,
                actual: self.leaves.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_reads_in_order() {
        let leaves = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let mut cursor = LeafCursor::new(&leaves);

        assert_eq!(cursor.take_scalar().unwrap(), 1.0);
        let v = cursor.take_vector(2).unwrap();
        assert_eq!(v.as_slice(), &[2.0, 3.0]);
        let m = cursor.take_matrix(2, 2).unwrap();
        // column-major
        assert_eq!(m[(0, 0)], 4.0);
        assert_eq!(m[(1, 0)], 5.0);
        assert_eq!(m[(0, 1)], 6.0);
        assert_eq!(cursor.remaining(), 0);
        cursor.finish().unwrap();
    }

    #[test]
    fn test_cursor_too_few_leaves() {
        let leaves = [1.0f32, 2.0];
        let mut cursor = LeafCursor::new(&leaves);
        match cursor.take(3) {
            Err(Error::LeafCount { expected, actual }) => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("expected LeafCount error, got {other:?}"),
        }
    }

    #[test]
    fn test_cursor_leftover_leaves() {
        let leaves = [1.0, 2.0, 3.0];
        let mut cursor = LeafCursor::new(&leaves);
        cursor.take(2).unwrap();
        assert!(matches!(
            cursor.finish(),
            Err(Error::LeafCount { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_static_deref() {
        let size = Static(5usize);
        assert_eq!(*size, 5);
        assert_eq!(size.into_inner(), 5);
    }
}
