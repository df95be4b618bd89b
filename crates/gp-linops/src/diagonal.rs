//! Diagonal linear operator

use crate::operator::{check_diagonal_len, check_rhs, square_shape};
use crate::LinearOperator;
use gp_core::{Element, Error, Flatten, LeafCursor, Result, Shape, Static};
use nalgebra::{DMatrix, DVector};
use std::ops::Mul;
use tracing::debug;

/// Square operator `diag(d)`, storing only the diagonal
///
/// The diagonal entries are the dynamic leaves.
///
/// `from_dense` keeps the main diagonal of a square matrix and silently drops
/// everything off it. Non-square input is an error.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagonalLinearOperator<T: Element> {
    pub(crate) diag: DVector<T>,
    pub(crate) shape: Static<Shape>,
}

impl<T: Element> DiagonalLinearOperator<T> {
    /// Create `diag(diag)`, rejecting an empty diagonal
    pub fn new(diag: DVector<T>) -> Result<Self> {
        let shape = Shape::square(diag.len())?;
        Ok(Self {
            diag,
            shape: Static(shape),
        })
    }

    /// Number of rows (and columns)
    pub fn size(&self) -> usize {
        self.diag.len()
    }

    /// Product of two diagonal operators, kept diagonal
    pub fn matmul_diagonal(&self, rhs: &Self) -> Result<Self> {
        if self.size() != rhs.size() {
            return Err(Error::shape_mismatch("matmul", &*self.shape, &*rhs.shape));
        }
        Self::new(self.diag.component_mul(&rhs.diag))
    }
}

impl<T: Element> LinearOperator<T> for DiagonalLinearOperator<T> {
    type DiagonalSum = Self;

    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn diagonal(&self) -> Result<DVector<T>> {
        Ok(self.diag.clone())
    }

    fn add_diagonal(&self, value: &DVector<T>) -> Result<Self> {
        check_diagonal_len(&self.shape, value)?;
        Self::new(&self.diag + value)
    }

    fn matmul(&self, rhs: &DMatrix<T>) -> Result<DMatrix<T>> {
        check_rhs("matmul", &self.shape, rhs)?;
        let mut out = rhs.clone();
        for (i, mut row) in out.row_iter_mut().enumerate() {
            row *= self.diag[i];
        }
        Ok(out)
    }

    fn to_dense(&self) -> DMatrix<T> {
        DMatrix::from_diagonal(&self.diag)
    }

    fn from_dense(dense: &DMatrix<T>) -> Result<Self> {
        square_shape("DiagonalLinearOperator::from_dense", dense)?;
        let n = dense.nrows();
        let dropped = (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .filter(|&(i, j)| i != j && dense[(i, j)] != T::zero())
            .count();
        if dropped > 0 {
            debug!(dropped, size = n, "dropping off-diagonal entries");
        }
        Self::new(dense.diagonal())
    }
}

impl<T: Element> Mul<T> for DiagonalLinearOperator<T> {
    type Output = Self;

    fn mul(self, rhs: T) -> Self {
        Self {
            diag: self.diag * rhs,
            shape: self.shape,
        }
    }
}

impl<T: Element> Flatten<T> for DiagonalLinearOperator<T> {
    fn flatten(&self) -> Vec<T> {
        self.diag.iter().copied().collect()
    }

    fn unflatten(&self, leaves: &[T]) -> Result<Self> {
        let mut cursor = LeafCursor::new(leaves);
        let diag = cursor.take_vector(self.size())?;
        cursor.finish()?;
        Ok(Self {
            diag,
            shape: self.shape.clone(),
        })
    }

    fn num_leaves(&self) -> usize {
        self.size()
    }
}
