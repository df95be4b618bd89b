//! Dense linear operator

use crate::operator::{check_diagonal_len, check_rhs};
use crate::LinearOperator;
use gp_core::{Element, Error, Flatten, LeafCursor, Result, Shape, Static};
use nalgebra::{DMatrix, DVector};
use std::ops::Mul;
use tracing::trace;

/// Operator backed by a full matrix
///
/// Every entry is a dynamic leaf, column-major. `from_dense` is lossless for
/// any non-empty matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLinearOperator<T: Element> {
    matrix: DMatrix<T>,
    shape: Static<Shape>,
}

impl<T: Element> DenseLinearOperator<T> {
    /// Wrap a matrix, rejecting empty ones
    pub fn new(matrix: DMatrix<T>) -> Result<Self> {
        let shape = Shape::matrix(matrix.nrows(), matrix.ncols())?;
        Ok(Self {
            matrix,
            shape: Static(shape),
        })
    }

    pub fn matrix(&self) -> &DMatrix<T> {
        &self.matrix
    }

    pub fn into_matrix(self) -> DMatrix<T> {
        self.matrix
    }
}

impl<T: Element> LinearOperator<T> for DenseLinearOperator<T> {
    type DiagonalSum = Self;

    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn diagonal(&self) -> Result<DVector<T>> {
        if !self.matrix.is_square() {
            return Err(Error::not_square(
                "diagonal",
                self.matrix.nrows(),
                self.matrix.ncols(),
            ));
        }
        Ok(self.matrix.diagonal())
    }

    fn add_diagonal(&self, value: &DVector<T>) -> Result<Self> {
        check_diagonal_len(&self.shape, value)?;
        let mut matrix = self.matrix.clone();
        for (i, &v) in value.iter().enumerate() {
            matrix[(i, i)] += v;
        }
        Self::new(matrix)
    }

    fn matmul(&self, rhs: &DMatrix<T>) -> Result<DMatrix<T>> {
        check_rhs("matmul", &self.shape, rhs)?;
        Ok(&self.matrix * rhs)
    }

    fn to_dense(&self) -> DMatrix<T> {
        self.matrix.clone()
    }

    fn from_dense(dense: &DMatrix<T>) -> Result<Self> {
        trace!(nrows = dense.nrows(), ncols = dense.ncols(), "dense operator from dense matrix");
        Self::new(dense.clone())
    }
}

impl<T: Element> Mul<T> for DenseLinearOperator<T> {
    type Output = Self;

    fn mul(self, rhs: T) -> Self {
        Self {
            matrix: self.matrix * rhs,
            shape: self.shape,
        }
    }
}

impl<T: Element> Flatten<T> for DenseLinearOperator<T> {
    fn flatten(&self) -> Vec<T> {
        self.matrix.iter().copied().collect()
    }

    fn unflatten(&self, leaves: &[T]) -> Result<Self> {
        let mut cursor = LeafCursor::new(leaves);
        let matrix = cursor.take_matrix(self.matrix.nrows(), self.matrix.ncols())?;
        cursor.finish()?;
        Ok(Self {
            matrix,
            shape: self.shape.clone(),
        })
    }

    fn num_leaves(&self) -> usize {
        self.matrix.len()
    }
}
