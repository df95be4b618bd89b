//! Constant diagonal linear operator, `value * I`

use crate::operator::{check_diagonal_len, check_rhs, square_shape};
use crate::{DiagonalLinearOperator, LinearOperator};
use gp_core::{Element, Error, Flatten, LeafCursor, Result, Shape, Static};
use nalgebra::{DMatrix, DVector};
use std::ops::Mul;
use tracing::debug;

/// Square operator `value * I_n`
///
/// `value` is the only dynamic leaf; the size is static.
///
/// `from_dense` requires a square matrix whose diagonal entries are all equal.
/// A non-constant diagonal is an error; off-diagonal content is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantDiagonalLinearOperator<T: Element> {
    value: T,
    size: Static<usize>,
    shape: Static<Shape>,
}

impl<T: Element> ConstantDiagonalLinearOperator<T> {
    pub fn new(value: T, size: usize) -> Result<Self> {
        let shape = Shape::square(size)?;
        Ok(Self {
            value,
            size: Static(size),
            shape: Static(shape),
        })
    }

    /// The `size x size` identity
    pub fn identity(size: usize) -> Result<Self> {
        Self::new(T::one(), size)
    }

    pub fn value(&self) -> T {
        self.value
    }

    pub fn size(&self) -> usize {
        *self.size
    }

    /// Product of two constant diagonal operators, kept constant diagonal
    pub fn matmul_constant(&self, rhs: &Self) -> Result<Self> {
        if self.size() != rhs.size() {
            return Err(Error::shape_mismatch("matmul", &*self.shape, &*rhs.shape));
        }
        Self::new(self.value * rhs.value, self.size())
    }
}

impl<T: Element> LinearOperator<T> for ConstantDiagonalLinearOperator<T> {
    type DiagonalSum = DiagonalLinearOperator<T>;

    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn diagonal(&self) -> Result<DVector<T>> {
        Ok(DVector::from_element(self.size(), self.value))
    }

    fn add_diagonal(&self, value: &DVector<T>) -> Result<DiagonalLinearOperator<T>> {
        check_diagonal_len(&self.shape, value)?;
        DiagonalLinearOperator::new(value.add_scalar(self.value))
    }

    fn matmul(&self, rhs: &DMatrix<T>) -> Result<DMatrix<T>> {
        check_rhs("matmul", &self.shape, rhs)?;
        Ok(rhs.map(|x| x * self.value))
    }

    fn to_dense(&self) -> DMatrix<T> {
        DMatrix::from_diagonal_element(self.size(), self.size(), self.value)
    }

    fn from_dense(dense: &DMatrix<T>) -> Result<Self> {
        square_shape("ConstantDiagonalLinearOperator::from_dense", dense)?;
        let value = dense[(0, 0)];
        if let Some(i) = (1..dense.nrows()).find(|&i| dense[(i, i)] != value) {
            return Err(Error::InvalidInput(format!(
                "diagonal is not constant: entry {i} is {} but entry 0 is {}",
                dense[(i, i)].into_f64(),
                value.into_f64()
            )));
        }
        debug!(size = dense.nrows(), "constant diagonal operator from dense matrix");
        Self::new(value, dense.nrows())
    }
}

impl<T: Element> Mul<T> for ConstantDiagonalLinearOperator<T> {
    type Output = Self;

    fn mul(self, rhs: T) -> Self {
        Self {
            value: self.value * rhs,
            ..self
        }
    }
}

impl<T: Element> Flatten<T> for ConstantDiagonalLinearOperator<T> {
    fn flatten(&self) -> Vec<T> {
        vec![self.value]
    }

    fn unflatten(&self, leaves: &[T]) -> Result<Self> {
        let mut cursor = LeafCursor::new(leaves);
        let value = cursor.take_scalar()?;
        cursor.finish()?;
        Ok(Self {
            value,
            size: self.size,
            shape: self.shape.clone(),
        })
    }

    fn num_leaves(&self) -> usize {
        1
    }
}

impl<T: Element> From<ConstantDiagonalLinearOperator<T>> for DiagonalLinearOperator<T> {
    fn from(op: ConstantDiagonalLinearOperator<T>) -> Self {
        Self {
            diag: DVector::from_element(op.size(), op.value),
            shape: op.shape,
        }
    }
}
