//! The linear operator contract
//!
//! A linear operator is a structured stand-in for a covariance matrix. Every
//! implementation exposes the same capability set and the same static/dynamic
//! split: `shape` and `dtype` are static, the numeric payload is listed by
//! [`Flatten`].

use crate::DenseLinearOperator;
use gp_core::{DType, Element, Error, Flatten, Result, Shape};
use nalgebra::{DMatrix, DVector};
use std::fmt::Debug;
use std::ops::Mul;

/// Capability set shared by all structured matrix representations
///
/// A type that leaves any required operation out is rejected by the compiler
/// rather than failing on first use.
///
/// ```compile_fail,E0046
/// use gp_core::{Flatten, Result, Shape};
/// use gp_linops::LinearOperator;
/// use nalgebra::{DMatrix, DVector};
///
/// #[derive(Debug, Clone)]
/// struct Incomplete(Shape);
///
/// impl std::ops::Mul<f64> for Incomplete {
///     type Output = Self;
///     fn mul(self, _: f64) -> Self { self }
/// }
///
/// impl Flatten<f64> for Incomplete {
///     fn flatten(&self) -> Vec<f64> { Vec::new() }
///     fn unflatten(&self, _: &[f64]) -> Result<Self> { Ok(self.clone()) }
/// }
///
/// // `diagonal`, `add_diagonal`, `matmul`, `to_dense` and `from_dense` are missing
/// impl LinearOperator<f64> for Incomplete {
///     type DiagonalSum = Self;
///     fn shape(&self) -> &Shape { &self.0 }
/// }
/// ```
///
/// # Scalar multiplication
///
/// Provided through the `Mul<T, Output = Self>` supertrait, so scaling keeps
/// the concrete operator type, shape and dtype.
pub trait LinearOperator<T: Element>:
    Flatten<T> + Mul<T, Output = Self> + Clone + Debug + Sized
{
    /// Operator produced by [`add_diagonal`](LinearOperator::add_diagonal)
    type DiagonalSum: LinearOperator<T>;

    /// Static extents of the operator
    fn shape(&self) -> &Shape;

    /// Static element type, fixed by `T`
    fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Number of axes, always `shape().ndim()`
    fn ndim(&self) -> usize {
        self.shape().ndim()
    }

    /// Main diagonal
    fn diagonal(&self) -> Result<DVector<T>>;

    /// New operator equal to `self + diag(value)`
    ///
    /// `self` is left untouched. `value` must have one entry per row.
    fn add_diagonal(&self, value: &DVector<T>) -> Result<Self::DiagonalSum>;

    /// Product with a dense matrix, `self @ rhs`
    fn matmul(&self, rhs: &DMatrix<T>) -> Result<DMatrix<T>>;

    /// Dense materialisation, the reference every structured operation must agree with
    fn to_dense(&self) -> DMatrix<T>;

    /// Build the structured representation from a dense matrix
    ///
    /// Implementations document what happens to content that falls outside
    /// their structure.
    fn from_dense(dense: &DMatrix<T>) -> Result<Self>;

    /// Product with another operator, `self @ rhs`
    ///
    /// The default materialises `rhs`. Structured pairs that stay structured
    /// (diagonal times diagonal) provide their own inherent methods.
    fn matmul_operator<O: LinearOperator<T>>(&self, rhs: &O) -> Result<DenseLinearOperator<T>> {
        check_inner_dims("matmul", self.shape(), rhs.shape())?;
        DenseLinearOperator::new(self.matmul(&rhs.to_dense())?)
    }
}

/// Check that `left @ right` is defined for two matrix shapes
pub(crate) fn check_inner_dims(context: &str, left: &Shape, right: &Shape) -> Result<()> {
    match (left.as_matrix(), right.as_matrix()) {
        (Some((_, k)), Some((m, _))) if k == m => Ok(()),
        _ => Err(Error::shape_mismatch(context, left, right)),
    }
}

/// Check a dense right-hand side against an operator's column count
pub(crate) fn check_rhs<T: Element>(context: &str, shape: &Shape, rhs: &DMatrix<T>) -> Result<()> {
    check_inner_dims(context, shape, &Shape::from((rhs.nrows(), rhs.ncols())))
}

/// Check that a diagonal update has one entry per row of a square operator
pub(crate) fn check_diagonal_len<T: Element>(shape: &Shape, value: &DVector<T>) -> Result<()> {
    match shape.as_matrix() {
        Some((n, m)) if n == m && value.len() == n => Ok(()),
        _ => Err(Error::shape_mismatch(
            "add_diagonal",
            shape,
            [value.len()],
        )),
    }
}

/// Check that a dense matrix is square and non-empty
pub(crate) fn square_shape<T: Element>(context: &str, dense: &DMatrix<T>) -> Result<Shape> {
    if !dense.is_square() {
        return Err(Error::not_square(context, dense.nrows(), dense.ncols()));
    }
    Shape::square(dense.nrows())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_dims() {
        let a = Shape::from([3, 4]);
        let b = Shape::from([4, 2]);
        assert!(check_inner_dims("matmul", &a, &b).is_ok());
        assert!(check_inner_dims("matmul", &b, &a).is_err());
        // not a matrix
        let c = Shape::from([4, 5, 6]);
        assert!(check_inner_dims("matmul", &a, &c).is_err());
    }

    #[test]
    fn test_diagonal_len() {
        let shape = Shape::from([3, 3]);
        assert!(check_diagonal_len(&shape, &DVector::from_element(3, 1.0)).is_ok());
        assert!(check_diagonal_len(&shape, &DVector::from_element(2, 1.0)).is_err());
        let rect = Shape::from([3, 2]);
        assert!(check_diagonal_len(&rect, &DVector::from_element(3, 1.0)).is_err());
    }

    #[test]
    fn test_square_shape() {
        assert_eq!(
            square_shape("from_dense", &DMatrix::<f64>::zeros(2, 2)).unwrap(),
            Shape::from([2, 2])
        );
        assert!(square_shape("from_dense", &DMatrix::<f64>::zeros(2, 3)).is_err());
        assert!(square_shape("from_dense", &DMatrix::<f64>::zeros(0, 0)).is_err());
    }
}
