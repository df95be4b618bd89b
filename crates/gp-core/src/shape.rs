//! Static structural metadata: shapes
//!
//! A [`Shape`] is never part of the differentiable payload of an operator or
//! kernel. It is copied verbatim through `unflatten` and compared, not
//! computed with.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered extents of an operator, e.g. `(n, m)` for a matrix
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Create a shape, rejecting empty shapes and zero extents
    pub fn new(dims: impl Into<Vec<usize>>) -> Result<Self> {
        let dims = dims.into();
        if dims.is_empty() {
            return Err(Error::InvalidInput("shape must have at least one axis".to_string()));
        }
        if let Some(axis) = dims.iter().position(|&d| d == 0) {
            return Err(Error::InvalidInput(format!(
                "shape extents must be positive, axis {axis} is 0"
            )));
        }
        Ok(Self(dims))
    }

    /// Shape of an `nrows x ncols` matrix
    pub fn matrix(nrows: usize, ncols: usize) -> Result<Self> {
        Self::new(vec![nrows, ncols])
    }

    /// Shape of an `n x n` matrix
    pub fn square(n: usize) -> Result<Self> {
        Self::matrix(n, n)
    }

    /// Number of axes
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// `(rows, cols)` for two-axis shapes
    pub fn as_matrix(&self) -> Option<(usize, usize)> {
        match self.0.as_slice() {
            &[r, c] => Some((r, c)),
            _ => None,
        }
    }

    /// Whether the shape is a square matrix
    pub fn is_square(&self) -> bool {
        matches!(self.as_matrix(), Some((r, c)) if r == c)
    }

    /// Total number of elements
    pub fn numel(&self) -> usize {
        self.0.iter().product()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "({single},)"),
            dims => {
                write!(f, "(")?;
                for (i, d) in dims.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{d}")?;
                }
                write!(f, ")")
            }
        }
    }
}

// Unchecked conversions, used when reporting the shape of arbitrary operands.

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self(dims.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Self(dims.to_vec())
    }
}

impl From<(usize, usize)> for Shape {
    fn from((r, c): (usize, usize)) -> Self {
        Self(vec![r, c])
    }
}

impl From<&Shape> for Shape {
    fn from(shape: &Shape) -> Self {
        shape.clone()
    }
}
