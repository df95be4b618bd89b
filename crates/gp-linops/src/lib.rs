//! Structured linear operators for Gaussian-process covariance matrices
//!
//! This crate provides the [`LinearOperator`] contract and three structured
//! representations of square covariance matrices:
//!
//! | Operator | Stores | Leaves | `from_dense` on off-structure content |
//! |----------|--------|--------|---------------------------------------|
//! | [`DenseLinearOperator`] | full matrix | `n * m` | lossless |
//! | [`DiagonalLinearOperator`] | diagonal | `n` | drops off-diagonal entries |
//! | [`ConstantDiagonalLinearOperator`] | one scalar | `1` | rejects a non-constant diagonal |
//!
//! Every operator is immutable: scaling, diagonal updates and products all
//! return new values. `shape` and `dtype` are static and never appear among the
//! flattened leaves.
//!
//! # Example
//!
//! ```rust
//! use gp_core::Flatten;
//! use gp_linops::{DiagonalLinearOperator, LinearOperator};
//! use nalgebra::{DMatrix, DVector};
//!
//! let noise = DiagonalLinearOperator::new(DVector::from_element(3, 0.1)).unwrap();
//! let jittered = noise.add_diagonal(&DVector::from_element(3, 1e-6)).unwrap();
//! assert_eq!(jittered.ndim(), 2);
//!
//! let x = DMatrix::from_element(3, 2, 1.0);
//! let y = jittered.matmul(&x).unwrap();
//! assert_eq!(y, jittered.to_dense() * x);
//!
//! // only the diagonal is a leaf
//! assert_eq!(jittered.flatten().len(), 3);
//! ```

pub mod constant_diagonal;
pub mod dense;
pub mod diagonal;
pub mod operator;

pub use constant_diagonal::ConstantDiagonalLinearOperator;
pub use dense::DenseLinearOperator;
pub use diagonal::DiagonalLinearOperator;
pub use operator::LinearOperator;
