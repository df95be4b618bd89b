//! Error types for Gaussian-process operators and kernels
//!
//! Provides a unified error type for all spectral-gp crates.

use crate::shape::Shape;
use thiserror::Error;

/// Core error type for operator and kernel construction/evaluation
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid parameter provided to a constructor or function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Two operands have incompatible shapes
    #[error("Shape mismatch in {context}: {left} is incompatible with {right}")]
    ShapeMismatch {
        context: String,
        left: Shape,
        right: Shape,
    },

    /// Input data dimensionality does not match the kernel's dimensionality
    #[error("Dimension mismatch: kernel expects {expected}-dimensional inputs, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Wrong number of leaves handed to `unflatten`
    #[error("Leaf count mismatch: expected {expected} leaves, got {actual}")]
    LeafCount { expected: usize, actual: usize },

    /// Numerical computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(context: &str, left: impl Into<Shape>, right: impl Into<Shape>) -> Self {
        Self::ShapeMismatch {
            context: context.to_string(),
            left: left.into(),
            right: right.into(),
        }
    }

    /// Create an error for a value that must be strictly positive
    pub fn not_positive(name: &str, value: f64) -> Self {
        Self::InvalidParameter(format!("{name} must be positive, got {value}"))
    }

    /// Create an error for NaN/Inf values
    pub fn non_finite(context: &str) -> Self {
        Self::Computation(format!("{context} contains NaN or infinite values"))
    }

    /// Create an error for a matrix that must be square
    pub fn not_square(context: &str, nrows: usize, ncols: usize) -> Self {
        Self::InvalidInput(format!(
            "{context} requires a square matrix, got {nrows}x{ncols}"
        ))
    }
}
