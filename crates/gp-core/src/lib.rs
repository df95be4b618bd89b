//! Core types for Gaussian-process operators and kernels
//!
//! This crate provides the shared vocabulary of the spectral-gp workspace:
//!
//! - [`Error`] / [`Result`]: the unified error type
//! - [`Element`] / [`DType`]: element types and their runtime tags
//! - [`Shape`]: static structural metadata
//! - [`Flatten`] / [`Static`]: the static/dynamic field split consumed by
//!   gradient engines and optimisers
//! - [`Param`] / [`VectorParam`] / [`Bijector`]: trainable parameters behind
//!   positivity transforms
//!
//! # Example
//!
//! ```rust
//! use gp_core::{Flatten, Param, Softplus};
//!
//! let variance = Param::new(2.0f64, Softplus).unwrap();
//! assert!((variance.value() - 2.0).abs() < 1e-12);
//!
//! // only the unconstrained value is a leaf
//! assert_eq!(variance.flatten(), vec![variance.raw()]);
//! ```

pub mod error;
pub mod numeric;
pub mod params;
pub mod shape;
pub mod tree;

// Re-export core types
pub use error::{Error, Result};
pub use numeric::{DType, Element};
pub use params::{Bijector, Exp, Identity, Param, Softplus, Transform, VectorParam};
pub use shape::Shape;
pub use tree::{Flatten, LeafCursor, Static};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Bijector, DType, Element, Error, Flatten, Param, Result, Shape, Softplus, Static,
        VectorParam,
    };
}
