//! Gaussian-process building blocks
//!
//! This crate re-exports the workspace crates:
//!
//! - [`gp_core`]: numeric element types, shapes, errors, tree flattening and
//!   constrained parameters
//! - [`gp_linops`]: dense, diagonal and constant-diagonal covariance operators
//! - [`gp_kernels`]: stationary kernels and their random Fourier feature
//!   approximations
//!
//! # Example
//!
//! ```rust
//! use spectral_gp::prelude::*;
//! use nalgebra::{DMatrix, DVector};
//!
//! let kernel = SpectralConfig::new(7).build_rbf::<f64>().unwrap();
//! let x = DMatrix::from_fn(4, 1, |i, _| i as f64 * 0.5);
//!
//! let k = DenseLinearOperator::new(kernel.gram(&x, &x).unwrap()).unwrap();
//! let noisy = k.add_diagonal(&DVector::from_element(4, 0.01)).unwrap();
//! assert_eq!(noisy.shape().dims(), &[4, 4]);
//! ```

pub use gp_core;
pub use gp_kernels;
pub use gp_linops;

pub mod prelude {
    pub use gp_core::prelude::*;
    pub use gp_kernels::{
        Kernel, Matern, MaternOrder, Rbf, SpectralConfig, SpectralDensity, SpectralKernel,
        SpectralRbf, StationaryKernel,
    };
    pub use gp_linops::{
        ConstantDiagonalLinearOperator, DenseLinearOperator, DiagonalLinearOperator,
        LinearOperator,
    };
}
