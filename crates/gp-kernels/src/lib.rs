//! Stationary kernels and their random Fourier feature approximations
//!
//! This crate provides:
//! - Kernel traits layered by capability ([`Kernel`], [`StationaryKernel`],
//!   [`SpectralDensity`])
//! - Closed-form RBF and Matérn kernels
//! - [`SpectralKernel`], a finite feature approximation of any kernel whose
//!   spectral measure can be sampled
//! - [`SpectralConfig`] for rebuilding a spectral kernel from JSON
//!
//! # Example
//!
//! ```rust
//! use gp_core::Softplus;
//! use gp_kernels::{Kernel, SpectralRbf};
//! use nalgebra::{DMatrix, DVector};
//!
//! let kernel = SpectralRbf::rbf(
//!     50,
//!     &DVector::from_element(2, 1.0),
//!     1.0,
//!     Softplus,
//!     42,
//!     "RBF",
//! ).unwrap();
//!
//! let x = DMatrix::from_fn(10, 2, |i, j| (i + j) as f64 * 0.1);
//! let y = DMatrix::from_fn(5, 2, |i, j| (i * j) as f64 * 0.2);
//! let gram = kernel.gram(&x, &y).unwrap();
//! assert_eq!(gram.shape(), (10, 5));
//! ```

pub mod config;
pub mod kernel;
pub mod spectral;
pub mod stationary;

pub use config::SpectralConfig;
pub use kernel::{check_input_dim, scaled_sq_distances, Kernel, SpectralDensity, StationaryKernel};
pub use spectral::{SpectralKernel, SpectralRbf};
pub use stationary::{Matern, MaternOrder, Rbf};
