//! End-to-end tests across the workspace crates
//!
//! A spectral kernel produces a Gram matrix, which is wrapped into a dense
//! operator and combined with structured noise operators, the way a GP
//! likelihood would use them.

use anyhow::Result;
use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector};
use spectral_gp::prelude::*;
use std::sync::Once;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn inputs(n: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n, 2, |i, j| 0.25 * i as f64 + 0.5 * j as f64 * (i as f64).cos())
}

#[test]
fn test_spectral_gram_with_jitter_is_positive_definite() -> Result<()> {
    init_tracing();
    let mut config = SpectralConfig::new(11);
    config.lengthscale = vec![0.8, 1.2];
    config.num_basis = 25;
    config.scale_frequencies = true;
    let kernel = config.build_rbf::<f64>()?;

    let x = inputs(12);
    let gram = DenseLinearOperator::new(kernel.gram(&x, &x)?)?;
    assert_eq!(gram.shape(), &Shape::square(12)?);
    assert_eq!(gram.dtype(), DType::F64);

    // 25 features give rank at most 50, so the Gram matrix itself may be singular
    let jittered = gram.add_diagonal(&DVector::from_element(12, 1e-6))?;
    assert!(jittered.to_dense().cholesky().is_some());

    // the original operator is untouched
    assert_relative_eq!(gram.diagonal()?[0] + 1e-6, jittered.diagonal()?[0]);
    Ok(())
}

#[test]
fn test_noise_operators_agree_with_dense() -> Result<()> {
    init_tracing();
    let kernel = SpectralConfig::new(3).build_rbf::<f64>()?;
    let x = DMatrix::from_fn(6, 1, |i, _| i as f64 * 0.4);
    let gram = DenseLinearOperator::new(kernel.gram(&x, &x)?)?;

    let homoscedastic = ConstantDiagonalLinearOperator::new(0.05, 6)?;
    let heteroscedastic = DiagonalLinearOperator::new(homoscedastic.diagonal()?)?;

    let a = gram.add_diagonal(&homoscedastic.diagonal()?)?;
    let b = gram.add_diagonal(&heteroscedastic.diagonal()?)?;
    assert_eq!(a.to_dense(), b.to_dense());

    let rhs = DMatrix::from_fn(6, 2, |i, j| (i + 2 * j) as f64);
    assert!((homoscedastic.matmul(&rhs)? - heteroscedastic.matmul(&rhs)?).norm() < 1e-12);

    let product = gram.matmul_operator(&heteroscedastic)?;
    assert!((product.to_dense() - gram.to_dense() * heteroscedastic.to_dense()).norm() < 1e-12);
    Ok(())
}

#[test]
fn test_low_rank_factor_feeds_woodbury_solve() -> Result<()> {
    init_tracing();
    let mut config = SpectralConfig::new(19);
    config.num_basis = 10;
    config.lengthscale = vec![1.0, 1.0];
    let kernel = config.build_rbf::<f64>()?;

    let x = inputs(30);
    let noise = 0.1;
    let factor = kernel.low_rank_factor(&x)?;
    assert_eq!(factor.shape(), (30, 20));

    // (L L^T + s I)^-1 y through the 20 x 20 capacitance matrix
    let y = DVector::from_fn(30, |i, _| (i as f64 * 0.3).sin());
    let capacitance =
        DMatrix::<f64>::identity(20, 20) * noise + factor.transpose() * &factor;
    let inner = capacitance
        .cholesky()
        .ok_or_else(|| anyhow::anyhow!("capacitance matrix is not positive definite"))?
        .solve(&(factor.transpose() * &y));
    let woodbury = (&y - &factor * inner) / noise;

    let full = DenseLinearOperator::new(kernel.gram(&x, &x)?)?
        .add_diagonal(&DVector::from_element(30, noise))?;
    let direct = full
        .to_dense()
        .cholesky()
        .ok_or_else(|| anyhow::anyhow!("noisy Gram matrix is not positive definite"))?
        .solve(&y);

    assert!((woodbury - direct).norm() < 1e-8);
    Ok(())
}

#[test]
fn test_flattened_kernel_and_operator_leaves() -> Result<()> {
    let kernel = SpectralConfig::new(5).build_rbf::<f64>()?;
    // one lengthscale, the variance, then 100 x 1 features
    assert_eq!(kernel.num_leaves(), 102);

    let op = ConstantDiagonalLinearOperator::new(2.0, 4)?;
    let scaled = op.clone() * 3.0;
    assert_eq!(scaled.flatten(), vec![6.0]);
    assert_eq!(scaled.shape(), op.shape());
    Ok(())
}

#[test]
fn test_dimension_errors_surface_through_facade() {
    let kernel = SpectralConfig::new(1).build_rbf::<f64>().unwrap();
    let x = DMatrix::<f64>::zeros(3, 2);
    match kernel.gram(&x, &x) {
        Err(Error::DimensionMismatch { expected, actual }) => {
            assert_eq!(expected, 1);
            assert_eq!(actual, 2);
        }
        other => panic!("expected a dimension mismatch, got {other:?}"),
    }
}
