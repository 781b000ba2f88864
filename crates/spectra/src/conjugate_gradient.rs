use crate::error::{Result, SpectraError};
use crate::operator::LinearOperator;
use ndarray::{Array1, ArrayView1};

/// Outcome of a conjugate gradient run
#[derive(Debug, Clone, PartialEq)]
pub struct ConjugateGradientSolution {
    pub solution: Array1<f64>,
    pub iterations: usize,
    /// Euclidean norm of `b - A x` at the last iteration
    pub residual_norm: f64,
    pub converged: bool,
}

/// Solve `A x = b` for a symmetric positive definite operator.
///
/// Stops once `|b - A x| <= tolerance * |b|` or after `max_iterations`.
/// Starts from `x0`, or from zero when not given.
pub fn conjugate_gradient<O: LinearOperator + ?Sized>(
    operator: &O,
    b: ArrayView1<f64>,
    x0: Option<ArrayView1<f64>>,
    tolerance: f64,
    max_iterations: usize,
) -> Result<ConjugateGradientSolution> {
    let n = operator.order();
    if b.len() != n {
        return Err(SpectraError::DimensionMismatch {
            expected: n,
            actual: b.len(),
        });
    }

    let mut x = match x0 {
        Some(x0) if x0.len() != n => {
            return Err(SpectraError::DimensionMismatch {
                expected: n,
                actual: x0.len(),
            })
        }
        Some(x0) => x0.to_owned(),
        None => Array1::zeros(n),
    };

    let b_norm = b.dot(&b).sqrt();
    let threshold = tolerance * b_norm;

    let mut residual = &b - &operator.apply(x.view());
    let mut residual_squared = residual.dot(&residual);
    let mut direction = residual.clone();
    let mut iterations = 0;

    while residual_squared.sqrt() > threshold && iterations < max_iterations {
        let image = operator.apply(direction.view());
        let curvature = direction.dot(&image);
        if curvature <= 0.0 {
            log::warn!("conjugate gradient hit a non positive curvature direction");
            break;
        }

        let step = residual_squared / curvature;
        x.scaled_add(step, &direction);
        residual.scaled_add(-step, &image);

        let next_squared = residual.dot(&residual);
        let beta = next_squared / residual_squared;
        residual_squared = next_squared;
        direction = &residual + &(beta * &direction);
        iterations += 1;
    }

    let residual_norm = residual_squared.sqrt();
    let converged = residual_norm <= threshold;
    if !converged {
        log::warn!(
            "conjugate gradient stopped after {iterations} iterations with residual {residual_norm:e}"
        );
    } else {
        log::debug!("conjugate gradient converged in {iterations} iterations");
    }

    Ok(ConjugateGradientSolution {
        solution: x,
        iterations,
        residual_norm,
        converged,
    })
}
