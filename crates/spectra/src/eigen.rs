use crate::error::{Result, SpectraError};
use crate::operator::LinearOperator;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

const JACOBI_MAX_SWEEPS: usize = 64;
const QL_MAX_ITERATIONS: usize = 64;
/// Operators up to this order are materialized and solved with Jacobi rotations
const DENSE_SOLVER_MAX_ORDER: usize = 100;
const RITZ_TOLERANCE: f64 = 1e-10;

/// Part of the spectrum computed by [`symmetric_sparse_eigen_solver`].
///
/// Mirrors ARPACK's `which` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EigenSelection {
    /// "LA"
    LargestAlgebraic,
    /// "SA"
    SmallestAlgebraic,
    /// "LM"
    LargestMagnitude,
    /// "SM"
    SmallestMagnitude,
    /// "BE", half from each end of the spectrum, one more from the high end
    /// when `nev` is odd
    BothEnds,
}

impl EigenSelection {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "LA" => Some(Self::LargestAlgebraic),
            "SA" => Some(Self::SmallestAlgebraic),
            "LM" => Some(Self::LargestMagnitude),
            "SM" => Some(Self::SmallestMagnitude),
            "BE" => Some(Self::BothEnds),
            _ => None,
        }
    }

    /// Indexes of the `nev` selected values among ascending `values`,
    /// returned in ascending order
    fn select(&self, values: &Array1<f64>, nev: usize) -> Vec<usize> {
        let n = values.len();
        let mut selected: Vec<usize> = match self {
            Self::SmallestAlgebraic => (0..nev).collect(),
            Self::LargestAlgebraic => (n - nev..n).collect(),
            Self::LargestMagnitude | Self::SmallestMagnitude => {
                let mut order: Vec<usize> = (0..n).collect();
                order.sort_by(|&a, &b| values[a].abs().total_cmp(&values[b].abs()));
                if *self == Self::LargestMagnitude {
                    order.reverse();
                }
                order.truncate(nev);
                order
            }
            Self::BothEnds => {
                let low = nev / 2;
                let high = nev - low;
                (0..low).chain(n - high..n).collect()
            }
        };
        selected.sort_unstable();
        selected
    }
}

fn sort_eigenpairs(values: Array1<f64>, vectors: Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    pick_eigenpairs(&values, &vectors, &order)
}

fn pick_eigenpairs(
    values: &Array1<f64>,
    vectors: &Array2<f64>,
    indexes: &[usize],
) -> (Array1<f64>, Array2<f64>) {
    let picked_values = Array1::from_iter(indexes.iter().map(|&i| values[i]));
    let mut picked_vectors = Array2::zeros((vectors.nrows(), indexes.len()));
    for (col, &i) in indexes.iter().enumerate() {
        picked_vectors.column_mut(col).assign(&vectors.column(i));
    }
    (picked_values, picked_vectors)
}

/// All eigenvalues of a dense symmetric matrix in ascending order, with the
/// matching orthonormal eigenvectors as columns. Cyclic Jacobi method.
pub fn symmetric_eigen(matrix: &Array2<f64>) -> Result<(Array1<f64>, Array2<f64>)> {
    let n = matrix.nrows();
    if matrix.ncols() != n {
        return Err(SpectraError::NotSquare {
            rows: n,
            cols: matrix.ncols(),
        });
    }

    let mut a = matrix.to_owned();
    let mut v = Array2::eye(n);
    let norm = a.iter().map(|x| x * x).sum::<f64>().sqrt();

    for sweep in 0..JACOBI_MAX_SWEEPS {
        let mut off = 0.0;
        for p in 0..n {
            for q in p + 1..n {
                off += a[[p, q]] * a[[p, q]];
            }
        }
        if off.sqrt() <= 1e-14 * norm {
            log::debug!("jacobi converged after {sweep} sweeps (order {n})");
            break;
        }

        for p in 0..n {
            for q in p + 1..n {
                let apq = a[[p, q]];
                if apq.abs() <= f64::MIN_POSITIVE {
                    continue;
                }

                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                a[[p, q]] = 0.0;
                a[[q, p]] = 0.0;

                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    let values = a.diag().to_owned();
    Ok(sort_eigenpairs(values, v))
}

/// Index `i` of the largest gap `values[i + 1] - values[i]` between
/// consecutive eigenvalues in ascending order, the first one on ties. Zero
/// when there are fewer than two values.
pub fn eigen_gap(values: &Array1<f64>) -> usize {
    let mut best = (0, f64::NEG_INFINITY);
    for i in 0..values.len().saturating_sub(1) {
        let gap = values[i + 1] - values[i];
        if gap > best.1 {
            best = (i, gap);
        }
    }
    best.0
}

/// Eigen decomposition of the symmetric tridiagonal matrix with diagonal `d`
/// and off-diagonal `e` (`e[i]` couples `i` and `i + 1`). Implicit QL.
pub fn tridiagonal_eigen(diagonal: &[f64], off_diagonal: &[f64]) -> (Array1<f64>, Array2<f64>) {
    let n = diagonal.len();
    let mut d = diagonal.to_vec();
    let mut e = vec![0.0; n];
    for (i, &value) in off_diagonal.iter().take(n.saturating_sub(1)).enumerate() {
        e[i] = value;
    }
    let mut z: Array2<f64> = Array2::eye(n);

    for l in 0..n {
        let mut iterations = 0;
        loop {
            let mut m = l;
            while m + 1 < n {
                let dd = d[m].abs() + d[m + 1].abs();
                if e[m].abs() <= f64::EPSILON * dd {
                    break;
                }
                m += 1;
            }
            if m == l {
                break;
            }

            iterations += 1;
            if iterations > QL_MAX_ITERATIONS {
                log::warn!("implicit QL did not converge for eigenvalue {l}");
                break;
            }

            let mut g = (d[l + 1] - d[l]) / (2.0 * e[l]);
            let mut r = g.hypot(1.0);
            g = d[m] - d[l] + e[l] / (g + r.copysign(g));
            let (mut s, mut c, mut p) = (1.0, 1.0, 0.0);
            let mut underflow = false;

            let mut i = m;
            while i > l {
                i -= 1;
                let f = s * e[i];
                let b = c * e[i];
                r = f.hypot(g);
                e[i + 1] = r;
                if r == 0.0 {
                    d[i + 1] -= p;
                    e[m] = 0.0;
                    underflow = true;
                    break;
                }
                s = f / r;
                c = g / r;
                g = d[i + 1] - p;
                r = (d[i] - g) * s + 2.0 * c * b;
                p = s * r;
                d[i + 1] = g + p;
                g = c * r - b;

                for k in 0..n {
                    let zk = z[[k, i + 1]];
                    z[[k, i + 1]] = s * z[[k, i]] + c * zk;
                    z[[k, i]] = c * z[[k, i]] - s * zk;
                }
            }

            if underflow {
                continue;
            }
            d[l] -= p;
            e[l] = g;
            e[m] = 0.0;
        }
    }

    sort_eigenpairs(Array1::from(d), z)
}

fn start_vector(n: usize, seed: usize) -> Array1<f64> {
    Array1::from_iter((0..n).map(|i| 1.0 + ((i * 7919 + seed * 104_729) % 1013) as f64 / 1013.0))
}

/// Remove the components of `w` along the (orthonormal) basis, twice
fn orthogonalize(w: &mut Array1<f64>, basis: &[Array1<f64>]) {
    for _ in 0..2 {
        for vector in basis {
            let projection = w.dot(vector);
            w.scaled_add(-projection, vector);
        }
    }
}

/// New unit vector orthogonal to the basis, `None` when it spans the space
fn fresh_direction(basis: &[Array1<f64>], n: usize, seed: &mut usize) -> Option<Array1<f64>> {
    let candidates = (0..3)
        .map(|_| {
            *seed += 1;
            start_vector(n, *seed)
        })
        .chain((0..n).map(|i| {
            let mut unit = Array1::zeros(n);
            unit[i] = 1.0;
            unit
        }));

    for mut candidate in candidates {
        orthogonalize(&mut candidate, basis);
        let norm = candidate.dot(&candidate).sqrt();
        if norm > 1e-8 {
            return Some(candidate / norm);
        }
    }
    None
}

fn lanczos<O: LinearOperator + ?Sized>(
    operator: &O,
    which: EigenSelection,
    nev: usize,
    max_iterations: usize,
) -> (Array1<f64>, Array2<f64>) {
    let n = operator.order();
    let step = (2 * nev + 20).min(n);
    let max_dimension = max_iterations.max(step).min(n);

    let first = start_vector(n, 0);
    let first_norm = first.dot(&first).sqrt();
    let mut basis = vec![first / first_norm];
    let mut alphas: Vec<f64> = Vec::with_capacity(max_dimension);
    let mut betas: Vec<f64> = Vec::with_capacity(max_dimension);
    let mut last_beta = 0.0;
    let mut seed = 0;
    let mut target = step;

    loop {
        while alphas.len() < target {
            let j = alphas.len();
            let mut w = operator.apply(basis[j].view());
            let alpha = w.dot(&basis[j]);
            alphas.push(alpha);
            orthogonalize(&mut w, &basis);
            let beta = w.dot(&w).sqrt();

            if j + 1 == n {
                last_beta = 0.0;
                break;
            }

            if beta > 1e-12 * alpha.abs().max(1.0) {
                last_beta = beta;
                betas.push(beta);
                basis.push(w / beta);
            } else {
                // invariant subspace, restart in an orthogonal direction
                match fresh_direction(&basis, n, &mut seed) {
                    Some(direction) => {
                        last_beta = 0.0;
                        betas.push(0.0);
                        basis.push(direction);
                    }
                    None => {
                        last_beta = 0.0;
                        break;
                    }
                }
            }
        }

        let k = alphas.len();
        let (ritz_values, ritz_vectors) = tridiagonal_eigen(&alphas, &betas);
        let selected = which.select(&ritz_values, nev.min(k));
        let converged = k == n
            || selected.iter().all(|&i| {
                (last_beta * ritz_vectors[[k - 1, i]]).abs()
                    <= RITZ_TOLERANCE * ritz_values[i].abs().max(1.0)
            });

        if converged || k >= max_dimension {
            if converged {
                log::debug!("lanczos converged with a krylov subspace of dimension {k}");
            } else {
                log::warn!("lanczos stopped before convergence at dimension {k} (order {n})");
            }

            let values = Array1::from_iter(selected.iter().map(|&i| ritz_values[i]));
            let mut vectors = Array2::zeros((n, selected.len()));
            for (col, &i) in selected.iter().enumerate() {
                let mut column = vectors.column_mut(col);
                for (j, vector) in basis.iter().take(k).enumerate() {
                    column.scaled_add(ritz_vectors[[j, i]], vector);
                }
            }
            return (values, vectors);
        }

        target = (k + step).min(max_dimension);
    }
}

/// Compute `nev` eigenpairs of a symmetric operator.
///
/// Returns the eigenvalues in ascending order and the eigenvectors as
/// columns. Small operators are solved densely; larger ones through Lanczos
/// iterations with full reorthogonalization, the Krylov subspace growing up
/// to `max_iterations` vectors.
pub fn symmetric_sparse_eigen_solver<O: LinearOperator + ?Sized>(
    operator: &O,
    which: EigenSelection,
    nev: usize,
    max_iterations: usize,
) -> Result<(Array1<f64>, Array2<f64>)> {
    let n = operator.order();
    if nev == 0 || nev > n {
        return Err(SpectraError::InvalidEigenCount {
            requested: nev,
            order: n,
        });
    }

    if n <= DENSE_SOLVER_MAX_ORDER {
        let (values, vectors) = symmetric_eigen(&operator.to_dense())?;
        let selected = which.select(&values, nev);
        return Ok(pick_eigenpairs(&values, &vectors, &selected));
    }

    Ok(lanczos(operator, which, nev, max_iterations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::CsrMatrix;
    use ndarray::array;

    fn assert_eigenpairs(matrix: &Array2<f64>, values: &Array1<f64>, vectors: &Array2<f64>) {
        for (col, &value) in values.iter().enumerate() {
            let vector = vectors.column(col);
            let product = matrix.dot(&vector);
            for (a, b) in product.iter().zip(vector.iter()) {
                assert!(
                    (a - value * b).abs() < 1e-6 * value.abs().max(1.0),
                    "A v != {value} v"
                );
            }
            assert!((vector.dot(&vector) - 1.0).abs() < 1e-8);
        }
    }

    fn diagonal_operator(values: &[f64]) -> CsrMatrix {
        let triplets: Vec<(usize, usize, f64)> =
            values.iter().enumerate().map(|(i, &v)| (i, i, v)).collect();
        CsrMatrix::from_triplets(values.len(), values.len(), &triplets).unwrap()
    }

    #[test]
    fn test_eigen_gap() {
        assert_eq!(eigen_gap(&array![0.0, 0.0, 2.0, 2.5]), 1);
        assert_eq!(eigen_gap(&array![0.0, 1.0, 2.0]), 0);
        assert_eq!(eigen_gap(&array![3.0]), 0);
    }

    #[test]
    fn test_symmetric_eigen_small() {
        let matrix = array![[2.0, 1.0], [1.0, 2.0]];
        let (values, vectors) = symmetric_eigen(&matrix).unwrap();
        assert!((values[0] - 1.0).abs() < 1e-12);
        assert!((values[1] - 3.0).abs() < 1e-12);
        assert_eigenpairs(&matrix, &values, &vectors);
    }

    #[test]
    fn test_symmetric_eigen_path_laplacian() {
        let matrix = array![[1.0, -1.0, 0.0], [-1.0, 2.0, -1.0], [0.0, -1.0, 1.0]];
        let (values, vectors) = symmetric_eigen(&matrix).unwrap();
        for (value, expected) in values.iter().zip([0.0, 1.0, 3.0]) {
            assert!((value - expected).abs() < 1e-10);
        }
        assert_eigenpairs(&matrix, &values, &vectors);
        assert!(symmetric_eigen(&Array2::zeros((2, 3))).is_err());
    }

    #[test]
    fn test_tridiagonal_eigen_matches_jacobi() {
        let diagonal = [4.0, 1.0, -2.0, 3.0];
        let off = [1.0, 0.5, 2.0];
        let mut dense = Array2::zeros((4, 4));
        for i in 0..4 {
            dense[[i, i]] = diagonal[i];
        }
        for i in 0..3 {
            dense[[i, i + 1]] = off[i];
            dense[[i + 1, i]] = off[i];
        }

        let (values, vectors) = tridiagonal_eigen(&diagonal, &off);
        let (expected, _) = symmetric_eigen(&dense).unwrap();
        for (a, b) in values.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-10);
        }
        assert_eigenpairs(&dense, &values, &vectors);
    }

    #[test]
    fn test_selection_on_dense_path() {
        let matrix = diagonal_operator(&[-5.0, 1.0, 2.0, 4.0]);

        let (values, _) =
            symmetric_sparse_eigen_solver(&matrix, EigenSelection::LargestMagnitude, 2, 100).unwrap();
        assert_eq!(values.to_vec(), vec![-5.0, 4.0]);

        let (values, _) =
            symmetric_sparse_eigen_solver(&matrix, EigenSelection::SmallestMagnitude, 2, 100).unwrap();
        assert_eq!(values.to_vec(), vec![1.0, 2.0]);

        let (values, _) =
            symmetric_sparse_eigen_solver(&matrix, EigenSelection::BothEnds, 3, 100).unwrap();
        assert_eq!(values.to_vec(), vec![-5.0, 2.0, 4.0]);
    }

    #[test]
    fn test_invalid_eigen_count() {
        let matrix = diagonal_operator(&[1.0, 2.0]);
        assert!(symmetric_sparse_eigen_solver(&matrix, EigenSelection::SmallestAlgebraic, 0, 10).is_err());
        assert!(symmetric_sparse_eigen_solver(&matrix, EigenSelection::SmallestAlgebraic, 3, 10).is_err());
    }

    #[test]
    fn test_lanczos_smallest_algebraic() {
        let mut diagonal: Vec<f64> = (0..300).map(|i| i as f64).collect();
        diagonal[0] = -1000.0;
        diagonal[1] = -500.0;
        diagonal[2] = -250.0;
        let matrix = diagonal_operator(&diagonal);

        let (values, vectors) =
            symmetric_sparse_eigen_solver(&matrix, EigenSelection::SmallestAlgebraic, 3, 300).unwrap();
        for (value, expected) in values.iter().zip([-1000.0, -500.0, -250.0]) {
            assert!((value - expected).abs() < 1e-6);
        }
        assert_eigenpairs(&matrix.to_dense(), &values, &vectors);
    }

    #[test]
    fn test_lanczos_largest_algebraic() {
        let diagonal: Vec<f64> = (0..200).map(|i| (i * i) as f64).collect();
        let matrix = diagonal_operator(&diagonal);

        let (values, vectors) =
            symmetric_sparse_eigen_solver(&matrix, EigenSelection::LargestAlgebraic, 2, 200).unwrap();
        assert!((values[0] - 198.0 * 198.0).abs() < 1e-6);
        assert!((values[1] - 199.0 * 199.0).abs() < 1e-6);
        assert_eigenpairs(&matrix.to_dense(), &values, &vectors);
    }

    #[test]
    fn test_lanczos_path_laplacian_matches_dense() {
        let n = 120;
        let mut triplets = Vec::new();
        for i in 0..n - 1 {
            triplets.push((i, i + 1, -1.0));
            triplets.push((i + 1, i, -1.0));
            triplets.push((i, i, 1.0));
            triplets.push((i + 1, i + 1, 1.0));
        }
        let matrix = CsrMatrix::from_triplets(n, n, &triplets).unwrap();

        let (values, vectors) =
            symmetric_sparse_eigen_solver(&matrix, EigenSelection::SmallestAlgebraic, 3, n).unwrap();
        for (k, value) in values.iter().enumerate() {
            let expected = 2.0 - 2.0 * (std::f64::consts::PI * k as f64 / n as f64).cos();
            assert!((value - expected).abs() < 1e-6);
        }
        assert_eigenpairs(&matrix.to_dense(), &values, &vectors);
    }
}
