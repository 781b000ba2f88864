use ndarray::{Array1, Array2, ArrayView2};

const SVD_MAX_SWEEPS: usize = 64;

/// Thin singular value decomposition `A = U diag(S) Vᵀ`
#[derive(Debug, Clone, PartialEq)]
pub struct Svd {
    /// `m x k` with orthonormal columns, `k = min(m, n)`
    pub u: Array2<f64>,
    /// Singular values in decreasing order
    pub singular_values: Array1<f64>,
    /// `n x k` with orthonormal columns
    pub v: Array2<f64>,
}

impl Svd {
    /// Numerical rank, counting singular values above `max(m, n) * eps * s_max`
    pub fn rank(&self) -> usize {
        let Some(&largest) = self.singular_values.first() else {
            return 0;
        };
        let dimension = self.u.nrows().max(self.v.nrows()) as f64;
        let threshold = dimension * f64::EPSILON * largest;
        self.singular_values
            .iter()
            .filter(|&&value| value > threshold)
            .count()
    }

    /// `V` completed into an orthonormal basis of the whole row space `R^n`
    pub fn full_v(&self) -> Array2<f64> {
        complete_orthonormal_basis(&self.v)
    }
}

/// Extend orthonormal columns into an orthonormal basis of `R^rows`
pub fn complete_orthonormal_basis(columns: &Array2<f64>) -> Array2<f64> {
    let rows = columns.nrows();
    let mut basis: Vec<Array1<f64>> = columns.columns().into_iter().map(|c| c.to_owned()).collect();

    for i in 0..rows {
        if basis.len() >= rows {
            break;
        }
        let mut candidate = Array1::zeros(rows);
        candidate[i] = 1.0;
        for _ in 0..2 {
            for vector in &basis {
                let projection = candidate.dot(vector);
                candidate.scaled_add(-projection, vector);
            }
        }
        let norm = candidate.dot(&candidate).sqrt();
        if norm > 1e-8 {
            basis.push(candidate / norm);
        }
    }

    let mut result = Array2::zeros((rows, basis.len()));
    for (col, vector) in basis.iter().enumerate() {
        result.column_mut(col).assign(vector);
    }
    result
}

/// Replace zero columns by unit vectors orthogonal to the other columns
fn fill_null_columns(u: &mut Array2<f64>, singular_values: &Array1<f64>, threshold: f64) {
    let rows = u.nrows();
    for col in 0..u.ncols() {
        if singular_values[col] > threshold {
            continue;
        }

        for i in 0..rows {
            let mut candidate = Array1::zeros(rows);
            candidate[i] = 1.0;
            for _ in 0..2 {
                for other in 0..u.ncols() {
                    if other == col {
                        continue;
                    }
                    let column = u.column(other);
                    let projection = candidate.dot(&column);
                    candidate.scaled_add(-projection, &column);
                }
            }
            let norm = candidate.dot(&candidate).sqrt();
            if norm > 1e-8 {
                u.column_mut(col).assign(&(candidate / norm));
                break;
            }
        }
    }
}

fn one_sided_jacobi(a: ArrayView2<f64>) -> Svd {
    let (m, n) = a.dim();
    let mut u = a.to_owned();
    let mut v: Array2<f64> = Array2::eye(n);

    for sweep in 0..SVD_MAX_SWEEPS {
        let mut rotated = false;

        for p in 0..n {
            for q in p + 1..n {
                let up = u.column(p);
                let uq = u.column(q);
                let alpha = up.dot(&up);
                let beta = uq.dot(&uq);
                let gamma = up.dot(&uq);

                if gamma.abs() <= f64::EPSILON * (alpha * beta).sqrt() || gamma == 0.0 {
                    continue;
                }
                rotated = true;

                let zeta = (beta - alpha) / (2.0 * gamma);
                let t = zeta.signum() / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = c * t;

                for k in 0..m {
                    let ukp = u[[k, p]];
                    let ukq = u[[k, q]];
                    u[[k, p]] = c * ukp - s * ukq;
                    u[[k, q]] = s * ukp + c * ukq;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }

        if !rotated {
            log::debug!("one-sided jacobi converged after {sweep} sweeps");
            break;
        }
    }

    let norms = Array1::from_iter(u.columns().into_iter().map(|c| c.dot(&c).sqrt()));
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| norms[b].total_cmp(&norms[a]));

    let largest = order.first().map_or(0.0, |&i| norms[i]);
    let threshold = m.max(n) as f64 * f64::EPSILON * largest;

    let mut sorted_u = Array2::zeros((m, n));
    let mut sorted_v = Array2::zeros((n, n));
    let mut singular_values = Array1::zeros(n);
    for (col, &i) in order.iter().enumerate() {
        singular_values[col] = norms[i];
        sorted_v.column_mut(col).assign(&v.column(i));
        if norms[i] > threshold {
            sorted_u.column_mut(col).assign(&(&u.column(i) / norms[i]));
        }
    }
    fill_null_columns(&mut sorted_u, &singular_values, threshold);

    Svd {
        u: sorted_u,
        singular_values,
        v: sorted_v,
    }
}

/// Thin SVD by one-sided Jacobi rotations
pub fn svd(a: &Array2<f64>) -> Svd {
    let (m, n) = a.dim();
    if m >= n {
        return one_sided_jacobi(a.view());
    }

    // A = U S Vᵀ  <=>  Aᵀ = V S Uᵀ
    let transposed = one_sided_jacobi(a.t());
    Svd {
        u: transposed.v,
        singular_values: transposed.singular_values,
        v: transposed.u,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn reconstruct(svd: &Svd) -> Array2<f64> {
        let scaled = &svd.u * &svd.singular_values;
        scaled.dot(&svd.v.t())
    }

    fn assert_close(a: &Array2<f64>, b: &Array2<f64>) {
        assert_eq!(a.dim(), b.dim());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-10, "{a} != {b}");
        }
    }

    fn assert_orthonormal_columns(matrix: &Array2<f64>) {
        let gram = matrix.t().dot(matrix);
        assert_close(&gram, &Array2::eye(matrix.ncols()));
    }

    #[test]
    fn test_tall_matrix() {
        let a = array![[3.0, 0.0], [4.0, 5.0], [0.0, 0.0]];
        let decomposition = svd(&a);

        assert_close(&reconstruct(&decomposition), &a);
        assert_orthonormal_columns(&decomposition.u);
        assert_orthonormal_columns(&decomposition.v);
        // singular values of [[3, 0], [4, 5]] are 3√5 and √5
        assert!((decomposition.singular_values[0] - 45f64.sqrt()).abs() < 1e-10);
        assert!((decomposition.singular_values[1] - 5f64.sqrt()).abs() < 1e-10);
        assert_eq!(decomposition.rank(), 2);
    }

    #[test]
    fn test_wide_matrix() {
        let a = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let decomposition = svd(&a);

        assert_eq!(decomposition.u.dim(), (2, 2));
        assert_eq!(decomposition.v.dim(), (3, 2));
        assert_close(&reconstruct(&decomposition), &a);
        assert_orthonormal_columns(&decomposition.v);
    }

    #[test]
    fn test_rank_deficient_matrix_keeps_orthonormal_u() {
        let a = array![[1.0, 1.0], [1.0, 1.0]];
        let decomposition = svd(&a);

        assert_eq!(decomposition.rank(), 1);
        assert!(decomposition.singular_values[1].abs() < 1e-12);
        assert_orthonormal_columns(&decomposition.u);
        assert_close(&reconstruct(&decomposition), &a);
    }

    #[test]
    fn test_full_v_completes_basis() {
        let a = array![[1.0, 0.0, 0.0]];
        let decomposition = svd(&a);
        let full = decomposition.full_v();
        assert_eq!(full.dim(), (3, 3));
        assert_orthonormal_columns(&full);
    }
}
