use crate::error::{Result, SpectraError};
use crate::svd::svd;
use ndarray::{s, Array1, Array2};

const INTERSECTION_TOLERANCE: f64 = 1e-7;

fn check_rows(a: &Array2<f64>, b: &Array2<f64>) -> Result<()> {
    if a.nrows() != b.nrows() {
        return Err(SpectraError::DimensionMismatch {
            expected: a.nrows(),
            actual: b.nrows(),
        });
    }
    Ok(())
}

/// Orthonormal basis of the range of `a`, as columns
fn orthonormal_range(a: &Array2<f64>) -> Array2<f64> {
    let decomposition = svd(a);
    let rank = decomposition.rank();
    decomposition.u.slice(s![.., ..rank]).to_owned()
}

/// Orthogonal `Q` minimizing `|A - BQ|` (Frobenius norm), for `m x p`
/// matrices `A` and `B`. Orthogonal Procrustes problem.
pub fn subspaces_rotation(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>> {
    check_rows(a, b)?;
    if a.ncols() != b.ncols() {
        return Err(SpectraError::DimensionMismatch {
            expected: a.ncols(),
            actual: b.ncols(),
        });
    }

    let decomposition = svd(&b.t().dot(a));
    Ok(decomposition.u.dot(&decomposition.v.t()))
}

/// Basis (as columns) of the intersection of the null spaces of `A`
/// (`m x n`) and `B` (`p x n`). Has no column when the intersection is
/// trivial.
pub fn null_spaces_intersection(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>> {
    let n = a.ncols();
    if b.ncols() != n {
        return Err(SpectraError::DimensionMismatch {
            expected: n,
            actual: b.ncols(),
        });
    }

    let a_decomposition = svd(a);
    let r = a_decomposition.rank();
    if r == n {
        return Ok(Array2::zeros((n, 0)));
    }

    let null_a = a_decomposition.full_v().slice(s![.., r..]).to_owned();
    let c = b.dot(&null_a);
    let c_decomposition = svd(&c);
    let q = c_decomposition.rank();
    if q == n - r {
        return Ok(Array2::zeros((n, 0)));
    }

    let null_c = c_decomposition.full_v().slice(s![.., q..]).to_owned();
    Ok(null_a.dot(&null_c))
}

/// Principal vectors and angles between `range(A)` and `range(B)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalAngles {
    /// Principal vectors of `range(A)`, as columns
    pub u: Array2<f64>,
    /// Principal vectors of `range(B)`, as columns
    pub v: Array2<f64>,
    /// Cosines of the principal angles, in decreasing order
    pub cosines: Array1<f64>,
}

/// Principal angles between the ranges of `A` (`m x p`) and `B` (`m x q`).
///
/// There are `min(rank A, rank B)` angles.
pub fn canonical_angles(a: &Array2<f64>, b: &Array2<f64>) -> Result<CanonicalAngles> {
    check_rows(a, b)?;
    let qa = orthonormal_range(a);
    let qb = orthonormal_range(b);

    if qa.ncols() < qb.ncols() {
        let swapped = canonical_angles_of_bases(&qb, &qa);
        return Ok(CanonicalAngles {
            u: swapped.v,
            v: swapped.u,
            cosines: swapped.cosines,
        });
    }

    Ok(canonical_angles_of_bases(&qa, &qb))
}

fn canonical_angles_of_bases(qa: &Array2<f64>, qb: &Array2<f64>) -> CanonicalAngles {
    let q = qb.ncols();
    let decomposition = svd(&qa.t().dot(qb));

    let u = qa.dot(&decomposition.u.slice(s![.., ..q]));
    let v = qb.dot(&decomposition.v);
    let cosines = decomposition
        .singular_values
        .slice(s![..q])
        .mapv(|cosine| cosine.clamp(0.0, 1.0));

    CanonicalAngles { u, v, cosines }
}

/// Orthonormal basis of `range(A) ∩ range(B)`, as columns
pub fn subspaces_intersection(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>> {
    let angles = canonical_angles(a, b)?;
    let dimension = angles
        .cosines
        .iter()
        .take_while(|&&cosine| cosine >= 1.0 - INTERSECTION_TOLERANCE)
        .count();

    Ok(angles.u.slice(s![.., ..dimension]).to_owned())
}

/// Distance between two equidimensional subspaces given by orthonormal
/// bases: the sine of their largest principal angle.
pub fn subspace_distance(a: &Array2<f64>, b: &Array2<f64>) -> Result<f64> {
    check_rows(a, b)?;
    if a.ncols() != b.ncols() {
        return Err(SpectraError::DimensionMismatch {
            expected: a.ncols(),
            actual: b.ncols(),
        });
    }

    let decomposition = svd(&a.t().dot(b));
    let smallest = decomposition
        .singular_values
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min)
        .min(1.0);

    Ok((1.0 - smallest * smallest).max(0.0).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn assert_close(a: &Array2<f64>, b: &Array2<f64>) {
        assert_eq!(a.dim(), b.dim());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9, "{a} != {b}");
        }
    }

    #[test]
    fn test_rotation_recovers_orthogonal_transform() {
        let b = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let rotation = array![[0.0, -1.0], [1.0, 0.0]];
        let a = b.dot(&rotation);

        let q = subspaces_rotation(&a, &b).unwrap();
        assert_close(&q, &rotation);
    }

    #[test]
    fn test_null_spaces_intersection() {
        // null(A) = span(e2, e3), null(B) = span(e1, e3)
        let a = array![[1.0, 0.0, 0.0]];
        let b = array![[0.0, 1.0, 0.0]];
        let y = null_spaces_intersection(&a, &b).unwrap();

        assert_eq!(y.dim(), (3, 1));
        assert!(y[[0, 0]].abs() < 1e-10);
        assert!(y[[1, 0]].abs() < 1e-10);
        assert!((y[[2, 0]].abs() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_trivial_null_spaces_intersection() {
        let a = array![[1.0, 0.0], [0.0, 1.0]];
        let b = array![[1.0, 1.0]];
        assert_eq!(null_spaces_intersection(&a, &b).unwrap().ncols(), 0);
    }

    #[test]
    fn test_canonical_angles_between_planes() {
        let a = array![[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]];
        let b = array![[1.0, 0.0], [0.0, 0.0], [0.0, 1.0]];
        let angles = canonical_angles(&a, &b).unwrap();

        assert!((angles.cosines[0] - 1.0).abs() < 1e-10);
        assert!(angles.cosines[1].abs() < 1e-10);

        let intersection = subspaces_intersection(&a, &b).unwrap();
        assert_eq!(intersection.ncols(), 1);
        assert!((intersection[[0, 0]].abs() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_canonical_angles_swap_when_a_is_smaller() {
        let a = array![[1.0], [0.0], [0.0]];
        let b = array![[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]];
        let angles = canonical_angles(&a, &b).unwrap();

        assert_eq!(angles.cosines.len(), 1);
        assert_eq!(angles.u.dim(), (3, 1));
        assert!((angles.cosines[0] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_subspace_distance() {
        let a = array![[1.0], [0.0]];
        let b = array![[1.0], [0.0]];
        assert!(subspace_distance(&a, &b).unwrap().abs() < 1e-10);

        let orthogonal = array![[0.0], [1.0]];
        assert!((subspace_distance(&a, &orthogonal).unwrap() - 1.0).abs() < 1e-10);

        let diagonal = array![[std::f64::consts::FRAC_1_SQRT_2], [std::f64::consts::FRAC_1_SQRT_2]];
        let expected = std::f64::consts::FRAC_1_SQRT_2;
        assert!((subspace_distance(&a, &diagonal).unwrap() - expected).abs() < 1e-10);
    }
}
