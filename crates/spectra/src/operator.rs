use crate::sparse::CsrMatrix;
use ndarray::{Array1, Array2, ArrayView1};

/// Square linear operator known only through matrix-vector products.
///
/// Solvers that only multiply by the matrix ([`conjugate_gradient`](crate::conjugate_gradient),
/// [`symmetric_sparse_eigen_solver`](crate::symmetric_sparse_eigen_solver)) take any implementor.
pub trait LinearOperator {
    fn order(&self) -> usize;

    /// Compute `A x`. `x` has length [`order`](Self::order).
    fn apply(&self, x: ArrayView1<f64>) -> Array1<f64>;

    /// Materialize the operator by applying it to the canonical basis
    fn to_dense(&self) -> Array2<f64> {
        let n = self.order();
        let mut dense = Array2::zeros((n, n));
        let mut unit = Array1::zeros(n);
        for col in 0..n {
            unit[col] = 1.0;
            dense.column_mut(col).assign(&self.apply(unit.view()));
            unit[col] = 0.0;
        }
        dense
    }
}

impl LinearOperator for CsrMatrix {
    fn order(&self) -> usize {
        self.rows()
    }

    fn apply(&self, x: ArrayView1<f64>) -> Array1<f64> {
        Array1::from_iter(
            (0..self.rows()).map(|row| self.row(row).map(|(col, value)| value * x[col]).sum()),
        )
    }

    fn to_dense(&self) -> Array2<f64> {
        CsrMatrix::to_dense(self)
    }
}

impl LinearOperator for Array2<f64> {
    fn order(&self) -> usize {
        self.nrows()
    }

    fn apply(&self, x: ArrayView1<f64>) -> Array1<f64> {
        self.dot(&x)
    }

    fn to_dense(&self) -> Array2<f64> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sparse_and_dense_agree() {
        let dense = array![[2.0, -1.0], [-1.0, 2.0]];
        let sparse =
            CsrMatrix::from_triplets(2, 2, &[(0, 0, 2.0), (0, 1, -1.0), (1, 0, -1.0), (1, 1, 2.0)])
                .unwrap();
        let x = array![1.0, 3.0];

        assert_eq!(dense.apply(x.view()), sparse.apply(x.view()));
        assert_eq!(LinearOperator::to_dense(&sparse), dense);
    }
}
