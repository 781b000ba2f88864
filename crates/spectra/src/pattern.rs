use crate::eigen::symmetric_eigen;
use crate::error::{Result, SpectraError};
use crate::laplacian::laplacian;
use aci_graph::WeightedGraph;
use ndarray::{s, Array1, Array2};

/// The `n` first power sums `p_r = Σ x_i^r`, `r = 1..=n`, of the `n` inputs
pub fn power_symmetric_polynomials(inputs: &Array1<f64>) -> Array1<f64> {
    let mut terms = Array1::ones(inputs.len());
    let mut results = Array1::zeros(inputs.len());

    for r in 0..inputs.len() {
        terms *= inputs;
        results[r] = terms.sum();
    }

    results
}

/// The `n` first elementary symmetric polynomials `e_1..=e_n` of the `n`
/// inputs, through Newton's identities
/// `r e_r = Σ_{k=1..=r} (-1)^(k-1) e_(r-k) p_k`.
pub fn elementary_symmetric_polynomials(inputs: &Array1<f64>) -> Array1<f64> {
    let n = inputs.len();
    let power_sums = power_symmetric_polynomials(inputs);
    let mut elementary = vec![0.0; n + 1];
    elementary[0] = 1.0;

    for r in 1..=n {
        let mut sum = 0.0;
        let mut sign = 1.0;
        for k in 1..=r {
            sum += sign * elementary[r - k] * power_sums[k - 1];
            sign = -sign;
        }
        elementary[r] = sum / r as f64;
    }

    Array1::from_iter(elementary.into_iter().skip(1))
}

fn signed_log(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x.signum() * x.abs().ln_1p()
    }
}

/// Pattern vectors (Wilson, Luo and Hancock) of a set of graphs.
///
/// Each Laplacian is padded with zeros to `max_graph_size`, and the `k`
/// smallest eigenpairs after those introduced by padding are kept. Each
/// eigenvector scaled by the square root of its eigenvalue goes through the
/// elementary symmetric polynomials, and the results are log scaled. Each
/// pattern vector has `max_graph_size * k` components, in row-major order of
/// the `max_graph_size x k` matrix of polynomial values.
pub fn pattern_vectors(
    graphs: &[WeightedGraph],
    k: usize,
    max_graph_size: usize,
) -> Result<Vec<Array1<f64>>> {
    graphs
        .iter()
        .map(|graph| pattern_vector(graph, k, max_graph_size))
        .collect()
}

fn pattern_vector(graph: &WeightedGraph, k: usize, max_graph_size: usize) -> Result<Array1<f64>> {
    let order = graph.number_of_vertices();
    if order > max_graph_size {
        return Err(SpectraError::DimensionMismatch {
            expected: max_graph_size,
            actual: order,
        });
    }
    if k >= order {
        return Err(SpectraError::GraphTooSmall {
            requested: k,
            order,
        });
    }

    let mut padded = Array2::zeros((max_graph_size, max_graph_size));
    padded
        .slice_mut(s![..order, ..order])
        .assign(&laplacian(graph));

    let (values, vectors) = symmetric_eigen(&padded)?;
    // padding adds isolated vertices, each one more zero eigenvalue
    let skipped = max_graph_size - order + 1;

    let mut polynomials = Array2::zeros((max_graph_size, k));
    for j in 0..k {
        let value = values[skipped + j];
        let scale = if value > 0.0 { value.sqrt() } else { 0.0 };
        let column = vectors.column(skipped + j).mapv(|x| x * scale);
        polynomials
            .column_mut(j)
            .assign(&elementary_symmetric_polynomials(&column));
    }

    Ok(Array1::from_iter(polynomials.iter().map(|&x| signed_log(x))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use proptest::prelude::*;

    #[test]
    fn test_power_sums() {
        let sums = power_symmetric_polynomials(&array![1.0, 2.0, 3.0]);
        assert_eq!(sums, array![6.0, 14.0, 36.0]);
    }

    #[test]
    fn test_elementary_polynomials() {
        let elementary = elementary_symmetric_polynomials(&array![1.0, 2.0, 3.0]);
        for (value, expected) in elementary.iter().zip([6.0, 11.0, 6.0]) {
            assert!((value - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_pattern_vectors_have_padded_length() {
        let mut triangle = WeightedGraph::new(3);
        triangle.add_edge(0, 1, 1.0);
        triangle.add_edge(1, 2, 1.0);
        triangle.add_edge(2, 0, 1.0);

        let mut path = WeightedGraph::new(4);
        path.add_edge(0, 1, 1.0);
        path.add_edge(1, 2, 1.0);
        path.add_edge(2, 3, 1.0);

        let vectors = pattern_vectors(&[triangle, path], 2, 4).unwrap();
        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|vector| vector.len() == 8));
        assert!(vectors.iter().flatten().all(|x| x.is_finite()));
    }

    #[test]
    fn test_pattern_vectors_reject_small_graphs() {
        let graph = WeightedGraph::new(2);
        assert!(matches!(
            pattern_vectors(&[graph.clone()], 2, 2),
            Err(SpectraError::GraphTooSmall { .. })
        ));
        assert!(pattern_vectors(&[graph], 1, 1).is_err());
    }

    proptest! {
        #[test]
        fn proptest_elementary_polynomials_are_polynomial_coefficients(
            roots in proptest::collection::vec(-2.0f64..2.0, 1..6)
        ) {
            // Π (t + x_i) = Σ e_r t^(n-r)
            let inputs = Array1::from(roots.clone());
            let elementary = elementary_symmetric_polynomials(&inputs);

            let mut coefficients = vec![1.0];
            for &root in &roots {
                let mut next = vec![0.0; coefficients.len() + 1];
                for (i, &c) in coefficients.iter().enumerate() {
                    next[i] += c;
                    next[i + 1] += c * root;
                }
                coefficients = next;
            }

            for r in 1..=roots.len() {
                prop_assert!((elementary[r - 1] - coefficients[r]).abs() < 1e-6);
            }
        }
    }
}
