use crate::error::{ClassifyError, Result};
use aci_graph::LabeledGraph;
use aci_spectra::{canonical_angles, subspace_distance};
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

/// Labeled segmentation graph with a distinguished root vertex, typically
/// the segment expected to appear in every image of a character.
#[derive(Debug, Clone, PartialEq)]
pub struct RootedGraph {
    pub graph: LabeledGraph<Vec<f32>>,
    pub root: usize,
}

impl RootedGraph {
    pub fn new(graph: LabeledGraph<Vec<f32>>, root: usize) -> Self {
        Self { graph, root }
    }
}

/// Classifier of whole graphs, trained on labeled examples.
pub trait GraphClassifier {
    /// Train on graphs with the class of each one. Replaces any previous
    /// training.
    fn train(&mut self, samples: &[RootedGraph], classes: &[usize]) -> Result<()>;

    fn predict(&self, sample: &RootedGraph) -> Result<usize>;

    /// Fraction of graphs correctly classified when training on all the
    /// other graphs.
    fn leave_one_out_recognition_rate(&mut self, samples: &[RootedGraph], classes: &[usize]) -> Result<f64> {
        if samples.len() != classes.len() {
            return Err(ClassifyError::SizeMismatch {
                expected: samples.len(),
                actual: classes.len(),
            });
        }
        let n = samples.len();
        if n < 2 {
            return Err(ClassifyError::InvalidParameter(
                "leave one out needs at least two samples".into(),
            ));
        }

        let mut correct = 0;
        for left_out in 0..n {
            let others: Vec<usize> = (0..n).filter(|&i| i != left_out).collect();
            let training: Vec<RootedGraph> = others.iter().map(|&i| samples[i].clone()).collect();
            let training_classes: Vec<usize> = others.iter().map(|&i| classes[i]).collect();

            self.train(&training, &training_classes)?;
            let predicted = self.predict(&samples[left_out])?;
            log::debug!("graph {left_out} classified as {predicted}, expected {}", classes[left_out]);
            if predicted == classes[left_out] {
                correct += 1;
            }
        }

        Ok(correct as f64 / n as f64)
    }
}

/// Similarity between two subspaces given by bases of the same ambient space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubspaceSimilarity {
    /// Mean cosine of the principal angles
    #[default]
    AverageCosine,
    /// Cosine of the smallest principal angle
    LargestCosine,
    /// One minus the sine of the largest principal angle between the
    /// leading `min(p, q)` columns of orthonormal bases
    Distance,
}

impl SubspaceSimilarity {
    pub fn evaluate(&self, a: &Array2<f64>, b: &Array2<f64>) -> Result<f64> {
        match self {
            Self::AverageCosine => Ok(canonical_angles(a, b)?.cosines.mean().unwrap_or(0.0)),
            Self::LargestCosine => Ok(canonical_angles(a, b)?
                .cosines
                .iter()
                .copied()
                .fold(0.0, f64::max)),
            Self::Distance => {
                let columns = a.ncols().min(b.ncols());
                let a = a.slice(s![.., ..columns]).to_owned();
                let b = b.slice(s![.., ..columns]).to_owned();
                Ok(1.0 - subspace_distance(&a, &b)?)
            }
        }
    }
}

/// Rows of `matrix` followed by zero rows up to `rows`
pub(crate) fn zero_padded_rows(matrix: &Array2<f64>, rows: usize) -> Array2<f64> {
    let mut padded = Array2::zeros((rows.max(matrix.nrows()), matrix.ncols()));
    padded.slice_mut(s![..matrix.nrows(), ..]).assign(matrix);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_subspace_similarities() {
        // span{e0, e1} against span{e0, (e1 + e2) / sqrt 2}
        let a = array![[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]];
        let half = 0.5f64.sqrt();
        let b = array![[1.0, 0.0], [0.0, half], [0.0, half]];

        let average = SubspaceSimilarity::AverageCosine.evaluate(&a, &b).unwrap();
        assert!((average - (1.0 + half) / 2.0).abs() < 1e-9);
        let largest = SubspaceSimilarity::LargestCosine.evaluate(&a, &b).unwrap();
        assert!((largest - 1.0).abs() < 1e-9);
        let distance = SubspaceSimilarity::Distance.evaluate(&a, &b).unwrap();
        assert!((distance - (1.0 - half)).abs() < 1e-9);

        assert!(SubspaceSimilarity::AverageCosine
            .evaluate(&a, &array![[1.0], [0.0]])
            .is_err());
    }

    #[test]
    fn test_zero_padded_rows() {
        let padded = zero_padded_rows(&array![[1.0, 2.0]], 3);
        assert_eq!(padded, array![[1.0, 2.0], [0.0, 0.0], [0.0, 0.0]]);
    }
}
