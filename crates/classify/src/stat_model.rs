use crate::error::{ClassifyError, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use std::collections::BTreeMap;

/// Relative floor on per-class variances, as a fraction of the largest
/// feature variance
const VARIANCE_FLOOR: f64 = 1e-9;

/// Supervised classifier over row samples.
pub trait TrainableStatModel {
    /// Train on row samples with the class of each row. Replaces any
    /// previous training.
    fn train(&mut self, samples: ArrayView2<f64>, classes: &[usize]) -> Result<()>;

    fn predict(&self, sample: ArrayView1<f64>) -> Result<usize>;

    fn clear(&mut self);

    /// Fraction of samples correctly classified when training on all the
    /// other samples.
    fn leave_one_out_cross_validation(&mut self, samples: ArrayView2<f64>, classes: &[usize]) -> Result<f64> {
        check_samples(samples, classes)?;
        let n = samples.nrows();
        if n < 2 {
            return Err(ClassifyError::InvalidParameter(
                "leave one out needs at least two samples".into(),
            ));
        }

        let mut correct = 0;
        for left_out in 0..n {
            let others: Vec<usize> = (0..n).filter(|&i| i != left_out).collect();
            let training = samples.select(Axis(0), &others);
            let training_classes: Vec<usize> = others.iter().map(|&i| classes[i]).collect();

            self.clear();
            self.train(training.view(), &training_classes)?;
            let predicted = self.predict(samples.row(left_out))?;
            log::debug!("sample {left_out} classified as {predicted}, expected {}", classes[left_out]);
            if predicted == classes[left_out] {
                correct += 1;
            }
        }

        Ok(correct as f64 / n as f64)
    }
}

fn check_samples(samples: ArrayView2<f64>, classes: &[usize]) -> Result<()> {
    if samples.nrows() != classes.len() {
        return Err(ClassifyError::SizeMismatch {
            expected: samples.nrows(),
            actual: classes.len(),
        });
    }
    if samples.nrows() == 0 {
        return Err(ClassifyError::InvalidParameter("no training samples".into()));
    }
    Ok(())
}

fn check_dimension(expected: usize, sample: ArrayView1<f64>) -> Result<()> {
    if sample.len() != expected {
        return Err(ClassifyError::SizeMismatch {
            expected,
            actual: sample.len(),
        });
    }
    Ok(())
}

/// K nearest neighbours by Euclidean distance with a majority vote. Ties
/// between classes go to the class of the nearest neighbour among them.
#[derive(Debug, Clone, Default)]
pub struct KNearestModel {
    k: usize,
    samples: Option<Array2<f64>>,
    classes: Vec<usize>,
}

impl KNearestModel {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            samples: None,
            classes: Vec::new(),
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

impl TrainableStatModel for KNearestModel {
    fn train(&mut self, samples: ArrayView2<f64>, classes: &[usize]) -> Result<()> {
        if self.k == 0 {
            return Err(ClassifyError::InvalidParameter("k must be positive".into()));
        }
        check_samples(samples, classes)?;
        self.samples = Some(samples.to_owned());
        self.classes = classes.to_vec();
        Ok(())
    }

    fn predict(&self, sample: ArrayView1<f64>) -> Result<usize> {
        let samples = self.samples.as_ref().ok_or(ClassifyError::NotTrained)?;
        check_dimension(samples.ncols(), sample)?;

        let mut by_distance: Vec<(f64, usize)> = samples
            .rows()
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                let distance = (&row - &sample).mapv(|x| x * x).sum();
                (distance, index)
            })
            .collect();
        by_distance.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        // (votes, rank of the nearest voter) per class
        let mut votes: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
        for (rank, &(_, index)) in by_distance.iter().take(self.k).enumerate() {
            let entry = votes.entry(self.classes[index]).or_insert((0, rank));
            entry.0 += 1;
        }

        votes
            .into_iter()
            .max_by(|(_, (votes_a, rank_a)), (_, (votes_b, rank_b))| {
                votes_a.cmp(votes_b).then(rank_b.cmp(rank_a))
            })
            .map(|(class, _)| class)
            .ok_or(ClassifyError::NotTrained)
    }

    fn clear(&mut self) {
        self.samples = None;
        self.classes.clear();
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ClassStatistics {
    class: usize,
    log_prior: f64,
    mean: Array1<f64>,
    variance: Array1<f64>,
}

/// Gaussian naive Bayes classifier
#[derive(Debug, Clone, Default)]
pub struct BayesModel {
    statistics: Vec<ClassStatistics>,
}

impl BayesModel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrainableStatModel for BayesModel {
    fn train(&mut self, samples: ArrayView2<f64>, classes: &[usize]) -> Result<()> {
        check_samples(samples, classes)?;

        let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (index, &class) in classes.iter().enumerate() {
            members.entry(class).or_default().push(index);
        }

        let largest_variance = samples
            .var_axis(Axis(0), 0.0)
            .iter()
            .copied()
            .fold(0.0, f64::max);
        let floor = (largest_variance * VARIANCE_FLOOR).max(f64::MIN_POSITIVE);
        let n = samples.nrows() as f64;

        self.statistics = members
            .into_iter()
            .map(|(class, indexes)| {
                let rows = samples.select(Axis(0), &indexes);
                let mean = rows.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(samples.ncols()));
                let variance = rows.var_axis(Axis(0), 0.0).mapv(|v| v.max(floor));
                ClassStatistics {
                    class,
                    log_prior: (indexes.len() as f64 / n).ln(),
                    mean,
                    variance,
                }
            })
            .collect();

        Ok(())
    }

    fn predict(&self, sample: ArrayView1<f64>) -> Result<usize> {
        let first = self.statistics.first().ok_or(ClassifyError::NotTrained)?;
        check_dimension(first.mean.len(), sample)?;

        let log_posterior = |statistics: &ClassStatistics| -> f64 {
            let likelihood: f64 = sample
                .iter()
                .zip(statistics.mean.iter().zip(statistics.variance.iter()))
                .map(|(&x, (&mean, &variance))| {
                    -0.5 * ((2.0 * std::f64::consts::PI * variance).ln() + (x - mean).powi(2) / variance)
                })
                .sum();
            statistics.log_prior + likelihood
        };

        let mut best = (first.class, log_posterior(first));
        for statistics in &self.statistics[1..] {
            let value = log_posterior(statistics);
            if value > best.1 {
                best = (statistics.class, value);
            }
        }
        Ok(best.0)
    }

    fn clear(&mut self) {
        self.statistics.clear();
    }
}
