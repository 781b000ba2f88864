use ndarray::Array2;

/// Square matrix of pairwise similarities (or distances) between samples
pub trait SimilarityMatrix {
    fn get(&self, i: usize, j: usize) -> f64;

    fn rows(&self) -> usize;

    fn cols(&self) -> usize {
        self.rows()
    }
}

/// Similarity matrix stored densely
#[derive(Debug, Clone, PartialEq)]
pub struct DenseSimilarityMatrix {
    matrix: Array2<f64>,
}

impl DenseSimilarityMatrix {
    pub fn new(matrix: Array2<f64>) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }
}

impl SimilarityMatrix for DenseSimilarityMatrix {
    fn get(&self, i: usize, j: usize) -> f64 {
        self.matrix[[i, j]]
    }

    fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    fn cols(&self) -> usize {
        self.matrix.ncols()
    }
}

/// Principal sub-matrix of another similarity matrix.
///
/// Element `(i, j)` is element `(indexes[i], indexes[j])` of the inner matrix.
pub struct MaskedSimilarityMatrix<'a> {
    inner: &'a dyn SimilarityMatrix,
    indexes: Vec<usize>,
}

impl<'a> MaskedSimilarityMatrix<'a> {
    pub fn new(inner: &'a dyn SimilarityMatrix, indexes: Vec<usize>) -> Self {
        Self { inner, indexes }
    }

    /// Keep the indexes whose mask value is `true`
    pub fn from_mask(inner: &'a dyn SimilarityMatrix, mask: &[bool]) -> Self {
        let indexes = mask
            .iter()
            .enumerate()
            .filter(|&(_, &kept)| kept)
            .map(|(index, _)| index)
            .collect();
        Self::new(inner, indexes)
    }

    pub fn indexes(&self) -> &[usize] {
        &self.indexes
    }
}

impl SimilarityMatrix for MaskedSimilarityMatrix<'_> {
    fn get(&self, i: usize, j: usize) -> f64 {
        self.inner.get(self.indexes[i], self.indexes[j])
    }

    fn rows(&self) -> usize {
        self.indexes.len()
    }
}

/// Similarity computed on demand from samples and a similarity function
pub struct FunctionSimilarityMatrix<T, F>
where
    F: Fn(&T, &T) -> f64,
{
    samples: Vec<T>,
    function: F,
}

impl<T, F> FunctionSimilarityMatrix<T, F>
where
    F: Fn(&T, &T) -> f64,
{
    pub fn new(samples: Vec<T>, function: F) -> Self {
        Self { samples, function }
    }

    pub fn samples(&self) -> &[T] {
        &self.samples
    }

    /// Evaluate every pair once into a dense matrix
    pub fn to_dense(&self) -> DenseSimilarityMatrix {
        let n = self.samples.len();
        let mut matrix = Array2::zeros((n, n));
        for i in 0..n {
            for j in i..n {
                let value = (self.function)(&self.samples[i], &self.samples[j]);
                matrix[[i, j]] = value;
                matrix[[j, i]] = value;
            }
        }
        DenseSimilarityMatrix::new(matrix)
    }
}

impl<T, F> SimilarityMatrix for FunctionSimilarityMatrix<T, F>
where
    F: Fn(&T, &T) -> f64,
{
    fn get(&self, i: usize, j: usize) -> f64 {
        (self.function)(&self.samples[i], &self.samples[j])
    }

    fn rows(&self) -> usize {
        self.samples.len()
    }
}
