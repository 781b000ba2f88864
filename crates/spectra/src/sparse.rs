use crate::error::{Result, SpectraError};
use ndarray::{Array1, Array2, ArrayView1};

/// Compressed sparse row matrix of `f64`
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl CsrMatrix {
    /// Build a matrix from `(row, col, value)` triplets. Duplicate entries are summed.
    pub fn from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, f64)]) -> Result<Self> {
        let mut sorted = triplets.to_vec();
        for &(row, col, _) in &sorted {
            if row >= rows || col >= cols {
                return Err(SpectraError::TripletOutOfBounds {
                    row,
                    col,
                    rows,
                    cols,
                });
            }
        }
        sorted.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut indptr = vec![0usize; rows + 1];
        let mut indices = Vec::with_capacity(sorted.len());
        let mut data: Vec<f64> = Vec::with_capacity(sorted.len());
        let mut last: Option<(usize, usize)> = None;

        for (row, col, value) in sorted {
            if last == Some((row, col)) {
                if let Some(previous) = data.last_mut() {
                    *previous += value;
                }
                continue;
            }
            indices.push(col);
            data.push(value);
            indptr[row + 1] += 1;
            last = Some((row, col));
        }

        for row in 0..rows {
            indptr[row + 1] += indptr[row];
        }

        Ok(Self {
            rows,
            cols,
            indptr,
            indices,
            data,
        })
    }

    /// Matrix without any stored entry
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            indptr: vec![0; rows + 1],
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Stored `(col, value)` entries of a row
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.indptr[row]..self.indptr[row + 1];
        self.indices[range.clone()]
            .iter()
            .copied()
            .zip(self.data[range].iter().copied())
    }

    /// All stored entries as `(row, col, value)` in row-major order
    pub fn triplets(&self) -> Vec<(usize, usize, f64)> {
        (0..self.rows)
            .flat_map(|row| self.row(row).map(move |(col, value)| (row, col, value)))
            .collect()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        let range = self.indptr[row]..self.indptr[row + 1];
        match self.indices[range.clone()].binary_search(&col) {
            Ok(offset) => self.data[range.start + offset],
            Err(_) => 0.0,
        }
    }

    pub fn mul_vec(&self, x: ArrayView1<f64>) -> Result<Array1<f64>> {
        if x.len() != self.cols {
            return Err(SpectraError::DimensionMismatch {
                expected: self.cols,
                actual: x.len(),
            });
        }

        Ok(Array1::from_iter(
            (0..self.rows).map(|row| self.row(row).map(|(col, value)| value * x[col]).sum()),
        ))
    }

    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::zeros((self.rows, self.cols));
        for (row, col, value) in self.triplets() {
            dense[[row, col]] = value;
        }
        dense
    }

    pub fn diagonal(&self) -> Array1<f64> {
        Array1::from_iter((0..self.rows.min(self.cols)).map(|i| self.get(i, i)))
    }

    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        self.rows == self.cols
            && self
                .triplets()
                .into_iter()
                .all(|(row, col, value)| (value - self.get(col, row)).abs() <= tolerance)
    }

    /// Copy of the matrix without the line and the column `index`.
    ///
    /// Used to ground a vertex of a Laplacian.
    pub fn remove_line_col(&self, index: usize) -> Result<Self> {
        if self.rows != self.cols {
            return Err(SpectraError::NotSquare {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if index >= self.rows {
            return Err(SpectraError::DimensionMismatch {
                expected: self.rows,
                actual: index,
            });
        }

        let shift = |i: usize| if i > index { i - 1 } else { i };
        let triplets: Vec<(usize, usize, f64)> = self
            .triplets()
            .into_iter()
            .filter(|&(row, col, _)| row != index && col != index)
            .map(|(row, col, value)| (shift(row), shift(col), value))
            .collect();

        Self::from_triplets(self.rows - 1, self.cols - 1, &triplets)
    }

    /// Scale every entry `(i, j)` by `left[i] * right[j]`
    pub fn scale(&mut self, left: &Array1<f64>, right: &Array1<f64>) {
        for row in 0..self.rows {
            for offset in self.indptr[row]..self.indptr[row + 1] {
                self.data[offset] *= left[row] * right[self.indices[offset]];
            }
        }
    }
}
