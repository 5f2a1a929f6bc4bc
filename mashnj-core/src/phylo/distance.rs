use crate::error::{MashError, MashResult};

/// Dense symmetric distance matrix with row/column labels.
///
/// Stored row-major; `labels[i]` names both row `i` and column `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    labels: Vec<Box<str>>,
    data: Vec<f64>,
    n: usize,
}

impl DistanceMatrix {
    pub fn new(labels: Vec<Box<str>>, data: Vec<f64>) -> Self {
        let n = labels.len();
        assert_eq!(
            data.len(),
            n * n,
            "distance matrix data length mismatch: expected {}, got {}",
            n * n,
            data.len()
        );
        Self { labels, data, n }
    }

    /// Build from nested rows, checking that the matrix is square and
    /// matches the label count.
    pub fn from_rows(labels: Vec<Box<str>>, rows: Vec<Vec<f64>>) -> MashResult<Self> {
        let n = labels.len();
        if rows.len() != n {
            return Err(MashError::ShapeMismatch {
                msg: format!("{n} labels but {} rows", rows.len()),
            });
        }
        let mut data = Vec::with_capacity(n * n);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n {
                return Err(MashError::ShapeMismatch {
                    msg: format!("row {i} has {} values, expected {n}", row.len()),
                });
            }
            data.extend(row);
        }
        Ok(Self { labels, data, n })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn labels(&self) -> &[Box<str>] {
        &self.labels
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks(0) panics
        self.data.chunks(self.n.max(1))
    }

    /// Sets both `(i, j)` and `(j, i)`.
    pub fn set(&mut self, i: usize, j: usize, val: f64) {
        self.data[i * self.n + j] = val;
        self.data[j * self.n + i] = val;
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| &**l == label)
    }

    /// Distance between two labelled taxa.
    pub fn between(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.get(self.index_of(a)?, self.index_of(b)?))
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.n).all(|i| ((i + 1)..self.n).all(|j| self.get(i, j) == self.get(j, i)))
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(<[f64]>::to_vec).collect()
    }
}
