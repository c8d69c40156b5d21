/// Sparse vector stored as parallel, index-sorted arrays.
///
/// Indices are strictly increasing; explicit zeros may be present.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseVector {
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    /// Build from unsorted `(index, value)` pairs. Repeated indices are summed.
    pub(crate) fn from_pairs(mut pairs: Vec<(usize, f64)>) -> Self {
        pairs.sort_by_key(|&(i, _)| i);

        let mut indices: Vec<usize> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f64> = Vec::with_capacity(pairs.len());
        for (i, v) in pairs {
            if indices.last() == Some(&i) {
                if let Some(last) = values.last_mut() {
                    *last += v;
                }
            } else {
                indices.push(i);
                values.push(v);
            }
        }
        Self { indices, values }
    }

    /// Attribute indices (strictly increasing).
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Values, parallel to [`indices`](Self::indices).
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Iterate `(index, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Euclidean (L2) norm.
    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    pub(crate) fn divide(&mut self, divisor: f64) {
        for v in &mut self.values {
            *v /= divisor;
        }
    }

    /// Dot product against a dense vector. Indices past its end contribute 0.
    #[inline]
    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        self.iter()
            .map(|(i, v)| dense.get(i).map_or(0.0, |d| v * d))
            .sum()
    }

    /// Add `self` into a dense accumulator.
    #[inline]
    pub(crate) fn add_into(&self, dense: &mut [f64]) {
        for (i, v) in self.iter() {
            if let Some(d) = dense.get_mut(i) {
                *d += v;
            }
        }
    }

    /// Expand to a dense vector of length `dim`.
    pub(crate) fn to_dense(&self, dim: usize) -> Vec<f64> {
        let mut out = vec![0.0; dim];
        self.add_into(&mut out);
        out
    }
}

#[inline]
pub(crate) fn dense_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}
