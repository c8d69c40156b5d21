//! Conversion of raw points into unit-length sparse vectors.

use super::store::{PointId, PointStore};
use super::util::SparseVector;

/// Unit-normalized points, ready to be clustered.
///
/// Point order is the store's ingest order, and points are addressed by
/// their position (`0..len()`) everywhere inside the clustering loop.
/// A dataset is immutable and can be reused by any number of trials.
#[derive(Clone, Debug, Default)]
pub struct VectorizedDataset {
    ids: Vec<PointId>,
    vectors: Vec<SparseVector>,
    dimension: usize,
    revision: u64,
}

impl VectorizedDataset {
    /// Vectorize every point in `store`.
    ///
    /// Each vector is divided by its L2 norm. A point whose values are all
    /// zero has no direction; it is kept as the zero vector (dissimilarity 1
    /// to every centroid) and reported with `log::warn!`.
    ///
    /// Cost is linear in the total number of stored entries.
    pub fn from_store(store: &PointStore) -> Self {
        let mut ids: Vec<PointId> = Vec::with_capacity(store.len());
        let mut vectors: Vec<SparseVector> = Vec::with_capacity(store.len());

        for p in store.points() {
            let pairs: Vec<(usize, f64)> = p
                .indices()
                .iter()
                .copied()
                .zip(p.values().iter().copied())
                .collect();
            let mut v = SparseVector::from_pairs(pairs);
            let norm = v.norm();
            if norm > 0.0 {
                v.divide(norm);
            } else {
                log::warn!("point {} has zero norm; it cannot be normalized", p.id());
            }
            ids.push(p.id());
            vectors.push(v);
        }

        log::debug!(
            "vectorized {} points over {} dimensions",
            ids.len(),
            store.dimension()
        );

        Self {
            ids,
            vectors,
            dimension: store.dimension(),
            revision: store.revision(),
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the dataset has no points.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Dimension of the attribute space (largest index + 1).
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Point ids by position.
    pub fn ids(&self) -> &[PointId] {
        &self.ids
    }

    /// Normalized vectors by position.
    pub fn vectors(&self) -> &[SparseVector] {
        &self.vectors
    }

    /// Id of the point at `pos`.
    pub fn id(&self, pos: usize) -> PointId {
        self.ids[pos]
    }

    /// Normalized vector of the point at `pos`.
    pub fn vector(&self, pos: usize) -> &SparseVector {
        &self.vectors[pos]
    }

    /// Whether this dataset still reflects `store`.
    pub fn is_current(&self, store: &PointStore) -> bool {
        self.revision == store.revision()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors_are_unit_length() {
        let mut store = PointStore::new();
        store.add_data_point(10, vec![0, 2], vec![3.0, 4.0]).unwrap();
        store.add_data_point(11, vec![1], vec![7.0]).unwrap();

        let ds = store.prepare();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.dimension(), 3);
        assert_eq!(ds.ids(), &[10, 11]);

        for v in ds.vectors() {
            assert!((v.norm() - 1.0).abs() < 1e-12);
        }
        let v = ds.vector(0).values();
        assert!((v[0] - 0.6).abs() < 1e-12);
        assert!((v[1] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn staleness_follows_ingest() {
        let mut store = PointStore::new();
        store.add_data_point(1, vec![0], vec![1.0]).unwrap();
        let ds = store.prepare();
        assert!(ds.is_current(&store));

        store.add_data_point(2, vec![1], vec![1.0]).unwrap();
        assert!(!ds.is_current(&store));

        // Rejected points do not invalidate.
        let ds = store.prepare();
        let _ = store.add_data_point(2, vec![1], vec![1.0]);
        assert!(ds.is_current(&store));
    }

    #[test]
    fn zero_vector_stays_zero() {
        let mut store = PointStore::new();
        store.add_data_point(1, vec![0, 1], vec![0.0, 0.0]).unwrap();
        let ds = store.prepare();
        assert_eq!(ds.vector(0).norm(), 0.0);
    }
}
