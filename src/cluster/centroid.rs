//! Per-trial clustering state: centroids and point assignments.
//!
//! Points and centroids are addressed by position. A centroid's member list
//! holds point positions into the [`VectorizedDataset`] the trial runs on,
//! and `assignment[p]` names the centroid that point `p` currently belongs to.

use super::util::{dense_norm, SparseVector};
use super::vectorize::VectorizedDataset;

/// A cluster centre together with its current members.
#[derive(Clone, Debug)]
pub struct Centroid {
    id: usize,
    pub(crate) vector: Vec<f64>,
    pub(crate) norm: f64,
    pub(crate) members: Vec<usize>,
}

impl Centroid {
    /// Centroid seeded from a single unit-length point.
    pub(crate) fn from_point(id: usize, point: &SparseVector, dimension: usize) -> Self {
        Self {
            id,
            vector: point.to_dense(dimension),
            norm: unit_norm(point),
            members: Vec::new(),
        }
    }

    /// Cluster id, in `0..k`.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Centre vector (mean of members; not unit length).
    pub fn vector(&self) -> &[f64] {
        &self.vector
    }

    /// Cached L2 norm of [`vector`](Self::vector).
    pub fn norm(&self) -> f64 {
        self.norm
    }

    /// Member point positions.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Cosine dissimilarity between a unit-length point and this centre.
    ///
    /// `1 - <p, c> / |c|`. A zero centre is equally far (1.0) from everything.
    #[inline]
    pub fn dissimilarity(&self, point: &SparseVector) -> f64 {
        if self.norm > 0.0 {
            1.0 - point.dot_dense(&self.vector) / self.norm
        } else {
            1.0
        }
    }

    /// Re-centre on a single point (used when an empty cluster adopts one).
    pub(crate) fn reset_to_point(&mut self, point: &SparseVector) {
        self.vector.iter_mut().for_each(|x| *x = 0.0);
        point.add_into(&mut self.vector);
        self.norm = unit_norm(point);
    }

    /// Set the centre to the arithmetic mean of the current members.
    pub(crate) fn recompute(&mut self, data: &VectorizedDataset) {
        self.vector.iter_mut().for_each(|x| *x = 0.0);
        if self.members.is_empty() {
            self.norm = 0.0;
            return;
        }
        for &p in &self.members {
            data.vector(p).add_into(&mut self.vector);
        }
        let count = self.members.len() as f64;
        for x in &mut self.vector {
            *x /= count;
        }
        self.norm = dense_norm(&self.vector);
    }
}

/// Norm of a vectorized point: 1, or 0 for a point that had no direction.
fn unit_norm(point: &SparseVector) -> f64 {
    if point.norm() > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Centroids plus the point-to-centroid assignment of one trial.
#[derive(Clone, Debug)]
pub struct Partition {
    pub(crate) centroids: Vec<Centroid>,
    pub(crate) assignment: Vec<Option<usize>>,
}

impl Partition {
    pub(crate) fn new(centroids: Vec<Centroid>, n_points: usize) -> Self {
        Self {
            centroids,
            assignment: vec![None; n_points],
        }
    }

    /// Centroids, indexed by cluster id.
    pub fn centroids(&self) -> &[Centroid] {
        &self.centroids
    }

    /// Current cluster of each point position (`None` before the first pass).
    pub fn assignment(&self) -> &[Option<usize>] {
        &self.assignment
    }

    /// Number of clusters.
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    /// Move point `p` from whatever cluster holds it into `to`.
    ///
    /// Callers have already removed `p` from its donor's member list.
    pub(crate) fn adopt(&mut self, to: usize, p: usize, data: &VectorizedDataset) {
        self.assignment[p] = Some(to);
        let c = &mut self.centroids[to];
        c.members.push(p);
        c.reset_to_point(data.vector(p));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::PointStore;

    fn dataset() -> VectorizedDataset {
        let mut store = PointStore::new();
        store.add_data_point(1, vec![0], vec![1.0]).unwrap();
        store.add_data_point(2, vec![1], vec![1.0]).unwrap();
        store.prepare()
    }

    #[test]
    fn dissimilarity_range() {
        let ds = dataset();
        let c = Centroid::from_point(0, ds.vector(0), ds.dimension());
        assert!(c.dissimilarity(ds.vector(0)).abs() < 1e-15);
        assert!((c.dissimilarity(ds.vector(1)) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn recompute_is_unnormalized_mean() {
        let ds = dataset();
        let mut c = Centroid::from_point(0, ds.vector(0), ds.dimension());
        c.members = vec![0, 1];
        c.recompute(&ds);
        assert_eq!(c.vector(), &[0.5, 0.5]);
        assert!((c.norm() - 0.5f64.sqrt()).abs() < 1e-12);
    }
}
