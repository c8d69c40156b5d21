//! Raw point ingestion.

use std::collections::HashMap;

use super::vectorize::VectorizedDataset;
use crate::error::{Error, Result};

/// Caller-supplied point identifier.
pub type PointId = u64;

/// A point as ingested: sparse attribute indices with parallel values.
#[derive(Clone, Debug, PartialEq)]
pub struct RawPoint {
    id: PointId,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl RawPoint {
    /// Point id.
    pub fn id(&self) -> PointId {
        self.id
    }

    /// Attribute indices, in ingest order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Attribute values, parallel to [`indices`](Self::indices).
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Holds raw points in ingest order and tracks the observed dimension.
#[derive(Clone, Debug, Default)]
pub struct PointStore {
    points: Vec<RawPoint>,
    by_id: HashMap<PointId, usize>,
    max_index: Option<usize>,
    revision: u64,
}

impl PointStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a point.
    ///
    /// Fails with [`Error::EmptyPoint`], [`Error::MismatchedLengths`] or
    /// [`Error::DuplicatePoint`]; on failure the store is unchanged.
    pub fn add_data_point(
        &mut self,
        id: PointId,
        indices: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<()> {
        if indices.is_empty() {
            return Err(Error::EmptyPoint { id });
        }
        if indices.len() != values.len() {
            return Err(Error::MismatchedLengths {
                id,
                indices: indices.len(),
                values: values.len(),
            });
        }
        if self.by_id.contains_key(&id) {
            return Err(Error::DuplicatePoint { id });
        }

        let local_max = indices.iter().copied().max();
        self.max_index = self.max_index.max(local_max);

        self.by_id.insert(id, self.points.len());
        self.points.push(RawPoint {
            id,
            indices,
            values,
        });
        self.revision += 1;
        Ok(())
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no point has been stored.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Dimension of the attribute space: largest observed index + 1.
    pub fn dimension(&self) -> usize {
        self.max_index.map_or(0, |m| m + 1)
    }

    /// Look up a point by id.
    pub fn get(&self, id: PointId) -> Option<&RawPoint> {
        self.by_id.get(&id).map(|&i| &self.points[i])
    }

    /// Points in ingest order.
    pub fn points(&self) -> &[RawPoint] {
        &self.points
    }

    /// Bumped on every successful ingest; lets callers detect stale vectorizations.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Vectorize every stored point. See [`VectorizedDataset::from_store`].
    pub fn prepare(&self) -> VectorizedDataset {
        VectorizedDataset::from_store(self)
    }
}
