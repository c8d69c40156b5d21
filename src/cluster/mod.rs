//! Spherical k-means for sparse, high-dimensional points.
//!
//! Points (typically documents as token-frequency vectors) are normalized to
//! unit length and grouped by **cosine dissimilarity**:
//!
//! ```text
//! d(x, c) = 1 - <x, c> / ||c||
//! ```
//!
//! which lies in `[0, 2]`, or `[0, 1]` when all weights are non-negative.
//!
//! ## Pipeline
//!
//! 1. [`PointStore`] holds the raw `(id, indices, values)` triples.
//! 2. [`PointStore::prepare`] builds a [`VectorizedDataset`] of unit vectors.
//!    It can be reused by any number of trials.
//! 3. [`SphericalKmeans::cluster`] samples `k` distinct points as initial
//!    centroids, then alternates:
//!    - **Assign**: each point goes to its least dissimilar centroid (lowest
//!      id on ties); the sum of those dissimilarities is the objective.
//!    - **Update**: touched clusters left empty adopt a point from a donor;
//!      touched centroids become the (un-normalized) mean of their members.
//!
//!    until an iteration reports a count at or below the threshold.
//! 4. [`evaluate`] scores a [`ClusteringResult`] against ground-truth labels
//!    (purity, entropy, contingency table).
//!
//! [`Engine`] wraps the same pipeline behind a stateful ingest/run/query API.
//!
//! ## Usage
//!
//! ```rust
//! use sphkmeans::cluster::{PointStore, Seed, SphericalKmeans};
//!
//! let mut store = PointStore::new();
//! store.add_data_point(1, vec![0], vec![1.0]).unwrap();
//! store.add_data_point(2, vec![1], vec![1.0]).unwrap();
//! store.add_data_point(3, vec![0], vec![1.0]).unwrap();
//!
//! let data = store.prepare();
//! let result = SphericalKmeans::new(2)
//!     .with_seed(Seed::Fixed(42))
//!     .cluster(&data)
//!     .unwrap();
//!
//! assert_eq!(result.cluster_of(1), result.cluster_of(3));
//! assert_ne!(result.cluster_of(1), result.cluster_of(2));
//! ```

mod assign;
mod centroid;
mod engine;
mod evaluate;
mod init;
mod kmeans;
mod store;
mod traits;
mod update;
mod util;
mod vectorize;

pub use assign::{AssignOutcome, EXACT_MATCH_TOLERANCE};
pub use centroid::{Centroid, Partition};
pub use engine::Engine;
pub use evaluate::{evaluate, ClusterScore, EvaluationReport, LabelMap};
pub use init::Seed;
pub use kmeans::{ClusteringResult, IterationRecord, RunPhase, SphericalKmeans, MIN_POINTS};
pub use store::{PointId, PointStore, RawPoint};
pub use traits::Clustering;
pub use util::SparseVector;
pub use vectorize::VectorizedDataset;
