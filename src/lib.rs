//! Sparse document clustering.
//!
//! `sphkmeans` groups sparse, high-dimensional points into `k` clusters with
//! spherical (cosine) k-means, and scores the result against known labels.
//!
//! - [`cluster`]: ingestion, vectorization, the k-means loop, evaluation
//! - [`io`]: delimited-text readers and writers for points, labels, and assignments
//! - [`sink`]: the line-oriented run log

#![forbid(unsafe_code)]

pub mod cluster;
pub mod error;
pub mod io;
pub mod sink;

pub use cluster::{
    evaluate, Clustering, ClusteringResult, Engine, EvaluationReport, LabelMap, PointId,
    PointStore, Seed, SphericalKmeans, VectorizedDataset,
};
pub use error::{Error, Result};
pub use sink::{LogFacadeSink, LogSink, NoopSink, WriterSink};
