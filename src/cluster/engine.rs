//! Stateful facade: ingest points, run repeatedly, query the last run.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::evaluate::{evaluate, EvaluationReport, LabelMap};
use super::init::Seed;
use super::kmeans::{ClusteringResult, IterationRecord, RunPhase, SphericalKmeans};
use super::store::{PointId, PointStore};
use super::vectorize::VectorizedDataset;
use crate::error::Result;
use crate::sink::{LogSink, NoopSink};

/// Owns the points, a cached vectorization, the configuration, and the
/// result of the most recent run.
///
/// Vectorization happens on the first `run` and again only after new points
/// are added; later runs re-seed centroids over the cached vectors.
pub struct Engine {
    store: PointStore,
    dataset: Option<VectorizedDataset>,
    config: SphericalKmeans,
    sink: Box<dyn LogSink>,
    last: Option<ClusteringResult>,
    phase: RunPhase,
}

impl Engine {
    /// Engine for `k` clusters, logging nowhere.
    pub fn new(k: usize) -> Self {
        Self::with_config(SphericalKmeans::new(k))
    }

    /// Engine with a prepared configuration.
    pub fn with_config(config: SphericalKmeans) -> Self {
        Self {
            store: PointStore::new(),
            dataset: None,
            config,
            sink: Box::new(NoopSink),
            last: None,
            phase: RunPhase::Init,
        }
    }

    /// Add a point; see [`PointStore::add_data_point`].
    pub fn add_data_point(
        &mut self,
        id: PointId,
        indices: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<()> {
        self.store.add_data_point(id, indices, values)?;
        self.dataset = None;
        self.phase = RunPhase::Init;
        Ok(())
    }

    /// Set the number of clusters for later runs.
    pub fn set_k(&mut self, k: usize) {
        self.config = self.config.clone().with_k(k);
    }

    /// Set the convergence threshold (negative values clamp to 0).
    pub fn set_threshold(&mut self, threshold: i64) {
        self.config = self.config.clone().with_threshold(threshold);
    }

    /// Set the seed for later runs.
    pub fn set_seed(&mut self, seed: Seed) {
        self.config = self.config.clone().with_seed(seed);
    }

    /// Replace the run-log sink.
    pub fn set_sink(&mut self, sink: Box<dyn LogSink>) {
        self.sink = sink;
    }

    /// Current configuration.
    pub fn config(&self) -> &SphericalKmeans {
        &self.config
    }

    /// Ingested points.
    pub fn store(&self) -> &PointStore {
        &self.store
    }

    /// Lifecycle stage.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Cluster the ingested points. Returns the number of iterations run
    /// (0 when there are too few points).
    pub fn run(&mut self) -> Result<usize> {
        if self.store.is_empty() {
            return Ok(0);
        }

        let start = Instant::now();
        let dataset = match self.dataset.take() {
            Some(ds) if ds.is_current(&self.store) => ds,
            _ => {
                self.sink.append_line(RunPhase::Vectorized.message());
                self.store.prepare()
            }
        };
        self.phase = RunPhase::Vectorized;

        let outcome = self.config.cluster_since(&dataset, &mut self.sink, start);
        self.dataset = Some(dataset);
        let result = outcome?;

        let iterations = result.iteration_count();
        self.last = Some(result);
        self.phase = RunPhase::Done;
        Ok(iterations)
    }

    /// Result of the most recent run.
    pub fn last_result(&self) -> Option<&ClusteringResult> {
        self.last.as_ref()
    }

    /// Objective value of the most recent run (0 before any run).
    pub fn objective(&self) -> f64 {
        self.last.as_ref().map_or(0.0, ClusteringResult::objective)
    }

    /// Wall-clock time of the most recent run, vectorization included.
    pub fn elapsed(&self) -> Duration {
        self.last.as_ref().map_or(Duration::ZERO, ClusteringResult::elapsed)
    }

    /// Iteration records of the most recent run.
    pub fn iterations(&self) -> &[IterationRecord] {
        self.last.as_ref().map(|r| r.iterations()).unwrap_or(&[])
    }

    /// Point-to-cluster map of the most recent run, if any.
    pub fn point_clusters(&self) -> Option<&HashMap<PointId, usize>> {
        self.last.as_ref().map(ClusteringResult::point_clusters)
    }

    /// Cluster membership of the most recent run.
    pub fn clusters(&self) -> &[Vec<PointId>] {
        self.last.as_ref().map(|r| r.clusters()).unwrap_or(&[])
    }

    /// Evaluate the most recent run against `labels` and write the report to
    /// the run log. `None` before any run.
    pub fn evaluate(&mut self, labels: &LabelMap) -> Option<EvaluationReport> {
        let result = self.last.as_ref()?;
        let report = evaluate(result, labels);
        report.emit(&mut self.sink);
        Some(report)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("points", &self.store.len())
            .field("config", &self.config)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}
