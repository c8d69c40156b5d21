//! Spherical k-means: the convergence loop and its result.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use super::assign::EXACT_MATCH_TOLERANCE;
use super::centroid::{Centroid, Partition};
use super::init::{initialize_centroids, Seed};
use super::store::PointId;
use super::traits::Clustering;
use super::vectorize::VectorizedDataset;
use crate::error::{Error, Result};
use crate::sink::{LogSink, NoopSink};

/// Runs on fewer points than this are no-ops.
pub const MIN_POINTS: usize = 2;

/// Stages of a clustering run, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    /// Nothing vectorized yet.
    Init,
    /// Points are unit-normalized.
    Vectorized,
    /// Initial centroids sampled.
    CentroidsInitialized,
    /// Assignment/update loop running.
    Iterating,
    /// Final membership being gathered.
    Collected,
    /// Run finished; results are queryable.
    Done,
}

impl RunPhase {
    /// Run-log line announcing entry into this phase.
    pub fn message(self) -> &'static str {
        match self {
            RunPhase::Init => "Waiting for data...",
            RunPhase::Vectorized => "Processing raw data...",
            RunPhase::CentroidsInitialized => "Initialize centroids...",
            RunPhase::Iterating => "Begin clustering...",
            RunPhase::Collected => "Collect clustering solution...",
            RunPhase::Done => "Clustering completed.",
        }
    }
}

/// Statistics for one assignment/update iteration.
#[derive(Clone, Debug, PartialEq)]
pub struct IterationRecord {
    /// 1-based iteration number.
    pub index: usize,
    /// Count that drives convergence: points moved when the centroid update
    /// was skipped, otherwise the number of centroids recomputed.
    pub moved: usize,
    /// Objective value after this iteration's assignment pass.
    pub objective: f64,
    /// Wall-clock time of the iteration.
    pub elapsed: Duration,
}

impl fmt::Display for IterationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  Iteration: {}. Updated Centroids: {}. Obj. Value: {:.6}. Time Taken: {:.6}s",
            self.index,
            self.moved,
            self.objective,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Outcome of one clustering trial.
#[derive(Clone, Debug)]
pub struct ClusteringResult {
    ids: Vec<PointId>,
    partition: Partition,
    point_clusters: HashMap<PointId, usize>,
    clusters: Vec<Vec<PointId>>,
    objective: f64,
    iterations: Vec<IterationRecord>,
    elapsed: Duration,
    seed: Option<u64>,
    initial_points: Vec<PointId>,
    dimension: usize,
}

impl ClusteringResult {
    fn empty(data: &VectorizedDataset, elapsed: Duration) -> Self {
        Self {
            ids: data.ids().to_vec(),
            partition: Partition::new(Vec::new(), data.len()),
            point_clusters: HashMap::new(),
            clusters: Vec::new(),
            objective: 0.0,
            iterations: Vec::new(),
            elapsed,
            seed: None,
            initial_points: Vec::new(),
            dimension: data.dimension(),
        }
    }

    /// Cluster id of every clustered point.
    pub fn point_clusters(&self) -> &HashMap<PointId, usize> {
        &self.point_clusters
    }

    /// Cluster of a single point.
    pub fn cluster_of(&self, id: PointId) -> Option<usize> {
        self.point_clusters.get(&id).copied()
    }

    /// Member ids per cluster, indexed by cluster id.
    pub fn clusters(&self) -> &[Vec<PointId>] {
        &self.clusters
    }

    /// Number of clusters produced (0 for a no-op run).
    pub fn k(&self) -> usize {
        self.clusters.len()
    }

    /// Final objective value (sum of point-to-centroid dissimilarities).
    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// Per-iteration statistics, in order.
    pub fn iterations(&self) -> &[IterationRecord] {
        &self.iterations
    }

    /// Number of iterations executed.
    pub fn iteration_count(&self) -> usize {
        self.iterations.len()
    }

    /// Wall-clock time from run start to result collection.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Seed the initial centroids were drawn with (`None` for a no-op run).
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Ids of the points the initial centroids were copied from, by cluster id.
    pub fn initial_points(&self) -> &[PointId] {
        &self.initial_points
    }

    /// Dimension of the clustered data.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of points in the clustered dataset.
    pub fn n_points(&self) -> usize {
        self.ids.len()
    }

    /// Final centroids, indexed by cluster id.
    pub fn centroids(&self) -> &[Centroid] {
        self.partition.centroids()
    }

    /// Final centroid/assignment state.
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Cluster label per point, in dataset order.
    pub fn labels(&self) -> Vec<usize> {
        self.partition
            .assignment()
            .iter()
            .map(|a| a.unwrap_or(usize::MAX))
            .collect()
    }
}

/// Spherical k-means over unit-normalized sparse vectors, using cosine
/// dissimilarity.
///
/// The loop runs until an iteration reports a count at or below
/// `threshold` (see [`IterationRecord::moved`]). At least one iteration
/// always runs; there is no iteration cap.
#[derive(Debug, Clone)]
pub struct SphericalKmeans {
    k: usize,
    threshold: usize,
    seed: Seed,
    tolerance: f64,
}

impl SphericalKmeans {
    /// Create a clusterer for `k` clusters.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            threshold: 0,
            seed: Seed::FromEntropy,
            tolerance: EXACT_MATCH_TOLERANCE,
        }
    }

    /// Set the number of clusters.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set the convergence threshold. Negative values clamp to 0.
    pub fn with_threshold(mut self, threshold: i64) -> Self {
        self.threshold = usize::try_from(threshold.max(0)).unwrap_or(usize::MAX);
        self
    }

    /// Set the seed for centroid initialization.
    pub fn with_seed(mut self, seed: Seed) -> Self {
        self.seed = seed;
        self
    }

    /// Set the dissimilarity treated as an exact match during assignment.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Configured number of clusters (before clamping to the point count).
    pub fn k(&self) -> usize {
        self.k
    }

    /// Convergence threshold.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Configured seed.
    pub fn seed(&self) -> Seed {
        self.seed
    }

    /// Exact-match tolerance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Cluster `data` without a run log.
    pub fn cluster(&self, data: &VectorizedDataset) -> Result<ClusteringResult> {
        self.cluster_with_sink(data, &mut NoopSink)
    }

    /// Cluster `data`, reporting progress to `sink`.
    ///
    /// Every call starts from freshly sampled centroids; `data` is never
    /// modified, so independent trials can share it.
    pub fn cluster_with_sink(
        &self,
        data: &VectorizedDataset,
        sink: &mut dyn LogSink,
    ) -> Result<ClusteringResult> {
        self.cluster_since(data, sink, Instant::now())
    }

    /// Cluster `data`, charging the result's elapsed time from `start`.
    pub(crate) fn cluster_since(
        &self,
        data: &VectorizedDataset,
        sink: &mut dyn LogSink,
        start: Instant,
    ) -> Result<ClusteringResult> {
        if self.k == 0 {
            return Err(Error::InvalidParameter {
                name: "k",
                message: "must be at least 1",
            });
        }

        let n = data.len();
        if n < MIN_POINTS {
            log::warn!("{n} point(s) available; at least {MIN_POINTS} are needed to cluster");
            return Ok(ClusteringResult::empty(data, start.elapsed()));
        }

        let k = self.k.min(n);
        if k < self.k {
            log::info!("requested {} clusters but only {n} points; using k = {k}", self.k);
        }

        sink.append_line(RunPhase::CentroidsInitialized.message());
        let seed = self.seed.resolve();
        let (centroids, picks) = initialize_centroids(data, k, seed);
        let mut partition = Partition::new(centroids, n);

        sink.append_line(RunPhase::Iterating.message());
        let mut iterations: Vec<IterationRecord> = Vec::new();
        let mut objective;
        loop {
            let t = Instant::now();
            let (moved, obj) = partition.step(data, self.threshold, self.tolerance, sink);
            objective = obj;
            let record = IterationRecord {
                index: iterations.len() + 1,
                moved,
                objective,
                elapsed: t.elapsed(),
            };
            sink.append_line(&record.to_string());
            iterations.push(record);
            if moved <= self.threshold {
                break;
            }
        }

        sink.append_line(RunPhase::Collected.message());
        let mut point_clusters: HashMap<PointId, usize> = HashMap::with_capacity(n);
        let mut clusters: Vec<Vec<PointId>> = Vec::with_capacity(k);
        for c in partition.centroids() {
            let members: Vec<PointId> = c.members().iter().map(|&p| data.id(p)).collect();
            for &id in &members {
                point_clusters.insert(id, c.id());
            }
            clusters.push(members);
        }

        let elapsed = start.elapsed();
        sink.append_line(&format!(
            "{} Total time taken: {:.6}s.",
            RunPhase::Done.message(),
            elapsed.as_secs_f64()
        ));

        Ok(ClusteringResult {
            ids: data.ids().to_vec(),
            partition,
            point_clusters,
            clusters,
            objective,
            iterations,
            elapsed,
            seed: Some(seed),
            initial_points: picks.iter().map(|&p| data.id(p)).collect(),
            dimension: data.dimension(),
        })
    }

    /// Run one trial per seed and keep the lowest-objective result.
    ///
    /// An empty seed list runs a single entropy-seeded trial. Earlier trials
    /// win ties.
    pub fn best_of(
        &self,
        data: &VectorizedDataset,
        seeds: &[Seed],
        sink: &mut dyn LogSink,
    ) -> Result<ClusteringResult> {
        self.best_of_with(data, seeds, sink, |_, _| {})
    }

    /// Like [`best_of`](Self::best_of), calling `on_trial(trial_index, result)`
    /// after every trial.
    pub fn best_of_with<F>(
        &self,
        data: &VectorizedDataset,
        seeds: &[Seed],
        sink: &mut dyn LogSink,
        mut on_trial: F,
    ) -> Result<ClusteringResult>
    where
        F: FnMut(usize, &ClusteringResult),
    {
        let fallback = [Seed::FromEntropy];
        let seeds = if seeds.is_empty() { &fallback[..] } else { seeds };

        let mut best: Option<ClusteringResult> = None;
        for (i, &seed) in seeds.iter().enumerate() {
            sink.append_line(&format!("Trial {}/{} (seed {seed})", i + 1, seeds.len()));
            let result = self.clone().with_seed(seed).cluster_with_sink(data, sink)?;
            on_trial(i, &result);
            let better = best
                .as_ref()
                .map_or(true, |b| result.objective() < b.objective());
            if better {
                best = Some(result);
            }
        }
        best.ok_or(Error::EmptyInput)
    }
}

impl Default for SphericalKmeans {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Clustering for SphericalKmeans {
    fn fit_predict(&self, data: &VectorizedDataset) -> Result<Vec<usize>> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }
        if data.len() < MIN_POINTS {
            return Err(Error::InvalidParameter {
                name: "data",
                message: "at least 2 points are needed to cluster",
            });
        }
        Ok(self.cluster(data)?.labels())
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::PointStore;

    fn store_from(points: &[(u64, Vec<usize>, Vec<f64>)]) -> PointStore {
        let mut store = PointStore::new();
        for (id, idx, val) in points {
            store.add_data_point(*id, idx.clone(), val.clone()).unwrap();
        }
        store
    }

    /// Two topics over disjoint vocabularies, plus mild overlap. No two
    /// points share a direction.
    fn two_topics() -> VectorizedDataset {
        let mut pts = Vec::new();
        for i in 0..10u64 {
            let w = 1.0 + 0.2 * i as f64;
            pts.push((i, vec![0, 1, 2, 9], vec![w, 2.0, 1.0, 0.1]));
        }
        for i in 10..20u64 {
            let w = 1.0 + 0.3 * (i - 10) as f64;
            pts.push((i, vec![5, 6, 7, 9], vec![2.0, w, 1.0, 0.1]));
        }
        store_from(&pts).prepare()
    }

    #[test]
    fn small_scenario_groups_identical_points() {
        let store = store_from(&[
            (1, vec![0], vec![1.0]),
            (2, vec![1], vec![1.0]),
            (3, vec![0], vec![1.0]),
        ]);
        let ds = store.prepare();
        for seed in 0..20 {
            let result = SphericalKmeans::new(2)
                .with_seed(Seed::Fixed(seed))
                .cluster(&ds)
                .unwrap();
            assert_eq!(result.k(), 2);
            assert_eq!(result.cluster_of(1), result.cluster_of(3));
            assert_ne!(result.cluster_of(1), result.cluster_of(2));
            let total: usize = result.clusters().iter().map(Vec::len).sum();
            assert_eq!(total, 3);
        }
    }

    #[test]
    fn single_point_is_a_noop() {
        let ds = store_from(&[(1, vec![0], vec![1.0])]).prepare();
        let result = SphericalKmeans::new(2).cluster(&ds).unwrap();
        assert_eq!(result.iteration_count(), 0);
        assert!(result.clusters().is_empty());
        assert!(result.point_clusters().is_empty());
    }

    #[test]
    fn empty_dataset_is_a_noop() {
        let ds = PointStore::new().prepare();
        let result = SphericalKmeans::new(3).cluster(&ds).unwrap();
        assert_eq!(result.iteration_count(), 0);
        assert_eq!(result.k(), 0);
    }

    #[test]
    fn k_is_clamped_to_point_count() {
        let ds = store_from(&[
            (1, vec![0], vec![1.0]),
            (2, vec![1], vec![1.0]),
            (3, vec![2], vec![1.0]),
        ])
        .prepare();
        let result = SphericalKmeans::new(5)
            .with_seed(Seed::Fixed(7))
            .cluster(&ds)
            .unwrap();
        assert_eq!(result.k(), 3);
        for c in result.clusters() {
            assert_eq!(c.len(), 1);
        }
    }

    #[test]
    fn zero_k_is_rejected() {
        let ds = two_topics();
        assert!(matches!(
            SphericalKmeans::new(0).cluster(&ds),
            Err(Error::InvalidParameter { name: "k", .. })
        ));
    }

    #[test]
    fn separates_topics() {
        let ds = two_topics();
        for seed in 1..10 {
            let result = SphericalKmeans::new(2)
                .with_seed(Seed::Fixed(seed))
                .cluster(&ds)
                .unwrap();
            let a = result.cluster_of(0).unwrap();
            let b = result.cluster_of(10).unwrap();
            assert_ne!(a, b);
            for id in 0..10 {
                assert_eq!(result.cluster_of(id), Some(a));
            }
            for id in 10..20 {
                assert_eq!(result.cluster_of(id), Some(b));
            }
        }
    }

    #[test]
    fn converged_centroids_are_stable() {
        let ds = two_topics();
        let result = SphericalKmeans::new(4)
            .with_seed(Seed::Fixed(5))
            .cluster(&ds)
            .unwrap();
        let mut part = result.partition().clone();
        let outcome = part.assign_points(&ds, EXACT_MATCH_TOLERANCE);
        assert_eq!(outcome.moved, 0);
        assert!((outcome.objective - result.objective()).abs() < 1e-9);
    }

    #[test]
    fn same_seed_same_result() {
        let ds = two_topics();
        let model = SphericalKmeans::new(3).with_seed(Seed::Fixed(42));
        let a = model.cluster(&ds).unwrap();
        let b = model.cluster(&ds).unwrap();
        assert_eq!(a.clusters(), b.clusters());
        assert_eq!(a.objective(), b.objective());
        assert_eq!(a.initial_points(), b.initial_points());
        assert_eq!(a.iteration_count(), b.iteration_count());
    }

    #[test]
    fn iteration_log_matches_records() {
        let ds = two_topics();
        let mut lines: Vec<String> = Vec::new();
        let result = SphericalKmeans::new(2)
            .with_seed(Seed::Fixed(1))
            .cluster_with_sink(&ds, &mut lines)
            .unwrap();

        let iter_lines = lines
            .iter()
            .filter(|l| l.starts_with("  Iteration: "))
            .count();
        assert_eq!(iter_lines, result.iteration_count());
        assert!(result.iteration_count() >= 1);
        assert_eq!(lines.first().map(String::as_str), Some("Initialize centroids..."));
        assert!(lines.last().unwrap().starts_with("Clustering completed."));

        let last = result.iterations().last().unwrap();
        assert_eq!(last.moved, 0);
        assert_eq!(last.objective, result.objective());
    }

    #[test]
    fn negative_threshold_clamps() {
        assert_eq!(SphericalKmeans::new(2).with_threshold(-5).threshold(), 0);
        assert_eq!(SphericalKmeans::new(2).with_threshold(3).threshold(), 3);
    }

    #[test]
    fn best_of_keeps_lowest_objective() {
        let ds = two_topics();
        let model = SphericalKmeans::new(3);
        let seeds = Seed::odd_sequence(5);

        let mut objectives = Vec::new();
        let best = model
            .best_of_with(&ds, &seeds, &mut NoopSink, |_, r| objectives.push(r.objective()))
            .unwrap();

        assert_eq!(objectives.len(), 5);
        let min = objectives.iter().copied().fold(f64::INFINITY, f64::min);
        assert_eq!(best.objective(), min);
        let first_min = objectives.iter().position(|&o| o == min).unwrap();
        assert_eq!(best.seed(), Some(2 * first_min as u64 + 1));
    }

    #[test]
    fn fit_predict_labels_every_point() {
        let ds = two_topics();
        let labels = SphericalKmeans::new(2)
            .with_seed(Seed::Fixed(3))
            .fit_predict(&ds)
            .unwrap();
        assert_eq!(labels.len(), ds.len());
        assert!(labels.iter().all(|&l| l < 2));
    }

    #[test]
    fn fit_predict_rejects_single_point() {
        let ds = store_from(&[(1, vec![0], vec![1.0])]).prepare();
        assert!(matches!(
            SphericalKmeans::new(2).fit_predict(&ds),
            Err(Error::InvalidParameter { name: "data", .. })
        ));
        assert!(matches!(
            SphericalKmeans::new(2).fit_predict(&PointStore::new().prepare()),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn more_clusters_than_directions_terminates() {
        // Points 1 and 3 share a direction, so one centroid is never reached.
        let ds = store_from(&[
            (1, vec![0], vec![1.0]),
            (2, vec![1], vec![1.0]),
            (3, vec![0], vec![1.0]),
        ])
        .prepare();
        for seed in 0..20 {
            let result = SphericalKmeans::new(3)
                .with_seed(Seed::Fixed(seed))
                .cluster(&ds)
                .unwrap();
            assert_eq!(result.k(), 3);
            assert_eq!(result.iteration_count(), 2);
            assert_eq!(result.cluster_of(1), result.cluster_of(3));
            assert_ne!(result.cluster_of(1), result.cluster_of(2));
            let empty = result.clusters().iter().filter(|c| c.is_empty()).count();
            assert_eq!(empty, 1);
        }
    }

    #[test]
    fn collinear_points_terminate() {
        let ds = store_from(&[
            (1, vec![0], vec![1.0]),
            (2, vec![0], vec![2.0]),
            (3, vec![0], vec![3.0]),
        ])
        .prepare();
        for seed in 0..20 {
            let result = SphericalKmeans::new(2)
                .with_seed(Seed::Fixed(seed))
                .cluster(&ds)
                .unwrap();
            assert_eq!(result.iteration_count(), 2);
            assert_eq!(result.clusters()[0], vec![1, 2, 3]);
            assert!(result.clusters()[1].is_empty());
            assert!(result.objective().abs() < 1e-12);
        }
    }

    #[test]
    fn threshold_above_moves_stops_after_first_pass() {
        let ds = two_topics();
        let result = SphericalKmeans::new(2)
            .with_seed(Seed::Fixed(4))
            .with_threshold(100)
            .cluster(&ds)
            .unwrap();

        assert_eq!(result.iteration_count(), 1);
        assert_eq!(result.iterations()[0].moved, ds.len());
        // The update was skipped, so centroids are still the sampled points.
        for (c, &id) in result.centroids().iter().zip(result.initial_points()) {
            let pos = ds.ids().iter().position(|&x| x == id).unwrap();
            assert_eq!(c.vector(), ds.vector(pos).to_dense(ds.dimension()).as_slice());
            assert_eq!(c.norm(), 1.0);
        }
    }

    #[test]
    fn update_gate_compares_cluster_count_to_threshold() {
        let ds = two_topics();
        let result = SphericalKmeans::new(2)
            .with_seed(Seed::Fixed(4))
            .with_threshold(ds.len() as i64)
            .cluster(&ds)
            .unwrap();

        // Every point moves, so the update runs, but at most 2 clusters need
        // recomputing, which is below the threshold: it reports 0 and stops.
        assert_eq!(result.iteration_count(), 1);
        assert_eq!(result.iterations()[0].moved, 0);
        for c in result.centroids() {
            assert_eq!(c.norm(), 1.0);
        }
    }
}
