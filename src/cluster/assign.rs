//! Nearest-centroid assignment.

use std::collections::BTreeSet;

use super::centroid::Partition;
use super::vectorize::VectorizedDataset;
use crate::sink::LogSink;

/// Dissimilarity at or below which a centroid is treated as an exact match
/// and the scan for that point stops early.
pub const EXACT_MATCH_TOLERANCE: f64 = 3e-16;

/// Outcome of one assignment pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssignOutcome {
    /// Points whose cluster changed (including first-time assignments).
    pub moved: usize,
    /// Clusters that lost or gained a point.
    pub touched: BTreeSet<usize>,
    /// Sum over points of the dissimilarity to their chosen centroid.
    pub objective: f64,
}

impl Partition {
    /// Assign every point to its least dissimilar centroid.
    ///
    /// Member lists are rebuilt from scratch; on return each centroid's
    /// members are exactly the points assigned to it by this pass, in
    /// point order. Among equally dissimilar centroids the lowest id wins.
    pub(crate) fn assign_points(&mut self, data: &VectorizedDataset, tolerance: f64) -> AssignOutcome {
        for c in &mut self.centroids {
            c.members.clear();
        }

        let mut out = AssignOutcome::default();

        for p in 0..data.len() {
            let point = data.vector(p);
            let mut best = 0usize;
            let mut best_dissim = f64::INFINITY;
            for c in &self.centroids {
                let d = c.dissimilarity(point);
                if d < best_dissim {
                    best_dissim = d;
                    best = c.id();
                }
                if best_dissim <= tolerance {
                    break;
                }
            }

            out.objective += best_dissim;
            self.centroids[best].members.push(p);

            let previous = self.assignment[p];
            if previous != Some(best) {
                if let Some(old) = previous {
                    out.touched.insert(old);
                }
                out.touched.insert(best);
                out.moved += 1;
                self.assignment[p] = Some(best);
            }
        }

        out
    }

    /// One iteration: assign, then (when enough points moved) repair and
    /// recompute the touched centroids.
    ///
    /// Returns the count the convergence loop compares against `threshold`:
    /// the moved-point count when the update is skipped, otherwise the value
    /// returned by [`update_centroids`](Partition::update_centroids).
    pub(crate) fn step(
        &mut self,
        data: &VectorizedDataset,
        threshold: usize,
        tolerance: f64,
        sink: &mut dyn LogSink,
    ) -> (usize, f64) {
        let outcome = self.assign_points(data, tolerance);
        if outcome.moved < threshold {
            return (outcome.moved, outcome.objective);
        }
        let updated = self.update_centroids(data, outcome.touched, threshold, sink);
        (updated, outcome.objective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::centroid::Centroid;
    use crate::cluster::PointStore;
    use crate::sink::NoopSink;

    fn dataset(points: &[(u64, Vec<usize>, Vec<f64>)]) -> VectorizedDataset {
        let mut store = PointStore::new();
        for (id, idx, val) in points {
            store.add_data_point(*id, idx.clone(), val.clone()).unwrap();
        }
        store.prepare()
    }

    fn partition_from(ds: &VectorizedDataset, seeds: &[usize]) -> Partition {
        let centroids = seeds
            .iter()
            .enumerate()
            .map(|(cid, &p)| Centroid::from_point(cid, ds.vector(p), ds.dimension()))
            .collect();
        Partition::new(centroids, ds.len())
    }

    #[test]
    fn first_pass_moves_everything() {
        let ds = dataset(&[
            (1, vec![0], vec![1.0]),
            (2, vec![1], vec![1.0]),
            (3, vec![0], vec![2.0]),
        ]);
        let mut part = partition_from(&ds, &[0, 1]);
        let out = part.assign_points(&ds, EXACT_MATCH_TOLERANCE);

        assert_eq!(out.moved, 3);
        assert_eq!(out.touched, BTreeSet::from([0, 1]));
        assert!(out.objective.abs() < 1e-12);
        assert_eq!(part.centroids()[0].members(), &[0, 2]);
        assert_eq!(part.centroids()[1].members(), &[1]);
        assert_eq!(part.assignment(), &[Some(0), Some(1), Some(0)]);

        // Nothing moves on a second pass against the same centroids.
        let again = part.assign_points(&ds, EXACT_MATCH_TOLERANCE);
        assert_eq!(again.moved, 0);
        assert!(again.touched.is_empty());
    }

    #[test]
    fn ties_go_to_lowest_id() {
        // Point 3 is orthogonal to both centroids: dissimilarity 1 to each.
        let ds = dataset(&[
            (1, vec![0], vec![1.0]),
            (2, vec![1], vec![1.0]),
            (3, vec![2], vec![1.0]),
        ]);
        let mut part = partition_from(&ds, &[1, 0]);
        part.assign_points(&ds, EXACT_MATCH_TOLERANCE);
        assert_eq!(part.assignment()[2], Some(0));
    }

    #[test]
    fn exact_match_stops_scan() {
        // Two identical centroids: the second is never reached for point 1.
        let ds = dataset(&[(1, vec![0], vec![1.0]), (2, vec![0], vec![1.0])]);
        let mut part = partition_from(&ds, &[0, 1]);
        part.assign_points(&ds, EXACT_MATCH_TOLERANCE);
        assert_eq!(part.centroids()[0].members(), &[0, 1]);
        assert!(part.centroids()[1].members().is_empty());
    }

    #[test]
    fn moving_marks_old_and_new() {
        let ds = dataset(&[
            (1, vec![0], vec![1.0]),
            (2, vec![1], vec![1.0]),
            (3, vec![0, 1], vec![1.0, 0.2]),
        ]);
        let mut part = partition_from(&ds, &[0, 1]);
        part.assign_points(&ds, EXACT_MATCH_TOLERANCE);
        assert_eq!(part.assignment()[2], Some(0));

        // Pull centroid 1 onto point 3 so it moves over.
        part.centroids[1].reset_to_point(ds.vector(2));
        let out = part.assign_points(&ds, EXACT_MATCH_TOLERANCE);
        assert_eq!(out.moved, 1);
        assert_eq!(out.touched, BTreeSet::from([0, 1]));
        assert_eq!(part.assignment()[2], Some(1));
    }

    fn three_points() -> VectorizedDataset {
        dataset(&[
            (1, vec![0], vec![1.0]),
            (2, vec![1], vec![1.0]),
            (3, vec![0, 1], vec![1.0, 0.2]),
        ])
    }

    #[test]
    fn step_below_threshold_returns_moves_untouched() {
        let ds = three_points();
        let mut part = partition_from(&ds, &[0, 1]);
        let expected = part.clone().assign_points(&ds, EXACT_MATCH_TOLERANCE);

        let (count, objective) = part.step(&ds, 10, EXACT_MATCH_TOLERANCE, &mut NoopSink);

        assert_eq!(count, 3);
        assert_eq!(objective, expected.objective);
        assert_eq!(part.centroids()[0].vector(), &[1.0, 0.0]);
        assert_eq!(part.centroids()[1].vector(), &[0.0, 1.0]);
        assert_eq!(part.centroids()[0].members(), &[0, 2]);
    }

    #[test]
    fn step_at_threshold_recomputes() {
        let ds = three_points();
        let mut part = partition_from(&ds, &[0, 1]);

        let (count, _) = part.step(&ds, 0, EXACT_MATCH_TOLERANCE, &mut NoopSink);

        assert_eq!(count, 2);
        assert_ne!(part.centroids()[0].vector(), &[1.0, 0.0]);
        assert!(part.centroids()[0].norm() < 1.0);
        assert_eq!(part.centroids()[1].vector(), &[0.0, 1.0]);
    }
}
