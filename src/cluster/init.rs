//! Initial centroid selection.

use std::fmt;

use rand::prelude::*;

use super::centroid::Centroid;
use super::vectorize::VectorizedDataset;

/// Source of randomness for centroid initialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Seed {
    /// Reproducible: identical seed and ingest order give identical centroids.
    Fixed(u64),
    /// Draw a fresh seed from the operating system.
    #[default]
    FromEntropy,
}

impl Seed {
    /// Seeds `1, 3, 5, ...` for `n` reproducible trials.
    pub fn odd_sequence(n: usize) -> Vec<Seed> {
        (0..n as u64).map(|i| Seed::Fixed(2 * i + 1)).collect()
    }

    /// Resolve to a concrete seed value.
    pub fn resolve(self) -> u64 {
        match self {
            Seed::Fixed(s) => s,
            Seed::FromEntropy => {
                let s = rand::rng().random();
                log::debug!("derived centroid seed {s} from entropy");
                s
            }
        }
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seed::Fixed(s) => write!(f, "{s}"),
            Seed::FromEntropy => f.write_str("undefined"),
        }
    }
}

/// Draw `k` distinct point positions uniformly at random.
///
/// Sampling is with rejection: a position already drawn is redrawn. The
/// caller guarantees `k <= n`.
pub(crate) fn sample_distinct(k: usize, n: usize, rng: &mut impl Rng) -> Vec<usize> {
    debug_assert!(k <= n);
    let mut taken = vec![false; n];
    let mut picks: Vec<usize> = Vec::with_capacity(k);
    while picks.len() < k {
        let idx = rng.random_range(0..n);
        if taken[idx] {
            continue;
        }
        taken[idx] = true;
        picks.push(idx);
    }
    picks
}

/// Create `k` centroids from distinct random points, each with norm 1.
///
/// Returns the centroids and the positions of the points they were seeded from.
pub(crate) fn initialize_centroids(
    data: &VectorizedDataset,
    k: usize,
    seed: u64,
) -> (Vec<Centroid>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let picks = sample_distinct(k, data.len(), &mut rng);
    let centroids = picks
        .iter()
        .enumerate()
        .map(|(cid, &p)| Centroid::from_point(cid, data.vector(p), data.dimension()))
        .collect();
    (centroids, picks)
}
