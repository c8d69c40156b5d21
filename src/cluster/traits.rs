use super::vectorize::VectorizedDataset;
use crate::error::Result;

/// Common interface for hard clustering algorithms (one label per point).
pub trait Clustering {
    /// Fit the model and return one cluster label per point, in dataset order.
    fn fit_predict(&self, data: &VectorizedDataset) -> Result<Vec<usize>>;

    /// The configured number of clusters.
    fn n_clusters(&self) -> usize;
}
