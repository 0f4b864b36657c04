//! Clustering traits.

use ndarray::ArrayView2;

use crate::error::Result;

/// Trait for hard clustering of numeric feature matrices.
pub trait Clustering {
    /// Fit the model to data and return cluster assignments.
    ///
    /// Returns a vector of cluster labels in `0..k`, one per row.
    fn fit_predict(&self, data: ArrayView2<'_, f64>) -> Result<Vec<usize>>;

    /// Get the number of clusters.
    fn n_clusters(&self) -> usize;
}
