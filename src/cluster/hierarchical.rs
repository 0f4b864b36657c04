//! Hierarchical (agglomerative) clustering.
//!
//! Bottom-up clustering that builds a **dendrogram** by iteratively
//! merging the closest clusters, then cuts it to k clusters.
//!
//! # Linkage Methods
//!
//! The key choice: how do we define "distance between clusters"?
//!
//! | Linkage | Formula | Effect |
//! |---------|---------|--------|
//! | Single | min(d(a,b)) for a∈A, b∈B | Chaining; elongated clusters |
//! | Complete | max(d(a,b)) | Compact, spherical clusters |
//! | Average | mean(d(a,b)) | Balanced compromise |
//! | Ward | Δ variance | Minimizes within-cluster variance (opt-in) |
//!
//! Two inputs are supported: raw feature rows (Euclidean distance), and a
//! precomputed condensed distance matrix. The link clusterer uses the
//! second form with `1 / (link + ε)` distances.
//!
//! # When to Use
//!
//! - **Unknown k**: one dendrogram can be cut at every k of a grid
//! - **Small-medium data**: O(n²) space for distance matrix

use core::fmt;

use kodama::{linkage as kodama_linkage, Method as KodamaMethod};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use super::traits::Clustering;
use crate::error::{Error, Result};
use crate::hierarchy::Dendrogram;

/// Linkage method for hierarchical clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Single linkage: minimum distance between clusters.
    Single,
    /// Complete linkage: maximum distance between clusters.
    Complete,
    /// Average linkage: mean distance between clusters.
    Average,
    /// Ward's method: minimize within-cluster variance.
    ///
    /// Not part of the default numeric grid. Add it to
    /// `NumericSearchConfig::linkages` to search it as well.
    Ward,
}

impl Linkage {
    fn method(self) -> KodamaMethod {
        match self {
            Linkage::Single => KodamaMethod::Single,
            Linkage::Complete => KodamaMethod::Complete,
            Linkage::Average => KodamaMethod::Average,
            Linkage::Ward => KodamaMethod::Ward,
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Linkage::Single => write!(f, "single"),
            Linkage::Complete => write!(f, "complete"),
            Linkage::Average => write!(f, "average"),
            Linkage::Ward => write!(f, "ward"),
        }
    }
}

/// Hierarchical (agglomerative) clustering.
#[derive(Debug, Clone)]
pub struct HierarchicalClustering {
    /// Number of clusters to produce.
    n_clusters: usize,
    /// Linkage method.
    linkage: Linkage,
}

impl HierarchicalClustering {
    /// Create a new hierarchical clusterer.
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            linkage: Linkage::Average,
        }
    }

    /// Set linkage method.
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Configured linkage.
    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    /// Fit and return the full dendrogram over Euclidean distances between rows.
    pub fn fit_dendrogram(&self, data: ArrayView2<'_, f64>) -> Result<Dendrogram> {
        dendrogram(data, self.linkage)
    }

    /// Fit on a precomputed condensed distance matrix of `n` items.
    pub fn fit_dendrogram_condensed(&self, condensed: &mut [f64], n: usize) -> Result<Dendrogram> {
        condensed_dendrogram(condensed, n, self.linkage)
    }
}

/// Full merge tree over Euclidean distances between rows.
///
/// Needs no cluster count: the grid searches build one tree and cut it for
/// every k.
pub fn dendrogram(data: ArrayView2<'_, f64>, linkage: Linkage) -> Result<Dendrogram> {
    let n = data.nrows();
    if n == 0 || data.ncols() == 0 {
        return Err(Error::EmptyInput);
    }

    // Condensed dissimilarity matrix (upper triangle, row-major).
    let mut condensed = Vec::with_capacity((n * (n - 1)) / 2);
    for row in 0..(n - 1) {
        for col in (row + 1)..n {
            condensed.push(euclidean_distance(data.row(row), data.row(col)));
        }
    }

    condensed_dendrogram(&mut condensed, n, linkage)
}

/// Full merge tree over a precomputed condensed distance matrix of `n` items.
///
/// `condensed` is overwritten during clustering.
pub fn condensed_dendrogram(
    condensed: &mut [f64],
    n: usize,
    linkage: Linkage,
) -> Result<Dendrogram> {
    if n == 0 {
        return Err(Error::EmptyInput);
    }
    let expected = n * (n - 1) / 2;
    if condensed.len() != expected {
        return Err(Error::DimensionMismatch {
            expected,
            found: condensed.len(),
        });
    }
    if let Some(d) = condensed.iter().find(|d| !d.is_finite()) {
        return Err(Error::invalid_parameter(
            "distance",
            format!("non-finite distance {d}"),
        ));
    }

    let mut dendro = Dendrogram::new(n);
    if n == 1 {
        return Ok(dendro);
    }

    // kodama labels leaves 0..n-1 and gives merge i the id n+i.
    let dend = kodama_linkage(condensed, n, linkage.method());
    for step in dend.steps() {
        dendro.add_merge(step.cluster1, step.cluster2, step.dissimilarity, step.size);
    }

    Ok(dendro)
}

impl Clustering for HierarchicalClustering {
    fn fit_predict(&self, data: ArrayView2<'_, f64>) -> Result<Vec<usize>> {
        if self.n_clusters > data.nrows() {
            return Err(Error::InvalidClusterCount {
                requested: self.n_clusters,
                n_items: data.nrows(),
            });
        }
        let dendro = self.fit_dendrogram(data)?;
        dendro.cut_to_k(self.n_clusters)
    }

    fn n_clusters(&self) -> usize {
        self.n_clusters
    }
}

/// Euclidean distance between two rows.
#[inline]
fn euclidean_distance(a: ndarray::ArrayView1<'_, f64>, b: ndarray::ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
