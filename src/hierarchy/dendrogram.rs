//! Dendrogram for hierarchical clustering.
//!
//! A dendrogram records the merge history of agglomerative (bottom-up)
//! clustering. Leaves are `0..n`; merge `i` creates cluster `n + i`.

use crate::error::{Error, Result};

/// A dendrogram representing hierarchical cluster merges.
///
/// Each merge combines two clusters into one, recording:
/// - Which clusters were merged
/// - The distance at which they merged
/// - The size of the resulting cluster
#[derive(Debug, Clone)]
pub struct Dendrogram {
    merges: Vec<Merge>,
    n_items: usize,
}

/// A single merge operation in the dendrogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    /// First cluster being merged (index).
    pub cluster_a: usize,
    /// Second cluster being merged (index).
    pub cluster_b: usize,
    /// Distance/dissimilarity at which merge occurred.
    pub distance: f64,
    /// Size of resulting cluster.
    pub size: usize,
}

impl Dendrogram {
    /// Create a new dendrogram for n items.
    pub fn new(n_items: usize) -> Self {
        Self {
            merges: Vec::with_capacity(n_items.saturating_sub(1)),
            n_items,
        }
    }

    /// Record a merge operation.
    pub fn add_merge(&mut self, cluster_a: usize, cluster_b: usize, distance: f64, size: usize) {
        self.merges.push(Merge {
            cluster_a,
            cluster_b,
            distance,
            size,
        });
    }

    /// Flat clustering with exactly `k` clusters.
    ///
    /// Replays the first `n - k` merges, so ties in merge distance never
    /// collapse the result below `k` clusters. Labels are `0..k`, numbered
    /// by the first record that falls into each cluster.
    pub fn cut_to_k(&self, k: usize) -> Result<Vec<usize>> {
        let n = self.n_items;
        if k == 0 || k > n {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: n,
            });
        }
        let n_merges = n - k;
        if n_merges > self.merges.len() {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: n,
            });
        }

        // parent[c] = cluster that absorbed c (itself if still a root).
        let mut parent: Vec<usize> = (0..n + n_merges).collect();
        for (i, merge) in self.merges.iter().take(n_merges).enumerate() {
            let id = n + i;
            if merge.cluster_a >= id || merge.cluster_b >= id {
                return Err(Error::invalid_parameter(
                    "dendrogram",
                    format!("merge {i} references a cluster that does not exist yet"),
                ));
            }
            parent[merge.cluster_a] = id;
            parent[merge.cluster_b] = id;
        }

        let mut root_label: Vec<Option<usize>> = vec![None; n + n_merges];
        let mut next = 0;
        let mut labels = Vec::with_capacity(n);
        for leaf in 0..n {
            let mut c = leaf;
            while parent[c] != c {
                c = parent[c];
            }
            let label = *root_label[c].get_or_insert_with(|| {
                next += 1;
                next - 1
            });
            labels.push(label);
        }
        Ok(labels)
    }

    /// Number of original items.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of merges recorded.
    pub fn n_merges(&self) -> usize {
        self.merges.len()
    }

    /// Iterate over merges.
    pub fn merges(&self) -> impl Iterator<Item = &Merge> {
        self.merges.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_leaves() -> Dendrogram {
        let mut dendro = Dendrogram::new(4);
        dendro.add_merge(0, 1, 0.5, 2);
        dendro.add_merge(2, 3, 0.5, 2);
        dendro.add_merge(4, 5, 1.0, 4);
        dendro
    }

    #[test]
    fn test_dendrogram_creation() {
        let dendro = Dendrogram::new(5);
        assert_eq!(dendro.n_items(), 5);
        assert_eq!(dendro.n_merges(), 0);
    }

    #[test]
    fn test_cut_to_k() {
        let dendro = four_leaves();
        assert_eq!(dendro.n_merges(), 3);
        assert_eq!(dendro.cut_to_k(4).unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(dendro.cut_to_k(2).unwrap(), vec![0, 0, 1, 1]);
        assert_eq!(dendro.cut_to_k(1).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_cut_with_tied_distances_keeps_k() {
        // Both first merges happen at 0.5; cutting to 3 must still give 3.
        let labels = four_leaves().cut_to_k(3).unwrap();
        assert_eq!(labels, vec![0, 0, 1, 2]);
    }

    #[test]
    fn test_cut_rejects_bad_k() {
        let dendro = four_leaves();
        assert!(dendro.cut_to_k(0).is_err());
        assert!(dendro.cut_to_k(5).is_err());
        // Not enough merges recorded for k = 1.
        assert!(Dendrogram::new(3).cut_to_k(1).is_err());
    }
}
