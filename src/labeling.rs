//! Cluster labelings aligned with record order.

use serde::Serialize;

/// Cluster id per record, using ids `1..=k`.
///
/// Position `i` is record `i` of the original table. Ids carry no order;
/// they are numbered by the first record that falls into each cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Labeling {
    ids: Vec<usize>,
}

impl Labeling {
    /// From 0-based cluster indices (as produced by dendrogram cuts).
    pub fn from_zero_based(labels: &[usize]) -> Self {
        Self::from_ids(labels.iter().map(|l| l + 1).collect())
    }

    /// From arbitrary cluster ids; renumbered to `1..=k` by first appearance.
    pub fn from_ids(ids: Vec<usize>) -> Self {
        let mut seen: Vec<(usize, usize)> = Vec::new();
        let ids = ids
            .into_iter()
            .map(|id| match seen.iter().find(|(raw, _)| *raw == id) {
                Some(&(_, new)) => new,
                None => {
                    let new = seen.len() + 1;
                    seen.push((id, new));
                    new
                }
            })
            .collect();
        Self { ids }
    }

    /// Cluster ids, one per record.
    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    /// Cluster ids shifted to `0..k`.
    pub fn zero_based(&self) -> Vec<usize> {
        self.ids.iter().map(|id| id - 1).collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if there are no records.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of distinct clusters.
    pub fn n_clusters(&self) -> usize {
        self.ids.iter().copied().max().unwrap_or(0)
    }

    /// Record indices per cluster, ordered by cluster id.
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.n_clusters()];
        for (record, id) in self.ids.iter().enumerate() {
            groups[id - 1].push(record);
        }
        groups
    }

    /// True if both labelings induce the same partition, ignoring ids.
    pub fn same_partition(&self, other: &Labeling) -> bool {
        self.len() == other.len() && self.groups() == other.groups()
    }
}
