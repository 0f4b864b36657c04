//! Similarity, neighbor and link structures for ROCK.
//!
//! ROCK (Guha, Rastogi & Shim, 2000) clusters categorical records by how
//! many neighbors they share, not by how similar they are directly.
//!
//! ```text
//! sim(i, j)   = 1 − hamming(i, j) / m          (m encoded columns)
//! N_θ(i)      = { j ≠ i : sim(i, j) ≥ θ }
//! link(i, j)  = |N_θ(i) ∩ N_θ(j)|
//! dist(i, j)  = 1 / (link(i, j) + ε),  dist(i, i) = 0
//! ```
//!
//! Two records in a dense region share many neighbors even when they are not
//! identical, so link strength is more robust to noise than raw similarity.
//! ε keeps the distance finite for pairs with no common neighbor.
//!
//! # Scaling
//!
//! Every structure here is dense: O(n²) memory and at least O(n²) time. A few
//! thousand records is the practical ceiling.

use ndarray::Array2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::dataset::CategoricalTable;
use crate::encoding::EncodedTable;
use crate::error::{Error, Result};

/// Anything a link clustering run can derive a similarity matrix from.
///
/// The link clusterer is written once against this trait; the categorical
/// and ensemble stages differ only in the source they pass.
pub trait SimilaritySource {
    /// Build the record × record similarity matrix.
    fn similarity_matrix(&self) -> Result<SimilarityMatrix>;
}

impl SimilaritySource for EncodedTable {
    fn similarity_matrix(&self) -> Result<SimilarityMatrix> {
        SimilarityMatrix::hamming(self)
    }
}

impl SimilaritySource for CategoricalTable {
    fn similarity_matrix(&self) -> Result<SimilarityMatrix> {
        SimilarityMatrix::hamming(&EncodedTable::label_encode(self)?)
    }
}

impl SimilaritySource for SimilarityMatrix {
    fn similarity_matrix(&self) -> Result<SimilarityMatrix> {
        Ok(self.clone())
    }
}

/// Square, symmetric matrix of pairwise similarities in [0, 1].
///
/// Stored dense, so memory is O(n²) in the number of records.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    values: Array2<f64>,
}

impl SimilarityMatrix {
    /// One minus the normalized Hamming distance between encoded rows.
    pub fn hamming(encoded: &EncodedTable) -> Result<Self> {
        let n = encoded.n_rows();
        let m = encoded.n_cols();
        if n == 0 || m == 0 {
            return Err(Error::EmptyInput);
        }
        let codes = encoded.codes();

        let row_of = |i: usize| -> Vec<f64> {
            let a = codes.row(i);
            (0..n)
                .map(|j| {
                    let agree = a.iter().zip(codes.row(j).iter()).filter(|(x, y)| x == y).count();
                    agree as f64 / m as f64
                })
                .collect()
        };

        #[cfg(feature = "parallel")]
        let rows: Vec<Vec<f64>> = (0..n).into_par_iter().map(row_of).collect();
        #[cfg(not(feature = "parallel"))]
        let rows: Vec<Vec<f64>> = (0..n).map(row_of).collect();

        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let values = Array2::from_shape_vec((n, n), flat)
            .map_err(|e| Error::invalid_parameter("similarity", e.to_string()))?;
        Ok(Self { values })
    }

    /// Wrap a precomputed matrix after checking shape, range and symmetry.
    pub fn from_array(values: Array2<f64>) -> Result<Self> {
        let n = values.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if values.ncols() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: values.ncols(),
            });
        }
        if values.iter().any(|v| !(0.0..=1.0).contains(v)) {
            return Err(Error::invalid_parameter(
                "similarity",
                "entries must lie in [0, 1]",
            ));
        }
        for i in 0..n {
            for j in (i + 1)..n {
                if (values[(i, j)] - values[(j, i)]).abs() > 1e-12 {
                    return Err(Error::invalid_parameter(
                        "similarity",
                        format!("matrix is not symmetric at ({i}, {j})"),
                    ));
                }
            }
        }
        Ok(Self { values })
    }

    /// Similarity between records `i` and `j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[(i, j)]
    }

    /// Number of records.
    pub fn n_items(&self) -> usize {
        self.values.nrows()
    }

    /// The underlying matrix.
    pub fn as_array(&self) -> &Array2<f64> {
        &self.values
    }
}

/// Per-record neighbor lists at a fixed threshold. Lists are sorted and never
/// contain the record itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborSets {
    sets: Vec<Vec<usize>>,
}

impl NeighborSets {
    /// Neighbors of every record: `j ≠ i` with `sim(i, j) ≥ theta`.
    pub fn new(similarity: &SimilarityMatrix, theta: f64) -> Self {
        let n = similarity.n_items();
        let sets = (0..n)
            .map(|i| {
                (0..n)
                    .filter(|&j| j != i && similarity.get(i, j) >= theta)
                    .collect()
            })
            .collect();
        Self { sets }
    }

    /// Neighbors of record `i`.
    pub fn of(&self, i: usize) -> &[usize] {
        &self.sets[i]
    }

    /// Neighbor count per record.
    pub fn sizes(&self) -> Vec<usize> {
        self.sets.iter().map(Vec::len).collect()
    }

    /// Number of records.
    pub fn n_items(&self) -> usize {
        self.sets.len()
    }
}

/// Shared-neighbor counts. Symmetric with a zero diagonal.
///
/// Dense like [`SimilarityMatrix`]; building it costs O(Σ |N(l)|²).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMatrix {
    links: Array2<u32>,
}

impl LinkMatrix {
    /// Count common neighbors for every pair.
    ///
    /// Uses the symmetry of the neighbor relation: `l` is a common neighbor
    /// of `i` and `j` exactly when both appear in `N(l)`, so each neighbor
    /// list contributes one link to each of its pairs.
    pub fn from_neighbors(neighbors: &NeighborSets) -> Self {
        let n = neighbors.n_items();
        let mut links = Array2::<u32>::zeros((n, n));
        for l in 0..n {
            let nbrs = neighbors.of(l);
            for (a, &i) in nbrs.iter().enumerate() {
                for &j in &nbrs[a + 1..] {
                    links[(i, j)] += 1;
                    links[(j, i)] += 1;
                }
            }
        }
        Self { links }
    }

    /// Link count between `i` and `j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> u32 {
        self.links[(i, j)]
    }

    /// Number of records.
    pub fn n_items(&self) -> usize {
        self.links.nrows()
    }

    /// The underlying matrix.
    pub fn as_array(&self) -> &Array2<u32> {
        &self.links
    }

    /// `1 / (link + epsilon)` for every pair `i < j`, row-major upper
    /// triangle (the condensed layout hierarchical clustering consumes).
    pub fn condensed_distances(&self, epsilon: f64) -> Vec<f64> {
        let n = self.n_items();
        let mut condensed = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n.saturating_sub(1) {
            for j in (i + 1)..n {
                condensed.push(link_distance(self.links[(i, j)], epsilon));
            }
        }
        condensed
    }

    /// Full distance matrix with a zero diagonal.
    pub fn distance_matrix(&self, epsilon: f64) -> Array2<f64> {
        let n = self.n_items();
        Array2::from_shape_fn((n, n), |(i, j)| {
            if i == j {
                0.0
            } else {
                link_distance(self.links[(i, j)], epsilon)
            }
        })
    }
}

#[inline]
fn link_distance(link: u32, epsilon: f64) -> f64 {
    1.0 / (link as f64 + epsilon)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_groups() -> CategoricalTable {
        CategoricalTable::from_rows(
            &["type", "flag"],
            &[
                vec!["mamin", "ya"],
                vec!["mamin", "ya"],
                vec!["mamin", "tidak"],
                vec!["oleh", "tidak"],
                vec!["oleh", "tidak"],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_hamming_similarity() {
        let sim = two_groups().similarity_matrix().unwrap();
        assert_eq!(sim.n_items(), 5);
        assert_eq!(sim.get(0, 1), 1.0);
        assert_eq!(sim.get(0, 2), 0.5);
        assert_eq!(sim.get(0, 3), 0.0);
        assert_eq!(sim.get(2, 3), 0.5);
        for i in 0..5 {
            assert_eq!(sim.get(i, i), 1.0);
        }
    }

    #[test]
    fn test_neighbors_exclude_self() {
        let sim = two_groups().similarity_matrix().unwrap();
        let nbrs = NeighborSets::new(&sim, 0.5);
        assert_eq!(nbrs.of(0), &[1, 2]);
        assert_eq!(nbrs.of(2), &[0, 1, 3, 4]);
        assert_eq!(nbrs.of(3), &[2, 4]);

        let strict = NeighborSets::new(&sim, 0.9);
        assert_eq!(strict.of(2), &[] as &[usize]);
        assert_eq!(strict.sizes(), vec![1, 1, 0, 1, 1]);
    }

    #[test]
    fn test_links_count_shared_neighbors() {
        let sim = two_groups().similarity_matrix().unwrap();
        let links = LinkMatrix::from_neighbors(&NeighborSets::new(&sim, 0.5));

        // N(0) = {1,2}, N(1) = {0,2}: shared {2}
        assert_eq!(links.get(0, 1), 1);
        // N(0) = {1,2}, N(3) = {2,4}: shared {2}
        assert_eq!(links.get(0, 3), 1);
        // N(2) = {0,1,3,4}, N(3) = {2,4}: shared {4}
        assert_eq!(links.get(2, 3), 1);
        // N(3) = {2,4}, N(4) = {2,3}: shared {2}
        assert_eq!(links.get(3, 4), 1);
        // N(0) = {1,2}, N(2) = {0,1,3,4}: shared {1}
        assert_eq!(links.get(0, 2), 1);
        for i in 0..5 {
            assert_eq!(links.get(i, i), 0);
        }
    }

    #[test]
    fn test_distance_smoothing() {
        let sim = two_groups().similarity_matrix().unwrap();
        let links = LinkMatrix::from_neighbors(&NeighborSets::new(&sim, 0.9));
        let dist = links.distance_matrix(1e-6);

        // 0 and 1 share no neighbor at θ = 0.9 (each has only the other).
        assert_eq!(links.get(0, 1), 0);
        assert!((dist[(0, 1)] - 1e6).abs() < 1e-3);
        assert_eq!(dist[(0, 0)], 0.0);

        let condensed = links.condensed_distances(1e-6);
        assert_eq!(condensed.len(), 10);
        assert_eq!(condensed[0], dist[(0, 1)]);
    }

    #[test]
    fn test_from_array_validates() {
        let ok = Array2::from_shape_vec((2, 2), vec![1.0, 0.3, 0.3, 1.0]).unwrap();
        assert!(SimilarityMatrix::from_array(ok).is_ok());

        let asym = Array2::from_shape_vec((2, 2), vec![1.0, 0.3, 0.4, 1.0]).unwrap();
        assert!(SimilarityMatrix::from_array(asym).is_err());

        let out_of_range = Array2::from_shape_vec((2, 2), vec![1.0, 1.5, 1.5, 1.0]).unwrap();
        assert!(SimilarityMatrix::from_array(out_of_range).is_err());

        let rect = Array2::<f64>::zeros((2, 3));
        assert!(SimilarityMatrix::from_array(rect).is_err());
    }
}
