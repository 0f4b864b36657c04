//! Cluster quality metrics.
//!
//! | Metric | Domain | Best | Used by |
//! |--------|--------|------|---------|
//! | [`numeric_score`] (Pseudo-F, ICD) | numeric rows | high F | numeric stage |
//! | [`cp_star`] | similarity matrix | 1 | categorical + ensemble stages |
//! | [`ari`] | two labelings | 1 | ensemble agreement report |
//!
//! # Pseudo-F (Calinski–Harabasz)
//!
//! ```text
//! SW = Σ_c Σ_{x∈c} ‖x − μ_c‖²        within-cluster sum of squares
//! SB = Σ_c |c| · ‖μ_c − μ‖²           between-cluster sum of squares
//! F  = (SB / (k − 1)) / (SW / (n − k))
//! ```
//!
//! `SW = 0` (every cluster is a single point, or duplicates) means perfect
//! separation, and F is +∞ by convention.
//!
//! # CP*
//!
//! Size-weighted mean intra-cluster similarity:
//!
//! ```text
//! CP* = (1/N) Σ_{c : |c| ≥ 2} |c| · mean_{i<j ∈ c} sim(i, j)
//! ```
//!
//! Singletons contribute 0, so a partition full of singletons scores low even
//! though each singleton is trivially cohesive.
//!
//! # References
//!
//! - Caliński & Harabasz (1974). "A dendrite method for cluster analysis."
//! - Hubert & Arabie (1985). "Comparing partitions" (ARI)

use std::collections::{BTreeMap, HashMap};

use ndarray::{Array1, ArrayView2};
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::similarity::{SimilarityMatrix, SimilaritySource};

/// Pseudo-F and its ingredients for one numeric labeling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericScore {
    /// Between/within variance ratio; +∞ when `within` is 0.
    ///
    /// Serialized as `"inf"` in that case, since JSON has no infinity.
    #[serde(serialize_with = "serialize_unbounded")]
    pub pseudo_f: f64,
    /// Inter-cluster distance proxy: `within / n`.
    pub icd: f64,
    /// Within-cluster sum of squares.
    pub within: f64,
    /// Between-cluster sum of squares.
    pub between: f64,
}

/// Score a labeling of numeric rows with Pseudo-F and ICD.
///
/// Labels may be any ids; `k` is the number of distinct ids and must be at
/// least 2.
pub fn numeric_score(data: ArrayView2<'_, f64>, labels: &[usize]) -> Result<NumericScore> {
    let n = data.nrows();
    if n == 0 {
        return Err(Error::EmptyInput);
    }
    if labels.len() != n {
        return Err(Error::LabelMisaligned {
            left: n,
            right: labels.len(),
        });
    }

    let members = group_members(labels);
    let k = members.len();
    if k < 2 {
        return Err(Error::InvalidClusterCount {
            requested: k,
            n_items: n,
        });
    }

    let global_mean = mean_of(data, 0..n);
    let mut within = 0.0;
    let mut between = 0.0;
    for rows in members.values() {
        let centroid = mean_of(data, rows.iter().copied());
        within += rows
            .iter()
            .map(|&i| squared_distance(&data.row(i).to_owned(), &centroid))
            .sum::<f64>();
        between += rows.len() as f64 * squared_distance(&centroid, &global_mean);
    }

    let pseudo_f = if within == 0.0 {
        f64::INFINITY
    } else {
        (between / (k - 1) as f64) / (within / (n - k) as f64)
    };

    Ok(NumericScore {
        pseudo_f,
        icd: within / n as f64,
        within,
        between,
    })
}

/// CP* of a labeling over a prebuilt similarity matrix.
pub fn cp_star(similarity: &SimilarityMatrix, labels: &[usize]) -> Result<f64> {
    let n = similarity.n_items();
    if n == 0 {
        return Err(Error::EmptyInput);
    }
    if labels.len() != n {
        return Err(Error::LabelMisaligned {
            left: n,
            right: labels.len(),
        });
    }

    let mut total = 0.0;
    for rows in group_members(labels).values() {
        let size = rows.len();
        if size < 2 {
            continue;
        }
        let mut sum = 0.0;
        for (a, &i) in rows.iter().enumerate() {
            for &j in &rows[a + 1..] {
                sum += similarity.get(i, j);
            }
        }
        let pairs = (size * (size - 1) / 2) as f64;
        total += size as f64 * (sum / pairs);
    }

    Ok(total / n as f64)
}

/// CP* of a labeling over any similarity source (builds the matrix first).
pub fn cp_star_for<S: SimilaritySource + ?Sized>(source: &S, labels: &[usize]) -> Result<f64> {
    cp_star(&source.similarity_matrix()?, labels)
}

/// Adjusted Rand Index between two labelings.
///
/// ARI is the corrected-for-chance version of the Rand Index.
/// 0 indicates chance-level agreement, 1 identical partitions.
/// Returns 0.0 for empty or mismatched inputs.
pub fn ari(pred: &[usize], truth: &[usize]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let (joint, n) = build_contingency_table(pred, truth);

    // Row sums (a_i) and column sums (b_j)
    let mut row_sums = HashMap::new();
    let mut col_sums = HashMap::new();

    for (&(p, t), &count) in &joint {
        *row_sums.entry(p).or_insert(0usize) += count;
        *col_sums.entry(t).or_insert(0usize) += count;
    }

    let sum_comb_ij: f64 = joint.values().map(|&c| comb2(c) as f64).sum();
    let sum_comb_a: f64 = row_sums.values().map(|&a| comb2(a) as f64).sum();
    let sum_comb_b: f64 = col_sums.values().map(|&b| comb2(b) as f64).sum();

    let comb_n = comb2(n) as f64;
    if comb_n == 0.0 {
        return 1.0;
    }

    // ARI = (index - expected) / (max - expected)
    let expected = sum_comb_a * sum_comb_b / comb_n;
    let max_index = (sum_comb_a + sum_comb_b) / 2.0;

    let denom = max_index - expected;
    if denom.abs() < 1e-10 {
        return 1.0;
    }

    (sum_comb_ij - expected) / denom
}

/// Serialize an `f64` that may be infinite: finite values as numbers,
/// otherwise `"inf"`, `"-inf"` or `"nan"`.
pub fn serialize_unbounded<S: Serializer>(
    value: &f64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str("nan")
    } else if *value > 0.0 {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_str("-inf")
    }
}

// Helper functions

/// Record indices per distinct label, in ascending label order.
fn group_members(labels: &[usize]) -> BTreeMap<usize, Vec<usize>> {
    let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        members.entry(label).or_default().push(i);
    }
    members
}

fn mean_of(data: ArrayView2<'_, f64>, rows: impl Iterator<Item = usize>) -> Array1<f64> {
    let mut sum = Array1::<f64>::zeros(data.ncols());
    let mut count = 0usize;
    for i in rows {
        sum += &data.row(i);
        count += 1;
    }
    if count > 0 {
        sum /= count as f64;
    }
    sum
}

fn squared_distance(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

fn build_contingency_table(
    pred: &[usize],
    truth: &[usize],
) -> (HashMap<(usize, usize), usize>, usize) {
    let mut table = HashMap::new();
    for (&p, &t) in pred.iter().zip(truth.iter()) {
        *table.entry((p, t)).or_insert(0) += 1;
    }
    (table, pred.len())
}

fn comb2(n: usize) -> usize {
    if n < 2 {
        0
    } else {
        n * (n - 1) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CategoricalTable;
    use ndarray::array;

    #[test]
    fn test_pseudo_f_known_values() {
        let data = array![[0.0], [2.0], [10.0], [12.0]];
        let score = numeric_score(data.view(), &[0, 0, 1, 1]).unwrap();

        // Centroids 1 and 11, global mean 6.
        assert!((score.within - 4.0).abs() < 1e-12);
        assert!((score.between - 100.0).abs() < 1e-12);
        // (100 / 1) / (4 / 2)
        assert!((score.pseudo_f - 50.0).abs() < 1e-12);
        assert!((score.icd - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pseudo_f_infinite_when_every_record_is_its_own_cluster() {
        let data = array![[0.0, 1.0], [2.0, 3.0], [5.0, 5.0]];
        let score = numeric_score(data.view(), &[0, 1, 2]).unwrap();
        assert_eq!(score.within, 0.0);
        assert!(score.pseudo_f.is_infinite() && score.pseudo_f > 0.0);
        assert_eq!(score.icd, 0.0);
    }

    #[test]
    fn test_infinite_pseudo_f_serializes_as_label() {
        let data = array![[0.0], [0.0], [4.0], [4.0]];
        let score = numeric_score(data.view(), &[0, 0, 1, 1]).unwrap();
        let value = serde_json::to_value(score).unwrap();
        assert_eq!(value["pseudo_f"], "inf");
        assert_eq!(value["within"], 0.0);

        let finite = numeric_score(array![[0.0], [2.0], [10.0], [12.0]].view(), &[0, 0, 1, 1])
            .unwrap();
        assert_eq!(serde_json::to_value(finite).unwrap()["pseudo_f"], 50.0);
    }

    #[test]
    fn test_numeric_score_needs_two_clusters() {
        let data = array![[0.0], [1.0]];
        assert!(matches!(
            numeric_score(data.view(), &[3, 3]),
            Err(Error::InvalidClusterCount { requested: 1, .. })
        ));
        assert!(numeric_score(data.view(), &[0]).is_err());
    }

    #[test]
    fn test_cp_star_perfect_groups() {
        let table = CategoricalTable::from_rows(
            &["type", "flag"],
            &[
                vec!["mamin", "ya"],
                vec!["mamin", "ya"],
                vec!["oleh", "tidak"],
                vec!["oleh", "tidak"],
            ],
        )
        .unwrap();
        let score = cp_star_for(&table, &[0, 0, 1, 1]).unwrap();
        assert_eq!(score, 1.0);

        // Mixed clusters: each pair has similarity 0.
        let mixed = cp_star_for(&table, &[0, 1, 0, 1]).unwrap();
        assert_eq!(mixed, 0.0);
    }

    #[test]
    fn test_cp_star_singletons_contribute_nothing() {
        let table =
            CategoricalTable::from_rows(&["t"], &[vec!["a"], vec!["a"], vec!["a"]]).unwrap();
        assert_eq!(cp_star_for(&table, &[0, 1, 2]).unwrap(), 0.0);
        // One pair of identical records (weight 2) plus a singleton.
        let score = cp_star_for(&table, &[0, 0, 1]).unwrap();
        assert!((score - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_cp_star_relabel_invariant() {
        let table = CategoricalTable::from_rows(
            &["t", "f"],
            &[
                vec!["a", "x"],
                vec!["a", "y"],
                vec!["b", "y"],
                vec!["b", "y"],
                vec!["c", "x"],
            ],
        )
        .unwrap();
        let sim = table.similarity_matrix().unwrap();
        let a = cp_star(&sim, &[1, 1, 2, 2, 2]).unwrap();
        let b = cp_star(&sim, &[7, 7, 3, 3, 3]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_cp_star_misaligned() {
        let table = CategoricalTable::from_rows(&["t"], &[vec!["a"], vec!["b"]]).unwrap();
        assert!(matches!(
            cp_star_for(&table, &[0]),
            Err(Error::LabelMisaligned { left: 2, right: 1 })
        ));
    }

    #[test]
    fn test_ari_perfect_and_permuted() {
        assert!((ari(&[0, 0, 1, 1], &[0, 0, 1, 1]) - 1.0).abs() < 1e-12);
        assert!((ari(&[1, 1, 0, 0], &[0, 0, 1, 1]) - 1.0).abs() < 1e-12);
        assert!(ari(&[0, 1, 0, 1], &[0, 0, 1, 1]) < 0.5);
        assert_eq!(ari(&[0, 1], &[0]), 0.0);
    }
}
