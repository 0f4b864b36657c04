//! ROCK-style link clustering with a (θ, k) grid search.
//!
//! # Per candidate
//!
//! 1. Similarity matrix from the [`SimilaritySource`] (once per search)
//! 2. Neighbor sets at θ
//! 3. Link matrix: shared-neighbor counts
//! 4. Distance `1 / (link + ε)`
//! 5. Average-linkage dendrogram on that distance, cut to exactly k
//! 6. CP* of the labeling on the same similarity matrix
//!
//! Steps 2–5 depend on θ only, so the dendrogram is built once per θ and
//! cut for each k.
//!
//! # Candidate stream
//!
//! [`LinkClusterer::candidates`] returns a lazy iterator over the grid in
//! θ-ascending, k-ascending order. It does no work until polled, can be
//! dropped between candidates to cancel, and can be resumed from any index
//! with [`LinkCandidates::starting_at`].
//!
//! # References
//!
//! Guha, Rastogi & Shim (2000). "ROCK: A Robust Clustering Algorithm for
//! Categorical Attributes." Information Systems 25(5).

use tracing::info;

use super::hierarchical::{condensed_dendrogram, Linkage};
use crate::config::LinkSearchConfig;
use crate::error::{Error, Result, Stage};
use crate::hierarchy::Dendrogram;
use crate::labeling::Labeling;
use crate::metrics::cp_star;
use crate::search::{select_best, Candidate, CandidateOutcome, ScoreRow, TieBreak};
use crate::similarity::{LinkMatrix, NeighborSets, SimilarityMatrix, SimilaritySource};

/// Outcome of a link clustering search.
#[derive(Debug, Clone)]
pub struct LinkResult {
    /// Winning similarity threshold.
    pub theta: f64,
    /// Winning cluster count.
    pub k: usize,
    /// CP* of the winner.
    pub cp_star: f64,
    /// Winning labeling.
    pub labeling: Labeling,
    /// (θ, k, CP*) for every candidate.
    pub table: Vec<ScoreRow<f64, f64>>,
}

/// Link clusterer over any similarity source.
#[derive(Debug, Clone)]
pub struct LinkClusterer {
    config: LinkSearchConfig,
    stage: Stage,
}

impl LinkClusterer {
    /// Clusterer with the given grid, reporting as the categorical stage.
    pub fn new(config: LinkSearchConfig) -> Self {
        Self {
            config,
            stage: Stage::Categorical,
        }
    }

    /// Stage used in logs and errors.
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    /// Set the θ grid.
    pub fn with_thetas(mut self, thetas: Vec<f64>) -> Self {
        self.config.thetas = thetas;
        self
    }

    /// Set the inclusive k range.
    pub fn with_k_range(mut self, k_min: usize, k_max: usize) -> Self {
        self.config.k_min = k_min;
        self.config.k_max = k_max;
        self
    }

    /// Set the distance smoothing term.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    /// Set the tie-break policy.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.config.tie_break = tie_break;
        self
    }

    /// The grid.
    pub fn config(&self) -> &LinkSearchConfig {
        &self.config
    }

    /// Lazy candidate stream over a prebuilt similarity matrix.
    pub fn candidates<'a>(&'a self, similarity: &'a SimilarityMatrix) -> LinkCandidates<'a> {
        LinkCandidates {
            similarity,
            thetas: self.config.sorted_thetas(),
            k_min: self.config.k_min,
            n_k: (self.config.k_max + 1).saturating_sub(self.config.k_min),
            epsilon: self.config.epsilon,
            position: 0,
            cached: None,
        }
    }

    /// Cluster at one grid point and return 0-based labels.
    pub fn cluster_at(
        &self,
        similarity: &SimilarityMatrix,
        theta: f64,
        k: usize,
    ) -> Result<Vec<usize>> {
        let n = similarity.n_items();
        if k > n {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: n,
            });
        }
        link_dendrogram(similarity, theta, self.config.epsilon)?.cut_to_k(k)
    }

    /// Search the grid and return the best (θ, k).
    pub fn fit<S: SimilaritySource + ?Sized>(&self, source: &S) -> Result<LinkResult> {
        self.config.validate()?;
        let similarity = source.similarity_matrix()?;

        let outcome = select_best(
            self.candidates(&similarity),
            self.config.tie_break,
            self.stage,
        )?;
        info!(
            stage = %self.stage,
            theta = outcome.best.param,
            k = outcome.best.k,
            cp_star = outcome.score,
            "link clustering selected"
        );

        Ok(LinkResult {
            theta: outcome.best.param,
            k: outcome.best.k,
            cp_star: outcome.score,
            labeling: Labeling::from_zero_based(&outcome.labels),
            table: outcome.table,
        })
    }
}

impl Default for LinkClusterer {
    fn default() -> Self {
        Self::new(LinkSearchConfig::default())
    }
}

/// Average-linkage dendrogram over `1 / (link + ε)` at threshold θ.
fn link_dendrogram(similarity: &SimilarityMatrix, theta: f64, epsilon: f64) -> Result<Dendrogram> {
    let neighbors = NeighborSets::new(similarity, theta);
    let links = LinkMatrix::from_neighbors(&neighbors);
    let mut condensed = links.condensed_distances(epsilon);
    condensed_dendrogram(&mut condensed, similarity.n_items(), Linkage::Average)
}

/// Lazy (θ, k) candidate stream. See the module docs.
#[derive(Debug)]
pub struct LinkCandidates<'a> {
    similarity: &'a SimilarityMatrix,
    thetas: Vec<f64>,
    k_min: usize,
    n_k: usize,
    epsilon: f64,
    position: usize,
    // Dendrogram of the θ currently being cut (index into `thetas`).
    // Failures are not cached; each k of a failing θ rebuilds and reports
    // the same typed error.
    cached: Option<(usize, Dendrogram)>,
}

impl LinkCandidates<'_> {
    /// Skip directly to candidate `index` (0-based, θ-major).
    pub fn starting_at(mut self, index: usize) -> Self {
        self.position = index.min(self.total());
        self
    }

    /// Index of the next candidate to be produced.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of candidates in the grid.
    pub fn total(&self) -> usize {
        self.thetas.len() * self.n_k
    }

    /// The grid point at `index`.
    pub fn candidate_at(&self, index: usize) -> Option<Candidate<f64>> {
        if index >= self.total() {
            return None;
        }
        Some(Candidate {
            param: self.thetas[index / self.n_k],
            k: self.k_min + index % self.n_k,
        })
    }

    fn dendrogram_for(&mut self, theta_index: usize) -> Result<&Dendrogram> {
        if !matches!(&self.cached, Some((cached, _)) if *cached == theta_index) {
            let tree = link_dendrogram(self.similarity, self.thetas[theta_index], self.epsilon)?;
            self.cached = Some((theta_index, tree));
        }
        match &self.cached {
            Some((_, tree)) => Ok(tree),
            None => unreachable!("cache populated above"),
        }
    }
}

impl Iterator for LinkCandidates<'_> {
    type Item = CandidateOutcome<f64, f64>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.position;
        let candidate = self.candidate_at(index)?;
        self.position += 1;

        let n = self.similarity.n_items();
        let similarity = self.similarity;
        let scored = if candidate.k > n {
            Err(Error::InvalidClusterCount {
                requested: candidate.k,
                n_items: n,
            })
        } else {
            self.dendrogram_for(index / self.n_k).and_then(|tree| {
                tree.cut_to_k(candidate.k)
                    .and_then(|labels| cp_star(similarity, &labels).map(|score| (score, labels)))
            })
        };

        Some(match scored {
            Ok((score, labels)) => CandidateOutcome::Scored {
                candidate,
                score,
                labels,
            },
            Err(reason) => CandidateOutcome::Failed { candidate, reason },
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total() - self.position;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LinkCandidates<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CategoricalTable;

    /// Records 0..3 are (mamin, ya), 3..6 are (oleh, tidak).
    fn two_groups() -> CategoricalTable {
        let mut rows = vec![vec!["mamin", "ya"]; 3];
        rows.extend(vec![vec!["oleh", "tidak"]; 3]);
        CategoricalTable::from_rows(&["business_type", "uses_ride_hailing"], &rows).unwrap()
    }

    #[test]
    fn test_single_candidate_recovers_groups() {
        let result = LinkClusterer::new(LinkSearchConfig::single(0.5, 2))
            .fit(&two_groups())
            .unwrap();

        assert_eq!(result.theta, 0.5);
        assert_eq!(result.k, 2);
        assert_eq!(result.cp_star, 1.0);
        assert_eq!(result.labeling.ids(), &[1, 1, 1, 2, 2, 2]);
    }

    #[test]
    fn test_grid_search_prefers_pure_partition() {
        let result = LinkClusterer::default().fit(&two_groups()).unwrap();
        assert_eq!(result.k, 2);
        assert_eq!(result.cp_star, 1.0);
        assert_eq!(result.labeling.ids(), &[1, 1, 1, 2, 2, 2]);
        // θ = 0.1 is the first grid point to reach the maximum.
        assert_eq!(result.theta, 0.1);
        assert_eq!(result.table.len(), 9 * 3);
    }

    #[test]
    fn test_candidates_are_theta_major_and_sorted() {
        let clusterer = LinkClusterer::default()
            .with_thetas(vec![0.6, 0.2])
            .with_k_range(2, 3);
        let sim = two_groups().similarity_matrix().unwrap();
        let order: Vec<(f64, usize)> = clusterer
            .candidates(&sim)
            .map(|o| (o.candidate().param, o.candidate().k))
            .collect();
        assert_eq!(order, vec![(0.2, 2), (0.2, 3), (0.6, 2), (0.6, 3)]);
    }

    #[test]
    fn test_candidates_resume_from_index() {
        let clusterer = LinkClusterer::default();
        let sim = two_groups().similarity_matrix().unwrap();

        let full: Vec<_> = clusterer.candidates(&sim).collect();
        let mut resumed = clusterer.candidates(&sim).starting_at(10);
        assert_eq!(resumed.len(), full.len() - 10);

        let first = resumed.next().unwrap();
        assert_eq!(first.candidate(), full[10].candidate());
        match (&first, &full[10]) {
            (
                CandidateOutcome::Scored { score: a, labels: la, .. },
                CandidateOutcome::Scored { score: b, labels: lb, .. },
            ) => {
                assert_eq!(a, b);
                assert_eq!(la, lb);
            }
            other => panic!("expected two scored outcomes, got {other:?}"),
        }
        assert_eq!(resumed.position(), 11);
    }

    #[test]
    fn test_stream_is_cancellable() {
        let clusterer = LinkClusterer::default();
        let sim = two_groups().similarity_matrix().unwrap();
        let mut stream = clusterer.candidates(&sim);
        let taken: Vec<_> = stream.by_ref().take(4).collect();
        assert_eq!(taken.len(), 4);
        assert_eq!(stream.position(), 4);
    }

    #[test]
    fn test_k_above_n_is_a_failed_candidate() {
        let table =
            CategoricalTable::from_rows(&["t"], &[vec!["a"], vec!["a"], vec!["b"]]).unwrap();
        let result = LinkClusterer::default()
            .with_thetas(vec![0.5])
            .with_k_range(2, 4)
            .fit(&table)
            .unwrap();
        assert_eq!(result.k, 2);
        assert_eq!(result.table.len(), 3);
        assert!(result.table[2].failure.is_some());
    }

    #[test]
    fn test_all_candidates_failing_is_an_error() {
        let table = CategoricalTable::from_rows(&["t"], &[vec!["a"], vec!["b"]]).unwrap();
        let err = LinkClusterer::default()
            .with_k_range(3, 4)
            .fit(&table)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::NoScoredCandidate {
                stage: Stage::Categorical,
                ..
            }
        ));
    }

    #[test]
    fn test_failed_candidates_keep_the_tree_error() {
        // With ε = 0, pairs without common neighbors are infinitely far apart.
        let clusterer = LinkClusterer::default()
            .with_thetas(vec![0.5])
            .with_k_range(2, 3)
            .with_epsilon(0.0);
        let sim = two_groups().similarity_matrix().unwrap();

        let outcomes: Vec<_> = clusterer.candidates(&sim).collect();
        assert_eq!(outcomes.len(), 2);
        for outcome in outcomes {
            assert!(matches!(
                outcome,
                CandidateOutcome::Failed {
                    reason: Error::InvalidParameter { name: "distance", .. },
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_invalid_theta_rejected() {
        let err = LinkClusterer::default()
            .with_thetas(vec![0.0])
            .fit(&two_groups())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "thetas", .. }));
    }
}
