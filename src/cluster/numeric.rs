//! Numeric stage: hierarchical clustering ranked by Pseudo-F.
//!
//! Every (linkage, k) pair of the grid is clustered and scored with
//! [`numeric_score`]. The dendrogram of a linkage does not depend on k, so
//! it is built once per linkage and cut for every k.

use ndarray::ArrayView2;
use tracing::info;

use super::hierarchical::{dendrogram, Linkage};
use crate::config::NumericSearchConfig;
use crate::error::{Error, Result, Stage};
use crate::hierarchy::Dendrogram;
use crate::labeling::Labeling;
use crate::metrics::{numeric_score, NumericScore};
use crate::search::{select_best, Candidate, CandidateOutcome, ScoreRow};

/// Outcome of the numeric stage.
#[derive(Debug, Clone)]
pub struct NumericResult {
    /// Winning linkage.
    pub linkage: Linkage,
    /// Winning cluster count.
    pub k: usize,
    /// Pseudo-F and ICD of the winner.
    pub score: NumericScore,
    /// Winning labeling.
    pub labeling: Labeling,
    /// (linkage, k, score) for every candidate.
    pub table: Vec<ScoreRow<Linkage, NumericScore>>,
}

/// Grid search over linkage × k.
#[derive(Debug, Clone, Default)]
pub struct NumericClusterer {
    config: NumericSearchConfig,
}

impl NumericClusterer {
    /// Clusterer with the given grid.
    pub fn new(config: NumericSearchConfig) -> Self {
        Self { config }
    }

    /// Restrict the grid to the given linkages (in order).
    pub fn with_linkages(mut self, linkages: Vec<Linkage>) -> Self {
        self.config.linkages = linkages;
        self
    }

    /// Set the inclusive k range.
    pub fn with_k_range(mut self, k_min: usize, k_max: usize) -> Self {
        self.config.k_min = k_min;
        self.config.k_max = k_max;
        self
    }

    /// The grid.
    pub fn config(&self) -> &NumericSearchConfig {
        &self.config
    }

    /// Every candidate outcome, linkage-major then k ascending.
    pub fn candidates(
        &self,
        data: ArrayView2<'_, f64>,
    ) -> Vec<CandidateOutcome<Linkage, NumericScore>> {
        let n = data.nrows();
        let score = |tree: &Dendrogram, k: usize| {
            tree.cut_to_k(k)
                .and_then(|labels| numeric_score(data, &labels).map(|s| (s, labels)))
        };

        let mut outcomes = Vec::new();
        for &linkage in &self.config.linkages {
            let tree = dendrogram(data, linkage);

            for k in self.config.k_min..=self.config.k_max {
                let candidate = Candidate { param: linkage, k };
                let scored = match &tree {
                    _ if k > n => Err(Error::InvalidClusterCount {
                        requested: k,
                        n_items: n,
                    }),
                    Ok(tree) => score(tree, k),
                    // Rebuild for an owned copy of the typed error.
                    Err(_) => dendrogram(data, linkage).and_then(|tree| score(&tree, k)),
                };
                outcomes.push(match scored {
                    Ok((score, labels)) => CandidateOutcome::Scored {
                        candidate,
                        score,
                        labels,
                    },
                    Err(reason) => CandidateOutcome::Failed { candidate, reason },
                });
            }
        }
        outcomes
    }

    /// Run the search and return the best configuration.
    pub fn fit(&self, data: ArrayView2<'_, f64>) -> Result<NumericResult> {
        self.config.validate()?;
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(Error::EmptyInput);
        }

        let outcome = select_best(self.candidates(data), self.config.tie_break, Stage::Numeric)?;
        info!(
            linkage = %outcome.best.param,
            k = outcome.best.k,
            pseudo_f = outcome.score.pseudo_f,
            icd = outcome.score.icd,
            "numeric stage selected"
        );

        Ok(NumericResult {
            linkage: outcome.best.param,
            k: outcome.best.k,
            score: outcome.score,
            labeling: Labeling::from_zero_based(&outcome.labels),
            table: outcome.table,
        })
    }
}
