//! Grid search bookkeeping shared by every stage.
//!
//! A search is a finite sequence of [`CandidateOutcome`]s: each candidate
//! either produced a labeling with a score, or failed with a reason. A failed
//! candidate is recorded in the score table and skipped; the search only
//! fails if nothing was scored.

use core::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result, Stage};
use crate::metrics::NumericScore;

/// How to resolve equal best scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep the earliest candidate in enumeration order.
    #[default]
    FirstEncountered,
    /// Prefer the candidate with fewer clusters; earliest among equals.
    FewerClusters,
}

/// One grid point: a stage-specific parameter plus a cluster count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate<P> {
    /// Linkage (numeric stage) or θ (link stages).
    pub param: P,
    /// Number of clusters.
    pub k: usize,
}

/// Result of evaluating one candidate.
#[derive(Debug)]
pub enum CandidateOutcome<P, S> {
    /// Clustering succeeded and was scored.
    Scored {
        /// The grid point.
        candidate: Candidate<P>,
        /// Quality score.
        score: S,
        /// 0-based labels, one per record.
        labels: Vec<usize>,
    },
    /// Clustering or scoring failed for this grid point only.
    Failed {
        /// The grid point.
        candidate: Candidate<P>,
        /// Why it failed.
        reason: Error,
    },
}

impl<P: Copy, S> CandidateOutcome<P, S> {
    /// The grid point, scored or not.
    pub fn candidate(&self) -> Candidate<P> {
        match self {
            CandidateOutcome::Scored { candidate, .. } | CandidateOutcome::Failed { candidate, .. } => {
                *candidate
            }
        }
    }
}

/// A score that can be ranked (higher is better).
pub trait Score: Copy {
    /// The ranking value.
    fn value(&self) -> f64;
}

impl Score for f64 {
    fn value(&self) -> f64 {
        *self
    }
}

impl Score for NumericScore {
    fn value(&self) -> f64 {
        self.pseudo_f
    }
}

/// One row of a stage's candidate table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow<P, S> {
    /// Linkage or θ.
    pub param: P,
    /// Number of clusters.
    pub k: usize,
    /// Score, if the candidate was scored.
    pub score: Option<S>,
    /// Failure reason, if it was not.
    pub failure: Option<String>,
}

/// Winner of a search plus the full table.
#[derive(Debug, Clone)]
pub struct SearchOutcome<P, S> {
    /// Winning grid point.
    pub best: Candidate<P>,
    /// Its score.
    pub score: S,
    /// Its 0-based labels.
    pub labels: Vec<usize>,
    /// Every evaluated candidate in enumeration order.
    pub table: Vec<ScoreRow<P, S>>,
}

/// Consume candidate outcomes and keep the best one.
///
/// A candidate replaces the current best only with a strictly higher score,
/// or, under [`TieBreak::FewerClusters`], an equal score and smaller `k`.
/// NaN scores are recorded as failures.
pub fn select_best<P, S>(
    outcomes: impl IntoIterator<Item = CandidateOutcome<P, S>>,
    tie_break: TieBreak,
    stage: Stage,
) -> Result<SearchOutcome<P, S>>
where
    P: Copy + fmt::Display,
    S: Score,
{
    let mut table = Vec::new();
    let mut best: Option<(Candidate<P>, S, Vec<usize>)> = None;
    let mut failed = 0usize;

    for outcome in outcomes {
        match outcome {
            CandidateOutcome::Scored {
                candidate, score, ..
            } if score.value().is_nan() => {
                failed += 1;
                warn!(%stage, param = %candidate.param, k = candidate.k, "score is NaN, skipping");
                table.push(ScoreRow {
                    param: candidate.param,
                    k: candidate.k,
                    score: None,
                    failure: Some("score is NaN".to_string()),
                });
            }
            CandidateOutcome::Scored {
                candidate,
                score,
                labels,
            } => {
                debug!(%stage, param = %candidate.param, k = candidate.k, score = score.value(), "candidate scored");
                table.push(ScoreRow {
                    param: candidate.param,
                    k: candidate.k,
                    score: Some(score),
                    failure: None,
                });
                let replace = match &best {
                    None => true,
                    Some((current, current_score, _)) => {
                        beats(score.value(), candidate.k, current_score.value(), current.k, tie_break)
                    }
                };
                if replace {
                    best = Some((candidate, score, labels));
                }
            }
            CandidateOutcome::Failed { candidate, reason } => {
                failed += 1;
                warn!(%stage, param = %candidate.param, k = candidate.k, error = %reason, "candidate failed");
                table.push(ScoreRow {
                    param: candidate.param,
                    k: candidate.k,
                    score: None,
                    failure: Some(reason.to_string()),
                });
            }
        }
    }

    match best {
        Some((best, score, labels)) => Ok(SearchOutcome {
            best,
            score,
            labels,
            table,
        }),
        None => Err(Error::NoScoredCandidate { stage, failed }),
    }
}

fn beats(score: f64, k: usize, best_score: f64, best_k: usize, tie_break: TieBreak) -> bool {
    if score > best_score {
        return true;
    }
    tie_break == TieBreak::FewerClusters && score == best_score && k < best_k
}
