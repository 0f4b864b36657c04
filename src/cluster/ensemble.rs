//! Ensemble fusion of the numeric and categorical labelings.
//!
//! The two upstream labelings become a two-column nominal table
//! `[numeric, categorical]`, which is one-hot encoded and clustered again by
//! the same [`LinkClusterer`] used for the categorical stage. Records that
//! agree on both labels are identical in the one-hot space; records that
//! agree on one label still share half of their hot columns.
//!
//! Links count *shared* neighbors, so a consensus cluster needs at least
//! three records. Once θ is high enough to separate a two-record cluster
//! from the rest, its records are each other's only neighbor, share none,
//! and get link 0 like every unrelated pair.

use tracing::info;

use super::rock::{LinkClusterer, LinkResult};
use crate::config::LinkSearchConfig;
use crate::encoding::EncodedTable;
use crate::error::{Error, Result, Stage};
use crate::labeling::Labeling;
use crate::metrics::ari;

/// Consensus labeling plus how it relates to its inputs.
#[derive(Debug, Clone)]
pub struct EnsembleResult {
    /// Link search over the fused labels.
    pub link: LinkResult,
    /// Adjusted Rand index of the consensus against the numeric labeling.
    pub agreement_numeric: f64,
    /// Adjusted Rand index of the consensus against the categorical labeling.
    pub agreement_categorical: f64,
}

impl EnsembleResult {
    /// The consensus labeling.
    pub fn labeling(&self) -> &Labeling {
        &self.link.labeling
    }
}

/// Fuses two labelings into a consensus partition.
#[derive(Debug, Clone)]
pub struct EnsembleFusion {
    clusterer: LinkClusterer,
}

impl EnsembleFusion {
    /// Fusion with the given link grid.
    pub fn new(config: LinkSearchConfig) -> Self {
        Self {
            clusterer: LinkClusterer::new(config).with_stage(Stage::Ensemble),
        }
    }

    /// One-hot table of the label pair.
    pub fn encode(numeric: &Labeling, categorical: &Labeling) -> Result<EncodedTable> {
        if numeric.len() != categorical.len() {
            return Err(Error::LabelMisaligned {
                left: numeric.len(),
                right: categorical.len(),
            });
        }
        EncodedTable::one_hot(&[
            ("numeric", numeric.ids()),
            ("categorical", categorical.ids()),
        ])
    }

    /// Fuse both labelings. Either one missing is a
    /// [`Error::PrerequisiteNotMet`].
    ///
    /// Fusing a labeling with itself reproduces it when every cluster has at
    /// least three records and the cluster count lies in the configured k
    /// range. Two-record clusters are not recoverable (see the module docs).
    pub fn fuse(
        &self,
        numeric: Option<&Labeling>,
        categorical: Option<&Labeling>,
    ) -> Result<EnsembleResult> {
        let numeric = numeric.ok_or(Error::PrerequisiteNotMet {
            stage: Stage::Ensemble,
            missing: "numeric labeling",
        })?;
        let categorical = categorical.ok_or(Error::PrerequisiteNotMet {
            stage: Stage::Ensemble,
            missing: "categorical labeling",
        })?;

        let encoded = Self::encode(numeric, categorical)?;
        let link = self.clusterer.fit(&encoded)?;

        let consensus = link.labeling.ids();
        let agreement_numeric = ari(consensus, numeric.ids());
        let agreement_categorical = ari(consensus, categorical.ids());
        info!(
            k = link.k,
            agreement_numeric, agreement_categorical, "ensemble consensus built"
        );

        Ok(EnsembleResult {
            link,
            agreement_numeric,
            agreement_categorical,
        })
    }
}

impl Default for EnsembleFusion {
    fn default() -> Self {
        Self::new(LinkSearchConfig::ensemble())
    }
}
