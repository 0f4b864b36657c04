//! Search configuration for the three clustering stages.
//!
//! Every struct deserializes from JSON with missing fields filled from
//! [`Default`], so a config file only needs to name what it overrides:
//!
//! ```rust
//! use rockfuse::config::PipelineConfig;
//!
//! let config = PipelineConfig::from_json_str(r#"{ "categorical": { "k_max": 5 } }"#).unwrap();
//! assert_eq!(config.categorical.k_max, 5);
//! assert_eq!(config.categorical.k_min, 2);
//! ```

use serde::{Deserialize, Deserializer, Serialize};

use crate::cluster::Linkage;
use crate::error::{Error, Result};
use crate::search::TieBreak;

/// Grid for the numeric (hierarchical) stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericSearchConfig {
    /// Linkages to try, in enumeration order. Defaults to single, complete
    /// and average; [`Linkage::Ward`] is only searched when listed here.
    pub linkages: Vec<Linkage>,
    /// Smallest cluster count (inclusive).
    pub k_min: usize,
    /// Largest cluster count (inclusive).
    pub k_max: usize,
    /// Policy for equal Pseudo-F scores.
    pub tie_break: TieBreak,
}

impl Default for NumericSearchConfig {
    fn default() -> Self {
        Self {
            linkages: vec![Linkage::Single, Linkage::Complete, Linkage::Average],
            k_min: 2,
            k_max: 6,
            tie_break: TieBreak::FirstEncountered,
        }
    }
}

impl NumericSearchConfig {
    /// Check the grid before running a search.
    pub fn validate(&self) -> Result<()> {
        if self.linkages.is_empty() {
            return Err(Error::invalid_parameter("linkages", "at least one linkage is required"));
        }
        validate_k_range(self.k_min, self.k_max)
    }
}

/// Grid for a link (ROCK) clustering stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSearchConfig {
    /// Similarity thresholds θ, each in (0, 1). Searched in ascending order.
    pub thetas: Vec<f64>,
    /// Smallest cluster count (inclusive).
    pub k_min: usize,
    /// Largest cluster count (inclusive).
    pub k_max: usize,
    /// Smoothing term in `1 / (link + epsilon)`.
    pub epsilon: f64,
    /// Policy for equal CP* scores.
    pub tie_break: TieBreak,
}

impl Default for LinkSearchConfig {
    fn default() -> Self {
        Self {
            thetas: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9],
            k_min: 2,
            k_max: 4,
            epsilon: 1e-6,
            tie_break: TieBreak::FirstEncountered,
        }
    }
}

impl LinkSearchConfig {
    /// Defaults for the ensemble stage: a coarser θ grid starting at 0.05.
    pub fn ensemble() -> Self {
        Self {
            thetas: vec![0.05, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9],
            ..Self::default()
        }
    }

    /// Single-candidate grid.
    pub fn single(theta: f64, k: usize) -> Self {
        Self {
            thetas: vec![theta],
            k_min: k,
            k_max: k,
            ..Self::default()
        }
    }

    /// Check the grid before running a search.
    pub fn validate(&self) -> Result<()> {
        if self.thetas.is_empty() {
            return Err(Error::invalid_parameter("thetas", "at least one threshold is required"));
        }
        if let Some(theta) = self.thetas.iter().find(|t| !(**t > 0.0 && **t < 1.0)) {
            return Err(Error::invalid_parameter(
                "thetas",
                format!("threshold {theta} is outside (0, 1)"),
            ));
        }
        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(Error::invalid_parameter("epsilon", "must be positive and finite"));
        }
        validate_k_range(self.k_min, self.k_max)
    }

    /// Thresholds sorted ascending with duplicates removed.
    pub(crate) fn sorted_thetas(&self) -> Vec<f64> {
        let mut thetas = self.thetas.clone();
        thetas.sort_by(|a, b| a.total_cmp(b));
        thetas.dedup();
        thetas
    }
}

/// Configuration for the whole pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Numeric stage grid.
    pub numeric: NumericSearchConfig,
    /// Categorical stage grid.
    pub categorical: LinkSearchConfig,
    /// Ensemble stage grid. Fields missing from JSON come from
    /// [`LinkSearchConfig::ensemble`], not the categorical defaults.
    #[serde(deserialize_with = "ensemble_grid")]
    pub ensemble: LinkSearchConfig,
    /// Z-score numeric columns during preprocessing. Disable for input that
    /// is already standardized.
    pub normalize: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            numeric: NumericSearchConfig::default(),
            categorical: LinkSearchConfig::default(),
            ensemble: LinkSearchConfig::ensemble(),
            normalize: true,
        }
    }
}

impl PipelineConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every stage grid.
    pub fn validate(&self) -> Result<()> {
        self.numeric.validate()?;
        self.categorical.validate()?;
        self.ensemble.validate()
    }
}

/// A [`LinkSearchConfig`] with every field optional, applied over a base grid.
#[derive(Deserialize)]
struct LinkSearchOverrides {
    thetas: Option<Vec<f64>>,
    k_min: Option<usize>,
    k_max: Option<usize>,
    epsilon: Option<f64>,
    tie_break: Option<TieBreak>,
}

impl LinkSearchOverrides {
    fn apply(self, base: LinkSearchConfig) -> LinkSearchConfig {
        LinkSearchConfig {
            thetas: self.thetas.unwrap_or(base.thetas),
            k_min: self.k_min.unwrap_or(base.k_min),
            k_max: self.k_max.unwrap_or(base.k_max),
            epsilon: self.epsilon.unwrap_or(base.epsilon),
            tie_break: self.tie_break.unwrap_or(base.tie_break),
        }
    }
}

fn ensemble_grid<'de, D>(deserializer: D) -> std::result::Result<LinkSearchConfig, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(LinkSearchOverrides::deserialize(deserializer)?.apply(LinkSearchConfig::ensemble()))
}

fn validate_k_range(k_min: usize, k_max: usize) -> Result<()> {
    if k_min < 2 {
        return Err(Error::invalid_parameter("k_min", "must be at least 2"));
    }
    if k_min > k_max {
        return Err(Error::invalid_parameter("k_max", "must not be below k_min"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ensemble.thetas.len(), 10);
        assert_eq!(config.numeric.k_max, 6);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "numeric": { "linkages": ["average"], "k_max": 3 },
            "ensemble": { "tie_break": "fewer_clusters" }
        }"#;
        let config = PipelineConfig::from_json_str(json).unwrap();
        assert_eq!(config.numeric.linkages, vec![Linkage::Average]);
        assert_eq!(config.numeric.k_min, 2);
        assert_eq!(config.ensemble.tie_break, TieBreak::FewerClusters);
        assert_eq!(config.ensemble.thetas, LinkSearchConfig::ensemble().thetas);
        assert!(config.normalize);
    }

    #[test]
    fn test_ensemble_override_keeps_ensemble_grid() {
        let config =
            PipelineConfig::from_json_str(r#"{ "ensemble": { "k_max": 3 } }"#).unwrap();
        assert_eq!(config.ensemble.thetas[0], 0.05);
        assert_eq!(config.ensemble.k_max, 3);
        assert_eq!(config.ensemble.k_min, 2);
        // The categorical stage still uses its own grid.
        assert_eq!(config.categorical.thetas[0], 0.1);

        let config =
            PipelineConfig::from_json_str(r#"{ "ensemble": { "thetas": [0.3] } }"#).unwrap();
        assert_eq!(config.ensemble.thetas, vec![0.3]);
    }

    #[test]
    fn test_ward_is_opt_in() {
        assert!(!NumericSearchConfig::default().linkages.contains(&Linkage::Ward));

        let config =
            PipelineConfig::from_json_str(r#"{ "numeric": { "linkages": ["average", "ward"] } }"#)
                .unwrap();
        assert_eq!(config.numeric.linkages, vec![Linkage::Average, Linkage::Ward]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_theta_out_of_range() {
        let json = r#"{ "categorical": { "thetas": [0.5, 1.0] } }"#;
        let err = PipelineConfig::from_json_str(json).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "thetas", .. }));
    }

    #[test]
    fn test_rejects_bad_k_range() {
        let config = LinkSearchConfig {
            k_min: 4,
            k_max: 3,
            ..LinkSearchConfig::default()
        };
        assert!(config.validate().is_err());

        let config = NumericSearchConfig {
            k_min: 1,
            ..NumericSearchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = PipelineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_sorted_thetas() {
        let config = LinkSearchConfig {
            thetas: vec![0.7, 0.2, 0.7, 0.4],
            ..LinkSearchConfig::default()
        };
        assert_eq!(config.sorted_thetas(), vec![0.2, 0.4, 0.7]);
    }
}
