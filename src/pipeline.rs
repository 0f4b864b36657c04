//! The full pipeline as explicit state.
//!
//! ```text
//! RecordTable ──prepare──▶ PipelineState
//!                            ├─ run_numeric      ─▶ numeric labels
//!                            ├─ run_categorical  ─▶ categorical labels
//!                            └─ run_ensemble     ─▶ consensus labels (needs both)
//! ```
//!
//! Each step takes the state by value and returns a new one with one more
//! result attached. Nothing is mutated in place, and all label vectors stay
//! index-aligned with the uploaded records.
//!
//! ```rust
//! use rockfuse::{Pipeline, RecordTable};
//!
//! let table = RecordTable::new()
//!     .with_numeric("capital", vec![1.0, 1.2, 0.9, 9.0, 9.5, 8.8])
//!     .with_numeric("revenue", vec![2.0, 2.1, 1.9, 20.0, 21.0, 19.0])
//!     .with_numeric("workforce", vec![1.0, 1.0, 2.0, 8.0, 9.0, 8.0])
//!     .with_text("business_type", vec!["mamin", "mamin", "mamin", "oleh", "oleh", "oleh"])
//!     .with_text("uses_ride_hailing", vec!["ya", "ya", "ya", "tidak", "tidak", "tidak"]);
//!
//! let report = Pipeline::default().run(&table).unwrap();
//! assert_eq!(report.rows().len(), 6);
//! ```

use serde::Serialize;
use tracing::info;

use crate::cluster::{
    EnsembleFusion, EnsembleResult, LinkClusterer, LinkResult, NumericClusterer, NumericResult,
};
use crate::config::PipelineConfig;
use crate::dataset::{PreparedData, Preprocessor, RecordTable, Schema};
use crate::error::{Error, Result, Stage};
use crate::metrics::serialize_unbounded;

/// Pipeline inputs and every stage result produced so far.
#[derive(Debug, Clone)]
pub struct PipelineState {
    /// Preprocessed stage inputs.
    pub prepared: PreparedData,
    /// Numeric stage result, once run.
    pub numeric: Option<NumericResult>,
    /// Categorical stage result, once run.
    pub categorical: Option<LinkResult>,
    /// Ensemble stage result, once run.
    pub ensemble: Option<EnsembleResult>,
}

impl PipelineState {
    /// State before any clustering.
    pub fn new(prepared: PreparedData) -> Self {
        Self {
            prepared,
            numeric: None,
            categorical: None,
            ensemble: None,
        }
    }

    /// Number of records.
    pub fn n_records(&self) -> usize {
        self.prepared.n_records()
    }
}

/// Configured pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    schema: Schema,
}

impl Pipeline {
    /// Pipeline with the given configuration and the UMKM schema.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            schema: Schema::umkm(),
        }
    }

    /// Use a different schema.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// The configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate the table against the schema and preprocess it.
    pub fn prepare(&self, table: &RecordTable) -> Result<PipelineState> {
        self.config.validate()?;
        let prepared = Preprocessor::new(self.schema.clone())
            .with_normalize(self.config.normalize)
            .prepare(table)?;
        info!(records = prepared.n_records(), "records prepared");
        Ok(PipelineState::new(prepared))
    }

    /// Attach the numeric stage result.
    pub fn run_numeric(&self, state: PipelineState) -> Result<PipelineState> {
        let result = NumericClusterer::new(self.config.numeric.clone())
            .fit(state.prepared.numeric.view())?;
        Ok(PipelineState {
            numeric: Some(result),
            ..state
        })
    }

    /// Attach the categorical stage result.
    pub fn run_categorical(&self, state: PipelineState) -> Result<PipelineState> {
        let result = LinkClusterer::new(self.config.categorical.clone())
            .with_stage(Stage::Categorical)
            .fit(&state.prepared.categorical)?;
        Ok(PipelineState {
            categorical: Some(result),
            ..state
        })
    }

    /// Attach the ensemble result. Both upstream stages must have run.
    pub fn run_ensemble(&self, state: PipelineState) -> Result<PipelineState> {
        let result = EnsembleFusion::new(self.config.ensemble.clone()).fuse(
            state.numeric.as_ref().map(|r| &r.labeling),
            state.categorical.as_ref().map(|r| &r.labeling),
        )?;
        Ok(PipelineState {
            ensemble: Some(result),
            ..state
        })
    }

    /// Run every stage in order and build the report.
    pub fn run(&self, table: &RecordTable) -> Result<PipelineReport> {
        let state = self.prepare(table)?;
        let state = self.run_numeric(state)?;
        let state = self.run_categorical(state)?;
        let state = self.run_ensemble(state)?;
        PipelineReport::from_state(state)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

/// One record's cluster ids across the three stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordLabels {
    /// Record index in the uploaded table.
    pub record: usize,
    /// Numeric cluster id (1-based).
    pub numeric: usize,
    /// Categorical cluster id (1-based).
    pub categorical: usize,
    /// Ensemble cluster id (1-based).
    pub ensemble: usize,
}

/// Final output of a complete run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Numeric stage result.
    pub numeric: NumericResult,
    /// Categorical stage result.
    pub categorical: LinkResult,
    /// Ensemble stage result.
    pub ensemble: EnsembleResult,
}

impl PipelineReport {
    /// Build from a state in which every stage has run.
    pub fn from_state(state: PipelineState) -> Result<Self> {
        let prerequisite = |missing| Error::PrerequisiteNotMet {
            stage: Stage::Ensemble,
            missing,
        };
        Ok(Self {
            numeric: state.numeric.ok_or_else(|| prerequisite("numeric labeling"))?,
            categorical: state
                .categorical
                .ok_or_else(|| prerequisite("categorical labeling"))?,
            ensemble: state
                .ensemble
                .ok_or_else(|| prerequisite("ensemble labeling"))?,
        })
    }

    /// Per-record cluster ids, in record order.
    pub fn rows(&self) -> Vec<RecordLabels> {
        let numeric = self.numeric.labeling.ids();
        let categorical = self.categorical.labeling.ids();
        let ensemble = self.ensemble.labeling().ids();
        (0..numeric.len())
            .map(|record| RecordLabels {
                record,
                numeric: numeric[record],
                categorical: categorical[record],
                ensemble: ensemble[record],
            })
            .collect()
    }

    /// JSON summary of each stage's selection plus per-record labels.
    ///
    /// An infinite Pseudo-F is written as `"inf"`.
    pub fn to_json(&self) -> Result<String> {
        let pseudo_f =
            serialize_unbounded(&self.numeric.score.pseudo_f, serde_json::value::Serializer)?;
        let summary = serde_json::json!({
            "numeric": {
                "linkage": self.numeric.linkage,
                "k": self.numeric.k,
                "pseudo_f": pseudo_f,
                "icd": self.numeric.score.icd,
            },
            "categorical": {
                "theta": self.categorical.theta,
                "k": self.categorical.k,
                "cp_star": self.categorical.cp_star,
            },
            "ensemble": {
                "theta": self.ensemble.link.theta,
                "k": self.ensemble.link.k,
                "cp_star": self.ensemble.link.cp_star,
                "agreement_numeric": self.ensemble.agreement_numeric,
                "agreement_categorical": self.ensemble.agreement_categorical,
            },
            "records": self.rows(),
        });
        Ok(serde_json::to_string_pretty(&summary)?)
    }
}
