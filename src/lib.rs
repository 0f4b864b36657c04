//! # rockfuse
//!
//! Ensemble clustering of mixed-type business records.
//!
//! Records carry numeric attributes (capital, revenue, workforce) and
//! categorical attributes (business type, ride-hailing use). Each kind is
//! clustered on its own terms, then the two labelings are fused:
//!
//! 1. **Numeric**: agglomerative clustering over linkage × k, ranked by Pseudo-F
//! 2. **Categorical**: ROCK link clustering over θ × k, ranked by CP*
//! 3. **Ensemble**: the `[numeric, categorical]` label pairs are one-hot encoded
//!    and clustered again with the same link clusterer
//!
//! Every stage runs a deterministic grid search. Candidates that fail are
//! recorded in the stage's score table and skipped.
//!
//! ```rust
//! use rockfuse::{Pipeline, PipelineConfig, RecordTable};
//!
//! let table = RecordTable::new()
//!     .with_numeric("capital", vec![5.0, 6.0, 5.5, 50.0, 52.0, 49.0])
//!     .with_numeric("revenue", vec![1.0, 1.1, 0.9, 9.0, 9.2, 8.8])
//!     .with_numeric("workforce", vec![2.0, 2.0, 3.0, 12.0, 11.0, 12.0])
//!     .with_text("business_type", vec!["kuliner", "kuliner", "kuliner", "fashion", "fashion", "fashion"])
//!     .with_text("uses_ride_hailing", vec!["ya", "ya", "ya", "tidak", "tidak", "tidak"]);
//!
//! let report = Pipeline::new(PipelineConfig::default()).run(&table).unwrap();
//! let rows = report.rows();
//! assert_eq!(rows[0].ensemble, rows[1].ensemble);
//! assert_ne!(rows[0].ensemble, rows[3].ensemble);
//! ```
//!
//! # Features
//!
//! - `parallel`: compute similarity matrix rows with rayon

#![forbid(unsafe_code)]

pub mod cluster;
pub mod config;
pub mod dataset;
pub mod encoding;
/// Error types used across `rockfuse`.
pub mod error;
pub mod hierarchy;
pub mod labeling;
pub mod metrics;
pub mod pipeline;
pub mod search;
pub mod similarity;

pub use cluster::{
    Clustering, EnsembleFusion, EnsembleResult, HierarchicalClustering, LinkClusterer, LinkResult,
    Linkage, NumericClusterer, NumericResult,
};
pub use config::{LinkSearchConfig, NumericSearchConfig, PipelineConfig};
pub use dataset::{CategoricalTable, Column, Preprocessor, RecordTable, Schema};
pub use encoding::EncodedTable;
pub use error::{Error, Result, Stage};
pub use hierarchy::Dendrogram;
pub use labeling::Labeling;
pub use metrics::{ari, cp_star, numeric_score, NumericScore};
pub use pipeline::{Pipeline, PipelineReport, PipelineState, RecordLabels};
pub use search::{ScoreRow, TieBreak};
pub use similarity::{LinkMatrix, NeighborSets, SimilarityMatrix, SimilaritySource};
