//! Clustering stages.
//!
//! Three stages produce three labelings of the same records:
//!
//! | Stage | Input | Algorithm | Ranked by |
//! |-------|-------|-----------|-----------|
//! | Numeric | standardized feature rows | agglomerative, linkage × k grid | Pseudo-F |
//! | Categorical | cleaned nominal columns | link-based (ROCK), θ × k grid | CP* |
//! | Ensemble | one-hot `[numeric, categorical]` labels | link-based (ROCK), θ × k grid | CP* |
//!
//! ## Link-based clustering
//!
//! Plain distance between nominal records is coarse: two records either
//! agree on a column or they don't. ROCK replaces it with the number of
//! *common neighbors*:
//!
//! ```text
//! sim(i, j)  = fraction of columns on which i and j agree
//! N_θ(i)     = { j ≠ i : sim(i, j) ≥ θ }
//! link(i, j) = |N_θ(i) ∩ N_θ(j)|
//! dist(i, j) = 1 / (link(i, j) + ε)
//! ```
//!
//! Two records in the same dense region share many neighbors even when
//! they disagree with each other on a column, so links capture
//! neighborhood structure that raw similarity misses. The distances are
//! fed to average-linkage agglomeration and the dendrogram is cut to k.
//!
//! ## Usage
//!
//! ```rust
//! use rockfuse::cluster::LinkClusterer;
//! use rockfuse::config::LinkSearchConfig;
//! use rockfuse::dataset::CategoricalTable;
//!
//! let table = CategoricalTable::from_rows(
//!     &["a", "b"],
//!     &[
//!         vec!["x", "p"],
//!         vec!["x", "p"],
//!         vec!["x", "p"],
//!         vec!["y", "q"],
//!         vec!["y", "q"],
//!         vec!["y", "q"],
//!     ],
//! )
//! .unwrap();
//!
//! let result = LinkClusterer::new(LinkSearchConfig::single(0.5, 2))
//!     .fit(&table)
//!     .unwrap();
//! assert_eq!(result.labeling.ids(), &[1, 1, 1, 2, 2, 2]);
//! ```

mod ensemble;
mod hierarchical;
mod numeric;
mod rock;
mod traits;

pub use ensemble::{EnsembleFusion, EnsembleResult};
pub use hierarchical::{condensed_dendrogram, dendrogram, HierarchicalClustering, Linkage};
pub use numeric::{NumericClusterer, NumericResult};
pub use rock::{LinkCandidates, LinkClusterer, LinkResult};
pub use traits::Clustering;
