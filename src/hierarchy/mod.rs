//! Merge trees produced by agglomerative clustering.
//!
//! A [`Dendrogram`] records the n − 1 merges of n items in merge order.
//! Cutting it to k clusters replays the first n − k merges, which gives
//! exactly k groups regardless of ties in merge distance.

mod dendrogram;

pub use dendrogram::{Dendrogram, Merge};
