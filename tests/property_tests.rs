use ndarray::Array2;
use proptest::prelude::*;
use rockfuse::cluster::LinkClusterer;
use rockfuse::config::LinkSearchConfig;
use rockfuse::encoding::EncodedTable;
use rockfuse::labeling::Labeling;
use rockfuse::metrics::cp_star;
use rockfuse::similarity::{LinkMatrix, NeighborSets, SimilarityMatrix};

/// Random nominal table: 2..12 rows, 1..4 columns, 3 categories per column.
fn encoded_table() -> impl Strategy<Value = EncodedTable> {
    (2usize..12, 1usize..4).prop_flat_map(|(n, m)| {
        prop::collection::vec(0u32..3, n * m).prop_map(move |codes| {
            let names = (0..m).map(|c| format!("c{c}")).collect();
            EncodedTable::from_codes(Array2::from_shape_vec((n, m), codes).unwrap(), names)
                .unwrap()
        })
    })
}

proptest! {
    #[test]
    fn prop_similarity_symmetric_unit_diagonal(table in encoded_table()) {
        let sim = SimilarityMatrix::hamming(&table).unwrap();
        let n = sim.n_items();
        for i in 0..n {
            prop_assert_eq!(sim.get(i, i), 1.0);
            for j in 0..n {
                prop_assert_eq!(sim.get(i, j), sim.get(j, i));
                prop_assert!((0.0..=1.0).contains(&sim.get(i, j)));
            }
        }
    }

    #[test]
    fn prop_links_symmetric_zero_diagonal(table in encoded_table(), theta in 0.05f64..0.95) {
        let sim = SimilarityMatrix::hamming(&table).unwrap();
        let links = LinkMatrix::from_neighbors(&NeighborSets::new(&sim, theta));
        let n = links.n_items();
        for i in 0..n {
            prop_assert_eq!(links.get(i, i), 0);
            for j in 0..n {
                prop_assert_eq!(links.get(i, j), links.get(j, i));
                prop_assert!(links.get(i, j) as usize <= n - 2);
            }
        }
    }

    #[test]
    fn prop_neighbor_sets_shrink_as_theta_grows(
        table in encoded_table(),
        low in 0.05f64..0.5,
        step in 0.0f64..0.45,
    ) {
        let sim = SimilarityMatrix::hamming(&table).unwrap();
        let loose = NeighborSets::new(&sim, low);
        let strict = NeighborSets::new(&sim, low + step);
        for i in 0..sim.n_items() {
            prop_assert!(!strict.of(i).contains(&i));
            for j in strict.of(i) {
                prop_assert!(loose.of(i).contains(j));
            }
        }
    }

    #[test]
    fn prop_cp_star_ignores_label_names(
        table in encoded_table(),
        seed_labels in prop::collection::vec(0usize..3, 12),
    ) {
        let sim = SimilarityMatrix::hamming(&table).unwrap();
        let n = sim.n_items();
        let labels = &seed_labels[..n];
        let renamed: Vec<usize> = labels.iter().map(|&l| 10 - l).collect();

        let a = cp_star(&sim, labels).unwrap();
        let b = cp_star(&sim, &renamed).unwrap();
        prop_assert!((a - b).abs() < 1e-12);
        prop_assert!((0.0..=1.0 + 1e-12).contains(&a));
    }

    #[test]
    fn prop_link_clustering_produces_exactly_k(table in encoded_table(), theta in 0.1f64..0.9) {
        let sim = SimilarityMatrix::hamming(&table).unwrap();
        let n = sim.n_items();
        let clusterer = LinkClusterer::new(LinkSearchConfig::single(theta, 2));
        for k in 1..=n {
            let labels = clusterer.cluster_at(&sim, theta, k).unwrap();
            prop_assert_eq!(Labeling::from_zero_based(&labels).n_clusters(), k);
        }
    }
}
