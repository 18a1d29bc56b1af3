use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::*;
use crate::comparison::SimilarityMetric;

fn ids(n: usize) -> Vec<SubmissionId> {
    (0..n).map(SubmissionId).collect()
}

fn agglomerative(threshold: f64, linkage: Linkage) -> ClusteringOptions {
    ClusteringOptions {
        algorithm: ClusteringAlgorithm::Agglomerative,
        agglomerative: AgglomerativeOptions::new(threshold, linkage),
        preprocessing: Preprocessing::None,
        ..ClusteringOptions::default()
    }
}

fn members(result: &ClusteringResult) -> Vec<Vec<usize>> {
    result
        .clusters()
        .iter()
        .map(|c| c.members().iter().map(|id| id.0).collect())
        .collect()
}

#[test]
fn three_submissions_form_a_pair_and_a_singleton() {
    let (a, b, c) = (SubmissionId(0), SubmissionId(1), SubmissionId(2));
    let matrix = SimilarityMatrix::from_pairs(
        &[a, b, c],
        &[(a, b, 0.9), (a, c, 0.1), (b, c, 0.15)],
        SimilarityMetric::Avg,
    );
    let result = cluster_matrix(&matrix, &agglomerative(0.5, Linkage::Average)).unwrap();
    assert_eq!(members(&result), vec![vec![0, 1], vec![2]]);
    assert!((result.clusters()[0].strength() - 0.9).abs() < 1e-12);
    assert_eq!(result.clusters()[1].strength(), 0.0);
    assert_eq!(result.cluster_of(c).map(Cluster::len), Some(1));
}

#[test]
fn fewer_than_two_submissions_produce_no_clusters() {
    for n in [0, 1] {
        let matrix = SimilarityMatrix::from_pairs(&ids(n), &[], SimilarityMetric::Avg);
        let result = cluster_matrix(&matrix, &ClusteringOptions::default()).unwrap();
        assert!(result.clusters().is_empty());
    }
}

#[test]
fn all_zero_matrix_yields_singletons_for_both_algorithms() {
    let matrix = SimilarityMatrix::from_pairs(&ids(4), &[], SimilarityMetric::Avg);
    let spectral = cluster_matrix(&matrix, &ClusteringOptions::default()).unwrap();
    assert_eq!(members(&spectral), vec![vec![0], vec![1], vec![2], vec![3]]);
    assert_eq!(spectral.community_strength(), 0.0);

    let merged = cluster_matrix(&matrix, &agglomerative(0.0, Linkage::Max)).unwrap();
    assert_eq!(members(&merged), vec![vec![0], vec![1], vec![2], vec![3]]);
}

#[test]
fn threshold_preprocessing_is_idempotent() {
    let (a, b, c) = (SubmissionId(0), SubmissionId(1), SubmissionId(2));
    let matrix = SimilarityMatrix::from_pairs(
        &[a, b, c],
        &[(a, b, 0.7), (a, c, 0.2), (b, c, 0.35)],
        SimilarityMetric::Max,
    );
    let once = preprocess(matrix.values(), Preprocessing::Threshold(0.3));
    let twice = preprocess(&once, Preprocessing::Threshold(0.3));
    assert_eq!(once, twice);
}

fn two_groups() -> SimilarityMatrix {
    let ids = ids(6);
    let mut pairs = Vec::new();
    for i in 0..6 {
        for j in (i + 1)..6 {
            let same = (i % 2) == (j % 2);
            pairs.push((ids[i], ids[j], if same { 0.85 } else { 0.05 }));
        }
    }
    SimilarityMatrix::from_pairs(&ids, &pairs, SimilarityMetric::Avg)
}

#[test]
fn spectral_finds_interleaved_groups() {
    let options = ClusteringOptions {
        preprocessing: Preprocessing::Threshold(0.5),
        ..ClusteringOptions::default()
    };
    let result = cluster_matrix(&two_groups(), &options).unwrap();
    assert_eq!(result.algorithm(), ClusteringAlgorithm::Spectral);
    assert_eq!(members(&result), vec![vec![0, 2, 4], vec![1, 3, 5]]);
    assert!((result.community_strength() - 0.5).abs() < 1e-9);
}

#[test]
fn injected_generator_makes_runs_reproducible() {
    let options = ClusteringOptions::default();
    let matrix = two_groups();
    let first = cluster_matrix_with_rng(&matrix, &options, &mut ChaCha8Rng::seed_from_u64(77)).unwrap();
    let second =
        cluster_matrix_with_rng(&matrix, &options, &mut ChaCha8Rng::seed_from_u64(77)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn invalid_options_are_rejected() {
    let mut options = ClusteringOptions::default();
    options.spectral.kmeans_iterations = 0;
    let matrix = two_groups();
    assert_eq!(
        cluster_matrix(&matrix, &options),
        Err(ConfigError::Zero {
            name: "k-means iterations"
        })
    );
}

#[test]
fn modularity_rewards_dense_groups() {
    let weights = Array2::from_shape_fn((4, 4), |(i, j)| {
        if i != j && (i < 2) == (j < 2) { 1.0 } else { 0.0 }
    });
    assert!((modularity(&weights, &[0, 0, 1, 1]) - 0.5).abs() < 1e-12);
    assert!(modularity(&weights, &[0, 1, 0, 1]) < 0.0);
    assert_eq!(modularity(&weights, &[0, 0, 0, 0]), 0.0);
}
