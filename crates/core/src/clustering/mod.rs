//! Grouping of submissions from a similarity matrix.

mod agglomerative;
mod kmeans;
mod linalg;
mod options;
mod preprocessing;
mod search;
mod spectral;

#[cfg(test)]
mod tests;

use std::time::Instant;

use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::error::ConfigError;
use crate::matrix::SimilarityMatrix;
use crate::submission::SubmissionId;

pub use options::{
    AgglomerativeOptions, ClusteringAlgorithm, ClusteringOptions, Linkage, Preprocessing,
    SpectralOptions,
};
pub use preprocessing::preprocess;

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    members: Vec<SubmissionId>,
    strength: f64,
}

impl Cluster {
    /// Ascending.
    pub fn members(&self) -> &[SubmissionId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Mean similarity over member pairs; 0 for singletons.
    pub fn strength(&self) -> f64 {
        self.strength
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringResult {
    clusters: Vec<Cluster>,
    community_strength: f64,
    algorithm: ClusteringAlgorithm,
}

impl ClusteringResult {
    fn empty(algorithm: ClusteringAlgorithm) -> Self {
        Self {
            clusters: Vec::new(),
            community_strength: 0.0,
            algorithm,
        }
    }

    /// Largest first, then by smallest member.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Modularity of the partition over the preprocessed matrix.
    pub fn community_strength(&self) -> f64 {
        self.community_strength
    }

    pub fn algorithm(&self) -> ClusteringAlgorithm {
        self.algorithm
    }

    pub fn cluster_of(&self, id: SubmissionId) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.members.binary_search(&id).is_ok())
    }
}

/// Clusters with a generator seeded from [`SpectralOptions::seed`].
pub fn cluster_matrix(
    matrix: &SimilarityMatrix,
    options: &ClusteringOptions,
) -> Result<ClusteringResult, ConfigError> {
    let mut rng = ChaCha8Rng::seed_from_u64(options.spectral.seed);
    cluster_matrix_with_rng(matrix, options, &mut rng)
}

pub fn cluster_matrix_with_rng<R: Rng + ?Sized>(
    matrix: &SimilarityMatrix,
    options: &ClusteringOptions,
    rng: &mut R,
) -> Result<ClusteringResult, ConfigError> {
    options.validate()?;
    if matrix.len() < 2 {
        return Ok(ClusteringResult::empty(options.algorithm));
    }

    let started = Instant::now();
    let weights = preprocess(matrix.values(), options.preprocessing);
    let groups = match options.algorithm {
        ClusteringAlgorithm::Spectral => spectral::spectral_partition(&weights, &options.spectral, rng),
        ClusteringAlgorithm::Agglomerative => {
            info!(
                linkage = %options.agglomerative.linkage,
                threshold = options.agglomerative.threshold,
                "agglomerative clustering"
            );
            agglomerative::agglomerative_partition(&weights, &options.agglomerative)
        }
    };

    let mut labels = vec![0; matrix.len()];
    for (label, group) in groups.iter().enumerate() {
        for &pos in group {
            labels[pos] = label;
        }
    }
    let community_strength = modularity(&off_diagonal(&weights), &labels);

    let ids = matrix.ids();
    let mut clusters: Vec<Cluster> = groups
        .into_iter()
        .filter(|group| !group.is_empty())
        .map(|group| {
            let strength = mean_pair_similarity(matrix.values(), &group);
            let mut members: Vec<SubmissionId> = group.into_iter().map(|pos| ids[pos]).collect();
            members.sort_unstable();
            Cluster { members, strength }
        })
        .collect();
    clusters.sort_by(|a, b| {
        b.members
            .len()
            .cmp(&a.members.len())
            .then_with(|| a.members.first().cmp(&b.members.first()))
    });

    info!(
        algorithm = %options.algorithm,
        preprocessing = %options.preprocessing,
        clusters = clusters.len(),
        community_strength,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "clustering finished"
    );
    Ok(ClusteringResult {
        clusters,
        community_strength,
        algorithm: options.algorithm,
    })
}

fn off_diagonal(values: &Array2<f64>) -> Array2<f64> {
    let mut out = values.clone();
    out.diag_mut().fill(0.0);
    out
}

fn mean_pair_similarity(values: &Array2<f64>, group: &[usize]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for (idx, &i) in group.iter().enumerate() {
        for &j in &group[idx + 1..] {
            sum += values[[i, j]];
            count += 1;
        }
    }
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Weighted modularity of a labelling. Zero for an edgeless graph.
pub(crate) fn modularity(weights: &Array2<f64>, labels: &[usize]) -> f64 {
    let degrees: Vec<f64> = weights.rows().into_iter().map(|row| row.sum()).collect();
    let total: f64 = degrees.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let mut q = 0.0;
    for ((i, j), &w) in weights.indexed_iter() {
        if labels[i] == labels[j] {
            q += w - degrees[i] * degrees[j] / total;
        }
    }
    q / total
}
