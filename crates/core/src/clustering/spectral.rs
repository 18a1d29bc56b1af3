use std::collections::BTreeMap;

use ndarray::Array2;
use rand::Rng;
use tracing::debug;

use super::kmeans::kmeans;
use super::linalg::symmetric_eigen;
use super::modularity;
use super::options::SpectralOptions;
use super::search::search_cluster_count;

/// Gaussian affinity on the distance `1 - s`. Zero similarity means no edge.
pub(crate) fn affinity(similarity: &Array2<f64>, bandwidth: f64) -> Array2<f64> {
    let n = similarity.nrows();
    let denominator = 2.0 * bandwidth * bandwidth;
    Array2::from_shape_fn((n, n), |(i, j)| {
        let s = similarity[[i, j]];
        if i == j || s <= 0.0 {
            0.0
        } else {
            let distance = 1.0 - s;
            (-(distance * distance) / denominator).exp()
        }
    })
}

/// Partitions matrix positions into groups.
///
/// Positions without any affinity become singletons; the rest are embedded with the leading
/// eigenvectors of `D^-1/2 A D^-1/2` and grouped by k-means with the best scoring k.
pub(crate) fn spectral_partition<R: Rng + ?Sized>(
    similarity: &Array2<f64>,
    options: &SpectralOptions,
    rng: &mut R,
) -> Vec<Vec<usize>> {
    let n = similarity.nrows();
    let weights = affinity(similarity, options.kernel_bandwidth);
    let degrees: Vec<f64> = weights.rows().into_iter().map(|row| row.sum()).collect();

    let connected: Vec<usize> = (0..n).filter(|&i| degrees[i] > 0.0).collect();
    let mut groups: Vec<Vec<usize>> = (0..n)
        .filter(|&i| degrees[i] <= 0.0)
        .map(|i| vec![i])
        .collect();
    if connected.is_empty() {
        return groups;
    }

    let m = connected.len();
    let sub = Array2::from_shape_fn((m, m), |(i, j)| weights[[connected[i], connected[j]]]);
    let inv_sqrt: Vec<f64> = connected.iter().map(|&i| degrees[i].sqrt().recip()).collect();
    let normalized = Array2::from_shape_fn((m, m), |(i, j)| inv_sqrt[i] * sub[[i, j]] * inv_sqrt[j]);
    let eigen = symmetric_eigen(&normalized);

    let mut labelings: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let outcome = search_cluster_count(m, options, rng, |k, rng| {
        let embedding = embed(&eigen.vectors, k);
        let fit = kmeans(&embedding, k, options.kmeans_iterations, rng);
        let score = modularity(&sub, &fit.labels);
        labelings.insert(k, fit.labels);
        score
    });

    let labels = outcome
        .and_then(|o| {
            debug!(k = o.k, modularity = o.score, evaluations = o.evaluations, "cluster count chosen");
            labelings.remove(&o.k)
        })
        .unwrap_or_else(|| vec![0; m]);

    let mut by_label: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (pos, &label) in labels.iter().enumerate() {
        by_label.entry(label).or_default().push(connected[pos]);
    }
    groups.extend(by_label.into_values());
    groups
}

/// First `k` eigenvector columns, each row scaled to unit length.
fn embed(vectors: &Array2<f64>, k: usize) -> Array2<f64> {
    let mut embedding = vectors.slice(ndarray::s![.., ..k]).to_owned();
    for mut row in embedding.rows_mut() {
        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row /= norm;
        }
    }
    embedding
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn sorted(mut groups: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
        for group in &mut groups {
            group.sort_unstable();
        }
        groups.sort();
        groups
    }

    fn two_blocks() -> Array2<f64> {
        Array2::from_shape_fn((6, 6), |(i, j)| {
            if i == j {
                1.0
            } else if (i < 3) == (j < 3) {
                0.9
            } else {
                0.0
            }
        })
    }

    #[test]
    fn zero_similarity_gives_no_affinity() {
        let a = affinity(&array![[1.0, 0.0], [0.0, 1.0]], 0.25);
        assert_eq!(a, Array2::<f64>::zeros((2, 2)));
        let b = affinity(&array![[1.0, 1.0], [1.0, 1.0]], 0.25);
        assert_eq!(b[[0, 1]], 1.0);
        assert_eq!(b[[0, 0]], 0.0);
    }

    #[test]
    fn separates_disconnected_blocks() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let groups = spectral_partition(&two_blocks(), &SpectralOptions::default(), &mut rng);
        assert_eq!(sorted(groups), vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }

    #[test]
    fn seeded_runs_agree() {
        let noisy = Array2::from_shape_fn((7, 7), |(i, j)| {
            if i == j {
                1.0
            } else {
                ((i * 7 + j * 3 + (i * j)) % 10) as f64 / 10.0 * 0.5 + 0.1 * ((i + j) % 2) as f64
            }
        });
        let symmetric = Array2::from_shape_fn((7, 7), |(i, j)| noisy[[i.min(j), i.max(j)]]);
        let options = SpectralOptions::default();
        let a = spectral_partition(&symmetric, &options, &mut ChaCha8Rng::seed_from_u64(9));
        let b = spectral_partition(&symmetric, &options, &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(sorted(a), sorted(b));
    }

    #[test]
    fn all_zero_matrix_gives_singletons() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let zero = Array2::<f64>::eye(4);
        let groups = spectral_partition(&zero, &SpectralOptions::default(), &mut rng);
        assert_eq!(sorted(groups), vec![vec![0], vec![1], vec![2], vec![3]]);
    }
}
