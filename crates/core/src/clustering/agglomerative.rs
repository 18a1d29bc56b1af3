use ndarray::Array2;

use super::options::{AgglomerativeOptions, Linkage};

fn linkage_similarity(similarity: &Array2<f64>, a: &[usize], b: &[usize], linkage: Linkage) -> f64 {
    let pairs = a.iter().flat_map(|&i| b.iter().map(move |&j| similarity[[i, j]]));
    match linkage {
        Linkage::Average => {
            let count = a.len() * b.len();
            if count == 0 {
                0.0
            } else {
                pairs.sum::<f64>() / count as f64
            }
        }
        Linkage::Max => pairs.fold(f64::NEG_INFINITY, f64::max),
        Linkage::Min => pairs.fold(f64::INFINITY, f64::min),
    }
}

/// Merges the most similar pair of clusters while its linkage similarity is strictly above the
/// threshold. Equal candidates resolve to the lowest cluster indices.
pub(crate) fn agglomerative_partition(
    similarity: &Array2<f64>,
    options: &AgglomerativeOptions,
) -> Vec<Vec<usize>> {
    let mut clusters: Vec<Vec<usize>> = (0..similarity.nrows()).map(|i| vec![i]).collect();

    loop {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..clusters.len() {
            for j in (i + 1)..clusters.len() {
                let value = linkage_similarity(similarity, &clusters[i], &clusters[j], options.linkage);
                if best.is_none_or(|(_, _, b)| value > b) {
                    best = Some((i, j, value));
                }
            }
        }
        match best {
            Some((i, j, value)) if value > options.threshold => {
                let merged = clusters.remove(j);
                clusters[i].extend(merged);
            }
            _ => break,
        }
    }
    clusters
}
