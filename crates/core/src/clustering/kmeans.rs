use ndarray::{Array2, ArrayView1};
use rand::Rng;

/// Independent k-means++ starts per call; the lowest inertia wins.
const KMEANS_RESTARTS: usize = 5;

#[derive(Debug, Clone)]
pub(crate) struct KMeansFit {
    /// Cluster index per row, in `0..k`. Some indices may be unused.
    pub labels: Vec<usize>,
    pub inertia: f64,
}

/// Lloyd's algorithm over the rows of `points`.
pub(crate) fn kmeans<R: Rng + ?Sized>(
    points: &Array2<f64>,
    k: usize,
    iterations: usize,
    rng: &mut R,
) -> KMeansFit {
    let n = points.nrows();
    if n == 0 || k == 0 {
        return KMeansFit {
            labels: vec![0; n],
            inertia: 0.0,
        };
    }
    let k = k.min(n);

    let mut best: Option<KMeansFit> = None;
    for _ in 0..KMEANS_RESTARTS {
        let fit = lloyd(points, seed_centers(points, k, rng), iterations);
        if best.as_ref().is_none_or(|b| fit.inertia < b.inertia) {
            best = Some(fit);
        }
    }
    best.unwrap_or(KMeansFit {
        labels: vec![0; n],
        inertia: 0.0,
    })
}

fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// k-means++ seeding.
fn seed_centers<R: Rng + ?Sized>(points: &Array2<f64>, k: usize, rng: &mut R) -> Array2<f64> {
    let n = points.nrows();
    let mut centers = Array2::<f64>::zeros((k, points.ncols()));
    let first = rng.gen_range(0..n);
    centers.row_mut(0).assign(&points.row(first));

    let mut nearest: Vec<f64> = (0..n)
        .map(|i| squared_distance(points.row(i), centers.row(0)))
        .collect();
    for c in 1..k {
        let total: f64 = nearest.iter().sum();
        let pick = if total > 0.0 {
            let mut target = rng.r#gen::<f64>() * total;
            let mut chosen = n - 1;
            for (i, d) in nearest.iter().enumerate() {
                if target < *d {
                    chosen = i;
                    break;
                }
                target -= d;
            }
            chosen
        } else {
            rng.gen_range(0..n)
        };
        centers.row_mut(c).assign(&points.row(pick));
        for (i, d) in nearest.iter_mut().enumerate() {
            *d = d.min(squared_distance(points.row(i), centers.row(c)));
        }
    }
    centers
}

fn lloyd(points: &Array2<f64>, mut centers: Array2<f64>, iterations: usize) -> KMeansFit {
    let n = points.nrows();
    let k = centers.nrows();
    let mut labels = vec![usize::MAX; n];

    for _ in 0..iterations.max(1) {
        let mut changed = false;
        for (i, label) in labels.iter_mut().enumerate() {
            let closest = nearest_center(points.row(i), &centers);
            if *label != closest {
                *label = closest;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        let mut sums = Array2::<f64>::zeros(centers.raw_dim());
        let mut counts = vec![0usize; k];
        for (i, &label) in labels.iter().enumerate() {
            let mut row = sums.row_mut(label);
            row += &points.row(i);
            counts[label] += 1;
        }
        for (c, &count) in counts.iter().enumerate() {
            // Empty clusters keep their previous center.
            if count > 0 {
                let mean = &sums.row(c) / count as f64;
                centers.row_mut(c).assign(&mean);
            }
        }
    }

    let inertia = labels
        .iter()
        .enumerate()
        .map(|(i, &label)| squared_distance(points.row(i), centers.row(label)))
        .sum();
    KMeansFit { labels, inertia }
}

fn nearest_center(point: ArrayView1<'_, f64>, centers: &Array2<f64>) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (c, center) in centers.rows().into_iter().enumerate() {
        let d = squared_distance(point, center);
        if d < best_distance {
            best = c;
            best_distance = d;
        }
    }
    best
}
