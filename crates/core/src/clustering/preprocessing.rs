use ndarray::Array2;

use super::options::Preprocessing;

/// Applies `preprocessing` to the off-diagonal values of a symmetric matrix.
///
/// The diagonal is copied unchanged. Zero stays zero under every transform.
pub fn preprocess(values: &Array2<f64>, preprocessing: Preprocessing) -> Array2<f64> {
    let mut out = values.clone();
    match preprocessing {
        Preprocessing::None => {}
        Preprocessing::Threshold(cutoff) => {
            map_off_diagonal(&mut out, |v| if v < cutoff { 0.0 } else { v });
        }
        Preprocessing::Cdf => {
            let sorted = sorted_pair_values(values);
            if sorted.is_empty() {
                return out;
            }
            let total = sorted.len() as f64;
            map_off_diagonal(&mut out, |v| {
                if v <= 0.0 {
                    return 0.0;
                }
                sorted.partition_point(|&x| x <= v) as f64 / total
            });
        }
        Preprocessing::Percentile(p) => {
            let sorted = sorted_pair_values(values);
            if sorted.is_empty() {
                return out;
            }
            let rank = (p * (sorted.len() - 1) as f64).round() as usize;
            let cutoff = sorted[rank.min(sorted.len() - 1)];
            map_off_diagonal(&mut out, |v| if v < cutoff { 0.0 } else { v });
        }
    }
    out
}

/// Upper-triangle values, ascending.
fn sorted_pair_values(values: &Array2<f64>) -> Vec<f64> {
    let n = values.nrows();
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            pairs.push(values[[i, j]]);
        }
    }
    pairs.sort_by(f64::total_cmp);
    pairs
}

fn map_off_diagonal(values: &mut Array2<f64>, f: impl Fn(f64) -> f64) {
    for ((i, j), v) in values.indexed_iter_mut() {
        if i != j {
            *v = f(*v);
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn sample() -> Array2<f64> {
        array![
            [1.0, 0.9, 0.1, 0.0],
            [0.9, 1.0, 0.15, 0.4],
            [0.1, 0.15, 1.0, 0.6],
            [0.0, 0.4, 0.6, 1.0],
        ]
    }

    #[test]
    fn none_is_identity() {
        assert_eq!(preprocess(&sample(), Preprocessing::None), sample());
    }

    #[test]
    fn threshold_zeroes_small_values_and_is_idempotent() {
        let once = preprocess(&sample(), Preprocessing::Threshold(0.4));
        assert_eq!(once[[0, 2]], 0.0);
        assert_eq!(once[[1, 3]], 0.4);
        assert_eq!(once[[0, 0]], 1.0);
        let twice = preprocess(&once, Preprocessing::Threshold(0.4));
        assert_eq!(once, twice);
    }

    #[test]
    fn cdf_ranks_values_and_keeps_zeros() {
        let cdf = preprocess(&sample(), Preprocessing::Cdf);
        // Six pair values: 0.0, 0.1, 0.15, 0.4, 0.6, 0.9.
        assert_eq!(cdf[[0, 3]], 0.0);
        assert!((cdf[[0, 2]] - 2.0 / 6.0).abs() < 1e-12);
        assert!((cdf[[0, 1]] - 1.0).abs() < 1e-12);
        assert_eq!(cdf[[1, 0]], cdf[[0, 1]]);
    }

    #[test]
    fn percentile_keeps_the_upper_values() {
        let kept = preprocess(&sample(), Preprocessing::Percentile(0.6));
        // Rank round(0.6 * 5) = 3 selects 0.4 as the cutoff.
        assert_eq!(kept[[1, 3]], 0.4);
        assert_eq!(kept[[2, 3]], 0.6);
        assert_eq!(kept[[1, 2]], 0.0);
        assert_eq!(kept[[0, 2]], 0.0);
    }

    #[test]
    fn single_submission_is_left_alone() {
        let one = array![[1.0]];
        for preprocessing in [
            Preprocessing::Cdf,
            Preprocessing::Percentile(0.5),
            Preprocessing::Threshold(0.5),
        ] {
            assert_eq!(preprocess(&one, preprocessing), one);
        }
    }
}
