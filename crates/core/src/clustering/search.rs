//! Gaussian-process guided search for the cluster count.
//!
//! Each candidate `k` costs a full k-means run, so only `max_runs` of them are evaluated.
//! After `min_runs` random picks, the next candidate maximizes the upper confidence bound of a
//! GP fitted to the scores seen so far.

use ndarray::{Array1, Array2};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use super::linalg::{cholesky, solve_lower, solve_upper_transposed};
use super::options::SpectralOptions;

const LENGTH_SCALE: f64 = 0.2;
const EXPLORATION: f64 = 2.0;
const JITTER: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SearchOutcome {
    pub k: usize,
    pub score: f64,
    pub evaluations: usize,
}

/// Evaluates candidates in `1..=max_k` and returns the best scoring one, preferring smaller k on ties.
pub(crate) fn search_cluster_count<R, F>(
    max_k: usize,
    options: &SpectralOptions,
    rng: &mut R,
    mut evaluate: F,
) -> Option<SearchOutcome>
where
    R: Rng + ?Sized,
    F: FnMut(usize, &mut R) -> f64,
{
    if max_k == 0 {
        return None;
    }
    let candidates: Vec<usize> = (1..=max_k).collect();
    let budget = options.max_runs.min(max_k);
    let mut seen: Vec<(usize, f64)> = Vec::with_capacity(budget);

    let initial: Vec<usize> = candidates
        .choose_multiple(rng, options.min_runs.min(budget))
        .copied()
        .collect();
    for k in initial {
        let score = evaluate(k, rng);
        debug!(k, score, "initial cluster count evaluated");
        seen.push((k, score));
    }

    while seen.len() < budget {
        let Some(k) = next_candidate(&candidates, &seen, max_k, options.noise_variance) else {
            break;
        };
        let score = evaluate(k, rng);
        debug!(k, score, "guided cluster count evaluated");
        seen.push((k, score));
    }

    let evaluations = seen.len();
    seen.sort_by_key(|&(k, _)| k);
    let mut best: Option<SearchOutcome> = None;
    for (k, score) in seen {
        if best.is_none_or(|b| score > b.score) {
            best = Some(SearchOutcome {
                k,
                score,
                evaluations,
            });
        }
    }
    best
}

fn rbf(a: f64, b: f64) -> f64 {
    let d = a - b;
    (-(d * d) / (2.0 * LENGTH_SCALE * LENGTH_SCALE)).exp()
}

/// Unevaluated candidate with the highest UCB; the smallest one if the GP cannot be fitted.
fn next_candidate(
    candidates: &[usize],
    seen: &[(usize, f64)],
    max_k: usize,
    noise_variance: f64,
) -> Option<usize> {
    let open: Vec<usize> = candidates
        .iter()
        .copied()
        .filter(|k| !seen.iter().any(|(s, _)| s == k))
        .collect();
    let first_open = *open.first()?;
    if seen.is_empty() {
        return Some(first_open);
    }

    let scale = max_k as f64;
    let xs: Vec<f64> = seen.iter().map(|&(k, _)| k as f64 / scale).collect();
    let mean = seen.iter().map(|&(_, y)| y).sum::<f64>() / seen.len() as f64;
    let ys = Array1::from_iter(seen.iter().map(|&(_, y)| y - mean));

    let n = xs.len();
    let mut gram = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            gram[[i, j]] = rbf(xs[i], xs[j]);
        }
        gram[[i, i]] += noise_variance + JITTER;
    }
    let Some(l) = cholesky(&gram) else {
        return Some(first_open);
    };
    let alpha = solve_upper_transposed(&l, &solve_lower(&l, &ys));

    let mut best = first_open;
    let mut best_ucb = f64::NEG_INFINITY;
    for k in open {
        let x = k as f64 / scale;
        let cross = Array1::from_iter(xs.iter().map(|&xi| rbf(x, xi)));
        let mu = mean + cross.dot(&alpha);
        let v = solve_lower(&l, &cross);
        let variance = (1.0 - v.dot(&v)).max(0.0);
        let ucb = mu + EXPLORATION * variance.sqrt();
        if ucb > best_ucb {
            best = k;
            best_ucb = ucb;
        }
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn options(min_runs: usize, max_runs: usize) -> SpectralOptions {
        SpectralOptions {
            min_runs,
            max_runs,
            ..SpectralOptions::default()
        }
    }

    #[test]
    fn exhaustive_budget_finds_the_peak() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let outcome = search_cluster_count(8, &options(3, 50), &mut rng, |k, _| {
            -((k as f64) - 5.0).powi(2)
        })
        .unwrap();
        assert_eq!(outcome.k, 5);
        assert_eq!(outcome.evaluations, 8);
    }

    #[test]
    fn ties_prefer_fewer_clusters() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let outcome =
            search_cluster_count(6, &options(6, 6), &mut rng, |k, _| if k >= 3 { 1.0 } else { 0.0 })
                .unwrap();
        assert_eq!(outcome.k, 3);
    }

    #[test]
    fn respects_the_run_budget() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut calls = 0;
        let outcome = search_cluster_count(40, &options(4, 10), &mut rng, |k, _| {
            calls += 1;
            (k as f64).sin()
        })
        .unwrap();
        assert_eq!(calls, 10);
        assert_eq!(outcome.evaluations, 10);
    }

    #[test]
    fn no_candidates_no_outcome() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(search_cluster_count(0, &options(1, 5), &mut rng, |_, _| 0.0).is_none());
    }
}
