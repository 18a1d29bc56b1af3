//! Pairwise comparison of registered submissions.
//!
//! Phase 1 matches every valid submission against the base code (when one is designated)
//! and caches the resulting consumption mask. Phase 2 tiles every submission pair starting
//! from copies of the cached masks. Both phases fan out over a bounded rayon pool; each task
//! only reads immutable token sequences and produces its own result.

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::comparison::Comparison;
use crate::error::{ConfigError, Error, Result};
use crate::submission::{Submission, SubmissionId, SubmissionRegistry};
use crate::tiling::{ConsumptionMask, greedy_tiles_masked};
use crate::types::{ComparisonMode, RunOptions};

#[derive(Debug, Clone, Default)]
pub struct ComparisonOutcome {
    /// One entry per compared pair, in pair order.
    pub comparisons: Vec<Comparison>,
    /// Each valid submission (first) against the base code (second).
    pub base_code_comparisons: Vec<Comparison>,
}

/// Tiles a submission against the base code.
///
/// Returns the submission's mask with every base-code-matched position consumed.
pub fn base_code_mask(
    submission: &Submission,
    base_code: &Submission,
    min_length: usize,
) -> Result<(ConsumptionMask, Comparison), ConfigError> {
    let mut mask = ConsumptionMask::for_symbols(submission.symbols());
    let mut base_mask = ConsumptionMask::for_symbols(base_code.symbols());
    let submission_len = mask.available();
    let base_len = base_mask.available();
    let tiles = greedy_tiles_masked(
        submission.symbols(),
        base_code.symbols(),
        &mut mask,
        &mut base_mask,
        min_length,
    )?;
    let comparison = Comparison::new(
        submission.id(),
        base_code.id(),
        tiles,
        submission_len,
        base_len,
    );
    Ok((mask, comparison))
}

fn initial_mask(
    submission: &Submission,
    base_code: Option<&Submission>,
    min_length: usize,
) -> Result<ConsumptionMask, ConfigError> {
    match base_code {
        Some(base_code) => Ok(base_code_mask(submission, base_code, min_length)?.0),
        None => Ok(ConsumptionMask::for_symbols(submission.symbols())),
    }
}

/// Compares two submissions from scratch, recomputing base-code consumption.
pub fn compare_submissions(
    a: &Submission,
    b: &Submission,
    base_code: Option<&Submission>,
    min_length: usize,
) -> Result<Comparison, ConfigError> {
    let mask_a = initial_mask(a, base_code, min_length)?;
    let mask_b = initial_mask(b, base_code, min_length)?;
    compare_masked(a, &mask_a, b, &mask_b, min_length)
}

/// Tiles with the lower id as `a`, so both orientations yield mirrored tiles.
fn compare_masked(
    a: &Submission,
    mask_a: &ConsumptionMask,
    b: &Submission,
    mask_b: &ConsumptionMask,
    min_length: usize,
) -> Result<Comparison, ConfigError> {
    if a.id() > b.id() {
        return Ok(compare_masked(b, mask_b, a, mask_a, min_length)?.swapped());
    }

    let mut mask_a = mask_a.clone();
    let mut mask_b = mask_b.clone();
    let first_len = mask_a.available();
    let second_len = mask_b.available();
    let tiles = greedy_tiles_masked(
        a.symbols(),
        b.symbols(),
        &mut mask_a,
        &mut mask_b,
        min_length,
    )?;
    Ok(Comparison::new(a.id(), b.id(), tiles, first_len, second_len))
}

/// Pairs to compare, oriented `(first, second)`.
pub fn comparison_pairs(
    ids: &[SubmissionId],
    mode: ComparisonMode,
) -> Vec<(SubmissionId, SubmissionId)> {
    let n = ids.len();
    let mut pairs = Vec::with_capacity(n.saturating_mul(n.saturating_sub(1)) / 2);
    match mode {
        ComparisonMode::Normal => {
            for i in 0..n {
                for j in (i + 1)..n {
                    pairs.push((ids[i], ids[j]));
                }
            }
        }
        ComparisonMode::Ordered => {
            for later in 1..n {
                for earlier in 0..later {
                    pairs.push((ids[later], ids[earlier]));
                }
            }
        }
    }
    pairs
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    at: Instant,
    timeout: Duration,
}

impl Deadline {
    pub(crate) fn starting_now(timeout: Option<Duration>) -> Option<Self> {
        timeout.map(|timeout| Self {
            at: Instant::now() + timeout,
            timeout,
        })
    }

    pub(crate) fn check(deadline: Option<Self>) -> Result<()> {
        match deadline {
            Some(d) if Instant::now() >= d.at => Err(Error::Timeout(d.timeout)),
            _ => Ok(()),
        }
    }
}

pub fn compare_all(registry: &SubmissionRegistry, options: &RunOptions) -> Result<ComparisonOutcome> {
    compare_all_until(
        registry,
        options,
        Deadline::starting_now(options.timeout),
    )
}

pub(crate) fn compare_all_until(
    registry: &SubmissionRegistry,
    options: &RunOptions,
    deadline: Option<Deadline>,
) -> Result<ComparisonOutcome> {
    let min_length = options.minimum_token_match;
    if min_length == 0 {
        return Err(ConfigError::MinimumTokenMatch { value: 0 }.into());
    }

    let submissions: Vec<&Submission> = registry.valid().collect();
    let base_code = registry.base_code();

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = options.worker_threads {
        pool = pool.num_threads(threads);
    }
    let pool = pool.build()?;

    pool.install(|| {
        let started = Instant::now();
        let prepared: Vec<(ConsumptionMask, Option<Comparison>)> = submissions
            .par_iter()
            .map(|submission| {
                Deadline::check(deadline)?;
                match base_code {
                    Some(base_code) => {
                        let (mask, comparison) = base_code_mask(submission, base_code, min_length)?;
                        Ok((mask, Some(comparison)))
                    }
                    None => Ok((ConsumptionMask::for_symbols(submission.symbols()), None)),
                }
            })
            .collect::<Result<Vec<_>>>()?;
        if let Some(base_code) = base_code {
            info!(
                base_code = %base_code.name(),
                submissions = submissions.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "base code consumption computed"
            );
        }

        let positions: HashMap<SubmissionId, usize> = submissions
            .iter()
            .enumerate()
            .map(|(pos, s)| (s.id(), pos))
            .collect();
        let ids: Vec<SubmissionId> = submissions.iter().map(|s| s.id()).collect();
        let pairs = comparison_pairs(&ids, options.comparison_mode);
        debug!(pairs = pairs.len(), mode = %options.comparison_mode, "comparing submission pairs");

        let started = Instant::now();
        let comparisons = pairs
            .par_iter()
            .map(|&(a, b)| {
                Deadline::check(deadline)?;
                let (ia, ib) = (positions[&a], positions[&b]);
                let comparison = compare_masked(
                    submissions[ia],
                    &prepared[ia].0,
                    submissions[ib],
                    &prepared[ib].0,
                    min_length,
                )?;
                Ok(comparison)
            })
            .collect::<Result<Vec<_>>>()?;
        Deadline::check(deadline)?;
        info!(
            comparisons = comparisons.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pairwise comparisons finished"
        );

        Ok(ComparisonOutcome {
            comparisons,
            base_code_comparisons: prepared.into_iter().filter_map(|(_, c)| c).collect(),
        })
    })
}
