use std::cmp::Ordering;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::clustering::{ClusteringResult, cluster_matrix};
use crate::compare::{Deadline, compare_all_until};
use crate::comparison::{Comparison, SimilarityMetric};
use crate::error::Result;
use crate::matrix::SimilarityMatrix;
use crate::submission::{SubmissionId, SubmissionRegistry};
use crate::types::RunOptions;

/// Everything a run produces, handed read-only to reporting.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Comparisons at or above the threshold, best first, capped at the configured maximum.
    pub comparisons: Vec<Comparison>,
    /// Every valid submission against the base code.
    pub base_code_comparisons: Vec<Comparison>,
    /// Under the run's similarity metric.
    pub matrix: SimilarityMatrix,
    pub clustering: Option<ClusteringResult>,
    pub failed_submissions: Vec<SubmissionId>,
    pub base_code: Option<SubmissionId>,
    /// Pairs compared before retention.
    pub total_comparisons: usize,
    pub duration: Duration,
}

pub fn run(registry: &SubmissionRegistry, options: &RunOptions) -> Result<RunResult> {
    options.validate()?;
    let started = Instant::now();
    let deadline = Deadline::starting_now(options.timeout);

    let ids: Vec<SubmissionId> = registry.valid().map(|s| s.id()).collect();
    let failed_submissions: Vec<SubmissionId> = registry.failed().map(|s| s.id()).collect();
    let base_code = registry.base_code().map(|s| s.id());
    info!(
        valid = ids.len(),
        failed = failed_submissions.len(),
        base_code = base_code.is_some(),
        metric = %options.similarity_metric,
        mode = %options.comparison_mode,
        "run started"
    );

    if ids.len() < 2 {
        warn!(valid = ids.len(), "fewer than two valid submissions; nothing to compare");
        return Ok(RunResult {
            comparisons: Vec::new(),
            base_code_comparisons: Vec::new(),
            matrix: SimilarityMatrix::from_pairs(&ids, &[], options.similarity_metric),
            clustering: None,
            failed_submissions,
            base_code,
            total_comparisons: 0,
            duration: started.elapsed(),
        });
    }

    let outcome = compare_all_until(registry, options, deadline)?;
    let matrix = SimilarityMatrix::from_comparisons(
        &ids,
        &outcome.comparisons,
        options.similarity_metric,
    );

    let clustering = if options.clustering.enabled {
        let cluster_input;
        let input = if options.clustering.similarity_metric == options.similarity_metric {
            &matrix
        } else {
            cluster_input = SimilarityMatrix::from_comparisons(
                &ids,
                &outcome.comparisons,
                options.clustering.similarity_metric,
            );
            &cluster_input
        };
        let result = cluster_matrix(input, &options.clustering)?;
        Deadline::check(deadline)?;
        Some(result)
    } else {
        None
    };

    let total_comparisons = outcome.comparisons.len();
    let comparisons = retain_top(
        outcome.comparisons,
        options.similarity_metric,
        options.similarity_threshold,
        options.maximum_comparisons,
    );

    let duration = started.elapsed();
    info!(
        compared = total_comparisons,
        retained = comparisons.len(),
        clusters = clustering.as_ref().map_or(0, |c| c.clusters().len()),
        elapsed_ms = duration.as_millis() as u64,
        "run finished"
    );
    Ok(RunResult {
        comparisons,
        base_code_comparisons: outcome.base_code_comparisons,
        matrix,
        clustering,
        failed_submissions,
        base_code,
        total_comparisons,
        duration,
    })
}

/// Drops comparisons below `threshold`, orders the rest by descending similarity (pair ids break
/// ties) and keeps at most `maximum`.
pub fn retain_top(
    comparisons: Vec<Comparison>,
    metric: SimilarityMetric,
    threshold: f64,
    maximum: Option<usize>,
) -> Vec<Comparison> {
    let mut kept: Vec<(f64, Comparison)> = comparisons
        .into_iter()
        .map(|c| (c.similarity(metric), c))
        .filter(|(similarity, _)| *similarity >= threshold)
        .collect();
    kept.sort_by(|(sa, a), (sb, b)| {
        sb.partial_cmp(sa)
            .unwrap_or(Ordering::Equal)
            .then_with(|| (a.first(), a.second()).cmp(&(b.first(), b.second())))
    });
    if let Some(maximum) = maximum {
        kept.truncate(maximum);
    }
    kept.into_iter().map(|(_, c)| c).collect()
}
