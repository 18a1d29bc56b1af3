use std::io;

use serde::Serialize;
use tile_check_core::{
    Cluster, ClusteringResult, Comparison, RunResult, SimilarityMetric, Submission,
    SubmissionRegistry, Tile,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonLocation {
    pub(crate) file: String,
    pub(crate) start_line: u32,
    pub(crate) end_line: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonMatch {
    pub(crate) start_first: usize,
    pub(crate) start_second: usize,
    pub(crate) length: usize,
    pub(crate) first: Option<JsonLocation>,
    pub(crate) second: Option<JsonLocation>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonComparison {
    pub(crate) first: String,
    pub(crate) second: String,
    pub(crate) similarity: f64,
    pub(crate) min_similarity: f64,
    pub(crate) max_similarity: f64,
    pub(crate) matched_tokens: usize,
    pub(crate) longest_match: usize,
    pub(crate) matches: Vec<JsonMatch>,
}

/// How much of one submission was matched by the base code.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonBaseCodeComparison {
    pub(crate) submission: String,
    pub(crate) coverage: f64,
    pub(crate) matched_tokens: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonCluster {
    pub(crate) members: Vec<String>,
    pub(crate) strength: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonClustering {
    pub(crate) algorithm: String,
    pub(crate) community_strength: f64,
    pub(crate) clusters: Vec<JsonCluster>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JsonReport {
    pub(crate) root: String,
    pub(crate) language: String,
    pub(crate) metric: String,
    pub(crate) submissions: usize,
    pub(crate) failed_submissions: Vec<String>,
    pub(crate) base_code: Option<String>,
    pub(crate) total_comparisons: usize,
    pub(crate) duration_ms: u64,
    pub(crate) comparisons: Vec<JsonComparison>,
    pub(crate) base_code_comparisons: Vec<JsonBaseCodeComparison>,
    pub(crate) clustering: Option<JsonClustering>,
}

fn location(submission: &Submission, start: usize, length: usize) -> Option<JsonLocation> {
    let tokens = submission.tokens().tokens();
    let first = tokens.get(start)?;
    let last = tokens.get(start + length.saturating_sub(1))?;
    let file = submission.tokens().file_path(first.file)?;
    Some(JsonLocation {
        file: file.to_string_lossy().into_owned(),
        start_line: first.line,
        end_line: last.line,
    })
}

fn name_of(submission: Option<&Submission>) -> String {
    submission.map(|s| s.name().to_string()).unwrap_or_default()
}

fn json_match(first: Option<&Submission>, second: Option<&Submission>, tile: &Tile) -> JsonMatch {
    JsonMatch {
        start_first: tile.start_a,
        start_second: tile.start_b,
        length: tile.length,
        first: first.and_then(|s| location(s, tile.start_a, tile.length)),
        second: second.and_then(|s| location(s, tile.start_b, tile.length)),
    }
}

pub(crate) fn json_comparison(
    registry: &SubmissionRegistry,
    comparison: &Comparison,
    metric: SimilarityMetric,
) -> JsonComparison {
    let first = registry.get(comparison.first());
    let second = registry.get(comparison.second());
    JsonComparison {
        first: name_of(first),
        second: name_of(second),
        similarity: comparison.similarity(metric),
        min_similarity: comparison.similarity(SimilarityMetric::Min),
        max_similarity: comparison.similarity(SimilarityMetric::Max),
        matched_tokens: comparison.matched_tokens(),
        longest_match: comparison.max_tile_length(),
        matches: comparison
            .tiles()
            .iter()
            .map(|tile| json_match(first, second, tile))
            .collect(),
    }
}

pub(crate) fn json_base_code_comparison(
    registry: &SubmissionRegistry,
    comparison: &Comparison,
) -> JsonBaseCodeComparison {
    JsonBaseCodeComparison {
        submission: name_of(registry.get(comparison.first())),
        coverage: comparison.coverage_first(),
        matched_tokens: comparison.matched_tokens(),
    }
}

fn json_cluster(registry: &SubmissionRegistry, cluster: &Cluster) -> JsonCluster {
    JsonCluster {
        members: cluster
            .members()
            .iter()
            .map(|&id| name_of(registry.get(id)))
            .collect(),
        strength: cluster.strength(),
    }
}

pub(crate) fn json_clustering(
    registry: &SubmissionRegistry,
    clustering: &ClusteringResult,
) -> JsonClustering {
    JsonClustering {
        algorithm: clustering.algorithm().to_string(),
        community_strength: clustering.community_strength(),
        clusters: clustering
            .clusters()
            .iter()
            .map(|cluster| json_cluster(registry, cluster))
            .collect(),
    }
}

pub(crate) fn json_report(
    root: String,
    language: String,
    metric: SimilarityMetric,
    registry: &SubmissionRegistry,
    result: &RunResult,
) -> JsonReport {
    JsonReport {
        root,
        language,
        metric: metric.to_string(),
        submissions: registry.valid().count(),
        failed_submissions: result
            .failed_submissions
            .iter()
            .map(|&id| name_of(registry.get(id)))
            .collect(),
        base_code: result.base_code.map(|id| name_of(registry.get(id))),
        total_comparisons: result.total_comparisons,
        duration_ms: result.duration.as_millis() as u64,
        comparisons: result
            .comparisons
            .iter()
            .map(|c| json_comparison(registry, c, metric))
            .collect(),
        base_code_comparisons: result
            .base_code_comparisons
            .iter()
            .map(|c| json_base_code_comparison(registry, c))
            .collect(),
        clustering: result
            .clustering
            .as_ref()
            .map(|c| json_clustering(registry, c)),
    }
}

pub(crate) fn write_json<T: Serialize>(value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::other(format!("json encode: {e}")))?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use tile_check_core::{ExactKinds, RunOptions, Symbol, TokenSequence, TokenizeOutcome, run};

    use super::*;

    fn registry(submissions: &[(&str, Vec<u32>)]) -> SubmissionRegistry {
        let mut registry = SubmissionRegistry::new();
        for (name, kinds) in submissions {
            let outcome = TokenizeOutcome {
                tokens: TokenSequence::from_kinds(kinds.iter().map(|&k| Symbol::new(k))),
                has_errors: false,
            };
            registry.register(*name, *name, outcome, &ExactKinds).unwrap();
        }
        registry
    }

    #[test]
    fn report_lists_base_code_overlap_per_submission() {
        let mut registry = registry(&[
            ("alice", (1..=4).chain(20..=23).collect()),
            ("bob", (1..=4).chain(30..=33).collect()),
            ("template", (1..=4).collect()),
        ]);
        registry.designate_base_code("template").unwrap();
        let options = RunOptions {
            minimum_token_match: 2,
            ..RunOptions::default()
        };
        let result = run(&registry, &options).unwrap();
        let report = json_report(
            "/subs".to_string(),
            "c-style".to_string(),
            SimilarityMetric::Avg,
            &registry,
            &result,
        );

        assert_eq!(report.base_code.as_deref(), Some("template"));
        let overlap: Vec<(&str, f64, usize)> = report
            .base_code_comparisons
            .iter()
            .map(|c| (c.submission.as_str(), c.coverage, c.matched_tokens))
            .collect();
        assert_eq!(overlap, vec![("alice", 0.5, 4), ("bob", 0.5, 4)]);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["baseCodeComparisons"][1]["submission"], "bob");
        assert_eq!(value["baseCodeComparisons"][0]["matchedTokens"], 4);
    }
}
