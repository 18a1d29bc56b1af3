use crate::json::{JsonBaseCodeComparison, JsonClustering, JsonComparison, JsonReport};

pub(crate) fn format_summary(report: &JsonReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "root={} language={} submissions={} compared={} metric={} elapsed={}ms\n",
        report.root,
        report.language,
        report.submissions,
        report.total_comparisons,
        report.metric,
        report.duration_ms
    ));
    if let Some(base) = &report.base_code {
        out.push_str(&format!("base code: {base}\n"));
    }
    if !report.failed_submissions.is_empty() {
        out.push_str(&format!(
            "failed submissions: {}\n",
            report.failed_submissions.len()
        ));
        for name in &report.failed_submissions {
            out.push_str(&format!("- {name}\n"));
        }
    }
    out.push('\n');
    out
}

pub(crate) fn format_comparisons(comparisons: &[JsonComparison]) -> String {
    let mut out = String::new();
    out.push_str(&format!("comparisons: {}\n", comparisons.len()));
    for comparison in comparisons {
        out.push('\n');
        out.push_str(&format!(
            "{:.2}% {} <-> {} matched={} longest={} min={:.2}% max={:.2}%\n",
            comparison.similarity * 100.0,
            comparison.first,
            comparison.second,
            comparison.matched_tokens,
            comparison.longest_match,
            comparison.min_similarity * 100.0,
            comparison.max_similarity * 100.0
        ));
        for m in &comparison.matches {
            match (&m.first, &m.second) {
                (Some(a), Some(b)) => out.push_str(&format!(
                    "- len={} {}:{}-{} | {}:{}-{}\n",
                    m.length, a.file, a.start_line, a.end_line, b.file, b.start_line, b.end_line
                )),
                _ => out.push_str(&format!(
                    "- len={} tokens {} | {}\n",
                    m.length, m.start_first, m.start_second
                )),
            }
        }
    }
    out
}

pub(crate) fn format_base_code(comparisons: &[JsonBaseCodeComparison]) -> String {
    let mut out = String::new();
    out.push_str("base code overlap:\n");
    for comparison in comparisons {
        out.push_str(&format!(
            "- {} {:.2}% matched={}\n",
            comparison.submission,
            comparison.coverage * 100.0,
            comparison.matched_tokens
        ));
    }
    out.push('\n');
    out
}

pub(crate) fn format_clusters(clustering: &JsonClustering) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\nclusters ({}): {} community_strength={:.3}\n",
        clustering.algorithm,
        clustering.clusters.len(),
        clustering.community_strength
    ));
    for (idx, cluster) in clustering.clusters.iter().enumerate() {
        out.push_str(&format!(
            "{}. strength={:.2}% size={} [{}]\n",
            idx + 1,
            cluster.strength * 100.0,
            cluster.members.len(),
            cluster.members.join(", ")
        ));
    }
    out
}

pub(crate) fn format_text(report: &JsonReport) -> String {
    let mut out = format_summary(report);
    if !report.base_code_comparisons.is_empty() {
        out.push_str(&format_base_code(&report.base_code_comparisons));
    }
    out.push_str(&format_comparisons(&report.comparisons));
    if let Some(clustering) = &report.clustering {
        out.push_str(&format_clusters(clustering));
    }
    out
}
