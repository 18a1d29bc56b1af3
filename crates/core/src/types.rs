use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::clustering::ClusteringOptions;
use crate::comparison::SimilarityMetric;
use crate::error::ConfigError;
use crate::frontend::Frontend;

/// Which submission pairs are compared, and in which orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComparisonMode {
    /// Every unordered pair once, earlier submission first.
    #[default]
    Normal,
    /// Each submission against the ones registered before it, later submission first.
    Ordered,
}

impl ComparisonMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Ordered => "ordered",
        }
    }
}

impl fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ComparisonMode {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "ordered" | "incremental" => Ok(Self::Ordered),
            _ => Err(ConfigError::unknown("comparison mode", raw)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub minimum_token_match: usize,
    /// Comparisons below this similarity are dropped from the retained set.
    pub similarity_threshold: f64,
    /// Keep only the top-K comparisons; `None` keeps every one above the threshold.
    pub maximum_comparisons: Option<usize>,
    pub similarity_metric: SimilarityMetric,
    pub comparison_mode: ComparisonMode,
    pub worker_threads: Option<usize>,
    /// Aborts the whole run once exceeded.
    pub timeout: Option<Duration>,
    pub clustering: ClusteringOptions,
}

pub const DEFAULT_MINIMUM_TOKEN_MATCH: usize = 12;

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            minimum_token_match: DEFAULT_MINIMUM_TOKEN_MATCH,
            similarity_threshold: 0.0,
            maximum_comparisons: None,
            similarity_metric: SimilarityMetric::Avg,
            comparison_mode: ComparisonMode::Normal,
            worker_threads: None,
            timeout: None,
            clustering: ClusteringOptions::default(),
        }
    }
}

impl RunOptions {
    /// Defaults adjusted to what the frontend declares.
    pub fn for_frontend(frontend: &dyn Frontend) -> Self {
        Self {
            minimum_token_match: frontend.minimum_token_match(),
            comparison_mode: if frontend.expects_submission_order() {
                ComparisonMode::Ordered
            } else {
                ComparisonMode::Normal
            },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.minimum_token_match == 0 {
            return Err(ConfigError::MinimumTokenMatch { value: 0 });
        }
        if !self.similarity_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.similarity_threshold)
        {
            return Err(ConfigError::SimilarityThreshold {
                value: self.similarity_threshold,
            });
        }
        if self.worker_threads == Some(0) {
            return Err(ConfigError::Zero {
                name: "worker threads",
            });
        }
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::Zero { name: "timeout" });
        }
        self.clustering.validate()
    }
}

/// How submissions are read from disk.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Overrides the frontend's suffixes when non-empty.
    pub suffixes: Vec<String>,
    /// Only files below this directory of each submission are read.
    pub subdirectory: Option<String>,
    /// File listing names of files to skip, one per line.
    pub exclude_file: Option<PathBuf>,
    pub respect_gitignore: bool,
    pub ignore_dirs: HashSet<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            suffixes: Vec::new(),
            subdirectory: None,
            exclude_file: None,
            respect_gitignore: true,
            ignore_dirs: default_ignore_dirs(),
        }
    }
}

pub fn default_ignore_dirs() -> HashSet<String> {
    [".git", ".hg", ".svn", "node_modules", "target", "build", "out"]
        .into_iter()
        .map(str::to_string)
        .collect()
}
