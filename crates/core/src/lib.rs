mod clustering;
mod compare;
mod comparison;
mod error;
mod frontend;
mod load;
mod matrix;
mod run;
mod submission;
mod tiling;
mod token;
mod tokenize;
mod types;

pub use clustering::{
    AgglomerativeOptions, Cluster, ClusteringAlgorithm, ClusteringOptions, ClusteringResult,
    Linkage, Preprocessing, SpectralOptions, cluster_matrix, cluster_matrix_with_rng, preprocess,
};

pub use compare::{
    ComparisonOutcome, base_code_mask, compare_all, compare_submissions, comparison_pairs,
};

pub use comparison::{Comparison, SimilarityMetric};

pub use error::{ConfigError, Error, Result};

pub use frontend::{ExactKinds, Frontend, KindEquivalence, SourceFile, TokenizeOutcome};

pub use load::load_submissions;

pub use matrix::SimilarityMatrix;

pub use run::{RunResult, retain_top, run};

pub use submission::{Submission, SubmissionId, SubmissionRegistry};

pub use tiling::{ConsumptionMask, Tile, greedy_tiles, greedy_tiles_masked};

pub use token::{FileId, Symbol, Token, TokenKind, TokenSequence};

pub use tokenize::{CStyleFrontend, CStyleKind};

pub use types::{
    ComparisonMode, DEFAULT_MINIMUM_TOKEN_MATCH, LoadOptions, RunOptions, default_ignore_dirs,
};
