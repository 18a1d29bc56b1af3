use std::path::PathBuf;

use crate::token::{Symbol, TokenSequence};

/// One source file handed to a frontend, path relative to its submission root.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct TokenizeOutcome {
    pub tokens: TokenSequence,
    pub has_errors: bool,
}

/// Decides which token kinds count as the same symbol when matching.
///
/// Expressed as a canonical representative per kind so that equal symbols always hash equal.
pub trait KindEquivalence: Send + Sync {
    fn canonical(&self, kind: Symbol) -> Symbol;
}

/// Every kind only equals itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactKinds;

impl KindEquivalence for ExactKinds {
    fn canonical(&self, kind: Symbol) -> Symbol {
        kind
    }
}

/// Capability contract of a language frontend.
pub trait Frontend: Send + Sync {
    /// Descriptive name.
    fn name(&self) -> &str;

    /// Name used on the command line.
    fn short_name(&self) -> &str;

    /// File suffixes this frontend reads. Empty means every file.
    fn suffixes(&self) -> &[&str];

    /// Shortest run of tokens considered significant for this language.
    fn minimum_token_match(&self) -> usize;

    fn tokenize(&self, files: &[SourceFile]) -> TokenizeOutcome;

    fn supports_columns(&self) -> bool;

    /// Whether reports should render sources in a fixed-width font.
    fn is_preformatted(&self) -> bool;

    fn uses_index(&self) -> bool {
        false
    }

    fn use_view_files(&self) -> bool {
        false
    }

    fn view_file_suffix(&self) -> &str {
        ""
    }

    fn expects_submission_order(&self) -> bool {
        false
    }

    /// Reorders submission roots when [`Frontend::expects_submission_order`] is set.
    fn customize_submission_order(&self, submissions: Vec<PathBuf>) -> Vec<PathBuf> {
        submissions
    }

    fn equivalence(&self) -> &dyn KindEquivalence {
        &ExactKinds
    }
}
