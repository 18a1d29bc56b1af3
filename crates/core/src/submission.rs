use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{Error, Result};
use crate::frontend::{KindEquivalence, TokenizeOutcome};
use crate::token::{Symbol, TokenSequence};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubmissionId(pub usize);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Submission {
    id: SubmissionId,
    name: String,
    root: PathBuf,
    tokens: TokenSequence,
    symbols: Vec<Symbol>,
    is_base_code: bool,
    has_errors: bool,
}

impl Submission {
    pub fn id(&self) -> SubmissionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tokens(&self) -> &TokenSequence {
        &self.tokens
    }

    /// Token kinds after the frontend's equivalence was applied; what the matcher sees.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn is_base_code(&self) -> bool {
        self.is_base_code
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors
    }
}

/// Owns the token sequence of every submission of a run.
#[derive(Debug, Default)]
pub struct SubmissionRegistry {
    submissions: Vec<Submission>,
    by_name: HashMap<String, SubmissionId>,
    base_code: Option<SubmissionId>,
}

impl SubmissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        outcome: TokenizeOutcome,
        equivalence: &dyn KindEquivalence,
    ) -> Result<SubmissionId> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(Error::DuplicateSubmission(name));
        }

        let id = SubmissionId(self.submissions.len());
        let symbols = outcome
            .tokens
            .symbols()
            .map(|s| if s.is_file_end() { s } else { equivalence.canonical(s) })
            .collect();
        if outcome.has_errors {
            warn!(submission = %name, "tokenization reported errors; submission excluded");
        }

        self.by_name.insert(name.clone(), id);
        self.submissions.push(Submission {
            id,
            name,
            root: root.into(),
            tokens: outcome.tokens,
            symbols,
            is_base_code: false,
            has_errors: outcome.has_errors,
        });
        Ok(id)
    }

    /// Marks an already registered submission as the base code of the run.
    pub fn designate_base_code(&mut self, name: &str) -> Result<SubmissionId> {
        let id = *self
            .by_name
            .get(name)
            .ok_or_else(|| Error::UnknownBaseCode(name.to_string()))?;
        if self.submissions[id.0].has_errors {
            return Err(Error::BaseCodeInvalid(name.to_string()));
        }
        if let Some(previous) = self.base_code.replace(id) {
            self.submissions[previous.0].is_base_code = false;
        }
        self.submissions[id.0].is_base_code = true;
        Ok(id)
    }

    pub fn get(&self, id: SubmissionId) -> Option<&Submission> {
        self.submissions.get(id.0)
    }

    pub fn by_name(&self, name: &str) -> Option<&Submission> {
        self.by_name.get(name).and_then(|id| self.get(*id))
    }

    pub fn base_code(&self) -> Option<&Submission> {
        self.base_code.and_then(|id| self.get(id))
    }

    /// Submissions taking part in pairwise comparisons, in registration order.
    pub fn valid(&self) -> impl Iterator<Item = &Submission> {
        self.submissions
            .iter()
            .filter(|s| !s.has_errors && !s.is_base_code)
    }

    /// Submissions excluded because their tokenization failed.
    pub fn failed(&self) -> impl Iterator<Item = &Submission> {
        self.submissions.iter().filter(|s| s.has_errors)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Submission> {
        self.submissions.iter()
    }

    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ExactKinds;

    fn outcome(kinds: &[u32], has_errors: bool) -> TokenizeOutcome {
        TokenizeOutcome {
            tokens: TokenSequence::from_kinds(kinds.iter().map(|&k| Symbol::new(k))),
            has_errors,
        }
    }

    struct FoldTwoIntoOne;

    impl KindEquivalence for FoldTwoIntoOne {
        fn canonical(&self, kind: Symbol) -> Symbol {
            if kind == Symbol::new(2) {
                Symbol::new(1)
            } else {
                kind
            }
        }
    }

    #[test]
    fn failed_and_base_code_are_not_valid() {
        let mut registry = SubmissionRegistry::new();
        registry
            .register("a", "a", outcome(&[1, 2], false), &ExactKinds)
            .unwrap();
        registry
            .register("broken", "broken", outcome(&[1], true), &ExactKinds)
            .unwrap();
        registry
            .register("template", "template", outcome(&[1, 2], false), &ExactKinds)
            .unwrap();
        registry.designate_base_code("template").unwrap();

        let valid: Vec<&str> = registry.valid().map(Submission::name).collect();
        assert_eq!(valid, vec!["a"]);
        let failed: Vec<&str> = registry.failed().map(Submission::name).collect();
        assert_eq!(failed, vec!["broken"]);
        assert_eq!(registry.base_code().map(Submission::name), Some("template"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = SubmissionRegistry::new();
        registry
            .register("a", "a", outcome(&[1], false), &ExactKinds)
            .unwrap();
        let err = registry
            .register("a", "other", outcome(&[1], false), &ExactKinds)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateSubmission(name) if name == "a"));
    }

    #[test]
    fn base_code_must_exist_and_tokenize() {
        let mut registry = SubmissionRegistry::new();
        registry
            .register("broken", "broken", outcome(&[1], true), &ExactKinds)
            .unwrap();
        assert!(matches!(
            registry.designate_base_code("missing"),
            Err(Error::UnknownBaseCode(_))
        ));
        assert!(matches!(
            registry.designate_base_code("broken"),
            Err(Error::BaseCodeInvalid(_))
        ));
    }

    #[test]
    fn equivalence_is_applied_to_symbols() {
        let mut registry = SubmissionRegistry::new();
        let id = registry
            .register("a", "a", outcome(&[2, 3], false), &FoldTwoIntoOne)
            .unwrap();
        let submission = registry.get(id).unwrap();
        assert_eq!(submission.symbols(), &[Symbol::new(1), Symbol::new(3)]);
        assert_eq!(submission.tokens().tokens()[0].kind, Symbol::new(2));
    }
}
