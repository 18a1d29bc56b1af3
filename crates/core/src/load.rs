//! Reading submissions from disk into a [`SubmissionRegistry`].


use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::frontend::{Frontend, SourceFile, TokenizeOutcome};
use crate::submission::SubmissionRegistry;
use crate::types::LoadOptions;

/// Registers every direct child of `root` as one submission.
///
/// `base_code` is either a child of `root` or a separate path; it is registered after the
/// submissions and designated as the run's base code.
pub fn load_submissions(
    root: &Path,
    frontend: &dyn Frontend,
    options: &LoadOptions,
    base_code: Option<&Path>,
) -> Result<SubmissionRegistry> {
    let meta = fs::metadata(root)
        .map_err(|err| io::Error::new(err.kind(), format!("root {}: {err}", root.display())))?;
    if !meta.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("root {} is not a directory", root.display()),
        )
        .into());
    }

    let excluded = read_exclude_file(options.exclude_file.as_deref())?;
    let base_code = base_code
        .map(|path| resolve_base_code(root, path))
        .transpose()?;

    let mut children = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if name.starts_with('.') || options.ignore_dirs.contains(name) || excluded.contains(name) {
            continue;
        }
        if base_code.as_deref() == Some(path.as_path()) {
            continue;
        }
        children.push(path);
    }
    children.sort();
    if frontend.expects_submission_order() {
        children = frontend.customize_submission_order(children);
    }

    let suffixes: Vec<String> = if options.suffixes.is_empty() {
        frontend.suffixes().iter().map(|s| s.to_string()).collect()
    } else {
        options.suffixes.clone()
    };

    let mut registry = SubmissionRegistry::new();
    for path in &children {
        let outcome = load_one(path, frontend, options, &suffixes, &excluded);
        registry.register(submission_name(path), path.clone(), outcome, frontend.equivalence())?;
    }

    if let Some(path) = base_code {
        let name = submission_name(&path);
        let outcome = load_one(&path, frontend, options, &suffixes, &excluded);
        registry.register(name.clone(), path, outcome, frontend.equivalence())?;
        registry.designate_base_code(&name)?;
    }

    info!(
        root = %root.display(),
        frontend = frontend.short_name(),
        submissions = registry.len(),
        failed = registry.failed().count(),
        "submissions loaded"
    );
    Ok(registry)
}

fn resolve_base_code(root: &Path, path: &Path) -> Result<PathBuf> {
    let candidate = if path.is_relative() && root.join(path).exists() {
        root.join(path)
    } else {
        path.to_path_buf()
    };
    if candidate.exists() {
        Ok(candidate)
    } else {
        Err(Error::UnknownBaseCode(path.display().to_string()))
    }
}

fn submission_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| path.display().to_string())
}

/// File names listed one per line; blank lines and `#` comments are ignored.
fn read_exclude_file(path: Option<&Path>) -> Result<HashSet<String>> {
    let Some(path) = path else {
        return Ok(HashSet::new());
    };
    let text = fs::read_to_string(path).map_err(|err| {
        io::Error::new(err.kind(), format!("exclude file {}: {err}", path.display()))
    })?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn has_suffix(path: &Path, suffixes: &[String]) -> bool {
    if suffixes.is_empty() {
        return true;
    }
    let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
        return false;
    };
    suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
}

/// Source files of one submission, relative to `submission`, sorted by path.
fn collect_files(
    submission: &Path,
    options: &LoadOptions,
    suffixes: &[String],
    excluded: &HashSet<String>,
) -> Vec<PathBuf> {
    let keep = |path: &Path| {
        has_suffix(path, suffixes)
            && path
                .file_name()
                .and_then(|s| s.to_str())
                .is_none_or(|name| !excluded.contains(name))
    };

    if submission.is_file() {
        return if keep(submission) {
            vec![PathBuf::new()]
        } else {
            Vec::new()
        };
    }

    let walk_root = match options.subdirectory.as_deref() {
        Some(sub) => submission.join(sub),
        None => submission.to_path_buf(),
    };
    if !walk_root.is_dir() {
        return Vec::new();
    }

    let ignore_dirs = options.ignore_dirs.clone();
    let mut builder = WalkBuilder::new(&walk_root);
    builder
        .hidden(true)
        .follow_links(false)
        .ignore(false)
        .git_ignore(options.respect_gitignore)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .require_git(false);
    let walker = builder
        .filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
            !(is_dir
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| ignore_dirs.contains(name)))
        })
        .build();

    let mut files = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                warn!(submission = %submission.display(), error = %err, "walk error");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) || !keep(entry.path()) {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(submission) {
            files.push(rel.to_path_buf());
        }
    }
    files.sort();
    files
}

fn load_one(
    submission: &Path,
    frontend: &dyn Frontend,
    options: &LoadOptions,
    suffixes: &[String],
    excluded: &HashSet<String>,
) -> TokenizeOutcome {
    let mut sources = Vec::new();
    let mut unreadable = false;
    for rel in collect_files(submission, options, suffixes, excluded) {
        let abs = if rel.as_os_str().is_empty() {
            submission.to_path_buf()
        } else {
            submission.join(&rel)
        };
        match fs::read(&abs) {
            Ok(bytes) => {
                let path = if rel.as_os_str().is_empty() {
                    PathBuf::from(submission_name(submission))
                } else {
                    rel
                };
                sources.push(SourceFile {
                    path,
                    text: String::from_utf8_lossy(&bytes).into_owned(),
                });
            }
            Err(err) => {
                warn!(file = %abs.display(), error = %err, "unreadable source file");
                unreadable = true;
            }
        }
    }

    let mut outcome = frontend.tokenize(&sources);
    if unreadable {
        outcome.has_errors = true;
    }
    if outcome.tokens.significant_len() == 0 {
        warn!(submission = %submission.display(), files = sources.len(), "submission has no tokens");
        outcome.has_errors = true;
    }
    outcome
}
