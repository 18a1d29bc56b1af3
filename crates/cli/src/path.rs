use std::env;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Absolute form of the submissions root; canonical when it exists.
pub(crate) fn resolve_path(p: &Path) -> io::Result<PathBuf> {
    let joined = if p.is_absolute() {
        p.to_path_buf()
    } else {
        env::current_dir()?.join(p)
    };
    let normalized = normalize_path(&joined);
    Ok(fs::canonicalize(&normalized).unwrap_or(normalized))
}

/// Folds `.` and `..` lexically. `..` never climbs above the root or a prefix.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                out.push(component.as_os_str());
                depth = 0;
            }
            Component::CurDir => {}
            Component::ParentDir if depth > 0 => {
                out.pop();
                depth -= 1;
            }
            Component::ParentDir => {
                if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
        }
    }
    out
}
