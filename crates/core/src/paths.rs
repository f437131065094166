//! Repo-root discovery and path normalization shared by every component

use std::path::{Component, Path, PathBuf};

/// Walk ancestors looking for a `.git` entry (directory or worktree file).
/// Falls back to the canonicalized start directory when none is found.
pub fn find_repo_root(start: &Path) -> PathBuf {
    let start = std::fs::canonicalize(start).unwrap_or_else(|_| start.to_path_buf());
    let mut current: &Path = &start;
    loop {
        if current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return start,
        }
    }
}

/// Forward-slash string form of a path.
pub fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            Component::CurDir => None,
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalize `path` to forward-slash form relative to `root`.
/// Paths already relative are returned in forward-slash form unchanged.
pub fn normalize_rel(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    to_forward_slashes(rel)
}

/// Lexically normalize a forward-slash path: resolves `.` and `..`
/// segments without touching the filesystem. Used for import-specifier
/// resolution where the target may not exist yet.
pub fn lexical_normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    // Keep leading ".." segments for paths escaping the root
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rel_strips_root() {
        let root = Path::new("/repo");
        assert_eq!(
            normalize_rel(root, Path::new("/repo/src/app.css")),
            "src/app.css"
        );
        assert_eq!(normalize_rel(root, Path::new("src/app.css")), "src/app.css");
    }

    #[test]
    fn lexical_normalize_resolves_dots() {
        assert_eq!(lexical_normalize("src/./a/../b.css"), "src/b.css");
        assert_eq!(lexical_normalize("a/b/../../c"), "c");
        assert_eq!(lexical_normalize("../shared/x.css"), "../shared/x.css");
    }
}
