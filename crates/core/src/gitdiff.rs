//! Changed-file detection against a comparison ref

use anyhow::{Context, Result};
use git2::{Delta, DiffOptions, Repository, Tree};
use serde::Serialize;
use std::path::Path;

/// How the changed set was produced.
///
/// `MergeBase` diffs merge-base(since, HEAD)..HEAD, the right comparison
/// when HEAD diverged from the base branch. `Direct` is the two-ref
/// fallback used when merge-base resolution fails (shallow clones,
/// unrelated histories).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffMethod {
    MergeBase,
    Direct,
}

/// A successful changed-file detection.
#[derive(Debug, Clone)]
pub struct ChangeDetection {
    pub method: DiffMethod,
    /// Forward-slash paths relative to the repo root, sorted, deduplicated.
    pub files: Vec<String>,
}

/// Detect files added/copied/modified/renamed since `since_ref`.
///
/// Tries the merge-base comparison first, then the direct two-ref diff.
/// An `Err` means both methods failed; the caller is expected to downgrade
/// to a full scan with a visible warning rather than proceed with an
/// empty changed set.
pub fn detect_changed_files(root: &Path, since_ref: &str) -> Result<ChangeDetection> {
    let repo = Repository::open(root).context("opening git repository")?;

    match merge_base_diff(&repo, since_ref) {
        Ok(files) => Ok(ChangeDetection {
            method: DiffMethod::MergeBase,
            files,
        }),
        Err(_) => {
            let files = direct_diff(&repo, since_ref)
                .with_context(|| format!("diffing against '{}'", since_ref))?;
            Ok(ChangeDetection {
                method: DiffMethod::Direct,
                files,
            })
        }
    }
}

fn merge_base_diff(repo: &Repository, since_ref: &str) -> Result<Vec<String>> {
    let since = repo.revparse_single(since_ref)?.peel_to_commit()?;
    let head = repo.head()?.peel_to_commit()?;
    let base_oid = repo.merge_base(since.id(), head.id())?;
    let base_tree = repo.find_commit(base_oid)?.tree()?;
    diff_trees(repo, &base_tree, &head.tree()?)
}

fn direct_diff(repo: &Repository, since_ref: &str) -> Result<Vec<String>> {
    let since_tree = repo.revparse_single(since_ref)?.peel_to_commit()?.tree()?;
    let head_tree = repo.head()?.peel_to_commit()?.tree()?;
    diff_trees(repo, &since_tree, &head_tree)
}

fn diff_trees(repo: &Repository, base: &Tree, head: &Tree) -> Result<Vec<String>> {
    let mut opts = DiffOptions::new();
    opts.ignore_whitespace(false);

    let diff = repo.diff_tree_to_tree(Some(base), Some(head), Some(&mut opts))?;

    let mut files = Vec::new();
    diff.foreach(
        &mut |delta, _progress| {
            // ACMR: additions, copies, modifications, renames. Deletions
            // have nothing left to analyze.
            let relevant = matches!(
                delta.status(),
                Delta::Added | Delta::Copied | Delta::Modified | Delta::Renamed
            );
            if relevant {
                if let Some(path) = delta.new_file().path() {
                    let s = path.to_string_lossy().into_owned();
                    if !s.is_empty() {
                        files.push(s);
                    }
                }
            }
            true
        },
        None,
        None,
        None,
    )?;

    files.sort();
    files.dedup();
    Ok(files)
}
