use git2::{Repository, Signature};
use std::path::Path;
use styleguard_core::{detect_changed_files, DiffMethod};
use tempfile::TempDir;

fn sig() -> Signature<'static> {
    Signature::now("test", "test@example.com").unwrap()
}

fn commit_worktree(repo: &Repository, msg: &str) -> git2::Oid {
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let parents: Vec<git2::Commit> = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => vec![],
    };
    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

    repo.commit(Some("HEAD"), &sig(), &sig(), msg, &tree, &parent_refs)
        .unwrap()
}

fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

#[test]
fn test_merge_base_diff_detects_changes() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let repo = Repository::init(root).unwrap();

    write_file(root, "a.css", ".a { color: red; }\n");
    let first = commit_worktree(&repo, "initial");

    write_file(root, "a.css", ".a { color: blue; }\n");
    write_file(root, "b.css", ".b { color: green; }\n");
    commit_worktree(&repo, "second");

    let detection = detect_changed_files(root, &first.to_string()).unwrap();
    assert_eq!(detection.method, DiffMethod::MergeBase);
    assert_eq!(detection.files, vec!["a.css", "b.css"]);
}

#[test]
fn test_merge_base_ignores_divergent_base_branch() {
    // main advances past the branch point; only the feature branch's own
    // change must be reported (triple-dot semantics).
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let repo = Repository::init(root).unwrap();

    write_file(root, "a.css", ".a { color: red; }\n");
    let branch_point = commit_worktree(&repo, "initial");
    let main_ref = repo.head().unwrap().name().unwrap().to_string();

    write_file(root, "main-only.css", ".m { color: black; }\n");
    commit_worktree(&repo, "main moves on");

    // Build the feature commit off the branch point without touching the
    // worktree: base tree + one new blob.
    let base_commit = repo.find_commit(branch_point).unwrap();
    let base_tree = base_commit.tree().unwrap();
    let blob = repo.blob(b".c { color: teal; }\n").unwrap();
    let mut builder = repo.treebuilder(Some(&base_tree)).unwrap();
    builder.insert("c.css", blob, 0o100644).unwrap();
    let feature_tree = repo.find_tree(builder.write().unwrap()).unwrap();
    repo.commit(
        Some("refs/heads/feature"),
        &sig(),
        &sig(),
        "feature work",
        &feature_tree,
        &[&base_commit],
    )
    .unwrap();
    repo.set_head("refs/heads/feature").unwrap();

    let detection = detect_changed_files(root, &main_ref).unwrap();
    assert_eq!(detection.method, DiffMethod::MergeBase);
    assert_eq!(detection.files, vec!["c.css"]);
}

#[test]
fn test_direct_fallback_when_merge_base_fails() {
    // An orphan commit shares no history with HEAD: merge-base resolution
    // fails and the direct two-ref diff takes over.
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let repo = Repository::init(root).unwrap();

    write_file(root, "a.css", ".a { color: red; }\n");
    commit_worktree(&repo, "initial");

    let empty_tree_id = repo.treebuilder(None).unwrap().write().unwrap();
    let empty_tree = repo.find_tree(empty_tree_id).unwrap();
    let orphan = repo
        .commit(None, &sig(), &sig(), "orphan", &empty_tree, &[])
        .unwrap();

    let detection = detect_changed_files(root, &orphan.to_string()).unwrap();
    assert_eq!(detection.method, DiffMethod::Direct);
    assert_eq!(detection.files, vec!["a.css"]);
}

#[test]
fn test_unresolvable_ref_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let repo = Repository::init(root).unwrap();

    write_file(root, "a.css", ".a { color: red; }\n");
    commit_worktree(&repo, "initial");

    assert!(detect_changed_files(root, "no-such-ref").is_err());
}

#[test]
fn test_deletions_are_not_reported() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    let repo = Repository::init(root).unwrap();

    write_file(root, "a.css", ".a { color: red; }\n");
    write_file(root, "b.css", ".b { color: blue; }\n");
    let first = commit_worktree(&repo, "initial");

    std::fs::remove_file(root.join("b.css")).unwrap();
    let mut index = repo.index().unwrap();
    index.remove_path(Path::new("b.css")).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let parent = repo.head().unwrap().peel_to_commit().unwrap();
    repo.commit(Some("HEAD"), &sig(), &sig(), "delete b", &tree, &[&parent])
        .unwrap();

    let detection = detect_changed_files(root, &first.to_string()).unwrap();
    assert!(detection.files.is_empty());
}
