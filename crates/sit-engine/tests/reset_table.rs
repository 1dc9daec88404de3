//! Every row of the reset table, soft and hard.

mod common;

use std::path::Path;

use sit_crypto::ContentHasher;
use sit_engine::{CommitId, EngineError, Repository, ResetKind};

use common::{read, repo, write};

/// Commit `a.txt = "committed"`, then stage the given change on top.
fn setup(stage: impl FnOnce(&Path, &mut Repository)) -> (tempfile::TempDir, Repository, CommitId) {
    let (dir, mut repo) = repo();
    write(dir.path(), "a.txt", "committed");
    repo.add(&["a.txt"]).unwrap();
    let head = repo.commit(Some("base"), false).unwrap().id;
    stage(dir.path(), &mut repo);
    (dir, repo, head)
}

#[test]
fn in_commit_not_in_index_reinserts() {
    let (dir, mut repo, head) = setup(|_, repo| {
        repo.rm(&["a.txt"]).unwrap();
    });
    write(dir.path(), "a.txt", "local edit");

    let actions = repo.reset(&head, false).unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].kind, ResetKind::Restage);
    assert_eq!(repo.index().get("a.txt"), Some(&ContentHasher::hash(b"committed")));
    assert_eq!(read(dir.path(), "a.txt"), "local edit");

    repo.rm(&["a.txt"]).unwrap();
    repo.reset(&head, true).unwrap();
    assert_eq!(read(dir.path(), "a.txt"), "committed");
}

#[test]
fn in_index_not_in_commit_removes() {
    let (dir, mut repo, head) = setup(|root, repo| {
        write(root, "new/b.txt", "new");
        repo.add(&["new"]).unwrap();
    });

    let actions = repo.reset(&head, false).unwrap();
    let b = actions.iter().find(|a| a.path == "new/b.txt").unwrap();
    assert_eq!(b.kind, ResetKind::Unstage);
    assert_eq!(b.new, None);
    assert!(repo.index().get("new/b.txt").is_none());
    assert!(dir.path().join("new/b.txt").is_file());

    repo.add(&["new"]).unwrap();
    repo.reset(&head, true).unwrap();
    assert!(!dir.path().join("new/b.txt").exists());
    assert!(!dir.path().join("new").exists());
}

#[test]
fn in_both_replaces_with_commit_blob() {
    let (dir, mut repo, head) = setup(|root, repo| {
        write(root, "a.txt", "staged edit");
        repo.add(&["a.txt"]).unwrap();
    });

    let actions = repo.reset(&head, false).unwrap();
    assert_eq!(actions[0].kind, ResetKind::Replace);
    assert!(actions[0].is_change());
    assert_eq!(repo.index().get("a.txt"), Some(&ContentHasher::hash(b"committed")));
    assert_eq!(read(dir.path(), "a.txt"), "staged edit");

    repo.add(&["a.txt"]).unwrap();
    repo.reset(&head, true).unwrap();
    assert_eq!(read(dir.path(), "a.txt"), "committed");
    assert!(repo.status().unwrap().is_clean());
}

#[test]
fn in_neither_is_untracked_error() {
    let (_dir, mut repo, head) = setup(|_, _| {});
    let before = repo.index().snapshot();
    let err = repo.reset_path(&head, Path::new("missing.txt")).unwrap_err();
    assert!(matches!(err, EngineError::Untracked(ref p) if p == "missing.txt"));
    assert!(!err.is_fatal());
    assert_eq!(repo.index().snapshot(), before);
}

#[test]
fn path_scoped_reset_leaves_other_paths() {
    let (dir, mut repo, head) = setup(|root, repo| {
        write(root, "a.txt", "staged edit");
        write(root, "dir/x", "x");
        repo.add(&["a.txt", "dir"]).unwrap();
    });

    let actions = repo.reset_path(&head, Path::new("dir")).unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].kind, ResetKind::Unstage);
    assert_eq!(repo.index().get("a.txt"), Some(&ContentHasher::hash(b"staged edit")));
    assert!(dir.path().join("dir/x").is_file());
    assert_eq!(repo.head_commit().unwrap(), head);
}

#[test]
fn whole_reset_moves_branch_or_detached_head() {
    let (dir, mut repo, first) = setup(|_, _| {});
    write(dir.path(), "a.txt", "second");
    repo.add(&["a.txt"]).unwrap();
    let second = repo.commit(Some("second"), false).unwrap().id;

    repo.reset(&first, false).unwrap();
    assert_eq!(branch_tip(&repo, "master"), Some(first));

    repo.reset(&second, true).unwrap();
    let target = repo.checkout_target(&first.to_hex()).unwrap();
    repo.checkout(&target, None).unwrap();
    repo.reset(&second, true).unwrap();
    assert!(repo.head().unwrap().is_detached());
    assert_eq!(repo.head_commit().unwrap(), second);
    assert_eq!(branch_tip(&repo, "master"), Some(second));
}

fn branch_tip(repo: &Repository, name: &str) -> Option<CommitId> {
    repo.branches()
        .unwrap()
        .into_iter()
        .find(|(n, _)| n == name)
        .map(|(_, id)| id)
}
