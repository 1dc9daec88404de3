//! Add, commit, then checkout reproduces every file byte for byte.

mod common;

use std::collections::BTreeMap;
use std::fs;

use proptest::prelude::*;
use sit_engine::CheckoutTarget;

fn file_set() -> impl Strategy<Value = BTreeMap<String, Vec<u8>>> {
    let path = prop::collection::vec("[a-z]{1,6}", 1..4).prop_map(|parts| parts.join("/"));
    prop::collection::btree_map(path, prop::collection::vec(any::<u8>(), 0..256), 1..8)
        .prop_filter("no file may also be a directory", |files| {
            files.keys().all(|a| {
                files
                    .keys()
                    .all(|b| a == b || !b.starts_with(&format!("{a}/")))
            })
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn add_commit_checkout_restores_content(files in file_set()) {
        let (dir, mut repo) = common::repo();
        for (rel, content) in &files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        repo.add(&["."]).unwrap();
        let commit = repo.commit(Some("snapshot"), false).unwrap();

        // Detach onto the commit, which rewrites every tracked file.
        repo.checkout(&CheckoutTarget::Commit(commit.id), None).unwrap();
        for (rel, content) in &files {
            prop_assert_eq!(&fs::read(dir.path().join(rel)).unwrap(), content);
        }
        prop_assert!(repo.status().unwrap().is_clean());
    }
}
