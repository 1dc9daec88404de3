#![allow(dead_code)]

use std::fs;
use std::path::Path;

use sit_engine::Repository;
use tempfile::TempDir;

/// A fresh repository with an identity configured.
pub fn repo() -> (TempDir, Repository) {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = Repository::init(dir.path()).unwrap();
    repo.config_set("user.name", "Test User").unwrap();
    repo.config_set("user.email", "test@example.com").unwrap();
    (dir, repo)
}

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

pub fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}
