//! Shared fixtures: test scripts, directory-backed collections, a store without retry delay.
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use transponster::RemoteId;
use transponster::storage::{LocalStore, RetryPolicy};

/// Absolute path of a script under `tests/data/scripts`. Modes are part of the fixture:
/// every script is executable except `not_executable.sh`.
pub fn script(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data/scripts")
        .join(name)
}

/// Whether any execute bit is set on `path`.
pub fn is_executable(path: &Path) -> bool {
    fs::metadata(path).unwrap().permissions().mode() & 0o111 != 0
}

/// Collection directory `<parent>/<name>` holding `1.txt..=n.txt`, each "File number i".
pub fn make_collection(parent: &Path, name: &str, n: usize) -> RemoteId {
    let dir = parent.join(name);
    fs::create_dir_all(&dir).unwrap();
    for i in 1..=n {
        fs::write(dir.join(format!("{i}.txt")), format!("File number {i}")).unwrap();
    }
    RemoteId::new(dir.to_string_lossy().into_owned())
}

/// Empty collection directory `<parent>/<name>`.
pub fn make_empty_collection(parent: &Path, name: &str) -> RemoteId {
    let dir = parent.join(name);
    fs::create_dir_all(&dir).unwrap();
    RemoteId::new(dir.to_string_lossy().into_owned())
}

pub fn fast_store() -> Arc<LocalStore> {
    Arc::new(LocalStore::with_retry(RetryPolicy::new(Duration::ZERO)))
}

/// Sorted file names directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Number of entries directly inside `dir`.
pub fn entry_count(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}
