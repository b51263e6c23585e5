//! Exercises the reconciler walking a real temp directory tree together
//! with a real glob-based exclude filter - the reconciler's own unit tests
//! use a bare `ExcludeFilter`, but constructing the filter from the same
//! default patterns the collector config ships is worth its own check.

use cctop::config::default_exclude_patterns;
use cctop::exclude::ExcludeFilter;
use cctop::model::EventKind;
use cctop::reconciler::{reconcile, ActiveFileSet};
use std::fs;
use tempfile::TempDir;

#[test]
fn default_exclude_patterns_skip_git_and_node_modules() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    fs::write(root.join("main.rs"), b"fn main() {}").unwrap();
    fs::create_dir_all(root.join(".git")).unwrap();
    fs::write(root.join(".git").join("HEAD"), b"ref: refs/heads/main").unwrap();
    fs::create_dir_all(root.join("node_modules").join("left-pad")).unwrap();
    fs::write(root.join("node_modules").join("left-pad").join("index.js"), b"module.exports = {}").unwrap();

    let exclude = ExcludeFilter::new(&default_exclude_patterns());
    let previously_active = ActiveFileSet::new();
    let events = reconcile(root, None, &exclude, &previously_active, 1_000).unwrap();

    assert_eq!(events.len(), 1, "only main.rs should be found: {events:?}");
    assert_eq!(events[0].kind, EventKind::Find);
    assert!(events[0].path.ends_with("main.rs"));
}

#[test]
fn vanished_file_emits_delete_on_second_reconcile() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    let doomed = root.join("doomed.txt");
    fs::write(&doomed, b"temporary").unwrap();

    let exclude = ExcludeFilter::new(&default_exclude_patterns());
    let empty = ActiveFileSet::new();
    let first_pass = reconcile(root, None, &exclude, &empty, 1_000).unwrap();
    assert_eq!(first_pass.len(), 1);
    assert_eq!(first_pass[0].kind, EventKind::Find);

    let mut active = ActiveFileSet::new();
    active.insert(first_pass[0].inode, doomed.clone());

    fs::remove_file(&doomed).unwrap();
    let second_pass = reconcile(root, None, &exclude, &active, 2_000).unwrap();

    assert_eq!(second_pass.len(), 1);
    assert_eq!(second_pass[0].kind, EventKind::Delete);
}
