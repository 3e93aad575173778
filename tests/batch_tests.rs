//! Batch scratch lifecycle, item state rules, failure records and the report.

mod common;

use std::fs;
use std::path::Path;

use transponster::RemoteId;
use transponster::pipeline::{Batch, FailureKind, FailureRecord, Item, ItemError, render_report};

use common::{fast_store, make_collection, make_empty_collection};

// --- Batch ---

#[test]
fn test_new_batch_creates_scratch_tree() {
    let scratch = tempfile::tempdir().unwrap();
    let batch = Batch::new(3, Some(scratch.path())).unwrap();

    assert_eq!(batch.id(), 3);
    assert!(batch.root().starts_with(scratch.path()));
    assert!(batch.input_path().is_dir());
    assert!(batch.output_path().is_dir());
    assert_eq!(batch.input_path(), batch.root().join("input"));
    assert_eq!(batch.output_path(), batch.root().join("output"));
    let name = batch.root().file_name().unwrap().to_string_lossy();
    assert!(name.starts_with("transponster-"));
}

#[test]
fn test_batches_get_distinct_roots() {
    let scratch = tempfile::tempdir().unwrap();
    let a = Batch::new(0, Some(scratch.path())).unwrap();
    let b = Batch::new(0, Some(scratch.path())).unwrap();
    assert_ne!(a.root(), b.root());
}

#[test]
fn test_new_batch_in_missing_location_fails() {
    let scratch = tempfile::tempdir().unwrap();
    let missing = scratch.path().join("does/not/exist");
    assert!(Batch::new(0, Some(&missing)).is_err());
}

#[test]
fn test_add_input_is_remote_only() {
    let scratch = tempfile::tempdir().unwrap();
    let mut batch = Batch::new(0, Some(scratch.path())).unwrap();
    batch.add_input(RemoteId::new("/zone/home/datafiles/2.txt"));

    assert_eq!(batch.inputs().len(), 1);
    let item = &batch.inputs()[0];
    assert_eq!(item.local_name, "2.txt");
    assert_eq!(item.local_dir, batch.input_path());
    assert!(!item.has_local_copy());
    assert!(item.has_remote_copy());
}

#[test]
fn test_collect_outputs_lists_every_file() {
    let scratch = tempfile::tempdir().unwrap();
    let batch = Batch::new(0, Some(scratch.path())).unwrap();
    for i in 0..16 {
        fs::write(batch.output_path().join(format!("file-{i}.txt")), "").unwrap();
    }
    let destination = RemoteId::new("/zone/home/outputs");

    let outputs = batch.collect_outputs(&destination).unwrap();

    assert_eq!(outputs.len(), 16);
    let mut expected: Vec<String> = (0..16).map(|i| format!("file-{i}.txt")).collect();
    for output in &outputs {
        assert!(output.has_local_copy());
        assert!(!output.has_remote_copy());
        assert_eq!(output.local_dir, batch.output_path());
        assert_eq!(output.remote, destination.join(&output.local_name));
        let pos = expected.iter().position(|n| *n == output.local_name).unwrap();
        expected.remove(pos);
    }
    assert!(expected.is_empty());
    // Read-only: files are still there.
    assert_eq!(fs::read_dir(batch.output_path()).unwrap().count(), 16);
}

#[test]
fn test_collect_outputs_descends_into_subdirectories() {
    let scratch = tempfile::tempdir().unwrap();
    let batch = Batch::new(0, Some(scratch.path())).unwrap();
    let nested = batch.output_path().join("nested");
    fs::create_dir(&nested).unwrap();
    fs::write(nested.join("deep.txt"), "x").unwrap();
    fs::write(batch.output_path().join("top.txt"), "y").unwrap();

    let outputs = batch.collect_outputs(&RemoteId::new("out")).unwrap();

    assert_eq!(outputs.len(), 2);
    let deep = outputs.iter().find(|i| i.local_name == "deep.txt").unwrap();
    assert_eq!(deep.local_dir, nested);
    assert_eq!(deep.remote, RemoteId::new("out/deep.txt"));
}

#[test]
fn test_collect_outputs_rejects_shared_base_names() {
    let scratch = tempfile::tempdir().unwrap();
    let batch = Batch::new(0, Some(scratch.path())).unwrap();
    for sub in ["a", "b"] {
        let dir = batch.output_path().join(sub);
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("r.txt"), sub).unwrap();
    }

    let err = batch.collect_outputs(&RemoteId::new("out")).unwrap_err();

    assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);
    assert!(err.to_string().contains("out/r.txt"));
}

#[test]
fn test_cleanup_removes_scratch_tree() {
    let scratch = tempfile::tempdir().unwrap();
    let batch = Batch::new(0, Some(scratch.path())).unwrap();
    for i in 0..5 {
        fs::write(batch.input_path().join(format!("f{i}.txt")), "").unwrap();
        fs::write(batch.output_path().join(format!("f{i}.txt")), "").unwrap();
    }
    let root = batch.root().to_path_buf();

    batch.cleanup().unwrap();

    assert!(!root.exists());
}

// --- Item ---

#[test]
fn test_remove_local_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("to_delete.txt");
    fs::write(&path, "").unwrap();
    let mut item = Item::local_only(RemoteId::new("x/to_delete.txt"), "to_delete.txt", dir.path());

    item.remove_local().unwrap();

    assert!(!item.has_local_copy());
    assert!(!path.exists());
    assert!(matches!(item.remove_local(), Err(ItemError::NotLocal(_))));
}

#[test]
fn test_download_then_download_again_fails() {
    let remote = tempfile::tempdir().unwrap();
    let collection = make_collection(remote.path(), "datafiles", 2);
    let local = tempfile::tempdir().unwrap();
    let store = fast_store();
    let mut item = Item::remote_only(collection.join("2.txt"), local.path());

    item.download(store.as_ref(), 5).unwrap();

    assert!(item.has_local_copy());
    assert!(item.has_remote_copy());
    assert_eq!(fs::read_to_string(item.local_path()).unwrap(), "File number 2");
    assert!(matches!(
        item.download(store.as_ref(), 5),
        Err(ItemError::AlreadyLocal(_))
    ));
    // Local and remote: uploading again is refused too.
    assert!(matches!(
        item.upload(store.as_ref(), 5),
        Err(ItemError::AlreadyRemote(_))
    ));
}

#[test]
fn test_download_refuses_to_clobber_same_named_input() {
    let remote = tempfile::tempdir().unwrap();
    let first = make_collection(remote.path(), "a", 1);
    let second = make_collection(remote.path(), "b", 1);
    fs::write(Path::new(second.as_str()).join("1.txt"), "OTHER").unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let mut batch = Batch::new(0, Some(scratch.path())).unwrap();
    batch.add_input(first.join("1.txt"));
    batch.add_input(second.join("1.txt"));
    let store = fast_store();

    let items = batch.inputs_mut();
    items[0].download(store.as_ref(), 1).unwrap();
    let err = items[1].download(store.as_ref(), 1).unwrap_err();

    assert!(matches!(err, ItemError::AlreadyLocal(_)));
    assert!(!items[1].has_local_copy());
    assert_eq!(
        fs::read_to_string(items[0].local_path()).unwrap(),
        "File number 1"
    );
}

#[test]
fn test_remote_only_item_cannot_be_uploaded_or_removed() {
    let local = tempfile::tempdir().unwrap();
    let store = fast_store();
    let mut item = Item::remote_only(RemoteId::new("/nowhere/a.txt"), local.path());

    assert!(item.upload(store.as_ref(), 1).is_err());
    assert!(matches!(item.remove_local(), Err(ItemError::NotLocal(_))));
    assert!(!item.has_local_copy());
}

#[test]
fn test_upload_then_upload_again_fails() {
    let remote = tempfile::tempdir().unwrap();
    let destination = make_empty_collection(remote.path(), "outputs");
    let local = tempfile::tempdir().unwrap();
    fs::write(local.path().join("2.txt"), "File number 2").unwrap();
    let store = fast_store();
    let mut item = Item::local_only(destination.join("destination.txt"), "2.txt", local.path());

    item.upload(store.as_ref(), 5).unwrap();

    assert!(item.has_remote_copy());
    let uploaded = Path::new(destination.as_str()).join("destination.txt");
    assert_eq!(fs::read_to_string(uploaded).unwrap(), "File number 2");
    assert!(matches!(
        item.upload(store.as_ref(), 5),
        Err(ItemError::AlreadyRemote(_))
    ));
}

#[test]
fn test_upload_missing_local_file_fails() {
    let remote = tempfile::tempdir().unwrap();
    let destination = make_empty_collection(remote.path(), "outputs");
    let store = fast_store();
    let mut item = Item::local_only(
        destination.join("doesnotexist"),
        "doesnotexist",
        Path::new("/definitelydoesntexist"),
    );

    assert!(matches!(
        item.upload(store.as_ref(), 2),
        Err(ItemError::Store(_))
    ));
    assert!(!item.has_remote_copy());
}

#[test]
fn test_upload_after_local_removal_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("x"), "").unwrap();
    let store = fast_store();
    let mut item = Item::local_only(RemoteId::new("doesntmatter/x"), "x", dir.path());
    item.remove_local().unwrap();

    assert!(matches!(
        item.upload(store.as_ref(), 1),
        Err(ItemError::NotLocal(_))
    ));
}

// --- FailureRecord / report ---

#[test]
fn test_failure_record_lists_inputs_and_cleans_up() {
    let scratch = tempfile::tempdir().unwrap();
    let mut batch = Batch::new(7, Some(scratch.path())).unwrap();
    let inputs = vec![RemoteId::new("/c/1.txt"), RemoteId::new("/c/2.txt")];
    for id in &inputs {
        batch.add_input(id.clone());
    }
    fs::write(batch.output_path().join("partial.txt"), "").unwrap();
    let root = batch.root().to_path_buf();

    let failure = FailureRecord::new(batch, FailureKind::TransformFailed, "exit status: 1");

    assert_eq!(failure.batch_id(), 7);
    assert_eq!(failure.kind(), FailureKind::TransformFailed);
    assert_eq!(failure.input_identities(), inputs.as_slice());
    assert!(failure.message().contains("exit status: 1"));
    assert_eq!(failure.scratch_root(), Some(root.as_path()));
    assert!(root.exists());

    failure.cleanup().unwrap();
    assert!(!root.exists());
}

#[test]
fn test_report_is_none_for_clean_run() {
    assert!(render_report(&[]).is_none());
}

#[test]
fn test_report_lists_each_failure_and_count() {
    let a = FailureRecord::without_batch(
        0,
        vec![RemoteId::new("/c/7.txt")],
        FailureKind::ScratchCreationFailed,
        "disk full",
    );
    let b = FailureRecord::without_batch(
        1,
        vec![RemoteId::new("/c/13.txt"), RemoteId::new("/c/14.txt")],
        FailureKind::UploadFailed,
        "timeout",
    );

    let report = render_report(&[a, b]).unwrap();

    assert!(report.contains(FailureKind::ScratchCreationFailed.message()));
    assert!(report.contains(FailureKind::UploadFailed.message()));
    assert!(report.contains("\t\t/c/7.txt\n"));
    assert!(report.contains("\t\t/c/13.txt\n"));
    assert!(report.contains("\t\t/c/14.txt\n"));
    assert!(report.ends_with("2 batches failed"));
}
