//! Tests for OrgStore: atomic writes, backups, retention, failure recovery

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use orgctl::config::Settings;
use orgctl::domain::OrgUnit;
use orgctl::infrastructure::store::OrgStore;
use orgctl::infrastructure::traits::{FileSystem, RealFileSystem};

/// Filesystem whose atomic replace always fails; everything else delegates.
struct FailingReplaceFs(RealFileSystem);

impl FileSystem for FailingReplaceFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.0.read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        self.0.write(path, content)
    }

    fn atomic_replace(&self, _path: &Path, _content: &str) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "disk full"))
    }

    fn exists(&self, path: &Path) -> bool {
        self.0.exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.0.create_dir_all(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        self.0.copy(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.0.remove_file(path)
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        self.0.list_dir(path)
    }
}

fn settings(temp: &TempDir, retention: usize) -> Settings {
    Settings {
        data_dir: temp.path().join("data"),
        backup_dir: temp.path().join("backups"),
        type_rules_file: temp.path().join("type_rules.json"),
        thresholds_file: temp.path().join("thresholds.json"),
        metrics_file: temp.path().join("metrics.json"),
        backup_retention: retention,
    }
}

fn store(temp: &TempDir, retention: usize) -> OrgStore {
    OrgStore::new(Arc::new(RealFileSystem), &settings(temp, retention))
}

fn root(name: &str) -> OrgUnit {
    OrgUnit {
        id: "group".to_string(),
        name: name.to_string(),
        unit_type: "koncern".to_string(),
        cost_center: "0001".to_string(),
        manager: None,
        children: Vec::new(),
    }
}

#[test]
fn given_written_document_when_reading_then_roundtrips() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp, 10);
    let tree = root("Group AB");

    store.write(&tree).unwrap();
    let read_back = store.read().unwrap();

    assert_eq!(read_back, tree);
}

#[test]
fn given_first_write_when_writing_then_no_backup_created() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp, 10);

    store.write(&root("Group AB")).unwrap();

    assert_eq!(store.list_backups().unwrap().len(), 0);
}

#[test]
fn given_existing_document_when_writing_then_backup_of_previous_version_exists() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let store = store(&temp, 10);
    store.write(&root("v1")).unwrap();
    thread::sleep(Duration::from_millis(5));

    // Act
    store.write(&root("v2")).unwrap();

    // Assert - the backup holds the pre-write version
    let backups = store.list_backups().unwrap();
    assert_eq!(backups.len(), 1);
    let content =
        std::fs::read_to_string(temp.path().join("backups").join(&backups[0])).unwrap();
    assert!(content.contains("v1"));
    assert_eq!(store.read().unwrap().name, "v2");
}

#[test]
fn given_more_writes_than_retention_when_writing_then_oldest_backups_pruned() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp, 2);

    for version in 0..5 {
        store.write(&root(&format!("v{version}"))).unwrap();
        thread::sleep(Duration::from_millis(5));
    }

    let backups = store.list_backups().unwrap();
    assert_eq!(backups.len(), 2);
    // Newest first; the most recent backup holds the next-to-last version
    let newest =
        std::fs::read_to_string(temp.path().join("backups").join(&backups[0])).unwrap();
    assert!(newest.contains("v3"));
}

#[test]
fn given_existing_document_when_snapshotting_then_manual_backup_listed() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp, 10);
    store.write(&root("Group AB")).unwrap();

    let path = store.create_snapshot().unwrap();

    assert!(path.exists());
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .contains("manual"));
    assert_eq!(store.list_backups().unwrap().len(), 1);
}

#[test]
fn given_no_document_when_snapshotting_then_error() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp, 10);

    assert!(store.create_snapshot().is_err());
}

#[test]
fn given_root_without_id_when_writing_then_refused_and_document_untouched() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let store = store(&temp, 10);
    store.write(&root("v1")).unwrap();

    // Act
    let mut broken = root("v2");
    broken.id = String::new();
    let result = store.write(&broken);

    // Assert
    assert!(result.is_err());
    assert_eq!(store.read().unwrap().name, "v1");
}

#[test]
fn given_failing_replace_when_writing_then_error_and_previous_document_survives() {
    // Arrange - a healthy store persists v1 first
    let temp = TempDir::new().unwrap();
    let healthy = store(&temp, 10);
    healthy.write(&root("v1")).unwrap();
    let failing = OrgStore::new(
        Arc::new(FailingReplaceFs(RealFileSystem)),
        &settings(&temp, 10),
    );

    // Act
    let result = failing.write(&root("v2"));

    // Assert - the error surfaces and the stored document is still v1
    assert!(result.is_err());
    assert_eq!(healthy.read().unwrap().name, "v1");
}

#[test]
fn given_no_backup_dir_when_listing_backups_then_empty() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp, 10);

    assert!(store.list_backups().unwrap().is_empty());
}
