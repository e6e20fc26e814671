//! JSON document store for the organization tree
//!
//! The tree is checked out whole, mutated in memory, and checked back in
//! whole. Writes make a timestamped backup of the current document first,
//! replace atomically (temp file + rename), and keep the newest
//! `retention` backups. A failed write restores the pre-write backup
//! best-effort before the error surfaces, so the stored document stays
//! unchanged.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tracing::{debug, warn};

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::Settings;
use crate::domain::{MetricsDocument, OrgUnit};
use crate::infrastructure::traits::FileSystem;

const DOCUMENT_PREFIX: &str = "organization.";
const DOCUMENT_SUFFIX: &str = ".json";

/// File-backed store for the organization document.
pub struct OrgStore {
    fs: Arc<dyn FileSystem>,
    data_file: PathBuf,
    backup_dir: PathBuf,
    retention: usize,
}

impl OrgStore {
    pub fn new(fs: Arc<dyn FileSystem>, settings: &Settings) -> Self {
        Self {
            fs,
            data_file: settings.organization_file(),
            backup_dir: settings.backup_dir.clone(),
            retention: settings.backup_retention,
        }
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    /// Read the last successfully written document.
    pub fn read(&self) -> ApplicationResult<OrgUnit> {
        let content = self.fs.read_to_string(&self.data_file).map_err(|e| {
            ApplicationError::persistence(
                format!("read {}", self.data_file.display()),
                e,
            )
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ApplicationError::persistence(
                format!("parse {}", self.data_file.display()),
                e,
            )
        })
    }

    /// Atomically replace the document, with a pre-write backup and bounded
    /// backup retention.
    pub fn write(&self, root: &OrgUnit) -> ApplicationResult<()> {
        if root.id.is_empty() || root.cost_center.is_empty() {
            return Err(ApplicationError::config(
                "refusing to persist a document without root id and cost center",
            ));
        }

        if let Some(data_dir) = self.data_file.parent() {
            self.fs.create_dir_all(data_dir).map_err(|e| {
                ApplicationError::persistence(
                    format!("create data dir {}", data_dir.display()),
                    e,
                )
            })?;
        }
        self.fs.create_dir_all(&self.backup_dir).map_err(|e| {
            ApplicationError::persistence(
                format!("create backup dir {}", self.backup_dir.display()),
                e,
            )
        })?;

        let backup_path = self.backup_path(&format!("{}{}", timestamp(), DOCUMENT_SUFFIX));
        let mut backed_up = false;
        if self.fs.exists(&self.data_file) {
            self.fs.copy(&self.data_file, &backup_path).map_err(|e| {
                ApplicationError::persistence(
                    format!("backup to {}", backup_path.display()),
                    e,
                )
            })?;
            backed_up = true;
            debug!("backup created: {}", backup_path.display());
        }

        let content = serde_json::to_string_pretty(root).map_err(|e| {
            ApplicationError::persistence("serialize organization document", e)
        })?;

        if let Err(e) = self.fs.atomic_replace(&self.data_file, &content) {
            if backed_up {
                if let Err(restore_err) = self.fs.copy(&backup_path, &self.data_file) {
                    warn!("failed to restore pre-write backup: {restore_err}");
                }
            }
            return Err(ApplicationError::persistence(
                format!("write {}", self.data_file.display()),
                e,
            ));
        }
        debug!("organization document written: {}", self.data_file.display());

        self.prune_backups();
        Ok(())
    }

    /// Out-of-band manual snapshot of the current document.
    pub fn create_snapshot(&self) -> ApplicationResult<PathBuf> {
        if !self.fs.exists(&self.data_file) {
            return Err(ApplicationError::config(format!(
                "organization document does not exist: {}",
                self.data_file.display()
            )));
        }
        self.fs.create_dir_all(&self.backup_dir).map_err(|e| {
            ApplicationError::persistence(
                format!("create backup dir {}", self.backup_dir.display()),
                e,
            )
        })?;
        let path = self.backup_path(&format!("manual.{}{}", timestamp(), DOCUMENT_SUFFIX));
        self.fs.copy(&self.data_file, &path).map_err(|e| {
            ApplicationError::persistence(format!("snapshot to {}", path.display()), e)
        })?;
        Ok(path)
    }

    /// All backups, newest first.
    pub fn list_backups(&self) -> ApplicationResult<Vec<String>> {
        if !self.fs.exists(&self.backup_dir) {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = self
            .fs
            .list_dir(&self.backup_dir)
            .map_err(|e| {
                ApplicationError::persistence(
                    format!("list {}", self.backup_dir.display()),
                    e,
                )
            })?
            .into_iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .filter(|n| n.starts_with(DOCUMENT_PREFIX) && n.ends_with(DOCUMENT_SUFFIX))
            .collect();
        names.sort();
        names.reverse();
        Ok(names)
    }

    /// Read the external metrics map for the dashboard half.
    pub fn read_metrics(&self, path: &Path) -> ApplicationResult<MetricsDocument> {
        let content = self.fs.read_to_string(path).map_err(|e| {
            ApplicationError::persistence(format!("read metrics {}", path.display()), e)
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ApplicationError::persistence(format!("parse metrics {}", path.display()), e)
        })
    }

    fn backup_path(&self, name: &str) -> PathBuf {
        self.backup_dir.join(format!("{DOCUMENT_PREFIX}{name}"))
    }

    /// Keep the newest `retention` automatic backups. Manual snapshots sort
    /// into the same namespace and count against the same bound. Failures
    /// here only warn; pruning is not critical.
    fn prune_backups(&self) {
        let backups = match self.list_backups() {
            Ok(b) => b,
            Err(e) => {
                warn!("failed to list backups for pruning: {e}");
                return;
            }
        };
        for name in backups.iter().skip(self.retention) {
            let path = self.backup_dir.join(name);
            match self.fs.remove_file(&path) {
                Ok(()) => debug!("removed old backup: {name}"),
                Err(e) => warn!("failed to remove old backup {name}: {e}"),
            }
        }
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H-%M-%S%.3f").to_string()
}
