//! JSON-based run history.
//!
//! Stores each suite run as a separate JSON file. Supports listing,
//! prefix lookup, deletion and pruning.

use crate::config::Paths;
use crate::error::{StorageError, StorageResult};
use crate::suite::SuiteReport;
use crate::types::RunId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A persisted suite run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Unique identifier for this run.
    pub id: RunId,
    /// When the run started (before apply).
    pub started_at: DateTime<Utc>,
    /// When the run completed (after teardown).
    pub completed_at: DateTime<Utc>,
    /// Module directory that was deployed.
    pub terraform_dir: String,
    /// Region the checks ran against.
    pub region: String,
    /// Apply error, when the checks never ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provision_error: Option<String>,
    /// Destroy error, when teardown failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teardown_error: Option<String>,
    /// Check results.
    pub report: SuiteReport,
}

impl RunRecord {
    /// Start a new record; call [`RunRecord::finish`] once the run is over.
    pub fn new(terraform_dir: impl Into<String>, region: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: RunId::new(),
            started_at: now,
            completed_at: now,
            terraform_dir: terraform_dir.into(),
            region: region.into(),
            provision_error: None,
            teardown_error: None,
            report: SuiteReport::default(),
        }
    }

    /// Record the outcome of the run.
    pub fn finish(
        mut self,
        report: SuiteReport,
        provision_error: Option<String>,
        teardown_error: Option<String>,
    ) -> Self {
        self.completed_at = Utc::now();
        self.report = report;
        self.provision_error = provision_error;
        self.teardown_error = teardown_error;
        self
    }

    /// Run passed: deployed, every check passed, torn down cleanly.
    pub fn passed(&self) -> bool {
        self.provision_error.is_none() && self.teardown_error.is_none() && self.report.all_passed()
    }

    pub fn duration_ms(&self) -> i64 {
        (self.completed_at - self.started_at).num_milliseconds()
    }

    /// One-line summary for history listings.
    pub fn summary(&self) -> String {
        let status = if let Some(e) = &self.provision_error {
            format!("provisioning failed: {}", e)
        } else {
            format!(
                "{} passed, {} failed",
                self.report.passed_count(),
                self.report.failed_count()
            )
        };
        format!(
            "{} ({}) - {} [{:.2}s]",
            self.terraform_dir,
            self.region,
            status,
            self.duration_ms() as f64 / 1000.0
        )
    }
}

/// JSON file-based run storage.
pub struct RunStore {
    runs_dir: PathBuf,
}

impl RunStore {
    /// Open the store in the default data directory.
    pub fn new() -> StorageResult<Self> {
        let paths = Paths::get()?;
        Self::at(paths.runs_dir())
    }

    /// Open a store rooted at a specific directory.
    pub fn at(runs_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let runs_dir = runs_dir.into();
        fs::create_dir_all(&runs_dir).map_err(|e| StorageError::DirectoryError(e.to_string()))?;
        Ok(Self { runs_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.runs_dir
    }

    /// Save a run record.
    pub fn save(&self, record: &RunRecord) -> StorageResult<()> {
        let file = self.run_file(&record.id);
        let content = serde_json::to_string_pretty(record)?;

        fs::write(&file, content).map_err(|e| StorageError::SaveFailed(e.to_string()))
    }

    /// Load a run record by ID.
    pub fn load(&self, id: &RunId) -> StorageResult<RunRecord> {
        let file = self.run_file(id);

        if !file.exists() {
            return Err(StorageError::RunNotFound(id.to_string()));
        }

        let content =
            fs::read_to_string(&file).map_err(|e| StorageError::LoadFailed(e.to_string()))?;

        serde_json::from_str(&content).map_err(|e| StorageError::LoadFailed(e.to_string()))
    }

    /// Find a run by full ID or unique prefix.
    pub fn find(&self, id_or_prefix: &str) -> StorageResult<RunRecord> {
        if let Ok(id) = id_or_prefix.parse::<RunId>() {
            return self.load(&id);
        }

        let matches: Vec<_> = self
            .list_ids()?
            .into_iter()
            .filter(|id| id.to_string().starts_with(id_or_prefix))
            .collect();

        match matches.as_slice() {
            [] => Err(StorageError::RunNotFound(id_or_prefix.to_string())),
            [id] => self.load(id),
            _ => Err(StorageError::AmbiguousPrefix {
                prefix: id_or_prefix.to_string(),
                matches: matches.len(),
            }),
        }
    }

    /// List all run IDs.
    pub fn list_ids(&self) -> StorageResult<Vec<RunId>> {
        let mut ids = Vec::new();

        for entry in
            fs::read_dir(&self.runs_dir).map_err(|e| StorageError::DirectoryError(e.to_string()))?
        {
            let entry = entry.map_err(|e| StorageError::DirectoryError(e.to_string()))?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem() {
                    if let Ok(id) = stem.to_string_lossy().parse::<RunId>() {
                        ids.push(id);
                    }
                }
            }
        }

        Ok(ids)
    }

    /// List all run records, most recent first. Unreadable files are skipped.
    pub fn list(&self) -> StorageResult<Vec<RunRecord>> {
        let mut records: Vec<RunRecord> = self
            .list_ids()?
            .iter()
            .filter_map(|id| self.load(id).ok())
            .collect();

        records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(records)
    }

    /// List the most recent `count` runs.
    pub fn list_recent(&self, count: usize) -> StorageResult<Vec<RunRecord>> {
        let mut records = self.list()?;
        records.truncate(count);
        Ok(records)
    }

    /// Delete a run record.
    pub fn delete(&self, id: &RunId) -> StorageResult<()> {
        let file = self.run_file(id);

        if !file.exists() {
            return Err(StorageError::RunNotFound(id.to_string()));
        }

        fs::remove_file(&file).map_err(|e| StorageError::SaveFailed(e.to_string()))
    }

    /// Delete every run record. Returns how many were removed.
    pub fn clear(&self) -> StorageResult<usize> {
        let ids = self.list_ids()?;
        for id in &ids {
            self.delete(id)?;
        }
        Ok(ids.len())
    }

    /// Delete runs older than `max_age`. Returns how many were removed.
    pub fn prune(&self, max_age: chrono::Duration) -> StorageResult<usize> {
        let cutoff = Utc::now() - max_age;
        let mut deleted = 0;

        for record in self.list()? {
            if record.started_at < cutoff {
                self.delete(&record.id)?;
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    fn run_file(&self, id: &RunId) -> PathBuf {
        self.runs_dir.join(format!("{}.json", id))
    }
}
