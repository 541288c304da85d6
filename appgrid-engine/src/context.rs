//! EngineContext - I/O primitives for directory and record storage
//!
//! The context provides access to storage and utilities. No business logic methods,
//! just data access primitives. Commands do all the work.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::types::{
    is_path_safe, CategoryTree, Directory, DirectoryId, FieldCategory, FieldCategoryId, LogEntry,
    PendingMigration, Record, RecordId,
};
use appgrid_fields::{FieldProcessorRegistry, FieldsContext};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Context passed to every command - provides access, not logic
pub struct EngineContext {
    /// Root of the storage tree
    root: PathBuf,
    config: EngineConfig,
    registry: Arc<FieldProcessorRegistry>,
}

impl EngineContext {
    /// Create a context with default configuration and the built-in processors
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, EngineConfig::default())
    }

    /// Create a context with explicit configuration
    pub fn with_config(root: impl Into<PathBuf>, config: EngineConfig) -> Self {
        let registry = FieldProcessorRegistry::builtin()
            .with_unknown_type_policy(config.unknown_field_types);
        Self {
            root: root.into(),
            config,
            registry: Arc::new(registry),
        }
    }

    /// Create a context, loading configuration from the root and the environment
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = EngineConfig::load(&root)?;
        Ok(Self::with_config(root, config))
    }

    /// Replace the field processor registry
    pub fn with_registry(mut self, registry: impl Into<Arc<FieldProcessorRegistry>>) -> Self {
        self.registry = registry.into();
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &FieldProcessorRegistry {
        &self.registry
    }

    // =========================================================================
    // Path helpers
    // =========================================================================

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the directories folder
    pub fn directories_dir(&self) -> PathBuf {
        self.root.join("directories")
    }

    /// Folder holding everything that belongs to one directory
    pub fn directory_dir(&self, id: &DirectoryId) -> PathBuf {
        self.directories_dir().join(id.as_str())
    }

    /// Path to a directory's metadata file
    pub fn directory_path(&self, id: &DirectoryId) -> PathBuf {
        self.directory_dir(id).join("directory.yaml")
    }

    /// Path to a directory's category tree
    pub fn categories_path(&self, id: &DirectoryId) -> PathBuf {
        self.directory_dir(id).join("categories.yaml")
    }

    /// Path to a directory's field categories folder
    pub fn field_categories_dir(&self, id: &DirectoryId) -> PathBuf {
        self.directory_dir(id).join("field_categories")
    }

    /// Path to one field category
    pub fn field_category_path(&self, dir: &DirectoryId, id: &FieldCategoryId) -> PathBuf {
        self.field_categories_dir(dir).join(format!("{}.yaml", id))
    }

    /// Path to a directory's field definitions root
    pub fn fields_dir(&self, id: &DirectoryId) -> PathBuf {
        self.directory_dir(id).join("fields")
    }

    /// Path to a directory's records folder
    pub fn records_dir(&self, id: &DirectoryId) -> PathBuf {
        self.directory_dir(id).join("records")
    }

    /// Path to a record's JSON file
    pub fn record_path(&self, dir: &DirectoryId, id: &RecordId) -> PathBuf {
        self.records_dir(dir).join(format!("{}.json", id))
    }

    /// Path to a record's log file
    pub fn record_log_path(&self, dir: &DirectoryId, id: &RecordId) -> PathBuf {
        self.records_dir(dir).join(format!("{}.jsonl", id))
    }

    /// Path to a record's lock file
    pub fn record_lock_path(&self, dir: &DirectoryId, id: &RecordId) -> PathBuf {
        self.records_dir(dir).join(format!("{}.lock", id))
    }

    /// Path to a directory's incomplete migrations
    pub fn migrations_path(&self, id: &DirectoryId) -> PathBuf {
        self.directory_dir(id).join("migrations.yaml")
    }

    /// Path to the activity directory
    pub fn activity_dir(&self) -> PathBuf {
        self.root.join("activity")
    }

    /// Path to the current activity log
    pub fn activity_path(&self) -> PathBuf {
        self.activity_dir().join("current.jsonl")
    }

    // =========================================================================
    // Directory I/O
    // =========================================================================

    pub fn directory_exists(&self, id: &DirectoryId) -> bool {
        id.is_path_safe() && self.directory_path(id).exists()
    }

    /// Create the folder structure for a directory (idempotent)
    pub async fn create_directory_dirs(&self, id: &DirectoryId) -> Result<()> {
        check_id(id.as_str())?;
        fs::create_dir_all(self.records_dir(id)).await?;
        fs::create_dir_all(self.field_categories_dir(id)).await?;
        fs::create_dir_all(self.fields_dir(id).join("definitions")).await?;
        Ok(())
    }

    pub async fn read_directory(&self, id: &DirectoryId) -> Result<Directory> {
        check_id(id.as_str())?;
        let path = self.directory_path(id);
        if !path.exists() {
            return Err(EngineError::DirectoryNotFound { id: id.to_string() });
        }
        read_yaml(&path).await
    }

    /// Write a directory's metadata (atomic write via temp file)
    pub async fn write_directory(&self, directory: &Directory) -> Result<()> {
        check_id(directory.id.as_str())?;
        write_yaml(&self.directory_path(&directory.id), directory).await
    }

    /// Remove a directory with its fields, categories and records
    pub async fn delete_directory_dir(&self, id: &DirectoryId) -> Result<()> {
        check_id(id.as_str())?;
        let dir = self.directory_dir(id);
        if dir.exists() {
            fs::remove_dir_all(&dir).await?;
        }
        Ok(())
    }

    pub async fn list_directory_ids(&self) -> Result<Vec<DirectoryId>> {
        let root = self.directories_dir();
        if !root.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.join("directory.yaml").exists() {
                if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                    ids.push(DirectoryId::from_string(name));
                }
            }
        }
        Ok(ids)
    }

    pub async fn read_all_directories(&self) -> Result<Vec<Directory>> {
        let ids = self.list_directory_ids().await?;
        let mut directories = Vec::with_capacity(ids.len());
        for id in ids {
            directories.push(self.read_directory(&id).await?);
        }
        Ok(directories)
    }

    // =========================================================================
    // Field definitions
    // =========================================================================

    /// Open the field definitions of a directory. Fails if the directory is unknown.
    pub async fn fields(&self, id: &DirectoryId) -> Result<FieldsContext> {
        check_id(id.as_str())?;
        if !self.directory_exists(id) {
            return Err(EngineError::DirectoryNotFound { id: id.to_string() });
        }
        Ok(FieldsContext::open(self.fields_dir(id)).await?)
    }

    // =========================================================================
    // Category tree I/O
    // =========================================================================

    /// Read a directory's category tree; a missing file is an empty tree
    pub async fn read_category_tree(&self, id: &DirectoryId) -> Result<CategoryTree> {
        check_id(id.as_str())?;
        let path = self.categories_path(id);
        if !path.exists() {
            return Ok(CategoryTree::default());
        }
        read_yaml(&path).await
    }

    pub async fn write_category_tree(&self, id: &DirectoryId, tree: &CategoryTree) -> Result<()> {
        check_id(id.as_str())?;
        write_yaml(&self.categories_path(id), tree).await
    }

    // =========================================================================
    // Field category I/O
    // =========================================================================

    pub async fn read_field_category(
        &self,
        dir: &DirectoryId,
        id: &FieldCategoryId,
    ) -> Result<FieldCategory> {
        check_id(dir.as_str())?;
        check_id(id.as_str())?;
        let path = self.field_category_path(dir, id);
        if !path.exists() {
            return Err(EngineError::FieldCategoryNotFound { id: id.to_string() });
        }
        read_yaml(&path).await
    }

    pub async fn write_field_category(&self, category: &FieldCategory) -> Result<()> {
        check_id(category.directory_id.as_str())?;
        check_id(category.id.as_str())?;
        let path = self.field_category_path(&category.directory_id, &category.id);
        write_yaml(&path, category).await
    }

    pub async fn delete_field_category_file(
        &self,
        dir: &DirectoryId,
        id: &FieldCategoryId,
    ) -> Result<()> {
        check_id(dir.as_str())?;
        check_id(id.as_str())?;
        let path = self.field_category_path(dir, id);
        if path.exists() {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }

    /// All field categories of a directory, ordered by `order` then name
    pub async fn read_all_field_categories(&self, dir: &DirectoryId) -> Result<Vec<FieldCategory>> {
        check_id(dir.as_str())?;
        let folder = self.field_categories_dir(dir);
        if !folder.exists() {
            return Ok(Vec::new());
        }

        let mut categories: Vec<FieldCategory> = Vec::new();
        let mut entries = fs::read_dir(&folder).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("yaml") {
                categories.push(read_yaml(&path).await?);
            }
        }
        categories.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        Ok(categories)
    }

    // =========================================================================
    // Record I/O
    // =========================================================================

    /// Read a record file, including soft-deleted records
    pub async fn read_record(&self, dir: &DirectoryId, id: &RecordId) -> Result<Record> {
        check_id(dir.as_str())?;
        check_id(id.as_str())?;
        let path = self.record_path(dir, id);
        if !path.exists() {
            return Err(EngineError::RecordNotFound { id: id.to_string() });
        }

        let content = fs::read_to_string(&path).await?;
        let record: Record = serde_json::from_str(&content)?;
        // A file copied in from elsewhere is not this directory's record
        if &record.directory_id != dir || &record.id != id {
            return Err(EngineError::RecordNotFound { id: id.to_string() });
        }
        Ok(record)
    }

    /// Write a record file (atomic write via temp file)
    pub async fn write_record(&self, record: &Record) -> Result<()> {
        check_id(record.directory_id.as_str())?;
        check_id(record.id.as_str())?;
        let path = self.record_path(&record.directory_id, &record.id);
        let content = serde_json::to_string_pretty(record)?;
        atomic_write(&path, content.as_bytes()).await
    }

    /// Delete a record file with its log and lock file
    pub async fn delete_record_file(&self, dir: &DirectoryId, id: &RecordId) -> Result<()> {
        check_id(dir.as_str())?;
        check_id(id.as_str())?;
        for path in [
            self.record_path(dir, id),
            self.record_log_path(dir, id),
            self.record_lock_path(dir, id),
        ] {
            if path.exists() {
                fs::remove_file(&path).await?;
            }
        }

        Ok(())
    }

    /// List all record IDs by reading the records directory
    pub async fn list_record_ids(&self, dir: &DirectoryId) -> Result<Vec<RecordId>> {
        check_id(dir.as_str())?;
        let records_dir = self.records_dir(dir);
        if !records_dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&records_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(RecordId::from_string(stem));
                }
            }
        }

        Ok(ids)
    }

    /// Read all records, including soft-deleted ones
    pub async fn read_all_records(&self, dir: &DirectoryId) -> Result<Vec<Record>> {
        let ids = self.list_record_ids(dir).await?;
        let mut records = Vec::with_capacity(ids.len());

        for id in ids {
            match self.read_record(dir, &id).await {
                Ok(record) => records.push(record),
                // Hard-deleted between listing and reading
                Err(EngineError::RecordNotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        Ok(records)
    }

    // =========================================================================
    // Record locks
    // =========================================================================

    /// Serialize writers of one record. Readers never take this lock.
    ///
    /// Held across read-check-write so that a version compare-and-swap has
    /// exactly one winner, also between processes sharing the root. Waits
    /// until the current holder drops its guard. Different records never contend.
    pub async fn lock_record(&self, dir: &DirectoryId, id: &RecordId) -> Result<RecordLock> {
        check_id(dir.as_str())?;
        check_id(id.as_str())?;
        if !self.records_dir(dir).exists() {
            return Err(EngineError::DirectoryNotFound { id: dir.to_string() });
        }
        if !self.record_path(dir, id).exists() {
            return Err(EngineError::RecordNotFound { id: id.to_string() });
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.record_lock_path(dir, id))?;

        // Blocking lock on the blocking pool so waiting never stalls the runtime
        let file = tokio::task::spawn_blocking(move || file.lock_exclusive().map(|()| file))
            .await
            .map_err(std::io::Error::other)??;

        Ok(RecordLock { file })
    }

    // =========================================================================
    // Pending migrations
    // =========================================================================

    /// Migrations that left records behind; a missing file means none
    pub async fn read_pending_migrations(&self, dir: &DirectoryId) -> Result<Vec<PendingMigration>> {
        check_id(dir.as_str())?;
        let path = self.migrations_path(dir);
        if !path.exists() {
            return Ok(Vec::new());
        }
        read_yaml(&path).await
    }

    pub async fn write_pending_migrations(
        &self,
        dir: &DirectoryId,
        pending: &[PendingMigration],
    ) -> Result<()> {
        check_id(dir.as_str())?;
        let path = self.migrations_path(dir);
        if pending.is_empty() {
            if path.exists() {
                fs::remove_file(&path).await?;
            }
            return Ok(());
        }
        write_yaml(&path, &pending).await
    }

    // =========================================================================
    // Activity logging
    // =========================================================================

    /// Append a log entry to the global activity log
    pub async fn append_activity(&self, entry: &LogEntry) -> Result<()> {
        fs::create_dir_all(self.activity_dir()).await?;
        self.append_log(&self.activity_path(), entry).await
    }

    /// Append a log entry to a record's log
    pub async fn append_record_log(
        &self,
        dir: &DirectoryId,
        id: &RecordId,
        entry: &LogEntry,
    ) -> Result<()> {
        check_id(dir.as_str())?;
        check_id(id.as_str())?;
        self.append_log(&self.record_log_path(dir, id), entry).await
    }

    /// Append a log entry to a JSONL file
    async fn append_log(&self, path: &Path, entry: &LogEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    /// Read activity log entries (from current.jsonl), newest first
    pub async fn read_activity(&self, limit: Option<usize>) -> Result<Vec<LogEntry>> {
        read_log(&self.activity_path(), limit).await
    }

    /// Read a record's log entries, newest first
    pub async fn read_record_log(
        &self,
        dir: &DirectoryId,
        id: &RecordId,
        limit: Option<usize>,
    ) -> Result<Vec<LogEntry>> {
        check_id(dir.as_str())?;
        check_id(id.as_str())?;
        read_log(&self.record_log_path(dir, id), limit).await
    }
}

/// RAII record lock - released on drop
pub struct RecordLock {
    file: std::fs::File,
}

impl Drop for RecordLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn check_id(id: &str) -> Result<()> {
    if is_path_safe(id) {
        Ok(())
    } else {
        Err(EngineError::InvalidId { id: id.to_string() })
    }
}

async fn read_log(path: &Path, limit: Option<usize>) -> Result<Vec<LogEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path).await?;
    let mut entries: Vec<LogEntry> = content
        .lines()
        .filter(|line| !line.is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();

    // Reverse to get newest first
    entries.reverse();

    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    Ok(entries)
}

async fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).await?;
    Ok(serde_yaml_ng::from_str(&content)?)
}

async fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_yaml_ng::to_string(value)?;
    atomic_write(path, content.as_bytes()).await
}

/// Atomic write via temp file and rename
async fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    // Unique temp name so concurrent writers never share one
    let temp_path = path.with_extension(format!("{}.tmp", ulid::Ulid::new()));
    fs::write(&temp_path, content).await?;

    // Rename (atomic on same filesystem)
    fs::rename(&temp_path, path).await?;
    debug!(path = %path.display(), "wrote file");

    Ok(())
}
