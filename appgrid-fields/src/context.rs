//! FieldsContext: the field definitions of one directory.
//!
//! Definitions live as YAML files under `definitions/`, one per field key.
//! In-memory indexes give lookup by key and by ULID. The context is cheap to
//! open and holds no locks; callers reopen it per command so concurrent
//! processes see each other's edits.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;
use ulid::Ulid;

use crate::error::{FieldsError, Result};
use crate::types::FieldDef;

/// Field definitions for one directory, backed by a `definitions/` folder.
///
/// ```text
/// fields/
///   definitions/    <- one .yaml per field key
/// ```
pub struct FieldsContext {
    root: PathBuf,
    fields: Vec<FieldDef>,
    key_index: HashMap<String, usize>,
    id_index: HashMap<Ulid, usize>,
}

impl FieldsContext {
    /// Open or create a fields folder and load every definition in it.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("definitions")).await?;

        let mut ctx = FieldsContext {
            root,
            fields: Vec::new(),
            key_index: HashMap::new(),
            id_index: HashMap::new(),
        };
        ctx.load_definitions().await?;

        debug!(fields = ctx.fields.len(), root = %ctx.root.display(), "fields context opened");
        Ok(ctx)
    }

    // --- Lookup ---

    pub fn get_field_by_key(&self, key: &str) -> Option<&FieldDef> {
        self.key_index.get(key).map(|&i| &self.fields[i])
    }

    pub fn get_field_by_id(&self, id: &Ulid) -> Option<&FieldDef> {
        self.id_index.get(id).map(|&i| &self.fields[i])
    }

    /// All definitions, ordered by `order` then key.
    pub fn all_fields(&self) -> Vec<&FieldDef> {
        let mut fields: Vec<&FieldDef> = self.fields.iter().collect();
        fields.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.key.cmp(&b.key)));
        fields
    }

    /// Definitions whose `required` flag is set.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.required)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // --- Mutation ---

    /// Add a new definition. Fails if the key is already used by another field.
    pub async fn create_field(&mut self, def: &FieldDef) -> Result<()> {
        if self.key_index.contains_key(&def.key) {
            return Err(FieldsError::DuplicateKey {
                key: def.key.clone(),
            });
        }
        self.write_field(def).await
    }

    /// Write (create or update) a definition. Persists to YAML immediately.
    ///
    /// A changed key renames the file; the old key's file is removed. A key
    /// that belongs to a different field is a `DuplicateKey` error.
    pub async fn write_field(&mut self, def: &FieldDef) -> Result<()> {
        if let Some(&idx) = self.key_index.get(&def.key) {
            if self.fields[idx].id != def.id {
                return Err(FieldsError::DuplicateKey {
                    key: def.key.clone(),
                });
            }
        }

        let yaml = serde_yaml_ng::to_string(def)?;
        let path = self.definition_path(&def.key);
        atomic_write(&path, yaml.as_bytes()).await?;

        if let Some(&idx) = self.id_index.get(&def.id) {
            let old_key = self.fields[idx].key.clone();
            if old_key != def.key {
                self.key_index.remove(&old_key);
                let old_path = self.definition_path(&old_key);
                if old_path.exists() {
                    fs::remove_file(&old_path).await?;
                }
            }
            self.fields[idx] = def.clone();
            self.key_index.insert(def.key.clone(), idx);
        } else {
            let idx = self.fields.len();
            self.fields.push(def.clone());
            self.key_index.insert(def.key.clone(), idx);
            self.id_index.insert(def.id, idx);
        }

        Ok(())
    }

    /// Delete a definition by ULID, returning it.
    pub async fn delete_field(&mut self, id: &Ulid) -> Result<FieldDef> {
        let idx = self
            .id_index
            .get(id)
            .copied()
            .ok_or_else(|| FieldsError::FieldNotFoundById { id: id.to_string() })?;

        let path = self.definition_path(&self.fields[idx].key);
        if path.exists() {
            fs::remove_file(&path).await?;
        }

        let removed = self.fields.swap_remove(idx);
        self.key_index.remove(&removed.key);
        self.id_index.remove(id);

        if idx < self.fields.len() {
            let moved = &self.fields[idx];
            self.key_index.insert(moved.key.clone(), idx);
            self.id_index.insert(moved.id, idx);
        }

        Ok(removed)
    }

    // --- Internal ---

    fn definition_path(&self, key: &str) -> PathBuf {
        self.root.join("definitions").join(format!("{key}.yaml"))
    }

    async fn load_definitions(&mut self) -> Result<()> {
        let defs_dir = self.root.join("definitions");
        let mut entries = fs::read_dir(&defs_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let content = fs::read_to_string(&path).await?;
            match serde_yaml_ng::from_str::<FieldDef>(&content) {
                Ok(def) => {
                    let idx = self.fields.len();
                    self.key_index.insert(def.key.clone(), idx);
                    self.id_index.insert(def.id, idx);
                    self.fields.push(def);
                }
                Err(e) => {
                    tracing::warn!(?path, %e, "skipping invalid field definition");
                }
            }
        }
        Ok(())
    }
}

/// Write to a temp file then rename for atomic persistence.
async fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "no parent dir"))?;
    let tmp = dir.join(format!(".tmp_{}", Ulid::new()));
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
