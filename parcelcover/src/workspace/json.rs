//! Directory-of-JSON workspace implementation.
//!
//! Each dataset is one `<name>.json` file under the workspace directory.
//! Writes go through a temp file and `fs::rename`, so a crash mid-write
//! never leaves a torn dataset, and [`Workspace::rename`] is an atomic
//! replace on the same volume.

use super::{apply_add_field, apply_update_field, Workspace};
use crate::error::{EngineError, EngineResult};
use crate::model::{Dataset, DatasetEntry, Feature, FeatureId, Field, FieldCheck, Schema, Value};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A workspace stored as a directory of JSON datasets.
#[derive(Debug)]
pub struct JsonWorkspace {
    root: PathBuf,
    // Per-dataset mutexes serializing read-modify-write cycles within this
    // process. Cross-process coordination is out of scope.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl JsonWorkspace {
    /// Opens an existing workspace directory.
    ///
    /// Failing to open the workspace is fatal for a run: no layer can be
    /// discovered without it.
    pub fn open(root: impl Into<PathBuf>) -> EngineResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(EngineError::Io(format!(
                "workspace '{}' is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Creates the workspace directory (and parents) if needed, then opens it.
    pub fn create(root: impl Into<PathBuf>) -> EngineResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Self::open(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        locks.entry(name.to_string()).or_default().clone()
    }

    fn dataset_path(&self, name: &str) -> EngineResult<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(format!("{name}.json")))
    }

    fn load(&self, name: &str) -> EngineResult<Dataset> {
        let path = self.dataset_path(name)?;
        let data = fs::read_to_string(&path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                EngineError::NotFound {
                    kind: "dataset",
                    name: name.to_string(),
                }
            } else {
                EngineError::Io(err.to_string())
            }
        })?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Serializes a dataset to its file via temp-file + rename.
    fn store(&self, name: &str, dataset: &Dataset) -> EngineResult<()> {
        let path = self.dataset_path(name)?;
        let tmp = self.root.join(format!(".{name}.json.tmp"));
        fs::write(&tmp, serde_json::to_vec(dataset)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Dataset names become file names; keep them path-safe.
fn validate_name(name: &str) -> EngineResult<()> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
    if ok {
        Ok(())
    } else {
        Err(EngineError::Io(format!("invalid dataset name '{name}'")))
    }
}

impl Workspace for JsonWorkspace {
    fn list(&self) -> EngineResult<Vec<DatasetEntry>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if let Some(name) = file_name.strip_suffix(".json") {
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();

        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let dataset = self.load(&name)?;
            entries.push(DatasetEntry {
                name,
                kind: dataset.kind(),
            });
        }
        Ok(entries)
    }

    fn exists(&self, name: &str) -> EngineResult<bool> {
        Ok(self.dataset_path(name)?.is_file())
    }

    fn create(&self, dataset: Dataset) -> EngineResult<()> {
        let name = dataset.name().to_string();
        let _guard = self.lock_for(&name);
        let _held = _guard.lock();
        if self.exists(&name)? {
            return Err(EngineError::Io(format!("dataset '{name}' already exists")));
        }
        self.store(&name, &dataset)
    }

    fn drop_dataset(&self, name: &str) -> EngineResult<()> {
        let path = self.dataset_path(name)?;
        fs::remove_file(&path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                EngineError::NotFound {
                    kind: "dataset",
                    name: name.to_string(),
                }
            } else {
                EngineError::Io(err.to_string())
            }
        })
    }

    fn rename(&self, from: &str, to: &str) -> EngineResult<()> {
        let mut dataset = self.load(from)?;
        dataset.set_name(to);
        // Commit point: the temp-file rename inside store() atomically
        // replaces any prior dataset under `to`.
        self.store(to, &dataset)?;
        if from != to {
            fs::remove_file(self.dataset_path(from)?)?;
        }
        Ok(())
    }

    fn read_schema(&self, name: &str) -> EngineResult<Schema> {
        Ok(self.load(name)?.schema().clone())
    }

    fn read_dataset(&self, name: &str) -> EngineResult<Dataset> {
        self.load(name)
    }

    fn write_features(&self, name: &str, features: Vec<Feature>) -> EngineResult<()> {
        let guard = self.lock_for(name);
        let _held = guard.lock();
        let mut dataset = self.load(name)?;
        match &mut dataset {
            Dataset::Layer(layer) => layer.features.extend(features),
            Dataset::Table(_) => {
                return Err(EngineError::NotFound {
                    kind: "layer",
                    name: name.to_string(),
                })
            }
        }
        self.store(name, &dataset)
    }

    fn add_field(&self, name: &str, field: Field) -> EngineResult<FieldCheck> {
        let guard = self.lock_for(name);
        let _held = guard.lock();
        let mut dataset = self.load(name)?;
        let check = apply_add_field(&mut dataset, field)?;
        if check == FieldCheck::Absent {
            self.store(name, &dataset)?;
        }
        Ok(check)
    }

    fn update_field(
        &self,
        name: &str,
        field: &str,
        values: &HashMap<FeatureId, Value>,
    ) -> EngineResult<()> {
        let guard = self.lock_for(name);
        let _held = guard.lock();
        let mut dataset = self.load(name)?;
        apply_update_field(&mut dataset, field, values)?;
        self.store(name, &dataset)
    }
}
