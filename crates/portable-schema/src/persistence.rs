// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::fs;
use std::path::{Path, PathBuf};

use crate::class_def::ClassDefinitionRecord;
use crate::context::PortableContext;
use crate::error::{SchemaError, SchemaResult};

// ---------------------------------------------------------------------------
// FilePersistence
// ---------------------------------------------------------------------------

/// File-based snapshots of a `PortableContext`.
///
/// Stores each registered class definition as a JSON file at:
///   `{directory}/factory-{factory_id}/class-{class_id}-v{version}.json`
pub struct FilePersistence {
    directory: PathBuf,
}

impl FilePersistence {
    /// Create a new `FilePersistence` rooted at the given directory.
    ///
    /// The directory is created if it does not exist.
    pub fn new(directory: PathBuf) -> SchemaResult<Self> {
        if !directory.exists() {
            fs::create_dir_all(&directory).map_err(|e| io_error("create directory", &directory, e))?;
        }
        Ok(FilePersistence { directory })
    }

    /// Persist every registered definition. Existing files are overwritten.
    ///
    /// Returns the number of definitions written.
    pub fn save(&self, context: &PortableContext) -> SchemaResult<usize> {
        let mut written = 0;
        for class_def in context.class_definitions() {
            let factory_dir = self
                .directory
                .join(format!("factory-{}", class_def.factory_id()));
            if !factory_dir.exists() {
                fs::create_dir_all(&factory_dir)
                    .map_err(|e| io_error("create factory dir", &factory_dir, e))?;
            }

            let version = class_def
                .version()
                .unwrap_or_else(|| context.get_portable_version());
            let path = factory_dir.join(format!("class-{}-v{}.json", class_def.class_id(), version));
            let json = serde_json::to_string_pretty(&class_def.to_record())
                .map_err(|e| SchemaError::Io(format!("serialization error: {}", e)))?;
            fs::write(&path, json).map_err(|e| io_error("write", &path, e))?;
            written += 1;
        }
        log::debug!(
            "[portable] saved {} class definitions to {}",
            written,
            self.directory.display()
        );
        Ok(written)
    }

    /// Register every stored definition into `context`.
    ///
    /// Loaded definitions go through the normal registration path, so a
    /// snapshot that disagrees with already registered definitions fails
    /// with `IncompatibleDefinitions`. Returns the number of files loaded.
    pub fn load_into(&self, context: &PortableContext) -> SchemaResult<usize> {
        if !self.directory.exists() {
            return Ok(0);
        }

        let mut records = Vec::new();
        for factory_dir in read_dir_sorted(&self.directory)? {
            if !factory_dir.is_dir() {
                continue;
            }
            for path in read_dir_sorted(&factory_dir)? {
                let is_snapshot = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("class-") && n.ends_with(".json"));
                if !is_snapshot {
                    continue;
                }
                let json = fs::read_to_string(&path).map_err(|e| io_error("read", &path, e))?;
                let record: ClassDefinitionRecord = serde_json::from_str(&json).map_err(|e| {
                    SchemaError::Io(format!("failed to deserialize {}: {}", path.display(), e))
                })?;
                records.push(record);
            }
        }

        let loaded = records.len();
        for record in records {
            context.register_class_definition(record.into_class_definition()?)?;
        }
        Ok(loaded)
    }
}

fn read_dir_sorted(dir: &Path) -> SchemaResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| io_error("read directory", dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_error("read entry of", dir, e))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> SchemaError {
    SchemaError::Io(format!("failed to {} {}: {}", action, path.display(), err))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
