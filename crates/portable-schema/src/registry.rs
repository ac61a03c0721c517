// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::class_def::ClassDefinition;
use crate::compatibility::diff_class_definitions;
use crate::error::{SchemaError, SchemaResult};

// ---------------------------------------------------------------------------
// ClassDefinitionContext
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct ContextState {
    /// class id -> canonical current version (set at most once).
    current_versions: HashMap<i32, i32>,
    /// (class id, version) -> registered definition.
    definitions: HashMap<(i32, i32), Arc<ClassDefinition>>,
}

/// Per-factory store of versioned class definitions.
///
/// Both maps sit behind one mutex, so every operation (including the read
/// that decides a mutation) is linearizable with respect to the others.
#[derive(Debug)]
pub struct ClassDefinitionContext {
    factory_id: i32,
    /// Version stamped on definitions registered without one.
    default_version: i32,
    state: Mutex<ContextState>,
}

impl ClassDefinitionContext {
    pub fn new(factory_id: i32, default_version: i32) -> Self {
        ClassDefinitionContext {
            factory_id,
            default_version,
            state: Mutex::new(ContextState::default()),
        }
    }

    pub fn factory_id(&self) -> i32 {
        self.factory_id
    }

    pub fn default_version(&self) -> i32 {
        self.default_version
    }

    /// Current version of `class_id`, `None` when never set.
    pub fn get_class_version(&self, class_id: i32) -> Option<i32> {
        self.state.lock().current_versions.get(&class_id).copied()
    }

    /// Record the current version of `class_id`.
    ///
    /// Setting the same value again is a no-op; a different value is a
    /// `VersionConflict`.
    pub fn set_class_version(&self, class_id: i32, version: i32) -> SchemaResult<()> {
        let mut state = self.state.lock();
        match state.current_versions.get(&class_id) {
            Some(&current) if current != version => Err(SchemaError::VersionConflict {
                factory_id: self.factory_id,
                class_id,
                current,
                requested: version,
            }),
            Some(_) => Ok(()),
            None => {
                state.current_versions.insert(class_id, version);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, class_id: i32, version: i32) -> Option<Arc<ClassDefinition>> {
        self.state.lock().definitions.get(&(class_id, version)).cloned()
    }

    /// Register a definition, returning the canonical stored instance.
    ///
    /// An unset version is stamped with the context default first. When an
    /// equal definition is already stored, that instance is returned and the
    /// argument is dropped.
    pub fn register(&self, class_def: Arc<ClassDefinition>) -> SchemaResult<Arc<ClassDefinition>> {
        let class_def = self.prepare(class_def)?;
        let mut state = self.state.lock();
        self.insert_locked(&mut state, class_def)
    }

    /// Check that `class_def` could be registered without storing it.
    pub fn check_registrable(&self, class_def: &ClassDefinition) -> SchemaResult<()> {
        if class_def.factory_id() != self.factory_id {
            return Err(SchemaError::InvalidFactory {
                expected: self.factory_id,
                actual: class_def.factory_id(),
            });
        }
        let version = class_def.version().unwrap_or(self.default_version);
        let state = self.state.lock();
        match state.definitions.get(&(class_def.class_id(), version)) {
            Some(current) => {
                let stamped = class_def.with_version_if_unset(self.default_version);
                self.ensure_compatible(current, &stamped)
            }
            None => Ok(()),
        }
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.state.lock().definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every registered definition, ordered by (class id, version).
    pub fn definitions(&self) -> Vec<Arc<ClassDefinition>> {
        let state = self.state.lock();
        let mut keys: Vec<&(i32, i32)> = state.definitions.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(|key| Arc::clone(&state.definitions[key]))
            .collect()
    }

    fn prepare(&self, class_def: Arc<ClassDefinition>) -> SchemaResult<Arc<ClassDefinition>> {
        if class_def.factory_id() != self.factory_id {
            return Err(SchemaError::InvalidFactory {
                expected: self.factory_id,
                actual: class_def.factory_id(),
            });
        }
        if class_def.version().is_some() {
            return Ok(class_def);
        }
        Ok(Arc::new(class_def.with_version_if_unset(self.default_version)))
    }

    fn insert_locked(
        &self,
        state: &mut ContextState,
        class_def: Arc<ClassDefinition>,
    ) -> SchemaResult<Arc<ClassDefinition>> {
        let version = class_def.version().unwrap_or(self.default_version);
        let key = (class_def.class_id(), version);
        if let Some(current) = state.definitions.get(&key) {
            self.ensure_compatible(current, &class_def)?;
            return Ok(Arc::clone(current));
        }
        log::debug!(
            "[portable] registered class definition factory={} class={} version={} fields={}",
            self.factory_id,
            key.0,
            key.1,
            class_def.field_count()
        );
        state.definitions.insert(key, Arc::clone(&class_def));
        Ok(class_def)
    }

    fn ensure_compatible(
        &self,
        current: &ClassDefinition,
        candidate: &ClassDefinition,
    ) -> SchemaResult<()> {
        if current == candidate {
            return Ok(());
        }
        let details = diff_class_definitions(current, candidate);
        log::warn!(
            "[portable] incompatible class definitions: {} vs {}",
            candidate,
            current
        );
        Err(SchemaError::IncompatibleDefinitions {
            factory_id: self.factory_id,
            class_id: current.class_id(),
            version: current.version().unwrap_or(self.default_version),
            details,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
