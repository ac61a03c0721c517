// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural diff between two class definitions sharing an identity.
//!
//! The registry never merges or migrates definitions; the diff only
//! explains why a registration was refused.

use std::collections::HashMap;

use crate::class_def::ClassDefinition;
use crate::field::FieldDefinition;

/// List the differences between an already registered definition and a
/// candidate. An empty result means the two are structurally equal.
pub fn diff_class_definitions(existing: &ClassDefinition, candidate: &ClassDefinition) -> Vec<String> {
    let mut details = Vec::new();

    if existing.factory_id() != candidate.factory_id() {
        details.push(format!(
            "factory id changed: {} -> {}",
            existing.factory_id(),
            candidate.factory_id()
        ));
    }
    if existing.version() != candidate.version() {
        details.push(format!(
            "version changed: {:?} -> {:?}",
            existing.version(),
            candidate.version()
        ));
    }

    let existing_map: HashMap<&[u8], &FieldDefinition> =
        existing.fields().iter().map(|fd| (fd.name().as_bytes(), fd)).collect();
    let candidate_map: HashMap<&[u8], &FieldDefinition> =
        candidate.fields().iter().map(|fd| (fd.name().as_bytes(), fd)).collect();

    for fd in candidate.fields() {
        if !existing_map.contains_key(fd.name().as_bytes()) {
            details.push(format!("added field: {} {:?}", fd.name(), fd.field_type()));
        }
    }

    for old in existing.fields() {
        let Some(new) = candidate_map.get(old.name().as_bytes()) else {
            details.push(format!("removed field: {} {:?}", old.name(), old.field_type()));
            continue;
        };
        if old.field_type() != new.field_type() {
            details.push(format!(
                "changed type of {}: {:?} -> {:?}",
                old.name(),
                old.field_type(),
                new.field_type()
            ));
        }
        if old.index() != new.index() {
            details.push(format!(
                "moved field {}: index {} -> {}",
                old.name(),
                old.index(),
                new.index()
            ));
        }
        if (old.factory_id(), old.class_id()) != (new.factory_id(), new.class_id()) {
            details.push(format!(
                "changed nested class of {}: ({}, {}) -> ({}, {})",
                old.name(),
                old.factory_id(),
                old.class_id(),
                new.factory_id(),
                new.class_id()
            ));
        }
    }

    details
}
