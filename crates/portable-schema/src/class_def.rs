// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Class definitions: the resolved field layout of one
//! `(factory_id, class_id, version)` triple.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::builder::ClassDefinitionBuilder;
use crate::error::SchemaResult;
use crate::field::{FieldDefinition, FieldName, FieldType};

/// Immutable ordered set of fields identified by factory, class and version.
///
/// Equality is structural: identity plus every field. The name index is
/// derived from the fields and does not take part in comparisons.
#[derive(Debug, Clone)]
pub struct ClassDefinition {
    factory_id: i32,
    class_id: i32,
    version: Option<i32>,
    fields: Vec<FieldDefinition>,
    by_name: HashMap<FieldName, usize>,
}

impl ClassDefinition {
    /// Assemble a definition from fields already validated by the builder.
    pub(crate) fn from_parts(
        factory_id: i32,
        class_id: i32,
        version: Option<i32>,
        fields: Vec<FieldDefinition>,
    ) -> Self {
        let by_name = fields
            .iter()
            .map(|fd| (fd.name().clone(), fd.index()))
            .collect();
        Self {
            factory_id,
            class_id,
            version,
            fields,
            by_name,
        }
    }

    pub fn factory_id(&self) -> i32 {
        self.factory_id
    }

    pub fn class_id(&self) -> i32 {
        self.class_id
    }

    /// `None` until the definition is registered or built with an explicit version.
    pub fn version(&self) -> Option<i32> {
        self.version
    }

    /// Copy of this definition stamped with `version` when none is set yet.
    pub fn with_version_if_unset(&self, version: i32) -> Self {
        let mut stamped = self.clone();
        stamped.version.get_or_insert(version);
        stamped
    }

    /// Field by its exact name bytes; `&str` names work as well.
    pub fn field(&self, name: impl AsRef<[u8]>) -> Option<&FieldDefinition> {
        self.by_name.get(name.as_ref()).map(|&index| &self.fields[index])
    }

    pub fn field_at(&self, index: usize) -> Option<&FieldDefinition> {
        self.fields.get(index)
    }

    pub fn has_field(&self, name: impl AsRef<[u8]>) -> bool {
        self.by_name.contains_key(name.as_ref())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &FieldName> {
        self.fields.iter().map(FieldDefinition::name)
    }

    pub fn field_type(&self, name: impl AsRef<[u8]>) -> Option<FieldType> {
        self.field(name).map(FieldDefinition::field_type)
    }

    /// Nested class id of a Portable or PortableArray field.
    pub fn field_class_id(&self, name: impl AsRef<[u8]>) -> Option<i32> {
        self.field(name).map(FieldDefinition::class_id)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn to_record(&self) -> ClassDefinitionRecord {
        ClassDefinitionRecord {
            factory_id: self.factory_id,
            class_id: self.class_id,
            version: self.version,
            fields: self.fields.clone(),
        }
    }
}

impl PartialEq for ClassDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.factory_id == other.factory_id
            && self.class_id == other.class_id
            && self.version == other.version
            && self.fields == other.fields
    }
}

impl Eq for ClassDefinition {}

impl fmt::Display for ClassDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ClassDefinition(factory_id={}, class_id={}, version=",
            self.factory_id, self.class_id
        )?;
        match self.version {
            Some(version) => write!(f, "{}", version)?,
            None => write!(f, "unset")?,
        }
        write!(f, ", fields=[")?;
        for (i, fd) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{:?}", fd.name(), fd.field_type())?;
        }
        write!(f, "])")
    }
}

/// Serializable form of a class definition, used by configuration files
/// and registry snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDefinitionRecord {
    pub factory_id: i32,
    pub class_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl ClassDefinitionRecord {
    /// Rebuild the definition, enforcing field order and name uniqueness.
    pub fn into_class_definition(self) -> SchemaResult<ClassDefinition> {
        let mut builder =
            ClassDefinitionBuilder::with_version(self.factory_id, self.class_id, self.version);
        for fd in self.fields {
            builder.add_field_def(fd)?;
        }
        Ok(builder.build())
    }
}
