// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error type shared by the registry, the extractor and the writer.

use thiserror::Error;

/// Errors produced while registering, resolving or discovering class definitions.
///
/// None of these are retried internally; they abort the single operation
/// that raised them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Truncated buffer, out-of-range seek, or an unsupported field type tag.
    #[error("malformed portable data at offset {offset}: {reason}")]
    MalformedData { offset: usize, reason: String },

    /// A definition was registered against the context of another factory.
    #[error("invalid factory id: context {expected} cannot hold a definition of factory {actual}")]
    InvalidFactory { expected: i32, actual: i32 },

    /// Two structurally different definitions share `(class_id, version)`.
    #[error(
        "incompatible class definitions with same identity (factory {factory_id}, class {class_id}, version {version}): {}",
        .details.join("; ")
    )]
    IncompatibleDefinitions {
        factory_id: i32,
        class_id: i32,
        version: i32,
        details: Vec<String>,
    },

    /// `set_class_version` was called again with a different value.
    #[error(
        "class id {class_id} of factory {factory_id} already registered with version {current}, refusing {requested}"
    )]
    VersionConflict {
        factory_id: i32,
        class_id: i32,
        current: i32,
        requested: i32,
    },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Not a registered Portable field: {0}")]
    UnresolvedNestedSchema(String),

    /// A field was added to a builder out of declaration order.
    #[error("field index mismatch: expected {expected}, got {actual}")]
    FieldIndexMismatch { expected: usize, actual: usize },

    #[error("field already declared: {0}")]
    DuplicateField(String),

    /// A null nested object cannot describe its own schema.
    #[error("cannot capture the schema of null portable field {0} without its class identity")]
    NullPortable(String),

    #[error("cannot capture the schema of empty portable array field {0}")]
    EmptyPortableArray(String),

    #[error("portable array field {0} mixes elements of different classes")]
    MixedPortableArray(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl SchemaError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        SchemaError::MalformedData {
            offset,
            reason: reason.into(),
        }
    }
}

pub type SchemaResult<T> = core::result::Result<T, SchemaError>;
