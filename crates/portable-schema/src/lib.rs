// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Class definition registry for the Portable binary format.
//!
//! Portable payloads are self-describing: object layouts are not fixed at
//! compile time but discovered from the wire and cached as versioned class
//! definitions keyed by `(factory_id, class_id, version)`.
//!
//! # Features
//!
//! - **Registry**: per-factory, consistency-checked store of versioned
//!   class definitions; two different layouts never share an identity
//! - **Schema discovery**: recursive extraction of nested class definitions
//!   straight from a payload's offset table
//! - **Schema capture**: derive a definition from any [`Portable`] object
//!   through its write procedure
//! - **Field paths**: dotted-path resolution across nested Portable fields
//! - **Configuration**: TOML configuration with preloaded class definitions
//! - **Persistence**: JSON snapshots of the registry
//!
//! # Architecture
//!
//! ```text
//!   payload bytes --Cursor--> PortableContext::read_class_definition
//!                                   |
//!   Portable object --ClassDefinitionWriter--+
//!                                   v
//!                  PortableContext (factory_id -> ClassDefinitionContext)
//!                                   |
//!                                   v
//!                  ClassDefinitionContext ((class_id, version) -> ClassDefinition)
//! ```
//!
//! # Example
//!
//! ```rust
//! use portable_schema::{ClassDefinitionBuilder, FieldType, PortableContext};
//!
//! let context = PortableContext::new(0);
//!
//! let mut address = ClassDefinitionBuilder::new(1, 2);
//! address.add_utf_field("city").unwrap();
//! let address = context.register_class_definition(address.build()).unwrap();
//!
//! let mut person = ClassDefinitionBuilder::new(1, 1);
//! person.add_utf_field("name").unwrap();
//! person.add_portable_field("address", &address).unwrap();
//! let person = context.register_class_definition(person.build()).unwrap();
//!
//! let city = context
//!     .get_field_definition(&person, "address.city")
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(city.field_type(), FieldType::Utf);
//! ```

pub mod builder;
pub mod class_def;
pub mod compatibility;
pub mod config;
pub mod context;
pub mod cursor;
pub mod error;
pub mod extractor;
pub mod field;
pub mod persistence;
pub mod registry;
pub mod writer;

pub use builder::ClassDefinitionBuilder;
pub use class_def::{ClassDefinition, ClassDefinitionRecord};
pub use compatibility::diff_class_definitions;
pub use config::{ConfigError, SerializationConfig};
pub use context::PortableContext;
pub use cursor::{ByteOrder, Cursor, CursorMut};
pub use error::{SchemaError, SchemaResult};
pub use extractor::MAX_NESTING_DEPTH;
pub use field::{FieldDefinition, FieldName, FieldType};
pub use persistence::FilePersistence;
pub use registry::ClassDefinitionContext;
pub use writer::{ClassDefinitionWriter, Portable, PortableWriter};
