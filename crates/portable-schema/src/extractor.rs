// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema discovery from serialized Portable payloads.
//!
//! Payload layout, positioned right after the type header:
//!
//! ```text
//! [final_offset: i32][field_count: i32][field_count x offset: i32][field records...]
//!
//! field record   = [name_len: i16][name bytes][type tag: u8][body]
//! Portable body  = [is_null: u8][factory_id: i32][class_id: i32]
//!                  then, when not null: [version: i32][nested payload]
//! Array body     = [k: i32][factory_id: i32][class_id: i32]
//!                  then, when k > 0: [first element offset: i32]
//!                  and at that offset: [version: i32][nested payload]
//! ```
//!
//! Nested definitions are staged while parsing and committed only when the
//! whole top-level extraction succeeded. A definition built from a payload
//! holding a null Portable or an empty PortableArray is returned to the
//! caller but never registered.
//!
//! Field names are kept as raw bytes; no encoding is assumed.

use std::collections::HashMap;
use std::sync::Arc;

use crate::builder::ClassDefinitionBuilder;
use crate::class_def::ClassDefinition;
use crate::context::PortableContext;
use crate::cursor::Cursor;
use crate::error::{SchemaError, SchemaResult};
use crate::field::{FieldDefinition, FieldName, FieldType};

/// Deepest nesting accepted before the payload is considered malformed.
pub const MAX_NESTING_DEPTH: usize = 64;

const OFFSET_ENTRY_SIZE: usize = 4;

/// Result of parsing one payload level.
struct Extracted {
    class_def: ClassDefinition,
    fully_resolved: bool,
}

impl PortableContext {
    /// Derive the class definition of the payload under `cursor`.
    ///
    /// Fully resolved definitions (and every fully resolved nested one) are
    /// registered and the registered instance is returned. On any error the
    /// cursor is restored to where it started.
    ///
    /// Parse and validation failures leave the registry untouched. Commits
    /// happen one definition at a time, so a conflicting definition that
    /// another thread registers between validation and commit fails the
    /// call after the nested definitions committed before it.
    pub fn read_class_definition(
        &self,
        cursor: &mut Cursor<'_>,
        factory_id: i32,
        class_id: i32,
        version: i32,
    ) -> SchemaResult<Arc<ClassDefinition>> {
        let start = cursor.position();
        match self.discover(cursor, factory_id, class_id, version) {
            Ok(class_def) => Ok(class_def),
            Err(err) => {
                cursor.set_position(start)?;
                log::debug!(
                    "[portable] schema discovery failed factory={} class={} version={}: {}",
                    factory_id,
                    class_id,
                    version,
                    err
                );
                Err(err)
            }
        }
    }

    fn discover(
        &self,
        cursor: &mut Cursor<'_>,
        factory_id: i32,
        class_id: i32,
        version: i32,
    ) -> SchemaResult<Arc<ClassDefinition>> {
        let mut staged = Vec::new();
        let extracted = self.extract(cursor, factory_id, class_id, version, 0, &mut staged)?;
        self.validate_staged(&staged, &extracted)?;

        for nested in staged {
            self.register_class_definition(nested)?;
        }

        if extracted.fully_resolved {
            return self.register_class_definition(extracted.class_def);
        }

        log::debug!(
            "[portable] partially resolved {} not registered (null or empty nested field)",
            extracted.class_def
        );
        Ok(Arc::new(extracted.class_def))
    }

    fn extract(
        &self,
        cursor: &mut Cursor<'_>,
        factory_id: i32,
        class_id: i32,
        version: i32,
        depth: usize,
        staged: &mut Vec<ClassDefinition>,
    ) -> SchemaResult<Extracted> {
        if depth > MAX_NESTING_DEPTH {
            return Err(SchemaError::malformed(
                cursor.position(),
                format!("portable nesting deeper than {}", MAX_NESTING_DEPTH),
            ));
        }

        // Boundary marker, not needed to learn the layout.
        cursor.read_i32()?;

        let count_offset = cursor.position();
        let field_count = cursor.read_i32()?;
        let field_count = usize::try_from(field_count).map_err(|_| {
            SchemaError::malformed(count_offset, format!("negative field count {}", field_count))
        })?;
        let offset_table_base = cursor.position();

        let mut builder = ClassDefinitionBuilder::with_version(factory_id, class_id, Some(version));
        let mut fully_resolved = true;

        for index in 0..field_count {
            let entry = offset_table_base + index * OFFSET_ENTRY_SIZE;
            let position = cursor.read_i32_at(entry)?;
            let position = usize::try_from(position).map_err(|_| {
                SchemaError::malformed(entry, format!("negative field offset {}", position))
            })?;
            cursor.set_position(position)?;

            let name = read_field_name(cursor)?;
            let tag_offset = cursor.position();
            let tag = cursor.read_u8()?;
            let field_type = FieldType::from_id(tag).ok_or_else(|| {
                SchemaError::malformed(tag_offset, format!("unknown field type tag {}", tag))
            })?;

            let (nested_factory_id, nested_class_id) = match field_type {
                FieldType::Portable => {
                    let is_null = cursor.read_bool()?;
                    let nested_factory_id = cursor.read_i32()?;
                    let nested_class_id = cursor.read_i32()?;
                    if is_null {
                        fully_resolved = false;
                    } else {
                        let nested_version = cursor.read_i32()?;
                        self.extract_nested(
                            cursor,
                            nested_factory_id,
                            nested_class_id,
                            nested_version,
                            depth,
                            staged,
                        )?;
                    }
                    (nested_factory_id, nested_class_id)
                }
                FieldType::PortableArray => {
                    let len = cursor.read_i32()?;
                    let nested_factory_id = cursor.read_i32()?;
                    let nested_class_id = cursor.read_i32()?;
                    if len > 0 {
                        let first_entry = cursor.position();
                        let first = cursor.read_i32()?;
                        let first = usize::try_from(first).map_err(|_| {
                            SchemaError::malformed(
                                first_entry,
                                format!("negative element offset {}", first),
                            )
                        })?;
                        cursor.set_position(first)?;
                        let nested_version = cursor.read_i32()?;
                        self.extract_nested(
                            cursor,
                            nested_factory_id,
                            nested_class_id,
                            nested_version,
                            depth,
                            staged,
                        )?;
                    } else {
                        fully_resolved = false;
                    }
                    (nested_factory_id, nested_class_id)
                }
                leaf if self.strict_schema_discovery() => {
                    return Err(SchemaError::malformed(
                        tag_offset,
                        format!("field {} has non-portable type {:?}", name, leaf),
                    ));
                }
                _ => (0, 0),
            };

            log::trace!(
                "[portable] field {} of ({}, {}): {} {:?}",
                index,
                factory_id,
                class_id,
                name,
                field_type
            );
            builder.add_field_def(FieldDefinition::new(
                index,
                name,
                field_type,
                nested_factory_id,
                nested_class_id,
            ))?;
        }

        Ok(Extracted {
            class_def: builder.build(),
            fully_resolved,
        })
    }

    fn extract_nested(
        &self,
        cursor: &mut Cursor<'_>,
        factory_id: i32,
        class_id: i32,
        version: i32,
        depth: usize,
        staged: &mut Vec<ClassDefinition>,
    ) -> SchemaResult<()> {
        let nested = self.extract(cursor, factory_id, class_id, version, depth + 1, staged)?;
        if nested.fully_resolved {
            staged.push(nested.class_def);
        }
        Ok(())
    }

    /// Check every definition about to be committed, against the registry
    /// and against each other, before anything is stored. Factories without
    /// a context yet accept anything and are not created here.
    fn validate_staged(&self, staged: &[ClassDefinition], top: &Extracted) -> SchemaResult<()> {
        let top_level = top.fully_resolved.then_some(&top.class_def);
        let mut seen: HashMap<(i32, i32, Option<i32>), &ClassDefinition> = HashMap::new();

        for class_def in staged.iter().chain(top_level) {
            let key = (class_def.factory_id(), class_def.class_id(), class_def.version());
            if let Some(previous) = seen.get(&key) {
                if *previous != class_def {
                    let version = class_def.version().unwrap_or(self.get_portable_version());
                    return Err(SchemaError::IncompatibleDefinitions {
                        factory_id: key.0,
                        class_id: key.1,
                        version,
                        details: crate::compatibility::diff_class_definitions(previous, class_def),
                    });
                }
                continue;
            }
            seen.insert(key, class_def);
            if let Some(registry) = self.existing_class_def_context(class_def.factory_id()) {
                registry.check_registrable(class_def)?;
            }
        }
        Ok(())
    }
}

fn read_field_name(cursor: &mut Cursor<'_>) -> SchemaResult<FieldName> {
    let len_offset = cursor.position();
    let len = cursor.read_i16()?;
    let len = usize::try_from(len).map_err(|_| {
        SchemaError::malformed(len_offset, format!("negative field name length {}", len))
    })?;
    Ok(FieldName::from(cursor.read_bytes(len)?))
}
