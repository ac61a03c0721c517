// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Portable context: the process-scoped class definition registry.
//!
//! # Architecture
//!
//! ```text
//! PortableContext (one per serialization service)
//! +-- portable_version: default version for unversioned classes
//! +-- class_defs: DashMap<factory_id, Arc<ClassDefinitionContext>>
//!
//! ClassDefinitionContext (one per factory id, created on first use)
//! +-- Mutex { current_versions, definitions[(class_id, version)] }
//! ```
//!
//! # Thread Safety
//!
//! - Factory contexts are created with `entry().or_insert_with()`, which
//!   holds the shard lock across lookup and insert, so concurrent first
//!   access never forks a factory's registry.
//! - Shard guards are dropped before delegating, so nested registrations
//!   (writer -> nested portable -> same factory) cannot self-deadlock.

use std::sync::Arc;

use dashmap::DashMap;

use crate::class_def::ClassDefinition;
use crate::config::SerializationConfig;
use crate::cursor::{ByteOrder, Cursor};
use crate::error::{SchemaError, SchemaResult};
use crate::field::FieldDefinition;
use crate::registry::ClassDefinitionContext;
use crate::writer::{ClassDefinitionWriter, Portable};

/// Registry of class definitions across all factories.
#[derive(Debug)]
pub struct PortableContext {
    portable_version: i32,
    byte_order: ByteOrder,
    strict_schema_discovery: bool,
    class_defs: DashMap<i32, Arc<ClassDefinitionContext>>,
}

impl PortableContext {
    pub fn new(portable_version: i32) -> Self {
        Self {
            portable_version,
            byte_order: ByteOrder::default(),
            strict_schema_discovery: false,
            class_defs: DashMap::new(),
        }
    }

    /// Build a context from configuration and register the class
    /// definitions it declares.
    pub fn from_config(config: &SerializationConfig) -> SchemaResult<Self> {
        config.validate()?;
        let mut context = Self::new(config.portable_version);
        context.byte_order = config.byte_order;
        context.strict_schema_discovery = config.strict_schema_discovery;
        for record in &config.class_definitions {
            let class_def = record.clone().into_class_definition()?;
            context.register_class_definition(class_def)?;
        }
        log::debug!(
            "[portable] context ready: version={} preloaded={}",
            context.portable_version,
            config.class_definitions.len()
        );
        Ok(context)
    }

    pub fn get_portable_version(&self) -> i32 {
        self.portable_version
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Read cursor over `buf` in the configured byte order.
    pub fn cursor<'a>(&self, buf: &'a [u8]) -> Cursor<'a> {
        Cursor::new(buf, self.byte_order)
    }

    pub(crate) fn strict_schema_discovery(&self) -> bool {
        self.strict_schema_discovery
    }

    /// Current version of a class, `None` when never set.
    pub fn get_class_version(&self, factory_id: i32, class_id: i32) -> Option<i32> {
        self.class_def_context(factory_id).get_class_version(class_id)
    }

    pub fn set_class_version(&self, factory_id: i32, class_id: i32, version: i32) -> SchemaResult<()> {
        self.class_def_context(factory_id)
            .set_class_version(class_id, version)
    }

    pub fn lookup_class_definition(
        &self,
        factory_id: i32,
        class_id: i32,
        version: i32,
    ) -> Option<Arc<ClassDefinition>> {
        self.class_def_context(factory_id).lookup(class_id, version)
    }

    /// Register a definition with the context of its factory and return the
    /// canonical instance, which may be a previously stored equal one.
    pub fn register_class_definition(
        &self,
        class_def: impl Into<Arc<ClassDefinition>>,
    ) -> SchemaResult<Arc<ClassDefinition>> {
        let class_def = class_def.into();
        self.class_def_context(class_def.factory_id())
            .register(class_def)
    }

    /// Return the definition of `portable`, capturing and registering it
    /// through its write procedure when it is not known yet.
    pub fn lookup_or_register_class_definition(
        &self,
        portable: &dyn Portable,
    ) -> SchemaResult<Arc<ClassDefinition>> {
        let factory_id = portable.factory_id();
        let class_id = portable.class_id();
        let version = portable.class_version().unwrap_or(self.portable_version);

        if let Some(class_def) = self.lookup_class_definition(factory_id, class_id, version) {
            return Ok(class_def);
        }

        let mut writer = ClassDefinitionWriter::new(self, factory_id, class_id, version);
        portable.write_portable(&mut writer)?;
        writer.register_and_get()
    }

    /// Resolve a possibly dotted field path across nested Portable fields.
    ///
    /// Every segment but the last must name a Portable field whose nested
    /// definition is registered at the version of the current definition.
    /// The last segment may be absent, in which case `Ok(None)` is returned.
    /// Paths are matched byte-for-byte, so non-UTF-8 names resolve too.
    pub fn get_field_definition(
        &self,
        class_def: &ClassDefinition,
        path: impl AsRef<[u8]>,
    ) -> SchemaResult<Option<FieldDefinition>> {
        let path = path.as_ref();
        if let Some(fd) = class_def.field(path) {
            return Ok(Some(fd.clone()));
        }

        let segments: Vec<&[u8]> = path.split(|&b| b == b'.').collect();
        let Some((last, parents)) = segments.split_last() else {
            return Ok(None);
        };

        let mut current: Option<Arc<ClassDefinition>> = None;
        for segment in parents {
            let current_def = current.as_deref().unwrap_or(class_def);
            let fd = current_def
                .field(segment)
                .ok_or_else(|| {
                    SchemaError::UnknownField(String::from_utf8_lossy(segment).into_owned())
                })?;
            let version = current_def.version().unwrap_or(self.portable_version);
            let nested = self
                .lookup_class_definition(fd.factory_id(), fd.class_id(), version)
                .ok_or_else(|| SchemaError::UnresolvedNestedSchema(fd.to_string()))?;
            current = Some(nested);
        }

        let current_def = current.as_deref().unwrap_or(class_def);
        Ok(current_def.field(last).cloned())
    }

    /// Factory ids with a context, sorted.
    pub fn factory_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.class_defs.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    /// Snapshot of every registered definition, ordered by factory id.
    pub fn class_definitions(&self) -> Vec<Arc<ClassDefinition>> {
        self.factory_ids()
            .into_iter()
            .filter_map(|factory_id| self.existing_class_def_context(factory_id))
            .flat_map(|ctx| ctx.definitions())
            .collect()
    }

    /// Context of `factory_id` if one exists, without creating it.
    pub(crate) fn existing_class_def_context(
        &self,
        factory_id: i32,
    ) -> Option<Arc<ClassDefinitionContext>> {
        self.class_defs.get(&factory_id).map(|ctx| Arc::clone(ctx.value()))
    }

    /// Context of `factory_id`, created on first reference.
    pub(crate) fn class_def_context(&self, factory_id: i32) -> Arc<ClassDefinitionContext> {
        if let Some(ctx) = self.class_defs.get(&factory_id) {
            return Arc::clone(ctx.value());
        }
        let entry = self.class_defs.entry(factory_id).or_insert_with(|| {
            log::debug!("[portable] new class definition context for factory {}", factory_id);
            Arc::new(ClassDefinitionContext::new(
                factory_id,
                self.portable_version,
            ))
        });
        Arc::clone(entry.value())
    }
}

impl Default for PortableContext {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ClassDefinitionBuilder;
    use crate::class_def::ClassDefinitionRecord;
    use crate::field::FieldType;

    fn leaf_class(factory_id: i32, class_id: i32, field: &str) -> ClassDefinition {
        let mut builder = ClassDefinitionBuilder::new(factory_id, class_id);
        builder.add_int_field(field).unwrap();
        builder.build()
    }

    #[test]
    fn factory_context_is_created_once() {
        let ctx = PortableContext::new(0);
        let a = ctx.class_def_context(3);
        let b = ctx.class_def_context(3);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(ctx.factory_ids(), vec![3]);
    }

    #[test]
    fn registration_survives_across_lookups() {
        let ctx = PortableContext::new(1);
        let stored = ctx.register_class_definition(leaf_class(2, 5, "x")).unwrap();
        assert_eq!(stored.version(), Some(1));
        let found = ctx.lookup_class_definition(2, 5, 1).unwrap();
        assert!(Arc::ptr_eq(&stored, &found));
    }

    #[test]
    fn class_versions_delegate_per_factory() {
        let ctx = PortableContext::new(0);
        ctx.set_class_version(1, 9, 2).unwrap();
        assert_eq!(ctx.get_class_version(1, 9), Some(2));
        assert_eq!(ctx.get_class_version(2, 9), None);
        assert!(matches!(
            ctx.set_class_version(1, 9, 3),
            Err(SchemaError::VersionConflict { .. })
        ));
    }

    #[test]
    fn dotted_path_resolution() {
        let ctx = PortableContext::new(0);
        let b = ctx.register_class_definition(leaf_class(1, 2, "c")).unwrap();
        let mut builder = ClassDefinitionBuilder::new(1, 1);
        builder.add_portable_field("b", &b).unwrap();
        let a = ctx.register_class_definition(builder.build()).unwrap();

        let fd = ctx.get_field_definition(&a, "b.c").unwrap().unwrap();
        assert_eq!(fd.name(), "c");
        assert_eq!(fd.field_type(), FieldType::Int);

        assert_eq!(ctx.get_field_definition(&a, "b").unwrap().unwrap().class_id(), 2);
        assert_eq!(ctx.get_field_definition(&a, "b.missing").unwrap(), None);
        assert_eq!(ctx.get_field_definition(&a, "zzz").unwrap(), None);
        assert_eq!(
            ctx.get_field_definition(&a, "x.c").unwrap_err(),
            SchemaError::UnknownField("x".into())
        );
    }

    #[test]
    fn dotted_path_with_raw_name_bytes() {
        let ctx = PortableContext::new(0);
        let mut inner = ClassDefinitionBuilder::new(1, 2);
        inner.add_int_field(&b"v\xfe"[..]).unwrap();
        let inner = ctx.register_class_definition(inner.build()).unwrap();
        let mut outer = ClassDefinitionBuilder::new(1, 1);
        outer.add_portable_field(&b"\xffo"[..], &inner).unwrap();
        let outer = ctx.register_class_definition(outer.build()).unwrap();

        let fd = ctx
            .get_field_definition(&outer, b"\xffo.v\xfe")
            .unwrap()
            .unwrap();
        assert_eq!(fd.name().as_bytes(), b"v\xfe");
        assert_eq!(fd.field_type(), FieldType::Int);
    }

    #[test]
    fn dotted_path_needs_registered_nested_schema() {
        let ctx = PortableContext::new(0);
        let b = leaf_class(1, 2, "c").with_version_if_unset(0);
        let mut builder = ClassDefinitionBuilder::new(1, 1);
        builder.add_portable_field("b", &b).unwrap();
        let a = ctx.register_class_definition(builder.build()).unwrap();

        match ctx.get_field_definition(&a, "b.c").unwrap_err() {
            SchemaError::UnresolvedNestedSchema(field) => assert!(field.contains("name=b")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn from_config_preloads_definitions() {
        let mut config = SerializationConfig::default()
            .with_portable_version(4)
            .with_byte_order(ByteOrder::LittleEndian);
        config.add_class_definition(ClassDefinitionRecord {
            factory_id: 1,
            class_id: 2,
            version: None,
            fields: vec![FieldDefinition::leaf(0, "id", FieldType::Long)],
        });
        let ctx = PortableContext::from_config(&config).unwrap();
        assert_eq!(ctx.get_portable_version(), 4);
        assert_eq!(ctx.byte_order(), ByteOrder::LittleEndian);
        assert_eq!(ctx.cursor(&[]).byte_order(), ByteOrder::LittleEndian);
        let cd = ctx.lookup_class_definition(1, 2, 4).unwrap();
        assert_eq!(cd.field_type("id"), Some(FieldType::Long));
        assert_eq!(ctx.class_definitions().len(), 1);
    }

    #[test]
    fn from_config_rejects_invalid_config() {
        let config = SerializationConfig::default().with_portable_version(-2);
        assert!(matches!(
            PortableContext::from_config(&config),
            Err(SchemaError::Config(_))
        ));
    }
}
