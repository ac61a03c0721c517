// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema-capturing writer contract.
//!
//! A [`Portable`] object describes itself by writing each named field into
//! a [`PortableWriter`]. [`ClassDefinitionWriter`] ignores the values and
//! records one field definition per call, yielding the class definition of
//! the object without serializing anything.

use std::sync::Arc;

use crate::builder::ClassDefinitionBuilder;
use crate::class_def::ClassDefinition;
use crate::context::PortableContext;
use crate::error::{SchemaError, SchemaResult};
use crate::field::FieldType;

/// Object whose layout is described by a class definition.
pub trait Portable {
    fn factory_id(&self) -> i32;

    fn class_id(&self) -> i32;

    /// Explicit class version; `None` falls back to the context default.
    fn class_version(&self) -> Option<i32> {
        None
    }

    /// Write every field, once each, in any order.
    fn write_portable(&self, writer: &mut dyn PortableWriter) -> SchemaResult<()>;
}

/// Generate provided write methods for leaf field types.
macro_rules! leaf_writes {
    ($($method:ident($value:ty) => $field_type:ident),* $(,)?) => {
        $(
            fn $method(&mut self, name: &str, _value: $value) -> SchemaResult<()> {
                self.declare_field(name, FieldType::$field_type)
            }
        )*
    };
}

/// Field sink driven by [`Portable::write_portable`].
pub trait PortableWriter {
    /// Declare a leaf field of the given type.
    fn declare_field(&mut self, name: &str, field_type: FieldType) -> SchemaResult<()>;

    /// Write a nested object. `None` only works when the writer can learn
    /// the nested schema some other way.
    fn write_portable(&mut self, name: &str, value: Option<&dyn Portable>) -> SchemaResult<()>;

    /// Write an absent nested object identified by factory and class id.
    fn write_null_portable(&mut self, name: &str, factory_id: i32, class_id: i32)
        -> SchemaResult<()>;

    fn write_portable_array(&mut self, name: &str, values: &[&dyn Portable]) -> SchemaResult<()>;

    leaf_writes! {
        write_byte(i8) => Byte,
        write_boolean(bool) => Boolean,
        write_char(u16) => Char,
        write_short(i16) => Short,
        write_int(i32) => Int,
        write_long(i64) => Long,
        write_float(f32) => Float,
        write_double(f64) => Double,
        write_utf(Option<&str>) => Utf,
        write_byte_array(&[i8]) => ByteArray,
        write_boolean_array(&[bool]) => BooleanArray,
        write_char_array(&[u16]) => CharArray,
        write_short_array(&[i16]) => ShortArray,
        write_int_array(&[i32]) => IntArray,
        write_long_array(&[i64]) => LongArray,
        write_float_array(&[f32]) => FloatArray,
        write_double_array(&[f64]) => DoubleArray,
        write_utf_array(&[Option<&str>]) => UtfArray,
    }
}

/// Writer that turns field declarations into a class definition bound to
/// one `(factory, class, version)` identity.
pub struct ClassDefinitionWriter<'a> {
    context: &'a PortableContext,
    builder: ClassDefinitionBuilder,
}

impl<'a> ClassDefinitionWriter<'a> {
    pub fn new(context: &'a PortableContext, factory_id: i32, class_id: i32, version: i32) -> Self {
        Self {
            context,
            builder: ClassDefinitionBuilder::with_version(factory_id, class_id, Some(version)),
        }
    }

    fn version(&self) -> i32 {
        self.builder
            .version()
            .unwrap_or_else(|| self.context.get_portable_version())
    }

    /// Build the captured definition and register it with the context.
    pub fn register_and_get(self) -> SchemaResult<Arc<ClassDefinition>> {
        let class_def = Arc::new(self.builder.build());
        self.context.register_class_definition(class_def)
    }
}

impl PortableWriter for ClassDefinitionWriter<'_> {
    fn declare_field(&mut self, name: &str, field_type: FieldType) -> SchemaResult<()> {
        match field_type {
            FieldType::Byte => self.builder.add_byte_field(name),
            FieldType::Boolean => self.builder.add_boolean_field(name),
            FieldType::Char => self.builder.add_char_field(name),
            FieldType::Short => self.builder.add_short_field(name),
            FieldType::Int => self.builder.add_int_field(name),
            FieldType::Long => self.builder.add_long_field(name),
            FieldType::Float => self.builder.add_float_field(name),
            FieldType::Double => self.builder.add_double_field(name),
            FieldType::Utf => self.builder.add_utf_field(name),
            FieldType::ByteArray => self.builder.add_byte_array_field(name),
            FieldType::BooleanArray => self.builder.add_boolean_array_field(name),
            FieldType::CharArray => self.builder.add_char_array_field(name),
            FieldType::ShortArray => self.builder.add_short_array_field(name),
            FieldType::IntArray => self.builder.add_int_array_field(name),
            FieldType::LongArray => self.builder.add_long_array_field(name),
            FieldType::FloatArray => self.builder.add_float_array_field(name),
            FieldType::DoubleArray => self.builder.add_double_array_field(name),
            FieldType::UtfArray => self.builder.add_utf_array_field(name),
            FieldType::Portable | FieldType::PortableArray => {
                return Err(SchemaError::NullPortable(name.to_string()))
            }
        }?;
        Ok(())
    }

    fn write_portable(&mut self, name: &str, value: Option<&dyn Portable>) -> SchemaResult<()> {
        let portable = value.ok_or_else(|| SchemaError::NullPortable(name.to_string()))?;
        let nested = self.context.lookup_or_register_class_definition(portable)?;
        self.builder.add_portable_field(name, &nested)?;
        Ok(())
    }

    fn write_null_portable(
        &mut self,
        name: &str,
        factory_id: i32,
        class_id: i32,
    ) -> SchemaResult<()> {
        let version = self.version();
        let nested = self
            .context
            .lookup_class_definition(factory_id, class_id, version)
            .ok_or_else(|| {
                SchemaError::UnresolvedNestedSchema(format!(
                    "{} (factory {}, class {}, version {})",
                    name, factory_id, class_id, version
                ))
            })?;
        self.builder.add_portable_field(name, &nested)?;
        Ok(())
    }

    fn write_portable_array(&mut self, name: &str, values: &[&dyn Portable]) -> SchemaResult<()> {
        let first = values
            .first()
            .ok_or_else(|| SchemaError::EmptyPortableArray(name.to_string()))?;
        let identity = (first.factory_id(), first.class_id());
        if values
            .iter()
            .any(|p| (p.factory_id(), p.class_id()) != identity)
        {
            return Err(SchemaError::MixedPortableArray(name.to_string()));
        }
        let nested = self.context.lookup_or_register_class_definition(*first)?;
        self.builder.add_portable_array_field(name, &nested)?;
        Ok(())
    }
}
