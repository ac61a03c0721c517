// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Builder accumulating field definitions in declaration order.

use std::collections::HashSet;

use crate::class_def::ClassDefinition;
use crate::error::{SchemaError, SchemaResult};
use crate::field::{FieldDefinition, FieldName, FieldType};

/// Generate one typed adder per leaf field type.
macro_rules! impl_leaf_adders {
    ($($name:ident => $field_type:ident),* $(,)?) => {
        $(
            pub fn $name(&mut self, name: impl Into<FieldName>) -> SchemaResult<&mut Self> {
                self.add_next(name.into(), FieldType::$field_type, 0, 0)
            }
        )*
    };
}

/// Single-use builder for a [`ClassDefinition`].
///
/// Fields must arrive with `index == number of fields already added`;
/// `build` consumes the builder.
#[derive(Debug)]
pub struct ClassDefinitionBuilder {
    factory_id: i32,
    class_id: i32,
    version: Option<i32>,
    fields: Vec<FieldDefinition>,
    names: HashSet<FieldName>,
}

impl ClassDefinitionBuilder {
    /// Builder whose version is stamped at registration time.
    pub fn new(factory_id: i32, class_id: i32) -> Self {
        Self::with_version(factory_id, class_id, None)
    }

    pub fn with_version(factory_id: i32, class_id: i32, version: Option<i32>) -> Self {
        Self {
            factory_id,
            class_id,
            version,
            fields: Vec::new(),
            names: HashSet::new(),
        }
    }

    pub fn factory_id(&self) -> i32 {
        self.factory_id
    }

    pub fn class_id(&self) -> i32 {
        self.class_id
    }

    pub fn version(&self) -> Option<i32> {
        self.version
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Append a fully formed field definition.
    pub fn add_field_def(&mut self, fd: FieldDefinition) -> SchemaResult<&mut Self> {
        if fd.index() != self.fields.len() {
            return Err(SchemaError::FieldIndexMismatch {
                expected: self.fields.len(),
                actual: fd.index(),
            });
        }
        if !self.names.insert(fd.name().clone()) {
            return Err(SchemaError::DuplicateField(fd.name().to_string()));
        }
        self.fields.push(fd);
        Ok(self)
    }

    impl_leaf_adders! {
        add_byte_field => Byte,
        add_boolean_field => Boolean,
        add_char_field => Char,
        add_short_field => Short,
        add_int_field => Int,
        add_long_field => Long,
        add_float_field => Float,
        add_double_field => Double,
        add_utf_field => Utf,
        add_byte_array_field => ByteArray,
        add_boolean_array_field => BooleanArray,
        add_char_array_field => CharArray,
        add_short_array_field => ShortArray,
        add_int_array_field => IntArray,
        add_long_array_field => LongArray,
        add_float_array_field => FloatArray,
        add_double_array_field => DoubleArray,
        add_utf_array_field => UtfArray,
    }

    /// Add a nested Portable field pointing at `nested`.
    pub fn add_portable_field(
        &mut self,
        name: impl Into<FieldName>,
        nested: &ClassDefinition,
    ) -> SchemaResult<&mut Self> {
        self.add_next(
            name.into(),
            FieldType::Portable,
            nested.factory_id(),
            nested.class_id(),
        )
    }

    pub fn add_portable_array_field(
        &mut self,
        name: impl Into<FieldName>,
        nested: &ClassDefinition,
    ) -> SchemaResult<&mut Self> {
        self.add_next(
            name.into(),
            FieldType::PortableArray,
            nested.factory_id(),
            nested.class_id(),
        )
    }

    pub fn build(self) -> ClassDefinition {
        ClassDefinition::from_parts(self.factory_id, self.class_id, self.version, self.fields)
    }

    fn add_next(
        &mut self,
        name: FieldName,
        field_type: FieldType,
        factory_id: i32,
        class_id: i32,
    ) -> SchemaResult<&mut Self> {
        let index = self.fields.len();
        self.add_field_def(FieldDefinition::new(
            index, name, field_type, factory_id, class_id,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adders_assign_consecutive_indexes() {
        let mut builder = ClassDefinitionBuilder::with_version(1, 2, Some(3));
        builder
            .add_long_field("id")
            .and_then(|b| b.add_utf_array_field("tags"))
            .and_then(|b| b.add_double_field("score"))
            .expect("distinct names");
        let cd = builder.build();

        assert_eq!((cd.factory_id(), cd.class_id(), cd.version()), (1, 2, Some(3)));
        let summary: Vec<_> = cd
            .fields()
            .iter()
            .map(|fd| (fd.index(), fd.name().to_string(), fd.field_type()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (0, "id".to_string(), FieldType::Long),
                (1, "tags".to_string(), FieldType::UtfArray),
                (2, "score".to_string(), FieldType::Double),
            ]
        );
    }

    #[test]
    fn out_of_order_index_is_rejected() {
        let mut builder = ClassDefinitionBuilder::new(1, 2);
        let err = builder
            .add_field_def(FieldDefinition::leaf(1, "late", FieldType::Int))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::FieldIndexMismatch {
                expected: 0,
                actual: 1
            }
        );
        assert_eq!(builder.field_count(), 0);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut builder = ClassDefinitionBuilder::new(1, 2);
        builder.add_int_field("x").expect("first");
        assert_eq!(
            builder.add_long_field("x").unwrap_err(),
            SchemaError::DuplicateField("x".into())
        );
    }

    #[test]
    fn portable_fields_carry_nested_identity() {
        let nested = ClassDefinitionBuilder::with_version(7, 8, Some(0)).build();
        let mut builder = ClassDefinitionBuilder::new(1, 2);
        builder
            .add_portable_field("child", &nested)
            .and_then(|b| b.add_portable_array_field("children", &nested))
            .expect("distinct names");
        let cd = builder.build();

        let child = cd.field("child").expect("child");
        assert_eq!(child.field_type(), FieldType::Portable);
        assert_eq!((child.factory_id(), child.class_id()), (7, 8));
        let children = cd.field("children").expect("children");
        assert_eq!(children.field_type(), FieldType::PortableArray);
        assert_eq!(children.index(), 1);
        assert_eq!(cd.version(), None);
    }
}
