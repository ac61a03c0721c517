// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Hand-built Portable payloads in the canonical offset-table layout.

#![allow(dead_code)]

use portable_schema::{CursorMut, FieldType};

/// One field of a test payload.
pub enum TestField {
    /// Leaf field followed by a 4-byte placeholder value.
    Leaf(&'static str, FieldType),
    /// Field with an arbitrary type tag.
    RawTag(&'static str, u8),
    /// Nested object; `None` writes the null flag.
    Portable {
        name: &'static str,
        factory_id: i32,
        class_id: i32,
        nested: Option<(i32, Vec<TestField>)>,
    },
    /// Array of nested objects, each `(version, fields)`.
    PortableArray {
        name: &'static str,
        factory_id: i32,
        class_id: i32,
        elements: Vec<(i32, Vec<TestField>)>,
    },
}

impl TestField {
    fn name(&self) -> &'static str {
        match self {
            TestField::Leaf(name, _) | TestField::RawTag(name, _) => name,
            TestField::Portable { name, .. } | TestField::PortableArray { name, .. } => name,
        }
    }
}

/// Serialize a payload whose fields use absolute offsets into `out`.
pub fn write_payload(out: &mut CursorMut, fields: &[TestField]) {
    let final_offset = out.position();
    out.write_i32(0);
    out.write_i32(fields.len() as i32);
    let table = out.position();
    for _ in fields {
        out.write_i32(0);
    }

    for (i, field) in fields.iter().enumerate() {
        let pos = out.position() as i32;
        out.write_i32_at(table + i * 4, pos).unwrap();
        let name = field.name();
        out.write_i16(name.len() as i16);
        out.write_bytes(name.as_bytes());

        match field {
            TestField::Leaf(_, field_type) => {
                out.write_u8(field_type.id());
                out.write_i32(0);
            }
            TestField::RawTag(_, tag) => out.write_u8(*tag),
            TestField::Portable {
                factory_id,
                class_id,
                nested,
                ..
            } => {
                out.write_u8(FieldType::Portable.id());
                out.write_bool(nested.is_none());
                out.write_i32(*factory_id);
                out.write_i32(*class_id);
                if let Some((version, nested_fields)) = nested {
                    out.write_i32(*version);
                    write_payload(out, nested_fields);
                }
            }
            TestField::PortableArray {
                factory_id,
                class_id,
                elements,
                ..
            } => {
                out.write_u8(FieldType::PortableArray.id());
                out.write_i32(elements.len() as i32);
                out.write_i32(*factory_id);
                out.write_i32(*class_id);
                let element_table = out.position();
                for _ in elements {
                    out.write_i32(0);
                }
                for (j, (version, nested_fields)) in elements.iter().enumerate() {
                    let element_pos = out.position() as i32;
                    out.write_i32_at(element_table + j * 4, element_pos).unwrap();
                    out.write_i32(*version);
                    write_payload(out, nested_fields);
                }
            }
        }
    }

    let end = out.position() as i32;
    out.write_i32_at(final_offset, end).unwrap();
}

/// Big-endian payload starting at offset 0.
pub fn payload(fields: &[TestField]) -> Vec<u8> {
    let mut out = CursorMut::big_endian();
    write_payload(&mut out, fields);
    out.into_inner()
}

/// `Address { city: utf }`, class (1, 2).
pub fn address_fields() -> Vec<TestField> {
    vec![TestField::Leaf("city", FieldType::Utf)]
}

pub fn address_field(name: &'static str, version: i32) -> TestField {
    TestField::Portable {
        name,
        factory_id: 1,
        class_id: 2,
        nested: Some((version, address_fields())),
    }
}
