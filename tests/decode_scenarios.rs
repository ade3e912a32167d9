// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end decode scenarios: whole schemas read from YAML and mapped
//! onto byte streams.

use dtfabric::{Fabric, MappingError, Value};

const POINT3D_TYPES: &str = r#"
name: int32
type: integer
attributes:
  byte_order: little-endian
  format: signed
  size: 4
---
name: point3d
type: structure
members:
- name: x
  data_type: int32
- name: y
  data_type: int32
- name: z
  data_type: int32
---
name: triangle3d
type: structure
members:
- name: a
  data_type: point3d
- name: b
  data_type: point3d
- name: c
  data_type: point3d
"#;

#[test]
fn point3d_fixed_decode() {
    let mut fabric = Fabric::from_yaml(POINT3D_TYPES).unwrap();
    let map = fabric.data_type_map("point3d").unwrap();

    let bytes = [
        0x01, 0x00, 0x00, 0x00, // x = 1
        0xfe, 0xff, 0xff, 0xff, // y = -2
        0x00, 0x00, 0x00, 0x00, // z = 0
    ];
    let (point, consumed) = map.map_byte_stream(&bytes).unwrap();

    assert_eq!(consumed, 12);
    assert_eq!(point.field("x").and_then(Value::as_i64), Some(1));
    assert_eq!(point.field("y").and_then(Value::as_i64), Some(-2));
    assert_eq!(point.field("z").and_then(Value::as_i64), Some(0));
    assert_eq!(map.byte_size(), Some(12));
}

#[test]
fn point3d_byte_stream_too_small() {
    let mut fabric = Fabric::from_yaml(POINT3D_TYPES).unwrap();
    let map = fabric.data_type_map("point3d").unwrap();

    let result = map.map_byte_stream(&[0x01, 0x00, 0x00, 0x00, 0xfe]);
    assert!(matches!(
        result,
        Err(MappingError::ByteStreamTooSmall { offset: 4, .. })
    ));
}

#[test]
fn sphere3d_variable_decode() {
    let schema = format!(
        "{}---\n{}",
        POINT3D_TYPES.trim_start(),
        r#"
name: sphere3d
type: structure
members:
- name: number_of_triangles
  data_type: int32
- name: triangles
  type: sequence
  element_data_type: triangle3d
  number_of_elements: sphere3d.number_of_triangles
"#
        .trim_start()
    );
    let mut fabric = Fabric::from_yaml(&schema).unwrap();
    let map = fabric.data_type_map("sphere3d").unwrap();

    let mut bytes = vec![0x02, 0x00, 0x00, 0x00];
    for index in 0..18u8 {
        // 2 triangles x 3 points x 3 coordinates.
        bytes.extend([index, 0x00, 0x00, 0x00]);
    }
    let (sphere, consumed) = map.map_byte_stream(&bytes).unwrap();

    assert_eq!(consumed, 4 + 72);
    let triangles = sphere
        .field("triangles")
        .and_then(Value::as_sequence)
        .unwrap();
    assert_eq!(triangles.len(), 2);
    assert_eq!(
        triangles[1]
            .field("a")
            .and_then(|point| point.field("x"))
            .and_then(Value::as_i64),
        Some(9)
    );
    // Variable-length: no fixed byte size.
    assert_eq!(map.byte_size(), None);
}

#[test]
fn box3d_fixed_sequence_size() {
    let schema = format!(
        "{}---\n{}",
        POINT3D_TYPES.trim_start(),
        r#"
name: box3d
type: structure
members:
- name: triangles
  type: sequence
  element_data_type: triangle3d
  number_of_elements: 12
"#
        .trim_start()
    );
    let mut fabric = Fabric::from_yaml(&schema).unwrap();
    let map = fabric.data_type_map("box3d").unwrap();

    assert_eq!(map.byte_size(), Some(432));
}

#[test]
fn conditional_member_presence() {
    let schema = r#"
name: uint8
type: integer
attributes:
  format: unsigned
  size: 1
---
name: uint32le
type: integer
attributes:
  byte_order: little-endian
  format: unsigned
  size: 4
---
name: record
type: structure
members:
- name: version
  data_type: uint8
- name: extra
  data_type: uint32le
  condition: version > 1
"#;
    let mut fabric = Fabric::from_yaml(schema).unwrap();
    let map = fabric.data_type_map("record").unwrap();

    let bytes = [0x01, 0xaa, 0xbb, 0xcc, 0xdd];
    let (record, consumed) = map.map_byte_stream(&bytes).unwrap();
    assert_eq!(consumed, 1);
    assert!(record.field("extra").is_none());

    let bytes = [0x02, 0x78, 0x56, 0x34, 0x12];
    let (record, consumed) = map.map_byte_stream(&bytes).unwrap();
    assert_eq!(consumed, 5);
    assert_eq!(
        record.field("extra").and_then(Value::as_u64),
        Some(0x1234_5678)
    );

    // Conditional members make the size undeterminable up front.
    assert_eq!(map.byte_size(), None);
}

#[test]
fn utf16_string_with_terminator() {
    let schema = r#"
name: wchar16
type: character
attributes:
  byte_order: little-endian
  size: 2
---
name: utf16le_string
type: string
encoding: utf-16-le
element_data_type: wchar16
elements_terminator: "\x00\x00"
"#;
    let mut fabric = Fabric::from_yaml(schema).unwrap();
    let map = fabric.data_type_map("utf16le_string").unwrap();

    let bytes = [0x64, 0x00, 0x74, 0x00, 0x00, 0x00, 0xaa, 0xbb];
    let (text, consumed) = map.map_byte_stream(&bytes).unwrap();

    // Terminator is consumed but not part of the value.
    assert_eq!(consumed, 6);
    assert_eq!(text.as_str(), Some("dt"));
}

#[test]
fn terminator_with_count_bound_first_wins() {
    let schema = r#"
name: uint16le
type: integer
attributes:
  byte_order: little-endian
  format: unsigned
  size: 2
---
name: values
type: sequence
element_data_type: uint16le
number_of_elements: 8
elements_terminator: "\xff\xff"
"#;
    let mut fabric = Fabric::from_yaml(schema).unwrap();
    let map = fabric.data_type_map("values").unwrap();

    // Terminator reached before the count bound.
    let bytes = [0x01, 0x00, 0x02, 0x00, 0xff, 0xff, 0x03, 0x00];
    let (values, consumed) = map.map_byte_stream(&bytes).unwrap();
    assert_eq!(consumed, 6);
    assert_eq!(values.as_sequence().map(<[_]>::len), Some(2));

    // Count bound reached before any terminator.
    let bytes = [
        0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00, 0x05, 0x00, 0x06, 0x00, 0x07, 0x00, 0x08,
        0x00,
    ];
    let (values, consumed) = map.map_byte_stream(&bytes).unwrap();
    assert_eq!(consumed, 16);
    assert_eq!(values.as_sequence().map(<[_]>::len), Some(8));
}

#[test]
fn elements_data_size_must_land_on_boundary() {
    let schema = r#"
name: uint32le
type: integer
attributes:
  byte_order: little-endian
  format: unsigned
  size: 4
---
name: misaligned
type: sequence
element_data_type: uint32le
elements_data_size: 6
"#;
    let mut fabric = Fabric::from_yaml(schema).unwrap();
    let map = fabric.data_type_map("misaligned").unwrap();

    let result = map.map_byte_stream(&[0u8; 12]);
    assert!(matches!(result, Err(MappingError::TrailingBytes { .. })));
}

#[test]
fn padding_aligns_to_structure_offset() {
    let schema = r#"
name: uint8
type: integer
attributes:
  format: unsigned
  size: 1
---
name: uint32le
type: integer
attributes:
  byte_order: little-endian
  format: unsigned
  size: 4
---
name: aligned_record
type: structure
members:
- name: flags
  data_type: uint8
- name: alignment_padding
  type: padding
  alignment_size: 4
- name: size
  data_type: uint32le
"#;
    let mut fabric = Fabric::from_yaml(schema).unwrap();
    let map = fabric.data_type_map("aligned_record").unwrap();

    let bytes = [0x07, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00];
    let (record, consumed) = map.map_byte_stream(&bytes).unwrap();

    assert_eq!(consumed, 8);
    assert_eq!(record.field("flags").and_then(Value::as_u64), Some(7));
    assert_eq!(record.field("size").and_then(Value::as_u64), Some(16));
    // Padding is deterministic here, so the structure stays fixed-size.
    assert_eq!(map.byte_size(), Some(8));
}

#[test]
fn union_padding_is_relative_to_union_start() {
    let schema = r#"
name: uint8
type: integer
attributes:
  format: unsigned
  size: 1
---
name: uint16le
type: integer
attributes:
  byte_order: little-endian
  format: unsigned
  size: 2
---
name: padded_union
type: union
members:
- name: as_short
  data_type: uint16le
- name: alignment_padding
  type: padding
  alignment_size: 4
---
name: wrapper
type: structure
members:
- name: lead
  data_type: uint8
- name: body
  data_type: padded_union
- name: trail
  data_type: uint8
"#;
    let mut fabric = Fabric::from_yaml(schema).unwrap();
    let map = fabric.data_type_map("wrapper").unwrap();

    // The union starts at buffer offset 1; its padding member aligns
    // relative to the union's own start, so it consumes nothing even
    // though the absolute offset is not a multiple of the alignment.
    let bytes = [0x01, 0x02, 0x00, 0x03];
    let (wrapper, consumed) = map.map_byte_stream(&bytes).unwrap();

    assert_eq!(consumed, 4);
    let body = wrapper.field("body").and_then(Value::as_sequence).unwrap();
    assert_eq!(body[0].as_u64(), Some(2));
    assert_eq!(body[1].as_bytes().map(<[u8]>::len), Some(0));
    assert_eq!(wrapper.field("trail").and_then(Value::as_u64), Some(3));
}

#[test]
fn format_layout_padding_aligns_from_entry_offset() {
    let schema = r#"
name: uint32le
type: integer
attributes:
  byte_order: little-endian
  format: unsigned
  size: 4
---
name: sector_padding
type: padding
alignment_size: 4
---
name: padded_file
type: format
layout:
- data_type: uint32le
  offset: 0
- data_type: sector_padding
  offset: 5
"#;
    let mut fabric = Fabric::from_yaml(schema).unwrap();
    let map = fabric.data_type_map("padded_file").unwrap();

    // The padding entry sits at layout offset 5, so it skips 3 bytes to
    // reach the next 4-byte boundary of the format.
    let bytes = [0x2a, 0x00, 0x00, 0x00, 0xaa, 0xde, 0xad, 0xbe];
    let (file, consumed) = map.map_byte_stream(&bytes).unwrap();

    assert_eq!(consumed, 8);
    assert_eq!(
        file.field("sector_padding").and_then(Value::as_bytes),
        Some(&[0xde, 0xad, 0xbe][..])
    );
}

#[test]
fn enumeration_decodes_symbolic_name() {
    let schema = r#"
name: object_information_type
type: enumeration
attributes:
  byte_order: little-endian
values:
- name: eof
  number: 0
- name: folder
  number: 1
- name: volume
  number: 2
---
name: object_entry
type: structure
members:
- name: object_type
  data_type: object_information_type
"#;
    let mut fabric = Fabric::from_yaml(schema).unwrap();
    let map = fabric.data_type_map("object_entry").unwrap();

    let (entry, consumed) = map.map_byte_stream(&[0x01, 0x00, 0x00, 0x00]).unwrap();
    assert_eq!(consumed, 4);
    let object_type = entry.field("object_type").unwrap();
    assert_eq!(object_type.enum_name(), Some("folder"));

    // Undeclared numbers decode as the raw integer.
    let (entry, _) = map.map_byte_stream(&[0x63, 0x00, 0x00, 0x00]).unwrap();
    assert_eq!(entry.field("object_type").unwrap().enum_name(), None);
    assert_eq!(
        entry.field("object_type").and_then(Value::as_i64),
        None
    );
    assert!(matches!(
        entry.field("object_type"),
        Some(Value::Enum(0x63, None))
    ));
}

#[test]
fn union_decodes_every_member_at_one_offset() {
    let schema = r#"
name: uint16le
type: integer
attributes:
  byte_order: little-endian
  format: unsigned
  size: 2
---
name: uint32le
type: integer
attributes:
  byte_order: little-endian
  format: unsigned
  size: 4
---
name: value_union
type: union
members:
- name: as_short
  data_type: uint16le
- name: as_long
  data_type: uint32le
"#;
    let mut fabric = Fabric::from_yaml(schema).unwrap();
    let map = fabric.data_type_map("value_union").unwrap();

    let (value, consumed) = map.map_byte_stream(&[0x01, 0x00, 0x02, 0x00]).unwrap();
    // Consumed size equals the largest member size.
    assert_eq!(consumed, 4);
    let members = value.as_sequence().unwrap();
    assert_eq!(members[0].as_u64(), Some(1));
    assert_eq!(members[1].as_u64(), Some(0x0002_0001));
    assert_eq!(map.byte_size(), Some(4));
}

#[test]
fn format_layout_at_absolute_offsets() {
    let schema = r#"
name: uint32le
type: integer
attributes:
  byte_order: little-endian
  format: unsigned
  size: 4
---
name: file_header
type: structure
members:
- name: signature
  data_type: uint32le
- name: format_version
  data_type: uint32le
---
name: file_footer
type: structure
members:
- name: checksum
  data_type: uint32le
---
name: storage_file
type: format
layout:
- data_type: file_header
  offset: 0
- data_type: file_footer
  offset: 12
"#;
    let mut fabric = Fabric::from_yaml(schema).unwrap();
    let map = fabric.data_type_map("storage_file").unwrap();

    let bytes = [
        0x65, 0x76, 0x74, 0x78, // signature
        0x02, 0x00, 0x00, 0x00, // format_version
        0xaa, 0xaa, 0xaa, 0xaa, // unmapped gap
        0x78, 0x56, 0x34, 0x12, // checksum
    ];
    let (file, consumed) = map.map_byte_stream(&bytes).unwrap();

    assert_eq!(consumed, 16);
    assert_eq!(
        file.field("file_header")
            .and_then(|header| header.field("format_version"))
            .and_then(Value::as_u64),
        Some(2)
    );
    assert_eq!(
        file.field("file_footer")
            .and_then(|footer| footer.field("checksum"))
            .and_then(Value::as_u64),
        Some(0x1234_5678)
    );
}

#[test]
fn uuid_member_little_endian() {
    let schema = r#"
name: guid
type: uuid
attributes:
  byte_order: little-endian
---
name: volume_header
type: structure
members:
- name: identifier
  data_type: guid
"#;
    let mut fabric = Fabric::from_yaml(schema).unwrap();
    let map = fabric.data_type_map("volume_header").unwrap();

    let bytes = [
        0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee,
        0xff,
    ];
    let (header, consumed) = map.map_byte_stream(&bytes).unwrap();

    assert_eq!(consumed, 16);
    let identifier = header.field("identifier").and_then(Value::as_uuid).unwrap();
    assert_eq!(
        identifier.to_string(),
        "00112233-4455-6677-8899-aabbccddeeff"
    );
}

#[test]
fn pinned_member_value_mismatch() {
    let schema = r#"
name: uint16le
type: integer
attributes:
  byte_order: little-endian
  format: unsigned
  size: 2
---
name: signed_record
type: structure
members:
- name: signature
  data_type: uint16le
  value: 0xef53
- name: size
  data_type: uint16le
"#;
    let mut fabric = Fabric::from_yaml(schema).unwrap();
    let map = fabric.data_type_map("signed_record").unwrap();

    let (record, _) = map.map_byte_stream(&[0x53, 0xef, 0x08, 0x00]).unwrap();
    assert_eq!(
        record.field("signature").and_then(Value::as_u64),
        Some(0xef53)
    );

    let result = map.map_byte_stream(&[0x54, 0xef, 0x08, 0x00]);
    assert!(matches!(
        result,
        Err(MappingError::ConstantMismatch { member, .. }) if member == "signature"
    ));
}

#[test]
fn caller_supplied_context_values() {
    let schema = r#"
name: uint8
type: integer
attributes:
  format: unsigned
  size: 1
---
name: payload
type: sequence
element_data_type: uint8
number_of_elements: record_size - 2
"#;
    let mut fabric = Fabric::from_yaml(schema).unwrap();
    let map = fabric.data_type_map("payload").unwrap();

    let mut context = dtfabric::MapContext::new();
    context.set("record_size", Value::UnsignedInteger(5));

    let bytes = [0x01, 0x02, 0x03, 0x04, 0x05];
    let (values, consumed) = map.map_byte_stream_with(&bytes, 0, &mut context).unwrap();
    assert_eq!(consumed, 3);
    assert_eq!(values.as_sequence().map(<[_]>::len), Some(3));

    // Without the caller-supplied value the path is unbound.
    let result = map.map_byte_stream(&bytes);
    assert!(matches!(
        result,
        Err(MappingError::UnboundExpressionPath { path, .. }) if path == "record_size"
    ));
}
