//! Encode/decode [`Value`]s according to a resolved schema.
//!
//! Framing per definition kind:
//! - **struct**: every field in declaration order, no tags.
//! - **message**: `var uint` field id then the value for each present field; id 0 ends the message.
//!   Deprecated fields are never written and are read and dropped when found.
//! - **enum** / **smol**: variant value as `var uint` / single byte.
//! - **union**: member index as `var uint`, then the member record. On decode, a union with a
//!   discriminator gets that name mapped to the index inside the member record.
//! - **arrays**: `byte[]` and fixed-width numeric arrays are one byte-length-prefixed region;
//!   every other element type is an element count followed by the elements. A count larger than
//!   the bytes left is rejected before anything is allocated.

use crate::buffer::{BufferError, ByteBuffer};
use crate::schema::*;
use crate::value::Value;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Nesting limit for decoding recursive definitions from untrusted input.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Buffer: {0}")]
    Buffer(#[from] BufferError),
    #[error("Unknown definition: {0}")]
    UnknownDefinition(String),
    #[error("Invalid field tag {tag} in message {message}")]
    InvalidFieldTag { message: String, tag: u32 },
    #[error("Invalid union discriminant {discriminant} for {union}")]
    InvalidUnionDiscriminant { union: String, discriminant: u32 },
    #[error("Unknown member {member} for union {union}")]
    InvalidUnionMember { union: String, member: String },
    #[error("Invalid value {value} for enum {name}")]
    InvalidEnumValue { name: String, value: String },
    #[error("Missing required field {field} in {definition}")]
    MissingField { definition: String, field: String },
    #[error("Type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: &'static str,
    },
    #[error("Trailing bytes: {0} byte(s) left after decode")]
    TrailingBytes(usize),
    #[error("Nesting deeper than {0} levels")]
    DepthLimit(usize),
    #[error("Array of {count} element(s) cannot fit in the {remaining} byte(s) left")]
    ArrayLength { count: usize, remaining: usize },
}

fn mismatch(path: &str, expected: impl Into<String>, found: &Value) -> CodecError {
    CodecError::TypeMismatch {
        path: path.to_string(),
        expected: expected.into(),
        found: found.kind(),
    }
}

#[derive(Debug)]
pub struct Codec {
    resolved: ResolvedSchema,
}

impl Codec {
    pub fn new(resolved: ResolvedSchema) -> Self {
        Codec { resolved }
    }

    pub fn schema(&self) -> &ResolvedSchema {
        &self.resolved
    }

    fn definition(&self, name: &str) -> Result<&Definition, CodecError> {
        self.resolved
            .get(name)
            .ok_or_else(|| CodecError::UnknownDefinition(name.to_string()))
    }

    fn field_type(&self, field: &Field) -> Result<FieldType<'_>, CodecError> {
        let name = field.type_name.as_deref().unwrap_or_default();
        self.resolved
            .resolve_type(name)
            .ok_or_else(|| CodecError::UnknownDefinition(name.to_string()))
    }

    /// Encode `value` as the definition `name` into a fresh buffer.
    pub fn encode(&self, name: &str, value: &Value) -> Result<Vec<u8>, CodecError> {
        let mut bb = ByteBuffer::new();
        self.encode_into(name, value, &mut bb)?;
        debug!(definition = name, bytes = bb.len(), "encoded");
        Ok(bb.into_vec())
    }

    /// Append the encoding of `value` to `bb`. On error `bb` may hold a partial encoding.
    pub fn encode_into(&self, name: &str, value: &Value, bb: &mut ByteBuffer) -> Result<(), CodecError> {
        let def = self.definition(name)?;
        self.encode_definition(def, value, bb, name)
    }

    /// Decode exactly one `name` from `bytes`; leftover bytes are an error.
    pub fn decode(&self, name: &str, bytes: &[u8]) -> Result<Value, CodecError> {
        let mut bb = ByteBuffer::from(bytes);
        let value = self.decode_from(name, &mut bb)?;
        if bb.remaining() > 0 {
            return Err(CodecError::TrailingBytes(bb.remaining()));
        }
        debug!(definition = name, bytes = bytes.len(), "decoded");
        Ok(value)
    }

    /// Decode one `name` starting at the cursor of `bb`.
    pub fn decode_from(&self, name: &str, bb: &mut ByteBuffer) -> Result<Value, CodecError> {
        let def = self.definition(name)?;
        self.decode_definition(def, bb, 0)
    }

    // ==================== Encode ====================

    fn encode_definition(
        &self,
        def: &Definition,
        value: &Value,
        bb: &mut ByteBuffer,
        path: &str,
    ) -> Result<(), CodecError> {
        match def.kind {
            DefinitionKind::Struct => {
                let map = value.as_struct().ok_or_else(|| mismatch(path, &def.name, value))?;
                for f in &def.fields {
                    let v = map.get(&f.name).ok_or_else(|| CodecError::MissingField {
                        definition: def.name.clone(),
                        field: f.name.clone(),
                    })?;
                    self.encode_field(f, v, bb, &format!("{}.{}", path, f.name))?;
                }
                Ok(())
            }
            DefinitionKind::Message => {
                let map = value.as_struct().ok_or_else(|| mismatch(path, &def.name, value))?;
                for f in def.fields.iter().filter(|f| !f.is_deprecated) {
                    match map.get(&f.name) {
                        Some(v) => {
                            bb.write_var_uint(f.value);
                            self.encode_field(f, v, bb, &format!("{}.{}", path, f.name))?;
                        }
                        None if f.is_required => {
                            return Err(CodecError::MissingField {
                                definition: def.name.clone(),
                                field: f.name.clone(),
                            })
                        }
                        None => {}
                    }
                }
                bb.write_var_uint(0);
                Ok(())
            }
            DefinitionKind::Enum | DefinitionKind::Smol => {
                let Value::Enum(variant) = value else {
                    return Err(mismatch(path, &def.name, value));
                };
                let f = def.field(variant).ok_or_else(|| CodecError::InvalidEnumValue {
                    name: def.name.clone(),
                    value: variant.clone(),
                })?;
                if def.kind == DefinitionKind::Smol {
                    bb.write_byte(f.value as u8);
                } else {
                    bb.write_var_uint(f.value);
                }
                Ok(())
            }
            DefinitionKind::Union => {
                let Value::Union { member, value: inner } = value else {
                    return Err(mismatch(path, &def.name, value));
                };
                let f = def.field(member).ok_or_else(|| CodecError::InvalidUnionMember {
                    union: def.name.clone(),
                    member: member.clone(),
                })?;
                bb.write_var_uint(f.value);
                let member_def = self.definition(member)?;
                self.encode_definition(member_def, inner, bb, &format!("{}<{}>", path, member))
            }
            DefinitionKind::Alias => match self.resolved.resolve_type(&def.name) {
                Some(ty) => self.encode_single(ty, value, bb, path),
                None => Err(CodecError::UnknownDefinition(def.name.clone())),
            },
        }
    }

    fn encode_field(&self, f: &Field, value: &Value, bb: &mut ByteBuffer, path: &str) -> Result<(), CodecError> {
        let ty = self.field_type(f)?;
        if f.is_array {
            self.encode_array(ty, value, bb, path)
        } else {
            self.encode_single(ty, value, bb, path)
        }
    }

    fn encode_single(&self, ty: FieldType<'_>, value: &Value, bb: &mut ByteBuffer, path: &str) -> Result<(), CodecError> {
        let p = match ty {
            FieldType::Definition(d) => return self.encode_definition(d, value, bb, path),
            FieldType::Primitive(p) => p,
        };
        match (p, value) {
            (Primitive::Bool, Value::Bool(x)) => bb.write_bool(*x),
            (Primitive::Byte, Value::U8(x)) => bb.write_byte(*x),
            (Primitive::Int8, Value::I8(x)) => bb.write_i8(*x),
            (Primitive::Int16, Value::I16(x)) => bb.write_i16(*x),
            (Primitive::Uint16, Value::U16(x)) => bb.write_u16(*x),
            (Primitive::Int32, Value::I32(x)) => bb.write_i32(*x),
            (Primitive::Uint32, Value::U32(x)) => bb.write_u32(*x),
            (Primitive::Int, Value::I32(x)) => bb.write_var_int(*x),
            (Primitive::Uint, Value::U32(x)) => bb.write_var_uint(*x),
            (Primitive::Float, Value::Float(x)) => bb.write_var_float(*x),
            (Primitive::Float32, Value::Float(x)) => bb.write_f32(*x),
            (Primitive::Lowp, Value::Double(x)) => bb.write_low_precision_float(*x),
            (Primitive::Lowp, Value::Float(x)) => bb.write_low_precision_float(*x as f64),
            (Primitive::String, Value::String(s)) => bb.write_string(s),
            (p, v) => return Err(mismatch(path, p.name(), v)),
        }
        Ok(())
    }

    fn encode_array(&self, ty: FieldType<'_>, value: &Value, bb: &mut ByteBuffer, path: &str) -> Result<(), CodecError> {
        if let (FieldType::Primitive(Primitive::Byte), Value::Bytes(bytes)) = (ty, value) {
            bb.write_byte_array(bytes);
            return Ok(());
        }
        let items = value
            .as_list()
            .ok_or_else(|| mismatch(path, "list", value))?;
        match ty {
            FieldType::Primitive(Primitive::Byte) => {
                bb.write_byte_array(&collect(items, path, Primitive::Byte, |v| match v {
                    Value::U8(x) => Some(*x),
                    _ => None,
                })?)
            }
            FieldType::Primitive(Primitive::Int8) => bb.write_i8_array(&collect(items, path, Primitive::Int8, |v| match v {
                Value::I8(x) => Some(*x),
                _ => None,
            })?),
            FieldType::Primitive(Primitive::Int16) => bb.write_i16_array(&collect(items, path, Primitive::Int16, |v| match v {
                Value::I16(x) => Some(*x),
                _ => None,
            })?),
            FieldType::Primitive(Primitive::Uint16) => bb.write_u16_array(&collect(items, path, Primitive::Uint16, |v| match v {
                Value::U16(x) => Some(*x),
                _ => None,
            })?),
            FieldType::Primitive(Primitive::Int32) => bb.write_i32_array(&collect(items, path, Primitive::Int32, |v| match v {
                Value::I32(x) => Some(*x),
                _ => None,
            })?),
            FieldType::Primitive(Primitive::Uint32) => bb.write_u32_array(&collect(items, path, Primitive::Uint32, |v| match v {
                Value::U32(x) => Some(*x),
                _ => None,
            })?),
            FieldType::Primitive(Primitive::Float32) => bb.write_f32_array(&collect(items, path, Primitive::Float32, |v| match v {
                Value::Float(x) => Some(*x),
                _ => None,
            })?),
            _ => {
                bb.write_var_uint(items.len() as u32);
                for (i, item) in items.iter().enumerate() {
                    self.encode_single(ty, item, bb, &format!("{}[{}]", path, i))?;
                }
            }
        }
        Ok(())
    }

    // ==================== Decode ====================

    fn decode_definition(&self, def: &Definition, bb: &mut ByteBuffer, depth: usize) -> Result<Value, CodecError> {
        if depth > MAX_DEPTH {
            return Err(CodecError::DepthLimit(MAX_DEPTH));
        }
        match def.kind {
            DefinitionKind::Struct => {
                let mut out = HashMap::with_capacity(def.fields.len());
                for f in &def.fields {
                    let v = self.decode_field(f, bb, depth)?;
                    out.insert(f.name.clone(), v);
                }
                Ok(Value::Struct(out))
            }
            DefinitionKind::Message => {
                let mut out = HashMap::new();
                loop {
                    let tag = bb.read_var_uint()?;
                    if tag == 0 {
                        break;
                    }
                    let f = def.field_by_value(tag).ok_or_else(|| CodecError::InvalidFieldTag {
                        message: def.name.clone(),
                        tag,
                    })?;
                    trace!(definition = %def.name, tag, field = %f.name, "message field");
                    let v = self.decode_field(f, bb, depth)?;
                    if !f.is_deprecated {
                        out.insert(f.name.clone(), v);
                    }
                }
                let missing = def
                    .fields
                    .iter()
                    .find(|f| f.is_required && !f.is_deprecated && !out.contains_key(&f.name));
                if let Some(f) = missing {
                    return Err(CodecError::MissingField {
                        definition: def.name.clone(),
                        field: f.name.clone(),
                    });
                }
                Ok(Value::Struct(out))
            }
            DefinitionKind::Enum | DefinitionKind::Smol => {
                let raw = if def.kind == DefinitionKind::Smol {
                    bb.read_byte()? as u32
                } else {
                    bb.read_var_uint()?
                };
                let f = def.field_by_value(raw).ok_or_else(|| CodecError::InvalidEnumValue {
                    name: def.name.clone(),
                    value: raw.to_string(),
                })?;
                Ok(Value::Enum(f.name.clone()))
            }
            DefinitionKind::Union => {
                let discriminant = bb.read_var_uint()?;
                let f = def
                    .field_by_value(discriminant)
                    .ok_or_else(|| CodecError::InvalidUnionDiscriminant {
                        union: def.name.clone(),
                        discriminant,
                    })?;
                let member_def = self.definition(&f.name)?;
                let mut inner = self.decode_definition(member_def, bb, depth + 1)?;
                if let (Some(tag), Value::Struct(map)) = (&def.discriminator, &mut inner) {
                    map.insert(tag.clone(), Value::U32(discriminant));
                }
                Ok(Value::Union {
                    member: f.name.clone(),
                    value: Box::new(inner),
                })
            }
            DefinitionKind::Alias => match self.resolved.resolve_type(&def.name) {
                Some(ty) => self.decode_single(ty, bb, depth),
                None => Err(CodecError::UnknownDefinition(def.name.clone())),
            },
        }
    }

    fn decode_field(&self, f: &Field, bb: &mut ByteBuffer, depth: usize) -> Result<Value, CodecError> {
        let ty = self.field_type(f)?;
        if f.is_array {
            self.decode_array(ty, bb, depth)
        } else {
            self.decode_single(ty, bb, depth)
        }
    }

    fn decode_single(&self, ty: FieldType<'_>, bb: &mut ByteBuffer, depth: usize) -> Result<Value, CodecError> {
        let p = match ty {
            FieldType::Definition(d) => return self.decode_definition(d, bb, depth + 1),
            FieldType::Primitive(p) => p,
        };
        Ok(match p {
            Primitive::Bool => Value::Bool(bb.read_bool()?),
            Primitive::Byte => Value::U8(bb.read_byte()?),
            Primitive::Int8 => Value::I8(bb.read_i8()?),
            Primitive::Int16 => Value::I16(bb.read_i16()?),
            Primitive::Uint16 => Value::U16(bb.read_u16()?),
            Primitive::Int32 => Value::I32(bb.read_i32()?),
            Primitive::Uint32 => Value::U32(bb.read_u32()?),
            Primitive::Int => Value::I32(bb.read_var_int()?),
            Primitive::Uint => Value::U32(bb.read_var_uint()?),
            Primitive::Float => Value::Float(bb.read_var_float()?),
            Primitive::Float32 => Value::Float(bb.read_f32()?),
            Primitive::Lowp => Value::Double(bb.read_low_precision_float()?),
            Primitive::String => Value::String(bb.read_string()?),
        })
    }

    fn decode_array(&self, ty: FieldType<'_>, bb: &mut ByteBuffer, depth: usize) -> Result<Value, CodecError> {
        let list = match ty {
            FieldType::Primitive(Primitive::Byte) => return Ok(Value::Bytes(bb.read_byte_array()?)),
            FieldType::Primitive(Primitive::Int8) => bb.read_i8_array()?.into_iter().map(Value::I8).collect(),
            FieldType::Primitive(Primitive::Int16) => bb.read_i16_array()?.into_iter().map(Value::I16).collect(),
            FieldType::Primitive(Primitive::Uint16) => bb.read_u16_array()?.into_iter().map(Value::U16).collect(),
            FieldType::Primitive(Primitive::Int32) => bb.read_i32_array()?.into_iter().map(Value::I32).collect(),
            FieldType::Primitive(Primitive::Uint32) => bb.read_u32_array()?.into_iter().map(Value::U32).collect(),
            FieldType::Primitive(Primitive::Float32) => bb.read_f32_array()?.into_iter().map(Value::Float).collect(),
            _ => {
                let count = bb.read_var_uint()? as usize;
                // Every element occupies at least one byte.
                if count > bb.remaining() {
                    return Err(CodecError::ArrayLength {
                        count,
                        remaining: bb.remaining(),
                    });
                }
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.decode_single(ty, bb, depth)?);
                }
                items
            }
        };
        Ok(Value::List(list))
    }
}

fn collect<T>(
    items: &[Value],
    path: &str,
    expected: Primitive,
    extract: impl Fn(&Value) -> Option<T>,
) -> Result<Vec<T>, CodecError> {
    items
        .iter()
        .enumerate()
        .map(|(i, v)| extract(v).ok_or_else(|| mismatch(&format!("{}[{}]", path, i), expected.name(), v)))
        .collect()
}
