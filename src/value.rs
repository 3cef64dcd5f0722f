//! Runtime values for schema-driven encoding/decoding.

use std::collections::HashMap;

/// A single decoded value (field or compound).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    I8(i8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    Float(f32),
    /// `lowp` values; decoded with three decimal places.
    Double(f64),
    String(String),
    /// `byte[]`.
    Bytes(Vec<u8>),
    List(Vec<Value>),
    /// Struct or message record. Messages only hold the fields that were present.
    Struct(HashMap<String, Value>),
    /// Enum or smol variant name.
    Enum(String),
    /// Union member name and its record.
    Union { member: String, value: Box<Value> },
}

impl Value {
    pub fn as_struct(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Struct(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Short type label used in mismatch errors and dumps.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::U8(_) => "u8",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::U16(_) => "u16",
            Value::I32(_) => "i32",
            Value::U32(_) => "u32",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Struct(_) => "struct",
            Value::Enum(_) => "enum",
            Value::Union { .. } => "union",
        }
    }
}

/// Builds a record from `(name, value)` pairs.
pub fn record<I, K>(fields: I) -> Value
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    Value::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
}
