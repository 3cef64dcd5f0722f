//! Schema model: definitions produced by the parser and consumed by the codec and generators.

use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Parse error: {0}")]
    Syntax(String),
    #[error("{line}:{column}: {message}")]
    Invalid {
        message: String,
        line: usize,
        column: usize,
    },
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    pub(crate) fn invalid(message: impl Into<String>, line: usize, column: usize) -> Self {
        SchemaError::Invalid {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Root of a parsed schema file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    pub package: Option<String>,
    pub definitions: Vec<Definition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    /// Named values encoded as var uint.
    Enum,
    /// Named values encoded as a single byte.
    Smol,
    /// Fixed, ordered, all-required fields with no tags.
    Struct,
    /// Tagged optional fields terminated by tag 0.
    Message,
    /// One of several struct/message members, prefixed by the member index.
    Union,
    /// Another name for a primitive or definition.
    Alias,
}

impl DefinitionKind {
    pub fn keyword(self) -> &'static str {
        match self {
            DefinitionKind::Enum => "enum",
            DefinitionKind::Smol => "smol",
            DefinitionKind::Struct => "struct",
            DefinitionKind::Message => "message",
            DefinitionKind::Union => "union",
            DefinitionKind::Alias => "alias",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: String,
    pub line: usize,
    pub column: usize,
    pub kind: DefinitionKind,
    /// Enum variants, struct/message fields, union members, or the single alias target.
    pub fields: Vec<Field>,
    /// Unions only: name of the field that carries the member index on decoded records.
    pub discriminator: Option<String>,
}

impl Definition {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_by_value(&self, value: u32) -> Option<&Field> {
        self.fields.iter().find(|f| f.value == value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub line: usize,
    pub column: usize,
    /// `None` for enum variants.
    pub type_name: Option<String>,
    pub is_array: bool,
    pub is_deprecated: bool,
    pub is_required: bool,
    /// Message field id, enum value or union member index; 0 for struct fields.
    pub value: u32,
}

/// Built-in scalar types of the schema language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    Byte,
    Int8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    /// Zig-zag var int.
    Int,
    /// Var uint.
    Uint,
    /// Var float.
    Float,
    Float32,
    /// Low precision float (three decimals).
    Lowp,
    String,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Primitive> {
        Some(match name {
            "bool" => Primitive::Bool,
            "byte" | "uint8" => Primitive::Byte,
            "int8" => Primitive::Int8,
            "int16" => Primitive::Int16,
            "uint16" => Primitive::Uint16,
            "int32" => Primitive::Int32,
            "uint32" => Primitive::Uint32,
            "int" => Primitive::Int,
            "uint" => Primitive::Uint,
            "float" => Primitive::Float,
            "float32" => Primitive::Float32,
            "lowp" => Primitive::Lowp,
            "string" => Primitive::String,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Byte => "byte",
            Primitive::Int8 => "int8",
            Primitive::Int16 => "int16",
            Primitive::Uint16 => "uint16",
            Primitive::Int32 => "int32",
            Primitive::Uint32 => "uint32",
            Primitive::Int => "int",
            Primitive::Uint => "uint",
            Primitive::Float => "float",
            Primitive::Float32 => "float32",
            Primitive::Lowp => "lowp",
            Primitive::String => "string",
        }
    }
}

/// A field type after alias resolution.
#[derive(Debug, Clone, Copy)]
pub enum FieldType<'a> {
    Primitive(Primitive),
    Definition(&'a Definition),
}

/// Verified schema with definitions indexed by name.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub schema: Schema,
    definitions_by_name: HashMap<String, usize>,
}

impl ResolvedSchema {
    pub fn resolve(schema: Schema) -> Result<Self, SchemaError> {
        let mut definitions_by_name = HashMap::new();
        for (i, d) in schema.definitions.iter().enumerate() {
            if Primitive::from_name(&d.name).is_some() {
                return Err(SchemaError::invalid(
                    format!("Definition name {} shadows a built-in type", d.name),
                    d.line,
                    d.column,
                ));
            }
            if definitions_by_name.insert(d.name.clone(), i).is_some() {
                return Err(SchemaError::invalid(
                    format!("Duplicate definition name: {}", d.name),
                    d.line,
                    d.column,
                ));
            }
        }
        let resolved = ResolvedSchema {
            schema,
            definitions_by_name,
        };
        for d in &resolved.schema.definitions {
            resolved.verify_definition(d)?;
        }
        resolved.verify_aliases()?;
        resolved.verify_struct_recursion()?;
        debug!(
            definitions = resolved.schema.definitions.len(),
            package = resolved.schema.package.as_deref().unwrap_or(""),
            "schema resolved"
        );
        Ok(resolved)
    }

    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.definitions_by_name
            .get(name)
            .map(|&i| &self.schema.definitions[i])
    }

    pub fn definitions(&self) -> &[Definition] {
        &self.schema.definitions
    }

    /// Resolves a type name through any chain of aliases.
    pub fn resolve_type(&self, type_name: &str) -> Option<FieldType<'_>> {
        let mut name = type_name;
        // Alias chains are acyclic after verification; the bound only guards unverified input.
        for _ in 0..=self.schema.definitions.len() {
            if let Some(p) = Primitive::from_name(name) {
                return Some(FieldType::Primitive(p));
            }
            let d = self.get(name)?;
            if d.kind != DefinitionKind::Alias {
                return Some(FieldType::Definition(d));
            }
            name = d.fields.first()?.type_name.as_deref()?;
        }
        None
    }

    fn is_known_type(&self, type_name: &str) -> bool {
        Primitive::from_name(type_name).is_some() || self.definitions_by_name.contains_key(type_name)
    }

    fn verify_definition(&self, d: &Definition) -> Result<(), SchemaError> {
        let mut names = HashSet::new();
        let mut values = HashSet::new();
        for f in &d.fields {
            if !names.insert(f.name.as_str()) {
                return Err(SchemaError::invalid(
                    format!("Duplicate field {} in {}", f.name, d.name),
                    f.line,
                    f.column,
                ));
            }
            match d.kind {
                DefinitionKind::Enum | DefinitionKind::Smol => {
                    if !values.insert(f.value) {
                        return Err(SchemaError::invalid(
                            format!("Duplicate value {} in {} {}", f.value, d.kind.keyword(), d.name),
                            f.line,
                            f.column,
                        ));
                    }
                    if d.kind == DefinitionKind::Smol && f.value > u8::MAX as u32 {
                        return Err(SchemaError::invalid(
                            format!("Value {} of {} does not fit in a byte", f.value, f.name),
                            f.line,
                            f.column,
                        ));
                    }
                }
                DefinitionKind::Struct => {
                    self.verify_field_type(d, f)?;
                    if f.is_deprecated || f.is_required {
                        return Err(SchemaError::invalid(
                            format!("Struct field {}.{} cannot carry attributes", d.name, f.name),
                            f.line,
                            f.column,
                        ));
                    }
                }
                DefinitionKind::Message => {
                    self.verify_field_type(d, f)?;
                    if f.value == 0 {
                        return Err(SchemaError::invalid(
                            format!("Field id of {}.{} must be at least 1 (0 ends a message)", d.name, f.name),
                            f.line,
                            f.column,
                        ));
                    }
                    if !values.insert(f.value) {
                        return Err(SchemaError::invalid(
                            format!("Duplicate field id {} in message {}", f.value, d.name),
                            f.line,
                            f.column,
                        ));
                    }
                }
                DefinitionKind::Union => {
                    let member = f.type_name.as_deref().and_then(|t| self.get(t));
                    match member.map(|m| m.kind) {
                        Some(DefinitionKind::Struct) | Some(DefinitionKind::Message) => {}
                        _ => {
                            return Err(SchemaError::invalid(
                                format!("Union {} member {} must be a struct or message", d.name, f.name),
                                f.line,
                                f.column,
                            ))
                        }
                    }
                }
                DefinitionKind::Alias => self.verify_field_type(d, f)?,
            }
        }
        // Structs must occupy at least one byte on the wire.
        if d.kind == DefinitionKind::Struct && d.fields.is_empty() {
            return Err(SchemaError::invalid(
                format!("Struct {} has no fields", d.name),
                d.line,
                d.column,
            ));
        }
        if d.kind == DefinitionKind::Union && d.fields.is_empty() {
            return Err(SchemaError::invalid(
                format!("Union {} has no members", d.name),
                d.line,
                d.column,
            ));
        }
        Ok(())
    }

    fn verify_field_type(&self, d: &Definition, f: &Field) -> Result<(), SchemaError> {
        match f.type_name.as_deref() {
            Some(t) if self.is_known_type(t) => Ok(()),
            Some(t) => Err(SchemaError::invalid(
                format!("Invalid type {} for field {}.{}", t, d.name, f.name),
                f.line,
                f.column,
            )),
            None => Err(SchemaError::invalid(
                format!("Missing type for field {}.{}", d.name, f.name),
                f.line,
                f.column,
            )),
        }
    }

    fn verify_aliases(&self) -> Result<(), SchemaError> {
        for d in self.definitions() {
            if d.kind == DefinitionKind::Alias && self.resolve_type(&d.name).is_none() {
                return Err(SchemaError::invalid(
                    format!("Alias {} does not resolve to a concrete type", d.name),
                    d.line,
                    d.column,
                ));
            }
        }
        Ok(())
    }

    /// A struct reaching itself through non-array struct fields has no finite encoding.
    fn verify_struct_recursion(&self) -> Result<(), SchemaError> {
        for d in self.definitions() {
            if d.kind != DefinitionKind::Struct {
                continue;
            }
            let mut stack: Vec<&Definition> = vec![d];
            let mut seen = HashSet::new();
            while let Some(current) = stack.pop() {
                for f in current.fields.iter().filter(|f| !f.is_array) {
                    let Some(FieldType::Definition(inner)) =
                        f.type_name.as_deref().and_then(|t| self.resolve_type(t))
                    else {
                        continue;
                    };
                    if inner.kind != DefinitionKind::Struct {
                        continue;
                    }
                    if inner.name == d.name {
                        return Err(SchemaError::invalid(
                            format!("Struct {} contains itself", d.name),
                            d.line,
                            d.column,
                        ));
                    }
                    if seen.insert(inner.name.as_str()) {
                        stack.push(inner);
                    }
                }
            }
        }
        Ok(())
    }
}
