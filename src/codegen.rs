//! Rust code generator: emits one module with a type per definition plus `encode`/`decode`
//! methods that call the [`ByteBuffer`](crate::ByteBuffer) primitives in schema order.
//!
//! Mapping:
//! - enum / smol: `#[repr(u32)]` / `#[repr(u8)]` Rust enums with `from_value`
//! - struct: plain struct, every field present
//! - message: struct of `Option`s; `[required]` fields are plain, `[deprecated]` fields are dropped
//! - union: Rust enum with one tuple variant per member
//! - alias: `pub type`
//!
//! Fields whose type leads back to the enclosing definition are boxed.
//!
//! Definition names that are Rust keywords or clash with names the generated code relies on
//! (`Option`, `Box`, `Vec`, `ByteBuffer`, ...) get a trailing `_`; keyword variants become raw
//! identifiers.
//!
//! A union's discriminator name is exposed as `DISCRIMINATOR` and the member index as
//! `discriminant()`. The generated member types do not carry it as a field, unlike the records
//! decoded by [`Codec`](crate::Codec), which insert it under that name.

use crate::schema::*;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Path the generated module uses to import `ByteBuffer` and `CodecError`.
    pub crate_path: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            crate_path: "peechy".to_string(),
        }
    }
}

pub fn generate_rust(resolved: &ResolvedSchema, options: &GeneratorOptions) -> String {
    let mut gen = RustGenerator {
        resolved,
        out: Writer::default(),
    };
    match &resolved.schema.package {
        Some(package) => gen.out.line(format!("// Code generated by peechy from package {}. DO NOT EDIT.", package)),
        None => gen.out.line("// Code generated by peechy. DO NOT EDIT."),
    }
    gen.out.blank();
    gen.out.line(format!("use {}::{{ByteBuffer, CodecError}};", options.crate_path));
    for d in resolved.definitions() {
        gen.out.blank();
        match d.kind {
            DefinitionKind::Enum | DefinitionKind::Smol => gen.enumeration(d),
            DefinitionKind::Struct => gen.structure(d),
            DefinitionKind::Message => gen.message(d),
            DefinitionKind::Union => gen.union(d),
            DefinitionKind::Alias => gen.alias(d),
        }
    }
    debug!(definitions = resolved.definitions().len(), lines = gen.out.lines.len(), "generated rust");
    gen.out.finish()
}

#[derive(Default)]
struct Writer {
    lines: Vec<String>,
    indent: usize,
}

impl Writer {
    fn line(&mut self, s: impl AsRef<str>) {
        self.lines.push(format!("{}{}", "    ".repeat(self.indent), s.as_ref()));
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    fn open(&mut self, s: impl AsRef<str>) {
        self.line(s);
        self.indent += 1;
    }

    fn close(&mut self, s: impl AsRef<str>) {
        self.indent = self.indent.saturating_sub(1);
        self.line(s);
    }

    /// Writes a multi-line expression with `prefix` on its first line and `suffix` on its last.
    fn wrap(&mut self, prefix: &str, expr: &[String], suffix: &str) {
        let last = expr.len().saturating_sub(1);
        for (i, l) in expr.iter().enumerate() {
            let mut s = String::new();
            if i == 0 {
                s.push_str(prefix);
            }
            s.push_str(l);
            if i == last {
                s.push_str(suffix);
            }
            self.line(s);
        }
    }

    fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern", "false", "fn", "for",
    "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return", "static", "struct",
    "trait", "true", "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// snake_case Rust identifier for a schema field name.
pub fn field_ident(name: &str) -> String {
    let mut snake = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower {
                snake.push('_');
            }
            snake.push(c.to_ascii_lowercase());
            prev_lower = false;
        } else {
            snake.push(c);
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    match snake.as_str() {
        "self" | "super" | "crate" | "bb" => format!("{}_", snake),
        s if RUST_KEYWORDS.contains(&s) => format!("r#{}", snake),
        _ => snake,
    }
}

/// Names the generated module uses unqualified, plus the built-in scalar types.
const RESERVED_TYPE_NAMES: &[&str] = &[
    "Option", "Some", "None", "Box", "Vec", "Result", "Ok", "Err", "String", "ByteBuffer", "CodecError", "bool",
    "u8", "i8", "u16", "i16", "u32", "i32", "u64", "i64", "f32", "f64", "str", "char", "usize", "isize",
];

/// Rust identifier for a definition name.
pub fn type_ident(name: &str) -> String {
    match name {
        "Self" | "self" | "super" | "crate" => format!("{}_", name),
        s if RESERVED_TYPE_NAMES.contains(&s) => format!("{}_", name),
        s if RUST_KEYWORDS.contains(&s) => format!("r#{}", name),
        _ => name.to_string(),
    }
}

/// Rust identifier for an enum variant or union member.
pub fn variant_ident(name: &str) -> String {
    match name {
        "Self" | "self" | "super" | "crate" => format!("{}_", name),
        s if RUST_KEYWORDS.contains(&s) => format!("r#{}", name),
        _ => name.to_string(),
    }
}

fn rust_primitive(p: Primitive) -> &'static str {
    match p {
        Primitive::Bool => "bool",
        Primitive::Byte => "u8",
        Primitive::Int8 => "i8",
        Primitive::Int16 => "i16",
        Primitive::Uint16 => "u16",
        Primitive::Int32 | Primitive::Int => "i32",
        Primitive::Uint32 | Primitive::Uint => "u32",
        Primitive::Float | Primitive::Float32 => "f32",
        Primitive::Lowp => "f64",
        Primitive::String => "String",
    }
}

fn primitive_suffix(p: Primitive) -> &'static str {
    match p {
        Primitive::Bool => "bool",
        Primitive::Byte => "byte",
        Primitive::Int8 => "i8",
        Primitive::Int16 => "i16",
        Primitive::Uint16 => "u16",
        Primitive::Int32 => "i32",
        Primitive::Uint32 => "u32",
        Primitive::Int => "var_int",
        Primitive::Uint => "var_uint",
        Primitive::Float => "var_float",
        Primitive::Float32 => "f32",
        Primitive::Lowp => "low_precision_float",
        Primitive::String => "string",
    }
}

/// Buffer method suffix for arrays sent as one byte-length-prefixed region.
fn packed_suffix(p: Primitive) -> Option<&'static str> {
    match p {
        Primitive::Byte => Some("byte_array"),
        Primitive::Int8 => Some("i8_array"),
        Primitive::Int16 => Some("i16_array"),
        Primitive::Uint16 => Some("u16_array"),
        Primitive::Int32 => Some("i32_array"),
        Primitive::Uint32 => Some("u32_array"),
        Primitive::Float32 => Some("f32_array"),
        _ => None,
    }
}

struct RustGenerator<'a> {
    resolved: &'a ResolvedSchema,
    out: Writer,
}

impl<'a> RustGenerator<'a> {
    fn field_type(&self, f: &Field) -> Option<FieldType<'a>> {
        f.type_name.as_deref().and_then(|t| self.resolved.resolve_type(t))
    }

    fn type_name<'f>(&self, f: &'f Field) -> &'f str {
        f.type_name.as_deref().unwrap_or_default()
    }

    fn rust_type(&self, f: &Field, boxed: bool) -> String {
        let name = self.type_name(f);
        let base = match Primitive::from_name(name) {
            Some(p) => rust_primitive(p).to_string(),
            None => type_ident(name),
        };
        if f.is_array {
            format!("Vec<{}>", base)
        } else if boxed {
            format!("Box<{}>", base)
        } else {
            base
        }
    }

    /// True when a value of type `from` can contain a value of `target` without a `Vec` in between.
    fn reaches(&self, from: &Definition, target: &str) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(d) = stack.pop() {
            if d.name == target {
                return true;
            }
            if !seen.insert(d.name.as_str()) {
                continue;
            }
            if !matches!(d.kind, DefinitionKind::Struct | DefinitionKind::Message | DefinitionKind::Union) {
                continue;
            }
            for f in d.fields.iter().filter(|f| !f.is_array && !f.is_deprecated) {
                if let Some(FieldType::Definition(inner)) = self.field_type(f) {
                    stack.push(inner);
                }
            }
        }
        false
    }

    fn needs_box(&self, owner: &Definition, f: &Field) -> bool {
        if f.is_array {
            return false;
        }
        match self.field_type(f) {
            Some(FieldType::Definition(d)) => self.reaches(d, &owner.name),
            _ => false,
        }
    }

    // ==================== Expressions ====================

    /// Statements encoding the value bound (by reference) to `var`.
    fn encode_value(&mut self, ty: FieldType<'_>, var: &str) {
        match ty {
            FieldType::Definition(_) => self.out.line(format!("{}.encode(bb);", var)),
            FieldType::Primitive(Primitive::String) => self.out.line(format!("bb.write_string({});", var)),
            FieldType::Primitive(p) => self.out.line(format!("bb.write_{}(*{});", primitive_suffix(p), var)),
        }
    }

    fn encode_field(&mut self, f: &Field, var: &str) {
        let Some(ty) = self.field_type(f) else {
            return;
        };
        if !f.is_array {
            self.encode_value(ty, var);
            return;
        }
        if let Some(suffix) = match ty {
            FieldType::Primitive(p) => packed_suffix(p),
            FieldType::Definition(_) => None,
        } {
            self.out.line(format!("bb.write_{}({});", suffix, var));
            return;
        }
        self.out.line(format!("bb.write_var_uint({}.len() as u32);", var));
        self.out.open(format!("for item in {}.iter() {{", var));
        self.encode_value(ty, "item");
        self.out.close("}");
    }

    fn decode_value(&self, f: &Field, ty: FieldType<'_>, boxed: bool) -> String {
        let expr = match ty {
            FieldType::Definition(_) => format!("{}::decode(bb)?", type_ident(self.type_name(f))),
            FieldType::Primitive(p) => format!("bb.read_{}()?", primitive_suffix(p)),
        };
        if boxed {
            format!("Box::new({})", expr)
        } else {
            expr
        }
    }

    /// Expression lines decoding one field value.
    fn decode_field(&self, f: &Field, boxed: bool) -> Vec<String> {
        let Some(ty) = self.field_type(f) else {
            return vec!["unreachable!()".to_string()];
        };
        if !f.is_array {
            return vec![self.decode_value(f, ty, boxed)];
        }
        if let FieldType::Primitive(p) = ty {
            if let Some(suffix) = packed_suffix(p) {
                return vec![format!("bb.read_{}()?", suffix)];
            }
        }
        vec![
            "{".to_string(),
            "    let count = bb.read_var_uint()? as usize;".to_string(),
            "    if count > bb.remaining() {".to_string(),
            "        return Err(CodecError::ArrayLength { count, remaining: bb.remaining() });".to_string(),
            "    }".to_string(),
            "    let mut items = Vec::with_capacity(count);".to_string(),
            "    for _ in 0..count {".to_string(),
            format!("        items.push({});", self.decode_value(f, ty, false)),
            "    }".to_string(),
            "    items".to_string(),
            "}".to_string(),
        ]
    }

    // ==================== Definitions ====================

    fn enumeration(&mut self, d: &Definition) {
        let (repr, write, read) = match d.kind {
            DefinitionKind::Smol => ("u8", "bb.write_byte", "bb.read_byte()?"),
            _ => ("u32", "bb.write_var_uint", "bb.read_var_uint()?"),
        };
        self.out.line("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]");
        if !d.fields.is_empty() {
            self.out.line(format!("#[repr({})]", repr));
        }
        self.out.line("#[allow(non_camel_case_types)]");
        self.out.open(format!("pub enum {} {{", type_ident(&d.name)));
        for f in &d.fields {
            self.out.line(format!("{} = {},", variant_ident(&f.name), f.value));
        }
        self.out.close("}");
        self.out.blank();
        self.out.open(format!("impl {} {{", type_ident(&d.name)));

        self.out.open(format!("pub fn from_value(value: {}) -> Option<Self> {{", repr));
        self.out.open("match value {");
        for f in &d.fields {
            self.out.line(format!("{} => Some(Self::{}),", f.value, variant_ident(&f.name)));
        }
        self.out.line("_ => None,");
        self.out.close("}");
        self.out.close("}");
        self.out.blank();

        self.out.open("pub fn encode(&self, bb: &mut ByteBuffer) {");
        if d.fields.is_empty() {
            self.out.line("let _ = bb;");
            self.out.line("match *self {}");
        } else {
            self.out.line(format!("{}(*self as {});", write, repr));
        }
        self.out.close("}");
        self.out.blank();

        self.out.open("pub fn decode(bb: &mut ByteBuffer) -> Result<Self, CodecError> {");
        self.out.line(format!("let value = {};", read));
        self.out.open("Self::from_value(value).ok_or_else(|| CodecError::InvalidEnumValue {");
        self.out.line(format!("name: {:?}.to_string(),", d.name));
        self.out.line("value: value.to_string(),");
        self.out.close("})");
        self.out.close("}");

        self.out.close("}");
    }

    fn field_list(&self, d: &Definition) -> Vec<String> {
        d.fields
            .iter()
            .filter(|f| !f.is_deprecated)
            .map(|f| field_ident(&f.name))
            .collect()
    }

    fn structure(&mut self, d: &Definition) {
        self.out.line("#[derive(Debug, Clone, PartialEq)]");
        self.out.open(format!("pub struct {} {{", type_ident(&d.name)));
        for f in &d.fields {
            let ty = self.rust_type(f, self.needs_box(d, f));
            self.out.line(format!("pub {}: {},", field_ident(&f.name), ty));
        }
        self.out.close("}");
        self.out.blank();
        self.out.open(format!("impl {} {{", type_ident(&d.name)));

        self.out.open("pub fn encode(&self, bb: &mut ByteBuffer) {");
        let names = self.field_list(d);
        if names.is_empty() {
            self.out.line("let _ = bb;");
        } else {
            self.out.line(format!("let Self {{ {} }} = self;", names.join(", ")));
        }
        for f in &d.fields {
            self.encode_field(f, &field_ident(&f.name));
        }
        self.out.close("}");
        self.out.blank();

        self.out.open("pub fn decode(bb: &mut ByteBuffer) -> Result<Self, CodecError> {");
        if names.is_empty() {
            self.out.line("let _ = bb;");
        }
        for f in &d.fields {
            let expr = self.decode_field(f, self.needs_box(d, f));
            self.out.wrap(&format!("let {} = ", field_ident(&f.name)), &expr, ";");
        }
        self.out.line(format!("Ok(Self {{ {} }})", names.join(", ")));
        self.out.close("}");

        self.out.close("}");
    }

    fn message(&mut self, d: &Definition) {
        let has_required = d.fields.iter().any(|f| f.is_required && !f.is_deprecated);
        if has_required {
            self.out.line("#[derive(Debug, Clone, PartialEq)]");
        } else {
            self.out.line("#[derive(Debug, Clone, PartialEq, Default)]");
        }
        self.out.open(format!("pub struct {} {{", type_ident(&d.name)));
        for f in d.fields.iter().filter(|f| !f.is_deprecated) {
            let ty = self.rust_type(f, self.needs_box(d, f));
            if f.is_required {
                self.out.line(format!("pub {}: {},", field_ident(&f.name), ty));
            } else {
                self.out.line(format!("pub {}: Option<{}>,", field_ident(&f.name), ty));
            }
        }
        self.out.close("}");
        self.out.blank();
        self.out.open(format!("impl {} {{", type_ident(&d.name)));

        self.out.open("pub fn encode(&self, bb: &mut ByteBuffer) {");
        let names = self.field_list(d);
        if !names.is_empty() {
            self.out.line(format!("let Self {{ {} }} = self;", names.join(", ")));
        }
        for f in d.fields.iter().filter(|f| !f.is_deprecated) {
            let ident = field_ident(&f.name);
            if f.is_required {
                self.out.line(format!("bb.write_var_uint({});", f.value));
                self.encode_field(f, &ident);
            } else {
                self.out.open(format!("if let Some(value) = {} {{", ident));
                self.out.line(format!("bb.write_var_uint({});", f.value));
                self.encode_field(f, "value");
                self.out.close("}");
            }
        }
        self.out.line("bb.write_var_uint(0);");
        self.out.close("}");
        self.out.blank();

        self.out.open("pub fn decode(bb: &mut ByteBuffer) -> Result<Self, CodecError> {");
        for name in &names {
            self.out.line(format!("let mut {} = None;", name));
        }
        self.out.open("loop {");
        self.out.open("match bb.read_var_uint()? {");
        self.out.line("0 => break,");
        for f in &d.fields {
            let expr = self.decode_field(f, self.needs_box(d, f));
            if f.is_deprecated {
                self.out.open(format!("{} => {{", f.value));
                self.out.wrap("let _ = ", &expr, ";");
                self.out.close("}");
            } else {
                let prefix = format!("{} => {} = Some(", f.value, field_ident(&f.name));
                self.out.wrap(&prefix, &expr, "),");
            }
        }
        self.out.open("tag => {");
        self.out.open("return Err(CodecError::InvalidFieldTag {");
        self.out.line(format!("message: {:?}.to_string(),", d.name));
        self.out.line("tag,");
        self.out.close("})");
        self.out.close("}");
        self.out.close("}");
        self.out.close("}");
        self.out.open("Ok(Self {");
        for f in d.fields.iter().filter(|f| !f.is_deprecated) {
            let ident = field_ident(&f.name);
            if f.is_required {
                self.out.open(format!("{}: {}.ok_or_else(|| CodecError::MissingField {{", ident, ident));
                self.out.line(format!("definition: {:?}.to_string(),", d.name));
                self.out.line(format!("field: {:?}.to_string(),", f.name));
                self.out.close("})?,");
            } else {
                self.out.line(format!("{},", ident));
            }
        }
        self.out.close("})");
        self.out.close("}");

        self.out.close("}");
    }

    fn union(&mut self, d: &Definition) {
        self.out.line("#[derive(Debug, Clone, PartialEq)]");
        self.out.open(format!("pub enum {} {{", type_ident(&d.name)));
        for f in &d.fields {
            let ty = self.rust_type(f, self.needs_box(d, f));
            self.out.line(format!("{}({}),", variant_ident(&f.name), ty));
        }
        self.out.close("}");
        self.out.blank();
        self.out.open(format!("impl {} {{", type_ident(&d.name)));
        if let Some(tag) = &d.discriminator {
            self.out.line(format!("pub const DISCRIMINATOR: &'static str = {:?};", tag));
            self.out.blank();
        }

        self.out.open("pub fn discriminant(&self) -> u32 {");
        self.out.open("match self {");
        for f in &d.fields {
            self.out.line(format!("Self::{}(_) => {},", variant_ident(&f.name), f.value));
        }
        self.out.close("}");
        self.out.close("}");
        self.out.blank();

        self.out.open("pub fn encode(&self, bb: &mut ByteBuffer) {");
        self.out.line("bb.write_var_uint(self.discriminant());");
        self.out.open("match self {");
        for f in &d.fields {
            self.out.line(format!("Self::{}(value) => value.encode(bb),", variant_ident(&f.name)));
        }
        self.out.close("}");
        self.out.close("}");
        self.out.blank();

        self.out.open("pub fn decode(bb: &mut ByteBuffer) -> Result<Self, CodecError> {");
        self.out.open("match bb.read_var_uint()? {");
        for f in &d.fields {
            let expr = match self.field_type(f) {
                Some(ty) => self.decode_value(f, ty, self.needs_box(d, f)),
                None => continue,
            };
            self.out.line(format!("{} => Ok(Self::{}({})),", f.value, variant_ident(&f.name), expr));
        }
        self.out.open("discriminant => Err(CodecError::InvalidUnionDiscriminant {");
        self.out.line(format!("union: {:?}.to_string(),", d.name));
        self.out.line("discriminant,");
        self.out.close("}),");
        self.out.close("}");
        self.out.close("}");

        self.out.close("}");
    }

    fn alias(&mut self, d: &Definition) {
        if let Some(f) = d.fields.first() {
            self.out.line(format!("pub type {} = {};", type_ident(&d.name), self.rust_type(f, false)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn generate(src: &str) -> String {
        let resolved = ResolvedSchema::resolve(parse(src).expect("parse")).expect("resolve");
        generate_rust(&resolved, &GeneratorOptions::default())
    }

    #[test]
    fn field_ident_snake_cases_and_escapes() {
        assert_eq!(field_ident("eyeCount"), "eye_count");
        assert_eq!(field_ident("x"), "x");
        assert_eq!(field_ident("type"), "r#type");
        assert_eq!(field_ident("self"), "self_");
        assert_eq!(field_ident("bb"), "bb_");
        assert_eq!(field_ident("HTTPCode"), "httpcode");
    }

    #[test]
    fn struct_uses_positional_framing() {
        let code = generate("struct Point { float x; float32 y; uint16[] z; }");
        assert!(code.contains("pub struct Point {"), "{}", code);
        assert!(code.contains("pub x: f32,"));
        assert!(code.contains("pub z: Vec<u16>,"));
        assert!(code.contains("bb.write_var_float(*x);"));
        assert!(code.contains("bb.write_f32(*y);"));
        assert!(code.contains("bb.write_u16_array(z);"));
        assert!(code.contains("let z = bb.read_u16_array()?;"));
        assert!(!code.contains("write_var_uint(0)"));
    }

    #[test]
    fn message_uses_tags_and_terminator() {
        let code = generate(
            "message Hello { uint hour = 1; string name = 2 [deprecated]; string[] names = 3 [required]; }",
        );
        assert!(code.contains("pub hour: Option<u32>,"), "{}", code);
        assert!(!code.contains("pub name:"));
        assert!(code.contains("pub names: Vec<String>,"));
        assert!(code.contains("bb.write_var_uint(1);"));
        assert!(code.contains("bb.write_var_uint(0);"));
        assert!(code.contains("2 => {"));
        assert!(code.contains("CodecError::InvalidFieldTag"));
        assert!(code.contains("CodecError::MissingField"));
        assert!(code.contains("for item in names.iter() {"));
    }

    #[test]
    fn recursive_message_is_boxed() {
        let code = generate("message Node { uint value = 1; Node next = 2; Node[] children = 3; }");
        assert!(code.contains("pub next: Option<Box<Node>>,"), "{}", code);
        assert!(code.contains("pub children: Option<Vec<Node>>,"));
        assert!(code.contains("Box::new(Node::decode(bb)?)"));
    }

    #[test]
    fn enums_and_unions() {
        let code = generate(
            "enum Region { CALIFORNIA = 1; OREGON = 2; }\n\
             smol Flag { ON = 1; }\n\
             struct A { Region r; }\n\
             message B { Flag f = 1; }\n\
             union U = A | B { kind; }\n\
             alias ID = string;",
        );
        assert!(code.contains("#[repr(u32)]"), "{}", code);
        assert!(code.contains("#[repr(u8)]"));
        assert!(code.contains("bb.write_var_uint(*self as u32);"));
        assert!(code.contains("bb.write_byte(*self as u8);"));
        assert!(code.contains("pub enum U {"));
        assert!(code.contains("1 => Ok(Self::A(A::decode(bb)?)),"));
        assert!(code.contains("Self::B(_) => 2,"));
        assert!(code.contains("pub const DISCRIMINATOR: &'static str = \"kind\";"));
        assert!(code.contains("pub type ID = String;"));
    }

    #[test]
    fn clashing_names_are_escaped() {
        assert_eq!(type_ident("Option"), "Option_");
        assert_eq!(type_ident("Self"), "Self_");
        assert_eq!(type_ident("type"), "r#type");
        assert_eq!(type_ident("Point"), "Point");
        assert_eq!(variant_ident("type"), "r#type");
        assert_eq!(variant_ident("Self"), "Self_");
        assert_eq!(variant_ident("Option"), "Option");

        let code = generate(
            "struct Option { uint x; }\n\
             enum Kind { type = 1; Self = 2; }\n\
             message Box { Option inner = 1; Kind kind = 2; }\n\
             union Vec = Option | Box;\n\
             alias ByteBuffer = Box;",
        );
        assert!(code.contains("pub struct Option_ {"), "{}", code);
        assert!(code.contains("impl Option_ {"));
        assert!(code.contains("r#type = 1,"));
        assert!(code.contains("Self_ = 2,"));
        assert!(code.contains("2 => Some(Self::Self_),"));
        assert!(code.contains("pub struct Box_ {"));
        assert!(code.contains("pub inner: Option<Option_>,"));
        assert!(code.contains("pub kind: Option<Kind>,"));
        assert!(code.contains("pub enum Vec_ {"));
        assert!(code.contains("Option(Option_),"));
        assert!(code.contains("2 => Ok(Self::Box(Box_::decode(bb)?)),"));
        assert!(code.contains("pub type ByteBuffer_ = Box_;"));
        assert!(code.contains("message: \"Box\".to_string(),"));
    }

    #[test]
    fn generic_array_count_is_checked_against_input() {
        let code = generate("struct P { uint x; } struct H { P[] ps; }");
        assert!(code.contains("if count > bb.remaining() {"), "{}", code);
        assert!(code.contains("return Err(CodecError::ArrayLength { count, remaining: bb.remaining() });"));
        assert!(code.contains("let mut items = Vec::with_capacity(count);"));
    }
}
