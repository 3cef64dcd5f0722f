//! Schema language tests: syntax (parse success/failure), semantics (resolve, references)
//! and the canonical printer.

use peechy::{parse, pretty_print, DefinitionKind, ResolvedSchema, SchemaError};

fn resolve(src: &str) -> Result<ResolvedSchema, SchemaError> {
    ResolvedSchema::resolve(parse(src)?)
}

fn invalid_at(src: &str) -> (String, usize) {
    match resolve(src) {
        Err(SchemaError::Invalid { message, line, .. }) => (message, line),
        other => panic!("expected invalid schema, got {:?}", other),
    }
}

// ==================== Syntax: valid schemas ====================

#[test]
fn parse_empty_schema() {
    let s = parse("").expect("empty schema can parse");
    assert!(s.package.is_none());
    assert!(s.definitions.is_empty());
}

#[test]
fn parse_every_definition_kind() {
    let src = r#"
package demo;

// line comment
enum Region {
  CALIFORNIA = 1;
  OREGON = 2;
}

smol Flag { ON = 1; OFF = 2; }

/* block
   comment */
struct Point {
  float x;
  float y;
}

message Hello {
  uint hour = 1;
  Point[] path = 2 [deprecated];
  Region region = 3 [required];
}

union Shape = Point | Hello {
  kind;
}

alias Id = string;
"#;
    let s = parse(src).expect("parse");
    assert_eq!(s.package.as_deref(), Some("demo"));
    let kinds: Vec<_> = s.definitions.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DefinitionKind::Enum,
            DefinitionKind::Smol,
            DefinitionKind::Struct,
            DefinitionKind::Message,
            DefinitionKind::Union,
            DefinitionKind::Alias,
        ]
    );

    let hello = &s.definitions[3];
    assert_eq!(hello.fields.len(), 3);
    assert_eq!(hello.fields[1].type_name.as_deref(), Some("Point"));
    assert!(hello.fields[1].is_array);
    assert!(hello.fields[1].is_deprecated);
    assert!(hello.fields[2].is_required);
    assert_eq!(hello.fields[2].value, 3);

    let shape = &s.definitions[4];
    assert_eq!(shape.discriminator.as_deref(), Some("kind"));
    assert_eq!(shape.fields.iter().map(|f| f.value).collect::<Vec<_>>(), vec![1, 2]);

    let region = &s.definitions[0];
    assert_eq!(region.field_by_value(2).map(|f| f.name.as_str()), Some("OREGON"));
    assert!(resolve(src).is_ok());
}

#[test]
fn keyword_prefix_is_an_identifier() {
    let s = parse("struct enumeration { uint messageCount; }").expect("parse");
    assert_eq!(s.definitions[0].name, "enumeration");
    assert_eq!(s.definitions[0].fields[0].name, "messageCount");
}

#[test]
fn positions_are_recorded() {
    let s = parse("\n\nstruct A {\n  uint x;\n}\n").expect("parse");
    assert_eq!(s.definitions[0].line, 3);
    assert_eq!(s.definitions[0].fields[0].line, 4);
    assert_eq!(s.definitions[0].fields[0].column, 3);
}

// ==================== Syntax: invalid schemas ====================

#[test]
fn syntax_errors() {
    for src in [
        "struct { uint x; }",
        "struct A { uint x }",
        "message M { uint x; }",
        "enum E { A; }",
        "union U;",
        "message M { uint x = 1 [optional]; }",
        "struct A { uint[ x; }",
        "package;",
    ] {
        assert!(matches!(parse(src), Err(SchemaError::Syntax(_))), "{}", src);
    }
}

#[test]
fn number_out_of_range() {
    assert!(matches!(
        parse("enum E { A = 4294967296; }"),
        Err(SchemaError::Invalid { .. })
    ));
}

// ==================== Semantics ====================

#[test]
fn duplicate_definition() {
    let (message, line) = invalid_at("struct A { uint x; }\nmessage A { uint y = 1; }");
    assert!(message.contains("Duplicate definition"), "{}", message);
    assert_eq!(line, 2);
}

#[test]
fn unknown_field_type() {
    let (message, _) = invalid_at("struct A { Missing x; }");
    assert!(message.contains("Missing"), "{}", message);
}

#[test]
fn message_ids() {
    let (message, _) = invalid_at("message M { uint a = 0; }");
    assert!(message.contains("at least 1"), "{}", message);
    let (message, _) = invalid_at("message M { uint a = 1; uint b = 1; }");
    assert!(message.contains("Duplicate field id"), "{}", message);
}

#[test]
fn enum_values() {
    let (message, _) = invalid_at("enum E { A = 1; B = 1; }");
    assert!(message.contains("Duplicate value"), "{}", message);
    let (message, _) = invalid_at("smol S { A = 256; }");
    assert!(message.contains("byte"), "{}", message);
    assert!(resolve("smol S { A = 255; }").is_ok());
}

#[test]
fn struct_fields_take_no_attributes() {
    let (message, _) = invalid_at("struct A { uint x [deprecated]; }");
    assert!(message.contains("attributes"), "{}", message);
}

#[test]
fn union_members_must_be_records() {
    let (message, _) = invalid_at("enum E { A = 1; }\nunion U = E;");
    assert!(message.contains("struct or message"), "{}", message);
    let (message, _) = invalid_at("union U = Nowhere;");
    assert!(message.contains("struct or message"), "{}", message);
}

#[test]
fn aliases_resolve() {
    let r = resolve("alias A = B;\nalias B = uint;\nstruct S { A x; }").expect("resolve");
    assert!(matches!(
        r.resolve_type("A"),
        Some(peechy::schema::FieldType::Primitive(peechy::Primitive::Uint))
    ));
    let (message, _) = invalid_at("alias A = B;\nalias B = A;");
    assert!(message.contains("Alias"), "{}", message);
}

#[test]
fn builtin_names_are_reserved() {
    let (message, _) = invalid_at("struct uint { bool x; }");
    assert!(message.contains("built-in"), "{}", message);
}

#[test]
fn self_containing_struct() {
    let (message, _) = invalid_at("struct A { B b; }\nstruct B { A a; }");
    assert!(message.contains("contains itself"), "{}", message);
    assert!(resolve("struct A { A[] children; }").is_ok());
    assert!(resolve("message M { M next = 1; }").is_ok());
}

#[test]
fn empty_struct() {
    let (message, line) = invalid_at("struct P { uint x; }\nstruct E {}\nstruct H { E[] es; }");
    assert!(message.contains("E has no fields"), "{}", message);
    assert_eq!(line, 2);
    assert!(resolve("message M {}\nstruct H { M[] ms; }").is_ok());
}

#[test]
fn alphanumeric_is_not_a_type() {
    let (message, _) = invalid_at("struct A { alphanumeric name; }");
    assert!(message.contains("Invalid type alphanumeric"), "{}", message);
}

#[test]
fn error_display_has_position() {
    let err = resolve("struct A {\n  Nope x;\n}").unwrap_err();
    assert!(err.to_string().starts_with("2:3: "), "{}", err);
}

// ==================== Printer ====================

#[test]
fn pretty_print_canonical_form() {
    let src = "package p; enum E{A=1;} struct S{uint[] xs;} message M{S s=1[deprecated,required];} union U=S|M{t;} alias Id=string;";
    let text = pretty_print(&parse(src).expect("parse"));
    let expected = "\
package p;

enum E {
  A = 1;
}

struct S {
  uint[] xs;
}

message M {
  S s = 1 [deprecated, required];
}

union U = S | M {
  t;
}

alias Id = string;
";
    assert_eq!(text, expected);
}

#[test]
fn pretty_print_reparses_to_same_model() {
    let src = "enum E { A = 1; B = 7; }\nmessage M { E e = 2; string[] names = 5; }\nunion U = M;";
    let first = parse(src).expect("parse");
    let text = pretty_print(&first);
    let second = parse(&text).expect("reparse");
    assert_eq!(pretty_print(&second), text);
    assert_eq!(first.definitions.len(), second.definitions.len());
    for (a, b) in first.definitions.iter().zip(&second.definitions) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.fields.len(), b.fields.len());
    }
}
