//! Parse schema source into the [`Schema`] model using PEST.

use crate::schema::*;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser as PestParser;
use std::path::Path;
use tracing::debug;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct SchemaParser;

/// Parse schema source into a [`Schema`]. The result is not yet verified; see
/// [`ResolvedSchema::resolve`].
pub fn parse(source: &str) -> Result<Schema, SchemaError> {
    let pairs = SchemaParser::parse(Rule::schema, source)
        .map_err(|e| SchemaError::Syntax(e.to_string()))?;
    let pair = pairs
        .into_iter()
        .next()
        .ok_or_else(|| SchemaError::Syntax("Empty parse".to_string()))?;
    let schema = build_schema(pair)?;
    debug!(definitions = schema.definitions.len(), "schema parsed");
    Ok(schema)
}

/// Read and parse a schema file.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Schema, SchemaError> {
    let source = std::fs::read_to_string(path.as_ref())?;
    debug!(path = %path.as_ref().display(), bytes = source.len(), "reading schema");
    parse(&source)
}

fn line_col(pair: &Pair<Rule>) -> (usize, usize) {
    pair.as_span().start_pos().line_col()
}

fn build_schema(pair: Pair<Rule>) -> Result<Schema, SchemaError> {
    let mut schema = Schema::default();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::package_decl => {
                let name = inner
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::ident)
                    .ok_or_else(|| SchemaError::Syntax("package: missing name".to_string()))?;
                schema.package = Some(name.as_str().to_string());
            }
            Rule::enum_def => schema.definitions.push(build_enum(inner, DefinitionKind::Enum)?),
            Rule::smol_def => schema.definitions.push(build_enum(inner, DefinitionKind::Smol)?),
            Rule::struct_def => schema.definitions.push(build_fields(inner, DefinitionKind::Struct)?),
            Rule::message_def => schema.definitions.push(build_fields(inner, DefinitionKind::Message)?),
            Rule::union_def => schema.definitions.push(build_union(inner)?),
            Rule::alias_def => schema.definitions.push(build_alias(inner)?),
            _ => {}
        }
    }
    Ok(schema)
}

fn new_definition(pair: &Pair<Rule>, kind: DefinitionKind) -> Definition {
    let (line, column) = line_col(pair);
    Definition {
        name: String::new(),
        line,
        column,
        kind,
        fields: Vec::new(),
        discriminator: None,
    }
}

fn parse_num(pair: &Pair<Rule>) -> Result<u32, SchemaError> {
    let (line, column) = line_col(pair);
    pair.as_str()
        .parse()
        .map_err(|_| SchemaError::invalid(format!("Number {} is out of range", pair.as_str()), line, column))
}

fn build_enum(pair: Pair<Rule>, kind: DefinitionKind) -> Result<Definition, SchemaError> {
    let mut def = new_definition(&pair, kind);
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => def.name = inner.as_str().to_string(),
            Rule::enum_variant => {
                let (line, column) = line_col(&inner);
                let mut it = inner.into_inner();
                let name = it.next().ok_or_else(|| SchemaError::invalid("enum variant: name", line, column))?;
                let num = it.next().ok_or_else(|| SchemaError::invalid("enum variant: value", line, column))?;
                def.fields.push(Field {
                    name: name.as_str().to_string(),
                    line,
                    column,
                    type_name: None,
                    is_array: false,
                    is_deprecated: false,
                    is_required: false,
                    value: parse_num(&num)?,
                });
            }
            _ => {}
        }
    }
    Ok(def)
}

fn build_fields(pair: Pair<Rule>, kind: DefinitionKind) -> Result<Definition, SchemaError> {
    let mut def = new_definition(&pair, kind);
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => def.name = inner.as_str().to_string(),
            Rule::struct_field | Rule::message_field => def.fields.push(build_field(inner)?),
            _ => {}
        }
    }
    Ok(def)
}

fn build_field(pair: Pair<Rule>) -> Result<Field, SchemaError> {
    let (line, column) = line_col(&pair);
    let mut field = Field {
        name: String::new(),
        line,
        column,
        type_name: None,
        is_array: false,
        is_deprecated: false,
        is_required: false,
        value: 0,
    };
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::type_ref => {
                for part in inner.into_inner() {
                    match part.as_rule() {
                        Rule::ident => field.type_name = Some(part.as_str().to_string()),
                        Rule::array_marker => field.is_array = true,
                        _ => {}
                    }
                }
            }
            Rule::ident => field.name = inner.as_str().to_string(),
            Rule::num => field.value = parse_num(&inner)?,
            Rule::attributes => {
                for attr in inner.into_inner() {
                    match attr.as_str() {
                        "deprecated" => field.is_deprecated = true,
                        "required" => field.is_required = true,
                        other => {
                            let (line, column) = line_col(&attr);
                            return Err(SchemaError::invalid(format!("Unknown attribute {}", other), line, column));
                        }
                    }
                }
            }
            _ => {}
        }
    }
    Ok(field)
}

fn build_union(pair: Pair<Rule>) -> Result<Definition, SchemaError> {
    let mut def = new_definition(&pair, DefinitionKind::Union);
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => def.name = inner.as_str().to_string(),
            Rule::union_member => {
                let (line, column) = line_col(&inner);
                let member = inner.as_str().trim().to_string();
                let value = def.fields.len() as u32 + 1;
                def.fields.push(Field {
                    name: member.clone(),
                    line,
                    column,
                    type_name: Some(member),
                    is_array: false,
                    is_deprecated: false,
                    is_required: false,
                    value,
                });
            }
            Rule::discriminator_block => {
                let name = inner
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::ident)
                    .map(|p| p.as_str().to_string());
                def.discriminator = name;
            }
            _ => {}
        }
    }
    Ok(def)
}

fn build_alias(pair: Pair<Rule>) -> Result<Definition, SchemaError> {
    let mut def = new_definition(&pair, DefinitionKind::Alias);
    for inner in pair.into_inner() {
        if inner.as_rule() != Rule::ident {
            continue;
        }
        if def.name.is_empty() {
            def.name = inner.as_str().to_string();
        } else {
            let (line, column) = line_col(&inner);
            let target = inner.as_str().to_string();
            def.fields.push(Field {
                name: target.clone(),
                line,
                column,
                type_name: Some(target),
                is_array: false,
                is_deprecated: false,
                is_required: false,
                value: 0,
            });
        }
    }
    Ok(def)
}
